//! The page the posting loop writes grades into.

use serde::{Deserialize, Serialize};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Input fields on a grading surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Grade,
    Comment,
}

/// A SpeedGrader-like page: one student shown at a time, a grade field, a
/// comment field, a submit control and a "next student" control.
///
/// Methods return `false` when the element they need is not there. Callers
/// treat that as a silent no-op rather than an error.
pub trait GradingSurface {
    /// The student currently displayed, if the page is ready.
    fn current_student(&mut self) -> Option<u64>;

    fn clear_field(&mut self, field: Field) -> bool;

    /// Types one character, firing whatever input handling the page has.
    fn input_char(&mut self, field: Field, ch: char) -> bool;

    fn submit(&mut self) -> bool;

    fn next_student(&mut self) -> bool;

    /// How many students one full pass of `next_student` visits, when known.
    fn student_count(&self) -> Option<usize> {
        None
    }

    /// Clears `field` and types `text` into it one character at a time.
    fn type_into(&mut self, field: Field, text: &str) -> bool {
        if !self.clear_field(field) {
            return false;
        }
        text.chars().all(|ch| self.input_char(field, ch))
    }
}

/// Timing of the posting loop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Pacing {
    /// Pause between DOM-level steps (typing, submitting, advancing).
    pub step_delay_ms: u64,
    pub poll_interval_ms: u64,
    /// How long to wait for the surface to show a student.
    pub ready_timeout_ms: u64,
    /// Lower bound on loop iterations. A surface that knows its size gets at
    /// least one full lap plus one step per approved record, so a student
    /// that never shows up cannot keep the loop alive.
    pub max_steps: usize,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            step_delay_ms: 1500,
            poll_interval_ms: 250,
            ready_timeout_ms: 5000,
            max_steps: 250,
        }
    }
}

impl Pacing {
    /// No pauses at all; for tests and surfaces that apply writes synchronously.
    pub fn immediate(max_steps: usize) -> Self {
        Pacing {
            step_delay_ms: 0,
            poll_interval_ms: 0,
            ready_timeout_ms: 0,
            max_steps,
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn pause(&self) {
        if self.step_delay_ms > 0 {
            sleep(self.step_delay());
        }
    }
}

/// Polls `check` until it yields a value or `timeout` elapses.
///
/// The check always runs at least once, so a zero timeout is a single check.
pub fn wait_until<T>(
    timeout: Duration,
    interval: Duration,
    mut check: impl FnMut() -> Option<T>,
) -> Option<T> {
    let started = Instant::now();
    loop {
        if let Some(value) = check() {
            return Some(value);
        }
        if started.elapsed() >= timeout {
            return None;
        }
        sleep(interval);
    }
}
