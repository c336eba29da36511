use crate::surface::{wait_until, Field, GradingSurface, Pacing};
use crate::GradingQueue;
use std::collections::HashSet;

/// What a posting run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostReport {
    /// Approved records written and submitted.
    pub posted: usize,
    /// Approved records whose submit failed; they stay approved.
    pub failed: usize,
    /// Students shown by the surface that had no approved record.
    pub skipped: usize,
    pub steps: usize,
    /// Every approved record was attempted before the step budget ran out.
    pub completed: bool,
}

/// Walks the surface student by student, posting every approved record.
///
/// For each student shown, the matching approved record's score and comment
/// are typed in and submitted; students without one are skipped. The loop
/// ends once every approved record has been attempted or when the step
/// budget runs out: `pacing.max_steps`, raised to one full lap of the surface
/// plus one step per approved record. `persist` runs after every submit.
pub fn post_all(
    queue: &mut GradingQueue,
    surface: &mut dyn GradingSurface,
    pacing: &Pacing,
    mut persist: impl FnMut(&GradingQueue),
) -> PostReport {
    let target = queue.approved_count();
    let mut attempted: HashSet<u64> = HashSet::new();
    let mut report = PostReport::default();
    let budget = step_budget(pacing, surface.student_count(), target);
    log::info!("posting {} approved grades", target);

    while attempted.len() < target && report.steps < budget {
        report.steps += 1;

        let current = wait_until(pacing.ready_timeout(), pacing.poll_interval(), || {
            surface.current_student()
        });
        let Some(student_id) = current else {
            log::debug!("surface shows no student yet, advancing");
            surface.next_student();
            pacing.pause();
            continue;
        };

        let record = queue
            .approved(student_id)
            .filter(|_| !attempted.contains(&student_id))
            .map(|r| (r.score, r.comment.clone()));
        let Some((score, comment)) = record else {
            report.skipped += 1;
            surface.next_student();
            pacing.pause();
            continue;
        };

        if !surface.type_into(Field::Grade, &score.to_string()) {
            log::debug!("grade field missing for student {}", student_id);
        }
        pacing.pause();
        if !surface.type_into(Field::Comment, &comment) {
            log::debug!("comment field missing for student {}", student_id);
        }
        pacing.pause();

        attempted.insert(student_id);
        if surface.submit() && queue.mark_posted(student_id).is_ok() {
            report.posted += 1;
        } else {
            log::warn!("submitting the grade for student {} failed", student_id);
            report.failed += 1;
        }
        persist(queue);
        pacing.pause();

        surface.next_student();
        pacing.pause();
    }

    report.completed = attempted.len() >= target;
    if !report.completed {
        log::warn!(
            "stopped after {} steps with {} of {} approved grades attempted",
            report.steps,
            attempted.len(),
            target
        );
    }
    report
}

fn step_budget(pacing: &Pacing, lap: Option<usize>, target: usize) -> usize {
    match lap {
        Some(lap) => pacing.max_steps.max(lap + target),
        None => pacing.max_steps,
    }
}
