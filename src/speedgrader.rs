//! SpeedGrader URLs and the API-backed grading surface.

use crate::surface::{Field, GradingSurface};
use crate::{AssignmentContext, CanvasApi, GradeSubmission, GraderError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static COURSE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"courses/(\d+)").unwrap());
static ASSIGNMENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"assignment_id=(\d+)").unwrap());
static STUDENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"student_id=(\d+)").unwrap());

/// Identifiers carried by a SpeedGrader page URL, e.g.
/// `https://school.instructure.com/courses/101/gradebook/speed_grader?assignment_id=202&student_id=303`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedGraderUrl {
    pub course_id: u64,
    pub assignment_id: u64,
    pub student_id: Option<u64>,
}

impl SpeedGraderUrl {
    /// Extracts the ids, failing when the course or assignment is absent.
    pub fn parse(url: &str) -> Result<SpeedGraderUrl, GraderError> {
        let course_id = capture_id(&COURSE_ID, url).ok_or(GraderError::MissingIdentifiers("course id"))?;
        let assignment_id = capture_id(&ASSIGNMENT_ID, url)
            .ok_or(GraderError::MissingIdentifiers("assignment id"))?;
        Ok(SpeedGraderUrl {
            course_id,
            assignment_id,
            student_id: capture_id(&STUDENT_ID, url),
        })
    }

    /// The student id, for modes that grade one student at a time.
    pub fn require_student(&self) -> Result<u64, GraderError> {
        self.student_id
            .ok_or(GraderError::MissingIdentifiers("student id"))
    }
}

fn capture_id(pattern: &Regex, url: &str) -> Option<u64> {
    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Grading surface that writes straight to Canvas submissions.
///
/// Students are visited in SpeedGrader order and the list wraps around like
/// SpeedGrader's "next" arrow. Typed characters are buffered until `submit`,
/// which sends grade and comment in one request.
pub struct CanvasSpeedGrader<'a> {
    api: &'a dyn CanvasApi,
    course_id: u64,
    assignment_id: u64,
    students: Vec<u64>,
    cursor: usize,
    grade: String,
    comment: String,
}

impl<'a> CanvasSpeedGrader<'a> {
    /// `start_at` positions the surface on a student, as when SpeedGrader
    /// is opened from a URL carrying `student_id`.
    pub fn new(
        api: &'a dyn CanvasApi,
        context: &AssignmentContext,
        students: Vec<u64>,
        start_at: Option<u64>,
    ) -> Self {
        let cursor = start_at
            .and_then(|id| students.iter().position(|s| *s == id))
            .unwrap_or(0);
        CanvasSpeedGrader {
            api,
            course_id: context.course_id,
            assignment_id: context.assignment_id,
            students,
            cursor,
            grade: String::new(),
            comment: String::new(),
        }
    }

    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Grade => &mut self.grade,
            Field::Comment => &mut self.comment,
        }
    }
}

impl GradingSurface for CanvasSpeedGrader<'_> {
    fn current_student(&mut self) -> Option<u64> {
        self.students.get(self.cursor).copied()
    }

    fn clear_field(&mut self, field: Field) -> bool {
        self.buffer(field).clear();
        true
    }

    fn input_char(&mut self, field: Field, ch: char) -> bool {
        self.buffer(field).push(ch);
        true
    }

    fn submit(&mut self) -> bool {
        let Some(student_id) = self.current_student() else {
            return false;
        };
        if self.grade.trim().is_empty() {
            return false;
        }
        let submission = GradeSubmission::new(self.grade.trim(), &self.comment);
        self.grade.clear();
        self.comment.clear();
        match self
            .api
            .post_grade(self.course_id, self.assignment_id, student_id, &submission)
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    fn next_student(&mut self) -> bool {
        if self.students.is_empty() {
            return false;
        }
        self.cursor = (self.cursor + 1) % self.students.len();
        self.grade.clear();
        self.comment.clear();
        true
    }

    fn student_count(&self) -> Option<usize> {
        Some(self.students.len())
    }
}
