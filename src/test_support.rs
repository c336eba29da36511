//! In-memory Canvas and grading page used by the unit tests.

use crate::grading::tests::words;
use crate::surface::{Field, GradingSurface};
use crate::{
    AssignmentContext, AssignmentInfo, CanvasApi, CourseInfo, GradeSubmission, GraderError,
    StudentInfo,
};
use serde_json::{json, Value};
use std::cell::RefCell;

pub(crate) fn sample_context() -> AssignmentContext {
    AssignmentContext {
        course_id: 101,
        assignment_id: 202,
        assignment_name: "Week 3 Discussion".to_string(),
        discussion_id: 77,
        due_at: None,
        points_possible: Some(10.0),
    }
}

/// Canvas with one discussion: student 1 posts on time and replies,
/// student 3 only replies once, and student 2 (not on the roster) posts
/// once, short and late.
pub(crate) struct FakeCanvas {
    pub assignment: Value,
    pub view: Value,
    pub students: Vec<StudentInfo>,
    pub fail_view: bool,
    pub fail_roster: bool,
    pub fail_posting: bool,
    pub posted: RefCell<Vec<(u64, GradeSubmission)>>,
}

impl Default for FakeCanvas {
    fn default() -> Self {
        FakeCanvas {
            assignment: json!({
                "id": 202,
                "name": "Week 3 Discussion",
                "due_at": "2025-04-10T12:00:00Z",
                "points_possible": 10.0,
                "discussion_topic": { "id": 77 }
            }),
            view: json!({
                "view": [
                    {
                        "id": 10,
                        "user_id": 1,
                        "message": words(120),
                        "created_at": "2025-04-09T08:00:00Z",
                        "replies": [
                            {
                                "id": 11,
                                "user_id": 3,
                                "message": words(30),
                                "created_at": "2025-04-09T09:00:00Z",
                                "replies": [
                                    {
                                        "id": 12,
                                        "user_id": 1,
                                        "message": words(40),
                                        "created_at": "2025-04-09T10:00:00Z"
                                    }
                                ]
                            }
                        ]
                    },
                    {
                        "id": 20,
                        "user_id": 2,
                        "message": words(50),
                        "created_at": "2025-04-11T08:00:00Z"
                    }
                ]
            }),
            students: vec![
                StudentInfo {
                    id: 1,
                    name: "Ada Lovelace".to_string(),
                    sortable_name: Some("Lovelace, Ada".to_string()),
                },
                StudentInfo {
                    id: 3,
                    name: "Carl Young".to_string(),
                    sortable_name: Some("Young, Carl".to_string()),
                },
            ],
            fail_view: false,
            fail_roster: false,
            fail_posting: false,
            posted: RefCell::new(Vec::new()),
        }
    }
}

impl CanvasApi for FakeCanvas {
    fn fetch_courses(&self) -> Result<Vec<CourseInfo>, GraderError> {
        Ok(vec![CourseInfo {
            id: 101,
            name: "Accounting 101".to_string(),
            course_code: "ACCT-101".to_string(),
        }])
    }

    fn fetch_assignments(&self, _course_id: u64) -> Result<Vec<AssignmentInfo>, GraderError> {
        Ok(AssignmentInfo::from_json(&self.assignment).into_iter().collect())
    }

    fn fetch_assignment(
        &self,
        _course_id: u64,
        _assignment_id: u64,
    ) -> Result<AssignmentInfo, GraderError> {
        AssignmentInfo::from_json(&self.assignment)
            .ok_or_else(|| GraderError::network("fake://assignment", "bad payload"))
    }

    fn fetch_discussion_view(
        &self,
        _course_id: u64,
        _topic_id: u64,
    ) -> Result<Value, GraderError> {
        if self.fail_view {
            return Err(GraderError::network("fake://view", "HTTP status 500"));
        }
        Ok(self.view.clone())
    }

    fn fetch_students(&self, _course_id: u64) -> Result<Vec<StudentInfo>, GraderError> {
        if self.fail_roster {
            return Err(GraderError::network("fake://users", "HTTP status 403"));
        }
        Ok(self.students.clone())
    }

    fn post_grade(
        &self,
        _course_id: u64,
        _assignment_id: u64,
        student_id: u64,
        submission: &GradeSubmission,
    ) -> Result<(), GraderError> {
        if self.fail_posting {
            return Err(GraderError::network("fake://submissions", "HTTP status 500"));
        }
        self.posted
            .borrow_mut()
            .push((student_id, submission.clone()));
        Ok(())
    }
}

/// A SpeedGrader page held in memory, with switches to remove elements.
pub(crate) struct FakePage {
    pub students: Vec<u64>,
    pub cursor: usize,
    pub grade: String,
    pub comment: String,
    pub comment_field_present: bool,
    pub submit_works: bool,
    pub submitted: Vec<(u64, String, String)>,
}

impl FakePage {
    pub fn new(students: &[u64]) -> Self {
        FakePage {
            students: students.to_vec(),
            cursor: 0,
            grade: String::new(),
            comment: String::new(),
            comment_field_present: true,
            submit_works: true,
            submitted: Vec::new(),
        }
    }
}

impl GradingSurface for FakePage {
    fn current_student(&mut self) -> Option<u64> {
        self.students.get(self.cursor).copied()
    }

    fn clear_field(&mut self, field: Field) -> bool {
        match field {
            Field::Grade => self.grade.clear(),
            Field::Comment if self.comment_field_present => self.comment.clear(),
            Field::Comment => return false,
        }
        true
    }

    fn input_char(&mut self, field: Field, ch: char) -> bool {
        match field {
            Field::Grade => self.grade.push(ch),
            Field::Comment if self.comment_field_present => self.comment.push(ch),
            Field::Comment => return false,
        }
        true
    }

    fn submit(&mut self) -> bool {
        if !self.submit_works {
            return false;
        }
        let Some(student) = self.current_student() else {
            return false;
        };
        self.submitted.push((
            student,
            std::mem::take(&mut self.grade),
            std::mem::take(&mut self.comment),
        ));
        true
    }

    fn next_student(&mut self) -> bool {
        if self.students.is_empty() {
            return false;
        }
        self.cursor = (self.cursor + 1) % self.students.len();
        true
    }

    fn student_count(&self) -> Option<usize> {
        Some(self.students.len())
    }
}
