use crate::connection::{fetch_paginated, get_json, send_http_request, HttpMethod};
use crate::{
    AssignmentInfo, CanvasCredentials, CourseInfo, GradeSubmission, GraderError, StudentInfo,
};
use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::Arc;

/// The Canvas endpoints the grader depends on.
///
/// `Canvas` talks to a live instance; tests substitute an in-memory
/// implementation so the fetch and grading pipeline runs without a network.
pub trait CanvasApi {
    /// Courses where the token owner is enrolled as a teacher.
    fn fetch_courses(&self) -> Result<Vec<CourseInfo>, GraderError>;

    /// Every assignment of a course.
    fn fetch_assignments(&self, course_id: u64) -> Result<Vec<AssignmentInfo>, GraderError>;

    /// A single assignment, including its due date and linked discussion.
    fn fetch_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<AssignmentInfo, GraderError>;

    /// The raw `discussion_topics/:id/view` payload.
    fn fetch_discussion_view(&self, course_id: u64, topic_id: u64)
        -> Result<Value, GraderError>;

    /// The student roster of a course.
    fn fetch_students(&self, course_id: u64) -> Result<Vec<StudentInfo>, GraderError>;

    /// Writes a grade and comment to one student's submission.
    fn post_grade(
        &self,
        course_id: u64,
        assignment_id: u64,
        student_id: u64,
        submission: &GradeSubmission,
    ) -> Result<(), GraderError>;
}

/// Main interface for interacting with a live Canvas LMS.
///
/// Holds the credentials and one blocking HTTP client reused for every call.
///
/// Example:
/// ```no_run
/// use canvas_discussion_grader::{Canvas, CanvasApi, CanvasCredentials};
///
/// let canvas = Canvas::new(CanvasCredentials::new("https://canvas.example.com/api/v1", "token"));
/// let assignment = canvas.fetch_assignment(101, 202).unwrap();
/// println!("{}", assignment.name);
/// ```
#[derive(Clone)]
pub struct Canvas {
    credentials: Arc<CanvasCredentials>,
    client: Client,
}

impl Canvas {
    pub fn new(credentials: CanvasCredentials) -> Self {
        Canvas {
            credentials: Arc::new(credentials),
            client: Client::new(),
        }
    }

    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, GraderError> {
        get_json(
            &self.client,
            &self.credentials.endpoint(path),
            &self.credentials,
            params,
        )
    }

    fn get_all(&self, path: &str, params: &[(String, String)]) -> Result<Vec<Value>, GraderError> {
        fetch_paginated(
            &self.client,
            &self.credentials.endpoint(path),
            &self.credentials,
            params,
        )
    }
}

impl CanvasApi for Canvas {
    fn fetch_courses(&self) -> Result<Vec<CourseInfo>, GraderError> {
        let params = vec![(
            "enrollment_type".to_string(),
            "teacher".to_string(),
        )];
        let courses = self.get_all("courses", &params)?;
        Ok(courses.iter().filter_map(CourseInfo::from_json).collect())
    }

    fn fetch_assignments(&self, course_id: u64) -> Result<Vec<AssignmentInfo>, GraderError> {
        let assignments = self.get_all(&format!("courses/{}/assignments", course_id), &[])?;
        Ok(assignments
            .iter()
            .filter_map(AssignmentInfo::from_json)
            .collect())
    }

    fn fetch_assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<AssignmentInfo, GraderError> {
        let path = format!("courses/{}/assignments/{}", course_id, assignment_id);
        let assignment = self.get(&path, &[])?;
        AssignmentInfo::from_json(&assignment).ok_or_else(|| {
            GraderError::network(
                &self.credentials.endpoint(&path),
                "assignment payload is missing its id or name",
            )
        })
    }

    fn fetch_discussion_view(
        &self,
        course_id: u64,
        topic_id: u64,
    ) -> Result<Value, GraderError> {
        self.get(
            &format!("courses/{}/discussion_topics/{}/view", course_id, topic_id),
            &[],
        )
    }

    fn fetch_students(&self, course_id: u64) -> Result<Vec<StudentInfo>, GraderError> {
        let params = vec![("enrollment_type[]".to_string(), "student".to_string())];
        let students = self.get_all(&format!("courses/{}/users", course_id), &params)?;
        Ok(students.iter().filter_map(StudentInfo::from_json).collect())
    }

    fn post_grade(
        &self,
        course_id: u64,
        assignment_id: u64,
        student_id: u64,
        submission: &GradeSubmission,
    ) -> Result<(), GraderError> {
        let url = self.credentials.endpoint(&format!(
            "courses/{}/assignments/{}/submissions/{}",
            course_id, assignment_id, student_id
        ));
        send_http_request(
            &self.client,
            HttpMethod::Put(submission.to_body()),
            &url,
            &self.credentials,
            &[],
        )?;
        log::info!(
            "posted grade {} for student {} on assignment {}",
            submission.posted_grade,
            student_id,
            assignment_id
        );
        Ok(())
    }
}
