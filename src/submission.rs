use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The grade and comment written to a single student's submission.
///
/// Canvas accepts both in one `PUT .../submissions/:user_id` call; the
/// comment is skipped when it is blank so an empty field never creates an
/// empty comment bubble.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GradeSubmission {
    pub posted_grade: String,
    pub text_comment: String,
}

impl GradeSubmission {
    pub fn new(score: impl ToString, comment: &str) -> Self {
        GradeSubmission {
            posted_grade: score.to_string(),
            text_comment: comment.trim().to_string(),
        }
    }

    /// JSON body for the submissions endpoint.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "submission": {
                "posted_grade": self.posted_grade
            }
        });
        if !self.text_comment.is_empty() {
            body["comment"] = json!({ "text_comment": self.text_comment });
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_grade_and_comment() {
        let body = GradeSubmission::new(8, " Your final score is 8/10. ").to_body();
        assert_eq!(body["submission"]["posted_grade"], "8");
        assert_eq!(body["comment"]["text_comment"], "Your final score is 8/10.");
    }

    #[test]
    fn blank_comment_is_omitted() {
        let body = GradeSubmission::new(10, "   ").to_body();
        assert!(body.get("comment").is_none());
    }
}
