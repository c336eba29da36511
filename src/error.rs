use thiserror::Error;

/// Errors surfaced by the grader.
///
/// Every error is local to the operation that produced it. Nothing here is
/// retried automatically; the panel prints the message and moves on.
#[derive(Debug, Error)]
pub enum GraderError {
    /// The SpeedGrader URL lacks a course, assignment or student id.
    #[error("missing {0} in URL; open this tool from a Canvas SpeedGrader page")]
    MissingIdentifiers(&'static str),

    /// A Canvas request failed, either at the transport level or with a non-success status.
    #[error("request to {url} failed: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// The assignment is not linked to a discussion topic.
    #[error("assignment {assignment_id} has no linked discussion")]
    MissingDiscussion { assignment_id: u64 },

    /// Grading was asked to score an empty post list.
    #[error("no posts to grade")]
    NoPosts,

    #[error("no posts found for student {0}")]
    StudentHasNoPosts(u64),

    #[error("student {0} is not in the grading queue")]
    UnknownStudent(u64),

    /// Criterion overrides only apply to rubric criteria of the intro rules.
    #[error("no rubric criterion named {0:?}")]
    UnknownCriterion(String),

    #[error("cannot {action} student {student_id}: grade already posted")]
    InvalidTransition {
        action: &'static str,
        student_id: u64,
    },

    /// A terminal prompt could not be shown or was interrupted.
    #[error("prompt failed: {0}")]
    Interaction(String),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("snapshot storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration parsed but its grading rules are inconsistent.
    #[error("invalid grading rules: {0}")]
    InvalidRules(String),
}

impl GraderError {
    pub(crate) fn network(url: &str, reason: impl ToString) -> Self {
        GraderError::NetworkFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
