// Import necessary crates and modules
use crate::{CanvasApi, GraderError, SpeedGraderUrl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Assignment details as returned by the Canvas assignments endpoint.
///
/// Only the fields the grader reads are kept. `discussion_topic_id` is set
/// for graded discussions and absent for every other assignment type.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssignmentInfo {
    pub id: u64,
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    pub discussion_topic_id: Option<u64>,
}

impl AssignmentInfo {
    /// Converts a JSON object from the Canvas API to an `AssignmentInfo`.
    ///
    /// Returns `None` when the id or name is missing. A malformed `due_at`
    /// is treated as "no due date".
    pub fn from_json(assignment: &Value) -> Option<AssignmentInfo> {
        let id = assignment["id"].as_u64()?;
        let name = assignment["name"].as_str().map(String::from)?;
        let due_at = assignment["due_at"].as_str().and_then(|due_str| {
            DateTime::parse_from_rfc3339(due_str)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        Some(AssignmentInfo {
            id,
            name,
            due_at,
            points_possible: assignment["points_possible"].as_f64(),
            discussion_topic_id: assignment["discussion_topic"]["id"].as_u64(),
        })
    }

    pub fn is_discussion(&self) -> bool {
        self.discussion_topic_id.is_some()
    }
}

/// Everything a grading session needs to know about the assignment.
///
/// Derived once from the page URL and one API call, then never changed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AssignmentContext {
    pub course_id: u64,
    pub assignment_id: u64,
    pub assignment_name: String,
    pub discussion_id: u64,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
}

impl AssignmentContext {
    /// Builds the context from an already fetched assignment.
    pub fn from_assignment(
        course_id: u64,
        assignment: &AssignmentInfo,
    ) -> Result<AssignmentContext, GraderError> {
        let discussion_id =
            assignment
                .discussion_topic_id
                .ok_or(GraderError::MissingDiscussion {
                    assignment_id: assignment.id,
                })?;
        Ok(AssignmentContext {
            course_id,
            assignment_id: assignment.id,
            assignment_name: assignment.name.clone(),
            discussion_id,
            due_at: assignment.due_at,
            points_possible: assignment.points_possible,
        })
    }
}

/// Looks up the assignment named by the page and resolves its discussion.
pub fn resolve_context(
    api: &dyn CanvasApi,
    page: &SpeedGraderUrl,
) -> Result<AssignmentContext, GraderError> {
    let assignment = api.fetch_assignment(page.course_id, page.assignment_id)?;
    let context = AssignmentContext::from_assignment(page.course_id, &assignment)?;
    log::info!(
        "resolved assignment {} ({}) -> discussion {}",
        context.assignment_id,
        context.assignment_name,
        context.discussion_id
    );
    Ok(context)
}
