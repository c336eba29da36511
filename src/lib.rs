//! # Canvas Discussion Grader
//!
//! This library grades Canvas discussion assignments from the posts students actually wrote.
//! It fetches the discussion behind an assignment, scores every participant against a
//! configurable rule set, keeps the proposed grades in a review queue and finally posts the
//! approved ones back to Canvas, student by student, the way SpeedGrader would.
//!
//! ## Core Features
//!
//! - **Authentication:** Reads Canvas API credentials from the environment or the system keyring.
//! - **Discussion Fetching:** Loads the full discussion view, flattens nested replies and groups posts by author.
//! - **Grading Rules:** Participation rules (word range, post count, deadline) and an introduction rubric.
//! - **Review Queue:** Records move from pending to approved to posted; the queue is snapshotted on disk.
//! - **Posting:** Walks a grading surface one student at a time, typing grade and comment for approved records.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! canvas_discussion_grader = "0.1"
//! ```
//!
//! Grading every student of an assignment:
//! ```no_run
//! use canvas_discussion_grader::{
//!     Canvas, CanvasCredentials, GradingSession, Pacing, RuleSet, SpeedGraderUrl,
//! };
//!
//! # fn main() -> Result<(), canvas_discussion_grader::GraderError> {
//! let canvas = Canvas::new(CanvasCredentials::credentials()?);
//! let page = SpeedGraderUrl::parse(
//!     "https://school.instructure.com/courses/101/gradebook/speed_grader?assignment_id=202",
//! )?;
//! let mut session = GradingSession::open(&canvas, &page, RuleSet::default(), None)?;
//! session.build_queue(&mut rand::thread_rng())?;
//! session.approve_all()?;
//!
//! let mut surface = session.canvas_surface(None);
//! let report = session.post_all(&mut surface, &Pacing::default())?;
//! println!("{} grades posted", report.posted);
//! # Ok(())
//! # }
//! ```
mod assignment; // Resolves the assignment and its discussion topic.
pub mod canvas;
pub mod config;
mod connection; // Manages HTTP connections and requests to the Canvas API.
pub mod course; // Interactive course and assignment pickers.
pub mod credentials; // Handles the storage and retrieval of Canvas API credentials.
mod discussion;
mod error;
pub mod grading;
mod intro;
pub mod poster;
mod queue;
mod session;
mod speedgrader;
mod store; // Queue snapshots on disk.
mod student; // Deals with operations related to students in Canvas courses.
mod submission; // Grade and comment payloads.
pub mod surface;
pub mod words;

#[cfg(test)]
mod test_support;

// Exports key structures for external use.
pub use assignment::{resolve_context, AssignmentContext, AssignmentInfo};
pub use canvas::{Canvas, CanvasApi};
pub use config::GraderConfig;
pub use course::CourseInfo;
pub use credentials::CanvasCredentials;
pub use discussion::{flatten_posts, group_by_author, posts_from_view, Post};
pub use error::GraderError;
pub use grading::{BreakdownLine, GradeOutcome, ParticipationRules, RuleSet, ScoreBounds, WordRange};
pub use intro::{criterion_by_label, Criterion, IntroRubric};
pub use poster::PostReport;
pub use queue::{GradeRecord, GradingQueue, RecordState};
pub use session::GradingSession;
pub use speedgrader::{CanvasSpeedGrader, SpeedGraderUrl};
pub use store::SnapshotStore;
pub use student::{Roster, StudentInfo};
pub use submission::GradeSubmission;
pub use surface::{Field, GradingSurface, Pacing};
