use crate::grading::{BreakdownLine, ScoreBounds};
use crate::{GraderError, Post};
use serde::{Deserialize, Serialize};

/// Where a record sits in the review flow.
///
/// `Pending -> Approved -> Posted`, with `edit` taking an approved record
/// back to `Pending`. Posted records are final.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    #[default]
    Pending,
    Approved,
    Posted,
}

/// One student's proposed grade.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub student_id: u64,
    pub student_name: String,
    pub score: u8,
    pub comment: String,
    #[serde(default)]
    pub breakdown: Vec<BreakdownLine>,
    #[serde(default)]
    pub raw_posts: Vec<Post>,
    #[serde(default)]
    pub state: RecordState,
}

impl GradeRecord {
    pub fn is_approved(&self) -> bool {
        self.state == RecordState::Approved
    }

    pub fn is_posted(&self) -> bool {
        self.state == RecordState::Posted
    }
}

/// Ordered grading decisions for one assignment.
///
/// Pure state: persistence is the session's job, so every mutation here is
/// followed by a snapshot save there.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingQueue {
    records: Vec<GradeRecord>,
    bounds: ScoreBounds,
}

impl GradingQueue {
    pub fn new(records: Vec<GradeRecord>, bounds: ScoreBounds) -> Self {
        GradingQueue { records, bounds }
    }

    pub fn records(&self) -> &[GradeRecord] {
        &self.records
    }

    pub fn bounds(&self) -> ScoreBounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, student_id: u64) -> Option<&GradeRecord> {
        self.records.iter().find(|r| r.student_id == student_id)
    }

    fn get_mut(&mut self, student_id: u64) -> Result<&mut GradeRecord, GraderError> {
        self.records
            .iter_mut()
            .find(|r| r.student_id == student_id)
            .ok_or(GraderError::UnknownStudent(student_id))
    }

    /// Replaces the breakdown, score and comment of a record after a
    /// criterion override. The record goes back to `Pending` for review.
    pub fn revise(
        &mut self,
        student_id: u64,
        breakdown: Vec<BreakdownLine>,
        score: u8,
        comment: String,
    ) -> Result<(), GraderError> {
        let record = self.get_mut(student_id)?;
        if record.is_posted() {
            return Err(GraderError::InvalidTransition {
                action: "revise",
                student_id,
            });
        }
        record.breakdown = breakdown;
        record.score = score;
        record.comment = comment;
        record.state = RecordState::Pending;
        Ok(())
    }

    /// Captures the edited score and comment and marks the record approved.
    ///
    /// The score is clamped into the rule set's bounds. Approving an
    /// already approved record just replaces its values.
    pub fn approve(
        &mut self,
        student_id: u64,
        score: i64,
        comment: &str,
    ) -> Result<(), GraderError> {
        let bounds = self.bounds;
        let record = self.get_mut(student_id)?;
        if record.is_posted() {
            return Err(GraderError::InvalidTransition {
                action: "approve",
                student_id,
            });
        }
        record.score = bounds.clamp(score);
        record.comment = comment.trim().to_string();
        record.state = RecordState::Approved;
        Ok(())
    }

    /// Reopens an approved record, keeping its score and comment.
    pub fn edit(&mut self, student_id: u64) -> Result<(), GraderError> {
        let record = self.get_mut(student_id)?;
        match record.state {
            RecordState::Posted => Err(GraderError::InvalidTransition {
                action: "edit",
                student_id,
            }),
            _ => {
                record.state = RecordState::Pending;
                Ok(())
            }
        }
    }

    /// Approves every pending record as it stands; returns how many changed.
    pub fn approve_all(&mut self) -> usize {
        let mut changed = 0;
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.state == RecordState::Pending)
        {
            record.state = RecordState::Approved;
            changed += 1;
        }
        changed
    }

    pub fn mark_posted(&mut self, student_id: u64) -> Result<(), GraderError> {
        let record = self.get_mut(student_id)?;
        record.state = RecordState::Posted;
        Ok(())
    }

    pub fn approved(&self, student_id: u64) -> Option<&GradeRecord> {
        self.get(student_id).filter(|r| r.is_approved())
    }

    pub fn approved_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_approved()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == RecordState::Pending)
            .count()
    }

    pub fn all_approved(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn all_posted(&self) -> bool {
        self.records.iter().all(|r| r.is_posted())
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(student_id: u64, score: u8) -> GradeRecord {
        GradeRecord {
            student_id,
            student_name: format!("Student {}", student_id),
            score,
            comment: format!("Your final score is {}/10.", score),
            breakdown: Vec::new(),
            raw_posts: Vec::new(),
            state: RecordState::Pending,
        }
    }

    pub(crate) fn queue(ids: &[u64]) -> GradingQueue {
        GradingQueue::new(
            ids.iter().map(|id| record(*id, 8)).collect(),
            ScoreBounds { min: 2, max: 10 },
        )
    }

    #[test]
    fn approve_edit_approve_round_trips() {
        let mut queue = queue(&[1]);
        queue.approve(1, 7, "Edited comment").unwrap();
        assert!(queue.get(1).unwrap().is_approved());

        queue.edit(1).unwrap();
        let reopened = queue.get(1).unwrap();
        assert_eq!(reopened.state, RecordState::Pending);
        assert_eq!(reopened.score, 7);
        assert_eq!(reopened.comment, "Edited comment");

        queue.approve(1, 9, "Second pass").unwrap();
        let record = queue.get(1).unwrap();
        assert!(record.is_approved());
        assert_eq!((record.score, record.comment.as_str()), (9, "Second pass"));
    }

    #[test]
    fn approve_clamps_to_bounds() {
        let mut queue = queue(&[1, 2]);
        queue.approve(1, 0, "x").unwrap();
        queue.approve(2, 42, "y").unwrap();
        assert_eq!(queue.get(1).unwrap().score, 2);
        assert_eq!(queue.get(2).unwrap().score, 10);
    }

    #[test]
    fn approve_all_counts_only_pending() {
        let mut queue = queue(&[1, 2, 3]);
        queue.approve(2, 8, "ok").unwrap();
        assert_eq!(queue.approve_all(), 2);
        assert_eq!(queue.approved_count(), 3);
        assert!(queue.all_approved());
    }

    #[test]
    fn posted_records_are_final() {
        let mut queue = queue(&[1]);
        queue.approve(1, 8, "ok").unwrap();
        queue.mark_posted(1).unwrap();

        assert!(matches!(
            queue.edit(1),
            Err(GraderError::InvalidTransition { action: "edit", .. })
        ));
        assert!(matches!(
            queue.approve(1, 5, "late change"),
            Err(GraderError::InvalidTransition { action: "approve", .. })
        ));
        assert!(matches!(
            queue.revise(1, Vec::new(), 5, "late change".into()),
            Err(GraderError::InvalidTransition { action: "revise", .. })
        ));
        assert!(queue.all_posted());
    }

    #[test]
    fn revise_reopens_approved_record() {
        let mut queue = queue(&[1]);
        queue.approve(1, 8, "ok").unwrap();
        let line = BreakdownLine {
            label: "Work experience".into(),
            passed: false,
            points: 0,
        };
        queue.revise(1, vec![line.clone()], 7, "Revised".into()).unwrap();

        let record = queue.get(1).unwrap();
        assert_eq!(record.state, RecordState::Pending);
        assert_eq!(record.breakdown, vec![line]);
        assert_eq!((record.score, record.comment.as_str()), (7, "Revised"));
    }

    #[test]
    fn unknown_student_is_reported() {
        let mut queue = queue(&[1]);
        assert!(matches!(
            queue.approve(9, 8, ""),
            Err(GraderError::UnknownStudent(9))
        ));
    }

    #[test]
    fn record_serializes_state_in_snake_case() {
        let json = serde_json::to_value(record(3, 6)).unwrap();
        assert_eq!(json["state"], "pending");
        assert_eq!(json["student_id"], 3);
    }
}
