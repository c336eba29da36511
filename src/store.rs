use crate::{AssignmentContext, GradeRecord, GraderError, RuleSet};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON snapshot of a grading queue, one file per assignment.
///
/// Written after every queue change so a session can resume where it
/// stopped; removed after a complete posting run or a regrade.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    /// `queue-{course}-{assignment}-{rules}.json` under `dir`.
    ///
    /// Keyed by rule set so a queue graded with one set of rules is never
    /// resumed under another.
    pub fn for_assignment(dir: &Path, context: &AssignmentContext, rules: &RuleSet) -> Self {
        SnapshotStore::new(dir.join(format!(
            "queue-{}-{}-{}.json",
            context.course_id,
            context.assignment_id,
            rules.kind()
        )))
    }

    /// Per-user data directory for snapshots, e.g. `~/.local/share/canvas_discussion_grader`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot; `Ok(None)` when there is none.
    pub fn load(&self) -> Result<Option<Vec<GradeRecord>>, GraderError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, records: &[GradeRecord]) -> Result<(), GraderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(records)?)?;
        log::debug!("saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), GraderError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::tests::record;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("queue.json"));
        assert!(store.load().unwrap().is_none());

        let records = vec![record(1, 8), record(2, 6)];
        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), Some(records));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("queue.json"));
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(GraderError::Snapshot(_))));
    }

    #[test]
    fn file_name_is_keyed_by_assignment() {
        let context = AssignmentContext {
            course_id: 101,
            assignment_id: 202,
            assignment_name: "Week 1".into(),
            discussion_id: 77,
            due_at: None,
            points_possible: None,
        };
        let store =
            SnapshotStore::for_assignment(Path::new("/tmp/grader"), &context, &RuleSet::default());
        assert_eq!(
            store.path(),
            Path::new("/tmp/grader/queue-101-202-participation.json")
        );
        let intro = RuleSet::Intro(crate::IntroRubric::default());
        assert_eq!(
            SnapshotStore::for_assignment(Path::new("/tmp/grader"), &context, &intro).path(),
            Path::new("/tmp/grader/queue-101-202-intro.json")
        );
    }
}
