// Import necessary crates and modules
use crate::CanvasApi;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A student enrolled in the course.
///
/// `sortable_name` is "Last, First" and is what SpeedGrader lists students
/// by, so it is preferred for display.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StudentInfo {
    pub id: u64,
    pub name: String,
    pub sortable_name: Option<String>,
}

impl StudentInfo {
    /// Converts a roster entry to a `StudentInfo`.
    pub fn from_json(student: &Value) -> Option<StudentInfo> {
        let id = student["id"].as_u64()?;
        let name = student["name"].as_str().map(String::from).unwrap_or_default();
        let sortable_name = student["sortable_name"].as_str().map(String::from);
        Some(StudentInfo {
            id,
            name,
            sortable_name,
        })
    }

    pub fn display_name(&self) -> String {
        match &self.sortable_name {
            Some(sortable) if !sortable.trim().is_empty() => sortable.clone(),
            _ if !self.name.trim().is_empty() => self.name.clone(),
            _ => fallback_name(self.id),
        }
    }
}

fn fallback_name(user_id: u64) -> String {
    format!("User {}", user_id)
}

/// Name cache for one course, filled from the roster on first use.
///
/// A roster failure is logged and the cache keeps answering with
/// `User {id}` placeholders; names are cosmetic and never block grading.
#[derive(Debug, Default)]
pub struct Roster {
    students: Vec<StudentInfo>,
    names: HashMap<u64, String>,
    loaded: bool,
}

impl Roster {
    pub fn from_students(students: Vec<StudentInfo>) -> Self {
        let names = students
            .iter()
            .map(|student| (student.id, student.display_name()))
            .collect();
        Roster {
            students,
            names,
            loaded: true,
        }
    }

    /// Loads the roster if it has not been loaded yet.
    pub fn ensure_loaded(&mut self, api: &dyn CanvasApi, course_id: u64) {
        if self.loaded {
            return;
        }
        match api.fetch_students(course_id) {
            Ok(students) => {
                log::info!("loaded {} students for course {}", students.len(), course_id);
                *self = Roster::from_students(students);
            }
            Err(e) => {
                log::warn!("failed to load roster for course {}: {}", course_id, e);
                self.loaded = true;
            }
        }
    }

    pub fn name_of(&self, user_id: u64) -> String {
        self.names
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| fallback_name(user_id))
    }

    /// Students in SpeedGrader order (by sortable name).
    pub fn in_grading_order(&self) -> Vec<StudentInfo> {
        let mut students = self.students.clone();
        students.sort_by_key(|student| student.display_name().to_lowercase());
        students
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCanvas;
    use serde_json::json;

    #[test]
    fn display_name_prefers_sortable_name() {
        let student = StudentInfo::from_json(&json!({
            "id": 5,
            "name": "Ada Lovelace",
            "sortable_name": "Lovelace, Ada"
        }))
        .unwrap();
        assert_eq!(student.display_name(), "Lovelace, Ada");

        let unnamed = StudentInfo::from_json(&json!({ "id": 6 })).unwrap();
        assert_eq!(unnamed.display_name(), "User 6");
    }

    #[test]
    fn roster_falls_back_on_failure() {
        let mut canvas = FakeCanvas::default();
        canvas.fail_roster = true;
        let mut roster = Roster::default();
        roster.ensure_loaded(&canvas, 101);

        assert!(roster.is_empty());
        assert_eq!(roster.name_of(42), "User 42");
    }

    #[test]
    fn grading_order_sorts_by_display_name() {
        let roster = Roster::from_students(vec![
            StudentInfo {
                id: 1,
                name: "Zed Young".into(),
                sortable_name: Some("Young, Zed".into()),
            },
            StudentInfo {
                id: 2,
                name: "Amy Brown".into(),
                sortable_name: Some("Brown, Amy".into()),
            },
        ]);
        let ids: Vec<u64> = roster.in_grading_order().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
