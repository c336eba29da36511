// Necessary imports from standard and external crates.
use crate::{AssignmentInfo, CanvasApi, GraderError, SpeedGraderUrl};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A course the token owner teaches.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CourseInfo {
    pub id: u64,
    pub name: String,
    pub course_code: String,
}

impl CourseInfo {
    /// Converts a JSON object from the Canvas API to a `CourseInfo`.
    ///
    /// Courses the token cannot fully read come back without a name and are
    /// skipped.
    pub fn from_json(course: &Value) -> Option<CourseInfo> {
        let id = course["id"].as_u64()?;
        let name = course["name"].as_str().map(String::from)?;
        let course_code = course["course_code"]
            .as_str()
            .map(String::from)
            .unwrap_or_default();
        Some(CourseInfo {
            id,
            name,
            course_code,
        })
    }

    pub fn label(&self) -> String {
        if self.course_code.is_empty() || self.name.contains(&self.course_code) {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.course_code)
        }
    }
}

fn select(prompt: &str, items: &[String]) -> Result<usize, GraderError> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(|e| GraderError::Interaction(e.to_string()))
}

/// Lets the user pick a course. `None` means EXIT was chosen.
pub fn choose_course(api: &dyn CanvasApi) -> Result<Option<CourseInfo>, GraderError> {
    println!("Fetching courses...");
    let courses = api.fetch_courses()?;

    let mut menu_str: Vec<String> = courses.iter().map(CourseInfo::label).collect();
    menu_str.push("EXIT".to_string());

    let selection = select("Choose a course", &menu_str)?;
    Ok(courses.get(selection).cloned())
}

/// Lets the user pick one of the course's discussion assignments.
///
/// Non-discussion assignments are not listed. `None` means EXIT was chosen.
pub fn choose_assignment(
    api: &dyn CanvasApi,
    course_id: u64,
) -> Result<Option<AssignmentInfo>, GraderError> {
    loop {
        println!("Fetching assignments...");
        let assignments: Vec<AssignmentInfo> = api
            .fetch_assignments(course_id)?
            .into_iter()
            .filter(AssignmentInfo::is_discussion)
            .collect();

        let mut menu_str: Vec<String> = assignments
            .iter()
            .map(|assignment| match assignment.due_at {
                Some(due) => format!("{} (due {})", assignment.name, due.format("%Y-%m-%d %H:%M")),
                None => assignment.name.clone(),
            })
            .collect();
        menu_str.push("REFRESH THIS LIST".to_string());
        menu_str.push("EXIT".to_string());

        let selection = select("Choose a discussion assignment", &menu_str)?;
        if selection == menu_str.len() - 1 {
            return Ok(None);
        }
        if selection == menu_str.len() - 2 {
            continue;
        }
        return Ok(assignments.get(selection).cloned());
    }
}

/// Picks course and assignment interactively, producing the same ids a
/// SpeedGrader URL would carry.
pub fn choose_page(api: &dyn CanvasApi) -> Result<Option<SpeedGraderUrl>, GraderError> {
    let Some(course) = choose_course(api)? else {
        return Ok(None);
    };
    let Some(assignment) = choose_assignment(api, course.id)? else {
        return Ok(None);
    };
    Ok(Some(SpeedGraderUrl {
        course_id: course.id,
        assignment_id: assignment.id,
        student_id: None,
    }))
}
