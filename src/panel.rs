use anyhow::Result;
use canvas_discussion_grader::words::count_words;
use canvas_discussion_grader::{
    criterion_by_label, GradeRecord, GraderError, GradingSession, Pacing, RecordState, RuleSet,
    SpeedGraderUrl,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use rand::Rng;
use tabled::settings::object::Rows;
use tabled::settings::{Modify, Panel, Style, Width};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "Student")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "State")]
    state: &'static str,
    #[tabled(rename = "Posts")]
    posts: usize,
    #[tabled(rename = "Comment")]
    comment: String,
}

fn state_label(state: RecordState) -> &'static str {
    match state {
        RecordState::Pending => "pending",
        RecordState::Approved => "approved",
        RecordState::Posted => "posted",
    }
}

fn show_queue(session: &GradingSession) {
    let queue = session.queue();
    let max = queue.bounds().max;
    let rows: Vec<QueueRow> = queue
        .records()
        .iter()
        .map(|record| QueueRow {
            name: record.student_name.clone(),
            score: format!("{}/{}", record.score, max),
            state: state_label(record.state),
            posts: record.raw_posts.len(),
            comment: record.comment.clone(),
        })
        .collect();
    let posted = queue.records().iter().filter(|r| r.is_posted()).count();

    println!(
        "{}",
        Table::new(rows)
            .with(Panel::header(format!(
                "{} ({} rules)",
                session.context().assignment_name,
                session.rules().name()
            )))
            .with(Panel::footer(format!(
                "{} pending, {} approved, {} posted",
                queue.pending_count(),
                queue.approved_count(),
                posted
            )))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
            .with(Style::modern())
    );
}

fn show_record(record: &GradeRecord, max: u8) {
    println!("\n{}: {}/{}", record.student_name, record.score, max);
    for line in &record.breakdown {
        let mark = if line.passed { "ok" } else { "--" };
        println!("  [{}] {} ({:+})", mark, line.label, line.points);
    }
    for (i, post) in record.raw_posts.iter().enumerate() {
        println!(
            "  post {} at {}: {} words",
            i + 1,
            post.created_at.format("%Y-%m-%d %H:%M"),
            count_words(&post.message)
        );
    }
    println!("  comment: {}\n", record.comment);
}

/// Asks for a score and comment, starting from the proposed ones.
fn prompt_grade(theme: &ColorfulTheme, record: &GradeRecord) -> Result<(i64, String)> {
    let score: i64 = Input::with_theme(theme)
        .with_prompt("Score")
        .default(i64::from(record.score))
        .interact_text()?;
    let comment: String = Input::with_theme(theme)
        .with_prompt("Comment")
        .with_initial_text(record.comment.clone())
        .allow_empty(true)
        .interact_text()?;
    Ok((score, comment))
}

fn review_student(session: &mut GradingSession, theme: &ColorfulTheme) -> Result<()> {
    let records: Vec<GradeRecord> = session.queue().records().to_vec();
    let mut items: Vec<String> = records
        .iter()
        .map(|r| format!("{} [{}] {}", r.student_name, state_label(r.state), r.score))
        .collect();
    items.push("BACK".to_string());

    let selection = Select::with_theme(theme)
        .with_prompt("Choose a student")
        .items(&items)
        .default(0)
        .interact()?;
    let Some(record) = records.get(selection) else {
        return Ok(());
    };
    show_record(record, session.queue().bounds().max);

    let mut actions = vec!["Approve", "Send back to pending"];
    if matches!(session.rules(), RuleSet::Intro(_)) {
        actions.push("Adjust a rubric criterion");
    }
    actions.push("Back");
    let action = Select::with_theme(theme)
        .items(&actions)
        .default(0)
        .interact()?;
    let result = match actions[action] {
        "Approve" => {
            let (score, comment) = prompt_grade(theme, record)?;
            session.approve(record.student_id, score, &comment)
        }
        "Send back to pending" => session.edit(record.student_id),
        "Adjust a rubric criterion" => adjust_criterion(session, theme, record)?,
        _ => Ok(()),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
    }
    Ok(())
}

/// Lets the grader set one rubric criterion's points; the total is recomputed.
fn adjust_criterion(
    session: &mut GradingSession,
    theme: &ColorfulTheme,
    record: &GradeRecord,
) -> Result<Result<(), GraderError>> {
    let criteria: Vec<_> = record
        .breakdown
        .iter()
        .filter_map(|line| criterion_by_label(&line.label).map(|c| (line, c)))
        .collect();
    if criteria.is_empty() {
        return Ok(Ok(()));
    }
    let items: Vec<String> = criteria
        .iter()
        .map(|(line, c)| format!("{} ({}/{})", line.label, line.points, c.points))
        .collect();
    let selection = Select::with_theme(theme)
        .with_prompt("Criterion")
        .items(&items)
        .default(0)
        .interact()?;
    let (line, criterion) = criteria[selection];
    let points: i32 = Input::with_theme(theme)
        .with_prompt(format!("Points (0-{})", criterion.points))
        .default(line.points)
        .interact_text()?;

    Ok(session
        .adjust_criterion(record.student_id, &line.label, points)
        .map(|score| println!("New total: {}/{}", score, session.queue().bounds().max)))
}

fn post_approved(
    session: &mut GradingSession,
    theme: &ColorfulTheme,
    page: &SpeedGraderUrl,
    pacing: &Pacing,
) -> Result<()> {
    let queue = session.queue();
    if queue.approved_count() == 0 {
        println!("Nothing approved yet.");
        return Ok(());
    }
    if !queue.all_approved() {
        let proceed = Confirm::with_theme(theme)
            .with_prompt(format!(
                "{} records are not approved and will be skipped. Post the approved ones?",
                queue.pending_count()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            return Ok(());
        }
    }

    let mut surface = session.canvas_surface(page.student_id);
    let report = session.post_all(&mut surface, pacing)?;
    println!(
        "Posted {}, failed {}, skipped {}.",
        report.posted, report.failed, report.skipped
    );
    if !report.completed {
        println!(
            "Stopped after {} steps; some approved students never appeared in SpeedGrader.",
            report.steps
        );
    }
    Ok(())
}

/// The review panel: grade everyone, review, approve, post.
pub fn run_queue<R: Rng + ?Sized>(
    session: &mut GradingSession,
    page: &SpeedGraderUrl,
    pacing: &Pacing,
    rng: &mut R,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("Fetching discussion posts...");
    if session.resume_or_build(rng)? {
        println!("Resumed the saved grading queue.");
    }

    loop {
        if session.queue().is_empty() {
            println!("No posts to grade for this discussion.");
            return Ok(());
        }
        show_queue(session);

        let menu = [
            "Review a student",
            "Approve all pending",
            "Post approved grades",
            "Regrade everyone",
            "EXIT",
        ];
        let selection = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(&menu)
            .default(0)
            .interact()?;
        let outcome = match selection {
            0 => review_student(session, &theme),
            1 => session
                .approve_all()
                .map(|n| println!("Approved {} records.", n))
                .map_err(Into::into),
            2 => post_approved(session, &theme, page, pacing),
            3 => session
                .regrade(rng)
                .map(|n| println!("Regraded {} students.", n))
                .map_err(Into::into),
            _ => return Ok(()),
        };
        if let Err(e) = outcome {
            eprintln!("{:#}", e);
        }
    }
}

/// Grades the student open in SpeedGrader and posts after confirmation.
pub fn run_single<R: Rng + ?Sized>(
    session: &mut GradingSession,
    page: &SpeedGraderUrl,
    rng: &mut R,
) -> Result<()> {
    let theme = ColorfulTheme::default();
    let student_id = page.require_student()?;
    let mut record = session.grade_student(student_id, rng)?;
    let bounds = session.rules().bounds();
    show_record(&record, bounds.max);

    let (score, comment) = prompt_grade(&theme, &record)?;
    record.score = bounds.clamp(score);
    record.comment = comment;

    let post = Confirm::with_theme(&theme)
        .with_prompt(format!(
            "Post {}/{} for {}?",
            record.score, bounds.max, record.student_name
        ))
        .default(true)
        .interact()?;
    if post {
        session.post_record(&record)?;
        println!("Grade posted.");
    }
    Ok(())
}
