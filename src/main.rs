//! # canvas-grader
//!
//! Grades a Canvas discussion assignment from a terminal.
//!
//! Pass the SpeedGrader URL of the assignment (or pick the course and
//! assignment from a menu), review the proposed grades and post them.

use anyhow::{Context, Result};
use bpaf::*;
use canvas_discussion_grader::course::choose_page;
use canvas_discussion_grader::{
    Canvas, CanvasCredentials, GraderConfig, GradingSession, IntroRubric, RuleSet, SpeedGraderUrl,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dotenvy::dotenv;
use std::path::PathBuf;

mod logger;
mod panel;

/// Command line options.
#[derive(Debug, Clone)]
struct Options {
    /// Use the introduction rubric instead of the participation rules
    intro: bool,
    /// Grade only the student open in the URL
    single: bool,
    /// Alternative config file
    config: Option<PathBuf>,
    /// SpeedGrader URL
    url: Option<String>,
}

fn options() -> Options {
    let intro = long("intro")
        .help("Grade with the introduction rubric")
        .switch();
    let single = long("single")
        .help("Grade and post only the student in the URL")
        .switch();
    let config = long("config")
        .help("Read settings from PATH instead of the default config file")
        .argument::<PathBuf>("PATH")
        .optional();
    let url = positional::<String>("URL")
        .help("SpeedGrader URL of the discussion assignment")
        .optional();

    construct!(Options {
        intro,
        single,
        config,
        url
    })
    .to_options()
    .descr("Grade Canvas discussion participation and post the grades")
    .run()
}

fn resolve_page(canvas: &Canvas, url: Option<String>) -> Result<Option<SpeedGraderUrl>> {
    if let Some(url) = url {
        return Ok(Some(SpeedGraderUrl::parse(&url)?));
    }
    let url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("SpeedGrader URL (leave empty to choose from your courses)")
        .allow_empty(true)
        .interact_text()?;
    if url.trim().is_empty() {
        Ok(choose_page(canvas)?)
    } else {
        Ok(Some(SpeedGraderUrl::parse(&url)?))
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    logger::init_logging();

    let opts = options();
    let mut config =
        GraderConfig::load(opts.config.as_deref()).context("Failed to load configuration")?;
    if opts.intro && !matches!(config.rules, RuleSet::Intro(_)) {
        config.rules = RuleSet::Intro(IntroRubric::default());
    }

    let credentials = CanvasCredentials::credentials()?;
    let canvas = Canvas::new(credentials);

    let Some(page) = resolve_page(&canvas, opts.url)? else {
        return Ok(());
    };
    let snapshot_dir = config.snapshot_dir();
    let mut session =
        GradingSession::open(&canvas, &page, config.rules.clone(), snapshot_dir.as_deref())
            .with_context(|| format!("Failed to open assignment {}", page.assignment_id))?;
    tracing::info!(
        course = page.course_id,
        assignment = page.assignment_id,
        "grading {}",
        session.context().assignment_name
    );

    let mut rng = rand::thread_rng();
    if opts.single {
        panel::run_single(&mut session, &page, &mut rng)
    } else {
        panel::run_queue(&mut session, &page, &config.pacing, &mut rng)
    }
}
