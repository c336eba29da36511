//! Participation heuristic and the rule-set switch.
//!
//! Scoring is deterministic. Only the congratulatory phrase used when no
//! deduction fires is random, and the random source is passed in by the
//! caller so tests can pin it.

use crate::words::count_words;
use crate::{GraderError, IntroRubric, Post};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive bounds a score is clamped into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBounds {
    pub min: u8,
    pub max: u8,
}

impl ScoreBounds {
    /// Clamps into `[min, max]`. Inverted bounds never panic: `max` wins.
    pub fn clamp(&self, raw: i64) -> u8 {
        raw.max(i64::from(self.min)).min(i64::from(self.max)) as u8
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// One row of a grading breakdown.
///
/// `points` is the signed change this rule applied to the score; a rule that
/// did not fire carries 0 (for deductions) or the points withheld (for the
/// rubric, where `passed == false` means the criterion earned nothing).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BreakdownLine {
    pub label: String,
    pub passed: bool,
    pub points: i32,
}

/// Result of grading one student's posts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub score: u8,
    pub comment: String,
    pub breakdown: Vec<BreakdownLine>,
    pub initial_word_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

impl WordRange {
    pub fn contains(&self, words: usize) -> bool {
        (self.min..=self.max).contains(&words)
    }
}

impl Default for WordRange {
    fn default() -> Self {
        WordRange { min: 100, max: 165 }
    }
}

const SOLID_PRAISE: &[&str] = &[
    "Great job!",
    "Nice work!",
    "Well done!",
    "Good work on this discussion!",
    "Thoughtful post, thanks for sharing!",
];

const OUTSTANDING_PRAISE: &[&str] = &[
    "Outstanding participation!",
    "Excellent engagement with your classmates!",
    "Fantastic discussion work!",
    "Superb contributions throughout the discussion!",
    "Impressive back-and-forth with your peers!",
];

/// The participation rule set used by the batch grader.
///
/// Deductions are independent and each fires at most once. The score starts
/// at `max_score` and is floored at `min_score`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParticipationRules {
    pub word_range: WordRange,
    pub word_count_penalty: u8,
    pub min_posts: usize,
    pub too_few_posts_penalty: u8,
    pub late_penalty: u8,
    /// Minutes after the due date before a post counts as late.
    pub late_grace_minutes: i64,
    /// Post count at which a clean grade earns the "outstanding" phrases.
    pub praise_post_count: usize,
    pub max_score: u8,
    pub min_score: u8,
}

impl Default for ParticipationRules {
    fn default() -> Self {
        ParticipationRules {
            word_range: WordRange::default(),
            word_count_penalty: 2,
            min_posts: 2,
            too_few_posts_penalty: 4,
            late_penalty: 5,
            late_grace_minutes: 0,
            praise_post_count: 3,
            max_score: 10,
            min_score: 2,
        }
    }
}

impl ParticipationRules {
    pub fn bounds(&self) -> ScoreBounds {
        ScoreBounds {
            min: self.min_score,
            max: self.max_score,
        }
    }

    /// Grades a student's posts, which must be sorted oldest first.
    pub fn grade<R: Rng + ?Sized>(
        &self,
        posts: &[Post],
        due_at: Option<DateTime<Utc>>,
        rng: &mut R,
    ) -> Result<GradeOutcome, GraderError> {
        let initial = posts
            .iter()
            .min_by_key(|post| post.created_at)
            .ok_or(GraderError::NoPosts)?;
        let words = count_words(&initial.message);

        let out_of_range = !self.word_range.contains(words);
        let too_few = posts.len() < self.min_posts;
        let late = due_at.is_some_and(|due| {
            initial.created_at > due + Duration::minutes(self.late_grace_minutes)
        });

        let mut score = i64::from(self.max_score);
        let mut breakdown = Vec::with_capacity(3);
        let mut clauses = Vec::new();

        let mut apply = |fired: bool, penalty: u8, label: String, clause: String| {
            if fired {
                score -= i64::from(penalty);
                clauses.push(clause);
            }
            breakdown.push(BreakdownLine {
                label,
                passed: !fired,
                points: if fired { -i32::from(penalty) } else { 0 },
            });
        };

        apply(
            out_of_range,
            self.word_count_penalty,
            format!(
                "Initial post word count within {}-{} ({} words)",
                self.word_range.min, self.word_range.max, words
            ),
            format!(
                "Your initial post was {} words, which is outside the expected {}-{} word range.",
                words, self.word_range.min, self.word_range.max
            ),
        );
        apply(
            too_few,
            self.too_few_posts_penalty,
            format!("At least {} posts ({} made)", self.min_posts, posts.len()),
            if posts.len() == 1 {
                "Only one post was submitted, which impacts participation.".to_string()
            } else {
                format!(
                    "Only {} posts were submitted, which impacts participation.",
                    posts.len()
                )
            },
        );
        apply(
            late,
            self.late_penalty,
            "Initial post on time".to_string(),
            "The initial post was made after the deadline.".to_string(),
        );

        let score = self.bounds().clamp(score);
        let closing = if clauses.is_empty() {
            let pool = if posts.len() >= self.praise_post_count {
                OUTSTANDING_PRAISE
            } else {
                SOLID_PRAISE
            };
            let praise = pool.choose(rng).copied().unwrap_or("Great job!");
            format!("{} Score: {}/{}.", praise, score, self.max_score)
        } else {
            format!("Your final score is {}/{}.", score, self.max_score)
        };
        clauses.push(closing);

        Ok(GradeOutcome {
            score,
            comment: clauses.join(" "),
            breakdown,
            initial_word_count: words,
        })
    }
}

/// The rule set a session grades with.
///
/// Configured in TOML as `[rules]` with `kind = "participation"` or
/// `kind = "intro"` plus that rule set's fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSet {
    Participation(ParticipationRules),
    Intro(IntroRubric),
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet::Participation(ParticipationRules::default())
    }
}

impl RuleSet {
    /// The `kind` tag used in configuration and snapshot file names.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleSet::Participation(_) => "participation",
            RuleSet::Intro(_) => "intro",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleSet::Participation(_) => "participation",
            RuleSet::Intro(_) => "introduction rubric",
        }
    }

    pub fn bounds(&self) -> ScoreBounds {
        match self {
            RuleSet::Participation(rules) => rules.bounds(),
            RuleSet::Intro(rubric) => rubric.bounds(),
        }
    }

    /// Rejects settings that parse but cannot be graded with.
    pub fn validate(&self) -> Result<(), GraderError> {
        let bounds = self.bounds();
        if !bounds.is_ordered() {
            return Err(GraderError::InvalidRules(format!(
                "minimum score {} is above maximum score {}",
                bounds.min, bounds.max
            )));
        }
        if let RuleSet::Participation(rules) = self {
            if rules.word_range.min > rules.word_range.max {
                return Err(GraderError::InvalidRules(format!(
                    "word range {}-{} is empty",
                    rules.word_range.min, rules.word_range.max
                )));
            }
        }
        Ok(())
    }

    pub fn grade<R: Rng + ?Sized>(
        &self,
        posts: &[Post],
        due_at: Option<DateTime<Utc>>,
        rng: &mut R,
    ) -> Result<GradeOutcome, GraderError> {
        match self {
            RuleSet::Participation(rules) => rules.grade(posts, due_at, rng),
            RuleSet::Intro(rubric) => rubric.grade(posts, due_at, rng),
        }
    }
}
