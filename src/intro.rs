//! Rubric for "introduce yourself" discussions.
//!
//! Each criterion is worth one point and counts as met when any of its
//! patterns matches the lowercased initial post. A substantive reply to a
//! peer earns a bonus; a late introduction costs points.

use crate::grading::{BreakdownLine, GradeOutcome, ScoreBounds};
use crate::words::count_words;
use crate::{GraderError, Post};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub struct Criterion {
    pub label: &'static str,
    pub points: i32,
    patterns: Vec<Regex>,
}

impl Criterion {
    fn new(label: &'static str, patterns: &[&str]) -> Self {
        Criterion {
            label,
            points: 1,
            patterns: patterns
                .iter()
                .map(|pattern| Regex::new(pattern).unwrap())
                .collect(),
        }
    }

    pub fn is_met(&self, lowercase_text: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.is_match(lowercase_text))
    }
}

pub static CRITERIA: Lazy<Vec<Criterion>> = Lazy::new(|| {
    vec![
        Criterion::new(
            "Why are you taking this class?",
            &[
                r"taking.*class",
                r"enroll.*class",
                r"i.*take.*class",
                r"i.*signed.*up",
                r"require.*for.*degree",
                r"because.*class",
            ],
        ),
        Criterion::new(
            "Educational background",
            &[
                r"i.*studied",
                r"i.*have.*degree",
                r"i.*graduated",
                r"education.*background",
                r"college.*major",
                r"my.*education",
                r"currently.*attending",
                r"enrolled.*college",
                r"taking.*classes",
                r"quarter.*here",
                r"semester.*here",
                r"school.*history",
            ],
        ),
        Criterion::new(
            "Career aspirations",
            &[
                r"want.*be",
                r"plan.*career",
                r"career.*goal",
                r"i.*hope.*to.*work",
                r"eventually.*become",
                r"i.*am.*pursuing.*career",
                r"transfer.*to.*university",
                r"uncertain.*career",
                r"not.*sure.*what.*to.*do",
                r"decided.*change.*paths",
                r"my.*aspiration",
                r"hope.*to.*be",
                r"goal.*is.*to.*become",
                r"i.*aspire.*to.*be",
                r"manager.*in.*",
            ],
        ),
        Criterion::new(
            "Interests outside accounting",
            &[
                r"when.*not.*study",
                r"outside.*class",
                r"free.*time",
                r"i.*enjoy",
                r"hobby",
                r"like.*to.*do",
            ],
        ),
        Criterion::new(
            "Work experience",
            &[
                r"i.*work",
                r"worked.*as",
                r"job",
                r"employment",
                r"experience.*with",
                r"my.*career.*so.*far",
                r"before.*attending",
                r"i.*studied.*as",
                r"previous.*field",
                r"prior.*background",
            ],
        ),
        Criterion::new(
            "Pursuing degree or certificate",
            &[
                r"working.*degree",
                r"getting.*certificate",
                r"enrolled.*program",
                r"i.*am.*earning",
                r"completing.*degree",
                r"studying.*for.*certificate",
                r"earn.*degree",
                r"associate.*degree",
                r"bachelor.*degree",
                r"certificate.*program",
                r"transfer.*to.*university",
                r"currently.*pursuing",
                r"finish.*studies",
            ],
        ),
    ]
});

const GREETINGS: &[&str] = &[
    "Thanks for introducing yourself!",
    "Welcome to the class!",
    "Glad to have you on board!",
    "Appreciate your thoughtful intro.",
    "Looking forward to seeing your work this quarter!",
    "Thanks for sharing your background!",
    "Sounds like you're bringing great experience.",
    "Hope this class helps with your goals!",
    "Nice to meet you virtually!",
    "Excited to have you in the course!",
    "Wishing you a great start to the quarter!",
    "Glad you're part of our learning community!",
    "Appreciate the detail in your post!",
    "You're off to a strong start!",
    "Thanks for sharing your story with us!",
    "Hope this course supports your journey!",
    "Great to see your enthusiasm!",
    "Looking forward to your insights!",
    "Thanks for making the effort to connect!",
    "Happy to have you here with us!",
];

/// Scoring knobs for the introduction rubric.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IntroRubric {
    pub late_penalty: u8,
    /// Hours added to the initial post time before comparing with the due date.
    pub late_grace_hours: i64,
    pub reply_bonus: u8,
    /// A reply must have strictly more words than this to earn the bonus.
    pub reply_min_words: usize,
    pub max_score: u8,
}

impl Default for IntroRubric {
    fn default() -> Self {
        IntroRubric {
            late_penalty: 2,
            late_grace_hours: 3,
            reply_bonus: 4,
            reply_min_words: 5,
            max_score: 10,
        }
    }
}

impl IntroRubric {
    pub fn bounds(&self) -> ScoreBounds {
        ScoreBounds {
            min: 0,
            max: self.max_score,
        }
    }

    /// Grades an introduction. The earliest post is the introduction and
    /// the next earliest is the student's first reply, whatever order
    /// `posts` arrives in.
    pub fn grade<R: Rng + ?Sized>(
        &self,
        posts: &[Post],
        due_at: Option<DateTime<Utc>>,
        rng: &mut R,
    ) -> Result<GradeOutcome, GraderError> {
        let mut ordered: Vec<&Post> = posts.iter().collect();
        ordered.sort_by_key(|post| post.created_at);
        let initial = *ordered.first().ok_or(GraderError::NoPosts)?;
        let text = initial.message.to_lowercase();

        let mut breakdown: Vec<BreakdownLine> = CRITERIA
            .iter()
            .map(|criterion| {
                let met = criterion.is_met(&text);
                BreakdownLine {
                    label: criterion.label.to_string(),
                    passed: met,
                    points: if met { criterion.points } else { 0 },
                }
            })
            .collect();

        // The grace window pushes the post time forward rather than the due date back.
        let late = due_at.is_some_and(|due| {
            initial.created_at + Duration::hours(self.late_grace_hours) > due
        });
        if late {
            breakdown.push(BreakdownLine {
                label: "Late post".to_string(),
                passed: false,
                points: -i32::from(self.late_penalty),
            });
        }

        let replied = ordered
            .get(1)
            .is_some_and(|reply| count_words(&reply.message) > self.reply_min_words);
        breakdown.push(BreakdownLine {
            label: "Reply to peer".to_string(),
            passed: replied,
            points: if replied {
                i32::from(self.reply_bonus)
            } else {
                0
            },
        });

        let score = self.total(&breakdown);
        let greeting = GREETINGS.choose(rng).copied().unwrap_or(GREETINGS[0]);
        let comment = self.compose_comment(greeting, &breakdown, score);

        Ok(GradeOutcome {
            score,
            comment,
            breakdown,
            initial_word_count: count_words(&initial.message),
        })
    }

    /// Sum of the breakdown, late penalty and reply bonus included, clamped.
    pub fn total(&self, breakdown: &[BreakdownLine]) -> u8 {
        let raw: i64 = breakdown.iter().map(|line| i64::from(line.points)).sum();
        self.bounds().clamp(raw)
    }

    /// Sets one criterion to `points` (clamped to `0..=criterion.points`)
    /// and recomputes score and comment. Late and reply lines are kept.
    ///
    /// `comment` is the current comment; its greeting is reused.
    pub fn adjust_criterion(
        &self,
        breakdown: &[BreakdownLine],
        comment: &str,
        label: &str,
        points: i32,
    ) -> Result<(Vec<BreakdownLine>, u8, String), GraderError> {
        let criterion = criterion_by_label(label)
            .ok_or_else(|| GraderError::UnknownCriterion(label.to_string()))?;
        let points = points.clamp(0, criterion.points);

        let mut breakdown = breakdown.to_vec();
        let line = breakdown
            .iter_mut()
            .find(|line| line.label == criterion.label)
            .ok_or_else(|| GraderError::UnknownCriterion(label.to_string()))?;
        line.points = points;
        line.passed = points > 0;

        let score = self.total(&breakdown);
        let greeting = GREETINGS
            .iter()
            .copied()
            .find(|greeting| comment.starts_with(greeting))
            .unwrap_or(GREETINGS[0]);
        let comment = self.compose_comment(greeting, &breakdown, score);
        Ok((breakdown, score, comment))
    }

    fn compose_comment(&self, greeting: &str, breakdown: &[BreakdownLine], score: u8) -> String {
        let missing: Vec<&str> = breakdown
            .iter()
            .filter(|line| !line.passed)
            .map(|line| line.label.as_str())
            .collect();
        if missing.is_empty() {
            format!(
                "{} Great job addressing all parts of the introduction. Full credit earned.",
                greeting
            )
        } else {
            format!(
                "{} Your post was missing some required parts: {}. Score: {}/{}.",
                greeting,
                missing.join(", "),
                score,
                self.max_score
            )
        }
    }
}

/// The rubric criterion with this label, if any.
pub fn criterion_by_label(label: &str) -> Option<&'static Criterion> {
    CRITERIA.iter().find(|criterion| criterion.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::tests::{post_at, words};
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;

    const FULL_INTRO: &str = "<p>I am taking this class because it is required. \
        I graduated high school in 2019 and I have a degree in art. \
        My career goal is to become a CPA. In my free time I enjoy hiking. \
        I worked as a cashier. I am working toward my degree.</p>";

    fn due() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap())
    }

    #[test]
    fn complete_intro_with_reply_earns_full_credit() {
        let posts = [
            post_at(1, FULL_INTRO.to_string(), 9, 8),
            post_at(2, words(12), 10, 8),
        ];
        let outcome = IntroRubric::default()
            .grade(&posts, due(), &mut StepRng::new(0, 0))
            .unwrap();

        assert_eq!(outcome.score, 10);
        assert_eq!(
            outcome.comment,
            "Thanks for introducing yourself! Great job addressing all parts of the introduction. Full credit earned."
        );
    }

    #[test]
    fn late_intro_without_reply_clamps_at_zero() {
        let posts = [post_at(1, "<p>hello</p>".to_string(), 11, 8)];
        let outcome = IntroRubric::default()
            .grade(&posts, due(), &mut StepRng::new(0, 0))
            .unwrap();

        assert_eq!(outcome.score, 0);
        assert!(outcome.comment.contains("Late post"));
        assert!(outcome.comment.contains("Reply to peer"));
        assert!(outcome.comment.ends_with("Score: 0/10."));
    }

    #[test]
    fn grace_window_counts_against_posts_near_deadline() {
        // Two hours before the due date, but inside the three hour window.
        let posts = [
            post_at(1, FULL_INTRO.to_string(), 10, 10),
            post_at(2, words(12), 10, 11),
        ];
        let outcome = IntroRubric::default()
            .grade(&posts, due(), &mut StepRng::new(0, 0))
            .unwrap();
        assert_eq!(outcome.score, 8);
    }

    #[test]
    fn short_reply_earns_no_bonus() {
        let posts = [
            post_at(1, FULL_INTRO.to_string(), 9, 8),
            post_at(2, words(5), 10, 8),
        ];
        let outcome = IntroRubric::default()
            .grade(&posts, None, &mut StepRng::new(0, 0))
            .unwrap();
        assert_eq!(outcome.score, 6);
        assert!(outcome.comment.contains("missing some required parts: Reply to peer."));
    }

    #[test]
    fn unsorted_posts_use_earliest_as_introduction() {
        let intro = post_at(1, FULL_INTRO.to_string(), 9, 8);
        let reply = post_at(2, words(12), 10, 8);
        let rubric = IntroRubric::default();

        let sorted = rubric
            .grade(&[intro.clone(), reply.clone()], due(), &mut StepRng::new(0, 0))
            .unwrap();
        let reversed = rubric
            .grade(&[reply, intro], due(), &mut StepRng::new(0, 0))
            .unwrap();
        assert_eq!(reversed.score, 10);
        assert_eq!(reversed, sorted);
    }

    #[test]
    fn adjusting_a_criterion_recomputes_score_and_comment() {
        let rubric = IntroRubric::default();
        let posts = [post_at(1, FULL_INTRO.to_string(), 10, 10)];
        let outcome = rubric
            .grade(&posts, due(), &mut StepRng::new(0, 0))
            .unwrap();
        // Six criteria, late, no reply.
        assert_eq!(outcome.score, 4);

        let (breakdown, score, comment) = rubric
            .adjust_criterion(&outcome.breakdown, &outcome.comment, "Work experience", 0)
            .unwrap();
        assert_eq!(score, 3);
        assert!(breakdown.iter().any(|l| l.label == "Late post" && l.points == -2));
        assert!(comment.starts_with("Thanks for introducing yourself!"));
        assert!(comment.contains("missing some required parts: Work experience, Late post"));
        assert!(comment.ends_with("Score: 3/10."));

        // Points above the criterion's value are capped.
        let (_, score, _) = rubric
            .adjust_criterion(&breakdown, &comment, "Work experience", 5)
            .unwrap();
        assert_eq!(score, 4);
    }

    #[test]
    fn adjusting_unknown_criterion_fails() {
        let rubric = IntroRubric::default();
        assert!(matches!(
            rubric.adjust_criterion(&[], "", "Late post", 1),
            Err(GraderError::UnknownCriterion(_))
        ));
    }

    #[test]
    fn criteria_match_case_insensitively() {
        let hobby = CRITERIA
            .iter()
            .find(|c| c.label == "Interests outside accounting")
            .unwrap();
        assert!(hobby.is_met(&"My HOBBY is chess".to_lowercase()));
        assert!(!hobby.is_met("nothing relevant"));
    }
}
