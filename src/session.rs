use crate::assignment::resolve_context;
use crate::discussion::{group_by_author, load_posts, posts_by_student};
use crate::poster::{post_all, PostReport};
use crate::surface::{GradingSurface, Pacing};
use crate::{
    AssignmentContext, CanvasApi, CanvasSpeedGrader, GradeRecord, GradeSubmission, GraderError,
    GradingQueue, RecordState, Roster, RuleSet, SnapshotStore, SpeedGraderUrl,
};
use rand::Rng;

/// One grading session for one assignment.
///
/// Owns everything the panel works with: the resolved assignment, the rule
/// set, the roster name cache, the queue and its snapshot. Every queue
/// change is saved to the snapshot before the method returns.
pub struct GradingSession<'a> {
    api: &'a dyn CanvasApi,
    context: AssignmentContext,
    rules: RuleSet,
    roster: Roster,
    queue: GradingQueue,
    store: Option<SnapshotStore>,
}

impl<'a> GradingSession<'a> {
    /// Resolves the assignment named by `page`. Nothing is graded yet.
    ///
    /// With `snapshot_dir` set, the queue is persisted under it.
    pub fn open(
        api: &'a dyn CanvasApi,
        page: &SpeedGraderUrl,
        rules: RuleSet,
        snapshot_dir: Option<&std::path::Path>,
    ) -> Result<Self, GraderError> {
        rules.validate()?;
        let context = resolve_context(api, page)?;
        let store = snapshot_dir.map(|dir| SnapshotStore::for_assignment(dir, &context, &rules));
        let queue = GradingQueue::new(Vec::new(), rules.bounds());
        Ok(GradingSession {
            api,
            context,
            rules,
            roster: Roster::default(),
            queue,
            store,
        })
    }

    pub fn context(&self) -> &AssignmentContext {
        &self.context
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn queue(&self) -> &GradingQueue {
        &self.queue
    }

    pub fn snapshot(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    /// Resumes from the snapshot when there is one, otherwise grades everyone.
    ///
    /// Returns `true` when the queue came from a snapshot.
    pub fn resume_or_build<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool, GraderError> {
        if let Some(store) = &self.store {
            if let Some(records) = store.load()? {
                if !records.is_empty() {
                    log::info!(
                        "resumed {} records from {}",
                        records.len(),
                        store.path().display()
                    );
                    self.queue = GradingQueue::new(records, self.rules.bounds());
                    return Ok(true);
                }
            }
        }
        self.build_queue(rng)?;
        Ok(false)
    }

    /// Fetches every post and grades each student who posted.
    ///
    /// Students without gradable posts never enter the queue. Returns the
    /// number of records built.
    pub fn build_queue<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, GraderError> {
        let posts = load_posts(self.api, &self.context)?;
        self.roster.ensure_loaded(self.api, self.context.course_id);

        let mut records = Vec::new();
        for (student_id, student_posts) in group_by_author(&posts) {
            let record = self.grade_posts(student_id, student_posts, rng)?;
            records.push(record);
        }
        log::info!(
            "graded {} students with the {} rules",
            records.len(),
            self.rules.name()
        );
        self.queue = GradingQueue::new(records, self.rules.bounds());
        self.persist()?;
        Ok(self.queue.len())
    }

    /// Grades one student without touching the queue.
    pub fn grade_student<R: Rng + ?Sized>(
        &mut self,
        student_id: u64,
        rng: &mut R,
    ) -> Result<GradeRecord, GraderError> {
        let posts = posts_by_student(&load_posts(self.api, &self.context)?, student_id);
        if posts.is_empty() {
            return Err(GraderError::StudentHasNoPosts(student_id));
        }
        self.roster.ensure_loaded(self.api, self.context.course_id);
        self.grade_posts(student_id, posts, rng)
    }

    fn grade_posts<R: Rng + ?Sized>(
        &self,
        student_id: u64,
        posts: Vec<crate::Post>,
        rng: &mut R,
    ) -> Result<GradeRecord, GraderError> {
        let outcome = self.rules.grade(&posts, self.context.due_at, rng)?;
        Ok(GradeRecord {
            student_id,
            student_name: self.roster.name_of(student_id),
            score: outcome.score,
            comment: outcome.comment,
            breakdown: outcome.breakdown,
            raw_posts: posts,
            state: RecordState::Pending,
        })
    }

    pub fn approve(&mut self, student_id: u64, score: i64, comment: &str) -> Result<(), GraderError> {
        self.queue.approve(student_id, score, comment)?;
        self.persist()
    }

    pub fn edit(&mut self, student_id: u64) -> Result<(), GraderError> {
        self.queue.edit(student_id)?;
        self.persist()
    }

    pub fn approve_all(&mut self) -> Result<usize, GraderError> {
        let changed = self.queue.approve_all();
        self.persist()?;
        Ok(changed)
    }

    /// Overrides one rubric criterion of a student's record (intro rules only).
    ///
    /// Returns the recomputed score. The record goes back to pending.
    pub fn adjust_criterion(
        &mut self,
        student_id: u64,
        label: &str,
        points: i32,
    ) -> Result<u8, GraderError> {
        let RuleSet::Intro(rubric) = &self.rules else {
            return Err(GraderError::UnknownCriterion(label.to_string()));
        };
        let record = self
            .queue
            .get(student_id)
            .ok_or(GraderError::UnknownStudent(student_id))?;
        let (breakdown, score, comment) =
            rubric.adjust_criterion(&record.breakdown, &record.comment, label, points)?;
        self.queue.revise(student_id, breakdown, score, comment)?;
        self.persist()?;
        Ok(score)
    }

    /// Throws away the queue and its snapshot and grades everyone again.
    pub fn regrade<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, GraderError> {
        self.queue.clear();
        if let Some(store) = &self.store {
            store.clear()?;
        }
        self.build_queue(rng)
    }

    /// A surface over the course roster, positioned on `start_at`.
    pub fn canvas_surface(&mut self, start_at: Option<u64>) -> CanvasSpeedGrader<'a> {
        self.roster.ensure_loaded(self.api, self.context.course_id);
        let mut students: Vec<u64> = self
            .roster
            .in_grading_order()
            .iter()
            .map(|student| student.id)
            .collect();
        // Posters missing from the roster (test students, dropped enrollments) go last.
        for record in self.queue.records() {
            if !students.contains(&record.student_id) {
                students.push(record.student_id);
            }
        }
        CanvasSpeedGrader::new(self.api, &self.context, students, start_at)
    }

    /// Posts every approved record through `surface`.
    ///
    /// The snapshot is saved after each submit and removed once every record
    /// in the queue has been posted.
    pub fn post_all(
        &mut self,
        surface: &mut dyn GradingSurface,
        pacing: &Pacing,
    ) -> Result<PostReport, GraderError> {
        let store = self.store.as_ref();
        let report = post_all(&mut self.queue, surface, pacing, |queue| {
            if let Some(store) = store {
                if let Err(e) = store.save(queue.records()) {
                    log::warn!("could not save snapshot: {}", e);
                }
            }
        });
        if self.queue.all_posted() {
            if let Some(store) = &self.store {
                store.clear()?;
            }
        } else {
            self.persist()?;
        }
        log::info!(
            "posting finished: {} posted, {} failed, {} skipped",
            report.posted,
            report.failed,
            report.skipped
        );
        Ok(report)
    }

    /// Writes one record straight to its submission (single-student mode).
    pub fn post_record(&self, record: &GradeRecord) -> Result<(), GraderError> {
        self.api.post_grade(
            self.context.course_id,
            self.context.assignment_id,
            record.student_id,
            &GradeSubmission::new(record.score, &record.comment),
        )
    }

    fn persist(&self) -> Result<(), GraderError> {
        match &self.store {
            Some(store) => store.save(self.queue.records()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCanvas;
    use crate::{IntroRubric, ParticipationRules};
    use rand::rngs::mock::StepRng;

    fn page() -> SpeedGraderUrl {
        SpeedGraderUrl {
            course_id: 101,
            assignment_id: 202,
            student_id: None,
        }
    }

    fn rules() -> RuleSet {
        RuleSet::Participation(ParticipationRules::default())
    }

    #[test]
    fn build_queue_grades_every_poster() {
        let canvas = FakeCanvas::default();
        let mut session = GradingSession::open(&canvas, &page(), rules(), None).unwrap();
        let built = session.build_queue(&mut StepRng::new(0, 0)).unwrap();

        assert_eq!(built, 3);
        let ada = session.queue().get(1).unwrap();
        assert_eq!(ada.student_name, "Lovelace, Ada");
        assert_eq!(ada.score, 10);
        assert_eq!(ada.raw_posts.len(), 2);

        let bob = session.queue().get(2).unwrap();
        assert_eq!(bob.student_name, "User 2");
        assert_eq!(bob.score, 2);

        // Carl replied once with a short post: word count and single post.
        assert_eq!(session.queue().get(3).unwrap().score, 4);
    }

    #[test]
    fn snapshot_resumes_and_regrade_resets() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FakeCanvas::default();
        {
            let mut session =
                GradingSession::open(&canvas, &page(), rules(), Some(dir.path())).unwrap();
            assert!(!session.resume_or_build(&mut StepRng::new(0, 0)).unwrap());
            session.approve(1, 9, "Edited").unwrap();
        }

        let mut session =
            GradingSession::open(&canvas, &page(), rules(), Some(dir.path())).unwrap();
        assert!(session.resume_or_build(&mut StepRng::new(0, 0)).unwrap());
        let resumed = session.queue().get(1).unwrap();
        assert!(resumed.is_approved());
        assert_eq!(resumed.score, 9);

        session.regrade(&mut StepRng::new(0, 0)).unwrap();
        assert_eq!(session.queue().approved_count(), 0);
        assert_eq!(session.queue().get(1).unwrap().score, 10);
    }

    #[test]
    fn full_post_run_clears_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FakeCanvas::default();
        let mut session =
            GradingSession::open(&canvas, &page(), rules(), Some(dir.path())).unwrap();
        session.build_queue(&mut StepRng::new(0, 0)).unwrap();
        session.approve_all().unwrap();

        let mut surface = session.canvas_surface(None);
        let report = session.post_all(&mut surface, &Pacing::immediate(20)).unwrap();

        assert_eq!(report.posted, 3);
        assert!(session.queue().all_posted());
        assert!(!session.snapshot().unwrap().path().exists());
        assert_eq!(canvas.posted.borrow().len(), 3);
    }

    #[test]
    fn partial_post_run_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FakeCanvas::default();
        let mut session =
            GradingSession::open(&canvas, &page(), rules(), Some(dir.path())).unwrap();
        session.build_queue(&mut StepRng::new(0, 0)).unwrap();
        session.approve(2, 5, "Short and late").unwrap();

        let mut surface = session.canvas_surface(None);
        let report = session.post_all(&mut surface, &Pacing::immediate(20)).unwrap();

        assert_eq!(report.posted, 1);
        assert!(session.snapshot().unwrap().path().exists());
        assert_eq!(session.queue().pending_count(), 2);
    }

    #[test]
    fn single_student_mode() {
        let canvas = FakeCanvas::default();
        let mut session = GradingSession::open(&canvas, &page(), rules(), None).unwrap();
        let record = session.grade_student(2, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(record.score, 2);
        assert!(record.comment.contains("Only one post"));

        session.post_record(&record).unwrap();
        assert_eq!(canvas.posted.borrow()[0].0, 2);

        assert!(matches!(
            session.grade_student(404, &mut StepRng::new(0, 0)),
            Err(GraderError::StudentHasNoPosts(404))
        ));
    }

    #[test]
    fn snapshot_is_not_resumed_under_other_rules() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = FakeCanvas::default();
        {
            let mut session =
                GradingSession::open(&canvas, &page(), rules(), Some(dir.path())).unwrap();
            session.build_queue(&mut StepRng::new(0, 0)).unwrap();
        }

        let intro = RuleSet::Intro(IntroRubric::default());
        let mut session =
            GradingSession::open(&canvas, &page(), intro, Some(dir.path())).unwrap();
        assert!(!session.resume_or_build(&mut StepRng::new(0, 0)).unwrap());
        assert_eq!(session.queue().bounds().min, 0);
    }

    #[test]
    fn criterion_override_updates_intro_record() {
        let canvas = FakeCanvas::default();
        let intro = RuleSet::Intro(IntroRubric::default());
        let mut session = GradingSession::open(&canvas, &page(), intro, None).unwrap();
        session.build_queue(&mut StepRng::new(0, 0)).unwrap();
        let before = session.queue().get(1).unwrap().score;

        let after = session
            .adjust_criterion(1, "Why are you taking this class?", 1)
            .unwrap();
        let record = session.queue().get(1).unwrap();
        assert_eq!(after, before + 1);
        assert_eq!(record.score, after);
        assert_eq!(record.state, RecordState::Pending);

        let mut participation = GradingSession::open(&canvas, &page(), rules(), None).unwrap();
        participation.build_queue(&mut StepRng::new(0, 0)).unwrap();
        assert!(matches!(
            participation.adjust_criterion(1, "Work experience", 1),
            Err(GraderError::UnknownCriterion(_))
        ));
    }

    #[test]
    fn inconsistent_rules_are_rejected_on_open() {
        let canvas = FakeCanvas::default();
        let bad = RuleSet::Participation(ParticipationRules {
            min_score: 12,
            ..ParticipationRules::default()
        });
        assert!(matches!(
            GradingSession::open(&canvas, &page(), bad, None),
            Err(GraderError::InvalidRules(_))
        ));
    }

    #[test]
    fn network_failure_surfaces() {
        let mut canvas = FakeCanvas::default();
        canvas.fail_view = true;
        let mut session = GradingSession::open(&canvas, &page(), rules(), None).unwrap();
        assert!(matches!(
            session.build_queue(&mut StepRng::new(0, 0)),
            Err(GraderError::NetworkFailure { .. })
        ));
    }
}
