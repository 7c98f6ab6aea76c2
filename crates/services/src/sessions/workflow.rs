use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AnswerSheet, QuestionBank, QuizConfig, QuizSession, ScoreSummary};
use quiz_core::Clock;
use storage::{SessionRecord, SessionStateRepository, Storage};

use super::builder::SessionBuilder;
use super::runner::SessionRunner;
use crate::error::SessionError;
use crate::stats_service::StatsService;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// The three phases of a run, as an explicit state machine.
///
/// Transitions go through `QuizFlow` methods only; an operation called in
/// the wrong phase is an error rather than a silently ignored click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizPhase {
    #[default]
    Setup,
    Quiz,
    Results,
}

impl QuizPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizPhase::Setup => "setup",
            QuizPhase::Quiz => "quiz",
            QuizPhase::Results => "results",
        }
    }
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

/// Orchestrates the setup → quiz → results flow against storage.
///
/// Every record-relevant mutation re-persists the in-progress blob
/// fire-and-forget; a failed write is logged and the run continues.
pub struct QuizFlow {
    clock: Clock,
    bank: QuestionBank,
    sessions: Arc<dyn SessionStateRepository>,
    stats: StatsService,
    phase: QuizPhase,
    runner: Option<SessionRunner>,
    last_summary: Option<ScoreSummary>,
}

impl QuizFlow {
    #[must_use]
    pub fn new(clock: Clock, bank: QuestionBank, storage: &Storage) -> Self {
        Self {
            clock,
            bank,
            sessions: Arc::clone(&storage.sessions),
            stats: StatsService::new(clock, Arc::clone(&storage.stats)),
            phase: QuizPhase::Setup,
            runner: None,
            last_summary: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn runner(&self) -> Option<&SessionRunner> {
        self.runner.as_ref()
    }

    #[must_use]
    pub fn last_summary(&self) -> Option<&ScoreSummary> {
        self.last_summary.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &StatsService {
        &self.stats
    }

    /// Try to pick up a stored in-progress session.
    ///
    /// Stored ids that vanished from the bank are dropped; if nothing
    /// survives, or the record no longer maps onto the domain, there is
    /// nothing to resume and the flow stays in setup.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the setup phase and
    /// `SessionError::Storage` for storage faults beyond "absent".
    pub fn resume(&mut self) -> Result<bool, SessionError> {
        self.require_phase(QuizPhase::Setup, "resume a session")?;

        let Some(record) = self.sessions.load_session()? else {
            return Ok(false);
        };
        let config = match record.config() {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring stored session that no longer maps onto the domain: {err}");
                return Ok(false);
            }
        };
        let started_at = match record.started_at_utc() {
            Ok(at) => at,
            Err(err) => {
                log::warn!("ignoring stored session with a bad timestamp: {err}");
                return Ok(false);
            }
        };

        let questions = self.bank.select_by_ids(&record.question_ids);
        if questions.is_empty() {
            return Ok(false);
        }

        let session = QuizSession::new(record.seed.clone(), questions, started_at);
        let sheet = AnswerSheet::from_persisted(&session, &record.answers, &record.flagged);
        self.runner = Some(SessionRunner::resume(
            config,
            session,
            sheet,
            record.current_index,
        ));
        self.last_summary = None;
        self.phase = QuizPhase::Quiz;
        Ok(true)
    }

    /// Build and start a new session from `config`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` when a run is already in progress.
    pub fn start(&mut self, config: QuizConfig) -> Result<(), SessionError> {
        if self.phase == QuizPhase::Quiz {
            return Err(SessionError::Phase {
                operation: "start a session",
                phase: self.phase,
            });
        }
        let session = SessionBuilder::new(self.bank.questions()).build(&config, self.clock.now());
        self.install(SessionRunner::new(config, session));
        Ok(())
    }

    /// Record a choice for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase, plus the
    /// runner's own errors.
    pub fn select_answer(&mut self, choice: usize) -> Result<(), SessionError> {
        self.quiz_runner_mut("answer a question")?.select_answer(choice)?;
        self.persist();
        Ok(())
    }

    /// Flip the flag on the current question; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase, plus the
    /// runner's own errors.
    pub fn toggle_flag(&mut self) -> Result<bool, SessionError> {
        let flagged = self.quiz_runner_mut("flag a question")?.toggle_flag()?;
        self.persist();
        Ok(flagged)
    }

    /// Flip the reveal on the current question; returns the new state.
    ///
    /// Reveals are ephemeral, so nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase, plus the
    /// runner's own errors.
    pub fn toggle_reveal(&mut self) -> Result<bool, SessionError> {
        self.quiz_runner_mut("reveal an explanation")?.toggle_reveal()
    }

    /// Advance to the next question; returns false at the end.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        let moved = self.quiz_runner_mut("navigate")?.next();
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    /// Step back to the previous question; returns false at the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        let moved = self.quiz_runner_mut("navigate")?.previous();
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    /// Score the run, fold it into lifetime stats and show results.
    ///
    /// The in-progress blob is left in place, matching a close-and-reopen
    /// landing back on the finished run until the user resets.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the quiz phase.
    pub fn finish(&mut self) -> Result<&ScoreSummary, SessionError> {
        if self.phase != QuizPhase::Quiz {
            return Err(SessionError::Phase {
                operation: "finish the run",
                phase: self.phase,
            });
        }
        let runner = self.runner.as_ref().ok_or(SessionError::NoCurrentQuestion)?;
        let summary = runner.score();
        self.stats.record_run(&summary);
        self.phase = QuizPhase::Results;
        Ok(self.last_summary.insert(summary))
    }

    /// Start a fresh run with the same settings and a new seed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the results phase.
    pub fn retry_same_settings(&mut self) -> Result<(), SessionError> {
        self.require_phase(QuizPhase::Results, "retry the run")?;
        let runner = self.runner.as_ref().ok_or(SessionError::NoCurrentQuestion)?;

        let mut config = runner.config().clone();
        config.seed = None;
        let session = SessionBuilder::new(self.bank.questions()).build(&config, self.clock.now());
        self.install(SessionRunner::new(config, session));
        Ok(())
    }

    /// Start a drill over the questions just answered wrong or skipped.
    ///
    /// Returns the number of questions drawn; zero mistakes leaves the
    /// results phase untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the results phase.
    pub fn review_mistakes(&mut self) -> Result<usize, SessionError> {
        self.require_phase(QuizPhase::Results, "review mistakes")?;
        let runner = self.runner.as_ref().ok_or(SessionError::NoCurrentQuestion)?;

        let mistakes = runner.mistakes();
        if mistakes.is_empty() {
            return Ok(0);
        }

        let mut config = runner.config().clone();
        config.count = mistakes.len();
        config.seed = None;
        let session = SessionBuilder::new(&mistakes).build(&config, self.clock.now());
        let drawn = session.len();
        self.install(SessionRunner::new(config, session));
        Ok(drawn)
    }

    /// Return to the setup screen, keeping the finished run's state around.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Phase` outside the results phase.
    pub fn back_to_setup(&mut self) -> Result<(), SessionError> {
        self.require_phase(QuizPhase::Results, "return to setup")?;
        self.phase = QuizPhase::Setup;
        Ok(())
    }

    /// Drop all run state and the stored session blob.
    ///
    /// Valid in any phase; a failed clear is logged and ignored.
    pub fn reset(&mut self) {
        if let Err(err) = self.sessions.clear_session() {
            log::warn!("failed to clear stored session: {err}");
        }
        self.runner = None;
        self.last_summary = None;
        self.phase = QuizPhase::Setup;
    }

    fn install(&mut self, runner: SessionRunner) {
        self.runner = Some(runner);
        self.last_summary = None;
        self.phase = QuizPhase::Quiz;
        self.persist();
    }

    fn require_phase(
        &self,
        expected: QuizPhase,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn quiz_runner_mut(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut SessionRunner, SessionError> {
        if self.phase != QuizPhase::Quiz {
            return Err(SessionError::Phase {
                operation,
                phase: self.phase,
            });
        }
        self.runner.as_mut().ok_or(SessionError::NoCurrentQuestion)
    }

    fn persist(&self) {
        let Some(runner) = &self.runner else { return };
        let record = SessionRecord::capture(
            runner.config(),
            runner.session(),
            runner.sheet(),
            runner.current_index(),
        );
        if let Err(err) = self.sessions.save_session(&record) {
            log::warn!("failed to persist session state: {err}");
        }
    }
}

impl fmt::Debug for QuizFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizFlow")
            .field("phase", &self.phase)
            .field("bank_len", &self.bank.len())
            .field("has_runner", &self.runner.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuestionId, TagName};
    use quiz_core::time::fixed_clock;
    use storage::StatsRepository;

    fn bank(count: usize) -> QuestionBank {
        let questions = (0..count)
            .map(|i| {
                QuestionDraft {
                    id: QuestionId::new(format!("q{i}")),
                    section: "Basics".to_string(),
                    tags: vec![TagName::new("accounts").unwrap()],
                    difficulty: Difficulty::Foundation,
                    prompt: format!("Prompt {i}"),
                    choices: vec!["A".to_string(), "B".to_string()],
                    answer_index: 0,
                    explanation: "Because.".to_string(),
                    deep_dive: None,
                }
                .validate()
                .unwrap()
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    fn config(count: usize) -> QuizConfig {
        let mut config = QuizConfig::default();
        config.count = count;
        config.difficulties = vec![Difficulty::Foundation];
        config.seed = Some("fixed".to_string());
        config
    }

    fn flow(bank_size: usize) -> (QuizFlow, Storage) {
        let storage = Storage::in_memory();
        let flow = QuizFlow::new(fixed_clock(), bank(bank_size), &storage);
        (flow, storage)
    }

    #[test]
    fn phase_machine_rejects_out_of_phase_operations() {
        let (mut flow, _storage) = flow(4);
        assert_eq!(flow.phase(), QuizPhase::Setup);

        assert!(matches!(
            flow.finish().unwrap_err(),
            SessionError::Phase { phase: QuizPhase::Setup, .. }
        ));
        assert!(matches!(
            flow.select_answer(0).unwrap_err(),
            SessionError::Phase { .. }
        ));

        flow.start(config(3)).unwrap();
        assert_eq!(flow.phase(), QuizPhase::Quiz);
        assert!(matches!(
            flow.start(config(3)).unwrap_err(),
            SessionError::Phase { phase: QuizPhase::Quiz, .. }
        ));
        assert!(matches!(
            flow.retry_same_settings().unwrap_err(),
            SessionError::Phase { .. }
        ));

        flow.finish().unwrap();
        assert_eq!(flow.phase(), QuizPhase::Results);
        assert!(matches!(
            flow.resume().unwrap_err(),
            SessionError::Phase { .. }
        ));
    }

    #[test]
    fn start_persists_and_finish_records_stats() {
        let (mut flow, storage) = flow(4);
        flow.start(config(3)).unwrap();

        let stored = storage.sessions.load_session().unwrap().expect("persisted");
        assert_eq!(stored.question_ids.len(), 3);
        assert_eq!(stored.seed, "fixed");

        flow.select_answer(0).unwrap();
        flow.next().unwrap();
        flow.select_answer(1).unwrap();

        let summary = flow.finish().unwrap();
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.correct(), 1);

        let stats = storage.stats.load_stats().unwrap();
        assert_eq!(stats.total_runs, 1);
        assert_eq!(stats.total_answered, 3);
        assert_eq!(stats.total_correct, 1);
    }

    #[test]
    fn resume_restores_answers_flags_and_cursor() {
        let storage = Storage::in_memory();
        {
            let mut flow = QuizFlow::new(fixed_clock(), bank(4), &storage);
            flow.start(config(3)).unwrap();
            flow.select_answer(0).unwrap();
            flow.toggle_flag().unwrap();
            flow.next().unwrap();
        }

        let mut revived = QuizFlow::new(fixed_clock(), bank(4), &storage);
        assert!(revived.resume().unwrap());
        assert_eq!(revived.phase(), QuizPhase::Quiz);

        let runner = revived.runner().expect("runner");
        assert_eq!(runner.current_index(), 1);
        assert_eq!(runner.sheet().answered_count(), 1);
        assert_eq!(runner.sheet().flagged().len(), 1);
        assert_eq!(runner.session().seed(), "fixed");
    }

    #[test]
    fn resume_with_empty_storage_reports_nothing() {
        let (mut flow, _storage) = flow(4);
        assert!(!flow.resume().unwrap());
        assert_eq!(flow.phase(), QuizPhase::Setup);
    }

    #[test]
    fn resume_drops_sessions_whose_questions_vanished() {
        let storage = Storage::in_memory();
        {
            let mut flow = QuizFlow::new(fixed_clock(), bank(3), &storage);
            flow.start(config(3)).unwrap();
        }

        // A rebuilt flow with an empty bank cannot map any stored id.
        let mut revived = QuizFlow::new(fixed_clock(), bank(0), &storage);
        assert!(!revived.resume().unwrap());
        assert_eq!(revived.phase(), QuizPhase::Setup);
    }

    #[test]
    fn review_mistakes_draws_only_wrong_or_skipped_questions() {
        let (mut flow, _storage) = flow(4);
        flow.start(config(4)).unwrap();

        // Answer the first correctly, the second wrong, skip the rest.
        flow.select_answer(0).unwrap();
        flow.next().unwrap();
        flow.select_answer(1).unwrap();
        flow.finish().unwrap();

        let drawn = flow.review_mistakes().unwrap();
        assert_eq!(drawn, 3);
        assert_eq!(flow.phase(), QuizPhase::Quiz);
        let runner = flow.runner().expect("runner");
        assert_eq!(runner.session().len(), 3);
        assert_eq!(runner.config().count, 3);
    }

    #[test]
    fn review_mistakes_with_a_perfect_run_stays_on_results() {
        let (mut flow, _storage) = flow(2);
        flow.start(config(2)).unwrap();
        flow.select_answer(0).unwrap();
        flow.next().unwrap();
        flow.select_answer(0).unwrap();
        flow.finish().unwrap();

        assert_eq!(flow.review_mistakes().unwrap(), 0);
        assert_eq!(flow.phase(), QuizPhase::Results);
    }

    #[test]
    fn retry_clears_the_seed_for_a_fresh_draw() {
        let (mut flow, _storage) = flow(4);
        flow.start(config(3)).unwrap();
        flow.finish().unwrap();
        flow.retry_same_settings().unwrap();

        let runner = flow.runner().expect("runner");
        assert_eq!(flow.phase(), QuizPhase::Quiz);
        assert!(runner.config().seed.is_none());
        // The generated token replaces the fixed seed.
        assert_ne!(runner.session().seed(), "fixed");
        assert_eq!(runner.session().len(), 3);
    }

    #[test]
    fn reset_clears_storage_and_returns_to_setup() {
        let (mut flow, storage) = flow(4);
        flow.start(config(3)).unwrap();
        assert!(storage.sessions.load_session().unwrap().is_some());

        flow.reset();
        assert_eq!(flow.phase(), QuizPhase::Setup);
        assert!(flow.runner().is_none());
        assert!(storage.sessions.load_session().unwrap().is_none());
    }
}
