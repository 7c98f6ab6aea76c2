use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuizConfig, QuizSession};

use crate::rng::{resolve_seed, Mulberry32};

/// Builds a session by drawing a seeded, shuffled sample from a question
/// list.
///
/// The draw filters by difficulty only; the config's tag list narrows the
/// setup-screen pool preview but deliberately not the draw itself.
pub struct SessionBuilder<'a> {
    questions: &'a [Question],
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(questions: &'a [Question]) -> Self {
        Self { questions }
    }

    /// Build a session snapshot from the config.
    ///
    /// The resolved seed is hashed into a deterministic PRNG; the filtered
    /// pool is Fisher–Yates shuffled and truncated to
    /// `min(config.count, pool.len())`. Same seed + same filtered input
    /// yields the same ordering and selection. An empty pool yields an
    /// empty session.
    #[must_use]
    pub fn build(self, config: &QuizConfig, started_at: DateTime<Utc>) -> QuizSession {
        let seed = resolve_seed(config.trimmed_seed());
        let mut rng = Mulberry32::from_seed_str(&seed);

        let mut pool: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.matches_difficulty(&config.difficulties))
            .cloned()
            .collect();

        pool.shuffle(&mut rng);
        pool.truncate(config.count);

        QuizSession::new(seed, pool, started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuestionId, TagName};
    use quiz_core::time::fixed_now;

    fn question(id: &str, difficulty: Difficulty) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            section: "Basics".to_string(),
            tags: vec![TagName::new("accounts").unwrap()],
            difficulty,
            prompt: format!("Prompt {id}"),
            choices: vec!["A".to_string(), "B".to_string()],
            answer_index: 0,
            explanation: "Because.".to_string(),
            deep_dive: None,
        }
        .validate()
        .unwrap()
    }

    fn bank_of(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| question(&format!("q{i}"), Difficulty::Foundation))
            .collect()
    }

    fn config_with_seed(seed: &str, count: usize) -> QuizConfig {
        let mut config = QuizConfig::default();
        config.count = count;
        config.seed = Some(seed.to_string());
        config
    }

    fn ids(session: &QuizSession) -> Vec<String> {
        session
            .questions()
            .iter()
            .map(|q| q.id().to_string())
            .collect()
    }

    #[test]
    fn same_seed_reproduces_the_draw() {
        let bank = bank_of(12);
        let config = config_with_seed("replay", 8);

        let first = SessionBuilder::new(&bank).build(&config, fixed_now());
        let second = SessionBuilder::new(&bank).build(&config, fixed_now());

        assert_eq!(first.seed(), "replay");
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn different_seeds_change_the_order() {
        let bank = bank_of(12);

        let first = SessionBuilder::new(&bank).build(&config_with_seed("alpha", 12), fixed_now());
        let second = SessionBuilder::new(&bank).build(&config_with_seed("beta", 12), fixed_now());

        assert_ne!(ids(&first), ids(&second));
    }

    #[test]
    fn session_length_is_capped_by_pool_size() {
        let bank = bank_of(3);
        let session = SessionBuilder::new(&bank).build(&config_with_seed("s", 10), fixed_now());
        assert_eq!(session.len(), 3);

        let session = SessionBuilder::new(&bank).build(&config_with_seed("s", 2), fixed_now());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn draw_filters_by_difficulty_only() {
        let bank = vec![
            question("easy", Difficulty::Foundation),
            question("hard", Difficulty::Advanced),
        ];
        let mut config = config_with_seed("s", 10);
        config.difficulties = vec![Difficulty::Foundation];
        // A tag filter that matches nothing must not affect the draw.
        config.tags = vec![TagName::new("no-such-tag").unwrap()];

        let session = SessionBuilder::new(&bank).build(&config, fixed_now());
        assert_eq!(ids(&session), vec!["easy"]);
    }

    #[test]
    fn empty_pool_yields_empty_session() {
        let bank = bank_of(4);
        let mut config = config_with_seed("s", 10);
        config.difficulties = vec![Difficulty::Expert];

        let session = SessionBuilder::new(&bank).build(&config, fixed_now());
        assert!(session.is_empty());
    }

    #[test]
    fn blank_seed_gets_a_generated_token() {
        let bank = bank_of(4);
        let mut config = config_with_seed("", 4);
        config.seed = None;

        let session = SessionBuilder::new(&bank).build(&config, fixed_now());
        assert_eq!(session.seed().len(), 8);
    }

    #[test]
    fn replaying_a_generated_seed_reproduces_the_run() {
        let bank = bank_of(10);
        let mut config = config_with_seed("", 6);
        config.seed = None;

        let original = SessionBuilder::new(&bank).build(&config, fixed_now());
        config.seed = Some(original.seed().to_string());
        let replay = SessionBuilder::new(&bank).build(&config, fixed_now());

        assert_eq!(ids(&original), ids(&replay));
    }
}
