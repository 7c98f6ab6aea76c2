use std::collections::{BTreeMap, HashMap};

use crate::model::ids::QuestionId;
use crate::model::question::{Difficulty, Question};
use crate::model::tag::TagName;

//
// ─── TALLY ─────────────────────────────────────────────────────────────────────
//

/// Correct/total pair for one breakdown bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Accuracy as a percentage rounded to one decimal; 0.0 for an empty bucket.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        percent_one_decimal(self.correct, self.total)
    }

    /// Accuracy as a raw fraction in [0, 1]; 0.0 for an empty bucket.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Percentage rounded to one decimal place; 0.0 when `total` is zero.
#[must_use]
pub fn percent_one_decimal(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (correct as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

/// Whole-percent label such as `"67%"`; `"0%"` when `total` is zero.
#[must_use]
pub fn format_accuracy(correct: usize, total: usize) -> String {
    if total == 0 {
        "0%".to_string()
    } else {
        format!("{}%", (correct as f64 / total as f64 * 100.0).round())
    }
}

//
// ─── SCORE SUMMARY ─────────────────────────────────────────────────────────────
//

/// A tag with its tally, surfaced by the weakest-topics report.
#[derive(Debug, Clone, PartialEq)]
pub struct WeakTopic {
    pub tag: TagName,
    pub tally: Tally,
}

/// Aggregate result of scoring one run.
///
/// `by_difficulty` always carries all three buckets; `by_section` and
/// `by_tag` contain only buckets that appeared in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    total: usize,
    correct: usize,
    accuracy: f64,
    by_section: BTreeMap<String, Tally>,
    by_difficulty: BTreeMap<Difficulty, Tally>,
    by_tag: BTreeMap<TagName, Tally>,
}

impl ScoreSummary {
    /// Score `questions` against the recorded answer map.
    ///
    /// A question counts correct only when its recorded answer strictly
    /// equals the correct index; a missing or `None` entry is incorrect but
    /// still contributes to every total.
    #[must_use]
    pub fn from_answers(
        questions: &[Question],
        answers: &HashMap<QuestionId, Option<usize>>,
    ) -> Self {
        let mut by_section: BTreeMap<String, Tally> = BTreeMap::new();
        let mut by_difficulty: BTreeMap<Difficulty, Tally> = Difficulty::ALL
            .into_iter()
            .map(|d| (d, Tally::default()))
            .collect();
        let mut by_tag: BTreeMap<TagName, Tally> = BTreeMap::new();

        let mut correct = 0;
        for question in questions {
            let selected = answers.get(question.id()).copied().flatten();
            let is_correct = selected == Some(question.answer_index());

            by_section
                .entry(question.section().to_string())
                .or_default()
                .record(is_correct);
            by_difficulty
                .entry(question.difficulty())
                .or_default()
                .record(is_correct);
            for tag in question.tags() {
                by_tag.entry(tag.clone()).or_default().record(is_correct);
            }

            if is_correct {
                correct += 1;
            }
        }

        let total = questions.len();
        Self {
            total,
            correct,
            accuracy: percent_one_decimal(correct, total),
            by_section,
            by_difficulty,
            by_tag,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Overall accuracy percentage, rounded to one decimal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn by_section(&self) -> &BTreeMap<String, Tally> {
        &self.by_section
    }

    #[must_use]
    pub fn by_difficulty(&self) -> &BTreeMap<Difficulty, Tally> {
        &self.by_difficulty
    }

    #[must_use]
    pub fn by_tag(&self) -> &BTreeMap<TagName, Tally> {
        &self.by_tag
    }

    /// Tags seen at least `min_total` times, worst accuracy first, capped at
    /// `limit`. Ties break on tag name for a stable report.
    #[must_use]
    pub fn weakest_topics(&self, min_total: usize, limit: usize) -> Vec<WeakTopic> {
        let mut topics: Vec<WeakTopic> = self
            .by_tag
            .iter()
            .filter(|(_, tally)| tally.total >= min_total)
            .map(|(tag, tally)| WeakTopic {
                tag: tag.clone(),
                tally: *tally,
            })
            .collect();
        topics.sort_by(|a, b| {
            a.tally
                .fraction()
                .total_cmp(&b.tally.fraction())
                .then_with(|| a.tag.cmp(&b.tag))
        });
        topics.truncate(limit);
        topics
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
