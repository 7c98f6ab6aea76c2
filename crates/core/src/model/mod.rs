mod answers;
mod bank;
mod config;
mod ids;
mod question;
mod score;
mod session;
mod tag;

pub use answers::AnswerSheet;
pub use bank::{BankError, BankStats, QuestionBank};
pub use config::{ParseModeError, QuizConfig, QuizMode, QUIZ_LENGTH_PRESETS};
pub use ids::QuestionId;
pub use question::{
    Difficulty, ParseDifficultyError, Question, QuestionDraft, QuestionError,
};
pub use score::{format_accuracy, percent_one_decimal, ScoreSummary, Tally, WeakTopic};
pub use session::QuizSession;
pub use tag::{TagError, TagName};
