#![forbid(unsafe_code)]

pub mod error;
pub mod rng;
pub mod sessions;
pub mod stats_service;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{QuizFlow, QuizPhase, SessionBuilder, SessionProgress, SessionRunner};
pub use stats_service::StatsService;
