pub mod qa;
pub mod templates;

pub use qa::{ANSWER_DELAY, STARTER_QUESTIONS, answer_for};
pub use templates::{REPORT_DELAY, report_for};
