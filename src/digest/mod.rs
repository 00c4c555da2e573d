/// Digest pipeline: data model, demo fixtures and the run orchestrator
pub mod fixtures;
pub mod models;
pub mod processor;

// Re-export commonly used items
pub use fixtures::demo_messages;
pub use models::{Bullet, Digest, MessageSummary, RunResult, NO_NEW_MAIL_SUBJECT, SUBJECT_PREFIX};
pub use processor::DigestProcessor;
