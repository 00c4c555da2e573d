// Library exports for the maildigest crate
// This allows the binary and the integration tests to share the pipeline

pub mod config;
pub mod error;
pub mod gmail_client;
pub mod html_renderer;
pub mod openai_client;
pub mod server;
pub mod slack_notifier;
pub mod summarizer;
pub mod token_exchange;

// Digest pipeline: models, fixtures and orchestrator
pub mod digest;
