//! Host-side library for the LeetCode to GitHub sync extension: page
//! classification and submission extraction, the message relay, the GitHub
//! contents-API client, and the settings store. The binary in `main.rs`
//! exposes the relay to the extension over localhost HTTP.

pub mod dom;
pub mod error;
pub mod github;
pub mod language;
pub mod page;
pub mod record;
pub mod relay;
pub mod settings;

pub use error::SyncError;
pub use record::{Difficulty, SubmissionRecord};
