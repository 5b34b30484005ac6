//! agentline - streaming client for a document question-answering agent.
//!
//! The agent answers over a newline-delimited text stream carrying the
//! answer, a citation block and the conversation id. [`StreamClient`] sends a
//! question and turns that stream into frame-rate coalesced [`Snapshot`]s.
//!
//! ```ignore
//! use agentline::{ClientConfig, StreamClient};
//!
//! let client = StreamClient::new(ClientConfig::from_env())?;
//! let answer = client.send("Summarize chapter 2", None, |_| {}).await?;
//! println!("{}", answer.text);
//! ```

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod stream;
pub mod traits;

pub use client::{CancelToken, StreamClient, StreamPhase, StreamUpdate};
pub use config::ClientConfig;
pub use error::{ErrorCategory, StreamError, StreamResult};
pub use models::{Citation, Snapshot};
