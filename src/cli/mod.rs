//! CLI module for agentline.
//!
//! - Argument parsing
//! - Version display
//! - Incremental answer printing
//!
//! ```ignore
//! use agentline::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Ask(options) => { /* stream the answer */ }
//!     other => { /* version, help or usage error */ }
//! }
//! ```

pub mod args;
pub mod render;
pub mod version;

pub use args::{parse_args, AskOptions, CliCommand, USAGE};
pub use render::{format_footer, AnswerPrinter};
pub use version::{version_line, VERSION};
