//! Command-line argument parsing for the agentline CLI.

use std::time::Duration;

/// Options for asking a question.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AskOptions {
    /// Question text, all positional arguments joined by spaces
    pub question: String,
    /// Continue this conversation instead of starting a new one
    pub conversation_id: Option<String>,
    /// Override the server base URL
    pub url: Option<String>,
    /// Override the partial-update frame window
    pub frame_interval: Option<Duration>,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream an answer (default)
    Ask(AskOptions),
    /// Arguments could not be understood
    Invalid(String),
}

/// Usage text printed by `--help` and after argument errors.
pub const USAGE: &str = "\
Usage: agentline [OPTIONS] QUESTION...

Options:
  --url URL             Agent server base URL (env AGENTLINE_API_URL)
  --conversation ID     Continue an existing conversation
  --frame-ms N          Partial update interval in milliseconds (env AGENTLINE_FRAME_MS)
  -V, --version         Print version
  -h, --help            Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// The first item is the program name and is skipped. `--` ends option
/// parsing; everything after it is question text.
///
/// # Examples
///
/// ```
/// use agentline::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["agentline".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut options = AskOptions::default();
    let mut words: Vec<String> = Vec::new();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--url" | "--conversation" | "--frame-ms" => {
                let Some(value) = args.next() else {
                    return CliCommand::Invalid(format!("{} requires a value", arg));
                };
                match arg.as_str() {
                    "--url" => options.url = Some(value),
                    "--conversation" => options.conversation_id = Some(value),
                    _ => match value.parse::<u64>() {
                        Ok(ms) => options.frame_interval = Some(Duration::from_millis(ms)),
                        Err(_) => {
                            return CliCommand::Invalid(format!(
                                "--frame-ms expects milliseconds, got '{}'",
                                value
                            ))
                        }
                    },
                }
            }
            "--" => {
                words.extend(args.by_ref());
            }
            flag if flag.starts_with("--") => {
                return CliCommand::Invalid(format!("unknown option '{}'", flag));
            }
            word => words.push(word.to_string()),
        }
    }

    options.question = words.join(" ");
    if options.question.trim().is_empty() {
        return CliCommand::Help;
    }
    CliCommand::Ask(options)
}
