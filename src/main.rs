use agentline::cli::{format_footer, parse_args, version_line, AnswerPrinter, AskOptions, CliCommand, USAGE};
use agentline::{CancelToken, ClientConfig, StreamClient, StreamError, StreamUpdate};

use color_eyre::Result;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Initialize logging to stderr so stdout carries only the answer.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("agentline=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let options = match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(message) => {
            eprintln!("Error: {}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
        CliCommand::Ask(options) => options,
    };

    init_logging();

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(ask(options)) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::debug!(code = err.error_code(), error = %err, "Request failed");
            eprintln!("\n{}", err.user_message());
            std::process::exit(if err.is_cancelled() { 130 } else { 1 });
        }
    }
}

async fn ask(options: AskOptions) -> std::result::Result<(), StreamError> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = options.url {
        config = config.with_base_url(url);
    }
    if let Some(interval) = options.frame_interval {
        config = config.with_frame_interval(interval);
    }

    let client = StreamClient::new(config)?;
    let cancel = CancelToken::new();

    // Ctrl-C cancels the request instead of killing the process
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancelling request");
            ctrl_c_token.cancel();
        }
    });

    let printer = Arc::new(Mutex::new(AnswerPrinter::new()));
    let on_update = {
        let printer = Arc::clone(&printer);
        move |update: StreamUpdate| match update {
            StreamUpdate::Partial(snapshot) => {
                let mut printer = printer
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(printer.delta(&snapshot).as_bytes());
                let _ = stdout.flush();
            }
            StreamUpdate::ConversationStarted(id) => {
                tracing::info!(conversation_id = %id, "Conversation started");
            }
        }
    };

    let snapshot = client
        .send_with_cancel(
            &options.question,
            options.conversation_id.as_deref(),
            on_update,
            cancel,
        )
        .await?;

    println!();
    print!("{}", format_footer(&snapshot));
    Ok(())
}
