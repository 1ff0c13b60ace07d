pub mod core;

use chrono::{Local, Utc};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

use crate::core::config::AppConfig;
use crate::core::presenter::QuakeList;
use crate::core::quake::fetcher::FetchError;
use crate::core::screen::{
    Navigator, RefreshRequest, ScreenController, ScreenError, ScreenUpdate, SystemBrowser,
};

pub use crate::core::config::{CliOverrides, ConfigError};
pub use crate::core::quake::parser::{parse, parse_feed};
pub use crate::core::quake::query::{FeedQuery, OrderBy};
pub use crate::core::quake::types::EarthquakeEvent;

const HELP: &str =
    "Commands: r = refresh, c = cancel refresh, l = list, <n> = open row n, h = help, q = quit";

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not prepare the feed source: {0}")]
    Source(#[from] FetchError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// How the binary presents the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Once,
    OnceJson,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Refresh,
    Cancel,
    List,
    Open(usize),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let input = line.trim();
    if input.is_empty() {
        return None;
    }
    let command = match input.to_lowercase().as_str() {
        "r" | "refresh" => Command::Refresh,
        "c" | "cancel" => Command::Cancel,
        "l" | "list" => Command::List,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.parse::<usize>() {
            Ok(row) => Command::Open(row),
            Err(_) => Command::Unknown(input.to_string()),
        },
    };
    Some(command)
}

fn write_list(out: &mut impl Write, list: &QuakeList, utc: bool) -> io::Result<()> {
    let lines = if utc {
        list.render(&Utc)
    } else {
        list.render(&Local)
    };
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Runs the interactive screen until `quit` or the end of `commands`.
pub async fn run_session<N, W>(
    controller: &mut ScreenController<N>,
    mut commands: mpsc::UnboundedReceiver<String>,
    out: &mut W,
    utc: bool,
) -> io::Result<()>
where
    N: Navigator,
    W: Write,
{
    writeln!(out, "Loading earthquakes from {}", controller.source().describe())?;
    writeln!(out, "{HELP}")?;
    controller.request_refresh();

    loop {
        tokio::select! {
            line = commands.recv() => {
                let Some(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    None => {}
                    Some(Command::Quit) => break,
                    Some(Command::Refresh) => match controller.request_refresh() {
                        RefreshRequest::Started => writeln!(out, "Refreshing...")?,
                        RefreshRequest::AlreadyRunning => {
                            writeln!(out, "A refresh is already running.")?
                        }
                    },
                    Some(Command::Cancel) => {
                        if controller.cancel_refresh() {
                            writeln!(out, "Refresh cancelled.")?;
                        } else {
                            writeln!(out, "No refresh is running.")?;
                        }
                    }
                    Some(Command::List) => write_list(out, controller.list(), utc)?,
                    Some(Command::Open(row)) => {
                        let opened = row
                            .checked_sub(1)
                            .ok_or(ScreenError::NoSuchRow(row))
                            .and_then(|index| controller.open(index));
                        match opened {
                            Ok(()) => writeln!(out, "Opening row {row} in the browser.")?,
                            Err(ScreenError::NoSuchRow(_)) => {
                                writeln!(out, "No earthquake at row {row}.")?
                            }
                        }
                    }
                    Some(Command::Help) => writeln!(out, "{HELP}")?,
                    Some(Command::Unknown(input)) => {
                        writeln!(out, "Unknown command: {input}. Type h for help.")?
                    }
                }
            }
            Some(update) = controller.next_update() => match update {
                ScreenUpdate::Applied { .. } => write_list(out, controller.list(), utc)?,
                ScreenUpdate::Stale => {}
                ScreenUpdate::NavigationFailed { url, message } => {
                    writeln!(out, "Could not open {url}: {message}")?
                }
            },
        }
        out.flush()?;
    }
    Ok(())
}

/// Refreshes once, prints the list and returns.
pub async fn run_once<N, W>(
    controller: &mut ScreenController<N>,
    out: &mut W,
    utc: bool,
) -> io::Result<()>
where
    N: Navigator,
    W: Write,
{
    wait_for_list(controller).await;
    write_list(out, controller.list(), utc)
}

async fn wait_for_list<N: Navigator>(controller: &mut ScreenController<N>) {
    controller.request_refresh();
    while let Some(update) = controller.next_update().await {
        if let ScreenUpdate::Applied { .. } = update {
            break;
        }
    }
}

/// Refreshes once and writes the events as a JSON array.
pub async fn run_once_json<N, W>(
    controller: &mut ScreenController<N>,
    out: &mut W,
) -> io::Result<()>
where
    N: Navigator,
    W: Write,
{
    wait_for_list(controller).await;
    serde_json::to_writer_pretty(&mut *out, controller.list().events())?;
    writeln!(out)?;
    out.flush()
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(config: AppConfig, mode: RunMode) -> Result<(), RunError> {
    let source = config.feed_source()?;
    let mut controller = ScreenController::new(source, SystemBrowser);
    let mut out = io::stdout();
    match mode {
        RunMode::Interactive => {
            let commands = spawn_stdin_reader();
            run_session(&mut controller, commands, &mut out, config.utc).await?;
        }
        RunMode::Once => run_once(&mut controller, &mut out, config.utc).await?,
        RunMode::OnceJson => run_once_json(&mut controller, &mut out).await?,
    }
    Ok(())
}
