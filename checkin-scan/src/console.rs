//! Line-oriented console front end
//!
//! Reads commands from a text stream and prints the coordinator view each
//! time it changes. Lines that are not commands are treated as decoded QR
//! text when the console also feeds the decode source (keyboard-wedge
//! scanners type the payload followed by Enter).

use crate::coordinator::{CoordinatorHandle, CoordinatorView, Intent, Stage};
use crate::error::CoordinatorClosed;
use std::fmt::Write as _;
use std::io::BufRead;
use tokio::sync::{mpsc, watch};
use tracing::debug;

pub const HELP: &str = "\
Commands:
  /phone [number]        open phone lookup (and search when a number is given)
  /set <field> <value>   edit adults, children or performing
  /match <n>             pick the n-th phone match
  /confirm               check the attendee in
  /cancel                dismiss the scan result
  /close                 close phone lookup
  /retry                 retry the camera
  /quit                  exit
Any other line is treated as scanned text.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Intent(Intent),
    /// Text to hand to the decode source
    Decoded(String),
    Help,
    Quit,
    Empty,
}

/// Why the console loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    InputClosed,
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(ConsoleCommand::Decoded(line.to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    let intent = match name.to_ascii_lowercase().as_str() {
        "phone" if rest.is_empty() => Intent::OpenPhoneLookup,
        "phone" => Intent::StartPhoneLookup(rest.to_string()),
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: /set <field> <value>".to_string())?;
            Intent::EditField {
                field: field.to_string(),
                value: value.trim().to_string(),
            }
        }
        "match" => {
            let position: usize = rest
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "Usage: /match <n> (starting at 1)".to_string())?;
            Intent::SelectMatch(position - 1)
        }
        "confirm" => Intent::Confirm,
        "cancel" => Intent::Cancel,
        "close" => Intent::ClosePhoneLookup,
        "retry" => Intent::RetryCamera,
        "quit" | "exit" => return Ok(ConsoleCommand::Quit),
        "help" | "?" => return Ok(ConsoleCommand::Help),
        other => return Err(format!("Unknown command '/{}'. Type /help.", other)),
    };
    Ok(ConsoleCommand::Intent(intent))
}

/// Forward stdin lines from a dedicated thread
///
/// A blocking read on a runtime thread would hold up shutdown until the
/// next Enter; a detached thread simply dies with the process.
pub fn spawn_stdin_reader(capacity: usize) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(capacity);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Read commands until `/quit` or end of input
///
/// `decode_feed` receives non-command lines; without it they are rejected.
pub async fn run_console(
    handle: &CoordinatorHandle,
    mut input: mpsc::Receiver<String>,
    decode_feed: Option<mpsc::Sender<String>>,
) -> Result<ConsoleExit, CoordinatorClosed> {
    while let Some(line) = input.recv().await {
        match parse_line(&line) {
            Ok(ConsoleCommand::Empty) => {}
            Ok(ConsoleCommand::Help) => println!("{}", HELP),
            Ok(ConsoleCommand::Quit) => return Ok(ConsoleExit::Quit),
            Ok(ConsoleCommand::Intent(intent)) => handle.send(intent).await?,
            Ok(ConsoleCommand::Decoded(text)) => match &decode_feed {
                // Dropped while the scanner is stopped and its queue is full
                Some(feed) => {
                    if feed.try_send(text).is_err() {
                        debug!("Scanner not accepting input; text dropped");
                    }
                }
                None => println!("Not a command. Type /help."),
            },
            Err(message) => println!("{}", message),
        }
    }
    Ok(ConsoleExit::InputClosed)
}

/// Print the view every time it changes until the coordinator goes away
pub async fn print_view_changes(mut view: watch::Receiver<CoordinatorView>) {
    let mut last = String::new();
    loop {
        let rendered = render(&view.borrow_and_update());
        if rendered != last {
            println!("{}", rendered);
            last = rendered;
        }
        if view.changed().await.is_err() {
            break;
        }
    }
}

pub fn render(view: &CoordinatorView) -> String {
    let mut out = String::new();
    let _ = write!(out, "[{}]", stage_label(view.stage));

    if let Some(code) = &view.scanned_id {
        let _ = write!(out, " scanned {}", code);
    }
    if view.loading || view.phone_loading {
        out.push_str(" looking up...");
    }

    if let Some(record) = &view.record {
        let _ = write!(
            out,
            "\n  {} ({}) adults {}/{} children {}/{} performing {} present {}",
            record.display_name(),
            record.id,
            record.actual_adults,
            record.registered_adults,
            record.actual_children,
            record.registered_children,
            yes_no(record.performing),
            yes_no(record.present),
        );
    }
    if view.phone_matches.len() > 1 {
        for (position, record) in view.phone_matches.iter().enumerate() {
            let _ = write!(out, "\n  /match {}: {}", position + 1, record.display_name());
        }
    }
    if let Some(warning) = &view.warning {
        let _ = write!(out, "\n  note: {}", warning);
    }
    for error in [&view.error, &view.phone_error].into_iter().flatten() {
        let _ = write!(out, "\n  error [{}]: {}", error.code, error.message);
    }
    out
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "idle",
        Stage::Scanning => "scanning",
        Stage::Pending => "pending",
        Stage::Review => "review",
        Stage::Confirming => "confirming",
        Stage::Done => "checked in",
        Stage::PhoneEntry => "phone lookup",
        Stage::Result => "result",
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
