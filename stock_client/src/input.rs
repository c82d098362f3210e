//! Line-based user input.
//!
//! Each line typed on stdin is one UI event: filter keystrokes, header clicks
//! and scrolling. Reading happens on a background thread that forwards events
//! to the event loop.
use crossbeam_channel::Sender;
use log::{error, info};
use std::io::BufRead;
use std::thread;

use stock_common::ColumnKey;

/// Usage shown by `help`.
pub const HELP: &str = "\
commands:
  filter <text>   type into the filter box (empty text clears it)
  sort <key>      click a column header (l18, l30, pl, plp, pc, pcp, tno, tvol, tval, PowerI)
  down [n]        scroll down n rows (default 1)
  up [n]          scroll up n rows (default 1)
  pgdn | pgup     scroll one viewport
  top | bottom    jump to the start or end of the loaded rows
  help            show this text
  quit            exit";

/// Scroll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// By rows; negative is up.
    Rows(i64),
    /// By viewports; negative is up.
    Pages(i64),
    /// To the first row.
    Top,
    /// To the last slot.
    Bottom,
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// New content of the filter box.
    Filter(String),
    /// Click on a column header.
    Sort(ColumnKey),
    /// Scroll.
    Scroll(ScrollAction),
    /// Redraw without changes.
    Redraw,
    /// Show usage.
    Help,
    /// Leave the client.
    Quit,
}

fn count_arg(arg: &str) -> Result<i64, String> {
    if arg.is_empty() {
        return Ok(1);
    }
    arg.parse::<i64>()
        .map_err(|_| format!("not a row count: {}", arg))
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<UiEvent, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (command, arg) = match line.trim_start().split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg),
        None => (line.trim(), ""),
    };

    match command {
        "" => Ok(UiEvent::Redraw),
        "filter" | "/" => Ok(UiEvent::Filter(arg.to_string())),
        "sort" => arg
            .trim()
            .parse::<ColumnKey>()
            .map(UiEvent::Sort)
            .map_err(|_| format!("unknown column: {}", arg.trim())),
        "down" | "j" => count_arg(arg.trim()).map(|n| UiEvent::Scroll(ScrollAction::Rows(n))),
        "up" | "k" => {
            count_arg(arg.trim()).map(|n| UiEvent::Scroll(ScrollAction::Rows(n.saturating_neg())))
        }
        "pgdn" => Ok(UiEvent::Scroll(ScrollAction::Pages(1))),
        "pgup" => Ok(UiEvent::Scroll(ScrollAction::Pages(-1))),
        "top" => Ok(UiEvent::Scroll(ScrollAction::Top)),
        "bottom" => Ok(UiEvent::Scroll(ScrollAction::Bottom)),
        "help" | "?" => Ok(UiEvent::Help),
        "quit" | "q" | "exit" => Ok(UiEvent::Quit),
        other => Err(format!("unknown command: {}", other)),
    }
}

/// Spawns the stdin reader. The thread ends (dropping `tx`) at end of input.
pub fn start_input_thread(tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            };
            match parse_command(&line) {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(message) => println!("{} (type `help`)", message),
            }
        }
        info!("Input closed");
    });
}
