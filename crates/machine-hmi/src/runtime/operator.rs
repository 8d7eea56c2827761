//! Operator console: commands typed on stdin.

use machine_core::Command;
use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(Command),
    Status,
    Quit,
}

pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    match line.trim().to_ascii_lowercase().as_str() {
        "start" => Some(ConsoleInput::Command(Command::Start)),
        "stop" => Some(ConsoleInput::Command(Command::Stop)),
        "reset" => Some(ConsoleInput::Command(Command::Reset)),
        "status" => Some(ConsoleInput::Status),
        "quit" | "exit" => Some(ConsoleInput::Quit),
        _ => None,
    }
}

/// Forward parsed stdin lines to the tick loop until EOF or the loop hangs up.
pub fn spawn_stdin_reader(tx: Sender<ConsoleInput>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(input) => {
                    if tx.send(input).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "unknown console command"),
            }
        }
        debug!("console reader finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(
            parse_line("  START \n"),
            Some(ConsoleInput::Command(Command::Start))
        );
        assert_eq!(parse_line("Stop"), Some(ConsoleInput::Command(Command::Stop)));
        assert_eq!(parse_line("reset"), Some(ConsoleInput::Command(Command::Reset)));
        assert_eq!(parse_line("status"), Some(ConsoleInput::Status));
        assert_eq!(parse_line("exit"), Some(ConsoleInput::Quit));
    }

    #[test]
    fn rejects_unknown_input() {
        assert_eq!(parse_line("launch"), None);
        assert_eq!(parse_line(""), None);
    }
}
