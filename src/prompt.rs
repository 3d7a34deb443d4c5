use std::future::Future;
use std::io::{self, BufRead, Write};

pub const QUESTION: &str = "Are you sure you want to quit? (Y/n): ";

/// Asks whether an interrupted run should stop.
pub trait QuitPrompt {
    fn confirm_quit(&mut self) -> impl Future<Output = io::Result<bool>>;
}

/// Asks on the controlling terminal, repeating until the answer starts
/// with `y` or `n`.
///
/// The read runs on a detached thread so an abandoned question never keeps
/// the runtime from shutting down.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl QuitPrompt for TerminalPrompt {
    async fn confirm_quit(&mut self) -> io::Result<bool> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        std::thread::Builder::new()
            .name("sysdash-prompt".to_string())
            .spawn(move || {
                let _ = tx.send(ask(&mut io::stdin().lock(), &mut io::stdout()));
            })?;
        rx.await.map_err(io::Error::other)?
    }
}

/// Runs the question/answer loop. End of input counts as "no".
pub fn ask(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    writeln!(output)?;
    loop {
        write!(output, "{QUESTION}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        if let Some(answer) = parse_answer(&line) {
            return Ok(answer);
        }
    }
}

pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim_start().chars().next() {
        Some('y' | 'Y') => Some(true),
        Some('n' | 'N') => Some(false),
        _ => None,
    }
}
