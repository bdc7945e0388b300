//! Operator interaction during review.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use super::mask_view::MaskView;

/// What the operator is asked about one scan.
#[derive(Debug)]
pub struct CountRequest<'a> {
    pub filename: &'a str,
    /// Particles left after measurement and noise filtering.
    pub auto_count: usize,
    /// Count offered as the default answer.
    pub suggested: usize,
    pub mask: &'a MaskView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountAnswer {
    pub accepted_count: usize,
    pub needs_remeasure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Confirmed(CountAnswer),
    Cancelled,
}

/// Asks the operator to confirm the leaf count of a scan.
pub trait Prompter {
    fn confirm_count(&mut self, request: &CountRequest<'_>) -> PromptResponse;
}

/// Line-based prompter over any reader/writer pair.
///
/// An empty line takes the default. `q`, `quit` or end of input cancels.
#[derive(Debug)]
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        write!(self.output, "{question}").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim();
                if answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit") {
                    None
                } else {
                    Some(answer.to_owned())
                }
            }
        }
    }

    fn ask_count(&mut self, suggested: usize) -> Option<usize> {
        loop {
            let answer = self.ask(&format!("Number of leaves [{suggested}]: "))?;
            if answer.is_empty() {
                return Some(suggested);
            }
            match answer.parse::<usize>() {
                Ok(count) => return Some(count),
                Err(_) => {
                    writeln!(self.output, "Please enter a non-negative whole number.").ok()?;
                }
            }
        }
    }

    fn ask_remeasure(&mut self) -> Option<bool> {
        loop {
            let answer = self.ask("Needs remeasure? [y/N]: ")?.to_ascii_lowercase();
            match answer.as_str() {
                "" | "n" | "no" => return Some(false),
                "y" | "yes" => return Some(true),
                _ => {
                    writeln!(self.output, "Please answer y or n.").ok()?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm_count(&mut self, request: &CountRequest<'_>) -> PromptResponse {
        let shown = writeln!(
            self.output,
            "{}: {} particles detected, mask at {}",
            request.filename,
            request.auto_count,
            request.mask.path().display()
        );
        if shown.is_err() {
            return PromptResponse::Cancelled;
        }

        let Some(accepted_count) = self.ask_count(request.suggested) else {
            return PromptResponse::Cancelled;
        };
        let Some(needs_remeasure) = self.ask_remeasure() else {
            return PromptResponse::Cancelled;
        };

        PromptResponse::Confirmed(CountAnswer {
            accepted_count,
            needs_remeasure,
        })
    }
}

/// Accepts every suggested count without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn confirm_count(&mut self, request: &CountRequest<'_>) -> PromptResponse {
        tracing::debug!(
            filename = request.filename,
            count = request.suggested,
            "Count accepted without prompting"
        );
        PromptResponse::Confirmed(CountAnswer {
            accepted_count: request.suggested,
            needs_remeasure: false,
        })
    }
}

/// Replays canned responses and records what it was asked.
///
/// Cancels once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    responses: VecDeque<PromptResponse>,
    asked: Vec<(String, usize, usize)>,
}

impl ScriptedPrompter {
    pub fn new(responses: impl IntoIterator<Item = PromptResponse>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Convenience for scripts made only of confirmations.
    pub fn answering(answers: impl IntoIterator<Item = (usize, bool)>) -> Self {
        Self::new(answers.into_iter().map(|(accepted_count, needs_remeasure)| {
            PromptResponse::Confirmed(CountAnswer {
                accepted_count,
                needs_remeasure,
            })
        }))
    }

    /// `(filename, auto_count, suggested)` for every request seen.
    pub fn asked(&self) -> &[(String, usize, usize)] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_count(&mut self, request: &CountRequest<'_>) -> PromptResponse {
        self.asked.push((
            request.filename.to_owned(),
            request.auto_count,
            request.suggested,
        ));
        self.responses.pop_front().unwrap_or(PromptResponse::Cancelled)
    }
}
