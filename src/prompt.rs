//! Human-in-the-loop confirmation.
//!
//! The engine asks every question through [`Prompter`]. A prompt blocks the
//! current cycle until it is answered; there is no timeout.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Prompter {
    /// Yes/no question. `default` is taken on an empty answer.
    fn confirm(&mut self, message: &str, default: bool) -> bool;

    /// Free-text question. `None` means no answer was given and there was no
    /// default to fall back on.
    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// TERMINAL
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads answers from stdin, writes questions to stderr.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_answer(&self, question: &str) -> Option<String> {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "? {} ", question);
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::error!("failed to read answer: {}", e);
                None
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> bool {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            // a closed stdin never confirms anything
            let Some(answer) = self.read_answer(&format!("{} {}", message, hint)) else {
                return false;
            };
            match answer.to_lowercase().as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => eprintln!("  Please answer y or n."),
            }
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let question = match default {
            Some(d) => format!("{} ({})", message, d),
            None => message.to_string(),
        };
        let answer = self.read_answer(&question)?;
        if answer.is_empty() {
            default.map(str::to_string)
        } else {
            Some(answer)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NON-INTERACTIVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Takes every default without asking (`--yes`).
#[derive(Debug, Default)]
pub struct AcceptDefaults;

impl Prompter for AcceptDefaults {
    fn confirm(&mut self, message: &str, default: bool) -> bool {
        tracing::info!("{} -> {}", message, if default { "yes" } else { "no" });
        default
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        tracing::info!("{} -> {}", message, default.unwrap_or(""));
        default.map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Default,
    Text(String),
}

/// Replays a fixed list of answers and records every question asked. Once the
/// script runs out, defaults are taken.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> bool {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Answer::Yes) => true,
            Some(Answer::No) => false,
            Some(Answer::Text(t)) => matches!(t.as_str(), "y" | "yes"),
            Some(Answer::Default) | None => default,
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Answer::Text(t)) if !t.is_empty() => Some(t),
            _ => default.map(str::to_string),
        }
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn confirm(&mut self, message: &str, default: bool) -> bool {
        (**self).confirm(message, default)
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        (**self).input(message, default)
    }
}
