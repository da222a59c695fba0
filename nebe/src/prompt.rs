//! Line-based terminal prompts.
//!
//! Choices are listed with numbers. A selection is answered with a number
//! or with text matching exactly one choice; multi-selections accept
//! numbers and ranges (`1,3-5`), `all` or `none`, and an empty line keeps
//! the pre-selected items.

use colored::Colorize;
use nebe_core::contract::{BoxError, Prompter};
use std::io::{self, BufRead, Write};

#[derive(Debug, thiserror::Error)]
#[error("input closed before an answer was given")]
pub struct InputClosed;

#[derive(Debug, Clone, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn ask(&self, question: &str) -> Result<String, BoxError> {
        print!("{} {} ", "?".green().bold(), question.bold());
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("Failed to flush stdout: {}", e);
        }
        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Err(Box::new(InputClosed));
        }
        Ok(input.trim().to_string())
    }

    fn list(choices: &[String], marks: Option<&[bool]>) {
        for (i, choice) in choices.iter().enumerate() {
            let mark = match marks {
                Some(marks) if marks.get(i).copied().unwrap_or(false) => "[x] ",
                Some(_) => "[ ] ",
                None => "",
            };
            println!("  {:>3}) {mark}{choice}", i + 1);
        }
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, message: &str, choices: &[String]) -> Result<usize, BoxError> {
        if choices.is_empty() {
            return Err(format!("nothing to choose for `{message}`").into());
        }
        println!("{} {}", "?".green().bold(), message.bold());
        Self::list(choices, None);
        loop {
            let input = self.ask("Choice:")?;
            match parse_choice(&input, choices) {
                Some(index) => return Ok(index),
                None => println!("{}", "Enter a number or a unique part of a name".yellow()),
            }
        }
    }

    fn multi_select(
        &self,
        message: &str,
        choices: &[String],
        defaults: &[bool],
    ) -> Result<Vec<usize>, BoxError> {
        println!("{} {}", "?".green().bold(), message.bold());
        Self::list(choices, Some(defaults));
        loop {
            let input = self.ask("Choices (e.g. 1,3-4, all, none; empty keeps [x]):")?;
            match parse_multi(&input, choices.len(), defaults) {
                Some(indices) => return Ok(indices),
                None => println!("{}", "Enter numbers or ranges within the list".yellow()),
            }
        }
    }

    fn input(&self, message: &str) -> Result<String, BoxError> {
        self.ask(message)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, BoxError> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let input = self.ask(&format!("{message} {hint}"))?;
            match parse_confirm(&input, default) {
                Some(answer) => return Ok(answer),
                None => println!("{}", "Answer y or n".yellow()),
            }
        }
    }
}

/// 1-based number, or case-insensitive text matching exactly one choice
/// (an exact match wins over partial ones).
pub fn parse_choice(input: &str, choices: &[String]) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(n) = input.parse::<usize>() {
        return (1..=choices.len()).contains(&n).then(|| n - 1);
    }

    let needle = input.to_lowercase();
    if let Some(exact) = choices.iter().position(|c| c.to_lowercase() == needle) {
        return Some(exact);
    }
    let mut matches = choices
        .iter()
        .enumerate()
        .filter(|(_, c)| c.to_lowercase().contains(&needle));
    match (matches.next(), matches.next()) {
        (Some((index, _)), None) => Some(index),
        _ => None,
    }
}

pub fn parse_multi(input: &str, len: usize, defaults: &[bool]) -> Option<Vec<usize>> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "" => {
            return Some(
                (0..len)
                    .filter(|&i| defaults.get(i).copied().unwrap_or(false))
                    .collect(),
            )
        }
        "all" | "a" => return Some((0..len).collect()),
        "none" => return Some(Vec::new()),
        _ => {}
    }

    let mut picked = Vec::new();
    for part in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if part.is_empty() {
            continue;
        }
        let (from, to) = match part.split_once('-') {
            Some((from, to)) => (from.trim().parse::<usize>().ok()?, to.trim().parse::<usize>().ok()?),
            None => {
                let n = part.parse::<usize>().ok()?;
                (n, n)
            }
        };
        if from == 0 || to > len || from > to {
            return None;
        }
        picked.extend((from - 1)..to);
    }
    picked.sort_unstable();
    picked.dedup();
    Some(picked)
}

pub fn parse_confirm(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
