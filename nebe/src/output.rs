//! Terminal output helpers: a progress spinner and plain-text tables.

use colored::Colorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

const FRAMES: &[&str] = &["-", "\\", "|", "/"];
const INTERVAL: u64 = 100;

/// Animated one-line status. With `plain` (used by `--debug`, where log
/// lines would interleave with the animation) it prints lines instead.
#[derive(Clone)]
pub struct Spinner {
    running: Arc<AtomicBool>,
    label: Arc<Mutex<String>>,
    handle: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
    plain: bool,
}

impl Spinner {
    pub fn start(label: impl Into<String>, plain: bool) -> Self {
        let label = Arc::new(Mutex::new(label.into()));
        let running = Arc::new(AtomicBool::new(true));

        let handle = if plain {
            println!("{}", label.lock().unwrap_or_else(PoisonError::into_inner).blue());
            None
        } else {
            let running = Arc::clone(&running);
            let label = Arc::clone(&label);
            Some(thread::spawn(move || {
                let mut i = 0;
                while running.load(Ordering::Relaxed) {
                    let frame = FRAMES[i % FRAMES.len()];
                    let text = label.lock().unwrap_or_else(PoisonError::into_inner).clone();
                    print!("\r\x1B[2K {} {}", frame.cyan(), text);
                    let _ = io::stdout().flush();
                    thread::sleep(Duration::from_millis(INTERVAL));
                    i += 1;
                }
            }))
        };

        Self {
            running,
            label,
            handle: Arc::new(Mutex::new(handle)),
            plain,
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        if self.plain {
            println!("{}", message.blue());
        }
        *self.label.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    /// Stops the animation and prints the final line.
    pub fn finish(&self, success: bool, message: impl Into<String>) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Some(handle) = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = handle.join();
        }
        let message = message.into();
        let line = if success {
            format!("{} {}", "✔".green(), message.green())
        } else {
            format!("{} {}", "✖".red(), message.red())
        };
        if self.plain {
            println!("{line}");
        } else {
            println!("\r\x1B[2K {line}");
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        // Only the last clone stops a spinner nobody finished.
        if Arc::strong_count(&self.running) == 1 && self.running.swap(false, Ordering::Relaxed) {
            if let Some(handle) = self
                .handle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                let _ = handle.join();
                println!();
            }
        }
    }
}

/// Column-aligned table with a header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    head: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(head: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            head: head.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.head.len()))
            .max()
            .unwrap_or(0);
        (0..columns)
            .map(|c| {
                std::iter::once(&self.head)
                    .chain(self.rows.iter())
                    .filter_map(|row| row.get(c))
                    .map(|cell| visible_width(cell))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Renders without colours; cells may carry their own.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let line = |row: &[String]| -> String {
            widths
                .iter()
                .enumerate()
                .map(|(c, width)| {
                    let cell = row.get(c).map(String::as_str).unwrap_or("");
                    let pad = width.saturating_sub(visible_width(cell));
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        let separator = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ");

        let mut out = vec![line(&self.head), separator];
        out.extend(self.rows.iter().map(|row| line(row)));
        out.join("\n")
    }
}

/// Character count ignoring ANSI colour sequences.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1B' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}
