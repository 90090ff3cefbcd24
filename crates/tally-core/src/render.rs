use std::io::{self, IsTerminal, Write};

use chrono::{Local, TimeZone, Utc};
use unicode_width::UnicodeWidthStr;

use crate::controller::Snapshot;
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            color: io::stdout().is_terminal(),
        }
    }

    /// Prints the snapshot's task table, newest first, with a
    /// remaining-count footer.
    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_snapshot(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if snapshot.tasks.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "".to_string(),
            "Title".to_string(),
            "Created".to_string(),
        ];

        let mut rows = Vec::with_capacity(snapshot.tasks.len());
        for task in &snapshot.tasks {
            let id = short_id(&task.id);
            let mark = if task.completed { "x" } else { " " }.to_string();
            let title = if task.completed {
                self.paint(&task.title, "9;2")
            } else {
                task.title.clone()
            };
            rows.push(vec![id, mark, title, format_created(task)]);
        }

        write_table(&mut out, headers, rows)?;
        writeln!(
            out,
            "\n{} left ({} theme)",
            snapshot.remaining_count,
            snapshot.theme.as_str()
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// First eight hex characters are enough to address a task interactively.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_created(task: &Task) -> String {
    match Utc.timestamp_millis_opt(task.created_at).single() {
        Some(when) => when
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
