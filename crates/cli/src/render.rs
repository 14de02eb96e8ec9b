// crates/cli/src/render.rs
//! Terminal rendering of the tracking view.

use std::io::Write;

use bulkadd_core::view::CLOSE_WARNING;
use bulkadd_core::JobView;
use bulkadd_types::{Collection, CollectionPage, JobStatus};
use indicatif::{ProgressBar, ProgressStyle};

/// Draws view updates as a progress bar, or as JSON lines.
pub struct Renderer<W: Write> {
    bar: ProgressBar,
    out: W,
    json: bool,
    warned: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, json: bool) -> Self {
        let bar = if json { ProgressBar::hidden() } else { progress_bar() };
        Self::with_bar(bar, out, json)
    }

    pub fn with_bar(bar: ProgressBar, out: W, json: bool) -> Self {
        Self {
            bar,
            out,
            json,
            warned: false,
        }
    }

    pub fn show(&mut self, view: &JobView) -> std::io::Result<()> {
        if self.json {
            let line = serde_json::to_string(view).map_err(std::io::Error::other)?;
            writeln!(self.out, "{line}")?;
        } else {
            self.bar.set_position(view.progress_percent.round() as u64);
            self.bar.set_message(view.state_label.clone());
        }
        if view.warning_visible && !self.warned {
            self.warned = true;
            self.notice(CLOSE_WARNING);
        }
        Ok(())
    }

    /// Print above the bar without disturbing it.
    pub fn notice(&self, message: &str) {
        if self.bar.is_hidden() {
            eprintln!("  {message}");
        } else {
            self.bar.println(format!("  {message}"));
        }
    }

    pub fn finish(&mut self, view: &JobView) -> std::io::Result<()> {
        if self.json {
            return Ok(());
        }
        self.bar.set_position(view.progress_percent.round() as u64);
        self.bar.finish_and_clear();
        let mark = if view.lost_track { '!' } else { '\u{2713}' };
        writeln!(self.out, "  {mark} {}", view.state_label)
    }

    pub fn warned(&self) -> bool {
        self.warned
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("  {spinner} [{bar:40}] {pos:>3}% {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

pub fn collection_lines(collections: &[Collection]) -> Vec<String> {
    collections
        .iter()
        .map(|c| format!("{}  {}", c.id, c.collection_name))
        .collect()
}

pub fn page_lines(page: &CollectionPage, offset: u64) -> Vec<String> {
    let mut lines: Vec<String> = page
        .companies
        .iter()
        .map(|c| {
            let liked = if c.liked { "  \u{2665}" } else { "" };
            format!("{:>6}  {}{liked}", c.id, c.company_name)
        })
        .collect();
    let shown = page.companies.len() as u64;
    if shown == 0 {
        lines.push(format!("{}: no companies at offset {offset} of {}", page.collection.collection_name, page.total));
    } else {
        lines.push(format!(
            "{}: {}-{} of {}",
            page.collection.collection_name,
            offset + 1,
            offset + shown,
            page.total
        ));
    }
    lines
}

pub fn status_line(job_id: u64, status: &JobStatus) -> String {
    let label = bulkadd_core::status_label(status);
    let label = if label.is_empty() { status.state.to_string() } else { label };
    format!("job {job_id}: {label} ({:.0}%)", status.progress_percent())
}
