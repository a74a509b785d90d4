//! User-facing output.
//!
//! Status lines go to stderr in the familiar right-aligned cargo layout
//! (`   Compiling zlib`). Machine-readable events are written by
//! [`JsonObserver`](crate::builder::JsonObserver) on stdout, so in JSON mode
//! the shell stays silent.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How the shell renders output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellMode {
    /// Status lines and a progress bar.
    #[default]
    Normal,
    /// Status lines only, no progress bar.
    Verbose,
    /// Nothing on stderr except errors.
    Json,
}

/// Status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Compiling,
    Fresh,
    Finished,
    Fetching,
    Updating,
    Unpacking,
    Removed,
    Skipped,
    Warning,
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Compiling => "Compiling",
            Status::Fresh => "Fresh",
            Status::Finished => "Finished",
            Status::Fetching => "Fetching",
            Status::Updating => "Updating",
            Status::Unpacking => "Unpacking",
            Status::Removed => "Removed",
            Status::Skipped => "Skipped",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Fresh | Status::Finished | Status::Removed => "\x1b[1;32m",
            Status::Compiling | Status::Fetching | Status::Updating | Status::Unpacking => {
                "\x1b[1;36m"
            }
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for CLI output.
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
    progress: Option<ProgressBar>,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("mode", &self.mode)
            .field("use_color", &self.use_color)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        Shell {
            mode,
            use_color: mode != ShellMode::Json && io::stderr().is_terminal(),
            progress: None,
        }
    }

    /// JSON wins over verbose.
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else if verbose {
            ShellMode::Verbose
        } else {
            ShellMode::Normal
        };
        Shell::new(mode)
    }

    pub fn mode(&self) -> ShellMode {
        self.mode
    }

    pub fn is_verbose(&self) -> bool {
        self.mode == ShellMode::Verbose
    }

    pub fn is_json(&self) -> bool {
        self.mode == ShellMode::Json
    }

    /// Print `{status:>12} {message}`.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() && status != Status::Error {
            return;
        }
        let line = format!("{} {}", self.format_status(status), msg);
        match &self.progress {
            Some(pb) => pb.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    pub fn warn(&self, msg: impl Display) {
        if self.is_json() {
            return;
        }
        let line = format!("{}: {}", self.paint(Status::Warning, "warning"), msg);
        match &self.progress {
            Some(pb) => pb.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Show a progress bar over `total` packages.
    ///
    /// Only in normal mode, on a terminal, and for more than one package.
    pub fn start_progress(&mut self, total: u64, msg: impl Display) {
        if self.mode != ShellMode::Normal || total <= 1 || !io::stderr().is_terminal() {
            return;
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        self.progress = Some(pb);
    }

    /// Advance the progress bar, if one is shown.
    pub fn tick(&self, msg: impl Display) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(msg.to_string());
        }
    }

    pub fn finish_progress(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }

    fn format_status(&self, status: Status) -> String {
        let text = format!("{:>width$}", status.as_str(), width = STATUS_WIDTH);
        self.paint(status, &text)
    }

    fn paint(&self, status: Status, text: &str) -> String {
        if self.use_color {
            format!("{}{}\x1b[0m", status.color_code(), text)
        } else {
            text.to_string()
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.finish_progress();
    }
}

/// Format a duration the way `Finished` lines show it.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
