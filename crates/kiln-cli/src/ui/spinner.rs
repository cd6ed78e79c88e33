//! Spinner for work without a known duration.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::Style;

use super::{is_interactive, messages::paint};

/// Spinner shown while a build runs.
///
/// Hidden when stderr is not attended (CI, pipes), in which case only the
/// final message is printed.
///
/// ```no_run
/// use kiln_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building...");
/// spinner.finish("Built!");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if is_interactive() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Stop the spinner and print a success line.
    pub fn finish(&self, message: &str) {
        self.pb.finish_and_clear();
        eprintln!("{} {}", paint("✓", Style::new().green()), message);
    }

    /// Stop the spinner and print a failure line.
    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        eprintln!("{} {}", paint("✗", Style::new().red()), message);
    }

    /// Stop the spinner without printing anything.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
