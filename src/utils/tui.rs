use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use aayojana_core::notify::{Notification, Notifier, Severity};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Prints notifications to stderr as they arrive.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Destructive => eprintln!(
                "{} {}",
                notification.title.red().bold(),
                notification.description.red()
            ),
            Severity::Success => eprintln!(
                "{} {}",
                notification.title.green().bold(),
                notification.description
            ),
            Severity::Info => {
                eprintln!("{} {}", notification.title.bold(), notification.description)
            }
        }
    }
}
