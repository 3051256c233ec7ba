//! CLI output formatting utilities.

use crate::transcript::format_timestamp;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a thread row.
    pub fn thread_info(name: &str, url: Option<&str>, messages: usize, created: &str) {
        println!(
            "  {} {} ({} messages, {})",
            style("*").cyan(),
            style(name).bold(),
            messages,
            style(created).dim()
        );
        if let Some(u) = url {
            println!("    {}", style(u).dim());
        }
    }

    /// Print an assistant answer with its jump-to link.
    pub fn answer(text: &str, timestamp: f64, link: Option<&str>) {
        println!("\n{} {}", style("TubeTalk:").cyan().bold(), text);
        println!(
            "{} {}",
            style("  ⏰").dim(),
            style(format_timestamp(timestamp)).cyan()
        );
        if let Some(l) = link {
            println!("  {}", style(l).dim());
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
