//! CLI console utilities

use colored::*;

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    /// Create a new CLI console
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }

    /// Print a separator
    pub fn print_separator(&self) {
        if self.verbose {
            println!("{}", "-".repeat(50).dimmed());
        }
    }

    /// Print an aligned `key: value` line
    pub fn print_field(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {:<18} {}", format!("{}:", key).cyan(), value);
    }

    /// Print a list of seqs, folding consecutive runs into ranges
    pub fn print_seqs(&self, label: &str, seqs: &[i64]) {
        if seqs.is_empty() {
            return;
        }
        println!("  {} ({}): {}", label.yellow(), seqs.len(), fold_ranges(seqs));
    }
}

/// `[1, 2, 3, 7, 9, 10]` → `1-3, 7, 9-10`
pub fn fold_ranges(seqs: &[i64]) -> String {
    let mut parts = Vec::new();
    let mut iter = seqs.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }
    parts.join(", ")
}
