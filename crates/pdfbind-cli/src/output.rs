//! Terminal output for the pdfbind CLI.
//!
//! Human-readable messages go to stdout and honour `--quiet` and
//! `--verbose`. `--json` output bypasses the formatter entirely.

use std::io::{self, IsTerminal};

use pdfbind::OutputDocument;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Debug/verbose message.
    Debug,
}

/// Output formatter with configurable verbosity.
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: io::stdout().is_terminal() && std::env::var("TERM").is_ok(),
        }
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a message only in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"),
            MessageLevel::Debug => ("→ ", "\x1b[36m"),
        };

        if self.colored && !color_code.is_empty() {
            println!("{color_code}{prefix}{message}\x1b[0m");
        } else {
            println!("{prefix}{message}");
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print a labelled value. Only shown in verbose mode.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            println!("  {label}: {value}");
        }
    }

    /// Print a blank line. Suppressed in quiet mode.
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Check if normal output should be printed.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// One line per input file describing where its pages landed.
pub fn section_lines(document: &OutputDocument) -> Vec<String> {
    document
        .sections
        .iter()
        .map(|span| {
            let last = span.first_page + span.page_count.saturating_sub(1);
            if span.page_count == 1 {
                format!("{}: page {}", span.original_name, span.first_page)
            } else {
                format!("{}: pages {}-{}", span.original_name, span.first_page, last)
            }
        })
        .collect()
}

/// Print the result of a successful conversion.
pub fn display_document(formatter: &OutputFormatter, document: &OutputDocument) {
    formatter.success(&format!(
        "Created {} ({} pages, {})",
        document.path.display(),
        document.page_count,
        document.format_size()
    ));

    if formatter.is_verbose() {
        formatter.section("Pages");
        for line in section_lines(document) {
            formatter.debug(&line);
        }
        formatter.blank_line();
        formatter.detail("Job", &document.id.to_string());
        formatter.detail("File", &document.file_name);
    }
}
