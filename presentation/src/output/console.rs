//! Console output formatter for query results

use colored::Colorize;
use grounded_application::{ProcessQueryError, QueryOutcome};
use grounded_domain::util::truncate_str;

/// Longest passage excerpt shown in the source list.
const EXCERPT_BYTES: usize = 120;

/// Formats query results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the answer, optionally followed by the passages it was grounded on
    pub fn format_answer(outcome: &QueryOutcome, show_sources: bool) -> String {
        let mut output = String::new();
        output.push_str(outcome.answer.trim());
        output.push('\n');

        if show_sources {
            output.push_str(&Self::format_sources(outcome));
        }
        output
    }

    fn format_sources(outcome: &QueryOutcome) -> String {
        let mut output = format!("\n{}\n", "Sources:".cyan().bold());
        if outcome.passages.is_empty() {
            output.push_str(&format!("  {}\n", "(no matching passages)".dimmed()));
            return output;
        }

        for (i, passage) in outcome.passages.iter().enumerate() {
            let label = passage.source_label().unwrap_or("untitled");
            let excerpt = passage.text.trim().replace('\n', " ");
            let short = truncate_str(&excerpt, EXCERPT_BYTES);
            let ellipsis = if short.len() < excerpt.len() { "..." } else { "" };
            output.push_str(&format!(
                "  {} {} {}\n     {}{}\n",
                format!("[{}]", i + 1).yellow(),
                label.bold(),
                format!("({:.3})", passage.relevance_score).dimmed(),
                short,
                ellipsis
            ));
        }
        output
    }

    /// User-facing text for a failed query. The cause is never shown.
    pub fn format_failure(error: &ProcessQueryError) -> String {
        let message = match error {
            ProcessQueryError::EmptyQuery => "Please enter a question.",
            ProcessQueryError::Cancelled => "Cancelled.",
            e if e.is_transient() => {
                "Sorry, the service is temporarily unavailable. Please try again in a moment."
            }
            _ => "Sorry, I couldn't answer that right now. Please try again.",
        };
        message.red().to_string()
    }

    /// Line showing the active session id
    pub fn format_session(session_id: Option<&str>) -> String {
        match session_id {
            Some(id) => format!("{} {}", "Session:".cyan().bold(), id),
            None => format!(
                "{} {}",
                "Session:".cyan().bold(),
                "none yet (one starts with your next question)".dimmed()
            ),
        }
    }
}
