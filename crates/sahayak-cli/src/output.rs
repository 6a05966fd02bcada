//! Output formatting for the `sahayak` CLI
//!
//! Commands write through an [`OutputFormatter`] so the same code path
//! produces either human text or machine-readable JSON.

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// A heading followed by an indented block of `info` lines
    fn section(&self, title: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
///
/// In quiet mode only warnings and errors are written.
pub struct HumanFormatter {
    pub quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        if !self.quiet {
            println!("\u{2713} {}", message);
        }
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
    fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", title);
        }
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

/// JSON output formatter
///
/// Only `print_json`, `success` and `error` write anything; commands emit
/// their payload as a single JSON document.
pub struct JsonFormatter;

impl JsonFormatter {
    fn status(ok: bool, key: &str, message: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("success".to_string(), ok.into());
        body.insert(key.to_string(), message.into());
        body.into()
    }
}

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", Self::status(true, "message", message));
    }
    fn error(&self, message: &str) {
        eprintln!("{}", Self::status(false, "error", message));
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn section(&self, _title: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}", Self::status(false, "error", &e.to_string())),
        }
    }
}

pub fn get_formatter(json: bool, quiet: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter { quiet })
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_status_shape() {
        let value = JsonFormatter::status(false, "error", "No such key");
        assert_eq!(value, serde_json::json!({"success": false, "error": "No such key"}));
    }

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate("Fractions", 20), "Fractions");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("पानी का चक्र और बादल", 8), "पानी ...");
    }
}
