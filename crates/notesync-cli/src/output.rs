use chrono::{DateTime, Utc};
use notesync_core::domain::{Importance, Note};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

// ============================================================================
// Note rendering
// ============================================================================

/// One-line summary used by `note list` and `watch`
pub fn note_line(note: &Note, now: DateTime<Utc>) -> String {
    let marker = match note.importance() {
        Importance::High => "!",
        Importance::Normal => " ",
        Importance::Low => "\u{2193}",
    };
    let mut line = format!("{} {}  {}", marker, note.id(), note.title());
    if note.is_expired(now) {
        line.push_str("  (expired)");
    } else if let Some(deadline) = note.self_destruct_at() {
        line.push_str(&format!("  (until {})", deadline.format("%Y-%m-%d %H:%M")));
    }
    line
}

/// Multi-line detail view used by `note show`
pub fn note_details(note: &Note) -> Vec<String> {
    let mut lines = vec![
        format!("ID:          {}", note.id()),
        format!("Title:       {}", note.title()),
        format!("Importance:  {}", note.importance().as_str()),
        format!("Color:       {}", note.color()),
    ];
    if let Some(deadline) = note.self_destruct_at() {
        lines.push(format!("Deadline:    {}", deadline.to_rfc3339()));
    }
    lines.push(format!("Created:     {}", note.created_at().to_rfc3339()));
    lines.push(format!(
        "Modified:    {} by {}",
        note.last_modified_at().to_rfc3339(),
        note.last_modified_by()
    ));
    if !note.body().is_empty() {
        lines.push(String::new());
        lines.extend(note.body().lines().map(str::to_string));
    }
    lines
}

pub fn note_json(note: &Note) -> serde_json::Value {
    serde_json::to_value(note).unwrap_or(serde_json::Value::Null)
}
