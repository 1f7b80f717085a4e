use crate::types::KnowledgeBaseEntry;

/// Format seconds as MM:SS, or H:MM:SS from one hour up
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, mins, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Group digits in thousands: 1234567 -> 1,234,567
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a saved entry as human-readable markdown
pub fn format_entry_readable(entry: &KnowledgeBaseEntry) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", entry.metadata.title));
    output.push_str(&format!(
        "**URL:** {} | **Saved:** {} | **Source:** {}\n\n",
        entry.metadata.url, entry.metadata.saved_at, entry.metadata.source
    ));

    if !entry.main_content.is_empty() {
        output.push_str("## Main content\n\n");
        output.push_str(&entry.main_content);
        output.push_str("\n\n");
    }

    output.push_str("## Transcription\n\n");
    output.push_str(entry.transcription.trim());
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::types::EntryMetadata;

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(754.9), "12:34");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
        assert_eq!(format_timestamp(-3.0), "00:00");
    }

    #[test]
    fn counts() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn readable_entry_skips_empty_main_content() {
        let entry = KnowledgeBaseEntry {
            metadata: EntryMetadata {
                title: "Title".into(),
                url: "https://youtu.be/x".into(),
                saved_at: "2024-01-01T10:00:00+00:00".into(),
                source: "youtube".into(),
            },
            transcription: "  Body text.  ".into(),
            raw_data: Map::new(),
            main_content: String::new(),
        };

        let readable = format_entry_readable(&entry);
        assert!(readable.starts_with("# Title\n\n"));
        assert!(!readable.contains("## Main content"));
        assert!(readable.ends_with("## Transcription\n\nBody text.\n"));
    }
}
