use chrono::{DateTime, Utc};

use eventsystem_store::EventRecord;

/// Plain-text table, one event per line.
pub fn table(events: &[EventRecord]) -> String {
    let mut out = format!(
        "{:<36}  {:<9}  {:<24}  {:<20}  {}\n",
        "ID", "STATUS", "NAME", "PUBLISHED", "ERROR"
    );
    for event in events {
        out.push_str(&format!(
            "{:<36}  {:<9}  {:<24}  {:<20}  {}\n",
            event.id,
            event.status(),
            event.name,
            timestamp(&event.published_at),
            event.error.as_deref().unwrap_or("-"),
        ));
    }
    out
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_shows_status_and_error() {
        let mut event = EventRecord::new("order.created", json!({}));
        event.id = "0b6f1f0e-5a3c-4a57-9a3e-1d2f3c4b5a69".into();
        event.started_at = Some(Utc::now());
        event.error = Some("insufficient stock".into());

        let rendered = table(&[event]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("errored"));
        assert!(lines[1].contains("order.created"));
        assert!(lines[1].ends_with("insufficient stock"));
    }

    #[test]
    fn healthy_event_has_no_error_column() {
        let event = EventRecord::new("order.created", json!({}));
        let rendered = table(&[event]);
        assert!(rendered.lines().nth(1).unwrap().contains("pending"));
        assert!(rendered.trim_end().ends_with('-'));
    }
}
