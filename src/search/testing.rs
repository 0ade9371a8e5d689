//! JSON fixtures shaped like connpass search replies.

pub(crate) fn event_json(title: &str) -> String {
    format!(
        r#"{{
            "event_id": 1,
            "title": "{title}",
            "catch": "",
            "description": "<p>{title} details</p>",
            "event_url": "https://example.connpass.com/event/1/",
            "started_at": "2024-01-15T19:00:00+09:00",
            "ended_at": "2024-01-15T21:00:00+09:00",
            "limit": 50,
            "hash_tag": "rust",
            "event_type": "participation",
            "accepted": 40,
            "waiting": 3,
            "updated_at": "2024-01-10T12:00:00+09:00",
            "owner_id": 10,
            "owner_nickname": "organizer_nick",
            "owner_display_name": "organizer",
            "place": "Hall A",
            "address": "Tokyo",
            "lat": "35.6",
            "lon": "139.7",
            "series": {{"id": 5, "title": "Rust Tokyo", "url": "https://rust.connpass.com/"}}
        }}"#
    )
}

pub(crate) fn envelope_json(titles: &[&str]) -> String {
    let events: Vec<String> = titles.iter().map(|title| event_json(title)).collect();
    format!(
        r#"{{"results_returned": {}, "results_available": {}, "results_start": 1, "events": [{}]}}"#,
        titles.len(),
        titles.len(),
        events.join(",")
    )
}
