use std::io::Read;

use serde::Deserialize;

use super::SearchError;
use crate::models::{Event, EventSeries, SearchPage};
use crate::transport::{HttpResponse, ResponseBody, TransportError};

const STATUS_BODY_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    results_returned: i64,
    #[serde(default)]
    results_available: i64,
    #[serde(default)]
    results_start: i64,
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    title: String,
    description: String,
    event_url: String,
    started_at: String,
    ended_at: String,
    limit: Option<i64>,
    series: Option<EventSeries>,
    address: Option<String>,
    place: Option<String>,
    owner_display_name: String,
    accepted: i64,
    waiting: i64,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Event {
            title: raw.title,
            description: raw.description,
            url: raw.event_url,
            started_at: raw.started_at,
            ended_at: raw.ended_at,
            limit: raw.limit,
            series: raw.series,
            address: raw.address,
            place: raw.place,
            owner_display_name: raw.owner_display_name,
            accepted: raw.accepted,
            waiting: raw.waiting,
        }
    }
}

impl From<ResponseEnvelope> for SearchPage {
    fn from(envelope: ResponseEnvelope) -> Self {
        SearchPage {
            results_returned: envelope.results_returned,
            results_available: envelope.results_available,
            results_start: envelope.results_start,
            events: envelope.events.into_iter().map(Event::from).collect(),
        }
    }
}

/// Owns the response body and releases it when dropped.
struct BodyGuard {
    body: Box<dyn ResponseBody>,
}

impl BodyGuard {
    fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.body.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Drop for BodyGuard {
    fn drop(&mut self) {
        if let Err(err) = self.body.close() {
            log::warn!("failed to release response body: {err}");
        }
    }
}

/// Reads the whole body and decodes it into a page of events.
pub(crate) fn read_page(
    response: HttpResponse,
    require_success_status: bool,
) -> Result<SearchPage, SearchError> {
    let status = response.status;
    let success = response.is_success();
    let mut guard = BodyGuard {
        body: response.body,
    };
    let bytes = guard
        .read_all()
        .map_err(|err| SearchError::Transport(TransportError::from(err)))?;

    if !success {
        if require_success_status {
            return Err(SearchError::Status {
                status,
                body: truncate(&String::from_utf8_lossy(&bytes), STATUS_BODY_LIMIT),
            });
        }
        log::warn!("event search returned HTTP {status}, decoding body anyway");
    }

    let envelope: ResponseEnvelope = serde_json::from_slice(&bytes)?;
    Ok(envelope.into())
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
