use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Filters for an event search. `None` means the filter is not sent at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    pub event_id: Option<i64>,
    /// Every keyword must match.
    pub keyword: Option<String>,
    /// Any keyword may match.
    pub keyword_or: Option<String>,
    /// Year and month, e.g. `202401`.
    pub ym: Option<i32>,
    /// Year, month and day, e.g. `20240115`.
    pub ymd: Option<i32>,
    pub nickname: Option<String>,
    pub owner_nickname: Option<String>,
    pub series_id: Option<i64>,
}

impl SearchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn keyword_or(mut self, keyword: impl Into<String>) -> Self {
        self.keyword_or = Some(keyword.into());
        self
    }

    pub fn ym(mut self, ym: i32) -> Self {
        self.ym = Some(ym);
        self
    }

    pub fn ymd(mut self, ymd: i32) -> Self {
        self.ymd = Some(ymd);
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn owner_nickname(mut self, owner_nickname: impl Into<String>) -> Self {
        self.owner_nickname = Some(owner_nickname.into());
        self
    }

    pub fn series_id(mut self, series_id: i64) -> Self {
        self.series_id = Some(series_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSeries {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub description: String,
    pub url: String,
    pub started_at: String,
    pub ended_at: String,
    pub limit: Option<i64>,
    pub series: Option<EventSeries>,
    pub address: Option<String>,
    pub place: Option<String>,
    pub owner_display_name: String,
    pub accepted: i64,
    pub waiting: i64,
}

/// One page of search results together with the paging counters the API reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub results_returned: i64,
    pub results_available: i64,
    pub results_start: i64,
    pub events: Vec<Event>,
}

/// Hex-encoded SHA-256 digest of a user credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn from_plain(plain: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(plain.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: PasswordHash,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, plain_password: &str) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: PasswordHash::from_plain(plain_password),
        }
    }
}
