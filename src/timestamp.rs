//! Video offsets in canonical `MM:SS` form.
//!
//! Minutes are unbounded, seconds are always two digits. Assistant answers
//! cite chunks with bracketed markers like `[01:30]`.

use crate::error::ScrubError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// An offset into a video, at whole-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: u64,
}

impl Timestamp {
    /// Create a timestamp from whole seconds.
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Create a timestamp from a millisecond offset. Sub-second precision is dropped.
    pub fn from_millis(millis: u64) -> Self {
        Self::from_seconds(millis / 1000)
    }

    /// Total offset in seconds.
    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }

    /// Link that opens the video at this offset.
    pub fn seek_url(&self, video_id: &str) -> String {
        let id: String = url::form_urlencoded::byte_serialize(video_id.as_bytes()).collect();
        format!("https://www.youtube.com/watch?v={}&t={}s", id, self.seconds)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

impl FromStr for Timestamp {
    type Err = ScrubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScrubError::InvalidInput(format!("Invalid timestamp: {:?}", s));

        let (minutes, seconds) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minutes.is_empty()
            || seconds.len() != 2
            || !minutes.bytes().all(|b| b.is_ascii_digit())
            || !seconds.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
        let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
        if seconds >= 60 {
            return Err(invalid());
        }

        let total = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .ok_or_else(invalid)?;
        Ok(Self::from_seconds(total))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d{2,}):([0-5]\d)\]").expect("citation regex is valid"))
}

/// Extract every `[MM:SS]` citation in `text`, in order of appearance.
pub fn citations(text: &str) -> Vec<Timestamp> {
    citation_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let minutes: u64 = caps[1].parse().ok()?;
            let seconds: u64 = caps[2].parse().ok()?;
            let total = minutes.checked_mul(60)?.checked_add(seconds)?;
            Some(Timestamp::from_seconds(total))
        })
        .collect()
}
