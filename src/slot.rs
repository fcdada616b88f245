//! Slot identity — the fixed 30-minute grid.
//!
//! DESIGN
//! ======
//! A slot is identified by its 24-hour start time, `HH:MM`, 48 per day.
//! `SlotId` is the canonical key everywhere: the snapshot endpoint, push
//! events, and outbound commands all speak this form. The AM/PM period and
//! the 12-hour rendering are display concerns derived from the hour, never
//! part of identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minutes-past-the-hour values a slot may start on.
const SLOT_MINUTES: [u8; 2] = [0, 30];

/// Number of slots in one day.
pub const SLOTS_PER_DAY: usize = 48;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot time must be HH:MM: {0:?}")]
    Malformed(String),
    #[error("slot time off the 30-minute grid: {0:?}")]
    OffGrid(String),
}

// =============================================================================
// PERIOD
// =============================================================================

/// AM/PM display hint sent alongside book commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Am => f.write_str("AM"),
            Period::Pm => f.write_str("PM"),
        }
    }
}

// =============================================================================
// SLOT ID
// =============================================================================

/// Identifier of one fixed 30-minute interval, canonical form `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    hour: u8,
    minute: u8,
}

impl SlotId {
    /// Construct a slot from hour and minute, validating the grid.
    pub fn new(hour: u8, minute: u8) -> Result<Self, SlotError> {
        let raw = format!("{hour:02}:{minute:02}");
        if hour >= 24 || !SLOT_MINUTES.contains(&minute) {
            return Err(SlotError::OffGrid(raw));
        }
        Ok(Self { hour, minute })
    }

    /// All 48 slots of the day in chronological order.
    #[must_use]
    pub fn all() -> Vec<SlotId> {
        let mut slots = Vec::with_capacity(SLOTS_PER_DAY);
        for hour in 0..24 {
            for minute in SLOT_MINUTES {
                slots.push(Self { hour, minute });
            }
        }
        slots
    }

    /// Resolve a slot key from either a bare `HH:MM` or an absolute
    /// timestamp (`YYYY-MM-DDTHH:MM:SS`, space separator also accepted).
    /// Seconds are ignored; snapshots only ever carry on-grid times.
    pub fn from_timestamp(raw: &str) -> Result<Self, SlotError> {
        let time = raw.split_once(['T', ' ']).map_or(raw, |(_, rest)| rest);
        let hhmm = time
            .get(..5)
            .ok_or_else(|| SlotError::Malformed(raw.to_owned()))?;
        hhmm.parse()
    }

    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }

    /// AM for hours 0–11, PM for 12–23.
    #[must_use]
    pub fn period(self) -> Period {
        if self.hour < 12 { Period::Am } else { Period::Pm }
    }

    /// 12-hour rendering for display, e.g. `00:30` → `12:30 AM`.
    #[must_use]
    pub fn to_12_hour(self) -> String {
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{hour}:{:02} {}", self.minute, self.period())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for SlotId {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((hour, minute)) = s.split_once(':') else {
            return Err(SlotError::Malformed(s.to_owned()));
        };
        let hour: u8 = hour
            .parse()
            .map_err(|_| SlotError::Malformed(s.to_owned()))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| SlotError::Malformed(s.to_owned()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(slot: SlotId) -> Self {
        slot.to_string()
    }
}

#[cfg(test)]
#[path = "slot_test.rs"]
mod tests;
