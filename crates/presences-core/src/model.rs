//! Wire and domain types shared by the fetchers and the report renderer.

use serde::{Deserialize, Deserializer};

/// Tri-state answer carried by the `participation` and `presence` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mark {
    Yes,
    No,
    #[default]
    Unset,
}

impl Mark {
    /// Literal cell text for a set mark, `None` when unset.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Mark::Yes => Some("yes"),
            Mark::No => Some("no"),
            Mark::Unset => None,
        }
    }

    /// Maps an upstream value; anything other than `yes`/`no` counts as unset.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("yes") => Mark::Yes,
            Some("no") => Mark::No,
            _ => Mark::Unset,
        }
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Mark::from_wire(raw.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub uuid: String,
    pub name: String,
    pub start_date: i64,
    pub end_date: i64,
}

impl Event {
    /// True when the event span strictly overlaps `[start, end)`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.end_date > start && self.start_date < end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Member {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One entry of `events/{uuid}/members`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventMember {
    pub uuid: String,
    #[serde(default)]
    pub participation: Mark,
    #[serde(default)]
    pub presence: Mark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticipationRecord {
    pub participation: Mark,
    pub presence: Mark,
}

impl From<&EventMember> for ParticipationRecord {
    fn from(value: &EventMember) -> Self {
        Self {
            participation: value.participation,
            presence: value.presence,
        }
    }
}
