use std::collections::HashMap;

use tracing::debug;

use crate::api::AttendanceApi;
use crate::error::Result;
use crate::model::{Event, EventMember, ParticipationRecord};

/// Event uuid → member uuid → record. Missing keys read as unset.
#[derive(Debug, Clone, Default)]
pub struct ParticipationMatrix {
    by_event: HashMap<String, HashMap<String, ParticipationRecord>>,
}

impl ParticipationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_event(&mut self, event_uuid: &str, members: &[EventMember]) {
        let entry = self.by_event.entry(event_uuid.to_string()).or_default();
        for member in members {
            entry.insert(member.uuid.clone(), ParticipationRecord::from(member));
        }
    }

    pub fn insert(&mut self, event_uuid: &str, member_uuid: &str, record: ParticipationRecord) {
        self.by_event
            .entry(event_uuid.to_string())
            .or_default()
            .insert(member_uuid.to_string(), record);
    }

    pub fn record(&self, event_uuid: &str, member_uuid: &str) -> ParticipationRecord {
        self.by_event
            .get(event_uuid)
            .and_then(|members| members.get(member_uuid))
            .copied()
            .unwrap_or_default()
    }
}

/// One sequential `events/{uuid}/members` call per selected event.
pub fn fetch_participation<A: AttendanceApi + ?Sized>(
    api: &A,
    events: &[Event],
) -> Result<ParticipationMatrix> {
    let mut matrix = ParticipationMatrix::new();
    for event in events {
        let members = api.event_members(&event.uuid)?;
        debug!(uuid = %event.uuid, name = %event.name, members = members.len(), "Fetched participation");
        matrix.insert_event(&event.uuid, &members);
    }
    Ok(matrix)
}
