use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// Which external system owns the provider copy of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarProvider {
    Google,
    Apple,
}

impl CalendarProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

impl From<String> for CalendarProvider {
    fn from(provider: String) -> Self {
        match provider.as_str() {
            "apple" => Self::Apple,
            _ => Self::Google,
        }
    }
}

impl From<CalendarProvider> for String {
    fn from(provider: CalendarProvider) -> Self {
        provider.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Unlinked,
    Linked,
    Pending,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::Unlinked
    }
}

impl From<String> for SyncState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "linked" => Self::Linked,
            "pending" => Self::Pending,
            _ => Self::Unlinked,
        }
    }
}

impl From<SyncState> for String {
    fn from(state: SyncState) -> Self {
        match state {
            SyncState::Unlinked => "unlinked".to_string(),
            SyncState::Linked => "linked".to_string(),
            SyncState::Pending => "pending".to_string(),
        }
    }
}

/// The canonical server-held representation of a calendar event. This is the
/// record treated as ground truth during conflict resolution.
///
/// Identity: `id` is assigned exactly once when the record is persisted and
/// never reused. `sync_id` is the stable token minted on the creating side
/// that lets independent stores recognize "this is the same event" before a
/// canonical id exists. At most one record exists per
/// `(owner_user_id, sync_id)` pair.
///
/// A record with `deleted_at` set is a tombstone: invisible to normal reads
/// but returned by change-feed reads until purged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: ID,
    pub owner_user_id: ID,
    pub sync_id: String,
    pub title: String,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Clock time, `HH:MM`
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub reminder_minutes: Option<i64>,
    /// Absolute epoch millis at which the reminder should fire
    pub reminder_at: Option<i64>,
    pub provider: Option<CalendarProvider>,
    pub external_id: Option<String>,
    pub external_calendar_id: Option<String>,
    pub sync_state: SyncState,
    pub last_synced_at: Option<i64>,
    /// The provider's notion of last-modified for the external copy
    pub external_updated_at: Option<i64>,
    pub source_device: Option<String>,
    pub created: i64,
    /// Local edit clock, epoch millis
    pub updated: i64,
    /// Tombstone marker, null while alive
    pub deleted_at: Option<i64>,
}

impl Entity for CalendarEvent {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl CalendarEvent {
    pub fn is_tombstone(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The timestamp the canonical record itself reflects, used when deciding
    /// whether an incoming provider write is stale.
    pub fn canonical_ts(&self) -> i64 {
        self.updated.max(self.last_synced_at.unwrap_or(0))
    }

    /// True when the canonical record is strictly newer than the incoming
    /// external timestamp, meaning the incoming write has already been
    /// superseded and must be dropped silently.
    pub fn supersedes(&self, external_updated_at: Option<i64>) -> bool {
        match external_updated_at {
            Some(ts) => self.canonical_ts() > ts,
            // No timestamp on the incoming item means we cannot call it
            // stale, so it wins.
            None => false,
        }
    }

    /// The watermark this record contributes to the change feed. Tombstones
    /// use their deletion time so a deletion is always observable after the
    /// last live update.
    pub fn change_cursor(&self) -> i64 {
        self.updated.max(self.deleted_at.unwrap_or(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(updated: i64, last_synced_at: Option<i64>) -> CalendarEvent {
        CalendarEvent {
            id: Default::default(),
            owner_user_id: Default::default(),
            sync_id: "evt_1".into(),
            title: "Standup".into(),
            date: "2025-01-10".into(),
            start_time: Some("09:00".into()),
            end_time: None,
            description: None,
            color: None,
            reminder_minutes: None,
            reminder_at: None,
            provider: None,
            external_id: None,
            external_calendar_id: None,
            sync_state: Default::default(),
            last_synced_at,
            external_updated_at: None,
            source_device: None,
            created: 0,
            updated,
            deleted_at: None,
        }
    }

    #[test]
    fn canonical_record_supersedes_older_external_write() {
        let e = event(2000, None);
        assert!(e.supersedes(Some(1000)));
        assert!(!e.supersedes(Some(2000)));
        assert!(!e.supersedes(Some(3000)));
    }

    #[test]
    fn last_synced_at_counts_towards_canonical_ts() {
        let e = event(1000, Some(5000));
        assert_eq!(e.canonical_ts(), 5000);
        assert!(e.supersedes(Some(4000)));
    }

    #[test]
    fn missing_external_timestamp_is_never_stale() {
        let e = event(2000, None);
        assert!(!e.supersedes(None));
    }

    #[test]
    fn tombstone_moves_the_change_cursor_forward() {
        let mut e = event(1000, None);
        assert_eq!(e.change_cursor(), 1000);
        e.deleted_at = Some(1500);
        assert_eq!(e.change_cursor(), 1500);
        assert!(e.is_tombstone());
    }
}
