use crate::events_api::EventsApi;
use crate::store::LocalEventCache;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempo_api_structs::dtos::{CalendarEventDTO, EventPayload};
use thiserror::Error;
use tracing::warn;

/// A calendar event as the client stores it. `id` is minted on the device
/// and doubles as the sync id sent to the server, so retried uploads of the
/// same event collapse into one canonical record. `server_id` is adopted
/// from the server once the record is linked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEvent {
    pub id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub reminder_minutes: Option<i64>,
    #[serde(default)]
    pub reminder_at: Option<i64>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub updated: i64,
    /// Set when the provider copy of this event was deleted but the server
    /// has not confirmed the tombstone yet. Keeps the reconciler from
    /// treating the gap as a definitive server side deletion.
    #[serde(default)]
    pub provider_deleted: bool,
    /// Device private annotations. Never uploaded and never touched by a
    /// merge, the server has no column for them.
    #[serde(default)]
    pub local_notes: Option<String>,
}

impl LocalEvent {
    fn from_server(server: &CalendarEventDTO) -> Self {
        let id = if server.sync_id.is_empty() {
            format!("srv_{}", server.id.as_string())
        } else {
            server.sync_id.clone()
        };
        let mut event = Self {
            id,
            ..Default::default()
        };
        apply_server_event(&mut event, server);
        event
    }
}

/// Overwrites the shared fields of `local` with the server copy, which is
/// ground truth. Returns whether anything actually changed. `local_notes`
/// is deliberately left alone.
fn apply_server_event(local: &mut LocalEvent, server: &CalendarEventDTO) -> bool {
    let before = local.clone();
    local.server_id = Some(server.id.as_string());
    local.title = server.title.clone();
    local.date = server.date.clone();
    local.start_time = server.start_time.clone();
    local.end_time = server.end_time.clone();
    local.description = server.description.clone();
    local.color = server.color.clone();
    local.reminder_minutes = server.reminder_minutes;
    local.reminder_at = server.reminder_at;
    local.provider = server.provider.map(|p| p.as_str().to_string());
    local.external_id = server.external_id.clone();
    local.updated = server.updated;
    *local != before
}

fn upload_payload(local: &LocalEvent) -> EventPayload {
    EventPayload {
        title: local.title.clone(),
        date: local.date.clone(),
        start_time: local.start_time.clone(),
        end_time: local.end_time.clone(),
        description: local.description.clone(),
        color: local.color.clone(),
        reminder_minutes: local.reminder_minutes,
        reminder_at: local.reminder_at,
        sync_id: Some(local.id.clone()),
        ..Default::default()
    }
}

pub trait EventChangeObserver: Send + Sync {
    /// Fired at most once per reconcile run, after the cache was persisted
    fn on_events_changed(&self);
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Server request failed: {0}")]
    Api(String),
    #[error("Local storage failed: {0}")]
    Storage(String),
}

type RunFuture = Shared<BoxFuture<'static, Result<bool, ReconcileError>>>;

#[derive(Default)]
struct RunState {
    in_flight: Option<RunFuture>,
    last_finished: Option<Instant>,
}

struct Inner {
    api: Arc<dyn EventsApi>,
    cache: LocalEventCache,
    observers: Mutex<Vec<Arc<dyn EventChangeObserver>>>,
}

/// Brings the local event cache and the server event list to the same
/// state. The server copy wins every conflict, local only events are
/// uploaded, and events the server no longer knows are dropped locally.
///
/// Concurrent triggers share a single run instead of issuing duplicate
/// round trips, and completed runs throttle the next one by `min_interval`.
pub struct Reconciler {
    inner: Arc<Inner>,
    state: Arc<tokio::sync::Mutex<RunState>>,
    min_interval: Duration,
}

impl Reconciler {
    pub fn new(api: Arc<dyn EventsApi>, cache: LocalEventCache, min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache,
                observers: Mutex::new(Vec::new()),
            }),
            state: Arc::new(tokio::sync::Mutex::new(RunState::default())),
            min_interval,
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn EventChangeObserver>) {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    /// The current locally cached events
    pub fn events(&self) -> Vec<LocalEvent> {
        self.inner.cache.load()
    }

    /// Runs one reconcile pass. Returns whether the local cache changed.
    /// A trigger that arrives while a pass is in flight awaits that pass,
    /// and a trigger within `min_interval` of the previous completed pass
    /// is a no-op.
    pub async fn reconcile(&self) -> Result<bool, ReconcileError> {
        let run = {
            let mut state = self.state.lock().await;
            if let Some(run) = &state.in_flight {
                run.clone()
            } else {
                if let Some(last) = state.last_finished {
                    if last.elapsed() < self.min_interval {
                        return Ok(false);
                    }
                }
                let inner = self.inner.clone();
                let state_handle = self.state.clone();
                let run: RunFuture = async move {
                    let res = run_pass(&inner).await;
                    let mut state = state_handle.lock().await;
                    state.in_flight = None;
                    state.last_finished = Some(Instant::now());
                    res
                }
                .boxed()
                .shared();
                state.in_flight = Some(run.clone());
                run
            }
        };
        run.await
    }
}

async fn run_pass(inner: &Inner) -> Result<bool, ReconcileError> {
    let mut locals = inner.cache.load();
    let mut server_events = inner
        .api
        .list_events()
        .await
        .map_err(|e| ReconcileError::Api(e.to_string()))?;
    let mut changed = false;

    // Upload events only this device knows about. Provider owned copies are
    // pushed through the sync endpoints instead, never from here.
    let mut created_any = false;
    let by_sync = index_by_sync(&server_events);
    for local in locals.iter_mut() {
        if local.server_id.is_some() || local.provider.is_some() {
            continue;
        }
        if let Some(server_id) = by_sync.get(&local.id) {
            // The server already holds this event, a previous upload lost
            // its response. Adopt the existing record.
            local.server_id = Some(server_id.clone());
            changed = true;
            continue;
        }
        match inner.api.create_event(upload_payload(local)).await {
            Ok(event_id) => {
                local.server_id = Some(event_id.as_string());
                changed = true;
                created_any = true;
            }
            Err(e) => {
                warn!("Deferring upload of local event {}: {:?}", local.id, e);
            }
        }
    }

    if created_any {
        server_events = inner
            .api
            .list_events()
            .await
            .map_err(|e| ReconcileError::Api(e.to_string()))?;
    }

    // Server wins. Fold every server event into the cache, materializing
    // records this device has never seen.
    for server_event in &server_events {
        let server_id = server_event.id.as_string();
        // A server-id link is authoritative; the sync-id match is only a
        // fallback for records that never saw their create response
        let existing = locals
            .iter()
            .position(|l| l.server_id.as_deref() == Some(server_id.as_str()))
            .or_else(|| {
                locals
                    .iter()
                    .position(|l| l.server_id.is_none() && l.id == server_event.sync_id)
            });
        match existing {
            Some(idx) => {
                if apply_server_event(&mut locals[idx], server_event) {
                    changed = true;
                }
            }
            None => {
                locals.push(LocalEvent::from_server(server_event));
                changed = true;
            }
        }
    }

    // A linked local event whose server record vanished was deleted for
    // good on the server. Drop it, unless the gap is a provider deletion
    // still waiting for its tombstone.
    let live_ids: std::collections::HashSet<String> =
        server_events.iter().map(|e| e.id.as_string()).collect();
    let before = locals.len();
    locals.retain(|l| match &l.server_id {
        Some(server_id) if !live_ids.contains(server_id) => l.provider_deleted,
        _ => true,
    });
    if locals.len() != before {
        changed = true;
    }

    if changed {
        inner.cache.persist(&locals)?;
        let observers = inner
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for observer in observers {
            observer.on_events_changed();
        }
    }
    Ok(changed)
}

fn index_by_sync(events: &[CalendarEventDTO]) -> HashMap<String, String> {
    events
        .iter()
        .filter(|e| !e.sync_id.is_empty())
        .map(|e| (e.sync_id.clone(), e.id.as_string()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{APIError, APIResponse};
    use crate::store::InMemoryKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempo_domain::ID;

    fn server_event(sync_id: &str, title: &str) -> CalendarEventDTO {
        CalendarEventDTO {
            id: Default::default(),
            owner_user_id: Default::default(),
            sync_id: sync_id.into(),
            title: title.into(),
            date: "2025-03-10".into(),
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
            last_synced_at: None,
            external_updated_at: None,
            source_device: None,
            created: 0,
            updated: 10,
            deleted_at: None,
        }
    }

    #[derive(Default)]
    struct FakeEventsApi {
        events: Mutex<Vec<CalendarEventDTO>>,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        list_delay: Option<Duration>,
    }

    impl FakeEventsApi {
        fn seeded(events: Vec<CalendarEventDTO>) -> Self {
            Self {
                events: Mutex::new(events),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl EventsApi for FakeEventsApi {
        async fn list_events(&self) -> APIResponse<Vec<CalendarEventDTO>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.list_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.events.lock().unwrap().clone())
        }

        async fn create_event(&self, payload: EventPayload) -> APIResponse<ID> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let mut events = self.events.lock().unwrap();
            if let Some(existing) = events
                .iter()
                .find(|e| Some(&e.sync_id) == payload.sync_id.as_ref())
            {
                return Ok(existing.id.clone());
            }
            let mut event = server_event(
                payload.sync_id.as_deref().unwrap_or_default(),
                &payload.title,
            );
            event.date = payload.date;
            event.start_time = payload.start_time;
            events.push(event.clone());
            Ok(event.id)
        }
    }

    struct Harness {
        reconciler: Reconciler,
        api: Arc<FakeEventsApi>,
        store: Arc<InMemoryKeyValueStore>,
    }

    fn setup(api: FakeEventsApi, min_interval: Duration) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cache = LocalEventCache::new(store.clone(), "u1");
        Harness {
            reconciler: Reconciler::new(api.clone(), cache, min_interval),
            api,
            store,
        }
    }

    fn seed_locals(store: &Arc<InMemoryKeyValueStore>, events: &[LocalEvent]) {
        LocalEventCache::new(store.clone() as Arc<dyn crate::KeyValueStore>, "u1")
            .persist(events)
            .unwrap();
    }

    #[tokio::test]
    async fn upload_adopts_existing_server_record_instead_of_duplicating() {
        let server = server_event("evt_1", "Dentist");
        let expected_server_id = server.id.as_string();
        let h = setup(FakeEventsApi::seeded(vec![server]), Duration::ZERO);
        seed_locals(
            &h.store,
            &[LocalEvent {
                id: "evt_1".into(),
                title: "Dentist".into(),
                date: "2025-03-10".into(),
                ..Default::default()
            }],
        );

        assert!(h.reconciler.reconcile().await.unwrap());

        let locals = h.reconciler.events();
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].server_id.as_deref(), Some(&*expected_server_id));
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lost_create_response_does_not_upload_twice() {
        let h = setup(FakeEventsApi::default(), Duration::ZERO);
        seed_locals(
            &h.store,
            &[LocalEvent {
                id: "evt_2".into(),
                title: "Standup".into(),
                date: "2025-03-11".into(),
                ..Default::default()
            }],
        );

        h.reconciler.reconcile().await.unwrap();
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 1);

        // Pretend the device never saw the ack and relinks from scratch
        let mut locals = h.reconciler.events();
        locals[0].server_id = None;
        seed_locals(&h.store, &locals);

        h.reconciler.reconcile().await.unwrap();
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.api.events.lock().unwrap().len(), 1);
        assert!(h.reconciler.events()[0].server_id.is_some());
    }

    struct CountingObserver(AtomicUsize);

    impl EventChangeObserver for CountingObserver {
        fn on_events_changed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn converged_state_is_stable_and_silent() {
        let api = FakeEventsApi::seeded(vec![
            server_event("evt_1", "Dentist"),
            server_event("evt_2", "Standup"),
        ]);
        let h = setup(api, Duration::ZERO);
        let observer = Arc::new(CountingObserver(AtomicUsize::new(0)));
        h.reconciler.subscribe(observer.clone());

        assert!(h.reconciler.reconcile().await.unwrap());
        assert!(!h.reconciler.reconcile().await.unwrap());
        assert!(!h.reconciler.reconcile().await.unwrap());

        assert_eq!(h.reconciler.events().len(), 2);
        assert_eq!(h.store.write_count(), 1);
        assert_eq!(observer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_wins_but_device_notes_survive() {
        let mut server = server_event("evt_1", "Dentist 14:30");
        server.color = Some("#ff0000".into());
        let server_id = server.id.as_string();
        let h = setup(FakeEventsApi::seeded(vec![server]), Duration::ZERO);
        seed_locals(
            &h.store,
            &[LocalEvent {
                id: "evt_1".into(),
                server_id: Some(server_id),
                title: "Dentist".into(),
                date: "2025-03-10".into(),
                local_notes: Some("bring the referral letter".into()),
                ..Default::default()
            }],
        );

        assert!(h.reconciler.reconcile().await.unwrap());

        let locals = h.reconciler.events();
        assert_eq!(locals[0].title, "Dentist 14:30");
        assert_eq!(locals[0].color.as_deref(), Some("#ff0000"));
        assert_eq!(
            locals[0].local_notes.as_deref(),
            Some("bring the referral letter")
        );
    }

    #[tokio::test]
    async fn merge_prefers_the_server_id_link_over_a_sync_id_match() {
        let server = server_event("evt_1", "Dentist 14:30");
        let server_id = server.id.as_string();
        let h = setup(FakeEventsApi::seeded(vec![server]), Duration::ZERO);
        // The sync-id candidate sits first in the cache; the linked record
        // must still win the merge
        seed_locals(
            &h.store,
            &[
                LocalEvent {
                    id: "evt_1".into(),
                    title: "Phone copy".into(),
                    date: "2025-03-10".into(),
                    provider: Some("apple".into()),
                    ..Default::default()
                },
                LocalEvent {
                    id: "local_2".into(),
                    server_id: Some(server_id.clone()),
                    title: "Stale".into(),
                    date: "2025-03-10".into(),
                    ..Default::default()
                },
            ],
        );

        assert!(h.reconciler.reconcile().await.unwrap());

        let locals = h.reconciler.events();
        let linked = locals.iter().find(|l| l.id == "local_2").unwrap();
        assert_eq!(linked.title, "Dentist 14:30");
        assert_eq!(linked.server_id.as_deref(), Some(&*server_id));
        let unlinked = locals.iter().find(|l| l.id == "evt_1").unwrap();
        assert_eq!(unlinked.title, "Phone copy");
        assert!(unlinked.server_id.is_none());
    }

    #[tokio::test]
    async fn vanished_server_record_deletes_local_copy() {
        let h = setup(FakeEventsApi::default(), Duration::ZERO);
        seed_locals(
            &h.store,
            &[
                LocalEvent {
                    id: "evt_1".into(),
                    server_id: Some("gone-on-server".into()),
                    title: "Old".into(),
                    date: "2025-03-01".into(),
                    ..Default::default()
                },
                LocalEvent {
                    id: "evt_2".into(),
                    server_id: Some("also-gone".into()),
                    title: "Imported".into(),
                    date: "2025-03-02".into(),
                    provider: Some("google".into()),
                    provider_deleted: true,
                    ..Default::default()
                },
            ],
        );

        assert!(h.reconciler.reconcile().await.unwrap());

        let locals = h.reconciler.events();
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].id, "evt_2");
    }

    #[tokio::test]
    async fn completed_runs_throttle_the_next_trigger() {
        let api = FakeEventsApi::seeded(vec![server_event("evt_1", "Dentist")]);
        let h = setup(api, Duration::from_secs(3600));

        assert!(h.reconciler.reconcile().await.unwrap());
        assert!(!h.reconciler.reconcile().await.unwrap());
        assert_eq!(h.api.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_triggers_share_one_run() {
        let api = FakeEventsApi {
            events: Mutex::new(vec![server_event("evt_1", "Dentist")]),
            list_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let h = setup(api, Duration::ZERO);

        let (a, b) = tokio::join!(h.reconciler.reconcile(), h.reconciler.reconcile());
        assert!(a.unwrap());
        assert!(b.unwrap());
        assert_eq!(h.api.list_calls.load(Ordering::SeqCst), 1);
    }
}
