//! In-memory form state with debounced persistence.
//!
//! One entry per form instance: the effective field state plus at most one
//! pending flush timer. Edits update the state immediately and reset the
//! timer; when it fires, the sink receives the latest full snapshot, so
//! rapid edits coalesce into a single write. Instances are independent and
//! a single active editor per instance is assumed (last-write-wins).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::engine::debounce::StateSink;
use crate::form::types::FormState;
use crate::result_ext::ResultExt;

/// Merge persisted state over definition defaults.
///
/// The definition is authoritative for shape: persisted values win for
/// shared keys, default-only keys keep their defaults, and persisted-only
/// keys no longer present in the definition are dropped.
pub fn merge_state(persisted: &FormState, defaults: &FormState) -> FormState {
    defaults
        .iter()
        .map(|(key, default)| {
            let value = persisted.get(key).unwrap_or(default);
            (key.clone(), value.clone())
        })
        .collect()
}

#[derive(Default)]
struct InstanceEntry {
    state: FormState,
    pending: Option<JoinHandle<()>>,
}

/// Per-instance live state store with debounced flushes.
pub struct FormStateStore {
    sink: Arc<dyn StateSink>,
    delay: Duration,
    entries: Arc<Mutex<HashMap<Uuid, InstanceEntry>>>,
}

impl FormStateStore {
    pub fn new(sink: Arc<dyn StateSink>, delay: Duration) -> Self {
        Self {
            sink,
            delay,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Seed or replace the effective state for an instance without
    /// scheduling a write. Used when an instance loads or its content
    /// changes shape.
    pub async fn load(&self, form_id: Uuid, state: FormState) {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(form_id).or_default();
        entry.state = state;
    }

    /// Current effective state, if the instance has been loaded.
    pub async fn get(&self, form_id: Uuid) -> Option<FormState> {
        self.entries
            .lock()
            .await
            .get(&form_id)
            .map(|entry| entry.state.clone())
    }

    /// Apply a field edit: the in-memory state updates immediately and the
    /// instance's flush timer restarts. The snapshot written when the timer
    /// fires is read at fire time, so it always carries the latest state.
    pub async fn apply_edit(&self, form_id: Uuid, block_id: &str, value: &str) -> FormState {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(form_id).or_default();
        entry.state.insert(block_id.to_string(), value.to_string());
        let snapshot = entry.state.clone();

        if let Some(pending) = entry.pending.take() {
            pending.abort();
        }

        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.entries);
        let delay = self.delay;
        entry.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let state = {
                let entries = shared.lock().await;
                entries.get(&form_id).map(|entry| entry.state.clone())
            };
            if let Some(state) = state {
                let _ = sink
                    .flush(form_id, state)
                    .await
                    .log(format!("flushing state for form {}", form_id));
            }
        }));

        snapshot
    }

    /// Drop an instance's entry, cancelling any pending flush. Called when
    /// the instance is removed from its workspace.
    pub async fn remove(&self, form_id: Uuid) {
        if let Some(entry) = self.entries.lock().await.remove(&form_id) {
            if let Some(pending) = entry.pending {
                pending.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use async_trait::async_trait;

    fn state(pairs: &[(&str, &str)]) -> FormState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: std::sync::Mutex<Vec<(Uuid, FormState)>>,
    }

    impl RecordingSink {
        fn writes(&self) -> Vec<(Uuid, FormState)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StateSink for RecordingSink {
        async fn flush(&self, form_id: Uuid, state: FormState) -> AppResult<()> {
            self.writes.lock().unwrap().push((form_id, state));
            Ok(())
        }
    }

    fn store_with_sink() -> (FormStateStore, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let store = FormStateStore::new(sink.clone(), Duration::from_millis(1000));
        (store, sink)
    }

    #[test]
    fn test_merge_persisted_overrides_defaults() {
        let merged = merge_state(&state(&[("a", "x")]), &state(&[("a", ""), ("b", "")]));
        assert_eq!(merged, state(&[("a", "x"), ("b", "")]));
    }

    #[test]
    fn test_merge_drops_stale_persisted_keys() {
        let merged = merge_state(
            &state(&[("removed", "old"), ("kept", "v")]),
            &state(&[("kept", "")]),
        );
        assert_eq!(merged, state(&[("kept", "v")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_coalesce_into_one_write() {
        let (store, sink) = store_with_sink();
        let id = Uuid::new_v4();
        store.load(id, state(&[("a", "")])).await;

        store.apply_edit(id, "a", "1").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        store.apply_edit(id, "a", "2").await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, id);
        assert_eq!(writes[0].1.get("a"), Some(&"2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_to_different_fields_share_one_write() {
        let (store, sink) = store_with_sink();
        let id = Uuid::new_v4();
        store.load(id, state(&[("a", ""), ("b", "")])).await;

        store.apply_edit(id, "a", "1").await;
        store.apply_edit(id, "b", "2").await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, state(&[("a", "1"), ("b", "2")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_after_window_writes_again() {
        let (store, sink) = store_with_sink();
        let id = Uuid::new_v4();
        store.load(id, state(&[("a", "")])).await;

        store.apply_edit(id, "a", "1").await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        store.apply_edit(id, "a", "2").await;
        tokio::time::sleep(Duration::from_millis(1200)).await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1.get("a"), Some(&"1".to_string()));
        assert_eq!(writes[1].1.get("a"), Some(&"2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_pending_write() {
        let (store, sink) = store_with_sink();
        let id = Uuid::new_v4();
        store.load(id, state(&[("a", "")])).await;

        store.apply_edit(id, "a", "1").await;
        store.remove(id).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(sink.writes().is_empty());
        assert_eq!(store.get(id).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_instances_debounce_independently() {
        let (store, sink) = store_with_sink();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.load(first, FormState::new()).await;
        store.load(second, FormState::new()).await;

        store.apply_edit(first, "a", "1").await;
        store.apply_edit(second, "b", "2").await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 2);
        let ids: Vec<Uuid> = writes.iter().map(|(id, _)| *id).collect();
        assert!(ids.contains(&first));
        assert!(ids.contains(&second));
    }

    #[tokio::test]
    async fn test_apply_edit_returns_effective_state() {
        let (store, _sink) = store_with_sink();
        let id = Uuid::new_v4();
        store.load(id, state(&[("a", ""), ("b", "seed")])).await;

        let effective = store.apply_edit(id, "a", "1").await;
        assert_eq!(effective, state(&[("a", "1"), ("b", "seed")]));
    }
}
