//! Authoritative metric state.
//!
//! The registry owns every live metric plus the "current selection" used
//! when a mutation omits an explicit target. All operations run under one
//! coarse lock: the read-then-write sequences (collision checks, id
//! allocation, selection reassignment) stay inside a single critical section
//! so concurrent callers never observe a half-applied mutation.
//!
//! Mutations follow mutate-then-emit: every successful mutation returns the
//! single [`SyncEvent`] the caller must publish, so outcome and broadcast
//! cannot drift apart.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::clock;
use crate::naming;
use crate::protocol::{MetricView, SyncEvent};

/// Unique, monotonically assigned metric identifier. Never reused, even
/// after deletion.
pub type MetricId = u64;

/// Base used when a create request carries no usable name.
const DEFAULT_BASE_NAME: &str = "new_metric";

#[derive(Debug, Clone)]
struct Metric {
    id: MetricId,
    display_name: String,
    canonical_name: String,
    value: f64,
    #[allow(dead_code)]
    created_at_ms: u64,
}

fn view_of(m: &Metric) -> MetricView {
    MetricView {
        metric_id: m.id,
        display_name: m.display_name.clone(),
        canonical_name: m.canonical_name.clone(),
        value: m.value,
    }
}

struct RegistryState {
    metrics: BTreeMap<MetricId, Metric>,
    selected: Option<MetricId>,
    next_id: MetricId,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            metrics: BTreeMap::new(),
            selected: None,
            next_id: 1,
        }
    }
}

impl RegistryState {
    /// Canonical names of live metrics, optionally excluding one id.
    fn taken_names(&self, exclude: Option<MetricId>) -> HashSet<String> {
        self.metrics
            .values()
            .filter(|m| Some(m.id) != exclude)
            .map(|m| m.canonical_name.clone())
            .collect()
    }
}

/// Outcome of a successful create: the new metric plus the event to fan out.
#[derive(Debug, Clone)]
pub struct Created {
    pub view: MetricView,
    pub event: SyncEvent,
}

/// Thread-safe registry of named numeric metrics.
#[derive(Default)]
pub struct MetricRegistry {
    state: Mutex<RegistryState>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Panics cannot originate in this crate, so a poisoned lock can only be
    // caused by a caller panicking while holding a guard; the state itself
    // is still consistent between operations.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a metric and make it the current selection.
    ///
    /// An absent or blank `display_name` synthesizes a unique name from
    /// `new_metric`; an explicit name that collides with a live canonical
    /// name goes through the same counter-suffix probing.
    pub fn create(&self, display_name: Option<&str>) -> Created {
        let mut st = self.lock();
        let base = match display_name {
            Some(s) if !s.trim().is_empty() => s,
            _ => DEFAULT_BASE_NAME,
        };
        let taken = st.taken_names(None);
        let display = naming::unique_display_name(base, &taken);
        let canonical = naming::normalize(&display);

        let id = st.next_id;
        st.next_id += 1;

        let metric = Metric {
            id,
            display_name: display,
            canonical_name: canonical,
            value: 0.0,
            created_at_ms: clock::now_ms(),
        };
        let view = view_of(&metric);
        st.metrics.insert(id, metric);
        st.selected = Some(id);

        tracing::debug!(id, name = %view.canonical_name, "metric created");
        Created {
            view,
            event: SyncEvent::RegistryChanged,
        }
    }

    /// Rename a metric. Returns `None` when `id` is unknown.
    ///
    /// A collision with another live canonical name is resolved by suffixing
    /// the display name with `_<id>` (ids are already unique, so no probing
    /// is needed); the canonical name follows from the suffixed display
    /// name. The rare case where the id-suffixed name itself is taken falls
    /// back to counter probing so uniqueness always holds.
    pub fn rename(&self, id: MetricId, new_display_name: &str) -> Option<(MetricView, SyncEvent)> {
        let mut st = self.lock();
        if !st.metrics.contains_key(&id) {
            return None;
        }
        let taken = st.taken_names(Some(id));

        let mut display = new_display_name.to_string();
        if taken.contains(&naming::normalize(&display)) {
            display = format!("{new_display_name}_{id}");
            if taken.contains(&naming::normalize(&display)) {
                display = naming::unique_display_name(&display, &taken);
            }
        }
        let canonical = naming::normalize(&display);

        let metric = st.metrics.get_mut(&id)?;
        metric.display_name = display;
        metric.canonical_name = canonical;
        let view = view_of(metric);
        Some((view.clone(), SyncEvent::delta(&view)))
    }

    /// Set a metric's value. Accepts any f64 as given; `None` when `id` is
    /// unknown.
    pub fn set_value(&self, id: MetricId, value: f64) -> Option<(MetricView, SyncEvent)> {
        let mut st = self.lock();
        let metric = st.metrics.get_mut(&id)?;
        metric.value = value;
        let view = view_of(metric);
        Some((view.clone(), SyncEvent::delta(&view)))
    }

    /// Delete a metric, retiring its id permanently. If it was selected,
    /// selection moves to the smallest remaining live id (or unsets).
    pub fn delete(&self, id: MetricId) -> Option<SyncEvent> {
        let mut st = self.lock();
        st.metrics.remove(&id)?;
        if st.selected == Some(id) {
            st.selected = st.metrics.keys().next().copied();
        }
        tracing::debug!(id, "metric deleted");
        Some(SyncEvent::RegistryChanged)
    }

    /// Make `id` the current selection; false when it is not live.
    pub fn select(&self, id: MetricId) -> bool {
        let mut st = self.lock();
        if st.metrics.contains_key(&id) {
            st.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// Resolve the target of a mutation: the explicit id when given (and
    /// live), else the current selection.
    pub fn resolve_target(&self, explicit: Option<MetricId>) -> Option<MetricId> {
        let st = self.lock();
        match explicit {
            Some(id) if st.metrics.contains_key(&id) => Some(id),
            Some(_) => None,
            None => st.selected,
        }
    }

    /// Consistent point-in-time view of all live metrics, ascending by id.
    pub fn snapshot(&self) -> Vec<MetricView> {
        self.lock().metrics.values().map(view_of).collect()
    }

    /// Currently selected id, if any.
    pub fn selected(&self) -> Option<MetricId> {
        self.lock().selected
    }

    /// View of the currently selected metric, if any.
    pub fn selected_view(&self) -> Option<MetricView> {
        let st = self.lock();
        st.selected.and_then(|id| st.metrics.get(&id)).map(view_of)
    }

    /// Delete every metric and unset the selection. Returns the count.
    pub fn clear_all(&self) -> (usize, SyncEvent) {
        let mut st = self.lock();
        let n = st.metrics.len();
        st.metrics.clear();
        st.selected = None;
        tracing::debug!(deleted = n, "registry cleared");
        (n, SyncEvent::RegistryChanged)
    }

    pub fn len(&self) -> usize {
        self.lock().metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().metrics.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotone_and_never_reused() {
        let reg = MetricRegistry::new();
        let a = reg.create(None).view.metric_id;
        let b = reg.create(None).view.metric_id;
        let c = reg.create(None).view.metric_id;
        assert_eq!((a, b, c), (1, 2, 3));

        assert!(reg.delete(b).is_some());
        assert_eq!(reg.create(None).view.metric_id, 4);

        // deleting the max id does not roll the allocator back either
        assert!(reg.delete(4).is_some());
        assert_eq!(reg.create(None).view.metric_id, 5);
    }

    #[test]
    fn create_canonicalizes_display_names() {
        let reg = MetricRegistry::new();
        let created = reg.create(Some("My Metric!"));
        assert_eq!(created.view.display_name, "My Metric!");
        assert_eq!(created.view.canonical_name, "My_Metric");
        assert_eq!(created.view.value, 0.0);
        assert_eq!(created.event, SyncEvent::RegistryChanged);
    }

    #[test]
    fn create_without_name_synthesizes_unique_names() {
        let reg = MetricRegistry::new();
        assert_eq!(reg.create(None).view.canonical_name, "new_metric");
        assert_eq!(reg.create(Some("  ")).view.canonical_name, "new_metric_1");
        assert_eq!(reg.create(Some("")).view.canonical_name, "new_metric_2");
    }

    #[test]
    fn create_collision_probes_counter_suffixes() {
        let reg = MetricRegistry::new();
        let first = reg.create(Some("cpu usage"));
        assert_eq!(first.view.canonical_name, "cpu_usage");

        let second = reg.create(Some("cpu usage"));
        assert_eq!(second.view.metric_id, 2);
        assert_eq!(second.view.display_name, "cpu usage_1");
        assert_eq!(second.view.canonical_name, "cpu_usage_1");

        // deletion frees the name for reuse
        reg.delete(first.view.metric_id);
        let third = reg.create(Some("cpu usage"));
        assert_eq!(third.view.canonical_name, "cpu_usage");
    }

    #[test]
    fn canonical_names_stay_unique_after_every_create_and_rename() {
        let reg = MetricRegistry::new();
        for name in ["a b", "a_b", "a  b", "x", "x", "x"] {
            reg.create(Some(name));
        }
        reg.rename(4, "a b");
        reg.rename(5, "a b");

        let snap = reg.snapshot();
        let canon: HashSet<String> = snap.iter().map(|m| m.canonical_name.clone()).collect();
        assert_eq!(canon.len(), snap.len());
    }

    #[test]
    fn rename_suffixes_with_id_on_collision() {
        let reg = MetricRegistry::new();
        reg.create(Some("foo"));
        let id = reg.create(Some("bar")).view.metric_id;

        let (view, event) = reg.rename(id, "foo").unwrap();
        assert_eq!(view.display_name, format!("foo_{id}"));
        assert_eq!(view.canonical_name, format!("foo_{id}"));
        match event {
            SyncEvent::MetricSync { canonical_name, .. } => {
                assert_eq!(canonical_name, format!("foo_{id}"));
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn rename_to_own_name_is_a_plain_success() {
        let reg = MetricRegistry::new();
        let id = reg.create(Some("solo")).view.metric_id;
        let (view, _) = reg.rename(id, "solo").unwrap();
        assert_eq!(view.canonical_name, "solo");
    }

    #[test]
    fn rename_falls_back_to_probing_when_id_suffix_is_taken() {
        let reg = MetricRegistry::new();
        reg.create(Some("foo")); // id 1
        let id = reg.create(Some("other")).view.metric_id; // id 2
        reg.create(Some("foo_2")); // occupies the would-be suffix

        let (view, _) = reg.rename(id, "foo").unwrap();
        let taken: HashSet<String> = reg
            .snapshot()
            .iter()
            .filter(|m| m.metric_id != id)
            .map(|m| m.canonical_name.clone())
            .collect();
        assert!(!taken.contains(&view.canonical_name));
    }

    #[test]
    fn unknown_ids_are_benign_not_found() {
        let reg = MetricRegistry::new();
        assert!(reg.rename(99, "x").is_none());
        assert!(reg.set_value(99, 1.0).is_none());
        assert!(reg.delete(99).is_none());
        assert!(!reg.select(99));
    }

    #[test]
    fn set_value_emits_a_delta_with_the_new_value() {
        let reg = MetricRegistry::new();
        let id = reg.create(Some("latency")).view.metric_id;
        let (view, event) = reg.set_value(id, 42.5).unwrap();
        assert_eq!(view.value, 42.5);
        match event {
            SyncEvent::MetricSync {
                metric_id, value, ..
            } => {
                assert_eq!(metric_id, id);
                assert_eq!(value, 42.5);
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn delete_moves_selection_to_smallest_live_id() {
        let reg = MetricRegistry::new();
        let a = reg.create(Some("a")).view.metric_id;
        let b = reg.create(Some("b")).view.metric_id;
        let c = reg.create(Some("c")).view.metric_id;
        assert_eq!(reg.selected(), Some(c));

        reg.delete(c);
        assert_eq!(reg.selected(), Some(a));

        // deleting a non-selected metric leaves selection alone
        reg.delete(b);
        assert_eq!(reg.selected(), Some(a));

        reg.delete(a);
        assert_eq!(reg.selected(), None);
    }

    #[test]
    fn resolve_target_prefers_explicit_then_selection() {
        let reg = MetricRegistry::new();
        assert_eq!(reg.resolve_target(None), None);

        let a = reg.create(Some("a")).view.metric_id;
        let b = reg.create(Some("b")).view.metric_id;
        assert_eq!(reg.resolve_target(None), Some(b));
        assert_eq!(reg.resolve_target(Some(a)), Some(a));
        // a dead explicit id does not fall through to the selection
        assert_eq!(reg.resolve_target(Some(99)), None);
    }

    #[test]
    fn clear_all_empties_and_reports_count() {
        let reg = MetricRegistry::new();
        for _ in 0..5 {
            reg.create(None);
        }
        let (n, event) = reg.clear_all();
        assert_eq!(n, 5);
        assert_eq!(event, SyncEvent::RegistryChanged);
        assert!(reg.is_empty());
        assert_eq!(reg.resolve_target(None), None);
        assert!(reg.selected_view().is_none());

        // ids keep climbing after a full clear
        assert_eq!(reg.create(None).view.metric_id, 6);
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let reg = MetricRegistry::new();
        reg.create(Some("z"));
        reg.create(Some("a"));
        reg.create(Some("m"));
        let ids: Vec<MetricId> = reg.snapshot().iter().map(|m| m.metric_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
