//! Deferred resolution of named references that form a cycle.
//!
//! A named object is *building* from the moment its build starts until its
//! result is bound. A reference to a building name can't be satisfied yet,
//! so the configurer is handed a [`Slot`] instead of a value. The slot is
//! filled, exactly once, when the build completes.
//!
//! The [`DependencyTracker`] does the bookkeeping:
//!
//! - per building name, the slots handed out for it and the object that
//!   holds each one (the *consumer*)
//! - per consumer, how many of its slots are still unfilled
//! - per consumer, its post-configuration, deferred until that count reaches
//!   zero
//!
//! A property whose resolved value contains slots gets a
//! [`PendingAssignment`]; it runs once the last of its slots is filled.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::PendingError;
use crate::object::{ObjectId, ObjectRef};
use crate::value::PropertyValue;

struct SlotInner {
    name: String,
    value: OnceLock<Option<ObjectRef>>,
    waiter: Mutex<Option<Arc<PendingAssignment>>>,
}

/// A fill-once placeholder for a named object still being built.
///
/// Clones share the same cell.
#[derive(Clone)]
pub struct Slot {
    inner: Arc<SlotInner>,
}

impl Slot {
    /// An unfilled slot waiting on `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                name: name.into(),
                value: OnceLock::new(),
                waiter: Mutex::new(None),
            }),
        }
    }

    /// The name this slot waits on.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Fill the slot with the build result. `None` records a failed build.
    pub fn fill(&self, object: Option<ObjectRef>) -> Result<(), PendingError> {
        self.inner
            .value
            .set(object)
            .map_err(|_| PendingError::AlreadyFilled(self.inner.name.clone()))
    }

    /// The build result. Reading before the build completes is an error.
    pub fn get(&self) -> Result<Option<ObjectRef>, PendingError> {
        self.inner
            .value
            .get()
            .cloned()
            .ok_or_else(|| PendingError::Unfilled(self.inner.name.clone()))
    }

    /// Whether the slot has been filled.
    pub fn is_filled(&self) -> bool {
        self.inner.value.get().is_some()
    }

    /// Whether two handles share the same cell.
    pub fn same_slot(&self, other: &Slot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn attach(&self, assignment: Arc<PendingAssignment>) {
        *self.inner.waiter.lock() = Some(assignment);
    }

    fn take_waiter(&self) -> Option<Arc<PendingAssignment>> {
        self.inner.waiter.lock().take()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.inner.name)
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// A resolved configuration value that may still contain unfilled slots.
#[derive(Clone, Debug)]
pub enum Resolved {
    /// Fully resolved.
    Ready(PropertyValue),
    /// Waiting on a building name.
    Deferred(Slot),
    /// A sequence with at least one deferred element.
    List(Vec<Resolved>),
    /// A mapping with at least one deferred value.
    Map(IndexMap<String, Resolved>),
}

impl Resolved {
    /// Collect a sequence, collapsing to `Ready` when nothing is deferred.
    pub fn list(items: Vec<Resolved>) -> Self {
        if items.iter().all(Resolved::is_ready) {
            Resolved::Ready(PropertyValue::List(
                items.into_iter().filter_map(Resolved::into_ready).collect(),
            ))
        } else {
            Resolved::List(items)
        }
    }

    /// Collect a mapping, collapsing to `Ready` when nothing is deferred.
    pub fn map(entries: IndexMap<String, Resolved>) -> Self {
        if entries.values().all(Resolved::is_ready) {
            Resolved::Ready(PropertyValue::Map(
                entries
                    .into_iter()
                    .filter_map(|(key, value)| value.into_ready().map(|value| (key, value)))
                    .collect(),
            ))
        } else {
            Resolved::Map(entries)
        }
    }

    /// Whether no slot is involved.
    pub fn is_ready(&self) -> bool {
        matches!(self, Resolved::Ready(_))
    }

    /// The value, if no slot is involved.
    pub fn into_ready(self) -> Option<PropertyValue> {
        match self {
            Resolved::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Every slot, in depth-first order.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        self.collect_slots(&mut slots);
        slots
    }

    fn collect_slots(&self, slots: &mut Vec<Slot>) {
        match self {
            Resolved::Ready(_) => {}
            Resolved::Deferred(slot) => slots.push(slot.clone()),
            Resolved::List(items) => items.iter().for_each(|item| item.collect_slots(slots)),
            Resolved::Map(entries) => entries.values().for_each(|value| value.collect_slots(slots)),
        }
    }

    /// Replace every slot with its filled value. A failed build becomes
    /// [`PropertyValue::Null`].
    pub fn finish(self) -> Result<PropertyValue, PendingError> {
        match self {
            Resolved::Ready(value) => Ok(value),
            Resolved::Deferred(slot) => Ok(slot.get()?.map_or(PropertyValue::Null, PropertyValue::Object)),
            Resolved::List(items) => items
                .into_iter()
                .map(Resolved::finish)
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::List),
            Resolved::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| value.finish().map(|value| (key, value)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(PropertyValue::Map),
        }
    }
}

impl From<PropertyValue> for Resolved {
    fn from(value: PropertyValue) -> Self {
        Resolved::Ready(value)
    }
}

type Completion = Box<dyn FnOnce(PropertyValue) + Send>;

/// A value waiting on one or more slots, with the action that consumes it.
pub struct PendingAssignment {
    description: String,
    value: Mutex<Option<Resolved>>,
    completion: Mutex<Option<Completion>>,
    remaining: AtomicUsize,
}

impl PendingAssignment {
    /// Attach `completion` to every slot in `value`. It runs with the
    /// finished value once the last slot is filled.
    ///
    /// Values without slots complete immediately.
    pub fn attach<F>(description: impl Into<String>, value: Resolved, completion: F)
    where
        F: FnOnce(PropertyValue) + Send + 'static,
    {
        let slots = value.slots();
        if slots.is_empty() {
            if let Some(value) = value.into_ready() {
                completion(value);
            }
            return;
        }
        let assignment = Arc::new(Self {
            description: description.into(),
            value: Mutex::new(Some(value)),
            completion: Mutex::new(Some(Box::new(completion))),
            remaining: AtomicUsize::new(slots.len()),
        });
        for slot in slots {
            slot.attach(assignment.clone());
        }
    }

    /// What this assignment writes, for diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn slot_filled(&self) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        let value = self.value.lock().take();
        let completion = self.completion.lock().take();
        let (Some(value), Some(completion)) = (value, completion) else {
            return;
        };
        match value.finish() {
            Ok(value) => completion(value),
            Err(err) => tracing::warn!(
                target: "horizon_weave_core::pending",
                assignment = %self.description,
                error = %err,
                "pending assignment could not complete"
            ),
        }
    }
}

/// An outstanding slot handed to a consumer.
#[derive(Debug, Clone)]
pub struct PendingRef {
    /// The placeholder.
    pub slot: Slot,
    /// The object that holds it.
    pub consumer: ObjectId,
}

impl PendingRef {
    /// Fill the slot and run its waiting assignment, if that was the last
    /// slot the assignment needed.
    pub fn complete(&self, object: Option<ObjectRef>) {
        if let Err(err) = self.slot.fill(object) {
            tracing::warn!(target: "horizon_weave_core::pending", error = %err, "slot filled twice");
            return;
        }
        if let Some(assignment) = self.slot.take_waiter() {
            assignment.slot_filled();
        }
    }
}

/// A post-configuration step waiting for a consumer's slots.
#[derive(Clone)]
pub struct DeferredConfiguration {
    /// The configured object.
    pub object: ObjectRef,
    /// Key path of its definition.
    pub identifier: String,
}

impl fmt::Debug for DeferredConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredConfiguration")
            .field("object", &self.object.type_name())
            .field("identifier", &self.identifier)
            .finish()
    }
}

/// Bookkeeping for names mid-build and the consumers waiting on them.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    pending_names: HashMap<String, Vec<PendingRef>>,
    ref_counts: HashMap<ObjectId, usize>,
    deferred: HashMap<ObjectId, DeferredConfiguration>,
    // Alias names waiting on the building name they refer to.
    aliases: HashMap<String, Vec<String>>,
    // Build order of the names currently building, for diagnostics.
    building: Vec<String>,
}

impl DependencyTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as building. Returns `false` if it already is.
    pub fn begin(&mut self, name: &str) -> bool {
        if self.pending_names.contains_key(name) {
            return false;
        }
        self.pending_names.insert(name.to_owned(), Vec::new());
        self.building.push(name.to_owned());
        tracing::trace!(target: "horizon_weave_core::pending", name, "name building");
        true
    }

    /// Whether `name` is building.
    pub fn is_building(&self, name: &str) -> bool {
        self.pending_names.contains_key(name)
    }

    /// Names currently building, outermost first.
    pub fn building_names(&self) -> &[String] {
        &self.building
    }

    /// Hand `consumer` a slot for the building `name`. `None` if `name`
    /// isn't building.
    pub fn defer(&mut self, name: &str, consumer: ObjectId) -> Option<Slot> {
        let pending = self.pending_names.get_mut(name)?;
        let slot = Slot::new(name);
        pending.push(PendingRef {
            slot: slot.clone(),
            consumer,
        });
        let count = self.ref_counts.entry(consumer).or_insert(0);
        *count += 1;
        tracing::debug!(
            target: "horizon_weave_core::pending",
            name,
            ?consumer,
            outstanding = *count,
            "deferred reference to building name"
        );
        Some(slot)
    }

    /// Whether `consumer` holds unfilled slots.
    pub fn has_pending_refs(&self, consumer: ObjectId) -> bool {
        self.ref_counts.get(&consumer).is_some_and(|count| *count > 0)
    }

    /// Unfilled slots held by `consumer`.
    pub fn pending_ref_count(&self, consumer: ObjectId) -> usize {
        self.ref_counts.get(&consumer).copied().unwrap_or(0)
    }

    /// Record `consumer`'s post-configuration, to run once its slots fill.
    pub fn defer_configuration(&mut self, consumer: ObjectId, configuration: DeferredConfiguration) {
        self.deferred.insert(consumer, configuration);
    }

    /// Keep the building `alias` open until `target` finishes building.
    pub fn defer_alias(&mut self, target: &str, alias: &str) {
        tracing::debug!(target: "horizon_weave_core::pending", target_name = target, alias, "alias waits for building name");
        self.aliases.entry(target.to_owned()).or_default().push(alias.to_owned());
    }

    /// The aliases waiting on `target`, in the order they were deferred.
    pub fn take_aliases(&mut self, target: &str) -> Vec<String> {
        self.aliases.remove(target).unwrap_or_default()
    }

    /// Mark `name` as no longer building and return the slots handed out
    /// for it.
    pub fn finish(&mut self, name: &str) -> Vec<PendingRef> {
        self.building.retain(|building| building != name);
        self.pending_names.remove(name).unwrap_or_default()
    }

    /// One of `consumer`'s slots was filled. Returns its deferred
    /// post-configuration when that was the last one.
    pub fn release(&mut self, consumer: ObjectId) -> Option<DeferredConfiguration> {
        let count = self.ref_counts.get_mut(&consumer)?;
        *count = count.saturating_sub(1);
        if *count > 0 {
            return None;
        }
        self.ref_counts.remove(&consumer);
        self.deferred.remove(&consumer)
    }
}
