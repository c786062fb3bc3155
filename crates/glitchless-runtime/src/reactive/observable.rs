#![forbid(unsafe_code)]

//! Observable nodes of the dependency graph.
//!
//! # Design
//!
//! [`Observable<A>`] is a cheap handle over shared, reference-counted node
//! state. Cloning a handle never clones the value. Each node holds:
//!
//! - its current value, replaced only by [`send`](Observable::send);
//! - a [`Registry`] of child observer records, one per downstream consumer;
//! - a set of retained objects (the disposal handles and re-subscription
//!   slot of a derived node), dropped together with the node.
//!
//! Forwarding closures reach their source and target through `Weak`
//! references. The only strong edges point upstream: a derived node retains
//! the [`Disposable`] for its registration on its source, and that handle
//! keeps the source alive.
//!
//! # Failure Modes
//!
//! - **Derived node dropped**: its registration on the source is released
//!   and a pending record for it is skipped.
//! - **Handle released early**: a [`Disposable`] from
//!   [`add_child`](Observable::add_child) dropped too soon silently stops
//!   propagation into the dependent.
//! - **Re-entrant mutation**: calling `send` on a node from inside a
//!   callback that is currently reading that same node's value panics with a
//!   `RefCell` borrow error.
//! - **Shared downstream paths**: heights are never cached. Every ordering
//!   pass re-walks each path below a record, so a node reachable along many
//!   paths (a ladder of diamonds) is visited once per path. Sorting cost
//!   grows exponentially with the number of stacked diamonds.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::disposable::Disposable;
use super::graph::{self, GraphNode, NodeId};
use super::queue;
use super::record::{Dependent, ObserverRecord};
use super::registry::{Registry, Token};

const DEFAULT_LABEL: &str = "Observable";

/// Shared interior for [`Observable<A>`].
struct NodeInner<A> {
    id: NodeId,
    label: RefCell<String>,
    value: RefCell<A>,
    children: RefCell<Registry<Rc<ObserverRecord>>>,
    /// Keeps derived-node machinery alive. Never read, only dropped.
    retained: RefCell<Vec<Box<dyn Any>>>,
}

impl<A> NodeInner<A> {
    /// Snapshot of the child records, taken so no registry borrow is held
    /// while they are ordered or fired.
    fn child_records(&self) -> Vec<Rc<ObserverRecord>> {
        self.children.borrow().values().cloned().collect()
    }

    fn remove_child(&self, token: Token) -> bool {
        // The removed record drops after the borrow ends; its closure may
        // own nodes whose teardown touches this registry.
        let removed = self.children.borrow_mut().remove(token);
        removed.is_some()
    }
}

impl<A> GraphNode for NodeInner<A> {
    fn height(&self) -> usize {
        self.child_records()
            .iter()
            .map(|record| record.height())
            .max()
            .map_or(1, |tallest| tallest + 1)
    }

    fn label(&self) -> String {
        self.label.borrow().clone()
    }
}

impl<A> Drop for NodeInner<A> {
    fn drop(&mut self) {
        graph::unregister(self.id);
    }
}

/// A node of the reactive graph.
///
/// Cloning an `Observable` creates a new handle to the **same** node.
///
/// # Invariants
///
/// 1. `height()` is `1 + max(child record heights)`, or `1` with no
///    children, recomputed on every call.
/// 2. `observe` invokes its callback once before returning.
/// 3. When a top-level `send` returns, every node reachable from this one
///    holds the value its defining function produces from the new input.
pub struct Observable<A> {
    inner: Rc<NodeInner<A>>,
}

impl<A> Clone for Observable<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Observable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.inner.id)
            .field("label", &*self.inner.label.borrow())
            .field("value", &*self.inner.value.borrow())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl<A> Observable<A> {
    /// Stable identifier of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Debug label, used only for diagnostics.
    #[must_use]
    pub fn debug_label(&self) -> String {
        self.inner.label.borrow().clone()
    }

    /// Replace the debug label.
    pub fn set_debug_label(&self, label: impl Into<String>) {
        *self.inner.label.borrow_mut() = label.into();
    }

    /// Current height: `1 + max(child record heights)`, or `1`.
    #[must_use]
    pub fn height(&self) -> usize {
        self.inner.height()
    }

    /// Number of child records registered on this node.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls [`send`](Self::send) on this node.
    pub fn with<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Remove a terminal observer registered with [`observe`](Self::observe).
    ///
    /// Returns `false` if the token was not registered.
    pub fn stop_observing(&self, token: Token) -> bool {
        self.inner.remove_child(token)
    }

    /// Release every subscription this node retains on its sources.
    ///
    /// The node keeps its last value and no longer updates.
    pub fn detach(&self) {
        let retained = std::mem::take(&mut *self.inner.retained.borrow_mut());
        drop(retained);
    }

    /// Keep `item` alive exactly as long as this node.
    fn retain(&self, item: impl Any) {
        self.inner.retained.borrow_mut().push(Box::new(item));
    }
}

impl<A: Clone> Observable<A> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> A {
        self.inner.value.borrow().clone()
    }
}

impl<A: 'static> Observable<A> {
    /// Create a root node with the default label.
    #[must_use]
    pub fn new(value: A) -> Self {
        Self::labeled(value, DEFAULT_LABEL)
    }

    /// Create a root node with a debug label.
    #[must_use]
    pub fn labeled(value: A, label: impl Into<String>) -> Self {
        let inner = Rc::new(NodeInner {
            id: graph::next_node_id(),
            label: RefCell::new(label.into()),
            value: RefCell::new(value),
            children: RefCell::new(Registry::new()),
            retained: RefCell::new(Vec::new()),
        });
        let node: Weak<NodeInner<A>> = Rc::downgrade(&inner);
        graph::register(inner.id, node);
        Self { inner }
    }

    /// Store `value` and propagate it through the graph.
    ///
    /// Called from outside a propagation round, this drains the queue before
    /// returning. Called from inside one (from a derived node's forwarding
    /// record or an observer), it only enqueues; the running round picks the
    /// work up.
    ///
    /// # Panics
    ///
    /// Panics if this node's value is currently borrowed, e.g. from inside
    /// [`with`](Self::with) on the same node.
    pub fn send(&self, value: A) {
        let previous = self.inner.value.replace(value);
        let records = self.inner.child_records();
        tracing::trace!(
            message = "observable.send",
            node = %self.inner.id,
            children = records.len()
        );
        queue::enqueue(&records);
        // The queue holds records weakly; a handle released mid-round must
        // be able to expire its pending record.
        drop(records);
        queue::drain();
        drop(previous);
    }

    /// Call `callback` with the current value now and after every update.
    ///
    /// The registration lives as long as the node; the returned token can
    /// remove it with [`stop_observing`](Self::stop_observing).
    pub fn observe(&self, callback: impl Fn(&A) + 'static) -> Token {
        callback(&self.inner.value.borrow());
        let node = Rc::downgrade(&self.inner);
        let record = ObserverRecord::new(
            move || {
                if let Some(node) = node.upgrade() {
                    callback(&node.value.borrow());
                }
            },
            Dependent::terminal(),
        );
        self.inner.children.borrow_mut().add(Rc::new(record))
    }

    /// Like [`observe`](Self::observe), but the registration ends when the
    /// returned handle is released.
    pub fn observe_scoped(&self, callback: impl Fn(&A) + 'static) -> Disposable {
        let token = self.observe(callback);
        let node = Rc::clone(&self.inner);
        Disposable::new(move || {
            node.remove_child(token);
        })
    }

    /// Run `fire` once now, then register it to run whenever this node
    /// changes.
    ///
    /// The record is ordered by the live height of `dependent`. Releasing
    /// the returned handle unregisters it.
    pub fn add_child(&self, fire: impl Fn() + 'static, dependent: Dependent) -> Disposable {
        fire();
        self.attach(fire, dependent)
    }

    /// Register `fire` without running it.
    fn attach(&self, fire: impl Fn() + 'static, dependent: Dependent) -> Disposable {
        let token = self
            .inner
            .children
            .borrow_mut()
            .add(Rc::new(ObserverRecord::new(fire, dependent)));
        let node = Rc::clone(&self.inner);
        Disposable::new(move || {
            node.remove_child(token);
        })
    }

    /// Derive a node holding `f` applied to this node's value.
    ///
    /// The derived node stays subscribed exactly as long as it is alive (or
    /// until [`detach`](Self::detach)).
    pub fn map<B: 'static>(&self, f: impl Fn(&A) -> B + 'static) -> Observable<B> {
        let derived = Observable::new(self.with(&f));
        let source = Rc::downgrade(&self.inner);
        let target = Rc::downgrade(&derived.inner);
        let subscription = self.add_child(
            move || {
                let (Some(source), Some(target)) = (source.upgrade(), target.upgrade()) else {
                    return;
                };
                let next = f(&source.value.borrow());
                Observable { inner: target }.send(next);
            },
            Dependent::node(&derived),
        );
        derived.retain(subscription);
        derived
    }

    /// Derive a node that mirrors whichever node `f` selects from this
    /// node's value.
    ///
    /// Each time this node changes, the subscription to the previously
    /// selected node is released before `f` runs again, so updates to a
    /// node that is no longer selected never reach the derived node. The
    /// registration on this node is ordered by the height of the currently
    /// selected node. `f` runs once at construction.
    pub fn flat_map<B: Clone + 'static>(
        &self,
        f: impl Fn(&A) -> Observable<B> + 'static,
    ) -> Observable<B> {
        let selected = self.with(&f);
        let derived = Observable::new(selected.get());
        let active = Rc::new(Cell::new(selected.id()));
        let slot = Rc::new(RefCell::new(Selection {
            subscription: mirror_into(&selected, &derived),
            node: selected,
        }));

        let source = Rc::downgrade(&self.inner);
        let target = Rc::downgrade(&derived.inner);
        let weak_slot = Rc::downgrade(&slot);
        let active_for_fire = Rc::clone(&active);
        let outer = self.attach(
            move || {
                let (Some(source), Some(target), Some(slot)) =
                    (source.upgrade(), target.upgrade(), weak_slot.upgrade())
                else {
                    return;
                };
                let derived = Observable { inner: target };

                let stale =
                    std::mem::replace(&mut slot.borrow_mut().subscription, Disposable::empty());
                drop(stale);

                let next = f(&source.value.borrow());
                tracing::trace!(
                    message = "flat_map.resubscribe",
                    source = %source.id,
                    label = %source.label.borrow(),
                    selected = %next.id()
                );
                active_for_fire.set(next.id());
                let subscription = mirror_into(&next, &derived);
                let previous = {
                    let mut slot = slot.borrow_mut();
                    slot.subscription = subscription;
                    std::mem::replace(&mut slot.node, next)
                };
                drop(previous);
            },
            Dependent::tracking(active),
        );
        derived.retain(outer);
        derived.retain(slot);
        derived
    }
}

/// The node a `flat_map` currently mirrors, and its subscription.
struct Selection<B> {
    node: Observable<B>,
    subscription: Disposable,
}

/// Forward every value of `source` into `target`.
fn mirror_into<B: Clone + 'static>(source: &Observable<B>, target: &Observable<B>) -> Disposable {
    let from = Rc::downgrade(&source.inner);
    let to = Rc::downgrade(&target.inner);
    source.add_child(
        move || {
            let (Some(from), Some(to)) = (from.upgrade(), to.upgrade()) else {
                return;
            };
            let value = from.value.borrow().clone();
            Observable { inner: to }.send(value);
        },
        Dependent::node(target),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
