#![forbid(unsafe_code)]

//! Reactive dataflow nodes with glitch-free propagation.
//!
//! This module provides the primitives of the dependency graph:
//!
//! - [`Observable`]: a graph vertex holding a current value and the observer
//!   records of everything downstream of it.
//! - [`Disposable`]: RAII handle that unregisters an observer record when it
//!   is released or dropped.
//! - [`Registry`]: token-indexed storage for observer records.
//! - [`combine`] and the boolean `and`: two-parent nodes built from
//!   [`Observable::flat_map`] and [`Observable::map`].
//!
//! # Architecture
//!
//! `Observable<A>` uses `Rc` for single-threaded shared ownership. Every
//! node's child records live in its own [`Registry`]; the propagation queue
//! only holds `Weak` references to them, so a record whose subscription was
//! released mid-round is skipped rather than fired.
//!
//! A `send` enqueues the node's child records and drains the per-thread
//! queue, always firing the record with the greatest *height* first. A
//! record's height is the height of the node it forwards into (zero for
//! terminal observers), and a node's height is one more than its tallest
//! child record. Upstream work therefore settles before anything that
//! depends on it runs.
//!
//! # Invariants
//!
//! 1. `observe` delivers the current value synchronously before returning.
//! 2. When a top-level `send` returns, the queue is empty and no drain is
//!    active.
//! 3. Within one round a record fires at most once.
//! 4. A record of height `h` never fires while a live record of greater
//!    height, enqueued in the same round, is pending.
//! 5. Heights are never cached; they are resolved from the live graph each
//!    time the queue is ordered.
//!
//! # Ownership
//!
//! A derived node keeps its sources alive (through the disposal handles it
//! retains) but a source never keeps its derived nodes alive. Dropping the
//! last handle to a derived node, or calling [`Observable::detach`], stops
//! its updates.

pub mod combinators;
pub mod disposable;
pub(crate) mod graph;
pub mod observable;
pub mod queue;
pub(crate) mod record;
pub mod registry;

pub use combinators::combine;
pub use disposable::Disposable;
pub use graph::NodeId;
pub use observable::Observable;
pub use queue::{
    PropagationStats, is_propagating, pending_len, propagation_stats, reset_propagation_stats,
};
pub use record::Dependent;
pub use registry::{Registry, Token};
