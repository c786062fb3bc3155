#![forbid(unsafe_code)]

//! Glitch-free reactive dataflow runtime.
//!
//! Values enter a dependency graph through [`Observable::send`] and settle
//! through a single height-ordered propagation pass before `send` returns.
//! See [`reactive`] for the node, queue, and subscription primitives.

pub mod reactive;

pub use reactive::{
    Dependent, Disposable, NodeId, Observable, PropagationStats, Registry, Token, combine,
    is_propagating, pending_len, propagation_stats, reset_propagation_stats,
};
