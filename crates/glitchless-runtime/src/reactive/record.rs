#![forbid(unsafe_code)]

//! Observer records: the unit of propagation work.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::graph::{self, NodeId};
use super::observable::Observable;

/// Where a record's height comes from.
#[derive(Clone)]
pub(crate) enum HeightSource {
    /// Plain observation callback. Always height 0.
    Terminal,
    /// Forwards into a fixed node.
    Node(NodeId),
    /// Forwards into whichever node the shared slot names right now.
    Active(Rc<Cell<NodeId>>),
}

impl HeightSource {
    pub(crate) fn resolve(&self) -> usize {
        match self {
            Self::Terminal => 0,
            Self::Node(id) => graph::height_of(*id),
            Self::Active(slot) => graph::height_of(slot.get()),
        }
    }
}

impl fmt::Debug for HeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => f.write_str("Terminal"),
            Self::Node(id) => f
                .debug_tuple("Node")
                .field(id)
                .field(&graph::label_of(*id))
                .finish(),
            Self::Active(slot) => {
                let id = slot.get();
                f.debug_tuple("Active")
                    .field(&id)
                    .field(&graph::label_of(id))
                    .finish()
            }
        }
    }
}

/// The node a child record forwards into, used to order its firing.
///
/// Passed to [`Observable::add_child`]. A record forwarding into node `D`
/// takes `D`'s live height, so everything feeding `D` settles before `D`'s
/// own children run.
#[derive(Debug, Clone)]
pub struct Dependent(pub(crate) HeightSource);

impl Dependent {
    /// Forward into `node`.
    #[must_use]
    pub fn node<B>(node: &Observable<B>) -> Self {
        Self(HeightSource::Node(node.id()))
    }

    /// No dependent node: the record is a leaf and fires last.
    #[must_use]
    pub fn terminal() -> Self {
        Self(HeightSource::Terminal)
    }

    /// Forward into whichever node `slot` names at ordering time.
    pub(crate) fn tracking(slot: Rc<Cell<NodeId>>) -> Self {
        Self(HeightSource::Active(slot))
    }

    /// Current height of the dependent, resolved from the live graph.
    #[must_use]
    pub fn height(&self) -> usize {
        self.0.resolve()
    }
}

/// A registered re-run action plus its height source.
pub(crate) struct ObserverRecord {
    fire: Box<dyn Fn()>,
    dependent: Dependent,
}

impl ObserverRecord {
    pub(crate) fn new(fire: impl Fn() + 'static, dependent: Dependent) -> Self {
        Self {
            fire: Box::new(fire),
            dependent,
        }
    }

    pub(crate) fn fire(&self) {
        (self.fire)();
    }

    /// Recomputed on every call.
    pub(crate) fn height(&self) -> usize {
        self.dependent.height()
    }
}

impl fmt::Debug for ObserverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRecord")
            .field("dependent", &self.dependent)
            .finish_non_exhaustive()
    }
}
