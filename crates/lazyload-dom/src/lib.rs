//! Lazyload DOM - Host document model
//!
//! Arena-based document with the primitives deferred image loading needs:
//! attributes, class lists, event listeners, platform feature flags and an
//! intersection observer.

mod attributes;
mod classlist;
mod document;
mod events;
mod geometry;
mod intersection;
mod mutation;
mod node;
mod platform;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use classlist::DOMTokenList;
pub use document::{Document, SimpleSelector};
pub use events::{Event, EventListener, ListenerId, event_names};
pub use geometry::DOMRect;
pub use intersection::{
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverOptions, MarginLength,
    RootMargin, RootMarginError,
};
pub use mutation::{MutationRecord, MutationType};
pub use node::{ElementData, Node, NodeData};
pub use platform::PlatformFeatures;
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Build an id from a raw arena index
    pub const fn from_raw(index: u32) -> Self {
        NodeId(index)
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this id refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#none")
        }
    }
}
