//! DOM Events
//!
//! Named events, listener handles and the per-node listener table used by
//! `Document::dispatch_event`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{Document, NodeId};

/// Event names produced by the host itself
pub mod event_names {
    /// Fired on an `<img>` once its current source finished loading
    pub const LOAD: &str = "load";
}

/// Callback invoked on dispatch. Receives the document mutably so handlers
/// can touch the tree that fired them.
pub type EventListener = Rc<dyn Fn(&mut Document, &Event)>;

/// Handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// DOM event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub bubbles: bool,
}

impl Event {
    /// Non-bubbling event, like `new Event(name)`
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: target,
            bubbles: false,
        }
    }

    /// Bubbling event
    pub fn bubbling(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            bubbles: true,
            ..Self::new(event_type, target)
        }
    }
}

struct Registered {
    id: ListenerId,
    event_type: String,
    callback: EventListener,
}

/// Listener table keyed by node
#[derive(Default)]
pub(crate) struct ListenerTable {
    next_id: u64,
    by_node: HashMap<NodeId, Vec<Registered>>,
}

impl ListenerTable {
    pub(crate) fn add(&mut self, node: NodeId, event_type: &str, callback: EventListener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.by_node.entry(node).or_default().push(Registered {
            id,
            event_type: event_type.to_string(),
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    /// Drop every listener registered on `node`
    pub(crate) fn clear_node(&mut self, node: NodeId) -> usize {
        self.by_node.remove(&node).map(|l| l.len()).unwrap_or(0)
    }

    /// Snapshot of matching callbacks, so dispatch never holds a borrow
    /// of the table while handlers run.
    pub(crate) fn matching(&self, node: NodeId, event_type: &str) -> Vec<EventListener> {
        self.by_node
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|r| r.event_type == event_type)
                    .map(|r| Rc::clone(&r.callback))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map(|l| l.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("nodes", &self.by_node.len())
            .finish()
    }
}
