//! Document - High-level document API
//!
//! Wraps the tree with the element primitives used by page scripts:
//! attribute access, class lists, simple queries and event dispatch.

use std::rc::Rc;

use crate::events::ListenerTable;
use crate::{
    DOMTokenList, DomTree, Event, ListenerId, MutationRecord, NodeId, PlatformFeatures,
};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
    Universal,
}

impl SimpleSelector {
    /// Parse a simple selector string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if s == "*" {
            Some(Self::Universal)
        } else if let Some(id) = s.strip_prefix('#') {
            Some(Self::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            Some(Self::Class(class.to_string()))
        } else {
            Some(Self::Tag(s.to_ascii_lowercase()))
        }
    }
}

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    url: String,
    features: PlatformFeatures,
    listeners: ListenerTable,
    body_element: NodeId,
    record_mutations: bool,
    mutation_records: Vec<MutationRecord>,
}

impl Document {
    /// Create a document with `<html><head></head><body></body></html>`
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let html = doc.tree.create_element("html");
        let head = doc.tree.create_element("head");
        let body = doc.tree.create_element("body");

        doc.tree.append_child(NodeId::ROOT, html);
        doc.tree.append_child(html, head);
        doc.tree.append_child(html, body);
        doc.body_element = body;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            features: PlatformFeatures::default(),
            listeners: ListenerTable::default(),
            body_element: NodeId::NONE,
            record_mutations: false,
            mutation_records: Vec::new(),
        }
    }

    /// Replace the host feature flags
    pub fn with_features(mut self, features: PlatformFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn features(&self) -> PlatformFeatures {
        self.features
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <body> element, if any
    pub fn body(&self) -> Option<NodeId> {
        Some(self.body_element).filter(|b| b.is_valid())
    }

    /// Locate `<body>` after the tree was built externally
    pub fn finalize(&mut self) {
        self.body_element = self
            .tree
            .descendants(NodeId::ROOT)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some("body"))
            .unwrap_or(NodeId::NONE);
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(tag_name)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.tree.append_child(parent, child);
    }

    /// Detach a node and drop the listeners of its whole subtree
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let Some(parent) = self.tree.parent(node) else {
            return 0;
        };
        self.tree.detach(node);

        let mut dropped = self.listeners.clear_node(node);
        for id in self.tree.descendants(node) {
            dropped += self.listeners.clear_node(id);
        }
        if self.record_mutations {
            self.mutation_records.push(MutationRecord::removal(parent, node));
        }
        tracing::trace!("Removed {} ({} listeners dropped)", node, dropped);
        dropped
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.tree
            .get(node)?
            .as_element()
            .map(|e| e.tag_name.as_str())
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.get(node)?.as_element()?.get_attr(name)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    /// Set an attribute. Returns false if `node` is not an element.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        let Some(elem) = self.tree.get_mut(node).and_then(|n| n.as_element_mut()) else {
            return false;
        };
        let old = elem.attrs.set_attribute(name, value).map(|a| a.value);
        if self.record_mutations {
            self.mutation_records
                .push(MutationRecord::attribute(node, name, old, Some(value)));
        }
        true
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        let elem = self.tree.get_mut(node)?.as_element_mut()?;
        let old = elem.attrs.remove_named_item(name)?.value;
        if self.record_mutations {
            self.mutation_records
                .push(MutationRecord::attribute(node, name, Some(old.clone()), None));
        }
        Some(old)
    }

    pub fn class_list(&self, node: NodeId) -> DOMTokenList {
        self.tree
            .get(node)
            .and_then(|n| n.as_element())
            .map(|e| e.class_list())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).contains(class)
    }

    /// `classList.add`
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let mut list = self.class_list(node);
        if list.contains(class) {
            return;
        }
        list.add(&[class]);
        self.set_attribute(node, "class", &list.value());
    }

    /// `classList.remove`
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let mut list = self.class_list(node);
        if !list.contains(class) {
            return;
        }
        list.remove(&[class]);
        self.set_attribute(node, "class", &list.value());
    }

    fn matches(&self, node: NodeId, selector: &SimpleSelector) -> bool {
        let Some(elem) = self.tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        match selector {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => elem.is(tag),
            SimpleSelector::Id(id) => elem.get_attr("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => elem.class_list().contains(class),
        }
    }

    /// Descendant elements of `root` matching a simple selector, in tree order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = SimpleSelector::parse(selector) else {
            return Vec::new();
        };
        self.tree
            .descendants(root)
            .into_iter()
            .filter(|&id| self.matches(id, &selector))
            .collect()
    }

    pub fn get_elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        let selector = SimpleSelector::Class(class.to_string());
        self.tree
            .descendants(root)
            .into_iter()
            .filter(|&id| self.matches(id, &selector))
            .collect()
    }

    /// `addEventListener`
    pub fn add_event_listener<F>(&mut self, node: NodeId, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&mut Document, &Event) + 'static,
    {
        self.listeners.add(node, event_type, Rc::new(listener))
    }

    /// `removeEventListener`
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        self.listeners.remove(node, id)
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.count(node)
    }

    /// Dispatch synchronously; returns how many listeners ran.
    ///
    /// Bubbling events visit the ancestors after the target. Listeners see
    /// the document in whatever state earlier listeners left it.
    pub fn dispatch_event(&mut self, event: Event) -> usize {
        let mut path = vec![event.target];
        if event.bubbles {
            let mut current = event.target;
            while let Some(parent) = self.tree.parent(current) {
                path.push(parent);
                current = parent;
            }
        }

        let mut invoked = 0;
        for node in path {
            let callbacks = self.listeners.matching(node, &event.event_type);
            if callbacks.is_empty() {
                continue;
            }
            let current = Event {
                current_target: node,
                ..event.clone()
            };
            for callback in callbacks {
                callback(self, &current);
                invoked += 1;
            }
        }

        tracing::trace!(
            "Dispatched {:?} on {} ({} listeners)",
            event.event_type,
            event.target,
            invoked
        );
        invoked
    }

    /// Start or stop recording mutation records
    pub fn observe_mutations(&mut self, enabled: bool) {
        self.record_mutations = enabled;
    }

    pub fn take_mutation_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutation_records)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
