//! Mutation records
//!
//! A flat log of tree and attribute changes, recorded by the document while
//! `observe_mutations` is on. Lets callers check the order of writes.

use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
    /// New attribute value; `None` for removals
    pub new_value: Option<String>,
    pub removed_node: Option<NodeId>,
}

impl MutationRecord {
    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>, new_value: Option<&str>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            attribute_name: Some(name.to_string()),
            old_value,
            new_value: new_value.map(str::to_string),
            removed_node: None,
        }
    }

    pub fn removal(parent: NodeId, removed: NodeId) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target: parent,
            attribute_name: None,
            old_value: None,
            new_value: None,
            removed_node: Some(removed),
        }
    }

    /// True if this record set (not removed) attribute `name`
    pub fn is_set(&self, name: &str) -> bool {
        self.attribute_name.as_deref() == Some(name) && self.new_value.is_some()
    }
}
