use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::message::MessageNode;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Parent not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(Uuid),
}

/// The branching conversation store.
///
/// Every node lives in a single pool keyed by id; branch structure is carried
/// by `parent_id` / `children_ids` links. Regeneration and editing always add
/// new siblings, so prior branches stay reachable for navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageTree {
    nodes: HashMap<Uuid, MessageNode>,
    /// Top-level nodes in creation order. Roots are siblings of one another.
    roots: Vec<Uuid>,
}

impl MessageTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node` under `parent_id`, or as a new root when no parent is
    /// given. Returns the inserted node's id.
    pub fn add_child(
        &mut self,
        parent_id: Option<Uuid>,
        mut node: MessageNode,
    ) -> Result<Uuid, TreeError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::DuplicateNode(node.id));
        }

        let node_id = node.id;
        node.parent_id = parent_id;

        match parent_id {
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::ParentNotFound(parent_id))?;
                parent.children_ids.push(node_id);
            }
            None => self.roots.push(node_id),
        }

        tracing::debug!(
            node_id = %node_id,
            parent_id = ?parent_id,
            role = ?node.role,
            pool_size = self.nodes.len() + 1,
            "MessageTree: node inserted"
        );

        self.nodes.insert(node_id, node);
        Ok(node_id)
    }

    /// Walk `parent_id` links from `leaf_id` up to a root, reversed into
    /// display order.
    pub fn linear_history(&self, leaf_id: Uuid) -> Result<Vec<&MessageNode>, TreeError> {
        if !self.nodes.contains_key(&leaf_id) {
            return Err(TreeError::NodeNotFound(leaf_id));
        }

        let mut history = Vec::new();
        let mut current = Some(leaf_id);
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(node) => {
                    history.push(node);
                    current = node.parent_id;
                }
                None => break,
            }
        }
        history.reverse();
        Ok(history)
    }

    /// Siblings of `node_id`: its parent's `children_ids`, or all roots when
    /// the node is itself a root.
    pub fn siblings(&self, node_id: Uuid) -> Result<Vec<Uuid>, TreeError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(TreeError::NodeNotFound(node_id))?;

        match node.parent_id {
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get(&parent_id)
                    .ok_or(TreeError::ParentNotFound(parent_id))?;
                Ok(parent.children_ids.clone())
            }
            None => Ok(self.roots.clone()),
        }
    }

    /// Follow the last child repeatedly until a leaf is reached. Defines
    /// where a branch currently is.
    pub fn latest_leaf_from(&self, node_id: Uuid) -> Result<Uuid, TreeError> {
        let mut current = self
            .nodes
            .get(&node_id)
            .ok_or(TreeError::NodeNotFound(node_id))?;

        while let Some(last_child) = current.children_ids.last() {
            current = self
                .nodes
                .get(last_child)
                .ok_or(TreeError::NodeNotFound(*last_child))?;
        }
        Ok(current.id)
    }

    pub fn get(&self, node_id: Uuid) -> Option<&MessageNode> {
        self.nodes.get(&node_id)
    }

    pub fn get_mut(&mut self, node_id: Uuid) -> Option<&mut MessageNode> {
        self.nodes.get_mut(&node_id)
    }

    pub fn contains(&self, node_id: Uuid) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn roots(&self) -> &[Uuid] {
        &self.roots
    }

    pub fn nodes(&self) -> &HashMap<Uuid, MessageNode> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn add_child_rejects_unknown_parent() {
        let mut tree = MessageTree::new();
        let err = tree
            .add_child(Some(Uuid::new_v4()), MessageNode::user("hi"))
            .unwrap_err();
        assert!(matches!(err, TreeError::ParentNotFound(_)));
        assert!(tree.is_empty());
    }

    #[test]
    fn add_child_rejects_duplicate_id() {
        let mut tree = MessageTree::new();
        let node = MessageNode::user("hi");
        let copy = node.clone();
        tree.add_child(None, node).unwrap();
        let err = tree.add_child(None, copy).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateNode(_)));
    }

    #[test]
    fn linear_history_runs_root_to_leaf() {
        let mut tree = MessageTree::new();
        let root = tree.add_child(None, MessageNode::user("one")).unwrap();
        let mid = tree
            .add_child(Some(root), MessageNode::assistant_placeholder())
            .unwrap();
        let leaf = tree.add_child(Some(mid), MessageNode::user("two")).unwrap();

        let history = tree.linear_history(leaf).unwrap();
        let ids: Vec<Uuid> = history.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![root, mid, leaf]);
        assert_eq!(history[0].role, Role::User);
    }

    #[test]
    fn linear_history_fails_for_unknown_leaf() {
        let tree = MessageTree::new();
        assert!(matches!(
            tree.linear_history(Uuid::new_v4()),
            Err(TreeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn roots_are_siblings_of_each_other() {
        let mut tree = MessageTree::new();
        let a = tree.add_child(None, MessageNode::user("a")).unwrap();
        let b = tree.add_child(None, MessageNode::user("b")).unwrap();
        assert_eq!(tree.siblings(a).unwrap(), vec![a, b]);
        assert_eq!(tree.siblings(b).unwrap(), vec![a, b]);
    }

    #[test]
    fn latest_leaf_follows_last_children() {
        let mut tree = MessageTree::new();
        let root = tree.add_child(None, MessageNode::user("q")).unwrap();
        let first = tree
            .add_child(Some(root), MessageNode::assistant_placeholder())
            .unwrap();
        let second = tree
            .add_child(Some(root), MessageNode::assistant_placeholder())
            .unwrap();
        let tip = tree
            .add_child(Some(second), MessageNode::user("follow-up"))
            .unwrap();

        assert_eq!(tree.latest_leaf_from(root).unwrap(), tip);
        assert_eq!(tree.latest_leaf_from(first).unwrap(), first);
    }
}
