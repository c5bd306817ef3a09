//! Tree projection of the request store
//!
//! A flat sequence of project headers and request leaves with a single wrap-around
//! cursor. Leaves only carry the (method, url) identity; the request itself is looked
//! up in the live document at selection time.

use crate::models::{Request, RequestKey};
use crate::storage::{Document, ProjectGroups};

#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    /// Not selectable
    Project { label: String },
    Leaf { label: String, key: RequestKey },
}

impl TreeNode {
    pub fn label(&self) -> &str {
        match self {
            TreeNode::Project { label } | TreeNode::Leaf { label, .. } => label,
        }
    }

    pub fn key(&self) -> Option<&RequestKey> {
        match self {
            TreeNode::Project { .. } => None,
            TreeNode::Leaf { key, .. } => Some(key),
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, TreeNode::Project { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestTree {
    nodes: Vec<TreeNode>,
    cursor: Option<usize>,
}

impl RequestTree {
    pub fn build(groups: &ProjectGroups, pattern: &str) -> Self {
        let mut nodes = Vec::new();
        for (project, requests) in groups.iter() {
            nodes.push(TreeNode::Project {
                label: project.to_string(),
            });
            nodes.extend(requests.iter().map(|request| TreeNode::Leaf {
                label: request.tree_label(pattern),
                key: request.key(),
            }));
        }
        RequestTree { nodes, cursor: None }
    }

    /// Rebuild from a new projection, keeping the cursor on the same request if it survived
    pub fn rebuild(&mut self, groups: &ProjectGroups, pattern: &str) {
        let selected = self.selected_key().cloned();
        *self = Self::build(groups, pattern);
        if let Some(key) = selected {
            self.cursor = self.nodes.iter().position(|n| n.key() == Some(&key));
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected_key(&self) -> Option<&RequestKey> {
        self.cursor
            .and_then(|i| self.nodes.get(i))
            .and_then(TreeNode::key)
    }

    /// Move down, wrapping to the first node
    pub fn next(&mut self) -> Option<RequestKey> {
        if self.nodes.is_empty() {
            return None;
        }
        let index = match self.cursor {
            Some(i) if i + 1 < self.nodes.len() => i + 1,
            _ => 0,
        };
        self.select(index)
    }

    /// Move up, wrapping to the last node
    pub fn previous(&mut self) -> Option<RequestKey> {
        if self.nodes.is_empty() {
            return None;
        }
        let index = match self.cursor {
            Some(i) if i > 0 => i - 1,
            _ => self.nodes.len() - 1,
        };
        self.select(index)
    }

    /// Put the cursor on `index`; returns the identity when it is a leaf
    pub fn select(&mut self, index: usize) -> Option<RequestKey> {
        if index >= self.nodes.len() {
            return None;
        }
        self.cursor = Some(index);
        self.selected_key().cloned()
    }

    /// The selected request, looked up in the live document
    pub fn resolve<'a>(&self, document: &'a Document) -> Option<&'a Request> {
        let key = self.selected_key()?;
        match document.find(key.method.as_str(), key.url.as_str()) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::debug!(error = %e, "selected request no longer stored");
                None
            }
        }
    }
}
