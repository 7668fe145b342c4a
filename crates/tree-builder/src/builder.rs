use std::collections::btree_map::Entry;
use std::collections::HashMap;

use drive_tree_common::DriveTreeError;
use drive_tree_domain::{CollisionPolicy, RemoteEntry, Tree, TreeNode};
use log::{debug, warn};

/// How the top level is named in collision errors and warnings.
const ROOT_LABEL: &str = "<root>";

/// Rebuilds the nested tree from the flat list produced by the fetcher.
pub struct TreeBuilder<'a> {
    root_id: &'a str,
    policy: CollisionPolicy,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(root_id: &'a str) -> Self {
        Self {
            root_id,
            policy: CollisionPolicy::default(),
        }
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn is_direct_child_of_root(&self, entry: &RemoteEntry) -> bool {
        match entry.parent_id() {
            None => true,
            Some(parent) => parent == self.root_id,
        }
    }

    /// Every entry ends up exactly once in the result, either under its first
    /// parent or at the top level. Fails only under [`CollisionPolicy::Error`].
    pub fn build(&self, entries: &[RemoteEntry]) -> Result<Tree, DriveTreeError> {
        // id -> position; a repeated id keeps its last record
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.insert(entry.id.as_str(), i);
        }

        let mut top_level = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        let mut live = vec![false; entries.len()];

        for (i, entry) in entries.iter().enumerate() {
            if index.get(entry.id.as_str()) != Some(&i) {
                debug!("Skipping superseded record for id {}", entry.id);
                continue;
            }
            live[i] = true;

            if self.is_direct_child_of_root(entry) {
                top_level.push(i);
                continue;
            }

            let parent_id = entry.parent_id().unwrap_or_default();
            match index.get(parent_id) {
                Some(&parent) => children[parent].push(i),
                None => {
                    debug!(
                        "Orphan {} ({}): parent {} not fetched, attaching at root",
                        entry.name, entry.id, parent_id
                    );
                    top_level.push(i);
                }
            }
        }

        let mut visited = vec![false; entries.len()];
        let mut tree = Tree::new();
        for i in top_level {
            let node = self.assemble(i, entries, &children, &mut visited)?;
            self.insert(&mut tree, ROOT_LABEL, node)?;
        }

        // Anything still unvisited sits on a parent cycle.
        for i in 0..entries.len() {
            if live[i] && !visited[i] {
                warn!(
                    "Entry {} ({}) is part of a parent cycle, attaching at root",
                    entries[i].name, entries[i].id
                );
                let node = self.assemble(i, entries, &children, &mut visited)?;
                self.insert(&mut tree, ROOT_LABEL, node)?;
            }
        }

        Ok(tree)
    }

    fn assemble(
        &self,
        idx: usize,
        entries: &[RemoteEntry],
        children: &[Vec<usize>],
        visited: &mut [bool],
    ) -> Result<TreeNode, DriveTreeError> {
        visited[idx] = true;
        let entry = &entries[idx];
        let mut node = TreeNode::new(entry.name.clone(), entry.link.clone());

        for &child in &children[idx] {
            if visited[child] {
                continue;
            }
            let child_node = self.assemble(child, entries, children, visited)?;
            self.insert(&mut node.children, &entry.name, child_node)?;
        }

        Ok(node)
    }

    fn insert(&self, level: &mut Tree, parent: &str, node: TreeNode) -> Result<(), DriveTreeError> {
        match level.entry(node.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
            Entry::Occupied(mut slot) => match self.policy {
                CollisionPolicy::LastWriteWins => {
                    warn!("Duplicate name {:?} under {}, keeping the later entry", node.name, parent);
                    slot.insert(node);
                }
                CollisionPolicy::Error => {
                    return Err(DriveTreeError::NameCollision {
                        parent: parent.to_string(),
                        name: node.name,
                    });
                }
            },
        }
        Ok(())
    }
}

/// Builds the tree with the last-write-wins policy, which cannot fail.
pub fn build_tree(entries: &[RemoteEntry], root_id: &str) -> Tree {
    TreeBuilder::new(root_id)
        .build(entries)
        .unwrap_or_else(|e| unreachable!("last-write-wins build failed: {e}"))
}
