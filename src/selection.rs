//! Duplicate-free selection of entity identities.

use std::collections::HashSet;

/// Ordered set of selected identities.
///
/// Insertion order is kept so request bodies list ids in the order the
/// operator picked them; membership goes through a hash set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Adds `id`. Returns false when it was already selected.
    pub fn select(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Removes `id`. Returns false when it was not selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    /// Selects `id` if absent, deselects it otherwise. Returns whether the
    /// id is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.deselect(id) {
            false
        } else {
            self.select(id)
        }
    }

    /// Replaces the selection with exactly the given identities.
    pub fn select_all<I, S>(&mut self, universe: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clear();
        for id in universe {
            self.select(id);
        }
    }

    /// Clears the selection when every id of `universe` is already
    /// selected, selects the whole universe otherwise.
    pub fn toggle_all<I, S>(&mut self, universe: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let universe: Vec<String> = universe.into_iter().map(Into::into).collect();
        let all_selected =
            !universe.is_empty() && universe.iter().all(|id| self.contains(id));
        if all_selected {
            self.clear();
        } else {
            self.select_all(universe);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Keeps only the ids for which `keep` returns true. Returns the ids
    /// that were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let mut dropped = Vec::new();
        self.order.retain(|id| {
            if keep(id) {
                true
            } else {
                dropped.push(id.clone());
                false
            }
        });
        for id in &dropped {
            self.members.remove(id);
        }
        dropped
    }
}
