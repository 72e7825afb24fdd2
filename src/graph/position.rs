use std::collections::{HashMap, HashSet};

use eframe::egui::Pos2;

/// Union of `layout` and `overrides`; the override wins for ids in both.
///
/// Ids that only exist in `overrides` are kept as well, so a node that was
/// removed and re-added before the next prune reuses its dragged position.
pub fn merge(
    layout: &HashMap<String, Pos2>,
    overrides: &HashMap<String, Pos2>,
) -> HashMap<String, Pos2> {
    let mut merged = layout.clone();
    merged.extend(overrides.iter().map(|(id, position)| (id.clone(), *position)));
    merged
}

#[derive(Clone, Debug, Default)]
pub struct PositionStore {
    overrides: HashMap<String, Pos2>,
}

impl PositionStore {
    pub fn overrides(&self) -> &HashMap<String, Pos2> {
        &self.overrides
    }

    pub fn get(&self, id: &str) -> Option<Pos2> {
        self.overrides.get(id).copied()
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.overrides.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn set_override(&mut self, id: &str, position: Pos2) {
        if let Some(existing) = self.overrides.get_mut(id) {
            *existing = position;
        } else {
            self.overrides.insert(id.to_owned(), position);
        }
    }

    pub fn clear_override(&mut self, id: &str) -> bool {
        self.overrides.remove(id).is_some()
    }

    pub fn clear_all(&mut self) {
        self.overrides.clear();
    }

    pub fn prune_overrides<'a, I>(&mut self, current_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let current = current_ids.into_iter().collect::<HashSet<_>>();
        let before = self.overrides.len();
        self.overrides.retain(|id, _| current.contains(id.as_str()));
        before - self.overrides.len()
    }

    pub fn merged(&self, layout: &HashMap<String, Pos2>) -> HashMap<String, Pos2> {
        merge(layout, &self.overrides)
    }
}
