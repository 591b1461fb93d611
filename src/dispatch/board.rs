//! Interaction board: the live interactions of every surface.
//!
//! Ids are unique for the whole session. Publishing a rendering to a
//! surface replaces that surface's interactions; appending keeps them.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::transform::{render, BoundInteraction, Rendering, TransformerTable};

#[derive(Debug, Default)]
pub struct InteractionBoard {
    next_id: usize,
    surfaces: BTreeMap<String, Vec<BoundInteraction>>,
}

impl InteractionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `value` for `surface`, replacing its interactions.
    pub fn publish(&mut self, surface: &str, value: &Value, table: &TransformerTable) -> Rendering {
        let rendering = render(value, table, self.next_id);
        self.next_id = rendering.next_interaction_id(self.next_id);
        self.surfaces
            .insert(surface.to_string(), rendering.interactions.clone());
        rendering
    }

    /// Render `value` for `surface`, keeping its current interactions.
    pub fn append(&mut self, surface: &str, value: &Value, table: &TransformerTable) -> Rendering {
        let rendering = render(value, table, self.next_id);
        self.next_id = rendering.next_interaction_id(self.next_id);
        self.surfaces
            .entry(surface.to_string())
            .or_default()
            .extend(rendering.interactions.iter().cloned());
        rendering
    }

    /// Drop a surface's interactions (its markup no longer shows them).
    pub fn clear(&mut self, surface: &str) {
        self.surfaces.remove(surface);
    }

    pub fn find(&self, id: usize) -> Option<&BoundInteraction> {
        self.surfaces.values().flatten().find(|i| i.id == id)
    }

    pub fn interactions(&self, surface: &str) -> &[BoundInteraction] {
        self.surfaces.get(surface).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transformer;
    use serde_json::json;

    fn table() -> TransformerTable {
        TransformerTable::from_entries([("${number}", Transformer::fill(&["txid"]))]).unwrap()
    }

    #[test]
    fn test_publish_replaces_append_keeps() {
        let mut board = InteractionBoard::new();
        let first = board.publish("out", &json!(["a", "b"]), &table());
        assert_eq!(first.interactions.len(), 2);
        assert!(board.find(0).is_some());

        board.publish("out", &json!(["c"]), &table());
        assert!(board.find(0).is_none());
        assert_eq!(board.interactions("out")[0].id, 2);

        board.append("out", &json!(["d"]), &table());
        let ids: Vec<_> = board.interactions("out").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3]);

        board.clear("out");
        assert!(board.interactions("out").is_empty());
    }
}
