//! JSON to markup rendering.
//!
//! Depth-first walk of a response. Objects and arrays become nested tables,
//! scalars become text after their transformer is applied, and every
//! click-and-fill scalar becomes a button carrying a `data-interaction` id.
//!
//! Rendering is pure: the same value and table always produce the same
//! bytes and the same interactions.

use maud::{html, Markup};
use serde_json::Value;

use crate::transform::interaction::{scalar_text, BoundInteraction, Transformer};
use crate::transform::pattern::PathSegment;
use crate::transform::table::TransformerTable;

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub markup: String,
    pub interactions: Vec<BoundInteraction>,
}

impl Rendering {
    /// Id the next render pass should start numbering from.
    pub fn next_interaction_id(&self, first_id: usize) -> usize {
        self.interactions.last().map(|i| i.id + 1).unwrap_or(first_id)
    }
}

/// Render `value` against `table`, numbering interactions from `first_id`.
pub fn render(value: &Value, table: &TransformerTable, first_id: usize) -> Rendering {
    let mut walker = Walker {
        table,
        root: value,
        next_id: first_id,
        interactions: Vec::new(),
    };
    let mut path = Vec::new();
    let markup = walker.node(value, &mut path);
    Rendering {
        markup: markup.into_string(),
        interactions: walker.interactions,
    }
}

struct Walker<'a> {
    table: &'a TransformerTable,
    root: &'a Value,
    next_id: usize,
    interactions: Vec<BoundInteraction>,
}

impl<'a> Walker<'a> {
    fn node(&mut self, value: &Value, path: &mut Vec<PathSegment>) -> Markup {
        match value {
            Value::Object(map) => {
                let mut rows = Vec::with_capacity(map.len());
                for (key, child) in map {
                    path.push(PathSegment::Key(key.clone()));
                    rows.push((key.as_str(), self.node(child, path)));
                    path.pop();
                }
                html! {
                    table.json-object {
                        @for (key, cell) in &rows {
                            tr { td.json-key { (key) } td { (cell) } }
                        }
                    }
                }
            }
            Value::Array(items) => {
                let mut rows = Vec::with_capacity(items.len());
                for (index, child) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    rows.push((index, self.node(child, path)));
                    path.pop();
                }
                html! {
                    table.json-array {
                        @for (index, cell) in &rows {
                            tr { td.json-index { (index) } td { (cell) } }
                        }
                    }
                }
            }
            scalar => self.leaf(scalar, path),
        }
    }

    fn leaf(&mut self, value: &Value, path: &[PathSegment]) -> Markup {
        let text = scalar_text(value);
        let table = self.table;
        match table.resolve(path) {
            Transformer::PassThrough => html! { (text) },
            Transformer::Shorten(style) => html! {
                span.shortened title=(text) { (style.apply(&text)) }
            },
            Transformer::ClickAndFill(click) => {
                let id = self.next_id;
                self.next_id += 1;
                let display = click
                    .shorten
                    .map(|style| style.apply(&text))
                    .unwrap_or_else(|| text.clone());
                self.interactions.push(BoundInteraction {
                    id,
                    path: path.to_vec(),
                    value: value.clone(),
                    updates: click.fill.updates(value, path, self.root),
                    trigger: click.trigger.clone(),
                    tooltip: click.tooltip.clone(),
                });
                html! {
                    button.bound type="button" data-interaction=(id) data-value=(text) title=[click.tooltip.as_deref()] {
                        (display)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CallRef;
    use crate::transform::interaction::FieldUpdate;
    use crate::transform::shorten::ShortenStyle;
    use serde_json::json;

    const LONG: &str = "00000a2b0c3c1b7a4e3c2e8f4c1d5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f";

    #[test]
    fn test_scalar_root_uses_single_entry() {
        let table = TransformerTable::from_entries([("singleEntry", Transformer::fill(&["blockHash"]))]).unwrap();
        let rendering = render(&json!(LONG), &table, 0);
        assert_eq!(rendering.interactions.len(), 1);
        assert_eq!(rendering.interactions[0].value, json!(LONG));
        assert!(rendering.markup.contains("00000a...0d1e2f"));
        assert!(rendering.markup.contains(&format!("data-value=\"{LONG}\"")));
    }

    #[test]
    fn test_path_precedence() {
        let table = TransformerTable::from_entries([
            ("a.b", Transformer::Shorten(ShortenStyle::Extreme)),
            ("a.${label}", Transformer::fill(&["fieldC"])),
        ])
        .unwrap();
        let rendering = render(&json!({ "a": { "b": "1234567890", "c": 2 } }), &table, 0);

        assert!(rendering.markup.contains("1234..."));
        assert_eq!(rendering.interactions.len(), 1);
        assert_eq!(rendering.interactions[0].path_string(), "a.c");
    }

    #[test]
    fn test_numeric_wildcard_applies_to_every_element() {
        let table = TransformerTable::from_entries([("tx.${number}", Transformer::fill(&["txid"]))]).unwrap();
        let rendering = render(&json!({ "tx": [1, 2, 3] }), &table, 10);

        let ids: Vec<_> = rendering.interactions.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(rendering.next_interaction_id(10), 13);
        assert_eq!(
            rendering.interactions[2].updates,
            vec![FieldUpdate::Set { field: "txid".into(), value: "3".into() }]
        );
    }

    #[test]
    fn test_deterministic() {
        let table = TransformerTable::from_entries([
            ("vin.${number}.txid", Transformer::fill_and_run("txid", CallRef::new("fabcoin", "getTransactionById"), "fetch")),
            ("hex", Transformer::Shorten(ShortenStyle::Standard)),
        ])
        .unwrap();
        let value = json!({
            "hex": LONG,
            "vin": [{ "txid": LONG, "vout": 0 }, { "coinbase": "03a1" }],
            "locktime": 0,
            "nested": { "empty": [], "none": null, "flag": true }
        });
        let first = render(&value, &table, 0);
        let second = render(&value, &table, 0);
        assert_eq!(first, second);
        assert_eq!(first.interactions[0].trigger, Some(CallRef::new("fabcoin", "getTransactionById")));
    }

    #[test]
    fn test_text_is_escaped() {
        let rendering = render(&json!({ "<k>": "<script>" }), &TransformerTable::new(), 0);
        assert!(rendering.markup.contains("&lt;script&gt;"));
        assert!(rendering.markup.contains("&lt;k&gt;"));
        assert!(!rendering.markup.contains("<script>"));
    }

    #[test]
    fn test_pass_through_scalars() {
        let rendering = render(&json!([null, true, 1.5]), &TransformerTable::new(), 0);
        assert!(rendering.markup.contains("null"));
        assert!(rendering.markup.contains("true"));
        assert!(rendering.markup.contains("1.5"));
        assert!(rendering.interactions.is_empty());
    }
}
