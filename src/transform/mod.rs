//! Path-pattern response transformer.
//!
//! # Data Flow
//! ```text
//! Transformer table (static, per call family)
//!     → pattern.rs (compile dotted patterns once)
//!     → table.rs (precedence: literal > ${number} > ${label})
//!
//! Parsed JSON response
//!     → render.rs (depth-first walk, one transformer per node)
//!     → shorten.rs / interaction.rs (apply behaviour)
//!     → Rendering { markup, interactions }
//! ```
//!
//! # Design Decisions
//! - No schema knowledge: any nesting of objects and arrays renders
//! - Pure: no store or network access while rendering
//! - Derived interaction data is resolved at render time; failures to
//!   derive degrade to fewer updates, never to an error

pub mod interaction;
pub mod pattern;
pub mod render;
pub mod shorten;
pub mod table;

pub use interaction::{scalar_text, BoundInteraction, ClickAndFill, FieldUpdate, FillAction, Transformer, TxOutputFields};
pub use pattern::{PathPattern, PathSegment, PatternError};
pub use render::{render, Rendering};
pub use shorten::ShortenStyle;
pub use table::TransformerTable;
