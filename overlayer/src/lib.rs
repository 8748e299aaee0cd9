//! # Overlayer
//! Assigns each layer of a layered vector drawing to zero or more named export
//! groups, driven by a compact tag mini-language embedded in layer labels.
//! Each export group names the ordered set of layer indices that must be
//! visible for one rendered output frame.
//!
//! The resolution pass is a pure, synchronous computation: given the host
//! document's layer list it returns the reconstructed [hierarchy](LayerTree)
//! and the resolved [groups](ExportGroup), with no I/O and no state shared
//! across invocations. Reading the source document, materializing visibility
//! variants, and invoking a renderer are host concerns.
//!
//! ## The tag language
//! A layer label may carry at most one bracketed tag, a comma-separated token
//! list. `"[0/2]Scene"` selects layers 0 through 2 for the group named
//! `Scene`; other token forms mark a layer as persistent (`p`) or skipped
//! (`s`), exclude an index (`!@0`), or attach a marker (`#name`). See
//! [tags::Token] for the full grammar.

/// The error type shared by every stage of a resolution pass.
pub mod error;
/// Reconstructs parent/child nesting from the flat layer list.
pub mod hierarchy;
/// Contains the host-facing [SourceLayer](layer::SourceLayer) input type and the engine's indexed view.
pub mod layer;
/// Index resolution and group aggregation, the externally consumed result.
pub mod resolve;
/// The tag tokenizer and token classifier.
pub mod tags;

pub use error::ResolveError;
pub use hierarchy::LayerTree;
pub use layer::{Layer, SourceLayer};
pub use resolve::{ExportGroup, Resolution, resolve_document};
