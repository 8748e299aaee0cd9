use crate::error::ResolveError;
use crate::tags::{Action, FrameSelector, IndexSpec, Token, parse_label};

use serde::{Deserialize, Serialize};

// ===========
// SourceLayer
// ===========

/// A layer as enumerated by the host document, bottom to top.
///
/// The host exposes only what the engine needs: a unique identifier, the
/// display label (possibly carrying a bracketed tag), and a parent reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLayer {
	/// The host document's unique identifier for this layer.
	pub id: String,
	/// The display label as authored, tag included.
	pub label: String,
	/// Position of the enclosing layer in the host's own enumeration order, if nested.
	pub parent: Option<usize>,
}

impl SourceLayer {
	pub fn new(id: impl Into<String>, label: impl Into<String>, parent: Option<usize>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			parent,
		}
	}
}

// =====
// Layer
// =====

/// A layer after re-indexing and tag parsing.
///
/// The engine re-indexes the host's bottom-to-top enumeration into
/// top-to-bottom declaration order, so index 0 is the topmost layer and all
/// tag addressing uses these indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
	/// The host document's identifier, preserved so visibility changes can be applied back.
	pub id: String,
	/// The display label with the tag stripped.
	pub label: String,
	/// The parsed tokens of this layer's tag, empty for untagged layers.
	pub tokens: Vec<Token>,
	/// Engine index of the parent layer, if nested.
	pub parent: Option<usize>,
}

impl Layer {
	/// Whether this layer is tagged `s` and therefore never appears in any group.
	pub fn is_skip(&self) -> bool {
		self.tokens.contains(&Token::Action(Action::Skip))
	}

	/// Whether this layer is tagged `p` and joins every other layer's group.
	pub fn is_persistent(&self) -> bool {
		self.tokens.contains(&Token::Action(Action::Persistent))
	}

	/// Whether this layer carries a tag at all. Untagged layers keep their
	/// authored visibility when a host materializes a document variant.
	pub fn is_tagged(&self) -> bool {
		!self.tokens.is_empty()
	}

	pub fn frame_selectors(&self) -> impl Iterator<Item = &FrameSelector> {
		self.tokens.iter().filter_map(|token| match token {
			Token::Frame(selector) => Some(selector),
			_ => None,
		})
	}

	pub fn exclusions(&self) -> impl Iterator<Item = &IndexSpec> {
		self.tokens.iter().filter_map(|token| match token {
			Token::Exclude(target) => Some(target),
			_ => None,
		})
	}
}

/// Re-indexes the host's layer enumeration into engine order and parses every label.
///
/// Parent references are carried over from host positions to engine indices.
/// References that point outside the document are dropped rather than
/// followed.
pub fn index_layers(source: &[SourceLayer]) -> Result<Vec<Layer>, ResolveError> {
	let layer_count = source.len();
	source
		.iter()
		.rev()
		.map(|layer| {
			let (label, tokens) = parse_label(&layer.label)?;
			Ok(Layer {
				id: layer.id.clone(),
				label,
				tokens,
				parent: layer.parent.and_then(|position| (position < layer_count).then(|| layer_count - 1 - position)),
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indexing_reverses_host_order() {
		let source = vec![
			SourceLayer::new("bottom", "Background", None),
			SourceLayer::new("middle", "Mid", None),
			SourceLayer::new("top", "Foreground", None),
		];
		let layers = index_layers(&source).unwrap();
		assert_eq!(layers.iter().map(|layer| layer.id.as_str()).collect::<Vec<_>>(), vec!["top", "middle", "bottom"]);
	}

	#[test]
	fn parent_positions_are_remapped_to_engine_indices() {
		// Host order: the sublayer sits above its parent in the file, nested inside it.
		let source = vec![SourceLayer::new("outer", "Outer", None), SourceLayer::new("inner", "Inner", Some(0))];
		let layers = index_layers(&source).unwrap();
		assert_eq!(layers[0].id, "inner");
		assert_eq!(layers[0].parent, Some(1));
		assert_eq!(layers[1].parent, None);
	}

	#[test]
	fn action_queries_respect_tag_content() {
		let source = vec![SourceLayer::new("a", "[s,p]Both", None), SourceLayer::new("b", "Plain", None)];
		let layers = index_layers(&source).unwrap();
		assert!(layers[1].is_skip() && layers[1].is_persistent() && layers[1].is_tagged());
		assert!(!layers[0].is_tagged());
	}
}
