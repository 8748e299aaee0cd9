use crate::error::ResolveError;
use crate::hierarchy::LayerTree;
use crate::layer::{Layer, SourceLayer, index_layers};
use crate::tags::{FrameSelector, IndexSpec, Token};

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

// ===========
// ExportGroup
// ===========

/// A named, resolved set of layer indices to render together as one output frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportGroup {
	/// Derived from the owning layer's tag-stripped label, suffixed `_0`, `_1` and so on
	/// when that label collides with an earlier group's.
	pub name: String,
	/// Engine indices to set visible, deduplicated and sorted ascending.
	pub indices: Vec<usize>,
}

// ==========
// Resolution
// ==========

/// The complete result of one resolution pass over a document's layers.
///
/// Built fresh each run and handed to the rendering collaborator; nothing is
/// retained between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
	/// Every layer in engine order (index 0 = topmost).
	pub layers: Vec<Layer>,
	pub hierarchy: LayerTree,
	/// Export groups in the declaration order of their owning layers.
	pub groups: Vec<ExportGroup>,
}

/// Resolves a host document's layer list into hierarchy and export groups.
///
/// This is the whole engine: pure, synchronous, and deterministic. Any error
/// aborts the pass for the whole document; there is no partial group set.
pub fn resolve_document(source: &[SourceLayer]) -> Result<Resolution, ResolveError> {
	let layers = index_layers(source)?;
	let hierarchy = LayerTree::build(&layers)?;
	let groups = aggregate_groups(&layers)?;
	log::debug!("resolved {} export groups across {} layers", groups.len(), layers.len());
	Ok(Resolution { layers, hierarchy, groups })
}

/// Resolves one index spec against the owning layer's position. The result may
/// be out of bounds; callers check it against the document.
fn resolve_spec(spec: IndexSpec, owner: usize) -> i64 {
	match spec {
		IndexSpec::Relative(offset) => owner as i64 + offset,
		IndexSpec::Absolute(index) => index,
	}
}

fn aggregate_groups(layers: &[Layer]) -> Result<Vec<ExportGroup>, ResolveError> {
	// Selection by marker is recognized by the classifier but deliberately
	// never resolved; its presence anywhere fails the pass.
	for layer in layers {
		if let Some(token) = layer.tokens.iter().find(|token| matches!(token, Token::Select(_))) {
			return Err(ResolveError::SelectionUnsupported {
				label: layer.label.clone(),
				token: token.to_string(),
			});
		}
	}

	let persistent: Vec<usize> = layers
		.iter()
		.enumerate()
		.filter(|(_, layer)| layer.is_persistent() && !layer.is_skip())
		.map(|(index, _)| index)
		.collect();
	let skipped: Vec<usize> = layers.iter().enumerate().filter(|(_, layer)| layer.is_skip()).map(|(index, _)| index).collect();

	let mut used_names = HashSet::new();
	let mut groups = Vec::new();

	for (owner, layer) in layers.iter().enumerate() {
		// A skip layer forms no group of its own; its selectors are never resolved.
		if layer.is_skip() {
			continue;
		}
		if layer.frame_selectors().next().is_none() {
			continue;
		}

		let mut indices = BTreeSet::new();
		for selector in layer.frame_selectors() {
			union_selector(&mut indices, selector, owner, layers)?;
		}
		// A skip-tagged index never survives, even when a range swept it in.
		for index in &skipped {
			indices.remove(index);
		}
		for &index in &persistent {
			if index != owner {
				indices.insert(index);
			}
		}
		for &target in layer.exclusions() {
			let resolved = checked_index(target, owner, layers, &Token::Exclude(target))?;
			indices.remove(&resolved);
		}

		if indices.is_empty() {
			continue;
		}
		let name = disambiguate(&mut used_names, &layer.label);
		log::debug!("group {:?} <- layer {owner} with {} indices", name, indices.len());
		groups.push(ExportGroup {
			name,
			indices: indices.into_iter().collect(),
		});
	}

	Ok(groups)
}

/// Adds every index selected by one frame token to the accumulating set.
fn union_selector(indices: &mut BTreeSet<usize>, selector: &FrameSelector, owner: usize, layers: &[Layer]) -> Result<(), ResolveError> {
	let token = Token::Frame(*selector);
	match *selector {
		FrameSelector::Single(spec) => {
			indices.insert(checked_index(spec, owner, layers, &token)?);
		}
		FrameSelector::Range(start, end) => {
			// An omitted bound stands for the document edge; both are absolute.
			let start = start.unwrap_or(IndexSpec::Absolute(0));
			let end = end.unwrap_or(IndexSpec::Absolute(layers.len() as i64 - 1));
			let start = checked_index(start, owner, layers, &token)?;
			let end = checked_index(end, owner, layers, &token)?;
			// Inclusive of both ends once order-normalized, so `3/-2` and `-2/3` agree.
			indices.extend(start.min(end)..=start.max(end));
		}
	}
	Ok(())
}

/// Resolves one index spec and checks it against the document bounds.
/// Negative absolute indices count from the end before the check.
fn checked_index(spec: IndexSpec, owner: usize, layers: &[Layer], token: &Token) -> Result<usize, ResolveError> {
	let layer_count = layers.len() as i64;
	let resolved = match resolve_spec(spec, owner) {
		index if index < 0 && matches!(spec, IndexSpec::Absolute(_)) => index + layer_count,
		index => index,
	};
	if (0..layer_count).contains(&resolved) {
		Ok(resolved as usize)
	} else {
		Err(ResolveError::FrameOutOfRange {
			label: layers[owner].label.clone(),
			token: token.to_string(),
			index: resolved,
			layer_count: layer_count as usize,
		})
	}
}

/// First group keeps the bare name; later collisions try `_0`, `_1`, ... until unused.
fn disambiguate(used: &mut HashSet<String>, base: &str) -> String {
	if used.insert(base.to_string()) {
		return base.to_string();
	}
	let mut suffix = 0;
	loop {
		let candidate = format!("{base}_{suffix}");
		if used.insert(candidate.clone()) {
			return candidate;
		}
		suffix += 1;
	}
}
