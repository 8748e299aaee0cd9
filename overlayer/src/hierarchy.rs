use crate::error::ResolveError;
use crate::layer::Layer;

use serde::Serialize;

/// Default ceiling on layer nesting depth.
pub const DEFAULT_DEPTH_CEILING: usize = 64;

/// One node of the layer tree, addressed by engine index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeNode {
	/// Engine index of the enclosing layer, if any.
	pub parent: Option<usize>,
	/// Engine indices of directly contained layers, in declaration order.
	pub children: Vec<usize>,
	/// Nesting depth; root layers are at depth 0.
	pub depth: usize,
}

/// The reconstructed nesting structure of a document's layers.
///
/// Nodes live in an arena indexed the same way as the layer list, with
/// explicit parent and child indices instead of owned references. The present
/// resolution pass consumes only the flat top-to-bottom ordering; the links
/// and depth bands are context for per-branch scoping later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerTree {
	nodes: Vec<TreeNode>,
	bands: Vec<Vec<usize>>,
}

impl LayerTree {
	pub fn build(layers: &[Layer]) -> Result<Self, ResolveError> {
		Self::build_with_ceiling(layers, DEFAULT_DEPTH_CEILING)
	}

	/// Walks every layer's parent chain to compute depths, then links children
	/// and groups the indices into depth bands preserving declaration order.
	/// A chain longer than `ceiling` fails, which also bounds malformed cyclic
	/// parent references.
	pub fn build_with_ceiling(layers: &[Layer], ceiling: usize) -> Result<Self, ResolveError> {
		if layers.is_empty() {
			return Ok(Self::default());
		}

		let mut nodes: Vec<TreeNode> = layers
			.iter()
			.map(|layer| TreeNode {
				parent: layer.parent,
				..Default::default()
			})
			.collect();

		for index in 0..nodes.len() {
			let mut depth = 0;
			let mut current = nodes[index].parent;
			while let Some(parent) = current {
				depth += 1;
				if depth > ceiling {
					return Err(ResolveError::HierarchyTooDeep { ceiling });
				}
				current = nodes[parent].parent;
			}
			nodes[index].depth = depth;
		}

		for index in 0..nodes.len() {
			if let Some(parent) = nodes[index].parent {
				nodes[parent].children.push(index);
			}
		}

		let deepest = nodes.iter().map(|node| node.depth).max().unwrap_or_default();
		let mut bands = vec![Vec::new(); deepest + 1];
		for (index, node) in nodes.iter().enumerate() {
			bands[node.depth].push(index);
		}

		Ok(Self { nodes, bands })
	}

	pub fn node(&self, index: usize) -> &TreeNode {
		&self.nodes[index]
	}

	/// Engine indices grouped by nesting depth, declaration order preserved
	/// within each band.
	pub fn depth_bands(&self) -> &[Vec<usize>] {
		&self.bands
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}
