use thiserror::Error;

/// A set of different errors that can abort a resolution pass.
///
/// Any of these fails the whole pass: no partial group set is ever returned,
/// and a host must not invoke the renderer after a failed resolution. Every
/// variant names the offending layer label (and raw token where one exists) so
/// the host can surface the message verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
	/// A label carries more than one bracketed group, or a token that fits no recognized form.
	#[error("malformed tag in layer {label:?}: {detail}")]
	MalformedTag { label: String, detail: String },

	/// A frame or exclusion token resolved to an index outside the document.
	#[error("token {token:?} in layer {label:?} selects index {index}, outside the document of {layer_count} layers")]
	FrameOutOfRange {
		label: String,
		token: String,
		index: i64,
		layer_count: usize,
	},

	/// Layer nesting exceeds the configured ceiling, which also catches cyclic parent references.
	#[error("layer nesting deeper than {ceiling} levels")]
	HierarchyTooDeep { ceiling: usize },

	/// Selection by marker is recognized by the parser but deliberately not resolved.
	#[error("layer {label:?} selects by marker ({token:?}), which is not implemented")]
	SelectionUnsupported { label: String, token: String },
}

impl ResolveError {
	pub(crate) fn malformed(label: &str, detail: impl Into<String>) -> Self {
		ResolveError::MalformedTag {
			label: label.to_string(),
			detail: detail.into(),
		}
	}
}
