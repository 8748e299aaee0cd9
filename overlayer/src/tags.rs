use crate::error::ResolveError;

use core::fmt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches one bracketed tag group inside a layer label.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());

// ======
// Action
// ======

/// An action keyword controlling a layer's membership in every group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
	/// `s`: this layer is never included in any group, overriding persistence.
	Skip,
	/// `p`: this layer is included in every group that has frame selectors of its own.
	Persistent,
}

// =========
// IndexSpec
// =========

/// A single index written in a tag, before resolution against the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSpec {
	/// A bare integer: an offset from the owning layer's own index.
	Relative(i64),
	/// `@`-prefixed: an absolute index, negative values counting from the end.
	Absolute(i64),
}

impl fmt::Display for IndexSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			IndexSpec::Relative(offset) => write!(f, "{offset}"),
			IndexSpec::Absolute(index) => write!(f, "@{index}"),
		}
	}
}

// =============
// FrameSelector
// =============

/// A frame token: one layer index or an inclusive range of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSelector {
	Single(IndexSpec),
	/// `start/end` (also `start:end`). An omitted start stands for the top of
	/// the document, an omitted end for the bottom; both ends are inclusive
	/// once order-normalized.
	Range(Option<IndexSpec>, Option<IndexSpec>),
}

impl fmt::Display for FrameSelector {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			FrameSelector::Single(spec) => spec.fmt(f),
			FrameSelector::Range(start, end) => {
				if let Some(start) = start {
					start.fmt(f)?;
				}
				write!(f, "/")?;
				if let Some(end) = end {
					end.fmt(f)?;
				}
				Ok(())
			}
		}
	}
}

// =====
// Token
// =====

/// One comma-separated unit inside a tag, classified by prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
	/// `s` or `p`, matched exactly.
	Action(Action),
	/// `!target`: remove the target index from this layer's resolved set.
	Exclude(IndexSpec),
	/// `#name`: attach a marker other layers can select by.
	Mark(String),
	/// `*name`: select all layers sharing a marker. Recognized but never resolved.
	Select(String),
	/// Anything else: a selection of concrete layer indices.
	Frame(FrameSelector),
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Token::Action(Action::Skip) => write!(f, "s"),
			Token::Action(Action::Persistent) => write!(f, "p"),
			Token::Exclude(target) => write!(f, "!{target}"),
			Token::Mark(name) => write!(f, "#{name}"),
			Token::Select(name) => write!(f, "*{name}"),
			Token::Frame(selector) => selector.fmt(f),
		}
	}
}

/// Splits a layer label into its tag-stripped display text and parsed tokens.
///
/// At most one bracketed group is permitted per label; a label without one is
/// valid and yields an empty token list. The clean label is the input with the
/// bracketed group removed and surrounding whitespace trimmed.
pub fn parse_label(label: &str) -> Result<(String, Vec<Token>), ResolveError> {
	let mut matches = TAG_PATTERN.find_iter(label);
	let Some(tag) = matches.next() else {
		return Ok((label.to_string(), Vec::new()));
	};
	if matches.next().is_some() {
		return Err(ResolveError::malformed(label, "more than one bracketed group"));
	}

	let mut clean = String::with_capacity(label.len());
	clean.push_str(&label[..tag.start()]);
	clean.push_str(&label[tag.end()..]);
	let clean = clean.trim().to_string();

	let interior = &tag.as_str()[1..tag.as_str().len() - 1];
	let tokens = interior.split(',').map(|raw| classify(raw.trim(), label)).collect::<Result<Vec<_>, _>>()?;

	Ok((clean, tokens))
}

/// Classifies one raw token, trying the action keywords first, then the
/// `!`/`#`/`*` prefixes, and falling back to a frame selector.
fn classify(raw: &str, label: &str) -> Result<Token, ResolveError> {
	match raw {
		"" => return Err(ResolveError::malformed(label, "empty token")),
		"s" => return Ok(Token::Action(Action::Skip)),
		"p" => return Ok(Token::Action(Action::Persistent)),
		_ => {}
	}
	if let Some(target) = raw.strip_prefix('!') {
		return Ok(Token::Exclude(parse_index_spec(target, raw, label)?));
	}
	if let Some(name) = raw.strip_prefix('#') {
		if name.is_empty() {
			return Err(ResolveError::malformed(label, "marker token `#` without a name"));
		}
		return Ok(Token::Mark(name.to_string()));
	}
	if let Some(name) = raw.strip_prefix('*') {
		if name.is_empty() {
			return Err(ResolveError::malformed(label, "selection token `*` without a marker name"));
		}
		return Ok(Token::Select(name.to_string()));
	}
	Ok(Token::Frame(parse_frame_selector(raw, label)?))
}

/// Parses a single index: a bare integer offset or an `@`-prefixed absolute index.
fn parse_index_spec(spec: &str, raw: &str, label: &str) -> Result<IndexSpec, ResolveError> {
	let (constructor, digits): (fn(i64) -> IndexSpec, &str) = match spec.strip_prefix('@') {
		Some(digits) => (IndexSpec::Absolute, digits),
		None => (IndexSpec::Relative, spec),
	};
	digits
		.parse::<i64>()
		.map(constructor)
		.map_err(|_| ResolveError::malformed(label, format!("unrecognized token `{raw}`")))
}

/// Validates a frame token's shape: an integer, or exactly one `/` or `:`
/// splitting two optionally-empty index specs. Bounds are checked at
/// resolution time, not here.
fn parse_frame_selector(raw: &str, label: &str) -> Result<FrameSelector, ResolveError> {
	let mut separators = raw.char_indices().filter(|(_, c)| matches!(c, '/' | ':'));
	let Some((split, _)) = separators.next() else {
		return Ok(FrameSelector::Single(parse_index_spec(raw, raw, label)?));
	};
	if separators.next().is_some() {
		return Err(ResolveError::malformed(label, format!("token `{raw}` has more than one range separator")));
	}

	let (start, end) = (&raw[..split], &raw[split + 1..]);
	let start = (!start.is_empty()).then(|| parse_index_spec(start, raw, label)).transpose()?;
	let end = (!end.is_empty()).then(|| parse_index_spec(end, raw, label)).transpose()?;
	Ok(FrameSelector::Range(start, end))
}
