use anyhow::{Context, Result, bail};
use overlayer::{Resolution, SourceLayer};
use svg::node::Attributes;
use svg::node::element::tag::Type;
use svg::parser::Event;
use tempfile::NamedTempFile;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

const GROUPMODE: &str = "inkscape:groupmode";
const LABEL: &str = "inkscape:label";

/// How one layer's visibility is rewritten in a document variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
	Show,
	Hide,
	/// Untagged layers outside the visible set keep their authored style.
	Keep,
}

/// An Inkscape-style layered SVG document: the raw text plus the layer list
/// discovered from it.
///
/// This is the host side of the engine's document interface. Discovery walks
/// the event stream once; variants re-emit the same stream with only layer
/// `style` attributes rewritten.
pub struct SvgDocument {
	content: String,
	layers: Vec<SourceLayer>,
}

impl SvgDocument {
	pub fn open(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let layers = discover_layers(&content).with_context(|| format!("failed to parse {}", path.display()))?;
		log::info!("{}: {} layers", path.display(), layers.len());
		Ok(Self { content, layers })
	}

	/// The layer list in document order (bottom to top), as the engine expects.
	pub fn layers(&self) -> &[SourceLayer] {
		&self.layers
	}

	/// Materializes the variant the renderer consumes: the given engine
	/// indices visible, every other tagged layer hidden, untagged layers
	/// untouched.
	pub fn write_variant(&self, resolution: &Resolution, visible: &[usize]) -> Result<NamedTempFile> {
		let variant = rewrite(&self.content, &visibility_actions(resolution, visible))?;
		let mut file = tempfile::Builder::new()
			.prefix("overlayer-")
			.suffix(".svg")
			.tempfile()
			.context("failed to create a temporary document variant")?;
		file.write_all(variant.as_bytes()).context("failed to write the document variant")?;
		Ok(file)
	}
}

/// Decides, per host layer id, how a variant treats that layer.
fn visibility_actions<'a>(resolution: &'a Resolution, visible: &[usize]) -> HashMap<&'a str, Visibility> {
	let mut actions = HashMap::new();
	for (index, layer) in resolution.layers.iter().enumerate() {
		let action = if visible.contains(&index) {
			Visibility::Show
		} else if layer.is_tagged() {
			Visibility::Hide
		} else {
			Visibility::Keep
		};
		actions.insert(layer.id.as_str(), action);
	}
	actions
}

fn attribute<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
	attributes.get(name).map(|value| &**value)
}

fn is_layer_tag(name: &str, attributes: &Attributes) -> bool {
	matches!(name, "g" | "svg:g") && attribute(attributes, GROUPMODE) == Some("layer")
}

/// Collects every labeled layer in document order. Element nesting supplies
/// the parent references; a layer without an id or label is not addressable
/// and is skipped, as the editor's own export extension skips them.
fn discover_layers(content: &str) -> Result<Vec<SourceLayer>> {
	let mut layers = Vec::new();
	// One entry per open `g` element: the discovered layer's position, if it is one.
	let mut open_groups: Vec<Option<usize>> = Vec::new();

	for event in svg::read(content)? {
		match event {
			Event::Error(error) => bail!("malformed SVG: {error}"),
			Event::Tag(name, kind, attributes) if matches!(name, "g" | "svg:g") => {
				if matches!(kind, Type::End) {
					open_groups.pop();
					continue;
				}
				let parent = open_groups.iter().rev().find_map(|&position| position);
				let mut position = None;
				if is_layer_tag(name, &attributes) {
					match (attribute(&attributes, "id"), attribute(&attributes, LABEL)) {
						(Some(id), Some(label)) => {
							layers.push(SourceLayer::new(id, label, parent));
							position = Some(layers.len() - 1);
						}
						_ => log::debug!("skipping a layer group without id or label"),
					}
				}
				if matches!(kind, Type::Start) {
					open_groups.push(position);
				}
			}
			_ => {}
		}
	}

	Ok(layers)
}

/// Re-emits the document with layer `style` attributes rewritten according to
/// `actions`. Everything else passes through unchanged, up to attribute
/// ordering, which comes out sorted.
fn rewrite(content: &str, actions: &HashMap<&str, Visibility>) -> Result<String> {
	let mut output = String::with_capacity(content.len() + content.len() / 8);

	for event in svg::read(content)? {
		match event {
			Event::Error(error) => bail!("malformed SVG: {error}"),
			Event::Tag(name, kind, mut attributes) => {
				if !matches!(kind, Type::End) && is_layer_tag(name, &attributes) {
					let action = attribute(&attributes, "id").and_then(|id| actions.get(id)).copied();
					match action {
						Some(Visibility::Show) => {
							attributes.insert("style".to_string(), "display:inline".into());
						}
						Some(Visibility::Hide) => {
							attributes.insert("style".to_string(), "display:none".into());
						}
						Some(Visibility::Keep) | None => {}
					}
				}
				write_tag(&mut output, name, kind, &attributes);
			}
			Event::Text(text) => output.push_str(text),
			Event::Comment(raw) => write_verbatim(&mut output, raw, "<!--", "-->"),
			Event::Declaration(raw) => write_verbatim(&mut output, raw, "<!", ">"),
			Event::Instruction(raw) => write_verbatim(&mut output, raw, "<?", "?>"),
		}
	}

	Ok(output)
}

fn write_tag(output: &mut String, name: &str, kind: Type, attributes: &Attributes) {
	if matches!(kind, Type::End) {
		output.push_str("</");
		output.push_str(name);
		output.push('>');
		return;
	}

	output.push('<');
	output.push_str(name);
	let mut names: Vec<&String> = attributes.keys().collect();
	names.sort();
	for key in names {
		output.push(' ');
		output.push_str(key);
		output.push_str("=\"");
		output.push_str(&attributes[key].replace('"', "&quot;"));
		output.push('"');
	}
	output.push_str(if matches!(kind, Type::Empty) { "/>" } else { ">" });
}

/// The parser may hand delimited markup through either with or without its
/// delimiters depending on the event kind; emit it delimited exactly once.
fn write_verbatim(output: &mut String, raw: &str, open: &str, close: &str) {
	if raw.starts_with(open) {
		output.push_str(raw);
	} else {
		output.push_str(open);
		output.push_str(raw);
		output.push_str(close);
	}
}
