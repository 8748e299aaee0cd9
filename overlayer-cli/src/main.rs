use anyhow::{Context, Result};
use clap::Parser;
use overlayer::{ExportGroup, resolve_document};

use std::fs;
use std::path::PathBuf;

mod document;
mod render;

use document::SvgDocument;
use render::{ExportFormat, RenderOptions};

#[derive(Parser)]
#[command(name = "overlayer")]
#[command(about = "Export each tagged layer group of an SVG document as its own rendered frame")]
struct Args {
	/// Input SVG document
	input: PathBuf,

	/// Output directory (created if missing)
	#[arg(long, default_value = ".")]
	path: PathBuf,

	/// Prefix prepended to every output file name
	#[arg(long, default_value = "")]
	filename_prefix: String,

	/// Exported file type
	#[arg(short = 'f', long, value_enum, default_value = "jpeg")]
	filetype: ExportFormat,

	/// Export resolution in dots per inch
	#[arg(long, default_value_t = 90)]
	dpi: u32,

	/// Export the drawing bounds instead of the page
	#[arg(long)]
	crop: bool,

	/// Print the resolved export groups instead of rendering them
	#[arg(long)]
	list: bool,

	/// With --list, print the groups as JSON
	#[arg(long, requires = "list")]
	json: bool,

	/// Log more (-v: debug, -vv: trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn main() -> Result<()> {
	let args = Args::parse();
	init_logging(args.verbose)?;

	let document = SvgDocument::open(&args.input)?;
	let resolution = resolve_document(document.layers())?;
	if resolution.groups.is_empty() {
		log::warn!("{} has no export groups; nothing to do", args.input.display());
		return Ok(());
	}

	if args.list {
		return list_groups(&resolution.groups, args.json);
	}

	fs::create_dir_all(&args.path).with_context(|| format!("failed to create output directory {}", args.path.display()))?;
	let options = RenderOptions {
		dpi: args.dpi,
		crop: args.crop,
	};
	let width = resolution.groups.len().to_string().len();

	for (sequence, group) in resolution.groups.iter().enumerate() {
		let variant = document.write_variant(&resolution, &group.indices)?;
		let file_name = format!("{}{:0width$}_{}.{}", args.filename_prefix, sequence + 1, file_stem(&group.name), args.filetype.extension());
		let target = args.path.join(file_name);
		render::render(variant.path(), &target, args.filetype, options).with_context(|| format!("failed to render group {:?}", group.name))?;
		log::info!("rendered {:?} -> {}", group.name, target.display());
	}

	Ok(())
}

fn init_logging(verbosity: u8) -> Result<()> {
	let level = match verbosity {
		0 => log::LevelFilter::Info,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};
	fern::Dispatch::new()
		.format(|out, message, record| out.finish(format_args!("[{} {:>5}] {}", chrono::Local::now().format("%H:%M:%S"), record.level(), message)))
		.level(level)
		.chain(std::io::stderr())
		.apply()?;
	Ok(())
}

fn list_groups(groups: &[ExportGroup], json: bool) -> Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(groups)?);
		return Ok(());
	}
	for group in groups {
		let indices = group.indices.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
		println!("{}: [{indices}]", group.name);
	}
	Ok(())
}

/// Group names come from user-authored labels; keep them path-safe.
fn file_stem(name: &str) -> String {
	name.chars().map(|c| if c.is_whitespace() || matches!(c, '/' | '\\') { '-' } else { c }).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_stems_replace_separators_and_whitespace() {
		assert_eq!(file_stem("Scene 1/Intro"), "Scene-1-Intro");
		assert_eq!(file_stem("Plain"), "Plain");
	}
}
