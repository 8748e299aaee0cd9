use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use std::path::Path;
use std::process::{Command, Stdio};

/// The closed set of outputs the external renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
	/// Raster image
	Png,
	/// Raster image, converted from PNG with ImageMagick
	Jpeg,
	/// Vector-preserving fixed-format document
	Pdf,
	/// PDF paired with LaTeX text-overlay macros
	Latex,
}

impl ExportFormat {
	pub fn extension(self) -> &'static str {
		match self {
			ExportFormat::Png => "png",
			ExportFormat::Jpeg => "jpg",
			ExportFormat::Pdf | ExportFormat::Latex => "pdf",
		}
	}
}

/// Renderer configuration that is not a group-resolution concern.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
	/// Export resolution in dots per inch.
	pub dpi: u32,
	/// Export the drawing bounds instead of the page.
	pub crop: bool,
}

/// Renders one document variant to `output_path` in the requested format.
pub fn render(variant: &Path, output_path: &Path, format: ExportFormat, options: RenderOptions) -> Result<()> {
	match format {
		ExportFormat::Png => inkscape(variant, output_path, "png", options, false),
		ExportFormat::Pdf => inkscape(variant, output_path, "pdf", options, false),
		ExportFormat::Latex => inkscape(variant, output_path, "pdf", options, true),
		ExportFormat::Jpeg => {
			let png = tempfile::Builder::new()
				.prefix("overlayer-")
				.suffix(".png")
				.tempfile()
				.context("failed to create a temporary PNG")?;
			inkscape(variant, png.path(), "png", options, false)?;
			convert(png.path(), output_path)
		}
	}
}

fn inkscape(variant: &Path, output_path: &Path, export_type: &str, options: RenderOptions, latex: bool) -> Result<()> {
	let mut command = Command::new("inkscape");
	command
		.arg(if options.crop { "--export-area-drawing" } else { "--export-area-page" })
		.arg(format!("--export-dpi={}", options.dpi))
		.arg(format!("--export-type={export_type}"));
	if latex {
		command.arg("--export-latex");
	}
	command.arg(format!("--export-filename={}", output_path.display())).arg(variant);
	run(command)
}

fn convert(png: &Path, output_path: &Path) -> Result<()> {
	let mut command = Command::new("convert");
	command.arg(png).arg(output_path);
	run(command)
}

fn run(mut command: Command) -> Result<()> {
	log::debug!("running {command:?}");
	let status = command
		.stdout(Stdio::null())
		.stderr(Stdio::inherit())
		.status()
		.with_context(|| format!("failed to launch {:?}", command.get_program()))?;
	if !status.success() {
		bail!("{command:?} exited with {status}");
	}
	Ok(())
}
