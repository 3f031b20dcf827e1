//! CLI tool for rendering PowerPoint slides to PNG images.

use anyhow::{Context, Result};
use clap::Parser;
use pptx2img_core::{PixelBuffer, RenderConfig, ScaleMode, SlideRange, DEFAULT_FONT_FAMILY};
use pptx2img_pptx::Document;
use pptx2img_render::{ConversionReport, Converter, FontLibrary, SlideEncoder, SlideStatus};
use std::path::{Path, PathBuf};

/// Render the slides of a .pptx file to one PNG per slide.
#[derive(Parser, Debug)]
#[command(name = "pptx2img")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "pptx2img")]
    output: PathBuf,

    /// Inclusive 1-based slide range (default: every slide)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    range: Option<Vec<usize>>,

    /// Pixels per point; 1.0 renders at the deck's native size
    #[arg(short, long, conflicts_with = "long_edge")]
    scale: Option<f32>,

    /// Fit the slide's longer side to this many pixels
    #[arg(long, value_name = "PX")]
    long_edge: Option<u32>,

    /// Extra directory of font files (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Family substituted for fonts that are not installed
    #[arg(long, default_value = DEFAULT_FONT_FAMILY)]
    default_font: String,

    /// Do not load system fonts
    #[arg(long)]
    no_system_fonts: bool,

    /// Number of slides rendered in parallel
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> RenderConfig {
        let mut config = RenderConfig::new()
            .with_default_font_family(&self.default_font)
            .with_system_fonts(!self.no_system_fonts)
            .with_jobs(self.jobs);
        for dir in &self.font_dirs {
            config = config.with_font_dir(dir);
        }
        config
    }

    fn slide_range(&self) -> Option<SlideRange> {
        match self.range.as_deref() {
            Some([start, end]) => Some(SlideRange::new(*start, *end)),
            _ => None,
        }
    }

    fn scale_mode(&self) -> Option<ScaleMode> {
        match (self.scale, self.long_edge) {
            (Some(factor), _) => Some(ScaleMode::Factor(factor)),
            (None, Some(px)) => Some(ScaleMode::LongEdge(px)),
            (None, None) => None,
        }
    }
}

/// Writes each slide as `Slide_<index>.png`.
struct PngWriter {
    dir: PathBuf,
}

impl PngWriter {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("Slide_{}.png", index))
    }
}

impl SlideEncoder for PngWriter {
    fn encode(&mut self, index: usize, buffer: &PixelBuffer) -> bool {
        let path = self.path_for(index);
        match image::save_buffer(
            &path,
            buffer.as_bytes(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::Rgba8,
        ) {
            Ok(()) => {
                log::debug!("Written to: {}", path.display());
                true
            }
            Err(e) => {
                log::error!("Failed to write {}: {}", path.display(), e);
                false
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let report = convert(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for slide in &report.slides {
            if let SlideStatus::Failed { reason } = &slide.status {
                eprintln!("Slide {}: {}", slide.index, reason);
            }
        }
        eprintln!(
            "Wrote {} of {} slides to {}",
            report.written(),
            report.slides.len(),
            args.output.display()
        );
    }

    Ok(())
}

/// Load the deck and fonts, then render the requested slides.
fn convert(args: &Args) -> Result<ConversionReport> {
    let config = args.config();

    if args.verbose {
        eprintln!("Processing: {}", args.input.display());
    }
    let document = Document::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    if args.verbose {
        eprintln!("  Found {} slides", document.slide_count());
    }

    let fonts = FontLibrary::new(&config).context("Failed to load fonts")?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {}", args.output.display()))?;

    let mut converter = Converter::new(&document, &fonts).with_config(&config);
    if let Some(range) = args.slide_range() {
        converter = converter.with_range(range);
    }
    if let Some(scale) = args.scale_mode() {
        converter = converter.with_scale(scale);
    }

    let mut writer = PngWriter::new(&args.output);
    converter
        .run(&mut writer)
        .with_context(|| format!("Failed to convert {}", args.input.display()))
}
