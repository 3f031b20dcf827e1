//! Range validation, per-slide rendering and hand-off to an encoder.
//!
//! Every requested slide yields exactly one outcome, in ascending index
//! order. A slide that fails is recorded and the batch moves on; only range,
//! scale and document-level errors abort a conversion.

use crate::font::FontLibrary;
use crate::raster::Rasterizer;
use pptx2img_core::{Diagnostic, Error, PixelBuffer, RenderConfig, Result, ScaleMode, SlideRange, DEFAULT_SCALE};
use pptx2img_pptx::{Document, SceneBuilder};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stops a conversion between slides. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives each finished slide. Returns whether the slide was written.
pub trait SlideEncoder {
    fn encode(&mut self, index: usize, buffer: &PixelBuffer) -> bool;
}

impl<F> SlideEncoder for F
where
    F: FnMut(usize, &PixelBuffer) -> bool,
{
    fn encode(&mut self, index: usize, buffer: &PixelBuffer) -> bool {
        self(index, buffer)
    }
}

/// A successfully rendered slide.
#[derive(Debug)]
pub struct RenderedSlide {
    pub index: usize,
    pub buffer: PixelBuffer,
    pub diagnostics: Vec<Diagnostic>,
}

/// The result for one requested slide.
#[derive(Debug)]
pub enum SlideOutcome {
    Rendered(RenderedSlide),
    Failed { index: usize, error: Error },
    Cancelled { index: usize },
}

impl SlideOutcome {
    pub fn index(&self) -> usize {
        match self {
            SlideOutcome::Rendered(slide) => slide.index,
            SlideOutcome::Failed { index, .. } | SlideOutcome::Cancelled { index } => *index,
        }
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        match self {
            SlideOutcome::Rendered(slide) => Some(&slide.buffer),
            _ => None,
        }
    }
}

/// What happened to one slide in [`Converter::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlideStatus {
    Written,
    EncodeFailed,
    Failed { reason: String },
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlideReport {
    pub index: usize,
    #[serde(flatten)]
    pub status: SlideStatus,
    /// Pixel size, when the slide rendered.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Summary of a whole conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Slides in the deck, not just the requested range.
    pub slide_count: usize,
    /// Pixels per point used for every slide.
    pub scale: f32,
    pub slides: Vec<SlideReport>,
}

impl ConversionReport {
    fn count(&self, pred: impl Fn(&SlideStatus) -> bool) -> usize {
        self.slides.iter().filter(|s| pred(&s.status)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|s| *s == SlideStatus::Written)
    }

    /// Slides that failed to render or to encode.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SlideStatus::Failed { .. } | SlideStatus::EncodeFailed))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| *s == SlideStatus::Cancelled)
    }
}

/// Renders a range of slides from one document.
pub struct Converter<'a> {
    document: &'a Document,
    fonts: &'a FontLibrary,
    range: Option<SlideRange>,
    scale: Option<ScaleMode>,
    default_scale: f32,
    jobs: usize,
    cancel: CancelToken,
}

impl<'a> Converter<'a> {
    /// Convert every slide at the default scale on the calling thread.
    pub fn new(document: &'a Document, fonts: &'a FontLibrary) -> Self {
        Self {
            document,
            fonts,
            range: None,
            scale: None,
            default_scale: DEFAULT_SCALE,
            jobs: 1,
            cancel: CancelToken::new(),
        }
    }

    /// Take the default scale and worker count from `config`.
    pub fn with_config(mut self, config: &RenderConfig) -> Self {
        self.default_scale = config.default_scale;
        self.jobs = config.jobs.max(1);
        self
    }

    /// Restrict the conversion to an inclusive 1-based range.
    pub fn with_range(mut self, range: SlideRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_scale(mut self, scale: ScaleMode) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Render up to `jobs` slides at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Pixels per point for this document.
    pub fn scale(&self) -> Result<f32> {
        self.scale
            .unwrap_or(ScaleMode::Factor(self.default_scale))
            .factor_for(self.document.size())
    }

    /// Validated slide indices.
    pub fn indices(&self) -> Result<RangeInclusive<usize>> {
        SlideRange::resolve(self.range, self.document.slide_count())
    }

    /// Build and rasterize one slide.
    pub fn render_slide(&self, index: usize, scale: f32) -> Result<RenderedSlide> {
        let scene = SceneBuilder::new(self.document).build(index)?;
        let output = Rasterizer::new(self.fonts).render(&scene, scale)?;
        if !output.diagnostics.is_empty() {
            let messages: Vec<String> = output.diagnostics.iter().map(|d| d.to_string()).collect();
            log::warn!("Slide {}: {}", index, messages.join("; "));
        }
        log::debug!(
            "Rendered slide {} ({} shapes) at {}x{}",
            index,
            scene.shape_count(),
            output.buffer.width(),
            output.buffer.height()
        );
        Ok(RenderedSlide {
            index,
            buffer: output.buffer,
            diagnostics: output.diagnostics,
        })
    }

    fn outcome(&self, index: usize, scale: f32) -> SlideOutcome {
        if self.cancel.is_cancelled() {
            return SlideOutcome::Cancelled { index };
        }
        match self.render_slide(index, scale) {
            Ok(slide) => SlideOutcome::Rendered(slide),
            Err(error) => {
                log::warn!("Slide {} failed: {}", index, error);
                SlideOutcome::Failed { index, error }
            }
        }
    }

    /// Lazily render the range on the calling thread, one slide at a time.
    ///
    /// The range and scale are validated before the first slide.
    pub fn slides(&self) -> Result<Slides<'_, 'a>> {
        let indices = self.indices()?;
        let scale = self.scale()?;
        Ok(Slides {
            converter: self,
            indices,
            scale,
        })
    }

    /// Render the range and collect every outcome.
    pub fn render_all(&self) -> Result<Vec<SlideOutcome>> {
        let mut outcomes = Vec::new();
        self.for_each(|outcome| outcomes.push(outcome))?;
        Ok(outcomes)
    }

    /// Render the range, handing each buffer to `encoder` and dropping it
    /// straight after.
    pub fn run(&self, encoder: &mut dyn SlideEncoder) -> Result<ConversionReport> {
        let scale = self.scale()?;
        let mut slides = Vec::new();
        self.for_each(|outcome| slides.push(report(outcome, encoder)))?;
        let report = ConversionReport {
            slide_count: self.document.slide_count(),
            scale,
            slides,
        };
        log::debug!(
            "Conversion finished: {} written, {} failed, {} cancelled",
            report.written(),
            report.failed(),
            report.cancelled()
        );
        Ok(report)
    }

    /// Visit outcomes in ascending order. With more than one job, slides
    /// render in batches of `jobs` so at most that many buffers are alive.
    fn for_each(&self, mut visit: impl FnMut(SlideOutcome)) -> Result<()> {
        let indices = self.indices()?;
        let scale = self.scale()?;

        let pool = if self.jobs > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Rendering sequentially, thread pool unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        match pool {
            None => {
                for index in indices {
                    visit(self.outcome(index, scale));
                }
            }
            Some(pool) => {
                let indices: Vec<usize> = indices.collect();
                for batch in indices.chunks(self.jobs) {
                    let outcomes: Vec<SlideOutcome> =
                        pool.install(|| batch.par_iter().map(|&index| self.outcome(index, scale)).collect());
                    outcomes.into_iter().for_each(&mut visit);
                }
            }
        }
        Ok(())
    }
}

/// Lazy per-slide iterator returned by [`Converter::slides`].
pub struct Slides<'c, 'a> {
    converter: &'c Converter<'a>,
    indices: RangeInclusive<usize>,
    scale: f32,
}

impl Iterator for Slides<'_, '_> {
    type Item = SlideOutcome;

    fn next(&mut self) -> Option<SlideOutcome> {
        let index = self.indices.next()?;
        Some(self.converter.outcome(index, self.scale))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

fn report(outcome: SlideOutcome, encoder: &mut dyn SlideEncoder) -> SlideReport {
    match outcome {
        SlideOutcome::Rendered(slide) => {
            let written = encoder.encode(slide.index, &slide.buffer);
            if !written {
                log::warn!("Encoder rejected slide {}", slide.index);
            }
            SlideReport {
                index: slide.index,
                status: if written {
                    SlideStatus::Written
                } else {
                    SlideStatus::EncodeFailed
                },
                width: Some(slide.buffer.width()),
                height: Some(slide.buffer.height()),
                diagnostics: slide.diagnostics,
            }
        }
        SlideOutcome::Failed { index, error } => SlideReport {
            index,
            status: SlideStatus::Failed {
                reason: error.to_string(),
            },
            width: None,
            height: None,
            diagnostics: Vec::new(),
        },
        SlideOutcome::Cancelled { index } => SlideReport {
            index,
            status: SlideStatus::Cancelled,
            width: None,
            height: None,
            diagnostics: Vec::new(),
        },
    }
}
