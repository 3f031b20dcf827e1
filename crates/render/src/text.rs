//! Paragraph layout: line breaking, alignment, spacing, anchoring and
//! shrink-to-fit.
//!
//! Layout happens in shape-local points with the origin at the top-left
//! corner of the text frame. Nothing is clipped; text that does not fit is
//! laid out past the frame and flagged as overflowing.

use crate::font::{FontLibrary, LineMetrics, Measured};
use pptx2img_core::{Align, Anchor, AutoFit, Color, FontSpec, LineSpacing, Paragraph, Spacing, TextBody};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Smallest font scale the shrink-to-fit search will try.
pub const MIN_FONT_SCALE: f32 = 0.3;

/// Number of 10% steps between full size and [`MIN_FONT_SCALE`].
const FIT_STEPS: u32 = 7;

const EPSILON: f32 = 0.01;

/// Consecutive characters of one run on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub face: Option<fontdb::ID>,
    pub text: String,
    /// Advance of each `char` of `text`, in points.
    pub advances: Vec<f32>,
    /// Pen position of the first glyph.
    pub x: f32,
    pub baseline: f32,
    /// Font size after any autofit scaling.
    pub size: f32,
    pub color: Color,
    pub underline: bool,
}

impl GlyphRun {
    pub fn width(&self) -> f32 {
        self.advances.iter().sum()
    }
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Left edge of the visible content.
    pub x: f32,
    /// Width of the content, excluding trailing whitespace.
    pub width: f32,
    pub baseline: f32,
    pub runs: Vec<GlyphRun>,
}

/// A positioned text body.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    /// Height of all lines and paragraph spacing.
    pub height: f32,
    /// Font scale chosen by autofit; 1.0 when not shrinking.
    pub font_scale: f32,
    /// Text extends beyond the inset frame.
    pub overflows: bool,
    /// Requested families that fell back to another face.
    pub substituted: Vec<String>,
}

impl TextLayout {
    /// Every character placed, in reading order; whitespace at line ends
    /// is not included.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .flat_map(|l| l.runs.iter().map(|r| r.text.as_str()))
            .collect()
    }
}

/// Lay out `body` inside a `width` × `height` frame.
pub fn layout(body: &TextBody, width: f32, height: f32, fonts: &FontLibrary) -> TextLayout {
    let insets = body.layout.insets;
    let area_width = (width - insets.left - insets.right).max(0.0);
    let area_height = (height - insets.top - insets.bottom).max(0.0);
    let wrap = body.layout.wrap;

    let mut layout = match body.layout.autofit {
        AutoFit::Shrink {
            font_scale: Some(scale),
            line_reduction,
        } => flow(body, area_width, wrap, scale.clamp(MIN_FONT_SCALE, 1.0), line_reduction, fonts),
        AutoFit::Shrink {
            font_scale: None,
            line_reduction,
        } => {
            let mut step = 0;
            loop {
                let scale = 1.0 - step as f32 / 10.0;
                let candidate = flow(body, area_width, wrap, scale, line_reduction, fonts);
                if candidate.height <= area_height + EPSILON || step == FIT_STEPS {
                    break candidate;
                }
                step += 1;
            }
        }
        AutoFit::Disabled | AutoFit::ResizeShape => flow(body, area_width, wrap, 1.0, 0.0, fonts),
    };

    let top = match body.layout.anchor {
        Anchor::Top => insets.top,
        Anchor::Middle => insets.top + (area_height - layout.height) / 2.0,
        Anchor::Bottom => insets.top + area_height - layout.height,
    };
    for line in &mut layout.lines {
        line.x += insets.left;
        line.baseline += top;
        for run in &mut line.runs {
            run.x += insets.left;
            run.baseline += top;
        }
    }
    layout.overflows = layout.height > area_height + EPSILON
        || layout.lines.iter().any(|l| l.width > area_width + EPSILON);
    layout
}

/// Stack paragraphs top-down at `scale`, origin at the inset corner.
fn flow(body: &TextBody, width: f32, wrap: bool, scale: f32, reduction: f32, fonts: &FontLibrary) -> TextLayout {
    let mut lines = Vec::new();
    let mut substituted: Vec<String> = Vec::new();
    let mut y = 0.0;

    for (i, para) in body.paragraphs.iter().enumerate() {
        let first_size = para.runs.first().map(|r| r.font.size).unwrap_or(para.end_font.size) * scale;
        if i > 0 {
            y += spacing(para.space_before, first_size, scale);
        }

        for mut line in break_paragraph(para, width, wrap, scale, fonts, &mut substituted) {
            let line_height = match para.line_spacing {
                LineSpacing::Proportional(factor) => line.metrics.height() * factor * (1.0 - reduction),
                LineSpacing::Exact(points) => points * scale,
            };
            let baseline = y + line_height - line.metrics.descent;
            for run in &mut line.runs {
                run.baseline = baseline;
            }
            lines.push(Line {
                x: line.x,
                width: line.width,
                baseline,
                runs: line.runs,
            });
            y += line_height;
        }

        y += spacing(para.space_after, first_size, scale);
    }

    TextLayout {
        lines,
        height: y,
        font_scale: scale,
        overflows: false,
        substituted,
    }
}

fn spacing(spacing: Spacing, first_size: f32, scale: f32) -> f32 {
    match spacing {
        Spacing::None => 0.0,
        Spacing::Proportional(f) => f * first_size * 1.2,
        Spacing::Points(points) => points * scale,
    }
}

/// A line before vertical placement.
struct PendingLine {
    x: f32,
    width: f32,
    metrics: LineMetrics,
    runs: Vec<GlyphRun>,
}

/// One character with its source run and measured advance.
struct Glyph {
    ch: char,
    run: usize,
    advance: f32,
}

fn scaled(font: &FontSpec, scale: f32) -> FontSpec {
    FontSpec {
        size: font.size * scale,
        ..font.clone()
    }
}

fn break_paragraph(
    para: &Paragraph,
    width: f32,
    wrap: bool,
    scale: f32,
    fonts: &FontLibrary,
    substituted: &mut Vec<String>,
) -> Vec<PendingLine> {
    let mut note = |font: &FontSpec, measured: &Measured| {
        if (measured.face.is_none() || !fonts.has_family(&font.family)) && !substituted.contains(&font.family) {
            substituted.push(font.family.clone());
        }
    };

    let measured: Vec<Measured> = para
        .runs
        .iter()
        .map(|run| {
            let m = fonts.measure(&scaled(&run.font, scale), &run.text);
            note(&run.font, &m);
            m
        })
        .collect();

    let mut text = String::new();
    let mut glyphs = Vec::new();
    // Byte offset in `text` -> glyph index.
    let mut offsets = Vec::new();
    for (run_idx, (run, m)) in para.runs.iter().zip(&measured).enumerate() {
        for (ch, advance) in run.text.chars().zip(&m.advances) {
            offsets.push(text.len());
            text.push(ch);
            glyphs.push(Glyph {
                ch,
                run: run_idx,
                advance: *advance,
            });
        }
    }

    let end_metrics = fonts.metrics(&scaled(&para.end_font, scale));
    if glyphs.is_empty() {
        return vec![PendingLine {
            x: para.margin_left + para.indent,
            width: 0.0,
            metrics: end_metrics,
            runs: Vec::new(),
        }];
    }

    let bullet = para.bullet.as_ref().map(|b| {
        let font = scaled(&b.font, scale);
        let m = fonts.measure(&font, &b.ch.to_string());
        note(&b.font, &m);
        (b, font, m)
    });

    let first_x = para.margin_left + para.indent;
    let text_x = match &bullet {
        Some((_, _, m)) => {
            let after_bullet = first_x + m.advances.iter().sum::<f32>();
            if para.indent < 0.0 {
                para.margin_left.max(after_bullet)
            } else {
                after_bullet
            }
        }
        None => first_x,
    };

    let to_glyph = |byte: usize| offsets.partition_point(|&o| o < byte);

    // Greedy fill between break opportunities.
    let mut ranges: Vec<(usize, usize, bool)> = Vec::new();
    let mut start = 0;
    let mut prev = 0;
    let mut line_width = 0.0;
    let mut avail = width - text_x;
    for (byte, opportunity) in linebreaks(&text) {
        let end = to_glyph(byte);
        let segment = &glyphs[prev..end];
        let seg_width: f32 = segment.iter().map(|g| g.advance).sum();
        let trailing: f32 = segment
            .iter()
            .rev()
            .take_while(|g| g.ch.is_whitespace())
            .map(|g| g.advance)
            .sum();

        if wrap && prev > start && line_width + seg_width - trailing > avail + EPSILON {
            ranges.push((start, prev, false));
            start = prev;
            line_width = 0.0;
            avail = width - para.margin_left;
        }
        line_width += seg_width;

        if opportunity == BreakOpportunity::Mandatory && end < glyphs.len() {
            ranges.push((start, end, true));
            start = end;
            line_width = 0.0;
            avail = width - para.margin_left;
        }
        prev = end;
    }
    ranges.push((start, glyphs.len(), true));

    let last = ranges.len() - 1;
    ranges
        .into_iter()
        .enumerate()
        .map(|(line_idx, (start, end, hard_end))| {
            let line = &glyphs[start..end];
            let content = line.len()
                - line
                    .iter()
                    .rev()
                    .take_while(|g| g.ch.is_whitespace())
                    .count();
            let visible = &line[..content];
            let mut advances: Vec<f32> = visible.iter().map(|g| g.advance).collect();
            let natural: f32 = advances.iter().sum();

            let line_x = if line_idx == 0 { text_x } else { para.margin_left };
            let avail = width - line_x;
            let x = match para.align {
                Align::Left | Align::Justify => line_x,
                Align::Center => line_x + (avail - natural) / 2.0,
                Align::Right => line_x + avail - natural,
            };

            let mut line_width = natural;
            if para.align == Align::Justify && !hard_end && line_idx != last {
                let spaces = visible.iter().filter(|g| g.ch == ' ').count();
                let extra = avail - natural;
                if spaces > 0 && extra > 0.0 {
                    let add = extra / spaces as f32;
                    for (adv, g) in advances.iter_mut().zip(visible) {
                        if g.ch == ' ' {
                            *adv += add;
                        }
                    }
                    line_width = avail;
                }
            }

            let mut metrics = line
                .iter()
                .map(|g| measured[g.run].metrics)
                .reduce(LineMetrics::max)
                .unwrap_or(end_metrics);

            let mut runs = Vec::new();
            if line_idx == 0 {
                if let Some((b, font, m)) = &bullet {
                    metrics = metrics.max(m.metrics);
                    runs.push(GlyphRun {
                        face: m.face,
                        text: b.ch.to_string(),
                        advances: m.advances.clone(),
                        x: first_x,
                        baseline: 0.0,
                        size: font.size,
                        color: b.color,
                        underline: false,
                    });
                }
            }

            let mut pen = x;
            let mut i = 0;
            while i < visible.len() {
                let run_idx = visible[i].run;
                let mut j = i;
                let mut glyph_run = GlyphRun {
                    face: measured[run_idx].face,
                    text: String::new(),
                    advances: Vec::new(),
                    x: pen,
                    baseline: 0.0,
                    size: para.runs[run_idx].font.size * scale,
                    color: para.runs[run_idx].color,
                    underline: para.runs[run_idx].underline,
                };
                while j < visible.len() && visible[j].run == run_idx {
                    if visible[j].ch != '\n' {
                        glyph_run.text.push(visible[j].ch);
                        glyph_run.advances.push(advances[j]);
                    }
                    pen += advances[j];
                    j += 1;
                }
                if !glyph_run.text.is_empty() {
                    runs.push(glyph_run);
                }
                i = j;
            }

            PendingLine {
                x,
                width: line_width,
                metrics,
                runs,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptx2img_core::{BodyLayout, Bullet, Insets, TextRun};

    fn font(size: f32) -> FontSpec {
        FontSpec {
            family: "Calibri".into(),
            size,
            bold: false,
            italic: false,
        }
    }

    fn para(texts: &[&str], align: Align) -> Paragraph {
        Paragraph {
            align,
            margin_left: 0.0,
            indent: 0.0,
            bullet: None,
            line_spacing: LineSpacing::default(),
            space_before: Spacing::None,
            space_after: Spacing::None,
            runs: texts
                .iter()
                .map(|t| TextRun {
                    text: t.to_string(),
                    font: font(10.0),
                    color: Color::BLACK,
                    underline: false,
                })
                .collect(),
            end_font: font(10.0),
        }
    }

    fn body(paragraphs: Vec<Paragraph>) -> TextBody {
        TextBody {
            layout: BodyLayout {
                insets: Insets {
                    left: 0.0,
                    top: 0.0,
                    right: 0.0,
                    bottom: 0.0,
                },
                ..Default::default()
            },
            paragraphs,
        }
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        let fonts = FontLibrary::empty();
        // "aaaa " is 24.5pt wide, "bbbb" is 22pt.
        let layout = layout(&body(vec![para(&["aaaa bbbb"], Align::Left)]), 30.0, 100.0, &fonts);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].runs[0].text, "aaaa");
        assert_eq!(layout.lines[1].runs[0].text, "bbbb");
        assert!((layout.lines[1].baseline - layout.lines[0].baseline - 12.0).abs() < 1e-3);
        assert!(!layout.overflows);
    }

    #[test]
    fn test_no_wrap_keeps_one_line() {
        let fonts = FontLibrary::empty();
        let mut b = body(vec![para(&["aaaa bbbb"], Align::Left)]);
        b.layout.wrap = false;
        let layout = layout(&b, 30.0, 100.0, &fonts);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.text(), "aaaa bbbb");
        assert!(layout.overflows);

        let fits = super::layout(&b, 100.0, 100.0, &fonts);
        assert!(!fits.overflows);
    }

    #[test]
    fn test_long_word_is_not_split() {
        let fonts = FontLibrary::empty();
        let layout = layout(&body(vec![para(&["aaaaaaaaaa"], Align::Left)]), 20.0, 100.0, &fonts);
        assert_eq!(layout.lines.len(), 1);
        assert!((layout.lines[0].width - 55.0).abs() < 1e-3);
        assert!(layout.overflows);
    }

    #[test]
    fn test_explicit_break_and_runs() {
        let fonts = FontLibrary::empty();
        let layout = layout(&body(vec![para(&["One", "\n", "1"], Align::Left)]), 200.0, 100.0, &fonts);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].runs[0].text, "One");
        assert_eq!(layout.lines[1].runs[0].text, "1");
    }

    #[test]
    fn test_center_and_right_alignment() {
        let fonts = FontLibrary::empty();
        let centered = layout(&body(vec![para(&["ab"], Align::Center)]), 100.0, 100.0, &fonts);
        assert!((centered.lines[0].x - 44.5).abs() < 1e-3);
        let right = layout(&body(vec![para(&["ab"], Align::Right)]), 100.0, 100.0, &fonts);
        assert!((right.lines[0].x + right.lines[0].width - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_justify_fills_all_but_last_line() {
        let fonts = FontLibrary::empty();
        let layout = layout(&body(vec![para(&["aa bb cc dd"], Align::Justify)]), 30.0, 100.0, &fonts);
        assert!(layout.lines.len() >= 2);
        assert!((layout.lines[0].width - 30.0).abs() < 1e-3);
        let last = layout.lines.last().unwrap();
        assert!(last.width < 30.0);
    }

    #[test]
    fn test_anchor_bottom_and_middle() {
        let fonts = FontLibrary::empty();
        let mut b = body(vec![para(&["a"], Align::Left)]);
        b.layout.anchor = Anchor::Bottom;
        let bottom = layout(&b, 100.0, 100.0, &fonts);
        // Line height 12, descent 2.
        assert!((bottom.lines[0].baseline - 98.0).abs() < 1e-3);
        b.layout.anchor = Anchor::Middle;
        let middle = layout(&b, 100.0, 100.0, &fonts);
        assert!((middle.lines[0].baseline - 54.0).abs() < 1e-3);
    }

    #[test]
    fn test_overflow_keeps_all_text() {
        let fonts = FontLibrary::empty();
        let paragraphs = (0..20).map(|_| para(&["line"], Align::Left)).collect();
        let layout = layout(&body(paragraphs), 100.0, 50.0, &fonts);
        assert_eq!(layout.lines.len(), 20);
        assert!(layout.height > 50.0);
        assert!(layout.overflows);
        assert_eq!(layout.text(), "line".repeat(20));
    }

    #[test]
    fn test_shrink_searches_scale() {
        let fonts = FontLibrary::empty();
        let paragraphs = (0..6).map(|_| para(&["line"], Align::Left)).collect();
        let mut b = body(paragraphs);
        b.layout.autofit = AutoFit::Shrink {
            font_scale: None,
            line_reduction: 0.0,
        };
        // Six 12pt lines need 72pt; 50pt fits at 60%.
        let layout = layout(&b, 100.0, 50.0, &fonts);
        assert!((layout.font_scale - 0.6).abs() < 1e-4);
        assert!(layout.height <= 50.0);
        assert!((layout.lines[0].runs[0].size - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_shrink_stops_at_minimum() {
        let fonts = FontLibrary::empty();
        let paragraphs = (0..100).map(|_| para(&["x"], Align::Left)).collect();
        let mut b = body(paragraphs);
        b.layout.autofit = AutoFit::Shrink {
            font_scale: None,
            line_reduction: 0.0,
        };
        let layout = layout(&b, 100.0, 10.0, &fonts);
        assert!((layout.font_scale - MIN_FONT_SCALE).abs() < 1e-4);
        assert_eq!(layout.lines.len(), 100);
    }

    #[test]
    fn test_explicit_font_scale() {
        let fonts = FontLibrary::empty();
        let mut b = body(vec![para(&["a"], Align::Left)]);
        b.layout.autofit = AutoFit::Shrink {
            font_scale: Some(0.5),
            line_reduction: 0.2,
        };
        let layout = layout(&b, 100.0, 100.0, &fonts);
        assert_eq!(layout.font_scale, 0.5);
        // 6pt line at 80%.
        assert!((layout.height - 4.8).abs() < 1e-3);
    }

    #[test]
    fn test_bullet_hangs_in_indent() {
        let fonts = FontLibrary::empty();
        let mut p = para(&["text"], Align::Left);
        p.margin_left = 20.0;
        p.indent = -20.0;
        p.bullet = Some(Bullet {
            ch: '•',
            font: font(10.0),
            color: Color::rgb(255, 0, 0),
        });
        let layout = layout(&body(vec![p]), 200.0, 100.0, &fonts);
        let runs = &layout.lines[0].runs;
        assert_eq!(runs[0].text, "•");
        assert_eq!(runs[0].x, 0.0);
        assert_eq!(runs[0].color, Color::rgb(255, 0, 0));
        assert_eq!(runs[1].x, 20.0);
    }

    #[test]
    fn test_empty_paragraph_takes_end_font_height() {
        let fonts = FontLibrary::empty();
        let mut p = para(&[], Align::Left);
        p.end_font = font(20.0);
        let layout = layout(&body(vec![p]), 100.0, 100.0, &fonts);
        assert_eq!(layout.lines.len(), 1);
        assert!((layout.height - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_spacing_skips_first_paragraph() {
        let fonts = FontLibrary::empty();
        let mut first = para(&["a"], Align::Left);
        first.space_before = Spacing::Points(30.0);
        let mut second = para(&["b"], Align::Left);
        second.space_before = Spacing::Points(6.0);
        let layout = layout(&body(vec![first, second]), 100.0, 100.0, &fonts);
        assert!((layout.lines[0].baseline - 10.0).abs() < 1e-3);
        assert!((layout.lines[1].baseline - 28.0).abs() < 1e-3);
    }

    #[test]
    fn test_insets_offset_lines() {
        let fonts = FontLibrary::empty();
        let mut b = body(vec![para(&["a"], Align::Left)]);
        b.layout.insets = Insets::default();
        let layout = layout(&b, 100.0, 100.0, &fonts);
        assert_eq!(layout.lines[0].x, 7.2);
        assert!((layout.lines[0].baseline - 13.6).abs() < 1e-3);
    }

    #[test]
    fn test_missing_family_is_reported() {
        let fonts = FontLibrary::empty();
        let layout = layout(&body(vec![para(&["a"], Align::Left)]), 100.0, 100.0, &fonts);
        assert_eq!(layout.substituted, vec!["Calibri".to_string()]);
    }
}
