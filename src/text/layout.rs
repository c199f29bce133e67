//! Turns speaker and dialogue text into positioned [`TextOp`]s.
//!
//! Layout only needs advance widths, so it runs against the [`TextMeasure`] seam; the real
//! implementation shapes with the language font, tests use a fixed-pitch stand-in.

use crate::{
    compile::{
        plan::{DrawOp, TextOp, TextPaint},
        template::{LayoutBranch, SpeakerPolicy, TemplatePlan},
    },
    config::text_props::TextProperties,
    foundation::{
        core::{Affine, Canvas, Point, Rect, Rgba8},
        error::ScreenResult,
    },
    scene::model::Lang,
    text::ruby::{RubyToken, strip_ruby, tokenize},
};

/// Size of every furigana run.
pub const FURIGANA_SIZE_PX: f32 = 15.0;
/// Slant of the intro name and title, in degrees (counter-clockwise).
pub const INTRO_SLANT_DEG: f64 = -6.25;
/// Baseline of the 1px rule under caption titles.
pub const CAPTION_RULE_Y: f64 = 430.0;

pub const SPEAKER_COLOR: Rgba8 = Rgba8::WHITE;
pub const DIALOGUE_COLOR: Rgba8 = Rgba8::opaque(0x07, 0x17, 0x26);
pub const NARRATION_COLOR: Rgba8 = Rgba8::WHITE;
pub const BOOK_COLOR: Rgba8 = Rgba8::opaque(0x41, 0x2c, 0x29);
pub const INTRO_INK: Rgba8 = Rgba8::opaque(0x33, 0x33, 0x33);

/// Advance-width oracle for a language's font.
pub trait TextMeasure {
    /// Horizontal advance of `text` set at `size_px`.
    fn advance(&mut self, lang: Lang, text: &str, size_px: f32) -> ScreenResult<f64>;
}

/// Vertical and horizontal policy for a block of body lines.
struct LineBlock {
    size_px: f32,
    line_height: f64,
    first_baseline: f64,
    /// `None` centres each line on the canvas.
    left: Option<f64>,
    color: Rgba8,
}

/// Emit speaker and body text ops for one screen, in paint order.
pub fn layout_text(
    template: &TemplatePlan,
    lang: Lang,
    speaker: &str,
    dialogue_text: &str,
    props: &TextProperties,
    canvas: Canvas,
    measure: &mut dyn TextMeasure,
) -> ScreenResult<Vec<DrawOp>> {
    let mut ops = Vec::new();
    layout_speaker(template.speaker, lang, speaker, props, canvas, measure, &mut ops)?;

    let lines: Vec<&str> = dialogue_text.split('\n').collect();
    let n = lines.len() as f64;
    let w = canvas.width_f64();

    let block = match template.layout {
        LayoutBranch::IntroTitle => {
            let title = lines
                .iter()
                .map(|l| strip_ruby(l))
                .collect::<Vec<_>>()
                .join(" ");
            if !title.is_empty() {
                let size = props.intro_title_size;
                let width = measure.advance(lang, &title, size)?;
                ops.push(DrawOp::Text(TextOp {
                    origin: Point::new(w - width - props.intro_title_x_pos, props.intro_title_y_pos),
                    transform: slant_about(w, props.intro_title_y_pos),
                    paint: TextPaint::Fill(INTRO_INK),
                    text: title,
                    lang,
                    size_px: size,
                }));
            }
            return Ok(ops);
        }
        LayoutBranch::Dialogue => LineBlock {
            size_px: props.dialogue_size,
            line_height: props.line_height,
            first_baseline: props.dialogue_y_pos,
            left: Some(props.dialogue_x_pos),
            color: DIALOGUE_COLOR,
        },
        LayoutBranch::Caption => LineBlock {
            size_px: props.caption_size,
            line_height: props.line_height,
            first_baseline: props.caption_y_pos,
            left: None,
            color: NARRATION_COLOR,
        },
        LayoutBranch::Narration => {
            let lh = props.narration_line_height;
            let block_h = f64::from(props.dialogue_size) + (n - 1.0) * lh;
            LineBlock {
                size_px: props.dialogue_size,
                line_height: lh,
                first_baseline: props.narration_y_pos - block_h / 2.0,
                left: None,
                color: NARRATION_COLOR,
            }
        }
        LayoutBranch::Book => {
            let lh = props.narration_line_height;
            LineBlock {
                size_px: props.dialogue_size,
                line_height: lh,
                first_baseline: canvas.height_f64() / 2.0 - (n - 1.0) * lh / 2.0,
                left: None,
                color: BOOK_COLOR,
            }
        }
    };

    for (i, line) in lines.iter().enumerate() {
        let y = block.first_baseline + i as f64 * block.line_height;
        layout_line(&block, lang, line, y, w, measure, &mut ops)?;
    }
    Ok(ops)
}

fn layout_speaker(
    policy: SpeakerPolicy,
    lang: Lang,
    speaker: &str,
    props: &TextProperties,
    canvas: Canvas,
    measure: &mut dyn TextMeasure,
    ops: &mut Vec<DrawOp>,
) -> ScreenResult<()> {
    let w = canvas.width_f64();
    match policy {
        SpeakerPolicy::Suppressed => {}
        SpeakerPolicy::Horizontal => {
            if !speaker.is_empty() {
                ops.push(DrawOp::Text(TextOp {
                    text: speaker.to_string(),
                    lang,
                    size_px: props.name_size,
                    origin: Point::new(props.speaker_x_pos, props.speaker_y_pos),
                    transform: Affine::IDENTITY,
                    paint: TextPaint::Fill(SPEAKER_COLOR),
                }));
            }
        }
        SpeakerPolicy::CenteredTitle => {
            if !speaker.is_empty() {
                let width = measure.advance(lang, speaker, props.title_size)?;
                ops.push(DrawOp::Text(TextOp {
                    text: speaker.to_string(),
                    lang,
                    size_px: props.title_size,
                    origin: Point::new((w - width) / 2.0, props.title_y_pos),
                    transform: Affine::IDENTITY,
                    paint: TextPaint::Fill(SPEAKER_COLOR),
                }));
            }
            ops.push(DrawOp::FillRect {
                rect: Rect::new(0.0, CAPTION_RULE_Y, w, CAPTION_RULE_Y + 1.0),
                color: SPEAKER_COLOR,
            });
        }
        SpeakerPolicy::Slanted => {
            if !speaker.is_empty() {
                let width = measure.advance(lang, speaker, props.intro_name_size)?;
                ops.push(DrawOp::Text(TextOp {
                    text: speaker.to_string(),
                    lang,
                    size_px: props.intro_name_size,
                    origin: Point::new(w - width - props.intro_x_pos, props.intro_name_y_pos),
                    transform: slant_about(w, props.intro_name_y_pos),
                    paint: TextPaint::StrokeThenFill {
                        stroke: INTRO_INK,
                        width: 8.0,
                        miter_limit: 2.0,
                        fill: Rgba8::WHITE,
                    },
                }));
            }
        }
    }
    Ok(())
}

// Furigana ops precede the line they annotate.
fn layout_line(
    block: &LineBlock,
    lang: Lang,
    line: &str,
    baseline: f64,
    canvas_w: f64,
    measure: &mut dyn TextMeasure,
    ops: &mut Vec<DrawOp>,
) -> ScreenResult<()> {
    let tokens = tokenize(line);
    let stripped: String = tokens.iter().map(RubyToken::base_text).collect();
    if stripped.is_empty() {
        return Ok(());
    }

    let x = match block.left {
        Some(x) => x,
        None => (canvas_w - measure.advance(lang, &stripped, block.size_px)?) / 2.0,
    };

    let mut prefix = String::new();
    for token in &tokens {
        if let RubyToken::RubyRun { base, furigana } = *token {
            let before = measure.advance(lang, &prefix, block.size_px)?;
            let base_w = measure.advance(lang, base, block.size_px)?;
            let ruby_w = measure.advance(lang, furigana, FURIGANA_SIZE_PX)?;
            let center = x + before + base_w / 2.0;
            ops.push(DrawOp::Text(TextOp {
                text: furigana.to_string(),
                lang,
                size_px: FURIGANA_SIZE_PX,
                origin: Point::new(
                    center - ruby_w / 2.0,
                    baseline - f64::from(block.size_px) + 2.0,
                ),
                transform: Affine::IDENTITY,
                paint: TextPaint::Fill(block.color),
            }));
        }
        prefix.push_str(token.base_text());
    }

    ops.push(DrawOp::Text(TextOp {
        text: stripped,
        lang,
        size_px: block.size_px,
        origin: Point::new(x, baseline),
        transform: Affine::IDENTITY,
        paint: TextPaint::Fill(block.color),
    }));
    Ok(())
}

fn slant_about(x: f64, y: f64) -> Affine {
    Affine::rotate_about(INTRO_SLANT_DEG.to_radians(), Point::new(x, y))
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
