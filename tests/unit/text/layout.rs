use super::*;
use crate::{compile::template::select_template, scene::model::DialogueType};

/// Every char advances half the font size.
struct Mono;

impl TextMeasure for Mono {
    fn advance(&mut self, _lang: Lang, text: &str, size_px: f32) -> ScreenResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(size_px) * 0.5)
    }
}

fn props() -> TextProperties {
    TextProperties {
        name_size: 34.0,
        title_size: 40.0,
        title_y_pos: 400.0,
        speaker_x_pos: 60.0,
        speaker_y_pos: 1010.0,
        dialogue_size: 30.0,
        dialogue_x_pos: 60.0,
        dialogue_y_pos: 1080.0,
        line_height: 44.0,
        caption_size: 30.0,
        caption_y_pos: 500.0,
        narration_line_height: 50.0,
        narration_y_pos: 667.0,
        intro_name_size: 86.0,
        intro_name_y_pos: 1050.0,
        intro_x_pos: 48.0,
        intro_title_size: 38.0,
        intro_title_y_pos: 1130.0,
        intro_title_x_pos: 48.0,
    }
}

fn layout(t: DialogueType, speaker: &str, text: &str) -> Vec<DrawOp> {
    layout_text(
        &select_template(t),
        Lang::En,
        speaker,
        text,
        &props(),
        Canvas::DIALOGUE,
        &mut Mono,
    )
    .unwrap()
}

fn text(op: &DrawOp) -> &TextOp {
    match op {
        DrawOp::Text(t) => t,
        other => panic!("expected text op, got {other:?}"),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn dialogue_with_furigana() {
    let ops = layout(
        DialogueType::Dialogue,
        "Euden",
        "Hello(世界){せかい}!\nSecond line.",
    );
    assert_eq!(ops.len(), 4);

    let speaker = text(&ops[0]);
    assert_eq!(speaker.text, "Euden");
    assert_eq!(speaker.size_px, 34.0);
    assert_eq!(speaker.origin, Point::new(60.0, 1010.0));
    assert_eq!(speaker.paint, TextPaint::Fill(SPEAKER_COLOR));

    // Centred over 世界: 60 + 5*15 + (2*15)/2 = 150, minus half of 3*7.5.
    let ruby = text(&ops[1]);
    assert_eq!(ruby.text, "せかい");
    assert_eq!(ruby.size_px, FURIGANA_SIZE_PX);
    assert!(approx(ruby.origin.x, 150.0 - 11.25));
    assert!(approx(ruby.origin.y, 1080.0 - 30.0 + 2.0));

    let first = text(&ops[2]);
    assert_eq!(first.text, "Hello世界!");
    assert_eq!(first.origin, Point::new(60.0, 1080.0));
    assert_eq!(first.paint, TextPaint::Fill(DIALOGUE_COLOR));

    let second = text(&ops[3]);
    assert_eq!(second.text, "Second line.");
    assert_eq!(second.origin, Point::new(60.0, 1124.0));
}

#[test]
fn empty_speaker_draws_nothing_for_dialogue() {
    let ops = layout(DialogueType::Dialogue, "", "Hi");
    assert_eq!(ops.len(), 1);
    assert_eq!(text(&ops[0]).text, "Hi");
}

#[test]
fn empty_lines_keep_their_slot() {
    let ops = layout(DialogueType::Dialogue, "", "a\n\nb");
    assert_eq!(ops.len(), 2);
    assert_eq!(text(&ops[1]).origin.y, 1080.0 + 2.0 * 44.0);
}

#[test]
fn narration_block_is_vertically_centred() {
    for t in [DialogueType::Narration, DialogueType::Full] {
        let ops = layout(t, "ignored", "abcd\nx\ny");
        assert_eq!(ops.len(), 3, "speaker is suppressed for {t}");
        let first = text(&ops[0]);
        assert_eq!(first.origin.y, 667.0 - (30.0 + 2.0 * 50.0) / 2.0);
        assert_eq!(first.origin.x, (750.0 - 4.0 * 15.0) / 2.0);
        assert_eq!(first.paint, TextPaint::Fill(NARRATION_COLOR));
        assert_eq!(text(&ops[2]).origin.y, 602.0 + 100.0);
    }
}

#[test]
fn book_block_centres_on_canvas() {
    let ops = layout(DialogueType::Book, "", "a\nb\nc");
    assert_eq!(ops.len(), 3);
    assert_eq!(text(&ops[0]).origin.y, 667.0 - 50.0);
    assert_eq!(text(&ops[0]).paint, TextPaint::Fill(BOOK_COLOR));
}

#[test]
fn caption_title_rule_and_centred_body() {
    let ops = layout(DialogueType::Caption, "Title", "(漢字){かんじ}ab");
    assert_eq!(ops.len(), 4);

    let title = text(&ops[0]);
    assert_eq!(title.origin, Point::new((750.0 - 5.0 * 20.0) / 2.0, 400.0));
    assert_eq!(title.size_px, 40.0);

    match &ops[1] {
        DrawOp::FillRect { rect, color } => {
            assert_eq!(*rect, Rect::new(0.0, 430.0, 750.0, 431.0));
            assert_eq!(*color, Rgba8::WHITE);
        }
        other => panic!("expected rule, got {other:?}"),
    }

    // Centred on the stripped width, not the marked-up one.
    let body = text(&ops[3]);
    assert_eq!(body.text, "漢字ab");
    assert_eq!(body.origin, Point::new((750.0 - 4.0 * 15.0) / 2.0, 500.0));
    let ruby = text(&ops[2]);
    assert!(approx(ruby.origin.x, 345.0 + 15.0 - 3.0 * 7.5 / 2.0));
}

#[test]
fn caption_rule_is_drawn_without_title() {
    let ops = layout(DialogueType::Caption, "", "");
    assert_eq!(ops.len(), 1);
    assert!(matches!(ops[0], DrawOp::FillRect { .. }));
}

#[test]
fn intro_name_and_title_are_slanted_and_right_aligned() {
    let ops = layout(DialogueType::Intro, "Euden", "The (Prince){P}\nof Alberia");
    assert_eq!(ops.len(), 2);

    let name = text(&ops[0]);
    assert_eq!(name.origin, Point::new(750.0 - 5.0 * 43.0 - 48.0, 1050.0));
    assert_eq!(
        name.paint,
        TextPaint::StrokeThenFill {
            stroke: INTRO_INK,
            width: 8.0,
            miter_limit: 2.0,
            fill: Rgba8::WHITE,
        }
    );
    // The pivot is a fixed point of the slant.
    let pivot = name.transform * Point::new(750.0, 1050.0);
    assert!(approx(pivot.x, 750.0) && approx(pivot.y, 1050.0));
    let sample = name.transform * Point::new(650.0, 1050.0);
    assert!(sample.y > 1050.0, "left end dips below the pivot: {sample:?}");

    let title = text(&ops[1]);
    assert_eq!(title.text, "The Prince of Alberia");
    assert_eq!(title.origin, Point::new(750.0 - 21.0 * 19.0 - 48.0, 1130.0));
    assert_eq!(title.paint, TextPaint::Fill(INTRO_INK));
}

#[test]
fn measure_errors_propagate() {
    struct Broken;
    impl TextMeasure for Broken {
        fn advance(&mut self, lang: Lang, _: &str, _: f32) -> ScreenResult<f64> {
            Err(crate::foundation::error::ScreenError::config(format!(
                "no font for {lang}"
            )))
        }
    }
    let err = layout_text(
        &select_template(DialogueType::Narration),
        Lang::Ja,
        "",
        "x",
        &props(),
        Canvas::DIALOGUE,
        &mut Broken,
    )
    .unwrap_err();
    assert!(err.to_string().contains("no font for ja"));
}
