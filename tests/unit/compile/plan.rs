use std::io::Cursor;

use super::*;
use crate::{
    assets::{decode::decode_texture, source::MemorySource},
    compile::template::template_texture_keys,
    foundation::error::ScreenError,
    scene::model::{DialogueType, Emotion, EmotionSide, Settings},
    text::layout::TextMeasure,
};

struct Mono;

impl TextMeasure for Mono {
    fn advance(&mut self, _lang: Lang, text: &str, size_px: f32) -> ScreenResult<f64> {
        Ok(text.chars().count() as f64 * f64::from(size_px) * 0.5)
    }
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 100, 50, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn templates() -> TextureCache {
    let mut src = MemorySource::new();
    for key in template_texture_keys() {
        src.insert(format!("images/{key}.png"), png_bytes(2, 2));
    }
    src.insert("images/heart_r.png", png_bytes(40, 30));
    TextureCache::new(Arc::new(src))
}

fn layer_texture(w: u32, h: u32) -> Arc<Texture> {
    Arc::new(decode_texture(&png_bytes(w, h)).unwrap())
}

fn scene(t: DialogueType, lang: Lang, layers: Vec<Layer>) -> Scene {
    Scene {
        layers,
        settings: Settings {
            speaker: "Euden".into(),
            dialogue_text: "Hi".into(),
            dialogue_type: t,
            font: lang,
            ..Settings::default()
        },
    }
}

fn compile(scene: &Scene, textures: &[Arc<Texture>], cache: &TextureCache) -> ScreenResult<ScreenPlan> {
    let props = TextPropertiesTable::builtin().unwrap();
    compile_screen(scene, textures, cache, &props, &mut Mono)
}

fn image_op(op: &DrawOp) -> (&Arc<Texture>, Affine, f32, Option<DropShadow>) {
    match op {
        DrawOp::Image {
            texture,
            transform,
            opacity,
            shadow,
        } => (texture, *transform, *opacity, *shadow),
        other => panic!("expected image op, got {other:?}"),
    }
}

#[test]
fn dialogue_paints_layers_then_bar_then_text() {
    let cache = templates();
    let layers = vec![Layer::new("bg"), Layer::new("portrait")];
    let textures = vec![layer_texture(8, 8), layer_texture(4, 6)];
    let plan = compile(&scene(DialogueType::Dialogue, Lang::En, layers), &textures, &cache).unwrap();

    assert_eq!(plan.canvas, Canvas::DIALOGUE);
    assert_eq!(plan.ops.len(), 5);
    assert!(Arc::ptr_eq(image_op(&plan.ops[0]).0, &textures[0]));
    assert!(Arc::ptr_eq(image_op(&plan.ops[1]).0, &textures[1]));
    let (bar, transform, opacity, shadow) = image_op(&plan.ops[2]);
    assert!(Arc::ptr_eq(bar, &cache.load("bar").unwrap()));
    assert_eq!(transform, Affine::IDENTITY);
    assert_eq!(opacity, 1.0);
    assert!(shadow.is_none());
    assert!(matches!(plan.ops[3], DrawOp::Text(_)));
    assert!(matches!(plan.ops[4], DrawOp::Text(_)));
}

#[test]
fn zero_layers_still_draws_template_and_text() {
    let cache = templates();
    let plan = compile(&scene(DialogueType::Dialogue, Lang::En, vec![]), &[], &cache).unwrap();
    assert_eq!(plan.ops.len(), 3);
    assert!(Arc::ptr_eq(image_op(&plan.ops[0]).0, &cache.load("bar").unwrap()));
}

#[test]
fn non_english_adds_skip_overlay_after_bar() {
    let cache = templates();
    let plan = compile(&scene(DialogueType::Dialogue, Lang::Ja, vec![]), &[], &cache).unwrap();
    assert!(Arc::ptr_eq(image_op(&plan.ops[0]).0, &cache.load("bar").unwrap()));
    assert!(Arc::ptr_eq(image_op(&plan.ops[1]).0, &cache.load("skip_ja").unwrap()));
    match &plan.ops[2] {
        DrawOp::Text(t) => assert_eq!(t.lang, Lang::Ja),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn intro_shadows_first_portrait_only() {
    let cache = templates();
    let mut bg = Layer::new("bg");
    bg.kind = LayerKind::Background;
    let layers = vec![bg, Layer::new("p1"), Layer::new("p2")];
    let textures = vec![layer_texture(2, 2), layer_texture(2, 2), layer_texture(2, 2)];
    let plan = compile(&scene(DialogueType::Intro, Lang::En, layers), &textures, &cache).unwrap();

    assert!(Arc::ptr_eq(image_op(&plan.ops[0]).0, &cache.load("introBack").unwrap()));
    assert_eq!(image_op(&plan.ops[1]).3, None);
    assert_eq!(image_op(&plan.ops[2]).3, Some(DropShadow::INTRO));
    assert_eq!(image_op(&plan.ops[3]).3, None);
    assert!(Arc::ptr_eq(image_op(&plan.ops[4]).0, &cache.load("introBar").unwrap()));
}

#[test]
fn layer_opacity_and_transform_are_carried() {
    let cache = templates();
    let layer = Layer {
        opacity: 0.5,
        offset_y: 120.0,
        ..Layer::new("p")
    };
    let textures = vec![layer_texture(10, 20)];
    let plan = compile(&scene(DialogueType::Dialogue, Lang::En, vec![layer]), &textures, &cache).unwrap();
    let (_, transform, opacity, _) = image_op(&plan.ops[0]);
    assert_eq!(opacity, 0.5);
    assert_eq!(transform * Point::ZERO, Point::new(370.0, 667.0 - 120.0 - 10.0));
}

#[test]
fn emotion_balloon_drawn_before_bar() {
    let cache = templates();
    let mut s = scene(DialogueType::Dialogue, Lang::En, vec![]);
    s.settings.emotion = Emotion::Heart;
    s.settings.emotion_side = EmotionSide::Right;
    s.settings.emotion_offset_x = 10.0;
    s.settings.emotion_offset_y = 5.0;
    let plan = compile(&s, &[], &cache).unwrap();

    let (balloon, transform, _, _) = image_op(&plan.ops[0]);
    assert!(Arc::ptr_eq(balloon, &cache.load("heart_r").unwrap()));
    // 40x30 balloon centred on (570 + 10, 250 - 5).
    assert_eq!(transform * Point::ZERO, Point::new(560.0, 230.0));
    assert!(Arc::ptr_eq(image_op(&plan.ops[1]).0, &cache.load("bar").unwrap()));
}

#[test]
fn missing_template_texture_fails_the_render() {
    let cache = TextureCache::new(Arc::new(MemorySource::new()));
    let err = compile(&scene(DialogueType::Book, Lang::En, vec![]), &[], &cache).unwrap_err();
    assert!(matches!(err, ScreenError::AssetLoad { key, .. } if key == "book"));
}

#[test]
fn missing_text_properties_is_a_config_error() {
    let cache = templates();
    let props = TextPropertiesTable::default();
    let err = compile_screen(
        &scene(DialogueType::Dialogue, Lang::En, vec![]),
        &[],
        &cache,
        &props,
        &mut Mono,
    )
    .unwrap_err();
    assert!(matches!(err, ScreenError::Config(_)));
}

#[test]
fn texture_count_must_match_layers() {
    let cache = templates();
    let s = scene(DialogueType::Dialogue, Lang::En, vec![Layer::new("a")]);
    let err = compile(&s, &[], &cache).unwrap_err();
    assert!(matches!(err, ScreenError::Validation(_)));
}

#[test]
fn invalid_layer_is_rejected_before_loading() {
    let cache = templates();
    let layer = Layer {
        scale: 0.0,
        ..Layer::new("a")
    };
    let s = scene(DialogueType::Dialogue, Lang::En, vec![layer]);
    let err = compile(&s, &[layer_texture(1, 1)], &cache).unwrap_err();
    assert!(matches!(err, ScreenError::Validation(_)));
    assert_eq!(cache.decode_count(), 0);
}
