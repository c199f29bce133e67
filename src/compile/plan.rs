use std::sync::Arc;

use crate::{
    assets::{decode::Texture, texture_cache::TextureCache},
    compile::{
        compositor::{emotion_anchor, layer_transform},
        template::select_template,
    },
    config::text_props::TextPropertiesTable,
    foundation::{
        core::{Affine, Canvas, Point, Rect, Rgba8, Vec2},
        error::{ScreenError, ScreenResult},
    },
    scene::model::{Lang, Layer, LayerKind, Scene},
    text::layout::{TextMeasure, layout_text},
};

#[derive(Clone, Debug)]
/// Backend-agnostic draw list for a single screen.
///
/// Ops are painted in order onto a transparent canvas of `canvas` size.
pub struct ScreenPlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug)]
/// Draw operation emitted by [`compile_screen`].
pub enum DrawOp {
    /// Texture mapped from its own pixel space through `transform`.
    Image {
        texture: Arc<Texture>,
        transform: Affine,
        opacity: f32,
        shadow: Option<DropShadow>,
    },
    FillRect {
        rect: Rect,
        color: Rgba8,
    },
    Text(TextOp),
}

/// Hard, unblurred shadow painted under an image with the image's own transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropShadow {
    /// Device-space offset.
    pub offset: Vec2,
    pub color: Rgba8,
}

impl DropShadow {
    /// Shadow cast by the intro portrait.
    pub const INTRO: DropShadow = DropShadow {
        offset: Vec2::new(20.0, 20.0),
        color: Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 64,
        },
    };
}

/// A single run of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub text: String,
    /// Selects the font.
    pub lang: Lang,
    pub size_px: f32,
    /// Left end of the baseline, before `transform`.
    pub origin: Point,
    /// Applied after positioning; identity except for slanted text.
    pub transform: Affine,
    pub paint: TextPaint,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextPaint {
    Fill(Rgba8),
    /// Outline first, then fill on top.
    StrokeThenFill {
        stroke: Rgba8,
        width: f64,
        miter_limit: f64,
        fill: Rgba8,
    },
}

/// Horizontal distance of the emotion balloon anchor from its side of the canvas.
pub const EMOTION_EDGE_X: f64 = 180.0;
/// Vertical position of the emotion balloon anchor.
pub const EMOTION_Y: f64 = 250.0;

/// Compile `scene` into a draw list.
///
/// `layer_textures[i]` is the decoded image of `scene.layers[i]`. Template textures are pulled
/// from `templates`; text is measured with `measure`.
#[tracing::instrument(level = "debug", skip_all, fields(dialogue_type = %scene.settings.dialogue_type, layers = scene.layers.len()))]
pub fn compile_screen(
    scene: &Scene,
    layer_textures: &[Arc<Texture>],
    templates: &TextureCache,
    props: &TextPropertiesTable,
    measure: &mut dyn TextMeasure,
) -> ScreenResult<ScreenPlan> {
    scene.validate()?;
    if layer_textures.len() != scene.layers.len() {
        return Err(ScreenError::validation(format!(
            "got {} layer textures for {} layers",
            layer_textures.len(),
            scene.layers.len()
        )));
    }

    let canvas = Canvas::DIALOGUE;
    let settings = &scene.settings;
    let lang = settings.font;
    let template = select_template(settings.dialogue_type);
    let text_props = props.get(lang)?;

    let mut ops = Vec::with_capacity(scene.layers.len() + 8);

    if let Some(key) = template.background {
        push_fullscreen(&mut ops, templates.load(key)?);
    }

    let mut shadow_pending = template.portrait_shadow;
    for (layer, texture) in scene.layers.iter().zip(layer_textures) {
        let shadow = if shadow_pending && layer.kind == LayerKind::Portrait {
            shadow_pending = false;
            Some(DropShadow::INTRO)
        } else {
            None
        };
        ops.push(DrawOp::Image {
            transform: layer_transform(layer, texture.size(), canvas.center()),
            opacity: layer.alpha(),
            texture: texture.clone(),
            shadow,
        });
    }

    if let Some(key) = settings.emotion.texture_key(settings.emotion_side) {
        let texture = templates.load(&key)?;
        let balloon = Layer {
            offset_x: settings.emotion_offset_x,
            offset_y: settings.emotion_offset_y,
            ..Layer::new(key)
        };
        ops.push(DrawOp::Image {
            transform: layer_transform(
                &balloon,
                texture.size(),
                emotion_anchor(settings.emotion_side, canvas),
            ),
            opacity: 1.0,
            texture,
            shadow: None,
        });
    }

    push_fullscreen(&mut ops, templates.load(&template.bar_key(lang))?);
    if lang != Lang::En {
        push_fullscreen(&mut ops, templates.load(&lang.skip_texture_key())?);
    }

    ops.extend(layout_text(
        &template,
        lang,
        &settings.speaker,
        &settings.dialogue_text,
        text_props,
        canvas,
        measure,
    )?);

    Ok(ScreenPlan { canvas, ops })
}

// Template art is authored at canvas size and drawn at the origin unscaled.
fn push_fullscreen(ops: &mut Vec<DrawOp>, texture: Arc<Texture>) {
    ops.push(DrawOp::Image {
        texture,
        transform: Affine::IDENTITY,
        opacity: 1.0,
        shadow: None,
    });
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
