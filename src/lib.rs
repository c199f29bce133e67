//! Deterministic renderer for game-style dialogue screens.
//!
//! A [`Scene`] (ordered image layers plus [`Settings`]) is composited onto a fixed 750x1334
//! canvas together with a template frame chosen by [`DialogueType`], then the speaker and
//! dialogue text are laid out with inline ruby annotations and the result is encoded as PNG.
//!
//! - Build a [`Renderer`] once from [`RendererOpts`] (or [`Renderer::from_parts`])
//! - Call [`Renderer::render`] per request; it takes `&self` and is safe to share
//! - Use [`Renderer::plan`] to inspect the draw list without painting
#![forbid(unsafe_code)]

mod assets;
mod compile;
mod config;
mod foundation;
mod render;
mod scene;
mod text;

pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ScreenError, ScreenResult};

pub use crate::assets::decode::{Texture, decode_texture};
pub use crate::assets::source::{ByteSource, DirSource, MemorySource, normalize_rel_path};
pub use crate::assets::texture_cache::TextureCache;
pub use crate::compile::compositor::{emotion_anchor, layer_transform};
pub use crate::compile::plan::{
    DrawOp, DropShadow, EMOTION_EDGE_X, EMOTION_Y, ScreenPlan, TextOp, TextPaint, compile_screen,
};
pub use crate::compile::template::{
    BarAsset, LayoutBranch, SpeakerPolicy, TemplatePlan, select_template, template_texture_keys,
};
pub use crate::config::opts::RendererOpts;
pub use crate::config::text_props::{TextProperties, TextPropertiesTable};
pub use crate::render::cpu::{FrameRGBA, paint_plan};
pub use crate::render::encode::{EncodedImage, encode_png};
pub use crate::render::fonts::{FontBook, FontFiles, FontPool};
pub use crate::render::pipeline::{LayerFetch, Renderer};
pub use crate::scene::model::{
    DialogueType, Emotion, EmotionSide, Lang, Layer, LayerKind, Scene, Settings,
};
pub use crate::scene::request::{RequestDefaults, SceneRequest};
pub use crate::text::layout::{FURIGANA_SIZE_PX, TextMeasure, layout_text};
pub use crate::text::ruby::{RubyToken, strip_ruby, tokenize};
