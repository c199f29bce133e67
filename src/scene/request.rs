//! Request glue: flat, query-style parameters to a [`Scene`].
//!
//! Mirrors the query parameters of the screen-render web route. It only fills in defaults;
//! resolving a character name to a portrait id is left to the caller.

use crate::{
    foundation::error::ScreenResult,
    scene::model::{DialogueType, Emotion, EmotionSide, Lang, Layer, LayerKind, Scene, Settings},
};

/// Default placements and references used when a request leaves them out.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestDefaults {
    /// Background reference used when no `bg` is given.
    pub background: String,
    /// Portrait reference template; `{id}` is replaced with the character id.
    pub portrait_template: String,
    /// Character id used when the request names none.
    pub character_id: String,
    /// Default vertical offset of the background layer.
    pub background_offset_y: f64,
    /// Default vertical offset of the portrait layer.
    pub portrait_offset_y: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            background: "backgrounds/Sty_bg_0024_100_00.png".to_string(),
            portrait_template: "portraits/{id}/{id}_base.png".to_string(),
            character_id: "100001_01".to_string(),
            background_offset_y: 155.0,
            portrait_offset_y: 120.0,
        }
    }
}

/// Flat request parameters, named after the web route's query keys.
///
/// Every placement override *replaces* its default; nothing is added on top of a default.
#[derive(Clone, Debug, Default, PartialEq, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneRequest {
    /// Dialogue type (`dialogue`, `intro`, `caption`, `narration`, `full`, `book`).
    #[arg(long = "type", default_value = "dialogue")]
    #[serde(rename = "type")]
    pub dialogue_type: String,
    /// Speaker name.
    #[arg(long)]
    pub name: String,
    /// Dialogue text; `\n` breaks lines, `(base){ruby}` annotates.
    #[arg(long)]
    pub text: String,

    /// Font / language (`en`, `ja`, `zh_tw`, `zh_cn`).
    #[arg(long)]
    pub f: Option<String>,
    /// Emotion balloon name.
    #[arg(long)]
    pub e: Option<String>,
    /// Emotion side (`l` or `r`).
    #[arg(long)]
    pub es: Option<String>,
    /// Emotion x offset.
    #[arg(long, allow_hyphen_values = true)]
    pub ex: Option<f64>,
    /// Emotion y offset.
    #[arg(long, allow_hyphen_values = true)]
    pub ey: Option<f64>,

    /// Omit the background layer entirely.
    #[arg(long)]
    pub nobg: bool,
    /// Background image reference.
    #[arg(long)]
    pub bg: Option<String>,
    /// Background x offset.
    #[arg(long, allow_hyphen_values = true)]
    pub bgx: Option<f64>,
    /// Background y offset (replaces the default).
    #[arg(long, allow_hyphen_values = true)]
    pub bgy: Option<f64>,
    /// Background rotation in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub bgr: Option<f64>,
    /// Background scale.
    #[arg(long)]
    pub bgs: Option<f64>,
    /// Background opacity.
    #[arg(long)]
    pub bgo: Option<f64>,
    /// Mirror the background.
    #[arg(long)]
    pub bgflipx: bool,

    /// Portrait image reference (overrides `id`).
    #[arg(long)]
    pub src: Option<String>,
    /// Character id used to build the portrait reference.
    #[arg(long)]
    pub id: Option<String>,
    /// Portrait x offset.
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<f64>,
    /// Portrait y offset (replaces the default).
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<f64>,
    /// Portrait rotation in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub r: Option<f64>,
    /// Portrait scale.
    #[arg(long)]
    pub s: Option<f64>,
    /// Portrait opacity.
    #[arg(long)]
    pub o: Option<f64>,
    /// Mirror the portrait.
    #[arg(long)]
    pub flipx: bool,
}

impl SceneRequest {
    /// Build a validated [`Scene`] from the request and `defaults`.
    pub fn into_scene(self, defaults: &RequestDefaults) -> ScreenResult<Scene> {
        let mut layers = Vec::with_capacity(2);

        if !self.nobg {
            layers.push(Layer {
                image: self
                    .bg
                    .clone()
                    .unwrap_or_else(|| defaults.background.clone()),
                offset_x: self.bgx.unwrap_or(0.0),
                offset_y: self.bgy.unwrap_or(defaults.background_offset_y),
                rotation: self.bgr.unwrap_or(0.0),
                scale: self.bgs.unwrap_or(1.0),
                opacity: self.bgo.unwrap_or(1.0),
                flip_x: self.bgflipx,
                kind: LayerKind::Background,
            });
        }

        let portrait = match &self.src {
            Some(src) => src.clone(),
            None => {
                let id = self.id.as_deref().unwrap_or(&defaults.character_id);
                defaults.portrait_template.replace("{id}", id)
            }
        };
        layers.push(Layer {
            image: portrait,
            offset_x: self.x.unwrap_or(0.0),
            offset_y: self.y.unwrap_or(defaults.portrait_offset_y),
            rotation: self.r.unwrap_or(0.0),
            scale: self.s.unwrap_or(1.0),
            opacity: self.o.unwrap_or(1.0),
            flip_x: self.flipx,
            kind: LayerKind::Portrait,
        });

        let settings = Settings {
            speaker: self.name,
            dialogue_text: self.text,
            dialogue_type: DialogueType::parse_lossy(&self.dialogue_type),
            font: self.f.as_deref().map(Lang::parse_lossy).unwrap_or_default(),
            emotion: self
                .e
                .as_deref()
                .map(Emotion::parse_lossy)
                .unwrap_or_default(),
            emotion_side: self
                .es
                .as_deref()
                .map(EmotionSide::parse_lossy)
                .unwrap_or_default(),
            emotion_offset_x: self.ex.unwrap_or(0.0),
            emotion_offset_y: self.ey.unwrap_or(0.0),
        };

        let scene = Scene { layers, settings };
        scene.validate()?;
        Ok(scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/request.rs"]
mod tests;
