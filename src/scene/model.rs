use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ScreenError, ScreenResult};

/// Declares a closed, string-backed enum whose unknown values fall back to a default.
///
/// Upstream validation is expected but not trusted: any value outside the set is logged and
/// replaced with the declared default instead of failing the render.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default = $default:ident, kind = $kind:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $canon:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Every member of the closed set, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $canon,)+
                }
            }

            /// Strict parse; `None` for values outside the set.
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim() {
                    $($canon $(| $alias)* => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Parse, substituting the default for anything unrecognized.
            pub fn parse_lossy(s: &str) -> Self {
                Self::parse(s).unwrap_or_else(|| {
                    let fallback = Self::default();
                    tracing::warn!(
                        kind = $kind,
                        value = s,
                        fallback = fallback.as_str(),
                        "unrecognized value, using default"
                    );
                    fallback
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::parse_lossy(&s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Screen template family.
    pub enum DialogueType(default = Dialogue, kind = "dialogueType") {
        /// Portrait with a speaker bar at the bottom.
        Dialogue => "dialogue",
        /// Character introduction with slanted name and title.
        Intro => "intro",
        /// Centred caption with a title line.
        Caption => "caption",
        /// Centred narration over the caption frame.
        Narration => "narration",
        /// Centred narration over the full-screen frame.
        Full => "full",
        /// Book page, text centred about mid-height.
        Book => "book",
    }
}

closed_enum! {
    /// Font / localisation selector. Each language has its own font and text properties.
    pub enum Lang(default = En, kind = "font") {
        /// English.
        En => "en",
        /// Japanese.
        Ja => "ja",
        /// Traditional Chinese.
        ZhTw => "zh_tw",
        /// Simplified Chinese.
        ZhCn => "zh_cn",
    }
}

closed_enum! {
    /// Emotion balloon drawn next to the portrait.
    pub enum Emotion(default = None, kind = "emotion") {
        /// No balloon.
        None => "none",
        /// Anger mark.
        Anger => "anger",
        /// Gloom.
        Bad => "bad",
        /// Exclamation mark.
        Exclamation => "exclamation",
        /// Heart.
        Heart => "heart",
        /// Light bulb.
        Inspiration => "inspiration",
        /// Music note.
        Note => "note",
        /// Notice lines.
        Notice => "notice",
        /// Question mark.
        Question => "question",
        /// Sleep bubble.
        Sleep => "sleep",
        /// Sweat drop.
        Sweat => "sweat",
    }
}

closed_enum! {
    /// Which side of the screen the emotion balloon is anchored to.
    pub enum EmotionSide(default = Left, kind = "emotionSide") {
        /// Anchored near the left edge.
        Left => "l" | "left",
        /// Anchored near the right edge.
        Right => "r" | "right",
    }
}

closed_enum! {
    /// Role of a layer in the scene.
    pub enum LayerKind(default = Portrait, kind = "layer kind") {
        /// Backdrop image; never receives the intro drop shadow.
        Background => "background" | "bg",
        /// Character portrait.
        Portrait => "portrait",
    }
}

impl Lang {
    /// Key of the language-specific skip button texture.
    pub fn skip_texture_key(self) -> String {
        format!("skip_{}", self.as_str())
    }
}

impl Emotion {
    /// Texture key of the balloon for `side`, or `None` when no balloon is drawn.
    pub fn texture_key(self, side: EmotionSide) -> Option<String> {
        match self {
            Emotion::None => None,
            e => Some(format!("{}_{}", e.as_str(), side.as_str())),
        }
    }
}

fn default_one() -> f64 {
    1.0
}

/// One positioned, transformed image composited into the scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Opaque reference resolved by the layer [`ByteSource`](crate::ByteSource).
    pub image: String,
    /// Horizontal offset from the canvas centre in pixels.
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical offset from the canvas centre in pixels; positive moves up.
    #[serde(default)]
    pub offset_y: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Uniform scale applied to the intrinsic image size; must be > 0.
    #[serde(default = "default_one")]
    pub scale: f64,
    /// Layer alpha in `[0, 1]`.
    #[serde(default = "default_one")]
    pub opacity: f64,
    /// Mirror horizontally about the pivot.
    #[serde(default)]
    pub flip_x: bool,
    /// Layer role.
    #[serde(default)]
    pub kind: LayerKind,
}

impl Layer {
    /// An untransformed, fully opaque portrait layer.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
            flip_x: false,
            kind: LayerKind::Portrait,
        }
    }

    pub fn validate(&self) -> ScreenResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ScreenError::validation(format!(
                "layer '{}' scale must be finite and > 0 (got {})",
                self.image, self.scale
            )));
        }
        for (name, v) in [
            ("offsetX", self.offset_x),
            ("offsetY", self.offset_y),
            ("rotation", self.rotation),
            ("opacity", self.opacity),
        ] {
            if !v.is_finite() {
                return Err(ScreenError::validation(format!(
                    "layer '{}' {name} must be finite",
                    self.image
                )));
            }
        }
        Ok(())
    }

    /// Opacity clamped to `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0) as f32
    }
}

/// Typed render settings for one screen.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Speaker label.
    #[serde(default)]
    pub speaker: String,
    /// Dialogue body; `\n` separates lines and `(base){ruby}` annotates.
    #[serde(default)]
    pub dialogue_text: String,
    #[serde(default)]
    pub dialogue_type: DialogueType,
    #[serde(default)]
    pub font: Lang,
    #[serde(default)]
    pub emotion: Emotion,
    #[serde(default)]
    pub emotion_side: EmotionSide,
    #[serde(default)]
    pub emotion_offset_x: f64,
    #[serde(default)]
    pub emotion_offset_y: f64,
}

/// Full input to one render: ordered layers plus settings.
///
/// Built fresh per request and consumed once.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Layers composited bottom to top.
    #[serde(default)]
    pub layers: Vec<Layer>,
    pub settings: Settings,
}

impl Scene {
    /// Parse a scene from JSON text.
    pub fn from_json_str(s: &str) -> ScreenResult<Self> {
        let scene: Scene = serde_json::from_str(s).context("parse scene json")?;
        Ok(scene)
    }

    /// Read and parse a scene JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ScreenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ScreenResult<()> {
        for layer in &self.layers {
            layer.validate()?;
        }
        if !self.settings.emotion_offset_x.is_finite()
            || !self.settings.emotion_offset_y.is_finite()
        {
            return Err(ScreenError::validation("emotion offsets must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
