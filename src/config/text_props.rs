use std::{collections::HashMap, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::error::{ScreenError, ScreenResult},
    scene::model::Lang,
};

const BUILTIN_TEXT_PROPERTIES: &str = include_str!("../../data/text_properties.json");

/// Per-language layout constants, in canvas pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    /// Speaker label size (dialogue).
    pub name_size: f32,
    /// Caption title size.
    pub title_size: f32,
    /// Caption title baseline.
    pub title_y_pos: f64,
    pub speaker_x_pos: f64,
    pub speaker_y_pos: f64,
    pub dialogue_size: f32,
    pub dialogue_x_pos: f64,
    pub dialogue_y_pos: f64,
    /// Line advance for dialogue and caption text.
    pub line_height: f64,
    pub caption_size: f32,
    pub caption_y_pos: f64,
    /// Line advance for narration, full and book text.
    pub narration_line_height: f64,
    /// Vertical centre of the narration block.
    pub narration_y_pos: f64,
    pub intro_name_size: f32,
    pub intro_name_y_pos: f64,
    /// Right margin of the slanted intro name.
    pub intro_x_pos: f64,
    pub intro_title_size: f32,
    pub intro_title_y_pos: f64,
    /// Right margin of the slanted intro title.
    pub intro_title_x_pos: f64,
}

impl TextProperties {
    fn validate(&self, lang: Lang) -> ScreenResult<()> {
        let sizes = [
            ("nameSize", self.name_size),
            ("titleSize", self.title_size),
            ("dialogueSize", self.dialogue_size),
            ("captionSize", self.caption_size),
            ("introNameSize", self.intro_name_size),
            ("introTitleSize", self.intro_title_size),
        ];
        for (name, v) in sizes {
            if !v.is_finite() || v <= 0.0 {
                return Err(ScreenError::config(format!(
                    "text properties for '{lang}': {name} must be finite and > 0"
                )));
            }
        }
        if !(self.line_height.is_finite() && self.narration_line_height.is_finite()) {
            return Err(ScreenError::config(format!(
                "text properties for '{lang}': line heights must be finite"
            )));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct LangEntry {
    text_properties: TextProperties,
}

/// Text properties for every supported language, loaded once and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct TextPropertiesTable {
    by_lang: HashMap<Lang, TextProperties>,
}

impl TextPropertiesTable {
    /// Table shipped with the crate (`data/text_properties.json`).
    pub fn builtin() -> ScreenResult<Self> {
        Self::from_json_str(BUILTIN_TEXT_PROPERTIES)
    }

    /// Parse `{ "<lang>": { "textProperties": { ... } } }`.
    ///
    /// Entries for languages outside [`Lang::ALL`] are ignored. A record with missing fields
    /// fails the whole parse.
    pub fn from_json_str(s: &str) -> ScreenResult<Self> {
        let raw: HashMap<String, LangEntry> = serde_json::from_str(s)
            .map_err(|e| ScreenError::config(format!("parse text properties: {e}")))?;

        let mut by_lang = HashMap::new();
        for (key, entry) in raw {
            let Some(lang) = Lang::parse(&key) else {
                tracing::warn!(lang = %key, "ignoring text properties for unsupported language");
                continue;
            };
            entry.text_properties.validate(lang)?;
            by_lang.insert(lang, entry.text_properties);
        }
        Ok(Self { by_lang })
    }

    pub fn from_path(path: impl AsRef<Path>) -> ScreenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read text properties '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, lang: Lang, props: TextProperties) -> ScreenResult<()> {
        props.validate(lang)?;
        self.by_lang.insert(lang, props);
        Ok(())
    }

    /// Record for `lang`; a missing record is a configuration error, never defaulted.
    pub fn get(&self, lang: Lang) -> ScreenResult<&TextProperties> {
        self.by_lang.get(&lang).ok_or_else(|| {
            ScreenError::config(format!("no text properties configured for '{lang}'"))
        })
    }

    /// Fail unless every language in [`Lang::ALL`] has a record.
    pub fn validate_complete(&self) -> ScreenResult<()> {
        let missing: Vec<&str> = Lang::ALL
            .iter()
            .filter(|l| !self.by_lang.contains_key(*l))
            .map(|l| l.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScreenError::config(format!(
                "text properties missing for: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/text_props.rs"]
mod tests;
