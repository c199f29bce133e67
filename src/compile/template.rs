//! Declarative render plan per dialogue type.

use crate::scene::model::{DialogueType, Lang};

/// Frame texture drawn over the composited layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarAsset {
    /// A fixed texture key.
    Fixed(&'static str),
    /// The `skip_<lang>` texture of the render language.
    LanguageSkip,
}

/// How the speaker label is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeakerPolicy {
    /// Left-aligned label at the speaker position.
    Horizontal,
    /// Horizontally centred title at the title position, underlined by a 1px rule.
    CenteredTitle,
    /// Slanted, outlined, right-aligned label.
    Slanted,
    /// No speaker label.
    Suppressed,
}

/// Text layout branch for the dialogue body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutBranch {
    /// Left-aligned lines in the dialogue box.
    Dialogue,
    /// Centred lines starting at the caption position.
    Caption,
    /// Centred block, vertically centred on the narration position.
    Narration,
    /// Centred block, vertically centred on the canvas.
    Book,
    /// Whole text drawn once as a slanted title.
    IntroTitle,
}

/// Everything a render needs to know about its dialogue type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplatePlan {
    /// Texture drawn before any layer.
    pub background: Option<&'static str>,
    pub bar: BarAsset,
    pub speaker: SpeakerPolicy,
    pub layout: LayoutBranch,
    /// Whether the first portrait layer gets the hard drop shadow.
    pub portrait_shadow: bool,
}

impl TemplatePlan {
    /// Resolve the bar texture key for `lang`.
    pub fn bar_key(&self, lang: Lang) -> String {
        match self.bar {
            BarAsset::Fixed(key) => key.to_string(),
            BarAsset::LanguageSkip => lang.skip_texture_key(),
        }
    }
}

/// Look up the render plan for `dialogue_type`.
pub const fn select_template(dialogue_type: DialogueType) -> TemplatePlan {
    match dialogue_type {
        DialogueType::Dialogue => TemplatePlan {
            background: None,
            bar: BarAsset::Fixed("bar"),
            speaker: SpeakerPolicy::Horizontal,
            layout: LayoutBranch::Dialogue,
            portrait_shadow: false,
        },
        DialogueType::Intro => TemplatePlan {
            background: Some("introBack"),
            bar: BarAsset::Fixed("introBar"),
            speaker: SpeakerPolicy::Slanted,
            layout: LayoutBranch::IntroTitle,
            portrait_shadow: true,
        },
        DialogueType::Caption => TemplatePlan {
            background: None,
            bar: BarAsset::Fixed("caption"),
            speaker: SpeakerPolicy::CenteredTitle,
            layout: LayoutBranch::Caption,
            portrait_shadow: false,
        },
        DialogueType::Narration => TemplatePlan {
            background: None,
            bar: BarAsset::Fixed("caption"),
            speaker: SpeakerPolicy::Suppressed,
            layout: LayoutBranch::Narration,
            portrait_shadow: false,
        },
        DialogueType::Full => TemplatePlan {
            background: None,
            bar: BarAsset::Fixed("fullscreen"),
            speaker: SpeakerPolicy::Suppressed,
            layout: LayoutBranch::Narration,
            portrait_shadow: false,
        },
        DialogueType::Book => TemplatePlan {
            background: Some("book"),
            bar: BarAsset::LanguageSkip,
            speaker: SpeakerPolicy::Suppressed,
            layout: LayoutBranch::Book,
            portrait_shadow: false,
        },
    }
}

/// Every fixed template texture key the selector can ask for.
pub fn template_texture_keys() -> Vec<String> {
    let mut keys = Vec::new();
    for t in DialogueType::ALL {
        let plan = select_template(*t);
        if let Some(bg) = plan.background {
            keys.push(bg.to_string());
        }
        if let BarAsset::Fixed(key) = plan.bar {
            keys.push(key.to_string());
        }
    }
    keys.extend(Lang::ALL.iter().map(|l| l.skip_texture_key()));
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
#[path = "../../tests/unit/compile/template.rs"]
mod tests;
