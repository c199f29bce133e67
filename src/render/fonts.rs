//! Per-language fonts: shaping with Parley, glyph data for vello_cpu.

use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Context as _;

use crate::{
    config::opts::RendererOpts,
    foundation::{
        core::Rgba8,
        error::{ScreenError, ScreenResult},
    },
    scene::model::Lang,
    text::layout::TextMeasure,
};

/// Raw font file bytes keyed by language, loaded once per process.
#[derive(Clone, Debug, Default)]
pub struct FontFiles {
    by_lang: HashMap<Lang, Arc<Vec<u8>>>,
}

impl FontFiles {
    /// Read every configured font from disk.
    pub fn from_opts(opts: &RendererOpts) -> ScreenResult<Self> {
        let mut files = Self::default();
        for lang in Lang::ALL {
            let path = opts.font_path(*lang)?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read font for '{lang}' from '{}'", path.display()))?;
            files.insert(*lang, bytes);
        }
        Ok(files)
    }

    pub fn insert(&mut self, lang: Lang, bytes: Vec<u8>) {
        self.by_lang.insert(lang, Arc::new(bytes));
    }

    pub fn with(mut self, lang: Lang, bytes: Vec<u8>) -> Self {
        self.insert(lang, bytes);
        self
    }

    pub fn contains(&self, lang: Lang) -> bool {
        self.by_lang.contains_key(&lang)
    }
}

struct Face {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Parley contexts with every configured font registered.
///
/// Not shareable across threads while in use; see [`FontPool`].
pub struct FontBook {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    faces: HashMap<Lang, Face>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut langs: Vec<&str> = self.faces.keys().map(|l| l.as_str()).collect();
        langs.sort_unstable();
        f.debug_struct("FontBook").field("langs", &langs).finish()
    }
}

impl FontBook {
    pub fn new(files: &FontFiles) -> ScreenResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let mut faces = HashMap::with_capacity(files.by_lang.len());

        for (lang, bytes) in &files.by_lang {
            let families = font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
            let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                ScreenError::config(format!("font for '{lang}' contains no font families"))
            })?;
            let family = font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| ScreenError::config(format!("font for '{lang}' has no family name")))?
                .to_string();
            let data = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                0,
            );
            tracing::debug!(%lang, family = %family, bytes = bytes.len(), "registered font");
            faces.insert(*lang, Face { family, data });
        }

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            faces,
        })
    }

    fn face(&self, lang: Lang) -> ScreenResult<&Face> {
        self.faces
            .get(&lang)
            .ok_or_else(|| ScreenError::config(format!("no font loaded for '{lang}'")))
    }

    /// Glyph source for painting runs shaped with [`FontBook::layout_line`].
    pub fn font_data(&self, lang: Lang) -> ScreenResult<vello_cpu::peniko::FontData> {
        Ok(self.face(lang)?.data.clone())
    }

    /// Shape a single unwrapped line of text.
    pub fn layout_line(
        &mut self,
        lang: Lang,
        text: &str,
        size_px: f32,
    ) -> ScreenResult<parley::Layout<Rgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ScreenError::validation("text size must be finite and > 0"));
        }
        let family = self.face(lang)?.family.clone();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(Rgba8::WHITE));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextMeasure for FontBook {
    fn advance(&mut self, lang: Lang, text: &str, size_px: f32) -> ScreenResult<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let layout = self.layout_line(lang, text, size_px)?;
        Ok(f64::from(layout.full_width()))
    }
}

/// Idle [`FontBook`]s shared by concurrent renders.
///
/// A render takes a book for its duration; a new book is built when none is idle.
pub struct FontPool {
    files: FontFiles,
    idle: Mutex<Vec<FontBook>>,
}

impl std::fmt::Debug for FontPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontPool")
            .field("files", &self.files)
            .field("idle", &self.idle_count())
            .finish()
    }
}

impl FontPool {
    /// Validates the fonts by building the first book eagerly.
    pub fn new(files: FontFiles) -> ScreenResult<Self> {
        let first = FontBook::new(&files)?;
        Ok(Self {
            files,
            idle: Mutex::new(vec![first]),
        })
    }

    /// Run `f` with a book to itself, returning the book to the pool afterwards.
    pub fn with_book<R>(&self, f: impl FnOnce(&mut FontBook) -> ScreenResult<R>) -> ScreenResult<R> {
        let idle = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let mut book = match idle {
            Some(book) => book,
            None => {
                tracing::debug!("font pool empty, building another font book");
                FontBook::new(&self.files)?
            }
        };

        let out = f(&mut book);
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(book);
        out
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fonts.rs"]
mod tests;
