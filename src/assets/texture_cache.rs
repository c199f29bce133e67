use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    assets::decode::{Texture, decode_texture},
    assets::source::ByteSource,
    foundation::error::{ScreenError, ScreenResult},
};

type Slot = Arc<Mutex<Option<Arc<Texture>>>>;

/// Process-lifetime, append-only cache of the named template textures.
///
/// Keys map to `<dir>/<key>.png` inside the backing [`ByteSource`]. Each key owns a slot; the
/// first caller to reach an empty slot decodes while holding the slot lock, so concurrent
/// requests for the same key wait for that single decode instead of starting their own.
/// A failed decode leaves the slot empty and returns [`ScreenError::AssetLoad`].
pub struct TextureCache {
    source: Arc<dyn ByteSource>,
    dir: String,
    slots: Mutex<HashMap<String, Slot>>,
    decodes: AtomicUsize,
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("dir", &self.dir)
            .field("decodes", &self.decode_count())
            .finish()
    }
}

impl TextureCache {
    /// Cache reading `images/<key>.png` from `source`.
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self::with_dir(source, "images")
    }

    pub fn with_dir(source: Arc<dyn ByteSource>, dir: impl Into<String>) -> Self {
        Self {
            source,
            dir: dir.into(),
            slots: Mutex::new(HashMap::new()),
            decodes: AtomicUsize::new(0),
        }
    }

    /// Get the texture for `key`, decoding it on first use.
    pub fn load(&self, key: &str) -> ScreenResult<Arc<Texture>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.to_string()).or_default().clone()
        };

        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tex) = cached.as_ref() {
            return Ok(tex.clone());
        }

        let reference = self.reference_for(key);
        tracing::debug!(key, reference = %reference, "texture cache miss");
        let bytes = self
            .source
            .read(&reference)
            .map_err(|e| ScreenError::asset_load(key, format!("{e:#}")))?;
        let tex = decode_texture(&bytes).map_err(|e| ScreenError::asset_load(key, e))?;
        self.decodes.fetch_add(1, Ordering::Relaxed);

        let tex = Arc::new(tex);
        *cached = Some(tex.clone());
        Ok(tex)
    }

    /// Decode every key up front, failing on the first one that does not load.
    pub fn warm<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> ScreenResult<()> {
        for key in keys {
            self.load(key)?;
        }
        Ok(())
    }

    /// Number of successful decodes performed so far.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }

    /// Whether `key` is already resident.
    pub fn contains(&self, key: &str) -> bool {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(key).cloned()
        };
        slot.is_some_and(|s| s.lock().unwrap_or_else(PoisonError::into_inner).is_some())
    }

    fn reference_for(&self, key: &str) -> String {
        if self.dir.is_empty() {
            format!("{key}.png")
        } else {
            format!("{}/{key}.png", self.dir)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/texture_cache.rs"]
mod tests;
