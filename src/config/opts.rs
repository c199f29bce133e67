use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    foundation::error::{ScreenError, ScreenResult},
    scene::model::Lang,
    scene::request::RequestDefaults,
};

/// Renderer construction options.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererOpts {
    /// Root of the local asset store; textures, fonts and layer images resolve under it.
    pub assets_root: PathBuf,
    /// Sub-directory of `assets_root` holding template textures.
    pub images_dir: String,
    /// Font file per language, relative to `assets_root`.
    pub fonts: HashMap<Lang, String>,
    /// Optional text properties JSON; the built-in table is used when absent.
    pub text_properties: Option<PathBuf>,
    /// Deadline for each layer image fetch of one render. `None` waits indefinitely.
    pub layer_fetch_timeout_ms: Option<u64>,
    /// Worker threads for parallel layer fetches. `None` uses rayon defaults.
    pub fetch_threads: Option<usize>,
    /// Defaults used when building scenes from flat requests.
    pub request_defaults: RequestDefaults,
}

impl Default for RendererOpts {
    fn default() -> Self {
        let fonts = [
            (Lang::En, "fonts/dragalialosten.ttf"),
            (Lang::Ja, "fonts/dragalialostjp.otf"),
            (Lang::ZhCn, "fonts/dragalialostzh_cn.ttf"),
            (Lang::ZhTw, "fonts/dragalialostzh_tw.ttf"),
        ]
        .into_iter()
        .map(|(lang, path)| (lang, path.to_string()))
        .collect();

        Self {
            assets_root: PathBuf::from("."),
            images_dir: "images".to_string(),
            fonts,
            text_properties: None,
            layer_fetch_timeout_ms: Some(10_000),
            fetch_threads: None,
            request_defaults: RequestDefaults::default(),
        }
    }
}

impl RendererOpts {
    /// Load options from a JSON file. Relative paths inside stay relative to the process cwd.
    pub fn from_path(path: impl AsRef<Path>) -> ScreenResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read renderer options '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| ScreenError::config(format!("parse renderer options: {e}")))
    }

    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }

    pub fn layer_fetch_timeout(&self) -> Option<Duration> {
        self.layer_fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Font path for `lang`; a missing entry is a configuration error.
    pub fn font_path(&self, lang: Lang) -> ScreenResult<PathBuf> {
        self.fonts
            .get(&lang)
            .map(|rel| self.assets_root.join(rel))
            .ok_or_else(|| ScreenError::config(format!("no font configured for '{lang}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/opts.rs"]
mod tests;
