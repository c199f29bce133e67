use std::{
    sync::{
        Arc, mpsc,
        atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    assets::{
        decode::{Texture, decode_texture},
        source::{ByteSource, DirSource},
        texture_cache::TextureCache,
    },
    compile::{
        plan::{ScreenPlan, compile_screen},
        template::template_texture_keys,
    },
    config::{opts::RendererOpts, text_props::TextPropertiesTable},
    foundation::error::{ScreenError, ScreenResult},
    render::{
        cpu::{FrameRGBA, paint_plan},
        encode::{EncodedImage, encode_png},
        fonts::{FontFiles, FontPool},
    },
    scene::model::{Layer, Scene},
};

/// How layer images are fetched for a render.
#[derive(Clone, Debug, Default)]
pub struct LayerFetch {
    /// Dedicated pool; the global rayon pool is used when `None`.
    pub pool: Option<Arc<rayon::ThreadPool>>,
    /// Deadline for each layer fetch. Fetches start together, so every layer of a render
    /// shares it; the first layer still pending when it expires is reported.
    pub timeout: Option<Duration>,
}

/// Fetch workers abandoned by a timeout that may still be blocked in the source.
const MAX_STALLED_FETCHES: usize = 8;

const WORKER_RUNNING: u8 = 0;
const WORKER_DONE: u8 = 1;
const WORKER_ABANDONED: u8 = 2;

/// Long-lived renderer: template cache, text properties and fonts, shared by every render.
///
/// `render` takes `&self`, so one instance can serve concurrent requests. Each render builds
/// its own surface and decodes its own layer images; only template textures persist.
pub struct Renderer {
    templates: Arc<TextureCache>,
    layers: Arc<dyn ByteSource>,
    props: Arc<TextPropertiesTable>,
    fonts: FontPool,
    fetch: LayerFetch,
    stalled: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("templates", &self.templates)
            .field("fonts", &self.fonts)
            .field("fetch", &self.fetch)
            .field("stalled", &self.stalled.load(Ordering::Relaxed))
            .finish()
    }
}

impl Renderer {
    /// Build a renderer reading everything from the local asset store described by `opts`.
    ///
    /// Fonts and text properties are loaded and checked here; a missing one is a
    /// configuration error.
    pub fn new(opts: &RendererOpts) -> ScreenResult<Self> {
        let store: Arc<dyn ByteSource> = Arc::new(DirSource::new(&opts.assets_root));
        let templates = TextureCache::with_dir(store.clone(), opts.images_dir.clone());

        let props = match &opts.text_properties {
            Some(path) => TextPropertiesTable::from_path(path)?,
            None => TextPropertiesTable::builtin()?,
        };
        props.validate_complete()?;

        let fonts = FontFiles::from_opts(opts)?;
        let pool = opts.fetch_threads.map(build_thread_pool).transpose()?;

        tracing::info!(
            assets_root = %opts.assets_root.display(),
            images_dir = %opts.images_dir,
            "renderer ready"
        );

        Ok(Self::from_parts(templates, store, props, fonts)?.with_layer_fetch(LayerFetch {
            pool: pool.map(Arc::new),
            timeout: opts.layer_fetch_timeout(),
        }))
    }

    /// Assemble a renderer from already-loaded parts.
    pub fn from_parts(
        templates: TextureCache,
        layers: Arc<dyn ByteSource>,
        props: TextPropertiesTable,
        fonts: FontFiles,
    ) -> ScreenResult<Self> {
        Ok(Self {
            templates: Arc::new(templates),
            layers,
            props: Arc::new(props),
            fonts: FontPool::new(fonts)?,
            fetch: LayerFetch::default(),
            stalled: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_layer_fetch(mut self, fetch: LayerFetch) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn templates(&self) -> &TextureCache {
        &self.templates
    }

    /// Decode every template texture now instead of on first use.
    pub fn warm_templates(&self) -> ScreenResult<()> {
        let keys = template_texture_keys();
        self.templates.warm(keys.iter().map(String::as_str))
    }

    /// Fetch layers and compile the draw list without painting.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn plan(&self, scene: &Scene) -> ScreenResult<ScreenPlan> {
        scene.validate()?;
        let textures = self.fetch_layers(&scene.layers)?;
        self.fonts.with_book(|book| {
            compile_screen(scene, &textures, &self.templates, &self.props, &mut *book)
        })
    }

    /// Render to premultiplied pixels.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(dialogue_type = %scene.settings.dialogue_type, font = %scene.settings.font)
    )]
    pub fn render_frame(&self, scene: &Scene) -> ScreenResult<FrameRGBA> {
        scene.validate()?;
        let textures = self.fetch_layers(&scene.layers)?;
        self.fonts.with_book(|book| {
            let plan =
                compile_screen(scene, &textures, &self.templates, &self.props, &mut *book)?;
            paint_plan(&plan, book)
        })
    }

    /// Render to an encoded PNG.
    #[tracing::instrument(level = "info", skip_all, fields(layers = scene.layers.len()))]
    pub fn render(&self, scene: &Scene) -> ScreenResult<EncodedImage> {
        let frame = self.render_frame(scene)?;
        let image = encode_png(&frame)?;
        tracing::debug!(bytes = image.len(), "screen encoded");
        Ok(image)
    }

    fn fetch_layers(&self, layers: &[Layer]) -> ScreenResult<Vec<Arc<Texture>>> {
        if layers.is_empty() {
            return Ok(Vec::new());
        }
        let refs: Vec<String> = layers.iter().map(|l| l.image.clone()).collect();

        let Some(timeout) = self.fetch.timeout else {
            return fetch_all(self.layers.as_ref(), &refs, self.fetch.pool.as_deref(), None);
        };

        // A timed-out worker cannot be cancelled; it finishes whenever the source returns.
        let stalled = self.stalled.load(Ordering::Acquire);
        if stalled >= MAX_STALLED_FETCHES {
            return Err(ScreenError::Other(anyhow::anyhow!(
                "{stalled} timed-out layer fetches are still running"
            )));
        }

        let done: Arc<Vec<AtomicBool>> =
            Arc::new(refs.iter().map(|_| AtomicBool::new(false)).collect());
        let state = Arc::new(AtomicU8::new(WORKER_RUNNING));
        let (tx, rx) = mpsc::channel();
        {
            let source = self.layers.clone();
            let pool = self.fetch.pool.clone();
            let done = done.clone();
            let state = state.clone();
            let stalled = self.stalled.clone();
            std::thread::Builder::new()
                .name("layer-fetch".to_string())
                .spawn(move || {
                    let result =
                        fetch_all(source.as_ref(), &refs, pool.as_deref(), Some(done.as_slice()));
                    let _ = tx.send(result);
                    if state
                        .compare_exchange(
                            WORKER_RUNNING,
                            WORKER_DONE,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_err()
                    {
                        stalled.fetch_sub(1, Ordering::AcqRel);
                    }
                })
                .context("spawn layer fetch thread")?;
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.stalled.fetch_add(1, Ordering::AcqRel);
                if state
                    .compare_exchange(
                        WORKER_RUNNING,
                        WORKER_ABANDONED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_err()
                {
                    // Finished right at the deadline.
                    self.stalled.fetch_sub(1, Ordering::AcqRel);
                    if let Ok(result) = rx.try_recv() {
                        return result;
                    }
                }
                let pending = done
                    .iter()
                    .position(|d| !d.load(Ordering::Acquire))
                    .unwrap_or(0);
                let key = layers[pending].image.clone();
                tracing::warn!(?timeout, %key, layers = layers.len(), "layer fetch timed out");
                Err(ScreenError::asset_load(
                    key,
                    format!("layer fetch timed out after {timeout:?}"),
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ScreenError::Other(
                anyhow::anyhow!("layer fetch worker exited without a result"),
            )),
        }
    }
}

// Fetches run in parallel; results keep layer order. `done[i]` flips once layer `i` returns.
fn fetch_all(
    source: &dyn ByteSource,
    refs: &[String],
    pool: Option<&rayon::ThreadPool>,
    done: Option<&[AtomicBool]>,
) -> ScreenResult<Vec<Arc<Texture>>> {
    let run = || {
        refs.par_iter()
            .enumerate()
            .map(|(i, r)| {
                let fetched = fetch_one(source, r);
                if let Some(flag) = done.and_then(|d| d.get(i)) {
                    flag.store(true, Ordering::Release);
                }
                fetched
            })
            .collect::<ScreenResult<Vec<_>>>()
    };
    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}

fn fetch_one(source: &dyn ByteSource, reference: &str) -> ScreenResult<Arc<Texture>> {
    let bytes = source
        .read(reference)
        .map_err(|e| ScreenError::asset_load(reference, format!("{e:#}")))?;
    let texture = decode_texture(&bytes).map_err(|e| ScreenError::asset_load(reference, e))?;
    Ok(Arc::new(texture))
}

fn build_thread_pool(threads: usize) -> ScreenResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("layer-fetch-{i}"))
        .build()
        .map_err(|e| ScreenError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
