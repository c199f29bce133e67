use std::sync::Arc;

use anyhow::Context;

use crate::foundation::{
    core::Rgba8,
    error::{ScreenError, ScreenResult},
    math::{mul_div255_u8, premultiply_rgba8_in_place},
};

/// Decoded raster image, premultiplied RGBA8, ready to be used as a paint.
#[derive(Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixmap_ptr", &Arc::as_ptr(&self.pixmap))
            .finish()
    }
}

impl Texture {
    /// Build a texture from tightly packed premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(rgba8_premul: &[u8], width: u32, height: u32) -> ScreenResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| ScreenError::validation("image width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| ScreenError::validation("image height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ScreenError::validation("image has zero size"));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(ScreenError::validation("image byte length mismatch"));
        }

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for px in rgba8_premul.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(Self {
            width,
            height,
            pixmap: Arc::new(vello_cpu::Pixmap::from_parts_with_opacity(
                pixels,
                w,
                h,
                may_have_opacities,
            )),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intrinsic size as floats.
    pub fn size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    /// Premultiplied RGBA8 pixel bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Image paint sampling this texture in its local pixel space.
    pub fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }

    /// Same coverage as `self`, every pixel replaced by `color` scaled by the source alpha.
    ///
    /// Used for the hard drop shadow.
    pub fn silhouette(&self, color: Rgba8) -> ScreenResult<Self> {
        let src = self.rgba8_premul();
        let mut out = Vec::with_capacity(src.len());
        for px in src.chunks_exact(4) {
            let a = mul_div255_u8(u16::from(px[3]), u16::from(color.a));
            out.extend_from_slice(&[
                mul_div255_u8(u16::from(color.r), u16::from(a)),
                mul_div255_u8(u16::from(color.g), u16::from(a)),
                mul_div255_u8(u16::from(color.b), u16::from(a)),
                a,
            ]);
        }
        Self::from_premul_rgba8(&out, self.width, self.height)
    }
}

/// Decode encoded image bytes (PNG, JPEG, ...) into a premultiplied [`Texture`].
pub fn decode_texture(bytes: &[u8]) -> ScreenResult<Texture> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Texture::from_premul_rgba8(&rgba8_premul, width, height)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
