use std::{io::Cursor, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::{
        error::{ScreenError, ScreenResult},
        math::unpremultiply_rgba8_in_place,
    },
    render::cpu::FrameRGBA,
};

/// A finished screen, encoded as PNG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write the encoded bytes to `path`, creating parent directories.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> ScreenResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write image '{}'", path.display()))?;
        Ok(())
    }
}

/// Encode a frame as an RGBA PNG with straight alpha.
pub fn encode_png(frame: &FrameRGBA) -> ScreenResult<EncodedImage> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(ScreenError::encode(format!(
            "frame data is {} bytes, expected {expected} for {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| ScreenError::encode("frame buffer does not match its dimensions"))?;

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| ScreenError::encode(format!("png: {e}")))?;
    Ok(EncodedImage { bytes })
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
