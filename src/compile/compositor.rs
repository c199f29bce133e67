//! Layer placement: intrinsic size, pivot, flip, rotation and offsets to one affine.

use crate::{
    compile::plan::{EMOTION_EDGE_X, EMOTION_Y},
    foundation::core::{Affine, Canvas, Point, Vec2},
    scene::model::{EmotionSide, Layer},
};

/// Map from the texture's pixel space to canvas space for `layer`.
///
/// The scaled image is centred on `anchor` shifted by the layer offset (`offset_y` positive
/// moves up). Flip and rotation both pivot on that centre, flip applied first in image space.
pub fn layer_transform(layer: &Layer, image_size: (f64, f64), anchor: Point) -> Affine {
    let (w, h) = (image_size.0 * layer.scale, image_size.1 * layer.scale);
    let pivot = Vec2::new(anchor.x + layer.offset_x, anchor.y - layer.offset_y);
    let top_left = pivot - Vec2::new(w / 2.0, h / 2.0);

    let mut about_pivot = Affine::IDENTITY;
    if layer.flip_x {
        about_pivot *= Affine::scale_non_uniform(-1.0, 1.0);
    }
    if layer.rotation != 0.0 {
        about_pivot *= Affine::rotate(layer.rotation.to_radians());
    }

    Affine::translate(pivot)
        * about_pivot
        * Affine::translate(-pivot)
        * Affine::translate(top_left)
        * Affine::scale(layer.scale)
}

/// Point the emotion balloon is centred on before its offsets.
pub fn emotion_anchor(side: EmotionSide, canvas: Canvas) -> Point {
    let x = match side {
        EmotionSide::Left => EMOTION_EDGE_X,
        EmotionSide::Right => canvas.width_f64() - EMOTION_EDGE_X,
    };
    Point::new(x, EMOTION_Y)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compositor.rs"]
mod tests;
