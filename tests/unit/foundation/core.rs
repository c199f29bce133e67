use super::*;

#[test]
fn dialogue_canvas_center_and_size() {
    let c = Canvas::DIALOGUE;
    assert_eq!(c.center(), Point::new(375.0, 667.0));
    assert_eq!(c.byte_len(), 750 * 1334 * 4);
}

#[test]
fn rgba8_alpha_override_keeps_channels() {
    let c = Rgba8::BLACK.with_alpha(64);
    assert_eq!((c.r, c.g, c.b, c.a), (0, 0, 0, 64));
    assert_eq!(Rgba8::WHITE.a, 255);
}
