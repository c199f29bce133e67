use crate::{
    assets::decode::Texture,
    compile::plan::{DrawOp, ScreenPlan, TextOp, TextPaint},
    foundation::{
        core::{Affine, Rect, Rgba8},
        error::{ScreenError, ScreenResult},
    },
    render::fonts::FontBook,
};

/// A rendered surface read back to CPU memory.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Execute `plan` on a fresh `vello_cpu` context and read the pixels back.
///
/// The surface starts fully transparent and nothing carries over between calls.
#[tracing::instrument(level = "debug", skip_all, fields(ops = plan.ops.len()))]
pub fn paint_plan(plan: &ScreenPlan, fonts: &mut FontBook) -> ScreenResult<FrameRGBA> {
    let width: u16 = plan
        .canvas
        .width
        .try_into()
        .map_err(|_| ScreenError::validation("canvas width exceeds u16"))?;
    let height: u16 = plan
        .canvas
        .height
        .try_into()
        .map_err(|_| ScreenError::validation("canvas height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    for op in &plan.ops {
        match op {
            DrawOp::Image {
                texture,
                transform,
                opacity,
                shadow,
            } => {
                if *opacity <= 0.0 {
                    continue;
                }
                // Shadow and image composite separately, each at the layer opacity.
                if let Some(shadow) = shadow {
                    let silhouette = texture.silhouette(shadow.color)?;
                    let placed = Affine::translate(shadow.offset) * *transform;
                    with_opacity(&mut ctx, *opacity, |ctx| {
                        fill_texture(ctx, &silhouette, placed);
                    });
                }
                with_opacity(&mut ctx, *opacity, |ctx| fill_texture(ctx, texture, *transform));
            }
            DrawOp::FillRect { rect, color } => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(to_color(*color));
                ctx.fill_rect(&rect_to_cpu(*rect));
            }
            DrawOp::Text(text) => draw_text(&mut ctx, fonts, text)?,
        }
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: plan.canvas.width,
        height: plan.canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
        draw(ctx);
        ctx.pop_layer();
    } else {
        draw(ctx);
    }
}

fn fill_texture(ctx: &mut vello_cpu::RenderContext, texture: &Texture, transform: Affine) {
    let (w, h) = texture.size();
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(texture.paint());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontBook,
    op: &TextOp,
) -> ScreenResult<()> {
    if op.text.is_empty() {
        return Ok(());
    }
    let layout = fonts.layout_line(op.lang, &op.text, op.size_px)?;
    let font = fonts.font_data(op.lang)?;

    // Positioned glyphs sit on their line baseline measured from the layout top.
    let baseline = layout
        .lines()
        .next()
        .map(|line| f64::from(line.metrics().baseline))
        .unwrap_or_default();
    let placement =
        op.transform * Affine::translate((op.origin.x, op.origin.y - baseline));
    ctx.set_transform(affine_to_cpu(placement));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs: Vec<vello_cpu::Glyph> = run
                .positioned_glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
                .collect();
            let font_size = run.run().font_size();

            match op.paint {
                TextPaint::Fill(color) => {
                    ctx.set_paint(to_color(color));
                    ctx.glyph_run(&font)
                        .font_size(font_size)
                        .fill_glyphs(glyphs.into_iter());
                }
                TextPaint::StrokeThenFill {
                    stroke,
                    width,
                    miter_limit,
                    fill,
                } => {
                    ctx.set_stroke(
                        vello_cpu::kurbo::Stroke::new(width)
                            .with_join(vello_cpu::kurbo::Join::Miter)
                            .with_miter_limit(miter_limit),
                    );
                    ctx.set_paint(to_color(stroke));
                    ctx.glyph_run(&font)
                        .font_size(font_size)
                        .stroke_glyphs(glyphs.iter().cloned());
                    ctx.set_paint(to_color(fill));
                    ctx.glyph_run(&font)
                        .font_size(font_size)
                        .fill_glyphs(glyphs.into_iter());
                }
            }
        }
    }
    Ok(())
}

fn to_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
