//! Canvas2D drawing surface (browser)

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::palette::{self, css, fade};
use super::{DrawCmd, DrawSurface, Glow, Label};

/// Replays frames on a `<canvas>` 2D context
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }

    fn set_glow(&self, glow: Option<Glow>) {
        match glow {
            Some(glow) => {
                self.ctx.set_shadow_blur(glow.blur as f64);
                self.ctx.set_shadow_color(&css(glow.color));
            }
            None => self.ctx.set_shadow_blur(0.0),
        }
    }

    fn font(px: f32, bold: bool) -> String {
        let weight = if bold { "bold " } else { "" };
        format!("{weight}{px}px -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif")
    }

    fn rounded_rect(&self, x: f64, y: f64, w: f64, h: f64, r: f64) {
        let r = r.min(w / 2.0).min(h / 2.0);
        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.arc_to(x + w, y, x + w, y + h, r).ok();
        ctx.arc_to(x + w, y + h, x, y + h, r).ok();
        ctx.arc_to(x, y + h, x, y, r).ok();
        ctx.arc_to(x, y, x + w, y, r).ok();
        ctx.close_path();
    }

    fn draw_label(&self, label: &Label) {
        let ctx = &self.ctx;
        ctx.save();
        ctx.set_font(&Self::font(label.font_px, label.bold));

        let widest = label
            .lines
            .iter()
            .filter_map(|line| ctx.measure_text(line).ok())
            .map(|m| m.width())
            .fold(0.0, f64::max);
        let w = widest + label.padding.x as f64 * 2.0;
        let h = label.lines.len() as f64 * label.line_height as f64 + label.padding.y as f64 * 2.0;
        let x = label.center.x as f64 - w / 2.0;
        let y = label.center.y as f64 - h / 2.0;

        self.set_glow(label.shadow);
        self.rounded_rect(x, y, w, h, label.corner_radius as f64);
        ctx.set_fill_style_str(&css(label.fill));
        ctx.fill();
        ctx.set_shadow_blur(0.0);
        if label.stroke_width > 0.0 {
            ctx.set_line_width(label.stroke_width as f64);
            ctx.set_stroke_style_str(&css(label.stroke));
            ctx.stroke();
        }

        ctx.set_fill_style_str(&css(label.text_color));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let first = y + label.padding.y as f64 + label.line_height as f64 / 2.0;
        for (i, line) in label.lines.iter().enumerate() {
            let ly = first + i as f64 * label.line_height as f64;
            ctx.fill_text(line, label.center.x as f64, ly).ok();
        }
        ctx.restore();
    }
}

impl DrawSurface for CanvasSurface {
    fn draw(&mut self, cmd: &DrawCmd) {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::Clear { color } => {
                ctx.set_shadow_blur(0.0);
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(0.0, 0.0, self.width, self.height);
            }
            DrawCmd::Rect {
                pos,
                size,
                color,
                glow,
            } => {
                self.set_glow(*glow);
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
                ctx.set_shadow_blur(0.0);
            }
            DrawCmd::Circle {
                center,
                radius,
                color,
                glow,
            } => {
                self.set_glow(*glow);
                ctx.set_fill_style_str(&css(*color));
                ctx.begin_path();
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    *radius as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .ok();
                ctx.fill();
                ctx.set_shadow_blur(0.0);
            }
            DrawCmd::Arc {
                center,
                radius,
                start,
                end,
                width,
                color,
                glow,
            } => {
                self.set_glow(*glow);
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    *radius as f64,
                    *start as f64,
                    *end as f64,
                )
                .ok();
                ctx.stroke();
                ctx.set_shadow_blur(0.0);
            }
            DrawCmd::Line {
                from,
                to,
                width,
                color,
            } => {
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
            }
            DrawCmd::Quad {
                center,
                size,
                rotation,
                color,
            } => {
                ctx.save();
                ctx.translate(center.x as f64, center.y as f64).ok();
                ctx.rotate(*rotation as f64).ok();
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(
                    -size.x as f64 / 2.0,
                    -size.y as f64 / 2.0,
                    size.x as f64,
                    size.y as f64,
                );
                ctx.restore();
            }
            DrawCmd::Burst {
                center,
                radius,
                alpha,
            } => {
                if *radius <= 0.0 {
                    return;
                }
                let (x, y, r) = (center.x as f64, center.y as f64, *radius as f64);
                let Ok(gradient) = ctx.create_radial_gradient(x, y, 0.0, x, y, r) else {
                    return;
                };
                for (offset, color) in palette::EXPLOSION_STOPS {
                    gradient.add_color_stop(offset, &css(fade(color, *alpha))).ok();
                }
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.begin_path();
                ctx.arc(x, y, r, 0.0, std::f64::consts::TAU).ok();
                ctx.fill();
            }
            DrawCmd::Text {
                center,
                text,
                font_px,
                color,
            } => {
                ctx.set_font(&Self::font(*font_px, false));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_text(text, center.x as f64, center.y as f64).ok();
            }
            DrawCmd::Label(label) => self.draw_label(label),
        }
    }
}
