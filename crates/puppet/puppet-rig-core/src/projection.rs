//! Aspect-fit (letterbox) projection of the model canvas into a framebuffer.

use glam::{Mat4, Vec2, Vec3};

/// `ortho(canvas) * view * scale(sx, sy)`, where the axis along which the
/// framebuffer is relatively wider is squeezed so the canvas keeps its aspect.
/// Zero framebuffer or canvas extents are treated as 1.
pub fn projection(fb_width: u32, fb_height: u32, canvas: Vec2, view: Mat4) -> Mat4 {
    let fb_w = fb_width.max(1) as f32;
    let fb_h = fb_height.max(1) as f32;
    let cw = if canvas.x > 0.0 { canvas.x } else { 1.0 };
    let ch = if canvas.y > 0.0 { canvas.y } else { 1.0 };

    let window_aspect = fb_w / fb_h;
    let canvas_aspect = cw / ch;
    let (sx, sy) = if window_aspect > canvas_aspect {
        (canvas_aspect / window_aspect, 1.0)
    } else {
        (1.0, window_aspect / canvas_aspect)
    };

    let ortho = Mat4::orthographic_rh_gl(-cw * 0.5, cw * 0.5, -ch * 0.5, ch * 0.5, -1.0, 1.0);
    ortho * view * Mat4::from_scale(Vec3::new(sx, sy, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-5, "left={a} right={b}");
    }

    #[test]
    fn matching_aspect_maps_canvas_corner_to_ndc_corner() {
        let m = projection(1920, 1080, Vec2::new(1920.0, 1080.0), Mat4::IDENTITY);
        let p = m * Vec4::new(960.0, 540.0, 0.0, 1.0);
        approx(p.x, 1.0);
        approx(p.y, 1.0);
    }

    #[test]
    fn wide_window_pillarboxes() {
        // 2:1 window, 1:1 canvas
        let m = projection(200, 100, Vec2::new(10.0, 10.0), Mat4::IDENTITY);
        let p = m * Vec4::new(5.0, 5.0, 0.0, 1.0);
        approx(p.x, 0.5);
        approx(p.y, 1.0);
    }

    #[test]
    fn degenerate_framebuffer_is_finite() {
        let m = projection(0, 0, Vec2::ZERO, Mat4::IDENTITY);
        assert!(m.is_finite());
    }
}
