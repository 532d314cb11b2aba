//! Camera transform over the loaded tree graphic
//!
//! The camera is a uniform scale followed by a translation, applied with
//! transform origin `0 0`: `screen = translate + world * scale`.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl Camera {
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    pub fn translate(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    pub fn set_translate(&mut self, t: Vec2) {
        self.translate_x = t.x;
        self.translate_y = t.y;
    }

    /// The camera as a single affine map from graphic space to wrapper space
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translate()) * Affine::scale(self.scale)
    }

    /// CSS `transform` value for the graphic element
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }

    /// Map a point in graphic space to wrapper space
    pub fn to_screen(&self, world: Point) -> Point {
        self.to_affine() * world
    }

    /// Map a point in wrapper space back to graphic space
    pub fn to_world(&self, screen: Point) -> Point {
        let p = screen - self.translate();
        Point::new(p.x / self.scale, p.y / self.scale)
    }

    /// Change scale while keeping the graphic point under `anchor` fixed on screen
    pub fn zoom_about(&mut self, anchor: Point, new_scale: f64) {
        let ratio = new_scale / self.scale;
        let anchor = anchor.to_vec2();
        self.set_translate(anchor - (anchor - self.translate()) * ratio);
        self.scale = new_scale;
    }

    /// Translate so that graphic point `world` lands on wrapper point `target`
    pub fn center_on(&mut self, world: Point, target: Point) {
        self.set_translate(target.to_vec2() - world.to_vec2() * self.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_css_rendering() {
        let cam = Camera::new(1.5, 10.0, -20.5);
        assert_eq!(cam.to_css(), "translate(10px, -20.5px) scale(1.5)");
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let mut cam = Camera::new(1.2, 35.0, -12.0);
        let anchor = Point::new(240.0, 180.0);
        let world = cam.to_world(anchor);

        cam.zoom_about(anchor, 1.2 * 1.1);

        let after = cam.to_screen(world);
        assert!(close(after.x, anchor.x));
        assert!(close(after.y, anchor.y));
        assert!(close(cam.scale, 1.32));
    }

    #[test]
    fn test_center_on() {
        let mut cam = Camera::new(2.0, 0.0, 0.0);
        cam.center_on(Point::new(50.0, 25.0), Point::new(100.0, 100.0));
        assert_eq!(cam.translate(), Vec2::new(0.0, 50.0));
        assert_eq!(cam.to_screen(Point::new(50.0, 25.0)), Point::new(100.0, 100.0));
    }
}
