//! Pointer, wheel and touch input model
//!
//! Positions are in wrapper coordinates (client position minus the wrapper's
//! top-left corner for wheel input, raw client position for drags, which only
//! ever use deltas).

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Raw gesture input, decoupled from browser event types
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PointerInput {
    /// One wheel notch; only the sign of `delta_y` matters
    Wheel { delta_y: f64, x: f64, y: f64 },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    TouchStart { touches: Vec<(f64, f64)> },
    TouchMove { touches: Vec<(f64, f64)> },
    TouchEnd,
}

/// Transient drag/pinch state, owned by one controller
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureState {
    pub dragging: bool,
    /// Pointer position minus camera translate at drag start
    pub drag_origin: Vec2,
    pub pinch_start_distance: f64,
    pub pinch_start_scale: f64,
}

impl GestureState {
    pub fn begin_drag(&mut self, pointer: Point, translate: Vec2) {
        self.dragging = true;
        self.drag_origin = pointer.to_vec2() - translate;
    }

    /// New camera translate for the pointer at `pointer`, if a drag is active
    pub fn drag_to(&self, pointer: Point) -> Option<Vec2> {
        if !self.dragging {
            return None;
        }
        Some(pointer.to_vec2() - self.drag_origin)
    }

    pub fn begin_pinch(&mut self, a: Point, b: Point, scale: f64) {
        self.dragging = false;
        self.pinch_start_distance = a.distance(b);
        self.pinch_start_scale = scale;
    }

    /// Unclamped pinch scale for the current finger positions
    pub fn pinch_scale(&self, a: Point, b: Point) -> Option<f64> {
        if self.pinch_start_distance <= 0.0 {
            return None;
        }
        Some(self.pinch_start_scale * (a.distance(b) / self.pinch_start_distance))
    }

    pub fn end(&mut self) {
        self.dragging = false;
    }

    pub fn reset(&mut self) {
        *self = GestureState::default();
    }
}

pub fn touch_point(touch: (f64, f64)) -> Point {
    Point::new(touch.0, touch.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_follows_pointer_one_to_one() {
        let mut g = GestureState::default();
        g.begin_drag(Point::new(100.0, 100.0), Vec2::new(20.0, 30.0));
        assert_eq!(g.drag_to(Point::new(110.0, 95.0)), Some(Vec2::new(30.0, 25.0)));
        g.end();
        assert_eq!(g.drag_to(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_pinch_ratio() {
        let mut g = GestureState::default();
        g.begin_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1.5);
        assert!(!g.dragging);
        let s = g.pinch_scale(Point::new(0.0, 0.0), Point::new(0.0, 200.0)).unwrap();
        assert!((s - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pinch_zero_baseline() {
        let mut g = GestureState::default();
        g.begin_pinch(Point::new(5.0, 5.0), Point::new(5.0, 5.0), 1.0);
        assert_eq!(g.pinch_scale(Point::new(0.0, 0.0), Point::new(10.0, 0.0)), None);
    }

    #[test]
    fn test_input_from_json() {
        let input: PointerInput =
            serde_json::from_str(r#"{"type":"wheel","deltaY":-3.0,"x":10.0,"y":20.0}"#).unwrap();
        assert_eq!(input, PointerInput::Wheel { delta_y: -3.0, x: 10.0, y: 20.0 });
    }
}
