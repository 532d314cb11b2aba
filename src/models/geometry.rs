//! SVG attribute geometry parsing
//!
//! Transform lists, viewBox values, lengths, point lists and the path
//! endpoints needed to compute element bounding boxes. Attribute syntax is
//! read with `svgtypes` and converted into `kurbo` types.

use std::str::FromStr;

use kurbo::{Affine, Point, Rect};
use svgtypes::{LengthListParser, PathParser, PathSegment, PointsParser, Transform, ViewBox};

/// Numeric part of a length attribute: `"100px"` is 100, `"12.5%"` is 12.5.
///
/// For list-valued attributes such as text `x` the first entry is used.
pub fn parse_length(s: &str) -> Option<f64> {
    LengthListParser::from(s.trim())
        .next()?
        .ok()
        .map(|l| l.number)
}

/// Parse an SVG `transform` attribute into one affine map.
///
/// Functions compose left to right, so `translate(10) scale(2)` scales first.
/// Any syntax error makes the whole list invalid (`None`).
pub fn parse_transform(s: &str) -> Option<Affine> {
    let t = Transform::from_str(s).ok()?;
    Some(Affine::new([t.a, t.b, t.c, t.d, t.e, t.f]))
}

/// Parse a `viewBox` value; an invalid value reads as an empty rect at the origin
pub fn parse_view_box(s: &str) -> Rect {
    match ViewBox::from_str(s) {
        Ok(vb) => Rect::from_origin_size((vb.x, vb.y), (vb.w, vb.h)),
        Err(e) => {
            log::warn!("Ignoring invalid viewBox \"{}\": {}", s, e);
            Rect::ZERO
        }
    }
}

/// Parse a `points` attribute (polyline/polygon); stops at the first bad pair
pub fn parse_points(s: &str) -> Vec<Point> {
    PointsParser::from(s).map(|(x, y)| Point::new(x, y)).collect()
}

/// Absolute end points of every path segment.
///
/// Curves and arcs contribute their end point only; they are not flattened.
/// Parsing stops at the first error, the way renderers draw a path up to its
/// first bad command.
pub fn path_points(d: &str) -> Vec<Point> {
    let mut points = Vec::new();
    let mut current = Point::ZERO;
    let mut subpath_start = Point::ZERO;

    for segment in PathParser::from(d).map_while(|segment| segment.ok()) {
        let resolve = move |abs: bool, x: f64, y: f64| {
            if abs {
                Point::new(x, y)
            } else {
                Point::new(current.x + x, current.y + y)
            }
        };
        current = match segment {
            PathSegment::MoveTo { abs, x, y } => {
                subpath_start = resolve(abs, x, y);
                subpath_start
            }
            PathSegment::LineTo { abs, x, y }
            | PathSegment::SmoothQuadratic { abs, x, y }
            | PathSegment::Quadratic { abs, x, y, .. }
            | PathSegment::SmoothCurveTo { abs, x, y, .. }
            | PathSegment::CurveTo { abs, x, y, .. }
            | PathSegment::EllipticalArc { abs, x, y, .. } => resolve(abs, x, y),
            PathSegment::HorizontalLineTo { abs, x } => resolve(abs, x, if abs { current.y } else { 0.0 }),
            PathSegment::VerticalLineTo { abs, y } => resolve(abs, if abs { current.x } else { 0.0 }, y),
            PathSegment::ClosePath { .. } => {
                current = subpath_start;
                continue;
            }
        };
        points.push(current);
    }
    points
}

/// Tight bounding rect of a set of points
pub fn bounds_of(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_transform_order() {
        let t = parse_transform("translate(10, 20) scale(2)").unwrap();
        assert_eq!(t * Point::new(1.0, 1.0), Point::new(12.0, 22.0));
    }

    #[test]
    fn test_matrix_and_rotate() {
        let m = parse_transform("matrix(1 0 0 1 5 6)").unwrap();
        assert_eq!(m * Point::ZERO, Point::new(5.0, 6.0));

        let r = parse_transform("rotate(90)").unwrap();
        let p = r * Point::new(1.0, 0.0);
        assert!(close(p.x, 0.0) && close(p.y, 1.0));
    }

    #[test]
    fn test_invalid_transform() {
        assert!(parse_transform("translate(1, 2, 3)").is_none());
        assert!(parse_transform("wobble(1)").is_none());
        assert_eq!(parse_transform("").unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn test_non_ascii_input_is_rejected_not_fatal() {
        assert!(parse_transform("translate(10\u{a0}20)").is_none());
        assert!(parse_transform("translate(\u{2212}5 20)").is_none());
        assert_eq!(path_points("M10 10 L\u{2212}5 20"), vec![Point::new(10.0, 10.0)]);
        assert_eq!(parse_length("\u{2212}4"), None);
        assert_eq!(parse_view_box("0\u{a0}0 10 10"), Rect::ZERO);
    }

    #[test]
    fn test_view_box() {
        assert_eq!(parse_view_box("0 0 800 600"), Rect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(parse_view_box("-10,5, 100 50"), Rect::new(-10.0, 5.0, 90.0, 55.0));
        assert_eq!(parse_view_box("junk"), Rect::ZERO);
    }

    #[test]
    fn test_length() {
        assert_eq!(parse_length("100px"), Some(100.0));
        assert_eq!(parse_length(" 12.5%"), Some(12.5));
        assert_eq!(parse_length("40"), Some(40.0));
        assert_eq!(parse_length("5 15 25"), Some(5.0));
        assert_eq!(parse_length("auto"), None);
    }

    #[test]
    fn test_points() {
        assert_eq!(
            parse_points("0,0 10,5 -2 7"),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(-2.0, 7.0)]
        );
    }

    #[test]
    fn test_path_points_relative() {
        let pts = path_points("M10 10 h20 v5 l-5 5 Z");
        assert_eq!(
            pts,
            vec![
                Point::new(10.0, 10.0),
                Point::new(30.0, 10.0),
                Point::new(30.0, 15.0),
                Point::new(25.0, 20.0),
            ]
        );
        assert_eq!(bounds_of(&pts), Some(Rect::new(10.0, 10.0, 30.0, 20.0)));
    }
}
