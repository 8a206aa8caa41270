use shared::domain::{Point, Polygon};

/// Signed shoelace area; positive for counter-clockwise rings.
pub fn signed_area(polygon: &Polygon) -> f64 {
    let points = polygon.points();
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice / 2.0
}

pub fn area(polygon: &Polygon) -> f64 {
    signed_area(polygon).abs()
}

pub fn is_counter_clockwise(polygon: &Polygon) -> bool {
    signed_area(polygon) > 0.0
}

/// Vertices in the requested winding, closed back onto the first vertex.
pub fn ring(polygon: &Polygon, counter_clockwise: bool) -> Vec<Point> {
    let mut points = polygon.points().to_vec();
    if is_counter_clockwise(polygon) != counter_clockwise {
        points.reverse();
    }
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}
