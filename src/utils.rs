use crate::problem::{Distance, Point};

/// Euclidean distance between two points in the plane.
pub fn distance(from: Point, to: Point) -> Distance {
    let (dx, dy) = (from.x - to.x, from.y - to.y);
    (dx * dx + dy * dy).sqrt()
}

/// Solved values above this are read as `true`.
pub const THRESHOLD: f64 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pythagorean_triple() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Point::new(-1.0, 2.0), Point::new(-1.0, 2.0)), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = Point::new(1.5, -2.0);
        let b = Point::new(-7.0, 3.25);
        assert_eq!(distance(a, b), distance(b, a));
    }
}
