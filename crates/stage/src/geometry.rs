use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2.0 * amount).max(0.0),
            (self.height - 2.0 * amount).max(0.0),
        )
    }

    /// Fraction of `self` that lies inside `viewport`, in `[0, 1]`.
    pub fn intersection_ratio(&self, viewport: &Rect) -> f64 {
        let area = self.width * self.height;
        if area <= 0.0 {
            return 0.0;
        }
        let w = (self.x + self.width).min(viewport.x + viewport.width) - self.x.max(viewport.x);
        let h = (self.y + self.height).min(viewport.y + viewport.height) - self.y.max(viewport.y);
        (w.max(0.0) * h.max(0.0)) / area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 30.0)));
        assert!(!r.contains(Point::new(9.9, 15.0)));
        assert_eq!(r.center(), Point::new(20.0, 20.0));
    }

    #[test]
    fn intersection_ratio_partial() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let half_out = Rect::new(50.0, 0.0, 100.0, 100.0);
        assert!((half_out.intersection_ratio(&viewport) - 0.5).abs() < 1e-9);
        let outside = Rect::new(200.0, 200.0, 10.0, 10.0);
        assert_eq!(outside.intersection_ratio(&viewport), 0.0);
    }
}
