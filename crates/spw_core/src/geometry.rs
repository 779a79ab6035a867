use glam::Vec2;

/// Integer pixel rectangle. `x`/`y` may be negative when a rect describes a
/// destination partially off-surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, span(x0, x1), span(y0, y1)))
    }

    /// Smallest integer rect covering a set of float points.
    pub fn bounding(points: &[Vec2]) -> Rect {
        let Some(first) = points.first() else {
            return Rect::default();
        };
        let (mut min, mut max) = (*first, *first);
        for p in &points[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        let x0 = min.x.floor() as i32;
        let y0 = min.y.floor() as i32;
        let x1 = max.x.ceil() as i32;
        let y1 = max.y.ceil() as i32;
        Rect::new(x0, y0, span(x0, x1), span(y0, y1))
    }
}

/// Distance from `start` to `end`, clamped to `0..=u32::MAX`.
fn span(start: i32, end: i32) -> u32 {
    (i64::from(end) - i64::from(start)).clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping_and_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 0, 5, 5)));
        assert_eq!(a.intersect(&Rect::new(10, 0, 4, 4)), None);
    }

    #[test]
    fn bounding_rounds_outward() {
        let r = Rect::bounding(&[Vec2::new(0.5, 1.2), Vec2::new(3.1, -0.4)]);
        assert_eq!(r, Rect::new(0, -1, 4, 3));
    }

    #[test]
    fn bounding_clamps_extreme_extents() {
        let r = Rect::bounding(&[Vec2::splat(-1e10), Vec2::splat(1e10)]);
        assert_eq!(r.x, i32::MIN);
        assert_eq!(r.width, u32::MAX);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(
            r.intersect(&Rect::from_size(4, 4)),
            Some(Rect::from_size(4, 4))
        );
    }

    #[test]
    fn right_and_bottom_saturate() {
        let r = Rect::new(i32::MAX - 1, i32::MAX, 10, u32::MAX);
        assert_eq!(r.right(), i32::MAX);
        assert_eq!(r.bottom(), i32::MAX);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 2, 3, 3);
        assert!(r.contains(2, 4));
        assert!(!r.contains(5, 2));
    }
}
