//! Circle rasterization by point-sampling the implicit equation
//! `y = c ± sqrt(r² - (x - c)²)`.
//!
//! The parameter `t` runs over `[-1, 1]` in increments of `step / radius`, so
//! consecutive samples are `step` pixels apart along x regardless of radius.
//! Each sample is floor-rounded to a pixel. Results are not antialiased.

use crate::buffer::RasterError;

/// Sample spacing in pixels for filled circles.
pub const FILLED_STEP: f32 = 0.8;
/// Hollow circles only cover the boundary, so they can afford a finer step.
pub const HOLLOW_STEP: f32 = 0.08;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleRaster {
    /// Side length of the square buffer: `ceil(radius * 2)`.
    pub side: u32,
    /// Unique pixel coordinates to paint, sorted row-major.
    pub points: Vec<(u32, u32)>,
}

pub fn side_for_radius(radius: f32) -> u32 {
    (radius * 2.0).ceil() as u32
}

pub fn filled_circle(radius: f32) -> Result<CircleRaster, RasterError> {
    rasterize(radius, FILLED_STEP, true)
}

pub fn hollow_circle(radius: f32) -> Result<CircleRaster, RasterError> {
    rasterize(radius, HOLLOW_STEP, false)
}

fn rasterize(radius: f32, step: f32, filled: bool) -> Result<CircleRaster, RasterError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(RasterError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }
    let side = side_for_radius(radius);
    let center = radius;
    let mut points = Vec::new();
    let mut plot = |x: f32, y: f32| {
        // sqrt of a tiny negative near the boundary yields NaN
        if x.is_nan() || y.is_nan() {
            return;
        }
        let (px, py) = (x.floor(), y.floor());
        if px < 0.0 || py < 0.0 || px >= side as f32 || py >= side as f32 {
            return;
        }
        points.push((px as u32, py as u32));
    };

    for x in sample_axis(center, radius, step) {
        let dx = x - center;
        let half = (radius * radius - dx * dx).sqrt();
        let (top, bottom) = (center - half, center + half);
        if filled {
            if half.is_nan() {
                continue;
            }
            let count = ((bottom - top) / step).ceil() as usize;
            for j in 0..=count {
                let y = (top + j as f32 * step).min(bottom);
                plot(x, y);
            }
        } else {
            plot(x, top);
            plot(x, bottom);
            // Transposed pass covers the steep arcs near the left/right poles.
            plot(top, x);
            plot(bottom, x);
        }
    }

    points.sort_unstable_by_key(|&(x, y)| (y, x));
    points.dedup();
    Ok(CircleRaster { side, points })
}

/// x positions for `t = -1, -1 + step/r, ..., 1`.
fn sample_axis(center: f32, radius: f32, step: f32) -> impl Iterator<Item = f32> {
    let dt = step / radius;
    let count = (2.0 / dt).ceil() as usize;
    (0..=count).map(move |i| {
        let t = (-1.0 + i as f32 * dt).min(1.0);
        center + t * radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn near_mirror(set: &HashSet<(u32, u32)>, x: u32, y: u32) -> bool {
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx >= 0 && ny >= 0 && set.contains(&(nx as u32, ny as u32)) {
                    return true;
                }
            }
        }
        false
    }

    fn assert_symmetric(raster: &CircleRaster) {
        let set: HashSet<_> = raster.points.iter().copied().collect();
        let last = raster.side - 1;
        for &(x, y) in &raster.points {
            assert!(near_mirror(&set, last - x, y), "no horizontal mirror for ({x}, {y})");
            assert!(near_mirror(&set, x, last - y), "no vertical mirror for ({x}, {y})");
        }
    }

    #[test]
    fn side_is_ceil_of_diameter() {
        assert_eq!(side_for_radius(5.0), 10);
        assert_eq!(side_for_radius(4.3), 9);
        assert_eq!(filled_circle(4.3).expect("circle").side, 9);
    }

    #[test]
    fn invalid_radius_is_rejected() {
        assert!(filled_circle(0.0).is_err());
        assert!(hollow_circle(-2.0).is_err());
        assert!(filled_circle(f32::NAN).is_err());
    }

    #[test]
    fn filled_circle_is_symmetric() {
        assert_symmetric(&filled_circle(10.0).expect("circle"));
        assert_symmetric(&filled_circle(7.5).expect("circle"));
    }

    #[test]
    fn hollow_circle_is_symmetric() {
        assert_symmetric(&hollow_circle(12.0).expect("circle"));
    }

    #[test]
    fn filled_circle_covers_center_and_skips_corners() {
        let raster = filled_circle(8.0).expect("circle");
        let set: HashSet<_> = raster.points.iter().copied().collect();
        assert!(set.contains(&(8, 8)));
        assert!(set.contains(&(0, 8)));
        assert!(!set.contains(&(0, 0)));
        assert!(!set.contains(&(15, 15)));
    }

    #[test]
    fn hollow_circle_leaves_interior_empty() {
        let raster = hollow_circle(8.0).expect("circle");
        let set: HashSet<_> = raster.points.iter().copied().collect();
        assert!(!set.contains(&(8, 8)));
        assert!(set.contains(&(8, 0)));
        assert!(set.contains(&(0, 8)));
    }

    #[test]
    fn points_stay_inside_buffer() {
        let raster = filled_circle(3.2).expect("circle");
        assert!(raster
            .points
            .iter()
            .all(|&(x, y)| x < raster.side && y < raster.side));
    }
}
