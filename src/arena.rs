//! Pixel-mask geometry: silhouettes, the track occupancy field, and the goal
//! region. Collision queries are exact per-pixel overlap tests, not bounding
//! boxes.

use crate::model::VehicleState;

/// Binary occupancy grid of an entity's opaque pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Silhouette {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Silhouette {
    /// Fully opaque rectangle.
    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width * height],
        }
    }

    /// Build a silhouette from a per-pixel predicate.
    pub fn from_fn<F>(width: usize, height: usize, mut opaque: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut bits = Vec::with_capacity(width * height);
        for py in 0..height {
            for px in 0..width {
                bits.push(opaque(px, py));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn get(&self, px: i64, py: i64) -> bool {
        if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
            return false;
        }
        self.bits[py as usize * self.width + px as usize]
    }

    /// Rotate about the centre by `degrees`, resampling with nearest
    /// neighbour into the rotated bounding box.
    pub fn rotated(&self, degrees: f64) -> Silhouette {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let w = self.width as f64;
        let h = self.height as f64;
        // The epsilon keeps axis-aligned angles from spilling into an extra
        // row or column of padding.
        const EPS: f64 = 1e-9;
        let out_w = (w * cos.abs() + h * sin.abs() - EPS).ceil() as usize;
        let out_h = (w * sin.abs() + h * cos.abs() - EPS).ceil() as usize;

        let (src_cx, src_cy) = (w / 2.0, h / 2.0);
        let (dst_cx, dst_cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

        Silhouette::from_fn(out_w, out_h, |px, py| {
            let dx = px as f64 + 0.5 - dst_cx;
            let dy = py as f64 + 0.5 - dst_cy;
            // Inverse mapping back into the source frame.
            let sx = src_cx + dx * cos - dy * sin;
            let sy = src_cy + dx * sin + dy * cos;
            self.get(sx.floor() as i64, sy.floor() as i64)
        })
    }
}

/// True iff the two silhouettes, placed at their world offsets, share at
/// least one opaque pixel.
pub fn overlaps(a: &Silhouette, a_off: (i64, i64), b: &Silhouette, b_off: (i64, i64)) -> bool {
    let x0 = a_off.0.max(b_off.0);
    let y0 = a_off.1.max(b_off.1);
    let x1 = (a_off.0 + a.width as i64).min(b_off.0 + b.width as i64);
    let y1 = (a_off.1 + a.height as i64).min(b_off.1 + b.height as i64);

    for wy in y0..y1 {
        for wx in x0..x1 {
            if a.get(wx - a_off.0, wy - a_off.1) && b.get(wx - b_off.0, wy - b_off.1) {
                return true;
            }
        }
    }
    false
}

/// Static on-track occupancy field over the whole play area, anchored at the
/// origin. Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct TrackMask {
    mask: Silhouette,
}

impl TrackMask {
    pub fn new(mask: Silhouette) -> Self {
        Self { mask }
    }

    /// Rasterize a track from a polyline of waypoints stroked with the given
    /// half-width: a pixel is on-track iff its centre lies within
    /// `half_width` of some path segment.
    pub fn rasterize(width: usize, height: usize, path: &[(f64, f64)], half_width: f64) -> Self {
        let mask = Silhouette::from_fn(width, height, |px, py| {
            let p = (px as f64 + 0.5, py as f64 + 0.5);
            path.windows(2)
                .any(|seg| segment_distance(p, seg[0], seg[1]) <= half_width)
        });
        Self { mask }
    }

    pub fn silhouette(&self) -> &Silhouette {
        &self.mask
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len2 = abx * abx + aby * aby;
    let t = if len2 == 0.0 {
        0.0
    } else {
        ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0)
    };
    let (dx, dy) = (apx - t * abx, apy - t * aby);
    (dx * dx + dy * dy).sqrt()
}

/// Axis-aligned success target with a fixed-size solid silhouette.
#[derive(Debug, Clone)]
pub struct GoalRegion {
    x: f64,
    y: f64,
    mask: Silhouette,
}

impl GoalRegion {
    pub fn new(x: f64, y: f64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            mask: Silhouette::filled(width, height),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    fn offset(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// The vehicle's native silhouette, drawn facing up (tilt = 90 degrees).
#[derive(Debug, Clone)]
pub struct VehicleShape {
    base: Silhouette,
}

impl VehicleShape {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            base: Silhouette::filled(width, height),
        }
    }

    /// Rotated silhouette for the vehicle's current pose, with its world
    /// top-left offset. The rotated mask stays centred on the unrotated
    /// footprint whose top-left corner is the vehicle position.
    pub fn silhouette_at(&self, state: &VehicleState) -> (Silhouette, (i64, i64)) {
        let rotated = self.base.rotated(state.tilt() - 90.0);
        let cx = state.x() + self.base.width() as f64 / 2.0;
        let cy = state.y() + self.base.height() as f64 / 2.0;
        let off_x = (cx - rotated.width() as f64 / 2.0).round() as i64;
        let off_y = (cy - rotated.height() as f64 / 2.0).round() as i64;
        (rotated, (off_x, off_y))
    }
}

/// Does the vehicle silhouette share any opaque pixel with the track?
pub fn on_track(vehicle: &Silhouette, offset: (i64, i64), track: &TrackMask) -> bool {
    overlaps(vehicle, offset, track.silhouette(), (0, 0))
}

/// Does the vehicle silhouette share any opaque pixel with the goal region?
pub fn reached_goal(vehicle: &Silhouette, offset: (i64, i64), goal: &GoalRegion) -> bool {
    overlaps(vehicle, offset, &goal.mask, goal.offset())
}
