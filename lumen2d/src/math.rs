use glam::Vec2 as GlamVec2;
use serde::{Deserialize, Serialize};

/// 2D point/vector type used throughout Lumen2D.
///
/// Coordinates are in scene space: origin bottom-left, y growing upward.
/// Conversion to the backend's top-left/y-down convention happens at the
/// draw boundary only (see `Stage::to_backend`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn to_glam(&self) -> GlamVec2 {
        GlamVec2::new(self.x, self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from(value: (f32, f32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in sprite-local space.
///
/// Used for shadowcaster footprints: `top` and `bottom` are offsets from
/// the sprite origin along y, `left` and `right` along x, with
/// `top < bottom` and `left < right`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Polar-to-Cartesian projection.
///
/// Angles are in degrees, measured clockwise from straight up (screen
/// convention): `sin` drives x, `cos` drives y.
pub fn angle_to_point(origin: Vec2, angle_degrees: f32, dist: f32) -> Vec2 {
    let radians = angle_degrees.to_radians();
    Vec2::new(
        origin.x + radians.sin() * dist,
        origin.y + radians.cos() * dist,
    )
}

/// Bearing from `p1` to `p2` in degrees, clockwise from up, in [0, 360).
///
/// When both points share an x coordinate and `p1` is to the right, the
/// slope collapses to zero; a minimal 0.01 slope is substituted so the
/// projection direction does not degenerate to 0°.
pub fn angle_between(p1: Vec2, p2: Vec2) -> f32 {
    let adjacent = p2.x - p1.x;
    let opposite = p2.y - p1.y;

    let mut tan = if adjacent == 0.0 {
        opposite
    } else {
        opposite / adjacent
    };

    if tan == 0.0 && p1.x > p2.x {
        tan = 0.01;
    }

    let mut degrees = -tan.atan().to_degrees();

    // atan only covers half the circle; unfold the other half.
    if degrees < 0.0 {
        degrees += 180.0;
    }
    if p2.y > p1.y {
        degrees += 180.0;
    }

    degrees
}

/// Adds `add` degrees to `angle`, wrapping once past 359.
///
/// Single-step wrap, not a modulo: callers may only add a bounded
/// increment (the shadow projection adds 90).
pub fn turn_degrees(angle: f32, add: f32) -> f32 {
    let mut angle = angle + add;
    if angle > 359.0 {
        angle -= 360.0;
    }
    angle
}

/// Shadow-elongation primitive: takes the bearing from `origin` to `via`,
/// turns it 90 degrees further, and projects `via` outward by `dist`
/// along that turned bearing.
///
/// The projection runs from the edge point, not from the light. This is
/// what produces the shadow fan shape; it is a fixed contract, not a
/// formula to be corrected.
pub fn project_away_from_point(origin: Vec2, dist: f32, via: Vec2) -> Vec2 {
    let angle = angle_between(origin, via);
    let angle = turn_degrees(angle, 90.0);
    angle_to_point(via, angle, dist)
}

/// Converts an 8-bit RGBA color to the normalized form the backend takes.
pub fn color_from_u8(r: u8, g: u8, b: u8, a: u8) -> [f32; 4] {
    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}
