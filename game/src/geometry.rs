use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::catalog::ShapeMatrix;
use crate::piece::Piece;

/// Pointer-down within this distance (in cells) of the piece centroid starts a grab.
pub const GRAB_RADIUS: f32 = 4.0;

/// World-space vector in grid units. `y` grows downward, row 0 is the top of the well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 2D cross product (z component).
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Self::Output {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Self::Output {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Rotates `v` by `angle` radians (clockwise on screen, since `y` points down).
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Half the matrix size; the matrix rotates about this point.
pub fn half_extents(shape: &ShapeMatrix) -> Vec2 {
    Vec2::new(shape.width() as f32 / 2.0, shape.height() as f32 / 2.0)
}

/// World position of the shape matrix center for a piece whose top-left is `position`.
pub fn centroid_at(shape: &ShapeMatrix, position: Vec2) -> Vec2 {
    position + half_extents(shape)
}

pub fn centroid(piece: &Piece) -> Vec2 {
    centroid_at(piece.shape(), piece.position)
}

/// Block centers for `shape` placed at `position` and rotated by `rotation` about its center.
pub fn block_centers(shape: &ShapeMatrix, position: Vec2, rotation: f32) -> Vec<Vec2> {
    let half = half_extents(shape);
    let center = position + half;
    shape
        .filled_cells()
        .map(|(px, py)| {
            let local = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - half;
            center + rotate(local, rotation)
        })
        .collect()
}

/// World-space centers of every occupied block of `piece`.
///
/// Always recomputed from the current pose; callers must not cache the result across a
/// position or rotation change.
pub fn rotated_block_positions(piece: &Piece) -> Vec<Vec2> {
    block_centers(piece.shape(), piece.position, piece.rotation)
}

/// Horizontal span and lowest edge of a piece, from its rotated block centers +/- 0.5.
///
/// Tilted pieces are under-bounded at the corners; boundary checks accept that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f32,
    pub max_x: f32,
    pub max_y: f32,
}

pub fn axis_aligned_extent(piece: &Piece) -> Extent {
    rotated_block_positions(piece).into_iter().fold(
        Extent {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        },
        |acc, b| Extent {
            min_x: acc.min_x.min(b.x - 0.5),
            max_x: acc.max_x.max(b.x + 0.5),
            max_y: acc.max_y.max(b.y + 0.5),
        },
    )
}

/// Grab offset rotated into world space (the lever arm used for torque).
pub fn world_grab_offset(piece: &Piece) -> Vec2 {
    rotate(piece.grab_offset, piece.rotation)
}

/// World position of the point the player is holding.
pub fn grab_anchor(piece: &Piece) -> Vec2 {
    centroid(piece) + world_grab_offset(piece)
}

pub fn hit_test(piece: &Piece, point: Vec2) -> bool {
    point.distance(centroid(piece)) < GRAB_RADIUS
}

/// Offset of `point` from the centroid, expressed in the piece's unrotated frame.
pub fn local_grab_offset(piece: &Piece, point: Vec2) -> Vec2 {
    rotate(point - centroid(piece), -piece.rotation)
}
