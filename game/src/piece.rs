use engine::graphics::Color;
use serde::{Deserialize, Serialize};

use crate::catalog::{ShapeMatrix, Tetromino};
use crate::geometry::Vec2;

pub const SPAWN_POSITION: Vec2 = Vec2::new(4.0, -1.0);

/// The active falling body.
///
/// `position` is the top-left of the shape matrix in world units; the body rotates about the
/// matrix center. The matrix itself only changes when the piece is snapped into a
/// [`LockedPiece`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    kind: Tetromino,
    shape: ShapeMatrix,
    color: Color,
    pub position: Vec2,
    /// Radians, clockwise on screen.
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub mass: f32,
    pub is_grabbed: bool,
    /// Grab point relative to the centroid in the piece's unrotated frame.
    pub grab_offset: Vec2,
    pub lock_timer: f32,
}

impl Piece {
    pub fn new(kind: Tetromino) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            color: kind.color(),
            position: SPAWN_POSITION,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
            is_grabbed: false,
            grab_offset: Vec2::ZERO,
            lock_timer: 0.0,
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn kind(&self) -> Tetromino {
        self.kind
    }

    pub fn shape(&self) -> &ShapeMatrix {
        &self.shape
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub(crate) fn into_parts(self) -> (Tetromino, ShapeMatrix, Color) {
        (self.kind, self.shape, self.color)
    }
}

/// A piece snapped to integer cells with its matrix normalized to rotation 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPiece {
    pub kind: Tetromino,
    pub shape: ShapeMatrix,
    pub color: Color,
    /// Grid column of the matrix's left edge.
    pub x: i32,
    /// Grid row of the matrix's top edge (may be negative above the well).
    pub y: i32,
}

impl LockedPiece {
    /// Grid cells `(gx, gy)` covered by the piece.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .filled_cells()
            .map(|(px, py)| (self.x + px as i32, self.y + py as i32))
    }
}
