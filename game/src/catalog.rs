use engine::graphics::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::piece::Piece;

/// Rectangular occupancy matrix of a tetromino, `rows[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeMatrix {
    rows: Vec<Vec<bool>>,
}

impl ShapeMatrix {
    /// Builds a matrix from 0/1 rows. Ragged input is padded to the widest row.
    pub fn from_bits(bits: &[&[u8]]) -> Self {
        let width = bits.iter().map(|r| r.len()).max().unwrap_or(0);
        let rows = bits
            .iter()
            .map(|r| (0..width).map(|x| r.get(x).copied().unwrap_or(0) != 0).collect())
            .collect();
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Occupied `(x, y)` cells in row-major order.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, &filled)| filled.then_some((x, y)))
        })
    }

    pub fn filled_count(&self) -> usize {
        self.filled_cells().count()
    }

    /// One clockwise quarter turn: `new[i][j] = old[h - 1 - j][i]`.
    pub fn rotated_right(&self) -> Self {
        let h = self.height();
        let rows = (0..self.width())
            .map(|i| (0..h).map(|j| self.rows[h - 1 - j][i]).collect())
            .collect();
        Self { rows }
    }

    pub fn rotated_right_times(&self, turns: usize) -> Self {
        let mut shape = self.clone();
        for _ in 0..turns % 4 {
            shape = shape.rotated_right();
        }
        shape
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tetromino {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::J,
        Tetromino::L,
        Tetromino::O,
        Tetromino::S,
        Tetromino::T,
        Tetromino::Z,
    ];

    /// Fresh copy of the catalog matrix; callers may rotate it freely.
    pub fn shape(self) -> ShapeMatrix {
        match self {
            Tetromino::I => ShapeMatrix::from_bits(&[
                &[0, 0, 0, 0],
                &[1, 1, 1, 1],
                &[0, 0, 0, 0],
                &[0, 0, 0, 0],
            ]),
            Tetromino::J => ShapeMatrix::from_bits(&[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]]),
            Tetromino::L => ShapeMatrix::from_bits(&[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]]),
            Tetromino::O => ShapeMatrix::from_bits(&[&[1, 1], &[1, 1]]),
            Tetromino::S => ShapeMatrix::from_bits(&[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]]),
            Tetromino::T => ShapeMatrix::from_bits(&[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]]),
            Tetromino::Z => ShapeMatrix::from_bits(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]]),
        }
    }

    pub fn color(self) -> Color {
        match self {
            Tetromino::I => [0x00, 0xf0, 0xf0, 0xff],
            Tetromino::J => [0x00, 0x00, 0xf0, 0xff],
            Tetromino::L => [0xf0, 0xa0, 0x00, 0xff],
            Tetromino::O => [0xf0, 0xf0, 0x00, 0xff],
            Tetromino::S => [0x00, 0xf0, 0x00, 0xff],
            Tetromino::T => [0xa0, 0x00, 0xf0, 0xff],
            Tetromino::Z => [0xf0, 0x00, 0x00, 0xff],
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Tetromino {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Uniformly random piece at the spawn pose.
pub fn create_piece<R: Rng + ?Sized>(rng: &mut R) -> Piece {
    Piece::new(Tetromino::random(rng))
}
