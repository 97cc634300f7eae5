use engine::graphics::Color;
use serde::{Deserialize, Serialize};

use crate::catalog::ShapeMatrix;
use crate::geometry::{Vec2, block_centers};
use crate::piece::{LockedPiece, Piece};

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

pub type Row = [Option<Color>; GRID_WIDTH];

const EMPTY_ROW: Row = [None; GRID_WIDTH];

/// Points awarded for clearing `lines` rows in one batch: `100 * lines^2`.
pub fn line_clear_score(lines: usize) -> u32 {
    let n = lines as u32;
    n.saturating_mul(n).saturating_mul(100)
}

/// Locked cells of the well. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            rows: vec![EMPTY_ROW; GRID_HEIGHT],
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cell content, or `None` for empty and out-of-range coordinates.
    pub fn cell(&self, gx: i32, gy: i32) -> Option<Color> {
        if gx < 0 || gy < 0 {
            return None;
        }
        self.rows
            .get(gy as usize)
            .and_then(|row| row.get(gx as usize))
            .copied()
            .flatten()
    }

    pub fn is_occupied(&self, gx: i32, gy: i32) -> bool {
        self.cell(gx, gy).is_some()
    }

    /// Writes a cell directly. Out-of-range coordinates are ignored.
    pub fn set_cell(&mut self, gx: usize, gy: usize, value: Option<Color>) {
        if let Some(cell) = self.rows.get_mut(gy).and_then(|row| row.get_mut(gx)) {
            *cell = value;
        }
    }

    /// Fills row `gy` with `color`, leaving the columns in `holes` empty.
    pub fn fill_row(&mut self, gy: usize, color: Color, holes: &[usize]) {
        let Some(row) = self.rows.get_mut(gy) else {
            return;
        };
        for (gx, cell) in row.iter_mut().enumerate() {
            *cell = (!holes.contains(&gx)).then_some(color);
        }
    }

    pub fn row_is_full(&self, gy: usize) -> bool {
        self.rows
            .get(gy)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }

    pub fn occupied_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// True if any block center of `piece` lies left/right of the well, at or below the floor,
    /// or inside an occupied cell. Blocks above the top row never collide.
    pub fn check_collision(&self, piece: &Piece) -> bool {
        self.check_collision_at(piece.shape(), piece.position, piece.rotation)
    }

    pub fn check_collision_at(&self, shape: &ShapeMatrix, position: Vec2, rotation: f32) -> bool {
        block_centers(shape, position, rotation).into_iter().any(|b| {
            if b.x < 0.0 || b.x >= GRID_WIDTH as f32 || b.y >= GRID_HEIGHT as f32 {
                return true;
            }
            b.y >= 0.0 && self.is_occupied(b.x.floor() as i32, b.y.floor() as i32)
        })
    }

    /// Writes the piece's cells; cells outside the well are dropped. Returns how many landed.
    pub fn commit(&mut self, piece: &LockedPiece) -> usize {
        let mut written = 0;
        for (gx, gy) in piece.cells() {
            if gx < 0 || gy < 0 || gx >= GRID_WIDTH as i32 || gy >= GRID_HEIGHT as i32 {
                continue;
            }
            self.rows[gy as usize][gx as usize] = Some(piece.color);
            written += 1;
        }
        written
    }

    /// Removes every full row, letting the rows above fall, and returns how many were removed.
    pub fn clear_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = self.rows.len();
        while y > 0 {
            let row = y - 1;
            if self.row_is_full(row) {
                self.rows.remove(row);
                self.rows.insert(0, EMPTY_ROW);
                cleared += 1;
                // The row above has shifted into `row`; check it again.
                continue;
            }
            y -= 1;
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tetromino;

    const GRAY: Color = [128, 128, 128, 255];

    #[test]
    fn score_grows_quadratically() {
        assert_eq!(line_clear_score(0), 0);
        assert_eq!(line_clear_score(1), 100);
        assert_eq!(line_clear_score(2), 400);
        assert_eq!(line_clear_score(3), 900);
        assert_eq!(line_clear_score(4), 1600);
    }

    #[test]
    fn cell_reads_out_of_range_as_empty() {
        let grid = Grid::new();
        assert_eq!(grid.cell(-1, 0), None);
        assert_eq!(grid.cell(0, 20), None);
        assert_eq!(grid.cell(10, 5), None);
    }

    #[test]
    fn clear_lines_handles_adjacent_full_rows() {
        let mut grid = Grid::new();
        grid.fill_row(18, GRAY, &[]);
        grid.fill_row(19, GRAY, &[]);
        grid.set_cell(0, 17, Some(GRAY));
        assert_eq!(grid.clear_lines(), 2);
        assert!(grid.is_occupied(0, 19));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn collision_checks_walls_floor_and_cells_but_not_ceiling() {
        let mut grid = Grid::new();
        let o = Piece::new(Tetromino::O);
        assert!(!grid.check_collision(&o.clone().with_position(Vec2::new(4.0, -5.0))));
        assert!(grid.check_collision(&o.clone().with_position(Vec2::new(-1.0, 5.0))));
        assert!(grid.check_collision(&o.clone().with_position(Vec2::new(9.0, 5.0))));
        assert!(grid.check_collision(&o.clone().with_position(Vec2::new(4.0, 19.0))));

        grid.set_cell(5, 10, Some(GRAY));
        assert!(grid.check_collision(&o.clone().with_position(Vec2::new(4.0, 9.0))));
        assert!(!grid.check_collision(&o.with_position(Vec2::new(6.0, 9.0))));
    }

    #[test]
    fn commit_drops_cells_above_the_well() {
        let mut grid = Grid::new();
        let piece = LockedPiece {
            kind: Tetromino::I,
            shape: ShapeMatrix::from_bits(&[&[0, 1], &[0, 1], &[0, 1], &[0, 1]]),
            color: GRAY,
            x: 0,
            y: -2,
        };
        assert_eq!(grid.commit(&piece), 2);
        assert!(grid.is_occupied(1, 0));
        assert!(grid.is_occupied(1, 1));
        assert!(!grid.is_occupied(1, 2));
    }
}
