use engine::graphics::{Color, Rect, Renderer2d, SurfaceSize, text_width};

use crate::geometry::{Vec2, centroid, rotate};
use crate::grid::{GRID_HEIGHT, GRID_WIDTH, Grid};
use crate::host::{Renderer, ScoreDisplay};
use crate::piece::Piece;
use crate::view::GameView;

/// Screen space kept free below the well (touch bars, docks).
pub const BOTTOM_PADDING: f32 = 50.0;

const COLOR_BACKGROUND: Color = [16, 16, 26, 255];
const COLOR_WELL: Color = [0, 0, 0, 255];
const COLOR_GRID_LINE: Color = [255, 255, 255, 255];
const GRID_LINE_ALPHA: u8 = 13;
const COLOR_WALL: Color = [0x00, 0xf0, 0xf0, 0xff];
const COLOR_TARGET: Color = [255, 255, 0, 255];
const COLOR_SPRING: Color = [255, 255, 255, 255];
const COLOR_ANCHOR: Color = [255, 0, 255, 255];
const COLOR_TEXT: Color = [235, 235, 245, 255];
const COLOR_PANEL: Color = [0, 0, 0, 255];
const HIGHLIGHT_ALPHA: u8 = 77;
const WELL_BORDER: f32 = 4.0;
const WALL_THICKNESS: u32 = 4;

/// Maps world cells to pixels: the 10x20 well scaled to fit, centered horizontally and
/// within the height left after [`BOTTOM_PADDING`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub block_size: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Viewport {
    pub fn fit(size: SurfaceSize) -> Self {
        let width = size.width as f32;
        let available_height = (size.height as f32 - BOTTOM_PADDING).max(0.0);
        let block_size = (width / GRID_WIDTH as f32).min(available_height / GRID_HEIGHT as f32);
        Self {
            block_size,
            origin_x: (width - GRID_WIDTH as f32 * block_size) / 2.0,
            origin_y: (available_height - GRID_HEIGHT as f32 * block_size) / 2.0,
        }
    }

    pub fn to_canvas(&self, world: Vec2) -> (f32, f32) {
        (
            self.origin_x + world.x * self.block_size,
            self.origin_y + world.y * self.block_size,
        )
    }

    pub fn to_world(&self, px: f32, py: f32) -> Vec2 {
        let block = self.block_size.max(f32::EPSILON);
        Vec2::new((px - self.origin_x) / block, (py - self.origin_y) / block)
    }

    fn well_width(&self) -> f32 {
        GRID_WIDTH as f32 * self.block_size
    }

    fn well_height(&self) -> f32 {
        GRID_HEIGHT as f32 * self.block_size
    }
}

fn lighten(color: Color, alpha: u8) -> Color {
    let a = alpha as u32;
    let mix = |c: u8| ((c as u32 * (255 - a) + 255 * a + 127) / 255) as u8;
    [mix(color[0]), mix(color[1]), mix(color[2]), 255]
}

fn rect_f(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::new(
        x.round() as i32,
        y.round() as i32,
        w.round().max(0.0) as u32,
        h.round().max(0.0) as u32,
    )
}

/// Everything the HUD needs besides the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub view: GameView,
    pub score: u32,
    pub final_score: Option<u32>,
    pub fps: Option<f32>,
}

/// Score sink for the on-screen HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    pub score: u32,
    pub final_score: Option<u32>,
}

impl ScoreDisplay for ScoreBoard {
    fn set_score(&mut self, score: u32) {
        self.score = score;
        self.final_score = None;
    }

    fn reveal_game_over(&mut self, final_score: u32) {
        self.final_score = Some(final_score);
    }
}

/// Captures the frame's board through [`Renderer`] and paints it onto any [`Renderer2d`].
#[derive(Debug, Clone, Default)]
pub struct BoardRenderer {
    grid: Grid,
    piece: Option<Piece>,
    target: Option<Vec2>,
    anchor: Option<Vec2>,
    pointer_overlay: bool,
}

impl Renderer for BoardRenderer {
    fn draw_grid(&mut self, grid: &Grid) {
        self.grid.clone_from(grid);
    }

    fn draw_active_piece(&mut self, piece: Option<&Piece>) {
        self.piece = piece.cloned();
    }

    fn draw_pointer_overlay(&mut self, target: Option<Vec2>, anchor: Option<Vec2>) {
        self.target = target;
        self.anchor = anchor;
    }
}

impl BoardRenderer {
    pub fn new(pointer_overlay: bool) -> Self {
        Self {
            pointer_overlay,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn paint(&self, r: &mut dyn Renderer2d, hud: &Hud) {
        let viewport = Viewport::fit(r.size());
        r.clear(COLOR_BACKGROUND);
        draw_well(r, &viewport);
        draw_locked_cells(r, &viewport, &self.grid);
        if let Some(piece) = self.piece.as_ref() {
            draw_piece(r, &viewport, piece);
        }
        if self.pointer_overlay {
            draw_pointer(r, &viewport, self.target, self.anchor);
        }
        draw_hud(r, hud);
    }
}

fn draw_well(r: &mut dyn Renderer2d, v: &Viewport) {
    r.fill_rect(
        rect_f(
            v.origin_x - WELL_BORDER,
            v.origin_y - WELL_BORDER,
            v.well_width() + WELL_BORDER * 2.0,
            v.well_height() + WELL_BORDER * 2.0,
        ),
        COLOR_WELL,
    );

    for gx in 0..=GRID_WIDTH {
        let x = v.origin_x + gx as f32 * v.block_size;
        r.blend_rect(rect_f(x, v.origin_y, 1.0, v.well_height()), COLOR_GRID_LINE, GRID_LINE_ALPHA);
    }
    for gy in 0..=GRID_HEIGHT {
        let y = v.origin_y + gy as f32 * v.block_size;
        r.blend_rect(rect_f(v.origin_x, y, v.well_width(), 1.0), COLOR_GRID_LINE, GRID_LINE_ALPHA);
    }

    // Open top: left wall, floor, right wall.
    let half = WALL_THICKNESS as f32 / 2.0;
    let t = WALL_THICKNESS as f32;
    let floor_y = v.origin_y + v.well_height();
    let right_x = v.origin_x + v.well_width();
    r.fill_rect(rect_f(v.origin_x - half, v.origin_y, t, v.well_height() + half), COLOR_WALL);
    r.fill_rect(rect_f(right_x - half, v.origin_y, t, v.well_height() + half), COLOR_WALL);
    r.fill_rect(rect_f(v.origin_x - half, floor_y - half, v.well_width() + t, t), COLOR_WALL);
}

fn draw_block(r: &mut dyn Renderer2d, x: f32, y: f32, size: f32, color: Color) {
    r.fill_rect(rect_f(x + 1.0, y + 1.0, size - 2.0, size - 2.0), color);
    r.fill_rect(
        rect_f(x + 1.0, y + 1.0, size - 2.0, size * 0.2),
        lighten(color, HIGHLIGHT_ALPHA),
    );
}

fn draw_locked_cells(r: &mut dyn Renderer2d, v: &Viewport, grid: &Grid) {
    for (gy, row) in grid.rows().iter().enumerate() {
        for (gx, cell) in row.iter().enumerate() {
            if let Some(color) = cell {
                let (x, y) = v.to_canvas(Vec2::new(gx as f32, gy as f32));
                draw_block(r, x, y, v.block_size, *color);
            }
        }
    }
}

/// Draws each block as a quad rotated about the shape matrix center.
fn draw_piece(r: &mut dyn Renderer2d, v: &Viewport, piece: &Piece) {
    let bs = v.block_size;
    let (cx, cy) = v.to_canvas(centroid(piece));
    let center = Vec2::new(cx, cy);
    let half = Vec2::new(
        piece.shape().width() as f32 * bs / 2.0,
        piece.shape().height() as f32 * bs / 2.0,
    );
    let highlight = lighten(piece.color(), HIGHLIGHT_ALPHA);

    let quad = |x0: f32, y0: f32, x1: f32, y1: f32| -> [(f32, f32); 4] {
        [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|(x, y)| {
            let p = center + rotate(Vec2::new(x, y) - half, piece.rotation);
            (p.x, p.y)
        })
    };

    for (px, py) in piece.shape().filled_cells() {
        let x = px as f32 * bs;
        let y = py as f32 * bs;
        r.fill_polygon(&quad(x + 1.0, y + 1.0, x + bs - 1.0, y + bs - 1.0), piece.color());
        r.fill_polygon(&quad(x + 1.0, y + 1.0, x + bs - 1.0, y + 1.0 + bs * 0.2), highlight);
    }
}

fn draw_pointer(r: &mut dyn Renderer2d, v: &Viewport, target: Option<Vec2>, anchor: Option<Vec2>) {
    let Some(target) = target else {
        return;
    };
    let target_px = v.to_canvas(target);
    r.fill_circle(target_px, 10.0, COLOR_TARGET, 128);

    if let Some(anchor) = anchor {
        let anchor_px = v.to_canvas(anchor);
        r.draw_line(anchor_px, target_px, COLOR_SPRING);
        r.draw_line((anchor_px.0 + 1.0, anchor_px.1), (target_px.0 + 1.0, target_px.1), COLOR_SPRING);
        r.fill_circle(anchor_px, 5.0, COLOR_ANCHOR, 255);
    }
}

const HUD_SCALE: u32 = 3;

fn draw_centered(r: &mut dyn Renderer2d, y: i32, text: &str, scale: u32) {
    let w = text_width(text, scale) as i32;
    let x = (r.size().width as i32 - w) / 2;
    r.draw_text_scaled(x, y, text, COLOR_TEXT, scale);
}

fn draw_panel(r: &mut dyn Renderer2d, lines: &[&str]) {
    let size = r.size();
    let line_h = (6 * HUD_SCALE) as i32;
    let panel_h = line_h * lines.len() as i32 + 32;
    let top = size.height as i32 / 2 - panel_h / 2;
    r.blend_rect(Rect::new(0, top, size.width, panel_h as u32), COLOR_PANEL, 180);
    for (i, line) in lines.iter().enumerate() {
        draw_centered(r, top + 16 + i as i32 * line_h, line, HUD_SCALE);
    }
}

pub fn draw_hud(r: &mut dyn Renderer2d, hud: &Hud) {
    r.draw_text_scaled(12, 12, &format!("SCORE {}", hud.score), COLOR_TEXT, HUD_SCALE);
    if let Some(fps) = hud.fps {
        r.draw_text(12, 40, &format!("FPS {fps:.0}"), COLOR_TEXT);
    }

    match hud.view {
        GameView::StartScreen => draw_panel(r, &["SPRINGFALL", "GRAB THE PIECE AND DRAG IT", "PRESS ENTER TO START"]),
        GameView::Playing { paused: true } => draw_panel(r, &["PAUSED", "PRESS P TO RESUME"]),
        GameView::Playing { paused: false } => {}
        GameView::GameOver => {
            let score = format!("SCORE {}", hud.final_score.unwrap_or(hud.score));
            draw_panel(r, &["GAME OVER", score.as_str(), "PRESS R TO RESTART"]);
        }
    }
}
