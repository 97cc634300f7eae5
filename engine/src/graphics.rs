use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Color = [u8; 4];

// 3x5 block font.
pub const DEFAULT_TEXT_SCALE: u32 = 2;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

fn glyph_advance_x(scale: u32) -> i32 {
    ((GLYPH_W + 1) * scale.max(1)) as i32
}

fn line_advance_y(scale: u32) -> i32 {
    ((GLYPH_H + 1) * scale.max(1)) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Pixel rectangle. Signed so shapes may start off-screen; drawing clips to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w as i32)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h as i32)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Intersection with the `size` surface as unsigned pixel bounds `(x0, y0, x1, y1)`.
    fn clip(&self, size: SurfaceSize) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(size.width as i32);
        let y1 = self.bottom().min(size.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Unified 2D rendering interface.
///
/// Game code only talks to this trait; it does not care where the pixels end up (a window
/// through `pixels`, or an in-memory buffer in tests).
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content (alpha is applied to `color`'s RGB).
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn rect_outline(&mut self, rect: Rect, color: Color);

    /// Fills a convex (or any simple) polygon given in pixel coordinates.
    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color);

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color);
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color, alpha: u8);
    fn draw_text_scaled(&mut self, x: i32, y: i32, text: &str, color: Color, scale: u32);

    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color) {
        self.draw_text_scaled(x, y, text, color, DEFAULT_TEXT_SCALE);
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
    longest.saturating_mul(glyph_advance_x(scale) as u32)
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    fn buffer_ok(&self) -> bool {
        let expected = self.size.rgba_len();
        expected != 0 && self.frame.len() >= expected
    }

    fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width as i32 || y >= self.size.height as i32 {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        (idx + 4 <= self.frame.len()).then_some(idx)
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.pixel_index(x, y) {
            self.frame[idx..idx + 4].copy_from_slice(&color);
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, alpha: u8) {
        let Some(idx) = self.pixel_index(x, y) else {
            return;
        };
        let px = &mut self.frame[idx..idx + 4];
        blend_into(px, color, alpha);
    }

    fn fill_span(&mut self, y: i32, x0: i32, x1: i32, color: Color) {
        if y < 0 || y >= self.size.height as i32 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.size.width as i32);
        if x0 >= x1 {
            return;
        }
        let stride = self.size.width as usize * 4;
        let start = y as usize * stride + x0 as usize * 4;
        let end = y as usize * stride + x1 as usize * 4;
        for px in self.frame[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }
}

fn blend_into(px: &mut [u8], color: Color, alpha: u8) {
    let a = alpha as u32;
    let inv = 255u32 - a;
    for c in 0..3 {
        px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
    }
    px[3] = 255;
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if !self.buffer_ok() {
            return;
        }
        let Some((x0, y0, x1, y1)) = rect.clip(self.size) else {
            return;
        };
        for y in y0..y1 {
            self.fill_span(y as i32, x0 as i32, x1 as i32, color);
        }
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            self.fill_rect(rect, color);
            return;
        }
        if !self.buffer_ok() {
            return;
        }
        let Some((x0, y0, x1, y1)) = rect.clip(self.size) else {
            return;
        };
        let stride = self.size.width as usize * 4;
        for y in y0..y1 {
            let start = y as usize * stride + x0 as usize * 4;
            let end = y as usize * stride + x1 as usize * 4;
            for px in self.frame[start..end].chunks_exact_mut(4) {
                blend_into(px, color, alpha);
            }
        }
    }

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        // Top / bottom.
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        if rect.h > 1 {
            self.fill_rect(Rect::new(rect.x, rect.bottom() - 1, rect.w, 1), color);
        }
        // Left / right.
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        if rect.w > 1 {
            self.fill_rect(Rect::new(rect.right() - 1, rect.y, 1, rect.h), color);
        }
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        if points.len() < 3 || !self.buffer_ok() {
            return;
        }
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for &(_, y) in points {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }
        let row_start = (min_y.floor() as i32).max(0);
        let row_end = (max_y.ceil() as i32).min(self.size.height as i32);

        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for row in row_start..row_end {
            // Sample at the pixel's vertical center.
            let sy = row as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (ax, ay) = points[i];
                let (bx, by) = points[(i + 1) % points.len()];
                if (ay <= sy && by > sy) || (by <= sy && ay > sy) {
                    let t = (sy - ay) / (by - ay);
                    crossings.push(ax + t * (bx - ax));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let x0 = (pair[0] - 0.5).ceil() as i32;
                let x1 = (pair[1] - 0.5).ceil() as i32;
                self.fill_span(row, x0, x1, color);
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let steps = dx.abs().max(dy.abs()).ceil();
        if !steps.is_finite() {
            return;
        }
        let steps = (steps as i32).clamp(1, 16_384);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t).floor() as i32;
            let y = (from.1 + dy * t).floor() as i32;
            self.put_pixel(x, y, color);
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color, alpha: u8) {
        if radius <= 0.0 || !radius.is_finite() || alpha == 0 {
            return;
        }
        let r2 = radius * radius;
        let y0 = (center.1 - radius).floor() as i32;
        let y1 = (center.1 + radius).ceil() as i32;
        let x0 = (center.0 - radius).floor() as i32;
        let x1 = (center.0 + radius).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = x as f32 + 0.5 - center.0;
                let py = y as f32 + 0.5 - center.1;
                if px * px + py * py <= r2 {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    fn draw_text_scaled(&mut self, x: i32, y: i32, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1);
        let adv_x = glyph_advance_x(scale);
        let adv_y = line_advance_y(scale);

        let mut cursor_x = x;
        let mut cursor_y = y;
        for ch in text.chars() {
            match ch {
                '\n' => {
                    cursor_x = x;
                    cursor_y = cursor_y.saturating_add(adv_y);
                    continue;
                }
                ' ' => {
                    cursor_x = cursor_x.saturating_add(adv_x);
                    continue;
                }
                _ => {}
            }
            self.draw_char(cursor_x, cursor_y, ch, color, scale);
            cursor_x = cursor_x.saturating_add(adv_x);
        }
    }
}

impl CpuRenderer<'_> {
    fn draw_char(&mut self, x: i32, y: i32, ch: char, color: Color, scale: u32) {
        let rows = glyph_rows(ch);
        let scale_i = scale as i32;
        for (row, bits) in rows.into_iter().enumerate() {
            let py0 = y + row as i32 * scale_i;
            for col in 0..GLYPH_W {
                let mask = 1u8 << (GLYPH_W - 1 - col);
                if (bits & mask) == 0 {
                    continue;
                }
                let px0 = x + col as i32 * scale_i;
                self.fill_rect(Rect::new(px0, py0, scale, scale), color);
            }
        }
    }
}

fn glyph_rows(ch: char) -> [u8; GLYPH_H as usize] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],

        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b111, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],

        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],

        _ => [0b111, 0b001, 0b010, 0b000, 0b010], // '?'
    }
}

/// Owned RGBA surface for headless rendering and tests.
#[derive(Debug, Clone)]
pub struct RgbaBuffer {
    size: SurfaceSize,
    buf: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
    }

    pub fn renderer(&mut self) -> CpuRenderer<'_> {
        CpuRenderer::new(&mut self.buf, self.size)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        let px = self.buf.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Hex SHA-256 of the raw RGBA bytes, for render regression checks.
    pub fn frame_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.buf))
    }
}
