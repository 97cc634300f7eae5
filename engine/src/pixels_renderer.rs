use crate::graphics::{CpuRenderer, Renderer2d, SurfaceSize};

use pixels::Pixels;

/// Headful presenter built on `pixels`.
///
/// Game code draws through `Renderer2d`; this type owns the window-sized RGBA buffer and
/// keeps it in sync with the window surface on resize.
pub struct PixelsRenderer2d {
    pixels: Pixels,
    size: SurfaceSize,
}

impl PixelsRenderer2d {
    pub fn new(mut pixels: Pixels, size: SurfaceSize) -> Result<Self, pixels::Error> {
        pixels.resize_buffer(size.width.max(1), size.height.max(1))?;
        Ok(Self { pixels, size })
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn resize(&mut self, size: SurfaceSize) -> Result<(), pixels::Error> {
        if size.is_empty() {
            // Minimized windows report 0x0; keep the previous buffer.
            return Ok(());
        }
        log::debug!("resizing surface to {}x{}", size.width, size.height);
        self.size = size;
        self.pixels.resize_surface(size.width, size.height)?;
        self.pixels.resize_buffer(size.width, size.height)?;
        Ok(())
    }

    pub fn draw_frame<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn Renderer2d) -> R,
    {
        let mut cpu = CpuRenderer::new(self.pixels.frame_mut(), self.size);
        cpu.begin_frame(self.size);
        f(&mut cpu)
    }

    pub fn present(&mut self) -> Result<(), pixels::Error> {
        self.pixels.render()
    }

    /// Converts a window-space physical position into buffer pixel coordinates.
    pub fn window_pos_to_pixel(&self, position: (f32, f32)) -> (f32, f32) {
        match self.pixels.window_pos_to_pixel(position) {
            Ok((x, y)) => (x as f32, y as f32),
            Err((x, y)) => (x as f32, y as f32),
        }
    }
}
