use crate::content::Sprite;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Integer pixel offset applied to a whole-layer blit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlitOffset {
    pub x: i32,
    pub y: i32,
}

/// Software RGBA8 drawing surface with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    /// Creates a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    /// Draws `sprite` with its top-left corner at `(x, y)`, optionally
    /// mirrored horizontally. Fully transparent source pixels are skipped.
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32, flip_x: bool) {
        let sprite_w = sprite.width() as i32;
        let sprite_h = sprite.height() as i32;
        let src = sprite.rgba();
        for sy in 0..sprite_h {
            let dy = y + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..sprite_w {
                let dx = x + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let src_x = if flip_x { sprite_w - 1 - sx } else { sx };
                let src_offset = (sy as usize * sprite_w as usize + src_x as usize) * 4;
                let mut color = [0u8; 4];
                color.copy_from_slice(&src[src_offset..src_offset + 4]);
                self.blend_pixel(dx, dy, color);
            }
        }
    }

    /// Composites another canvas over this one.
    pub fn blit_canvas(&mut self, source: &Canvas, offset: BlitOffset) {
        self.for_each_source_pixel(source, offset, |dst, x, y, color| {
            dst.blend_pixel(x, y, color);
        });
    }

    /// Draws every non-transparent pixel of `source` in a single `color`.
    /// Used for the outline pass behind the foreground layer.
    pub fn blit_silhouette(&mut self, source: &Canvas, offset: BlitOffset, color: [u8; 4]) {
        self.for_each_source_pixel(source, offset, |dst, x, y, src| {
            if src[3] > 0 {
                dst.blend_pixel(x, y, color);
            }
        });
    }

    /// Scanline fill of a simple polygon (even-odd rule, pixel centers).
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: [u8; 4]) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }
        let row_start = (min_y.floor() as i32).max(0);
        let row_end = (max_y.ceil() as i32).min(self.height as i32 - 1);
        let mut crossings: Vec<f64> = Vec::with_capacity(points.len());

        for row in row_start..=row_end {
            let sample_y = row as f64 + 0.5;
            crossings.clear();
            for (index, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(index + 1) % points.len()];
                let spans_row = (y0 <= sample_y && y1 > sample_y) || (y1 <= sample_y && y0 > sample_y);
                if spans_row {
                    let t = (sample_y - y0) / (y1 - y0);
                    crossings.push(x0 + t * (x1 - x0));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let first = (pair[0] - 0.5).ceil() as i32;
                let last = (pair[1] - 0.5).floor() as i32;
                for column in first.max(0)..=last.min(self.width as i32 - 1) {
                    self.blend_pixel(column, row, color);
                }
            }
        }
    }

    /// Paints every pixel whose center lies outside the circle. A radius of
    /// zero or less paints the whole canvas.
    pub fn fill_outside_circle(&mut self, center_x: f64, center_y: f64, radius: f64, color: [u8; 4]) {
        let radius_sq = radius.max(0.0) * radius.max(0.0);
        for y in 0..self.height as i32 {
            let dy = y as f64 + 0.5 - center_y;
            for x in 0..self.width as i32 {
                let dx = x as f64 + 0.5 - center_x;
                if radius <= 0.0 || dx * dx + dy * dy > radius_sq {
                    self.write_pixel(x, y, color);
                }
            }
        }
    }

    /// Writes the canvas into an opaque frame of the same size, shifted by
    /// `offset`. Uncovered frame pixels become black.
    pub fn copy_to_frame(&self, frame: &mut [u8], offset: BlitOffset) {
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0, 0, 0, 255]);
        }
        let width = self.width as i32;
        let height = self.height as i32;
        for y in 0..height {
            let dy = y + offset.y;
            if dy < 0 || dy >= height {
                continue;
            }
            for x in 0..width {
                let dx = x + offset.x;
                if dx < 0 || dx >= width {
                    continue;
                }
                let src = (y as usize * width as usize + x as usize) * 4;
                let dst = (dy as usize * width as usize + dx as usize) * 4;
                if dst + 4 > frame.len() {
                    continue;
                }
                frame[dst..dst + 3].copy_from_slice(&self.rgba[src..src + 3]);
                frame[dst + 3] = 255;
            }
        }
    }

    fn for_each_source_pixel(
        &mut self,
        source: &Canvas,
        offset: BlitOffset,
        mut apply: impl FnMut(&mut Canvas, i32, i32, [u8; 4]),
    ) {
        for sy in 0..source.height as i32 {
            let dy = sy + offset.y;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..source.width as i32 {
                let dx = sx + offset.x;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let Some(color) = source.pixel(sx, sy) else {
                    continue;
                };
                apply(self, dx, dy, color);
            }
        }
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    fn write_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.rgba[offset..offset + 4].copy_from_slice(&color);
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let alpha = color[3] as u32;
        if alpha == 0 {
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        if alpha == 255 {
            self.rgba[offset..offset + 4].copy_from_slice(&color);
            return;
        }
        let dst = &mut self.rgba[offset..offset + 4];
        let dst_alpha = dst[3] as u32;
        let inv = 255 - alpha;
        let out_alpha = alpha + dst_alpha * inv / 255;
        if out_alpha == 0 {
            return;
        }
        for channel in 0..3 {
            let src_term = color[channel] as u32 * alpha;
            let dst_term = dst[channel] as u32 * dst_alpha * inv / 255;
            dst[channel] = ((src_term + dst_term) / out_alpha).min(255) as u8;
        }
        dst[3] = out_alpha.min(255) as u8;
    }
}
