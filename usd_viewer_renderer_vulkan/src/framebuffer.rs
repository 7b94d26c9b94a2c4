/// Framebuffer - CPU color and depth targets shared by the window system and
/// the imaging engine
///
/// Color is stored as RGBA8 rows from the top-left corner. Depth is stored in
/// window space, 0.0 at the near plane and 1.0 at the far plane.

use std::sync::{Arc, Mutex};

use usd_viewer::window::ClearMask;

/// Framebuffer handle shared between the window system (clear, present) and
/// the imaging engine (rasterization).
pub type SharedFramebuffer = Arc<Mutex<Framebuffer>>;

/// Far-plane depth used to clear the depth target.
pub const CLEAR_DEPTH: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
    has_depth: bool,
    clear_color: [u8; 4],
}

impl Framebuffer {
    /// Create a framebuffer cleared to opaque black (and far depth).
    pub fn new(width: u32, height: u32, has_depth: bool) -> Self {
        let count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![[0, 0, 0, 255]; count],
            depth: if has_depth { vec![CLEAR_DEPTH; count] } else { Vec::new() },
            has_depth,
            clear_color: [0, 0, 0, 255],
        }
    }

    pub fn shared(width: u32, height: u32, has_depth: bool) -> SharedFramebuffer {
        Arc::new(Mutex::new(Self::new(width, height, has_depth)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_depth(&self) -> bool {
        self.has_depth
    }

    /// Resize both targets. Contents are undefined until the next clear.
    ///
    /// Returns `false` when the size did not change.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if (width, height) == (self.width, self.height) {
            return false;
        }
        let count = (width as usize) * (height as usize);
        self.width = width;
        self.height = height;
        self.color.resize(count, self.clear_color);
        if self.has_depth {
            self.depth.resize(count, CLEAR_DEPTH);
        }
        true
    }

    /// Set the clear color from normalized RGBA.
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color.map(unorm8);
    }

    pub fn clear_color(&self) -> [u8; 4] {
        self.clear_color
    }

    pub fn clear(&mut self, mask: ClearMask) {
        if mask.contains(ClearMask::COLOR) {
            self.color.fill(self.clear_color);
        }
        if mask.contains(ClearMask::DEPTH) && self.has_depth {
            self.depth.fill(CLEAR_DEPTH);
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize) * (self.width as usize) + x as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.color[i])
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        if !self.has_depth {
            return None;
        }
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.color[i] = color;
        }
    }

    /// Depth-tested write (less-than). Without a depth target every write
    /// passes.
    ///
    /// Returns `true` when the fragment was written.
    pub fn write_fragment(&mut self, x: u32, y: u32, depth: f32, color: [u8; 4]) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.has_depth {
            if depth >= self.depth[i] {
                return false;
            }
            self.depth[i] = depth;
        }
        self.color[i] = color;
        true
    }

    /// Replace the color target with a grayscale view of the depth target
    /// (near = white, far = black).
    pub fn resolve_depth_to_color(&mut self) {
        if !self.has_depth {
            return;
        }
        for (color, &depth) in self.color.iter_mut().zip(&self.depth) {
            let v = unorm8(1.0 - depth);
            *color = [v, v, v, 255];
        }
    }

    /// Color target as tightly packed RGBA8 bytes.
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color)
    }

    /// Color rows with red and blue swapped, for BGRA surfaces.
    pub fn color_bytes_bgra(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.color.len() * 4);
        for [r, g, b, a] in &self.color {
            bytes.extend_from_slice(&[*b, *g, *r, *a]);
        }
        bytes
    }
}

/// Normalized float to 8-bit unsigned, clamped.
pub fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
