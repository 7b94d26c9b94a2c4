/// Rasterizer - triangle rasterization into a `Framebuffer`
///
/// Triangles arrive in clip space (GL depth range). They are clipped against
/// the near and far planes, divided by w, mapped through the viewport and
/// filled with edge functions. Colors are interpolated perspective-correct;
/// depth is interpolated linearly in window space.

use glam::{DVec3, DVec4};
use usd_viewer::imaging::RenderViewport;

use crate::framebuffer::{unorm8, Framebuffer};

/// Triangles thinner than this (in pixels squared) are dropped.
const MIN_AREA: f64 = 1e-12;

/// Vertex after the vertex transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    /// Clip-space position
    pub position: DVec4,
    /// Linear RGB in [0, 1]
    pub color: DVec3,
}

impl ClipVertex {
    pub fn new(position: DVec4, color: DVec3) -> Self {
        Self { position, color }
    }

    fn lerp(&self, other: &ClipVertex, t: f64) -> ClipVertex {
        ClipVertex {
            position: self.position.lerp(other.position, t),
            color: self.color.lerp(other.color, t),
        }
    }
}

/// Vertex in window space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WindowVertex {
    /// Pixel x, pixel y (rows from the top), depth in [0, 1]
    position: DVec3,
    /// 1 / w_clip
    inv_w: f64,
    color: DVec3,
}

/// Pixel-space rectangle, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scissor {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Scissor {
    /// Intersection of the viewport with the framebuffer bounds.
    pub fn from_viewport(viewport: &RenderViewport, width: u32, height: u32) -> Self {
        let clamp = |v: f64, max: u32| v.floor().clamp(0.0, f64::from(max)) as u32;
        let clamp_up = |v: f64, max: u32| v.ceil().clamp(0.0, f64::from(max)) as u32;
        Self {
            min_x: clamp(viewport.x, width),
            min_y: clamp(viewport.y, height),
            max_x: clamp_up(viewport.x + viewport.width, width),
            max_y: clamp_up(viewport.y + viewport.height, height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }
}

/// Map normalized device coordinates to window space: pixel x, pixel y with
/// rows counted from the top, depth in [0, 1].
pub fn viewport_transform(ndc: DVec3, viewport: &RenderViewport) -> DVec3 {
    DVec3::new(
        viewport.x + (ndc.x + 1.0) * 0.5 * viewport.width,
        viewport.y + (1.0 - ndc.y) * 0.5 * viewport.height,
        (ndc.z + 1.0) * 0.5,
    )
}

/// Clip a triangle against the near (`z >= -w`) and far (`z <= w`) planes.
///
/// Returns the clipped convex polygon, empty when fully outside.
pub fn clip_depth(triangle: &[ClipVertex; 3]) -> Vec<ClipVertex> {
    let near = |v: &ClipVertex| v.position.z + v.position.w;
    let far = |v: &ClipVertex| v.position.w - v.position.z;

    let polygon = clip_polygon(triangle.to_vec(), near);
    clip_polygon(polygon, far)
}

/// Sutherland-Hodgman against one plane; `distance >= 0` is inside.
fn clip_polygon(polygon: Vec<ClipVertex>, distance: impl Fn(&ClipVertex) -> f64) -> Vec<ClipVertex> {
    if polygon.is_empty() {
        return polygon;
    }
    let mut out = Vec::with_capacity(polygon.len() + 2);

    for i in 0..polygon.len() {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % polygon.len()];
        let d_current = distance(current);
        let d_next = distance(next);

        if d_current >= 0.0 {
            out.push(*current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            let t = d_current / (d_current - d_next);
            out.push(current.lerp(next, t));
        }
    }
    out
}

/// Rasterize one clip-space triangle.
///
/// Returns the number of fragments that passed the depth test.
pub fn draw_triangle(
    framebuffer: &mut Framebuffer,
    viewport: &RenderViewport,
    triangle: &[ClipVertex; 3],
) -> usize {
    if viewport.is_empty() {
        return 0;
    }
    let scissor = Scissor::from_viewport(viewport, framebuffer.width(), framebuffer.height());
    if scissor.is_empty() {
        return 0;
    }

    let polygon = clip_depth(triangle);
    if polygon.len() < 3 {
        return 0;
    }

    let window: Vec<WindowVertex> = polygon
        .iter()
        .filter(|v| v.position.w > 0.0)
        .map(|v| {
            let inv_w = 1.0 / v.position.w;
            WindowVertex {
                position: viewport_transform(v.position.truncate() * inv_w, viewport),
                inv_w,
                color: v.color,
            }
        })
        .collect();
    if window.len() < 3 {
        return 0;
    }

    let mut written = 0;
    for k in 1..window.len() - 1 {
        written += fill(framebuffer, &scissor, [window[0], window[k], window[k + 1]]);
    }
    written
}

fn edge(a: DVec3, b: DVec3, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Top-left fill rule for an edge `a -> b` of a triangle with positive area
/// (clockwise on screen, y down): top edges run flat to the right, left
/// edges run upward.
fn is_top_left(a: DVec3, b: DVec3) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

/// A pixel center exactly on an edge belongs to the triangle only when
/// that edge is a top or left edge.
fn covers(e: f64, top_left: bool) -> bool {
    e > 0.0 || (e == 0.0 && top_left)
}

fn fill(framebuffer: &mut Framebuffer, scissor: &Scissor, [v0, mut v1, mut v2]: [WindowVertex; 3]) -> usize {
    let mut area = edge(v0.position, v1.position, v2.position.x, v2.position.y);
    if area.abs() < MIN_AREA {
        return 0;
    }
    if area < 0.0 {
        std::mem::swap(&mut v1, &mut v2);
        area = -area;
    }
    let (p0, p1, p2) = (v0.position, v1.position, v2.position);
    let top_left = [is_top_left(p1, p2), is_top_left(p2, p0), is_top_left(p0, p1)];

    let min_x = p0.x.min(p1.x).min(p2.x).floor().max(f64::from(scissor.min_x)) as u32;
    let min_y = p0.y.min(p1.y).min(p2.y).floor().max(f64::from(scissor.min_y)) as u32;
    let max_x = (p0.x.max(p1.x).max(p2.x).ceil() as i64).min(i64::from(scissor.max_x));
    let max_y = (p0.y.max(p1.y).max(p2.y).ceil() as i64).min(i64::from(scissor.max_y));

    let mut written = 0;
    for y in min_y..max_y.max(0) as u32 {
        let py = f64::from(y) + 0.5;
        for x in min_x..max_x.max(0) as u32 {
            let px = f64::from(x) + 0.5;

            let e0 = edge(p1, p2, px, py);
            let e1 = edge(p2, p0, px, py);
            let e2 = edge(p0, p1, px, py);
            if !(covers(e0, top_left[0]) && covers(e1, top_left[1]) && covers(e2, top_left[2])) {
                continue;
            }
            let (b0, b1, b2) = (e0 / area, e1 / area, e2 / area);

            let depth = b0 * p0.z + b1 * p1.z + b2 * p2.z;

            let w0 = b0 * v0.inv_w;
            let w1 = b1 * v1.inv_w;
            let w2 = b2 * v2.inv_w;
            let sum = w0 + w1 + w2;
            let color = (v0.color * w0 + v1.color * w1 + v2.color * w2) / sum;

            let rgba = [unorm8(color.x as f32), unorm8(color.y as f32), unorm8(color.z as f32), 255];
            if framebuffer.write_fragment(x, y, depth as f32, rgba) {
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
#[path = "rasterizer_tests.rs"]
mod tests;
