/// SoftwareImagingEngine - CPU implementation of the ImagingEngine trait
///
/// Walks the stage below the render root, evaluates each visible `Mesh`
/// prim at the render time, culls it by its authored extent and rasterizes
/// its triangles into the shared framebuffer. The window system presents the
/// framebuffer on `swap_buffers`.

use glam::{DMat4, DVec3};
use usd_viewer::gf::FrustumPlanes;
use usd_viewer::imaging::{
    CameraState, ImagingEngine, RenderParams, RenderViewport, COLOR_AOV, DEPTH_AOV,
};
use usd_viewer::usd::{Prim, SceneStage, TimeCode};
use usd_viewer::usd_geom::mesh::{FALLBACK_DISPLAY_COLOR, MESH_TYPE_NAME};
use usd_viewer::usd_geom::{Interpolation, Triangle, UsdGeomMesh, UsdGeomXformable};
use usd_viewer::{viewer_bail, viewer_debug, viewer_err, viewer_trace, Result};

use crate::framebuffer::{Framebuffer, SharedFramebuffer};
use crate::rasterizer::{draw_triangle, ClipVertex};

/// Share of the surface color kept on faces seen edge-on when lit.
const AMBIENT: f64 = 0.2;

/// Output variables this engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aov {
    Color,
    /// Window-space depth as grayscale (near = white)
    Depth,
}

impl Aov {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            COLOR_AOV => Some(Aov::Color),
            DEPTH_AOV => Some(Aov::Depth),
            _ => None,
        }
    }
}

/// Counters for the last `render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub meshes_drawn: usize,
    pub meshes_culled: usize,
    /// Meshes skipped through `visibility = "invisible"` on them or an ancestor
    pub meshes_hidden: usize,
    pub triangles: usize,
    pub fragments: usize,
}

pub struct SoftwareImagingEngine {
    framebuffer: SharedFramebuffer,
    aov: Aov,
    camera: Option<CameraState>,
    viewport: RenderViewport,
    stats: RenderStats,
}

impl SoftwareImagingEngine {
    pub fn new(framebuffer: SharedFramebuffer) -> Self {
        Self {
            framebuffer,
            aov: Aov::Color,
            camera: None,
            viewport: RenderViewport::from_size(0, 0),
            stats: RenderStats::default(),
        }
    }

    pub fn framebuffer(&self) -> &SharedFramebuffer {
        &self.framebuffer
    }

    pub fn aov(&self) -> Aov {
        self.aov
    }

    pub fn camera_state(&self) -> Option<CameraState> {
        self.camera
    }

    pub fn viewport(&self) -> RenderViewport {
        self.viewport
    }

    pub fn last_stats(&self) -> RenderStats {
        self.stats
    }
}

impl ImagingEngine for SoftwareImagingEngine {
    fn set_renderer_aov(&mut self, aov: &str) -> Result<()> {
        match Aov::from_name(aov) {
            Some(selected) => {
                self.aov = selected;
                viewer_debug!("usd_viewer::software", "Renderer AOV set to '{}'", aov);
                Ok(())
            }
            None => viewer_bail!("usd_viewer::software", "Unsupported renderer AOV '{}'", aov),
        }
    }

    fn set_camera_state(&mut self, view: DMat4, projection: DMat4) {
        self.camera = Some(CameraState::new(view, projection));
    }

    fn set_render_viewport(&mut self, viewport: RenderViewport) {
        self.viewport = viewport;
    }

    fn render(&mut self, stage: &dyn SceneStage, root: &Prim, params: &RenderParams) -> Result<()> {
        let Some(camera) = self.camera else {
            viewer_bail!("usd_viewer::software", "render called before set_camera_state");
        };

        let mut framebuffer = self
            .framebuffer
            .lock()
            .map_err(|_| viewer_err!("usd_viewer::software", "Framebuffer lock poisoned"))?;

        let mut pass = MeshPass {
            stage,
            time: params.time,
            view: camera.view,
            view_projection: camera.view_projection(),
            planes: FrustumPlanes::from_view_projection(&camera.view_projection()),
            params,
            viewport: self.viewport,
            stats: RenderStats::default(),
        };
        pass.run(&mut framebuffer, root);

        if self.aov == Aov::Depth {
            framebuffer.resolve_depth_to_color();
        }

        self.stats = pass.stats;
        viewer_trace!(
            "usd_viewer::software",
            "Rendered {} meshes ({} culled, {} hidden), {} triangles, {} fragments",
            self.stats.meshes_drawn,
            self.stats.meshes_culled,
            self.stats.meshes_hidden,
            self.stats.triangles,
            self.stats.fragments
        );
        Ok(())
    }
}

/// State of one `render` call.
struct MeshPass<'a> {
    stage: &'a dyn SceneStage,
    time: TimeCode,
    view: DMat4,
    view_projection: DMat4,
    planes: FrustumPlanes,
    params: &'a RenderParams,
    viewport: RenderViewport,
    stats: RenderStats,
}

impl MeshPass<'_> {
    /// Depth-first walk in authored order. Undefined or abstract prims and
    /// invisible prims prune their subtree.
    fn run(&mut self, framebuffer: &mut Framebuffer, root: &Prim) {
        let mut stack = vec![root.clone()];

        while let Some(prim) = stack.pop() {
            if !prim.is_pseudo_root() && (!prim.is_defined() || prim.is_abstract()) {
                continue;
            }
            if self.is_invisible(&prim) {
                self.stats.meshes_hidden += self.count_meshes(&prim);
                continue;
            }
            if prim.type_name() == MESH_TYPE_NAME {
                self.draw_mesh(framebuffer, &prim);
            }

            let children = self.stage.children(&prim);
            stack.extend(children.into_iter().rev());
        }
    }

    fn is_invisible(&self, prim: &Prim) -> bool {
        self.stage
            .attribute(prim, "visibility", self.time)
            .is_some_and(|v| v.as_str() == Some("invisible"))
    }

    fn count_meshes(&self, prim: &Prim) -> usize {
        let own = usize::from(prim.type_name() == MESH_TYPE_NAME);
        own + self
            .stage
            .children(prim)
            .iter()
            .map(|child| self.count_meshes(child))
            .sum::<usize>()
    }

    fn draw_mesh(&mut self, framebuffer: &mut Framebuffer, prim: &Prim) {
        let Ok(mesh) = UsdGeomMesh::new(self.stage, prim.clone()) else {
            return;
        };
        let world = UsdGeomXformable::new(self.stage, prim.clone()).local_to_world(self.time);

        if self.params.cull_with_extent {
            if let Some(extent) = mesh.extent(self.time) {
                if !self.planes.intersects_aabb(&extent.transformed(&world)) {
                    self.stats.meshes_culled += 1;
                    return;
                }
            }
        }

        let points = mesh.points(self.time);
        let triangles = mesh.triangulate(self.time);
        let colors = mesh.display_color(self.time);
        let model_view = self.view * world;
        let model_view_projection = self.view_projection * world;

        for triangle in &triangles {
            let positions = triangle.points.map(|i| points[i]);
            let shade = if self.params.enable_lighting {
                headlight(&positions.map(|p| model_view.transform_point3(p)))
            } else {
                1.0
            };

            let vertices: [ClipVertex; 3] = std::array::from_fn(|k| {
                ClipVertex::new(
                    model_view_projection * positions[k].extend(1.0),
                    vertex_color(colors.as_ref(), triangle, k) * shade,
                )
            });
            self.stats.fragments += draw_triangle(framebuffer, &self.viewport, &vertices);
        }

        self.stats.triangles += triangles.len();
        self.stats.meshes_drawn += 1;
    }
}

/// Two-sided headlight: full color facing the camera, `AMBIENT` edge-on.
fn headlight(view_positions: &[DVec3; 3]) -> f64 {
    let [a, b, c] = view_positions;
    let normal = (*b - *a).cross(*c - *a).normalize_or_zero();
    AMBIENT + (1.0 - AMBIENT) * normal.z.abs()
}

/// Display color of corner `k` of `triangle`.
fn vertex_color(colors: Option<&(Vec<DVec3>, Interpolation)>, triangle: &Triangle, k: usize) -> DVec3 {
    let Some((values, interpolation)) = colors else {
        return FALLBACK_DISPLAY_COLOR;
    };
    let index = match interpolation {
        Interpolation::Constant => 0,
        Interpolation::Uniform => triangle.face,
        Interpolation::Vertex => triangle.points[k],
        Interpolation::FaceVarying => triangle.face_vertices[k],
    };
    values.get(index).copied().unwrap_or(FALLBACK_DISPLAY_COLOR)
}

#[cfg(test)]
#[path = "software_imaging_engine_tests.rs"]
mod tests;
