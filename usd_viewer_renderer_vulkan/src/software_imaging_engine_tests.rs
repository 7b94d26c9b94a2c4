use super::*;
use crate::framebuffer::Framebuffer;
use glam::DVec3;
use usd_viewer::sdf::SdfPath;
use usd_viewer::usd::{InitialLoadSet, Stage};
use usd_viewer::Error;

const SIZE: u32 = 32;
const CENTER: u32 = SIZE / 2;

/// Red triangle at the origin, a green one far to the right with an extent,
/// a hidden subtree and an abstract class.
const SCENE: &str = r#"#usda 1.0

def Xform "world"
{
    def Mesh "red"
    {
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
        point3f[] points = [(-1, -1, 0), (1, -1, 0), (0, 1, 0)]
        color3f[] primvars:displayColor = [(1, 0, 0)]
    }

    def Mesh "far_away"
    {
        float3[] extent = [(99, -1, 0), (101, 1, 0)]
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
        point3f[] points = [(99, -1, 0), (101, -1, 0), (100, 1, 0)]
        color3f[] primvars:displayColor = [(0, 1, 0)]
    }

    def Xform "hidden"
    {
        token visibility = "invisible"

        def Mesh "blue"
        {
            int[] faceVertexCounts = [3]
            int[] faceVertexIndices = [0, 1, 2]
            point3f[] points = [(-1, -1, 1), (1, -1, 1), (0, 1, 1)]
            color3f[] primvars:displayColor = [(0, 0, 1)]
        }
    }
}

class "Template"
{
    def Mesh "template_mesh"
    {
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
        point3f[] points = [(-1, -1, 2), (1, -1, 2), (0, 1, 2)]
    }
}
"#;

/// A triangle without display color, moved by its parent, and a tilted one.
const SHADING_SCENE: &str = r#"#usda 1.0

def Xform "offset"
{
    double3 xformOp:translate = (0, 0, 1)
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Mesh "gray"
    {
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
        point3f[] points = [(-1, -1, 0), (1, -1, 0), (0, 1, 0)]
    }
}
"#;

const TILTED_SCENE: &str = r#"#usda 1.0

def Mesh "tilted"
{
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
    point3f[] points = [(-1, -0.5, 0.8660254037844386), (1, -0.5, 0.8660254037844386), (0, 0.5, -0.8660254037844386)]
    color3f[] primvars:displayColor = [(1, 0, 0)]
}
"#;

fn stage(source: &str) -> Stage {
    Stage::from_source("test.usda", source, InitialLoadSet::LoadAll).unwrap()
}

/// Camera on +Z looking at the origin, 30 degree vertical field of view.
fn camera() -> (DMat4, DMat4) {
    let view = DMat4::look_at_rh(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
    let projection = DMat4::perspective_rh_gl(30f64.to_radians(), 1.0, 1.0, 100.0);
    (view, projection)
}

fn engine() -> SoftwareImagingEngine {
    let mut engine = SoftwareImagingEngine::new(Framebuffer::shared(SIZE, SIZE, true));
    let (view, projection) = camera();
    engine.set_camera_state(view, projection);
    engine.set_render_viewport(RenderViewport::from_size(SIZE, SIZE));
    engine
}

fn render(engine: &mut SoftwareImagingEngine, stage: &Stage, params: &RenderParams) {
    engine.render(stage, &stage.pseudo_root(), params).unwrap();
}

fn center_pixel(engine: &SoftwareImagingEngine) -> [u8; 4] {
    engine.framebuffer().lock().unwrap().pixel(CENTER, CENTER).unwrap()
}

// ============================================================================
// AOV and camera state
// ============================================================================

#[test]
fn test_supported_aovs() {
    let mut engine = SoftwareImagingEngine::new(Framebuffer::shared(1, 1, true));
    assert_eq!(engine.aov(), Aov::Color);

    engine.set_renderer_aov("depth").unwrap();
    assert_eq!(engine.aov(), Aov::Depth);
    engine.set_renderer_aov("color").unwrap();
    assert_eq!(engine.aov(), Aov::Color);
}

#[test]
fn test_unsupported_aov_is_rejected() {
    let mut engine = SoftwareImagingEngine::new(Framebuffer::shared(1, 1, true));
    let err = engine.set_renderer_aov("normal").unwrap_err();
    assert!(matches!(err, Error::BackendError(ref msg) if msg.contains("normal")));
    assert_eq!(engine.aov(), Aov::Color);
}

#[test]
fn test_render_without_camera_fails() {
    let stage = stage(SCENE);
    let mut engine = SoftwareImagingEngine::new(Framebuffer::shared(SIZE, SIZE, true));
    engine.set_render_viewport(RenderViewport::from_size(SIZE, SIZE));

    let result = engine.render(&stage, &stage.pseudo_root(), &RenderParams::default());
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_camera_state_is_stored() {
    let engine = engine();
    let (view, projection) = camera();
    assert_eq!(engine.camera_state(), Some(CameraState::new(view, projection)));
    assert_eq!(engine.viewport(), RenderViewport::from_size(SIZE, SIZE));
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_draws_visible_meshes_in_view() {
    let stage = stage(SCENE);
    let mut engine = engine();
    render(&mut engine, &stage, &RenderParams::default());

    assert_eq!(center_pixel(&engine), [255, 0, 0, 255]);
    let stats = engine.last_stats();
    assert_eq!(stats.meshes_drawn, 1);
    assert_eq!(stats.meshes_culled, 1);
    assert_eq!(stats.meshes_hidden, 1);
    assert_eq!(stats.triangles, 1);
    assert!(stats.fragments > 0);
}

#[test]
fn test_extent_culling_can_be_disabled() {
    let stage = stage(SCENE);
    let mut engine = engine();
    let params = RenderParams { cull_with_extent: false, ..RenderParams::default() };
    render(&mut engine, &stage, &params);

    let stats = engine.last_stats();
    assert_eq!(stats.meshes_drawn, 2);
    assert_eq!(stats.meshes_culled, 0);
    assert_eq!(stats.triangles, 2);
}

#[test]
fn test_render_from_subtree_root() {
    let stage = stage(SCENE);
    let mut engine = engine();
    let hidden = stage.prim_at_path(&SdfPath::new("/world/hidden").unwrap()).unwrap();

    engine.render(&stage, &hidden, &RenderParams::default()).unwrap();

    assert_eq!(engine.last_stats().meshes_drawn, 0);
    assert_eq!(engine.last_stats().meshes_hidden, 1);
    assert_eq!(center_pixel(&engine), [0, 0, 0, 255]);
}

#[test]
fn test_missing_display_color_uses_fallback_and_parent_transform() {
    let stage = stage(SHADING_SCENE);
    let mut engine = engine();
    render(&mut engine, &stage, &RenderParams::default());

    assert_eq!(center_pixel(&engine), [128, 128, 128, 255]);

    // Parent translation puts the triangle at z = 1, 9 units from the eye
    let depth = engine.framebuffer().lock().unwrap().depth_at(CENTER, CENTER).unwrap();
    let (_, projection) = camera();
    let clip = projection * glam::DVec4::new(0.0, 0.0, -9.0, 1.0);
    let expected = (clip.z / clip.w + 1.0) * 0.5;
    assert!((f64::from(depth) - expected).abs() < 1e-5);
}

#[test]
fn test_viewport_limits_drawing() {
    let stage = stage(SCENE);
    let mut engine = engine();
    engine.set_render_viewport(RenderViewport::from_size(0, 0));
    render(&mut engine, &stage, &RenderParams::default());

    assert_eq!(engine.last_stats().fragments, 0);
    assert_eq!(center_pixel(&engine), [0, 0, 0, 255]);
}

// ============================================================================
// Shading and depth AOV
// ============================================================================

#[test]
fn test_headlight_on_facing_triangle_keeps_color() {
    let stage = stage(SCENE);
    let mut engine = engine();
    let params = RenderParams { enable_lighting: true, ..RenderParams::default() };
    render(&mut engine, &stage, &params);

    assert_eq!(center_pixel(&engine), [255, 0, 0, 255]);
}

#[test]
fn test_headlight_darkens_tilted_triangle() {
    let stage = stage(TILTED_SCENE);
    let mut engine = engine();
    let params = RenderParams { enable_lighting: true, ..RenderParams::default() };
    render(&mut engine, &stage, &params);

    // Normal at 60 degrees from the view axis
    let expected = (AMBIENT + (1.0 - AMBIENT) * 0.5) * 255.0;
    let [r, g, b, _] = center_pixel(&engine);
    assert!((f64::from(r) - expected).abs() <= 1.0, "r = {}", r);
    assert_eq!((g, b), (0, 0));
}

#[test]
fn test_depth_aov_writes_grayscale() {
    let stage = stage(SCENE);
    let mut engine = engine();
    engine.set_renderer_aov("depth").unwrap();
    render(&mut engine, &stage, &RenderParams::default());

    let fb = engine.framebuffer().lock().unwrap();
    let [r, g, b, a] = fb.pixel(CENTER, CENTER).unwrap();
    assert_eq!((r, a), (g, 255));
    assert_eq!(g, b);
    assert!(r > 0);
    // Background keeps the far depth
    assert_eq!(fb.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn test_vertex_color_lookup() {
    let triangle = Triangle { points: [2, 0, 1], face_vertices: [3, 4, 5], face: 1 };
    let values: Vec<DVec3> = (0..6).map(|i| DVec3::splat(f64::from(i))).collect();

    let pick = |interpolation| vertex_color(Some(&(values.clone(), interpolation)), &triangle, 0);
    assert_eq!(pick(Interpolation::Constant), DVec3::splat(0.0));
    assert_eq!(pick(Interpolation::Uniform), DVec3::splat(1.0));
    assert_eq!(pick(Interpolation::Vertex), DVec3::splat(2.0));
    assert_eq!(pick(Interpolation::FaceVarying), DVec3::splat(3.0));

    assert_eq!(vertex_color(None, &triangle, 0), FALLBACK_DISPLAY_COLOR);
    let short = (vec![DVec3::ONE], Interpolation::FaceVarying);
    assert_eq!(vertex_color(Some(&short), &triangle, 2), FALLBACK_DISPLAY_COLOR);
}
