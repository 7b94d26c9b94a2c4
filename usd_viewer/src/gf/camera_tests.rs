use super::*;
use glam::DVec3;

const EPS: f64 = 1e-9;

fn camera_at(position: DVec3) -> GfCamera {
    GfCamera { transform: DMat4::from_translation(position), ..GfCamera::default() }
}

// ============================================================================
// Defaults and derived values
// ============================================================================

#[test]
fn test_default_matches_schema_fallbacks() {
    let camera = GfCamera::default();
    assert_eq!(camera.projection, Projection::Perspective);
    assert_eq!(camera.horizontal_aperture, 20.955);
    assert_eq!(camera.vertical_aperture, 15.2908);
    assert_eq!(camera.focal_length, 50.0);
    assert_eq!(camera.clipping_range, Range1d::new(1.0, 1_000_000.0));
    assert_eq!(camera.transform, DMat4::IDENTITY);
}

#[test]
fn test_projection_tokens() {
    assert_eq!(Projection::from_token("orthographic"), Some(Projection::Orthographic));
    assert_eq!(Projection::from_token("perspective"), Some(Projection::Perspective));
    assert_eq!(Projection::from_token("fisheye"), None);
    assert_eq!(Projection::Orthographic.token(), "orthographic");
}

#[test]
fn test_field_of_view_and_aspect() {
    let camera = GfCamera { horizontal_aperture: 100.0, vertical_aperture: 50.0, ..GfCamera::default() };
    assert!((camera.field_of_view(FovDirection::Horizontal) - 90.0).abs() < EPS);
    assert!((camera.aspect_ratio() - 2.0).abs() < EPS);
}

// ============================================================================
// Frustum window
// ============================================================================

#[test]
fn test_perspective_window_divides_by_focal_length() {
    let frustum = GfCamera::default().frustum().unwrap();
    let window = frustum.window();
    assert!((window.max.x - 0.20955).abs() < EPS);
    assert!((window.min.x + 0.20955).abs() < EPS);
    assert!((window.max.y - 0.152908).abs() < EPS);
    assert_eq!(frustum.near_far(), Range1d::new(1.0, 1_000_000.0));
}

#[test]
fn test_orthographic_window_is_aperture_in_scene_units() {
    let camera = GfCamera {
        projection: Projection::Orthographic,
        horizontal_aperture: 20.0,
        vertical_aperture: 10.0,
        ..GfCamera::default()
    };
    let window = camera.frustum().unwrap().window();
    assert!((window.max.x - 1.0).abs() < EPS);
    assert!((window.max.y - 0.5).abs() < EPS);
}

// ============================================================================
// Projection matrix
// ============================================================================

#[test]
fn test_default_perspective_projection() {
    let projection = GfCamera::default().frustum().unwrap().compute_projection_matrix();
    let (n, f) = (1.0, 1_000_000.0);

    assert!((projection.x_axis.x - 2.0 * 50.0 / 20.955).abs() < EPS);
    assert!((projection.y_axis.y - 2.0 * 50.0 / 15.2908).abs() < EPS);
    assert!((projection.z_axis.z + (f + n) / (f - n)).abs() < EPS);
    assert!((projection.z_axis.w + 1.0).abs() < EPS);
    assert!((projection.w_axis.z + 2.0 * f * n / (f - n)).abs() < 1e-6);
    assert_eq!(projection.w_axis.w, 0.0);
}

#[test]
fn test_aperture_offset_shears_projection() {
    let camera = GfCamera { horizontal_aperture_offset: 2.0, ..GfCamera::default() };
    let projection = camera.frustum().unwrap().compute_projection_matrix();
    assert!((projection.z_axis.x - 2.0 * 2.0 / 20.955).abs() < EPS);
    assert_eq!(projection.z_axis.y, 0.0);
}

#[test]
fn test_near_plane_maps_to_minus_one() {
    let camera = GfCamera { clipping_range: Range1d::new(0.5, 100.0), ..GfCamera::default() };
    let projection = camera.frustum().unwrap().compute_projection_matrix();
    let near = projection.project_point3(DVec3::new(0.0, 0.0, -0.5));
    let far = projection.project_point3(DVec3::new(0.0, 0.0, -100.0));
    assert!((near.z + 1.0).abs() < 1e-9);
    assert!((far.z - 1.0).abs() < 1e-9);
}

#[test]
fn test_orthographic_projection() {
    let camera = GfCamera {
        projection: Projection::Orthographic,
        horizontal_aperture: 20.0,
        vertical_aperture: 10.0,
        clipping_range: Range1d::new(0.0, 10.0),
        ..GfCamera::default()
    };
    let projection = camera.frustum().unwrap().compute_projection_matrix();
    assert!((projection.x_axis.x - 1.0).abs() < EPS);
    assert!((projection.y_axis.y - 2.0).abs() < EPS);
    assert_eq!(projection.z_axis.w, 0.0);
    assert_eq!(projection.w_axis.w, 1.0);
}

// ============================================================================
// View matrix
// ============================================================================

#[test]
fn test_view_matrix_inverts_translation() {
    let view = camera_at(DVec3::new(0.0, 0.0, 10.0)).frustum().unwrap().compute_view_matrix();
    let origin = view.transform_point3(DVec3::ZERO);
    assert!(origin.abs_diff_eq(DVec3::new(0.0, 0.0, -10.0), EPS));
}

#[test]
fn test_view_matrix_inverts_rotation() {
    let transform = DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0))
        * DMat4::from_rotation_y(90f64.to_radians());
    let camera = GfCamera { transform, ..GfCamera::default() };
    let frustum = camera.frustum().unwrap();

    assert!(frustum.view_direction().abs_diff_eq(DVec3::NEG_X, EPS));
    let origin = frustum.compute_view_matrix().transform_point3(DVec3::ZERO);
    assert!(origin.abs_diff_eq(DVec3::new(0.0, 0.0, -10.0), 1e-9));
}

#[test]
fn test_view_matrix_ignores_scale() {
    let transform = DMat4::from_translation(DVec3::new(0.0, 0.0, 10.0))
        * DMat4::from_scale(DVec3::splat(2.0));
    let view = GfCamera { transform, ..GfCamera::default() }
        .frustum()
        .unwrap()
        .compute_view_matrix();
    let origin = view.transform_point3(DVec3::ZERO);
    assert!(origin.abs_diff_eq(DVec3::new(0.0, 0.0, -10.0), EPS));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_invalid_focal_length() {
    let camera = GfCamera { focal_length: 0.0, ..GfCamera::default() };
    assert!(matches!(camera.frustum(), Err(Error::InvalidCamera(_))));
}

#[test]
fn test_invalid_perspective_near() {
    let camera = GfCamera { clipping_range: Range1d::new(0.0, 10.0), ..GfCamera::default() };
    assert!(matches!(camera.frustum(), Err(Error::InvalidCamera(_))));
}

#[test]
fn test_invalid_empty_clipping_range() {
    let camera = GfCamera { clipping_range: Range1d::new(10.0, 10.0), ..GfCamera::default() };
    assert!(matches!(camera.frustum(), Err(Error::InvalidCamera(_))));
}

#[test]
fn test_invalid_aperture_and_transform() {
    let flat = GfCamera { vertical_aperture: 0.0, ..GfCamera::default() };
    assert!(flat.frustum().is_err());

    let singular = GfCamera { transform: DMat4::ZERO, ..GfCamera::default() };
    assert!(singular.frustum().is_err());

    let nan = GfCamera { focal_length: f64::NAN, ..GfCamera::default() };
    assert!(nan.frustum().is_err());
}
