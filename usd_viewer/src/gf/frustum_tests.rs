use super::*;
use crate::gf::GfCamera;

fn camera_frustum(position: DVec3) -> Frustum {
    GfCamera { transform: DMat4::from_translation(position), ..GfCamera::default() }
        .frustum()
        .unwrap()
}

fn unit_box(center: DVec3) -> Aabb {
    Aabb::new(center - DVec3::ONE, center + DVec3::ONE)
}

// ============================================================================
// FrustumPlanes::from_view_projection
// ============================================================================

#[test]
fn test_planes_are_normalized() {
    let planes = camera_frustum(DVec3::new(0.0, 0.0, 10.0)).planes();
    for plane in &planes.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-9, "plane normal should be unit length");
    }
}

#[test]
fn test_identity_planes_bound_ndc_cube() {
    let planes = FrustumPlanes::from_view_projection(&DMat4::IDENTITY);
    assert_eq!(planes.classify_aabb(&Aabb::new(DVec3::splat(-0.5), DVec3::splat(0.5))), FrustumTest::Inside);
    assert_eq!(planes.classify_aabb(&unit_box(DVec3::new(5.0, 0.0, 0.0))), FrustumTest::Outside);
}

#[test]
fn test_near_plane_faces_view_direction() {
    let frustum = camera_frustum(DVec3::ZERO);
    let near = frustum.planes().planes[PLANE_NEAR];
    // a point just past the near plane is inside
    assert!(near.truncate().dot(DVec3::new(0.0, 0.0, -1.5)) + near.w > 0.0);
    assert!(near.truncate().dot(DVec3::new(0.0, 0.0, -0.5)) + near.w < 0.0);
}

// ============================================================================
// Frustum::intersects_aabb
// ============================================================================

#[test]
fn test_box_in_front_of_camera() {
    let frustum = camera_frustum(DVec3::new(0.0, 0.0, 10.0));
    assert!(frustum.intersects_aabb(&unit_box(DVec3::ZERO)));
    assert_eq!(frustum.planes().classify_aabb(&unit_box(DVec3::ZERO)), FrustumTest::Inside);
}

#[test]
fn test_box_behind_camera() {
    let frustum = camera_frustum(DVec3::new(0.0, 0.0, 10.0));
    assert!(!frustum.intersects_aabb(&unit_box(DVec3::new(0.0, 0.0, 20.0))));
}

#[test]
fn test_box_outside_side_planes() {
    let frustum = camera_frustum(DVec3::new(0.0, 0.0, 10.0));
    assert!(!frustum.intersects_aabb(&unit_box(DVec3::new(1000.0, 0.0, 0.0))));
    assert!(!frustum.intersects_aabb(&unit_box(DVec3::new(0.0, -1000.0, 0.0))));
}

#[test]
fn test_box_straddling_near_plane_is_partial() {
    let frustum = camera_frustum(DVec3::ZERO);
    let straddling = Aabb::new(DVec3::new(-0.1, -0.1, -2.0), DVec3::new(0.1, 0.1, 0.5));
    assert_eq!(frustum.planes().classify_aabb(&straddling), FrustumTest::Partial);
    assert!(frustum.intersects_aabb(&straddling));
}

// ============================================================================
// Aabb helpers
// ============================================================================

#[test]
fn test_aabb_from_points_and_transform() {
    let points = [DVec3::new(-1.0, 0.0, 2.0), DVec3::new(3.0, -2.0, 0.0)];
    let aabb = Aabb::from_points(&points).unwrap();
    assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, 0.0));
    assert_eq!(aabb.max, DVec3::new(3.0, 0.0, 2.0));
    assert!(Aabb::from_points(&[]).is_none());

    let moved = aabb.transformed(&DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0)));
    assert_eq!(moved.min.x, 9.0);
    assert_eq!(moved.max.x, 13.0);

    let rotated = unit_box(DVec3::ZERO).transformed(&DMat4::from_rotation_z(45f64.to_radians()));
    assert!((rotated.max.x - 2f64.sqrt()).abs() < 1e-9);
}
