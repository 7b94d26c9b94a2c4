use super::*;
use crate::sdf::SdfPath;
use crate::usd::{InitialLoadSet, Stage};
use glam::DVec3;

const EPS: f64 = 1e-9;

fn stage(body: &str) -> Stage {
    let src = format!("#usda 1.0\n{}", body);
    Stage::from_source("xform.usda", &src, InitialLoadSet::LoadAll).unwrap()
}

fn world_point(stage: &Stage, path: &str, p: DVec3) -> DVec3 {
    let prim = stage.prim_at_path(&SdfPath::new(path).unwrap()).unwrap();
    UsdGeomXformable::new(stage, prim)
        .local_to_world(TimeCode::Default)
        .transform_point3(p)
}

// ============================================================================
// Op order
// ============================================================================

#[test]
fn test_translate_rotate_scale_order() {
    let stage = stage(r#"
def Xform "a"
{
    double3 xformOp:translate = (10, 0, 0)
    float xformOp:rotateZ = 90
    float3 xformOp:scale = (2, 2, 2)
    uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:rotateZ", "xformOp:scale"]
}
"#);
    // scale first, then rotate, then translate
    let p = world_point(&stage, "/a", DVec3::new(1.0, 0.0, 0.0));
    assert!(p.abs_diff_eq(DVec3::new(10.0, 2.0, 0.0), EPS));
}

#[test]
fn test_unlisted_ops_are_ignored() {
    let stage = stage(r#"
def Xform "a"
{
    double3 xformOp:translate = (10, 0, 0)
    double3 xformOp:translate:unused = (0, 50, 0)
    uniform token[] xformOpOrder = ["xformOp:translate"]
}
"#);
    let p = world_point(&stage, "/a", DVec3::ZERO);
    assert!(p.abs_diff_eq(DVec3::new(10.0, 0.0, 0.0), EPS));
}

#[test]
fn test_no_op_order_is_identity() {
    let stage = stage("def Xform \"a\"\n{\n    double3 xformOp:translate = (1, 2, 3)\n}\n");
    let p = world_point(&stage, "/a", DVec3::ONE);
    assert!(p.abs_diff_eq(DVec3::ONE, EPS));
}

#[test]
fn test_rotate_xyz_applies_x_first() {
    let stage = stage(r#"
def Xform "a"
{
    float3 xformOp:rotateXYZ = (90, 90, 0)
    uniform token[] xformOpOrder = ["xformOp:rotateXYZ"]
}
"#);
    // +Y --rotX 90--> +Z --rotY 90--> +X
    let p = world_point(&stage, "/a", DVec3::Y);
    assert!(p.abs_diff_eq(DVec3::X, EPS));
}

#[test]
fn test_pivot_with_invert() {
    let stage = stage(r#"
def Xform "a"
{
    double3 xformOp:translate:pivot = (1, 0, 0)
    float xformOp:rotateZ = 180
    uniform token[] xformOpOrder = ["xformOp:translate:pivot", "xformOp:rotateZ", "!invert!xformOp:translate:pivot"]
}
"#);
    // rotation about the pivot at x = 1
    let p = world_point(&stage, "/a", DVec3::ZERO);
    assert!(p.abs_diff_eq(DVec3::new(2.0, 0.0, 0.0), EPS));
}

#[test]
fn test_orient_and_transform_ops() {
    let stage = stage(r#"
def Xform "a"
{
    quatd xformOp:orient = (0.7071067811865476, 0, 0, 0.7071067811865476)
    matrix4d xformOp:transform = ( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (0, 0, 5, 1) )
    uniform token[] xformOpOrder = ["xformOp:orient", "xformOp:transform"]
}
"#);
    // translate by +Z 5, then rotate 90 degrees about Z
    let p = world_point(&stage, "/a", DVec3::X);
    assert!(p.abs_diff_eq(DVec3::new(0.0, 1.0, 5.0), 1e-9));
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_parent_transform_is_inherited() {
    let stage = stage(r#"
def Xform "parent"
{
    double3 xformOp:translate = (0, 0, 5)
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Xform "child"
    {
        double3 xformOp:translate = (1, 0, 0)
        uniform token[] xformOpOrder = ["xformOp:translate"]
    }
}
"#);
    let p = world_point(&stage, "/parent/child", DVec3::ZERO);
    assert!(p.abs_diff_eq(DVec3::new(1.0, 0.0, 5.0), EPS));
}

#[test]
fn test_reset_xform_stack_drops_parent() {
    let stage = stage(r#"
def Xform "parent"
{
    double3 xformOp:translate = (0, 0, 5)
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Xform "child"
    {
        double3 xformOp:translate = (1, 0, 0)
        uniform token[] xformOpOrder = ["!resetXformStack!", "xformOp:translate"]
    }
}
"#);
    let p = world_point(&stage, "/parent/child", DVec3::ZERO);
    assert!(p.abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), EPS));
}

// ============================================================================
// XformOp parsing
// ============================================================================

#[test]
fn test_parse_op_tokens() {
    let op = XformOp::parse("!invert!xformOp:translate:pivot").unwrap();
    assert!(op.inverse);
    assert_eq!(op.attribute_name, "xformOp:translate:pivot");

    assert!(XformOp::parse("xformOp:rotateXYZ").is_some());
    assert!(XformOp::parse("xformOp:rotateXXY").is_none());
    assert!(XformOp::parse("xformOp:shear").is_none());
    assert!(XformOp::parse(RESET_XFORM_STACK).is_none());
    assert!(XformOp::parse("translate").is_none());
}
