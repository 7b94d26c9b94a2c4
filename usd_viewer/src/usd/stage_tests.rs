use super::*;

const SCENE: &str = r#"#usda 1.0
(
    defaultPrim = "World"
    upAxis = "Z"
)

def Xform "World"
{
    def Mesh "cube"
    {
        double size = 2
        double size.timeSamples = {
            0: 1,
            10: 3,
        }
        uniform token purpose = "render"
        rel material:binding = </World/Looks/red>
    }

    over "hidden"
    {
        def Mesh "inner" { }
    }
}

class "Template"
{
}

def Camera "camera1"
{
}
"#;

fn stage() -> Stage {
    Stage::from_source("scene.usda", SCENE, InitialLoadSet::LoadAll).unwrap()
}

fn path(text: &str) -> SdfPath {
    SdfPath::new(text).unwrap()
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_pseudo_root() {
    let stage = stage();
    let root = stage.pseudo_root();
    assert!(root.is_pseudo_root());
    assert_eq!(root.path().as_str(), "/");

    let names: Vec<String> = stage.children(&root).iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["World", "Template", "camera1"]);
}

#[test]
fn test_prim_at_path() {
    let stage = stage();
    let camera = stage.prim_at_path(&path("/camera1")).unwrap();
    assert_eq!(camera.type_name(), "Camera");
    assert!(camera.is_defined());

    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    assert_eq!(cube.type_name(), "Mesh");
    assert_eq!(stage.parent(&cube).unwrap().path().as_str(), "/World");

    assert!(stage.prim_at_path(&path("/World/missing")).is_none());
}

#[test]
fn test_prim_count_excludes_pseudo_root() {
    assert_eq!(stage().prim_count(), 6);
    assert_eq!(Stage::new("empty", InitialLoadSet::LoadAll).prim_count(), 0);
}

#[test]
fn test_traverse_skips_over_and_class_subtrees() {
    let stage = stage();
    let paths: Vec<String> = stage.traverse().iter().map(|p| p.path().to_string()).collect();
    assert_eq!(paths, vec!["/World", "/World/cube", "/camera1"]);
}

#[test]
fn test_layer_metadata() {
    let stage = stage();
    assert_eq!(stage.identifier(), "scene.usda");
    assert_eq!(stage.up_axis(), "Z");
    assert!((stage.meters_per_unit() - 0.01).abs() < f64::EPSILON);
    assert_eq!(stage.default_prim().unwrap().path().as_str(), "/World");
}

#[test]
fn test_prim_and_attribute_metadata() {
    let source = r#"#usda 1.0
def Mesh "ground" (
    kind = "component"
)
{
    color3f[] primvars:displayColor = [(0, 1, 0)] (
        interpolation = "constant"
    )
    point3f[] points = [(0, 0, 0)]
}
"#;
    let stage = Stage::from_source("meta.usda", source, InitialLoadSet::LoadAll).unwrap();
    let ground = stage.prim_at_path(&path("/ground")).unwrap();

    assert_eq!(stage.prim_metadata(&ground, "kind").and_then(Value::as_str), Some("component"));
    assert!(stage.prim_metadata(&ground, "doc").is_none());

    let interpolation = stage.attribute_metadata(&ground, "primvars:displayColor", "interpolation");
    assert_eq!(interpolation.as_ref().and_then(Value::as_str), Some("constant"));
    assert!(stage.attribute_metadata(&ground, "points", "interpolation").is_none());
    assert!(stage.attribute_metadata(&ground, "normals", "interpolation").is_none());
}

#[test]
fn test_relationship_targets() {
    let stage = stage();
    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    assert_eq!(stage.relationship_targets(&cube, "material:binding"), vec!["/World/Looks/red"]);
    assert!(stage.relationship_targets(&cube, "proxyPrim").is_empty());
}

// ============================================================================
// Attribute evaluation
// ============================================================================

#[test]
fn test_default_time_ignores_time_samples() {
    let stage = stage();
    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    assert_eq!(stage.attribute(&cube, "size", TimeCode::Default), Some(Value::Double(2.0)));
}

#[test]
fn test_numeric_time_interpolates_and_holds() {
    let stage = stage();
    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    let at = |t: f64| stage.attribute(&cube, "size", TimeCode::Numeric(t));

    assert_eq!(at(5.0), Some(Value::Double(2.0)));
    assert_eq!(at(0.0), Some(Value::Double(1.0)));
    assert_eq!(at(-4.0), Some(Value::Double(1.0)));
    assert_eq!(at(25.0), Some(Value::Double(3.0)));
}

#[test]
fn test_uniform_reads_default_at_any_time() {
    let stage = stage();
    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    assert_eq!(
        stage.attribute(&cube, "purpose", TimeCode::Numeric(3.0)),
        Some(Value::Token("render".to_string()))
    );
}

#[test]
fn test_missing_and_blocked_attributes() {
    let mut stage = stage();
    let camera_path = path("/camera1");
    let camera = stage.prim_at_path(&camera_path).unwrap();
    assert_eq!(stage.attribute(&camera, "focalLength", TimeCode::Default), None);

    assert!(stage.set_attribute(&camera_path, Attribute::new("focalLength", "float").with_default(Value::None)));
    assert_eq!(stage.attribute(&camera, "focalLength", TimeCode::Default), None);
    assert!(stage.attribute_spec(&camera, "focalLength").unwrap().has_authored_value());
}

#[test]
fn test_held_sample_for_non_numeric_values() {
    let attr = Attribute::new("visibility", "token").with_time_samples(vec![
        (10.0, Value::Token("invisible".to_string())),
        (0.0, Value::Token("inherited".to_string())),
    ]);
    assert_eq!(attr.get(TimeCode::Numeric(5.0)), Some(Value::Token("inherited".to_string())));
    assert_eq!(attr.get(TimeCode::Numeric(10.0)), Some(Value::Token("invisible".to_string())));
    assert_eq!(attr.get(TimeCode::Default), None);
}

#[test]
fn test_attribute_names_in_authored_order() {
    let stage = stage();
    let cube = stage.prim_at_path(&path("/World/cube")).unwrap();
    assert_eq!(stage.attribute_names(&cube), vec!["size", "purpose"]);
}

// ============================================================================
// Authoring and composition reporting
// ============================================================================

#[test]
fn test_define_prim_creates_ancestors() {
    let mut stage = Stage::new("memory", InitialLoadSet::LoadNone);
    let cam = stage.define_prim(&path("/rig/camera1"), "Camera").unwrap();
    assert_eq!(cam.type_name(), "Camera");
    assert!(stage.prim_at_path(&path("/rig")).is_some());
    assert_eq!(stage.prim_count(), 2);
    assert_eq!(stage.load_set(), InitialLoadSet::LoadNone);
}

#[test]
fn test_def_after_over_defines_prim() {
    let src = "#usda 1.0\nover \"a\" { }\ndef Xform \"a\" { }\n";
    let stage = Stage::from_source("s", src, InitialLoadSet::LoadAll).unwrap();
    let a = stage.prim_at_path(&path("/a")).unwrap();
    assert!(a.is_defined());
    assert_eq!(a.type_name(), "Xform");
    assert_eq!(stage.prim_count(), 1);
}

#[test]
fn test_composition_arcs_are_reported() {
    let src = r#"#usda 1.0
(
    subLayers = [@base.usda@]
)
def "asset" (
    references = @asset.usda@
)
{
}
"#;
    let stage = Stage::from_source("s", src, InitialLoadSet::LoadAll).unwrap();
    assert_eq!(stage.ignored_composition_arcs(), &["/: subLayers".to_string(), "/asset: references".to_string()]);
}

#[test]
fn test_parse_error_propagates() {
    let err = Stage::from_source("s", "#usda 1.0\ndef {", InitialLoadSet::LoadAll).unwrap_err();
    assert!(matches!(err, crate::Error::Parse(_)));
}
