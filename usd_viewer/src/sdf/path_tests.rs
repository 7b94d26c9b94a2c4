use super::*;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_absolute_root() {
    let path = SdfPath::new("/").unwrap();
    assert!(path.is_absolute_root());
    assert!(path.is_absolute());
    assert_eq!(path.name(), "");
    assert_eq!(path.depth(), 0);
    assert!(path.parent().is_none());
}

#[test]
fn test_parse_camera_path() {
    let path: SdfPath = "/camera1".parse().unwrap();
    assert_eq!(path.as_str(), "/camera1");
    assert_eq!(path.name(), "camera1");
    assert_eq!(path.depth(), 1);
    assert_eq!(path.parent(), Some(SdfPath::absolute_root()));
}

#[test]
fn test_parse_nested_path() {
    let path = SdfPath::new("/World/Geom/cube_01").unwrap();
    assert_eq!(path.elements().collect::<Vec<_>>(), vec!["World", "Geom", "cube_01"]);
    assert_eq!(path.parent().unwrap().as_str(), "/World/Geom");
}

#[test]
fn test_parse_relative_path() {
    let path = SdfPath::new("Geom/cube").unwrap();
    assert!(!path.is_absolute());
    assert_eq!(path.parent().unwrap().as_str(), "Geom");
    assert!(SdfPath::new("cube").unwrap().parent().is_none());
}

#[test]
fn test_parse_rejects_malformed() {
    assert!(SdfPath::new("").is_err());
    assert!(SdfPath::new("/World/").is_err());
    assert!(SdfPath::new("//World").is_err());
    assert!(SdfPath::new("/1camera").is_err());
    assert!(SdfPath::new("/cam era").is_err());
    assert!(SdfPath::new("/World.visibility").is_err());
}

#[test]
fn test_parse_error_is_path_syntax() {
    match SdfPath::new("/bad-name") {
        Err(Error::PathSyntax(msg)) => assert!(msg.contains("bad-name")),
        other => panic!("expected PathSyntax, got {:?}", other),
    }
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_append_child() {
    let root = SdfPath::absolute_root();
    let world = root.append_child("World").unwrap();
    assert_eq!(world.as_str(), "/World");
    let cube = world.append_child("cube").unwrap();
    assert_eq!(cube.as_str(), "/World/cube");
    assert!(world.append_child("not valid").is_err());
}

#[test]
fn test_has_prefix() {
    let world = SdfPath::new("/World").unwrap();
    let cube = SdfPath::new("/World/cube").unwrap();
    let worldwide = SdfPath::new("/Worldwide").unwrap();

    assert!(cube.has_prefix(&world));
    assert!(world.has_prefix(&world));
    assert!(!worldwide.has_prefix(&world));
    assert!(cube.has_prefix(&SdfPath::absolute_root()));
}

#[test]
fn test_display_matches_text() {
    let path = SdfPath::new("/World/cube").unwrap();
    assert_eq!(format!("{}", path), "/World/cube");
}
