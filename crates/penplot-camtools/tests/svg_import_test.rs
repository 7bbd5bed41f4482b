use penplot_camtools::{load_svg, parse_svg};
use penplot_core::{Point, DEFAULT_TOLERANCE};
use std::io::Write;

const TWO_COLOURS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="50mm" viewBox="0 0 200 100">
  <g stroke="#ff0000">
    <line x1="0" y1="0" x2="20" y2="0"/>
    <polyline points="20,0 20,20 40,20" />
  </g>
  <rect x="10" y="10" width="20" height="10" style="fill:none;stroke:#0000ff"/>
  <defs>
    <line x1="0" y1="0" x2="200" y2="100" stroke="#00ff00"/>
  </defs>
</svg>
"##;

#[test]
fn test_layers_follow_stroke_colour() {
    let source = parse_svg(TWO_COLOURS).unwrap();
    assert_eq!(source.width, 100.0);
    assert_eq!(source.height, 50.0);

    let names: Vec<&str> = source.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["#ff0000", "#0000ff"]);
    assert_eq!(source.layers[0].segments.len(), 3);
    assert_eq!(source.layers[1].segments.len(), 4);
}

#[test]
fn test_view_box_scales_to_millimetres() {
    let source = parse_svg(TWO_COLOURS).unwrap();
    let first = source.layers[0].segments[0];
    assert!(first.start.approx_eq(&Point::new(0.0, 0.0), DEFAULT_TOLERANCE));
    assert!(first.end.approx_eq(&Point::new(10.0, 0.0), DEFAULT_TOLERANCE));
}

#[test]
fn test_commented_out_markup_is_not_drawn() {
    let svg = r##"<svg width="100mm" height="100mm" viewBox="0 0 100 100">
  <!-- draft: <line x1="0" y1="50" x2="100" y2="50" stroke="black"/> -->
  <line x1="0" y1="0" x2="100" y2="0" stroke="black"/>
  <!--
  <g stroke="#ff0000"><rect x="0" y="0" width="10" height="10"/></g>
  -->
  <style><![CDATA[ .a { stroke: red } <line x1="0" y1="90" x2="100" y2="90"/> ]]></style>
</svg>"##;
    let source = parse_svg(svg).unwrap();
    assert_eq!(source.layers.len(), 1);
    assert_eq!(source.layers[0].name, "black");
    assert_eq!(source.segment_count(), 1);
    assert_eq!(source.layers[0].segments[0].end.y, 0.0);
}

#[test]
fn test_missing_root_is_malformed() {
    let err = parse_svg("<line x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\"/>").unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_load_rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drawing.dxf");
    std::fs::write(&path, TWO_COLOURS).unwrap();
    assert!(load_svg(&path).unwrap_err().is_input_error());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_svg(&dir.path().join("missing.svg"))
        .unwrap_err()
        .is_input_error());
}

#[test]
fn test_load_svg_file() {
    let mut file = tempfile::Builder::new().suffix(".SVG").tempfile().unwrap();
    file.write_all(TWO_COLOURS.as_bytes()).unwrap();
    let source = load_svg(file.path()).unwrap();
    assert_eq!(source.segment_count(), 7);
}
