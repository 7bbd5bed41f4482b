//! G-code Emitter
//!
//! Turns an ordered, laid-out layer into a pen plotter program:
//!
//! ```text
//! preamble -> pen up -> { travel -> pen down -> draw... -> pen up } -> epilogue
//! ```
//!
//! Coordinates are written in millimetres with four decimals. Feed rates come
//! from the [`PlotterProfile`] and never vary within a run. Output contains no
//! timestamps, so identical input always yields identical bytes.

use crate::optimizer::travel_distance;
use penplot_core::{Layer, Point, PlotterProfile};

/// Formats a coordinate with four decimals, never as `-0.0000`.
pub fn format_coord(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    if formatted == "-0.0000" {
        "0.0000".to_string()
    } else {
        formatted
    }
}

fn format_feed(value: f64) -> String {
    format!("{:.1}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PenState {
    Start,
    Up,
    Down,
}

/// Builds one program, tracking pen state so redundant lifts are skipped.
struct ProgramWriter<'a> {
    profile: &'a PlotterProfile,
    out: String,
    pen: PenState,
}

impl<'a> ProgramWriter<'a> {
    fn new(profile: &'a PlotterProfile) -> Self {
        Self {
            profile,
            out: String::new(),
            pen: PenState::Start,
        }
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn y(&self, y: f64) -> f64 {
        if self.profile.invert_y {
            self.profile.area.height - y
        } else {
            y
        }
    }

    fn pen_up(&mut self) {
        if self.pen == PenState::Up {
            return;
        }
        let cmd = format!(
            "G1 Z{} F{}",
            format_coord(self.profile.z_up),
            format_feed(self.profile.feed_rate_z)
        );
        self.line(&cmd);
        self.pen = PenState::Up;
    }

    fn pen_down(&mut self) {
        if self.pen == PenState::Down {
            return;
        }
        let cmd = format!(
            "G1 Z{} F{}",
            format_coord(self.profile.z_down),
            format_feed(self.profile.feed_rate_z)
        );
        self.line(&cmd);
        self.pen = PenState::Down;
    }

    fn travel_to(&mut self, p: Point) {
        self.pen_up();
        let cmd = format!(
            "G0 X{} Y{} F{}",
            format_coord(p.x),
            format_coord(self.y(p.y)),
            format_feed(self.profile.feed_rate_travel)
        );
        self.line(&cmd);
    }

    fn draw_to(&mut self, p: Point) {
        let cmd = format!(
            "G1 X{} Y{} F{}",
            format_coord(p.x),
            format_coord(self.y(p.y)),
            format_feed(self.profile.feed_rate_draw)
        );
        self.line(&cmd);
    }

    fn finish(mut self) -> String {
        self.pen_up();
        // machine origin, independent of Y inversion
        let cmd = format!(
            "G0 X{} Y{} F{}",
            format_coord(0.0),
            format_coord(0.0),
            format_feed(self.profile.feed_rate_travel)
        );
        self.line(&cmd);
        self.line("M2 ; End of program");
        self.out
    }
}

/// Converts laid-out layers to G-code text.
#[derive(Debug, Clone)]
pub struct GcodeEmitter {
    profile: PlotterProfile,
}

impl GcodeEmitter {
    pub fn new(profile: PlotterProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &PlotterProfile {
        &self.profile
    }

    /// Emits one self-contained program for `layer`, drawing its polylines in
    /// the order and orientation they appear.
    pub fn emit_layer(&self, layer: &Layer) -> String {
        let mut w = ProgramWriter::new(&self.profile);

        w.line(&format!("; penplot layer: {}", layer.name));
        w.line(&format!("; Polylines: {}", layer.polylines.len()));
        w.line(&format!(
            "; Drawing length: {} mm",
            format_coord(layer.draw_length())
        ));
        w.line(&format!(
            "; Travel length: {} mm",
            format_coord(travel_distance(&layer.polylines, Point::origin()))
        ));
        w.line(&format!(
            "; Feed rates: draw {} travel {} z {} mm/min",
            format_feed(self.profile.feed_rate_draw),
            format_feed(self.profile.feed_rate_travel),
            format_feed(self.profile.feed_rate_z)
        ));

        w.line("G21 ; Set units to millimeters");
        w.line("G90 ; Absolute positioning");
        w.pen_up();

        for polyline in &layer.polylines {
            let points = polyline.points();
            let Some((first, rest)) = points.split_first() else {
                continue;
            };
            w.travel_to(*first);
            w.pen_down();
            for p in rest {
                w.draw_to(*p);
            }
            w.pen_up();
        }

        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penplot_core::{Area, Polyline};

    fn layer(points: &[(f64, f64)]) -> Layer {
        let polyline = Polyline::new(points.iter().map(|&p| Point::from(p)).collect());
        Layer::new("black", vec![polyline])
    }

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(1.0), "1.0000");
        assert_eq!(format_coord(-0.00001), "0.0000");
        assert_eq!(format_coord(-1.23456), "-1.2346");
    }

    #[test]
    fn test_program_structure() {
        let gcode =
            GcodeEmitter::new(PlotterProfile::default()).emit_layer(&layer(&[(1.0, 2.0), (3.0, 4.0)]));
        let lines: Vec<&str> = gcode.lines().filter(|l| !l.starts_with(';')).collect();
        assert_eq!(
            lines,
            vec![
                "G21 ; Set units to millimeters",
                "G90 ; Absolute positioning",
                "G1 Z20.0000 F1500.0",
                "G0 X1.0000 Y2.0000 F6000.0",
                "G1 Z0.0000 F1500.0",
                "G1 X3.0000 Y4.0000 F3000.0",
                "G1 Z20.0000 F1500.0",
                "G0 X0.0000 Y0.0000 F6000.0",
                "M2 ; End of program",
            ]
        );
        assert!(gcode.starts_with("; penplot layer: black\n"));
    }

    #[test]
    fn test_empty_layer_is_a_valid_program() {
        let gcode = GcodeEmitter::new(PlotterProfile::default()).emit_layer(&Layer::new("x", vec![]));
        assert!(gcode.contains("G90"));
        assert!(!gcode.contains("Z0.0000"));
        assert!(gcode.trim_end().ends_with("M2 ; End of program"));
    }

    #[test]
    fn test_invert_y() {
        let mut profile = PlotterProfile::with_area(Area::new(300.0, 400.0));
        profile.invert_y = true;
        let gcode = GcodeEmitter::new(profile).emit_layer(&layer(&[(10.0, 50.0), (20.0, 400.0)]));
        assert!(gcode.contains("G0 X10.0000 Y350.0000"));
        assert!(gcode.contains("G1 X20.0000 Y0.0000"));
    }
}
