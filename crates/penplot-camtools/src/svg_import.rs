//! SVG geometry source
//!
//! Extracts straight-line geometry from an SVG document, grouped into layers
//! by stroke colour. Only what a pen plotter needs is understood: document
//! size and `viewBox`, `line`, `polyline`, `polygon`, `rect` and the straight
//! `path` commands. Curves are skipped with a warning; transforms and
//! clipping are ignored.

use penplot_core::{InputError, Point, Result, SourceGeometry};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Layer used when neither an element nor its groups set a stroke.
pub const DEFAULT_LAYER: &str = "default";

const MM_PER_PX: f64 = 25.4 / 96.0;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][\w:.-]*)((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*?)(/?)>")
        .expect("invalid tag regex")
});
static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>").expect("invalid comment regex")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("invalid attribute regex")
});
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d*\.\d+|\d+\.?)(?:[eE][-+]?\d+)?").expect("invalid number regex")
});
static PATH_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([MmLlHhVvZzCcSsQqTtAa])|([-+]?(?:\d*\.\d+|\d+\.?)(?:[eE][-+]?\d+)?)")
        .expect("invalid path regex")
});
static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?(?:\d*\.\d+|\d+\.?)(?:[eE][-+]?\d+)?)\s*(mm|cm|in|pt|pc|px)?\s*$")
        .expect("invalid length regex")
});

/// Parses an SVG length into millimetres. Unitless values are CSS pixels.
pub fn parse_length(value: &str) -> Option<f64> {
    let caps = LENGTH_RE.captures(value)?;
    let number: f64 = caps[1].parse().ok()?;
    let factor = match caps.get(2).map(|m| m.as_str()) {
        Some("mm") => 1.0,
        Some("cm") => 10.0,
        Some("in") => 25.4,
        Some("pt") => 25.4 / 72.0,
        Some("pc") => 25.4 / 6.0,
        Some("px") | None => MM_PER_PX,
        Some(_) => return None,
    };
    Some(number * factor)
}

fn numbers(text: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn attributes(text: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(text)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

/// Stroke colour from a `stroke` attribute or a `stroke:` style entry.
fn stroke_of(attrs: &HashMap<String, String>) -> Option<String> {
    let from_style = attrs.get("style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim() == "stroke").then(|| value.trim().to_string())
        })
    });
    from_style
        .or_else(|| attrs.get("stroke").map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty() && s != "none")
}

fn coord(attrs: &HashMap<String, String>, key: &str) -> f64 {
    attrs
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Maps user units onto millimetres on the page.
#[derive(Debug, Clone, Copy)]
struct UserSpace {
    offset_x: f64,
    offset_y: f64,
    scale_x: f64,
    scale_y: f64,
}

impl UserSpace {
    fn map(&self, x: f64, y: f64) -> Point {
        Point::new(
            (x - self.offset_x) * self.scale_x,
            (y - self.offset_y) * self.scale_y,
        )
    }
}

/// Resolves page size (mm) and user-space mapping from the root element.
fn document_space(attrs: &HashMap<String, String>) -> Result<(f64, f64, UserSpace)> {
    let view_box = attrs
        .get("viewBox")
        .map(|v| numbers(v))
        .filter(|v| v.len() == 4 && v[2] > 0.0 && v[3] > 0.0);
    let width = attrs.get("width").and_then(|w| parse_length(w));
    let height = attrs.get("height").and_then(|h| parse_length(h));

    let (width, height) = match (width, height, &view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some(vb)) => (w, w * vb[3] / vb[2]),
        (None, Some(h), Some(vb)) => (h * vb[2] / vb[3], h),
        (None, None, Some(vb)) => (vb[2] * MM_PER_PX, vb[3] * MM_PER_PX),
        _ => {
            return Err(InputError::InvalidDimensions {
                reason: "document has no usable width/height or viewBox".to_string(),
            }
            .into())
        }
    };
    if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
        return Err(InputError::InvalidDimensions {
            reason: format!("document size {} x {} is not positive", width, height),
        }
        .into());
    }

    let space = match view_box {
        Some(vb) => UserSpace {
            offset_x: vb[0],
            offset_y: vb[1],
            scale_x: width / vb[2],
            scale_y: height / vb[3],
        },
        None => UserSpace {
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: MM_PER_PX,
            scale_y: MM_PER_PX,
        },
    };
    Ok((width, height, space))
}

/// Splits path data into straight-line subpaths, in user units.
fn path_subpaths(data: &str) -> (Vec<Vec<(f64, f64)>>, bool) {
    enum Token {
        Cmd(char),
        Num(f64),
    }
    let tokens: Vec<Token> = PATH_TOKEN_RE
        .captures_iter(data)
        .filter_map(|caps| {
            if let Some(cmd) = caps.get(1) {
                cmd.as_str().chars().next().map(Token::Cmd)
            } else {
                caps.get(2)?.as_str().parse().ok().map(Token::Num)
            }
        })
        .collect();

    let mut subpaths = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut pos = (0.0, 0.0);
    let mut start = (0.0, 0.0);
    let mut skipped_curves = false;
    let mut cmd = 'M';
    let mut i = 0;

    let flush = |current: &mut Vec<(f64, f64)>, subpaths: &mut Vec<Vec<(f64, f64)>>| {
        if current.len() >= 2 {
            subpaths.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    while i < tokens.len() {
        if let Token::Cmd(c) = tokens[i] {
            cmd = c;
            i += 1;
            if c == 'Z' || c == 'z' {
                if !current.is_empty() {
                    current.push(start);
                }
                flush(&mut current, &mut subpaths);
                pos = start;
                continue;
            }
        }

        let arity = match cmd.to_ascii_uppercase() {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'S' | 'Q' => 4,
            'C' => 6,
            'A' => 7,
            _ => 0,
        };
        let args: Vec<f64> = tokens[i..]
            .iter()
            .take(arity)
            .map_while(|t| match t {
                Token::Num(n) => Some(*n),
                Token::Cmd(_) => None,
            })
            .collect();
        if arity == 0 || args.len() < arity {
            // stray number or truncated command; a following command is
            // handled by the next iteration
            let stray = usize::from(matches!(tokens.get(i), Some(Token::Num(_))));
            i += args.len().max(stray);
            continue;
        }
        i += arity;

        let relative = cmd.is_ascii_lowercase();
        let (bx, by) = if relative { pos } else { (0.0, 0.0) };
        if current.is_empty() && matches!(cmd.to_ascii_uppercase(), 'L' | 'H' | 'V') {
            // drawing on after a closepath starts from the current point
            current.push(pos);
        }
        match cmd.to_ascii_uppercase() {
            'M' => {
                flush(&mut current, &mut subpaths);
                pos = (bx + args[0], by + args[1]);
                start = pos;
                current.push(pos);
                // implicit lineto for following pairs
                cmd = if relative { 'l' } else { 'L' };
            }
            'L' => {
                pos = (bx + args[0], by + args[1]);
                current.push(pos);
            }
            'H' => {
                pos = (if relative { pos.0 + args[0] } else { args[0] }, pos.1);
                current.push(pos);
            }
            'V' => {
                pos = (pos.0, if relative { pos.1 + args[0] } else { args[0] });
                current.push(pos);
            }
            _ => {
                // curve or arc: keep the pen position, break the chain
                skipped_curves = true;
                flush(&mut current, &mut subpaths);
                pos = (bx + args[arity - 2], by + args[arity - 1]);
                current.push(pos);
            }
        }
    }
    flush(&mut current, &mut subpaths);
    (subpaths, skipped_curves)
}

fn element_chains(name: &str, attrs: &HashMap<String, String>) -> Vec<Vec<(f64, f64)>> {
    match name {
        "line" => vec![vec![
            (coord(attrs, "x1"), coord(attrs, "y1")),
            (coord(attrs, "x2"), coord(attrs, "y2")),
        ]],
        "polyline" | "polygon" => {
            let values = attrs.get("points").map(|p| numbers(p)).unwrap_or_default();
            let mut pts: Vec<(f64, f64)> = values.chunks_exact(2).map(|c| (c[0], c[1])).collect();
            if name == "polygon" {
                if let Some(first) = pts.first().copied() {
                    pts.push(first);
                }
            }
            vec![pts]
        }
        "rect" => {
            let (x, y) = (coord(attrs, "x"), coord(attrs, "y"));
            let (w, h) = (coord(attrs, "width"), coord(attrs, "height"));
            if w <= 0.0 || h <= 0.0 {
                return Vec::new();
            }
            vec![vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x, y)]]
        }
        "path" => {
            let data = attrs.get("d").map(String::as_str).unwrap_or("");
            let (subpaths, skipped_curves) = path_subpaths(data);
            if skipped_curves {
                tracing::warn!("Skipped curve commands in path; only straight segments are plotted");
            }
            subpaths
        }
        _ => Vec::new(),
    }
}

/// Parses SVG text into layered line segments in millimetres.
pub fn parse_svg(content: &str) -> Result<SourceGeometry> {
    let mut source: Option<(SourceGeometry, UserSpace)> = None;
    // inherited stroke for each open group
    let mut groups: Vec<Option<String>> = Vec::new();
    let mut defs_depth = 0usize;

    // markup inside comments and CDATA sections is not drawn
    let content = HIDDEN_RE.replace_all(content, "");
    for caps in TAG_RE.captures_iter(&content) {
        let closing = !caps[1].is_empty();
        let name = &caps[2];
        let self_closing = !caps[4].is_empty();

        if closing {
            match name {
                "g" => {
                    groups.pop();
                }
                "defs" | "clipPath" | "mask" | "symbol" | "marker" => {
                    defs_depth = defs_depth.saturating_sub(1);
                }
                _ => {}
            }
            continue;
        }

        let attrs = attributes(&caps[3]);
        match name {
            "svg" if source.is_none() => {
                let (width, height, space) = document_space(&attrs)?;
                tracing::debug!("SVG document {:.2}mm x {:.2}mm", width, height);
                source = Some((SourceGeometry::new(width, height), space));
            }
            "g" if !self_closing => {
                let inherited = groups.last().cloned().flatten();
                groups.push(stroke_of(&attrs).or(inherited));
            }
            "defs" | "clipPath" | "mask" | "symbol" | "marker" if !self_closing => {
                defs_depth += 1;
            }
            _ if defs_depth > 0 => {}
            "line" | "polyline" | "polygon" | "rect" | "path" => {
                let Some((geometry, space)) = source.as_mut() else {
                    return Err(InputError::Malformed {
                        reason: format!("<{}> outside of an <svg> element", name),
                    }
                    .into());
                };
                let layer = stroke_of(&attrs)
                    .or_else(|| groups.last().cloned().flatten())
                    .unwrap_or_else(|| DEFAULT_LAYER.to_string());
                for chain in element_chains(name, &attrs) {
                    let points: Vec<Point> =
                        chain.iter().map(|&(x, y)| space.map(x, y)).collect();
                    geometry.push_chain(&layer, &points);
                }
            }
            _ => {}
        }
    }

    let (geometry, _) = source.ok_or_else(|| InputError::Malformed {
        reason: "no <svg> root element".to_string(),
    })?;
    tracing::info!(
        "Read {} segments in {} layer(s)",
        geometry.segment_count(),
        geometry.layers.len()
    );
    Ok(geometry)
}

/// Reads an `.svg` file into layered line segments.
pub fn load_svg(path: &Path) -> Result<SourceGeometry> {
    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if !is_svg {
        return Err(InputError::UnsupportedFormat {
            reason: format!("{} is not an .svg file", path.display()),
        }
        .into());
    }
    if !path.is_file() {
        return Err(InputError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path).map_err(|e| InputError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_svg(&content)
}
