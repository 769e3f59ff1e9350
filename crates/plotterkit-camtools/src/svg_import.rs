//! SVG import
//!
//! Extracts drawable geometry from an SVG document into a [`Drawing`].
//! Supported elements are `path`, `line`, `polyline`, `polygon` and `rect`.
//! Path data understands M/L/H/V/C/S/Q/T/A/Z in absolute and relative form;
//! quadratic segments and elliptical arcs become cubics. Element `transform` attributes with
//! `translate`, `scale` and `matrix` are applied.
//!
//! SVG's y axis points down, so the imported drawing is mirrored about its
//! own vertical center.

use crate::error::{CamToolError, Result};
use lyon::geom::{point, vector, Angle, ArcFlags, SvgArc};
use plotterkit_core::{Curve, Drawing, Point};
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Import every supported element of an SVG document
pub fn import_svg(document: &str) -> Result<Drawing> {
    if !document.contains("<svg") {
        return Err(CamToolError::SvgParse(
            "document has no <svg> root element".to_string(),
        ));
    }

    let re_element = Regex::new(r"(?s)<(path|line|polyline|polygon|rect)\b([^>]*)>")
        .expect("invalid element regex");
    let re_attr = Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("invalid attribute regex");

    let mut drawing = Drawing::new();
    let mut elements = 0;

    for caps in re_element.captures_iter(document) {
        let attrs: HashMap<&str, &str> = re_attr
            .captures_iter(&caps[2])
            .filter_map(|a| {
                let name = a.get(1)?.as_str();
                let value = a.get(2).or_else(|| a.get(3))?.as_str();
                Some((name, value))
            })
            .collect();

        let mut curves = match &caps[1] {
            "path" => match attrs.get("d") {
                Some(d) => parse_path_data(d)?,
                None => Vec::new(),
            },
            "line" => {
                let start = Point::new(number_attr(&attrs, "x1")?, number_attr(&attrs, "y1")?);
                let end = Point::new(number_attr(&attrs, "x2")?, number_attr(&attrs, "y2")?);
                vec![Curve::line(start, end)]
            }
            "polyline" => polyline(&parse_points(attrs.get("points").copied().unwrap_or(""))?, false),
            "polygon" => polyline(&parse_points(attrs.get("points").copied().unwrap_or(""))?, true),
            "rect" => {
                let x = number_attr(&attrs, "x")?;
                let y = number_attr(&attrs, "y")?;
                let w = number_attr(&attrs, "width")?;
                let h = number_attr(&attrs, "height")?;
                polyline(
                    &[
                        Point::new(x, y),
                        Point::new(x + w, y),
                        Point::new(x + w, y + h),
                        Point::new(x, y + h),
                    ],
                    true,
                )
            }
            _ => Vec::new(),
        };

        if let Some(transform) = attrs.get("transform") {
            let affine = parse_transform(transform)?;
            for curve in &mut curves {
                for p in curve.points_mut() {
                    *p = affine.apply(*p);
                }
            }
        }

        elements += 1;
        for curve in curves {
            drawing.push(curve);
        }
    }

    if !drawing.is_empty() {
        let axis = drawing.bounds().center().y;
        drawing.mirror_y(axis);
    }

    debug!(
        "Imported {} curves from {} SVG elements",
        drawing.len(),
        elements
    );
    Ok(drawing)
}

fn number_attr(attrs: &HashMap<&str, &str>, name: &str) -> Result<f64> {
    match attrs.get(name) {
        None => Ok(0.0),
        Some(raw) => {
            let value = raw.trim();
            let value = value.strip_suffix("px").unwrap_or(value);
            value.trim().parse::<f64>().map_err(|_| {
                CamToolError::SvgParse(format!("attribute {}=\"{}\" is not a number", name, raw))
            })
        }
    }
}

fn parse_points(raw: &str) -> Result<Vec<Point>> {
    let numbers: Vec<f64> = tokenize_path(raw)?
        .into_iter()
        .map(|t| match t {
            Token::Number(n) => Ok(n),
            Token::Command(c) => Err(CamToolError::SvgParse(format!(
                "unexpected '{}' in points list",
                c
            ))),
        })
        .collect::<Result<_>>()?;

    if numbers.len() % 2 != 0 {
        return Err(CamToolError::SvgParse(
            "points list has an odd number of coordinates".to_string(),
        ));
    }
    Ok(numbers
        .chunks_exact(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect())
}

fn polyline(points: &[Point], closed: bool) -> Vec<Curve> {
    let mut curves: Vec<Curve> = points
        .windows(2)
        .map(|w| Curve::line(w[0], w[1]))
        .collect();
    if closed && points.len() > 2 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                curves.push(Curve::line(last, first));
            }
        }
    }
    curves
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn is_path_command(c: char) -> bool {
    matches!(
        c,
        'M' | 'm'
            | 'L'
            | 'l'
            | 'H'
            | 'h'
            | 'V'
            | 'v'
            | 'C'
            | 'c'
            | 'S'
            | 's'
            | 'Q'
            | 'q'
            | 'T'
            | 't'
            | 'A'
            | 'a'
            | 'Z'
            | 'z'
    )
}

/// Split path data into commands and numbers.
///
/// Handles the compact forms tracers emit, such as `10-5` and `.5.5`.
fn tokenize_path(data: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = data.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == ',' {
            i += 1;
        } else if is_path_command(c) {
            tokens.push(Token::Command(c));
            i += 1;
        } else if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
            let start = i;
            if c == '-' || c == '+' {
                i += 1;
            }
            let mut seen_dot = false;
            let mut seen_exp = false;
            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_digit() {
                    i += 1;
                } else if d == '.' && !seen_dot && !seen_exp {
                    seen_dot = true;
                    i += 1;
                } else if (d == 'e' || d == 'E') && !seen_exp {
                    seen_exp = true;
                    i += 1;
                    if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| {
                CamToolError::SvgParse(format!("invalid number '{}' in path data", text))
            })?;
            tokens.push(Token::Number(value));
        } else {
            return Err(CamToolError::SvgParse(format!(
                "unexpected character '{}' in path data",
                c
            )));
        }
    }

    Ok(tokens)
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'S' | 'Q' => 4,
        'C' => 6,
        'A' => 7,
        _ => 0,
    }
}

#[derive(Debug, Default)]
struct PathState {
    curves: Vec<Curve>,
    current: Point,
    subpath_start: Point,
    last_cubic_control: Option<Point>,
    last_quad_control: Option<Point>,
}

impl PathState {
    fn line_to(&mut self, end: Point) {
        if end != self.current {
            self.curves.push(Curve::line(self.current, end));
        }
        self.current = end;
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.curves.push(Curve::cubic(self.current, c1, c2, end));
        self.current = end;
    }

    fn quad_to(&mut self, q: Point, end: Point) {
        let p0 = self.current;
        let c1 = Point::new(p0.x + 2.0 / 3.0 * (q.x - p0.x), p0.y + 2.0 / 3.0 * (q.y - p0.y));
        let c2 = Point::new(end.x + 2.0 / 3.0 * (q.x - end.x), end.y + 2.0 / 3.0 * (q.y - end.y));
        self.cubic_to(c1, c2, end);
    }

    /// Elliptical arc, converted to cubics. Radii too small for the chord are
    /// scaled up; a zero radius draws a straight line.
    fn arc_to(&mut self, radii: (f64, f64), x_rotation: f64, large_arc: bool, sweep: bool, end: Point) {
        if end == self.current {
            return;
        }

        let arc = SvgArc {
            from: point(self.current.x, self.current.y),
            to: point(end.x, end.y),
            radii: vector(radii.0.abs(), radii.1.abs()),
            x_rotation: Angle::degrees(x_rotation),
            flags: ArcFlags { large_arc, sweep },
        };
        if arc.is_straight_line() {
            self.line_to(end);
            return;
        }

        let mut segments = Vec::new();
        arc.to_arc().for_each_cubic_bezier(&mut |c| {
            segments.push((
                Point::new(c.ctrl1.x, c.ctrl1.y),
                Point::new(c.ctrl2.x, c.ctrl2.y),
                Point::new(c.to.x, c.to.y),
            ));
        });

        let last = segments.len().saturating_sub(1);
        for (i, (c1, c2, to)) in segments.into_iter().enumerate() {
            // Land exactly on the requested end point
            let to = if i == last { end } else { to };
            self.cubic_to(c1, c2, to);
        }
        self.current = end;
    }

    fn reflect(&self, control: Option<Point>) -> Point {
        match control {
            Some(c) => Point::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y),
            None => self.current,
        }
    }

    fn apply(&mut self, command: char, args: &[f64]) {
        let relative = command.is_ascii_lowercase();
        let origin = if relative { self.current } else { Point::default() };
        let at = |i: usize| Point::new(origin.x + args[i], origin.y + args[i + 1]);

        let mut cubic_control = None;
        let mut quad_control = None;

        match command.to_ascii_uppercase() {
            'M' => {
                let p = at(0);
                self.current = p;
                self.subpath_start = p;
            }
            'L' => self.line_to(at(0)),
            'H' => {
                let x = if relative { self.current.x + args[0] } else { args[0] };
                self.line_to(Point::new(x, self.current.y));
            }
            'V' => {
                let y = if relative { self.current.y + args[0] } else { args[0] };
                self.line_to(Point::new(self.current.x, y));
            }
            'C' => {
                let (c1, c2, end) = (at(0), at(2), at(4));
                self.cubic_to(c1, c2, end);
                cubic_control = Some(c2);
            }
            'S' => {
                let c1 = self.reflect(self.last_cubic_control);
                let (c2, end) = (at(0), at(2));
                self.cubic_to(c1, c2, end);
                cubic_control = Some(c2);
            }
            'Q' => {
                let (q, end) = (at(0), at(2));
                self.quad_to(q, end);
                quad_control = Some(q);
            }
            'T' => {
                let q = self.reflect(self.last_quad_control);
                self.quad_to(q, at(0));
                quad_control = Some(q);
            }
            'A' => self.arc_to(
                (args[0], args[1]),
                args[2],
                args[3] != 0.0,
                args[4] != 0.0,
                at(5),
            ),
            'Z' => {
                let start = self.subpath_start;
                self.line_to(start);
            }
            _ => {}
        }

        self.last_cubic_control = cubic_control;
        self.last_quad_control = quad_control;
    }
}

/// Parse the `d` attribute of a path element
fn parse_path_data(data: &str) -> Result<Vec<Curve>> {
    let tokens = tokenize_path(data)?;
    let mut state = PathState::default();
    let mut command: Option<char> = None;
    let mut i = 0;

    while i < tokens.len() {
        let cmd = match tokens[i] {
            Token::Command(c) => {
                i += 1;
                c
            }
            Token::Number(_) => match command {
                Some(c) if arity(c) > 0 => c,
                _ => {
                    return Err(CamToolError::SvgParse(
                        "path data has a number without a command".to_string(),
                    ))
                }
            },
        };

        let n = arity(cmd);
        let args: Vec<f64> = tokens
            .get(i..i + n)
            .unwrap_or(&[])
            .iter()
            .filter_map(|t| match t {
                Token::Number(v) => Some(*v),
                Token::Command(_) => None,
            })
            .collect();
        if args.len() != n {
            return Err(CamToolError::SvgParse(format!(
                "command '{}' expects {} numbers",
                cmd, n
            )));
        }
        i += n;

        state.apply(cmd, &args);

        // Coordinates following a moveto are implicit linetos
        command = Some(match cmd {
            'M' => 'L',
            'm' => 'l',
            c => c,
        });
    }

    Ok(state.curves)
}

/// 2D affine transform `[a c e; b d f]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// `self` applied after `other`
    fn then_after(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }
}

fn parse_transform(raw: &str) -> Result<Affine> {
    let re = Regex::new(r"([a-zA-Z]+)\s*\(([^)]*)\)").expect("invalid transform regex");
    let mut result = Affine::IDENTITY;

    for caps in re.captures_iter(raw) {
        let values: Vec<f64> = tokenize_path(&caps[2])?
            .into_iter()
            .filter_map(|t| match t {
                Token::Number(v) => Some(v),
                Token::Command(_) => None,
            })
            .collect();

        let step = match (&caps[1], values.as_slice()) {
            ("translate", [tx]) => Affine { e: *tx, ..Affine::IDENTITY },
            ("translate", [tx, ty]) => Affine {
                e: *tx,
                f: *ty,
                ..Affine::IDENTITY
            },
            ("scale", [s]) => Affine {
                a: *s,
                d: *s,
                ..Affine::IDENTITY
            },
            ("scale", [sx, sy]) => Affine {
                a: *sx,
                d: *sy,
                ..Affine::IDENTITY
            },
            ("matrix", [a, b, c, d, e, f]) => Affine {
                a: *a,
                b: *b,
                c: *c,
                d: *d,
                e: *e,
                f: *f,
            },
            _ => {
                warn!("Ignoring unsupported SVG transform '{}'", &caps[0]);
                continue;
            }
        };
        result = result.then_after(&step);
    }

    Ok(result)
}
