//! Flat overlay fills: a solid CSS color or a CSS gradient expression.
//!
//! `linear-gradient()`, `radial-gradient()` and `conic-gradient()` are accepted together with their
//! `repeating-` forms. The expression is parsed once; [`CssGradient::paint`] resolves stop offsets
//! and geometry against the painted box and yields a native `peniko` gradient for the renderer.

use std::f64::consts::{SQRT_2, TAU};

use vello_cpu::peniko::{self, Extend};

use crate::assets::color::{CssColor, parse_css_color};
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{PhotoveilError, PhotoveilResult};

const MIN_SPAN: f64 = 1e-6;
const MIN_RADIUS: f64 = 1e-3;

/// A CSS `<length-percentage>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Fraction of the reference length (`50%` is `0.5`).
    Fraction(f64),
    Px(f64),
}

impl Length {
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Length::Fraction(f) => f * reference,
            Length::Px(px) => px,
        }
    }
}

const CENTER: (Length, Length) = (Length::Fraction(0.5), Length::Fraction(0.5));

/// One color stop. Conic stops carry their angle as a fraction of a turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub color: CssColor,
    pub position: Option<Length>,
}

/// Direction of a linear gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinearDirection {
    /// CSS angle in degrees; `0deg` points up, `90deg` points right.
    Angle(f64),
    /// `to <vertical> <horizontal>`; the angle depends on the painted box.
    Corner { right: bool, bottom: bool },
}

impl LinearDirection {
    /// Resolve to a CSS angle in degrees for a `w`×`h` box.
    pub fn angle_deg(self, w: f64, h: f64) -> f64 {
        match self {
            LinearDirection::Angle(a) => a,
            LinearDirection::Corner { right, bottom } => {
                let a = h.atan2(w).to_degrees();
                match (right, bottom) {
                    (true, false) => a,
                    (true, true) => 180.0 - a,
                    (false, true) => 180.0 + a,
                    (false, false) => 360.0 - a,
                }
            }
        }
    }
}

/// Size of a radial gradient's ending shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RadialExtent {
    ClosestSide,
    FarthestSide,
    ClosestCorner,
    FarthestCorner,
    /// Explicit radii; a circle repeats the same pixel length twice.
    Explicit(Length, Length),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientShape {
    Linear(LinearDirection),
    Radial {
        circle: bool,
        extent: RadialExtent,
        center: (Length, Length),
    },
    Conic {
        from_deg: f64,
        center: (Length, Length),
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CssGradient {
    pub shape: GradientShape,
    pub repeating: bool,
    pub stops: Vec<ColorStop>,
}

/// A gradient ready for `RenderContext::set_paint`, expressed in the painted box's coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPaint {
    pub gradient: peniko::Gradient,
    pub paint_transform: Affine,
}

/// A parsed flat overlay value.
#[derive(Clone, Debug, PartialEq)]
pub enum FlatFill {
    Solid(CssColor),
    Gradient(CssGradient),
}

impl FlatFill {
    /// Parse a CSS color or gradient expression.
    pub fn parse(value: &str) -> PhotoveilResult<Self> {
        let lower = value.trim().to_ascii_lowercase();
        if let Some((name, args)) = split_function(&lower) {
            let (repeating, base) = match name.strip_prefix("repeating-") {
                Some(base) => (true, base),
                None => (false, name),
            };
            let parsed = match base {
                "linear-gradient" => Some(parse_linear(args)),
                "radial-gradient" => Some(parse_radial(args)),
                "conic-gradient" => Some(parse_conic(args)),
                n if n.ends_with("gradient") => {
                    return Err(PhotoveilError::validation(format!(
                        "unsupported gradient '{name}()'"
                    )));
                }
                _ => None,
            };
            if let Some(parsed) = parsed {
                let (shape, stops) = parsed?;
                return Ok(FlatFill::Gradient(CssGradient {
                    shape,
                    repeating,
                    stops,
                }));
            }
        }
        parse_css_color(value).map(FlatFill::Solid)
    }

    /// Solid color, if this fill is not a gradient.
    pub fn solid(&self) -> Option<CssColor> {
        match self {
            FlatFill::Solid(c) => Some(*c),
            FlatFill::Gradient(_) => None,
        }
    }
}

impl CssGradient {
    /// Resolve this gradient for a box covering `bounds`.
    pub fn paint(&self, bounds: Rect) -> GradientPaint {
        let (w, h) = (bounds.width(), bounds.height());
        match self.shape {
            GradientShape::Linear(direction) => {
                let theta = direction.angle_deg(w, h).to_radians();
                let dir = (theta.sin(), -theta.cos());
                let len = (w * dir.0).abs() + (h * dir.1).abs();
                let line = self.line(len, false);
                let c = bounds.center();
                let at = |t: f64| Point::new(c.x + dir.0 * (t - len / 2.0), c.y + dir.1 * (t - len / 2.0));
                GradientPaint {
                    gradient: peniko::Gradient::new_linear(at(line.start), at(line.end))
                        .with_extend(line.extend)
                        .with_stops(line.stops.as_slice()),
                    paint_transform: Affine::IDENTITY,
                }
            }
            GradientShape::Radial {
                circle,
                extent,
                center,
            } => {
                let c = resolve_center(bounds, center);
                let (rx, ry) = radial_radii(bounds, c, circle, extent);
                let line = self.line(rx, true);
                GradientPaint {
                    gradient: peniko::Gradient::new_two_point_radial(
                        (0.0, 0.0),
                        (line.start / rx) as f32,
                        (0.0, 0.0),
                        (line.end / rx) as f32,
                    )
                    .with_extend(line.extend)
                    .with_stops(line.stops.as_slice()),
                    paint_transform: Affine::translate(c.to_vec2())
                        * Affine::scale_non_uniform(rx, ry),
                }
            }
            GradientShape::Conic { from_deg, center } => {
                let c = resolve_center(bounds, center);
                let line = self.line(1.0, false);
                let sweep = (line.end - line.start) * TAU;
                GradientPaint {
                    gradient: peniko::Gradient::new_sweep((0.0, 0.0), 0.0, sweep as f32)
                        .with_extend(line.extend)
                        .with_stops(line.stops.as_slice()),
                    paint_transform: Affine::translate(c.to_vec2())
                        * Affine::rotate((from_deg - 90.0).to_radians() + line.start * TAU),
                }
            }
        }
    }

    /// Map the stops onto `[start, end]` along a gradient line of length `reference`.
    ///
    /// `non_negative` keeps the start at or past zero (a radial ray cannot start inside out);
    /// repeating gradients shift by whole periods instead, which leaves the pattern unchanged.
    fn line(&self, reference: f64, non_negative: bool) -> GradientLine {
        let positions = resolve_positions(&self.stops, reference);
        let first = positions.first().copied().unwrap_or(0.0);
        let last = positions.last().copied().unwrap_or(reference);
        let period = last - first;
        let repeating = self.repeating && period > MIN_SPAN;

        let (start, end) = if repeating {
            let start = if non_negative { first.rem_euclid(period) } else { first };
            (start, start + period)
        } else {
            let start = if non_negative { first.max(0.0) } else { first };
            (start, last.max(start + MIN_SPAN))
        };

        let origin = if repeating { first } else { start };
        let span = end - start;
        let stops = self
            .stops
            .iter()
            .zip(&positions)
            .map(|(stop, p)| {
                let offset = ((p - origin) / span).clamp(0.0, 1.0) as f32;
                peniko::ColorStop::from((offset, stop.color.0))
            })
            .collect();

        GradientLine {
            start,
            end,
            extend: if repeating { Extend::Repeat } else { Extend::Pad },
            stops,
        }
    }
}

struct GradientLine {
    start: f64,
    end: f64,
    extend: Extend,
    stops: Vec<peniko::ColorStop>,
}

fn resolve_center(bounds: Rect, (x, y): (Length, Length)) -> Point {
    Point::new(
        bounds.x0 + x.resolve(bounds.width()),
        bounds.y0 + y.resolve(bounds.height()),
    )
}

fn radial_radii(bounds: Rect, c: Point, circle: bool, extent: RadialExtent) -> (f64, f64) {
    let (left, right) = ((c.x - bounds.x0).abs(), (bounds.x1 - c.x).abs());
    let (top, bottom) = ((c.y - bounds.y0).abs(), (bounds.y1 - c.y).abs());
    let corners = [
        left.hypot(top),
        right.hypot(top),
        left.hypot(bottom),
        right.hypot(bottom),
    ];
    let (rx, ry) = match (circle, extent) {
        (_, RadialExtent::Explicit(a, b)) => (a.resolve(bounds.width()), b.resolve(bounds.height())),
        (true, RadialExtent::ClosestSide) => {
            let r = left.min(right).min(top).min(bottom);
            (r, r)
        }
        (true, RadialExtent::FarthestSide) => {
            let r = left.max(right).max(top).max(bottom);
            (r, r)
        }
        (true, RadialExtent::ClosestCorner) => {
            let r = corners.into_iter().fold(f64::INFINITY, f64::min);
            (r, r)
        }
        (true, RadialExtent::FarthestCorner) => {
            let r = corners.into_iter().fold(0.0, f64::max);
            (r, r)
        }
        (false, RadialExtent::ClosestSide) => (left.min(right), top.min(bottom)),
        (false, RadialExtent::FarthestSide) => (left.max(right), top.max(bottom)),
        (false, RadialExtent::ClosestCorner) => {
            (left.min(right) * SQRT_2, top.min(bottom) * SQRT_2)
        }
        (false, RadialExtent::FarthestCorner) => {
            (left.max(right) * SQRT_2, top.max(bottom) * SQRT_2)
        }
    };
    (rx.max(MIN_RADIUS), ry.max(MIN_RADIUS))
}

/// Resolve stop positions: missing ends become 0 and `reference`, positions never decrease, and
/// runs of unpositioned stops are spread evenly between their neighbors.
fn resolve_positions(stops: &[ColorStop], reference: f64) -> Vec<f64> {
    let n = stops.len();
    let mut pos: Vec<Option<f64>> = stops
        .iter()
        .map(|s| s.position.map(|p| p.resolve(reference)))
        .collect();
    if n == 0 {
        return Vec::new();
    }
    if pos[0].is_none() {
        pos[0] = Some(0.0);
    }
    if pos[n - 1].is_none() {
        pos[n - 1] = Some(reference);
    }

    let mut max_seen = f64::NEG_INFINITY;
    for p in pos.iter_mut().flatten() {
        if *p < max_seen {
            *p = max_seen;
        }
        max_seen = *p;
    }

    let mut i = 0;
    while i < n {
        if pos[i].is_some() {
            i += 1;
            continue;
        }
        let prev = i - 1;
        let mut next = i;
        while pos[next].is_none() {
            next += 1;
        }
        let (a, b) = (pos[prev].unwrap_or(0.0), pos[next].unwrap_or(reference));
        let span = (next - prev) as f64;
        for (k, slot) in pos.iter_mut().enumerate().take(next).skip(i) {
            *slot = Some(a + (b - a) * (k - prev) as f64 / span);
        }
        i = next;
    }

    pos.into_iter().map(|p| p.unwrap_or(0.0)).collect()
}

/// `name(args)` with the outer parentheses stripped.
pub(crate) fn split_function(s: &str) -> Option<(&str, &str)> {
    let open = s.find('(')?;
    let name = s[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    let args = s[open + 1..].trim_end().strip_suffix(')')?;
    Some((name, args))
}

/// Split on commas that are not nested inside parentheses.
pub(crate) fn split_top_level(args: &str) -> Vec<&str> {
    split_at_depth_zero(args, |c| c == ',')
}

/// Split on whitespace that is not nested inside parentheses, dropping empty words.
pub(crate) fn split_words(s: &str) -> Vec<&str> {
    split_at_depth_zero(s, char::is_whitespace)
        .into_iter()
        .filter(|w| !w.is_empty())
        .collect()
}

fn split_at_depth_zero(s: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && is_sep(c) => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn parse_angle(tok: &str) -> Option<f64> {
    if tok == "0" {
        return Some(0.0);
    }
    let (num, factor) = if let Some(v) = tok.strip_suffix("deg") {
        (v, 1.0)
    } else if let Some(v) = tok.strip_suffix("grad") {
        (v, 0.9)
    } else if let Some(v) = tok.strip_suffix("rad") {
        (v, 180.0 / std::f64::consts::PI)
    } else if let Some(v) = tok.strip_suffix("turn") {
        (v, 360.0)
    } else {
        return None;
    };
    parse_number(num).map(|v| v * factor)
}

fn parse_length(tok: &str) -> Option<Length> {
    if tok == "0" {
        return Some(Length::Px(0.0));
    }
    if let Some(v) = tok.strip_suffix('%') {
        return parse_number(v).map(|v| Length::Fraction(v / 100.0));
    }
    tok.strip_suffix("px")
        .and_then(parse_number)
        .map(Length::Px)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `<position>` after `at`: one or two keywords or lengths, horizontal first unless a keyword
/// says otherwise.
fn parse_position(words: &[&str]) -> Option<(Length, Length)> {
    fn x_of(w: &str) -> Option<Length> {
        match w {
            "left" => Some(Length::Fraction(0.0)),
            "center" => Some(Length::Fraction(0.5)),
            "right" => Some(Length::Fraction(1.0)),
            _ => parse_length(w),
        }
    }
    fn y_of(w: &str) -> Option<Length> {
        match w {
            "top" => Some(Length::Fraction(0.0)),
            "center" => Some(Length::Fraction(0.5)),
            "bottom" => Some(Length::Fraction(1.0)),
            _ => parse_length(w),
        }
    }
    match words {
        [w] if matches!(*w, "top" | "bottom") => Some((Length::Fraction(0.5), y_of(w)?)),
        [w] => Some((x_of(w)?, Length::Fraction(0.5))),
        [a, b] if matches!(*a, "top" | "bottom") || matches!(*b, "left" | "right") => {
            Some((x_of(b)?, y_of(a)?))
        }
        [a, b] => Some((x_of(a)?, y_of(b)?)),
        _ => None,
    }
}

fn parse_direction(tok: &str) -> Option<LinearDirection> {
    if let Some(a) = parse_angle(tok) {
        return Some(LinearDirection::Angle(a));
    }
    let rest = tok.strip_prefix("to ")?;
    let mut horizontal = None;
    let mut vertical = None;
    for w in rest.split_whitespace() {
        match w {
            "left" if horizontal.is_none() => horizontal = Some(false),
            "right" if horizontal.is_none() => horizontal = Some(true),
            "top" if vertical.is_none() => vertical = Some(false),
            "bottom" if vertical.is_none() => vertical = Some(true),
            _ => return None,
        }
    }
    match (horizontal, vertical) {
        (Some(right), Some(bottom)) => Some(LinearDirection::Corner { right, bottom }),
        (Some(true), None) => Some(LinearDirection::Angle(90.0)),
        (Some(false), None) => Some(LinearDirection::Angle(270.0)),
        (None, Some(false)) => Some(LinearDirection::Angle(0.0)),
        (None, Some(true)) => Some(LinearDirection::Angle(180.0)),
        (None, None) => None,
    }
}

type Parsed = PhotoveilResult<(GradientShape, Vec<ColorStop>)>;

fn parse_linear(args: &str) -> Parsed {
    let parts = split_top_level(args);
    let (direction, stop_parts) = match parts.first().and_then(|p| parse_direction(p)) {
        Some(d) => (d, &parts[1..]),
        None => (LinearDirection::Angle(180.0), &parts[..]),
    };
    Ok((GradientShape::Linear(direction), parse_stops(stop_parts, false)?))
}

fn parse_radial(args: &str) -> Parsed {
    let parts = split_top_level(args);
    let Some(first) = parts.first() else {
        return Err(too_few_stops());
    };
    if parse_stop(first, false).is_ok() {
        let shape = GradientShape::Radial {
            circle: false,
            extent: RadialExtent::FarthestCorner,
            center: CENTER,
        };
        return Ok((shape, parse_stops(&parts, false)?));
    }

    let invalid = || PhotoveilError::validation(format!("invalid radial-gradient shape '{first}'"));
    let words = split_words(first);
    let (shape_words, position_words) = match words.iter().position(|w| *w == "at") {
        Some(i) => (&words[..i], Some(&words[i + 1..])),
        None => (&words[..], None),
    };

    let mut circle = None;
    let mut extent = None;
    let mut sizes = Vec::new();
    for w in shape_words {
        match *w {
            "circle" if circle.is_none() => circle = Some(true),
            "ellipse" if circle.is_none() => circle = Some(false),
            "closest-side" if extent.is_none() => extent = Some(RadialExtent::ClosestSide),
            "farthest-side" if extent.is_none() => extent = Some(RadialExtent::FarthestSide),
            "closest-corner" if extent.is_none() => extent = Some(RadialExtent::ClosestCorner),
            "farthest-corner" if extent.is_none() => extent = Some(RadialExtent::FarthestCorner),
            other => match parse_length(other) {
                Some(l) if sizes.len() < 2 => sizes.push(l),
                _ => return Err(invalid()),
            },
        }
    }
    if extent.is_some() && !sizes.is_empty() {
        return Err(invalid());
    }

    let (circle, extent) = match (circle, sizes.as_slice()) {
        (c, []) => (c.unwrap_or(false), extent.unwrap_or(RadialExtent::FarthestCorner)),
        (None | Some(true), [r @ Length::Px(_)]) => (true, RadialExtent::Explicit(*r, *r)),
        (None | Some(false), [a, b]) => (false, RadialExtent::Explicit(*a, *b)),
        _ => return Err(invalid()),
    };
    let center = match position_words {
        Some(ws) => parse_position(ws).ok_or_else(invalid)?,
        None => CENTER,
    };

    let shape = GradientShape::Radial {
        circle,
        extent,
        center,
    };
    Ok((shape, parse_stops(&parts[1..], false)?))
}

fn parse_conic(args: &str) -> Parsed {
    let parts = split_top_level(args);
    let words = parts.first().map(|p| split_words(p)).unwrap_or_default();
    if !matches!(words.first(), Some(&"from" | &"at")) {
        let shape = GradientShape::Conic {
            from_deg: 0.0,
            center: CENTER,
        };
        return Ok((shape, parse_stops(&parts, true)?));
    }

    let invalid = || PhotoveilError::validation(format!("invalid conic-gradient prelude '{}'", parts[0]));
    let mut from_deg = 0.0;
    let mut rest = &words[..];
    if let ["from", angle, tail @ ..] = rest {
        from_deg = parse_angle(angle).ok_or_else(invalid)?;
        rest = tail;
    }
    let center = match rest {
        [] => CENTER,
        ["at", position @ ..] => parse_position(position).ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    Ok((GradientShape::Conic { from_deg, center }, parse_stops(&parts[1..], true)?))
}

fn stop_position(tok: &str, conic: bool) -> Option<Length> {
    if conic {
        if let Some(v) = tok.strip_suffix('%') {
            return parse_number(v).map(|v| Length::Fraction(v / 100.0));
        }
        return parse_angle(tok).map(|deg| Length::Fraction(deg / 360.0));
    }
    parse_length(tok)
}

/// `<color> [<position> [<position>]]`; a double position expands into two stops.
fn parse_stop(part: &str, conic: bool) -> PhotoveilResult<Vec<ColorStop>> {
    let words = split_words(part);
    let Some((color, positions)) = words.split_first() else {
        return Err(PhotoveilError::validation("empty color stop"));
    };
    let color = match parse_css_color(color) {
        Ok(c) => c,
        Err(_) if positions.is_empty() && stop_position(color, conic).is_some() => {
            return Err(PhotoveilError::validation(format!(
                "color interpolation hint '{color}' is not supported"
            )));
        }
        Err(e) => return Err(e),
    };
    if positions.len() > 2 {
        return Err(PhotoveilError::validation(format!("invalid color stop '{part}'")));
    }
    if positions.is_empty() {
        return Ok(vec![ColorStop {
            color,
            position: None,
        }]);
    }
    positions
        .iter()
        .map(|p| {
            stop_position(p, conic)
                .map(|position| ColorStop {
                    color,
                    position: Some(position),
                })
                .ok_or_else(|| PhotoveilError::validation(format!("invalid stop position '{p}'")))
        })
        .collect()
}

fn parse_stops(parts: &[&str], conic: bool) -> PhotoveilResult<Vec<ColorStop>> {
    if parts.len() < 2 {
        return Err(too_few_stops());
    }
    let mut stops = Vec::with_capacity(parts.len());
    for p in parts {
        stops.extend(parse_stop(p, conic)?);
    }
    Ok(stops)
}

fn too_few_stops() -> PhotoveilError {
    PhotoveilError::validation("gradient needs at least two color stops")
}

#[cfg(test)]
#[path = "../../tests/unit/assets/gradient.rs"]
mod tests;
