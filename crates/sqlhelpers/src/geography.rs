//! Geography values parsed from well-known text (WKT).
//!
//! Supports the OGC simple feature shapes SQL Server stores in
//! `geography` columns: `POINT`, `LINESTRING`, `POLYGON` and their `MULTI`
//! forms, each optionally `EMPTY`. Coordinates are longitude then latitude,
//! with optional `Z` and `M` ordinates.

use std::fmt::{self, Write as _};

use sqlhelpers_types::TypeError;

/// One position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees, `-90..=90`.
    pub latitude: f64,
    /// Elevation.
    pub z: Option<f64>,
    /// Measure.
    pub m: Option<f64>,
}

impl Coord {
    /// A two-dimensional position.
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            z: None,
            m: None,
        }
    }
}

/// A closed ring of positions.
pub type Ring = Vec<Coord>;

/// Geometric shape of a geography value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Shape {
    /// A single position, `None` when empty.
    Point(Option<Coord>),
    /// A path.
    LineString(Vec<Coord>),
    /// An exterior ring followed by interior rings.
    Polygon(Vec<Ring>),
    /// Several positions.
    MultiPoint(Vec<Coord>),
    /// Several paths.
    MultiLineString(Vec<Vec<Coord>>),
    /// Several polygons.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Shape {
    /// WKT tag of this shape.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Point(_) => "POINT",
            Self::LineString(_) => "LINESTRING",
            Self::Polygon(_) => "POLYGON",
            Self::MultiPoint(_) => "MULTIPOINT",
            Self::MultiLineString(_) => "MULTILINESTRING",
            Self::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Whether the shape has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Point(p) => p.is_none(),
            Self::LineString(v) | Self::MultiPoint(v) => v.is_empty(),
            Self::Polygon(v) | Self::MultiLineString(v) => v.is_empty(),
            Self::MultiPolygon(v) => v.is_empty(),
        }
    }
}

/// A geography value with its spatial reference id.
#[derive(Debug, Clone, PartialEq)]
pub struct Geography {
    srid: i32,
    shape: Shape,
}

impl Geography {
    /// Parse WKT text with the given SRID.
    pub fn from_text(wkt: &str, srid: i32) -> Result<Self, TypeError> {
        let shape = WktParser::new(wkt).parse()?;
        Ok(Self { srid, shape })
    }

    /// Spatial reference id.
    #[must_use]
    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Render as WKT, e.g. `POINT (-122.34 47.65)`.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shape.tag())?;
        if self.shape.is_empty() {
            return f.write_str(" EMPTY");
        }
        f.write_char(' ')?;
        match &self.shape {
            Shape::Point(Some(c)) => write_list(f, std::slice::from_ref(c), write_coord),
            Shape::Point(None) => Ok(()),
            Shape::LineString(coords) => write_list(f, coords, write_coord),
            Shape::MultiPoint(coords) => write_list(f, coords, |f, c| {
                write_list(f, std::slice::from_ref(c), write_coord)
            }),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                write_list(f, rings, |f, ring| write_list(f, ring, write_coord))
            }
            Shape::MultiPolygon(polygons) => write_list(f, polygons, |f, rings| {
                write_list(f, rings, |f, ring| write_list(f, ring, write_coord))
            }),
        }
    }
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_char('(')?;
    for (i, value) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item(f, value)?;
    }
    f.write_char(')')
}

fn write_coord(f: &mut fmt::Formatter<'_>, c: &Coord) -> fmt::Result {
    write!(f, "{} {}", c.longitude, c.latitude)?;
    match (c.z, c.m) {
        (Some(z), Some(m)) => write!(f, " {z} {m}"),
        (Some(z), None) => write!(f, " {z}"),
        (None, Some(m)) => write!(f, " NULL {m}"),
        (None, None) => Ok(()),
    }
}

struct WktParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> WktParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn parse(mut self) -> Result<Shape, TypeError> {
        let tag = self.word().ok_or_else(|| self.error("expected a shape tag"))?;
        let tag = tag.to_ascii_uppercase();

        // Optional dimension marker; ordinates are read positionally anyway.
        let checkpoint = self.pos;
        match self.word().map(str::to_ascii_uppercase).as_deref() {
            Some("Z" | "M" | "ZM") => {}
            _ => self.pos = checkpoint,
        }

        let empty = self.empty();
        let shape = match tag.as_str() {
            "POINT" if empty => Shape::Point(None),
            "POINT" => {
                self.expect('(')?;
                let c = self.coord()?;
                self.expect(')')?;
                Shape::Point(Some(c))
            }
            "LINESTRING" if empty => Shape::LineString(Vec::new()),
            "LINESTRING" => Shape::LineString(self.line()?),
            "POLYGON" if empty => Shape::Polygon(Vec::new()),
            "POLYGON" => Shape::Polygon(self.polygon()?),
            "MULTIPOINT" if empty => Shape::MultiPoint(Vec::new()),
            "MULTIPOINT" => Shape::MultiPoint(self.list(|p| {
                if p.peek() == Some('(') {
                    p.expect('(')?;
                    let c = p.coord()?;
                    p.expect(')')?;
                    Ok(c)
                } else {
                    p.coord()
                }
            })?),
            "MULTILINESTRING" if empty => Shape::MultiLineString(Vec::new()),
            "MULTILINESTRING" => Shape::MultiLineString(self.list(Self::line)?),
            "MULTIPOLYGON" if empty => Shape::MultiPolygon(Vec::new()),
            "MULTIPOLYGON" => Shape::MultiPolygon(self.list(Self::polygon)?),
            other => return Err(self.error(&format!("unknown shape '{other}'"))),
        };

        self.skip_ws();
        if self.pos < self.text.len() {
            return Err(self.error("trailing characters"));
        }
        Ok(shape)
    }

    fn error(&self, message: &str) -> TypeError {
        TypeError::InvalidWkt(format!("{message} at offset {} in '{}'", self.pos, self.text))
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn expect(&mut self, c: char) -> Result<(), TypeError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn word(&mut self) -> Option<&'a str> {
        let word = self.take_while(|c| c.is_ascii_alphabetic());
        (!word.is_empty()).then_some(word)
    }

    fn empty(&mut self) -> bool {
        let checkpoint = self.pos;
        if self.word().is_some_and(|w| w.eq_ignore_ascii_case("EMPTY")) {
            true
        } else {
            self.pos = checkpoint;
            false
        }
    }

    fn ordinate(&mut self) -> Result<Option<f64>, TypeError> {
        let token = self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if token.eq_ignore_ascii_case("NULL") {
            return Ok(None);
        }
        token
            .parse()
            .map(Some)
            .map_err(|_| self.error(&format!("invalid number '{token}'")))
    }

    fn coord(&mut self) -> Result<Coord, TypeError> {
        let longitude = self.ordinate()?.ok_or_else(|| self.error("longitude is NULL"))?;
        let latitude = self.ordinate()?.ok_or_else(|| self.error("latitude is NULL"))?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(self.error(&format!("latitude {latitude} out of range")));
        }
        let mut coord = Coord::new(longitude, latitude);
        if !matches!(self.peek(), Some(',' | ')') | None) {
            coord.z = self.ordinate()?;
        }
        if !matches!(self.peek(), Some(',' | ')') | None) {
            coord.m = self.ordinate()?;
        }
        Ok(coord)
    }

    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T, TypeError>) -> Result<Vec<T>, TypeError> {
        self.expect('(')?;
        let mut items = vec![item(self)?];
        while self.peek() == Some(',') {
            self.pos += 1;
            items.push(item(self)?);
        }
        self.expect(')')?;
        Ok(items)
    }

    fn line(&mut self) -> Result<Vec<Coord>, TypeError> {
        let coords = self.list(Self::coord)?;
        if coords.len() < 2 {
            return Err(self.error("a line needs at least two points"));
        }
        Ok(coords)
    }

    fn polygon(&mut self) -> Result<Vec<Ring>, TypeError> {
        let rings = self.list(Self::coord_list)?;
        for ring in &rings {
            let closed = ring.first().zip(ring.last()).is_some_and(|(a, b)| {
                a.longitude == b.longitude && a.latitude == b.latitude
            });
            if ring.len() < 4 || !closed {
                return Err(self.error("a polygon ring must be closed with at least four points"));
            }
        }
        Ok(rings)
    }

    fn coord_list(&mut self) -> Result<Vec<Coord>, TypeError> {
        self.list(Self::coord)
    }
}
