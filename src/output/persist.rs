//! Whitespace-separated text form of a [`Floorplan`].
//!
//! ```text
//! <#floors>   per floor: <polygon> <#holes> <polygon>*
//! <#fillers>  per filler: <polygon>
//! <#walls>    per wall: <closed 0|1> <ccw 0|1> <polygon>
//! polygon  := <#points> (<x> <y>)*
//! ```

use std::str::SplitWhitespace;

use super::{Floorplan, Polygon, PolygonWithHoles, Wall};
use crate::error::{PersistError, Result};
use crate::math::Point2;

impl Floorplan {
    /// Serializes floors, fillers and walls. Contours are derived data and
    /// are left out.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.floors.len()));
        for floor in &self.floors {
            write_polygon(&mut out, &floor.outer);
            out.push_str(&format!("{}\n", floor.holes.len()));
            for hole in &floor.holes {
                write_polygon(&mut out, hole);
            }
        }
        out.push_str(&format!("{}\n", self.fillers.len()));
        for filler in &self.fillers {
            write_polygon(&mut out, filler);
        }
        out.push_str(&format!("{}\n", self.walls.len()));
        for wall in &self.walls {
            out.push_str(&format!(
                "{} {}\n",
                u8::from(wall.closed),
                u8::from(wall.counter_clockwise)
            ));
            write_polygon(&mut out, &wall.points);
        }
        out
    }

    /// Parses the text form written by [`Floorplan::to_text`].
    ///
    /// # Errors
    ///
    /// Returns a `PersistError` on a missing or malformed token, or on data
    /// left after the walls.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut reader = Reader::new(text);
        let mut floorplan = Floorplan::default();

        for _ in 0..reader.count("floor count")? {
            let outer = reader.polygon()?;
            let holes = (0..reader.count("hole count")?)
                .map(|_| reader.polygon())
                .collect::<Result<Vec<_>>>()?;
            floorplan.floors.push(PolygonWithHoles::new(outer, holes));
        }
        for _ in 0..reader.count("filler count")? {
            floorplan.fillers.push(reader.polygon()?);
        }
        for _ in 0..reader.count("wall count")? {
            let closed = reader.flag("wall closed flag")?;
            let counter_clockwise = reader.flag("wall orientation flag")?;
            let points = reader.polygon()?;
            floorplan.walls.push(Wall {
                closed,
                counter_clockwise,
                points,
            });
        }

        if let Some(extra) = reader.tokens.next() {
            return Err(PersistError::TrailingData(extra.to_owned()).into());
        }
        Ok(floorplan)
    }
}

fn write_polygon(out: &mut String, polygon: &[Point2]) {
    out.push_str(&polygon.len().to_string());
    for p in polygon {
        out.push_str(&format!(" {} {}", p.x, p.y));
    }
    out.push('\n');
}

struct Reader<'a> {
    tokens: SplitWhitespace<'a>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace(),
        }
    }

    fn token(&mut self, expected: &'static str) -> std::result::Result<&'a str, PersistError> {
        self.tokens.next().ok_or(PersistError::UnexpectedEof(expected))
    }

    fn count(&mut self, expected: &'static str) -> Result<usize> {
        let token = self.token(expected)?;
        token.parse().map_err(|_| invalid(token, expected))
    }

    fn flag(&mut self, expected: &'static str) -> Result<bool> {
        match self.token(expected)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(invalid(other, expected)),
        }
    }

    fn coordinate(&mut self) -> Result<f64> {
        let token = self.token("coordinate")?;
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(token, "coordinate")),
        }
    }

    fn polygon(&mut self) -> Result<Polygon> {
        let n = self.count("point count")?;
        (0..n)
            .map(|_| Ok(Point2::new(self.coordinate()?, self.coordinate()?)))
            .collect()
    }
}

fn invalid(token: &str, expected: &'static str) -> crate::error::FloorplanError {
    PersistError::InvalidToken {
        token: token.to_owned(),
        expected,
    }
    .into()
}
