use std::fmt;

/// Change represented by one glyph.
pub const GLYPH_SCALE: f32 = 0.01;
pub const MAX_RUN: usize = 20;
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// First entry of a series; there is nothing to compare against.
    Origin,
    Unchanged,
    Up,
    Down,
}

/// Glyph rendering of the change between two consecutive series entries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trend {
    pub direction: Direction,
    pub delta: f32,
    pub run: usize,
    pub truncated: bool,
}

impl Trend {
    pub fn origin() -> Self {
        Trend {
            direction: Direction::Origin,
            delta: 0.0,
            run: 0,
            truncated: false,
        }
    }

    pub fn from_delta(delta: f32) -> Self {
        let direction = if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::Unchanged
        };
        let units = glyph_units(delta.abs());
        Trend {
            direction,
            delta,
            run: units.min(MAX_RUN),
            truncated: units >= MAX_RUN,
        }
    }

    pub fn between(previous: Option<f32>, current: f32) -> Self {
        match previous {
            Some(previous) => Self::from_delta(current - previous),
            None => Self::origin(),
        }
    }

    pub fn glyphs(&self) -> String {
        let (body, tail) = match self.direction {
            Direction::Origin => return "o".to_string(),
            Direction::Unchanged => return "*".to_string(),
            Direction::Up => ('#', '*'),
            Direction::Down => (':', '@'),
        };
        let mut out = String::with_capacity(self.run + TRUNCATION_MARKER.len() + 1);
        out.extend(std::iter::repeat_n(body, self.run));
        if self.truncated {
            out.push_str(TRUNCATION_MARKER);
        }
        out.push(tail);
        out
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glyphs())
    }
}

/// Whole glyphs in `magnitude`, tolerant of `f32` rounding at unit edges.
pub fn glyph_units(magnitude: f32) -> usize {
    let units = (f64::from(magnitude) / f64::from(GLYPH_SCALE) + 1e-3).floor();
    if units.is_finite() && units > 0.0 {
        units.min(usize::MAX as f64) as usize
    } else {
        0
    }
}
