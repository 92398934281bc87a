//! Coordinate grammar and the integer codec shared by boards, fleet trees,
//! and the AI.
//!
//! A coordinate has a letter row (`A` = 1, …, `Z` = 26, `AA` = 27, …) and a
//! 1-based decimal column. Its code is `row * 100 + col`, which is injective
//! for every supported board size and orders codes by row-major scan.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Integer code of a coordinate: `row * ROW_STRIDE + col`.
pub type Code = u32;

/// Multiplier applied to the row when encoding. Columns stay strictly below
/// it for every supported board size, so the encoding never collides.
pub const ROW_STRIDE: Code = 100;

/// Smallest supported board edge.
pub const MIN_BOARD: u16 = 5;

/// Largest supported board edge.
pub const MAX_BOARD: u16 = 20;

/// Reason a coordinate was rejected.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CoordError {
    /// The string does not match the letter-row digit-column shape.
    #[error("malformed coordinate")]
    Malformed,

    /// The coordinate (or a span extending from it) leaves the board.
    #[error("coordinate out of bounds")]
    OutOfBounds,
}

/// Orientation of a ship placement.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A board cell, 1-based in both axes. Row 1 is `A`, column 1 is `1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: u16,
    pub col: u16,
}

impl Coord {
    /// Construct a [`Coord`] from 1-based row and column.
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// The integer code of this coordinate. Does not check board bounds;
    /// use [`encode`] when bounds matter.
    pub fn code(self) -> Code {
        self.row as Code * ROW_STRIDE + self.col as Code
    }

    /// Iterate the 4-neighbors of this cell that are inside the board.
    pub fn neighbors(self, board_size: u16) -> impl Iterator<Item = Coord> {
        let Coord { row, col } = self;
        [
            (row.saturating_sub(1), col),
            (row + 1, col),
            (row, col.saturating_sub(1)),
            (row, col + 1),
        ]
        .into_iter()
        .filter(move |&(r, c)| (1..=board_size).contains(&r) && (1..=board_size).contains(&c))
        .map(|(r, c)| Coord::new(r, c))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", row_letters(self.row), self.col)
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}

/// Encode a coordinate for a board of the given size. Fails with
/// [`CoordError::OutOfBounds`] if either axis leaves `1..=board_size`.
pub fn encode(coord: Coord, board_size: u16) -> Result<Code, CoordError> {
    if (1..=board_size).contains(&coord.row) && (1..=board_size).contains(&coord.col) {
        Ok(coord.code())
    } else {
        Err(CoordError::OutOfBounds)
    }
}

/// Decode a code produced by [`encode`] back into its coordinate.
pub fn decode(code: Code) -> Coord {
    Coord::new((code / ROW_STRIDE) as u16, (code % ROW_STRIDE) as u16)
}

static COORD_RE: Lazy<Regex> = Lazy::new(|| {
    // Leading zeros are rejected so parse/format round-trips exactly.
    Regex::new(r"^([A-Za-z]+)([1-9][0-9]*)$").expect("coordinate regex is valid")
});

/// Parse a coordinate string such as `"B3"` or `"aa12"`. Case-insensitive.
/// Only the shape is validated here; board bounds are checked by [`encode`].
pub fn parse(input: &str) -> Result<Coord, CoordError> {
    let caps = COORD_RE.captures(input).ok_or(CoordError::Malformed)?;
    let mut row: u32 = 0;
    for ch in caps[1].chars() {
        row = row * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if row > u16::MAX as u32 {
            return Err(CoordError::Malformed);
        }
    }
    let col: u16 = caps[2].parse().map_err(|_| CoordError::Malformed)?;
    Ok(Coord::new(row as u16, col))
}

/// Canonical uppercase form of a coordinate, e.g. `"A1"`.
pub fn format(coord: Coord) -> String {
    coord.to_string()
}

/// The cells a ship of length `len` occupies starting at `start` and
/// extending in `orientation`, in coordinate order. Fails with
/// [`CoordError::OutOfBounds`] if any cell leaves the board.
pub fn span(
    start: Coord,
    orientation: Orientation,
    len: u16,
    board_size: u16,
) -> Result<Vec<Coord>, CoordError> {
    encode(start, board_size)?;
    let (end_row, end_col) = match orientation {
        Orientation::Horizontal => (start.row, start.col + len - 1),
        Orientation::Vertical => (start.row + len - 1, start.col),
    };
    if end_row > board_size || end_col > board_size {
        return Err(CoordError::OutOfBounds);
    }
    Ok((0..len)
        .map(|i| match orientation {
            Orientation::Horizontal => Coord::new(start.row, start.col + i),
            Orientation::Vertical => Coord::new(start.row + i, start.col),
        })
        .collect())
}

/// Bijective base-26 letters for a 1-based row number.
fn row_letters(row: u16) -> String {
    let mut letters = Vec::new();
    let mut n = row;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_row_stride_scheme() {
        assert_eq!(encode(Coord::new(1, 1), 10), Ok(101));
        assert_eq!(encode(Coord::new(2, 3), 10), Ok(203));
        assert_eq!(encode(Coord::new(10, 10), 10), Ok(1010));
    }

    #[test]
    fn encode_rejects_out_of_bounds() {
        assert_eq!(encode(Coord::new(0, 1), 10), Err(CoordError::OutOfBounds));
        assert_eq!(encode(Coord::new(1, 11), 10), Err(CoordError::OutOfBounds));
        assert_eq!(encode(Coord::new(21, 1), 20), Err(CoordError::OutOfBounds));
    }

    #[test]
    fn decode_round_trips_every_cell() {
        for row in 1..=MAX_BOARD {
            for col in 1..=MAX_BOARD {
                let coord = Coord::new(row, col);
                let code = encode(coord, MAX_BOARD).unwrap();
                assert_eq!(decode(code), coord);
            }
        }
    }

    #[test]
    fn parse_format_round_trips() {
        for input in ["A1", "B3", "J10", "T20", "c7"] {
            let coord = parse(input).unwrap();
            assert_eq!(format(coord), input.to_uppercase());
        }
        assert_eq!(parse("AA1"), Ok(Coord::new(27, 1)));
        assert_eq!(format(Coord::new(27, 1)), "AA1");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in ["", "A", "10", "A0", "A01", "1A", "A-1", "A 1", "A1B"] {
            assert_eq!(parse(input), Err(CoordError::Malformed), "input {input:?}");
        }
    }

    #[test]
    fn span_extends_along_one_axis() {
        let cells = span(Coord::new(1, 1), Orientation::Horizontal, 3, 10).unwrap();
        assert_eq!(
            cells,
            vec![Coord::new(1, 1), Coord::new(1, 2), Coord::new(1, 3)]
        );
        let cells = span(Coord::new(4, 2), Orientation::Vertical, 2, 10).unwrap();
        assert_eq!(cells, vec![Coord::new(4, 2), Coord::new(5, 2)]);
    }

    #[test]
    fn span_rejects_overflowing_placements() {
        // J10 + one cell east leaves a 10x10 board.
        assert_eq!(
            span(Coord::new(10, 10), Orientation::Horizontal, 2, 10),
            Err(CoordError::OutOfBounds)
        );
        assert_eq!(
            span(Coord::new(10, 10), Orientation::Vertical, 2, 10),
            Err(CoordError::OutOfBounds)
        );
    }

    #[test]
    fn neighbors_stay_in_bounds() {
        let corner: Vec<_> = Coord::new(1, 1).neighbors(10).collect();
        assert_eq!(corner, vec![Coord::new(2, 1), Coord::new(1, 2)]);
        let middle: Vec<_> = Coord::new(5, 5).neighbors(10).collect();
        assert_eq!(middle.len(), 4);
    }
}
