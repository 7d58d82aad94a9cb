//! Grid coordinates used as keys throughout the engine.

use core::fmt;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A cell on the board, addressed by zero-based row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

/// A locked hunting line: every cell shares the row, or the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row(usize),
    Col(usize),
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Shift by (`dr`, `dc`), returning `None` when the result leaves a
    /// `rows`×`cols` grid.
    pub fn offset(&self, dr: isize, dc: isize, rows: usize, cols: usize) -> Option<Coord> {
        let r = self.row as isize + dr;
        let c = self.col as isize + dc;
        if r < 0 || c < 0 || r as usize >= rows || c as usize >= cols {
            return None;
        }
        Some(Coord::new(r as usize, c as usize))
    }

    /// Orthogonal neighbours inside the grid, in N, S, W, E order.
    pub fn neighbors(&self, rows: usize, cols: usize) -> Vec<Coord> {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .iter()
            .filter_map(|&(dr, dc)| self.offset(dr, dc, rows, cols))
            .collect()
    }

    pub fn manhattan(&self, other: Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The axis shared with `other`, if the two cells line up.
    pub fn shared_axis(&self, other: Coord) -> Option<Axis> {
        if self == &other {
            None
        } else if self.row == other.row {
            Some(Axis::Row(self.row))
        } else if self.col == other.col {
            Some(Axis::Col(self.col))
        } else {
            None
        }
    }

    /// Parse the `A5` notation: column letter followed by a 1-based row.
    pub fn parse(input: &str) -> Result<Coord, String> {
        let input = input.trim();
        if input.len() < 2 {
            return Err("Too short - need column letter and row number (e.g., A5)".to_string());
        }
        let mut chars = input.chars();
        let col_ch = chars
            .next()
            .ok_or_else(|| "No column letter".to_string())?
            .to_ascii_uppercase();
        if !col_ch.is_ascii_alphabetic() {
            return Err(alloc::format!("Invalid column '{}'", col_ch));
        }
        let col = (col_ch as u8 - b'A') as usize;
        let row_str: String = chars.collect();
        let row: usize = row_str
            .parse()
            .map_err(|_| alloc::format!("Invalid row '{}'", row_str))?;
        if row == 0 {
            return Err("Row cannot be 0".to_string());
        }
        Ok(Coord::new(row - 1, col))
    }
}

impl Axis {
    pub fn contains(&self, c: Coord) -> bool {
        match *self {
            Axis::Row(r) => c.row == r,
            Axis::Col(col) => c.col == col,
        }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Coord::new(row, col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col < 26 {
            write!(f, "{}{}", (b'A' + self.col as u8) as char, self.row + 1)
        } else {
            write!(f, "({}, {})", self.row, self.col)
        }
    }
}
