//! Shared terrain and bounds for a match, plus the combat markings shown to
//! observers.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::common::PlacementError;
use crate::config::DEFAULT_BOARD_SIZE;
use crate::coord::Coord;
use crate::ship::Orientation;

/// What a cell is made of. Ships may only sit on water.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Terrain {
    Water,
    Land,
}

/// Public result marker left on a cell after a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Marking {
    Miss,
    Hit,
    Destroyed,
}

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    rows: usize,
    cols: usize,
    terrain: Vec<Terrain>,
    #[cfg_attr(feature = "std", serde(skip))]
    markings: BTreeMap<Coord, Marking>,
}

impl Board {
    /// All-water board of `rows`×`cols`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Board {
            rows,
            cols,
            terrain: alloc::vec![Terrain::Water; rows * cols],
            markings: BTreeMap::new(),
        }
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// Parse a terrain map: one line per row, `.` for water and `#` for land.
    /// Blank lines are ignored; every row must have the same width.
    pub fn from_ascii(map: &str) -> Result<Self, PlacementError> {
        let lines: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let rows = lines.len();
        let cols = lines.first().map(|l| l.chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(PlacementError::OutOfBounds);
        }
        let mut board = Board::new(rows, cols);
        for (r, line) in lines.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(PlacementError::OutOfBounds);
            }
            for (c, ch) in line.chars().enumerate() {
                if ch == '#' {
                    board.set_terrain(Coord::new(r, c), Terrain::Land)?;
                }
            }
        }
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        c.row < self.rows && c.col < self.cols
    }

    pub fn set_terrain(&mut self, c: Coord, terrain: Terrain) -> Result<(), PlacementError> {
        if !self.in_bounds(c) {
            return Err(PlacementError::OutOfBounds);
        }
        let idx = c.row * self.cols + c.col;
        self.terrain[idx] = terrain;
        Ok(())
    }

    pub fn terrain_at(&self, c: Coord) -> Option<Terrain> {
        if self.in_bounds(c) {
            Some(self.terrain[c.row * self.cols + c.col])
        } else {
            None
        }
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Coord::new(r, c)))
    }

    /// Check that every cell is on the board and on water.
    pub fn can_place(&self, cells: &[Coord]) -> Result<(), PlacementError> {
        for &c in cells {
            match self.terrain_at(c) {
                None => return Err(PlacementError::OutOfBounds),
                Some(Terrain::Land) => return Err(PlacementError::Land),
                Some(Terrain::Water) => {}
            }
        }
        Ok(())
    }

    /// Cells covered by a ship of `len` starting at `origin`, or `None` if it
    /// runs off the board.
    pub fn layout(&self, origin: Coord, orientation: Orientation, len: usize) -> Option<Vec<Coord>> {
        let cells: Vec<Coord> = (0..len)
            .map(|i| match orientation {
                Orientation::Horizontal => Coord::new(origin.row, origin.col + i),
                Orientation::Vertical => Coord::new(origin.row + i, origin.col),
            })
            .collect();
        if cells.iter().all(|&c| self.in_bounds(c)) {
            Some(cells)
        } else {
            None
        }
    }

    /// Record the public result of a shot. A `Destroyed` marking is never
    /// downgraded.
    pub fn mark(&mut self, c: Coord, marking: Marking) {
        if !self.in_bounds(c) {
            return;
        }
        let entry = self.markings.entry(c).or_insert(marking);
        if *entry != Marking::Destroyed {
            *entry = marking;
        }
    }

    pub fn marking(&self, c: Coord) -> Option<Marking> {
        self.markings.get(&c).copied()
    }

    pub fn clear_markings(&mut self) {
        self.markings.clear();
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::square(DEFAULT_BOARD_SIZE)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {}x{} {{", self.rows, self.cols)?;
        for r in 0..self.rows {
            write!(f, "  ")?;
            for c in 0..self.cols {
                let cell = Coord::new(r, c);
                let ch = match (self.marking(cell), self.terrain_at(cell)) {
                    (Some(Marking::Destroyed), _) => 'X',
                    (Some(Marking::Hit), _) => '*',
                    (Some(Marking::Miss), _) => 'o',
                    (None, Some(Terrain::Land)) => '#',
                    _ => '.',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
