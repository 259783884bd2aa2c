//! Board parsing and the canonical point ordering.
//!
//! A board is parsed once at startup from a textual grid and never mutated.
//! The 40 point coordinates, sorted by (row, col), define the bitmap index
//! used on the wire; that ordering is a protocol contract.

use crate::{Coord, MAX_POINTS};
use thiserror::Error;

/// Classification of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Free,
    Point,
    PursuerStart,
    ChaserStart,
}

impl Cell {
    fn from_char(ch: char) -> Option<Cell> {
        match ch {
            'W' => Some(Cell::Wall),
            'F' => Some(Cell::Free),
            'P' => Some(Cell::Point),
            'C' => Some(Cell::PursuerStart),
            'S' => Some(Cell::ChaserStart),
            _ => None,
        }
    }

    /// Every cell kind except a wall can be stepped onto.
    pub fn passable(self) -> bool {
        self != Cell::Wall
    }
}

/// Reasons a textual map is rejected. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapFormatError {
    #[error("map is empty")]
    Empty,
    #[error("map row {row} has {len} cells, expected {expected}")]
    NotRectangular {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("unrecognized map character {ch:?} at ({row}, {col})")]
    UnknownChar { ch: char, row: usize, col: usize },
    #[error("map is {rows}x{cols}, limit is 255x255")]
    TooLarge { rows: usize, cols: usize },
    #[error("map has {found} pursuer starts, expected exactly one")]
    PursuerStartCount { found: usize },
    #[error("map has {found} chaser starts, expected exactly one")]
    ChaserStartCount { found: usize },
    #[error("map has {found} points, expected exactly {}", MAX_POINTS)]
    PointCount { found: usize },
    #[error("map border is open at ({row}, {col})")]
    OpenBorder { row: usize, col: usize },
}

/// Immutable parsed maze: dimensions, cell classification, start positions and
/// the ordered point set.
#[derive(Debug, Clone)]
pub struct Board {
    rows: u8,
    cols: u8,
    cells: Vec<Cell>,
    pursuer_start: Coord,
    chaser_start: Coord,
    points: Vec<Coord>,
}

impl Board {
    /// Parses and validates a newline-separated character grid.
    pub fn parse(text: &str) -> Result<Board, MapFormatError> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() || lines[0].is_empty() {
            return Err(MapFormatError::Empty);
        }

        let cols = lines[0].chars().count();
        for (row, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            if len != cols {
                return Err(MapFormatError::NotRectangular {
                    row,
                    len,
                    expected: cols,
                });
            }
        }

        let rows = lines.len();
        if rows > u8::MAX as usize || cols > u8::MAX as usize {
            return Err(MapFormatError::TooLarge { rows, cols });
        }

        let mut cells = Vec::with_capacity(rows * cols);
        let mut pursuer_starts = Vec::new();
        let mut chaser_starts = Vec::new();
        let mut points = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch)
                    .ok_or(MapFormatError::UnknownChar { ch, row, col })?;
                let at = Coord::new(row as u8, col as u8);
                match cell {
                    Cell::PursuerStart => pursuer_starts.push(at),
                    Cell::ChaserStart => chaser_starts.push(at),
                    // Row-major scan order is exactly the (row, col)
                    // lexicographic order of the protocol.
                    Cell::Point => points.push(at),
                    _ => {}
                }
                cells.push(cell);
            }
        }

        if pursuer_starts.len() != 1 {
            return Err(MapFormatError::PursuerStartCount {
                found: pursuer_starts.len(),
            });
        }
        if chaser_starts.len() != 1 {
            return Err(MapFormatError::ChaserStartCount {
                found: chaser_starts.len(),
            });
        }
        if points.len() != MAX_POINTS {
            return Err(MapFormatError::PointCount {
                found: points.len(),
            });
        }

        for row in 0..rows {
            for col in 0..cols {
                let on_border = row == 0 || row == rows - 1 || col == 0 || col == cols - 1;
                if on_border && cells[row * cols + col] != Cell::Wall {
                    return Err(MapFormatError::OpenBorder { row, col });
                }
            }
        }

        debug_assert!(points.windows(2).all(|w| w[0] < w[1]));

        Ok(Board {
            rows: rows as u8,
            cols: cols as u8,
            cells,
            pursuer_start: pursuer_starts[0],
            chaser_start: chaser_starts[0],
            points,
        })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Cell at `at`, or `None` when out of the grid.
    pub fn cell(&self, at: Coord) -> Option<Cell> {
        if at.row >= self.rows || at.col >= self.cols {
            return None;
        }
        Some(self.cells[at.row as usize * self.cols as usize + at.col as usize])
    }

    /// True when `at` is inside the grid and not a wall.
    pub fn passable(&self, at: Coord) -> bool {
        self.cell(at).is_some_and(Cell::passable)
    }

    pub fn pursuer_start(&self) -> Coord {
        self.pursuer_start
    }

    pub fn chaser_start(&self) -> Coord {
        self.chaser_start
    }

    /// The 40 point coordinates in canonical (row, col) order. The position of
    /// a coordinate in this slice is its bitmap index on the wire.
    pub fn point_order(&self) -> &[Coord] {
        &self.points
    }

    /// Bitmap index of the point at `at`, if that cell is a point.
    pub fn point_index(&self, at: Coord) -> Option<usize> {
        self.points.binary_search(&at).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x12 map: 60 interior cells holding the pursuer start, the chaser
    /// start, 40 points and 18 free cells.
    fn valid_map() -> String {
        let mut interior = vec!['C'];
        interior.extend(std::iter::repeat('P').take(40));
        interior.extend(std::iter::repeat('F').take(18));
        interior.push('S');
        assert_eq!(interior.len(), 60);

        let mut out = String::new();
        out.push_str(&"W".repeat(12));
        out.push('\n');
        for row in 0..6 {
            out.push('W');
            for col in 0..10 {
                out.push(interior[row * 10 + col]);
            }
            out.push_str("W\n");
        }
        out.push_str(&"W".repeat(12));
        out
    }

    #[test]
    fn parses_a_valid_map() {
        let board = Board::parse(&valid_map()).unwrap();
        assert_eq!(board.rows(), 8);
        assert_eq!(board.cols(), 12);
        assert_eq!(board.pursuer_start(), Coord::new(1, 1));
        assert_eq!(board.chaser_start(), Coord::new(6, 10));
        assert_eq!(board.point_order().len(), MAX_POINTS);
    }

    #[test]
    fn point_order_is_sorted_and_stable() {
        let board = Board::parse(&valid_map()).unwrap();
        let order = board.point_order();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        // The first point follows the pursuer start in scan order.
        assert_eq!(order[0], Coord::new(1, 2));
        // Repeated calls observe the same ordering.
        assert_eq!(board.point_order(), order);
        for (i, at) in order.iter().enumerate() {
            assert_eq!(board.point_index(*at), Some(i));
        }
    }

    #[test]
    fn point_index_misses_on_non_point_cells() {
        let board = Board::parse(&valid_map()).unwrap();
        assert_eq!(board.point_index(board.pursuer_start()), None);
        assert_eq!(board.point_index(Coord::new(0, 0)), None);
    }

    #[test]
    fn passability() {
        let board = Board::parse(&valid_map()).unwrap();
        assert!(!board.passable(Coord::new(0, 0)));
        assert!(board.passable(board.pursuer_start()));
        assert!(board.passable(board.chaser_start()));
        assert!(board.passable(Coord::new(1, 2)));
        // Out of bounds is not passable.
        assert!(!board.passable(Coord::new(8, 1)));
        assert!(!board.passable(Coord::new(1, 12)));
        assert!(!board.passable(Coord::new(255, 255)));
    }

    #[test]
    fn rejects_empty_map() {
        assert_eq!(Board::parse("").unwrap_err(), MapFormatError::Empty);
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut text = valid_map();
        text.push('W');
        assert!(matches!(
            Board::parse(&text),
            Err(MapFormatError::NotRectangular { .. })
        ));
    }

    #[test]
    fn rejects_unknown_characters() {
        let text = valid_map().replacen('F', "X", 1);
        assert!(matches!(
            Board::parse(&text),
            Err(MapFormatError::UnknownChar { ch: 'X', .. })
        ));
    }

    #[test]
    fn rejects_wrong_point_count() {
        let text = valid_map().replacen('P', "F", 1);
        assert_eq!(
            Board::parse(&text).unwrap_err(),
            MapFormatError::PointCount { found: 39 }
        );
    }

    #[test]
    fn rejects_duplicate_starts() {
        let text = valid_map().replacen('F', "C", 1);
        assert_eq!(
            Board::parse(&text).unwrap_err(),
            MapFormatError::PursuerStartCount { found: 2 }
        );
        let text = valid_map().replacen('F', "S", 1);
        assert_eq!(
            Board::parse(&text).unwrap_err(),
            MapFormatError::ChaserStartCount { found: 2 }
        );
    }

    #[test]
    fn rejects_open_border() {
        // Punch a hole in the top border.
        let mut text = valid_map();
        text.replace_range(3..4, "F");
        assert_eq!(
            Board::parse(&text).unwrap_err(),
            MapFormatError::OpenBorder { row: 0, col: 3 }
        );
    }

    #[test]
    fn rejects_oversized_map() {
        let wide = "W".repeat(300);
        let mut text = String::new();
        for _ in 0..3 {
            text.push_str(&wide);
            text.push('\n');
        }
        assert!(matches!(
            Board::parse(text.trim_end()),
            Err(MapFormatError::TooLarge { .. })
        ));
    }
}
