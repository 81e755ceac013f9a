//! Map file format
//!
//! A map is a list of tagged lines: `N` name, `T` turn limit, `S height,width`,
//! `D row,col,value` per cell and `H`/`C` start positions. Lines shorter than
//! a tag and unknown tags are skipped.

use crate::board::{Board, Cell, Position, Role};
use std::fmt::Write;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("line {line}: expected {expected} comma-separated values in {text:?}")]
    FieldCount {
        line: usize,
        expected: usize,
        text: String,
    },
    #[error("line {line}: invalid number: {source}")]
    Number {
        line: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: unknown cell value {value}")]
    CellValue { line: usize, value: i64 },
    #[error("line {line}: cell data before the `S` size line")]
    DataBeforeSize { line: usize },
    #[error("line {line}: board of {height}x{width} exceeds the size limit")]
    Size {
        line: usize,
        height: i64,
        width: i64,
    },
    #[error("line {line}: value {value} is out of range")]
    OutOfRange { line: usize, value: i64 },
    #[error("missing `{0}` line")]
    Missing(char),
}

/// Largest board a map file may declare
pub const MAX_CELLS: usize = 1 << 20;

impl Cell {
    /// Numeric value used by map files and replay dumps
    pub fn map_value(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Wall => 2,
            Cell::Item => 3,
        }
    }

    pub fn from_map_value(value: i64) -> Option<Cell> {
        match value {
            0 => Some(Cell::Empty),
            2 => Some(Cell::Wall),
            3 => Some(Cell::Item),
            _ => None,
        }
    }
}

fn fields<const N: usize>(line: usize, text: &str) -> Result<[i64; N], MapError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(MapError::FieldCount {
            line,
            expected: N,
            text: text.to_string(),
        });
    }

    let mut values = [0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .map_err(|source| MapError::Number { line, source })?;
    }
    Ok(values)
}

fn narrow<T: TryFrom<i64>>(line: usize, value: i64) -> Result<T, MapError> {
    T::try_from(value).map_err(|_| MapError::OutOfRange { line, value })
}

fn coordinates(line: usize, row: i64, col: i64) -> Result<Position, MapError> {
    Ok(Position::new(narrow(line, row)?, narrow(line, col)?))
}

fn position(line: usize, text: &str) -> Result<Position, MapError> {
    let [row, col] = fields::<2>(line, text)?;
    coordinates(line, row, col)
}

fn board_size(line: usize, height: i64, width: i64) -> Result<(usize, usize), MapError> {
    let too_big = MapError::Size {
        line,
        height,
        width,
    };
    let (Ok(h), Ok(w)) = (usize::try_from(height.max(0)), usize::try_from(width.max(0))) else {
        return Err(too_big);
    };
    match h.checked_mul(w) {
        Some(cells) if cells <= MAX_CELLS => Ok((h, w)),
        _ => Err(too_big),
    }
}

/// Builds a ready-to-play board from map text
pub fn parse_map(text: &str) -> Result<Board, MapError> {
    let mut max_turns = None;
    let mut size = None;
    let mut cells = Vec::new();
    let mut hot = None;
    let mut cool = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let (Some(tag), Some(data)) = (raw.get(..2), raw.get(2..)) else {
            continue;
        };
        let data = data.trim();

        match tag {
            "T " => {
                let [turns] = fields::<1>(line, data)?;
                max_turns = Some(narrow::<u32>(line, turns.max(0))?);
            }
            "S " => {
                let [height, width] = fields::<2>(line, data)?;
                size = Some(board_size(line, height, width)?);
            }
            "D " => {
                if size.is_none() {
                    return Err(MapError::DataBeforeSize { line });
                }
                let [row, col, value] = fields::<3>(line, data)?;
                let cell =
                    Cell::from_map_value(value).ok_or(MapError::CellValue { line, value })?;
                cells.push((coordinates(line, row, col)?, cell));
            }
            "H " => hot = Some(position(line, data)?),
            "C " => cool = Some(position(line, data)?),
            _ => {}
        }
    }

    let (height, width) = size.ok_or(MapError::Missing('S'))?;
    let max_turns = max_turns.ok_or(MapError::Missing('T'))?;
    let hot = hot.ok_or(MapError::Missing('H'))?;
    let cool = cool.ok_or(MapError::Missing('C'))?;

    let mut board = Board::new(width, height, max_turns, hot, cool);
    for (pos, cell) in cells {
        board.set_cell(pos, cell);
    }
    Ok(board)
}

/// Writes a board back out in map format
pub fn format_map(board: &Board, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "N {}", name);
    let _ = writeln!(out, "T {}", board.max_turns());
    let _ = writeln!(out, "S {},{}", board.height(), board.width());

    for (row, cells) in board.rows().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let _ = writeln!(out, "D {},{},{}", row, col, cell.map_value());
        }
    }

    for (tag, role) in [('H', Role::Hot), ('C', Role::Cool)] {
        let pos = board.character(role).position;
        let _ = writeln!(out, "{} {},{}", tag, pos.row, pos.col);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_MAP: &str = "\
N small
T 120
S 3,4
D 0,0,0
D 0,1,3
D 1,1,2
D 2,3,3
D 9,9,2
H 0,0
C 2,2
";

    #[test]
    fn test_parse_small_map() {
        let board = parse_map(SMALL_MAP).unwrap();

        assert_eq!(board.height(), 3);
        assert_eq!(board.width(), 4);
        assert_eq!(board.max_turns(), 120);
        assert_eq!(board.cell(Position::new(0, 1)), Cell::Item);
        assert_eq!(board.cell(Position::new(1, 1)), Cell::Wall);
        assert_eq!(board.cell(Position::new(2, 3)), Cell::Item);
        assert_eq!(board.cell(Position::new(1, 0)), Cell::Empty);
        assert_eq!(board.character(Role::Hot).position, Position::new(0, 0));
        assert_eq!(board.character(Role::Cool).position, Position::new(2, 2));
        assert_eq!(board.turn(), 0);
        assert!(!board.is_game_over());
    }

    #[test]
    fn test_parse_skips_short_and_unknown_lines() {
        let text = "\n#\nX whatever\nT 5\nS 1,1\nH 0,0\nC 0,0\n";
        let board = parse_map(text).unwrap();
        assert_eq!(board.max_turns(), 5);
    }

    #[test]
    fn test_parse_reports_missing_lines() {
        assert!(matches!(parse_map("T 5\nH 0,0\nC 0,0\n"), Err(MapError::Missing('S'))));
        assert!(matches!(parse_map("S 2,2\nH 0,0\nC 0,0\n"), Err(MapError::Missing('T'))));
        assert!(matches!(parse_map("T 5\nS 2,2\nC 0,0\n"), Err(MapError::Missing('H'))));
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(matches!(
            parse_map("T 5\nD 0,0,2\nS 2,2\n"),
            Err(MapError::DataBeforeSize { line: 2 })
        ));
        assert!(matches!(
            parse_map("T x\n"),
            Err(MapError::Number { line: 1, .. })
        ));
        assert!(matches!(
            parse_map("S 2,2\nD 0,0,1\n"),
            Err(MapError::CellValue { line: 2, value: 1 })
        ));
        assert!(matches!(
            parse_map("S 2\n"),
            Err(MapError::FieldCount { expected: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_oversized_board() {
        assert!(matches!(
            parse_map("T 1\nS 5000000000,5000000000\nH 0,0\nC 0,0\n"),
            Err(MapError::Size { line: 2, .. })
        ));
        assert!(matches!(
            parse_map("T 1\nS 1025,1025\nH 0,0\nC 0,0\n"),
            Err(MapError::Size { line: 2, .. })
        ));
        assert!(parse_map("T 1\nS 1024,1024\nH 0,0\nC 0,0\n").is_ok());
    }

    #[test]
    fn test_parse_rejects_out_of_range_values() {
        assert!(matches!(
            parse_map("T 1\nS 2,2\nH 4294967296,0\nC 0,0\n"),
            Err(MapError::OutOfRange { line: 3, value: 4294967296 })
        ));
        assert!(matches!(
            parse_map("T 1\nS 2,2\nD 0,-4294967297,2\n"),
            Err(MapError::OutOfRange { line: 3, .. })
        ));
        assert!(matches!(
            parse_map("T 9999999999\nS 2,2\n"),
            Err(MapError::OutOfRange { line: 1, .. })
        ));
    }

    #[test]
    fn test_format_map_loads_back() {
        let board = parse_map(SMALL_MAP).unwrap();
        let text = format_map(&board, "copy");

        assert!(text.starts_with("N copy\nT 120\nS 3,4\nD 0,0,0\nD 0,1,3\n"));
        assert!(text.ends_with("H 0,0\nC 2,2\n"));

        let reloaded = parse_map(&text).unwrap();
        assert!(board.rows().eq(reloaded.rows()));
        assert_eq!(
            reloaded.character(Role::Cool).position,
            board.character(Role::Cool).position
        );
    }
}
