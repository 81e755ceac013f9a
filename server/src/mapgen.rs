//! Random map generation
//!
//! A generated board is four rotations of one random 7x8 quadrant laid out
//! around a pair of empty 8x2 strips, giving a 15x17 board where both halves
//! see roughly the same terrain. Characters start on mirrored cells.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{format_map, Board, Cell, Position};
use std::fs;
use std::io;
use std::path::Path;

pub const QUADRANT_WIDTH: usize = 7;
pub const QUADRANT_HEIGHT: usize = 8;
pub const BOARD_WIDTH: usize = 15;
pub const BOARD_HEIGHT: usize = 17;
pub const GENERATED_TURNS: u32 = 120;

const GAP_WIDTH: usize = 8;
const GAP_HEIGHT: usize = 2;
const PLACEMENT_ATTEMPTS: usize = 100;
const START_ATTEMPTS: usize = 1000;

type Grid = Vec<Vec<Cell>>;

fn empty_grid(width: usize, height: usize) -> Grid {
    vec![vec![Cell::Empty; width]; height]
}

/// Quarter turn: row `r` of the result is column `width - 1 - r` of the input
fn rotate(grid: &Grid) -> Grid {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);

    (0..width)
        .map(|r| (0..height).map(|c| grid[c][width - 1 - r]).collect())
        .collect()
}

/// Copies `src` into `dst` with its top-left corner at (`row`, `col`), clipping
fn paste(dst: &mut Grid, src: &Grid, row: usize, col: usize) {
    for (src_row, cells) in src.iter().enumerate() {
        let Some(dst_row) = dst.get_mut(row + src_row) else {
            break;
        };
        for (src_col, &cell) in cells.iter().enumerate() {
            if let Some(slot) = dst_row.get_mut(col + src_col) {
                *slot = cell;
            }
        }
    }
}

pub struct MapGenerator {
    rng: StdRng,
}

impl MapGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds one board with up to `max_blocks` walls and `max_items` items
    /// per quadrant
    pub fn generate(&mut self, max_blocks: usize, max_items: usize) -> Board {
        let top_left = self.quadrant(max_blocks, max_items);
        let top_right = rotate(&top_left);
        let bottom_left = rotate(&top_right);
        let bottom_right = rotate(&bottom_left);

        let mut grid = empty_grid(BOARD_WIDTH, BOARD_HEIGHT);
        let gap = empty_grid(GAP_WIDTH, GAP_HEIGHT);
        paste(&mut grid, &top_left, 0, 0);
        paste(&mut grid, &top_right, 0, QUADRANT_WIDTH);
        paste(&mut grid, &gap, QUADRANT_HEIGHT - 1, 0);
        paste(&mut grid, &gap, QUADRANT_HEIGHT - 1, QUADRANT_WIDTH);
        paste(&mut grid, &bottom_left, QUADRANT_HEIGHT + 1, 0);
        paste(&mut grid, &bottom_right, QUADRANT_HEIGHT + 1, QUADRANT_WIDTH);

        let (hot, cool) = self.start_positions(&grid);
        debug!("Generated board with hot at {} and cool at {}", hot, cool);

        let mut board = Board::new(BOARD_WIDTH, BOARD_HEIGHT, GENERATED_TURNS, hot, cool);
        for (row, cells) in grid.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                board.set_cell(Position::new(row as i32, col as i32), cell);
            }
        }
        board
    }

    fn quadrant(&mut self, max_blocks: usize, max_items: usize) -> Grid {
        let mut grid = empty_grid(QUADRANT_WIDTH, QUADRANT_HEIGHT);

        // Blocks stay off the quadrant border so the strips remain walkable
        let blocks = self.rng.gen_range(0..=max_blocks);
        for _ in 0..blocks {
            self.scatter(&mut grid, Cell::Wall, 1);
        }

        let items = self.rng.gen_range(0..=max_items);
        for _ in 0..items {
            self.scatter(&mut grid, Cell::Item, 0);
        }
        grid
    }

    /// Drops `cell` on a random empty square at least `margin` from the edge
    fn scatter(&mut self, grid: &mut Grid, cell: Cell, margin: usize) {
        let height = grid.len();
        let width = grid.first().map_or(0, Vec::len);

        for _ in 0..PLACEMENT_ATTEMPTS {
            let row = self.rng.gen_range(margin..height - margin);
            let col = self.rng.gen_range(margin..width - margin);
            if grid[row][col] == Cell::Empty {
                grid[row][col] = cell;
                return;
            }
        }
    }

    /// Cool on a random empty cell, Hot on the point-mirrored one
    fn start_positions(&mut self, grid: &Grid) -> (Position, Position) {
        let height = grid.len();
        let width = grid.first().map_or(0, Vec::len);

        for _ in 0..START_ATTEMPTS {
            let row = self.rng.gen_range(0..height);
            let col = self.rng.gen_range(0..width);
            let (hot_row, hot_col) = (height - 1 - row, width - 1 - col);

            if grid[row][col] == Cell::Empty && grid[hot_row][hot_col] == Cell::Empty {
                return (
                    Position::new(hot_row as i32, hot_col as i32),
                    Position::new(row as i32, col as i32),
                );
            }
        }

        (
            Position::new(height as i32 - 1, width as i32 - 1),
            Position::new(0, 0),
        )
    }
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes `board` to `path` in map format, creating parent directories
pub fn save_map(board: &Board, path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    fs::write(path, format_map(board, &format!("generated{}", file_name)))
}

/// File name of the `index`-th generated map, counting from one
pub fn map_file_name(index: usize) -> String {
    format!("RandMap_{}.map", index)
}
