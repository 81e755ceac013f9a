//! Authoritative game physics for the two-character grid
//!
//! The board owns the grid and both characters. Every rule (walking, looking,
//! searching, wall placement, turn accounting and the final verdict) lives
//! here as a plain method so the server can drive it from a single task and
//! clients can replay the same rules locally.

use std::fmt;

/// Number of cells a search reports along its line of sight
pub const SEARCH_RANGE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Wall,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Row and column delta of a single step
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Next direction clockwise
    pub fn clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }
}

/// Grid coordinate with the origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The two fixed seats, decided by which port a player connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Hot,
    Cool,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Hot => Role::Cool,
            Role::Cool => Role::Hot,
        }
    }

    /// Acting order for a given turn: Hot leads on even turns, Cool on odd ones
    pub fn turn_order(turn: u32) -> [Role; 2] {
        if turn % 2 == 0 {
            [Role::Hot, Role::Cool]
        } else {
            [Role::Cool, Role::Hot]
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Hot => write!(f, "hot"),
            Role::Cool => write!(f, "cool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub position: Position,
    pub items: u32,
    pub alive: bool,
}

impl Character {
    pub fn new(position: Position) -> Self {
        Self {
            name: String::new(),
            position,
            items: 0,
            alive: true,
        }
    }
}

/// What a single walk did to the walking character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Moved,
    Collected,
    HitWall,
    Enclosed,
}

impl WalkOutcome {
    pub fn is_fatal(self) -> bool {
        matches!(self, WalkOutcome::HitWall | WalkOutcome::Enclosed)
    }
}

/// Final verdict of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: Option<Role>,
    pub reason: String,
}

impl MatchResult {
    fn win(role: Role, reason: &str) -> Self {
        Self {
            winner: Some(role),
            reason: reason.to_string(),
        }
    }

    fn draw(reason: &str) -> Self {
        Self {
            winner: None,
            reason: reason.to_string(),
        }
    }

    pub fn loser(&self) -> Option<Role> {
        self.winner.map(Role::opponent)
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    max_turns: u32,
    turn: u32,
    game_over: bool,
    hot: Character,
    cool: Character,
}

impl Board {
    /// Creates an all-empty board with both characters on their start cells
    pub fn new(
        width: usize,
        height: usize,
        max_turns: u32,
        hot: Position,
        cool: Position,
    ) -> Self {
        Self {
            cells: vec![Cell::Empty; width * height],
            width,
            height,
            max_turns,
            turn: 0,
            game_over: false,
            hot: Character::new(hot),
            cool: Character::new(cool),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn character(&self, role: Role) -> &Character {
        match role {
            Role::Hot => &self.hot,
            Role::Cool => &self.cool,
        }
    }

    pub fn character_mut(&mut self, role: Role) -> &mut Character {
        match role {
            Role::Hot => &mut self.hot,
            Role::Cool => &mut self.cool,
        }
    }

    pub fn set_name(&mut self, role: Role, name: impl Into<String>) {
        self.character_mut(role).name = name.into();
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.row < 0 || pos.col < 0 {
            return None;
        }
        let (row, col) = (pos.row as usize, pos.col as usize);
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(row * self.width + col)
    }

    /// Reads a cell; anything off the grid is a wall
    pub fn cell(&self, pos: Position) -> Cell {
        self.index(pos).map_or(Cell::Wall, |i| self.cells[i])
    }

    /// Writes an in-bounds cell. Out-of-bounds writes are ignored.
    pub fn set_cell(&mut self, pos: Position, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    /// Grid rows top to bottom, used by recorders and map writers
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }

    /// One step from `pos`. Does not look at the grid.
    pub fn step(pos: Position, dir: Direction) -> Position {
        let (d_row, d_col) = dir.offset();
        pos.offset(d_row, d_col)
    }

    fn is_occupied(&self, pos: Position) -> bool {
        self.hot.position == pos || self.cool.position == pos
    }

    fn is_enclosed(&self, pos: Position) -> bool {
        Direction::ALL
            .iter()
            .all(|&dir| self.cell(Self::step(pos, dir)) == Cell::Wall)
    }

    /// Moves a character one step, collecting items and applying both loss rules
    pub fn walk(&mut self, role: Role, dir: Direction) -> WalkOutcome {
        let target = Self::step(self.character(role).position, dir);

        let outcome = match self.cell(target) {
            Cell::Wall => {
                self.eliminate(role);
                return WalkOutcome::HitWall;
            }
            Cell::Item => {
                self.set_cell(target, Cell::Empty);
                self.character_mut(role).items += 1;
                WalkOutcome::Collected
            }
            Cell::Empty => WalkOutcome::Moved,
        };

        self.character_mut(role).position = target;

        if self.is_enclosed(target) {
            self.eliminate(role);
            return WalkOutcome::Enclosed;
        }

        outcome
    }

    /// The cell exactly two steps away
    pub fn look(&self, pos: Position, dir: Direction) -> Cell {
        self.cell(Self::step(Self::step(pos, dir), dir))
    }

    /// Cells one through nine steps away, nearest first
    pub fn search(&self, pos: Position, dir: Direction) -> [Cell; SEARCH_RANGE] {
        let mut cells = [Cell::Empty; SEARCH_RANGE];
        let mut current = pos;
        for cell in cells.iter_mut() {
            current = Self::step(current, dir);
            *cell = self.cell(current);
        }
        cells
    }

    /// Raises a wall one step away if that cell is empty and unoccupied
    pub fn put(&mut self, pos: Position, dir: Direction) -> bool {
        let target = Self::step(pos, dir);
        if self.cell(target) != Cell::Empty || self.is_occupied(target) {
            return false;
        }
        self.set_cell(target, Cell::Wall);
        true
    }

    pub fn increment_turn(&mut self) {
        self.turn += 1;
        if self.turn >= self.max_turns {
            self.game_over = true;
        }
    }

    /// Marks a side as having lost outright, e.g. after a protocol violation
    pub fn forfeit(&mut self, role: Role) {
        self.eliminate(role);
    }

    fn eliminate(&mut self, role: Role) {
        self.character_mut(role).alive = false;
        self.game_over = true;
    }

    /// Determines the winner from survival first, then item counts
    pub fn result(&self) -> MatchResult {
        let (hot, cool) = (&self.hot, &self.cool);

        match (hot.alive, cool.alive) {
            (false, false) => {
                if hot.items > cool.items {
                    MatchResult::win(Role::Hot, "both died, hot has more items")
                } else if cool.items > hot.items {
                    MatchResult::win(Role::Cool, "both died, cool has more items")
                } else {
                    MatchResult::draw("draw - both died with same items")
                }
            }
            (false, true) => MatchResult::win(Role::Cool, "hot died"),
            (true, false) => MatchResult::win(Role::Hot, "cool died"),
            (true, true) => {
                if hot.items > cool.items {
                    MatchResult::win(Role::Hot, "hot has more items")
                } else if cool.items > hot.items {
                    MatchResult::win(Role::Cool, "cool has more items")
                } else {
                    MatchResult::draw("draw")
                }
            }
        }
    }
}
