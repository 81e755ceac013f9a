//! Text wire format shared by the server and conforming clients
//!
//! Every value that crosses the wire is mapped through exactly one table here:
//! sensor readings to digits, directions to digits, actions to mnemonics.
//! Both ends of the protocol link against this module, so an encoding can
//! never drift between them.

use crate::board::{Board, Cell, Direction, Position, Role, SEARCH_RANGE};
use encoding_rs::SHIFT_JIS;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of digits in a sensor response
pub const RESPONSE_LEN: usize = 10;

/// Prompt the server sends before each side's ready cycle
pub const READY_PROMPT: &str = "Ready";
/// Token a client answers the prompt with
pub const READY_ACK: &str = "gr";
/// Token a client sends after consuming an action response
pub const ACTION_ACK: &str = "#";
/// Final line the server sends to both sides
pub const GAME_OVER: &str = "#";

/// Ports whose clients send their name in Shift_JIS instead of UTF-8
pub const LEGACY_NAME_PORTS: [u16; 2] = [40000, 50000];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected `<action> <direction>`, got {0} token(s) in {1:?}")]
    TokenCount(usize, String),
    #[error("unknown action mnemonic {0:?}")]
    UnknownAction(String),
    #[error("invalid direction {0:?}")]
    InvalidDirection(String),
    #[error("response must be 10 digits, got {0}")]
    ResponseLength(usize),
    #[error("invalid response digit {found:?} at position {position}")]
    ResponseDigit { position: usize, found: char },
}

/// One sensor slot as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reading {
    Empty,
    Enemy,
    Wall,
    Item,
}

impl Reading {
    pub fn to_digit(self) -> u8 {
        match self {
            Reading::Empty => 0,
            Reading::Enemy => 1,
            Reading::Wall => 2,
            Reading::Item => 3,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Reading> {
        match digit {
            0 => Some(Reading::Empty),
            1 => Some(Reading::Enemy),
            2 => Some(Reading::Wall),
            3 => Some(Reading::Item),
            _ => None,
        }
    }
}

impl From<Cell> for Reading {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => Reading::Empty,
            Cell::Wall => Reading::Wall,
            Cell::Item => Reading::Item,
        }
    }
}

impl Direction {
    pub fn to_digit(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Direction> {
        match digit {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Ten-slot sensor response. Slot 0 is the continuation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub slots: [Reading; RESPONSE_LEN],
}

impl Response {
    /// A response carrying nothing but the end-of-match flag
    pub fn game_over() -> Self {
        Self {
            slots: [Reading::Empty; RESPONSE_LEN],
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.slots[0] == Reading::Empty
    }

    /// Slots 1 through 9
    pub fn readings(&self) -> &[Reading] {
        &self.slots[1..]
    }

    /// Ten digits followed by a newline, ready for the socket
    pub fn to_line(&self) -> String {
        let mut line = self.to_string();
        line.push('\n');
        line
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            write!(f, "{}", slot.to_digit())?;
        }
        Ok(())
    }
}

impl FromStr for Response {
    type Err = DecodeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut digits = line;
        for _ in 0..2 {
            if let Some(rest) = digits.strip_suffix(['\n', '\r']) {
                digits = rest;
            }
        }

        let count = digits.chars().count();
        if count != RESPONSE_LEN {
            return Err(DecodeError::ResponseLength(count));
        }

        let mut slots = [Reading::Empty; RESPONSE_LEN];
        for (position, (slot, found)) in slots.iter_mut().zip(digits.chars()).enumerate() {
            *slot = found
                .to_digit(10)
                .and_then(|d| Reading::from_digit(d as u8))
                .ok_or(DecodeError::ResponseDigit { position, found })?;
        }

        Ok(Response { slots })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Walk(Direction),
    Look(Direction),
    Search(Direction),
    Put(Direction),
}

impl Action {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Action::Walk(_) => "wk",
            Action::Look(_) => "lk",
            Action::Search(_) => "sc",
            Action::Put(_) => "pt",
        }
    }

    pub fn direction(&self) -> Direction {
        match *self {
            Action::Walk(d) | Action::Look(d) | Action::Search(d) | Action::Put(d) => d,
        }
    }

    /// Command line as a client sends it, including the CRLF terminator
    pub fn to_line(&self) -> String {
        format!("{}\r\n", self)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mnemonic(), self.direction().to_digit())
    }
}

impl FromStr for Action {
    type Err = DecodeError;

    fn from_str(command: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = command.split(' ').collect();
        let [mnemonic, direction] = tokens[..] else {
            return Err(DecodeError::TokenCount(tokens.len(), command.to_string()));
        };

        let dir = match direction.as_bytes() {
            [digit @ b'0'..=b'9'] => Direction::from_digit(digit - b'0'),
            _ => None,
        }
        .ok_or_else(|| DecodeError::InvalidDirection(direction.to_string()))?;

        match mnemonic {
            "wk" => Ok(Action::Walk(dir)),
            "lk" => Ok(Action::Look(dir)),
            "sc" => Ok(Action::Search(dir)),
            "pt" => Ok(Action::Put(dir)),
            other => Err(DecodeError::UnknownAction(other.to_string())),
        }
    }
}

/// Which cells a response reports, and in which slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    /// The 3x3 block around the actor, row-major, in slots 1..=9
    Neighborhood,
    /// The single cell two steps ahead, in slot 2
    Look(Direction),
    /// The nine cells straight ahead, nearest first, in slots 1..=9
    Search(Direction),
}

impl Sensor {
    /// Sensor matching the response an action produces
    pub fn for_action(action: &Action) -> Self {
        match *action {
            Action::Walk(_) | Action::Put(_) => Sensor::Neighborhood,
            Action::Look(d) => Sensor::Look(d),
            Action::Search(d) => Sensor::Search(d),
        }
    }

    fn targets(self, origin: Position) -> [Option<Position>; RESPONSE_LEN - 1] {
        let mut targets = [None; RESPONSE_LEN - 1];
        match self {
            Sensor::Neighborhood => {
                for (i, target) in targets.iter_mut().enumerate() {
                    let (d_row, d_col) = (i as i32 / 3 - 1, i as i32 % 3 - 1);
                    *target = Some(origin.offset(d_row, d_col));
                }
            }
            Sensor::Look(dir) => {
                targets[1] = Some(Board::step(Board::step(origin, dir), dir));
            }
            Sensor::Search(dir) => {
                let mut current = origin;
                for target in targets.iter_mut().take(SEARCH_RANGE) {
                    current = Board::step(current, dir);
                    *target = Some(current);
                }
            }
        }
        targets
    }
}

/// Builds the response `viewer` receives, masking the opponent as an enemy
///
/// Every action kind goes through this one function so a cell holding the
/// opponent always reads as `Enemy`, whatever the terrain beneath it.
pub fn sense(board: &Board, viewer: Role, sensor: Sensor) -> Response {
    let origin = board.character(viewer).position;
    let opponent = board.character(viewer.opponent()).position;

    let mut response = Response::game_over();
    if !board.is_game_over() {
        response.slots[0] = Reading::Enemy;
    }

    for (slot, target) in response.slots[1..]
        .iter_mut()
        .zip(sensor.targets(origin))
    {
        if let Some(pos) = target {
            *slot = if pos == opponent {
                Reading::Enemy
            } else {
                Reading::from(board.cell(pos))
            };
        }
    }

    response
}

#[derive(Debug, Error)]
#[error("name {0:?} cannot be represented in Shift_JIS")]
pub struct NameEncodingError(pub String);

/// Text encoding of the handshake name, chosen by the server port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEncoding {
    Utf8,
    ShiftJis,
}

impl NameEncoding {
    pub fn for_port(port: u16) -> Self {
        if LEGACY_NAME_PORTS.contains(&port) {
            NameEncoding::ShiftJis
        } else {
            NameEncoding::Utf8
        }
    }

    pub fn encode(self, name: &str) -> Result<Vec<u8>, NameEncodingError> {
        match self {
            NameEncoding::Utf8 => Ok(name.as_bytes().to_vec()),
            NameEncoding::ShiftJis => {
                let (bytes, _, had_errors) = SHIFT_JIS.encode(name);
                if had_errors {
                    return Err(NameEncodingError(name.to_string()));
                }
                Ok(bytes.into_owned())
            }
        }
    }

    /// Decodes a received name, replacing malformed sequences
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            NameEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            NameEncoding::ShiftJis => SHIFT_JIS.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }
}
