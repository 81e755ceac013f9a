//! Game rules and wire format shared by the CHaser server and its clients

pub mod board;
pub mod codec;
pub mod map;

pub use board::{Board, Cell, Character, Direction, MatchResult, Position, Role, WalkOutcome};
pub use codec::{sense, Action, DecodeError, NameEncoding, Reading, Response, Sensor};
pub use map::{format_map, parse_map, MapError};
