//! A small deterministic player
//!
//! The bot only ever looks at the neighbourhood response it gets from the
//! ready cycle. It grabs an adjacent item when it sees one, otherwise keeps
//! walking in its current heading and turns clockwise when blocked.

use shared::{Action, Direction, Reading, Response};

/// Neighbourhood slot holding the cell one step in `dir`
fn neighbor_slot(dir: Direction) -> usize {
    match dir {
        Direction::Up => 2,
        Direction::Left => 4,
        Direction::Right => 6,
        Direction::Down => 8,
    }
}

#[derive(Debug, Clone)]
pub struct Bot {
    heading: Direction,
}

impl Bot {
    pub fn new(heading: Direction) -> Self {
        Self { heading }
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Picks the next action from a neighbourhood response
    pub fn choose(&mut self, around: &Response) -> Action {
        let reading = |dir: Direction| around.slots[neighbor_slot(dir)];

        if let Some(dir) = Direction::ALL
            .into_iter()
            .find(|&dir| reading(dir) == Reading::Item)
        {
            self.heading = dir;
            return Action::Walk(dir);
        }

        let mut dir = self.heading;
        for _ in 0..Direction::ALL.len() {
            if reading(dir) == Reading::Empty {
                self.heading = dir;
                return Action::Walk(dir);
            }
            dir = dir.clockwise();
        }

        // Boxed in by walls and the opponent; stay put and look around
        Action::Search(self.heading)
    }
}

impl Default for Bot {
    fn default() -> Self {
        Self::new(Direction::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn around(line: &str) -> Response {
        line.parse().unwrap()
    }

    #[test]
    fn test_prefers_adjacent_item() {
        let mut bot = Bot::default();
        assert_eq!(bot.choose(&around("1000000030")), Action::Walk(Direction::Down));
        assert_eq!(bot.heading(), Direction::Down);
    }

    #[test]
    fn test_keeps_heading_while_open() {
        let mut bot = Bot::new(Direction::Left);
        assert_eq!(bot.choose(&around("1000000000")), Action::Walk(Direction::Left));
    }

    #[test]
    fn test_turns_clockwise_when_blocked() {
        let mut bot = Bot::default();

        // Up is a wall, right is the opponent, down is open
        assert_eq!(bot.choose(&around("1020001000")), Action::Walk(Direction::Down));
        assert_eq!(bot.heading(), Direction::Down);
    }

    #[test]
    fn test_never_walks_into_walls() {
        let mut bot = Bot::default();
        assert_eq!(bot.choose(&around("1222202222")), Action::Search(Direction::Up));
    }
}
