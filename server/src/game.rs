//! Turn dispatcher driving one match between two connected players
//!
//! The dispatcher owns the [`Board`] and both connections outright. Each round
//! runs the two sides strictly one after the other, so the second mover always
//! sees what the first mover did. A side that breaks the protocol loses on the
//! spot; a side that walks into a wall has made a legal, if final, move.

use crate::connection::{Connection, ConnectionError};
use crate::recorder::Recorder;
use log::{debug, info, warn};
use shared::codec::{ACTION_ACK, GAME_OVER, READY_ACK, READY_PROMPT};
use shared::{sense, Action, Board, DecodeError, MatchResult, Role, Sensor};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Lifecycle of the single match a server hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    AwaitingBothPlayers,
    Playing,
    Ended,
}

/// Protocol violations; each one costs the offending side the match
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("expected `gr`, got {0:?}")]
    UnexpectedReady(String),
    #[error("malformed action: {0}")]
    Decode(#[from] DecodeError),
}

/// Outcome handed back once both sockets are closed
#[derive(Debug)]
pub struct MatchReport {
    pub result: MatchResult,
    pub board: Board,
}

impl MatchReport {
    pub fn winner_name(&self) -> Option<&str> {
        self.result
            .winner
            .map(|role| self.board.character(role).name.as_str())
    }
}

pub struct Match<S = TcpStream> {
    board: Board,
    hot: Connection<S>,
    cool: Connection<S>,
    recorder: Box<dyn Recorder>,
}

impl<S> Match<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Player names must already be set on the board
    pub fn new(
        board: Board,
        hot: Connection<S>,
        cool: Connection<S>,
        recorder: Box<dyn Recorder>,
    ) -> Self {
        Self {
            board,
            hot,
            cool,
            recorder,
        }
    }

    /// Plays until the board reports game over or the turn limit is hit
    pub async fn run(mut self) -> MatchReport {
        let (hot_name, cool_name) = (
            self.board.character(Role::Hot).name.clone(),
            self.board.character(Role::Cool).name.clone(),
        );
        if let Err(e) = self.recorder.set_names(&hot_name, &cool_name) {
            warn!("Recorder failed to store names: {}", e);
        }
        info!("Match started: {} (hot) vs {} (cool)", hot_name, cool_name);

        while !self.board.is_game_over() && self.board.turn() < self.board.max_turns() {
            let turn = self.board.turn();
            debug!("Turn {} begins", turn);

            if let Err(role) = self.play_round(turn).await {
                info!("Match aborted in turn {}: {} forfeited", turn, role);
                break;
            }

            self.board.increment_turn();
            if let Err(e) = self.recorder.action(&self.board) {
                warn!("Recorder failed to store turn {}: {}", turn, e);
            }
        }

        self.finish().await
    }

    /// Runs both sides in turn order. A protocol violation ends the round
    /// early and is returned as the offending role. Once the board is over
    /// the result is settled and later failures no longer forfeit anyone.
    async fn play_round(&mut self, turn: u32) -> Result<(), Role> {
        for role in Role::turn_order(turn) {
            if let Err(e) = self.take_turn(role, turn).await {
                if self.board.is_game_over() {
                    debug!("{} failed after the match was decided: {}", role, e);
                    continue;
                }
                warn!("Protocol violation by {} in turn {}: {}", role, turn, e);
                self.board.forfeit(role);
                return Err(role);
            }
        }
        Ok(())
    }

    async fn take_turn(&mut self, role: Role, turn: u32) -> Result<(), TurnError> {
        let conn = match role {
            Role::Hot => &mut self.hot,
            Role::Cool => &mut self.cool,
        };

        conn.send(&format!("{}\n", READY_PROMPT)).await?;
        let ready = conn.receive().await?;
        if ready != READY_ACK {
            return Err(TurnError::UnexpectedReady(ready));
        }

        let around = sense(&self.board, role, Sensor::Neighborhood);
        conn.send(&around.to_line()).await?;
        if around.is_game_over() {
            return Ok(());
        }

        let action: Action = conn.receive().await?.parse()?;
        info!("Turn {}: {} {}", turn, role, action);
        apply_action(&mut self.board, role, action);

        let response = sense(&self.board, role, Sensor::for_action(&action));
        conn.send(&response.to_line()).await?;
        if response.is_game_over() {
            return Ok(());
        }

        let ack = conn.receive().await?;
        if ack != ACTION_ACK {
            warn!("{} acknowledged turn {} with {:?}", role, turn, ack);
        }
        Ok(())
    }

    async fn finish(mut self) -> MatchReport {
        let result = self.board.result();
        let board = &self.board;
        let name = |role: Role| board.character(role).name.as_str();

        if let Err(e) = self.recorder.result(
            result.winner.map(name),
            result.loser().map(name),
            &result.reason,
        ) {
            warn!("Recorder failed to store the result: {}", e);
        }

        let farewell = format!("{}\n", GAME_OVER);
        for conn in [&mut self.hot, &mut self.cool] {
            if let Err(e) = conn.send(&farewell).await {
                debug!("Could not say goodbye to {}: {}", conn.peer(), e);
            }
            conn.close().await;
        }

        if let Err(e) = self.recorder.close() {
            warn!("Recorder failed to close: {}", e);
        }

        info!(
            "Match over after {} turn(s): {} (items hot {} / cool {})",
            self.board.turn(),
            result.reason,
            self.board.character(Role::Hot).items,
            self.board.character(Role::Cool).items
        );

        MatchReport {
            result,
            board: self.board,
        }
    }
}

/// Applies a decoded action for `role`; sensing actions leave the board alone
pub fn apply_action(board: &mut Board, role: Role, action: Action) {
    match action {
        Action::Walk(dir) => {
            let outcome = board.walk(role, dir);
            if outcome.is_fatal() {
                info!("{} is out: {:?}", role, outcome);
            }
        }
        Action::Put(dir) => {
            let pos = board.character(role).position;
            if !board.put(pos, dir) {
                debug!("{} put {:?} had no effect", role, dir);
            }
        }
        Action::Look(_) | Action::Search(_) => {}
    }
}
