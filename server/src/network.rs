//! Server network layer: listener setup and the two-player handshake
//!
//! A server hosts exactly one match. Both ports are bound up front, then both
//! seats are filled concurrently. If either seat fails to fill, the other
//! side's pending accept or name read is cancelled through a shared watch
//! signal and the match never starts.

use crate::connection::{Connection, ConnectionError, RECEIVE_TIMEOUT};
use crate::game::{Match, MatchReport, MatchState};
use crate::recorder::{NullRecorder, Recorder};
use log::{debug, info, warn};
use shared::{Board, NameEncoding, Role};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;

/// How long each seat waits for a player to connect
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port for the Hot seat
    pub first_port: u16,
    /// Port for the Cool seat
    pub second_port: u16,
    pub accept_timeout: Duration,
    pub receive_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            first_port: 2009,
            second_port: 2010,
            accept_timeout: ACCEPT_TIMEOUT,
            receive_timeout: RECEIVE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    fn port(&self, role: Role) -> u16 {
        match role {
            Role::Hot => self.first_port,
            Role::Cool => self.second_port,
        }
    }
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("no player connected within {0:?}")]
    AcceptTimeout(Duration),
    #[error("cancelled after the other seat failed")]
    Cancelled,
    #[error("accept failed: {0}")]
    Io(#[from] io::Error),
    #[error("could not read the player name: {0}")]
    Name(#[from] ConnectionError),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("{role} player failed to join: {source}")]
    Handshake {
        role: Role,
        #[source]
        source: HandshakeError,
    },
    #[error("this server has already hosted its match")]
    AlreadyPlayed,
}

/// A seated player: its connection and the name it announced
type Seat = (Connection, String);

pub struct Server {
    config: ServerConfig,
    hot_listener: TcpListener,
    cool_listener: TcpListener,
    board: Board,
    recorder: Option<Box<dyn Recorder>>,
    state: MatchState,
}

impl Server {
    /// Binds both seats. Either bind failing aborts setup.
    pub async fn bind(
        config: ServerConfig,
        board: Board,
        recorder: Box<dyn Recorder>,
    ) -> Result<Self, ServerError> {
        let hot_listener = Self::listen(&config, Role::Hot).await?;
        let cool_listener = Self::listen(&config, Role::Cool).await?;

        Ok(Self {
            config,
            hot_listener,
            cool_listener,
            board,
            recorder: Some(recorder),
            state: MatchState::AwaitingBothPlayers,
        })
    }

    async fn listen(config: &ServerConfig, role: Role) -> Result<TcpListener, ServerError> {
        let port = config.port(role);
        let listener = TcpListener::bind((config.host.as_str(), port))
            .await
            .map_err(|source| ServerError::Bind { port, source })?;

        match listener.local_addr() {
            Ok(addr) => info!("Listening for {} on {}", role, addr),
            Err(e) => warn!("Listening for {} on port {} ({})", role, port, e),
        }
        Ok(listener)
    }

    /// Actual addresses of the Hot and Cool listeners
    pub fn local_addrs(&self) -> io::Result<(SocketAddr, SocketAddr)> {
        Ok((
            self.hot_listener.local_addr()?,
            self.cool_listener.local_addr()?,
        ))
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    fn set_state(&mut self, next: MatchState) {
        debug!("Match state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Seats both players, then plays the match to the end
    pub async fn run(&mut self) -> Result<MatchReport, ServerError> {
        if self.state != MatchState::AwaitingBothPlayers {
            return Err(ServerError::AlreadyPlayed);
        }

        let seats = seat_players(&self.config, &self.hot_listener, &self.cool_listener).await;
        let ((hot, hot_name), (cool, cool_name)) = match seats {
            Ok(seats) => seats,
            Err(e) => {
                self.set_state(MatchState::Ended);
                return Err(e);
            }
        };

        let mut board = self.board.clone();
        board.set_name(Role::Hot, hot_name);
        board.set_name(Role::Cool, cool_name);
        let recorder: Box<dyn Recorder> = match self.recorder.take() {
            Some(recorder) => recorder,
            None => Box::new(NullRecorder),
        };

        self.set_state(MatchState::Playing);
        let report = Match::new(board, hot, cool, recorder).run().await;
        self.set_state(MatchState::Ended);

        Ok(report)
    }
}

async fn seat_players(
    config: &ServerConfig,
    hot_listener: &TcpListener,
    cool_listener: &TcpListener,
) -> Result<(Seat, Seat), ServerError> {
    let (cancel, _) = watch::channel(false);

    let (hot, cool) = tokio::join!(
        admit(config, hot_listener, Role::Hot, &cancel),
        admit(config, cool_listener, Role::Cool, &cancel),
    );

    // Report the seat that actually failed, not the one it cancelled
    let (role, source) = match (hot, cool) {
        (Ok(hot), Ok(cool)) => return Ok((hot, cool)),
        (Err(e), _) if !matches!(e, HandshakeError::Cancelled) => (Role::Hot, e),
        (_, Err(e)) => (Role::Cool, e),
        (Err(e), Ok(_)) => (Role::Hot, e),
    };
    warn!("Handshake failed for {}: {}", role, source);
    Err(ServerError::Handshake { role, source })
}

/// Fills one seat unless the other seat fails first
async fn admit(
    config: &ServerConfig,
    listener: &TcpListener,
    role: Role,
    cancel: &watch::Sender<bool>,
) -> Result<Seat, HandshakeError> {
    let mut cancelled = cancel.subscribe();

    let outcome = tokio::select! {
        outcome = handshake(config, listener, role) => outcome,
        _ = cancelled.wait_for(|&c| c) => Err(HandshakeError::Cancelled),
    };

    if outcome.is_err() {
        cancel.send_replace(true);
    }
    outcome
}

async fn handshake(
    config: &ServerConfig,
    listener: &TcpListener,
    role: Role,
) -> Result<Seat, HandshakeError> {
    let (stream, addr) = timeout(config.accept_timeout, listener.accept())
        .await
        .map_err(|_| HandshakeError::AcceptTimeout(config.accept_timeout))??;
    info!("{} player connected from {}", role, addr);

    let encoding = NameEncoding::for_port(listener.local_addr()?.port());
    let mut conn = Connection::new(stream, addr.to_string(), config.receive_timeout);
    let raw = conn.receive_bytes().await?;
    let name = encoding.decode(&raw).trim().to_string();

    info!("{} player is {:?}", role, name);
    Ok((conn, name))
}
