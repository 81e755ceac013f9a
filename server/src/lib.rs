//! # CHaser Match Server
//!
//! This library hosts a single two-player CHaser match over TCP. It owns the
//! authoritative board, talks the line-oriented text protocol with both
//! players, and reports the outcome.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! All rules run on the server against one [`shared::Board`] value. Clients
//! only ever see the ten-digit sensor responses derived from it, with the
//! opponent masked as an enemy reading.
//!
//! ### Seating
//! The Hot seat listens on the first port and the Cool seat on the second.
//! Both are accepted concurrently; each player's first line is its display
//! name. If either seat fails to fill in time, the other is cancelled and
//! the match never starts.
//!
//! ### Turn Dispatch
//! Rounds alternate which side moves first. Each side gets a ready cycle
//! (`Ready` / `gr` / neighbourhood response) followed by one action and its
//! response. Protocol violations cost the offending side the match.
//!
//! ### Recording
//! Names, a board snapshot after every round and the verdict go to a
//! [`recorder::Recorder`]. The dump recorder writes the replay format used
//! by match viewers.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! Line framing over any async byte stream with a per-line receive deadline.
//!
//! ### Game Module (`game`)
//! The turn dispatcher: per-side protocol steps, round order, teardown.
//!
//! ### Network Module (`network`)
//! Listener setup, concurrent handshake with cross-cancellation, and the
//! [`network::Server`] entry point.
//!
//! ### Recorder Module (`recorder`)
//! Replay dump writer and a no-op recorder.
//!
//! ### Map Generator Module (`mapgen`)
//! Seeded random boards built from rotated quadrants.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//! use server::recorder::NullRecorder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map = std::fs::read_to_string("maps/default.map")?;
//!     let board = shared::parse_map(&map)?;
//!
//!     let recorder = Box::new(NullRecorder);
//!     let mut server = Server::bind(ServerConfig::default(), board, recorder).await?;
//!     let report = server.run().await?;
//!     println!("{}", report.result.reason);
//!
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod game;
pub mod mapgen;
pub mod network;
pub mod recorder;
