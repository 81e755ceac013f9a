//! # CHaser Client Library
//!
//! This library implements the player side of the CHaser protocol on top of
//! the codec in `shared`, plus a simple bot that can play a full match.
//!
//! ## Protocol Overview
//!
//! A match is a sequence of ready cycles and action cycles:
//!
//! 1. On connect the client sends its name as one line.
//! 2. Each turn the server prompts with `Ready`; the client answers `gr` and
//!    receives a ten-digit neighbourhood response.
//! 3. The client sends one action (`wk`, `lk`, `sc` or `pt` plus a direction
//!    digit), receives its response and acknowledges it with `#`.
//!
//! A response whose first digit is `0` means the match is over. The client
//! stops acknowledging at that point and treats a closed socket the same way.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::Client`], one method per protocol exchange.
//!
//! ### Bot Module (`bot`)
//! [`bot::Bot`], which picks an action from a neighbourhood response.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::bot::Bot;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1", 2009, "rusty").await?;
//!     let mut bot = Bot::default();
//!
//!     loop {
//!         let around = client.ready().await?;
//!         if around.is_game_over() {
//!             break;
//!         }
//!         if client.act(bot.choose(&around)).await?.is_game_over() {
//!             break;
//!         }
//!     }
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod network;
