//! # Pursuit Game Server Library
//!
//! Authoritative server for the two-player pursuit game: a pursuer collects
//! points while evading a chaser, with any number of passive observers
//! watching. The server owns the canonical game state, applies client moves
//! in arrival order, and broadcasts full-state snapshots over UDP.
//!
//! ## Architecture
//!
//! ### Single authoritative loop
//! One `tokio::select!` loop drives both packet handling and the periodic
//! tick. It is the only owner of the [`game::Game`] and the
//! [`sessions::SessionRegistry`], so there is exactly one logical thread of
//! control over game data and no locks are needed. A background task does
//! nothing but read the socket and decode datagrams into a channel.
//!
//! ### Loss tolerance by snapshots
//! The transport is plain UDP with no reliability layer. Instead of deltas,
//! the server broadcasts a full per-recipient state snapshot every tick and
//! after every accepted move, so a lost datagram is corrected by the next
//! one. Rejected moves produce only a targeted error reply.
//!
//! ### Match lifecycle
//! A match waits for both competitive roles, gives the pursuer a head start
//! at each round start, and ends when the pursuer reaches the score
//! threshold, the chaser lands the third catch, or a competitor quits
//! mid-match. A finished match is announced, held through a cooldown, then
//! reset together with all sessions.
//!
//! ## Modules
//!
//! - [`game`] — the round/match state machine, movement, scoring and win
//!   conditions.
//! - [`sessions`] — endpoint-to-role assignment with role exclusivity.
//! - [`network`] — the UDP loop, packet dispatch and snapshot broadcast.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::board::Board;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = std::fs::read_to_string("maps/default.txt")?;
//!     let board = Board::parse(&text)?;
//!
//!     let mut server = Server::new(
//!         "0.0.0.0:1337",
//!         board,
//!         Duration::from_millis(33), // ~30 Hz tick
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
pub mod sessions;
