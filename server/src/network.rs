//! UDP server loop: decodes datagrams, routes them to the session registry
//! and game engine, and broadcasts snapshots.
//!
//! A background task reads the socket and feeds decoded packets into a
//! channel; the `run` loop is the single owner of the registry and game
//! state, so packets from one endpoint are applied strictly in arrival order
//! and no locks are needed on game data. Sends are fire-and-forget: the
//! transport is unreliable by design and the periodic snapshot corrects loss.

use crate::game::{Game, MoveOutcome, Phase};
use crate::sessions::{RoleTaken, SessionRegistry};
use log::{debug, info, warn};
use shared::board::Board;
use shared::protocol::{pack_collected, ClientPacket, ErrorCode, ProtocolError, ServerPacket};
use shared::{Contender, Direction, Role};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;

/// How long a finished match stays visible before the server clears all
/// sessions and resets to `Waiting`.
const RESTART_COOLDOWN: Duration = Duration::from_secs(10);

/// Messages sent from the receive task to the main loop.
#[derive(Debug)]
enum ServerMessage {
    Packet {
        packet: ClientPacket,
        addr: SocketAddr,
    },
    Malformed {
        err: ProtocolError,
        addr: SocketAddr,
    },
}

/// Main server aggregate owning the socket, session registry and game state.
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: SessionRegistry,
    game: Game,
    tick_duration: Duration,
    /// Set while a finished match waits out its cooldown.
    restart_at: Option<Instant>,
    ticks: u64,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, board: Board, tick_duration: Duration) -> std::io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: SessionRegistry::new(),
            game: Game::new(board),
            tick_duration,
            restart_at: None,
            ticks: 0,
            server_tx,
            server_rx,
        })
    }

    /// The address the socket actually bound to (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns the task that continuously reads and decodes datagrams.
    fn spawn_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 64];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let message = match ClientPacket::decode(&buffer[..len]) {
                            Ok(packet) => ServerMessage::Packet { packet, addr },
                            Err(err) => ServerMessage::Malformed { err, addr },
                        };
                        if server_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("error receiving datagram: {e}");
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    async fn send(&self, packet: &ServerPacket, addr: SocketAddr) {
        if let Err(e) = self.socket.send_to(&packet.encode(), addr).await {
            warn!("send to {addr} failed: {e}");
        }
    }

    async fn send_error(&self, code: ErrorCode, addr: SocketAddr) {
        self.send(&ServerPacket::Error { code }, addr).await;
    }

    /// Sends every known endpoint its own view of the current state.
    async fn broadcast_snapshots(&self) {
        for addr in self.sessions.addrs() {
            let snapshot = self.snapshot_for(addr);
            self.send(&snapshot, addr).await;
        }
    }

    /// Builds the per-recipient state snapshot. A role nobody holds is
    /// encoded with the (255, 255) sentinel; `freeze` says whether this
    /// recipient's move requests would currently be rejected (observers are
    /// always frozen).
    fn snapshot_for(&self, addr: SocketAddr) -> ServerPacket {
        let coord_of = |who| self.sessions.holder(who).map(|_| self.game.position(who));
        let freeze = match self.sessions.role_of(addr).and_then(Role::contender) {
            Some(who) => !self.game.can_move(who),
            None => true,
        };
        ServerPacket::Snapshot {
            freeze,
            pursuer: coord_of(Contender::Pursuer),
            chaser: coord_of(Contender::Chaser),
            attempts: self.game.attempts_used(),
            collected: pack_collected(self.game.collected()),
        }
    }

    async fn handle_packet(&mut self, packet: ClientPacket, addr: SocketAddr) {
        match packet {
            ClientPacket::Join { role } => self.handle_join(addr, role).await,
            ClientPacket::Move { direction } => self.handle_move(addr, direction).await,
            ClientPacket::Quit => self.handle_quit(addr).await,
        }
    }

    async fn handle_join(&mut self, addr: SocketAddr, role: Role) {
        let vacated = self
            .sessions
            .role_of(addr)
            .and_then(Role::contender)
            .filter(|held| role != held.role());

        match self.sessions.join(addr, role) {
            Ok(()) => {
                // Walking away from a competitive role while a round is
                // underway forfeits, exactly like Quit: the match must not
                // keep running against a stale position.
                if let Some(who) = vacated {
                    if matches!(self.game.phase(), Phase::RoundStart | Phase::Playing) {
                        info!("{addr} abandoned {who:?} mid-match");
                        self.game.declare_winner(who.opponent());
                        self.broadcast_snapshots().await;
                        self.finish_match().await;
                        return;
                    }
                }
                self.maybe_open_round();
                self.broadcast_snapshots().await;
            }
            Err(RoleTaken(Contender::Pursuer)) => {
                self.send_error(ErrorCode::PursuerTaken, addr).await;
            }
            Err(RoleTaken(Contender::Chaser)) => {
                self.send_error(ErrorCode::ChaserTaken, addr).await;
            }
        }
    }

    async fn handle_move(&mut self, addr: SocketAddr, direction: Direction) {
        let Some(role) = self.sessions.role_of(addr) else {
            warn!("move request from unknown endpoint {addr}");
            return;
        };
        let Some(who) = role.contender() else {
            self.send_error(ErrorCode::InvalidMove, addr).await;
            return;
        };

        if self.game.phase() == Phase::Waiting {
            self.send_error(ErrorCode::WaitingForPlayers, addr).await;
            return;
        }
        if self.game.phase() == Phase::RoundStart && who == Contender::Chaser {
            self.send_error(ErrorCode::ChaserFrozen, addr).await;
            return;
        }

        match self.game.apply_move(who, direction) {
            MoveOutcome::Applied => {
                self.broadcast_snapshots().await;
                if self.game.phase() == Phase::Finished {
                    self.finish_match().await;
                }
            }
            // Rejected moves change nothing, so only the mover hears back.
            MoveOutcome::Rejected => self.send_error(ErrorCode::InvalidMove, addr).await,
        }
    }

    async fn handle_quit(&mut self, addr: SocketAddr) {
        let Some(role) = self.sessions.remove(addr) else {
            warn!("quit from unknown endpoint {addr}");
            return;
        };

        match role.contender() {
            // Leaving mid-match forfeits: the remaining competitor wins.
            Some(who)
                if self.game.phase() != Phase::Waiting
                    && self.game.phase() != Phase::Finished =>
            {
                info!("{addr} forfeited the match");
                self.game.declare_winner(who.opponent());
                self.broadcast_snapshots().await;
                self.finish_match().await;
            }
            _ => self.broadcast_snapshots().await,
        }
    }

    /// A join with an out-of-range role byte gets a targeted error reply;
    /// every other malformed datagram is dropped and never affects other
    /// sessions.
    async fn handle_malformed(&self, err: ProtocolError, addr: SocketAddr) {
        match err {
            ProtocolError::InvalidRole(value) => {
                warn!("join with invalid role {value:#04x} from {addr}");
                self.send_error(ErrorCode::InvalidRole, addr).await;
            }
            other => warn!("dropping malformed datagram from {addr}: {other}"),
        }
    }

    /// Opens the first round once both competitive roles are held.
    fn maybe_open_round(&mut self) {
        if self.game.phase() == Phase::Waiting && self.sessions.both_contenders_present() {
            self.game.begin();
        }
    }

    /// Announces the declared winner and arms the restart cooldown.
    async fn finish_match(&mut self) {
        let Some(winner) = self.game.winner() else {
            return;
        };
        let packet = ServerPacket::GameOver {
            winner,
            score: self.game.score(),
            catches: self.game.attempts_used(),
        };
        for addr in self.sessions.addrs() {
            self.send(&packet, addr).await;
        }
        self.restart_at = Some(Instant::now() + RESTART_COOLDOWN);
    }

    /// Periodic housekeeping: cooldown-then-restart after a finished match,
    /// round opening, and the loss-correcting snapshot broadcast.
    async fn tick(&mut self) {
        self.ticks += 1;

        if let Some(at) = self.restart_at {
            if Instant::now() >= at {
                info!("cooldown over, resetting for a new match");
                self.sessions.clear();
                self.game.restart();
                self.restart_at = None;
            }
        }

        self.maybe_open_round();

        if !self.sessions.is_empty() {
            self.broadcast_snapshots().await;
        }

        if self.ticks % 300 == 0 {
            debug!(
                "tick {}: {} sessions, phase {:?}, score {}, attempts {}",
                self.ticks,
                self.sessions.len(),
                self.game.phase(),
                self.game.score(),
                self.game.attempts_used()
            );
        }
    }

    /// Main loop coordinating packet handling and periodic state evaluation.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.spawn_receiver();

        let mut tick_interval = interval(self.tick_duration);
        info!("server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Packet { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        }
                        Some(ServerMessage::Malformed { err, addr }) => {
                            self.handle_malformed(err, addr).await;
                        }
                        None => {
                            info!("receive channel closed, shutting down");
                            break;
                        }
                    }
                },
                _ = tick_interval.tick() => {
                    self.tick().await;
                },
            }
        }

        Ok(())
    }
}
