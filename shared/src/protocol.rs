//! Fixed-layout binary codec for the datagram protocol.
//!
//! One datagram carries exactly one message; the datagram boundary is the
//! message boundary, so there is no length prefix. Every message is a one-byte
//! opcode followed by fixed-width fields. Any length mismatch — truncated or
//! oversized — is a decode failure, as is any out-of-range enum byte.

use crate::{Contender, Coord, Direction, Role, BITMAP_LEN, MAX_POINTS, UNASSIGNED};
use thiserror::Error;

pub const OP_JOIN: u8 = 0x00;
pub const OP_MOVE: u8 = 0x01;
pub const OP_QUIT: u8 = 0x0F;
pub const OP_SNAPSHOT: u8 = 0x80;
pub const OP_GAME_OVER: u8 = 0x8F;
pub const OP_ERROR: u8 = 0xFF;

/// A single malformed or unrecognized datagram. Never fatal: the sender's
/// datagram is dropped (or answered with an error code) and processing for
/// every other session continues untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty datagram")]
    Empty,
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("opcode {opcode:#04x} takes {expected} bytes, got {got}")]
    BadLength {
        opcode: u8,
        expected: usize,
        got: usize,
    },
    #[error("invalid role byte {0:#04x}")]
    InvalidRole(u8),
    #[error("invalid direction byte {0:#04x}")]
    InvalidDirection(u8),
    #[error("invalid freeze byte {0:#04x}")]
    InvalidFreeze(u8),
    #[error("invalid winner byte {0:#04x}")]
    InvalidWinner(u8),
    #[error("invalid error code {0:#04x}")]
    InvalidErrorCode(u8),
}

/// Error codes carried by the 0xFF message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Move received while the match is still waiting for players.
    WaitingForPlayers,
    /// Chaser tried to move during the pursuer's head start.
    ChaserFrozen,
    /// Move into a wall, out of bounds, or from a non-mover.
    InvalidMove,
    /// Pursuer role already held by another endpoint.
    PursuerTaken,
    /// Chaser role already held by another endpoint.
    ChaserTaken,
    /// Join carried a role byte outside the recognized set.
    InvalidRole,
}

impl ErrorCode {
    pub fn from_wire(byte: u8) -> Option<ErrorCode> {
        match byte {
            0x00 => Some(ErrorCode::WaitingForPlayers),
            0x01 => Some(ErrorCode::ChaserFrozen),
            0x02 => Some(ErrorCode::InvalidMove),
            0x03 => Some(ErrorCode::PursuerTaken),
            0x04 => Some(ErrorCode::ChaserTaken),
            0x05 => Some(ErrorCode::InvalidRole),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            ErrorCode::WaitingForPlayers => 0x00,
            ErrorCode::ChaserFrozen => 0x01,
            ErrorCode::InvalidMove => 0x02,
            ErrorCode::PursuerTaken => 0x03,
            ErrorCode::ChaserTaken => 0x04,
            ErrorCode::InvalidRole => 0x05,
        }
    }
}

/// Messages sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Join { role: Role },
    Move { direction: Direction },
    Quit,
}

impl ClientPacket {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ClientPacket::Join { role } => vec![OP_JOIN, role.to_wire()],
            ClientPacket::Move { direction } => vec![OP_MOVE, direction.to_wire()],
            ClientPacket::Quit => vec![OP_QUIT],
        }
    }

    pub fn decode(data: &[u8]) -> Result<ClientPacket, ProtocolError> {
        let (&opcode, rest) = data.split_first().ok_or(ProtocolError::Empty)?;
        match opcode {
            OP_JOIN => {
                expect_len(opcode, rest, 1)?;
                let role =
                    Role::from_wire(rest[0]).ok_or(ProtocolError::InvalidRole(rest[0]))?;
                Ok(ClientPacket::Join { role })
            }
            OP_MOVE => {
                expect_len(opcode, rest, 1)?;
                let direction = Direction::from_wire(rest[0])
                    .ok_or(ProtocolError::InvalidDirection(rest[0]))?;
                Ok(ClientPacket::Move { direction })
            }
            OP_QUIT => {
                expect_len(opcode, rest, 0)?;
                Ok(ClientPacket::Quit)
            }
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// Messages sent from the server to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPacket {
    /// Full state snapshot, sent instead of deltas so a lost datagram is
    /// corrected by the next one. `None` coordinates stand for roles nobody
    /// holds and travel as the (255, 255) sentinel.
    Snapshot {
        /// Whether the recipient's move requests would currently be rejected.
        freeze: bool,
        pursuer: Option<Coord>,
        chaser: Option<Coord>,
        attempts: u8,
        collected: [u8; BITMAP_LEN],
    },
    GameOver {
        winner: Contender,
        score: u8,
        catches: u8,
    },
    Error {
        code: ErrorCode,
    },
}

impl ServerPacket {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ServerPacket::Snapshot {
                freeze,
                pursuer,
                chaser,
                attempts,
                collected,
            } => {
                let mut out = Vec::with_capacity(7 + BITMAP_LEN);
                out.push(OP_SNAPSHOT);
                out.push(*freeze as u8);
                out.extend_from_slice(&coord_bytes(*pursuer));
                out.extend_from_slice(&coord_bytes(*chaser));
                out.push(*attempts);
                out.extend_from_slice(collected);
                out
            }
            ServerPacket::GameOver {
                winner,
                score,
                catches,
            } => vec![OP_GAME_OVER, winner.role().to_wire(), *score, *catches],
            ServerPacket::Error { code } => vec![OP_ERROR, code.to_wire()],
        }
    }

    pub fn decode(data: &[u8]) -> Result<ServerPacket, ProtocolError> {
        let (&opcode, rest) = data.split_first().ok_or(ProtocolError::Empty)?;
        match opcode {
            OP_SNAPSHOT => {
                expect_len(opcode, rest, 6 + BITMAP_LEN)?;
                let freeze = match rest[0] {
                    0 => false,
                    1 => true,
                    other => return Err(ProtocolError::InvalidFreeze(other)),
                };
                let mut collected = [0u8; BITMAP_LEN];
                collected.copy_from_slice(&rest[6..6 + BITMAP_LEN]);
                Ok(ServerPacket::Snapshot {
                    freeze,
                    pursuer: coord_from_bytes(rest[1], rest[2]),
                    chaser: coord_from_bytes(rest[3], rest[4]),
                    attempts: rest[5],
                    collected,
                })
            }
            OP_GAME_OVER => {
                expect_len(opcode, rest, 3)?;
                let winner = match Role::from_wire(rest[0]).and_then(Role::contender) {
                    Some(winner) => winner,
                    None => return Err(ProtocolError::InvalidWinner(rest[0])),
                };
                Ok(ServerPacket::GameOver {
                    winner,
                    score: rest[1],
                    catches: rest[2],
                })
            }
            OP_ERROR => {
                expect_len(opcode, rest, 1)?;
                let code = ErrorCode::from_wire(rest[0])
                    .ok_or(ProtocolError::InvalidErrorCode(rest[0]))?;
                Ok(ServerPacket::Error { code })
            }
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

fn expect_len(opcode: u8, rest: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if rest.len() != expected {
        return Err(ProtocolError::BadLength {
            opcode,
            expected: expected + 1,
            got: rest.len() + 1,
        });
    }
    Ok(())
}

fn coord_bytes(coord: Option<Coord>) -> [u8; 2] {
    match coord {
        Some(at) => [at.row, at.col],
        None => [UNASSIGNED, UNASSIGNED],
    }
}

fn coord_from_bytes(row: u8, col: u8) -> Option<Coord> {
    if row == UNASSIGNED && col == UNASSIGNED {
        None
    } else {
        Some(Coord::new(row, col))
    }
}

/// Packs the per-point collected flags into the snapshot bitmap: bit `i % 8`
/// of byte `i / 8` is set iff point `i` (in canonical order) is collected.
pub fn pack_collected(collected: &[bool; MAX_POINTS]) -> [u8; BITMAP_LEN] {
    let mut out = [0u8; BITMAP_LEN];
    for (i, &taken) in collected.iter().enumerate() {
        if taken {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

pub fn unpack_collected(bitmap: &[u8; BITMAP_LEN]) -> [bool; MAX_POINTS] {
    let mut out = [false; MAX_POINTS];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = bitmap[i / 8] & (1 << (i % 8)) != 0;
    }
    out
}
