//! Shared definitions for the pursuit game: rule constants, the closed wire
//! enums, the coordinate type, board parsing and the datagram codec.
//!
//! Everything in this crate is pure data with no I/O. The server depends on it
//! for the authoritative rules; a client can depend on it for the wire format.

pub mod board;
pub mod protocol;

/// Collectible points on every board, sized to fill the 5-byte snapshot bitmap.
pub const MAX_POINTS: usize = 40;

/// Pursuer score at which the match ends with a pursuer win.
pub const WIN_SCORE: u8 = 32;

/// Number of catches after which the chaser wins the match.
pub const MAX_ATTEMPTS: u8 = 3;

/// Bytes in the collected-points bitmap (8 points per byte).
pub const BITMAP_LEN: usize = 5;

/// Wire value used for both axes of a coordinate when nobody holds the role.
/// Boards are limited to 255 rows/columns, so (255, 255) is never a real cell.
pub const UNASSIGNED: u8 = 0xFF;

/// A board cell address.
///
/// The derived ordering is lexicographic by (row, col), which is exactly the
/// canonical point-index order the snapshot bitmap is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// The neighbouring cell one step in `direction`, or `None` if the step
    /// would leave the u8 coordinate space. Exactly one axis changes.
    pub fn step(self, direction: Direction) -> Option<Coord> {
        let (dr, dc) = direction.offset();
        Some(Coord {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

/// Client roles as carried by the join message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Observer,
    Pursuer,
    Chaser,
}

impl Role {
    pub fn from_wire(byte: u8) -> Option<Role> {
        match byte {
            0 => Some(Role::Observer),
            1 => Some(Role::Pursuer),
            2 => Some(Role::Chaser),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Role::Observer => 0,
            Role::Pursuer => 1,
            Role::Chaser => 2,
        }
    }

    /// The competitive participant this role maps to, if any.
    pub fn contender(self) -> Option<Contender> {
        match self {
            Role::Observer => None,
            Role::Pursuer => Some(Contender::Pursuer),
            Role::Chaser => Some(Contender::Chaser),
        }
    }
}

/// One of the two competitive participants in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contender {
    Pursuer,
    Chaser,
}

impl Contender {
    pub fn opponent(self) -> Contender {
        match self {
            Contender::Pursuer => Contender::Chaser,
            Contender::Chaser => Contender::Pursuer,
        }
    }

    pub fn role(self) -> Role {
        match self {
            Contender::Pursuer => Role::Pursuer,
            Contender::Chaser => Role::Chaser,
        }
    }

    /// Stable index for position arrays: pursuer 0, chaser 1.
    pub const fn index(self) -> usize {
        match self {
            Contender::Pursuer => 0,
            Contender::Chaser => 1,
        }
    }
}

/// Movement directions with their wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub fn from_wire(byte: u8) -> Option<Direction> {
        match byte {
            0 => Some(Direction::Up),
            1 => Some(Direction::Left),
            2 => Some(Direction::Down),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Left => 1,
            Direction::Down => 2,
            Direction::Right => 3,
        }
    }

    /// Unit offset as (row delta, col delta). Rows grow downwards.
    fn offset(self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Left,
    Direction::Down,
    Direction::Right,
];
