//! Authoritative game engine: the round/match state machine, movement and
//! collision resolution, scoring and win conditions.
//!
//! A single `Game` instance is the only source of truth for a match. It is
//! mutated exclusively by the server's driving loop, never by network code
//! directly, so concurrently-arriving inputs always resolve to one consistent
//! outcome: every `apply_move` re-validates against the state as it is when
//! the move is applied.

use log::info;
use shared::board::Board;
use shared::{Contender, Coord, Direction, MAX_ATTEMPTS, MAX_POINTS, WIN_SCORE};

/// Match lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than two competitive roles are assigned.
    Waiting,
    /// Both roles assigned; only the pursuer may move (per-round head start).
    RoundStart,
    /// Either party may move.
    Playing,
    /// Winner declared. Terminal until `restart`.
    Finished,
}

/// Whether an `apply_move` call changed any state. The caller must not
/// broadcast on `Rejected` — only send a targeted error to the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    Rejected,
}

pub struct Game {
    board: Board,
    phase: Phase,
    /// Indexed by `Contender::index`: pursuer 0, chaser 1.
    positions: [Coord; 2],
    /// Index per the board's canonical point order.
    collected: [bool; MAX_POINTS],
    score: u8,
    attempts_used: u8,
    winner: Option<Contender>,
}

impl Game {
    pub fn new(board: Board) -> Self {
        let positions = [board.pursuer_start(), board.chaser_start()];
        Self {
            board,
            phase: Phase::Waiting,
            positions,
            collected: [false; MAX_POINTS],
            score: 0,
            attempts_used: 0,
            winner: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn attempts_used(&self) -> u8 {
        self.attempts_used
    }

    /// The winner, set exactly when `phase` is `Finished`.
    pub fn winner(&self) -> Option<Contender> {
        self.winner
    }

    pub fn position(&self, who: Contender) -> Coord {
        self.positions[who.index()]
    }

    pub fn collected(&self) -> &[bool; MAX_POINTS] {
        &self.collected
    }

    /// Opens the first round. Called by the driving loop once both
    /// competitive roles are held; a no-op in any other phase.
    pub fn begin(&mut self) {
        if self.phase == Phase::Waiting {
            self.phase = Phase::RoundStart;
            info!("both roles filled, round may start");
        }
    }

    /// True iff `who` may currently move. The chaser is frozen during
    /// `RoundStart`, giving the pursuer a head start each round.
    pub fn can_move(&self, who: Contender) -> bool {
        self.phase == Phase::Playing
            || (self.phase == Phase::RoundStart && who == Contender::Pursuer)
    }

    /// Tries to apply a single move and updates the match state accordingly.
    pub fn apply_move(&mut self, who: Contender, direction: Direction) -> MoveOutcome {
        if !self.can_move(who) {
            return MoveOutcome::Rejected;
        }
        let Some(next) = self.position(who).step(direction) else {
            return MoveOutcome::Rejected;
        };
        if !self.board.passable(next) {
            return MoveOutcome::Rejected;
        }

        self.positions[who.index()] = next;
        if self.phase == Phase::RoundStart {
            self.phase = Phase::Playing;
        }

        if who == Contender::Pursuer {
            if let Some(i) = self.board.point_index(next) {
                if !self.collected[i] {
                    self.collected[i] = true;
                    self.score += 1;
                    if self.score >= WIN_SCORE {
                        // A move that completes the score threshold while
                        // landing on the chaser is a pursuer win, not a catch.
                        self.declare_winner(Contender::Pursuer);
                        return MoveOutcome::Applied;
                    }
                }
            }
        }

        // Catch check, symmetric regardless of who moved.
        if self.positions[Contender::Pursuer.index()] == self.positions[Contender::Chaser.index()]
        {
            self.attempts_used += 1;
            info!("pursuer caught ({}/{})", self.attempts_used, MAX_ATTEMPTS);
            if self.attempts_used >= MAX_ATTEMPTS {
                self.declare_winner(Contender::Chaser);
            } else {
                self.next_round();
            }
        }

        MoveOutcome::Applied
    }

    /// Ends the match with `who` as winner, unless one was already declared.
    /// Also the forfeiting path: a competitor quitting mid-match hands the
    /// win to the opponent.
    pub fn declare_winner(&mut self, who: Contender) {
        if self.phase != Phase::Finished {
            self.phase = Phase::Finished;
            self.winner = Some(who);
            info!("match over, winner: {who:?}");
        }
    }

    /// Resets positions to the start cells and re-arms the head start.
    /// Collected points and score carry over between rounds.
    fn next_round(&mut self) {
        self.positions = [self.board.pursuer_start(), self.board.chaser_start()];
        self.phase = Phase::RoundStart;
    }

    /// Reinitializes everything to construction-time values. The board and
    /// its point order are untouched.
    pub fn restart(&mut self) {
        self.positions = [self.board.pursuer_start(), self.board.chaser_start()];
        self.collected = [false; MAX_POINTS];
        self.score = 0;
        self.attempts_used = 0;
        self.phase = Phase::Waiting;
        self.winner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ALL_DIRECTIONS;

    /// 8x12 test map. Pursuer start (1,1), chaser start (6,10); the first
    /// point in canonical order is (1,3) and (1,2) is free.
    fn test_map() -> &'static str {
        "WWWWWWWWWWWW\n\
         WCFPPPPPPPPW\n\
         WPPPPPPPPPPW\n\
         WPPPPPPPPPPW\n\
         WPPPPPPPPPPW\n\
         WPPFFFFFFFFW\n\
         WFFFFFFFFFSW\n\
         WWWWWWWWWWWW"
    }

    fn game() -> Game {
        Game::new(Board::parse(test_map()).unwrap())
    }

    fn running_game() -> Game {
        let mut game = game();
        game.begin();
        game
    }

    #[test]
    fn starts_waiting_with_fresh_state() {
        let game = game();
        assert_eq!(game.phase(), Phase::Waiting);
        assert_eq!(game.score(), 0);
        assert_eq!(game.attempts_used(), 0);
        assert_eq!(game.winner(), None);
        assert_eq!(game.position(Contender::Pursuer), Coord::new(1, 1));
        assert_eq!(game.position(Contender::Chaser), Coord::new(6, 10));
        assert!(game.collected().iter().all(|taken| !taken));
    }

    #[test]
    fn nobody_moves_while_waiting() {
        let mut game = game();
        assert!(!game.can_move(Contender::Pursuer));
        assert!(!game.can_move(Contender::Chaser));
        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Right),
            MoveOutcome::Rejected
        );
        assert_eq!(game.phase(), Phase::Waiting);
    }

    #[test]
    fn head_start_freezes_the_chaser() {
        let mut game = running_game();
        assert_eq!(game.phase(), Phase::RoundStart);
        assert!(game.can_move(Contender::Pursuer));
        assert!(!game.can_move(Contender::Chaser));
        assert_eq!(
            game.apply_move(Contender::Chaser, Direction::Up),
            MoveOutcome::Rejected
        );

        // The first accepted pursuer move opens the round for both.
        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Right),
            MoveOutcome::Applied
        );
        assert_eq!(game.phase(), Phase::Playing);
        assert!(game.can_move(Contender::Chaser));
    }

    #[test]
    fn rejected_pursuer_move_does_not_open_the_round() {
        let mut game = running_game();
        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Up),
            MoveOutcome::Rejected
        );
        assert_eq!(game.phase(), Phase::RoundStart);
    }

    #[test]
    fn wall_moves_change_nothing() {
        let mut game = running_game();
        game.apply_move(Contender::Pursuer, Direction::Right);
        let position = game.position(Contender::Pursuer);
        let score = game.score();
        let collected = *game.collected();
        let phase = game.phase();

        // Up from (1,2) is the border wall.
        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Up),
            MoveOutcome::Rejected
        );
        assert_eq!(game.position(Contender::Pursuer), position);
        assert_eq!(game.score(), score);
        assert_eq!(*game.collected(), collected);
        assert_eq!(game.phase(), phase);
    }

    #[test]
    fn pursuer_collects_points_once() {
        let mut game = running_game();
        game.apply_move(Contender::Pursuer, Direction::Right); // (1,2) free
        game.apply_move(Contender::Pursuer, Direction::Right); // (1,3) point 0
        assert_eq!(game.score(), 1);
        let index = game.board().point_index(Coord::new(1, 3)).unwrap();
        assert!(game.collected()[index]);

        // Stepping off and back on does not score again.
        game.apply_move(Contender::Pursuer, Direction::Left);
        game.apply_move(Contender::Pursuer, Direction::Right);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn chaser_does_not_collect_points() {
        let mut game = running_game();
        game.apply_move(Contender::Pursuer, Direction::Right);
        // Chaser walks up onto point cells.
        game.apply_move(Contender::Chaser, Direction::Up); // (5,10) free
        game.apply_move(Contender::Chaser, Direction::Up); // (4,10) point
        assert_eq!(game.score(), 0);
        assert!(game.collected().iter().all(|taken| !taken));
    }

    #[test]
    fn catch_resets_round_and_keeps_progress() {
        let mut game = running_game();
        // Walk the pursuer onto the chaser's cell: down the left edge, then
        // along the bottom row.
        for _ in 0..5 {
            assert_eq!(
                game.apply_move(Contender::Pursuer, Direction::Down),
                MoveOutcome::Applied
            );
        }
        for _ in 0..9 {
            assert_eq!(
                game.apply_move(Contender::Pursuer, Direction::Right),
                MoveOutcome::Applied
            );
        }

        // Landing on the chaser is a catch even though the pursuer moved.
        assert_eq!(game.attempts_used(), 1);
        assert_eq!(game.phase(), Phase::RoundStart);
        assert_eq!(game.position(Contender::Pursuer), Coord::new(1, 1));
        assert_eq!(game.position(Contender::Chaser), Coord::new(6, 10));
        // Points collected on the way down survive the reset.
        assert_eq!(game.score(), 4);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn chaser_move_onto_pursuer_is_a_catch_too() {
        let mut game = running_game();
        game.positions = [Coord::new(5, 10), Coord::new(6, 10)];
        game.phase = Phase::Playing;
        assert_eq!(
            game.apply_move(Contender::Chaser, Direction::Up),
            MoveOutcome::Applied
        );
        assert_eq!(game.attempts_used(), 1);
        assert_eq!(game.phase(), Phase::RoundStart);
    }

    #[test]
    fn third_catch_finishes_with_chaser_win() {
        let mut game = running_game();
        game.attempts_used = 2;
        game.positions = [Coord::new(6, 9), Coord::new(6, 10)];
        game.phase = Phase::Playing;

        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Right),
            MoveOutcome::Applied
        );
        assert_eq!(game.attempts_used(), 3);
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(Contender::Chaser));
        // Positions are not reset on the final catch.
        assert_eq!(game.position(Contender::Pursuer), Coord::new(6, 10));

        // Terminal until restart: every further move is rejected.
        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Left),
            MoveOutcome::Rejected
        );
        assert_eq!(
            game.apply_move(Contender::Chaser, Direction::Up),
            MoveOutcome::Rejected
        );
    }

    #[test]
    fn score_win_outranks_simultaneous_catch() {
        let mut game = running_game();
        game.phase = Phase::Playing;
        game.score = WIN_SCORE - 1;
        // Chaser parked on the uncollected point at (1,3), pursuer adjacent.
        game.positions = [Coord::new(1, 2), Coord::new(1, 3)];

        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Right),
            MoveOutcome::Applied
        );
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(Contender::Pursuer));
        assert_eq!(game.score(), WIN_SCORE);
        // Not a catch: the attempt counter did not move.
        assert_eq!(game.attempts_used(), 0);
    }

    #[test]
    fn same_move_below_threshold_is_a_catch() {
        let mut game = running_game();
        game.phase = Phase::Playing;
        game.score = 5;
        game.positions = [Coord::new(1, 2), Coord::new(1, 3)];

        assert_eq!(
            game.apply_move(Contender::Pursuer, Direction::Right),
            MoveOutcome::Applied
        );
        assert_eq!(game.phase(), Phase::RoundStart);
        assert_eq!(game.attempts_used(), 1);
        assert_eq!(game.score(), 6);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn score_and_attempts_are_monotonic_and_bounded() {
        let mut game = running_game();
        game.phase = Phase::Playing;
        let mut last_score = 0;
        let mut last_attempts = 0;
        for i in 0..200 {
            game.apply_move(Contender::Pursuer, ALL_DIRECTIONS[i % 4]);
            game.apply_move(Contender::Chaser, ALL_DIRECTIONS[(i + 2) % 4]);
            assert!(game.score() >= last_score);
            assert!(game.score() <= WIN_SCORE);
            assert!(game.attempts_used() >= last_attempts);
            assert!(game.attempts_used() <= MAX_ATTEMPTS);
            last_score = game.score();
            last_attempts = game.attempts_used();
        }
    }

    #[test]
    fn forfeit_declares_the_opponent() {
        let mut game = running_game();
        game.apply_move(Contender::Pursuer, Direction::Right);
        game.declare_winner(Contender::Chaser);
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(Contender::Chaser));

        // A second declaration does not overwrite the first.
        game.declare_winner(Contender::Pursuer);
        assert_eq!(game.winner(), Some(Contender::Chaser));
    }

    #[test]
    fn restart_reinitializes_everything_but_the_board() {
        let mut game = running_game();
        game.apply_move(Contender::Pursuer, Direction::Right);
        game.apply_move(Contender::Pursuer, Direction::Right);
        game.declare_winner(Contender::Pursuer);

        let order_before = game.board().point_order().to_vec();
        game.restart();

        assert_eq!(game.phase(), Phase::Waiting);
        assert_eq!(game.score(), 0);
        assert_eq!(game.attempts_used(), 0);
        assert_eq!(game.winner(), None);
        assert_eq!(game.position(Contender::Pursuer), Coord::new(1, 1));
        assert_eq!(game.position(Contender::Chaser), Coord::new(6, 10));
        assert!(game.collected().iter().all(|taken| !taken));
        assert_eq!(game.board().point_order(), order_before.as_slice());
    }
}
