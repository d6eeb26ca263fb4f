//! A toy single-player walled-grid puzzle implementing [`PuzzleState`].
//!
//! Not a real Kwirk port — just enough of a deterministic, discrete,
//! frame-costed grid puzzle to drive the engine's tests and benchmarks.
//! The board is baked into every `DemoState` as a constant 36-bit wall
//! mask, so states stay a flat, comparable, hashable value with no
//! external level-table lookup (keeps the demo kernel trivially `Send +
//! Sync` and free of global mutable state).

use super::{LegalMove, LegalMoves, PuzzleState};
use crate::error::SearchError;
use crate::node_index::NodeIndex;
use crate::step::Step;

pub const WIDTH: u8 = 6;
pub const HEIGHT: u8 = 6;

const UP: u8 = 0;
const DOWN: u8 = 1;
const LEFT: u8 = 2;
const RIGHT: u8 = 3;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DemoState {
    /// Bit `y * WIDTH + x` set means that cell is a wall. Only the low 36
    /// bits are meaningful for a 6x6 board. Laid out first (8-byte
    /// aligned) so the trailing `u8` fields need no implicit padding.
    pub walls: u64,
    pub x: u8,
    pub y: u8,
    pub goal_x: u8,
    pub goal_y: u8,
    _pad: [u8; 4],
}

impl DemoState {
    pub fn new(x: u8, y: u8, walls: u64, goal_x: u8, goal_y: u8) -> DemoState {
        DemoState { x, y, walls, goal_x, goal_y, _pad: [0; 4] }
    }

    fn is_wall(&self, x: u8, y: u8) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return true;
        }
        let bit = u64::from(y) * u64::from(WIDTH) + u64::from(x);
        (self.walls >> bit) & 1 == 1
    }

    fn step_target(&self, action: u8) -> Option<(u8, u8)> {
        let (dx, dy): (i8, i8) = match action {
            UP => (0, -1),
            DOWN => (0, 1),
            LEFT => (-1, 0),
            RIGHT => (1, 0),
            _ => return None,
        };
        let nx = i16::from(self.x) + i16::from(dx);
        let ny = i16::from(self.y) + i16::from(dy);
        if nx < 0 || ny < 0 || nx >= i16::from(WIDTH) || ny >= i16::from(HEIGHT) {
            return None;
        }
        let (nx, ny) = (nx as u8, ny as u8);
        if self.is_wall(nx, ny) {
            return None;
        }
        Some((nx, ny))
    }
}

impl PuzzleState for DemoState {
    const DELAY_MOVE: u32 = 1;

    fn canonicalize(&mut self) {
        // Single-player board: the raw representation is already canonical.
    }

    fn hash32(&self) -> u32 {
        fxhash::hash32(bytemuck::bytes_of(self))
    }

    fn is_goal(&self) -> bool {
        self.x == self.goal_x && self.y == self.goal_y
    }

    fn legal_actions(&self) -> LegalMoves<Self> {
        let mut moves = LegalMoves::new();
        for action in [UP, DOWN, LEFT, RIGHT] {
            if let Some((nx, ny)) = self.step_target(action) {
                let mut resulting_state = *self;
                resulting_state.x = nx;
                resulting_state.y = ny;
                moves.push(LegalMove {
                    action,
                    x: nx,
                    y: ny,
                    extra_steps: 0,
                    frame_cost: Self::DELAY_MOVE,
                    resulting_state,
                });
            }
        }
        moves
    }

    fn perform(&mut self, action: u8) -> i32 {
        match self.step_target(action) {
            Some((nx, ny)) => {
                self.x = nx;
                self.y = ny;
                Self::DELAY_MOVE as i32
            }
            None => -1,
        }
    }

    fn replay_step(&mut self, step: Step) -> Result<u32, SearchError> {
        let (target_x, target_y) = (step.x(), step.y());
        if self.is_wall(target_x, target_y) {
            return Err(SearchError::IllegalReplay { node: NodeIndex::NIL, step });
        }
        let manhattan =
            (i32::from(target_x) - i32::from(self.x)).unsigned_abs()
                + (i32::from(target_y) - i32::from(self.y)).unsigned_abs();
        let steps = manhattan + u32::from(step.extra_steps());
        self.x = target_x;
        self.y = target_y;
        Ok(steps * Self::DELAY_MOVE)
    }
}

/// An empty board with the player starting in the top-left corner and the
/// goal in the bottom-right corner.
pub fn open_board() -> DemoState {
    DemoState::new(0, 0, 0, WIDTH - 1, HEIGHT - 1)
}

/// A board where the player already starts on the goal cell.
pub fn solved_board() -> DemoState {
    DemoState::new(2, 2, 0, 2, 2)
}

/// A board where the goal is exactly one step away.
pub fn one_move_board() -> DemoState {
    DemoState::new(0, 0, 0, 1, 0)
}

/// A board where the player is walled in on all four sides, so no move
/// ever escapes it.
pub fn walled_in_board() -> DemoState {
    let player = (2u8, 2u8);
    let mut walls = 0u64;
    for (dx, dy) in [(0i8, -1), (0, 1), (-1, 0), (1, 0)] {
        let x = (i16::from(player.0) + i16::from(dx)) as u8;
        let y = (i16::from(player.1) + i16::from(dy)) as u8;
        walls |= 1u64 << (u64::from(y) * u64::from(WIDTH) + u64::from(x));
    }
    DemoState::new(player.0, player.1, walls, WIDTH - 1, HEIGHT - 1)
}
