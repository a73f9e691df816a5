//! Traits the rules engine must implement to be driven by the arena.
//!
//! The arena never inspects positions itself, it asks [`Rules`] about them.

use std::fmt::{self, Debug, Display};

/// Side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Moves first.
    White,
    /// Moves second.
    Black,
}

impl Color {
    /// The other side.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Why a position is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    /// Side to move has no legal move and is not in check.
    Stalemate,
    /// Same position reached too many times.
    Repetition,
    /// Too many moves without capture or pawn move.
    FiftyMoveRule,
    /// Neither side can deliver mate.
    InsufficientMaterial,
    /// Declared by the rules engine for any other reason.
    Arbiter,
}

/// Classification of a position, as seen by the rules engine before a turn is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The side to move must play.
    InProgress,
    /// Black is mated.
    WhiteWins,
    /// White is mated.
    BlackWins,
    /// The game is drawn.
    Draw(DrawReason),
}

/// What the rules engine should implement.
///
/// Implementations must be shareable across game threads; every method takes `&self` and the
/// position is passed explicitly.
pub trait Rules: Send + Sync + 'static {
    /// Board representation, including side to move and any history needed for draw detection.
    type Position: Clone + Send + Sync + 'static;
    /// A move, compared by value against the legal move list.
    type Move: Clone + PartialEq + Debug + Send + 'static;

    /// Every legal move for the side to move.
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    /// Terminal-state detection, called once at the start of every turn.
    fn classify(&self, position: &Self::Position) -> Verdict;

    /// The position after `mv`. Only called with moves returned by [`Rules::legal_moves`].
    fn apply_move(&self, position: &Self::Position, mv: &Self::Move) -> Self::Position;

    /// Whose turn it is.
    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// True if `mv` is in the legal move list of `position`.
    fn is_legal(&self, position: &Self::Position, mv: &Self::Move) -> bool {
        self.legal_moves(position).iter().any(|legal| legal == mv)
    }
}
