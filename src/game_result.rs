use std::fmt::{self, Display};

use crate::rules::{Color, DrawReason, Verdict};

/// Classification of a game.
///
/// Every variant but [`GameResult::InProgress`] is terminal. Timeouts and illegal moves are
/// forfeits: the offending side loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    InProgress,
    WhiteWins,
    BlackWins,
    Draw(DrawReason),
    WhiteTimeout,
    BlackTimeout,
    WhiteIllegalMove,
    BlackIllegalMove,
}

impl GameResult {
    pub fn timeout(side: Color) -> GameResult {
        match side {
            Color::White => GameResult::WhiteTimeout,
            Color::Black => GameResult::BlackTimeout,
        }
    }

    pub fn illegal_move(side: Color) -> GameResult {
        match side {
            Color::White => GameResult::WhiteIllegalMove,
            Color::Black => GameResult::BlackIllegalMove,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameResult::InProgress)
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, GameResult::Draw(_))
    }

    /// The color credited with the win, `None` for draws and unfinished games.
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::WhiteWins | GameResult::BlackTimeout | GameResult::BlackIllegalMove => {
                Some(Color::White)
            }
            GameResult::BlackWins | GameResult::WhiteTimeout | GameResult::WhiteIllegalMove => {
                Some(Color::Black)
            }
            GameResult::InProgress | GameResult::Draw(_) => None,
        }
    }
}

impl From<Verdict> for GameResult {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::InProgress => GameResult::InProgress,
            Verdict::WhiteWins => GameResult::WhiteWins,
            Verdict::BlackWins => GameResult::BlackWins,
            Verdict::Draw(reason) => GameResult::Draw(reason),
        }
    }
}

impl Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::InProgress => write!(f, "in progress"),
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw(reason) => write!(f, "1/2-1/2 ({reason:?})"),
            GameResult::WhiteTimeout => write!(f, "0-1 (white timeout)"),
            GameResult::BlackTimeout => write!(f, "1-0 (black timeout)"),
            GameResult::WhiteIllegalMove => write!(f, "0-1 (white illegal move)"),
            GameResult::BlackIllegalMove => write!(f, "1-0 (black illegal move)"),
        }
    }
}
