//! Head-to-head results between agents.
//!
//! The ledger holds one [`PairingRecord`] per unordered pair of agents. Inside a record the two
//! [`SideTally`]s always belong to the lexicographically first and second identity, whatever
//! colors were played; colors are tracked by the counters themselves.
//!
//! Exactly one counter moves per recorded game: the winner's win counter for the color it played,
//! or, on a draw, the draw counter of the side that had white.

use std::{
    collections::HashMap,
    fmt::{self, Display},
};

use anyhow::bail;
use tracing::trace;

use crate::{agent::AgentId, game_result::GameResult, rules::Color};

/// Unordered pair of agents, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pairing {
    first: AgentId,
    second: AgentId,
}

impl Pairing {
    pub fn new(a: AgentId, b: AgentId) -> Self {
        if a <= b {
            Pairing {
                first: a,
                second: b,
            }
        } else {
            Pairing {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(&self) -> &AgentId {
        &self.first
    }

    pub fn second(&self) -> &AgentId {
        &self.second
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        &self.first == id || &self.second == id
    }
}

impl Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// One agent's counters within a pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideTally {
    pub wins_as_white: u32,
    pub wins_as_black: u32,
    pub draws_as_white: u32,
}

impl SideTally {
    pub fn total_wins(&self) -> u32 {
        self.wins_as_white + self.wins_as_black
    }
}

/// Wins, draws and losses from one agent's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadToHead {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl HeadToHead {
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }
}

impl Display for HeadToHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} ={} -{}", self.wins, self.draws, self.losses)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRecord {
    pairing: Pairing,
    first: SideTally,
    second: SideTally,
}

impl PairingRecord {
    fn new(pairing: Pairing) -> Self {
        Self {
            pairing,
            first: SideTally::default(),
            second: SideTally::default(),
        }
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    /// Tally of [`Pairing::first`].
    pub fn first(&self) -> &SideTally {
        &self.first
    }

    /// Tally of [`Pairing::second`].
    pub fn second(&self) -> &SideTally {
        &self.second
    }

    /// `(own, opponent)` tallies as seen by `id`.
    fn sides(&self, id: &AgentId) -> Option<(&SideTally, &SideTally)> {
        if id == &self.pairing.first {
            Some((&self.first, &self.second))
        } else if id == &self.pairing.second {
            Some((&self.second, &self.first))
        } else {
            None
        }
    }

    pub fn tally(&self, id: &AgentId) -> Option<&SideTally> {
        self.sides(id).map(|(own, _)| own)
    }

    pub fn games_with_white_first(&self) -> u32 {
        self.first.wins_as_white + self.first.draws_as_white + self.second.wins_as_black
    }

    pub fn games_with_white_second(&self) -> u32 {
        self.second.wins_as_white + self.second.draws_as_white + self.first.wins_as_black
    }

    /// Games of this pairing in which `id` had white.
    pub fn games_with_white(&self, id: &AgentId) -> Option<u32> {
        self.sides(id)
            .map(|(own, other)| own.wins_as_white + own.draws_as_white + other.wins_as_black)
    }

    pub fn total_draws(&self) -> u32 {
        self.first.draws_as_white + self.second.draws_as_white
    }

    pub fn total_wins_with_white(&self) -> u32 {
        self.first.wins_as_white + self.second.wins_as_white
    }

    pub fn total_wins_with_black(&self) -> u32 {
        self.first.wins_as_black + self.second.wins_as_black
    }

    pub fn total_games(&self) -> u32 {
        self.total_draws() + self.total_wins_with_white() + self.total_wins_with_black()
    }

    /// Score of `id` against the other agent of the pairing.
    pub fn head_to_head(&self, id: &AgentId) -> Option<HeadToHead> {
        self.sides(id).map(|(own, other)| HeadToHead {
            wins: own.total_wins(),
            draws: self.total_draws(),
            losses: other.total_wins(),
        })
    }

    fn tally_mut(&mut self, id: &AgentId) -> &mut SideTally {
        if id == &self.pairing.first {
            &mut self.first
        } else {
            &mut self.second
        }
    }
}

/// All pairing records, created on first result and never removed.
#[derive(Debug, Clone, Default)]
pub struct ResultLedger {
    records: HashMap<Pairing, PairingRecord>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the outcome of one finished game.
    ///
    /// # Errors
    /// If both sides are the same agent or the game is not finished. The ledger is unchanged.
    pub fn record_outcome(
        &mut self,
        white: &AgentId,
        black: &AgentId,
        result: GameResult,
    ) -> anyhow::Result<()> {
        if white == black {
            bail!("{white} cannot play against itself");
        }
        if !result.is_terminal() {
            bail!("cannot record unfinished game {white} VS {black}");
        }

        let pairing = Pairing::new(white.clone(), black.clone());
        let record = self
            .records
            .entry(pairing.clone())
            .or_insert_with(|| PairingRecord::new(pairing));

        match result.winner() {
            None => record.tally_mut(white).draws_as_white += 1,
            Some(Color::White) => record.tally_mut(white).wins_as_white += 1,
            Some(Color::Black) => record.tally_mut(black).wins_as_black += 1,
        }
        trace!(%white, %black, %result, "result recorded");
        Ok(())
    }

    pub fn get(&self, a: &AgentId, b: &AgentId) -> Option<&PairingRecord> {
        self.records.get(&Pairing::new(a.clone(), b.clone()))
    }

    /// Games played with this exact color assignment, 0 if the pair never met.
    pub fn games_as_white(&self, white: &AgentId, black: &AgentId) -> u32 {
        self.get(white, black)
            .and_then(|record| record.games_with_white(white))
            .unwrap_or(0)
    }

    pub fn records(&self) -> impl Iterator<Item = &PairingRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_games(&self) -> u32 {
        self.records.values().map(PairingRecord::total_games).sum()
    }
}
