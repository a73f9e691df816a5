//! Least-played matchup selection.
//!
//! Every ordered `(white, black)` pair of distinct agents is a candidate, weighted by the number
//! of games already played with exactly that color assignment. Selection keeps a bounded list of
//! the `count` lightest candidates in a single pass over the pool: the list is filled first, then
//! its heaviest entry is replaced whenever a strictly lighter pair shows up. Ties keep the pair
//! seen first, so pool order decides between equally played matchups.

use crate::{agent::AgentId, ledger::ResultLedger};

/// A matchup proposed for the next game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub white: AgentId,
    pub black: AgentId,
    /// Games already played with this color assignment.
    pub played: u32,
}

/// Returns up to `count` least-played ordered pairs drawn from `pool`.
pub fn least_played(pool: &[AgentId], ledger: &ResultLedger, count: usize) -> Vec<Candidate> {
    let mut selected: Vec<Candidate> = Vec::with_capacity(count);
    if count == 0 {
        return selected;
    }

    for white in pool {
        for black in pool {
            if white == black {
                continue;
            }
            let played = ledger.games_as_white(white, black);

            if selected.len() == count {
                // heaviest entry strictly above `played`, first one on ties
                let mut heaviest: Option<usize> = None;
                for (i, candidate) in selected.iter().enumerate() {
                    let heavier = match heaviest {
                        Some(h) => candidate.played > selected[h].played,
                        None => candidate.played > played,
                    };
                    if heavier {
                        heaviest = Some(i);
                    }
                }
                match heaviest {
                    Some(i) => {
                        selected.remove(i);
                    }
                    None => continue,
                }
            }

            selected.push(Candidate {
                white: white.clone(),
                black: black.clone(),
                played,
            });
        }
    }
    selected
}
