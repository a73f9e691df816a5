//! Text summaries of a [`ResultLedger`] for reporting consumers.

use std::fmt::{self, Display};

use crate::{
    agent::AgentId,
    ledger::{HeadToHead, ResultLedger},
};

/// Totals of one agent over all its pairings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub agent: AgentId,
    pub results: HeadToHead,
}

impl Standing {
    /// Two points per win, one per draw.
    pub fn score(&self) -> u32 {
        self.results.wins * 2 + self.results.draws
    }
}

impl Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} games, score {})",
            self.agent,
            self.results,
            self.results.games(),
            self.score()
        )
    }
}

/// Standings of `agents`, best score first. Equal scores keep the order of `agents`.
pub fn standings(ledger: &ResultLedger, agents: &[AgentId]) -> Vec<Standing> {
    let mut table: Vec<Standing> = agents
        .iter()
        .map(|agent| {
            let results = ledger
                .records()
                .filter_map(|record| record.head_to_head(agent))
                .fold(HeadToHead::default(), |acu, h2h| HeadToHead {
                    wins: acu.wins + h2h.wins,
                    draws: acu.draws + h2h.draws,
                    losses: acu.losses + h2h.losses,
                });
            Standing {
                agent: agent.clone(),
                results,
            }
        })
        .collect();
    table.sort_by(|a, b| b.score().cmp(&a.score()));
    table
}

/// Head-to-head grid: the cell at row `A`, column `B` reads `+wins =draws -losses` for `A`
/// against `B`.
pub struct CrossTable<'a> {
    ledger: &'a ResultLedger,
    agents: Vec<AgentId>,
}

impl<'a> CrossTable<'a> {
    pub fn new(ledger: &'a ResultLedger, agents: Vec<AgentId>) -> Self {
        Self { ledger, agents }
    }

    /// Cell text, `None` on the diagonal.
    pub fn cell(&self, row: &AgentId, column: &AgentId) -> Option<String> {
        if row == column {
            return None;
        }
        let h2h = self
            .ledger
            .get(row, column)
            .and_then(|record| record.head_to_head(row))
            .unwrap_or_default();
        Some(h2h.to_string())
    }
}

impl Display for CrossTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = vec![];
        let mut header = vec![String::new()];
        header.extend(self.agents.iter().map(AgentId::to_string));
        rows.push(header);
        for row in &self.agents {
            let mut line = vec![row.to_string()];
            for column in &self.agents {
                line.push(self.cell(row, column).unwrap_or_else(|| "-".to_owned()));
            }
            rows.push(line);
        }

        let columns = self.agents.len() + 1;
        let widths: Vec<usize> = (0..columns)
            .map(|c| rows.iter().map(|r| r[c].len()).max().unwrap_or(0))
            .collect();
        for row in rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
