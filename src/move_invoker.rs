//! Runs one "produce a move" call under a hard wall-clock deadline.
//!
//! Agent code cannot be interrupted, so each call runs on its own worker thread while the caller
//! waits on a channel for at most the mover's move budget. A worker that overstays is abandoned:
//! it keeps running until the agent returns, and its answer is dropped.

use std::{
    fmt::{self, Display},
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc, PoisonError,
    },
    thread,
    time::Duration,
};

use anyhow::anyhow;
use tracing::{debug, instrument, warn};

use crate::{
    agent::SharedAgent,
    clock::{ChessClock, Timer},
    rules::Rules,
};

/// Why no usable move came back.
#[derive(Debug)]
pub enum InvokeError {
    /// The move budget elapsed, or the move arrived after the clock flagged.
    Timeout,
    /// The agent returned without a move.
    NoMove,
    /// The worker could not be started or died without answering.
    Failed(anyhow::Error),
}

impl Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::Timeout => write!(f, "agent ran out of time"),
            InvokeError::NoMove => write!(f, "agent produced no move"),
            InvokeError::Failed(e) => write!(f, "move invocation failed: {e:#}"),
        }
    }
}

impl std::error::Error for InvokeError {}

#[derive(Debug, Clone)]
pub struct MoveInvoker {
    margin: Duration,
    label: String,
}

impl MoveInvoker {
    /// Jitter allowance added on top of the clock's own time to timeout.
    pub const DEFAULT_MARGIN: Duration = Duration::from_secs(1);

    /// `label` names the worker threads (usually the game id).
    pub fn new(margin: Duration, label: impl Into<String>) -> Self {
        Self {
            margin,
            label: label.into(),
        }
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Asks `agent` for a move in `position`, charging the time to `clock`.
    ///
    /// The clock is started right before the worker is spawned and stopped as soon as a reply
    /// arrives. On a wall-clock timeout the clock is left running, the game is over anyway.
    #[instrument(skip_all, fields(worker = %self.label))]
    pub fn invoke<R: Rules>(
        &self,
        agent: &SharedAgent<R>,
        position: &R::Position,
        clock: &mut ChessClock,
        opponent: &ChessClock,
    ) -> Result<R::Move, InvokeError> {
        let timer = Timer::new(clock, opponent);
        let budget = clock.move_budget(self.margin);
        let (tx, rx) = mpsc::channel();
        let agent = Arc::clone(agent);
        let position = position.clone();

        clock.start_turn();
        thread::Builder::new()
            .name(format!("{}-move", self.label))
            .spawn(move || {
                let mut agent = agent.lock().unwrap_or_else(PoisonError::into_inner);
                let mv = agent.produce_move(&position, &timer);
                // receiver is gone if the caller already gave up
                let _ = tx.send(mv);
            })
            .map_err(|e| InvokeError::Failed(anyhow!(e).context("could not spawn move worker")))?;

        match rx.recv_timeout(budget) {
            Ok(mv) => {
                clock.end_turn();
                if clock.is_timed_out() {
                    debug!(time_left = %clock.time_left(), "move arrived after flag fall");
                    return Err(InvokeError::Timeout);
                }
                mv.ok_or(InvokeError::NoMove)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?budget, "agent exceeded its move budget, abandoning worker");
                Err(InvokeError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(InvokeError::Failed(anyhow!(
                "move worker exited without replying (agent panicked?)"
            ))),
        }
    }
}

impl Default for MoveInvoker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARGIN, "game")
    }
}
