use std::sync::Arc;

use tracing::{debug, error, instrument, trace};

use crate::{
    agent::{share, Agent, SharedAgent},
    cancel::CancellationToken,
    clock::{ChessClock, TimeControl},
    game_result::GameResult,
    move_invoker::{InvokeError, MoveInvoker},
    rules::{Color, Rules, Verdict},
};

/// Drives one game between two agents, from the starting position to a terminal classification.
///
/// Each side has its own clock. A side that runs out of time, plays a move outside the legal
/// move list, or returns no move at all forfeits the game.
pub struct GameSession<R: Rules> {
    rules: Arc<R>,
    white: SharedAgent<R>,
    black: SharedAgent<R>,
    position: R::Position,
    white_clock: ChessClock,
    black_clock: ChessClock,
    invoker: MoveInvoker,
    cancel: CancellationToken,
    moves: Vec<R::Move>,
}

impl<R: Rules> GameSession<R> {
    /// Creates a session with real-time clocks built from the two time controls.
    pub fn new(
        rules: Arc<R>,
        white: Box<dyn Agent<R>>,
        black: Box<dyn Agent<R>>,
        start: R::Position,
        white_control: TimeControl,
        black_control: TimeControl,
    ) -> Self {
        Self::with_clocks(
            rules,
            white,
            black,
            start,
            ChessClock::new(white_control),
            ChessClock::new(black_control),
        )
    }

    pub fn with_clocks(
        rules: Arc<R>,
        white: Box<dyn Agent<R>>,
        black: Box<dyn Agent<R>>,
        start: R::Position,
        white_clock: ChessClock,
        black_clock: ChessClock,
    ) -> Self {
        Self {
            rules,
            white: share(white),
            black: share(black),
            position: start,
            white_clock,
            black_clock,
            invoker: MoveInvoker::default(),
            cancel: CancellationToken::new(),
            moves: vec![],
        }
    }

    pub fn with_invoker(mut self, invoker: MoveInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the game at the start of the next turn. A move being computed is not interrupted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn position(&self) -> &R::Position {
        &self.position
    }

    /// Moves played so far, in order.
    pub fn moves(&self) -> &[R::Move] {
        &self.moves
    }

    pub fn clock(&self, color: Color) -> &ChessClock {
        match color {
            Color::White => &self.white_clock,
            Color::Black => &self.black_clock,
        }
    }

    /// Plays the game to the end.
    ///
    /// # Errors
    /// [`Cancelled`](crate::cancel::Cancelled) if cancellation was requested, or the underlying
    /// error if a move worker failed in a way that is not a forfeit.
    #[instrument(skip_all, name = "game")]
    pub fn run(&mut self) -> anyhow::Result<GameResult> {
        loop {
            self.cancel.check()?;

            let verdict = self.rules.classify(&self.position);
            if verdict != Verdict::InProgress {
                let result = GameResult::from(verdict);
                debug!(%result, plies = self.moves.len(), "game over");
                return Ok(result);
            }

            let side = self.rules.side_to_move(&self.position);
            let Self {
                white,
                black,
                white_clock,
                black_clock,
                invoker,
                position,
                ..
            } = self;
            let (agent, clock, opponent_clock) = match side {
                Color::White => (&*white, white_clock, &*black_clock),
                Color::Black => (&*black, black_clock, &*white_clock),
            };
            trace!(%side, time_left = %clock.time_left(), "requesting move");

            let mv = match invoker.invoke(agent, position, clock, opponent_clock) {
                Ok(mv) => mv,
                Err(InvokeError::Timeout) => {
                    debug!(%side, "timeout");
                    return Ok(GameResult::timeout(side));
                }
                Err(InvokeError::NoMove) => {
                    debug!(%side, "no move produced");
                    return Ok(GameResult::illegal_move(side));
                }
                Err(InvokeError::Failed(e)) => {
                    error!(%side, "move invocation failed: {e:#}");
                    return Err(e.context(format!("{side} agent failed")));
                }
            };

            if !self.rules.is_legal(&self.position, &mv) {
                debug!(%side, ?mv, "illegal move");
                return Ok(GameResult::illegal_move(side));
            }
            self.position = self.rules.apply_move(&self.position, &mv);
            self.moves.push(mv);
        }
    }
}

impl<R: Rules> std::fmt::Debug for GameSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("plies", &self.moves.len())
            .field("white_clock", &self.white_clock)
            .field("black_clock", &self.black_clock)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
