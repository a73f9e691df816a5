//! Per-side chess clocks.
//!
//! A [`ChessClock`] is either paused (the opponent is thinking) or running (its owner is
//! thinking). Every [`TimeControl`] variant shares the same state machine; only the way elapsed
//! time is folded into the remaining budget differs:
//!
//! - [`TimeControl::Infinite`]: never runs out.
//! - [`TimeControl::Fixed`]: plain countdown.
//! - [`TimeControl::Incremental`]: `increment` is added at the end of every turn that did not
//!   time out.
//! - [`TimeControl::Delay`]: the clock does not start counting down until `delay` has passed in
//!   the current turn.
//!
//! Remaining time is a signed [`time::Duration`] since it goes negative once a side overstays.

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use time::Duration as SignedDuration;

use crate::time_source::{MonotonicTime, TimeSource};

/// How much thinking time a side gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeControl {
    Infinite,
    Fixed(Duration),
    Incremental { time: Duration, increment: Duration },
    Delay { time: Duration, delay: Duration },
}

impl TimeControl {
    /// Initial budget, `None` for [`TimeControl::Infinite`].
    pub fn starting_time(&self) -> Option<Duration> {
        match *self {
            TimeControl::Infinite => None,
            TimeControl::Fixed(time)
            | TimeControl::Incremental { time, .. }
            | TimeControl::Delay { time, .. } => Some(time),
        }
    }

    pub fn increment(&self) -> Duration {
        match *self {
            TimeControl::Incremental { increment, .. } => increment,
            _ => Duration::ZERO,
        }
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        TimeControl::Fixed(Duration::from_secs(60))
    }
}

/// Parses `inf`, `fixed:<ms>`, `inc:<ms>:<ms>` and `delay:<ms>:<ms>`.
impl FromStr for TimeControl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn millis(part: Option<&str>, what: &str) -> anyhow::Result<Duration> {
            let part = part.with_context(|| format!("missing {what}"))?;
            let ms = part
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid {what} '{part}'"))?;
            Ok(Duration::from_millis(ms))
        }

        let mut parts = s.trim().split(':');
        let kind = parts.next().unwrap_or_default().to_ascii_lowercase();
        let control = match kind.as_str() {
            "inf" | "infinite" => TimeControl::Infinite,
            "fixed" => TimeControl::Fixed(millis(parts.next(), "time")?),
            "inc" | "incremental" => TimeControl::Incremental {
                time: millis(parts.next(), "time")?,
                increment: millis(parts.next(), "increment")?,
            },
            "delay" => TimeControl::Delay {
                time: millis(parts.next(), "time")?,
                delay: millis(parts.next(), "delay")?,
            },
            _ => bail!("unknown time control '{s}'"),
        };
        if parts.next().is_some() {
            bail!("trailing fields in time control '{s}'");
        }
        Ok(control)
    }
}

impl Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeControl::Infinite => write!(f, "inf"),
            TimeControl::Fixed(time) => write!(f, "fixed:{}", time.as_millis()),
            TimeControl::Incremental { time, increment } => {
                write!(f, "inc:{}:{}", time.as_millis(), increment.as_millis())
            }
            TimeControl::Delay { time, delay } => {
                write!(f, "delay:{}:{}", time.as_millis(), delay.as_millis())
            }
        }
    }
}

fn signed(duration: Duration) -> SignedDuration {
    SignedDuration::try_from(duration).unwrap_or(SignedDuration::MAX)
}

/// Negative durations are clamped to zero, an infinite budget stays infinite.
fn unsigned(duration: SignedDuration) -> Duration {
    if duration == SignedDuration::MAX {
        return Duration::MAX;
    }
    Duration::try_from(duration).unwrap_or(Duration::ZERO)
}

/// One side's clock.
#[derive(Debug)]
pub struct ChessClock {
    control: TimeControl,
    time_left_before_turn: SignedDuration,
    /// `Some` while running.
    turn_start: Option<Instant>,
    time_source: Arc<dyn TimeSource>,
}

impl ChessClock {
    pub fn new(control: TimeControl) -> Self {
        Self::with_time_source(control, Arc::new(MonotonicTime))
    }

    pub fn with_time_source(control: TimeControl, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            control,
            time_left_before_turn: Self::initial_time_left(control),
            turn_start: None,
            time_source,
        }
    }

    fn initial_time_left(control: TimeControl) -> SignedDuration {
        control
            .starting_time()
            .map(signed)
            .unwrap_or(SignedDuration::MAX)
    }

    pub fn control(&self) -> TimeControl {
        self.control
    }

    pub fn is_paused(&self) -> bool {
        self.turn_start.is_none()
    }

    /// Restores the initial budget and pauses the clock.
    pub fn reset(&mut self) {
        self.time_left_before_turn = Self::initial_time_left(self.control);
        self.turn_start = None;
    }

    /// Starts the clock. Does nothing if it is already running.
    pub fn start_turn(&mut self) {
        if self.turn_start.is_none() {
            self.turn_start = Some(self.time_source.now());
        }
    }

    /// Stops the clock and charges the elapsed time. Does nothing if it is already paused.
    pub fn end_turn(&mut self) {
        if self.is_paused() {
            return;
        }
        self.time_left_before_turn = self.time_left();
        self.turn_start = None;

        if let TimeControl::Incremental { increment, .. } = self.control {
            if !self.is_timed_out() {
                self.time_left_before_turn = self
                    .time_left_before_turn
                    .saturating_add(signed(increment));
            }
        }
    }

    fn elapsed(&self) -> Option<SignedDuration> {
        self.turn_start
            .map(|start| signed(self.time_source.now().saturating_duration_since(start)))
    }

    pub fn time_left(&self) -> SignedDuration {
        let Some(elapsed) = self.elapsed() else {
            return self.time_left_before_turn;
        };
        match self.control {
            TimeControl::Infinite => SignedDuration::MAX,
            TimeControl::Delay { delay, .. } => {
                let delay = signed(delay);
                if elapsed < delay {
                    self.time_left_before_turn
                } else {
                    self.time_left_before_turn.saturating_sub(elapsed - delay)
                }
            }
            TimeControl::Fixed(_) | TimeControl::Incremental { .. } => {
                self.time_left_before_turn.saturating_sub(elapsed)
            }
        }
    }

    /// How long until the clock flags, counting any grace delay not yet consumed.
    pub fn time_to_timeout(&self) -> SignedDuration {
        match self.control {
            TimeControl::Delay { delay, .. } => {
                let base = self.time_left_before_turn.saturating_add(signed(delay));
                match self.elapsed() {
                    Some(elapsed) => base.saturating_sub(elapsed),
                    None => base,
                }
            }
            _ => self.time_left(),
        }
    }

    pub fn is_timed_out(&self) -> bool {
        self.time_left().is_negative()
    }

    /// Wall-clock allowance for the next move: time to timeout plus `margin`.
    pub fn move_budget(&self, margin: Duration) -> Duration {
        unsigned(self.time_to_timeout()).saturating_add(margin)
    }
}

/// Timing context handed to an agent at the start of its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Time left on the mover's clock.
    pub remaining: Duration,
    /// Time left on the opponent's clock.
    pub opponent_remaining: Duration,
    /// Initial budget of the mover's time control (`Duration::MAX` when infinite).
    pub starting: Duration,
    /// Added after each move (zero unless incremental).
    pub increment: Duration,
}

impl Timer {
    pub fn new(clock: &ChessClock, opponent: &ChessClock) -> Timer {
        Timer {
            remaining: unsigned(clock.time_left()),
            opponent_remaining: unsigned(opponent.time_left()),
            starting: clock.control().starting_time().unwrap_or(Duration::MAX),
            increment: clock.control().increment(),
        }
    }
}
