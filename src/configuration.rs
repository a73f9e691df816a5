//! Config for the scheduler behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Invalid values are ignored (with a warning) and the default is used.
//!
//! - `ARENA_MAX_CONCURRENT_GAMES`: Number of games played at the same time (default: number of
//!   logical CPUs)
//! - `ARENA_TIME_CONTROL`: Time control of both sides: `inf`, `fixed:<ms>`, `inc:<ms>:<ms>` or
//!   `delay:<ms>:<ms>` (default: `fixed:60000`)
//! - `ARENA_MOVE_MARGIN_MS`: Extra wall-clock time granted on top of each move budget
//!   (default: `1000`)
//! - `ARENA_POLL_INTERVAL_MS`: How often the scheduler loop wakes up when idle (default: `100`)
//! - `ARENA_VERBOSE`: Print finished games to stdout (default: `false`)
//! - `ARENA_LOG`: Enable logging to a file (default: `false`)

use std::time::Duration;

use tracing::warn;

use crate::{clock::TimeControl, move_invoker::MoveInvoker};

/// Configuration for scheduler behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) max_concurrent_games: usize,
    pub(crate) white_time_control: TimeControl,
    pub(crate) black_time_control: TimeControl,
    pub(crate) move_margin: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) verbose: bool,
    pub(crate) log: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - One game per logical CPU runs concurrently.
    /// - Both sides play with one minute and no increment.
    /// - Agents get one extra second of wall-clock time per move before being abandoned.
    /// - The idle scheduler loop wakes up every 100ms.
    /// - Nothing is printed to stdout and logging to file is disabled.
    pub fn new() -> Self {
        Self {
            max_concurrent_games: num_cpus::get().max(1),
            white_time_control: TimeControl::default(),
            black_time_control: TimeControl::default(),
            move_margin: MoveInvoker::DEFAULT_MARGIN,
            poll_interval: Duration::from_millis(100),
            verbose: false,
            log: false,
        }
    }

    /// Create configuration from environment variables (see module documentation).
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_parsed<T>(var: &str, default: T) -> T
        where
            T: std::str::FromStr,
            T::Err: std::fmt::Display,
        {
            match std::env::var(var) {
                Ok(val) => val.parse().unwrap_or_else(|e| {
                    warn!("ignoring {var}='{val}': {e}");
                    default
                }),
                Err(_) => default,
            }
        }

        fn get_env_millis(var: &str, default: Duration) -> Duration {
            match std::env::var(var) {
                Ok(val) => match val.parse::<u64>() {
                    Ok(ms) => Duration::from_millis(ms),
                    Err(e) => {
                        warn!("ignoring {var}='{val}': {e}");
                        default
                    }
                },
                Err(_) => default,
            }
        }

        let defaults = Self::new();
        let time_control = get_env_parsed("ARENA_TIME_CONTROL", defaults.white_time_control);

        Self {
            max_concurrent_games: get_env_parsed(
                "ARENA_MAX_CONCURRENT_GAMES",
                defaults.max_concurrent_games,
            ),
            white_time_control: time_control,
            black_time_control: time_control,
            move_margin: get_env_millis("ARENA_MOVE_MARGIN_MS", defaults.move_margin),
            poll_interval: get_env_millis("ARENA_POLL_INTERVAL_MS", defaults.poll_interval),
            verbose: get_env_flag("ARENA_VERBOSE", defaults.verbose),
            log: get_env_flag("ARENA_LOG", defaults.log),
        }
    }

    /// Set the number of games that may run at the same time.
    ///
    /// Can be changed later with
    /// [`MatchScheduler::set_concurrency_cap`](crate::scheduler::MatchScheduler::set_concurrency_cap).
    pub fn with_max_concurrent_games(mut self, value: usize) -> Self {
        self.max_concurrent_games = value;
        self
    }

    /// Use the same time control for both sides.
    pub fn with_time_control(mut self, value: TimeControl) -> Self {
        self.white_time_control = value;
        self.black_time_control = value;
        self
    }

    /// Time control of the side playing white.
    pub fn with_white_time_control(mut self, value: TimeControl) -> Self {
        self.white_time_control = value;
        self
    }

    /// Time control of the side playing black.
    pub fn with_black_time_control(mut self, value: TimeControl) -> Self {
        self.black_time_control = value;
        self
    }

    /// Extra wall-clock time granted per move to absorb scheduling jitter.
    ///
    /// Does not change the clocks: a move arriving inside the margin but after the clock flagged
    /// is still a timeout.
    pub fn with_move_margin(mut self, value: Duration) -> Self {
        self.move_margin = value;
        self
    }

    /// How often the scheduler loop checks for cancellation while waiting for games.
    pub fn with_poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = value;
        self
    }

    /// Enable or disable printing finished games to stdout.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    pub fn max_concurrent_games(&self) -> usize {
        self.max_concurrent_games
    }

    pub fn white_time_control(&self) -> TimeControl {
        self.white_time_control
    }

    pub fn black_time_control(&self) -> TimeControl {
        self.black_time_control
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
