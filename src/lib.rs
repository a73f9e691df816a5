//! # Chess Arena
//!
//! A Rust crate for running unattended tournaments between chess-playing agents.
//!
//! It provides:
//! - Continuous match scheduling under a mutable concurrency cap ([`MatchScheduler`])
//! - Least-played matchup selection, so every ordered pairing gets its share of games
//!   ([`fairness`])
//! - Per-side chess clocks: infinite, fixed, incremental and delay ([`clock`])
//! - Hard per-move deadlines enforced against agent code that cannot be interrupted
//!   ([`move_invoker`])
//! - A head-to-head results ledger, readable while the tournament runs ([`ledger`], [`report`])
//!
//! The rules of chess are not part of this crate: plug a rules engine in by implementing
//! [`Rules`](crate::rules::Rules). Agents are registered through
//! [`AgentSource`](crate::agent::AgentSource), which builds a fresh
//! [`Agent`](crate::agent::Agent) for every game.
//!
//! # Documentation Overview
//!
//! - For the scheduling loop and the control surface (adding agents, cap, cancellation), see the
//!   [`scheduler`] module.
//! - For how a single game is played and which failures forfeit it, see
//!   [`GameSession`](crate::game_session::GameSession).
//! - For configuring time controls, concurrency and logging, see
//!   [`Configuration`](crate::configuration::Configuration).
//!
//! # Usage Example
//!
//! ```no_run
//! # use chess_arena::prelude::*;
//! # struct YourRules;
//! # impl Rules for YourRules {
//! #     type Position = u32;
//! #     type Move = u32;
//! #     fn legal_moves(&self, _position: &u32) -> Vec<u32> { vec![0] }
//! #     fn classify(&self, _position: &u32) -> Verdict { Verdict::InProgress }
//! #     fn apply_move(&self, position: &u32, _mv: &u32) -> u32 { *position + 1 }
//! #     fn side_to_move(&self, position: &u32) -> Color {
//! #         if position % 2 == 0 { Color::White } else { Color::Black }
//! #     }
//! # }
//! # struct FirstMove;
//! # impl Agent<YourRules> for FirstMove {
//! #     fn produce_move(&mut self, _position: &u32, _timer: &Timer) -> Option<u32> { Some(0) }
//! # }
//! use std::{sync::Arc, thread, time::Duration};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new()
//!         .with_max_concurrent_games(4)
//!         .with_time_control(TimeControl::Incremental {
//!             time: Duration::from_secs(60),
//!             increment: Duration::from_secs(1),
//!         });
//!     let scheduler = Arc::new(MatchScheduler::new(Arc::new(YourRules), 0, config));
//!
//!     for name in ["first", "second", "third"] {
//!         let make = || -> anyhow::Result<Box<dyn Agent<YourRules>>> { Ok(Box::new(FirstMove)) };
//!         scheduler.add_agent(Arc::new(AgentFactory::new(name, make)))?;
//!     }
//!
//!     let runner = Arc::clone(&scheduler);
//!     let handle = thread::spawn(move || runner.run());
//!
//!     thread::sleep(Duration::from_secs(600));
//!     scheduler.cancel();
//!     let _ = handle.join();
//!
//!     print!("{}", CrossTable::new(&scheduler.ledger(), scheduler.agents()));
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! Agents run in-process. An agent that overstays its move budget loses the game on time, but
//! its worker thread is abandoned, not killed: it keeps consuming CPU until the agent returns.
//! Untrusted agents should be wrapped in an [`Agent`](crate::agent::Agent) that talks to a
//! separate process.

pub use anyhow;

pub mod agent;
pub mod cancel;
pub mod clock;
pub mod configuration;
pub mod fairness;
pub mod game_result;
pub mod game_session;
pub mod ledger;
mod logger;
pub mod move_invoker;
pub mod report;
pub mod rules;
pub mod scheduler;
pub mod time_source;

pub use scheduler::MatchScheduler;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use chess_arena::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, AgentFactory, AgentId, AgentSource};
    pub use crate::cancel::Cancelled;
    pub use crate::clock::{TimeControl, Timer};
    pub use crate::configuration::Configuration;
    pub use crate::game_result::GameResult;
    pub use crate::ledger::ResultLedger;
    pub use crate::report::{standings, CrossTable};
    pub use crate::rules::{Color, DrawReason, Rules, Verdict};
    pub use crate::scheduler::MatchScheduler;
}
