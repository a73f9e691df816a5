//! Continuous tournament scheduling.
//!
//! [`MatchScheduler`] owns the agent pool, the running games and the [`ResultLedger`]. Once
//! [`MatchScheduler::run`] is entered it keeps `concurrency cap` games in flight, always
//! launching the least-played matchups (see [`crate::fairness`]), and records every finished
//! game before starting new ones.
//!
//! All methods take `&self`, so the scheduler is meant to be shared behind an [`Arc`]: one thread
//! sits in `run()` while others add or remove agents, change the cap, read the ledger or cancel.
//!
//! # Scheduling pass
//!
//! Every mutation and every finished game triggers a pass:
//! 1. snapshot the number of running games and compute the free slots,
//! 2. pick that many least-played matchups, cycling through them if there are fewer,
//! 3. build the agents and sessions without holding any lock,
//! 4. under the running-games lock, start them only if the running count did not move since the
//!    snapshot; otherwise everything built is dropped and the pass starts over.
//!
//! Games are never stopped to honor a lower cap; the surplus simply drains.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{bail, Context};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    agent::{Agent, AgentId, AgentSource},
    cancel::{CancellationToken, Cancelled},
    clock::ChessClock,
    configuration::Configuration,
    fairness::{least_played, Candidate},
    game_result::GameResult,
    game_session::GameSession,
    ledger::ResultLedger,
    logger::init_logger,
    move_invoker::MoveInvoker,
    rules::Rules,
    time_source::{MonotonicTime, TimeSource},
};

pub type GameId = u64;

/// Public view of an in-flight game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningGameInfo {
    pub id: GameId,
    pub white: AgentId,
    pub black: AgentId,
    pub started: Instant,
}

struct RunningGame {
    info: RunningGameInfo,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<GameResult>>,
}

/// A session built during a pass, not started yet.
struct PendingGame<R: Rules> {
    id: GameId,
    white: AgentId,
    black: AgentId,
    session: GameSession<R>,
}

pub struct MatchScheduler<R: Rules> {
    rules: Arc<R>,
    start_position: R::Position,
    config: Configuration,
    time_source: Arc<dyn TimeSource>,
    cap: AtomicUsize,
    pool: Mutex<Vec<Arc<dyn AgentSource<R>>>>,
    running: Mutex<Vec<RunningGame>>,
    ledger: RwLock<ResultLedger>,
    started: AtomicBool,
    cancel: CancellationToken,
    next_game_id: AtomicU64,
    completed_tx: Sender<GameId>,
    completed_rx: Mutex<Option<Receiver<GameId>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

impl<R: Rules> MatchScheduler<R> {
    /// Every game starts from `start_position` with the time controls of `config`.
    #[instrument(skip_all)]
    pub fn new(rules: Arc<R>, start_position: R::Position, config: Configuration) -> Self {
        if config.log {
            if let Err(e) = init_logger() {
                eprintln!("file logging disabled: {e:#}");
            }
        }
        trace!(?config);

        let (completed_tx, completed_rx) = mpsc::channel();
        Self {
            rules,
            start_position,
            config,
            time_source: Arc::new(MonotonicTime),
            cap: AtomicUsize::new(config.max_concurrent_games),
            pool: Mutex::new(vec![]),
            running: Mutex::new(vec![]),
            ledger: RwLock::new(ResultLedger::new()),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            next_game_id: AtomicU64::new(1),
            completed_tx,
            completed_rx: Mutex::new(Some(completed_rx)),
        }
    }

    /// Clocks of every game will read time from `time_source`.
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Registers an agent and schedules new games.
    ///
    /// # Errors
    /// If an agent with the same identity is already registered.
    pub fn add_agent(&self, source: Arc<dyn AgentSource<R>>) -> anyhow::Result<()> {
        {
            let mut pool = lock(&self.pool);
            if pool.iter().any(|s| s.id() == source.id()) {
                bail!("agent {} is already registered", source.id());
            }
            info!(agent = %source.id(), "agent added");
            pool.push(source);
        }
        self.start_games();
        Ok(())
    }

    /// Unregisters an agent. Its running games play on and are recorded.
    ///
    /// Returns false if the agent was not registered.
    pub fn remove_agent(&self, id: &AgentId) -> bool {
        let removed = {
            let mut pool = lock(&self.pool);
            let before = pool.len();
            pool.retain(|s| s.id() != id);
            pool.len() != before
        };
        if removed {
            info!(agent = %id, "agent removed");
            self.start_games();
        }
        removed
    }

    pub fn has_agent(&self, id: &AgentId) -> bool {
        lock(&self.pool).iter().any(|s| s.id() == id)
    }

    /// Registered identities, in registration order.
    pub fn agents(&self) -> Vec<AgentId> {
        lock(&self.pool).iter().map(|s| s.id().clone()).collect()
    }

    /// Changes the number of concurrent games. Lowering it does not stop running games.
    pub fn set_concurrency_cap(&self, cap: usize) {
        self.cap.store(cap, Ordering::SeqCst);
        info!(cap, "concurrency cap changed");
        self.start_games();
    }

    pub fn concurrency_cap(&self) -> usize {
        self.cap.load(Ordering::SeqCst)
    }

    /// Stops the scheduler loop and asks every running game to stop at its next turn.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let running = lock(&self.running);
        for game in running.iter() {
            game.cancel.cancel();
        }
        info!(running = running.len(), "cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Snapshot of the results so far.
    pub fn ledger(&self) -> ResultLedger {
        read(&self.ledger).clone()
    }

    /// Runs `f` against the live ledger, holding its read lock.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&ResultLedger) -> T) -> T {
        f(&read(&self.ledger))
    }

    pub fn running_games(&self) -> Vec<RunningGameInfo> {
        lock(&self.running)
            .iter()
            .map(|game| game.info.clone())
            .collect()
    }

    /// The scheduling loop. Returns only on error.
    ///
    /// Waits for games to finish one at a time, records each result and refills the free slots.
    /// Checks for cancellation every poll interval.
    ///
    /// # Errors
    /// [`Cancelled`] once [`MatchScheduler::cancel`] has been called, or an error if the loop was
    /// already entered once.
    #[instrument(skip_all, name = "scheduler")]
    pub fn run(&self) -> anyhow::Result<()> {
        let completed = lock(&self.completed_rx)
            .take()
            .context("scheduler loop can only be entered once")?;
        self.started.store(true, Ordering::SeqCst);
        info!(cap = self.concurrency_cap(), "scheduler started");

        self.start_games();
        loop {
            if self.cancel.is_cancelled() {
                info!("scheduler stopped");
                return Err(Cancelled.into());
            }
            let id = match completed.recv_timeout(self.config.poll_interval) {
                Ok(id) => id,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => bail!("game completion channel closed"),
            };
            self.on_game_finished(id);
            self.start_games();
        }
    }

    fn on_game_finished(&self, id: GameId) {
        let game = {
            let mut running = lock(&self.running);
            running
                .iter()
                .position(|game| game.info.id == id)
                .map(|pos| running.remove(pos))
        };
        let Some(RunningGame { info, handle, .. }) = game else {
            warn!(id, "completion received for a game that is not running");
            return;
        };
        let RunningGameInfo {
            white,
            black,
            started,
            ..
        } = info;

        match handle.join() {
            Ok(Ok(result)) => {
                if let Err(e) = write(&self.ledger).record_outcome(&white, &black, result) {
                    error!(id, "could not record result: {e:#}");
                    return;
                }
                info!(id, %white, %black, %result, elapsed = ?started.elapsed(), "game finished");
                if self.config.verbose {
                    print_game_result(&white, &black, result);
                }
            }
            Ok(Err(e)) if e.downcast_ref::<Cancelled>().is_some() => {
                debug!(id, "game cancelled");
            }
            Ok(Err(e)) => error!(id, %white, %black, "game aborted: {e:#}"),
            Err(_) => error!(id, %white, %black, "game thread panicked"),
        }
    }

    /// One scheduling pass, restarted until it commits without racing another pass.
    #[instrument(skip_all)]
    fn start_games(&self) {
        loop {
            if !self.started.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
                return;
            }

            let running_count = lock(&self.running).len();
            let to_start = self.concurrency_cap().saturating_sub(running_count);
            if to_start == 0 {
                return;
            }

            let (pool, candidates) = {
                let pool = lock(&self.pool).clone();
                let ids: Vec<AgentId> = pool.iter().map(|s| s.id().clone()).collect();
                let candidates = least_played(&ids, &read(&self.ledger), to_start);
                (pool, candidates)
            };
            if candidates.is_empty() {
                trace!("not enough agents to start a game");
                return;
            }

            let pending: Vec<PendingGame<R>> = (0..to_start)
                .filter_map(|i| self.prepare_game(&pool, &candidates[i % candidates.len()]))
                .collect();

            let mut running = lock(&self.running);
            if self.cancel.is_cancelled() {
                return;
            }
            if running.len() != running_count {
                debug!(
                    expected = running_count,
                    found = running.len(),
                    "running games changed during pass, restarting"
                );
                continue;
            }
            for game in pending {
                let (id, white, black) = (game.id, game.white.clone(), game.black.clone());
                match self.launch(game) {
                    Ok(game) => {
                        debug!(id, %white, %black, "game started");
                        running.push(game);
                    }
                    Err(e) => error!(id, %white, %black, "{e:#}"),
                }
            }
            return;
        }
    }

    /// Builds both agents and the session. Slow, must not be called under a lock.
    fn prepare_game(
        &self,
        pool: &[Arc<dyn AgentSource<R>>],
        candidate: &Candidate,
    ) -> Option<PendingGame<R>> {
        let create = |id: &AgentId| -> anyhow::Result<Box<dyn Agent<R>>> {
            let source = pool
                .iter()
                .find(|s| s.id() == id)
                .with_context(|| format!("agent {id} left the pool"))?;
            source
                .create()
                .with_context(|| format!("could not create agent {id}"))
        };
        let agents = create(&candidate.white)
            .and_then(|white| create(&candidate.black).map(|black| (white, black)));
        let (white_agent, black_agent) = match agents {
            Ok(agents) => agents,
            Err(e) => {
                warn!("skipping {} VS {}: {e:#}", candidate.white, candidate.black);
                return None;
            }
        };

        let id = self.next_game_id.fetch_add(1, Ordering::Relaxed);
        let session = GameSession::with_clocks(
            self.rules.clone(),
            white_agent,
            black_agent,
            self.start_position.clone(),
            ChessClock::with_time_source(self.config.white_time_control, self.time_source.clone()),
            ChessClock::with_time_source(self.config.black_time_control, self.time_source.clone()),
        )
        .with_invoker(MoveInvoker::new(self.config.move_margin, format!("game-{id}")));

        Some(PendingGame {
            id,
            white: candidate.white.clone(),
            black: candidate.black.clone(),
            session,
        })
    }

    fn launch(&self, game: PendingGame<R>) -> anyhow::Result<RunningGame> {
        let PendingGame {
            id,
            white,
            black,
            mut session,
        } = game;
        let cancel = session.cancellation_token();
        let completed = self.completed_tx.clone();

        let handle = thread::Builder::new()
            .name(format!("game-{id}"))
            .spawn(move || {
                let _notify = CompletionNotice { id, completed };
                session.run()
            })
            .context("could not spawn game thread")?;

        Ok(RunningGame {
            info: RunningGameInfo {
                id,
                white,
                black,
                started: Instant::now(),
            },
            cancel,
            handle,
        })
    }
}

/// Reports the game to the scheduler loop when its thread ends, panicking or not.
struct CompletionNotice {
    id: GameId,
    completed: Sender<GameId>,
}

impl Drop for CompletionNotice {
    fn drop(&mut self) {
        // the loop may already be gone after cancellation
        let _ = self.completed.send(self.id);
    }
}

fn print_game_result(white: &AgentId, black: &AgentId, result: GameResult) {
    // green match, default result
    println!("\x1b[32m{white} VS {black}:\x1b[39m {result}");
}
