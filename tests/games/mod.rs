#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Condvar, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use chess_arena::{prelude::*, time_source::ManualTime};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt,
    layer::{Context, Filter, SubscriberExt},
    Layer, Registry,
};

/// Lets through the crate's own events up to `DEBUG`.
struct ArenaFilter;

impl<S> Filter<S> for ArenaFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        meta.target().starts_with("chess_arena") && meta.level() <= &Level::DEBUG
    }
}

/// Routes logs to the test harness output, shown only for failing tests.
pub fn init_test_logger() {
    let format = fmt::format()
        .without_time()
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(false);

    let reg = Registry::default().with(
        fmt::layer()
            .event_format(format)
            .with_test_writer()
            .with_filter(ArenaFilter),
    );

    let _ = tracing::subscriber::set_global_default(reg);
}

/// Take-away game: each side removes 1 to 3 stones, whoever takes the last stone wins.
/// Drawn once `max_plies` moves have been played.
pub struct TakeAway {
    pub max_plies: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pile {
    pub stones: u32,
    pub to_move: Color,
    pub plies: u32,
}

impl Pile {
    pub fn new(stones: u32) -> Pile {
        Pile {
            stones,
            to_move: Color::White,
            plies: 0,
        }
    }
}

impl Rules for TakeAway {
    type Position = Pile;
    type Move = u32;

    fn legal_moves(&self, position: &Pile) -> Vec<u32> {
        (1..=position.stones.min(3)).collect()
    }

    fn classify(&self, position: &Pile) -> Verdict {
        if position.stones == 0 {
            // the side to move has nothing left to take: the previous mover won
            match position.to_move {
                Color::White => Verdict::BlackWins,
                Color::Black => Verdict::WhiteWins,
            }
        } else if position.plies >= self.max_plies {
            Verdict::Draw(DrawReason::FiftyMoveRule)
        } else {
            Verdict::InProgress
        }
    }

    fn apply_move(&self, position: &Pile, mv: &u32) -> Pile {
        Pile {
            stones: position.stones - mv,
            to_move: position.to_move.opponent(),
            plies: position.plies + 1,
        }
    }

    fn side_to_move(&self, position: &Pile) -> Color {
        position.to_move
    }
}

pub fn rules() -> Arc<TakeAway> {
    Arc::new(TakeAway { max_plies: 200 })
}

pub type BoxedAgent = Box<dyn Agent<TakeAway>>;

/// Always takes one stone.
pub struct TakeOne;

impl Agent<TakeAway> for TakeOne {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        Some(1)
    }
}

/// Plays the given moves in order, then nothing.
pub struct Scripted(pub Vec<Option<u32>>);

impl Agent<TakeAway> for Scripted {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        if self.0.is_empty() {
            None
        } else {
            self.0.remove(0)
        }
    }
}

/// Thinks for `think` of simulated time, then takes one stone.
pub struct SimulatedThinker {
    pub time: Arc<ManualTime>,
    pub think: Duration,
}

impl Agent<TakeAway> for SimulatedThinker {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        self.time.advance(self.think);
        Some(1)
    }
}

/// Sleeps for real before taking one stone.
pub struct Sleepy(pub Duration);

impl Agent<TakeAway> for Sleepy {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        thread::sleep(self.0);
        Some(1)
    }
}

pub struct Panicky;

impl Agent<TakeAway> for Panicky {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        panic!("agent crashed");
    }
}

/// Records every timer it receives, then takes one stone.
pub struct TimerProbe(pub Arc<Mutex<Vec<Timer>>>);

impl Agent<TakeAway> for TimerProbe {
    fn produce_move(&mut self, _position: &Pile, timer: &Timer) -> Option<u32> {
        self.0.lock().unwrap().push(*timer);
        Some(1)
    }
}

/// Blocks agents until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

/// Waits on the gate before every move.
pub struct Gated(pub Arc<Gate>);

impl Agent<TakeAway> for Gated {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        self.0.wait();
        Some(1)
    }
}

/// Waits on the gate, then counts the move it plays.
pub struct CountingGated {
    pub gate: Arc<Gate>,
    pub moves: Arc<AtomicUsize>,
}

impl Agent<TakeAway> for CountingGated {
    fn produce_move(&mut self, _position: &Pile, _timer: &Timer) -> Option<u32> {
        self.gate.wait();
        self.moves.fetch_add(1, Ordering::SeqCst);
        Some(1)
    }
}

/// Blocks one `create()` call once armed, until released.
#[derive(Default)]
pub struct Hold {
    armed: AtomicBool,
    pub entered: Gate,
    pub release: Gate,
}

impl Hold {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

/// Builds gated agents on whichever gate is current, honoring the hold.
pub struct HeldSource {
    id: AgentId,
    gate: Arc<Mutex<Arc<Gate>>>,
    hold: Arc<Hold>,
}

impl AgentSource<TakeAway> for HeldSource {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn create(&self) -> anyhow::Result<BoxedAgent> {
        if self.hold.armed.swap(false, Ordering::SeqCst) {
            self.hold.entered.open();
            self.hold.release.wait();
        }
        let gate = self.gate.lock().unwrap().clone();
        Ok(Box::new(Gated(gate)))
    }
}

pub fn held_source(
    name: &str,
    gate: &Arc<Mutex<Arc<Gate>>>,
    hold: &Arc<Hold>,
) -> Arc<dyn AgentSource<TakeAway>> {
    Arc::new(HeldSource {
        id: AgentId::from(name),
        gate: gate.clone(),
        hold: hold.clone(),
    })
}

pub fn counting_source(
    name: &str,
    gate: &Arc<Gate>,
    moves: &Arc<AtomicUsize>,
) -> Arc<dyn AgentSource<TakeAway>> {
    let (gate, moves) = (gate.clone(), moves.clone());
    Arc::new(AgentFactory::new(name, move || -> anyhow::Result<BoxedAgent> {
        Ok(Box::new(CountingGated {
            gate: gate.clone(),
            moves: moves.clone(),
        }))
    }))
}

pub fn take_one_source(name: &str) -> Arc<dyn AgentSource<TakeAway>> {
    Arc::new(AgentFactory::new(name, || -> anyhow::Result<BoxedAgent> {
        Ok(Box::new(TakeOne))
    }))
}

pub fn gated_source(name: &str, gate: &Arc<Gate>) -> Arc<dyn AgentSource<TakeAway>> {
    let gate = gate.clone();
    Arc::new(AgentFactory::new(name, move || -> anyhow::Result<BoxedAgent> {
        Ok(Box::new(Gated(gate.clone())))
    }))
}

pub fn broken_source(name: &str) -> Arc<dyn AgentSource<TakeAway>> {
    Arc::new(AgentFactory::new(name, || -> anyhow::Result<BoxedAgent> {
        anyhow::bail!("does not compile")
    }))
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
