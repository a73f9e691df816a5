use std::{
    borrow::Borrow,
    fmt::{self, Debug, Display},
    sync::{Arc, Mutex},
};

use crate::{clock::Timer, rules::Rules};

/// Stable identity of an agent.
///
/// The ordering of identities decides which agent is "first" in a pairing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(Arc<str>);

impl AgentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        AgentId(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        AgentId::new(id)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        AgentId(Arc::from(id))
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What a chess-playing agent should implement.
///
/// `produce_move` runs on a worker thread and may take arbitrarily long; the game will not wait
/// for it past the mover's clock.
pub trait Agent<R: Rules>: Send {
    /// Returns the chosen move, or `None` if the agent has nothing to play (forfeit).
    fn produce_move(&mut self, position: &R::Position, timer: &Timer) -> Option<R::Move>;
}

/// Agent shared between a game session and its move workers.
pub type SharedAgent<R> = Arc<Mutex<Box<dyn Agent<R>>>>;

/// A registered participant: an identity and a way to build a fresh agent for each game.
pub trait AgentSource<R: Rules>: Send + Sync {
    fn id(&self) -> &AgentId;

    /// Builds a new agent instance. May be slow, never called while holding a scheduler lock.
    fn create(&self) -> anyhow::Result<Box<dyn Agent<R>>>;
}

/// [`AgentSource`] backed by a closure.
pub struct AgentFactory<F> {
    id: AgentId,
    make: F,
}

impl<F> AgentFactory<F> {
    pub fn new(id: impl Into<AgentId>, make: F) -> Self {
        Self {
            id: id.into(),
            make,
        }
    }
}

impl<F> Debug for AgentFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentFactory").field("id", &self.id).finish()
    }
}

impl<R, F> AgentSource<R> for AgentFactory<F>
where
    R: Rules,
    F: Fn() -> anyhow::Result<Box<dyn Agent<R>>> + Send + Sync,
{
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn create(&self) -> anyhow::Result<Box<dyn Agent<R>>> {
        (self.make)()
    }
}

pub(crate) fn share<R: Rules>(agent: Box<dyn Agent<R>>) -> SharedAgent<R> {
    Arc::new(Mutex::new(agent))
}
