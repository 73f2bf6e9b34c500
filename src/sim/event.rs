/// Events emitted during a simulation step.
/// The loop logs these; nothing else consumes them yet.

use crate::domain::entity::EntityTag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CoinCollected { value: u32, total: u32 },
    PlayerKilled { by: EntityTag },
    Spawned { tag: EntityTag },
    Reaped { count: usize },
    FireballBurnedOut,
}
