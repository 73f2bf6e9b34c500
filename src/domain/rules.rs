/// Contact reactions between entity kinds.
///
/// Detection (`physics::is_hitting`) and response are separate: once two
/// entities are known to overlap, the response is looked up here by the
/// (subject, other) kind pair. No runtime type inspection is involved.
///
/// Only the player is tested against other entities each tick, so every
/// row below has the player as subject.

use super::entity::EntityTag;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reaction {
    /// Nothing happens.
    Ignore,
    /// Subject is credited the other's value; the other is consumed.
    Collect,
    /// The contact is lethal to the subject.
    Lethal,
}

/// (subject, other) → reaction. Pairs not listed are ignored.
const CONTACTS: &[(EntityTag, EntityTag, Reaction)] = &[
    (EntityTag::Player, EntityTag::Coin, Reaction::Collect),
    (EntityTag::Player, EntityTag::Fireball, Reaction::Lethal),
    (EntityTag::Player, EntityTag::Wumpus, Reaction::Lethal),
];

/// What happens to `subject` when it touches `other`.
pub fn reaction(subject: EntityTag, other: EntityTag) -> Reaction {
    CONTACTS
        .iter()
        .find(|(s, o, _)| *s == subject && *o == other)
        .map(|&(_, _, r)| r)
        .unwrap_or(Reaction::Ignore)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_collects_coins() {
        assert_eq!(reaction(EntityTag::Player, EntityTag::Coin), Reaction::Collect);
    }

    #[test]
    fn projectiles_and_pursuers_are_lethal() {
        assert_eq!(reaction(EntityTag::Player, EntityTag::Fireball), Reaction::Lethal);
        assert_eq!(reaction(EntityTag::Player, EntityTag::Wumpus), Reaction::Lethal);
    }

    #[test]
    fn towers_are_inert() {
        assert_eq!(reaction(EntityTag::Player, EntityTag::Tower), Reaction::Ignore);
    }

    #[test]
    fn table_is_directional() {
        // A coin touching a player does nothing by itself.
        assert_eq!(reaction(EntityTag::Coin, EntityTag::Player), Reaction::Ignore);
        assert_eq!(reaction(EntityTag::Wumpus, EntityTag::Fireball), Reaction::Ignore);
    }
}
