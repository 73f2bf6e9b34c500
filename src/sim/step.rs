/// The step function: advances a level by one tick.
///
/// Processing order:
///   1. Reap entities that died on the previous tick
///   2. Player movement and swimming (skipped once the player is dead)
///   3. Entity pass (towers, fireballs, wumpuses, coins) in collection order
///   4. Append entities spawned during the entity pass
///   5. Tile animations
///   6. Player-vs-entity contacts (detection, then the reaction table)
///
/// Entities killed during a tick stay in the collection until step 1 of the
/// next tick, so no pass ever removes from a collection it is iterating.

use crate::domain::ai;
use crate::domain::entity::{EntityKind, EntityTag, Facing, FrameInput, Steering};
use crate::domain::physics::{self, MapView};
use crate::domain::rules::{self, Reaction};
use super::event::GameEvent;
use super::level::Level;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(level: &mut Level, input: FrameInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    level.tick += 1;

    reap_dead(level, &mut events);
    resolve_player(level, input);
    update_swimming(level);
    let spawns = resolve_entities(level, &mut events);
    for (x, y) in spawns {
        level.add_fireball(x, y);
        events.push(GameEvent::Spawned { tag: EntityTag::Fireball });
    }
    level.animations.tick(&level.catalog);
    resolve_contacts(level, &mut events);

    events
}

fn reap_dead(level: &mut Level, events: &mut Vec<GameEvent>) {
    let before = level.entities.len();
    level.entities.retain(|e| {
        if !e.alive {
            log::trace!("reaping {:?} #{}", e.tag(), e.id.0);
        }
        e.alive
    });
    let count = before - level.entities.len();
    if count > 0 {
        events.push(GameEvent::Reaped { count });
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(level: &mut Level, input: FrameInput) {
    let map = MapView {
        tiles: &level.tiles,
        width: level.width,
        height: level.height,
        tile_size: level.tile_size,
        catalog: &level.catalog,
    };
    let Some(entity) = level.player.as_mut().filter(|p| p.alive) else { return };

    let (ax, ay) = input.axes();
    let EntityKind::Player(player) = &mut entity.kind else { return };
    let moved = physics::move_by(&map, &mut entity.body, ax * player.speed, ay * player.speed);

    if moved.any() {
        player.steps = player.steps.saturating_add(1);
    }
    // horizontal input wins the facing when both axes are held
    if ay < 0 {
        player.facing = Facing::Up;
    } else if ay > 0 {
        player.facing = Facing::Down;
    }
    if ax < 0 {
        player.facing = Facing::Left;
    } else if ax > 0 {
        player.facing = Facing::Right;
    }
    player.moving = ax != 0 || ay != 0;
    entity.tick_count = entity.tick_count.saturating_add(1);
}

/// The player swims while its centre is over a liquid tile.
fn update_swimming(level: &mut Level) {
    let Some(body) = level.player().filter(|p| p.alive).map(|p| p.body) else { return };
    let swimming = level.tile_at_world(body.center_x(), body.center_y()).is_liquid();
    if let Some(p) = level.player.as_mut().and_then(|e| e.as_player_mut()) {
        if p.swimming != swimming {
            log::trace!("player swimming: {swimming}");
        }
        p.swimming = swimming;
    }
}

// ══════════════════════════════════════════════════════════════
// Entity pass
// ══════════════════════════════════════════════════════════════

/// Tick every live entity. Returns the positions of fireballs to spawn.
fn resolve_entities(level: &mut Level, events: &mut Vec<GameEvent>) -> Vec<(i32, i32)> {
    let map = MapView {
        tiles: &level.tiles,
        width: level.width,
        height: level.height,
        tile_size: level.tile_size,
        catalog: &level.catalog,
    };
    let target = level.player.as_ref().filter(|p| p.alive).map(|p| p.body);
    let rng = &mut level.rng;
    let mut spawns = Vec::new();

    for e in level.entities.iter_mut().filter(|e| e.alive) {
        match &mut e.kind {
            EntityKind::Coin(_) | EntityKind::Player(_) => {}
            EntityKind::Tower(t) => {
                t.cooldown = t.cooldown.saturating_sub(1);
                if t.cooldown == 0 {
                    t.cooldown = t.spawn_interval;
                    spawns.push((e.body.x, e.body.y));
                }
            }
            EntityKind::Fireball(f) => {
                ai::steer(&mut f.motion, Steering::Heading(f.heading), &e.body, e.tick_count, target.as_ref(), rng);
                physics::move_by(&map, &mut e.body, f.motion.x_speed, f.motion.y_speed);
                f.ticks_left = f.ticks_left.saturating_sub(1);
                if f.ticks_left == 0 {
                    e.alive = false;
                    events.push(GameEvent::FireballBurnedOut);
                }
            }
            EntityKind::Wumpus(w) => {
                ai::steer(&mut w.motion, w.steering, &e.body, e.tick_count, target.as_ref(), rng);
                physics::move_by(&map, &mut e.body, w.motion.x_speed, w.motion.y_speed);
            }
        }
        e.tick_count = e.tick_count.saturating_add(1);
    }

    spawns
}

// ══════════════════════════════════════════════════════════════
// Contacts
// ══════════════════════════════════════════════════════════════

fn resolve_contacts(level: &mut Level, events: &mut Vec<GameEvent>) {
    let Some(player) = level.player.as_mut().filter(|p| p.alive) else { return };

    for other in level.entities.iter_mut().filter(|e| e.alive) {
        if !physics::is_hitting(&player.body, &other.body) {
            continue;
        }
        match rules::reaction(EntityTag::Player, other.tag()) {
            Reaction::Ignore => {}
            Reaction::Collect => {
                let value = other.coin_value().unwrap_or(0);
                other.mark_dead();
                if let Some(p) = player.as_player_mut() {
                    p.money = p.money.saturating_add(value);
                    events.push(GameEvent::CoinCollected { value, total: p.money });
                }
            }
            Reaction::Lethal => {
                player.mark_dead();
                events.push(GameEvent::PlayerKilled { by: other.tag() });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Entity;
    use crate::sim::level::fixtures::{level_from, setup};
    use crate::sim::level::{Level, GENERATED_SIZE};

    const RIGHT: FrameInput = FrameInput { up: false, down: false, left: false, right: true };

    fn open_level() -> Level {
        // 64×64 tiles, 60 px each, all grass
        let row = ".".repeat(GENERATED_SIZE as usize);
        let rows: Vec<&str> = (0..GENERATED_SIZE).map(|_| row.as_str()).collect();
        level_from(&rows, setup(60, 30))
    }

    fn player(level: &Level) -> &Entity {
        level.player().unwrap()
    }

    #[test]
    fn player_moves_right_by_speed() {
        let mut level = open_level();
        level.add_player(100, 100);
        step(&mut level, RIGHT);
        let p = player(&level);
        assert_eq!((p.body.x, p.body.y), (102, 100));
        let state = p.as_player().unwrap();
        assert_eq!(state.facing, Facing::Right);
        assert!(state.moving);
        assert_eq!(state.steps, 1);
    }

    #[test]
    fn wall_blocks_x_but_y_still_moves() {
        // stone at tile (2, 1): world x 120..180, y 60..120
        let mut level = level_from(&["....", "..#.", "....", "...."], setup(60, 30));
        // right edge pixel at 117; one step reaches 119, the next would cross 120
        level.add_player(88, 70);
        let down_right = FrameInput { down: true, right: true, ..FrameInput::default() };
        for _ in 0..10 {
            step(&mut level, down_right);
        }
        // right edge stops at 119 (x = 90), y keeps going
        let p = player(&level);
        assert_eq!(p.body.x, 90);
        assert_eq!(p.body.y, 90);
    }

    #[test]
    fn player_swims_over_water() {
        // water column 0..60, grass from 60
        let mut level = level_from(&["~..", "~.."], setup(60, 30));
        level.add_player(42, 10);
        step(&mut level, RIGHT);
        // centre x 59: still over water
        assert!(player(&level).as_player().unwrap().swimming);
        step(&mut level, RIGHT);
        // centre x 61: ashore
        assert!(!player(&level).as_player().unwrap().swimming);
    }

    #[test]
    fn counters_saturate() {
        let mut level = open_level();
        level.add_player(100, 100);
        level.add_wumpus_steered(2000, 2000, Steering::Wander { period: 60 });
        if let Some(e) = level.player.as_mut() {
            e.tick_count = u32::MAX;
            if let Some(p) = e.as_player_mut() {
                p.steps = u32::MAX;
            }
        }
        level.entities[0].tick_count = u32::MAX;

        step(&mut level, RIGHT);
        let p = player(&level);
        assert_eq!(p.body.x, 102);
        assert_eq!(p.tick_count, u32::MAX);
        assert_eq!(p.as_player().unwrap().steps, u32::MAX);
        assert_eq!(level.entities()[0].tick_count, u32::MAX);
    }

    #[test]
    fn money_saturates() {
        let mut level = open_level();
        level.add_player(100, 100);
        level.add_coin(110, 110, u32::MAX);
        level.add_coin(110, 110, 7);
        let events = step(&mut level, FrameInput::default());
        assert_eq!(player(&level).as_player().unwrap().money, u32::MAX);
        assert!(events.contains(&GameEvent::CoinCollected { value: 7, total: u32::MAX }));
    }

    #[test]
    fn idle_player_stays_put() {
        let mut level = open_level();
        level.add_player(100, 100);
        step(&mut level, FrameInput::default());
        let p = player(&level);
        assert_eq!((p.body.x, p.body.y), (100, 100));
        assert!(!p.as_player().unwrap().moving);
        assert_eq!(p.as_player().unwrap().steps, 0);
    }

    #[test]
    fn coin_is_collected_then_reaped() {
        let mut level = open_level();
        level.add_player(100, 100);
        level.add_coin(110, 110, 10);

        let events = step(&mut level, FrameInput::default());
        assert_eq!(player(&level).as_player().unwrap().money, 10);
        assert!(!level.entities()[0].alive);
        assert!(events.contains(&GameEvent::CoinCollected { value: 10, total: 10 }));

        let events = step(&mut level, FrameInput::default());
        assert!(level.entities().is_empty());
        assert!(events.contains(&GameEvent::Reaped { count: 1 }));
        assert_eq!(player(&level).as_player().unwrap().money, 10);
    }

    #[test]
    fn fireball_flies_straight_east() {
        let mut level = open_level();
        level.add_player(400, 100);
        level.add_fireball(100, 100);
        step(&mut level, FrameInput::default());
        let f = &level.entities()[0];
        assert_eq!((f.body.x, f.body.y), (110, 100));
    }

    #[test]
    fn fireball_stops_at_stone() {
        // stone at tile 2: world x 120..180
        let mut level = level_from(&["..#"], setup(60, 30));
        level.add_fireball_heading(85, 10, 0.0);
        // right edge at 114; a 10 px step would reach 124
        for _ in 0..5 {
            step(&mut level, FrameInput::default());
        }
        let f = &level.entities()[0];
        assert!(f.alive);
        assert_eq!((f.body.x, f.body.y), (85, 10));
    }

    #[test]
    fn wumpus_slides_along_wall() {
        // stone at tile (2, 0): world x 120..180, y 0..60
        let mut level = level_from(&["..#", "...", "..."], setup(60, 30));
        // right edge at 119, heading 45° down-right: 3 px per axis
        level.add_wumpus_steered(90, 10, Steering::TowardPoint { x: 1105, y: 1025 });
        for _ in 0..3 {
            step(&mut level, FrameInput::default());
        }
        let w = &level.entities()[0];
        assert_eq!((w.body.x, w.body.y), (90, 19));
    }

    #[test]
    fn fireball_burns_out() {
        let mut level = open_level();
        level.add_fireball_heading(100, 100, 0.0);
        for _ in 0..199 {
            step(&mut level, FrameInput::default());
        }
        assert!(level.entities()[0].alive);
        let events = step(&mut level, FrameInput::default());
        assert!(!level.entities()[0].alive);
        assert!(events.contains(&GameEvent::FireballBurnedOut));
        step(&mut level, FrameInput::default());
        assert!(level.entities().is_empty());
    }

    #[test]
    fn fireball_is_lethal() {
        let mut level = open_level();
        level.add_player(200, 100);
        level.add_fireball(165, 100);
        let events = step(&mut level, FrameInput::default());
        assert!(!player(&level).alive);
        assert!(events.contains(&GameEvent::PlayerKilled { by: EntityTag::Fireball }));

        // dead players are frozen
        step(&mut level, RIGHT);
        assert_eq!(player(&level).body.x, 200);
    }

    #[test]
    fn tower_spawns_on_interval() {
        let mut level = open_level();
        level.add_player(3000, 3000);
        level.add_tower(100, 100);
        for _ in 0..59 {
            step(&mut level, FrameInput::default());
        }
        assert_eq!(level.entities().len(), 1);
        let events = step(&mut level, FrameInput::default());
        assert_eq!(level.entities().len(), 2);
        assert!(events.contains(&GameEvent::Spawned { tag: EntityTag::Fireball }));
        assert_eq!(level.entities()[1].tag(), EntityTag::Fireball);
        assert_eq!((level.entities()[1].body.x, level.entities()[1].body.y), (100, 100));
    }

    #[test]
    fn wumpus_pursues_player() {
        let mut level = open_level();
        level.add_player(1000, 100);
        level.add_wumpus(100, 100);
        step(&mut level, FrameInput::default());
        let w = &level.entities()[0];
        assert_eq!((w.body.x, w.body.y), (105, 100));
    }

    #[test]
    fn wumpus_contact_is_lethal() {
        let mut level = open_level();
        level.add_player(100, 100);
        level.add_wumpus(131, 100);
        step(&mut level, FrameInput::default());
        assert!(!player(&level).alive);
    }

    #[test]
    fn water_animates_with_ticks() {
        use crate::domain::tile::standard;
        let mut level = open_level();
        for _ in 0..60 {
            step(&mut level, FrameInput::default());
        }
        assert_eq!(level.animations().frame_of(standard::WATER), 1);
        assert_eq!(level.tick, 60);
    }
}
