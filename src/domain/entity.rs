/// Entities: Player, Coin, Fireball, Tower, Wumpus.
///
/// Every entity shares the same `Entity` shell (position, bounding box,
/// sprite binding, alive flag, tick counter). Per-kind state lives in the
/// closed `EntityKind` sum type; behaviour is dispatched by matching on it
/// in `sim::step`, never through trait objects.

use super::tile::SheetCell;

/// Index of a loaded sprite sheet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SheetId(pub usize);

/// Which sheet cells an entity is drawn with, and how big it is.
///
/// A single frame is a fixed cell; several frames cycle every
/// `ticks_per_frame` ticks of the entity's own tick counter.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SpriteBinding {
    pub sheet: SheetId,
    pub frames: Vec<SheetCell>,
    pub ticks_per_frame: u32,
    /// Cell size in pixels; also the entity's bounding box.
    pub width: i32,
    pub height: i32,
}

impl SpriteBinding {
    pub fn still(sheet: SheetId, row: u32, col: u32, width: i32, height: i32) -> Self {
        SpriteBinding {
            sheet,
            frames: vec![SheetCell::new(row, col)],
            ticks_per_frame: 1,
            width,
            height,
        }
    }

    pub fn cycle(sheet: SheetId, row: u32, cols: &[u32], ticks_per_frame: u32, width: i32, height: i32) -> Self {
        SpriteBinding {
            sheet,
            frames: cols.iter().map(|&c| SheetCell::new(row, c)).collect(),
            ticks_per_frame: ticks_per_frame.max(1),
            width,
            height,
        }
    }

    /// Cell to draw for an entity that has been ticked `tick_count` times.
    pub fn frame_at(&self, tick_count: u32) -> SheetCell {
        if self.frames.is_empty() {
            return SheetCell::new(0, 0);
        }
        let i = (tick_count / self.ticks_per_frame) as usize % self.frames.len();
        self.frames[i]
    }
}

/// Sprite bindings for each entity kind, resolved once at startup.
#[derive(Clone, Debug)]
pub struct EntitySprites {
    pub player: SpriteBinding,
    pub coin: SpriteBinding,
    pub fireball: SpriteBinding,
    pub tower: SpriteBinding,
    pub wumpus: SpriteBinding,
}

impl EntitySprites {
    /// Every kind drawn from cell (0, 0) of one sheet.
    #[cfg(test)]
    pub fn uniform(sheet: SheetId, width: i32, height: i32) -> Self {
        let b = SpriteBinding::still(sheet, 0, 0, width, height);
        EntitySprites {
            player: b.clone(),
            coin: b.clone(),
            fireball: b.clone(),
            tower: b.clone(),
            wumpus: b,
        }
    }
}

// ── Geometry ──

/// Axis-aligned bounding box in world pixels. `(x, y)` is the top-left.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Body {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Body {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Body { x, y, width, height }
    }

    pub fn left_x(&self) -> i32 {
        self.x
    }

    pub fn right_x(&self) -> i32 {
        self.x + self.width
    }

    pub fn top_y(&self) -> i32 {
        self.y
    }

    pub fn bottom_y(&self) -> i32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.height / 2
    }

    /// The four innermost corner pixels, shifted by a candidate move.
    /// Order: top-left, top-right, bottom-left, bottom-right.
    pub fn shifted_corners(&self, dx: i32, dy: i32) -> [(i32, i32); 4] {
        let l = self.x + dx;
        let t = self.y + dy;
        let r = l + (self.width - 1).max(0);
        let b = t + (self.height - 1).max(0);
        [(l, t), (r, t), (l, b), (r, b)]
    }
}

// ── Kinds ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId(pub u32);

/// Field-less mirror of `EntityKind`, used as a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityTag {
    Player,
    Coin,
    Fireball,
    Tower,
    Wumpus,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

/// Logical movement actions sampled once per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl FrameInput {
    /// Unit heading: each axis in -1..=1. Opposing keys cancel.
    pub fn axes(&self) -> (i32, i32) {
        let dx = self.right as i32 - self.left as i32;
        let dy = self.down as i32 - self.up as i32;
        (dx, dy)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub speed: i32,
    pub money: u32,
    /// Ticks on which the player actually moved; a diagonal step counts once.
    pub steps: u32,
    pub moving: bool,
    pub facing: Facing,
    /// Standing on a liquid tile.
    pub swimming: bool,
}

impl Player {
    pub fn new(speed: i32) -> Self {
        Player {
            speed,
            money: 0,
            steps: 0,
            moving: false,
            facing: Facing::Down,
            swimming: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Coin {
    pub value: u32,
}

/// Shared state of every self-propelled entity.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Motion {
    pub speed: i32,
    /// Per-tick displacement, recomputed by the steering rule.
    pub x_speed: i32,
    pub y_speed: i32,
}

impl Motion {
    pub fn new(speed: i32) -> Self {
        Motion { speed, x_speed: 0, y_speed: 0 }
    }
}

/// How a moving entity picks its heading each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Steering {
    /// Head for a fixed world point.
    TowardPoint { x: i32, y: i32 },
    /// Head for the player's centre, recomputed every tick.
    PursuePlayer,
    /// Keep a fixed heading (radians, 0 = east, y grows downward).
    Heading(f64),
    /// Random heading, re-rolled every `period` ticks.
    Wander { period: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fireball {
    pub motion: Motion,
    /// Fixed at spawn; radians.
    pub heading: f64,
    pub ticks_left: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tower {
    pub spawn_interval: u32,
    pub cooldown: u32,
}

impl Tower {
    pub fn new(spawn_interval: u32) -> Self {
        let interval = spawn_interval.max(1);
        Tower { spawn_interval: interval, cooldown: interval }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Wumpus {
    pub motion: Motion,
    pub steering: Steering,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Player(Player),
    Coin(Coin),
    Fireball(Fireball),
    Tower(Tower),
    Wumpus(Wumpus),
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub sprite: SpriteBinding,
    pub alive: bool,
    pub tick_count: u32,
    pub kind: EntityKind,
}

impl Entity {
    /// New live entity at `(x, y)`, sized by its sprite cell.
    pub fn new(id: EntityId, x: i32, y: i32, sprite: SpriteBinding, kind: EntityKind) -> Self {
        Entity {
            id,
            body: Body::new(x, y, sprite.width, sprite.height),
            sprite,
            alive: true,
            tick_count: 0,
            kind,
        }
    }

    pub fn tag(&self) -> EntityTag {
        match self.kind {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Coin(_) => EntityTag::Coin,
            EntityKind::Fireball(_) => EntityTag::Fireball,
            EntityKind::Tower(_) => EntityTag::Tower,
            EntityKind::Wumpus(_) => EntityTag::Wumpus,
        }
    }

    pub fn mark_dead(&mut self) {
        self.alive = false;
    }

    #[cfg(test)]
    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Currency granted on contact, if this entity carries any.
    pub fn coin_value(&self) -> Option<u32> {
        match &self.kind {
            EntityKind::Coin(c) => Some(c.value),
            _ => None,
        }
    }

    /// Cell to draw now. A standing player shows its first frame and a
    /// walking one advances with its step counter.
    pub fn current_frame(&self) -> SheetCell {
        match &self.kind {
            EntityKind::Player(p) if !p.moving => self.sprite.frame_at(0),
            EntityKind::Player(p) => self.sprite.frame_at(p.steps),
            _ => self.sprite.frame_at(self.tick_count),
        }
    }

    /// Only the top half shows: a swimming player.
    pub fn submerged(&self) -> bool {
        matches!(&self.kind, EntityKind::Player(p) if p.swimming)
    }

    /// Draw mirrored: the player sheet only has right-facing frames.
    pub fn flipped(&self) -> bool {
        matches!(&self.kind, EntityKind::Player(p) if p.facing == Facing::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_edges_and_center() {
        let b = Body::new(100, 40, 30, 20);
        assert_eq!(b.left_x(), 100);
        assert_eq!(b.right_x(), 130);
        assert_eq!(b.top_y(), 40);
        assert_eq!(b.bottom_y(), 60);
        assert_eq!((b.center_x(), b.center_y()), (115, 50));
    }

    #[test]
    fn shifted_corners_are_inner_pixels() {
        let b = Body::new(10, 20, 30, 30);
        assert_eq!(
            b.shifted_corners(5, 0),
            [(15, 20), (44, 20), (15, 49), (44, 49)]
        );
    }

    #[test]
    fn sprite_cycle_frames() {
        let s = SpriteBinding::cycle(SheetId(0), 0, &[0, 1, 2, 3], 15, 16, 16);
        assert_eq!(s.frame_at(0), SheetCell::new(0, 0));
        assert_eq!(s.frame_at(14), SheetCell::new(0, 0));
        assert_eq!(s.frame_at(15), SheetCell::new(0, 1));
        assert_eq!(s.frame_at(59), SheetCell::new(0, 3));
        assert_eq!(s.frame_at(60), SheetCell::new(0, 0));
    }

    #[test]
    fn frame_input_axes_cancel() {
        let i = FrameInput { up: true, down: true, left: false, right: true };
        assert_eq!(i.axes(), (1, 0));
        assert_eq!(FrameInput::default().axes(), (0, 0));
    }

    #[test]
    fn tower_interval_never_zero() {
        let t = Tower::new(0);
        assert_eq!(t.spawn_interval, 1);
        assert_eq!(t.cooldown, 1);
    }

    #[test]
    fn entity_sized_by_sprite() {
        let sprite = SpriteBinding::still(SheetId(1), 16, 12, 30, 28);
        let e = Entity::new(EntityId(7), 5, 6, sprite, EntityKind::Coin(Coin { value: 10 }));
        assert_eq!(e.body, Body::new(5, 6, 30, 28));
        assert_eq!(e.tag(), EntityTag::Coin);
        assert_eq!(e.coin_value(), Some(10));
        assert!(e.as_player().is_none());
        assert!(!e.flipped());
    }

    #[test]
    fn player_frame_follows_steps_and_facing() {
        let sprite = SpriteBinding::cycle(SheetId(0), 0, &[0, 1, 2, 3], 15, 16, 16);
        let mut e = Entity::new(EntityId(1), 0, 0, sprite, EntityKind::Player(Player::new(2)));
        e.tick_count = 40;
        // standing still: first frame whatever the tick count
        assert_eq!(e.current_frame(), SheetCell::new(0, 0));

        let p = e.as_player_mut().unwrap();
        p.moving = true;
        p.steps = 31;
        p.facing = Facing::Left;
        assert_eq!(e.current_frame(), SheetCell::new(0, 2));
        assert!(e.flipped());
    }
}
