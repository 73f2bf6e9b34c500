/// World: the top-level simulation context.
///
/// One `World` is built at startup and handed to the game loop by value.
/// The loop's thread owns it from then on; nothing reaches it through
/// globals.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera` — viewport into the world (top-left corner + size, pixels)
///   - Renderer maps: `screen(sx, sy) = world(camera.x + sx, camera.y + sy)`
///   - Camera centres on the player, clamped to the level bounds
///   - Levels smaller than the viewport pin the camera at 0

use crate::domain::entity::FrameInput;
use super::event::GameEvent;
use super::level::Level;
use super::step;

/// Camera: a viewport into the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Camera {
    /// World X of the top-left visible pixel
    pub x: i32,
    /// World Y of the top-left visible pixel
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    pub fn new(view_w: i32, view_h: i32) -> Self {
        Camera { x: 0, y: 0, view_w, view_h }
    }

    /// Centre on `(target_x, target_y)`, then clamp to `[0, level - view]`.
    /// The lower bound wins when the level is smaller than the viewport.
    pub fn update(&mut self, target_x: i32, target_y: i32, level_w: i32, level_h: i32) {
        self.x = (target_x - self.view_w / 2).min(level_w - self.view_w).max(0);
        self.y = (target_y - self.view_h / 2).min(level_h - self.view_h).max(0);
    }

    pub fn world_to_screen(&self, wx: i32, wy: i32) -> (i32, i32) {
        (wx - self.x, wy - self.y)
    }

    pub fn screen_to_world(&self, sx: i32, sy: i32) -> (i32, i32) {
        (sx + self.x, sy + self.y)
    }

    /// Inclusive tile index range covering the viewport, partial edge tiles
    /// included: `((tx0, ty0), (tx1, ty1))`.
    pub fn visible_tiles(&self, tile_size: i32) -> ((i32, i32), (i32, i32)) {
        let ts = tile_size.max(1);
        (
            (self.x.div_euclid(ts), self.y.div_euclid(ts)),
            ((self.x + self.view_w).div_euclid(ts), (self.y + self.view_h).div_euclid(ts)),
        )
    }
}

pub struct World {
    pub level: Level,
    pub camera: Camera,
}

impl World {
    pub fn new(level: Level, view_w: i32, view_h: i32) -> Self {
        let mut world = World { level, camera: Camera::new(view_w, view_h) };
        world.follow_player();
        world
    }

    /// Advance the level one tick and re-centre the camera.
    pub fn tick(&mut self, input: FrameInput) -> Vec<GameEvent> {
        let events = step::step(&mut self.level, input);
        self.follow_player();
        events
    }

    /// Centre the camera on the player's body. A dead player keeps the
    /// camera where it died.
    fn follow_player(&mut self) {
        if let Some(p) = self.level.player() {
            let (lw, lh) = (self.level.level_width(), self.level.level_height());
            self.camera.update(p.body.center_x(), p.body.center_y(), lw, lh);
        }
    }
}
