/// Presentation layer: composes one frame of the world into a pixel buffer.
///
/// How it works:
///   1. Clear the frame buffer
///   2. Draw every tile overlapping the camera viewport, grid order,
///      partially visible edge tiles included (off-level tiles draw as VOID)
///   3. Draw live entities in collection order, with the player before or
///      after them depending on `PlayerLayer`
///   4. Debug overlay: tile under the pointer, entity bounding boxes, a
///      world-pixel ruler along the top and left edges, pointer marker
///
/// The buffer is the renderer's only output. Getting it onto a screen is a
/// `Presenter`'s job (see `ui::terminal`).

use crate::config::{DisplayConfig, PlayerLayer};
use crate::domain::entity::{Entity, SheetId};
use crate::domain::tile::SheetCell;
use crate::sim::world::{Camera, World};
use super::atlas::{AtlasSet, SpriteAtlas};

const DEBUG_TILE: u32 = 0xFFFF_FF00;
const DEBUG_BOX: u32 = 0xFFFF_00FF;
const DEBUG_RULER: u32 = 0xFF00_FFFF;
const DEBUG_POINTER: u32 = 0xFFFF_FFFF;

/// World pixels between ruler ticks.
const RULER_STEP: i32 = 50;
const RULER_TICK_LEN: i32 = 4;

// ── FrameBuffer: a 2D grid of ARGB pixels ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer { width, height, pixels: vec![0; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }

    /// Write one pixel. Off-buffer writes are dropped.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, argb: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = argb;
        }
    }

    /// Pixel at `(x, y)`; 0 outside the buffer.
    pub fn get(&self, x: usize, y: usize) -> u32 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            0
        }
    }

    pub fn outline_rect(&mut self, x: i32, y: i32, w: i32, h: i32, argb: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        for dx in 0..w {
            self.set(x + dx, y, argb);
            self.set(x + dx, y + h - 1, argb);
        }
        for dy in 0..h {
            self.set(x, y + dy, argb);
            self.set(x + w - 1, y + dy, argb);
        }
    }

    /// Copy a sheet cell to `(x, y)`, each source pixel `scale`×`scale`,
    /// mirrored left-to-right when `flip_x`. Fully transparent source pixels
    /// are skipped.
    pub fn blit_cell(&mut self, atlas: &SpriteAtlas, cell: SheetCell, x: i32, y: i32, scale: i32, flip_x: bool) {
        self.blit_cell_top(atlas, cell, x, y, scale, flip_x, i32::MAX);
    }

    /// `blit_cell`, keeping only the top `max_h` destination rows.
    #[allow(clippy::too_many_arguments)]
    pub fn blit_cell_top(
        &mut self,
        atlas: &SpriteAtlas,
        cell: SheetCell,
        x: i32,
        y: i32,
        scale: i32,
        flip_x: bool,
        max_h: i32,
    ) {
        let scale = scale.max(1);
        let w = atlas.cell_width() as i32 * scale;
        let h = (atlas.cell_height() as i32 * scale).min(max_h);

        // clip to the buffer
        let x0 = (-x).max(0);
        let y0 = (-y).max(0);
        let x1 = w.min(self.width as i32 - x);
        let y1 = h.min(self.height as i32 - y);

        for dy in y0..y1 {
            for dx in x0..x1 {
                let sx = if flip_x { (w - 1 - dx) / scale } else { dx / scale };
                let argb = atlas.pixel(cell, sx as u32, (dy / scale) as u32);
                if argb >> 24 != 0 {
                    self.set(x + dx, y + dy, argb);
                }
            }
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    atlases: AtlasSet,
    tile_sheet: SheetId,
    scale: i32,
    player_layer: PlayerLayer,
    clear_colour: u32,
    debug: bool,
    frame: FrameBuffer,
}

impl Renderer {
    pub fn new(atlases: AtlasSet, tile_sheet: SheetId, display: &DisplayConfig) -> Self {
        Renderer {
            atlases,
            tile_sheet,
            scale: display.tile_scale.max(1),
            player_layer: display.player_layer,
            clear_colour: display.clear_colour,
            debug: display.debug,
            frame: FrameBuffer::new(display.width.max(1) as usize, display.height.max(1) as usize),
        }
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        log::info!("debug overlay {}", if self.debug { "on" } else { "off" });
    }

    /// Compose one frame. `pointer` is in frame-buffer (screen) pixels.
    pub fn render(&mut self, world: &World, pointer: Option<(i32, i32)>) -> &FrameBuffer {
        self.frame.clear(self.clear_colour);
        self.draw_tiles(world);

        let level = &world.level;
        let player = level.player().filter(|p| p.alive);
        if self.player_layer == PlayerLayer::BeforeEntities {
            if let Some(p) = player {
                self.draw_entity(p, &world.camera);
            }
        }
        for e in level.entities().iter().filter(|e| e.alive) {
            self.draw_entity(e, &world.camera);
        }
        if self.player_layer == PlayerLayer::AfterEntities {
            if let Some(p) = player {
                self.draw_entity(p, &world.camera);
            }
        }

        if self.debug {
            self.draw_debug(world, pointer);
        }
        &self.frame
    }

    fn draw_tiles(&mut self, world: &World) {
        let Some(sheet) = self.atlases.get(self.tile_sheet) else { return };
        let level = &world.level;
        let cam = &world.camera;
        let ts = level.tile_display_size();
        let ((tx0, ty0), (tx1, ty1)) = cam.visible_tiles(ts);

        for ty in ty0..=ty1 {
            for tx in tx0..=tx1 {
                let kind = level.tile_at_tile(tx, ty);
                let frame = level.animations().frame_of(kind.id());
                let (sx, sy) = cam.world_to_screen(tx * ts, ty * ts);
                for &cell in kind.cells_to_draw(frame) {
                    self.frame.blit_cell(sheet, cell, sx, sy, self.scale, false);
                }
            }
        }
    }

    fn draw_entity(&mut self, e: &Entity, cam: &Camera) {
        let Some(sheet) = self.atlases.get(e.sprite.sheet) else { return };
        let (sx, sy) = cam.world_to_screen(e.body.x, e.body.y);
        // a swimming player shows only above the waterline
        let max_h = if e.submerged() { e.body.height / 2 } else { i32::MAX };
        self.frame
            .blit_cell_top(sheet, e.current_frame(), sx, sy, self.scale, e.flipped(), max_h);
    }

    fn draw_debug(&mut self, world: &World, pointer: Option<(i32, i32)>) {
        let cam = &world.camera;
        let ts = world.level.tile_display_size();

        if let Some((px, py)) = pointer {
            let (wx, wy) = cam.screen_to_world(px, py);
            let (tx, ty) = (wx.div_euclid(ts), wy.div_euclid(ts));
            let (sx, sy) = cam.world_to_screen(tx * ts, ty * ts);
            self.frame.outline_rect(sx, sy, ts, ts, DEBUG_TILE);
        }

        let level = &world.level;
        for e in level.entities().iter().chain(level.player()).filter(|e| e.alive) {
            let (sx, sy) = cam.world_to_screen(e.body.x, e.body.y);
            self.frame.outline_rect(sx, sy, e.body.width, e.body.height, DEBUG_BOX);
        }

        self.draw_ruler(cam);
        if let Some((px, py)) = pointer {
            self.frame.outline_rect(px, py, 3, 3, DEBUG_POINTER);
        }
    }

    /// Tick marks at every `RULER_STEP` world pixels: down from the top edge
    /// for x, in from the left edge for y.
    fn draw_ruler(&mut self, cam: &Camera) {
        let (w, h) = (self.frame.width as i32, self.frame.height as i32);
        for sx in 0..w {
            if cam.screen_to_world(sx, 0).0.rem_euclid(RULER_STEP) == 0 {
                for dy in 0..RULER_TICK_LEN {
                    self.frame.set(sx, dy, DEBUG_RULER);
                }
            }
        }
        for sy in 0..h {
            if cam.screen_to_world(0, sy).1.rem_euclid(RULER_STEP) == 0 {
                for dx in 0..RULER_TICK_LEN {
                    self.frame.set(dx, sy, DEBUG_RULER);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{FrameInput, SpriteBinding};
    use crate::sim::level::fixtures::{level_from, setup};
    use crate::ui::atlas::fixtures::numbered_sheet;

    // Tile sheet cells are 4 px, drawn at scale 2, so tiles are 8 px.
    const TS: i32 = 8;

    fn colour(row: u32, col: u32) -> u32 {
        0xFF00_0000 | (row * 20 + col)
    }

    fn renderer(w: i32, h: i32, layer: PlayerLayer) -> Renderer {
        let mut atlases = AtlasSet::default();
        let tiles = atlases.push(numbered_sheet("tiles", 19, 20, 4));
        let display = DisplayConfig {
            width: w,
            height: h,
            tile_scale: 2,
            player_layer: layer,
            ..GameConfig::default().display
        };
        Renderer::new(atlases, tiles, &display)
    }

    fn world(rows: &[&str], w: i32, h: i32) -> World {
        let mut s = setup(TS, TS);
        s.sprites.player = SpriteBinding::still(SheetId(0), 1, 1, TS, TS);
        s.sprites.coin = SpriteBinding::still(SheetId(0), 2, 2, TS, TS);
        World::new(level_from(rows, s), w, h)
    }

    #[test]
    fn tiles_fill_the_viewport() {
        let world = world(&["#."], 24, 8);
        let mut r = renderer(24, 8, PlayerLayer::AfterEntities);
        let frame = r.render(&world, None);
        assert_eq!(frame.get(0, 0), colour(10, 8)); // stone
        assert_eq!(frame.get(15, 7), colour(1, 0)); // grass
        assert_eq!(frame.get(16, 0), colour(4, 0)); // past the level: void
    }

    #[test]
    fn player_drawn_last_by_default() {
        let mut world = world(&["...."], 32, 8);
        world.level.add_player(0, 0);
        world.level.add_coin(0, 0, 10);
        let mut r = renderer(32, 8, PlayerLayer::AfterEntities);
        assert_eq!(r.render(&world, None).get(3, 3), colour(1, 1));
    }

    #[test]
    fn player_layer_can_go_under() {
        let mut world = world(&["...."], 32, 8);
        world.level.add_player(0, 0);
        world.level.add_coin(0, 0, 10);
        let mut r = renderer(32, 8, PlayerLayer::BeforeEntities);
        assert_eq!(r.render(&world, None).get(3, 3), colour(2, 2));
    }

    #[test]
    fn camera_offset_shifts_the_picture() {
        let mut world = world(&["#...", "...."], 16, 8);
        world.camera.x = 4;
        let mut r = renderer(16, 8, PlayerLayer::AfterEntities);
        let frame = r.render(&world, None);
        // first 4 columns show the right half of the stone tile
        assert_eq!(frame.get(3, 0), colour(10, 8));
        assert_eq!(frame.get(4, 0), colour(1, 0));
    }

    #[test]
    fn debug_outlines_pointer_tile() {
        let world = world(&["...."], 32, 8);
        let mut r = renderer(32, 8, PlayerLayer::AfterEntities);
        r.toggle_debug();
        let frame = r.render(&world, Some((9, 1)));
        assert_eq!(frame.get(8, 0), DEBUG_TILE);
        assert_eq!(frame.get(15, 7), DEBUG_TILE);
        assert_eq!(frame.get(12, 4), colour(1, 0));
        assert_eq!(frame.get(7, 0), colour(1, 0));
    }

    #[test]
    fn debug_marks_the_pointer() {
        let world = world(&["...."], 32, 8);
        let mut r = renderer(32, 8, PlayerLayer::AfterEntities);
        r.toggle_debug();
        let frame = r.render(&world, Some((19, 2)));
        for (x, y) in [(19, 2), (21, 2), (19, 4), (21, 4), (20, 2), (21, 3)] {
            assert_eq!(frame.get(x, y), DEBUG_POINTER, "({x}, {y})");
        }
        assert_eq!(frame.get(20, 3), colour(1, 0));
        assert_eq!(frame.get(22, 3), colour(1, 0));
    }

    #[test]
    fn debug_ruler_ticks_every_fifty_world_pixels() {
        let row = ".".repeat(20);
        let mut world = world(&[row.as_str(); 10], 120, 60);
        world.camera.x = 10;
        world.camera.y = 20;
        let mut r = renderer(120, 60, PlayerLayer::AfterEntities);
        r.toggle_debug();
        let frame = r.render(&world, None);

        // top edge: world x 50 and 100 land on screen x 40 and 90
        for sx in [40, 90] {
            assert_eq!(frame.get(sx, 0), DEBUG_RULER);
            assert_eq!(frame.get(sx, RULER_TICK_LEN as usize - 1), DEBUG_RULER);
            assert_eq!(frame.get(sx, RULER_TICK_LEN as usize), colour(1, 0));
        }
        assert_eq!(frame.get(41, 0), colour(1, 0));

        // left edge: world y 50 lands on screen y 30
        assert_eq!(frame.get(0, 30), DEBUG_RULER);
        assert_eq!(frame.get(RULER_TICK_LEN as usize - 1, 30), DEBUG_RULER);
        assert_eq!(frame.get(RULER_TICK_LEN as usize, 30), colour(1, 0));
        assert_eq!(frame.get(0, 31), colour(1, 0));
    }

    #[test]
    fn ruler_hidden_without_debug() {
        let world = world(&["........"], 64, 8);
        let mut r = renderer(64, 8, PlayerLayer::AfterEntities);
        assert_eq!(r.render(&world, None).get(50, 0), colour(1, 0));
    }

    #[test]
    fn swimming_player_shows_top_half() {
        let mut world = world(&["~~~~", "~~~~"], 32, 16);
        world.level.add_player(0, 0);
        world.tick(FrameInput::default());
        let mut r = renderer(32, 16, PlayerLayer::AfterEntities);
        let frame = r.render(&world, None);
        assert_eq!(frame.get(3, 3), colour(1, 1));
        assert_eq!(frame.get(3, 4), colour(9, 0)); // water underneath
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let mut sheet = image::RgbaImage::new(2, 2);
        sheet.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let atlas = SpriteAtlas::from_image("s", &sheet, 1, 1).unwrap();
        let mut fb = FrameBuffer::new(4, 4);
        fb.clear(0xFF00_00FF);
        fb.blit_cell(&atlas, SheetCell::new(0, 0), -1, 0, 2, false);
        assert_eq!(fb.get(0, 0), 0xFFFF_0000);
        assert_eq!(fb.get(1, 0), 0xFF00_00FF);
        assert_eq!(fb.get(0, 2), 0xFF00_00FF);

        // mirrored: the opaque pixel lands on the right half
        fb.clear(0xFF00_00FF);
        fb.blit_cell(&atlas, SheetCell::new(0, 0), 0, 0, 2, true);
        assert_eq!(fb.get(1, 0), 0xFF00_00FF);
        assert_eq!(fb.get(2, 0), 0xFFFF_0000);
        assert_eq!(fb.get(3, 1), 0xFFFF_0000);
    }
}
