/// Level: the decoded tile grid plus the live entities on it.
///
/// ## Source image
///
/// One pixel = one tile. Each pixel's ARGB colour is looked up in the
/// catalog's colour table; unknown colours decode to VOID. The image is
/// retained so tile edits can be written back and the level exported.
///
/// ## Coordinates
///
///   - tile coords  `(tx, ty)`  index the grid / source image
///   - world coords `(x, y)`    pixels, `tile = world / tile_size`
///
/// Anything outside the grid is VOID in both systems.
///
/// ## Entities
///
/// The player is held apart from `entities` so it can be found without a
/// search. Entities are created only through the `add_*` factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::config::EntityConfig;
use crate::domain::ai;
use crate::domain::entity::{
    Body, Coin, Entity, EntityId, EntityKind, EntitySprites, Fireball, Motion, Player, Steering,
    Tower, Wumpus,
};
use crate::domain::physics::MapView;
use crate::domain::tile::{standard, TileAnimations, TileCatalog, TileId, TileKind};
use crate::error::AssetError;

/// Edge length, in tiles, of the generated fallback level.
pub const GENERATED_SIZE: u32 = 64;

/// Everything a level needs besides its image.
#[derive(Clone, Debug)]
pub struct LevelSetup {
    pub catalog: Arc<TileCatalog>,
    /// World pixels per tile edge.
    pub tile_size: i32,
    pub sprites: EntitySprites,
    pub tuning: EntityConfig,
}

pub struct Level {
    pub(super) catalog: Arc<TileCatalog>,
    pub(super) tiles: Vec<Vec<TileId>>,
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) tile_size: i32,
    image: RgbaImage,

    pub(super) animations: TileAnimations,
    pub(super) player: Option<Entity>,
    pub(super) entities: Vec<Entity>,
    sprites: EntitySprites,
    pub(super) tuning: EntityConfig,
    pub(super) rng: fastrand::Rng,
    next_id: u32,
    pub(super) tick: u64,
}

// ══════════════════════════════════════════════════════════════
// Colour helpers
// ══════════════════════════════════════════════════════════════

/// Pixel → packed `0xAARRGGBB`.
pub fn argb_of(px: Rgba<u8>) -> u32 {
    let [r, g, b, a] = px.0;
    u32::from_be_bytes([a, r, g, b])
}

/// Packed `0xAARRGGBB` → pixel.
pub fn pixel_of(argb: u32) -> Rgba<u8> {
    let [a, r, g, b] = argb.to_be_bytes();
    Rgba([r, g, b, a])
}

/// Decode a level image into a tile grid, `grid[y][x]`.
pub fn decode_tiles(image: &RgbaImage, catalog: &TileCatalog) -> Vec<Vec<TileId>> {
    (0..image.height())
        .map(|y| {
            (0..image.width())
                .map(|x| catalog.id_for_colour(argb_of(*image.get_pixel(x, y))))
                .collect()
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════

impl Level {
    /// Load and decode a level image from disk.
    pub fn load(path: &Path, setup: LevelSetup) -> Result<Self, AssetError> {
        let image = image::open(path)
            .map_err(|source| AssetError::Image { path: path.to_path_buf(), source })?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::EmptyLevel(path.to_path_buf()));
        }
        let level = Level::from_image(image, setup)?;
        log::info!(
            "loaded level {} ({}x{} tiles)",
            path.display(),
            level.width,
            level.height
        );
        Ok(level)
    }

    /// Decode an in-memory level image.
    pub fn from_image(image: RgbaImage, setup: LevelSetup) -> Result<Self, AssetError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::EmptyLevel(PathBuf::from("<memory>")));
        }
        let tiles = decode_tiles(&image, &setup.catalog);
        let seed = setup.tuning.rng_seed;
        Ok(Level {
            animations: TileAnimations::new(&setup.catalog),
            width: image.width() as usize,
            height: image.height() as usize,
            tile_size: setup.tile_size.max(1),
            catalog: setup.catalog,
            tiles,
            image,
            player: None,
            entities: Vec::new(),
            sprites: setup.sprites,
            tuning: setup.tuning,
            rng: fastrand::Rng::with_seed(seed),
            next_id: 0,
            tick: 0,
        })
    }

    /// A `width`×`height` level: grass where `x*y % 10 < 7`, stone elsewhere.
    pub fn generated(width: u32, height: u32, setup: LevelSetup) -> Result<Self, AssetError> {
        let grass = setup.catalog.get(standard::GRASS).level_colour();
        let stone = setup.catalog.get(standard::STONE).level_colour();
        let image = RgbaImage::from_fn(width, height, |x, y| {
            pixel_of(if x * y % 10 < 7 { grass } else { stone })
        });
        Level::from_image(image, setup)
    }
}

// ══════════════════════════════════════════════════════════════
// Tile queries / edits
// ══════════════════════════════════════════════════════════════

impl Level {
    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn map_view(&self) -> MapView<'_> {
        MapView {
            tiles: &self.tiles,
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
            catalog: &self.catalog,
        }
    }

    /// Kind at tile coordinates; VOID outside the grid.
    pub fn tile_at_tile(&self, tx: i32, ty: i32) -> &TileKind {
        self.map_view().kind_at_tile(tx, ty)
    }

    /// Kind under a world pixel; VOID outside the level.
    pub fn tile_at_world(&self, x: i32, y: i32) -> &TileKind {
        self.map_view().kind_at_world(x, y)
    }

    /// Replace a tile and write its colour back into the source image.
    /// Out-of-grid edits are ignored.
    pub fn set_tile_at(&mut self, tx: usize, ty: usize, id: TileId) {
        if tx >= self.width || ty >= self.height {
            log::debug!("ignoring tile edit outside level at ({tx}, {ty})");
            return;
        }
        self.tiles[ty][tx] = id;
        let colour = self.catalog.get(id).level_colour();
        self.image.put_pixel(tx as u32, ty as u32, pixel_of(colour));
    }

    /// Write the (possibly edited) source image as PNG.
    pub fn save_image(&self, path: &Path) -> Result<(), AssetError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| AssetError::Write { path: path.to_path_buf(), source })
    }

    /// Grid width in tiles.
    pub fn image_width(&self) -> usize {
        self.width
    }

    /// Grid height in tiles.
    pub fn image_height(&self) -> usize {
        self.height
    }

    /// World extent in pixels.
    pub fn level_width(&self) -> i32 {
        self.width as i32 * self.tile_size
    }

    pub fn level_height(&self) -> i32 {
        self.height as i32 * self.tile_size
    }

    pub fn tile_display_size(&self) -> i32 {
        self.tile_size
    }

    pub fn animations(&self) -> &TileAnimations {
        &self.animations
    }
}

// ══════════════════════════════════════════════════════════════
// Entities
// ══════════════════════════════════════════════════════════════

impl Level {
    pub fn player(&self) -> Option<&Entity> {
        self.player.as_ref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place the player. Replaces any previous player.
    pub fn add_player(&mut self, x: i32, y: i32) -> EntityId {
        let id = self.alloc_id();
        let kind = EntityKind::Player(Player::new(self.tuning.player_speed));
        self.player = Some(Entity::new(id, x, y, self.sprites.player.clone(), kind));
        id
    }

    pub fn add_coin(&mut self, x: i32, y: i32, value: u32) -> EntityId {
        let id = self.alloc_id();
        let kind = EntityKind::Coin(Coin { value });
        self.entities.push(Entity::new(id, x, y, self.sprites.coin.clone(), kind));
        id
    }

    /// A wumpus that hunts the player.
    pub fn add_wumpus(&mut self, x: i32, y: i32) -> EntityId {
        self.add_wumpus_steered(x, y, Steering::PursuePlayer)
    }

    pub fn add_wumpus_steered(&mut self, x: i32, y: i32, steering: Steering) -> EntityId {
        let id = self.alloc_id();
        let kind = EntityKind::Wumpus(Wumpus {
            motion: Motion::new(self.tuning.wumpus_speed),
            steering,
        });
        self.entities.push(Entity::new(id, x, y, self.sprites.wumpus.clone(), kind));
        id
    }

    /// A fireball aimed at the player's centre as it is now.
    /// With no live player it heads east.
    pub fn add_fireball(&mut self, x: i32, y: i32) -> EntityId {
        let sprite = &self.sprites.fireball;
        let me = Body::new(x, y, sprite.width, sprite.height);
        let heading = self
            .player
            .as_ref()
            .filter(|p| p.alive)
            .map_or(0.0, |p| ai::angle_between(&me, &p.body));
        self.add_fireball_heading(x, y, heading)
    }

    pub fn add_fireball_heading(&mut self, x: i32, y: i32, heading: f64) -> EntityId {
        let id = self.alloc_id();
        let kind = EntityKind::Fireball(Fireball {
            motion: Motion::new(self.tuning.fireball_speed),
            heading,
            ticks_left: self.tuning.fireball_lifetime.max(1),
        });
        self.entities.push(Entity::new(id, x, y, self.sprites.fireball.clone(), kind));
        id
    }

    pub fn add_tower(&mut self, x: i32, y: i32) -> EntityId {
        let id = self.alloc_id();
        let kind = EntityKind::Tower(Tower::new(self.tuning.tower_spawn_interval));
        self.entities.push(Entity::new(id, x, y, self.sprites.tower.clone(), kind));
        id
    }
}
