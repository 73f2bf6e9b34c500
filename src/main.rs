/// Entry point: load config and assets, build the world, run the loop.

mod config;
mod domain;
mod error;
mod game_loop;
mod sim;
mod ui;

use std::io::IsTerminal;
use std::sync::Arc;

use config::{GameConfig, SpawnKind, SpawnSteering};
use domain::entity::{EntitySprites, Steering};
use domain::tile::TileCatalog;
use error::AssetError;
use game_loop::{GameLoop, Simulation};
use sim::level::{Level, LevelSetup, GENERATED_SIZE};
use sim::world::World;
use ui::atlas::AtlasSet;
use ui::gamepad::GamepadState;
use ui::input::DeviceInput;
use ui::renderer::Renderer;
use ui::terminal::Terminal;

/// Log file used while the terminal is taken over by the game.
const LOG_FILE: &str = "tileworld.log";

fn main() {
    init_logging();
    let config = GameConfig::load();

    let (world, renderer) = match bootstrap(&config) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Startup failed: {e}");
            return;
        }
    };

    if let Err(e) = Terminal::enter() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut game = GameLoop::new(config.timing.clone());
    let pad_config = config.gamepad.clone();
    let result = game.start(move || {
        let mut pad = GamepadState::new();
        pad.load_button_config(&pad_config);
        Simulation {
            world,
            renderer,
            input: DeviceInput::new(pad),
            presenter: Terminal::new(),
        }
    });
    if result.is_ok() {
        game.join();
        log::info!(
            "session over: {} ticks, {} frames",
            game.stats().ticks(),
            game.stats().frames()
        );
    }

    if let Err(e) = Terminal::leave() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
}

/// `RUST_LOG` overrides the default `info` filter. Logs go to `LOG_FILE`
/// when stderr is the terminal the game draws on.
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if std::io::stderr().is_terminal() {
        match std::fs::File::create(LOG_FILE) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("could not create {LOG_FILE}: {e}"),
        }
    }
    builder.init();
}

/// Build the world and renderer from config. Any asset failure aborts.
fn bootstrap(config: &GameConfig) -> Result<(World, Renderer), AssetError> {
    let catalog = Arc::new(TileCatalog::standard()?);
    let atlases = AtlasSet::load_all(&config.assets.sheets)?;
    let tile_sheet = atlases.id_of(&config.assets.tile_sheet)?;

    let scale = config.display.tile_scale;
    let tile_size = atlases.tile_size(tile_sheet, scale)?;

    let sprites = &config.assets.sprites;
    let setup = LevelSetup {
        catalog,
        tile_size,
        sprites: EntitySprites {
            player: atlases.bind(&sprites.player, scale)?,
            coin: atlases.bind(&sprites.coin, scale)?,
            fireball: atlases.bind(&sprites.fireball, scale)?,
            tower: atlases.bind(&sprites.tower, scale)?,
            wumpus: atlases.bind(&sprites.wumpus, scale)?,
        },
        tuning: config.entities.clone(),
    };

    let mut level = match &config.assets.level {
        Some(path) if path.exists() => Level::load(path, setup)?,
        Some(path) => {
            log::warn!("level {} not found, generating one", path.display());
            Level::generated(GENERATED_SIZE, GENERATED_SIZE, setup)?
        }
        None => Level::generated(GENERATED_SIZE, GENERATED_SIZE, setup)?,
    };

    for edit in &config.tile_edits {
        let kind = level.catalog().by_name(&edit.tile).map(|k| (k.id(), k.name().to_string()));
        match kind {
            Some((id, name)) => {
                level.set_tile_at(edit.x, edit.y, id);
                log::debug!("tile ({}, {}) set to {name}", edit.x, edit.y);
            }
            None => log::warn!("unknown tile '{}' in tile_edits", edit.tile),
        }
    }

    if let Some(path) = &config.assets.export_level {
        level.save_image(path)?;
        log::info!("level image written to {}", path.display());
    }

    // player first, so fireballs spawned below can aim at it
    let (px, py) = config.entities.player_start;
    level.add_player(px, py);
    for s in &config.spawns {
        match s.kind {
            SpawnKind::Coin => level.add_coin(s.x, s.y, s.value.unwrap_or(config.entities.coin_value)),
            SpawnKind::Wumpus => match s.steering {
                SpawnSteering::Pursue => level.add_wumpus(s.x, s.y),
                SpawnSteering::Wander => {
                    let period = config.entities.wander_period;
                    level.add_wumpus_steered(s.x, s.y, Steering::Wander { period })
                }
                SpawnSteering::Toward { x, y } => {
                    level.add_wumpus_steered(s.x, s.y, Steering::TowardPoint { x, y })
                }
            },
            SpawnKind::Tower => level.add_tower(s.x, s.y),
            SpawnKind::Fireball => level.add_fireball(s.x, s.y),
        };
    }
    log::info!(
        "level ready: {}x{} tiles of {} px, {} entities",
        level.image_width(),
        level.image_height(),
        tile_size,
        level.entities().len()
    );

    let world = World::new(level, config.display.width, config.display.height);
    let renderer = Renderer::new(atlases, tile_sheet, &config.display);
    Ok((world, renderer))
}
