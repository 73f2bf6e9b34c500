/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Relative asset paths are resolved against the directory the config
/// file was found in.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub entities: EntityConfig,
    pub assets: AssetConfig,
    pub spawns: Vec<SpawnConfig>,
    pub tile_edits: Vec<TileEdit>,
    pub gamepad: GamepadConfig,
}

/// Whether the player is drawn before or after the other entities.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerLayer {
    BeforeEntities,
    AfterEntities,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    /// Viewport size in pixels.
    pub width: i32,
    pub height: i32,
    /// Tile display size = tile sheet cell size × this factor.
    pub tile_scale: i32,
    pub player_layer: PlayerLayer,
    pub debug: bool,
    pub clear_colour: u32,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub ticks_per_second: u32,
    pub idle_sleep_ms: u64,
    pub report_interval_ms: u64,
}

impl TimingConfig {
    pub fn step(&self) -> Duration {
        Duration::from_secs(1) / self.ticks_per_second.max(1)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }
}

#[derive(Clone, Debug)]
pub struct EntityConfig {
    pub player_speed: i32,
    pub player_start: (i32, i32),
    pub wumpus_speed: i32,
    pub fireball_speed: i32,
    /// Ticks a fireball lives before it burns out.
    pub fireball_lifetime: u32,
    /// Ticks between two fireballs from the same tower (minimum 1).
    pub tower_spawn_interval: u32,
    pub wander_period: u32,
    pub coin_value: u32,
    pub rng_seed: u64,
}

#[derive(Clone, Debug)]
pub struct AssetConfig {
    /// Level image. `None` (or a missing file) means a generated level.
    pub level: Option<PathBuf>,
    /// Write the level image here after tile edits are applied.
    pub export_level: Option<PathBuf>,
    /// Name of the sheet tiles are drawn from.
    pub tile_sheet: String,
    pub sheets: Vec<SheetConfig>,
    pub sprites: SpriteConfigs,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SheetConfig {
    pub name: String,
    pub path: PathBuf,
    pub rows: u32,
    pub cols: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpriteConfig {
    pub sheet: String,
    pub row: u32,
    pub cols: Vec<u32>,
    #[serde(default = "default_ticks_per_frame")]
    pub ticks_per_frame: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpriteConfigs {
    #[serde(default = "default_player_sprite")]
    pub player: SpriteConfig,
    #[serde(default = "default_coin_sprite")]
    pub coin: SpriteConfig,
    #[serde(default = "default_fireball_sprite")]
    pub fireball: SpriteConfig,
    #[serde(default = "default_tower_sprite")]
    pub tower: SpriteConfig,
    #[serde(default = "default_wumpus_sprite")]
    pub wumpus: SpriteConfig,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Coin,
    Wumpus,
    Tower,
    Fireball,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpawnConfig {
    pub kind: SpawnKind,
    pub x: i32,
    pub y: i32,
    /// Coin value; defaults to `entities.coin_value`.
    #[serde(default)]
    pub value: Option<u32>,
    /// Wumpus only: how it picks a heading. Defaults to pursuit.
    #[serde(default)]
    pub steering: SpawnSteering,
}

/// Steering for a configured wumpus. `toward` walks to a fixed world point,
/// `wander` re-rolls a random heading every `entities.wander_period` ticks.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum SpawnSteering {
    #[default]
    Pursue,
    Wander,
    Toward { x: i32, y: i32 },
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TileEdit {
    pub x: usize,
    pub y: usize,
    pub tile: String,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub quit: Vec<String>,
    pub debug: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    entities: TomlEntities,
    #[serde(default)]
    assets: TomlAssets,
    #[serde(default)]
    spawn: Vec<SpawnConfig>,
    #[serde(default)]
    tile_edits: Vec<TileEdit>,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_width")]
    width: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default = "default_tile_scale")]
    tile_scale: i32,
    #[serde(default = "default_player_layer")]
    player_layer: PlayerLayer,
    #[serde(default)]
    debug: bool,
    #[serde(default = "default_clear_colour")]
    clear_colour: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tps")]
    ticks_per_second: u32,
    #[serde(default = "default_idle_sleep")]
    idle_sleep_ms: u64,
    #[serde(default = "default_report_interval")]
    report_interval_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlEntities {
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    #[serde(default = "default_player_start")]
    player_start: [i32; 2],
    #[serde(default = "default_wumpus_speed")]
    wumpus_speed: i32,
    #[serde(default = "default_fireball_speed")]
    fireball_speed: i32,
    #[serde(default = "default_fireball_lifetime")]
    fireball_lifetime: u32,
    #[serde(default = "default_tower_interval")]
    tower_spawn_interval: u32,
    #[serde(default = "default_wander_period")]
    wander_period: u32,
    #[serde(default = "default_coin_value")]
    coin_value: u32,
    #[serde(default = "default_rng_seed")]
    rng_seed: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAssets {
    #[serde(default = "default_level")]
    level: Option<String>,
    #[serde(default)]
    export_level: Option<String>,
    #[serde(default = "default_tile_sheet")]
    tile_sheet: String,
    #[serde(default = "default_sheets")]
    sheets: Vec<SheetConfig>,
    #[serde(default = "default_sprites")]
    sprites: SpriteConfigs,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
    #[serde(default = "default_pad_debug")]
    debug: Vec<String>,
}

// ── Defaults ──

fn default_width() -> i32 { 480 }
fn default_height() -> i32 { 360 }   // 4:3
fn default_tile_scale() -> i32 { 2 }
fn default_player_layer() -> PlayerLayer { PlayerLayer::AfterEntities }
fn default_clear_colour() -> u32 { 0xFF00_0000 }

fn default_tps() -> u32 { 60 }
fn default_idle_sleep() -> u64 { 2 }
fn default_report_interval() -> u64 { 1000 }

fn default_player_speed() -> i32 { 2 }
fn default_player_start() -> [i32; 2] { [100, 100] }
fn default_wumpus_speed() -> i32 { 5 }
fn default_fireball_speed() -> i32 { 10 }
fn default_fireball_lifetime() -> u32 { 200 }
fn default_tower_interval() -> u32 { 60 }
fn default_wander_period() -> u32 { 60 }
fn default_coin_value() -> u32 { 10 }
fn default_rng_seed() -> u64 { 0x5EED }

fn default_level() -> Option<String> { Some("levels/water_test_level.png".into()) }
fn default_tile_sheet() -> String { "tiles".into() }
fn default_ticks_per_frame() -> u32 { 1 }

fn default_sheets() -> Vec<SheetConfig> {
    vec![
        SheetConfig { name: "tiles".into(), path: "assets/tilesheet.png".into(), rows: 19, cols: 20 },
        SheetConfig { name: "characters".into(), path: "assets/characters.png".into(), rows: 4, cols: 4 },
        SheetConfig { name: "dungeon".into(), path: "assets/dungeon_crawl.png".into(), rows: 48, cols: 64 },
    ]
}

fn sprite(sheet: &str, row: u32, cols: &[u32], ticks_per_frame: u32) -> SpriteConfig {
    SpriteConfig { sheet: sheet.into(), row, cols: cols.to_vec(), ticks_per_frame }
}

fn default_player_sprite() -> SpriteConfig { sprite("characters", 0, &[0, 1, 2, 3], 15) }
fn default_coin_sprite() -> SpriteConfig { sprite("tiles", 16, &[12], 1) }
fn default_fireball_sprite() -> SpriteConfig { sprite("dungeon", 6, &[37], 1) }
fn default_tower_sprite() -> SpriteConfig { sprite("dungeon", 11, &[44], 1) }
fn default_wumpus_sprite() -> SpriteConfig { sprite("dungeon", 4, &[0], 1) }

fn default_sprites() -> SpriteConfigs {
    SpriteConfigs {
        player: default_player_sprite(),
        coin: default_coin_sprite(),
        fireball: default_fireball_sprite(),
        tower: default_tower_sprite(),
        wumpus: default_wumpus_sprite(),
    }
}

fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_pad_debug() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            width: default_width(),
            height: default_height(),
            tile_scale: default_tile_scale(),
            player_layer: default_player_layer(),
            debug: false,
            clear_colour: default_clear_colour(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            ticks_per_second: default_tps(),
            idle_sleep_ms: default_idle_sleep(),
            report_interval_ms: default_report_interval(),
        }
    }
}

impl Default for TomlEntities {
    fn default() -> Self {
        TomlEntities {
            player_speed: default_player_speed(),
            player_start: default_player_start(),
            wumpus_speed: default_wumpus_speed(),
            fireball_speed: default_fireball_speed(),
            fireball_lifetime: default_fireball_lifetime(),
            tower_spawn_interval: default_tower_interval(),
            wander_period: default_wander_period(),
            coin_value: default_coin_value(),
            rng_seed: default_rng_seed(),
        }
    }
}

impl Default for TomlAssets {
    fn default() -> Self {
        TomlAssets {
            level: default_level(),
            export_level: None,
            tile_sheet: default_tile_sheet(),
            sheets: default_sheets(),
            sprites: default_sprites(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            quit: default_pad_quit(),
            debug: default_pad_debug(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), Path::new("."))
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_from(&candidate_dirs())
    }

    /// Parse config text. Relative paths are resolved against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, base))
    }

    fn from_toml(cfg: TomlConfig, base: &Path) -> Self {
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base.join(p) };

        GameConfig {
            display: DisplayConfig {
                width: cfg.display.width.max(1),
                height: cfg.display.height.max(1),
                tile_scale: cfg.display.tile_scale.max(1),
                player_layer: cfg.display.player_layer,
                debug: cfg.display.debug,
                clear_colour: cfg.display.clear_colour,
            },
            timing: TimingConfig {
                ticks_per_second: cfg.timing.ticks_per_second.max(1),
                idle_sleep_ms: cfg.timing.idle_sleep_ms,
                report_interval_ms: cfg.timing.report_interval_ms,
            },
            entities: EntityConfig {
                player_speed: cfg.entities.player_speed,
                player_start: (cfg.entities.player_start[0], cfg.entities.player_start[1]),
                wumpus_speed: cfg.entities.wumpus_speed,
                fireball_speed: cfg.entities.fireball_speed,
                fireball_lifetime: cfg.entities.fireball_lifetime,
                tower_spawn_interval: cfg.entities.tower_spawn_interval.max(1),
                wander_period: cfg.entities.wander_period.max(1),
                coin_value: cfg.entities.coin_value,
                rng_seed: cfg.entities.rng_seed,
            },
            assets: AssetConfig {
                level: cfg.assets.level.map(|l| resolve(Path::new(&l))),
                export_level: cfg.assets.export_level.map(|l| resolve(Path::new(&l))),
                tile_sheet: cfg.assets.tile_sheet,
                sheets: cfg.assets.sheets
                    .into_iter()
                    .map(|s| SheetConfig { path: resolve(&s.path), ..s })
                    .collect(),
                sprites: cfg.assets.sprites,
            },
            spawns: cfg.spawn,
            tile_edits: cfg.tile_edits,
            gamepad: GamepadConfig {
                quit: cfg.gamepad.quit,
                debug: cfg.gamepad.debug,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Returns the parsed config and the directory relative paths resolve against.
fn load_from(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match GameConfig::parse(&text, dir) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error: {e}");
                    log::warn!("using default settings");
                    return GameConfig::from_toml(TomlConfig::default(), dir);
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    let cwd = search_dirs.last().cloned().unwrap_or_else(|| PathBuf::from("."));
    GameConfig::from_toml(TomlConfig::default(), &cwd)
}
