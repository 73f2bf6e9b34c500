/// Tile kinds and the catalog that assigns their ids.
///
/// Tile semantics (solidity, level colour, display rule) live in one place:
/// the `TileCatalog`. The tile grid only stores `TileId`s, and every lookup
/// of an unknown id or colour resolves to VOID, the catalog's first entry.
///
/// Catalogs are built once at startup through `TileCatalogBuilder` and
/// shared by reference afterwards. Ids are assigned in registration order.

use std::collections::HashMap;

use crate::error::CatalogError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TileId(pub u16);

impl TileId {
    /// VOID is always registered first.
    pub const VOID: TileId = TileId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A cell in a sprite sheet, addressed by grid row and column (not pixels).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SheetCell {
    pub row: u32,
    pub col: u32,
}

impl SheetCell {
    pub const fn new(row: u32, col: u32) -> Self {
        SheetCell { row, col }
    }
}

/// How a tile kind is drawn.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TileDisplay {
    /// Cells drawn on top of each other, first cell at the bottom.
    /// Put the opaque cell first and transparent overlays after it.
    Layers(Vec<SheetCell>),
    /// One frame at a time, advancing every `ticks_per_frame` ticks.
    Animated {
        frames: Vec<SheetCell>,
        ticks_per_frame: u32,
    },
}

impl TileDisplay {
    fn cells(&self) -> &[SheetCell] {
        match self {
            TileDisplay::Layers(cells) => cells,
            TileDisplay::Animated { frames, .. } => frames,
        }
    }
}

/// An unregistered tile definition. Registration turns it into a `TileKind`.
#[derive(Clone, Debug)]
pub struct TileDef {
    pub name: String,
    pub solid: bool,
    pub emitter: bool,
    pub liquid: bool,
    pub level_colour: u32,
    pub display: TileDisplay,
}

impl TileDef {
    /// Walkable tile drawn from a single sheet cell.
    pub fn basic(name: &str, row: u32, col: u32, level_colour: u32) -> Self {
        Self::layered(name, &[(row, col)], level_colour)
    }

    /// Solid tile drawn from a single sheet cell.
    pub fn solid(name: &str, row: u32, col: u32, level_colour: u32) -> Self {
        TileDef { solid: true, ..Self::basic(name, row, col, level_colour) }
    }

    /// Walkable tile built from stacked layers.
    pub fn layered(name: &str, cells: &[(u32, u32)], level_colour: u32) -> Self {
        TileDef {
            name: name.to_string(),
            solid: false,
            emitter: false,
            liquid: false,
            level_colour,
            display: TileDisplay::Layers(
                cells.iter().map(|&(r, c)| SheetCell::new(r, c)).collect(),
            ),
        }
    }

    /// Walkable tile that cycles through frames.
    pub fn animated(name: &str, cells: &[(u32, u32)], level_colour: u32, ticks_per_frame: u32) -> Self {
        TileDef {
            name: name.to_string(),
            solid: false,
            emitter: false,
            liquid: false,
            level_colour,
            display: TileDisplay::Animated {
                frames: cells.iter().map(|&(r, c)| SheetCell::new(r, c)).collect(),
                ticks_per_frame: ticks_per_frame.max(1),
            },
        }
    }
}

/// A registered tile kind. Immutable once the catalog is built.
#[derive(Clone, Debug)]
pub struct TileKind {
    id: TileId,
    name: String,
    solid: bool,
    emitter: bool,
    liquid: bool,
    level_colour: u32,
    display: TileDisplay,
}

impl TileKind {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Does this tile block entity movement?
    pub fn is_solid(&self) -> bool {
        self.solid
    }

    /// Can the player swim in it?
    pub fn is_liquid(&self) -> bool {
        self.liquid
    }

    /// Reserved capability flag. Nothing emits yet.
    #[allow(dead_code)]
    pub fn is_emitter(&self) -> bool {
        self.emitter
    }

    /// ARGB colour identifying this kind in a level image.
    pub fn level_colour(&self) -> u32 {
        self.level_colour
    }

    pub fn display(&self) -> &TileDisplay {
        &self.display
    }

    /// Cells to draw this frame, bottom layer first.
    /// `frame` is the kind's current animation index (ignored for layers).
    pub fn cells_to_draw(&self, frame: usize) -> &[SheetCell] {
        match &self.display {
            TileDisplay::Layers(cells) => cells,
            TileDisplay::Animated { frames, .. } => {
                let i = frame % frames.len();
                &frames[i..=i]
            }
        }
    }
}

// ── Builder ──

pub struct TileCatalogBuilder {
    kinds: Vec<TileKind>,
    by_colour: HashMap<u32, TileId>,
}

impl TileCatalogBuilder {
    /// Start a catalog. `void` becomes id 0 and is forced solid.
    pub fn new(void: TileDef) -> Result<Self, CatalogError> {
        let mut builder = TileCatalogBuilder {
            kinds: Vec::new(),
            by_colour: HashMap::new(),
        };
        builder.register(TileDef { solid: true, ..void })?;
        Ok(builder)
    }

    pub fn register(&mut self, def: TileDef) -> Result<TileId, CatalogError> {
        if def.display.cells().is_empty() {
            return Err(CatalogError::NoFrames(def.name));
        }
        if let Some(existing) = self.by_colour.get(&def.level_colour) {
            return Err(CatalogError::DuplicateColour {
                colour: def.level_colour,
                existing: self.kinds[existing.index()].name.clone(),
                new: def.name,
            });
        }

        let id = TileId(self.kinds.len() as u16);
        self.by_colour.insert(def.level_colour, id);
        self.kinds.push(TileKind {
            id,
            name: def.name,
            solid: def.solid,
            emitter: def.emitter,
            liquid: def.liquid,
            level_colour: def.level_colour,
            display: def.display,
        });
        Ok(id)
    }

    pub fn build(self) -> TileCatalog {
        TileCatalog {
            kinds: self.kinds,
            by_colour: self.by_colour,
        }
    }
}

// ── Catalog ──

/// Ids of the kinds registered by `TileCatalog::standard()`.
#[allow(dead_code)]
pub mod standard {
    use super::TileId;

    pub const VOID: TileId = TileId(0);
    pub const STONE: TileId = TileId(1);
    pub const GRASS: TileId = TileId(2);
    pub const GRASS2: TileId = TileId(3);
    pub const WATER: TileId = TileId(4);
}

/// Water frame period in ticks (one second at 60 ticks/s).
const WATER_FRAME_TICKS: u32 = 60;

#[derive(Debug)]
pub struct TileCatalog {
    kinds: Vec<TileKind>,
    by_colour: HashMap<u32, TileId>,
}

impl TileCatalog {
    /// The built-in tile set, ids as in `standard`.
    pub fn standard() -> Result<Self, CatalogError> {
        let mut b = TileCatalogBuilder::new(TileDef::solid("void", 4, 0, 0xFF00_0000))?;
        b.register(TileDef::solid("stone", 10, 8, 0xFF55_5555))?;
        b.register(TileDef::basic("grass", 1, 0, 0xFF00_FF00))?;
        b.register(TileDef::layered("grass2", &[(1, 0), (11, 1)], 0x00FF_00FF))?;
        b.register(TileDef {
            liquid: true,
            ..TileDef::animated("water", &[(9, 0), (0, 1)], 0xFF00_00FF, WATER_FRAME_TICKS)
        })?;
        Ok(b.build())
    }

    /// Kind for `id`. Unknown ids resolve to VOID.
    pub fn get(&self, id: TileId) -> &TileKind {
        self.kinds.get(id.index()).unwrap_or(&self.kinds[0])
    }

    pub fn void(&self) -> &TileKind {
        &self.kinds[0]
    }

    /// Id for a level-image colour. Unregistered colours resolve to VOID.
    pub fn id_for_colour(&self, colour: u32) -> TileId {
        self.by_colour.get(&colour).copied().unwrap_or(TileId::VOID)
    }

    pub fn by_name(&self, name: &str) -> Option<&TileKind> {
        self.kinds.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileKind> {
        self.kinds.iter()
    }
}

// ── Animation state ──

/// Per-kind animation counters, advanced once per simulation tick.
/// Static kinds stay at frame 0.
#[derive(Clone, Debug)]
pub struct TileAnimations {
    frame: Vec<usize>,
    elapsed: Vec<u32>,
}

impl TileAnimations {
    pub fn new(catalog: &TileCatalog) -> Self {
        TileAnimations {
            frame: vec![0; catalog.len()],
            elapsed: vec![0; catalog.len()],
        }
    }

    pub fn tick(&mut self, catalog: &TileCatalog) {
        for kind in catalog.iter() {
            if let TileDisplay::Animated { frames, ticks_per_frame } = kind.display() {
                let i = kind.id().index();
                self.elapsed[i] += 1;
                if self.elapsed[i] >= *ticks_per_frame {
                    self.elapsed[i] = 0;
                    self.frame[i] = (self.frame[i] + 1) % frames.len();
                }
            }
        }
    }

    pub fn frame_of(&self, id: TileId) -> usize {
        self.frame.get(id.index()).copied().unwrap_or(0)
    }
}
