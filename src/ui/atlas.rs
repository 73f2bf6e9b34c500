/// Sprite sheets: decoded pixels split into a fixed grid of equal cells.
///
/// Cell size = image size / grid counts (integer division; any remainder
/// on the right or bottom edge is never drawn). Cells are addressed by
/// `(row, col)` or by the flattened index `row * cols + col`.
///
/// Pixels are stored as packed `0xAARRGGBB`, the same format the level
/// decoder and the frame buffer use.

use std::path::Path;

use image::RgbaImage;

use crate::config::{SheetConfig, SpriteConfig};
use crate::domain::entity::{SheetId, SpriteBinding};
use crate::domain::tile::SheetCell;
use crate::error::AssetError;
use crate::sim::level::argb_of;

/// Cell edge of a generated placeholder sheet.
const FALLBACK_CELL: u32 = 8;

#[derive(Clone, Debug)]
pub struct SpriteAtlas {
    name: String,
    width: u32,
    rows: u32,
    cols: u32,
    cell_w: u32,
    cell_h: u32,
    pixels: Vec<u32>,
}

impl SpriteAtlas {
    pub fn load(name: &str, path: &Path, rows: u32, cols: u32) -> Result<Self, AssetError> {
        let image = image::open(path)
            .map_err(|source| AssetError::Image { path: path.to_path_buf(), source })?
            .to_rgba8();
        let atlas = SpriteAtlas::from_image(name, &image, rows, cols)?;
        log::info!(
            "sheet '{}' {}: {}x{} px, {}x{} cells of {}x{}",
            atlas.name,
            path.display(),
            image.width(),
            image.height(),
            rows,
            cols,
            atlas.cell_w,
            atlas.cell_h
        );
        Ok(atlas)
    }

    pub fn from_image(name: &str, image: &RgbaImage, rows: u32, cols: u32) -> Result<Self, AssetError> {
        let (width, height) = image.dimensions();
        let bad_grid = || AssetError::BadGrid {
            name: name.to_string(),
            width,
            height,
            rows,
            cols,
        };
        if rows == 0 || cols == 0 {
            return Err(bad_grid());
        }
        let (cell_w, cell_h) = (width / cols, height / rows);
        if cell_w == 0 || cell_h == 0 {
            return Err(bad_grid());
        }
        if width % cols != 0 || height % rows != 0 {
            log::warn!("sheet '{name}' does not divide evenly into {rows}x{cols} cells");
        }

        Ok(SpriteAtlas {
            name: name.to_string(),
            width,
            rows,
            cols,
            cell_w,
            cell_h,
            pixels: image.pixels().map(|p| argb_of(*p)).collect(),
        })
    }

    /// A placeholder sheet with the configured grid. Each cell is a solid
    /// square, coloured from its flattened index, inside a transparent
    /// 1 px border.
    pub fn generated(name: &str, rows: u32, cols: u32) -> Result<Self, AssetError> {
        let blank = RgbaImage::new(
            cols.saturating_mul(FALLBACK_CELL),
            rows.saturating_mul(FALLBACK_CELL),
        );
        let mut atlas = SpriteAtlas::from_image(name, &blank, rows, cols)?;
        let mut index = 0;
        while let Some(cell) = atlas.cell_by_index(index) {
            atlas.fill_cell(cell, placeholder_colour(index));
            index += 1;
        }
        Ok(atlas)
    }

    fn fill_cell(&mut self, cell: SheetCell, argb: u32) {
        for py in 1..self.cell_h.saturating_sub(1) {
            for px in 1..self.cell_w.saturating_sub(1) {
                let x = cell.col * self.cell_w + px;
                let y = cell.row * self.cell_h + py;
                self.pixels[(y * self.width + x) as usize] = argb;
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_w
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_h
    }

    pub fn contains(&self, cell: SheetCell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Flattened index of a cell.
    pub fn id_for(&self, row: u32, col: u32) -> u32 {
        row * self.cols + col
    }

    /// Inverse of `id_for`. `None` past the last cell.
    pub fn cell_by_index(&self, index: u32) -> Option<SheetCell> {
        if index >= self.rows * self.cols {
            return None;
        }
        Some(SheetCell::new(index / self.cols, index % self.cols))
    }

    /// Pixel `(px, py)` inside `cell`. Transparent outside the cell or sheet.
    #[inline]
    pub fn pixel(&self, cell: SheetCell, px: u32, py: u32) -> u32 {
        if !self.contains(cell) || px >= self.cell_w || py >= self.cell_h {
            return 0;
        }
        let x = cell.col * self.cell_w + px;
        let y = cell.row * self.cell_h + py;
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Opaque, never too dark, and distinct for neighbouring indices.
fn placeholder_colour(index: u32) -> u32 {
    0xFF40_4040 | ((index.wrapping_mul(0x9E37_79B9) >> 8) & 0x00BF_BFBF)
}

// ── AtlasSet ──

/// All loaded sheets, indexed by `SheetId`.
#[derive(Clone, Debug, Default)]
pub struct AtlasSet {
    atlases: Vec<SpriteAtlas>,
}

impl AtlasSet {
    pub fn load_all(sheets: &[SheetConfig]) -> Result<Self, AssetError> {
        let mut set = AtlasSet::default();
        for s in sheets {
            let atlas = if s.path.exists() {
                SpriteAtlas::load(&s.name, &s.path, s.rows, s.cols)?
            } else {
                log::warn!(
                    "sheet '{}' not found at {}, drawing placeholders instead",
                    s.name,
                    s.path.display()
                );
                SpriteAtlas::generated(&s.name, s.rows, s.cols)?
            };
            set.push(atlas);
        }
        Ok(set)
    }

    pub fn push(&mut self, atlas: SpriteAtlas) -> SheetId {
        self.atlases.push(atlas);
        SheetId(self.atlases.len() - 1)
    }

    pub fn get(&self, id: SheetId) -> Option<&SpriteAtlas> {
        self.atlases.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Result<SheetId, AssetError> {
        self.atlases
            .iter()
            .position(|a| a.name() == name)
            .map(SheetId)
            .ok_or_else(|| AssetError::UnknownSheet(name.to_string()))
    }

    /// On-screen edge of one tile drawn from sheet `id`. Tiles must be square.
    pub fn tile_size(&self, id: SheetId, scale: i32) -> Result<i32, AssetError> {
        let atlas = self.atlases.get(id.0).ok_or_else(|| AssetError::UnknownSheet(format!("#{}", id.0)))?;
        if atlas.cell_w != atlas.cell_h {
            return Err(AssetError::NonSquareTiles {
                name: atlas.name.clone(),
                width: atlas.cell_w,
                height: atlas.cell_h,
            });
        }
        Ok(atlas.cell_w as i32 * scale)
    }

    /// Resolve a configured sprite into a binding. The bounding box is the
    /// cell size times `scale`.
    pub fn bind(&self, sprite: &SpriteConfig, scale: i32) -> Result<SpriteBinding, AssetError> {
        let id = self.id_of(&sprite.sheet)?;
        let atlas = &self.atlases[id.0];
        if sprite.cols.is_empty() {
            return Err(AssetError::CellOutOfRange { sheet: sprite.sheet.clone(), row: sprite.row, col: 0 });
        }
        for &col in &sprite.cols {
            if !atlas.contains(SheetCell::new(sprite.row, col)) {
                return Err(AssetError::CellOutOfRange { sheet: sprite.sheet.clone(), row: sprite.row, col });
            }
        }
        log::debug!(
            "sprite on '{}' uses cells {:?}",
            sprite.sheet,
            sprite.cols.iter().map(|&col| atlas.id_for(sprite.row, col)).collect::<Vec<_>>()
        );
        Ok(SpriteBinding::cycle(
            id,
            sprite.row,
            &sprite.cols,
            sprite.ticks_per_frame,
            atlas.cell_w as i32 * scale,
            atlas.cell_h as i32 * scale,
        ))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::sim::level::pixel_of;

    /// A sheet whose every cell is filled with `0xFF000000 | flattened index`.
    pub fn numbered_sheet(name: &str, rows: u32, cols: u32, cell: u32) -> SpriteAtlas {
        let image = RgbaImage::from_fn(cols * cell, rows * cell, |x, y| {
            pixel_of(0xFF00_0000 | ((y / cell) * cols + x / cell))
        });
        SpriteAtlas::from_image(name, &image, rows, cols).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::numbered_sheet;
    use super::*;

    #[test]
    fn cell_size_is_image_over_grid() {
        let atlas = numbered_sheet("t", 3, 4, 8);
        assert_eq!((atlas.cell_width(), atlas.cell_height()), (8, 8));
    }

    #[test]
    fn flattened_index_round_trips() {
        let atlas = numbered_sheet("t", 3, 4, 2);
        assert_eq!(atlas.id_for(2, 1), 9);
        assert_eq!(atlas.cell_by_index(9), Some(SheetCell::new(2, 1)));
        assert_eq!(atlas.cell_by_index(12), None);
    }

    #[test]
    fn pixels_come_from_the_right_cell() {
        let atlas = numbered_sheet("t", 3, 4, 2);
        assert_eq!(atlas.pixel(SheetCell::new(1, 2), 1, 1), 0xFF00_0006);
        assert_eq!(atlas.pixel(SheetCell::new(1, 2), 2, 0), 0);
        assert_eq!(atlas.pixel(SheetCell::new(3, 0), 0, 0), 0);
    }

    #[test]
    fn zero_sized_cells_rejected() {
        let image = RgbaImage::new(4, 4);
        assert!(matches!(
            SpriteAtlas::from_image("tiny", &image, 8, 1),
            Err(AssetError::BadGrid { .. })
        ));
        assert!(SpriteAtlas::from_image("none", &image, 0, 1).is_err());
    }

    #[test]
    fn load_reads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        RgbaImage::from_pixel(20, 10, image::Rgba([1, 2, 3, 255])).save(&path).unwrap();
        let atlas = SpriteAtlas::load("sheet", &path, 1, 2).unwrap();
        assert_eq!(atlas.cell_width(), 10);
        assert_eq!(atlas.pixel(SheetCell::new(0, 1), 9, 9), 0xFF01_0203);
    }

    #[test]
    fn missing_sheet_falls_back_to_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let sheets = [SheetConfig { name: "tiles".into(), path: dir.path().join("gone.png"), rows: 3, cols: 5 }];
        let set = AtlasSet::load_all(&sheets).unwrap();
        let atlas = set.get(set.id_of("tiles").unwrap()).unwrap();
        assert_eq!((atlas.cell_width(), atlas.cell_height()), (FALLBACK_CELL, FALLBACK_CELL));
        assert!(atlas.contains(SheetCell::new(2, 4)));
        assert!(!atlas.contains(SheetCell::new(3, 0)));

        let last = SheetCell::new(2, 4);
        assert_eq!(atlas.pixel(last, 0, 0), 0);
        assert_eq!(atlas.pixel(last, 1, 1), placeholder_colour(14));
        assert_ne!(placeholder_colour(13), placeholder_colour(14));
        assert_eq!(placeholder_colour(14) >> 24, 0xFF);
    }

    #[test]
    fn unreadable_sheet_is_still_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let sheets = [SheetConfig { name: "tiles".into(), path, rows: 1, cols: 1 }];
        assert!(matches!(AtlasSet::load_all(&sheets), Err(AssetError::Image { .. })));
    }

    #[test]
    fn tile_size_needs_square_cells() {
        let mut set = AtlasSet::default();
        let square = set.push(numbered_sheet("tiles", 2, 2, 4));
        let wide = set.push(SpriteAtlas::from_image("wide", &RgbaImage::new(16, 4), 1, 2).unwrap());
        assert_eq!(set.tile_size(square, 3).unwrap(), 12);
        assert!(matches!(
            set.tile_size(wide, 3),
            Err(AssetError::NonSquareTiles { width: 8, height: 4, .. })
        ));
    }

    #[test]
    fn bind_checks_sheet_and_cells() {
        let mut set = AtlasSet::default();
        set.push(numbered_sheet("tiles", 2, 2, 4));
        let ok = SpriteConfig { sheet: "tiles".into(), row: 1, cols: vec![0, 1], ticks_per_frame: 5 };
        let b = set.bind(&ok, 2).unwrap();
        assert_eq!((b.width, b.height), (8, 8));
        assert_eq!(b.frames.len(), 2);

        let bad_col = SpriteConfig { cols: vec![2], ..ok.clone() };
        assert!(matches!(set.bind(&bad_col, 2), Err(AssetError::CellOutOfRange { col: 2, .. })));

        let bad_sheet = SpriteConfig { sheet: "nope".into(), ..ok };
        assert!(matches!(set.bind(&bad_sheet, 2), Err(AssetError::UnknownSheet(_))));
    }
}
