/// Typed load errors.
///
/// Resource loads fail fast: a level or sprite atlas that cannot be decoded
/// is never constructed. Out-of-bounds tile queries and unknown level colours
/// are NOT errors (they resolve to the VOID tile).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("sprite sheet '{name}' is {width}x{height} px and cannot be split into {rows}x{cols} cells")]
    BadGrid {
        name: String,
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },

    #[error("tile sheet '{name}' has {width}x{height} px cells; tiles must be square")]
    NonSquareTiles { name: String, width: u32, height: u32 },

    #[error("unknown sprite sheet '{0}'")]
    UnknownSheet(String),

    #[error("sprite cell ({row}, {col}) is outside sheet '{sheet}'")]
    CellOutOfRange { sheet: String, row: u32, col: u32 },

    #[error("level image {0} has no pixels")]
    EmptyLevel(PathBuf),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tile '{new}' reuses level colour {colour:#010X} already taken by '{existing}'")]
    DuplicateColour {
        colour: u32,
        existing: String,
        new: String,
    },

    #[error("tile '{0}' has no display frames")]
    NoFrames(String),
}
