/// Collision engine — pure functions over tile geometry and bounding boxes.
///
/// ## Two independent checks
///
///   1. TILE  — would a body, shifted by a candidate delta, have any of its
///      four corner pixels inside a solid tile? If so the move is rejected
///      in full (no partial slide within one axis).
///   2. OVERLAP — do two bodies intersect? Closed intervals on both axes,
///      so boxes that only share an edge count as hitting.
///
/// ## Movement
///
/// A move by `(dx, dy)` with both components non-zero is split into
/// `(dx, 0)` then `(0, dy)`. Each axis is checked against the grid as it is
/// after the previous axis was applied, so a diagonal move into a wall still
/// slides along the open axis.
///
/// Anything outside the grid is VOID, which is solid.

use super::entity::Body;
use super::tile::{TileCatalog, TileId, TileKind};

/// Read-only view of a tile grid, enough for collision queries.
#[derive(Clone, Copy)]
pub struct MapView<'a> {
    pub tiles: &'a [Vec<TileId>],
    pub width: usize,
    pub height: usize,
    /// World pixels per tile edge.
    pub tile_size: i32,
    pub catalog: &'a TileCatalog,
}

impl<'a> MapView<'a> {
    /// Kind at grid cell `(tx, ty)`; VOID outside the grid.
    #[inline]
    pub fn kind_at_tile(&self, tx: i32, ty: i32) -> &'a TileKind {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return self.catalog.void();
        }
        self.catalog.get(self.tiles[ty as usize][tx as usize])
    }

    /// Kind under world pixel `(x, y)`; VOID outside the level.
    #[inline]
    pub fn kind_at_world(&self, x: i32, y: i32) -> &'a TileKind {
        if x < 0 || y < 0 {
            return self.catalog.void();
        }
        self.kind_at_tile(x / self.tile_size, y / self.tile_size)
    }

    #[inline]
    pub fn is_solid_at_world(&self, x: i32, y: i32) -> bool {
        self.kind_at_world(x, y).is_solid()
    }
}

// ══════════════════════════════════════════════════════════════
// Overlap
// ══════════════════════════════════════════════════════════════

/// Closed-interval overlap: touching endpoints overlap.
#[inline]
pub fn intervals_overlap(low1: i32, high1: i32, low2: i32, high2: i32) -> bool {
    !(high1 < low2 || high2 < low1)
}

/// Do two bounding boxes intersect? Symmetric in its arguments.
#[inline]
pub fn is_hitting(a: &Body, b: &Body) -> bool {
    intervals_overlap(a.left_x(), a.right_x(), b.left_x(), b.right_x())
        && intervals_overlap(a.top_y(), a.bottom_y(), b.top_y(), b.bottom_y())
}

// ══════════════════════════════════════════════════════════════
// Tile probing
// ══════════════════════════════════════════════════════════════

/// Would `body`, moved by `(dx, dy)`, touch a solid tile at any corner?
pub fn would_collide_with_tile(map: &MapView, body: &Body, dx: i32, dy: i32) -> bool {
    body.shifted_corners(dx, dy)
        .iter()
        .any(|&(x, y)| map.is_solid_at_world(x, y))
}

/// Which axes of a requested move were applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Moved {
    pub x: bool,
    pub y: bool,
}

impl Moved {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// Apply a single-axis move if the destination is clear.
fn try_axis(map: &MapView, body: &mut Body, dx: i32, dy: i32) -> bool {
    if dx == 0 && dy == 0 {
        return false;
    }
    if would_collide_with_tile(map, body, dx, dy) {
        return false;
    }
    body.x += dx;
    body.y += dy;
    true
}

/// Move `body` by `(dx, dy)`, each axis collision-checked on its own.
pub fn move_by(map: &MapView, body: &mut Body, dx: i32, dy: i32) -> Moved {
    let x = try_axis(map, body, dx, 0);
    let y = try_axis(map, body, 0, dy);
    Moved { x, y }
}
