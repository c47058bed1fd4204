//! Z-order tile addressing for the block-compressed family.
//!
//! Storage is a sequence of 16-byte units ("tiles"), each holding one or more
//! blocks side by side. Tiles are laid out along a fixed bit-interleaved curve
//! over (tile row, tile column). Curve positions that land outside the grid
//! occupy no storage, so the n-th in-grid position is the n-th stored tile.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use once_cell::sync::Lazy;

use crate::texerr::{DecodeError, Result};

/// Slot value for a grid cell the curve never reached.
pub const UNASSIGNED: u32 = u32::MAX;

/// Upper bound on curve steps walked for one grid shape.
pub const MAX_CURVE_STEPS: u64 = 1 << 26;

/// Bits of `z` that feed the row coordinate: 0, 2-3, 5-8, 16-18.
/// Every other bit feeds the column.
const Y_MASK: u64 = 0x7_01ED;

/// Rows reachable by the curve; `Y_MASK` carries ten bits.
pub const MAX_TILE_ROWS: u32 = 1 << Y_MASK.count_ones();

/// Splits a curve position into (tile row, tile column).
pub fn deinterleave(z: u64) -> (u64, u64) {
    let y = (z & 0x1)
        | ((z >> 1) & 0x6)
        | ((z >> 2) & 0x78)
        | ((z >> 9) & 0x380);
    let x = ((z >> 1) & 0x1)
        | ((z >> 3) & 0x2)
        | ((z >> 7) & 0x1FC)
        | ((z >> 10) & !0x1FF);
    (y, x)
}

/// Flat map from destination tile (row-major) to stored tile index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwizzleMap {
    tiles_y: u32,
    tiles_x: u32,
    slots: Vec<u32>,
    steps: u64,
}

impl SwizzleMap {
    pub fn build(tiles_y: u32, tiles_x: u32) -> Result<SwizzleMap> {
        Self::build_with_budget(tiles_y, tiles_x, MAX_CURVE_STEPS)
    }

    pub fn build_with_budget(tiles_y: u32, tiles_x: u32, max_steps: u64) -> Result<SwizzleMap> {
        let total = tiles_y as usize * tiles_x as usize;
        // each step places at most one tile
        if tiles_y > MAX_TILE_ROWS || total as u64 > max_steps {
            return Err(DecodeError::SwizzleCoverage {
                tiles_y,
                tiles_x,
                steps: 0,
                unassigned: total,
            });
        }

        let mut slots = vec![UNASSIGNED; total];
        let mut next = 0usize;
        let mut z = 0u64;
        while next < total {
            if z >= max_steps {
                return Err(DecodeError::SwizzleCoverage {
                    tiles_y,
                    tiles_x,
                    steps: z,
                    unassigned: total - next,
                });
            }
            let (y, x) = deinterleave(z);
            if y < tiles_y as u64 && x < tiles_x as u64 {
                slots[y as usize * tiles_x as usize + x as usize] = next as u32;
                next += 1;
            }
            z += 1;
        }

        Ok(SwizzleMap { tiles_y, tiles_x, slots, steps: z })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(tiles_y: u32, tiles_x: u32, slots: Vec<u32>, steps: u64) -> SwizzleMap {
        SwizzleMap { tiles_y, tiles_x, slots, steps }
    }

    /// Curve positions walked to place every tile.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn shape(&self) -> (u32, u32) {
        (self.tiles_y, self.tiles_x)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stored tile index for destination tile (`ty`, `tx`).
    pub fn source_tile(&self, ty: u32, tx: u32) -> Option<u32> {
        if ty >= self.tiles_y || tx >= self.tiles_x {
            return None;
        }
        match self.slots[ty as usize * self.tiles_x as usize + tx as usize] {
            UNASSIGNED => None,
            s => Some(s),
        }
    }

    pub fn unassigned(&self) -> usize {
        self.slots.iter().filter(|&&s| s == UNASSIGNED).count()
    }

    pub fn slots(&self) -> &[u32] {
        &self.slots
    }
}

static GLOBAL_CACHE: Lazy<Arc<SwizzleCache>> = Lazy::new(|| Arc::new(SwizzleCache::new()));

/// Build-once, read-many store of swizzle maps keyed by (tiles_y, tiles_x).
#[derive(Debug, Default)]
pub struct SwizzleCache {
    maps: RwLock<HashMap<(u32, u32), Arc<SwizzleMap>>>,
}

impl SwizzleCache {
    pub fn new() -> SwizzleCache {
        SwizzleCache::default()
    }

    /// Cache shared by every decoder created with `TextureDecoder::new`.
    pub fn global() -> Arc<SwizzleCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn get_or_build(&self, tiles_y: u32, tiles_x: u32) -> Result<Arc<SwizzleMap>> {
        let key = (tiles_y, tiles_x);
        {
            let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = maps.get(&key) {
                return Ok(Arc::clone(map));
            }
        }

        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        // another thread may have built it while we waited
        if let Some(map) = maps.get(&key) {
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(SwizzleMap::build(tiles_y, tiles_x)?);
        debug!("built swizzle map for {tiles_y}x{tiles_x} tiles");
        maps.insert(key, Arc::clone(&map));
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
