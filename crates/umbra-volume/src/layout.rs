//! Tiled atlas layout: places the Z-slices of a voxel grid into a row-major
//! grid of equal tiles inside one 2D image, and maps coordinates both ways.
//!
//! Each resident slice occupies one tile. Voxel `(x, y)` lands one texel per
//! voxel from the tile's top-left corner; anything in a tile past the data
//! extent is padding and maps to no voxel.

use glam::{UVec2, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ShadowError;

/// How field slices are assigned to atlas tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlicePolicy {
    /// One field slice per tile. Volumes deeper than the tile capacity are rejected.
    #[default]
    Exact,
    /// Every tile holds a slice, evenly spaced over the field depth. Depths in
    /// between are interpolated from the two neighbouring tiles.
    Resample,
}

/// Validated geometry of a tiled density atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    data_shape: UVec3,
    texture_shape: UVec2,
    tile_layout: UVec2,
    policy: SlicePolicy,
}

impl AtlasLayout {
    /// Builds a layout, rejecting shapes that cannot be addressed exactly.
    ///
    /// * `data_shape` - field dimensions `(X, Y, Z)` in voxels.
    /// * `texture_shape` - atlas dimensions `(W, H)` in texels.
    /// * `tile_layout` - tile grid `(cols, rows)`.
    pub fn new(
        data_shape: UVec3,
        texture_shape: UVec2,
        tile_layout: UVec2,
        policy: SlicePolicy,
    ) -> Result<Self, ShadowError> {
        if data_shape.min_element() == 0 {
            return Err(ShadowError::invalid(
                "data_shape",
                format!("every dimension must be positive, got {data_shape}"),
            ));
        }
        if texture_shape.min_element() == 0 {
            return Err(ShadowError::invalid(
                "texture_shape",
                format!("every dimension must be positive, got {texture_shape}"),
            ));
        }
        if tile_layout.min_element() == 0 {
            return Err(ShadowError::invalid(
                "tile_layout",
                format!("columns and rows must be positive, got {tile_layout}"),
            ));
        }
        if !texture_shape.x.is_multiple_of(tile_layout.x) {
            return Err(ShadowError::invalid(
                "tile_layout",
                format!(
                    "{} columns do not evenly divide atlas width {}",
                    tile_layout.x, texture_shape.x
                ),
            ));
        }
        if !texture_shape.y.is_multiple_of(tile_layout.y) {
            return Err(ShadowError::invalid(
                "tile_layout",
                format!(
                    "{} rows do not evenly divide atlas height {}",
                    tile_layout.y, texture_shape.y
                ),
            ));
        }

        let tile_size = texture_shape / tile_layout;
        if data_shape.x > tile_size.x || data_shape.y > tile_size.y {
            return Err(ShadowError::invalid(
                "data_shape",
                format!(
                    "slice of {}x{} voxels does not fit a {}x{} tile",
                    data_shape.x, data_shape.y, tile_size.x, tile_size.y
                ),
            ));
        }

        let Some(n_tiles) = tile_layout.x.checked_mul(tile_layout.y) else {
            return Err(ShadowError::invalid(
                "tile_layout",
                format!(
                    "{}x{} tiles exceed the addressable tile count of {}",
                    tile_layout.x,
                    tile_layout.y,
                    u32::MAX
                ),
            ));
        };
        match policy {
            SlicePolicy::Exact if data_shape.z > n_tiles => {
                return Err(ShadowError::invalid(
                    "data_shape",
                    format!(
                        "{} slices exceed the atlas capacity of {n_tiles} tiles; \
                         use the resample slice policy to spread them",
                        data_shape.z
                    ),
                ));
            }
            SlicePolicy::Resample if n_tiles < 2 && data_shape.z > 1 => {
                return Err(ShadowError::invalid(
                    "tile_layout",
                    "resampling a multi-slice field needs at least 2 tiles",
                ));
            }
            _ => {}
        }

        Ok(Self {
            data_shape,
            texture_shape,
            tile_layout,
            policy,
        })
    }

    /// Field dimensions `(X, Y, Z)`.
    pub fn data_shape(&self) -> UVec3 {
        self.data_shape
    }

    /// Atlas dimensions `(W, H)`.
    pub fn texture_shape(&self) -> UVec2 {
        self.texture_shape
    }

    /// Tile grid `(cols, rows)`.
    pub fn tile_layout(&self) -> UVec2 {
        self.tile_layout
    }

    pub fn policy(&self) -> SlicePolicy {
        self.policy
    }

    /// Pixel size of one tile.
    pub fn tile_size(&self) -> UVec2 {
        self.texture_shape / self.tile_layout
    }

    /// Slice capacity of the atlas. Fits `u32`; checked in [`AtlasLayout::new`].
    pub fn n_tiles(&self) -> u32 {
        self.tile_layout.x * self.tile_layout.y
    }

    pub fn slices_per_row(&self) -> u32 {
        self.tile_layout.x
    }

    pub fn max_row(&self) -> u32 {
        self.tile_layout.y - 1
    }

    /// Channel-level count of the atlas (three colour channels per tile).
    pub fn tex_levels(&self) -> u64 {
        u64::from(self.n_tiles()) * 3
    }

    /// Number of slices actually stored in tiles.
    pub fn resident_slices(&self) -> u32 {
        match self.policy {
            SlicePolicy::Exact => self.data_shape.z,
            SlicePolicy::Resample => self.n_tiles(),
        }
    }

    /// Total texel count of the atlas.
    pub fn texel_count(&self) -> usize {
        self.texture_shape.x as usize * self.texture_shape.y as usize
    }

    /// Extent of the field box in continuous voxel coordinates.
    pub fn field_extent(&self) -> Vec3 {
        self.data_shape.as_vec3()
    }

    /// Field depth (voxel-centre coordinate) represented by resident slice `slice`.
    pub fn slice_depth(&self, slice: u32) -> f32 {
        match self.policy {
            SlicePolicy::Exact => slice as f32,
            SlicePolicy::Resample => {
                let n = self.n_tiles();
                if n < 2 {
                    0.0
                } else {
                    slice as f32 * (self.data_shape.z - 1) as f32 / (n - 1) as f32
                }
            }
        }
    }

    /// Top-left texel of the tile holding resident slice `slice`.
    pub fn tile_origin(&self, slice: u32) -> UVec2 {
        let col = slice % self.slices_per_row();
        let row = (slice / self.slices_per_row()).min(self.max_row());
        UVec2::new(col, row) * self.tile_size()
    }

    /// Maps a voxel `(x, y, slice)` to its atlas texel.
    ///
    /// Returns `None` outside `[0, X) x [0, Y) x [0, resident_slices)`.
    pub fn voxel_to_texel(&self, voxel: UVec3) -> Option<UVec2> {
        if voxel.x >= self.data_shape.x
            || voxel.y >= self.data_shape.y
            || voxel.z >= self.resident_slices()
        {
            return None;
        }
        Some(self.tile_origin(voxel.z) + voxel.truncate())
    }

    /// Maps an atlas texel back to the voxel stored there.
    ///
    /// Returns `None` outside the atlas, on tile padding, and on tiles with
    /// no resident slice.
    pub fn texel_to_voxel(&self, texel: UVec2) -> Option<UVec3> {
        if texel.x >= self.texture_shape.x || texel.y >= self.texture_shape.y {
            return None;
        }
        let tile_size = self.tile_size();
        let tile = texel / tile_size;
        let slice = tile.y * self.slices_per_row() + tile.x;
        if slice >= self.resident_slices() {
            return None;
        }
        let local = texel % tile_size;
        if local.x >= self.data_shape.x || local.y >= self.data_shape.y {
            return None;
        }
        Some(local.extend(slice))
    }

    /// Row-major index of `texel` into a `W * H` buffer.
    pub fn texel_index(&self, texel: UVec2) -> usize {
        texel.y as usize * self.texture_shape.x as usize + texel.x as usize
    }
}
