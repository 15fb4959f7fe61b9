//! In-memory density atlas: one `f32` density per texel, row-major.

use glam::{UVec2, UVec3};

use crate::error::ShadowError;
use crate::layout::AtlasLayout;

/// A tiled density atlas paired with the layout that addresses it.
///
/// Densities are normalised to `[0, 1]`. The atlas is read-only once built and
/// is shared by reference across worker threads.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityAtlas {
    layout: AtlasLayout,
    texels: Vec<f32>,
}

static_assertions::assert_impl_all!(DensityAtlas: Send, Sync);

impl DensityAtlas {
    /// Wraps a texel buffer, checking its length and value range.
    pub fn new(layout: AtlasLayout, texels: Vec<f32>) -> Result<Self, ShadowError> {
        if texels.len() != layout.texel_count() {
            return Err(ShadowError::invalid(
                "texture_shape",
                format!(
                    "atlas buffer holds {} texels, layout {} needs {}",
                    texels.len(),
                    layout.texture_shape(),
                    layout.texel_count()
                ),
            ));
        }
        if let Some(index) = texels
            .iter()
            .position(|d| !d.is_finite() || !(0.0..=1.0).contains(d))
        {
            return Err(ShadowError::invalid(
                "input",
                format!(
                    "texel {index} holds density {} outside [0, 1]",
                    texels[index]
                ),
            ));
        }
        Ok(Self { layout, texels })
    }

    /// Wraps a buffer already known to match `layout` and hold `[0, 1]` densities.
    pub(crate) fn from_raw(layout: AtlasLayout, texels: Vec<f32>) -> Self {
        debug_assert_eq!(texels.len(), layout.texel_count());
        Self { layout, texels }
    }

    /// An atlas with zero density everywhere.
    pub fn zeros(layout: AtlasLayout) -> Self {
        Self {
            texels: vec![0.0; layout.texel_count()],
            layout,
        }
    }

    /// Builds an atlas by evaluating `f` at every texel. Values are clamped to `[0, 1]`.
    pub fn from_fn(layout: AtlasLayout, mut f: impl FnMut(UVec2) -> f32) -> Self {
        let shape = layout.texture_shape();
        let mut texels = Vec::with_capacity(layout.texel_count());
        for v in 0..shape.y {
            for u in 0..shape.x {
                texels.push(sanitize(f(UVec2::new(u, v))));
            }
        }
        Self { layout, texels }
    }

    /// Packs a volume into the atlas by evaluating `f` at every resident voxel.
    ///
    /// `f` receives `(x, y, slice)` where `slice` is the resident slice index in
    /// `0..layout.resident_slices()`. Under [`SlicePolicy::Resample`](crate::SlicePolicy)
    /// that is a tile index; its field depth is [`AtlasLayout::slice_depth`].
    /// Padding texels are left at zero.
    pub fn from_voxels(layout: AtlasLayout, mut f: impl FnMut(UVec3) -> f32) -> Self {
        let mut atlas = Self::zeros(layout);
        let shape = layout.data_shape();
        for z in 0..layout.resident_slices() {
            for y in 0..shape.y {
                for x in 0..shape.x {
                    let voxel = UVec3::new(x, y, z);
                    if let Some(texel) = layout.voxel_to_texel(voxel) {
                        let index = layout.texel_index(texel);
                        atlas.texels[index] = sanitize(f(voxel));
                    }
                }
            }
        }
        atlas
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    /// Row-major texel densities.
    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    /// Density at `texel`, or `None` outside the atlas.
    pub fn get(&self, texel: UVec2) -> Option<f32> {
        let shape = self.layout.texture_shape();
        if texel.x >= shape.x || texel.y >= shape.y {
            return None;
        }
        Some(self.texels[self.layout.texel_index(texel)])
    }

    /// Density of the resident voxel `(x, y, slice)`, or `None` when out of range.
    pub fn voxel(&self, voxel: UVec3) -> Option<f32> {
        self.layout
            .voxel_to_texel(voxel)
            .map(|texel| self.texels[self.layout.texel_index(texel)])
    }
}

fn sanitize(d: f32) -> f32 {
    if d.is_finite() { d.clamp(0.0, 1.0) } else { 0.0 }
}
