//! Continuous density lookup over a tiled atlas.
//!
//! Voxel `i` covers the cell `[i, i + 1)` with its centre at `i + 0.5`.
//! Within a slice the density is bilinear between voxel centres; x and y
//! clamp at the field edges. Outside `[0, Z)` in depth the field is vacuum.

use glam::{UVec3, Vec3};

use crate::atlas::DensityAtlas;
use crate::layout::SlicePolicy;

/// Samples densities from a [`DensityAtlas`] at fractional positions.
#[derive(Clone, Copy, Debug)]
pub struct DensitySampler<'a> {
    atlas: &'a DensityAtlas,
}

impl<'a> DensitySampler<'a> {
    pub fn new(atlas: &'a DensityAtlas) -> Self {
        Self { atlas }
    }

    pub fn atlas(&self) -> &'a DensityAtlas {
        self.atlas
    }

    /// Density at a continuous field position, in `[0, 1]`.
    pub fn sample(&self, position: Vec3) -> f32 {
        if !position.is_finite() {
            return 0.0;
        }
        let layout = self.atlas.layout();
        let depth = layout.data_shape().z;
        if position.z < 0.0 || position.z >= depth as f32 {
            return 0.0;
        }

        match layout.policy() {
            SlicePolicy::Exact => {
                let slice = (position.z as u32).min(depth - 1);
                self.bilinear(position.x, position.y, slice)
            }
            SlicePolicy::Resample => {
                let resident = layout.resident_slices();
                if resident < 2 || depth < 2 {
                    return self.bilinear(position.x, position.y, 0);
                }
                let centre = (position.z - 0.5).clamp(0.0, (depth - 1) as f32);
                let s = centre * (resident - 1) as f32 / (depth - 1) as f32;
                let s0 = (s.floor() as u32).min(resident - 1);
                let s1 = (s0 + 1).min(resident - 1);
                let t = s - s0 as f32;
                let a = self.bilinear(position.x, position.y, s0);
                let b = self.bilinear(position.x, position.y, s1);
                a + (b - a) * t
            }
        }
    }

    /// Density of a resident voxel, `None` out of range.
    pub fn voxel(&self, voxel: UVec3) -> Option<f32> {
        self.atlas.voxel(voxel)
    }

    fn bilinear(&self, x: f32, y: f32, slice: u32) -> f32 {
        let shape = self.atlas.layout().data_shape();
        let fx = (x - 0.5).clamp(0.0, (shape.x - 1) as f32);
        let fy = (y - 0.5).clamp(0.0, (shape.y - 1) as f32);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(shape.x - 1);
        let y1 = (y0 + 1).min(shape.y - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let fetch = |x, y| self.voxel(UVec3::new(x, y, slice)).unwrap_or(0.0);
        let top = fetch(x0, y0) + (fetch(x1, y0) - fetch(x0, y0)) * tx;
        let bottom = fetch(x0, y1) + (fetch(x1, y1) - fetch(x0, y1)) * tx;
        (top + (bottom - top) * ty).clamp(0.0, 1.0)
    }
}
