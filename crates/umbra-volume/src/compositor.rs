//! Shadow pass: one independent ray march per covered atlas texel.

use std::time::{Duration, Instant};

use glam::{UVec2, UVec3, Vec3};
use tracing::{debug, info, instrument};

use crate::atlas::DensityAtlas;
use crate::dispatch::Dispatch;
use crate::error::ShadowError;
use crate::layout::AtlasLayout;
use crate::light::LightDirection;
use crate::march::{RayMarchConfig, RayMarcher};
use crate::sampler::DensitySampler;

/// Immutable parameters of one self-shadowing pass.
///
/// The same value is shared by reference with every row task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowPass {
    light: LightDirection,
    march: RayMarchConfig,
}

/// Summary of a finished pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassStats {
    /// Texels holding a voxel (each got its own ray march).
    pub covered_texels: usize,
    /// Mean input density over the whole atlas.
    pub mean_input: f32,
    /// Mean attenuated density over the whole atlas.
    pub mean_output: f32,
    /// Wall-clock time of the dispatch.
    pub elapsed: Duration,
}

impl ShadowPass {
    pub fn new(light: LightDirection, march: RayMarchConfig) -> Self {
        Self { light, march }
    }

    pub fn light(&self) -> LightDirection {
        self.light
    }

    pub fn march(&self) -> RayMarchConfig {
        self.march
    }

    /// Attenuates every covered texel of `input` by its transmittance.
    pub fn run(
        &self,
        input: &DensityAtlas,
        dispatch: &dyn Dispatch,
    ) -> Result<DensityAtlas, ShadowError> {
        self.run_with_stats(input, dispatch).map(|(output, _)| output)
    }

    /// Like [`ShadowPass::run`], also reporting [`PassStats`].
    ///
    /// Output is only returned once every texel succeeded.
    #[instrument(skip_all, fields(steps = self.march.steps(), threads = dispatch.parallelism()))]
    pub fn run_with_stats(
        &self,
        input: &DensityAtlas,
        dispatch: &dyn Dispatch,
    ) -> Result<(DensityAtlas, PassStats), ShadowError> {
        let layout = *input.layout();
        debug!(
            n_tiles = layout.n_tiles(),
            slices_per_row = layout.slices_per_row(),
            max_row = layout.max_row(),
            tex_levels = layout.tex_levels(),
            resident_slices = layout.resident_slices(),
            alpha_correction = self.march.alpha_correction(),
            "Atlas layout"
        );

        let marcher = RayMarcher::new(DensitySampler::new(input), self.light, self.march);
        let row_len = layout.texture_shape().x as usize;
        let mut output = vec![0.0f32; layout.texel_count()];

        let start = Instant::now();
        dispatch.for_each_row(&mut output, row_len, &|row, out| {
            let v = row as u32;
            for (u, value) in out.iter_mut().enumerate() {
                let texel = UVec2::new(u as u32, v);
                *value = shade_texel(input, &layout, &marcher, texel)?;
            }
            Ok(())
        })?;
        let elapsed = start.elapsed();

        let stats = PassStats {
            covered_texels: covered_texels(&layout),
            mean_input: mean(input.texels()),
            mean_output: mean(&output),
            elapsed,
        };
        info!(
            covered = stats.covered_texels,
            mean_input = stats.mean_input,
            mean_output = stats.mean_output,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Shadow pass complete"
        );
        Ok((DensityAtlas::from_raw(layout, output), stats))
    }

    /// Transmittance at `texel`, or `None` for texels that hold no voxel.
    pub fn transmittance_at(
        &self,
        input: &DensityAtlas,
        texel: UVec2,
    ) -> Result<Option<f32>, ShadowError> {
        let layout = input.layout();
        let Some(voxel) = layout.texel_to_voxel(texel) else {
            return Ok(None);
        };
        let marcher = RayMarcher::new(DensitySampler::new(input), self.light, self.march);
        marcher
            .integrate_shadow(ray_start(layout, voxel.truncate(), voxel.z))
            .map(Some)
    }
}

/// Output density at one texel. Texels without a voxel pass through.
fn shade_texel(
    input: &DensityAtlas,
    layout: &AtlasLayout,
    marcher: &RayMarcher<'_>,
    texel: UVec2,
) -> Result<f32, ShadowError> {
    let density = input.texels()[layout.texel_index(texel)];
    let Some(voxel) = layout.texel_to_voxel(texel) else {
        return Ok(density);
    };
    if density == 0.0 {
        return Ok(0.0);
    }
    let transmittance = marcher
        .integrate_shadow(ray_start(layout, voxel.truncate(), voxel.z))
        .map_err(|e| at_texel(e, texel, voxel))?;
    Ok(density * transmittance)
}

/// Prefixes the location to a compute failure's reason. Other errors pass through.
fn at_texel(err: ShadowError, texel: UVec2, voxel: UVec3) -> ShadowError {
    match err {
        ShadowError::Compute { reason } => {
            ShadowError::compute(format!("texel {texel} (voxel {voxel}): {reason}"))
        }
        other => other,
    }
}

/// Field position of the centre of resident voxel `(xy, slice)`.
fn ray_start(layout: &AtlasLayout, xy: UVec2, slice: u32) -> Vec3 {
    (xy.as_vec2() + 0.5).extend(layout.slice_depth(slice) + 0.5)
}

fn covered_texels(layout: &AtlasLayout) -> usize {
    let shape = layout.data_shape();
    shape.x as usize * shape.y as usize * layout.resident_slices() as usize
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}
