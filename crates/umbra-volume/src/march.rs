//! Fixed-step light transmittance integration through the density field.
//!
//! The ray from a voxel toward the light is cut into `steps` equal segments
//! ending at the field boundary, so every sample count traverses the whole
//! path. Opacity per sample is scaled by `alpha_scale / steps`, which keeps the
//! accumulated opacity roughly independent of `steps`.

use glam::{UVec3, Vec3};

use crate::error::ShadowError;
use crate::light::LightDirection;
use crate::sampler::DensitySampler;

/// Sample count and absorption scale of the ray march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayMarchConfig {
    steps: u32,
    alpha_scale: f32,
}

impl RayMarchConfig {
    /// Validates `steps > 0` and a finite, non-negative `alpha_scale`.
    pub fn new(steps: u32, alpha_scale: f32) -> Result<Self, ShadowError> {
        if steps == 0 {
            return Err(ShadowError::invalid("steps", "must be at least 1"));
        }
        if !alpha_scale.is_finite() || alpha_scale < 0.0 {
            return Err(ShadowError::invalid(
                "alpha_scale",
                format!("must be a finite non-negative number, got {alpha_scale}"),
            ));
        }
        Ok(Self { steps, alpha_scale })
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn alpha_scale(&self) -> f32 {
        self.alpha_scale
    }

    /// Opacity contributed per unit density per sample.
    pub fn alpha_correction(&self) -> f32 {
        self.alpha_scale / self.steps as f32
    }
}

/// Distance from `start` along `direction` to the boundary of the box
/// `[0, extent]`. Zero when `start` is outside the box.
pub fn exit_distance(start: Vec3, direction: Vec3, extent: Vec3) -> f32 {
    let mut exit = f32::INFINITY;
    for axis in 0..3 {
        let d = direction[axis];
        let t = if d > 0.0 {
            (extent[axis] - start[axis]) / d
        } else if d < 0.0 {
            -start[axis] / d
        } else {
            continue;
        };
        exit = exit.min(t);
    }
    if exit.is_finite() { exit.max(0.0) } else { 0.0 }
}

/// Integrates transmittance from voxels toward a directional light.
#[derive(Clone, Copy, Debug)]
pub struct RayMarcher<'a> {
    sampler: DensitySampler<'a>,
    light: LightDirection,
    march: RayMarchConfig,
}

impl<'a> RayMarcher<'a> {
    pub fn new(sampler: DensitySampler<'a>, light: LightDirection, march: RayMarchConfig) -> Self {
        Self {
            sampler,
            light,
            march,
        }
    }

    /// Transmittance for the ray starting at the centre of `voxel`.
    ///
    /// `voxel.z` is a field depth, not a resident slice index.
    pub fn integrate_voxel(&self, voxel: UVec3) -> Result<f32, ShadowError> {
        self.integrate_shadow(voxel.as_vec3() + Vec3::splat(0.5))
    }

    /// Transmittance in `[0, 1]` along the ray from `start` toward the light.
    pub fn integrate_shadow(&self, start: Vec3) -> Result<f32, ShadowError> {
        let direction = self.light.vec();
        let extent = self.sampler.atlas().layout().field_extent();
        let step_length = exit_distance(start, direction, extent) / self.march.steps() as f32;
        let alpha_correction = self.march.alpha_correction();

        let mut opacity = 0.0f32;
        for i in 0..self.march.steps() {
            let position = start + direction * (i as f32 * step_length);
            opacity += self.sampler.sample(position) * alpha_correction;
            if opacity >= 1.0 {
                break;
            }
        }

        if !opacity.is_finite() {
            return Err(ShadowError::compute(format!(
                "non-finite opacity {opacity} on the ray from {start}"
            )));
        }
        Ok((1.0 - opacity).clamp(0.0, 1.0))
    }
}
