//! Volumetric self-shadowing over a density field stored as a tiled 2D atlas.
//!
//! A 3D density grid is laid out slice by slice in the tiles of one image
//! ([`AtlasLayout`]). For every texel that holds a voxel, a [`ShadowPass`]
//! marches a ray toward a directional light through the field
//! ([`RayMarcher`], [`DensitySampler`]) and scales the voxel's density by the
//! light that gets through. Texels are independent and are fanned out over a
//! [`Dispatch`] implementation.

pub mod atlas;
pub mod compositor;
pub mod dispatch;
mod error;
pub mod io;
pub mod layout;
mod light;
pub mod march;
pub mod sampler;

pub use atlas::DensityAtlas;
pub use compositor::{PassStats, ShadowPass};
pub use dispatch::{Dispatch, PoolDispatch, SerialDispatch, dispatcher};
pub use error::{ErrorKind, ShadowError};
pub use io::{AtlasSink, AtlasSource, ImageFileSink, ImageFileSource};
pub use layout::{AtlasLayout, SlicePolicy};
pub use light::LightDirection;
pub use march::{RayMarchConfig, RayMarcher, exit_distance};
pub use sampler::DensitySampler;
