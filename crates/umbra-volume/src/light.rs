//! Directional light for the shadow pass.

use glam::Vec3;

use crate::error::ShadowError;

/// Unit vector pointing from a sample toward the light.
///
/// The light is infinitely distant, so one direction holds for the whole pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightDirection(Vec3);

impl LightDirection {
    /// Normalises `direction`.
    ///
    /// Fails with an `InvalidConfiguration` on `light_direction` if the vector
    /// is non-finite or has near-zero length.
    pub fn new(direction: Vec3) -> Result<Self, ShadowError> {
        if !direction.is_finite() {
            return Err(ShadowError::invalid(
                "light_direction",
                format!("components must be finite, got {direction}"),
            ));
        }
        let len = direction.length();
        if len <= 1e-6 {
            return Err(ShadowError::invalid(
                "light_direction",
                "direction must not be zero",
            ));
        }
        Ok(Self(direction / len))
    }

    pub fn vec(&self) -> Vec3 {
        self.0
    }
}

impl Default for LightDirection {
    fn default() -> Self {
        Self(Vec3::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let light = LightDirection::new(Vec3::new(3.0, 0.0, -4.0)).unwrap();
        assert!((light.vec().length() - 1.0).abs() < 1e-6);
        assert!((light.vec().x - 0.6).abs() < 1e-6);
        assert!((light.vec().z + 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_light_position_becomes_direction() {
        let light = LightDirection::new(Vec3::new(20.0, 0.0, 0.0)).unwrap();
        assert_eq!(light.vec(), Vec3::X);
    }

    #[test]
    fn test_zero_direction_rejected() {
        let err = LightDirection::new(Vec3::ZERO).unwrap_err();
        assert!(err.to_string().contains("light_direction"));
    }

    #[test]
    fn test_non_finite_direction_rejected() {
        assert!(LightDirection::new(Vec3::new(f32::NAN, 1.0, 0.0)).is_err());
        assert!(LightDirection::new(Vec3::new(0.0, f32::INFINITY, 0.0)).is_err());
    }
}
