//! Reading density atlases from image files and writing shadowed results.
//!
//! Stored 8-bit channel values map to densities by dividing by 255. Output is
//! an RGB image with the attenuated density in every channel, encoded into a
//! temporary sibling file and renamed over the target so a failed write never
//! leaves a partial image behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::atlas::DensityAtlas;
use crate::error::ShadowError;
use crate::layout::AtlasLayout;

/// Produces the input atlas for a pass.
pub trait AtlasSource {
    fn read(&self, layout: &AtlasLayout) -> Result<DensityAtlas, ShadowError>;
}

/// Publishes the output atlas of a pass.
pub trait AtlasSink {
    fn write(&self, atlas: &DensityAtlas) -> Result<(), ShadowError>;
}

impl AtlasSource for DensityAtlas {
    fn read(&self, layout: &AtlasLayout) -> Result<DensityAtlas, ShadowError> {
        if self.layout() != layout {
            return Err(ShadowError::invalid(
                "texture_shape",
                "in-memory atlas was built for a different layout",
            ));
        }
        Ok(self.clone())
    }
}

/// Reads one channel of an image file as densities.
#[derive(Clone, Debug)]
pub struct ImageFileSource {
    path: PathBuf,
    channel: usize,
}

impl ImageFileSource {
    /// `channel` indexes RGBA: 0 = red, 1 = green, 2 = blue, 3 = alpha.
    pub fn new(path: impl Into<PathBuf>, channel: usize) -> Result<Self, ShadowError> {
        if channel > 3 {
            return Err(ShadowError::invalid(
                "density_channel",
                format!("channel {channel} is not one of 0 (red) to 3 (alpha)"),
            ));
        }
        Ok(Self {
            path: path.into(),
            channel,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AtlasSource for ImageFileSource {
    fn read(&self, layout: &AtlasLayout) -> Result<DensityAtlas, ShadowError> {
        let img = image::open(&self.path).map_err(|source| ShadowError::AtlasRead {
            path: self.path.clone(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            width = img.width(),
            height = img.height(),
            "Loaded atlas image"
        );
        density_from_image(layout, &img, self.channel)
    }
}

/// Converts channel `channel` of `img` into a density atlas for `layout`.
pub fn density_from_image(
    layout: &AtlasLayout,
    img: &DynamicImage,
    channel: usize,
) -> Result<DensityAtlas, ShadowError> {
    let expected = layout.texture_shape();
    if img.width() != expected.x || img.height() != expected.y {
        return Err(ShadowError::invalid(
            "texture_shape",
            format!(
                "image is {}x{} but the atlas is configured as {}x{}",
                img.width(),
                img.height(),
                expected.x,
                expected.y
            ),
        ));
    }
    let rgba = img.to_rgba8();
    let texels = rgba
        .pixels()
        .map(|px| px.0[channel] as f32 / 255.0)
        .collect();
    DensityAtlas::new(*layout, texels)
}

/// Encodes a density as an 8-bit channel value.
pub fn quantize(density: f32) -> u8 {
    (density.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Greyscale RGB rendition of an atlas.
pub fn atlas_to_image(atlas: &DensityAtlas) -> RgbImage {
    let shape = atlas.layout().texture_shape();
    let mut img = RgbImage::new(shape.x, shape.y);
    for (px, &d) in img.pixels_mut().zip(atlas.texels()) {
        let q = quantize(d);
        px.0 = [q, q, q];
    }
    img
}

/// Writes an atlas to an image file, format chosen by extension.
#[derive(Clone, Debug)]
pub struct ImageFileSink {
    path: PathBuf,
}

impl ImageFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.path.with_file_name(format!(".{name}.partial"))
    }

    fn write_err(&self, source: std::io::Error) -> ShadowError {
        ShadowError::OutputWrite {
            path: self.path.clone(),
            source,
        }
    }

    fn encode_to(
        &self,
        temp: &Path,
        img: &RgbImage,
        format: ImageFormat,
    ) -> Result<(), ShadowError> {
        let file = File::create(temp).map_err(|e| self.write_err(e))?;
        let mut writer = BufWriter::new(file);
        img.write_to(&mut writer, format)
            .map_err(|source| ShadowError::OutputEncode {
                path: self.path.clone(),
                source,
            })?;
        writer.flush().map_err(|e| self.write_err(e))?;
        Ok(())
    }
}

impl AtlasSink for ImageFileSink {
    fn write(&self, atlas: &DensityAtlas) -> Result<(), ShadowError> {
        let format =
            ImageFormat::from_path(&self.path).map_err(|source| ShadowError::OutputEncode {
                path: self.path.clone(),
                source,
            })?;
        let img = atlas_to_image(atlas);
        let temp = self.temp_path();

        if let Err(e) = self.encode_to(&temp, &img, format) {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(self.write_err(e));
        }
        debug!(temp = %temp.display(), "Renamed encoded output into place");
        info!(path = %self.path.display(), "Wrote shadowed atlas");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layout::SlicePolicy;
    use glam::{UVec2, UVec3};

    fn layout() -> AtlasLayout {
        AtlasLayout::new(
            UVec3::new(4, 4, 2),
            UVec2::new(8, 4),
            UVec2::new(2, 1),
            SlicePolicy::Exact,
        )
        .unwrap()
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.25), 64);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(3.0), 255);
    }

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        let atlas =
            DensityAtlas::from_voxels(layout(), |v| (v.x * 16 + v.y * 4 + v.z) as f32 / 64.0);

        ImageFileSink::new(&path).write(&atlas).unwrap();
        let read = ImageFileSource::new(&path, 0)
            .unwrap()
            .read(&layout())
            .unwrap();

        for (a, b) in atlas.texels().iter().zip(read.texels()) {
            assert!((a - b).abs() <= 0.5 / 255.0 + 1e-6, "{a} vs {b}");
        }
        // Only the final file remains.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_channel_selection() {
        let mut img = image::RgbaImage::new(8, 4);
        for px in img.pixels_mut() {
            px.0 = [255, 0, 51, 255];
        }
        let img = DynamicImage::ImageRgba8(img);
        let red = density_from_image(&layout(), &img, 0).unwrap();
        let green = density_from_image(&layout(), &img, 1).unwrap();
        let blue = density_from_image(&layout(), &img, 2).unwrap();
        assert!(red.texels().iter().all(|&d| d == 1.0));
        assert!(green.texels().iter().all(|&d| d == 0.0));
        assert!(blue.texels().iter().all(|&d| (d - 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(9, 4));
        let err = density_from_image(&layout(), &img, 0).unwrap_err();
        assert!(matches!(
            err,
            ShadowError::InvalidConfiguration {
                field: "texture_shape",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_channel_rejected() {
        assert!(ImageFileSource::new("atlas.png", 4).is_err());
    }

    #[test]
    fn test_missing_input_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = ImageFileSource::new(dir.path().join("missing.png"), 0).unwrap();
        let err = source.read(&layout()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_unwritable_output_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.png");
        let err = ImageFileSink::new(&path)
            .write(&DensityAtlas::zeros(layout()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_extension_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.unknownformat");
        let err = ImageFileSink::new(&path)
            .write(&DensityAtlas::zeros(layout()))
            .unwrap_err();
        assert!(matches!(err, ShadowError::OutputEncode { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_in_memory_source_checks_layout() {
        let atlas = DensityAtlas::zeros(layout());
        assert_eq!(atlas.read(&layout()).unwrap(), atlas);
        let other = AtlasLayout::new(
            UVec3::new(2, 2, 2),
            UVec2::new(4, 2),
            UVec2::new(2, 1),
            SlicePolicy::Exact,
        )
        .unwrap();
        assert!(atlas.read(&other).is_err());
    }
}
