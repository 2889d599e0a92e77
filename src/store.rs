//! Source image and label mask storage.
//!
//! Both buffers always share the working resolution. The source image is
//! resized with bilinear filtering; masks use nearest-neighbor so class ids
//! never blend into ids that don't exist.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, RgbImage};

use crate::error::{AnnotateError, Result};
use crate::labels::LabelMap;

#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// No destination was chosen
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct ImageStore {
    working_size: (u32, u32),
    source: Option<RgbImage>,
    mask: Option<GrayImage>,
}

impl ImageStore {
    pub fn new(working_size: (u32, u32)) -> Self {
        Self {
            working_size,
            source: None,
            mask: None,
        }
    }

    pub fn working_size(&self) -> (u32, u32) {
        self.working_size
    }

    pub fn source(&self) -> Option<&RgbImage> {
        self.source.as_ref()
    }

    pub fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    pub fn mask_mut(&mut self) -> Option<&mut GrayImage> {
        self.mask.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Install an already decoded source image. Resets the mask to all
    /// background.
    pub fn set_source(&mut self, image: RgbImage) {
        let (w, h) = self.working_size;
        let image = if image.dimensions() == (w, h) {
            image
        } else {
            imageops::resize(&image, w, h, FilterType::Triangle)
        };
        self.source = Some(image);
        self.mask = Some(GrayImage::new(w, h));
    }

    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let decoded = image::open(path)?.to_rgb8();
        log::info!(
            "Decoded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        self.set_source(decoded);
        Ok(())
    }

    /// Replace the mask, resizing to the working resolution. Every pixel
    /// must hold an id from `labels`.
    pub fn set_mask(&mut self, mask: GrayImage, labels: &LabelMap) -> Result<()> {
        if self.source.is_none() {
            return Err(AnnotateError::NoImageLoaded);
        }
        if let Some(p) = mask.pixels().find(|p| !labels.contains(p.0[0])) {
            return Err(AnnotateError::UnknownLabel { id: p.0[0] });
        }
        let (w, h) = self.working_size;
        let mask = if mask.dimensions() == (w, h) {
            mask
        } else {
            imageops::resize(&mask, w, h, FilterType::Nearest)
        };
        self.mask = Some(mask);
        Ok(())
    }

    pub fn load_label_mask(&mut self, path: &Path, labels: &LabelMap) -> Result<()> {
        if self.source.is_none() {
            return Err(AnnotateError::NoImageLoaded);
        }
        let decoded = image::open(path)?.to_luma8();
        log::info!(
            "Decoded label mask {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        self.set_mask(decoded, labels)
    }

    /// Swap in a previously stored mask (undo).
    pub fn restore_mask(&mut self, mask: GrayImage) {
        debug_assert_eq!(mask.dimensions(), self.working_size);
        self.mask = Some(mask);
    }

    pub fn save_mask(&self, destination: Option<&Path>) -> Result<SaveOutcome> {
        let mask = self.mask.as_ref().ok_or(AnnotateError::NoImageLoaded)?;
        let Some(path) = destination else {
            return Ok(SaveOutcome::Cancelled);
        };
        let path = with_png_extension(path);
        mask.save_with_format(&path, ImageFormat::Png)?;
        Ok(SaveOutcome::Saved(path))
    }
}

fn with_png_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("png")
    }
}
