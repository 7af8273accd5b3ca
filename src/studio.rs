//! Render context owning the layers, the base image and the surface.
//!
//! [`Studio`] is the single place session state lives. Every operation goes
//! through an explicit `&mut Studio`; nothing is kept in globals.
//!
//! # Loading
//!
//! Decoding can run off the caller's task in two phases:
//!
//! ```ignore
//! let pending = studio.begin_load(bytes)?;
//! // ... keep editing layers while the image decodes ...
//! match studio.finish_load(pending).await? {
//!     LoadOutcome::Applied { width, height } => studio.render()?,
//!     LoadOutcome::Superseded => None, // a newer load was started
//! };
//! ```
//!
//! Only the most recently started load is applied. A failed decode leaves
//! the current image and surface untouched.

use crate::config::{StudioConfig, TransformConfig};
use crate::transform::{self, codec, BaseImage, CropSelection};
use crate::watermark::{
    FontBook, LayerDefaults, LayerId, LayerSet, PixmapSurface, PresetSetting, RasterSurface,
    RenderStats, WatermarkCompositor, WatermarkError, WatermarkLayer,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Original and watermarked image as PNG data URIs, in the shape the image
/// library stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedImages {
    pub original_image_src: String,
    pub watermarked_image_src: String,
}

/// A decode started by [`Studio::begin_load`].
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    task: JoinHandle<Result<BaseImage, WatermarkError>>,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image became the new base image
    Applied { width: u32, height: u32 },
    /// A newer load started meanwhile; the result was discarded
    Superseded,
}

/// Watermarking session state.
#[derive(Debug)]
pub struct Studio {
    defaults: LayerDefaults,
    transform: TransformConfig,
    layers: LayerSet,
    base: Option<BaseImage>,
    surface: PixmapSurface,
    compositor: WatermarkCompositor,
    load_generation: u64,
}

impl Studio {
    pub fn new(
        defaults: LayerDefaults,
        fonts: FontBook,
        transform: TransformConfig,
    ) -> Result<Self, WatermarkError> {
        Ok(Self {
            defaults,
            transform,
            layers: LayerSet::new(),
            base: None,
            // Placeholder until the first image arrives
            surface: PixmapSurface::new(1, 1, fonts)?,
            compositor: WatermarkCompositor::new(),
            load_generation: 0,
        })
    }

    /// Build a studio from configuration, loading fonts as configured.
    pub fn from_config(config: &StudioConfig) -> Result<Self, WatermarkError> {
        Self::new(
            config.defaults.clone(),
            config.fonts.font_book(),
            config.transform.clone(),
        )
    }

    // ---------------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------------

    /// Add a layer initialised from the studio defaults.
    pub fn add_layer(&mut self) -> Result<LayerId, WatermarkError> {
        self.layers.add(WatermarkLayer::from_defaults(&self.defaults))
    }

    /// Add a fully configured layer.
    pub fn add_layer_with(&mut self, layer: WatermarkLayer) -> Result<LayerId, WatermarkError> {
        self.layers.add(layer)
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<WatermarkLayer, WatermarkError> {
        let removed = self.layers.remove(id)?;
        tracing::debug!(layer = %id, remaining = self.layers.len(), "Removed layer");
        Ok(removed)
    }

    pub fn layer(&self, id: &LayerId) -> Option<&WatermarkLayer> {
        self.layers.get(id)
    }

    pub fn layer_mut(&mut self, id: &LayerId) -> Result<&mut WatermarkLayer, WatermarkError> {
        self.layers.require_mut(id)
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    // ---------------------------------------------------------------------
    // Presets
    // ---------------------------------------------------------------------

    /// Write a preset onto the layer `target`.
    pub fn apply_preset_to_layer(
        &mut self,
        preset: &PresetSetting,
        target: &LayerId,
    ) -> Result<(), WatermarkError> {
        let layer = self.layers.require_mut(target)?;
        preset.apply_to(layer);
        tracing::debug!(layer = %target, preset = %preset.name, "Applied preset");
        Ok(())
    }

    /// Write a preset onto the first layer, creating one when there is none.
    ///
    /// Other layers are left untouched.
    pub fn apply_preset_to_first_layer(&mut self, preset: &PresetSetting) -> Result<LayerId, WatermarkError> {
        let target = match self.layers.first_id() {
            Some(id) => id.clone(),
            None => self.add_layer()?,
        };
        self.apply_preset_to_layer(preset, &target)?;
        Ok(target)
    }

    /// Snapshot a layer's settings as a named preset.
    pub fn save_preset(&self, id: &LayerId, name: impl Into<String>) -> Result<PresetSetting, WatermarkError> {
        let layer = self
            .layers
            .get(id)
            .ok_or_else(|| WatermarkError::MissingLayerData(id.to_string()))?;
        Ok(PresetSetting::from_layer(layer, name))
    }

    // ---------------------------------------------------------------------
    // Base image
    // ---------------------------------------------------------------------

    pub fn base_image(&self) -> Option<&BaseImage> {
        self.base.as_ref()
    }

    /// Surface size, once an image is loaded.
    pub fn surface_dimensions(&self) -> Option<(u32, u32)> {
        self.base
            .as_ref()
            .map(|_| (self.surface.width(), self.surface.height()))
    }

    /// Start decoding `bytes` on the blocking thread pool.
    ///
    /// Starting a load supersedes every load started before it. Must be
    /// called from within a tokio runtime.
    pub fn begin_load(&mut self, bytes: Vec<u8>) -> Result<PendingLoad, WatermarkError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| WatermarkError::DecodeFailed(format!("no async runtime: {}", e)))?;

        self.load_generation += 1;
        let generation = self.load_generation;
        let task = handle.spawn_blocking(move || codec::decode_image(&bytes));
        tracing::debug!(generation = generation, "Started image decode");
        Ok(PendingLoad { generation, task })
    }

    /// Wait for a load and apply it if it is still the latest one.
    pub async fn finish_load(&mut self, pending: PendingLoad) -> Result<LoadOutcome, WatermarkError> {
        let decoded = pending
            .task
            .await
            .map_err(|e| WatermarkError::DecodeFailed(format!("decode task failed: {}", e)))?;

        if pending.generation != self.load_generation {
            tracing::debug!(
                generation = pending.generation,
                latest = self.load_generation,
                "Discarding superseded image load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        let image = decoded?;
        let (width, height) = image.dimensions();
        self.replace_base(image)?;
        Ok(LoadOutcome::Applied { width, height })
    }

    /// Decode and apply `bytes` synchronously.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(u32, u32), WatermarkError> {
        let image = codec::decode_image(bytes)?;
        self.set_base_image(image)
    }

    /// Replace the base image, superseding any pending load.
    pub fn set_base_image(&mut self, image: BaseImage) -> Result<(u32, u32), WatermarkError> {
        self.load_generation += 1;
        let dims = image.dimensions();
        self.replace_base(image)?;
        Ok(dims)
    }

    fn replace_base(&mut self, image: BaseImage) -> Result<(), WatermarkError> {
        let (width, height) = image.dimensions();
        self.surface.resize(width, height)?;
        self.base = Some(image);
        tracing::info!(width = width, height = height, "Base image loaded");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Rendering and transforms
    // ---------------------------------------------------------------------

    /// Redraw the surface. Returns `None` when no image is loaded.
    pub fn render(&mut self) -> Result<Option<RenderStats>, WatermarkError> {
        let Some(base) = &self.base else {
            return Ok(None);
        };
        let stats = self
            .compositor
            .render(&mut self.surface, base.as_rgba(), self.layers.as_slice())?;
        Ok(Some(stats))
    }

    /// Crop the base image to a selection and re-render.
    ///
    /// All-or-nothing: when the selection is invalid or the cropped frame
    /// cannot be rendered, the base image and surface are left as they were.
    pub fn crop(&mut self, selection: &CropSelection) -> Result<Option<RenderStats>, WatermarkError> {
        let base = self.base.as_ref().ok_or(WatermarkError::NoImageLoaded)?;
        let cropped = transform::crop(base, selection)?;
        self.commit_transformed(cropped)
    }

    /// Resize the base image and re-render.
    ///
    /// All-or-nothing, like [`Studio::crop`].
    pub fn resize(&mut self, width: f64, height: f64) -> Result<Option<RenderStats>, WatermarkError> {
        let base = self.base.as_ref().ok_or(WatermarkError::NoImageLoaded)?;
        let resized = transform::resize(
            base,
            width,
            height,
            self.transform.resize_filter,
            self.transform.max_pixels,
        )?;
        self.commit_transformed(resized)
    }

    /// Swap in a transformed base image and render it, rolling back to the
    /// previous image when the render fails.
    fn commit_transformed(&mut self, image: BaseImage) -> Result<Option<RenderStats>, WatermarkError> {
        // Layers that cannot render fail here, before anything changes
        self.compositor
            .preflight(&mut self.surface, self.layers.as_slice())?;

        let previous = self.base.clone();
        self.replace_base(image)?;
        match self.render() {
            Ok(stats) => Ok(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Render of transformed image failed, restoring previous image");
                if let Some(previous) = previous {
                    self.replace_base(previous)?;
                    if let Err(restore) = self.render() {
                        tracing::error!(error = %restore, "Failed to redraw previous image");
                    }
                }
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Render and return the watermarked pixels.
    pub fn watermarked_image(&mut self) -> Result<RgbaImage, WatermarkError> {
        self.render()?.ok_or(WatermarkError::NoImageLoaded)?;
        self.surface.to_rgba_image()
    }

    /// Render and return the watermarked image as a PNG data URI.
    pub fn downloadable(&mut self) -> Result<String, WatermarkError> {
        codec::png_data_uri(&self.watermarked_image()?)
    }

    /// Render and export the original/watermarked pair for the image library.
    pub fn export_current(&mut self) -> Result<ExportedImages, WatermarkError> {
        let watermarked = self.watermarked_image()?;
        let base = self.base.as_ref().ok_or(WatermarkError::NoImageLoaded)?;
        Ok(ExportedImages {
            original_image_src: codec::png_data_uri(base.as_rgba())?,
            watermarked_image_src: codec::png_data_uri(&watermarked)?,
        })
    }
}
