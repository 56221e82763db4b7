//! Pipeline orchestration
//!
//! [`StudioProcessor`] owns the shared pieces of the pipeline: the
//! segmentation backend, the asset catalog, and the selection source. It
//! sequences mask production, alpha compositing, background resolution, and
//! overlay placement behind three entry points: cutout-only, customize-only,
//! and the combined pipeline with its partial-success policy.

use crate::{
    assets::{AssetCatalog, RandomSelector, Selector},
    background::{BackgroundResolver, BackgroundSpec},
    config::PipelineConfig,
    cutout::AlphaCompositor,
    error::Result,
    inference::InferenceBackend,
    masking::MaskProducer,
    overlay::{OverlayCompositor, OverlayKind},
    types::{CutoutResult, PipelineOutput, PipelineTimings},
};
use image::{DynamicImage, RgbaImage};
use instant::Instant;
use std::sync::{Mutex, MutexGuard, RwLock};

/// The shared customization pipeline
///
/// Constructed once at startup and shared across request threads. Inference
/// runs behind a mutex: the forward pass itself is read-only but the numeric
/// runtime is not guaranteed to support concurrent execution on one model
/// instance, so calls are serialized. Catalog reads are concurrent; a rescan
/// takes the write side.
pub struct StudioProcessor {
    config: PipelineConfig,
    backend: Mutex<Box<dyn InferenceBackend>>,
    catalog: RwLock<AssetCatalog>,
    selector: Mutex<Box<dyn Selector>>,
    #[cfg(test)]
    fail_customization: bool,
}

impl StudioProcessor {
    /// Create a processor, initializing the backend and scanning the asset
    /// catalog
    ///
    /// # Errors
    /// Returns whatever the backend's initialization reports, typically
    /// `ModelUnavailable` when model weights cannot be loaded.
    pub fn new(config: PipelineConfig, mut backend: Box<dyn InferenceBackend>) -> Result<Self> {
        if let Some(duration) = backend.initialize(&config)? {
            log::info!("segmentation backend ready in {}ms", duration.as_millis());
        }
        let catalog = AssetCatalog::scan(config.asset_root.clone());

        Ok(Self {
            config,
            backend: Mutex::new(backend),
            catalog: RwLock::new(catalog),
            selector: Mutex::new(Box::new(RandomSelector)),
            #[cfg(test)]
            fail_customization: false,
        })
    }

    /// Make every customization attempt fail, exercising the downgrade
    /// path in [`Self::process_and_customize`]
    #[cfg(test)]
    fn with_failing_customization(mut self) -> Self {
        self.fail_customization = true;
        self
    }

    /// Replace the selection source, pinning asset choice in tests
    #[must_use]
    pub fn with_selector(mut self, selector: Box<dyn Selector>) -> Self {
        self.selector = Mutex::new(selector);
        self
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Background variants currently present in the asset catalog
    #[must_use]
    pub fn background_variants(&self) -> Vec<String> {
        let catalog = read_lock(&self.catalog);
        catalog
            .background_variants()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Re-scan the asset root, picking up assets added since startup
    pub fn rescan_assets(&self) {
        write_lock(&self.catalog).rescan();
    }

    /// Remove the background from `image`, producing an RGBA cutout at the
    /// source dimensions
    ///
    /// # Errors
    /// - `ModelUnavailable` when the backend lost its initialized state
    /// - `Inference` when the forward pass fails
    /// - `Composition` on an internal dimension invariant violation
    #[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn remove_background(&self, image: &DynamicImage) -> Result<CutoutResult> {
        let total_start = Instant::now();
        let mut timings = PipelineTimings::default();

        let mask = {
            let mut backend = lock(&self.backend);
            MaskProducer::produce(
                image,
                backend.as_mut(),
                &self.config.preprocessing,
                &mut timings,
            )?
        };

        let masking_start = Instant::now();
        let cutout = AlphaCompositor::apply(image, &mask, self.config.foreground_threshold)?;
        timings.masking_ms += masking_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        log::debug!(
            "cutout produced in {}ms ({:.0}% foreground)",
            timings.total_ms,
            mask.foreground_ratio(self.config.foreground_threshold) * 100.0
        );

        Ok(CutoutResult {
            original_dimensions: image_dimensions(image),
            image: cutout,
            mask,
            timings,
        })
    }

    /// Decode `bytes` and remove the background
    ///
    /// # Errors
    /// Adds `Image` decode failures to the [`Self::remove_background`] set.
    pub fn remove_background_bytes(&self, bytes: &[u8]) -> Result<CutoutResult> {
        let image = image::load_from_memory(bytes)?;
        self.remove_background(&image)
    }

    /// Apply background and overlay treatment to an already-transparent image
    ///
    /// Each stage is optional: the background stage runs only for a
    /// non-transparent spec, the overlay stage only for a known kind. Order
    /// is fixed, background before overlay.
    ///
    /// # Errors
    /// `Composition` on an internal invariant violation; asset problems are
    /// absorbed by the per-stage fallbacks.
    pub fn customize(
        &self,
        image: &RgbaImage,
        background: Option<&str>,
        overlay: Option<&str>,
    ) -> Result<RgbaImage> {
        let mut timings = PipelineTimings::default();
        let (result, _) = self.customize_stages(image, background, overlay, &mut timings)?;
        Ok(result)
    }

    /// Run the combined pipeline: cutout, then customization
    ///
    /// Partial-success policy: when customization fails after a successful
    /// cutout, the cutout is returned alone with `customized == false`
    /// rather than propagating the failure.
    ///
    /// # Errors
    /// Only cutout-stage failures propagate, see [`Self::remove_background`].
    #[tracing::instrument(skip_all, fields(background = ?background, overlay = ?overlay))]
    pub fn process_and_customize(
        &self,
        image: &DynamicImage,
        background: Option<&str>,
        overlay: Option<&str>,
    ) -> Result<PipelineOutput> {
        let total_start = Instant::now();
        let cutout = self.remove_background(image)?;
        let mut timings = cutout.timings.clone();

        let (final_image, customized) =
            match self.customize_stages(&cutout.image, background, overlay, &mut timings) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("customization failed ({e}), returning the bare cutout");
                    (cutout.image, false)
                },
            };
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        Ok(PipelineOutput {
            image: final_image,
            mask: cutout.mask,
            customized,
            timings,
        })
    }

    /// Decode `bytes` and run the combined pipeline
    ///
    /// # Errors
    /// Adds `Image` decode failures to the [`Self::process_and_customize`]
    /// set.
    pub fn process_bytes(
        &self,
        bytes: &[u8],
        background: Option<&str>,
        overlay: Option<&str>,
    ) -> Result<PipelineOutput> {
        let image = image::load_from_memory(bytes)?;
        self.process_and_customize(&image, background, overlay)
    }

    /// Run [`apply_customization`] against the shared catalog and selector
    fn customize_stages(
        &self,
        image: &RgbaImage,
        background: Option<&str>,
        overlay: Option<&str>,
        timings: &mut PipelineTimings,
    ) -> Result<(RgbaImage, bool)> {
        #[cfg(test)]
        if self.fail_customization {
            return Err(crate::error::StudioError::composition(
                "customization forced to fail",
            ));
        }

        let catalog = read_lock(&self.catalog);
        let mut selector = lock(&self.selector);
        apply_customization(
            image,
            background,
            overlay,
            &catalog,
            selector.as_mut(),
            timings,
        )
    }
}

/// Optional background stage followed by optional overlay stage
///
/// The background stage runs only for a non-transparent spec, the overlay
/// stage only for a known kind; order is fixed. The boolean reports whether
/// at least one stage actually ran.
pub(crate) fn apply_customization(
    image: &RgbaImage,
    background: Option<&str>,
    overlay: Option<&str>,
    catalog: &AssetCatalog,
    selector: &mut dyn Selector,
    timings: &mut PipelineTimings,
) -> Result<(RgbaImage, bool)> {
    let mut current = image.clone();
    let mut applied = false;

    if let Some(spec) = background.map(BackgroundSpec::parse) {
        if !spec.is_transparent() {
            let stage_start = Instant::now();
            current = BackgroundResolver::resolve(&current, spec, catalog, selector)?;
            timings.background_ms = stage_start.elapsed().as_millis() as u64;
            applied = true;
        }
    }

    if let Some(kind) = overlay.and_then(OverlayKind::parse) {
        let stage_start = Instant::now();
        current = OverlayCompositor::compose(&current, kind, catalog)?;
        timings.overlay_ms = stage_start.elapsed().as_millis() as u64;
        applied = true;
    }

    Ok((current, applied))
}

fn image_dimensions(image: &DynamicImage) -> (u32, u32) {
    (image.width(), image.height())
}

// Poisoning only happens after a panic on another thread; the protected
// state is still structurally valid, so recover the guard and continue.
fn lock<T: ?Sized>(mutex: &Mutex<Box<T>>) -> MutexGuard<'_, Box<T>> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}
