//! Background resolution and compositing
//!
//! Resolves a requested background treatment to a concrete raster of the
//! cutout's dimensions, then composites the cutout on top with straight
//! alpha-over. Real backdrop photography from the asset catalog is preferred;
//! every studio variant also has a procedural generator so an empty catalog
//! still produces a usable backdrop.

use crate::{
    assets::{AssetCatalog, Selector},
    error::{Result, StudioError},
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

/// Fixed solid backdrop palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidColor {
    White,
    Black,
    Gray,
}

impl SolidColor {
    /// Opaque fill color for this palette entry
    #[must_use]
    pub fn rgba(self) -> Rgba<u8> {
        match self {
            Self::White => Rgba([255, 255, 255, 255]),
            Self::Black => Rgba([0, 0, 0, 255]),
            Self::Gray => Rgba([128, 128, 128, 255]),
        }
    }
}

/// Named studio backdrop styles, backed by real photography or a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioVariant {
    Light,
    Dark,
}

impl StudioVariant {
    /// Catalog identifier, the `{variant}` part of `{variant}-{n}.jpg`
    #[must_use]
    pub fn asset_name(self) -> &'static str {
        match self {
            Self::Light => "studio-light",
            Self::Dark => "studio-dark",
        }
    }
}

/// Requested background treatment
///
/// Resolved against the asset catalog at request time and never cached
/// beyond one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSpec {
    /// Keep the cutout's transparency untouched
    Transparent,
    /// Flat fill from the fixed palette
    Solid(SolidColor),
    /// Studio backdrop, real asset or generated
    Studio(StudioVariant),
    /// Linear blend between two gray tones
    Gradient,
    /// Placeholder for AI-generated backdrops, currently the gradient style
    AiPlaceholder,
}

impl BackgroundSpec {
    /// Parse a request-level background identifier
    ///
    /// Unknown identifiers resolve to opaque white.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "transparent" => Self::Transparent,
            "white" => Self::Solid(SolidColor::White),
            "black" => Self::Solid(SolidColor::Black),
            "gray" | "grey" => Self::Solid(SolidColor::Gray),
            "studio-light" => Self::Studio(StudioVariant::Light),
            "studio-dark" => Self::Studio(StudioVariant::Dark),
            "gradient" => Self::Gradient,
            "ai-generated" => Self::AiPlaceholder,
            other => {
                log::debug!("unknown background '{other}', defaulting to white");
                Self::Solid(SolidColor::White)
            },
        }
    }

    /// Whether resolving this spec is the identity function
    #[must_use]
    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Transparent)
    }
}

/// Number of quantized bands in the radial studio gradients. The gaussian
/// blur pass smears the band edges into a soft falloff.
const RADIAL_BANDS: u32 = 12;

/// Blur radius applied to generated studio backdrops
const STUDIO_BLUR_SIGMA: f32 = 10.0;

/// Gray tones the gradient generator blends between
const GRADIENT_TONES: [u8; 8] = [90, 110, 130, 150, 170, 190, 210, 230];

/// Resolves background specs and composites cutouts over them
pub struct BackgroundResolver;

impl BackgroundResolver {
    /// Resolve `spec` to a backdrop of the cutout's dimensions and composite
    /// the cutout on top at (0, 0)
    ///
    /// # Errors
    /// Returns `Composition` only on internal invariant violations; asset
    /// load failures are handled by falling back to generated content.
    pub fn resolve(
        cutout: &RgbaImage,
        spec: BackgroundSpec,
        catalog: &AssetCatalog,
        selector: &mut dyn Selector,
    ) -> Result<RgbaImage> {
        if spec.is_transparent() {
            return Ok(cutout.clone());
        }

        let (width, height) = cutout.dimensions();
        let background = match spec {
            BackgroundSpec::Transparent => unreachable!("handled above"),
            BackgroundSpec::Solid(color) => RgbaImage::from_pixel(width, height, color.rgba()),
            BackgroundSpec::Studio(variant) => {
                Self::resolve_studio(variant, width, height, catalog, selector)
            },
            BackgroundSpec::Gradient | BackgroundSpec::AiPlaceholder => {
                Self::generate_gradient(width, height, selector)
            },
        };

        Self::composite_over(background, cutout)
    }

    /// Alpha-over the cutout onto the backdrop at offset (0, 0)
    fn composite_over(mut background: RgbaImage, cutout: &RgbaImage) -> Result<RgbaImage> {
        if background.dimensions() != cutout.dimensions() {
            return Err(StudioError::dimension_mismatch(
                cutout.dimensions(),
                background.dimensions(),
            ));
        }
        imageops::overlay(&mut background, cutout, 0, 0);
        Ok(background)
    }

    /// Prefer a real catalog asset, fall back to procedural generation
    fn resolve_studio(
        variant: StudioVariant,
        width: u32,
        height: u32,
        catalog: &AssetCatalog,
        selector: &mut dyn Selector,
    ) -> RgbaImage {
        let candidates = catalog.background_candidates(variant.asset_name());
        if !candidates.is_empty() {
            let path = &candidates[selector.pick(candidates.len())];
            match Self::load_backdrop(path, width, height) {
                Ok(backdrop) => return backdrop,
                Err(e) => log::warn!("{e}; generating a {} backdrop instead", variant.asset_name()),
            }
        }

        match variant {
            StudioVariant::Light => Self::generate_studio_light(width, height),
            StudioVariant::Dark => Self::generate_studio_dark(width, height),
        }
    }

    /// Load a backdrop asset and stretch it to the exact target dimensions.
    /// Aspect ratio is deliberately not preserved.
    fn load_backdrop(path: &std::path::Path, width: u32, height: u32) -> Result<RgbaImage> {
        let decoded =
            image::open(path).map_err(|e| StudioError::asset_load_from_path(path, e))?;
        log::debug!(
            "loaded backdrop '{}' ({}x{}), stretching to {}x{}",
            path.display(),
            decoded.width(),
            decoded.height(),
            width,
            height
        );
        Ok(decoded
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8())
    }

    /// White canvas with concentric rings brightening toward the edges,
    /// softened by a gaussian blur
    #[must_use]
    pub fn generate_studio_light(width: u32, height: u32) -> RgbaImage {
        let rings = Self::radial_rings(width, height, 232, 255);
        imageops::blur(&rings, STUDIO_BLUR_SIGMA)
    }

    /// Near-black canvas with a symmetric dark radial gradient, same blur
    #[must_use]
    pub fn generate_studio_dark(width: u32, height: u32) -> RgbaImage {
        let rings = Self::radial_rings(width, height, 45, 10);
        imageops::blur(&rings, STUDIO_BLUR_SIGMA)
    }

    /// Linear top-to-bottom blend between two gray tones from the fixed set
    #[must_use]
    pub fn generate_gradient(width: u32, height: u32, selector: &mut dyn Selector) -> RgbaImage {
        let top = f32::from(GRADIENT_TONES[selector.pick(GRADIENT_TONES.len())]);
        let bottom = f32::from(GRADIENT_TONES[selector.pick(GRADIENT_TONES.len())]);

        RgbaImage::from_fn(width, height, |_, y| {
            let t = if height <= 1 {
                0.0
            } else {
                y as f32 / (height - 1) as f32
            };
            let tone = (top + (bottom - top) * t).round() as u8;
            Rgba([tone, tone, tone, 255])
        })
    }

    /// Concentric quantized rings interpolating from a center tone to an
    /// edge tone
    fn radial_rings(width: u32, height: u32, center_tone: u8, edge_tone: u8) -> RgbaImage {
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        let max_distance = (center_x * center_x + center_y * center_y).sqrt().max(1.0);
        let center = f32::from(center_tone);
        let edge = f32::from(edge_tone);

        RgbaImage::from_fn(width, height, |x, y| {
            let dx = x as f32 - center_x;
            let dy = y as f32 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            let band = ((distance / max_distance) * RADIAL_BANDS as f32).floor();
            let t = (band / RADIAL_BANDS as f32).min(1.0);
            let tone = (center + (edge - center) * t).round() as u8;
            Rgba([tone, tone, tone, 255])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FixedSelector;
    use image::Rgba;

    fn half_opaque_cutout(width: u32, height: u32) -> RgbaImage {
        // Left half opaque red, right half fully transparent
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([200, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    fn empty_catalog() -> AssetCatalog {
        AssetCatalog::scan("/definitely/not/a/real/path")
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!(BackgroundSpec::parse("transparent"), BackgroundSpec::Transparent);
        assert_eq!(
            BackgroundSpec::parse("white"),
            BackgroundSpec::Solid(SolidColor::White)
        );
        assert_eq!(
            BackgroundSpec::parse("studio-dark"),
            BackgroundSpec::Studio(StudioVariant::Dark)
        );
        assert_eq!(BackgroundSpec::parse("gradient"), BackgroundSpec::Gradient);
        assert_eq!(
            BackgroundSpec::parse("ai-generated"),
            BackgroundSpec::AiPlaceholder
        );
    }

    #[test]
    fn test_parse_unknown_defaults_to_white() {
        assert_eq!(
            BackgroundSpec::parse("holographic"),
            BackgroundSpec::Solid(SolidColor::White)
        );
    }

    #[test]
    fn test_transparent_is_identity() {
        let cutout = half_opaque_cutout(64, 64);
        let mut selector = FixedSelector(0);
        let resolved = BackgroundResolver::resolve(
            &cutout,
            BackgroundSpec::Transparent,
            &empty_catalog(),
            &mut selector,
        )
        .unwrap();
        assert_eq!(resolved.as_raw(), cutout.as_raw());
    }

    #[test]
    fn test_solid_white_compositing() {
        let cutout = half_opaque_cutout(200, 200);
        let mut selector = FixedSelector(0);
        let result = BackgroundResolver::resolve(
            &cutout,
            BackgroundSpec::Solid(SolidColor::White),
            &empty_catalog(),
            &mut selector,
        )
        .unwrap();

        assert_eq!(result.dimensions(), (200, 200));
        // Cutout pixels survive where alpha was 255, white shows elsewhere,
        // and the whole result is opaque
        assert_eq!(result.get_pixel(10, 100).0, [200, 0, 0, 255]);
        assert_eq!(result.get_pixel(150, 100).0, [255, 255, 255, 255]);
        assert!(result.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_studio_with_empty_catalog_generates() {
        let cutout = half_opaque_cutout(120, 90);
        let mut selector = FixedSelector(0);

        for variant in [StudioVariant::Light, StudioVariant::Dark] {
            let result = BackgroundResolver::resolve(
                &cutout,
                BackgroundSpec::Studio(variant),
                &empty_catalog(),
                &mut selector,
            )
            .unwrap();
            assert_eq!(result.dimensions(), (120, 90));
            assert!(result.pixels().all(|p| p[3] == 255));
        }
    }

    #[test]
    fn test_studio_light_brightens_toward_edges() {
        let backdrop = BackgroundResolver::generate_studio_light(100, 100);
        let center = backdrop.get_pixel(50, 50)[0];
        let corner = backdrop.get_pixel(1, 1)[0];
        assert!(corner > center);
        // Stays in the near-white register
        assert!(center >= 220);
    }

    #[test]
    fn test_studio_dark_stays_dark() {
        let backdrop = BackgroundResolver::generate_studio_dark(100, 100);
        let center = backdrop.get_pixel(50, 50)[0];
        let corner = backdrop.get_pixel(1, 1)[0];
        assert!(corner < center);
        assert!(center <= 60);
    }

    #[test]
    fn test_gradient_is_deterministic_with_fixed_selector() {
        let mut selector_a = FixedSelector(2);
        let mut selector_b = FixedSelector(2);
        let a = BackgroundResolver::generate_gradient(40, 40, &mut selector_a);
        let b = BackgroundResolver::generate_gradient(40, 40, &mut selector_b);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_gradient_interpolates_top_to_bottom() {
        // Distinct tones come from a selector that advances between picks
        struct Alternating(usize);
        impl Selector for Alternating {
            fn pick(&mut self, len: usize) -> usize {
                let index = self.0 % len;
                self.0 += len - 1;
                index
            }
        }

        let mut selector = Alternating(0);
        let gradient = BackgroundResolver::generate_gradient(10, 100, &mut selector);
        let top = gradient.get_pixel(5, 0)[0];
        let bottom = gradient.get_pixel(5, 99)[0];
        assert_ne!(top, bottom);
    }

    #[test]
    fn test_real_asset_is_used_and_stretched() {
        let dir = tempfile::tempdir().unwrap();
        let backgrounds = dir.path().join("backgrounds");
        std::fs::create_dir_all(&backgrounds).unwrap();
        let asset = RgbaImage::from_pixel(10, 20, Rgba([0, 0, 255, 255]));
        asset.save(backgrounds.join("studio-light-1.png")).unwrap();

        let catalog = AssetCatalog::scan(dir.path());
        let cutout = RgbaImage::from_pixel(64, 48, Rgba([0, 0, 0, 0]));
        let mut selector = FixedSelector(0);
        let result = BackgroundResolver::resolve(
            &cutout,
            BackgroundSpec::Studio(StudioVariant::Light),
            &catalog,
            &mut selector,
        )
        .unwrap();

        assert_eq!(result.dimensions(), (64, 48));
        assert_eq!(result.get_pixel(32, 24).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_corrupt_asset_falls_back_to_generation() {
        let dir = tempfile::tempdir().unwrap();
        let backgrounds = dir.path().join("backgrounds");
        std::fs::create_dir_all(&backgrounds).unwrap();
        std::fs::write(backgrounds.join("studio-dark-1.jpg"), b"not a jpeg").unwrap();

        let catalog = AssetCatalog::scan(dir.path());
        let cutout = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 0]));
        let mut selector = FixedSelector(0);
        let result = BackgroundResolver::resolve(
            &cutout,
            BackgroundSpec::Studio(StudioVariant::Dark),
            &catalog,
            &mut selector,
        )
        .unwrap();

        assert_eq!(result.dimensions(), (50, 50));
        // Generated dark backdrop, not an error
        assert!(result.get_pixel(25, 25)[0] <= 60);
    }
}
