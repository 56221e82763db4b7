//! Overlay template placement
//!
//! Composites a product cutout onto a model, mannequin, or flat-lay
//! template. A real template asset from the catalog is preferred and scaled
//! relative to the product; when no asset exists (or loading fails) a
//! simplified silhouette is drawn procedurally so the pipeline always
//! produces a result.

use crate::{
    assets::AssetCatalog,
    error::{Result, StudioError},
};
use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

/// Overlay template kinds and their placement policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Standing human model, product anchored at the chest
    StandingModel,
    /// Display mannequin, product anchored at the chest
    Mannequin,
    /// Flat-lay surface, product centered
    FlatLay,
}

impl OverlayKind {
    /// Parse a request-level overlay identifier; unknown kinds are `None`
    /// and the orchestrator skips the overlay stage entirely.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "model-standing" => Some(Self::StandingModel),
            "mannequin" => Some(Self::Mannequin),
            "flat-lay" => Some(Self::FlatLay),
            _ => None,
        }
    }

    /// Catalog identifier, the `{kind}` part of `{kind}.png`
    #[must_use]
    pub fn asset_name(self) -> &'static str {
        match self {
            Self::StandingModel => "model-standing",
            Self::Mannequin => "mannequin",
            Self::FlatLay => "flat-lay",
        }
    }
}

/// Composites products onto overlay templates
pub struct OverlayCompositor;

impl OverlayCompositor {
    /// Compose `product` onto the template for `kind`
    ///
    /// The output canvas contains both the product and the (scaled) template;
    /// it is at least as large as either along each axis.
    ///
    /// # Errors
    /// Asset load failures are recovered by the silhouette fallback;
    /// `Composition` errors indicate an internal invariant violation.
    pub fn compose(
        product: &RgbaImage,
        kind: OverlayKind,
        catalog: &AssetCatalog,
    ) -> Result<RgbaImage> {
        if let Some(path) = catalog.overlay_template(kind.asset_name()) {
            match Self::compose_with_template(product, kind, path) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    log::warn!("{e}; drawing a {} silhouette instead", kind.asset_name());
                },
            }
        }
        Ok(Self::compose_with_silhouette(product, kind))
    }

    /// Place the product over a real template asset
    fn compose_with_template(
        product: &RgbaImage,
        kind: OverlayKind,
        path: &std::path::Path,
    ) -> Result<RgbaImage> {
        let template = image::open(path)
            .map_err(|e| StudioError::asset_load_from_path(path, e))?
            .to_rgba8();

        let (product_w, product_h) = product.dimensions();
        let (template_w, template_h) = template.dimensions();
        if template_w == 0 || template_h == 0 {
            return Err(StudioError::asset_load_from_path(path, "empty template"));
        }

        // Scale the template so it is comfortably larger than the product:
        // 1.5x the product width or 2.5x the product height, whichever
        // constraint binds first.
        let scale = (product_w as f32 * 1.5 / template_w as f32)
            .min(product_h as f32 * 2.5 / template_h as f32);
        let scaled_w = ((template_w as f32 * scale).round() as u32).max(1);
        let scaled_h = ((template_h as f32 * scale).round() as u32).max(1);
        let scaled = imageops::resize(&template, scaled_w, scaled_h, FilterType::Triangle);

        let canvas_w = product_w.max(scaled_w);
        let canvas_h = product_h.max(scaled_h);
        let mut canvas = RgbaImage::new(canvas_w, canvas_h);

        // Template centered in the canvas
        let template_x = i64::from((canvas_w - scaled_w) / 2);
        let template_y = i64::from((canvas_h - scaled_h) / 2);
        imageops::overlay(&mut canvas, &scaled, template_x, template_y);

        let (product_x, product_y) = match kind {
            OverlayKind::StandingModel | OverlayKind::Mannequin => {
                // Horizontal center; product centered vertically on the
                // template's center plus a quarter of the scaled template
                // height, approximating chest placement
                let anchor_y = template_y + i64::from(scaled_h / 2) + i64::from(scaled_h / 4);
                (
                    i64::from((canvas_w - product_w) / 2),
                    anchor_y - i64::from(product_h / 2),
                )
            },
            OverlayKind::FlatLay => (
                i64::from((canvas_w - product_w) / 2),
                i64::from((canvas_h - product_h) / 2),
            ),
        };
        imageops::overlay(&mut canvas, product, product_x, product_y);

        Ok(canvas)
    }

    /// Draw a simplified silhouette and place the product on it
    fn compose_with_silhouette(product: &RgbaImage, kind: OverlayKind) -> RgbaImage {
        let (product_w, product_h) = product.dimensions();
        let canvas_w = product_w.max(1);
        let canvas_h = (product_h * 2).max(2);
        let mut canvas = RgbaImage::new(canvas_w, canvas_h);

        match kind {
            OverlayKind::StandingModel => Self::draw_standing_model(&mut canvas),
            OverlayKind::Mannequin => Self::draw_mannequin(&mut canvas),
            OverlayKind::FlatLay => {},
        }

        let (product_x, product_y) = match kind {
            OverlayKind::StandingModel | OverlayKind::Mannequin => {
                let anchor_y = i64::from(canvas_h / 2) + i64::from(canvas_h / 4);
                (
                    i64::from((canvas_w - product_w) / 2),
                    anchor_y - i64::from(product_h / 2),
                )
            },
            OverlayKind::FlatLay => (
                i64::from((canvas_w - product_w) / 2),
                i64::from((canvas_h - product_h) / 2),
            ),
        };
        imageops::overlay(&mut canvas, product, product_x, product_y);

        canvas
    }

    /// Head ellipse plus torso and leg rectangles
    fn draw_standing_model(canvas: &mut RgbaImage) {
        let (w, h) = canvas.dimensions();
        let body_color = Rgba([60, 60, 60, 220]);

        let center_x = (w / 2) as i32;
        let head_y = (h / 6) as i32;
        let head_radius = ((w / 12).max(1)) as i32;
        draw_filled_ellipse_mut(canvas, (center_x, head_y), head_radius, head_radius, body_color);

        // Torso from below the head to mid-canvas
        let torso_half = (w / 6).max(1);
        let torso_top = head_y + head_radius;
        let torso_bottom = (h / 2) as i32;
        if torso_bottom > torso_top {
            draw_filled_rect_mut(
                canvas,
                Rect::at(center_x - torso_half as i32, torso_top)
                    .of_size(torso_half * 2, (torso_bottom - torso_top) as u32),
                body_color,
            );
        }

        // Two legs from mid-canvas toward the bottom
        let leg_width = (w / 10).max(1);
        let leg_top = torso_bottom;
        let leg_height = (h * 4 / 10).max(1);
        let left_leg_x = center_x - torso_half as i32;
        let right_leg_x = center_x + torso_half as i32 - leg_width as i32;
        for leg_x in [left_leg_x, right_leg_x] {
            draw_filled_rect_mut(
                canvas,
                Rect::at(leg_x, leg_top).of_size(leg_width, leg_height),
                body_color,
            );
        }
    }

    /// Head ellipse plus a single body rectangle
    fn draw_mannequin(canvas: &mut RgbaImage) {
        let (w, h) = canvas.dimensions();
        let body_color = Rgba([220, 220, 220, 220]);

        let center_x = (w / 2) as i32;
        let head_y = (h / 6) as i32;
        let head_radius = ((w / 14).max(1)) as i32;
        draw_filled_ellipse_mut(canvas, (center_x, head_y), head_radius, head_radius, body_color);

        let body_half = (w / 6).max(1);
        let body_top = head_y + head_radius;
        let body_height = (h / 2).max(1);
        draw_filled_rect_mut(
            canvas,
            Rect::at(center_x - body_half as i32, body_top).of_size(body_half * 2, body_height),
            body_color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn product(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]))
    }

    fn empty_catalog() -> AssetCatalog {
        AssetCatalog::scan("/definitely/not/a/real/path")
    }

    #[test]
    fn test_parse_overlay_kinds() {
        assert_eq!(
            OverlayKind::parse("model-standing"),
            Some(OverlayKind::StandingModel)
        );
        assert_eq!(OverlayKind::parse("mannequin"), Some(OverlayKind::Mannequin));
        assert_eq!(OverlayKind::parse("flat-lay"), Some(OverlayKind::FlatLay));
        assert_eq!(OverlayKind::parse("hologram"), None);
    }

    #[test]
    fn test_flat_lay_fallback_placement() {
        // 50x50 product, no real asset: 50x100 canvas, product at (0, 25)
        let result =
            OverlayCompositor::compose(&product(50, 50), OverlayKind::FlatLay, &empty_catalog())
                .unwrap();

        assert_eq!(result.dimensions(), (50, 100));
        assert_eq!(result.get_pixel(0, 24)[3], 0);
        assert_eq!(result.get_pixel(0, 25).0, [255, 0, 0, 255]);
        assert_eq!(result.get_pixel(49, 74).0, [255, 0, 0, 255]);
        assert_eq!(result.get_pixel(0, 75)[3], 0);
    }

    #[test]
    fn test_silhouette_fallback_canvas_dimensions() {
        for kind in [
            OverlayKind::StandingModel,
            OverlayKind::Mannequin,
            OverlayKind::FlatLay,
        ] {
            let result =
                OverlayCompositor::compose(&product(60, 80), kind, &empty_catalog()).unwrap();
            assert_eq!(result.dimensions(), (60, 160));
        }
    }

    #[test]
    fn test_standing_silhouette_is_drawn() {
        let result = OverlayCompositor::compose(
            &product(80, 80),
            OverlayKind::StandingModel,
            &empty_catalog(),
        )
        .unwrap();

        // Head region carries silhouette pixels
        let head = result.get_pixel(40, 160 / 6);
        assert_eq!(head.0, [60, 60, 60, 220]);
    }

    #[test]
    fn test_flat_lay_fallback_draws_no_silhouette() {
        let result =
            OverlayCompositor::compose(&product(40, 40), OverlayKind::FlatLay, &empty_catalog())
                .unwrap();

        // Everything outside the centered product stays fully transparent
        assert_eq!(result.get_pixel(20, 0)[3], 0);
        assert_eq!(result.get_pixel(20, 79)[3], 0);
    }

    #[test]
    fn test_real_template_canvas_contains_both() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir_all(&models).unwrap();
        let template = RgbaImage::from_pixel(100, 200, Rgba([0, 255, 0, 255]));
        template.save(models.join("mannequin.png")).unwrap();

        let catalog = AssetCatalog::scan(dir.path());
        let product = product(40, 40);
        let result =
            OverlayCompositor::compose(&product, OverlayKind::Mannequin, &catalog).unwrap();

        // scale = min(40*1.5/100, 40*2.5/200) = min(0.6, 0.5) = 0.5
        // scaled template is 50x100, canvas per-axis max of product/template
        let (canvas_w, canvas_h) = result.dimensions();
        assert_eq!((canvas_w, canvas_h), (50, 100));
        assert!(canvas_w >= 40 && canvas_h >= 40);
    }

    #[test]
    fn test_corrupt_template_falls_back_to_silhouette() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::write(models.join("model-standing.png"), b"not a png").unwrap();

        let catalog = AssetCatalog::scan(dir.path());
        let result =
            OverlayCompositor::compose(&product(30, 30), OverlayKind::StandingModel, &catalog)
                .unwrap();

        // Fallback canvas proportions, not an error
        assert_eq!(result.dimensions(), (30, 60));
    }
}
