//! On-disk asset catalog and selection
//!
//! The catalog indexes real backdrop photography and overlay templates found
//! under the asset root:
//!
//! ```text
//! {root}/backgrounds/{variant}-{n}.{jpg|jpeg|png}
//! {root}/models/{kind}.png
//! ```
//!
//! A missing or unreadable directory yields an empty catalog rather than an
//! error; downstream resolvers treat "no candidates" as a normal state and
//! fall back to procedural generation.

use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BACKGROUND_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Injectable choice among equally-valid candidates
///
/// Production uses [`RandomSelector`]; tests pin the choice with
/// [`FixedSelector`] to make asset resolution deterministic.
pub trait Selector: Send {
    /// Pick an index in `0..len`. Never called with `len == 0`.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform random selection, no persistence of prior choices
#[derive(Debug, Default)]
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index (clamped to the candidate range)
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl Selector for FixedSelector {
    fn pick(&mut self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Index of available background and overlay template assets
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
    backgrounds: HashMap<String, Vec<PathBuf>>,
    overlays: HashMap<String, PathBuf>,
}

impl AssetCatalog {
    /// Scan the asset root and build the catalog
    ///
    /// Never fails: missing directories log a warning and produce an empty
    /// index for that asset class.
    pub fn scan<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        let mut catalog = Self {
            root,
            backgrounds: HashMap::new(),
            overlays: HashMap::new(),
        };
        catalog.rescan();
        catalog
    }

    /// Re-scan the asset root, replacing the current index
    pub fn rescan(&mut self) {
        self.backgrounds = Self::scan_backgrounds(&self.root.join("backgrounds"));
        self.overlays = Self::scan_overlays(&self.root.join("models"));

        let candidate_count: usize = self.backgrounds.values().map(Vec::len).sum();
        log::info!(
            "asset catalog: {} background candidates across {} variants, {} overlay templates",
            candidate_count,
            self.backgrounds.len(),
            self.overlays.len()
        );
    }

    /// Background candidates for a variant, in deterministic (sorted) order
    #[must_use]
    pub fn background_candidates(&self, variant: &str) -> &[PathBuf] {
        self.backgrounds
            .get(variant)
            .map_or(&[], |candidates| candidates.as_slice())
    }

    /// Single overlay template for a kind, when one exists
    #[must_use]
    pub fn overlay_template(&self, kind: &str) -> Option<&Path> {
        self.overlays.get(kind).map(PathBuf::as_path)
    }

    /// All background variants with at least one candidate
    #[must_use]
    pub fn background_variants(&self) -> Vec<&str> {
        let mut variants: Vec<&str> = self.backgrounds.keys().map(String::as_str).collect();
        variants.sort_unstable();
        variants
    }

    /// Whether the catalog holds no assets at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backgrounds.is_empty() && self.overlays.is_empty()
    }

    fn scan_backgrounds(dir: &Path) -> HashMap<String, Vec<PathBuf>> {
        let mut backgrounds: HashMap<String, Vec<PathBuf>> = HashMap::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "backgrounds directory '{}' not readable ({e}), catalog stays empty",
                    dir.display()
                );
                return backgrounds;
            },
        };

        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            if let Some(variant) = Self::parse_background_name(&path) {
                backgrounds.entry(variant).or_default().push(path);
            }
        }

        for candidates in backgrounds.values_mut() {
            candidates.sort();
        }

        backgrounds
    }

    fn scan_overlays(dir: &Path) -> HashMap<String, PathBuf> {
        let mut overlays = HashMap::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "models directory '{}' not readable ({e}), catalog stays empty",
                    dir.display()
                );
                return overlays;
            },
        };

        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            if let Some(kind) = path.file_stem().and_then(|stem| stem.to_str()) {
                overlays.insert(kind.to_owned(), path.clone());
            }
        }

        overlays
    }

    /// Extract the variant from a `{variant}-{index}.{ext}` file name
    fn parse_background_name(path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?;
        if !BACKGROUND_EXTENSIONS
            .iter()
            .any(|ext| extension.eq_ignore_ascii_case(ext))
        {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;
        let (variant, index) = stem.rsplit_once('-')?;
        if variant.is_empty() || index.parse::<u32>().is_err() {
            return None;
        }
        Some(variant.to_owned())
    }
}
