//! Font resolution and glyph geometry.
//!
//! [`FontBook`] maps logical family names ("Arial", "sans-serif") to font
//! faces found by fontdb, and turns text into metrics and tiny-skia paths
//! using ab_glyph outlines.
//!
//! Faces are resolved in order: the requested family, the configured
//! fallback family, then any face in the database. Resolved faces are
//! cached per family name.
//!
//! # Example
//!
//! ```ignore
//! use watermark_studio::watermark::FontBook;
//!
//! let mut fonts = FontBook::system();
//! let face = fonts.resolve("Arial")?;
//! let width = face.advance_width("Copyright 2025", 48.0);
//! ```

use super::WatermarkError;
use crate::constants::DEFAULT_FALLBACK_FAMILY;
use ab_glyph::{Font, FontVec, GlyphId, OutlineCurve, Point};
use fontdb::{Database, Family, Query};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::PathBuilder;

/// A parsed font face ready for measuring and outlining text.
pub struct LoadedFace {
    font: FontVec,
    units_per_em: f32,
}

impl std::fmt::Debug for LoadedFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFace")
            .field("units_per_em", &self.units_per_em)
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl LoadedFace {
    /// Parse a face from raw font file bytes.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec_and_index(data, index)
            .map_err(|e| WatermarkError::FontUnavailable(format!("invalid font data: {}", e)))?;
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        Ok(Self { font, units_per_em })
    }

    /// Design units to pixels for an em size of `size_px`.
    fn scale(&self, size_px: f32) -> f32 {
        size_px / self.units_per_em
    }

    /// Glyph ids and their pen positions in design units, plus the total advance.
    fn layout(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor = 0.0f32;
        let mut prev: Option<GlyphId> = None;

        for c in text.chars() {
            let id = self.font.glyph_id(c);
            if let Some(prev) = prev {
                cursor += self.font.kern_unscaled(prev, id);
            }
            glyphs.push((id, cursor));
            cursor += self.font.h_advance_unscaled(id);
            prev = Some(id);
        }

        (glyphs, cursor)
    }

    /// Advance width of `text` in pixels.
    pub fn advance_width(&self, text: &str, size_px: f32) -> f32 {
        let (_, advance) = self.layout(text);
        advance * self.scale(size_px)
    }

    /// Outline of `text` as a path with its baseline origin at (0, 0).
    ///
    /// Returns `None` when the text has no visible outline (e.g. only spaces).
    pub fn text_path(&self, text: &str, size_px: f32) -> Option<tiny_skia::Path> {
        let scale = self.scale(size_px);
        let (glyphs, _) = self.layout(text);
        let mut builder = PathBuilder::new();

        for (id, pen_x) in glyphs {
            let Some(outline) = self.font.outline(id) else {
                continue;
            };

            // Font units are y-up; the surface is y-down
            let map = |p: Point| ((pen_x + p.x) * scale, -p.y * scale);
            let mut pen: Option<Point> = None;

            for curve in &outline.curves {
                let start = match curve {
                    OutlineCurve::Line(a, _)
                    | OutlineCurve::Quad(a, _, _)
                    | OutlineCurve::Cubic(a, _, _, _) => *a,
                };
                if pen != Some(start) {
                    if pen.is_some() {
                        builder.close();
                    }
                    let (x, y) = map(start);
                    builder.move_to(x, y);
                }

                let end = match curve {
                    OutlineCurve::Line(_, b) => {
                        let (x, y) = map(*b);
                        builder.line_to(x, y);
                        *b
                    }
                    OutlineCurve::Quad(_, c, b) => {
                        let (cx, cy) = map(*c);
                        let (x, y) = map(*b);
                        builder.quad_to(cx, cy, x, y);
                        *b
                    }
                    OutlineCurve::Cubic(_, c1, c2, b) => {
                        let (c1x, c1y) = map(*c1);
                        let (c2x, c2y) = map(*c2);
                        let (x, y) = map(*b);
                        builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
                        *b
                    }
                };
                pen = Some(end);
            }

            if pen.is_some() {
                builder.close();
            }
        }

        builder.finish()
    }
}

/// Family-name to font-face resolver backed by a fontdb database.
#[derive(Clone)]
pub struct FontBook {
    db: Database,
    fallback_family: String,
    cache: HashMap<String, Arc<LoadedFace>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("fallback_family", &self.fallback_family)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    /// A font book with no faces loaded.
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            fallback_family: DEFAULT_FALLBACK_FAMILY.to_string(),
            cache: HashMap::new(),
        }
    }

    /// A font book populated from the system font directories.
    pub fn system() -> Self {
        let mut book = Self::empty();
        book.db.load_system_fonts();
        tracing::debug!(faces = book.db.len(), "Loaded system fonts");
        book
    }

    pub fn with_fallback_family(mut self, family: impl Into<String>) -> Self {
        self.fallback_family = family.into();
        self.cache.clear();
        self
    }

    /// Recursively load every font file under `path`.
    pub fn load_fonts_dir<P: AsRef<Path>>(&mut self, path: P) {
        self.db.load_fonts_dir(path);
        self.cache.clear();
    }

    /// Load a font from binary data, validating it first.
    pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<(), WatermarkError> {
        LoadedFace::from_bytes(data.clone(), 0)?;
        self.db.load_font_data(data);
        self.cache.clear();
        Ok(())
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Resolve a family name to a loaded face.
    pub fn resolve(&mut self, family: &str) -> Result<Arc<LoadedFace>, WatermarkError> {
        if let Some(face) = self.cache.get(family) {
            return Ok(Arc::clone(face));
        }

        let id = self
            .query(family)
            .or_else(|| {
                let fallback = self.query(&self.fallback_family);
                if fallback.is_some() {
                    tracing::warn!(
                        family = family,
                        fallback = %self.fallback_family,
                        "Font family not installed, using fallback"
                    );
                }
                fallback
            })
            .or_else(|| self.db.faces().next().map(|info| info.id))
            .ok_or_else(|| WatermarkError::FontUnavailable(family.to_string()))?;

        let face = self
            .db
            .with_face_data(id, |data, index| LoadedFace::from_bytes(data.to_vec(), index))
            .ok_or_else(|| WatermarkError::FontUnavailable(family.to_string()))??;

        let face = Arc::new(face);
        self.cache.insert(family.to_string(), Arc::clone(&face));
        Ok(face)
    }

    fn query(&self, family: &str) -> Option<fontdb::ID> {
        let families = [generic_family(family).unwrap_or(Family::Name(family))];
        let query = Query {
            families: &families,
            ..Query::default()
        };
        let id = self.db.query(&query)?;

        // fontdb answers generic families with whatever face it considers
        // closest; only accept named matches when the family really matches.
        if let Family::Name(name) = families[0] {
            let info = self.db.face(id)?;
            let matches = info
                .families
                .iter()
                .any(|(candidate, _)| candidate.eq_ignore_ascii_case(name));
            if !matches {
                return None;
            }
        }
        Some(id)
    }
}

fn generic_family(name: &str) -> Option<Family<'static>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Some(Family::Serif),
        "sans-serif" => Some(Family::SansSerif),
        "monospace" => Some(Family::Monospace),
        "cursive" => Some(Family::Cursive),
        "fantasy" => Some(Family::Fantasy),
        _ => None,
    }
}
