//! Grayscale template matching.
//!
//! Scores are the normalized correlation coefficient between the template
//! and every same-sized window of the frame, in `[-1, 1]`. Window sums come
//! from integral images; correlation rows are computed in parallel. Score
//! maps are cached per template until the next frame arrives, because the
//! detection ladder queries the same template at several thresholds.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use image::GrayImage;
use rayon::prelude::*;
use sortie_core::geometry::{Point, Region};
use sortie_core::spatial::PointIndex;
use tracing::debug;

use crate::error::{DeviceError, Result};

/// Matches closer than this to an already kept match are dropped.
pub const SIMILAR_COORD_DISTANCE: i32 = 10;

/// Windows with less variance than this score zero.
const FLAT_VARIANCE: f64 = 1e-6;

/// A template prepared for correlation.
#[derive(Debug)]
pub struct PreparedTemplate {
    width: u32,
    height: u32,
    centered: Vec<f64>,
    norm: f64,
}

impl PreparedTemplate {
    /// Subtract the mean and precompute the norm.
    #[must_use]
    pub fn new(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let n = f64::from(width * height).max(1.0);
        let mean = image.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / n;
        let centered: Vec<f64> = image.pixels().map(|p| f64::from(p.0[0]) - mean).collect();
        let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
        Self {
            width,
            height,
            centered,
            norm,
        }
    }

    /// Template size.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Named templates loaded once at startup.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, Arc<PreparedTemplate>>,
}

impl TemplateLibrary {
    /// An empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.png` in `dir`, keyed by file stem.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| DeviceError::AssetDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut library = Self::new();
        for entry in entries {
            let path = entry
                .map_err(|source| DeviceError::AssetDir {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
                continue;
            };
            let image = image::open(&path)
                .map_err(|source| DeviceError::Template {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            library.insert(name, &image);
        }
        debug!(count = library.len(), dir = %dir.display(), "templates loaded");
        Ok(library)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, name: impl Into<String>, image: &GrayImage) {
        self.templates
            .insert(name.into(), Arc::new(PreparedTemplate::new(image)));
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Result<Arc<PreparedTemplate>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| DeviceError::UnknownTemplate(name.to_string()))
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Summed-area tables of pixel values and squared pixel values.
#[derive(Debug, Default)]
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sq: Vec<f64>,
}

impl Integral {
    fn new(frame: &GrayImage) -> Self {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sq = vec![0.0; stride * (h + 1)];
        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = f64::from(frame.get_pixel(x as u32, y as u32).0[0]);
                row_sum += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
                sq[(y + 1) * stride + x + 1] = sq[y * stride + x + 1] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    fn window(table: &[f64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> f64 {
        table[(y + h) * stride + x + w] - table[y * stride + x + w] - table[(y + h) * stride + x]
            + table[y * stride + x]
    }

    /// Sum and squared sum of the window at `(x, y)`.
    fn stats(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        (
            Self::window(&self.sum, self.stride, x, y, w, h),
            Self::window(&self.sq, self.stride, x, y, w, h),
        )
    }
}

/// Correlation scores of one template over one frame.
#[derive(Debug)]
pub struct ScoreMap {
    width: usize,
    height: usize,
    template_w: u32,
    template_h: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    /// Score at window position `(x, y)`.
    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.scores[y * self.width + x]
    }

    /// Highest-scoring window, first in row-major order on ties.
    #[must_use]
    pub fn best(&self) -> Option<(Point, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &s) in self.scores.iter().enumerate() {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((i, s));
            }
        }
        best.map(|(i, s)| (self.point(i), s))
    }

    /// Every window scoring at least `threshold`, in row-major order.
    #[must_use]
    pub fn above(&self, threshold: f32) -> Vec<Point> {
        self.scores
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s >= threshold)
            .map(|(i, _)| self.point(i))
            .collect()
    }

    fn point(&self, index: usize) -> Point {
        Point::new((index % self.width) as i32, (index / self.width) as i32)
    }
}

/// Score every window of `frame` against `template`.
fn correlate(frame: &GrayImage, integral: &Integral, template: &PreparedTemplate) -> ScoreMap {
    let (fw, fh) = (frame.width() as usize, frame.height() as usize);
    let (tw, th) = (template.width as usize, template.height as usize);
    if tw == 0 || th == 0 || tw > fw || th > fh {
        return ScoreMap {
            width: 0,
            height: 0,
            template_w: template.width,
            template_h: template.height,
            scores: Vec::new(),
        };
    }

    let (out_w, out_h) = (fw - tw + 1, fh - th + 1);
    let n = (tw * th) as f64;
    let pixels = frame.as_raw();
    let mut scores = vec![0.0f32; out_w * out_h];

    scores
        .par_chunks_mut(out_w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, score) in row.iter_mut().enumerate() {
                let (sum, sq) = integral.stats(x, y, tw, th);
                let variance = sq - sum * sum / n;
                if variance <= FLAT_VARIANCE || template.norm <= 0.0 {
                    continue;
                }
                let mut numerator = 0.0;
                for ty in 0..th {
                    let frame_row = &pixels[(y + ty) * fw + x..(y + ty) * fw + x + tw];
                    let template_row = &template.centered[ty * tw..(ty + 1) * tw];
                    for (f, t) in frame_row.iter().zip(template_row) {
                        numerator += f64::from(*f) * t;
                    }
                }
                *score = (numerator / (template.norm * variance.sqrt())) as f32;
            }
        });

    ScoreMap {
        width: out_w,
        height: out_h,
        template_w: template.width,
        template_h: template.height,
        scores,
    }
}

/// Drop points closer than [`SIMILAR_COORD_DISTANCE`] (inclusive) to an
/// earlier kept point.
#[must_use]
pub fn filter_similar_coords(points: &[Point]) -> Vec<Point> {
    let mut index = PointIndex::new(SIMILAR_COORD_DISTANCE + 1);
    let mut kept = Vec::new();
    for &p in points {
        let close = index
            .nearest_within(p)
            .is_some_and(|(_, d)| d <= f64::from(SIMILAR_COORD_DISTANCE));
        if !close {
            index.insert(p);
            kept.push(p);
        }
    }
    kept
}

/// Matches templates from a library against the current frame.
#[derive(Debug)]
pub struct FrameMatcher {
    library: TemplateLibrary,
    frame: GrayImage,
    integral: Integral,
    cache: Mutex<HashMap<String, Arc<ScoreMap>>>,
}

impl FrameMatcher {
    /// A matcher with an empty frame; nothing matches until a frame is set.
    #[must_use]
    pub fn new(library: TemplateLibrary) -> Self {
        Self {
            library,
            frame: GrayImage::new(0, 0),
            integral: Integral::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The template library.
    #[must_use]
    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Replace the current frame.
    pub fn set_frame(&mut self, frame: GrayImage) {
        self.integral = Integral::new(&frame);
        self.frame = frame;
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The current frame.
    #[must_use]
    pub fn frame(&self) -> &GrayImage {
        &self.frame
    }

    /// Score map of `name` over the current frame, computed once per frame.
    pub fn scores(&self, name: &str) -> Result<Arc<ScoreMap>> {
        if let Some(map) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(map));
        }
        let template = self.library.get(name)?;
        let map = Arc::new(correlate(&self.frame, &self.integral, &template));
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&map));
        Ok(map)
    }

    /// Best match of `name` if it scores at least `similarity`.
    pub fn find(&self, name: &str, similarity: f32) -> Result<Option<Region>> {
        let map = self.scores(name)?;
        Ok(map.best().and_then(|(p, score)| {
            (score >= similarity).then(|| {
                Region::new(p.x, p.y, map.template_w as i32, map.template_h as i32)
            })
        }))
    }

    /// Top-left corners of every match of `name` scoring at least
    /// `similarity`, with near-identical positions collapsed.
    pub fn find_all(&self, name: &str, similarity: f32) -> Result<Vec<Point>> {
        let map = self.scores(name)?;
        Ok(filter_similar_coords(&map.above(similarity)))
    }
}
