//! Fractal Perlin heightmap

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::generator::{GenerationMode, TerrainSettings};

/// Smallest usable noise scale; anything at or below zero is clamped to this
pub const MIN_SCALE: f32 = 0.0001;

/// Row-major grid of heights normalized to [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl HeightMap {
    /// Flat map, mostly useful for tests and hand-built worlds
    pub fn flat(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; (width * height) as usize],
        }
    }

    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != (width * height) as usize {
            return None;
        }
        Some(Self { width, height, values })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Index of the highest cell accepted by the filter; first wins on ties
    pub fn highest_index<F>(&self, mut accept: F) -> Option<usize>
    where
        F: FnMut(usize) -> bool,
    {
        let mut best: Option<(usize, f32)> = None;
        for (i, &h) in self.values.iter().enumerate() {
            if !accept(i) {
                continue;
            }
            if best.map_or(true, |(_, bh)| h > bh) {
                best = Some((i, h));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Sample summed octave noise over the grid and normalize it.
///
/// Each octave gets its own random offset drawn from a generator seeded by
/// the terrain seed, so the result depends only on the settings.
pub fn generate_height_map(width: u32, height: u32, settings: &TerrainSettings) -> HeightMap {
    let perlin = Perlin::new(settings.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed as u64);

    let octave_offsets: Vec<(f64, f64)> = (0..settings.octaves)
        .map(|_| {
            let ox = rng.gen_range(-100_000i32..100_000) as f64 + settings.offset.0 as f64;
            let oy = rng.gen_range(-100_000i32..100_000) as f64 + settings.offset.1 as f64;
            (ox, oy)
        })
        .collect();

    let scale = settings.scale.max(MIN_SCALE) as f64;
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;
    let persistence = settings.persistence as f64;
    let lacunarity = settings.lacunarity as f64;

    let mut values = Vec::with_capacity((width * height) as usize);
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut h = 0.0;

            for &(ox, oy) in &octave_offsets {
                let sx = (x as f64 - half_w) / scale * frequency + ox;
                let sy = (y as f64 - half_h) / scale * frequency + oy;
                h += perlin.get([sx, sy]) * amplitude;
                amplitude *= persistence;
                frequency *= lacunarity;
            }

            let dist = ((x as f64 - half_w).powi(2) + (y as f64 - half_h).powi(2)).sqrt();
            h += match settings.mode {
                GenerationMode::Default => 0.0,
                GenerationMode::Lake => dist / 50.0,
                GenerationMode::Island => -dist / 25.0,
            };

            let h = h as f32;
            min = min.min(h);
            max = max.max(h);
            values.push(h);
        }
    }

    let range = max - min;
    for v in &mut values {
        *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
    }

    HeightMap { width, height, values }
}
