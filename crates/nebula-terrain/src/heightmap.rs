//! Heightmap grids and the multi-octave fBm sampler used to fill them.

use glam::{IVec2, UVec2};
use noise::{NoiseFn, Simplex};

/// Row-major 2D grid of elevation values for a rectangular world region.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Heightmap {
    /// Creates a flat heightmap with every cell at elevation `0.0`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    /// Flat heightmap covering `size`.
    pub fn flat(size: UVec2) -> Self {
        Self::new(size.x, size.y)
    }

    /// Wraps existing row-major values. Returns `None` if the length does not
    /// match `width * height`.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        (values.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Elevation at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.values[i])
    }

    /// Sets the elevation at `(x, y)`. Returns `false` outside the grid.
    pub fn set(&mut self, x: u32, y: u32, value: f32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: f32) {
        self.values.fill(value);
    }

    /// Applies `f` to every cell.
    pub fn map(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }

    /// Combines cell-by-cell with another heightmap of the same size.
    /// Returns `false` and leaves `self` untouched on a size mismatch.
    pub fn zip_with(&mut self, other: &Heightmap, f: impl Fn(f32, f32) -> f32) -> bool {
        if self.size() != other.size() {
            return false;
        }
        for (a, &b) in self.values.iter_mut().zip(&other.values) {
            *a = f(*a, b);
        }
        true
    }

    /// Lowest and highest elevation, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Adds fBm noise sampled at world coordinates `offset + (x, y)`.
    pub fn add_noise(&mut self, offset: IVec2, sampler: &HeightmapSampler) {
        let width = self.width as usize;
        for (i, v) in self.values.iter_mut().enumerate() {
            let x = offset.x as f64 + (i % width) as f64;
            let y = offset.y as f64 + (i / width) as f64;
            *v += sampler.sample(x, y) as f32;
        }
    }
}

/// Configuration for multi-octave fBm noise.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    /// Seed for deterministic generation.
    pub seed: u64,
    /// Number of octaves composited.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per block.
    pub base_frequency: f64,
    /// Amplitude of the first octave, in blocks.
    pub amplitude: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
            amplitude: 32.0,
        }
    }
}

/// Fractal Brownian motion over simplex noise: each octave doubles the
/// frequency and halves the amplitude of the previous one (with defaults).
pub struct HeightmapSampler {
    noise: Simplex,
    params: HeightmapParams,
}

impl HeightmapSampler {
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Simplex::new(params.seed as u32);
        Self { noise, params }
    }

    /// Height at a 2D world coordinate, within `[-max_amplitude, max_amplitude]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Geometric sum of all octave amplitudes.
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp;
            amp *= self.params.persistence;
        }
        sum
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}
