//! Biome sampler: one simplex noise field per parameter axis, fed into a
//! nearest-biome selector.

use noise::{NoiseFn, Simplex};

use super::Biome;

/// Picks the biome closest to a sampled parameter vector.
///
/// The distance on each axis is divided by the biome's weight for that axis,
/// so heavily weighted biomes claim more of the parameter space.
pub struct BiomeSelector<'a> {
    biomes: &'a [Biome],
}

impl<'a> BiomeSelector<'a> {
    pub fn new(biomes: &'a [Biome]) -> Self {
        Self { biomes }
    }

    /// Weighted L1 distance between a biome and the sampled parameters.
    ///
    /// Axes beyond either vector's length are ignored. Non-positive weights
    /// count as 1.
    pub fn score(biome: &Biome, sample: &[f32]) -> f32 {
        biome
            .parameters
            .iter()
            .zip(sample)
            .map(|(param, &value)| {
                let weight = if param.weight > 0.0 { param.weight } else { 1.0 };
                (value - param.value).abs() / weight
            })
            .sum()
    }

    /// Index of the best-scoring biome, ties going to the earlier one.
    /// `None` only when there are no biomes.
    pub fn choose(&self, sample: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, biome) in self.biomes.iter().enumerate() {
            let score = Self::score(biome, sample);
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((index, score)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Samples biome parameters at world columns from decorrelated noise fields.
pub struct BiomeSampler {
    fields: Vec<Simplex>,
    /// Noise frequency shared by every axis. Lower values give broader biomes.
    pub frequency: f64,
}

impl BiomeSampler {
    /// Creates `axes` noise fields. Each axis derives its own seed from `seed`.
    pub fn new(seed: u64, axes: usize) -> Self {
        let fields = (0..axes as u64)
            .map(|axis| Simplex::new(seed.wrapping_add(axis.wrapping_mul(0xDEAD_BEEF)) as u32))
            .collect();
        Self {
            fields,
            frequency: 0.002,
        }
    }

    /// Number of parameter axes sampled.
    pub fn axes(&self) -> usize {
        self.fields.len()
    }

    /// Parameter vector at a world column, each axis normalized to `[0.0, 1.0]`.
    pub fn sample(&self, x: i32, z: i32) -> Vec<f32> {
        let nx = x as f64 * self.frequency;
        let nz = z as f64 * self.frequency;
        self.fields
            .iter()
            .map(|field| ((field.get([nx, nz]) + 1.0) * 0.5) as f32)
            .collect()
    }

    /// Index of the biome chosen for a world column.
    pub fn biome_at(&self, biomes: &[Biome], x: i32, z: i32) -> Option<usize> {
        BiomeSelector::new(biomes).choose(&self.sample(x, z))
    }
}
