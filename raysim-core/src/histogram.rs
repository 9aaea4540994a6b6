//! Two dimensional accumulators backing monitors

/// Weighted and unweighted hit counts over an `nx` by `ny` grid.
///
/// Bins are stored row-major by x index: bin `(ix, iy)` lives at `ix * ny + iy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    nx: usize,
    ny: usize,
    intensity: Vec<f64>,
    counts: Vec<u64>,
}

impl Histogram2d {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            intensity: vec![0.0; nx * ny],
            counts: vec![0; nx * ny],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    fn index(&self, ix: usize, iy: usize) -> usize {
        ix * self.ny + iy
    }

    /// Add one hit of the given weight; out-of-range bins are ignored
    pub fn record(&mut self, ix: usize, iy: usize, weight: f64) -> bool {
        if ix >= self.nx || iy >= self.ny {
            return false;
        }
        let idx = self.index(ix, iy);
        self.intensity[idx] += weight;
        self.counts[idx] += 1;
        true
    }

    pub fn count(&self, ix: usize, iy: usize) -> u64 {
        self.counts[self.index(ix, iy)]
    }

    pub fn intensity(&self, ix: usize, iy: usize) -> f64 {
        self.intensity[self.index(ix, iy)]
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensity
    }

    pub fn total_counts(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn total_intensity(&self) -> f64 {
        self.intensity.iter().sum()
    }

    pub fn max_intensity(&self) -> f64 {
        self.intensity.iter().copied().fold(0.0, f64::max)
    }

    /// Intensity of a bin divided by the hottest bin, 0 for an empty grid
    pub fn normalized_intensity(&self, ix: usize, iy: usize) -> f64 {
        let max = self.max_intensity();
        if max > 0.0 {
            self.intensity(ix, iy) / max
        } else {
            0.0
        }
    }

    /// Fold another accumulator of the same shape into this one
    pub fn merge(&mut self, other: &Histogram2d) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        for (mine, theirs) in self.intensity.iter_mut().zip(&other.intensity) {
            *mine += theirs;
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        true
    }

    pub fn clear(&mut self) {
        self.intensity.iter_mut().for_each(|v| *v = 0.0);
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
