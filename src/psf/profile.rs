/// Photon radial distribution about the image centroid
///
/// The squared distances to the centroid are sorted once so that the number
/// of photons inside any radius is found by bisection.
#[derive(Debug, Clone, Default)]
pub struct RadialProfile {
    radii_sq: Vec<f64>,
}
impl RadialProfile {
    pub fn new(x: &[f64], y: &[f64], centroid: [f64; 2]) -> Self {
        let [cx, cy] = centroid;
        let mut radii_sq: Vec<f64> = x
            .iter()
            .zip(y)
            .map(|(x, y)| (x - cx).powi(2) + (y - cy).powi(2))
            .collect();
        radii_sq.sort_unstable_by(|a, b| a.total_cmp(b));
        Self { radii_sq }
    }
    /// Number of photons
    pub fn len(&self) -> usize {
        self.radii_sq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.radii_sq.is_empty()
    }
    /// Number of photons strictly inside `radius`
    pub fn count_within(&self, radius: f64) -> usize {
        let r2 = radius * radius;
        self.radii_sq.partition_point(|&d2| d2 < r2)
    }
    /// Standard deviation of the photon distances to the centroid
    pub fn sigma(&self) -> f64 {
        if self.is_empty() {
            return 0.;
        }
        (self.radii_sq.iter().sum::<f64>() / self.len() as f64).sqrt()
    }
}
