//! Containment diameter search
//!
//! The diameter of the circle centered on the centroid and containing a given
//! fraction of the photons is first searched with a damped Newton-like
//! iteration on the number of photons inside the circle.
//! If the iteration does not converge, the radius is found by scanning the
//! photon radial distribution, first coarsely then finely.

use super::{profile::RadialProfile, PsfError};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, PsfError>;

/// Containment diameter search parameters
///
/// Radii are given in units of the standard deviation of the photon
/// distances to the centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// maximum number of iterations before falling back to scanning
    pub max_iterations: usize,
    /// the iteration stops when the photon count is within `detected / tolerance_divisor` of the target
    pub tolerance_divisor: f64,
    /// radius the iteration starts from
    pub start_radius: f64,
    /// damping of the iteration step
    pub step_scale: f64,
    /// coarse scanning step
    pub coarse_step: f64,
    /// fine scanning step
    pub fine_step: f64,
    /// upper bound of the coarse scan
    pub scan_limit: f64,
}
impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance_divisor: 1000.,
            start_radius: 1.5,
            step_scale: 0.5,
            coarse_step: 0.1,
            fine_step: 0.005,
            scan_limit: 4.,
        }
    }
}

impl SolverConfig {
    /// Checks that the scan steps, the scan limit and the tolerance are positive
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tolerance_divisor", self.tolerance_divisor),
            ("coarse_step", self.coarse_step),
            ("fine_step", self.fine_step),
            ("scan_limit", self.scan_limit),
        ] {
            if !(value > 0.) || !value.is_finite() {
                return Err(PsfError::InvalidSolverConfig(name, value));
            }
        }
        Ok(())
    }
}

/// Bracket `[r0, r1]` with less than the target number of photons inside `r0` and more inside `r1`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    r0: f64,
    r1: f64,
}
impl Bracket {
    fn mid(&self) -> f64 {
        0.5 * (self.r0 + self.r1)
    }
}

/// Finds the containment diameter for the given fraction of photons
pub fn containment_diameter(
    profile: &RadialProfile,
    fraction: f64,
    config: &SolverConfig,
) -> Result<f64> {
    log::debug!("Finding PSF for fraction = {fraction}");
    config.validate()?;
    let n_photon = profile.len() as f64;
    let radius_sigma = profile.sigma();
    if !(radius_sigma > 0.) || !radius_sigma.is_finite() {
        return Err(PsfError::PsfNotFound { fraction });
    }
    let target = fraction * n_photon;
    match iterate(profile, target, radius_sigma, config) {
        Some(radius) => Ok(2. * radius),
        None => {
            log::warn!("Could not find PSF efficiently - trying by scanning");
            scan_radius(profile, target, radius_sigma, config)
                .map(|radius| 2. * radius)
                .ok_or(PsfError::PsfNotFound { fraction })
        }
    }
}

/// Damped iteration, returns the radius if it converges
fn iterate(
    profile: &RadialProfile,
    target: f64,
    radius_sigma: f64,
    config: &SolverConfig,
) -> Option<f64> {
    let tolerance = profile.len() as f64 / config.tolerance_divisor;
    let mut radius = config.start_radius * radius_sigma;
    let start_count = profile.count_within(radius) as f64;
    if start_count == 0. {
        return None;
    }
    let scale = config.step_scale * (radius * radius / start_count).sqrt();
    let mut delta = start_count - target;
    for i in 1..=config.max_iterations {
        let mut step = -delta * scale / target.sqrt();
        while radius + step < 0. {
            step *= 0.5;
        }
        radius += step;
        delta = profile.count_within(radius) as f64 - target;
        if delta.abs() < tolerance {
            log::debug!("PSF radius found after {i} iterations");
            return Some(radius);
        }
    }
    None
}

/// Scans the radial distribution from `r_min` to `r_max` in steps of `dr`
/// until the target number of photons is bracketed
fn scan(profile: &RadialProfile, target: f64, dr: f64, r_min: f64, r_max: f64) -> Option<Bracket> {
    let (mut r0, mut r1) = (r_min, r_min + dr);
    loop {
        let (s0, s1) = (
            profile.count_within(r0) as f64,
            profile.count_within(r1) as f64,
        );
        if s0 < target && s1 > target {
            return Some(Bracket { r0, r1 });
        }
        if r1 > r_max {
            return None;
        }
        r0 += dr;
        r1 += dr;
    }
}

/// Coarse then fine scan, returns the middle of the final bracket
fn scan_radius(
    profile: &RadialProfile,
    target: f64,
    radius_sigma: f64,
    config: &SolverConfig,
) -> Option<f64> {
    log::debug!("Finding PSF by scanning");
    let coarse = scan(
        profile,
        target,
        config.coarse_step * radius_sigma,
        0.,
        config.scan_limit * radius_sigma,
    )?;
    let fine = scan(
        profile,
        target,
        config.fine_step * radius_sigma,
        coarse.r0,
        coarse.r1,
    )?;
    Some(fine.mid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn gaussian(n: usize, sigma: f64, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let u: f64 = 1. - rng.gen::<f64>();
                let v: f64 = rng.gen();
                let r = sigma * (-2. * u.ln()).sqrt();
                let a = 2. * std::f64::consts::PI * v;
                (r * a.cos(), r * a.sin())
            })
            .unzip()
    }

    #[test]
    fn gaussian_d80() {
        let (x, y) = gaussian(20_000, 1., 7);
        let profile = RadialProfile::new(&x, &y, [0., 0.]);
        let d80 = containment_diameter(&profile, 0.8, &SolverConfig::default()).unwrap();
        // r80 = sqrt(2 ln 5) for a 2D gaussian
        let r80 = (2. * 5f64.ln()).sqrt();
        assert!((0.5 * d80 - r80).abs() < 0.05, "{d80}");
        let n = profile.count_within(0.5 * d80) as f64;
        assert!((n - 16_000.).abs() < 20., "{n}");
    }

    #[test]
    fn scan_fallback() {
        // all the photons on a thin wavy ring: the iteration oscillates across the ring
        let n = 1000;
        let (x, y): (Vec<f64>, Vec<f64>) = (0..n)
            .map(|i| {
                let a = 2. * std::f64::consts::PI * i as f64 / n as f64;
                let r = 10. + 0.3 * (7. * a).sin();
                (r * a.cos(), r * a.sin())
            })
            .unzip();
        let profile = RadialProfile::new(&x, &y, [0., 0.]);
        let config = SolverConfig::default();
        assert_eq!(iterate(&profile, 500., profile.sigma(), &config), None);
        let d50 = containment_diameter(&profile, 0.5, &config).unwrap();
        assert!((d50 - 20.).abs() < 0.1, "{d50}");
    }

    #[test]
    fn scan_brackets_target() {
        let (x, y) = gaussian(5_000, 2., 11);
        let profile = RadialProfile::new(&x, &y, [0., 0.]);
        let sigma = profile.sigma();
        let config = SolverConfig::default();
        let radius = scan_radius(&profile, 2_500., sigma, &config).unwrap();
        let step = config.fine_step * sigma;
        assert!(profile.count_within(radius - 0.5 * step) < 2_500);
        assert!(profile.count_within(radius + 0.5 * step) > 2_500);
    }

    #[test]
    fn unreachable_target() {
        let (x, y) = gaussian(5_000, 2., 3);
        let profile = RadialProfile::new(&x, &y, [0., 0.]);
        let config = SolverConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            containment_diameter(&profile, 1., &config),
            Err(PsfError::PsfNotFound { .. })
        ));
    }

    #[test]
    fn invalid_config() {
        let profile = RadialProfile::new(&[1., -1., 0., 0.], &[0., 0., 1., -1.], [0., 0.]);
        let config = SolverConfig {
            max_iterations: 0,
            coarse_step: 0.,
            ..Default::default()
        };
        assert!(matches!(
            containment_diameter(&profile, 0.5, &config),
            Err(PsfError::InvalidSolverConfig("coarse_step", _))
        ));
        for config in [
            SolverConfig {
                fine_step: -0.005,
                ..Default::default()
            },
            SolverConfig {
                scan_limit: 0.,
                ..Default::default()
            },
            SolverConfig {
                tolerance_divisor: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                containment_diameter(&profile, 0.5, &config),
                Err(PsfError::InvalidSolverConfig(..))
            ));
        }
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn degenerate_image() {
        let profile = RadialProfile::new(&[1., 1., 1.], &[2., 2., 2.], [1., 2.]);
        assert!(matches!(
            containment_diameter(&profile, 0.8, &SolverConfig::default()),
            Err(PsfError::PsfNotFound { .. })
        ));
    }
}
