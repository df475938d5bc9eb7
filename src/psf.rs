/*!
# Point spread function

Analysis of the photon images produced by ray-tracing simulations: centroid,
effective mirror area and containment diameters.

The photons are read from sim_telarray photon list files where each photon
line holds the photon position (columns 2 and 3, in cm) and where the
annotation lines, containing the phrase *falling on an area of*, give the
number of photons emitted (column 4) and the total scattering area
(column 14, in cm^2).

Positions are stored in cm; containment diameters are converted to degrees
with the focal length.
*/

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    f64::consts::PI,
    io::BufRead,
    num::{ParseFloatError, ParseIntError},
    path::Path,
    time::Instant,
};

mod profile;
mod solver;
pub use profile::RadialProfile;
pub use solver::{containment_diameter, SolverConfig};

#[derive(Debug, thiserror::Error)]
pub enum PsfError {
    #[error("failed to read the photon list")]
    Io(#[from] std::io::Error),
    #[error("line {0}: missing field #{1}")]
    MissingField(usize, usize),
    #[error("line {0}: invalid photon coordinate")]
    ParseFloat(usize, #[source] ParseFloatError),
    #[error("line {0}: invalid number of photons")]
    ParseInt(usize, #[source] ParseIntError),
    #[error("photon positions are empty or x and y do not match ({0} != {1})")]
    EmptyOrMismatchedPhotonData(usize, usize),
    #[error("could not find the containment diameter for fraction {fraction}")]
    PsfNotFound { fraction: f64 },
    #[error("PSF cannot be converted to degrees because the focal length is not set")]
    NoFocalLengthConfigured,
    #[error("the photon fraction must be in ]0,1] (found {0})")]
    InvalidFraction(f64),
    #[error("the focal length must be larger than zero (found {0})")]
    InvalidFocalLength(f64),
    #[error("the PSF solver parameter {0} must be larger than zero (found {1})")]
    InvalidSolverConfig(&'static str, f64),
}
type Result<T> = std::result::Result<T, PsfError>;

/// Length unit of the containment diameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Cm,
    Deg,
}

/// Photon image configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PsfConfig {
    /// focal length [cm], required to convert containment diameters to degrees
    pub focal_length: Option<f64>,
    /// scattering area of all the photons [cm^2], overrides the value in the photon list
    pub total_scattered_area: Option<f64>,
    pub solver: SolverConfig,
}
impl PsfConfig {
    pub fn focal_length(mut self, value: f64) -> Self {
        self.focal_length = Some(value);
        self
    }
    pub fn total_scattered_area(mut self, value: f64) -> Self {
        self.total_scattered_area = Some(value);
        self
    }
    pub fn solver(mut self, value: SolverConfig) -> Self {
        self.solver = value;
        self
    }
}

const AREA_ANNOTATION: &str = "falling on an area of";

/// Photons read from a photon list
#[derive(Debug, Default)]
struct PhotonList {
    x: Vec<f64>,
    y: Vec<f64>,
    total_photons: usize,
    total_area: Option<f64>,
}
fn field<'a>(tokens: &[&'a str], line: usize, index: usize) -> Result<&'a str> {
    tokens
        .get(index)
        .copied()
        .ok_or(PsfError::MissingField(line, index))
}
impl PhotonList {
    fn new(total_area: Option<f64>) -> Self {
        Self {
            total_area,
            ..Default::default()
        }
    }
    fn read<R: BufRead>(mut self, reader: R) -> Result<Self> {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let n = i + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if line.contains(AREA_ANNOTATION) {
                self.total_photons += field(&tokens, n, 4)?
                    .parse::<usize>()
                    .map_err(|e| PsfError::ParseInt(n, e))?;
                let area: f64 = field(&tokens, n, 14)?
                    .parse()
                    .map_err(|e| PsfError::ParseFloat(n, e))?;
                match self.total_area {
                    None => self.total_area = Some(area),
                    Some(total_area) if total_area != area => log::warn!(
                        "Conflicting value of the total area found {total_area} != {area} - keeping the first value"
                    ),
                    Some(_) => (),
                }
            } else if line.contains('#') || tokens.is_empty() {
                continue;
            } else {
                self.x.push(
                    field(&tokens, n, 2)?
                        .parse()
                        .map_err(|e| PsfError::ParseFloat(n, e))?,
                );
                self.y.push(
                    field(&tokens, n, 3)?
                        .parse()
                        .map_err(|e| PsfError::ParseFloat(n, e))?,
                );
            }
        }
        Ok(self)
    }
}

/// Image made of the 2D positions of photons
#[derive(Debug)]
pub struct PhotonImage {
    /// photon positions [cm]
    x: Vec<f64>,
    y: Vec<f64>,
    centroid: [f64; 2],
    profile: RadialProfile,
    /// number of photons emitted
    total_photons: usize,
    /// scattering area of all the photons [cm^2]
    total_area: Option<f64>,
    effective_area: Option<f64>,
    cm_to_deg: Option<f64>,
    solver: SolverConfig,
    /// containment diameters [cm] per photon fraction
    psf: Mutex<BTreeMap<u64, f64>>,
}
impl PhotonImage {
    /// Loads a sim_telarray photon list
    ///
    /// Files with the `.gz` extension are decompressed.
    pub fn from_path<P: AsRef<Path>>(config: PsfConfig, path: P) -> Result<Self> {
        let now = Instant::now();
        log::info!("Loading {:?}...", path.as_ref());
        let reader = crate::io::open_text(&path)?;
        let this = Self::from_reader(config, reader)?;
        log::info!(
            "... loaded {} photons in {:}ms",
            this.n_detected(),
            now.elapsed().as_millis()
        );
        Ok(this)
    }
    /// Reads a sim_telarray photon list from any buffered source
    pub fn from_reader<R: BufRead>(config: PsfConfig, reader: R) -> Result<Self> {
        let PhotonList {
            x,
            y,
            total_photons,
            total_area,
        } = PhotonList::new(config.total_scattered_area).read(reader)?;
        Self::new(config, x, y, total_photons, total_area)
    }
    /// Creates an image from the photon positions [cm]
    ///
    /// The number of photons emitted is taken as the number of photons.
    pub fn from_positions(config: PsfConfig, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let total_photons = x.len();
        let total_area = config.total_scattered_area;
        Self::new(config, x, y, total_photons, total_area)
    }
    fn new(
        config: PsfConfig,
        x: Vec<f64>,
        y: Vec<f64>,
        total_photons: usize,
        total_area: Option<f64>,
    ) -> Result<Self> {
        let cm_to_deg = match config.focal_length {
            Some(focal_length) if focal_length > 0. => Some(180. / PI / focal_length),
            Some(focal_length) => return Err(PsfError::InvalidFocalLength(focal_length)),
            None => None,
        };
        config.solver.validate()?;
        if x.is_empty() || x.len() != y.len() {
            log::error!("Problems reading the photon list - invalid data");
            return Err(PsfError::EmptyOrMismatchedPhotonData(x.len(), y.len()));
        }
        let n = x.len() as f64;
        let centroid = [x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n];
        let profile = RadialProfile::new(&x, &y, centroid);
        let effective_area = total_area
            .filter(|_| total_photons > 0)
            .map(|area| n * area / total_photons as f64);
        Ok(Self {
            x,
            y,
            centroid,
            profile,
            total_photons,
            total_area,
            effective_area,
            cm_to_deg,
            solver: config.solver,
            psf: Mutex::new(BTreeMap::new()),
        })
    }
    /// Image centroid [cm]
    pub fn centroid(&self) -> [f64; 2] {
        self.centroid
    }
    /// Number of photons in the image
    pub fn n_detected(&self) -> usize {
        self.x.len()
    }
    /// Number of photons emitted
    pub fn n_emitted(&self) -> usize {
        self.total_photons
    }
    /// Scattering area of all the photons [cm^2]
    pub fn total_area(&self) -> Option<f64> {
        self.total_area
    }
    /// Effective mirror area [cm^2]
    ///
    /// `None` if neither the total scattering area nor the number of photons emitted is known.
    pub fn effective_area(&self) -> Option<f64> {
        if self.effective_area.is_none() {
            log::error!("Effective area could not be calculated");
        }
        self.effective_area
    }
    pub fn set_effective_area(&mut self, value: f64) {
        self.effective_area = Some(value);
    }
    /// Number of photons strictly inside a circle of given radius [cm] centered on the centroid
    pub fn count_within(&self, radius: f64) -> usize {
        self.profile.count_within(radius)
    }
    fn unit_factor(&self, unit: Unit) -> Result<f64> {
        match unit {
            Unit::Cm => Ok(1.),
            Unit::Deg => self.cm_to_deg.ok_or(PsfError::NoFocalLengthConfigured),
        }
    }
    fn key(fraction: f64) -> Result<u64> {
        if fraction > 0. && fraction <= 1. {
            Ok(fraction.to_bits())
        } else {
            Err(PsfError::InvalidFraction(fraction))
        }
    }
    /// Returns the diameter of the circle containing the given fraction of photons
    ///
    /// The diameter is computed on the first request for a given fraction,
    /// and the result is reused afterwards.
    pub fn psf(&self, fraction: f64, unit: Unit) -> Result<f64> {
        let factor = self.unit_factor(unit)?;
        let key = Self::key(fraction)?;
        let mut psf = self.psf.lock();
        let diameter = match psf.get(&key).copied() {
            Some(diameter) => diameter,
            None => {
                let diameter = containment_diameter(&self.profile, fraction, &self.solver)?;
                psf.insert(key, diameter);
                diameter
            }
        };
        Ok(diameter * factor)
    }
    /// Sets the containment diameter of a given fraction of photons computed by other means
    pub fn set_psf(&self, value: f64, fraction: f64, unit: Unit) -> Result<()> {
        let factor = self.unit_factor(unit)?;
        let key = Self::key(fraction)?;
        self.psf.lock().insert(key, value / factor);
        Ok(())
    }
    /// Returns the photon positions [cm], relative to the centroid if `centralized`
    pub fn image_data(&self, centralized: bool) -> Vec<[f64; 2]> {
        let [cx, cy] = if centralized {
            self.centroid
        } else {
            [0., 0.]
        };
        self.x
            .iter()
            .zip(&self.y)
            .map(|(x, y)| [x - cx, y - cy])
            .collect()
    }
    /// Returns the fraction of photons contained within `n_sample` radii [cm]
    /// evenly spaced from 0 to 1.6 times the 80% containment diameter
    pub fn cumulative_intensity(&self, n_sample: usize) -> Result<Vec<(f64, f64)>> {
        let r_max = 1.6 * self.psf(0.8, Unit::Cm)?;
        let n = self.n_detected() as f64;
        let step = if n_sample > 1 {
            r_max / (n_sample - 1) as f64
        } else {
            0.
        };
        Ok((0..n_sample)
            .map(|i| {
                let radius = i as f64 * step;
                (radius, self.count_within(radius) as f64 / n)
            })
            .collect())
    }
}
