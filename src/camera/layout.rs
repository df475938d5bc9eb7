//! Camera pixel layout
//!
//! Parser for sim_telarray camera configuration files.
//! Only 3 kinds of records are used:
//!
//! ```text
//! PixType  1 0 0 300  1 5.0 5.0 "funnel_perfect.dat" "funnel_wavelength.dat"
//! Rotate   10.893
//! Pixel    0 1   0.000   0.000  0 0 0 0x00 1
//! ```
//!
//! `PixType` gives the pixel shape (token 5), the pixel diameter (token 6) and
//! the lightguide efficiency files (tokens 8 and 9), `Rotate` the camera
//! rotation angle in degrees and `Pixel` the pixel ID (token 1), position
//! (tokens 3 and 4) and on/off flag (token 9, on if missing).

use super::CameraError;
use crate::telescope::TelescopeName;
use itertools::{Itertools, MinMaxResult};
use nalgebra::{Point2, Rotation2};
use std::{io::BufRead, path::Path, time::Instant};

type Result<T> = std::result::Result<T, CameraError>;

/// Pixel shape
///
/// The hexagonal shapes differ in their orientation: [PixelShape::HexagonalRotated]
/// is rotated clockwise by 30 degrees with respect to [PixelShape::Hexagonal].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelShape {
    Hexagonal,
    Square,
    HexagonalRotated,
}
impl PixelShape {
    pub fn is_hexagonal(&self) -> bool {
        matches!(self, PixelShape::Hexagonal | PixelShape::HexagonalRotated)
    }
    /// Number of neighbours of a pixel fully surrounded by other pixels
    pub fn full_neighbour_count(&self) -> usize {
        match self {
            PixelShape::Hexagonal | PixelShape::HexagonalRotated => 6,
            PixelShape::Square => 4,
        }
    }
    /// sim_telarray shape code
    pub fn code(&self) -> u8 {
        match self {
            PixelShape::Hexagonal => 1,
            PixelShape::Square => 2,
            PixelShape::HexagonalRotated => 3,
        }
    }
}
impl TryFrom<i64> for PixelShape {
    type Error = i64;

    fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
        match code {
            1 => Ok(PixelShape::Hexagonal),
            2 => Ok(PixelShape::Square),
            3 => Ok(PixelShape::HexagonalRotated),
            _ => Err(code),
        }
    }
}

/// Camera pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub id: usize,
    /// pixel center [cm]
    pub x: f64,
    /// pixel center [cm]
    pub y: f64,
    pub on: bool,
}
impl Pixel {
    /// Distance from the camera center
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Coordinate frame transformation from the configuration file to the camera
/// view of an observer facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraFrame {
    /// mirror the y axis (dual mirror telescopes)
    pub flip_y: bool,
    /// rotation added to the configuration file rotation [deg]
    pub rotation_offset_deg: f64,
}
impl From<&TelescopeName> for CameraFrame {
    fn from(telescope: &TelescopeName) -> Self {
        Self {
            flip_y: telescope.is_two_mirror(),
            rotation_offset_deg: telescope.camera().rotation_offset_deg(),
        }
    }
}

/// Records read from a camera configuration file
#[derive(Debug, Default)]
struct Records {
    shape: Option<i64>,
    diameter: Option<f64>,
    angle_efficiency_file: Option<String>,
    wavelength_efficiency_file: Option<String>,
    rotation_deg: f64,
    pixels: Vec<Pixel>,
}
fn token<'a>(tokens: &[&'a str], index: usize, line: usize) -> Result<&'a str> {
    tokens
        .get(index)
        .copied()
        .ok_or_else(|| CameraError::MalformedLayout(format!("line {line}: missing field #{index}")))
}
fn parse<T: std::str::FromStr>(tokens: &[&str], index: usize, line: usize) -> Result<T> {
    let value = token(tokens, index, line)?;
    value.parse().map_err(|_| {
        CameraError::MalformedLayout(format!("line {line}: invalid field #{index} {value:?}"))
    })
}
fn file_name(tokens: &[&str], index: usize) -> Option<String> {
    tokens
        .get(index)
        .map(|name| name.replace('"', ""))
        .filter(|name| !name.is_empty())
}
impl Records {
    fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Records::default();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let n = i + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if line.starts_with("PixType") {
                records.shape = Some(parse(&tokens, 5, n)?);
                records.diameter = Some(parse(&tokens, 6, n)?);
                records.angle_efficiency_file = file_name(&tokens, 8);
                records.wavelength_efficiency_file = file_name(&tokens, 9);
            } else if line.starts_with("Rotate") {
                records.rotation_deg = parse(&tokens, 1, n)?;
            } else if line.starts_with("Pixel") {
                let on = match tokens.get(9) {
                    Some(_) => parse::<i64>(&tokens, 9, n)? != 0,
                    None => true,
                };
                records.pixels.push(Pixel {
                    id: parse(&tokens, 1, n)?,
                    x: parse(&tokens, 3, n)?,
                    y: parse(&tokens, 4, n)?,
                    on,
                });
            }
        }
        Ok(records)
    }
}

/// Camera pixel layout in the frame of an observer facing the camera
#[derive(Debug, Clone)]
pub struct PixelLayout {
    shape: PixelShape,
    /// pixel diameter [cm]
    diameter: f64,
    angle_efficiency_file: Option<String>,
    wavelength_efficiency_file: Option<String>,
    /// total rotation applied to the pixels [rad]
    rotation: f64,
    pixels: Vec<Pixel>,
}
impl PixelLayout {
    /// Reads the pixel layout from a camera configuration file
    ///
    /// Files with the `.gz` extension are decompressed.
    pub fn from_path<P: AsRef<Path>>(path: P, frame: CameraFrame) -> Result<Self> {
        let now = Instant::now();
        log::info!("Loading {:?}...", path.as_ref());
        let reader = crate::io::open_text(&path)?;
        let this = Self::from_reader(reader, frame)?;
        log::info!(
            "... loaded {} pixels in {:}ms",
            this.len(),
            now.elapsed().as_millis()
        );
        Ok(this)
    }
    /// Reads the pixel layout from any buffered source
    pub fn from_reader<R: BufRead>(reader: R, frame: CameraFrame) -> Result<Self> {
        let Records {
            shape,
            diameter,
            angle_efficiency_file,
            wavelength_efficiency_file,
            rotation_deg,
            mut pixels,
        } = Records::read(reader)?;
        let diameter = diameter
            .filter(|d| d.is_finite() && *d > 0.)
            .ok_or_else(|| CameraError::MalformedLayout("could not read the pixel diameter".into()))?;
        let shape = shape
            .ok_or_else(|| CameraError::MalformedLayout("missing pixel shape".into()))
            .and_then(|code| {
                PixelShape::try_from(code).map_err(|code| {
                    CameraError::MalformedLayout(format!(
                        "pixel shape {code} unrecognized (has to be 1, 2 or 3)"
                    ))
                })
            })?;

        if frame.flip_y {
            pixels.iter_mut().for_each(|pixel| pixel.y = -pixel.y);
        }
        let rotation = (rotation_deg + frame.rotation_offset_deg).to_radians();
        log::debug!("Rotating pixels by {}deg", rotation.to_degrees());
        if rotation != 0. {
            let rot = Rotation2::new(rotation);
            pixels.iter_mut().for_each(|pixel| {
                let p = rot * Point2::new(pixel.x, pixel.y);
                pixel.x = p.x;
                pixel.y = p.y;
            });
        }

        Ok(Self {
            shape,
            diameter,
            angle_efficiency_file,
            wavelength_efficiency_file,
            rotation,
            pixels,
        })
    }
    pub fn shape(&self) -> PixelShape {
        self.shape
    }
    /// Pixel diameter [cm]
    pub fn diameter(&self) -> f64 {
        self.diameter
    }
    /// Lightguide efficiency as a function of incidence angle file name
    pub fn angle_efficiency_file(&self) -> Option<&str> {
        self.angle_efficiency_file.as_deref()
    }
    /// Lightguide efficiency as a function of wavelength file name
    pub fn wavelength_efficiency_file(&self) -> Option<&str> {
        self.wavelength_efficiency_file.as_deref()
    }
    /// Total rotation applied to the pixel positions [rad]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
    /// Orientation of the pixels when drawn [deg]
    pub fn orientation_deg(&self) -> f64 {
        let mut orientation = match self.shape {
            PixelShape::Square => return 0.,
            PixelShape::Hexagonal => 0.,
            PixelShape::HexagonalRotated => 30.,
        };
        if self.rotation > 0. {
            orientation += self.rotation.to_degrees();
        }
        orientation
    }
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
    /// Number of pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
    /// Number of pixels switched on
    pub fn n_on(&self) -> usize {
        self.pixels.iter().filter(|pixel| pixel.on).count()
    }
    /// Iterator over the (x,y) coordinates
    pub fn xy_iter(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.pixels.iter().map(Pixel::xy)
    }
    fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
        match values.minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }
    /// Returns the range of the x coordinate
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Self::range(self.pixels.iter().map(|pixel| pixel.x))
    }
    /// Returns the range of the y coordinate
    pub fn y_range(&self) -> Option<(f64, f64)> {
        Self::range(self.pixels.iter().map(|pixel| pixel.y))
    }
}
