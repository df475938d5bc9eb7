//! Telescope camera
//!
//! Pixel layout including rotation, neighbour pixels, edge pixels and field of view.

use crate::telescope::TelescopeName;
use std::{io::BufRead, path::Path, sync::OnceLock};

mod edges;
mod layout;
mod neighbours;
pub use edges::{EdgeSet, FieldOfView};
pub use layout::{CameraFrame, Pixel, PixelLayout, PixelShape};
pub use neighbours::{find_adjacent_neighbours, find_neighbours, NeighbourMap, NeighbourSearch};

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("failed to read the camera configuration")]
    Io(#[from] std::io::Error),
    #[error("malformed camera configuration: {0}")]
    MalformedLayout(String),
    #[error("the focal length must be larger than zero (found {0})")]
    InvalidFocalLength(f64),
    #[error("no edge pixels found in the camera")]
    EmptyEdgeSet,
    #[error("pixel #{0} is not in the camera layout")]
    PixelNotFound(usize),
}
type Result<T> = std::result::Result<T, CameraError>;

fn check_focal_length(focal_length: f64) -> Result<()> {
    if focal_length > 0. {
        Ok(())
    } else {
        Err(CameraError::InvalidFocalLength(focal_length))
    }
}

/// Camera of a given telescope
///
/// The neighbours, the edge pixels and the fill factor are computed on their
/// first request only, which may be expensive for large cameras;
/// use [Camera::ensure_computed] to pay that cost upfront.
#[derive(Debug)]
pub struct Camera {
    telescope: TelescopeName,
    layout: PixelLayout,
    /// focal length [cm]
    focal_length: f64,
    search: NeighbourSearch,
    neighbours: OnceLock<NeighbourMap>,
    edges: OnceLock<EdgeSet>,
    fill_factor: OnceLock<Option<f64>>,
}
impl Camera {
    /// Creates the camera from a pixel layout
    ///
    /// The focal length, preferably the effective one, must be given in the
    /// unit of the pixel positions (usually cm).
    pub fn new(telescope: TelescopeName, layout: PixelLayout, focal_length: f64) -> Result<Self> {
        check_focal_length(focal_length)?;
        Ok(Self {
            telescope,
            layout,
            focal_length,
            search: NeighbourSearch::default(),
            neighbours: OnceLock::new(),
            edges: OnceLock::new(),
            fill_factor: OnceLock::new(),
        })
    }
    /// Loads the camera from a sim_telarray camera configuration file
    pub fn from_path<P: AsRef<Path>>(
        telescope: TelescopeName,
        path: P,
        focal_length: f64,
    ) -> Result<Self> {
        // before parsing the layout
        check_focal_length(focal_length)?;
        let layout = PixelLayout::from_path(path, CameraFrame::from(&telescope))?;
        Self::new(telescope, layout, focal_length)
    }
    /// Loads the camera from a sim_telarray camera configuration source
    pub fn from_reader<R: BufRead>(
        telescope: TelescopeName,
        reader: R,
        focal_length: f64,
    ) -> Result<Self> {
        check_focal_length(focal_length)?;
        let layout = PixelLayout::from_reader(reader, CameraFrame::from(&telescope))?;
        Self::new(telescope, layout, focal_length)
    }
    /// Sets the neighbour search parameters
    ///
    /// Must be set before the neighbours are computed.
    pub fn neighbour_search(mut self, search: NeighbourSearch) -> Self {
        self.search = search;
        self.neighbours = OnceLock::new();
        self.edges = OnceLock::new();
        self
    }
    pub fn telescope(&self) -> &TelescopeName {
        &self.telescope
    }
    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }
    /// Focal length [cm]
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }
    /// Pixel diameter [cm]
    pub fn pixel_diameter(&self) -> f64 {
        self.layout.diameter()
    }
    pub fn pixel_shape(&self) -> PixelShape {
        self.layout.shape()
    }
    /// Computes the neighbours and the edge pixels if not done already
    pub fn ensure_computed(&self) -> &Self {
        self.edges();
        self
    }
    /// Returns the adjacent neighbours of each pixel
    pub fn neighbours(&self) -> &NeighbourMap {
        self.neighbours
            .get_or_init(|| NeighbourMap::new(&self.layout, &self.search))
    }
    /// Returns the edge pixels
    pub fn edges(&self) -> &EdgeSet {
        self.edges
            .get_or_init(|| EdgeSet::new(&self.layout, self.neighbours()))
    }
    /// Returns the camera field of view
    pub fn field_of_view(&self) -> Result<FieldOfView> {
        FieldOfView::new(&self.layout, self.edges(), self.focal_length)
    }
    /// Returns the camera fill factor: `(pixel diameter / pixel spacing)^2`
    ///
    /// The pixel spacing is the minimal distance between 2 pixels.
    pub fn fill_factor(&self) -> Option<f64> {
        *self.fill_factor.get_or_init(|| {
            let points: Vec<[f64; 2]> = self.layout.xy_iter().collect();
            neighbours::min_spacing(&points).map(|spacing| (self.layout.diameter() / spacing).powi(2))
        })
    }
}
