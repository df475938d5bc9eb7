//! Camera edge pixels and field of view

use super::{CameraError, NeighbourMap, PixelLayout};
use itertools::Itertools;
use serde::Serialize;
use std::ops::Deref;

type Result<T> = std::result::Result<T, CameraError>;

/// Indices of the pixels on the camera boundary
///
/// Edge pixels are the pixels switched on with fewer neighbours than a pixel
/// fully surrounded by other pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeSet(Vec<usize>);
impl Deref for EdgeSet {
    type Target = Vec<usize>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl EdgeSet {
    pub fn new(layout: &PixelLayout, neighbours: &NeighbourMap) -> Self {
        log::debug!("Searching for edge pixels");
        let full_count = layout.shape().full_neighbour_count();
        Self(
            layout
                .pixels()
                .iter()
                .zip(neighbours.counts())
                .positions(|(pixel, n)| pixel.on && n < full_count)
                .collect(),
        )
    }
    /// Average distance of the edge pixels from the camera center
    pub fn average_radius(&self, layout: &PixelLayout) -> Result<f64> {
        if self.is_empty() {
            return Err(CameraError::EmptyEdgeSet);
        }
        let pixels = layout.pixels();
        let sum = self.iter().try_fold(0f64, |sum, &i| {
            pixels
                .get(i)
                .map(|pixel| sum + pixel.radius())
                .ok_or(CameraError::PixelNotFound(i))
        })?;
        Ok(sum / self.len() as f64)
    }
}

/// Camera field of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldOfView {
    /// field of view [deg]
    pub degrees: f64,
    /// average distance of the edge pixels from the camera center [cm]
    pub average_edge_radius: f64,
}
impl FieldOfView {
    /// Computes the field of view from the edge pixels and the focal length
    ///
    /// The focal length is in the same unit than the pixel positions.
    pub fn new(layout: &PixelLayout, edges: &EdgeSet, focal_length: f64) -> Result<Self> {
        log::debug!("Calculating the FoV");
        super::check_focal_length(focal_length)?;
        let average_edge_radius = edges.average_radius(layout)?;
        Ok(Self {
            degrees: 2. * (average_edge_radius / focal_length).atan().to_degrees(),
            average_edge_radius,
        })
    }
}
