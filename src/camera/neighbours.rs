//! Pixel neighbours
//!
//! Only directly adjacent neighbours are searched for: with the default
//! search radii, diagonal pixels of a square grid are out of reach.

use super::{PixelLayout, PixelShape};
use rstar::{primitives::GeomWithData, RTree};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Neighbour search parameters
///
/// The search radii are given in units of the pixel diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighbourSearch {
    /// search radius for hexagonal pixels
    pub hexagonal_radius_factor: f64,
    /// search radius for square pixels, larger to account for the gaps in SiPM cameras
    pub square_radius_factor: f64,
    /// maximum offset between 2 square pixels in the same row or column
    pub row_column_factor: f64,
    /// extension of the square pixel search radius for pixels in the same row or column
    pub fallback_radius_factor: f64,
}
impl Default for NeighbourSearch {
    fn default() -> Self {
        Self {
            hexagonal_radius_factor: 1.1,
            square_radius_factor: 1.4,
            row_column_factor: 0.2,
            fallback_radius_factor: 1.2,
        }
    }
}

/// Adjacent pixel indices of each pixel
///
/// The indices of each list are sorted and never include the pixel itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighbourMap(Vec<Vec<usize>>);
impl Deref for NeighbourMap {
    type Target = Vec<Vec<usize>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl NeighbourMap {
    /// Finds the neighbours of all the pixels in the layout
    pub fn new(layout: &PixelLayout, search: &NeighbourSearch) -> Self {
        log::debug!("Searching for neighbour pixels");
        let points: Vec<[f64; 2]> = layout.xy_iter().collect();
        let diameter = layout.diameter();
        let neighbours = match layout.shape() {
            PixelShape::Hexagonal | PixelShape::HexagonalRotated => {
                find_neighbours(&points, search.hexagonal_radius_factor * diameter)
            }
            PixelShape::Square => find_adjacent_neighbours(
                &points,
                search.square_radius_factor * diameter,
                search.row_column_factor * diameter,
                search.fallback_radius_factor,
            ),
        };
        Self(neighbours)
    }
    /// Number of neighbours of each pixel
    pub fn counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(Vec::len)
    }
    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.0
    }
}

/// Finds, for each point, the other points within `radius` (inclusive)
pub fn find_neighbours(points: &[[f64; 2]], radius: f64) -> Vec<Vec<usize>> {
    let tree = index(points);
    let r2 = radius * radius;
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut nn: Vec<usize> = tree
                .locate_within_distance(*p, r2)
                .map(|point| point.data)
                .filter(|&j| j != i)
                .collect();
            nn.sort_unstable();
            nn
        })
        .collect()
}

/// Finds the adjacent neighbours of square pixels
///
/// Neighbours are first searched within `radius`. Diagonal pixels are left
/// out only because `radius` is shorter than the grid diagonal, as it is with
/// the default 1.4 pixel diameter for pixels touching each other.
/// For the pixels with less than 4 neighbours, pixels in the same row or
/// column, i.e. offset by less than `row_column_dist` along x or y, are
/// added if they are closer than `fallback_factor x radius`.
/// The fallback only applies to the pixels missing neighbours so the
/// relation may not be symmetric.
pub fn find_adjacent_neighbours(
    points: &[[f64; 2]],
    radius: f64,
    row_column_dist: f64,
    fallback_factor: f64,
) -> Vec<Vec<usize>> {
    let mut neighbours = find_neighbours(points, radius);
    let max_dist = fallback_factor * radius;
    for (i, nn) in neighbours.iter_mut().enumerate() {
        if nn.len() >= 4 {
            continue;
        }
        let [xi, yi] = points[i];
        let extra: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i && nn.binary_search(&j).is_err())
            .filter(|&(_, &[xj, yj])| {
                let (dx, dy) = ((xi - xj).abs(), (yi - yj).abs());
                (dx < row_column_dist || dy < row_column_dist) && dx.hypot(dy) < max_dist
            })
            .map(|(j, _)| j)
            .collect();
        if !extra.is_empty() {
            nn.extend(extra);
            nn.sort_unstable();
        }
    }
    neighbours
}

/// Minimum non-zero distance between 2 points
pub fn min_spacing(points: &[[f64; 2]]) -> Option<f64> {
    let tree = index(points);
    points
        .iter()
        .filter_map(|p| {
            tree.nearest_neighbor_iter_with_distance_2(p)
                .map(|(_, d2)| d2)
                .find(|&d2| d2 > 0.)
        })
        .min_by(|a, b| a.total_cmp(b))
        .map(f64::sqrt)
}

fn index(points: &[[f64; 2]]) -> RTree<IndexedPoint> {
    RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(*p, i))
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::camera::CameraFrame;

    pub(crate) fn hexagonal_grid(n_rings: i32) -> Vec<[f64; 2]> {
        let mut points = vec![];
        for q in -n_rings..=n_rings {
            for r in (-n_rings).max(-q - n_rings)..=n_rings.min(-q + n_rings) {
                let (q, r) = (q as f64, r as f64);
                points.push([q + 0.5 * r, r * 3f64.sqrt() / 2.]);
            }
        }
        points
    }

    fn square_grid(n: usize, pitch: f64) -> Vec<[f64; 2]> {
        (0..n)
            .flat_map(|i| (0..n).map(move |j| [i as f64 * pitch, j as f64 * pitch]))
            .collect()
    }

    #[test]
    fn three_hexagonal_pixels() {
        let config = "PixType 1 0 0 300 1 1.0 1.0\nPixel 0 1 0 0\nPixel 1 1 1 0\nPixel 2 1 0 1\n";
        let layout = PixelLayout::from_reader(config.as_bytes(), CameraFrame::default()).unwrap();
        let neighbours = NeighbourMap::new(&layout, &NeighbourSearch::default());
        assert_eq!(neighbours[0], vec![1, 2]);
        assert_eq!(neighbours[1], vec![0]);
        assert_eq!(neighbours[2], vec![0]);
    }

    #[test]
    fn hexagonal_grid_neighbours() {
        let points = hexagonal_grid(3);
        assert_eq!(points.len(), 37);
        let neighbours = find_neighbours(&points, 1.1);
        for (i, nn) in neighbours.iter().enumerate() {
            assert!(!nn.contains(&i));
            assert!(nn.len() <= 6);
            let [x, y] = points[i];
            if x.hypot(y) < 2.5 {
                assert_eq!(nn.len(), 6, "pixel #{i} at ({x},{y})");
            }
        }
    }

    #[test]
    fn square_grid_neighbours() {
        let points = square_grid(5, 1.);
        let neighbours = find_adjacent_neighbours(&points, 1.4, 0.2, 1.2);
        for (i, nn) in neighbours.iter().enumerate() {
            assert!(!nn.contains(&i));
            let (col, row) = (i / 5, i % 5);
            let n_border = [col == 0, col == 4, row == 0, row == 4]
                .into_iter()
                .filter(|b| *b)
                .count();
            assert_eq!(nn.len(), 4 - n_border, "pixel #{i}");
        }
    }

    #[test]
    fn square_gap_fallback() {
        // 2 modules of 3x3 pixels separated by a gap of half a pixel
        let points: Vec<[f64; 2]> = square_grid(3, 1.)
            .into_iter()
            .chain(square_grid(3, 1.).into_iter().map(|[x, y]| [x + 3.5, y]))
            .collect();
        let first_pass = find_neighbours(&points, 1.4);
        let neighbours = find_adjacent_neighbours(&points, 1.4, 0.2, 1.2);
        // middle right pixel of the 1st module and middle left pixel of the 2nd one
        assert_eq!(first_pass[7], vec![4, 6, 8]);
        assert_eq!(neighbours[7], vec![4, 6, 8, 10]);
        assert_eq!(neighbours[10], vec![7, 9, 11, 13]);
    }

    #[test]
    fn square_fallback_is_not_symmetric() {
        let points = [
            [0., 0.],
            [1., 0.],
            [-1., 0.],
            [0., 1.3],
            [0.8, -1.],
            [0., -1.6],
        ];
        let neighbours = find_adjacent_neighbours(&points, 1.4, 0.2, 1.2);
        assert_eq!(neighbours[0], vec![1, 2, 3, 4]);
        assert_eq!(neighbours[5], vec![0, 4]);
        assert!(!neighbours[0].contains(&5));
    }

    #[test]
    fn isolated_pixel() {
        let points = [[0., 0.], [10., 10.]];
        let neighbours = find_adjacent_neighbours(&points, 1.4, 0.2, 1.2);
        assert!(neighbours.iter().all(|nn| nn.is_empty()));
    }

    #[test]
    fn spacing() {
        let points = [[0., 0.], [0., 0.], [3., 0.], [3., 4.5]];
        assert_eq!(min_spacing(&points), Some(3.));
        assert_eq!(min_spacing(&points[..2]), None);
        assert_eq!(min_spacing(&[]), None);
    }

    #[test]
    fn spacing_of_large_grid() {
        let points = hexagonal_grid(20);
        let spacing = min_spacing(&points).unwrap();
        assert!((spacing - 1.).abs() < 1e-9, "{spacing}");
        let points = square_grid(40, 0.7);
        assert!((min_spacing(&points).unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn diagonals_within_reach() {
        let points = square_grid(3, 1.);
        // diagonals are at sqrt(2) from the center pixel
        assert_eq!(find_adjacent_neighbours(&points, 1.4, 0.2, 1.2)[4], vec![1, 3, 5, 7]);
        assert_eq!(
            find_adjacent_neighbours(&points, 1.5, 0.2, 1.2)[4],
            vec![0, 1, 2, 3, 5, 6, 7, 8]
        );
    }
}
