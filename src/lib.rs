/*!
# Cherenkov telescope optics analysis

This crate models the pixel layout of Cherenkov telescope cameras and
analyses the point spread function (PSF) of ray-tracing simulations.

## Camera geometry

A [`Camera`] is built from a sim_telarray camera configuration file and the
telescope it is mounted on. The pixel positions are rotated into the frame of
an observer facing the camera, and the camera derives

- the adjacent neighbours of every pixel ([`NeighbourMap`]),
- the pixels on the camera boundary ([`EdgeSet`]),
- the field of view from the average edge radius and the focal length ([`FieldOfView`]).

```rust,no_run
use gammasim_optics::{Camera, TelescopeName};

let telescope: TelescopeName = "North-LST-1".parse()?;
let camera = Camera::from_path(telescope, "camera_CTA-LST_analogsum21_v2020-04-14.dat", 2800.)?;
let fov = camera.field_of_view()?;
println!("FoV: {:.3}deg, edge radius: {:.1}cm", fov.degrees, fov.average_edge_radius);
# Ok::<(), gammasim_optics::Error>(())
```

## Point spread function

A [`PhotonImage`] is loaded from a sim_telarray photon list and gives access to
the centroid, the effective mirror area and the containment diameter for any
photon fraction.

```rust,no_run
use gammasim_optics::{PhotonImage, PsfConfig, Unit};

let config = PsfConfig::default().focal_length(2800.);
let image = PhotonImage::from_path(config, "photons-LST-d12.0-za20.0-off0.000.lis.gz")?;
println!("D80: {:.2}cm", image.psf(0.8, Unit::Cm)?);
println!("D80: {:.4}deg", image.psf(0.8, Unit::Deg)?);
# Ok::<(), gammasim_optics::Error>(())
```
*/

pub mod camera;
pub use camera::{
    Camera, CameraError, CameraFrame, EdgeSet, FieldOfView, NeighbourMap, NeighbourSearch, Pixel,
    PixelLayout, PixelShape,
};
pub mod psf;
pub use psf::{PhotonImage, PsfConfig, PsfError, SolverConfig, Unit};
pub mod telescope;
pub use telescope::{CameraName, Site, TelescopeClass, TelescopeError, TelescopeName};
mod error;
pub use error::Error;
pub(crate) mod io;
