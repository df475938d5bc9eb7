use crate::{camera::CameraError, psf::PsfError, telescope::TelescopeError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `telescope` module")]
    Telescope(#[from] TelescopeError),
    #[error("Error in the `camera` module")]
    Camera(#[from] CameraError),
    #[error("Error in the `psf` module")]
    Psf(#[from] PsfError),
}
