//! Telescope naming
//!
//! Telescope names follow the `Site-Class-Type` convention, e.g. *North-LST-1*,
//! *South-MST-FlashCam-D* or *South-SST-ASTRI-D*.
//! The camera mounted on a telescope, the number of mirrors and the rotation
//! bringing the camera pixels to the frame of an observer facing the camera
//! are all derived from the name.

use std::{fmt, str::FromStr};
use strum_macros::EnumIter;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TelescopeError {
    #[error("invalid telescope name {0:?}, expected Site-Class-Type")]
    Name(String),
    #[error("unknown site {0:?}")]
    Site(String),
    #[error("unknown telescope class {0:?}")]
    Class(String),
    #[error("no camera known for telescope {0:?}")]
    UnknownCamera(String),
}
type Result<T> = std::result::Result<T, TelescopeError>;

/// Observatory site
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    South,
    North,
}
impl FromStr for Site {
    type Err = TelescopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "south" | "paranal" => Ok(Site::South),
            "north" | "lapalma" => Ok(Site::North),
            _ => Err(TelescopeError::Site(s.to_string())),
        }
    }
}
impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::South => write!(f, "South"),
            Site::North => write!(f, "North"),
        }
    }
}

/// Telescope size class
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelescopeClass {
    Lst,
    Mst,
    Sst,
    Sct,
}
impl FromStr for TelescopeClass {
    type Err = TelescopeError;

    fn from_str(s: &str) -> Result<Self> {
        use TelescopeClass::*;
        match s.to_lowercase().as_str() {
            "lst" => Ok(Lst),
            "mst" => Ok(Mst),
            "sst" => Ok(Sst),
            "sct" => Ok(Sct),
            _ => Err(TelescopeError::Class(s.to_string())),
        }
    }
}
impl fmt::Display for TelescopeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TelescopeClass::*;
        match self {
            Lst => write!(f, "LST"),
            Mst => write!(f, "MST"),
            Sst => write!(f, "SST"),
            Sct => write!(f, "SCT"),
        }
    }
}

/// Camera models
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraName {
    Lst,
    FlashCam,
    NectarCam,
    Sct,
    Astri,
    Gct,
    OneM,
    Sst,
}
impl CameraName {
    /// Rotation angle [deg] aligning the camera pixels with the Alt (x) and Az (y) axes
    ///
    /// LST and NectarCam are at 270 - 2x10.893: the camera team's rotation
    /// has to be undone before rotating in the right direction.
    pub fn rotation_offset_deg(&self) -> f64 {
        use CameraName::*;
        match self {
            Lst | NectarCam => 248.214,
            FlashCam | OneM => 270.,
            Sct | Astri | Gct | Sst => 90.,
        }
    }
}
impl fmt::Display for CameraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CameraName::*;
        match self {
            Lst => write!(f, "LST"),
            FlashCam => write!(f, "FlashCam"),
            NectarCam => write!(f, "NectarCam"),
            Sct => write!(f, "SCT"),
            Astri => write!(f, "ASTRI"),
            Gct => write!(f, "GCT"),
            OneM => write!(f, "1M"),
            Sst => write!(f, "SST"),
        }
    }
}

/// Telescope name split into site, class and type
#[derive(Debug, Clone, PartialEq)]
pub struct TelescopeName {
    pub site: Site,
    pub class: TelescopeClass,
    /// anything after the class, e.g. `FlashCam-D` or `1`
    pub kind: String,
    camera: CameraName,
}
impl TelescopeName {
    /// Returns the camera mounted on the telescope
    pub fn camera(&self) -> CameraName {
        self.camera
    }
    /// Checks if the telescope is a dual mirror design
    pub fn is_two_mirror(&self) -> bool {
        match self.class {
            TelescopeClass::Sst => self.camera != CameraName::OneM,
            TelescopeClass::Sct => true,
            TelescopeClass::Lst | TelescopeClass::Mst => false,
        }
    }
}
fn camera_name(name: &str, class: TelescopeClass, kind: &str) -> Result<CameraName> {
    let kind = kind.to_lowercase();
    let camera = match class {
        TelescopeClass::Lst => CameraName::Lst,
        TelescopeClass::Mst if kind.contains("flashcam") => CameraName::FlashCam,
        TelescopeClass::Mst if kind.contains("nectarcam") => CameraName::NectarCam,
        TelescopeClass::Mst => return Err(TelescopeError::UnknownCamera(name.to_string())),
        TelescopeClass::Sct => CameraName::Sct,
        TelescopeClass::Sst if kind.contains("astri") => CameraName::Astri,
        TelescopeClass::Sst if kind.contains("gct") => CameraName::Gct,
        TelescopeClass::Sst if kind.contains("1m") => CameraName::OneM,
        TelescopeClass::Sst => CameraName::Sst,
    };
    Ok(camera)
}
impl FromStr for TelescopeName {
    type Err = TelescopeError;

    fn from_str(name: &str) -> Result<Self> {
        let mut parts = name.trim().splitn(3, '-');
        let (Some(site), Some(class)) = (parts.next(), parts.next()) else {
            return Err(TelescopeError::Name(name.to_string()));
        };
        let site: Site = site.parse()?;
        let class: TelescopeClass = class.parse()?;
        let kind = parts.next().unwrap_or_default().to_string();
        let camera = camera_name(name, class, &kind)?;
        log::debug!("Camera name - {camera}");
        Ok(Self {
            site,
            class,
            kind,
            camera,
        })
    }
}
impl fmt::Display for TelescopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}-{}", self.site, self.class)
        } else {
            write!(f, "{}-{}-{}", self.site, self.class, self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn lst() {
        let tel: TelescopeName = "North-LST-1".parse().unwrap();
        assert_eq!(tel.site, Site::North);
        assert_eq!(tel.class, TelescopeClass::Lst);
        assert_eq!(tel.kind, "1");
        assert_eq!(tel.camera(), CameraName::Lst);
        assert!(!tel.is_two_mirror());
        assert_eq!(tel.to_string(), "North-LST-1");
    }

    #[test]
    fn mst_cameras() {
        let tel: TelescopeName = "south-mst-flashcam-d".parse().unwrap();
        assert_eq!(tel.site, Site::South);
        assert_eq!(tel.camera(), CameraName::FlashCam);
        let tel: TelescopeName = "LaPalma-MST-NectarCam-D".parse().unwrap();
        assert_eq!(tel.site, Site::North);
        assert_eq!(tel.camera(), CameraName::NectarCam);
        assert_eq!(
            "North-MST-D".parse::<TelescopeName>(),
            Err(TelescopeError::UnknownCamera("North-MST-D".into()))
        );
    }

    #[test]
    fn dual_mirror() {
        let two_mirrors = |name: &str| name.parse::<TelescopeName>().unwrap().is_two_mirror();
        assert!(two_mirrors("South-SST-ASTRI-D"));
        assert!(two_mirrors("South-SST-GCT-D"));
        assert!(two_mirrors("South-SST-D"));
        assert!(!two_mirrors("South-SST-1M-D"));
        assert!(two_mirrors("South-SCT-D"));
        assert!(!two_mirrors("South-MST-FlashCam-D"));
    }

    #[test]
    fn sst_cameras() {
        let camera = |name: &str| name.parse::<TelescopeName>().unwrap().camera();
        assert_eq!(camera("Paranal-SST-ASTRI-D"), CameraName::Astri);
        assert_eq!(camera("Paranal-SST-GCT-D"), CameraName::Gct);
        assert_eq!(camera("Paranal-SST-1M-D"), CameraName::OneM);
        assert_eq!(camera("Paranal-SST-D"), CameraName::Sst);
    }

    #[test]
    fn invalid_names() {
        assert!(matches!(
            "LST".parse::<TelescopeName>(),
            Err(TelescopeError::Name(_))
        ));
        assert!(matches!(
            "Moon-LST-1".parse::<TelescopeName>(),
            Err(TelescopeError::Site(_))
        ));
        assert!(matches!(
            "North-XST-1".parse::<TelescopeName>(),
            Err(TelescopeError::Class(_))
        ));
    }

    #[test]
    fn rotation_offsets() {
        for camera in CameraName::iter() {
            let offset = camera.rotation_offset_deg();
            assert!(offset > 0. && offset < 360., "{camera}: {offset}");
        }
        assert_eq!(CameraName::NectarCam.rotation_offset_deg(), 248.214);
    }
}
