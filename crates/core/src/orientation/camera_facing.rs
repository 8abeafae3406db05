use serde::{Deserialize, Serialize};

/// Which physical camera produced a frame.
///
/// Front-camera frames arrive mirrored and are flipped back before
/// orientation normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn is_front(self) -> bool {
        self == CameraFacing::Front
    }
}
