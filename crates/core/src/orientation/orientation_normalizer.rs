use ndarray::{ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::shared::error::OrientationError;
use crate::shared::frame::Frame;

/// How the sensor image must be turned so that faces stand upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorRotation {
    None,
    /// Transpose, then mirror horizontally.
    #[default]
    Clockwise90,
    CounterClockwise90,
}

impl SensorRotation {
    pub fn inverse(self) -> Self {
        match self {
            SensorRotation::None => SensorRotation::None,
            SensorRotation::Clockwise90 => SensorRotation::CounterClockwise90,
            SensorRotation::CounterClockwise90 => SensorRotation::Clockwise90,
        }
    }
}

/// Turns raw sensor frames upright for detection and back again for
/// display. `denormalize(normalize(f)) == f` for every valid RGBA frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameOrientationNormalizer {
    rotation: SensorRotation,
}

impl FrameOrientationNormalizer {
    pub fn new(rotation: SensorRotation) -> Self {
        Self { rotation }
    }

    pub fn rotation(&self) -> SensorRotation {
        self.rotation
    }

    pub fn normalize(&self, frame: &Frame) -> Result<Frame, OrientationError> {
        check(frame)?;
        Ok(rotate(frame, self.rotation))
    }

    pub fn denormalize(&self, frame: &Frame) -> Result<Frame, OrientationError> {
        check(frame)?;
        Ok(rotate(frame, self.rotation.inverse()))
    }

    /// Flip horizontally in place. Undoes front-camera mirroring.
    pub fn mirror(frame: &mut Frame) -> Result<(), OrientationError> {
        check(frame)?;
        let px = frame.channels() as usize;
        let row_len = frame.width() as usize * px;
        if row_len == 0 {
            return Ok(());
        }
        for row in frame.data_mut().chunks_exact_mut(row_len) {
            let flipped: Vec<u8> = row.chunks_exact(px).rev().flatten().copied().collect();
            row.copy_from_slice(&flipped);
        }
        Ok(())
    }
}

fn check(frame: &Frame) -> Result<(), OrientationError> {
    if !frame.is_rgba() {
        return Err(OrientationError::UnsupportedChannels(frame.channels()));
    }
    if !frame.is_consistent() {
        return Err(OrientationError::InconsistentFrame {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
            actual: frame.data().len(),
        });
    }
    Ok(())
}

fn rotate(frame: &Frame, rotation: SensorRotation) -> Frame {
    let view: ArrayView3<u8> = frame.as_ndarray();
    let turned = match rotation {
        SensorRotation::None => return frame.clone(),
        SensorRotation::Clockwise90 => {
            let mut v = view.permuted_axes([1, 0, 2]);
            v.invert_axis(Axis(1));
            v
        }
        SensorRotation::CounterClockwise90 => {
            let mut v = view.permuted_axes([1, 0, 2]);
            v.invert_axis(Axis(0));
            v
        }
    };
    let data: Vec<u8> = turned.iter().copied().collect();
    Frame::new(
        data,
        frame.height(),
        frame.width(),
        frame.channels(),
        frame.index(),
    )
}
