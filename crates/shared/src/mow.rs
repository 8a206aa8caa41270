use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{domain::MowPattern, protocol::MowParametersView};

pub const WIDTH_MIN_EXCLUSIVE: f64 = 0.01;
pub const WIDTH_MAX: f64 = 1.0;
pub const ANGLE_MAX: i64 = 359;
pub const DISTANCE_TO_BORDER_MAX: i64 = 5;
pub const BORDER_PASSES_MAX: i64 = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MowConfigError {
    #[error("{field} value {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: &'static str,
    },
}

/// Mow-pattern parameters handed to the route builder.
///
/// Every field stays inside its bound: setters reject out-of-range writes and
/// leave the previous value in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MowParametersView", into = "MowParametersView")]
pub struct MowConfig {
    pattern: MowPattern,
    width: f64,
    angle: u16,
    distance_to_border: u8,
    mow_area: bool,
    border_passes: u8,
    mow_exclusion: bool,
    mow_border_ccw: bool,
}

impl Default for MowConfig {
    fn default() -> Self {
        Self {
            pattern: MowPattern::Lines,
            width: 0.18,
            angle: 90,
            distance_to_border: 1,
            mow_area: true,
            border_passes: 2,
            mow_exclusion: true,
            mow_border_ccw: false,
        }
    }
}

impl MowConfig {
    pub fn pattern(&self) -> MowPattern {
        self.pattern
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn angle(&self) -> u16 {
        self.angle
    }

    pub fn distance_to_border(&self) -> u8 {
        self.distance_to_border
    }

    pub fn mow_area(&self) -> bool {
        self.mow_area
    }

    pub fn border_passes(&self) -> u8 {
        self.border_passes
    }

    pub fn mow_exclusion(&self) -> bool {
        self.mow_exclusion
    }

    pub fn mow_border_ccw(&self) -> bool {
        self.mow_border_ccw
    }

    pub fn set_pattern(&mut self, pattern: MowPattern) {
        self.pattern = pattern;
    }

    pub fn set_width(&mut self, width: f64) -> Result<(), MowConfigError> {
        if width > WIDTH_MIN_EXCLUSIVE && width <= WIDTH_MAX {
            self.width = width;
            Ok(())
        } else {
            Err(MowConfigError::OutOfRange {
                field: "width",
                value: width.to_string(),
                range: "(0.01, 1.0]",
            })
        }
    }

    pub fn set_angle(&mut self, angle: i64) -> Result<(), MowConfigError> {
        self.angle = bounded("angle", angle, ANGLE_MAX, "(0, 359]")?;
        Ok(())
    }

    pub fn set_distance_to_border(&mut self, distance: i64) -> Result<(), MowConfigError> {
        self.distance_to_border = bounded("distancetoborder", distance, DISTANCE_TO_BORDER_MAX, "(0, 5]")?;
        Ok(())
    }

    pub fn set_border_passes(&mut self, passes: i64) -> Result<(), MowConfigError> {
        self.border_passes = bounded("mowborder", passes, BORDER_PASSES_MAX, "(0, 5]")?;
        Ok(())
    }

    pub fn set_mow_area(&mut self, mow_area: bool) {
        self.mow_area = mow_area;
    }

    pub fn set_mow_exclusion(&mut self, mow_exclusion: bool) {
        self.mow_exclusion = mow_exclusion;
    }

    pub fn set_mow_border_ccw(&mut self, mow_border_ccw: bool) {
        self.mow_border_ccw = mow_border_ccw;
    }
}

fn bounded<T: TryFrom<i64>>(
    field: &'static str,
    value: i64,
    max: i64,
    range: &'static str,
) -> Result<T, MowConfigError> {
    let out_of_range = || MowConfigError::OutOfRange {
        field,
        value: value.to_string(),
        range,
    };
    if value <= 0 || value > max {
        return Err(out_of_range());
    }
    T::try_from(value).map_err(|_| out_of_range())
}

impl From<&MowConfig> for MowParametersView {
    fn from(config: &MowConfig) -> Self {
        Self {
            pattern: config.pattern,
            width: config.width,
            angle: config.angle,
            distancetoborder: config.distance_to_border,
            mowarea: config.mow_area,
            mowborder: config.border_passes,
            mowexclusion: config.mow_exclusion,
            mowborderccw: config.mow_border_ccw,
        }
    }
}

impl From<MowConfig> for MowParametersView {
    fn from(config: MowConfig) -> Self {
        Self::from(&config)
    }
}

impl TryFrom<MowParametersView> for MowConfig {
    type Error = MowConfigError;

    fn try_from(view: MowParametersView) -> Result<Self, Self::Error> {
        let mut config = MowConfig {
            pattern: view.pattern,
            mow_area: view.mowarea,
            mow_exclusion: view.mowexclusion,
            mow_border_ccw: view.mowborderccw,
            ..MowConfig::default()
        };
        config.set_width(view.width)?;
        config.set_angle(i64::from(view.angle))?;
        config.set_distance_to_border(i64::from(view.distancetoborder))?;
        config.set_border_passes(i64::from(view.mowborder))?;
        Ok(config)
    }
}
