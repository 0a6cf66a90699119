//! Geographic bounding boxes.
//!
//! [`BoundingBox`] is the axis-aligned WGS84 rectangle the rest of the
//! system works in: the run region comes in as one, the grid
//! partitioner cuts it into smaller ones, and each export request
//! carries one as its bounds filter.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Axis-aligned geographic rectangle in WGS84 degrees.
///
/// Invariants (enforced by [`BoundingBox::new`]): all bounds are finite,
/// `west < east`, `south < north`, longitudes within `[-180, 180]`, and
/// latitudes within `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western (minimum) longitude.
    pub west: f64,
    /// Southern (minimum) latitude.
    pub south: f64,
    /// Eastern (maximum) longitude.
    pub east: f64,
    /// Northern (maximum) latitude.
    pub north: f64,
}

impl BoundingBox {
    /// Construct a bounding box, validating the invariants above.
    ///
    /// Zero-area and inverted rectangles are rejected: `west` must be
    /// strictly less than `east` and `south` strictly less than `north`.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoreError> {
        for (name, value) in [
            ("west", west),
            ("south", south),
            ("east", east),
            ("north", north),
        ] {
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "Bound '{name}' must be finite, got {value}"
                )));
            }
        }

        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(CoreError::Validation(format!(
                "Longitudes must be within [-180, 180], got west={west}, east={east}"
            )));
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(CoreError::Validation(format!(
                "Latitudes must be within [-90, 90], got south={south}, north={north}"
            )));
        }

        if west >= east {
            return Err(CoreError::Validation(format!(
                "west ({west}) must be strictly less than east ({east})"
            )));
        }
        if south >= north {
            return Err(CoreError::Validation(format!(
                "south ({south}) must be strictly less than north ({north})"
            )));
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Extent along the longitude axis, in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Extent along the latitude axis, in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;

    #[test]
    fn valid_box_accepted() {
        let bbox = BoundingBox::new(73.85, 18.52, 73.86, 18.53).unwrap();
        assert!((bbox.width() - 0.01).abs() < 1e-12);
        assert!((bbox.height() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn zero_width_rejected() {
        let result = BoundingBox::new(73.85, 18.52, 73.85, 18.53);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn zero_height_rejected() {
        let result = BoundingBox::new(73.85, 18.52, 73.86, 18.52);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn inverted_bounds_rejected() {
        assert_matches!(
            BoundingBox::new(73.86, 18.52, 73.85, 18.53),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            BoundingBox::new(73.85, 18.53, 73.86, 18.52),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn nan_bound_rejected() {
        assert_matches!(
            BoundingBox::new(f64::NAN, 18.52, 73.86, 18.53),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn out_of_range_longitude_rejected() {
        assert_matches!(
            BoundingBox::new(-190.0, 18.52, 73.86, 18.53),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn out_of_range_latitude_rejected() {
        assert_matches!(
            BoundingBox::new(73.85, -91.0, 73.86, 18.53),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn serde_round_trip() {
        let bbox = BoundingBox::new(-1.5, -2.5, 1.5, 2.5).unwrap();
        let json = serde_json::to_string(&bbox).unwrap();
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(bbox, back);
    }
}
