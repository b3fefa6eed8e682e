use serde::Serialize;

use crate::models::tables::Poi;

/// Padding added on every side of a bounding box: two arc-seconds.
pub const MARGIN_DEGREES: f64 = 2.0 / 3600.0;

pub trait Located {
    fn longitude(&self) -> f64;
    fn latitude(&self) -> f64;
}

impl Located for Poi {
    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }
}

impl Located for (f64, f64) {
    /// `(longitude, latitude)`
    fn longitude(&self) -> f64 {
        self.0
    }

    fn latitude(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }

    pub fn contains(&self, point: &impl Located) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.longitude())
            && (self.min_lat..=self.max_lat).contains(&point.latitude())
    }
}

/// Padded box around every point, or `None` when there are no points.
pub fn bounds<'a, T, I>(points: I) -> Option<BoundingBox>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;

    let mut bbox = BoundingBox {
        min_lon: first.longitude(),
        min_lat: first.latitude(),
        max_lon: first.longitude(),
        max_lat: first.latitude(),
    };

    for p in iter {
        bbox.min_lon = bbox.min_lon.min(p.longitude());
        bbox.min_lat = bbox.min_lat.min(p.latitude());
        bbox.max_lon = bbox.max_lon.max(p.longitude());
        bbox.max_lat = bbox.max_lat.max(p.latitude());
    }

    Some(BoundingBox {
        min_lon: bbox.min_lon - MARGIN_DEGREES,
        min_lat: bbox.min_lat - MARGIN_DEGREES,
        max_lon: bbox.max_lon + MARGIN_DEGREES,
        max_lat: bbox.max_lat + MARGIN_DEGREES,
    })
}
