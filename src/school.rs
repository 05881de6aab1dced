use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::form::{FieldError, FormError};

const SHORT_NAME_LIMIT: usize = 50;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CoordinateError {
    #[error("expected \"latitude, longitude\", got {0:?}")]
    Shape(String),
    #[error("{0:?} is not a number")]
    Number(String),
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl FromStr for GeoPoint {
    type Err = CoordinateError;

    /// Accepts `34.0522, -118.2437` and `34.0522° N, 118.2437° W`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(',');
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CoordinateError::Shape(raw.to_string()));
        };
        let latitude = parse_axis(lat, 'N', 'S')?;
        let longitude = parse_axis(lng, 'E', 'W')?;
        GeoPoint::new(latitude, longitude)
    }
}

fn parse_axis(raw: &str, positive: char, negative: char) -> Result<f64, CoordinateError> {
    let trimmed = raw.trim();
    let (number, sign) = match trimmed.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some(c) if c == positive => (&trimmed[..trimmed.len() - 1], 1.0),
        Some(c) if c == negative => (&trimmed[..trimmed.len() - 1], -1.0),
        _ => (trimmed, 1.0),
    };
    let number = number.trim().trim_end_matches('°').trim();
    number
        .parse::<f64>()
        .map(|value| sign * value)
        .map_err(|_| CoordinateError::Number(raw.trim().to_string()))
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let north_south = if self.latitude < 0.0 { 'S' } else { 'N' };
        let east_west = if self.longitude < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{:.4}° {}, {:.4}° {}",
            self.latitude.abs(),
            north_south,
            self.longitude.abs(),
            east_west
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSchoolForm {
    pub name: String,
    pub coordinates: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSchool {
    pub name: String,
    pub location: GeoPoint,
}

impl NewSchoolForm {
    pub fn validate(&self) -> Result<NewSchool, FormError> {
        let mut errors = Vec::new();
        let name = self.name.trim();

        if name.is_empty() {
            errors.push(FieldError {
                field: "schoolName",
                message: "School Name is required".to_string(),
            });
        }

        let location = if self.coordinates.trim().is_empty() {
            errors.push(FieldError {
                field: "geoCoordinates",
                message: "Geo-Coordinates are required".to_string(),
            });
            None
        } else {
            match self.coordinates.parse::<GeoPoint>() {
                Ok(point) => Some(point),
                Err(err) => {
                    errors.push(FieldError {
                        field: "geoCoordinates",
                        message: err.to_string(),
                    });
                    None
                }
            }
        };

        match location {
            Some(location) if errors.is_empty() => Ok(NewSchool {
                name: name.to_string(),
                location,
            }),
            _ => Err(FormError::Invalid(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Longitude first.
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationUnitPayload {
    pub name: String,
    pub short_name: String,
    pub opening_date: String,
    pub parent: ParentRef,
    pub geometry: Geometry,
}

pub fn build_school_payload(
    school: &NewSchool,
    parent: &str,
    opening_date: NaiveDate,
) -> OrganisationUnitPayload {
    OrganisationUnitPayload {
        name: school.name.clone(),
        short_name: school.name.chars().take(SHORT_NAME_LIMIT).collect(),
        opening_date: opening_date.format("%Y-%m-%d").to_string(),
        parent: ParentRef {
            id: parent.to_string(),
        },
        geometry: Geometry {
            kind: "Point",
            coordinates: [school.location.longitude, school.location.latitude],
        },
    }
}
