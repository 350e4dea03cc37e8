/// Data models for around-service
///
/// `Post` is both the document stored in the search index and the object
/// returned by `/search`, so its serde names are the wire names.
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque post identifier, also the document id in the index and the
/// object name in the media bucket.
pub type PostId = Uuid;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 coordinate pair.
///
/// Values are not range-checked; whatever the client sends is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance using the Haversine formula (kilometers)
    pub fn distance_km(&self, other: &Location) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// A search radius in kilometers. Renders in the index's distance syntax,
/// e.g. `200km`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    km: f64,
}

impl Distance {
    pub fn km(km: f64) -> Self {
        Self { km }
    }

    pub fn as_km(&self) -> f64 {
        self.km
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}km", self.km)
    }
}

/// A location-tagged post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Author: username of the authenticated principal
    pub user: String,
    pub message: String,
    pub location: Location,
    /// Public media reference, absent for text-only posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Stored credential record. Only the Argon2 PHC hash is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub username: String,
    pub password_hash: String,
}

/// Body of `/signup` and `/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub id: PostId,
    pub message: String,
}
