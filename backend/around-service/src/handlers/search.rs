use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Distance, Location};
use crate::state::AppState;

/// Raw query string of GET /search. Fields are parsed by hand so a
/// malformed number answers 400 with a readable message.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// Radius in kilometers
    pub range: Option<String>,
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<f64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("{name} must be a number"))),
    }
}

impl SearchParams {
    /// Center and optional radius of the query
    pub fn parse(&self) -> Result<(Location, Option<Distance>)> {
        let lat = parse_number("lat", self.lat.as_deref())?
            .ok_or_else(|| AppError::BadRequest("lat is required".into()))?;
        let lon = parse_number("lon", self.lon.as_deref())?
            .ok_or_else(|| AppError::BadRequest("lon is required".into()))?;

        let range = match parse_number("range", self.range.as_deref())? {
            Some(km) if km < 0.0 => {
                return Err(AppError::BadRequest("range must not be negative".into()))
            }
            Some(km) => Some(Distance::km(km)),
            None => None,
        };

        Ok((Location::new(lat, lon), range))
    }
}

/// GET /search?lat=..&lon=..[&range=..]
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let (center, range) = query.parse()?;
    let posts = state.proximity.search(center, range).await?;

    Ok(HttpResponse::Ok().json(posts))
}
