//! Driving distance lookup backed by the Google Distance Matrix API.
//!
//! Without `GOOGLE_MAPS_API_KEY` the service answers with
//! [`TripMetrics::FALLBACK`] so quotes still work in local setups.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::fare::TripMetrics,
};

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: u32,
}

#[derive(Clone)]
pub struct DistanceService {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl DistanceService {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, api_key })
    }

    pub async fn driving_metrics(&self, origin: &str, destination: &str) -> AppResult<TripMetrics> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("GOOGLE_MAPS_API_KEY is not set, using fallback trip metrics");
            return Ok(TripMetrics::FALLBACK);
        };

        let response = self
            .http
            .get(DISTANCE_MATRIX_URL)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", api_key),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                tracing::error!(error = %err, "distance matrix request failed");
                AppError::CollaboratorUnavailable("distance lookup failed, please retry".into())
            })?;

        let body: DistanceMatrixResponse = response.json().await.map_err(|err| {
            tracing::error!(error = %err, "distance matrix response unreadable");
            AppError::CollaboratorUnavailable("distance lookup returned an unreadable answer".into())
        })?;

        metrics_from_response(body)
    }
}

fn metrics_from_response(body: DistanceMatrixResponse) -> AppResult<TripMetrics> {
    if body.status != "OK" {
        tracing::error!(
            status = %body.status,
            message = body.error_message.as_deref().unwrap_or("-"),
            "distance matrix rejected the request"
        );
        return Err(AppError::CollaboratorUnavailable(format!(
            "distance lookup failed with status {}",
            body.status
        )));
    }

    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| AppError::CollaboratorUnavailable("distance lookup returned no route".into()))?;

    match element.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => {
            return Err(AppError::validation(format!(
                "no driving route between pickup and dropoff ({})",
                element.status
            )));
        }
        other => {
            return Err(AppError::CollaboratorUnavailable(format!(
                "distance lookup failed with route status {other}"
            )));
        }
    }

    match (element.distance, element.duration) {
        (Some(distance), Some(duration)) => Ok(TripMetrics {
            distance_meters: distance.value,
            duration_seconds: duration.value,
        }),
        _ => Err(AppError::CollaboratorUnavailable(
            "distance lookup returned a route without distance or duration".into(),
        )),
    }
}
