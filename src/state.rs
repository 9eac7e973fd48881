use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::{AppConfig, BookingPolicy},
    realtime::BookingFeed,
    services::{advice_service::AdviceService, distance_service::DistanceService},
};

/// Everything a request handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub distance: DistanceService,
    pub advice: AdviceService,
    pub feed: BookingFeed,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> anyhow::Result<Self> {
        let distance = DistanceService::new(config.maps_api_key.clone())?;
        let advice = AdviceService::new(config.advice_api_key.clone(), config.advice_model.clone())?;
        Ok(Self {
            orm,
            config: Arc::new(config),
            distance,
            advice,
            feed: BookingFeed::new(),
        })
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.config.policy
    }
}
