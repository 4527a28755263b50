//! Rollcall school attendance server
//!
//! Keeps one attendance record per student and calendar day on top of a
//! generic document store, and exposes the roster, attendance and holiday
//! operations over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: repository::Repository,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository, clock: Arc<dyn services::Clock>) -> Self {
        let services = services::Services::new(repository.clone(), clock);
        Self {
            config: Arc::new(config),
            repository,
            services: Arc::new(services),
        }
    }
}
