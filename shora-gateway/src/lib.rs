//! # shora-gateway
//!
//! Client side of the SHORA backend: the [`BackendGateway`] trait, its reqwest implementation
//! [`HttpGateway`], wire types and [`GatewayConfig`]. Failures are normalised into [`GatewayError`].

mod client;
mod config;
mod error;
mod http;
mod models;

pub use client::BackendGateway;
pub use config::{GatewayConfig, DEFAULT_API_URL, DEFAULT_BOT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{GatewayError, Result};
pub use http::HttpGateway;
pub use models::{
    BotReplyRequest, IncidentReport, IncidentSummary, ProfileUpsert, Registration, Reminder,
    INCIDENT_LOCATION, INCIDENT_REPORTER, INCIDENT_SEVERITY, INCIDENT_TYPE,
};
