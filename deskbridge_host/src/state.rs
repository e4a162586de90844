//! Shared host state handed to every bridge connection.

use std::sync::Arc;

use crate::logger::Logger;
use crate::sampler::MetricsSampler;

#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub sampler: Arc<MetricsSampler>,
    pub auth_token: Option<String>,
}
