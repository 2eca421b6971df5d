use std::sync::Arc;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::messaging::Messenger;
use crate::processing::queue::JobSender;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
/// The worker pool holds a clone of the same state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Pluggable media analysis. Production: HttpClassifier; tests script it.
    pub classifier: Arc<dyn Classifier>,
    /// Pluggable outbound delivery. Production: HttpMessenger.
    pub messenger: Arc<dyn Messenger>,
    /// Enqueue handle of the processing queue.
    pub jobs: JobSender,
    pub config: Config,
}
