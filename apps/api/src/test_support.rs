//! Shared test doubles and seed data for the pipeline tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::classifier::{Classifier, ClassifierError};
use crate::config::{Config, Posture};
use crate::messaging::{DeliveryError, Messenger};
use crate::models::classification::PhotoClassification;
use crate::models::message::{InboundMessage, MessageDirection, MessageStatus};
use crate::models::project::Project;
use crate::models::team::TeamMember;
use crate::processing::queue::{job_queue, Job};
use crate::state::AppState;
use crate::store::memory::MemoryStore;

/// Scripted classifier: pushed responses come back in order. An empty
/// script fails the call, which is how tests simulate an outage.
#[derive(Clone, Default)]
pub struct MockClassifier {
    script: Arc<Mutex<VecDeque<PhotoClassification>>>,
}

impl MockClassifier {
    pub fn push_response(&self, payload: PhotoClassification) {
        self.script.lock().unwrap().push_back(payload);
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        _media_url: &str,
        _media_type: &str,
        _note: Option<&str>,
    ) -> Result<PhotoClassification, ClassifierError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ClassifierError::Api {
                status: 500,
                message: "no scripted classification".to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
    pub media_url: Option<String>,
}

/// Recording messenger. `fail_for` makes delivery to one address fail, the
/// way a provider rejects an unreachable number.
#[derive(Clone, Default)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockMessenger {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_for(&self, to: &str) {
        self.failing.lock().unwrap().insert(to.to_string());
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<String, DeliveryError> {
        if self.failing.lock().unwrap().contains(to) {
            return Err(DeliveryError::Api {
                status: 400,
                message: format!("unreachable address {to}"),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            media_url: media_url.map(str::to_string),
        });
        Ok(format!("SM{:08}", sent.len()))
    }
}

pub fn test_config() -> Config {
    Config {
        posture: Posture::Development,
        public_base_url: "https://app.test".to_string(),
        webhook_auth_token: Some("testsecret".to_string()),
        classifier_api_url: "http://127.0.0.1:1/classify".to_string(),
        classifier_api_key: "test-key".to_string(),
        messaging_api_url: "http://127.0.0.1:1/messages".to_string(),
        messaging_account_sid: "ACtest".to_string(),
        messaging_auth_token: "test-token".to_string(),
        messaging_from_address: "whatsapp:+3197000000000".to_string(),
        worker_count: 2,
        queue_capacity: 16,
        expected_docs_per_phase: 8.0,
        port: 0,
        rust_log: "info".to_string(),
    }
}

/// One fully wired application over mock collaborators. `jobs_rx` stays
/// unconsumed until a test hands it to `spawn_workers`; pipeline tests that
/// call `process_message` directly just leave it in place.
pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub classifier: MockClassifier,
    pub messenger: MockMessenger,
    pub jobs_rx: mpsc::Receiver<Job>,
}

pub fn make_harness() -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let classifier = MockClassifier::default();
    let messenger = MockMessenger::default();
    let (jobs, jobs_rx) = job_queue(16);
    let state = AppState {
        store: store.clone(),
        classifier: Arc::new(classifier.clone()),
        messenger: Arc::new(messenger.clone()),
        jobs,
        config: test_config(),
    };
    TestHarness {
        state,
        store,
        classifier,
        messenger,
        jobs_rx,
    }
}

pub fn seed_member(
    organization_id: Uuid,
    name: &str,
    role: &str,
    phone: Option<&str>,
) -> TeamMember {
    let now = Utc::now();
    TeamMember {
        id: Uuid::new_v4(),
        organization_id,
        name: name.to_string(),
        role: role.to_string(),
        phone: phone.map(str::to_string),
        email: None,
        specialties: vec![],
        active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn seed_project(organization_id: Uuid) -> Project {
    Project {
        id: Uuid::new_v4(),
        organization_id,
        name: "Nieuwbouw Dorpsstraat 12".to_string(),
        property_id: Some(Uuid::new_v4()),
        current_phase: None,
        created_at: Utc::now(),
    }
}

pub fn seed_message(from: &str, body: &str, media: Option<(&str, &str)>) -> InboundMessage {
    let id = Uuid::new_v4();
    InboundMessage {
        id,
        external_message_id: format!("SM{}", id.simple()),
        from_address: from.to_string(),
        to_address: "+31970000000".to_string(),
        direction: MessageDirection::Incoming,
        body: body.to_string(),
        media_url: media.map(|(url, _)| url.to_string()),
        media_type: media.map(|(_, t)| t.to_string()),
        status: MessageStatus::Received,
        raw_params: Default::default(),
        received_at: Utc::now(),
    }
}
