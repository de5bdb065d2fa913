//! In-memory client and scripted probe for unit tests

use crate::error::{ClientError, CloudError, Result};
use crate::probe::{Observation, StatusProbe};
use crate::provider::{AttachmentClient, CreateAttachmentRequest};
use crate::state::{AttachmentRecord, AttachmentState};
use crate::tags::Tags;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Step {
    State(AttachmentState),
    Absent,
    Fail(ClientError),
}

/// Pops the next step on every call and keeps repeating the final one
fn next_step(steps: &Mutex<VecDeque<Step>>) -> Option<Step> {
    let mut steps = steps.lock().unwrap();
    if steps.len() > 1 {
        steps.pop_front()
    } else {
        steps.front().cloned()
    }
}

pub struct ScriptedProbe {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl ScriptedProbe {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Delay every answer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusProbe for ScriptedProbe {
    type Record = AttachmentRecord;
    type State = AttachmentState;

    async fn probe(&self) -> Result<Observation<AttachmentRecord, AttachmentState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match next_step(&self.steps) {
            Some(Step::State(state)) => Ok(Observation::Present {
                record: AttachmentRecord::new("attachment-test", state.clone()),
                state,
            }),
            Some(Step::Absent) | None => Ok(Observation::Absent),
            Some(Step::Fail(err)) => Err(CloudError::from_client(
                crate::operation::Operation::Read,
                "attachment-test",
                err,
            )),
        }
    }
}

/// In-memory [`AttachmentClient`]
///
/// `get` consumes scripted steps for an id first (updating or removing the stored record),
/// then falls back to the stored record.
#[derive(Default)]
pub struct FakeClient {
    records: Mutex<HashMap<String, AttachmentRecord>>,
    scripts: Mutex<HashMap<String, Mutex<VecDeque<Step>>>>,
    get_error: Mutex<Option<ClientError>>,
    create_error: Mutex<Option<ClientError>>,
    delete_error: Mutex<Option<ClientError>>,
    next_id: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub tag_calls: Mutex<Vec<(String, Tags)>>,
    pub untag_calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: AttachmentRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.attachment_id.clone(), record);
    }

    pub fn record(&self, id: &str) -> Option<AttachmentRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    /// States `get` reports for `id`, in order; the last one repeats
    pub fn script(&self, id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), Mutex::new(steps.into_iter().collect()));
    }

    pub fn fail_get(&self, err: ClientError) {
        *self.get_error.lock().unwrap() = Some(err);
    }

    pub fn fail_create(&self, err: ClientError) {
        *self.create_error.lock().unwrap() = Some(err);
    }

    pub fn fail_delete(&self, err: ClientError) {
        *self.delete_error.lock().unwrap() = Some(err);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentClient for FakeClient {
    async fn create(&self, request: &CreateAttachmentRequest) -> std::result::Result<String, ClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err);
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("attachment-{:04}", n);
        let mut record = AttachmentRecord::new(&id, AttachmentState::Creating)
            .with_core_network(&request.core_network_id)
            .with_resource_arn(&request.vpn_connection_arn)
            .with_owner("123456789012");
        record.attachment_type = Some("SITE_TO_SITE_VPN".to_string());
        record.tags = request.tags.clone();
        self.insert(record);
        Ok(id)
    }

    async fn get(&self, id: &str) -> std::result::Result<AttachmentRecord, ClientError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.get_error.lock().unwrap().clone() {
            return Err(err);
        }

        let step = {
            let scripts = self.scripts.lock().unwrap();
            scripts.get(id).and_then(next_step)
        };

        let mut records = self.records.lock().unwrap();
        match step {
            Some(Step::State(state)) => {
                let record = records
                    .entry(id.to_string())
                    .or_insert_with(|| AttachmentRecord::new(id, state.clone()));
                record.state = state;
                Ok(record.clone())
            }
            Some(Step::Absent) => {
                records.remove(id);
                Err(ClientError::NotFound)
            }
            Some(Step::Fail(err)) => Err(err),
            None => records.get(id).cloned().ok_or(ClientError::NotFound),
        }
    }

    async fn delete(&self, id: &str) -> std::result::Result<(), ClientError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }

        let mut records = self.records.lock().unwrap();
        match records.get_mut(id) {
            Some(record) => {
                record.state = AttachmentState::Deleting;
                Ok(())
            }
            None => Err(ClientError::NotFound),
        }
    }

    async fn tag_resource(&self, arn: &str, tags: &Tags) -> std::result::Result<(), ClientError> {
        self.tag_calls
            .lock()
            .unwrap()
            .push((arn.to_string(), tags.clone()));

        let id = arn.rsplit('/').next().unwrap_or_default();
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(id).ok_or(ClientError::NotFound)?;
        record.tags.extend(tags.clone());
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &[String]) -> std::result::Result<(), ClientError> {
        self.untag_calls
            .lock()
            .unwrap()
            .push((arn.to_string(), keys.to_vec()));

        let id = arn.rsplit('/').next().unwrap_or_default();
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(id).ok_or(ClientError::NotFound)?;
        for key in keys {
            record.tags.remove(key);
        }
        Ok(())
    }
}
