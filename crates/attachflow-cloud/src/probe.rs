//! Single-shot status probes

use crate::error::{ClientError, CloudError, Result};
use crate::operation::Operation;
use crate::provider::AttachmentClient;
use crate::state::{AttachmentRecord, AttachmentState};
use async_trait::async_trait;
use std::fmt::Display;
use std::hash::Hash;

/// What one probe saw
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<R, S> {
    /// The resource exists and reports `state`
    Present { record: R, state: S },
    /// The remote service says the resource does not exist
    Absent,
}

impl<R, S: Display> Observation<R, S> {
    /// State label for logs and errors; absence reads as "absent"
    pub fn label(&self) -> String {
        match self {
            Observation::Present { state, .. } => state.to_string(),
            Observation::Absent => "absent".to_string(),
        }
    }
}

/// "What is the current state" for one resource
///
/// Absence is an observation, not an error. Any `Err` is final for the wait that issued
/// the probe.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    type Record: Clone + Send + Sync;
    type State: Clone + Eq + Hash + Display + Send + Sync;

    async fn probe(&self) -> Result<Observation<Self::Record, Self::State>>;
}

/// Probe backed by [`AttachmentClient::get`]
pub struct AttachmentProbe<'a, C: AttachmentClient + ?Sized> {
    client: &'a C,
    id: &'a str,
    operation: Operation,
}

impl<'a, C: AttachmentClient + ?Sized> AttachmentProbe<'a, C> {
    pub fn new(client: &'a C, id: &'a str) -> Self {
        Self {
            client,
            id,
            operation: Operation::Read,
        }
    }

    /// Operation named in errors raised by this probe
    pub fn for_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }
}

#[async_trait]
impl<'a, C: AttachmentClient + ?Sized> StatusProbe for AttachmentProbe<'a, C> {
    type Record = AttachmentRecord;
    type State = AttachmentState;

    async fn probe(&self) -> Result<Observation<AttachmentRecord, AttachmentState>> {
        match self.client.get(self.id).await {
            Ok(record) => {
                let state = record.state.clone();
                Ok(Observation::Present { record, state })
            }
            Err(ClientError::NotFound) => Ok(Observation::Absent),
            Err(err) => Err(CloudError::from_client(self.operation, self.id, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;

    #[tokio::test]
    async fn test_present() {
        let client = FakeClient::new();
        client.insert(AttachmentRecord::new("attachment-1", AttachmentState::Creating));

        let probe = AttachmentProbe::new(&client, "attachment-1");
        match probe.probe().await.unwrap() {
            Observation::Present { record, state } => {
                assert_eq!(record.attachment_id, "attachment-1");
                assert_eq!(state, AttachmentState::Creating);
            }
            Observation::Absent => panic!("expected a record"),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_absent() {
        let client = FakeClient::new();
        let probe = AttachmentProbe::new(&client, "attachment-missing");

        let observation = probe.probe().await.unwrap();
        assert_eq!(observation, Observation::Absent);
        assert_eq!(observation.label(), "absent");
    }

    #[tokio::test]
    async fn test_empty_result_is_fatal() {
        let client = FakeClient::new();
        client.fail_get(ClientError::EmptyResult);

        let probe = AttachmentProbe::new(&client, "attachment-1").for_operation(Operation::Create);
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::EmptyResult {
                operation: Operation::Create,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = FakeClient::new();
        client.fail_get(ClientError::Transport("connection reset".into()));

        let probe = AttachmentProbe::new(&client, "attachment-1");
        let err = probe.probe().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "read attachment attachment-1: API error: connection reset"
        );
    }
}
