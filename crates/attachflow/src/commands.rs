use attachflow_cloud::{
    AttachmentClient, AttachmentLifecycle, AttachmentRecord, AttachmentState,
    CreateAttachmentRequest, TagChanges, Tags,
};
use colored::{ColoredString, Colorize};
use std::time::Duration;

/// Renders records either as colored text or as JSON attributes
pub struct Output {
    json: bool,
    partition: String,
    default_tags: Tags,
}

impl Output {
    pub fn new<C: AttachmentClient + ?Sized>(
        json: bool,
        lifecycle: &AttachmentLifecycle<'_, C>,
    ) -> Self {
        Self {
            json,
            partition: lifecycle.partition().to_string(),
            default_tags: lifecycle.default_tags().clone(),
        }
    }

    fn record(&self, record: &AttachmentRecord) -> anyhow::Result<()> {
        let attrs = record.attributes(&self.partition, &self.default_tags);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&attrs)?);
            return Ok(());
        }

        println!(
            "{} {}",
            record.attachment_id.cyan().bold(),
            paint_state(&record.state)
        );
        for (key, value) in &attrs {
            if matches!(key.as_str(), "id" | "state") || value.is_null() {
                continue;
            }
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {:<32} {}", key.dimmed(), value);
        }
        Ok(())
    }

    fn message(&self, id: &str, text: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "id": id, "result": text }));
        } else {
            println!("{} {}", "✓".green(), text);
        }
    }
}

fn paint_state(state: &AttachmentState) -> ColoredString {
    let label = state.to_string();
    match state {
        AttachmentState::Available => label.green(),
        AttachmentState::Creating
        | AttachmentState::Updating
        | AttachmentState::Deleting
        | AttachmentState::PendingNetworkUpdate => label.blue(),
        AttachmentState::PendingAttachmentAcceptance | AttachmentState::PendingTagAcceptance => {
            label.yellow()
        }
        AttachmentState::Rejected | AttachmentState::Failed | AttachmentState::Other(_) => {
            label.red()
        }
    }
}

pub async fn create<C: AttachmentClient + ?Sized>(
    lifecycle: &AttachmentLifecycle<'_, C>,
    output: &Output,
    core_network_id: String,
    vpn_arn: String,
    tags: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let request = CreateAttachmentRequest {
        core_network_id,
        vpn_connection_arn: vpn_arn,
        tags: tags.into_iter().collect(),
    };

    let record = lifecycle.create_and_wait(&request).await?;
    if record.state.is_pending_acceptance() && !output.json {
        eprintln!(
            "{}",
            format!(
                "Attachment {} is waiting for acceptance by the core network owner",
                record.attachment_id
            )
            .yellow()
        );
    }
    output.record(&record)
}

pub async fn delete<C: AttachmentClient + ?Sized>(
    lifecycle: &AttachmentLifecycle<'_, C>,
    output: &Output,
    id: &str,
) -> anyhow::Result<()> {
    lifecycle.delete_and_wait(id).await?;
    output.message(id, &format!("Attachment {} deleted", id));
    Ok(())
}

pub async fn await_available<C: AttachmentClient + ?Sized>(
    lifecycle: &AttachmentLifecycle<'_, C>,
    output: &Output,
    id: &str,
    timeout: Duration,
) -> anyhow::Result<()> {
    let record = lifecycle.await_available(id, timeout).await?;
    output.record(&record)
}

pub async fn show<C: AttachmentClient + ?Sized>(
    lifecycle: &AttachmentLifecycle<'_, C>,
    output: &Output,
    id: &str,
) -> anyhow::Result<()> {
    match lifecycle.read(id).await? {
        Some(record) => output.record(&record),
        None => anyhow::bail!("Attachment {} not found", id),
    }
}

pub async fn tag<C: AttachmentClient + ?Sized>(
    lifecycle: &AttachmentLifecycle<'_, C>,
    output: &Output,
    id: &str,
    set: Vec<(String, String)>,
    remove: Vec<String>,
) -> anyhow::Result<()> {
    let changes = TagChanges {
        set: set.into_iter().collect(),
        remove,
    };
    if changes.is_empty() {
        anyhow::bail!("Nothing to change: pass --set key=value or --remove key");
    }

    let record = lifecycle.update_tags(id, &changes).await?;
    output.record(&record)
}
