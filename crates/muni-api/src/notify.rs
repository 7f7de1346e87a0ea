//! Certificate delivery.
//!
//! Runs after the issuance commit on a detached task. Failures are logged
//! and counted; they never reach the HTTP response.

use muni_docs::DeliveryNotice;
use muni_mailer::{Attachment, MailClient, OutgoingMail};

/// Hand a notice to the mail relay in the background.
pub fn dispatch(mailer: Option<MailClient>, notice: DeliveryNotice) {
    let Some(client) = mailer else {
        tracing::warn!(
            attachment = %notice.attachment_name,
            "mail relay not configured; certificate delivery skipped"
        );
        metrics::counter!("muni_notifications_total", "outcome" => "skipped").increment(1);
        return;
    };

    tokio::spawn(async move {
        deliver(&client, notice).await;
    });
}

/// Send one notice and report whether the relay accepted it.
pub async fn deliver(client: &MailClient, notice: DeliveryNotice) -> bool {
    let attachment_name = notice.attachment_name.clone();
    match client.send(&outgoing(notice)).await {
        Ok(receipt) => {
            tracing::info!(
                attachment = %attachment_name,
                receipt_id = %receipt.id,
                "certificate delivered"
            );
            metrics::counter!("muni_notifications_total", "outcome" => "delivered").increment(1);
            true
        }
        Err(e) => {
            tracing::error!(
                attachment = %attachment_name,
                error = %e,
                "certificate delivery failed"
            );
            metrics::counter!("muni_notifications_total", "outcome" => "failed").increment(1);
            false
        }
    }
}

fn outgoing(notice: DeliveryNotice) -> OutgoingMail {
    OutgoingMail {
        to: notice.to.to_string(),
        subject: notice.subject,
        body: notice.body,
        attachment: Some(Attachment {
            filename: notice.attachment_name,
            content_type: notice.attachment_type.to_string(),
            bytes: notice.attachment,
        }),
    }
}
