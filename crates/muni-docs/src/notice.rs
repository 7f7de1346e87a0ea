//! Delivery notice handed to the notification collaborator after issuance.

use muni_core::EmailAddress;
use muni_state::Citizen;

use crate::certificate::Certificate;
use crate::document::Document;

const BODY: &str =
    "Please find attached your official document with a QR code for authenticity verification.";

/// An email carrying the certificate to its recipient.
#[derive(Debug, Clone)]
pub struct DeliveryNotice {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment_type: &'static str,
    pub attachment: Vec<u8>,
}

impl DeliveryNotice {
    pub fn for_issuance(document: &Document, recipient: &Citizen, certificate: &Certificate) -> Self {
        Self {
            to: recipient.email.clone(),
            subject: format!("Your Official Document: {}", document.title),
            body: BODY.to_string(),
            attachment_name: Certificate::file_name(document),
            attachment_type: Certificate::CONTENT_TYPE,
            attachment: certificate.bytes.clone(),
        }
    }
}
