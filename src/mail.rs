//! Email simulation: invoices are "sent" by writing the message to the log.

use crate::invoice::models::Invoice;
use crate::render::download_filename;

/// The message that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment_size: usize,
}

pub struct EmailSimulator {
    sender: String,
}

impl EmailSimulator {
    pub fn new(sender: &str) -> Self {
        Self {
            sender: sender.to_string(),
        }
    }

    pub fn compose(&self, invoice: &Invoice, pdf: &[u8]) -> SimulatedEmail {
        SimulatedEmail {
            to: invoice.client_email.clone(),
            subject: format!("Invoice #{} from {}", invoice.id, self.sender),
            body: format!(
                "Hello {}, please find your invoice {} attached. Amount due: {}.",
                invoice.client_name,
                invoice.number(),
                invoice.total_display()
            ),
            attachment_name: download_filename(invoice.id),
            attachment_size: pdf.len(),
        }
    }

    /// Log the email for `invoice`. Never fails and never touches the network.
    pub fn notify(&self, invoice: &Invoice, pdf: &[u8]) -> SimulatedEmail {
        let email = self.compose(invoice, pdf);
        log::info!("--- EMAIL SIMULATION ---");
        log::info!("To: {}", email.to);
        log::info!("Subject: {}", email.subject);
        log::info!("Body: {}", email.body);
        log::info!("Attachment: {} ({} bytes)", email.attachment_name, email.attachment_size);
        log::info!("--- END EMAIL SIMULATION ---");
        email
    }
}
