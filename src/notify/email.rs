//! Email channel: HTML report delivered through SendGrid.

#![allow(missing_docs)]

use serde_json::json;

use crate::core::config::{
    NOTIFIER_SENDER_EMAIL_ENV, NOTIFIER_SENDER_NAME_ENV, SENDGRID_API_KEY_ENV,
};
use crate::core::errors::{IvError, Result};
use crate::core::http::blocking_client;
use crate::notify::contacts::{Contact, ContactGetter, configured_contacts, parse_email_contacts};
use crate::notify::{EmailConfig, Notifier};
use crate::scanner::rules::ValidationError;

const CHANNEL: &str = "email";
const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// A fully addressed email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: Contact,
    pub subject: String,
    pub to: Vec<Contact>,
    pub html_content: String,
}

/// Delivers one email to all of its recipients.
pub trait EmailTransport: Send + Sync {
    fn send_email(&self, message: &EmailMessage) -> Result<()>;
}

/// SendGrid v3 mail-send API.
pub struct SendGridClient {
    api_key: String,
    endpoint: String,
    http: reqwest::blocking::Client,
}

impl SendGridClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = blocking_client().map_err(|e| IvError::Transport {
            channel: CHANNEL,
            details: format!("failed to create HTTP client: {e}"),
        })?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
            http,
        })
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn sendgrid_payload(message: &EmailMessage) -> serde_json::Value {
    let to: Vec<serde_json::Value> = message
        .to
        .iter()
        .map(|contact| json!({ "email": contact.address, "name": contact.name }))
        .collect();
    json!({
        "personalizations": [{ "to": to }],
        "from": { "email": message.from.address, "name": message.from.name },
        "subject": message.subject,
        "content": [{ "type": "text/html", "value": message.html_content }],
    })
}

impl EmailTransport for SendGridClient {
    fn send_email(&self, message: &EmailMessage) -> Result<()> {
        let transport_error = |details: String| IvError::Transport {
            channel: CHANNEL,
            details,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&sendgrid_payload(message))
            .send()
            .map_err(|e| transport_error(format!("error sending email: {e}")))?;

        let status = response.status();
        tracing::debug!(%status, "email response");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(transport_error(format!("HTTP {status}: {}", body.trim())));
        }
        Ok(())
    }
}

/// Sends the violation report as one HTML email to every configured contact.
pub struct EmailNotifier {
    transport: Box<dyn EmailTransport>,
    sender: Contact,
    contacts: ContactGetter,
}

impl EmailNotifier {
    #[must_use]
    pub fn new(transport: Box<dyn EmailTransport>, sender: Contact, contacts: ContactGetter) -> Self {
        Self {
            transport,
            sender,
            contacts,
        }
    }

    /// Build from configuration, failing if the API key or sender is missing.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        tracing::info!("initializing email notifier");
        let mut missing = Vec::new();
        for (key, value) in [
            (SENDGRID_API_KEY_ENV, &config.api_key),
            (NOTIFIER_SENDER_NAME_ENV, &config.sender_name),
            (NOTIFIER_SENDER_EMAIL_ENV, &config.sender_email),
        ] {
            if value.trim().is_empty() {
                missing.push(key);
            }
        }
        if !missing.is_empty() {
            return Err(IvError::MissingSetting { keys: missing });
        }

        let notifier = Self::new(
            Box::new(SendGridClient::new(config.api_key.clone())?),
            Contact::new(config.sender_name.clone(), config.sender_email.clone()),
            configured_contacts(&config.recipients, parse_email_contacts),
        );
        tracing::info!("email notifier initialized successfully");
        Ok(notifier)
    }

    pub fn set_contacts_getter(&mut self, getter: ContactGetter) {
        self.contacts = getter;
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    fn format_content(&self, errors: &[ValidationError]) -> Result<String> {
        Ok(render_email_html(errors))
    }

    fn send(&self, subject: &str, content: &str) -> Result<()> {
        tracing::info!("notifying using email notifier");
        let to = (self.contacts)();
        if to.is_empty() {
            return Err(IvError::EmptyRecipients { channel: CHANNEL });
        }

        let message = EmailMessage {
            from: self.sender.clone(),
            subject: subject.to_string(),
            to,
            html_content: content.to_string(),
        };
        self.transport.send_email(&message)?;

        let addresses: Vec<&str> = message.to.iter().map(|c| c.address.as_str()).collect();
        tracing::info!("email sent successfully to: {}", addresses.join(", "));
        Ok(())
    }
}

const EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <style type="text/css">
    body, p, div { font-family: arial; font-size: 14px; }
    body { color: #000000; }
  </style>
</head>
<body>
  <div style="padding: 18px 0px; line-height: 22px; max-width: 600px;">
    <div>Below is the list of failed validators:</div>
    <div>
      <ul>
{{ITEMS}}      </ul>
    </div>
  </div>
</body>
</html>
"#;

/// Render the HTML body: one list item per violation.
#[must_use]
pub fn render_email_html(errors: &[ValidationError]) -> String {
    let mut items = String::new();
    for err in errors {
        items.push_str(&format!(
            "        <li>\n          {}<br />\n          \
             <span style=\"padding-left: 20px\">Actual: {}</span><br />\n          \
             <span style=\"padding-left: 20px\">Expected: {}</span>\n        </li>\n",
            escape_html(&err.additional_info),
            escape_html(&err.actual),
            escape_html(&err.expected),
        ));
    }
    EMAIL_TEMPLATE.replace("{{ITEMS}}", &items)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::contacts::fixed_contacts;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<EmailMessage>>>,
        fail: bool,
    }

    impl EmailTransport for RecordingTransport {
        fn send_email(&self, message: &EmailMessage) -> Result<()> {
            if self.fail {
                return Err(IvError::Transport {
                    channel: CHANNEL,
                    details: "HTTP 401".to_string(),
                });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn violation(info: &str, actual: &str) -> ValidationError {
        ValidationError {
            actual: actual.to_string(),
            expected: "First Last, ie John Doe".to_string(),
            additional_info: info.to_string(),
        }
    }

    fn notifier(transport: RecordingTransport, contacts: Vec<Contact>) -> EmailNotifier {
        EmailNotifier::new(
            Box::new(transport),
            Contact::new("Validator", "validator@example.com"),
            fixed_contacts(contacts),
        )
    }

    #[test]
    fn html_has_one_item_per_violation() {
        let html = render_email_html(&[
            violation("Folder: \"/I/Doe, John\"", "\"Doe, John\""),
            violation("File: \"/I/bad.docx\"", "\"bad.docx\""),
        ]);
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains("Below is the list of failed validators:"));
        assert!(html.contains("Actual: &#34;Doe, John&#34;"));
        assert!(html.contains("Expected: First Last, ie John Doe"));
        assert!(!html.contains("{{ITEMS}}"));
    }

    #[test]
    fn html_escapes_interpolated_text() {
        let html = render_email_html(&[violation("File: \"<script>&\"", "\"<b>\"")]);
        assert!(html.contains("&lt;script&gt;&amp;"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn send_addresses_all_contacts_in_one_message() {
        let transport = RecordingTransport::default();
        let n = notifier(
            transport.clone(),
            vec![
                Contact::new("A", "a@example.com"),
                Contact::new("B", "b@example.com"),
            ],
        );
        n.send("Failed Invoice Validations - 01312019", "<p>x</p>")
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.len(), 2);
        assert_eq!(sent[0].subject, "Failed Invoice Validations - 01312019");
        assert_eq!(sent[0].from.address, "validator@example.com");
        assert_eq!(sent[0].html_content, "<p>x</p>");
    }

    #[test]
    fn empty_recipients_fail_without_sending() {
        let transport = RecordingTransport::default();
        let n = notifier(transport.clone(), Vec::new());
        let err = n.send("s", "c").unwrap_err();
        assert!(matches!(err, IvError::EmptyRecipients { channel: "email" }));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn transport_failure_is_returned() {
        let transport = RecordingTransport {
            fail: true,
            ..Default::default()
        };
        let n = notifier(transport, vec![Contact::new("A", "a@example.com")]);
        assert_eq!(n.send("s", "c").unwrap_err().code(), "IV-3001");
    }

    #[test]
    fn contacts_getter_can_be_swapped() {
        let transport = RecordingTransport::default();
        let mut n = notifier(transport.clone(), Vec::new());
        n.set_contacts_getter(fixed_contacts(vec![Contact::new("C", "c@example.com")]));
        n.send("s", "c").unwrap();
        assert_eq!(transport.sent.lock().unwrap()[0].to[0].address, "c@example.com");
    }

    #[test]
    fn from_config_names_missing_settings() {
        let config = EmailConfig {
            api_key: "SG.key".to_string(),
            ..Default::default()
        };
        let err = EmailNotifier::from_config(&config).err().unwrap();
        match err {
            IvError::MissingSetting { keys } => {
                assert_eq!(keys, vec!["NOTIFIER_SENDER_NAME", "NOTIFIER_SENDER_EMAIL"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_config_uses_configured_recipients() {
        let config = EmailConfig {
            api_key: "SG.key".to_string(),
            sender_name: "Validator".to_string(),
            sender_email: "validator@example.com".to_string(),
            recipients: "Jane=jane@example.com:broken".to_string(),
        };
        let n = EmailNotifier::from_config(&config).unwrap();
        assert_eq!((n.contacts)(), vec![Contact::new("Jane", "jane@example.com")]);
        assert_eq!(n.name(), "email");
    }

    #[test]
    fn sendgrid_payload_shape() {
        let message = EmailMessage {
            from: Contact::new("Validator", "v@example.com"),
            subject: "s".to_string(),
            to: vec![Contact::new("A", "a@example.com")],
            html_content: "<p>x</p>".to_string(),
        };
        let payload = sendgrid_payload(&message);
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "a@example.com");
        assert_eq!(payload["from"]["name"], "Validator");
        assert_eq!(payload["content"][0]["type"], "text/html");
        assert_eq!(payload["content"][0]["value"], "<p>x</p>");
    }
}
