//! SMS channel: plain-text report delivered through Twilio, one message per number.

#![allow(missing_docs)]

use crate::core::config::{
    NOTIFIER_SENDER_PHONE_NUMBER_ENV, TWILIO_ACCOUNT_SID_ENV, TWILIO_API_KEY_ENV,
};
use crate::core::errors::{IvError, Result};
use crate::core::http::blocking_client;
use crate::notify::contacts::{ContactGetter, configured_contacts, parse_phone_contacts};
use crate::notify::{Notifier, SmsConfig};
use crate::scanner::rules::ValidationError;

const CHANNEL: &str = "sms";
const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Width of the line between violations.
pub const SEPARATOR_WIDTH: usize = 30;

/// Delivers one text message to one number.
pub trait SmsTransport: Send + Sync {
    fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<()>;
}

/// Twilio Programmable Messaging REST API.
pub struct TwilioClient {
    account_sid: String,
    api_key: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl TwilioClient {
    pub fn new(account_sid: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = blocking_client().map_err(|e| IvError::Transport {
            channel: CHANNEL,
            details: format!("failed to create HTTP client: {e}"),
        })?;
        Ok(Self {
            account_sid: account_sid.into(),
            api_key: api_key.into(),
            base_url: TWILIO_API_BASE.to_string(),
            http,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }
}

impl SmsTransport for TwilioClient {
    fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<()> {
        let transport_error = |details: String| IvError::Transport {
            channel: CHANNEL,
            details,
        };

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.api_key))
            .form(&[("From", from), ("To", to), ("Body", body)])
            .send()
            .map_err(|e| transport_error(format!("error sending SMS: {e}")))?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        tracing::debug!(%status, "SMS response: {text}");
        if !status.is_success() {
            return Err(transport_error(format!(
                "exception sending SMS: HTTP {status}: {}",
                text.trim()
            )));
        }
        Ok(())
    }
}

/// Sends the violation report as a text message to every configured number.
pub struct SmsNotifier {
    transport: Box<dyn SmsTransport>,
    sender_number: String,
    contacts: ContactGetter,
}

impl SmsNotifier {
    #[must_use]
    pub fn new(
        transport: Box<dyn SmsTransport>,
        sender_number: impl Into<String>,
        contacts: ContactGetter,
    ) -> Self {
        Self {
            transport,
            sender_number: sender_number.into(),
            contacts,
        }
    }

    /// Build from configuration, failing if credentials or the sender number
    /// are missing.
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        tracing::info!("initializing SMS notifier");
        let mut missing = Vec::new();
        for (key, value) in [
            (TWILIO_API_KEY_ENV, &config.api_key),
            (TWILIO_ACCOUNT_SID_ENV, &config.account_sid),
            (NOTIFIER_SENDER_PHONE_NUMBER_ENV, &config.sender_number),
        ] {
            if value.trim().is_empty() {
                missing.push(key);
            }
        }
        if !missing.is_empty() {
            return Err(IvError::MissingSetting { keys: missing });
        }

        let notifier = Self::new(
            Box::new(TwilioClient::new(
                config.account_sid.clone(),
                config.api_key.clone(),
            )?),
            config.sender_number.clone(),
            configured_contacts(&config.recipients, parse_phone_contacts),
        );
        tracing::info!("SMS notifier initialized successfully");
        Ok(notifier)
    }

    pub fn set_contacts_getter(&mut self, getter: ContactGetter) {
        self.contacts = getter;
    }
}

impl Notifier for SmsNotifier {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    fn format_content(&self, errors: &[ValidationError]) -> Result<String> {
        Ok(render_sms_text(errors))
    }

    /// The subject is not part of an SMS body.
    fn send(&self, _subject: &str, content: &str) -> Result<()> {
        tracing::info!("notifying using SMS notifier");
        let contacts = (self.contacts)();
        if contacts.is_empty() {
            return Err(IvError::EmptyRecipients { channel: CHANNEL });
        }

        for contact in &contacts {
            self.transport
                .send_sms(&self.sender_number, &contact.address, content)?;
            tracing::info!("SMS sent successfully to: {:?}", contact.address);
        }
        Ok(())
    }
}

/// Render the text body: each violation followed by a separator line.
#[must_use]
pub fn render_sms_text(errors: &[ValidationError]) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut content = String::from("Below is the list of failed validators:\n\n");
    for err in errors {
        content.push_str(&format!(
            "{}\nActual: {}\nExpected: {}\n{separator}\n",
            err.additional_info, err.actual, err.expected
        ));
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::contacts::{Contact, fixed_contacts};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<(String, String, String)>>>,
        fail_for: Option<String>,
    }

    impl SmsTransport for RecordingTransport {
        fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<()> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(IvError::Transport {
                    channel: CHANNEL,
                    details: "exception sending SMS".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn phones(numbers: &[&str]) -> Vec<Contact> {
        numbers.iter().map(|n| Contact::new(*n, *n)).collect()
    }

    fn violation(info: &str, actual: &str, expected: &str) -> ValidationError {
        ValidationError {
            actual: actual.to_string(),
            expected: expected.to_string(),
            additional_info: info.to_string(),
        }
    }

    #[test]
    fn text_layout_matches_expected_format() {
        let text = render_sms_text(&[
            violation("Folder: \"/I/Doe, John\"", "\"Doe, John\"", "First Last, ie John Doe"),
            violation("File: \"/I/bad.docx\"", "\"bad.docx\"", "Something like \"013119-01.docx\""),
        ]);
        let dashes = "-".repeat(30);
        let expected = format!(
            "Below is the list of failed validators:\n\n\
             Folder: \"/I/Doe, John\"\nActual: \"Doe, John\"\nExpected: First Last, ie John Doe\n{dashes}\n\
             File: \"/I/bad.docx\"\nActual: \"bad.docx\"\nExpected: Something like \"013119-01.docx\"\n{dashes}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn one_message_per_recipient() {
        let transport = RecordingTransport::default();
        let n = SmsNotifier::new(
            Box::new(transport.clone()),
            "+15550000000",
            fixed_contacts(phones(&["+15551111111", "+15552222222"])),
        );
        n.send("ignored subject", "body").unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "+15550000000");
        assert_eq!(sent[0].1, "+15551111111");
        assert_eq!(sent[1].1, "+15552222222");
        assert_eq!(sent[1].2, "body");
    }

    #[test]
    fn first_failure_stops_the_channel() {
        let transport = RecordingTransport {
            fail_for: Some("+15551111111".to_string()),
            ..Default::default()
        };
        let n = SmsNotifier::new(
            Box::new(transport.clone()),
            "+15550000000",
            fixed_contacts(phones(&["+15551111111", "+15552222222"])),
        );
        assert_eq!(n.send("s", "body").unwrap_err().code(), "IV-3001");
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_recipients_fail() {
        let n = SmsNotifier::new(
            Box::new(RecordingTransport::default()),
            "+15550000000",
            fixed_contacts(Vec::new()),
        );
        assert!(matches!(
            n.send("s", "body").unwrap_err(),
            IvError::EmptyRecipients { channel: "sms" }
        ));
    }

    #[test]
    fn from_config_requires_credentials_and_sender() {
        let err = SmsNotifier::from_config(&SmsConfig::default()).err().unwrap();
        match err {
            IvError::MissingSetting { keys } => assert_eq!(
                keys,
                vec![
                    "TWILIO_API_KEY",
                    "TWILIO_ACCOUNT_SID",
                    "NOTIFIER_SENDER_PHONE_NUMBER"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_config_parses_phone_list() {
        let config = SmsConfig {
            api_key: "key".to_string(),
            account_sid: "AC1".to_string(),
            sender_number: "+15550000000".to_string(),
            recipients: "+15551111111:+15552222222".to_string(),
        };
        let n = SmsNotifier::from_config(&config).unwrap();
        assert_eq!((n.contacts)().len(), 2);
    }

    #[test]
    fn messages_url_includes_account() {
        let client = TwilioClient::new("AC1", "key")
            .unwrap()
            .with_base_url("http://localhost:9/");
        assert_eq!(
            client.messages_url(),
            "http://localhost:9/Accounts/AC1/Messages.json"
        );
    }
}
