//! Notification dispatch: email and SMS channels selected by configuration.
//!
//! Each channel formats the violation list its own way and resolves its own
//! recipients at send time. A channel that cannot be configured, formatted or
//! delivered is logged and skipped; the other channels still run.

#![allow(missing_docs)]

pub mod contacts;
pub mod email;
pub mod sms;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::errors::{IvError, Result};
use crate::scanner::rules::ValidationError;

pub use contacts::{Contact, ContactGetter};
pub use email::EmailNotifier;
pub use sms::SmsNotifier;

/// Subject used when none is configured.
pub const DEFAULT_SUBJECT: &str = "Failed Invoice Validations";

// ──────────────────── configuration ────────────────────

/// Top-level notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Channel tokens to activate (`"email"`, `"sms"`). Empty disables notification.
    pub channels: Vec<String>,
    /// Base subject; the run date is appended.
    pub subject: String,
    pub email: EmailConfig,
    pub sms: SmsConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            subject: DEFAULT_SUBJECT.to_string(),
            email: EmailConfig::default(),
            sms: SmsConfig::default(),
        }
    }
}

/// SendGrid settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct EmailConfig {
    pub api_key: String,
    pub sender_name: String,
    pub sender_email: String,
    /// Colon-delimited `name=address` pairs.
    pub recipients: String,
}

/// Twilio settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SmsConfig {
    pub api_key: String,
    pub account_sid: String,
    pub sender_number: String,
    /// Colon-delimited phone numbers.
    pub recipients: String,
}

// ──────────────────── channels ────────────────────

/// Known channel tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }
}

/// A delivery mechanism for violation reports.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render the violation list for this channel.
    fn format_content(&self, errors: &[ValidationError]) -> Result<String>;

    /// Deliver `content` to every recipient the channel resolves.
    fn send(&self, subject: &str, content: &str) -> Result<()>;
}

/// `"<base> - MMDDYYYY"`.
#[must_use]
pub fn subject_for(base: &str, date: NaiveDate) -> String {
    format!("{base} - {}", date.format("%m%d%Y"))
}

// ──────────────────── dispatch ────────────────────

/// Per-channel failure recorded during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelFailure {
    pub channel: &'static str,
    pub error: String,
}

/// What happened on each channel during one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<ChannelFailure>,
}

impl DispatchSummary {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Holds the usable notifiers and fans a violation list out to them in turn.
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl std::fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationManager")
            .field("channels", &self.channel_names())
            .finish()
    }
}

impl NotificationManager {
    /// Build every requested channel from configuration.
    ///
    /// Unknown tokens and channels with missing settings are logged and
    /// skipped. Requesting channels and ending up with none usable is an error;
    /// requesting none yields an empty manager.
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        Self::from_config_with(config, |kind, config| match kind {
            ChannelKind::Email => {
                EmailNotifier::from_config(&config.email).map(|n| Box::new(n) as Box<dyn Notifier>)
            }
            ChannelKind::Sms => {
                SmsNotifier::from_config(&config.sms).map(|n| Box::new(n) as Box<dyn Notifier>)
            }
        })
    }

    /// Same as [`NotificationManager::from_config`] with a custom channel factory.
    pub fn from_config_with<F>(config: &NotificationConfig, mut build: F) -> Result<Self>
    where
        F: FnMut(ChannelKind, &NotificationConfig) -> Result<Box<dyn Notifier>>,
    {
        if config.channels.is_empty() {
            tracing::info!("no notifiers enabled, violations will only be logged");
            return Ok(Self::disabled());
        }

        let mut seen = Vec::new();
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        for token in &config.channels {
            let Some(kind) = ChannelKind::parse(token) else {
                tracing::warn!("unknown notifier {token:?}, skipping");
                continue;
            };
            if seen.contains(&kind) {
                tracing::warn!("notifier {token:?} listed more than once, skipping");
                continue;
            }
            seen.push(kind);

            match build(kind, config) {
                Ok(notifier) => notifiers.push(notifier),
                Err(err) => tracing::error!("could not configure {token} notifier: {err}"),
            }
        }

        if notifiers.is_empty() {
            return Err(IvError::NoUsableNotifiers {
                requested: config.channels.clone(),
            });
        }
        Ok(Self { notifiers })
    }

    /// Manager over an explicit set of notifiers.
    #[must_use]
    pub fn from_notifiers(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Manager that never sends.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Format and send `errors` on every channel. Nothing is sent for an empty list.
    pub fn notify(&self, subject: &str, errors: &[ValidationError]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        if errors.is_empty() {
            return summary;
        }

        for notifier in &self.notifiers {
            let channel = notifier.name();
            let result = notifier
                .format_content(errors)
                .and_then(|content| notifier.send(subject, &content));
            match result {
                Ok(()) => summary.delivered.push(channel),
                Err(err) => {
                    tracing::error!(channel, "could not send notification: {err}");
                    summary.failed.push(ChannelFailure {
                        channel,
                        error: err.to_string(),
                    });
                }
            }
        }
        summary
    }
}
