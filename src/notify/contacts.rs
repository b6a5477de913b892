//! Recipient resolution.
//!
//! Each notifier asks its contact getter for recipients at send time. The
//! default getters parse the colon-delimited lists from configuration; tests
//! and embedders swap in a fixed list.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::split_colon_list;

/// One recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    /// Email address or phone number, depending on the channel.
    pub address: String,
}

impl Contact {
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Produces the recipient list for one send.
pub type ContactGetter = Box<dyn Fn() -> Vec<Contact> + Send + Sync>;

/// Parse `"Jane Doe=jane@example.com:Bob=bob@example.com"`.
///
/// Pairs without `=`, or with an empty side, are logged and skipped.
#[must_use]
pub fn parse_email_contacts(raw: &str) -> Vec<Contact> {
    split_colon_list(raw)
        .into_iter()
        .filter_map(|pair| {
            let parsed = pair
                .split_once('=')
                .map(|(name, address)| (name.trim(), address.trim()))
                .filter(|(name, address)| !name.is_empty() && !address.is_empty());
            if parsed.is_none() {
                tracing::warn!("skipping malformed email contact {pair:?}, expected name=address");
            }
            parsed.map(|(name, address)| Contact::new(name, address))
        })
        .collect()
}

/// Parse `"+15551234567:+15557654321"`. A phone contact is named by its number.
#[must_use]
pub fn parse_phone_contacts(raw: &str) -> Vec<Contact> {
    split_colon_list(raw)
        .into_iter()
        .map(|number| Contact::new(number.clone(), number))
        .collect()
}

/// Getter that re-parses `raw` with `parse` on every send.
#[must_use]
pub fn configured_contacts(raw: &str, parse: fn(&str) -> Vec<Contact>) -> ContactGetter {
    let raw = raw.to_string();
    Box::new(move || parse(&raw))
}

/// Getter that always returns `contacts`.
#[must_use]
pub fn fixed_contacts(contacts: Vec<Contact>) -> ContactGetter {
    Box::new(move || contacts.clone())
}
