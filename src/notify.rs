//! Messages handed to staff for delivering out of band.

use askama::Template;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::{CenterError, CenterResult};

pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// The welcome message carrying a new teacher's generated credentials.
#[derive(Template)]
#[template(path = "credentials.txt")]
pub struct CredentialsMessage<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub login_url: &'a str,
}

impl<'a> CredentialsMessage<'a> {
    /// A `wa.me` link that opens a chat with `phone` with the message
    /// pre-filled. `None` when the phone has no digits at all.
    pub fn whatsapp_link(&self, phone: &str) -> CenterResult<Option<String>> {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Ok(None);
        }

        let text = self
            .render()
            .map_err(|error| CenterError::Server(format!("Failed to render message: {}", error)))?;

        Ok(Some(format!(
            "{}{}?text={}",
            WHATSAPP_BASE_URL,
            digits,
            utf8_percent_encode(&text, NON_ALPHANUMERIC)
        )))
    }
}
