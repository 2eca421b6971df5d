//! Channel address handling.
//!
//! The provider prefixes phone numbers with a channel scheme
//! (`whatsapp:+316...`). Internally everything is keyed on the bare
//! international number; the prefix is reattached only at the provider
//! boundary.

pub const CHANNEL_PREFIX: &str = "whatsapp:";

/// Strips any channel scheme and yields the bare address. Digit-only
/// addresses get their leading `+` restored; alphanumeric sender ids pass
/// through untouched.
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix(CHANNEL_PREFIX)
        .or_else(|| trimmed.split_once(':').map(|(_, rest)| rest))
        .unwrap_or(trimmed)
        .trim();
    if bare.is_empty() || bare.starts_with('+') || !bare.chars().all(|c| c.is_ascii_digit()) {
        bare.to_string()
    } else {
        format!("+{bare}")
    }
}

/// Reattaches the channel scheme for an outbound send.
pub fn channel_address(phone: &str) -> String {
    if phone.starts_with(CHANNEL_PREFIX) {
        phone.to_string()
    } else {
        format!("{CHANNEL_PREFIX}{phone}")
    }
}
