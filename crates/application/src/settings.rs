//! Tunables shared by use cases and event handlers.

use std::time::Duration;

/// Business settings that are not part of the domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSettings {
    /// Stock level at or below which a low-stock alert is sent.
    pub low_stock_threshold: u32,

    /// How long a stock reservation stays active.
    pub reservation_ttl: Duration,

    /// Recipient of administrative notices.
    pub admin_recipient: String,

    /// Email domain that marks a user as institutional.
    pub institutional_domain: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
            reservation_ttl: Duration::from_secs(15 * 60),
            admin_recipient: "admin@mef.gob.pe".to_string(),
            institutional_domain: "mef.gob.pe".to_string(),
        }
    }
}
