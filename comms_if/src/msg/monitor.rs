//! # Monitor messages
//!
//! The control stage only reacts to monitor items at the `FATAL` level.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A batch of monitor log items.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MonitorMessage {
    pub header: Header,

    pub item: Vec<MonitorMessageItem>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MonitorMessageItem {
    /// Name of the module raising the item
    pub source: String,

    pub msg: String,

    pub log_level: MonitorLogLevel,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorLogLevel {
    Info,
    Warn,
    Error,
    Fatal,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MonitorLogLevel {
    fn default() -> Self {
        MonitorLogLevel::Info
    }
}

impl MonitorMessage {
    /// Get the first item at the fatal level, if any.
    pub fn first_fatal(&self) -> Option<&MonitorMessageItem> {
        self.item
            .iter()
            .find(|i| i.log_level == MonitorLogLevel::Fatal)
    }
}
