// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging facilities (component identifiers)

use serde::{Deserialize, Serialize};

/// Logging facility - identifies which component generated the log message
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facility {
    /// Application entry point and session loop
    Main = 0,
    /// Lifecycle controller and dispatch
    Service = 1,
    /// The log pipeline itself
    Log = 2,

    // === Built-in services ===
    /// Console user interface
    Console = 3,
    /// Embedded script VM
    Script = 4,
    /// Monitor window
    Monitor = 5,

    /// Test harness and fixtures
    Test = 6,

    /// Fallback for uncategorized messages
    Unknown = 255,
}

impl Facility {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Facility::Main => "Main",
            Facility::Service => "Service",
            Facility::Log => "Log",
            Facility::Console => "Console",
            Facility::Script => "Script",
            Facility::Monitor => "Monitor",
            Facility::Test => "Test",
            Facility::Unknown => "Unknown",
        }
    }

    /// Create from u8 value (returns Unknown if invalid)
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Facility::Main,
            1 => Facility::Service,
            2 => Facility::Log,
            3 => Facility::Console,
            4 => Facility::Script,
            5 => Facility::Monitor,
            6 => Facility::Test,
            _ => Facility::Unknown,
        }
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_from_u8() {
        assert_eq!(Facility::from_u8(0), Facility::Main);
        assert_eq!(Facility::from_u8(5), Facility::Monitor);
        assert_eq!(Facility::from_u8(255), Facility::Unknown);
        assert_eq!(Facility::from_u8(99), Facility::Unknown);
    }

    #[test]
    fn test_facility_display() {
        assert_eq!(format!("{}", Facility::Script), "Script");
        assert_eq!(Facility::Console.to_string(), "Console");
    }

    #[test]
    fn test_facility_deserializes_lowercase() {
        let facility: Facility = json5::from_str("\"monitor\"").unwrap();
        assert_eq!(facility, Facility::Monitor);
    }
}
