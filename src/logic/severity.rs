//! Severity - canonical severity classes
//!
//! Decoder labels arrive as free strings ("HIGH", "Medium", "low", ...).
//! They are normalised here once, everything downstream matches on the enum.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
    Normal,
    /// Label outside the known set; displayed with the default style
    Unknown,
}

impl Severity {
    /// Case-insensitive label normalisation
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "normal" => Severity::Normal,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Normal => "Normal",
            Severity::Unknown => "Unknown",
        }
    }

    /// Panel background: red, orange, yellow, green, blue
    pub fn color(&self) -> &'static str {
        match self {
            Severity::High => "#FF4B4B",
            Severity::Medium => "#FFA500",
            Severity::Low => "#E6C200",
            Severity::Normal => "#2E8B57",
            Severity::Unknown => "#1E90FF",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::High => "🚨",
            Severity::Medium => "⚠",
            Severity::Low => "🔔",
            Severity::Normal => "✅",
            Severity::Unknown => "ℹ",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
