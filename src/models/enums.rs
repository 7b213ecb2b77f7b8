use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ContractType {
    Purchase => "purchase",
    Sales => "sales",
    Lease => "lease",
});

str_enum!(ContractStatus {
    PendingOcr => "pending_ocr",
    OcrProcessing => "ocr_processing",
    PendingAi => "pending_ai",
    AiProcessing => "ai_processing",
    Completed => "completed",
});

str_enum!(PartyType {
    PartyA => "party_a",
    PartyB => "party_b",
});

/// Markers that identify the first party in a free-text role label.
/// Source documents use "甲方"/"乙方"; models sometimes answer in English.
const FIRST_PARTY_MARKERS: &[&str] = &["甲", "party_a", "party a", "first"];

impl PartyType {
    /// Normalize a free-text role label into one of the two canonical roles.
    /// Any label containing a first-party marker maps to PartyA; everything
    /// else (including empty labels) maps to PartyB.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if FIRST_PARTY_MARKERS.iter().any(|m| lower.contains(m)) {
            PartyType::PartyA
        } else {
            PartyType::PartyB
        }
    }
}
