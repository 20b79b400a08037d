//! Stock movement types.

use serde::{Deserialize, Serialize};

/// Why a product's quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received from a supplier.
    Addition,
    /// Stock sold.
    Sale,
    /// Manual correction (damage, count error, ...).
    Correction,
    /// Stock returned because a sale was deleted.
    SaleReversal,
}

impl MovementType {
    /// All movement types in display order.
    pub const ALL: [Self; 4] = [
        Self::Addition,
        Self::Sale,
        Self::Correction,
        Self::SaleReversal,
    ];

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Sale => "sale",
            Self::Correction => "correction",
            Self::SaleReversal => "sale_reversal",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Addition => "Stock addition",
            Self::Sale => "Sale",
            Self::Correction => "Correction",
            Self::SaleReversal => "Sale reversal",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason recorded with a stock correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionReason {
    /// Stock damaged in storage or transport.
    Damaged,
    /// Stock past its usable date.
    Expired,
    /// Stock missing.
    Theft,
    /// Physical count differed from the system.
    CountError,
    /// Anything else, explained in the notes.
    Other,
}

impl CorrectionReason {
    const ALL: [Self; 5] = [
        Self::Damaged,
        Self::Expired,
        Self::Theft,
        Self::CountError,
        Self::Other,
    ];

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Damaged => "damaged",
            Self::Expired => "expired",
            Self::Theft => "theft",
            Self::CountError => "count_error",
            Self::Other => "other",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl std::fmt::Display for CorrectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_round_trips_through_db_string() {
        for movement in MovementType::ALL {
            assert_eq!(MovementType::parse(movement.as_str()), Some(movement));
        }
        assert_eq!(MovementType::parse("transfer"), None);
    }

    #[test]
    fn test_serde_matches_db_string() {
        let json = serde_json::to_string(&MovementType::SaleReversal).unwrap();
        assert_eq!(json, "\"sale_reversal\"");

        let reason: CorrectionReason = serde_json::from_str("\"count_error\"").unwrap();
        assert_eq!(reason, CorrectionReason::CountError);
        assert_eq!(CorrectionReason::parse("count_error"), Some(reason));
    }
}
