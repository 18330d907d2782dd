//! Domain enums shared by the API and the publisher sync
//!
//! All values are stored in the database as their wire codes (TEXT) and
//! round-trip through serde unchanged.

use serde::{Deserialize, Serialize};

/// Origin of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Publisher {
    /// Przypis Powszechny (user-created)
    Pp,
    /// Demagog fact-checks (synced)
    Demagog,
}

impl Publisher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Publisher::Pp => "PP",
            Publisher::Demagog => "DEMAGOG",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PP" => Some(Publisher::Pp),
            "DEMAGOG" => Some(Publisher::Demagog),
            _ => None,
        }
    }
}

/// Editorial category of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PpCategory {
    AdditionalInfo,
    Clarification,
    Error,
}

impl PpCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PpCategory::AdditionalInfo => "ADDITIONAL_INFO",
            PpCategory::Clarification => "CLARIFICATION",
            PpCategory::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADDITIONAL_INFO" => Some(PpCategory::AdditionalInfo),
            "CLARIFICATION" => Some(PpCategory::Clarification),
            "ERROR" => Some(PpCategory::Error),
            _ => None,
        }
    }
}

/// Rating scale used by the Demagog fact-checking service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemagogCategory {
    True,
    PTrue,
    False,
    PFalse,
    Lie,
    Unknown,
}

impl DemagogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemagogCategory::True => "TRUE",
            DemagogCategory::PTrue => "PTRUE",
            DemagogCategory::False => "FALSE",
            DemagogCategory::PFalse => "PFALSE",
            DemagogCategory::Lie => "LIE",
            DemagogCategory::Unknown => "UNKNOWN",
        }
    }

    /// Parse a rating code; the Demagog API sends them lowercase.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TRUE" => Some(DemagogCategory::True),
            "PTRUE" => Some(DemagogCategory::PTrue),
            "FALSE" => Some(DemagogCategory::False),
            "PFALSE" => Some(DemagogCategory::PFalse),
            "LIE" => Some(DemagogCategory::Lie),
            "UNKNOWN" => Some(DemagogCategory::Unknown),
            _ => None,
        }
    }

    /// Map a Demagog rating onto the editorial category shown to users
    pub fn pp_category(&self) -> PpCategory {
        match self {
            DemagogCategory::True | DemagogCategory::PTrue => PpCategory::AdditionalInfo,
            DemagogCategory::False | DemagogCategory::PFalse => PpCategory::Error,
            DemagogCategory::Lie | DemagogCategory::Unknown => PpCategory::Clarification,
        }
    }
}

/// Whether an annotation still locates on its page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Unverified,
    Confirmed,
    Unlocated,
    Unlocatable,
    ArticleDoesNotExist,
    #[serde(rename = "PAGE_404")]
    Page404,
    OtherFatal,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Unverified => "UNVERIFIED",
            CheckStatus::Confirmed => "CONFIRMED",
            CheckStatus::Unlocated => "UNLOCATED",
            CheckStatus::Unlocatable => "UNLOCATABLE",
            CheckStatus::ArticleDoesNotExist => "ARTICLE_DOES_NOT_EXIST",
            CheckStatus::Page404 => "PAGE_404",
            CheckStatus::OtherFatal => "OTHER_FATAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UNVERIFIED" => Some(CheckStatus::Unverified),
            "CONFIRMED" => Some(CheckStatus::Confirmed),
            "UNLOCATED" => Some(CheckStatus::Unlocated),
            "UNLOCATABLE" => Some(CheckStatus::Unlocatable),
            "ARTICLE_DOES_NOT_EXIST" => Some(CheckStatus::ArticleDoesNotExist),
            "PAGE_404" => Some(CheckStatus::Page404),
            "OTHER_FATAL" => Some(CheckStatus::OtherFatal),
            _ => None,
        }
    }
}

/// Reason attached to an annotation report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportReason {
    Biased,
    Unreliable,
    Useless,
    Spam,
    Other,
    /// Requires a comment carrying the correction itself
    SuggestedCorrection,
}

impl ReportReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::Biased => "BIASED",
            ReportReason::Unreliable => "UNRELIABLE",
            ReportReason::Useless => "USELESS",
            ReportReason::Spam => "SPAM",
            ReportReason::Other => "OTHER",
            ReportReason::SuggestedCorrection => "SUGGESTED_CORRECTION",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BIASED" => Some(ReportReason::Biased),
            "UNRELIABLE" => Some(ReportReason::Unreliable),
            "USELESS" => Some(ReportReason::Useless),
            "SPAM" => Some(ReportReason::Spam),
            "OTHER" => Some(ReportReason::Other),
            "SUGGESTED_CORRECTION" => Some(ReportReason::SuggestedCorrection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_db_codes() {
        for cat in [
            DemagogCategory::True,
            DemagogCategory::PTrue,
            DemagogCategory::False,
            DemagogCategory::PFalse,
            DemagogCategory::Lie,
            DemagogCategory::Unknown,
        ] {
            assert_eq!(DemagogCategory::from_str(cat.as_str()), Some(cat));
        }
        for status in [
            CheckStatus::Unverified,
            CheckStatus::Confirmed,
            CheckStatus::Unlocated,
            CheckStatus::Unlocatable,
            CheckStatus::ArticleDoesNotExist,
            CheckStatus::Page404,
            CheckStatus::OtherFatal,
        ] {
            assert_eq!(CheckStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_demagog_rating_parse_is_case_insensitive() {
        assert_eq!(
            DemagogCategory::from_str("ptrue"),
            Some(DemagogCategory::PTrue)
        );
        assert_eq!(DemagogCategory::from_str("not-a-rating"), None);
    }

    #[test]
    fn test_demagog_to_pp_mapping() {
        assert_eq!(
            DemagogCategory::True.pp_category(),
            PpCategory::AdditionalInfo
        );
        assert_eq!(
            DemagogCategory::PTrue.pp_category(),
            PpCategory::AdditionalInfo
        );
        assert_eq!(DemagogCategory::False.pp_category(), PpCategory::Error);
        assert_eq!(DemagogCategory::PFalse.pp_category(), PpCategory::Error);
        assert_eq!(DemagogCategory::Lie.pp_category(), PpCategory::Clarification);
        assert_eq!(
            DemagogCategory::Unknown.pp_category(),
            PpCategory::Clarification
        );
    }

    #[test]
    fn test_serde_wire_codes() {
        assert_eq!(
            serde_json::to_string(&CheckStatus::Page404).unwrap(),
            "\"PAGE_404\""
        );
        assert_eq!(
            serde_json::to_string(&PpCategory::AdditionalInfo).unwrap(),
            "\"ADDITIONAL_INFO\""
        );
        assert_eq!(
            serde_json::to_string(&Publisher::Demagog).unwrap(),
            "\"DEMAGOG\""
        );
    }
}
