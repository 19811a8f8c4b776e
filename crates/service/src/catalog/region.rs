use std::fmt;

use serde::{Deserialize, Serialize};

const INTERNATIONAL: &[&str] = &[
    "ISO", "IEC", "NIST", "PCI-SSC", "AICPA", "ISACA", "EU-GDPR", "HHS-OCR", "HITRUST", "CIS", "OWASP",
    "CSA", "SWIFT", "BASEL", "FATF", "IIA", "COSO", "ITIL", "PMI", "TOGAF", "NCSC-UK", "ENISA",
];

const REGIONAL: &[&str] = &["CBUAE", "ADGM", "DIFC", "CBB", "CBO", "QCB", "CBK", "NESA"];

/// Jurisdiction bucket of a regulator, derived from its code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    Saudi,
    Regional,
    International,
}

impl RegionType {
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        if INTERNATIONAL.contains(&code.as_str()) {
            RegionType::International
        } else if REGIONAL.contains(&code.as_str()) {
            RegionType::Regional
        } else {
            RegionType::Saudi
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionType::Saudi => "saudi",
            RegionType::Regional => "regional",
            RegionType::International => "international",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "saudi" => Some(RegionType::Saudi),
            "regional" => Some(RegionType::Regional),
            "international" => Some(RegionType::International),
            _ => None,
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
