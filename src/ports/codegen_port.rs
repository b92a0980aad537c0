//! External code generator seam: turns a finished strategy into source text
//! for a trading platform.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::KumoError;
use crate::domain::stored_strategy::StoredStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    Python,
    Mql5,
    PineScript,
    ProRealCode,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 4] = [
        TargetLanguage::Python,
        TargetLanguage::Mql5,
        TargetLanguage::PineScript,
        TargetLanguage::ProRealCode,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TargetLanguage::Python => "python",
            TargetLanguage::Mql5 => "mql5",
            TargetLanguage::PineScript => "pinescript",
            TargetLanguage::ProRealCode => "prorealcode",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetLanguage::ALL
            .into_iter()
            .find(|lang| lang.key() == s)
            .ok_or_else(|| format!("unknown target language '{s}'"))
    }
}

pub trait CodeGenPort {
    fn generate(&self, strategy: &StoredStrategy, language: TargetLanguage) -> Result<String, KumoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_keys_round_trip() {
        for lang in TargetLanguage::ALL {
            assert_eq!(lang.key().parse::<TargetLanguage>().unwrap(), lang);
        }
        assert!("cobol".parse::<TargetLanguage>().is_err());
    }
}
