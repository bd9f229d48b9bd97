pub mod aggregate;
pub mod detect;
pub mod key;
pub mod parse;
pub mod schema;

pub use aggregate::{process_all, AggregateMapping, CountryOutcome, RunSummary};
pub use parse::{parse_tsv_file, CountryDataset, FacilityRecord};

use std::fmt;

/// The three countries the IMFEOD dataset covers. The order of `ALL` is the
/// processing order, which fixes the file-then-record overwrite order during
/// aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Country {
    Ireland,
    Greece,
    Portugal,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Ireland, Country::Greece, Country::Portugal];

    pub fn name(self) -> &'static str {
        match self {
            Country::Ireland => "Ireland",
            Country::Greece => "Greece",
            Country::Portugal => "Portugal",
        }
    }

    /// ISO-like 3-letter code used in column keys.
    pub fn code(self) -> &'static str {
        match self {
            Country::Ireland => "IRL",
            Country::Greece => "GRC",
            Country::Portugal => "PRT",
        }
    }

    /// Normalize a country name as detected from file content. Accepts the
    /// spellings the source site has used over time, not just the canonical
    /// name.
    pub fn from_detected(raw: &str) -> Option<Country> {
        match raw.trim().to_lowercase().as_str() {
            "ireland" | "irish" | "republic of ireland" => Some(Country::Ireland),
            "greece" | "greek" | "hellenic republic" | "hellas" => Some(Country::Greece),
            "portugal" | "portuguese" | "portuguese republic" => Some(Country::Portugal),
            _ => None,
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One financial dimension of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Agreed,
    Drawn,
    Outstanding,
}

impl AmountKind {
    pub const ALL: [AmountKind; 3] = [AmountKind::Agreed, AmountKind::Drawn, AmountKind::Outstanding];

    /// Token used inside column keys.
    pub fn token(self) -> &'static str {
        match self {
            AmountKind::Agreed => "AMOUNTAGREED",
            AmountKind::Drawn => "AMOUNTDRAWN",
            AmountKind::Outstanding => "AMOUNTOUTSTANDING",
        }
    }
}
