//! Structure detection for one source file: which country it describes and
//! which column holds which field. The files are exported from a website and
//! carry a free-form preamble, so nothing about the layout is trusted up
//! front.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::map::Country;

/// Lines checked for a country name before giving up.
const COUNTRY_SCAN_LINES: usize = 20;

static COUNTRY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)([A-Za-z\s]+):\s*History of Lending Commitments",
        r"(?i)Country:\s*([A-Za-z\s]+)",
        r"(?i)^([A-Za-z\s]+)\s*-\s*IMF",
        r"(?i)IMF.*Commitments.*?([A-Za-z\s]+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)facility",
        r"(?i)arrangement",
        r"(?i)type",
        r"(?i)date.*amount",
        r"(?i)agreed.*drawn.*outstanding",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Scan the first lines of a file for a country name. First pattern match
/// wins; a matched name that is not one of the known countries is reported
/// and treated as undetected.
pub fn find_country(lines: &[&str]) -> Option<Country> {
    for line in lines.iter().take(COUNTRY_SCAN_LINES) {
        for pattern in COUNTRY_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                let name = caps[1].trim().to_string();
                debug!(name = %name, "country name matched");
                return match Country::from_detected(&name) {
                    Some(c) => Some(c),
                    None => {
                        warn!(name = %name, "matched country name is not a known country");
                        None
                    }
                };
            }
        }
    }
    warn!("could not detect country name from file");
    None
}

/// A line is the data header when it matches one of the header keywords and
/// is actually tab-delimited.
pub fn is_header_line(line: &str) -> bool {
    line.contains('\t') && HEADER_PATTERNS.iter().any(|p| p.is_match(line))
}

/// The five semantic roles a header column can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    FacilityType,
    ArrangementDate,
    AmountAgreed,
    AmountDrawn,
    AmountOutstanding,
}

/// Acceptable header substrings per role, checked in this order. The order
/// is load-bearing: a column named "Facility Date" matches both the facility
/// and date roles, and reproducible output requires the facility check to
/// run first.
const ROLE_SUBSTRINGS: &[(Role, &[&str])] = &[
    (Role::FacilityType, &["facility", "type", "arrangement type"]),
    (
        Role::ArrangementDate,
        &["date", "arrangement date", "effective date", "approval date"],
    ),
    (
        Role::AmountAgreed,
        &["agreed", "amount agreed", "committed", "commitment"],
    ),
    (
        Role::AmountDrawn,
        &["drawn", "amount drawn", "disbursed", "disbursement"],
    ),
    (
        Role::AmountOutstanding,
        &["outstanding", "amount outstanding", "balance", "remaining"],
    ),
];

/// Column index per role, as detected from one header line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub facility_type: Option<usize>,
    pub arrangement_date: Option<usize>,
    pub amount_agreed: Option<usize>,
    pub amount_drawn: Option<usize>,
    pub amount_outstanding: Option<usize>,
}

impl ColumnMap {
    fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::FacilityType => self.facility_type,
            Role::ArrangementDate => self.arrangement_date,
            Role::AmountAgreed => self.amount_agreed,
            Role::AmountDrawn => self.amount_drawn,
            Role::AmountOutstanding => self.amount_outstanding,
        }
    }

    fn set(&mut self, role: Role, index: usize) {
        let slot = match role {
            Role::FacilityType => &mut self.facility_type,
            Role::ArrangementDate => &mut self.arrangement_date,
            Role::AmountAgreed => &mut self.amount_agreed,
            Role::AmountDrawn => &mut self.amount_drawn,
            Role::AmountOutstanding => &mut self.amount_outstanding,
        };
        *slot = Some(index);
    }
}

/// Fuzzy-match header tokens against the role table. Pure function of the
/// header line: tokens are scanned left to right, each token is given to the
/// first still-unassigned role with a case-insensitive substring match, and
/// an assigned role is never reassigned.
pub fn detect_columns(header_line: &str) -> ColumnMap {
    let mut map = ColumnMap::default();

    for (i, token) in header_line.trim().split('\t').enumerate() {
        let token_lower = token.trim().to_lowercase();
        for (role, substrings) in ROLE_SUBSTRINGS {
            if map.get(*role).is_some() {
                continue;
            }
            if substrings.iter().any(|s| token_lower.contains(s)) {
                debug!(token = %token.trim(), index = i, role = ?role, "column mapped");
                map.set(*role, i);
                break;
            }
        }
    }

    debug!(columns = ?map, "column mappings detected");
    map
}
