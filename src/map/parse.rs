//! Per-file parse: recover facility records from the semi-structured TSV
//! export of one country's lending history.
//!
//! Three phases, no backtracking: identify the country from the preamble,
//! find the tab-delimited header line and map its columns to roles, then
//! extract one record per surviving data line. Summary rows ("Total ...")
//! are dropped here because totals are recomputed during aggregation.

use std::{fs, path::Path};

use tracing::{debug, info, warn};

use crate::error::MapError;
use crate::map::{detect, AmountKind, Country};

/// One lending arrangement line from a source file. Amounts are in millions
/// of SDRs, non-negative after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub facility_type: String,
    pub arrangement_date: String,
    pub amount_agreed: f64,
    pub amount_drawn: f64,
    pub amount_outstanding: f64,
}

impl FacilityRecord {
    pub fn amount(&self, kind: AmountKind) -> f64 {
        match kind {
            AmountKind::Agreed => self.amount_agreed,
            AmountKind::Drawn => self.amount_drawn,
            AmountKind::Outstanding => self.amount_outstanding,
        }
    }
}

/// Everything recovered from one source file. `country` is `None` when no
/// country name could be identified; the caller skips aggregation for the
/// file in that case.
#[derive(Debug)]
pub struct CountryDataset {
    pub country: Option<Country>,
    pub facilities: Vec<FacilityRecord>,
}

/// First-cell words that mark an aggregate/summary row.
const SUMMARY_WORDS: &[&str] = &["total", "sum", "grand", "overall"];

/// Strip thousands separators and whitespace. Empty cells count as 0.0;
/// anything non-numeric (or negative) is `None` and rejects the row.
pub fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v >= 0.0 => Some(v),
        _ => None,
    }
}

fn cell_amount(parts: &[&str], index: Option<usize>) -> Result<f64, String> {
    match index.and_then(|i| parts.get(i)) {
        Some(raw) => clean_amount(raw).ok_or_else(|| raw.trim().to_string()),
        None => Ok(0.0),
    }
}

pub fn parse_tsv_file(path: &Path) -> Result<CountryDataset, MapError> {
    info!(file = %path.display(), "parsing source file");
    let text = fs::read_to_string(path)?;
    parse_text(&text, path)
}

/// Parse the content of one source file. `path` is only used for error and
/// log context, so the function stays testable on plain strings.
pub fn parse_text(text: &str, path: &Path) -> Result<CountryDataset, MapError> {
    let lines: Vec<&str> = text.lines().collect();

    // Phase 1: country identification. Non-fatal when it fails.
    let country = detect::find_country(&lines);
    if country.is_none() {
        warn!(file = %path.display(), "no country identified; this file will not contribute keys");
    }

    // Phase 2: header detection. Fatal for the file when it fails.
    let mut header = None;
    for (i, line) in lines.iter().enumerate() {
        if detect::is_header_line(line) {
            info!(line = i + 1, header = %line.trim(), "data header found");
            header = Some((i, detect::detect_columns(line)));
            break;
        }
    }
    let Some((header_idx, columns)) = header else {
        return Err(MapError::NoHeader {
            path: path.to_path_buf(),
        });
    };
    let data_start = header_idx + 1;
    let Some(facility_idx) = columns.facility_type else {
        return Err(MapError::NoFacilityColumn {
            path: path.to_path_buf(),
        });
    };

    // Phase 3: row extraction. Malformed rows are skipped, never fatal.
    let mut facilities = Vec::new();
    for (offset, line) in lines[data_start..].iter().enumerate() {
        let line_no = data_start + offset + 1;
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            continue;
        }
        let first = parts[0].trim();
        if first.is_empty() {
            continue;
        }
        let first_lower = first.to_lowercase();
        if SUMMARY_WORDS.iter().any(|w| first_lower.contains(w)) {
            debug!(line = line_no, "skipping aggregate row");
            continue;
        }

        let facility_type = match parts.get(facility_idx).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                warn!(line = line_no, "facility type cell missing; skipping row");
                continue;
            }
        };
        let arrangement_date = columns
            .arrangement_date
            .and_then(|i| parts.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let agreed = cell_amount(&parts, columns.amount_agreed);
        let drawn = cell_amount(&parts, columns.amount_drawn);
        let outstanding = cell_amount(&parts, columns.amount_outstanding);
        let (amount_agreed, amount_drawn, amount_outstanding) = match (agreed, drawn, outstanding)
        {
            (Ok(a), Ok(d), Ok(o)) => (a, d, o),
            (a, d, o) => {
                let bad = [a, d, o].into_iter().find_map(|r| r.err()).unwrap_or_default();
                warn!(line = line_no, value = %bad, "unparseable amount; skipping row");
                continue;
            }
        };

        facilities.push(FacilityRecord {
            facility_type,
            arrangement_date,
            amount_agreed,
            amount_drawn,
            amount_outstanding,
        });
    }

    info!(count = facilities.len(), "parsed facilities");
    Ok(CountryDataset { country, facilities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,imfscraper::map=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn sample_path() -> PathBuf {
        PathBuf::from("Ireland_IMF_External_Arrangements_2024-03-01.tsv")
    }

    const IRELAND_TSV: &str = "\
Ireland: History of Lending Commitments
as of August 31, 2025

Facility\tDate of Arrangement\tAmount Agreed\tAmount Drawn\tAmount Outstanding
Extended Fund Facility\tDec 16, 2010\t19,465.80\t19,465.80\t0.00
Total Commitments\t\t19,465.80\t19,465.80\t0.00
";

    #[test]
    fn parses_ireland_sample() {
        init_test_logging();
        let data = parse_text(IRELAND_TSV, &sample_path()).unwrap();
        assert_eq!(data.country, Some(Country::Ireland));
        assert_eq!(data.facilities.len(), 1);
        let f = &data.facilities[0];
        assert_eq!(f.facility_type, "Extended Fund Facility");
        assert_eq!(f.arrangement_date, "Dec 16, 2010");
        assert_eq!(f.amount_agreed, 19465.80);
        assert_eq!(f.amount_drawn, 19465.80);
        assert_eq!(f.amount_outstanding, 0.0);
    }

    #[test]
    fn parse_is_deterministic() {
        let a = parse_text(IRELAND_TSV, &sample_path()).unwrap();
        let b = parse_text(IRELAND_TSV, &sample_path()).unwrap();
        assert_eq!(a.country, b.country);
        assert_eq!(a.facilities, b.facilities);
    }

    #[test]
    fn total_rows_never_become_records() {
        let data = parse_text(IRELAND_TSV, &sample_path()).unwrap();
        assert!(data
            .facilities
            .iter()
            .all(|f| !f.facility_type.to_lowercase().contains("total")));
    }

    #[test]
    fn missing_header_is_structural_error() {
        let text = "Ireland: History of Lending Commitments\njust prose\nno table here\n";
        match parse_text(text, &sample_path()) {
            Err(MapError::NoHeader { .. }) => {}
            other => panic!("expected NoHeader, got {:?}", other),
        }
    }

    #[test]
    fn missing_facility_column_is_structural_error() {
        // Header keyword + tab, but no token matches the facility role.
        let text = "Country: Ireland\nDate of Arrangement\tAmount Agreed\nDec 16, 2010\t100\n";
        match parse_text(text, &sample_path()) {
            Err(MapError::NoFacilityColumn { .. }) => {}
            other => panic!("expected NoFacilityColumn, got {:?}", other),
        }
    }

    #[test]
    fn malformed_amount_skips_only_that_row() {
        let text = "\
Country: Greece
Facility\tDate of Arrangement\tAmount Agreed
Standby Arrangement\tMay 9, 2010\tabc
Extended Fund Facility\tMar 15, 2012\t28,000.00
";
        let data = parse_text(text, &sample_path()).unwrap();
        assert_eq!(data.facilities.len(), 1);
        assert_eq!(data.facilities[0].facility_type, "Extended Fund Facility");
        assert_eq!(data.facilities[0].amount_agreed, 28000.0);
    }

    #[test]
    fn undetected_roles_default_to_empty_and_zero() {
        let text = "Country: Portugal\nFacility\tsomething\nStandby Arrangement\tx\n";
        let data = parse_text(text, &sample_path()).unwrap();
        assert_eq!(data.facilities.len(), 1);
        let f = &data.facilities[0];
        assert_eq!(f.arrangement_date, "");
        assert_eq!(f.amount_agreed, 0.0);
        assert_eq!(f.amount_drawn, 0.0);
        assert_eq!(f.amount_outstanding, 0.0);
    }

    #[test]
    fn unknown_country_is_not_fatal() {
        let text = "Country: Atlantis\nFacility\tAmount Agreed\nStandby Arrangement\t10\n";
        let data = parse_text(text, &sample_path()).unwrap();
        assert_eq!(data.country, None);
        assert_eq!(data.facilities.len(), 1);
    }

    #[test]
    fn short_and_empty_first_cell_lines_are_skipped() {
        let text = "\
Country: Ireland
Facility\tAmount Agreed
loneword
\t123.0
Extended Fund Facility\t100
";
        let data = parse_text(text, &sample_path()).unwrap();
        assert_eq!(data.facilities.len(), 1);
    }

    #[test]
    fn amount_cleaning() {
        assert_eq!(clean_amount("1,234.50"), Some(1234.5));
        assert_eq!(clean_amount(""), Some(0.0));
        assert_eq!(clean_amount("   "), Some(0.0));
        assert_eq!(clean_amount("abc"), None);
        assert_eq!(clean_amount("-5.0"), None);
    }
}
