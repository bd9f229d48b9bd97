//! Canonical column-key derivation. Every numeric cell of the output is
//! addressed by a dotted key of the form
//! `IMFEOD.<FACILITY><DATE>.<KIND>.<COUNTRY>.M`.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::map::{AmountKind, Country};

/// Known facility-type phrases and their codes. Anything else falls back to
/// the upper-cased, space-stripped phrase.
const FACILITY_CODES: &[(&str, &str)] = &[
    ("Extended Fund Facility", "EXTFUNDFACILITY"),
    ("Standby Arrangement", "STANDBYARRANGEMENT"),
];

pub fn facility_code(facility_type: &str) -> String {
    for (phrase, code) in FACILITY_CODES {
        if facility_type == *phrase {
            return (*code).to_string();
        }
    }
    facility_type.to_uppercase().replace(' ', "")
}

/// `"Dec 16, 2010"` → `"2010DEC16"`. Unparseable dates fall back to the raw
/// text with spaces and commas removed, upper-cased. The fallback is lossy
/// but historical outputs were produced with it, so it must stay.
pub fn date_code(date_str: &str) -> String {
    match NaiveDate::parse_from_str(date_str.trim(), "%b %d, %Y") {
        Ok(d) => format!(
            "{}{}{:02}",
            d.year(),
            d.format("%b").to_string().to_uppercase(),
            d.day()
        ),
        Err(e) => {
            warn!(date = %date_str, error = %e, "could not parse arrangement date");
            date_str.replace(' ', "").replace(',', "").to_uppercase()
        }
    }
}

/// Key for one (facility, date, amount kind, country) cell.
pub fn column_key(
    country: Country,
    facility_type: &str,
    arrangement_date: &str,
    kind: AmountKind,
) -> String {
    format!(
        "IMFEOD.{}{}.{}.{}.M",
        facility_code(facility_type),
        date_code(arrangement_date),
        kind.token(),
        country.code()
    )
}

/// Key for one per-country total cell.
pub fn total_key(country: Country, kind: AmountKind) -> String {
    format!("IMFEOD.TOTAL.{}.{}.M", kind.token(), country.code())
}
