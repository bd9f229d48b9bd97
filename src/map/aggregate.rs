//! Aggregation: turn parsed datasets into the global column-key → value
//! mapping. Totals are recomputed here from the surviving facility records
//! rather than trusted from the files' own summary rows.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::locate;
use crate::map::{key, parse, AmountKind, Country, FacilityRecord};

/// Global column-key → value accumulator. A `BTreeMap` keeps iteration
/// deterministic; duplicate keys overwrite last-seen-wins, in
/// file-then-record order.
pub type AggregateMapping = BTreeMap<String, f64>;

/// Outcome of processing one country's source file.
#[derive(Debug, Clone, PartialEq)]
pub enum CountryOutcome {
    Mapped {
        facilities: usize,
        file_date: Option<String>,
    },
    /// File parsed but no country name could be identified, so no keys were
    /// emitted for it.
    SkippedUnknownCountry,
    Failed(String),
}

/// Result of a whole run over all located country files.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub mapping: AggregateMapping,
    pub outcomes: BTreeMap<Country, CountryOutcome>,
    /// Lexicographic maximum of the `YYYY-MM` dates extracted from the
    /// processed filenames; drives the output filename and date cell.
    pub selected_date: Option<String>,
}

/// Keys emitted for one country's dataset: three `TOTAL.*` keys first, then
/// three keys per facility record. A country with zero valid facilities
/// still emits 0-valued totals.
pub fn mapping_for_country(country: Country, facilities: &[FacilityRecord]) -> AggregateMapping {
    let mut mapping = AggregateMapping::new();

    for kind in AmountKind::ALL {
        let total: f64 = facilities.iter().map(|f| f.amount(kind)).sum();
        mapping.insert(key::total_key(country, kind), total);
    }

    for facility in facilities {
        for kind in AmountKind::ALL {
            let column = key::column_key(
                country,
                &facility.facility_type,
                &facility.arrangement_date,
                kind,
            );
            mapping.insert(column, facility.amount(kind));
        }
    }

    mapping
}

/// Process every located file in `Country::ALL` order. Per-file failures are
/// recorded and never abort the remaining countries.
pub fn process_all(files: &BTreeMap<Country, PathBuf>) -> RunSummary {
    let mut summary = RunSummary::default();

    for country in Country::ALL {
        let Some(path) = files.get(&country) else {
            continue;
        };
        info!(country = %country, file = %path.display(), "processing");

        // The date comes from the filename, so it is known even when the
        // file content later turns out to be unparseable.
        let file_date = locate::extract_date_from_filename(path);
        if let Some(date) = &file_date {
            if summary.selected_date.as_deref() < Some(date.as_str()) {
                summary.selected_date = Some(date.clone());
            }
        }

        let outcome = match parse::parse_tsv_file(path) {
            Ok(dataset) => match dataset.country {
                Some(detected) => {
                    if detected != country {
                        warn!(
                            expected = %country,
                            detected = %detected,
                            "file content names a different country than its filename"
                        );
                    }
                    let mapping = mapping_for_country(detected, &dataset.facilities);
                    summary.mapping.extend(mapping);
                    CountryOutcome::Mapped {
                        facilities: dataset.facilities.len(),
                        file_date,
                    }
                }
                None => {
                    warn!(country = %country, "skipping aggregation: country undetected in file");
                    CountryOutcome::SkippedUnknownCountry
                }
            },
            Err(e) => {
                error!(country = %country, error = %e, "failed to process country file");
                CountryOutcome::Failed(e.to_string())
            }
        };
        summary.outcomes.insert(country, outcome);
    }

    info!(
        keys = summary.mapping.len(),
        countries = summary.outcomes.len(),
        "aggregation complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn record(
        facility_type: &str,
        date: &str,
        agreed: f64,
        drawn: f64,
        outstanding: f64,
    ) -> FacilityRecord {
        FacilityRecord {
            facility_type: facility_type.to_string(),
            arrangement_date: date.to_string(),
            amount_agreed: agreed,
            amount_drawn: drawn,
            amount_outstanding: outstanding,
        }
    }

    #[test]
    fn single_facility_round_trip() {
        let facilities = vec![record("Extended Fund Facility", "Dec 16, 2010", 100.0, 50.0, 50.0)];
        let mapping = mapping_for_country(Country::Ireland, &facilities);

        assert_eq!(
            mapping.get("IMFEOD.EXTFUNDFACILITY2010DEC16.AMOUNTAGREED.IRL.M"),
            Some(&100.0)
        );
        assert_eq!(mapping.get("IMFEOD.TOTAL.AMOUNTAGREED.IRL.M"), Some(&100.0));
        assert_eq!(mapping.get("IMFEOD.TOTAL.AMOUNTDRAWN.IRL.M"), Some(&50.0));
        assert_eq!(
            mapping.get("IMFEOD.TOTAL.AMOUNTOUTSTANDING.IRL.M"),
            Some(&50.0)
        );
        // 3 totals + 3 per facility
        assert_eq!(mapping.len(), 6);
    }

    #[test]
    fn zero_facilities_still_emit_totals() {
        let mapping = mapping_for_country(Country::Greece, &[]);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get("IMFEOD.TOTAL.AMOUNTAGREED.GRC.M"), Some(&0.0));
        assert_eq!(mapping.get("IMFEOD.TOTAL.AMOUNTDRAWN.GRC.M"), Some(&0.0));
        assert_eq!(
            mapping.get("IMFEOD.TOTAL.AMOUNTOUTSTANDING.GRC.M"),
            Some(&0.0)
        );
    }

    #[test]
    fn totals_sum_over_all_records() {
        let facilities = vec![
            record("Standby Arrangement", "May 9, 2010", 26_432.9, 17_541.8, 0.0),
            record("Extended Fund Facility", "Mar 15, 2012", 23_785.3, 10_224.5, 1_000.0),
        ];
        let mapping = mapping_for_country(Country::Greece, &facilities);
        assert_eq!(
            mapping.get("IMFEOD.TOTAL.AMOUNTAGREED.GRC.M"),
            Some(&(26_432.9 + 23_785.3))
        );
        assert_eq!(
            mapping.get("IMFEOD.TOTAL.AMOUNTOUTSTANDING.GRC.M"),
            Some(&1_000.0)
        );
    }

    #[test]
    fn duplicate_keys_overwrite_last_wins() {
        // Two records with identical facility and date collide on the same
        // keys; the later record's values must survive.
        let facilities = vec![
            record("Standby Arrangement", "Apr 25, 1977", 10.0, 10.0, 10.0),
            record("Standby Arrangement", "Apr 25, 1977", 20.0, 20.0, 20.0),
        ];
        let mapping = mapping_for_country(Country::Portugal, &facilities);
        assert_eq!(
            mapping.get("IMFEOD.STANDBYARRANGEMENT1977APR25.AMOUNTAGREED.PRT.M"),
            Some(&20.0)
        );
        // totals still sum both records
        assert_eq!(mapping.get("IMFEOD.TOTAL.AMOUNTAGREED.PRT.M"), Some(&30.0));
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn process_all_survives_one_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let ireland = write_file(
            dir.path(),
            "Ireland_IMF_External_Arrangements_2025-08-31.tsv",
            "Ireland: History of Lending Commitments\n\
             Facility\tDate of Arrangement\tAmount Agreed\tAmount Drawn\tAmount Outstanding\n\
             Extended Fund Facility\tDec 16, 2010\t100\t50\t50\n",
        );
        let greece = write_file(
            dir.path(),
            "Greece_IMF_External_Arrangements_2025-08-31.tsv",
            "Greece: History of Lending Commitments\nno table in here at all\n",
        );

        let mut files = BTreeMap::new();
        files.insert(Country::Ireland, ireland);
        files.insert(Country::Greece, greece);

        let summary = process_all(&files);
        assert_eq!(
            summary.outcomes.get(&Country::Ireland),
            Some(&CountryOutcome::Mapped {
                facilities: 1,
                file_date: Some("2025-08".to_string()),
            })
        );
        assert!(matches!(
            summary.outcomes.get(&Country::Greece),
            Some(CountryOutcome::Failed(_))
        ));
        assert_eq!(summary.selected_date.as_deref(), Some("2025-08"));
        assert_eq!(summary.mapping.get("IMFEOD.TOTAL.AMOUNTAGREED.IRL.M"), Some(&100.0));
        // the failed file contributed nothing
        assert!(!summary.mapping.keys().any(|k| k.ends_with(".GRC.M")));
    }

    #[test]
    fn selected_date_is_max_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let ireland = write_file(
            dir.path(),
            "Ireland_data_2024-01-05.tsv",
            "Country: Ireland\nFacility\tAmount Agreed\nExtended Fund Facility\t1\n",
        );
        let portugal = write_file(
            dir.path(),
            "Portugal_data_2024-03-01.tsv",
            "Country: Portugal\nFacility\tAmount Agreed\nStandby Arrangement\t2\n",
        );

        let mut files = BTreeMap::new();
        files.insert(Country::Ireland, ireland);
        files.insert(Country::Portugal, portugal);

        let summary = process_all(&files);
        assert_eq!(summary.selected_date.as_deref(), Some("2024-03"));
    }
}
