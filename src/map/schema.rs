//! The fixed output schema and the projection onto it.
//!
//! The 30 columns below are mandated externally and must be reproduced
//! byte-for-byte; they are not derivable from the inputs. Machine key and
//! descriptive label live in one record per column so the two can never get
//! out of step.

use tracing::warn;

use crate::map::AggregateMapping;

/// One output column: machine-readable key plus human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaColumn {
    pub machine_key: &'static str,
    pub label: &'static str,
}

const fn col(machine_key: &'static str, label: &'static str) -> SchemaColumn {
    SchemaColumn { machine_key, label }
}

#[rustfmt::skip]
pub const FIXED_SCHEMA: [SchemaColumn; 30] = [
    col("IMFEOD.EXTFUNDFACILITY2010DEC16.AMOUNTAGREED.IRL.M", "IMF Lending Commitments, Extended Fund Facility 16 December 2010, Amount Agreed, Ireland"),
    col("IMFEOD.EXTFUNDFACILITY2010DEC16.AMOUNTDRAWN.IRL.M", "IMF Lending Commitments, Extended Fund Facility 16 December 2010, Amount Drawn, Ireland"),
    col("IMFEOD.EXTFUNDFACILITY2010DEC16.AMOUNTOUTSTANDING.IRL.M", "IMF Lending Commitments, Extended Fund Facility 16 December 2010, Amount Outstanding, Ireland"),
    col("IMFEOD.TOTAL.AMOUNTAGREED.IRL.M", "IMF Lending Commitments, Total, Amount Agreed, Ireland"),
    col("IMFEOD.TOTAL.AMOUNTDRAWN.IRL.M", "IMF Lending Commitments, Total, Amount Drawn, Ireland"),
    col("IMFEOD.TOTAL.AMOUNTOUTSTANDING.IRL.M", "IMF Lending Commitments, Total, Amount Outstanding, Ireland"),
    col("IMFEOD.EXTFUNDFACILITY2012MAR15.AMOUNTAGREED.GRC.M", "IMF Lending Commitments, Extended Fund Facility 15 March 2012, Amount Agreed, Greece"),
    col("IMFEOD.EXTFUNDFACILITY2012MAR15.AMOUNTDRAWN.GRC.M", "IMF Lending Commitments, Extended Fund Facility 15 March 2012, Amount Drawn, Greece"),
    col("IMFEOD.EXTFUNDFACILITY2012MAR15.AMOUNTOUTSTANDING.GRC.M", "IMF Lending Commitments, Extended Fund Facility 15 March 2012, Amount Outstanding, Greece"),
    col("IMFEOD.STANDBYARRANGEMENT2010MAY09.AMOUNTAGREED.GRC.M", "IMF Lending Commitments, Standby Arrangement 09 May 2010, Amount Agreed, Greece"),
    col("IMFEOD.STANDBYARRANGEMENT2010MAY09.AMOUNTDRAWN.GRC.M", "IMF Lending Commitments, Standby Arrangement 09 May 2010, Amount Drawn, Greece"),
    col("IMFEOD.STANDBYARRANGEMENT2010MAY09.AMOUNTOUTSTANDING.GRC.M", "IMF Lending Commitments, Standby Arrangement 09 May 2010, Amount Outstanding, Greece"),
    col("IMFEOD.TOTAL.AMOUNTAGREED.GRC.M", "IMF Lending Commitments, Total, Amount Agreed, Greece"),
    col("IMFEOD.TOTAL.AMOUNTDRAWN.GRC.M", "IMF Lending Commitments, Total, Amount Drawn, Greece"),
    col("IMFEOD.TOTAL.AMOUNTOUTSTANDING.GRC.M", "IMF Lending Commitments, Total, Amount Outstanding, Greece"),
    col("IMFEOD.EXTFUNDFACILITY2011MAY20.AMOUNTAGREED.PRT.M", "IMF Lending Commitments, Extended Fund Facility 20 May 2011, Amount Agreed, Portugal"),
    col("IMFEOD.EXTFUNDFACILITY2011MAY20.AMOUNTDRAWN.PRT.M", "IMF Lending Commitments, Extended Fund Facility 20 May 2011, Amount Drawn, Portugal"),
    col("IMFEOD.EXTFUNDFACILITY2011MAY20.AMOUNTOUTSTANDING.PRT.M", "IMF Lending Commitments, Extended Fund Facility 20 May 2011, Amount Outstanding, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1983OCT07.AMOUNTAGREED.PRT.M", "IMF Lending Commitments, Standby Arrangement 07 October 1983, Amount Agreed, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1983OCT07.AMOUNTDRAWN.PRT.M", "IMF Lending Commitments, Standby Arrangement 07 October 1983, Amount Drawn, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1983OCT07.AMOUNTOUTSTANDING.PRT.M", "IMF Lending Commitments, Standby Arrangement 07 October 1983, Amount Outstanding, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1978JUN05.AMOUNTAGREED.PRT.M", "IMF Lending Commitments, Standby Arrangement 05 June 1978, Amount Agreed, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1978JUN05.AMOUNTDRAWN.PRT.M", "IMF Lending Commitments, Standby Arrangement 05 June 1978, Amount Drawn, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1978JUN05.AMOUNTOUTSTANDING.PRT.M", "IMF Lending Commitments, Standby Arrangement 05 June 1978, Amount Outstanding, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1977APR25.AMOUNTAGREED.PRT.M", "IMF Lending Commitments, Standby Arrangement 25 April 1977, Amount Agreed, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1977APR25.AMOUNTDRAWN.PRT.M", "IMF Lending Commitments, Standby Arrangement 25 April 1977, Amount Drawn, Portugal"),
    col("IMFEOD.STANDBYARRANGEMENT1977APR25.AMOUNTOUTSTANDING.PRT.M", "IMF Lending Commitments, Standby Arrangement 25 April 1977, Amount Outstanding, Portugal"),
    col("IMFEOD.TOTAL.AMOUNTAGREED.PRT.M", "IMF Lending Commitments, Total, Amount Agreed, Portugal"),
    col("IMFEOD.TOTAL.AMOUNTDRAWN.PRT.M", "IMF Lending Commitments, Total, Amount Drawn, Portugal"),
    col("IMFEOD.TOTAL.AMOUNTOUTSTANDING.PRT.M", "IMF Lending Commitments, Total, Amount Outstanding, Portugal"),
];

/// One projected output line: the reporting date plus one value per schema
/// column, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub date_value: String,
    pub values: Vec<f64>,
}

/// Project an aggregate mapping onto the fixed schema. Keys absent from the
/// mapping come out as 0; keys not in the schema are dropped.
pub fn project(mapping: &AggregateMapping, date_value: &str) -> OutputRow {
    OutputRow {
        date_value: date_value.to_string(),
        values: FIXED_SCHEMA
            .iter()
            .map(|c| mapping.get(c.machine_key).copied().unwrap_or(0.0))
            .collect(),
    }
}

/// Force `values` to schema length. A mismatch can only come from a caller
/// assembling rows by hand, but it must be corrected with a warning rather
/// than surfacing as an error.
pub fn fit_to_schema(values: &mut Vec<f64>) {
    if values.len() != FIXED_SCHEMA.len() {
        warn!(
            have = values.len(),
            want = FIXED_SCHEMA.len(),
            "output row length mismatch; padding/truncating"
        );
        values.resize(FIXED_SCHEMA.len(), 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::AggregateMapping;

    #[test]
    fn schema_has_thirty_distinct_keys() {
        let mut keys: Vec<&str> = FIXED_SCHEMA.iter().map(|c| c.machine_key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 30);
    }

    #[test]
    fn empty_mapping_projects_to_zeros() {
        let row = project(&AggregateMapping::new(), "2025-08");
        assert_eq!(row.date_value, "2025-08");
        assert_eq!(row.values.len(), 30);
        assert!(row.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn single_key_lands_at_correct_index() {
        let mut mapping = AggregateMapping::new();
        mapping.insert("IMFEOD.TOTAL.AMOUNTAGREED.GRC.M".to_string(), 54_218.2);

        let row = project(&mapping, "2025-08");
        let idx = FIXED_SCHEMA
            .iter()
            .position(|c| c.machine_key == "IMFEOD.TOTAL.AMOUNTAGREED.GRC.M")
            .unwrap();
        assert_eq!(idx, 12);
        assert_eq!(row.values[idx], 54_218.2);
        assert_eq!(row.values.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn projection_is_idempotent() {
        let mut mapping = AggregateMapping::new();
        mapping.insert("IMFEOD.TOTAL.AMOUNTDRAWN.IRL.M".to_string(), 1.5);
        let a = project(&mapping, "2025-08");
        let b = project(&mapping, "2025-08");
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let mut mapping = AggregateMapping::new();
        mapping.insert("IMFEOD.SOMETHINGELSE.AMOUNTAGREED.IRL.M".to_string(), 9.0);
        let row = project(&mapping, "2025-08");
        assert!(row.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn fit_pads_and_truncates() {
        let mut short = vec![1.0; 3];
        fit_to_schema(&mut short);
        assert_eq!(short.len(), 30);
        assert_eq!(short[2], 1.0);
        assert_eq!(short[3], 0.0);

        let mut long = vec![1.0; 40];
        fit_to_schema(&mut long);
        assert_eq!(long.len(), 30);
    }
}
