//! Age and sex aggregation of dataset records.
//!
//! This module turns validated person records into per-age-range counts and
//! assembles them into the final report.

use crate::error::AggregationError;
use crate::models::{
    AgeGroupSummary, AgeRange, CategoryCounts, DatasetBundle, DatasetKind, GroupCounts,
    PersonRecord, Report, Sex, AGE_RANGES,
};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::{debug, warn};

/// Long date format used for the report timestamp.
const LONG_DATE_FORMAT: &str = "%-d %B %Y";

/// Check whether `age` lies in `start_age..=end_age` (no upper bound if `None`).
pub fn is_in_range(age: u32, start_age: u32, end_age: Option<u32>) -> bool {
    start_age <= age && end_age.map_or(true, |end| age <= end)
}

/// Count the records of one age range by sex.
///
/// Records without an age are counted as unknown, but only in the range that
/// absorbs missing ages. Records whose age lies outside the range are skipped.
pub fn count_by_sex(records: &[PersonRecord], range: &AgeRange) -> CategoryCounts {
    let (male, female, unknown) =
        records
            .iter()
            .fold((0, 0, 0), |(male, female, unknown), record| match record.age {
                None if range.absorbs_missing_age => (male, female, unknown + 1),
                Some(age) if is_in_range(age, range.start, range.end) => match record.sex {
                    Sex::Male => (male + 1, female, unknown),
                    Sex::Female => (male, female + 1, unknown),
                },
                _ => (male, female, unknown),
            });

    CategoryCounts::new(male, female, unknown)
}

/// Validated records of all three datasets.
#[derive(Debug, Clone, Default)]
pub struct ParsedBundle {
    pub cases: Vec<PersonRecord>,
    pub recovered: Vec<PersonRecord>,
    pub deaths: Vec<PersonRecord>,
}

impl ParsedBundle {
    /// Validate every record of `bundle`, failing on the first malformed one.
    pub fn from_bundle(bundle: &DatasetBundle) -> Result<Self, AggregationError> {
        Ok(Self {
            cases: parse_records(DatasetKind::Cases, bundle.records(DatasetKind::Cases))?,
            recovered: parse_records(
                DatasetKind::Recovered,
                bundle.records(DatasetKind::Recovered),
            )?,
            deaths: parse_records(DatasetKind::Deaths, bundle.records(DatasetKind::Deaths))?,
        })
    }

    pub fn records(&self, kind: DatasetKind) -> &[PersonRecord] {
        match kind {
            DatasetKind::Cases => &self.cases,
            DatasetKind::Recovered => &self.recovered,
            DatasetKind::Deaths => &self.deaths,
        }
    }
}

/// Validate the raw records of one dataset.
pub fn parse_records(
    dataset: DatasetKind,
    values: &[Value],
) -> Result<Vec<PersonRecord>, AggregationError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| PersonRecord::from_value(dataset, index, value))
        .collect()
}

/// Build the report row of one age range.
pub fn build_summary_row(bundle: &ParsedBundle, range: &AgeRange) -> AgeGroupSummary {
    AgeGroupSummary {
        age_range: range.label(),
        counts: GroupCounts {
            cases: count_by_sex(bundle.records(DatasetKind::Cases), range),
            recovered: count_by_sex(bundle.records(DatasetKind::Recovered), range),
            deaths: count_by_sex(bundle.records(DatasetKind::Deaths), range),
        },
    }
}

/// Sum every counter column over all rows.
pub fn grand_total(rows: &[AgeGroupSummary]) -> GroupCounts {
    rows.iter().map(|row| row.counts).sum()
}

/// Build the complete report from a dataset bundle.
///
/// A single malformed record aborts the whole build.
pub fn build_report(
    bundle: &DatasetBundle,
    timestamp: DateTime<FixedOffset>,
) -> Result<Report, AggregationError> {
    let parsed = ParsedBundle::from_bundle(bundle)?;

    if bundle.is_empty() {
        warn!("All three datasets are empty; the report will contain only zeros");
    }

    let age_groups: Vec<AgeGroupSummary> = AGE_RANGES
        .iter()
        .map(|range| build_summary_row(&parsed, range))
        .collect();
    let total = grand_total(&age_groups);

    debug!(
        "Aggregated {} cases, {} recovered, {} deaths",
        total.cases.total, total.recovered.total, total.deaths.total
    );

    Ok(Report {
        last_updated: timestamp,
        last_updated_label: timestamp.format(LONG_DATE_FORMAT).to_string(),
        age_groups,
        total,
    })
}
