//! Data models for the age statistics report.
//!
//! This module contains the record, age range and count structures shared by
//! the aggregation core, the dataset source and the report renderers.

use crate::error::AggregationError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Value of the sex field that marks a male person.
pub const MALE_MARKER: &str = "M";

/// Field names holding a person's age, in lookup order.
const AGE_FIELDS: [&str; 2] = ["vek", "age"];

/// Field names holding a person's sex, in lookup order.
const SEX_FIELDS: [&str; 2] = ["pohlavi", "sex"];

/// One of the three datasets the report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Cases,
    Recovered,
    Deaths,
}

impl DatasetKind {
    /// All datasets in report column order.
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Cases,
        DatasetKind::Recovered,
        DatasetKind::Deaths,
    ];

    /// Column heading used by the renderers.
    pub fn heading(&self) -> &'static str {
        match self {
            DatasetKind::Cases => "Cases",
            DatasetKind::Recovered => "Recovered",
            DatasetKind::Deaths => "Deaths",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Cases => write!(f, "cases"),
            DatasetKind::Recovered => write!(f, "recovered"),
            DatasetKind::Deaths => write!(f, "deaths"),
        }
    }
}

/// Sex of a person as counted by the report.
///
/// The datasets only distinguish the male marker from everything else, so
/// any value other than [`MALE_MARKER`] is counted as female. Records with an
/// unrecognized value end up in the female column, not in the unknown one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn from_marker(marker: &str) -> Self {
        if marker == MALE_MARKER {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// A single person from one of the datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonRecord {
    /// Age in whole years, `None` when the dataset does not know it.
    pub age: Option<u32>,
    pub sex: Sex,
}

impl PersonRecord {
    /// Validate a raw JSON record at `index` of `dataset`.
    pub fn from_value(
        dataset: DatasetKind,
        index: usize,
        value: &Value,
    ) -> Result<Self, AggregationError> {
        let object = value.as_object().ok_or_else(|| {
            AggregationError::malformed(dataset, index, "record is not a JSON object")
        })?;

        let age = match lookup(object, &AGE_FIELDS) {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let age = raw
                    .as_u64()
                    .and_then(|age| u32::try_from(age).ok())
                    .ok_or_else(|| {
                        AggregationError::malformed(
                            dataset,
                            index,
                            format!("age {} is not a non-negative integer", raw),
                        )
                    })?;
                Some(age)
            }
        };

        let sex = match lookup(object, &SEX_FIELDS) {
            Some(Value::String(marker)) => Sex::from_marker(marker),
            Some(other) => {
                return Err(AggregationError::malformed(
                    dataset,
                    index,
                    format!("sex {} is not a string", other),
                ))
            }
            None => {
                return Err(AggregationError::malformed(
                    dataset,
                    index,
                    "missing sex field",
                ))
            }
        };

        Ok(Self { age, sex })
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

/// An inclusive age interval defining one report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub start: u32,
    /// Inclusive upper bound, `None` for the open-ended top range.
    pub end: Option<u32>,
    /// Whether records without an age are counted as unknown in this range.
    pub absorbs_missing_age: bool,
}

impl AgeRange {
    pub const fn new(start: u32, end: Option<u32>) -> Self {
        Self {
            start,
            end,
            absorbs_missing_age: false,
        }
    }

    /// Mark this range as the one that counts records without an age.
    pub const fn absorbing_missing_age(mut self) -> Self {
        self.absorbs_missing_age = true;
        self
    }

    /// Human-readable label, e.g. `15 - 24` or `85+`.
    pub fn label(&self) -> String {
        match self.end {
            Some(end) => format!("{} - {}", self.start, end),
            None => format!("{}+", self.start),
        }
    }
}

/// The fixed, ordered age ranges of the report.
///
/// Ranges are contiguous and the last one is unbounded, so every known age
/// falls into exactly one of them. Records without an age are attributed to
/// the first range.
pub const AGE_RANGES: [AgeRange; 9] = [
    AgeRange::new(0, Some(14)).absorbing_missing_age(),
    AgeRange::new(15, Some(24)),
    AgeRange::new(25, Some(34)),
    AgeRange::new(35, Some(44)),
    AgeRange::new(45, Some(54)),
    AgeRange::new(55, Some(64)),
    AgeRange::new(65, Some(74)),
    AgeRange::new(75, Some(84)),
    AgeRange::new(85, None),
];

/// Male/female/unknown counts of one dataset within one age range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub male: usize,
    pub female: usize,
    pub unknown: usize,
    pub total: usize,
}

impl CategoryCounts {
    pub fn new(male: usize, female: usize, unknown: usize) -> Self {
        Self {
            male,
            female,
            unknown,
            total: male + female + unknown,
        }
    }
}

impl Add for CategoryCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            male: self.male + rhs.male,
            female: self.female + rhs.female,
            unknown: self.unknown + rhs.unknown,
            total: self.total + rhs.total,
        }
    }
}

impl Sum for CategoryCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Counts for all three datasets, the columns of one report row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub cases: CategoryCounts,
    pub recovered: CategoryCounts,
    pub deaths: CategoryCounts,
}

impl GroupCounts {
    pub fn get(&self, kind: DatasetKind) -> &CategoryCounts {
        match kind {
            DatasetKind::Cases => &self.cases,
            DatasetKind::Recovered => &self.recovered,
            DatasetKind::Deaths => &self.deaths,
        }
    }
}

impl Add for GroupCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cases: self.cases + rhs.cases,
            recovered: self.recovered + rhs.recovered,
            deaths: self.deaths + rhs.deaths,
        }
    }
}

impl Sum for GroupCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// One report row: the counts of every dataset for one age range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupSummary {
    /// Label of the age range, e.g. `25 - 34`.
    pub age_range: String,
    #[serde(flatten)]
    pub counts: GroupCounts,
}

/// Raw records of the three datasets plus their modification time.
#[derive(Debug, Clone)]
pub struct DatasetBundle {
    pub last_updated: DateTime<FixedOffset>,
    pub cases: Vec<Value>,
    pub recovered: Vec<Value>,
    pub deaths: Vec<Value>,
}

impl DatasetBundle {
    pub fn records(&self, kind: DatasetKind) -> &[Value] {
        match kind {
            DatasetKind::Cases => &self.cases,
            DatasetKind::Recovered => &self.recovered,
            DatasetKind::Deaths => &self.deaths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.recovered.is_empty() && self.deaths.is_empty()
    }
}

/// The complete age statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Modification time of the source datasets.
    pub last_updated: DateTime<FixedOffset>,
    /// `last_updated` as a long date, e.g. `19 October 2020`.
    pub last_updated_label: String,
    /// One row per age range, in range order.
    pub age_groups: Vec<AgeGroupSummary>,
    /// Column-wise sum of all rows.
    pub total: GroupCounts,
}
