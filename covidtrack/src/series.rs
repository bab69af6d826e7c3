//! The plottable output of every aggregation view: one row per date, ordered columns keyed
//! by typed [`ColumnKey`]s rather than by strings.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use nonempty::NonEmpty;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, Alignment};
use crate::error::{CovidtrackError, Result};
use crate::lookup::Category;
use crate::metric::Metric;
use crate::observation::{gap_to_none, same_value};
use crate::COL;

/// Identifies a column of a [`SeriesTable`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// A metric as reported (or summed).
    Metric(Metric),
    /// A metric scaled per 1,000,000 population before any summing.
    PerMillion(Metric),
    /// A metric summed over the regions of one category.
    Category(Category),
    Rolling(RollingKey),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RollingKey {
    pub column: Box<ColumnKey>,
    pub window: usize,
    pub alignment: Alignment,
}

impl ColumnKey {
    pub fn rolling(column: ColumnKey, window: usize, alignment: Alignment) -> Self {
        ColumnKey::Rolling(RollingKey {
            column: Box::new(column),
            window,
            alignment,
        })
    }
}

/// Published column names: metric names as in the feed, `roll_<column>_<window>` for
/// trailing means and `roll_<column>_<window>_lead` for start-aligned ones.
impl Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKey::Metric(metric) => write!(f, "{metric}"),
            ColumnKey::PerMillion(metric) => write!(f, "{metric}PerMillion"),
            ColumnKey::Category(category) => write!(f, "{category}"),
            ColumnKey::Rolling(key) => {
                write!(f, "roll_{}_{}", key.column, key.window)?;
                if key.alignment == Alignment::Start {
                    write!(f, "_lead")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for ColumnKey {
    type Err = CovidtrackError;

    fn from_str(value: &str) -> Result<Self> {
        let unknown = || CovidtrackError::UnknownColumn(value.to_string());
        if let Some(rest) = value.strip_prefix("roll_") {
            let (rest, alignment) = match rest.strip_suffix("_lead") {
                Some(rest) => (rest, Alignment::Start),
                None => (rest, Alignment::End),
            };
            let (column, window) = rest.rsplit_once('_').ok_or_else(unknown)?;
            let window = window.parse().map_err(|_| unknown())?;
            return Ok(ColumnKey::rolling(column.parse()?, window, alignment));
        }
        if let Ok(metric) = Metric::from_str(value) {
            return Ok(ColumnKey::Metric(metric));
        }
        if let Some(metric) = value
            .strip_suffix("PerMillion")
            .and_then(|m| Metric::from_str(m).ok())
        {
            return Ok(ColumnKey::PerMillion(metric));
        }
        Category::from_str(value)
            .map(ColumnKey::Category)
            .map_err(|_| unknown())
    }
}

/// Date-ascending rows with ordered, equal-length columns. Gaps are NaN.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(into = "ColumnarSeries", try_from = "ColumnarSeries")]
pub struct SeriesTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(ColumnKey, Vec<f64>)>,
}

impl SeriesTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: vec![],
        }
    }

    /// Add a column, replacing any existing column with the same key in place.
    pub fn push_column(&mut self, key: ColumnKey, values: Vec<f64>) -> Result<()> {
        if values.len() != self.dates.len() {
            return Err(CovidtrackError::ColumnLength {
                column: key.to_string(),
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((key, values)),
        }
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Decorate the table with a rolling mean of each of `columns` for each of `windows`.
    pub fn with_rolling(
        mut self,
        columns: &[ColumnKey],
        windows: &NonEmpty<usize>,
        alignment: Alignment,
    ) -> Result<Self> {
        if windows.iter().any(|w| *w == 0) {
            return Err(CovidtrackError::InvalidWindow);
        }
        for column in columns {
            let values = self
                .column(column)
                .ok_or_else(|| CovidtrackError::UnknownColumn(column.to_string()))?
                .to_vec();
            for window in windows {
                let rolled = aggregate::rolling_mean(&values, *window, alignment);
                self.push_column(ColumnKey::rolling(column.clone(), *window, alignment), rolled)?;
            }
        }
        Ok(self)
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![Series::new(
            COL::DATE,
            self.dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>(),
        )];
        for (key, values) in &self.columns {
            series.push(Series::new(
                &key.to_string(),
                values.iter().map(|v| gap_to_none(*v)).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(series)?)
    }
}

impl PartialEq for SeriesTable {
    fn eq(&self, other: &Self) -> bool {
        self.dates == other.dates
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|((ka, va), (kb, vb))| {
                    ka == kb
                        && va.len() == vb.len()
                        && va.iter().zip(vb).all(|(a, b)| same_value(*a, *b))
                })
    }
}

/// Column-oriented interchange form of a [`SeriesTable`]. Gaps become `null`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ColumnarSeries {
    date: Vec<NaiveDate>,
    columns: Vec<NamedColumn>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct NamedColumn {
    name: String,
    values: Vec<Option<f64>>,
}

impl From<SeriesTable> for ColumnarSeries {
    fn from(table: SeriesTable) -> Self {
        Self {
            date: table.dates,
            columns: table
                .columns
                .into_iter()
                .map(|(key, values)| NamedColumn {
                    name: key.to_string(),
                    values: values.into_iter().map(gap_to_none).collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<ColumnarSeries> for SeriesTable {
    type Error = CovidtrackError;

    fn try_from(value: ColumnarSeries) -> Result<Self> {
        let mut table = SeriesTable::new(value.date);
        for column in value.columns {
            table.push_column(
                column.name.parse()?,
                column
                    .values
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            )?;
        }
        Ok(table)
    }
}
