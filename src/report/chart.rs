//! Chart-ready plain data: one label axis plus any number of numeric series.
//!
//! Nothing here knows about a charting library. A front end maps `labels`
//! onto its category axis and each dataset onto one series.

#![allow(missing_docs)]

use serde::Serialize;

use crate::stats::kit::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            datasets: Vec::new(),
        }
    }

    /// Append a dataset. Values are rounded to `decimals` places.
    ///
    /// A dataset shorter or longer than the label axis is kept as is; front
    /// ends pad or truncate.
    #[must_use]
    pub fn dataset(mut self, name: impl Into<String>, data: impl IntoIterator<Item = f64>, decimals: u32) -> Self {
        self.datasets.push(Dataset {
            name: name.into(),
            data: data.into_iter().map(|v| round_to(v, decimals)).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_labels_and_rounded_datasets() {
        let chart = ChartSeries::with_labels(["M1", "M2"])
            .dataset("avg", [37.26, 40.0], 1)
            .dataset("max", [44.0, 46.0], 0);
        assert_eq!(chart.labels, vec!["M1", "M2"]);
        assert_eq!(chart.datasets[0].data, vec![37.3, 40.0]);
        assert_eq!(chart.datasets[1].name, "max");
    }

    #[test]
    fn serializes_as_plain_json() {
        let chart = ChartSeries::with_labels(["Z1"]).dataset("deviation", [1.5], 2);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["labels"][0], "Z1");
        assert_eq!(json["datasets"][0]["data"][0], 1.5);
    }

    #[test]
    fn default_is_empty() {
        assert!(ChartSeries::default().is_empty());
    }
}
