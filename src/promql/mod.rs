// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Native sample types of the query language.
//!
//! These mirror the evaluator's own value model: an instant vector is a list
//! of [`Sample`]s (one point per series), a range vector is a list of
//! [`Series`] (many points per series). Points may carry a histogram payload
//! instead of a plain float; the kernel bridge refuses to marshal those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Series identity: a sorted set of label name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Create an empty label set
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a label
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Get the value of a label by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=\"{}\"", name, value)?;
        }
        write!(f, "}}")
    }
}

/// One bucket of a histogram payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub upper_bound: f64,
    pub count: f64,
}

/// Histogram payload of a point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    pub count: f64,
    pub sum: f64,
    #[serde(default)]
    pub buckets: Vec<HistogramBucket>,
}

/// A single observation: millisecond timestamp plus float value.
///
/// When `histogram` is set the point is a histogram sample and `value` is
/// not meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "t")]
    pub timestamp: i64,
    #[serde(rename = "v", default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "h")]
    pub histogram: Option<Histogram>,
}

impl Point {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            histogram: None,
        }
    }

    pub fn with_histogram(timestamp: i64, histogram: Histogram) -> Self {
        Self {
            timestamp,
            value: 0.0,
            histogram: Some(histogram),
        }
    }

    pub fn is_histogram(&self) -> bool {
        self.histogram.is_some()
    }
}

/// Instant-vector element: one point of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub metric: Labels,
    #[serde(flatten)]
    pub point: Point,
}

impl Sample {
    pub fn new(metric: Labels, timestamp: i64, value: f64) -> Self {
        Self {
            metric,
            point: Point::new(timestamp, value),
        }
    }
}

/// Range-vector element: the points of one series, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub metric: Labels,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(metric: Labels, points: Vec<Point>) -> Self {
        Self { metric, points }
    }
}

/// Instant vector.
pub type Vector = Vec<Sample>;

/// Range vector.
pub type Matrix = Vec<Series>;
