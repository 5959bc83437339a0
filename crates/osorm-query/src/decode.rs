//! Aggregation response decoder.
//!
//! Mirrors [`Aggregation::compile`](crate::aggs::Aggregation::compile): each
//! response level is found under its string-encoded depth. A level carrying
//! `buckets` becomes an ordered key → result map, a level carrying `value` is a
//! metric scalar. A missing level ends the recursion.

use indexmap::IndexMap;
use serde_json::Value;

use osorm_core::{CoreError, CoreResult};

/// Decoded aggregation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationResult {
    /// Metric value as returned by the engine (may be `null`).
    Metric(Value),
    /// Bucket level keyed by bucket key, in response order.
    Buckets(IndexMap<String, AggregationResult>),
    /// `doc_count` of a bucket without a nested level.
    Count(u64),
}

impl AggregationResult {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Metric(value) => value.as_f64(),
            Self::Count(count) => Some(*count as f64),
            Self::Buckets(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Metric(value) => value.as_u64(),
            Self::Count(count) => Some(*count),
            Self::Buckets(_) => None,
        }
    }

    pub fn as_buckets(&self) -> Option<&IndexMap<String, AggregationResult>> {
        match self {
            Self::Buckets(buckets) => Some(buckets),
            _ => None,
        }
    }

    pub fn into_buckets(self) -> Option<IndexMap<String, AggregationResult>> {
        match self {
            Self::Buckets(buckets) => Some(buckets),
            _ => None,
        }
    }

    /// Child result for a bucket key.
    pub fn get(&self, key: &str) -> Option<&AggregationResult> {
        self.as_buckets().and_then(|buckets| buckets.get(key))
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Buckets(buckets) if buckets.is_empty())
    }
}

/// Decode the aggregation level at `depth` and everything below it.
///
/// Returns `Ok(None)` when the response has no level at `depth`.
pub fn decode(response: &Value, depth: u32) -> CoreResult<Option<AggregationResult>> {
    let Some(level) = response.get(depth.to_string()) else {
        return Ok(None);
    };

    if let Some(buckets) = level.get("buckets") {
        let buckets = buckets.as_array().ok_or_else(|| {
            CoreError::malformed(format!("level {depth}: buckets must be an array"))
        })?;

        let mut result = IndexMap::with_capacity(buckets.len());
        for bucket in buckets {
            let key = bucket_key(bucket, depth)?;
            let count = bucket
                .get("doc_count")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    CoreError::malformed(format!("level {depth}: bucket `{key}` has no doc_count"))
                })?;

            let entry = match decode(bucket, depth + 1)? {
                Some(child) if !child.is_empty() => child,
                _ => AggregationResult::Count(count),
            };
            result.insert(key, entry);
        }

        return Ok(Some(AggregationResult::Buckets(result)));
    }

    match level.get("value") {
        Some(value) => Ok(Some(AggregationResult::Metric(value.clone()))),
        None => Err(CoreError::malformed(format!(
            "level {depth}: expected `buckets` or `value`, found {level}"
        ))),
    }
}

fn bucket_key(bucket: &Value, depth: u32) -> CoreResult<String> {
    match bucket.get("key") {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(CoreError::malformed(format!(
            "level {depth}: bucket has no key"
        ))),
    }
}
