//! Records for diagnostics of the learn loop.
use crate::error::WarmstartError;
use chrono::prelude::{DateTime, Local};
use std::collections::{hash_map::Iter, HashMap};

/// Represents a value in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar.
    Scalar(f32),

    /// Date and time.
    DateTime(DateTime<Local>),
}

/// Represents a record, a key-value map of diagnostics emitted by the
/// learn loop, e.g. phase timings of sampling, updating and target tracking.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Construct empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Create a record from a slice of `(&str, RecordValue)` pairs.
    pub fn from_slice<K: AsRef<str>>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.clone()))
                .collect(),
        )
    }

    /// Get the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Insert a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Merge records, the rhs wins on key collision.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Get scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, WarmstartError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(WarmstartError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(WarmstartError::RecordKeyError(k.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Record,
        RecordValue::{DateTime, Scalar},
    };
    use chrono::Local;

    #[test]
    fn test_merge_and_get_scalar() {
        let rec1 = Record::from_slice(&[("a", Scalar(1.0)), ("b", Scalar(2.0))]);
        let rec2 = Record::from_slice(&[("b", Scalar(3.0))]);
        let rec = rec1.merge(rec2);
        assert_eq!(rec.get_scalar("a").unwrap(), 1.0);
        assert_eq!(rec.get_scalar("b").unwrap(), 3.0);
        assert!(rec.get_scalar("c").is_err());
    }

    #[test]
    fn test_get_scalar_rejects_datetime() {
        let mut rec = Record::empty();
        rec.insert("datetime", DateTime(Local::now()));
        assert!(rec.get("datetime").is_some());
        assert!(rec.get_scalar("datetime").is_err());
    }
}
