use std::{fs::File, io::Read, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-epoch metric values recorded while fitting a model, keyed by metric
/// name (`loss`, `val_loss`, `accuracy`, `val_accuracy`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(IndexMap<String, Vec<f64>>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON object a training run dumps for its history.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a history from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut buffer = String::new();
        File::open(path)?.read_to_string(&mut buffer)?;
        Self::from_json_str(&buffer)
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<f64>) {
        self.0.insert(key.into(), values);
    }

    pub fn with(mut self, key: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(key, values);
        self
    }

    /// The values recorded for `key`.
    pub fn series(&self, key: &str) -> Result<&[f64]> {
        self.0
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::invalid(format!("history has no '{key}' series")))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of epochs, taken from the `loss` series.
    pub fn epochs(&self) -> usize {
        self.0.get("loss").map_or(0, Vec::len)
    }

    /// `self`'s values for `key` followed by `other`'s.
    pub fn concat(&self, other: &History, key: &str) -> Result<Vec<f64>> {
        let mut combined = self.series(key)?.to_vec();
        combined.extend_from_slice(other.series(key)?);
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keras_history_json() {
        let h = History::from_json_str(
            r#"{"loss": [0.9, 0.5], "accuracy": [0.6, 0.8], "val_loss": [1.0, 0.7]}"#,
        )
        .unwrap();
        assert_eq!(h.epochs(), 2);
        assert_eq!(h.series("accuracy").unwrap(), &[0.6, 0.8]);
        assert_eq!(h.keys().collect::<Vec<_>>(), ["loss", "accuracy", "val_loss"]);
    }

    #[test]
    fn missing_series_is_invalid_input() {
        let h = History::new().with("loss", vec![1.0]);
        assert!(matches!(h.series("val_loss"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn concat_appends_new_run() {
        let a = History::new().with("loss", vec![3.0, 2.0]);
        let b = History::new().with("loss", vec![1.0]);
        assert_eq!(a.concat(&b, "loss").unwrap(), vec![3.0, 2.0, 1.0]);
    }
}
