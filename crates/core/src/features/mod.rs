pub mod builder;
pub mod team_form;

use serde::Serialize;
use std::collections::BTreeMap;

/// Value used for any feature a model expects but the builder did not produce.
pub const MISSING_FEATURE_VALUE: f64 = 0.0;

/// Named features for one matchup. Built per request and dropped after scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite values are skipped so they fall back to the default fill.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.values.insert(name.into(), value);
        }
    }

    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<f64>) {
        if let Some(v) = value {
            self.insert(name, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Lays the features out in `feature_names` order, filling gaps with
    /// [`MISSING_FEATURE_VALUE`].
    pub fn to_model_input(&self, feature_names: &[String]) -> Vec<f64> {
        feature_names
            .iter()
            .map(|name| self.get(name).unwrap_or(MISSING_FEATURE_VALUE))
            .collect()
    }

    /// Names from `feature_names` this vector cannot supply.
    pub fn missing<'a>(&self, feature_names: &'a [String]) -> Vec<&'a str> {
        feature_names
            .iter()
            .filter(|name| !self.values.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}
