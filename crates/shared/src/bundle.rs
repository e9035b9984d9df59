//! Flat key/primitive map used to carry controller state across process restarts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BundleError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleValue {
    Int(i64),
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    values: BTreeMap<String, BundleValue>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<BundleValue> {
        self.values.remove(key)
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), BundleValue::Int(value));
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), BundleValue::Bool(value));
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), BundleValue::Str(value.into()));
    }

    pub fn put_string_list(&mut self, key: impl Into<String>, value: Vec<String>) {
        self.values.insert(key.into(), BundleValue::StrList(value));
    }

    // Getters treat a value of the wrong kind the same as a missing key.

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            BundleValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            BundleValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            BundleValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_string_list(&self, key: &str) -> Option<&[String]> {
        match self.values.get(key)? {
            BundleValue::StrList(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        serde_json::to_string(self).map_err(BundleError::Encode)
    }

    pub fn from_json(raw: &str) -> Result<Self, BundleError> {
        serde_json::from_str(raw).map_err(BundleError::Decode)
    }
}
