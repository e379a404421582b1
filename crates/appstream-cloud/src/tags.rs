//! Resource tag handling
//!
//! Computes what has to be untagged and (re)tagged to move a resource from
//! its remote tag set to the declared one. Keys under the `aws:` prefix are
//! owned by AWS and never pushed or removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix reserved for AWS-managed tags
pub const AWS_TAG_KEY_PREFIX: &str = "aws:";

/// Key/value tags of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Tags of `self` overridden by `other`
    pub fn merge(&self, other: &Tags) -> Tags {
        let mut result = self.clone();
        for (k, v) in &other.0 {
            result.0.insert(k.clone(), v.clone());
        }
        result
    }

    /// Tags present in `self` but absent from `new`
    pub fn removed(&self, new: &Tags) -> Tags {
        Tags(
            self.0
                .iter()
                .filter(|(k, _)| !new.0.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Tags of `new` that are missing from `self` or carry a different value
    pub fn updated(&self, new: &Tags) -> Tags {
        Tags(
            new.0
                .iter()
                .filter(|(k, v)| self.0.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Drop AWS-managed keys
    pub fn ignore_aws(&self) -> Tags {
        Tags(
            self.0
                .iter()
                .filter(|(k, _)| !k.starts_with(AWS_TAG_KEY_PREFIX))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for Tags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Tags(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Changes needed to go from one tag set to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Keys to untag
    pub remove: Vec<String>,

    /// Tags to add or overwrite
    pub upsert: Tags,
}

impl TagDiff {
    pub fn between(old: &Tags, new: &Tags) -> Self {
        Self {
            remove: old.removed(new).ignore_aws().keys(),
            upsert: old.updated(new).ignore_aws(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.upsert.is_empty()
    }
}
