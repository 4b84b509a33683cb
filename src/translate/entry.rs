//! JSON shape of the `java-to-bedrock` translation table: a Java block
//! name maps to a `TranslationEntry`. Deserialized with `serde_json`'s
//! order-preserving map so that `defaults`/`renames`/`additions` iterate
//! in file order, which keeps output byte-identical across runs of the
//! same input.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TranslationEntry {
    pub name: Option<String>,
    pub identifier: Option<Vec<String>>,
    pub mapping: Option<Value>,
    #[serde(default)]
    pub defaults: Map<String, Value>,
    #[serde(default)]
    pub removals: Vec<String>,
    #[serde(default)]
    pub renames: Map<String, Value>,
    #[serde(default)]
    pub remaps: HashMap<String, RemapTarget>,
    #[serde(default)]
    pub additions: Map<String, Value>,
    #[serde(default)]
    pub tile_extra: HashMap<String, Vec<String>>,
}

/// A `remaps` entry: numeric-indexed list, or string-keyed mapping.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum RemapTarget {
    List(Vec<Value>),
    Map(Map<String, Value>),
}

/// Shape of a mapping-tree leaf once it is an object rather than a bare
/// Bedrock name string. Fields here *extend* (never replace) the owning
/// entry's same-named collections; see [`super::Translator`].
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LeafExtra {
    pub name: Option<String>,
    #[serde(default)]
    pub additions: Map<String, Value>,
    #[serde(default)]
    pub removals: Vec<String>,
    #[serde(default)]
    pub renames: Map<String, Value>,
    #[serde(default)]
    pub remaps: HashMap<String, RemapTarget>,
}
