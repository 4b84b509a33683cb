//! State-aware Java → Bedrock block descriptor translation. Looks up each
//! Java block name against an externally supplied rename/remap table; this
//! crate embeds no Bedrock block registry of its own.

pub mod entry;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::Value;

pub use entry::{LeafExtra, RemapTarget, TranslationEntry};

use crate::error::Result;
use crate::volume::Palette;

/// Cells that resolve to nothing and are omitted from the emitted command
/// stream, either because they are air or because they are an engine-
/// internal transient state.
const AIR_SET: [&str; 3] = [
    "minecraft:air",
    "minecraft:cave_air",
    "minecraft:void_air",
];
const INVALID_SET: [&str; 3] = [
    "minecraft:piston_head",
    "minecraft:moving_block",
    "minecraft:moving_piston",
];

pub fn load_java_to_bedrock_table(path: &Path) -> Result<HashMap<String, TranslationEntry>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub fn load_legacy_map(path: &Path) -> Result<HashMap<String, String>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.contains(':') {
        lower
    } else {
        format!("minecraft:{lower}")
    }
}

/// Split `name[k1=v1,k2=v2]` into the bare name and its ordered state pairs.
/// State values start out as JSON strings; they may later be replaced by
/// numbers/booleans via `defaults`/`remaps`.
fn parse_descriptor(descriptor: &str) -> (&str, Vec<(String, Value)>) {
    let Some(start) = descriptor.find('[') else {
        return (descriptor, Vec::new());
    };
    let name = &descriptor[..start];
    let end = descriptor.rfind(']').unwrap_or(descriptor.len());
    let inner = &descriptor[start + 1..end];
    let pairs = inner
        .split(',')
        .filter(|p| !p.is_empty())
        .filter_map(|kv| {
            let mut parts = kv.splitn(2, '=');
            let k = parts.next()?.trim();
            let v = parts.next()?.trim();
            if k.is_empty() {
                None
            } else {
                Some((k.to_string(), Value::String(v.to_string())))
            }
        })
        .collect();
    (name, pairs)
}

fn value_lookup_key(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => format!("\"{s}\""),
        other => format!("\"{other}\""),
    }
}

fn apply_remap(target: &RemapTarget, v: &Value) -> Option<Value> {
    match target {
        RemapTarget::List(list) => {
            let idx = match v {
                Value::Number(n) => n.as_u64()? as usize,
                Value::String(s) => s.parse::<usize>().ok()?,
                _ => return None,
            };
            list.get(idx).cloned()
        }
        RemapTarget::Map(map) => map.get(&value_lookup_key(v)).cloned(),
    }
}

/// Walk the nested `mapping` dispatch tree over `identifier` keys, reading
/// each step's selector from the current state. Iterative over a borrowed
/// `&Value`; the tree is loaded once as static data and is a DAG by
/// construction, so no cycle guard is needed.
fn dispatch_mapping(
    root: &Value,
    identifiers: &[String],
    state: &[(String, Value)],
) -> Option<LeafExtra> {
    let mut current = root;
    for key in identifiers {
        let obj = current.as_object()?;
        let selector = state
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| value_lookup_key(v));
        let next = selector
            .as_deref()
            .and_then(|s| obj.get(s))
            .or_else(|| obj.get("def"))?;
        current = next;
    }
    match current {
        Value::String(s) => Some(LeafExtra {
            name: Some(s.clone()),
            ..Default::default()
        }),
        Value::Object(_) => serde_json::from_value(current.clone()).ok(),
        _ => None,
    }
}

/// Per-conversion translator. Owns its [`TranslationCache`]; dropped at the
/// end of the conversion along with everything it memoised. The table and
/// legacy map it reads from are loaded once by the caller and shared
/// read-only across conversions, never a module-level `static`.
pub struct Translator<'a> {
    table: &'a HashMap<String, TranslationEntry>,
    legacy_table: &'a HashMap<String, String>,
    cache: HashMap<u32, Option<String>>,
    legacy_cache: HashMap<String, Option<String>>,
}

impl<'a> Translator<'a> {
    pub fn new(
        table: &'a HashMap<String, TranslationEntry>,
        legacy_table: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            table,
            legacy_table,
            cache: HashMap::new(),
            legacy_cache: HashMap::new(),
        }
    }

    /// Translate the cell at `index` in a modern-dialect palette, memoised
    /// by palette index (cheap under palette aliasing).
    pub fn translate_index(&mut self, palette: &Palette, index: u32) -> Option<String> {
        if let Some(cached) = self.cache.get(&index) {
            return cached.clone();
        }
        let result = palette
            .get(index)
            .and_then(|descriptor| self.translate_descriptor(descriptor));
        self.cache.insert(index, result.clone());
        result
    }

    /// Translate a classic-dialect cell via the `"id:data"` legacy map.
    pub fn translate_legacy(&mut self, legacy_id: u16, legacy_data: u8) -> Option<String> {
        let key = format!("{legacy_id}:{legacy_data}");
        if let Some(cached) = self.legacy_cache.get(&key) {
            return cached.clone();
        }
        let result = self
            .legacy_table
            .get(&key)
            .and_then(|descriptor| self.translate_descriptor(descriptor));
        self.legacy_cache.insert(key, result.clone());
        result
    }

    fn translate_descriptor(&self, java_descriptor: &str) -> Option<String> {
        let (raw_name, mut state) = parse_descriptor(java_descriptor);
        let java_name = normalize_name(raw_name);

        if AIR_SET.contains(&java_name.as_str()) || INVALID_SET.contains(&java_name.as_str()) {
            return None;
        }

        let entry = self.table.get(&java_name).or_else(|| {
            let bare = java_name.strip_prefix("minecraft:").unwrap_or(&java_name);
            self.table.get(bare)
        });

        if let Some(entry) = entry {
            for (k, v) in entry.defaults.iter() {
                if !state.iter().any(|(ek, _)| ek == k) {
                    state.push((k.clone(), v.clone()));
                }
            }
            state.retain(|(k, _)| !entry.removals.iter().any(|r| r == k));
            let tile_drop: HashSet<&str> = entry
                .tile_extra
                .values()
                .flatten()
                .map(String::as_str)
                .collect();
            state.retain(|(k, _)| !tile_drop.contains(k.as_str()));
        }

        let mut bedrock_name: Option<String> = None;
        let mut local = LeafExtra::default();

        if let Some(entry) = entry {
            if let (Some(identifier), Some(mapping)) = (&entry.identifier, &entry.mapping) {
                if let Some(leaf) = dispatch_mapping(mapping, identifier, &state) {
                    bedrock_name = leaf.name.clone();
                    local = leaf;
                }
                state.retain(|(k, _)| !identifier.contains(k));
            }
        }

        if bedrock_name.is_none() {
            bedrock_name = entry.and_then(|e| e.name.clone()).or(Some(java_name.clone()));
        }
        let mut bedrock_name = normalize_name(&bedrock_name.unwrap());

        let mut renames = entry.map(|e| e.renames.clone()).unwrap_or_default();
        for (k, v) in local.renames {
            renames.insert(k, v);
        }
        let mut remaps = entry.map(|e| e.remaps.clone()).unwrap_or_default();
        for (k, v) in local.remaps {
            remaps.insert(k, v);
        }
        let mut additions = entry.map(|e| e.additions.clone()).unwrap_or_default();
        for (k, v) in local.additions {
            additions.insert(k, v);
        }
        state.retain(|(k, _)| !local.removals.iter().any(|r| r == k));

        let mut pairs: Vec<String> = Vec::with_capacity(state.len() + additions.len());
        for (k, v) in &state {
            let renamed = renames
                .get(k)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| k.clone());
            let value = remaps
                .get(&renamed)
                .or_else(|| remaps.get(k))
                .and_then(|target| apply_remap(target, v))
                .unwrap_or_else(|| v.clone());
            pairs.push(format!("\"{renamed}\"={}", format_value(&value)));
        }
        for (k, v) in additions.iter() {
            pairs.push(format!("\"{k}\"={}", format_value(v)));
        }

        if !pairs.is_empty() {
            bedrock_name = format!("{bedrock_name}[{}]", pairs.join(","));
        }

        let bare_name = bedrock_name.split('[').next().unwrap_or(&bedrock_name);
        if AIR_SET.contains(&bare_name) || INVALID_SET.contains(&bare_name) {
            return None;
        }

        Some(
            bedrock_name
                .strip_prefix("minecraft:")
                .unwrap_or(&bedrock_name)
                .to_string(),
        )
    }
}
