//! State-merge engine.
//!
//! Copies a well-defined subset of fields from a source onto a target,
//! governed by include/exclude filters, the target's permanent exclusion
//! set, and an optional final overwrite pass.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::ArgMatches;
use serde_json::Value;

use crate::state::{FieldMap, Fields, RESERVED_FIELDS};

/// Reserved name recording which subcommand label was invoked.
pub const SUBCOMMAND_FIELD: &str = "subcommand";

/// Shapes a merge operation can read from.
///
/// The union is closed: an unsupported source shape is unrepresentable, so
/// there is no runtime "unsupported type" failure mode.
pub enum MergeSource<'a> {
    /// Contributes nothing.
    Empty,
    /// A plain mapping; entries are visited in insertion order.
    Map(&'a FieldMap),
    /// A parsed argument bag, flattened across subcommand levels.
    Args(&'a ArgMatches),
    /// Another task: its free-form state entries, then its declared fields.
    Task(&'a dyn Fields),
    /// A task result: its declared fields.
    TaskResult(&'a dyn Fields),
}

impl MergeSource<'_> {
    /// Extract ordered name-value pairs according to the source shape.
    pub fn pairs(&self) -> Vec<(String, Value)> {
        match self {
            MergeSource::Empty => Vec::new(),
            MergeSource::Map(map) => {
                map.iter().map(|(name, value)| (name.clone(), value.clone())).collect()
            }
            MergeSource::Args(matches) => pairs_from_matches(matches),
            MergeSource::Task(task) => {
                let mut pairs: Vec<(String, Value)> = task
                    .state()
                    .map(|state| state.iter().map(|(n, v)| (n.clone(), v.clone())).collect())
                    .unwrap_or_default();
                pairs.extend(declared_pairs(*task));
                pairs
            }
            MergeSource::TaskResult(result) => declared_pairs(*result),
        }
    }
}

/// Name-value pairs of the declared field table.
fn declared_pairs(fields: &dyn Fields) -> Vec<(String, Value)> {
    fields
        .field_names()
        .iter()
        .copied()
        .filter_map(|name| fields.field(name).map(|value| (name.to_string(), value)))
        .collect()
}

/// Flatten an argument bag into name-value pairs.
///
/// Every present argument is included, defaulted ones too, matching what a
/// parsed namespace carries. Nested subcommand levels are appended after
/// their parent, each prefixed with the invoked label under the reserved
/// [`SUBCOMMAND_FIELD`] name, so the deepest level wins on conflicts.
fn pairs_from_matches(matches: &ArgMatches) -> Vec<(String, Value)> {
    let mut pairs = Vec::new();
    for id in matches.ids() {
        let name = id.as_str();
        if let Some(value) = arg_value(matches, name) {
            pairs.push((name.to_string(), value));
        }
    }
    if let Some((name, nested)) = matches.subcommand() {
        pairs.push((SUBCOMMAND_FIELD.to_string(), Value::String(name.to_string())));
        pairs.extend(pairs_from_matches(nested));
    }
    pairs
}

/// Read a single argument out of the bag as a dynamic value.
///
/// Arguments keep their parsed types inside the bag, so the supported
/// scalar shapes are probed in turn. Values outside this set are skipped
/// with a warning rather than failing the merge.
fn arg_value(matches: &ArgMatches, name: &str) -> Option<Value> {
    if let Ok(Some(values)) = matches.try_get_many::<String>(name) {
        let mut values: Vec<Value> = values.map(|v| Value::String(v.clone())).collect();
        if values.len() == 1 {
            return Some(values.remove(0));
        }
        return Some(Value::Array(values));
    }
    if let Ok(Some(value)) = matches.try_get_one::<bool>(name) {
        return Some(Value::Bool(*value));
    }
    if let Ok(Some(value)) = matches.try_get_one::<i64>(name) {
        return Some(Value::from(*value));
    }
    if let Ok(Some(value)) = matches.try_get_one::<u64>(name) {
        return Some(Value::from(*value));
    }
    if let Ok(Some(value)) = matches.try_get_one::<u8>(name) {
        return Some(Value::from(u64::from(*value)));
    }
    if let Ok(Some(value)) = matches.try_get_one::<f64>(name) {
        return Some(Value::from(*value));
    }
    if let Ok(Some(value)) = matches.try_get_one::<PathBuf>(name) {
        return Some(Value::String(value.display().to_string()));
    }
    tracing::warn!(argument = name, "unsupported argument value type; not merged");
    None
}

/// Filtering and overwrite controls for a merge operation.
#[derive(Debug, Default, Clone)]
pub struct MergeOptions {
    include: Option<HashSet<String>>,
    exclude: Option<HashSet<String>>,
    overwrite: Option<FieldMap>,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only merge these names. Ignored whenever `exclude` is non-empty.
    pub fn include<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Never merge these names. Unioned with the target's permanent
    /// exclusions.
    pub fn exclude<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Force these values after the main pass, bypassing all filters.
    pub fn overwrite<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.overwrite = Some(values.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }
}

/// Copy fields from `source` onto `target`.
///
/// When both `exclude` and `include` are given, `exclude` takes priority
/// and `include` is ignored for the whole call. The target's permanent
/// exclusions always join the effective exclude set, forcing filtered-mode
/// evaluation even when the caller passed neither filter. The overwrite
/// map is applied unconditionally, last.
pub fn merge_object(target: &mut dyn Fields, source: MergeSource<'_>, options: &MergeOptions) {
    let pairs = source.pairs();

    let include_given = options.include.as_ref().is_some_and(|set| !set.is_empty());
    let exclude_given = options.exclude.as_ref().is_some_and(|set| !set.is_empty());

    // Exclude takes precedence: a non-empty exclude discards include entirely.
    let include =
        if include_given && !exclude_given { options.include.as_ref() } else { None };

    let mut exclude: HashSet<&str> = options
        .exclude
        .iter()
        .flat_map(|set| set.iter().map(String::as_str))
        .collect();
    exclude.extend(target.merge_exclusions().iter().copied());

    let filtered = include.is_some() || !exclude.is_empty();

    for (name, value) in pairs {
        let allowed = !filtered
            || (!exclude.contains(name.as_str())
                && include.map_or(true, |set| set.contains(name.as_str())));
        if allowed {
            apply(target, &name, value);
        }
    }

    if let Some(overwrite) = &options.overwrite {
        for (name, value) in overwrite {
            apply(target, name, value.clone());
        }
    }
}

/// Set a recognized field, or route an undeclared name into the target's
/// free-form state when it has one. Reserved names never take the
/// free-form path.
fn apply(target: &mut dyn Fields, name: &str, value: Value) {
    if target.field_names().iter().any(|declared| *declared == name) {
        target.set_field(name, value);
        return;
    }
    if RESERVED_FIELDS.iter().any(|reserved| *reserved == name) {
        return;
    }
    if let Some(state) = target.state_mut() {
        state.insert(name.to_string(), value);
    }
}
