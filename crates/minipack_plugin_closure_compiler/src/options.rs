use std::{fmt::Display, hash::BuildHasherDefault};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use serde::Deserialize;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

pub const COMPILATION_LEVEL: &str = "compilation_level";
pub const ADVANCED_OPTIMIZATIONS: &str = "ADVANCED_OPTIMIZATIONS";
pub const WARNING_LEVEL: &str = "warning_level";
pub const LANGUAGE_OUT: &str = "language_out";
pub const EXTERNS: &str = "externs";

/// A single compiler flag value, as accepted by the Closure Compiler command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CompileOptionValue {
  Bool(bool),
  Number(i64),
  String(String),
  /// Repeated flags, e.g. several `--externs`.
  List(Vec<String>),
}

impl CompileOptionValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(value) => Some(value),
      _ => None,
    }
  }

  /// Every value this flag carries, one per occurrence on the command line.
  pub fn values(&self) -> Vec<String> {
    match self {
      Self::Bool(value) => vec![value.to_string()],
      Self::Number(value) => vec![value.to_string()],
      Self::String(value) => vec![value.clone()],
      Self::List(values) => values.clone(),
    }
  }
}

impl From<bool> for CompileOptionValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<&str> for CompileOptionValue {
  fn from(value: &str) -> Self {
    Self::String(value.to_string())
  }
}

impl From<String> for CompileOptionValue {
  fn from(value: String) -> Self {
    Self::String(value)
  }
}

impl From<Vec<String>> for CompileOptionValue {
  fn from(value: Vec<String>) -> Self {
    Self::List(value)
  }
}

impl Display for CompileOptionValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.values().join(","))
  }
}

/// Flags forwarded verbatim to the compiler. Insertion order is kept so the command line is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CompileOptions(FxIndexMap<String, CompileOptionValue>);

impl CompileOptions {
  pub fn get(&self, key: &str) -> Option<&CompileOptionValue> {
    self.0.get(key)
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(CompileOptionValue::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn set(
    &mut self,
    key: impl Into<String>,
    value: impl Into<CompileOptionValue>,
  ) -> Option<CompileOptionValue> {
    self.0.insert(key.into(), value.into())
  }

  /// Sets `key` only if the user didn't.
  pub fn set_default(&mut self, key: &str, value: impl Into<CompileOptionValue>) {
    if !self.0.contains_key(key) {
      self.0.insert(key.to_string(), value.into());
    }
  }

  pub fn remove(&mut self, key: &str) -> Option<CompileOptionValue> {
    self.0.shift_remove(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &CompileOptionValue)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn is_advanced(&self) -> bool {
    self.get_str(COMPILATION_LEVEL) == Some(ADVANCED_OPTIMIZATIONS)
  }

  pub fn is_verbose(&self) -> bool {
    self.get_str(WARNING_LEVEL) == Some("VERBOSE")
  }

  /// User supplied externs files, whether given as one path or a list.
  pub fn externs(&self) -> Vec<String> {
    self.get(EXTERNS).map(CompileOptionValue::values).unwrap_or_default()
  }
}

impl<K: Into<String>, V: Into<CompileOptionValue>> FromIterator<(K, V)> for CompileOptions {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterPattern {
  One(String),
  Many(Vec<String>),
}

impl FilterPattern {
  pub fn patterns(&self) -> &[String] {
    match self {
      Self::One(pattern) => std::slice::from_ref(pattern),
      Self::Many(patterns) => patterns,
    }
  }
}

impl From<&str> for FilterPattern {
  fn from(value: &str) -> Self {
    Self::One(value.to_string())
  }
}

impl From<Vec<&str>> for FilterPattern {
  fn from(value: Vec<&str>) -> Self {
    Self::Many(value.into_iter().map(ToString::to_string).collect())
  }
}

/// Options of the plugin. `include` and `exclude` only drive the filter and are never forwarded
/// to the compiler; every other key is a compiler flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClosureCompilerOptions {
  #[serde(default)]
  pub include: Option<FilterPattern>,
  #[serde(default)]
  pub exclude: Option<FilterPattern>,
  #[serde(flatten)]
  pub compile: CompileOptions,
}

impl ClosureCompilerOptions {
  pub fn from_json(json: &str) -> anyhow::Result<Self> {
    Ok(serde_json::from_str(json)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_filter_keys_from_compiler_flags() {
    let options = ClosureCompilerOptions::from_json(
      r#"{
        "include": "src/**",
        "exclude": ["**/*.min.js"],
        "compilation_level": "ADVANCED_OPTIMIZATIONS",
        "assume_function_wrapper": true,
        "externs": ["a.js", "b.js"]
      }"#,
    )
    .unwrap();

    assert_eq!(options.include, Some(FilterPattern::One("src/**".to_string())));
    assert_eq!(
      options.exclude.as_ref().map(FilterPattern::patterns),
      Some(&["**/*.min.js".to_string()][..])
    );
    assert!(!options.compile.contains("include"));
    assert!(!options.compile.contains("exclude"));
    assert!(options.compile.is_advanced());
    assert_eq!(
      options.compile.get("assume_function_wrapper"),
      Some(&CompileOptionValue::Bool(true))
    );
    assert_eq!(options.compile.externs(), vec!["a.js".to_string(), "b.js".to_string()]);
  }

  #[test]
  fn keeps_flag_order() {
    let mut options: CompileOptions =
      [("language_out", "ECMASCRIPT_2015"), ("warning_level", "QUIET")].into_iter().collect();
    options.set_default("language_out", "NO_TRANSPILE");
    options.set_default("module_resolution", "NODE");
    let keys = options.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["language_out", "warning_level", "module_resolution"]);
    assert_eq!(options.get_str("language_out"), Some("ECMASCRIPT_2015"));
  }
}
