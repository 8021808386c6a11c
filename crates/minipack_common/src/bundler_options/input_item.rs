use std::borrow::Cow;

use serde::Deserialize;

/// One entry of `input`. A named entry decides the name of the entry chunk.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InputItem {
  pub name: Option<String>,
  pub import: String,
}

impl From<&str> for InputItem {
  fn from(value: &str) -> Self {
    Self { name: None, import: value.to_string() }
  }
}

impl From<String> for InputItem {
  fn from(value: String) -> Self {
    Self { name: None, import: value }
  }
}

impl From<Cow<'_, str>> for InputItem {
  fn from(value: Cow<'_, str>) -> Self {
    Self { name: None, import: value.into_owned() }
  }
}
