use std::fmt::Display;

use serde::Deserialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Esm,
  Cjs,
  Iife,
}

impl OutputFormat {
  #[inline]
  pub fn is_esm(&self) -> bool {
    matches!(self, Self::Esm)
  }
}

impl Display for OutputFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Esm => write!(f, "esm"),
      Self::Cjs => write!(f, "cjs"),
      Self::Iife => write!(f, "iife"),
    }
  }
}

#[test]
fn test_output_format_deserialize() {
  let format: OutputFormat = serde_json::from_str("\"iife\"").unwrap();
  assert_eq!(format, OutputFormat::Iife);
  assert_eq!(format.to_string(), "iife");
}
