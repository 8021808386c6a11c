mod magic_string;

pub use crate::magic_string::{MagicString, magic_string_to_sourcemap};
pub use oxc_sourcemap::SourceMap;

/// Parses a source map artifact written by an external tool.
pub fn parse_sourcemap(json: &str) -> anyhow::Result<SourceMap> {
  SourceMap::from_json_string(json)
    .map_err(|err| anyhow::anyhow!("Invalid source map: {err:?}"))
}

#[test]
fn test_parse_sourcemap() {
  let map = parse_sourcemap(
    r#"{"version":3,"sources":["main.js"],"names":[],"mappings":"AAAA"}"#,
  );
  assert!(map.is_ok());
  assert!(parse_sourcemap("{ not json").is_err());
}
