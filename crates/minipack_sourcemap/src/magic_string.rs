use oxc_sourcemap::SourceMap;
use string_wizard::SourceMapOptions;

pub use string_wizard::MagicString;

/// Generates a hi-res map from the edits recorded in `magic_string`, with `source` as the only
/// source.
pub fn magic_string_to_sourcemap(magic_string: &MagicString<'_>, source: &str) -> SourceMap {
  magic_string.source_map(SourceMapOptions {
    include_content: true,
    source: source.into(),
    ..SourceMapOptions::default()
  })
}

#[test]
fn test_magic_string_to_sourcemap() {
  let mut magic_string = MagicString::new("#!/usr/bin/env node\nconsole.log(1);\n");
  magic_string.remove(0, 20);
  assert_eq!(magic_string.to_string(), "console.log(1);\n");

  let map = magic_string_to_sourcemap(&magic_string, "bin.js");
  assert!(map.get_source(0).is_some());
}
