use minipack_sourcemap::MagicString;
use xxhash_rust::xxh3::xxh3_64;

use super::{SourceTransform, SourceUnit};
use crate::{context::PipelineContext, mangle::EXPORTS_SCOPE, memory::Phase};

pub fn exports_key(id: &str) -> String {
  format!("exports:{id}")
}

/// Records what each module exports and settles the bridge names of those exports up front, so
/// every chunk of the build agrees on them regardless of render order.
pub struct ExportScanTransform;

impl SourceTransform for ExportScanTransform {
  fn name(&self) -> &'static str {
    "ExportScanTransform"
  }

  fn transform(
    &self,
    ctx: &PipelineContext,
    unit: &SourceUnit<'_>,
    _edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()> {
    // Identical sources (e.g. duplicated vendored files) share one scan.
    let scan_key = format!("export-scan:{:016x}", xxh3_64(unit.code.as_bytes()));
    let exported =
      ctx.memory.get_or_insert_with(scan_key, Phase::Source, || unit.syntax.exported_names());

    for name in exported.iter() {
      ctx.mangler.resolve(name, EXPORTS_SCOPE);
    }
    ctx.memory.set(exports_key(unit.id), exported.as_ref().clone(), Phase::Source);
    Ok(())
  }

  /// The content-keyed scan and the bridge names stay, they do not depend on the module's fate.
  fn discard(&self, ctx: &PipelineContext, id: &str) {
    ctx.memory.remove(&exports_key(id));
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::{
    ast::{parse_module, source_type_for},
    options::CompileOptions,
  };

  fn scan(ctx: &PipelineContext, id: &str, code: &str) {
    let syntax = parse_module(code, source_type_for(id)).unwrap();
    let unit = SourceUnit { id, code, syntax: &syntax };
    let mut edit = MagicString::new(code);
    ExportScanTransform.transform(ctx, &unit, &mut edit).unwrap();
    assert_eq!(edit.to_string(), code);
  }

  #[test]
  fn records_exports_and_bridge_names() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    scan(&ctx, "/src/a.js", "export const foo = 1;\nexport default foo;\n");
    scan(&ctx, "/src/b.js", "export function bar() {}\n");

    assert_eq!(
      ctx.memory.get::<Vec<String>>(&exports_key("/src/a.js")).as_deref(),
      Some(&vec!["foo".to_string(), "default".to_string()])
    );
    assert_eq!(ctx.mangler.original("a", EXPORTS_SCOPE).as_deref(), Some("foo"));
    assert_eq!(ctx.mangler.original("b", EXPORTS_SCOPE).as_deref(), Some("default"));
    assert_eq!(ctx.mangler.original("c", EXPORTS_SCOPE).as_deref(), Some("bar"));
  }

  #[test]
  fn identical_sources_share_a_scan() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    scan(&ctx, "/vendor/a/lib.js", "export const x = 1;\n");
    scan(&ctx, "/vendor/b/lib.js", "export const x = 1;\n");
    // One scan record plus one exports record per module.
    assert_eq!(ctx.memory.len(), 3);
    assert!(ctx.memory.contains(&exports_key("/vendor/b/lib.js")));
  }
}
