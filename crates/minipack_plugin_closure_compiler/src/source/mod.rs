mod export_scan;
mod hashbang;

use anyhow::Context;
use minipack_error::{FailureStage, StageExt, TransformFailure};
use minipack_plugin::HookTransformOutput;
use minipack_sourcemap::{MagicString, magic_string_to_sourcemap};

pub use self::{
  export_scan::{ExportScanTransform, exports_key},
  hashbang::{HashbangRemoveTransform, hashbang_key},
};
use crate::{
  ast::{ModuleSyntax, parse_module, source_type_for},
  context::PipelineContext,
  outcome::TransformOutcome,
};

/// The module a source transform works on. `syntax` describes `code`, not the edited text.
#[derive(Debug)]
pub struct SourceUnit<'a> {
  pub id: &'a str,
  pub code: &'a str,
  pub syntax: &'a ModuleSyntax,
}

/// A rewrite pass applied to every included module before bundling.
pub trait SourceTransform: Send + Sync {
  fn name(&self) -> &'static str;

  fn transform(
    &self,
    ctx: &PipelineContext,
    unit: &SourceUnit<'_>,
    edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()>;

  /// Drops the Memory records `transform` wrote for module `id`. Called when the module ends up
  /// untouched because a transform failed.
  fn discard(&self, _ctx: &PipelineContext, _id: &str) {}
}

pub type SourceTransforms = Vec<Box<dyn SourceTransform>>;

/// Source transforms in execution order.
pub fn create() -> SourceTransforms {
  vec![Box::new(HashbangRemoveTransform), Box::new(ExportScanTransform)]
}

/// Runs every transform over one module.
///
/// A module that fails to parse, or whose transform fails, is left as it was, and so is the
/// per-module state in Memory.
#[tracing::instrument(level = "debug", skip_all, fields(id = id))]
pub fn transform(
  ctx: &PipelineContext,
  code: &str,
  id: &str,
  transforms: &[Box<dyn SourceTransform>],
) -> TransformOutcome<HookTransformOutput> {
  apply(ctx, code, id, transforms).into()
}

fn apply(
  ctx: &PipelineContext,
  code: &str,
  id: &str,
  transforms: &[Box<dyn SourceTransform>],
) -> Result<Option<HookTransformOutput>, TransformFailure> {
  if transforms.is_empty() {
    return Ok(None);
  }

  let syntax = parse_module(code, source_type_for(id)).at_stage(FailureStage::Parse)?;
  let unit = SourceUnit { id, code, syntax: &syntax };

  let mut edit = MagicString::new(code);
  for (index, transform) in transforms.iter().enumerate() {
    let result = transform
      .transform(ctx, &unit, &mut edit)
      .with_context(|| format!("{} failed", transform.name()));
    if result.is_err() {
      for ran in transforms[..=index].iter().rev() {
        ran.discard(ctx, id);
      }
    }
    result.at_stage(FailureStage::SourceTransform)?;
  }

  let transformed = edit.to_string();
  if transformed == code {
    return Ok(None);
  }
  let map = magic_string_to_sourcemap(&edit, id);
  Ok(Some(HookTransformOutput { code: transformed, map: Some(map) }))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn context() -> PipelineContext {
    PipelineContext::for_test(crate::options::CompileOptions::default())
  }

  struct Throwing;

  impl SourceTransform for Throwing {
    fn name(&self) -> &'static str {
      "throwing"
    }

    fn transform(
      &self,
      _ctx: &PipelineContext,
      _unit: &SourceUnit<'_>,
      edit: &mut MagicString<'_>,
    ) -> anyhow::Result<()> {
      edit.prepend("/* half done */");
      anyhow::bail!("boom")
    }
  }

  #[test]
  fn untouched_module_is_unchanged() {
    let ctx = context();
    let outcome = transform(&ctx, "export const a = 1;\n", "/src/a.js", &create());
    assert!(outcome.is_unchanged());
    assert!(ctx.memory.get::<Vec<String>>("exports:/src/a.js").is_some());
  }

  #[test]
  fn failing_transform_is_tagged_with_its_stage() {
    let ctx = context();
    let transforms: SourceTransforms = vec![Box::new(HashbangRemoveTransform), Box::new(Throwing)];
    let outcome = transform(&ctx, "#!/usr/bin/env node\nrun();\n", "/src/cli.js", &transforms);
    let TransformOutcome::Failed(failure) = outcome else {
      panic!("expected a failure");
    };
    assert_eq!(failure.stage, FailureStage::SourceTransform);
    assert!(failure.error.to_string().contains("throwing failed"));
  }

  #[test]
  fn failing_transform_drops_records_of_earlier_transforms() {
    let ctx = context();
    let transforms: SourceTransforms = vec![
      Box::new(HashbangRemoveTransform),
      Box::new(ExportScanTransform),
      Box::new(Throwing),
    ];
    let code = "#!/usr/bin/env node\nexport const run = 1;\n";
    let outcome = transform(&ctx, code, "/src/cli.js", &transforms);
    assert!(outcome.is_failed());
    assert!(outcome.into_output("/src/cli.js").is_none());
    assert!(!ctx.memory.contains(&hashbang_key("/src/cli.js")));
    assert!(!ctx.memory.contains(&exports_key("/src/cli.js")));
  }

  #[test]
  fn parse_error_is_reported_as_parse_failure() {
    let ctx = context();
    let outcome = transform(&ctx, "let = ;", "/src/broken.js", &create());
    assert!(matches!(
      outcome,
      TransformOutcome::Failed(failure) if failure.stage == FailureStage::Parse
    ));
  }

  #[test]
  fn hashbang_is_stripped_with_a_map() {
    let ctx = context();
    let outcome = transform(&ctx, "#!/usr/bin/env node\nrun();\n", "/src/cli.js", &create());
    let TransformOutcome::Transformed(output) = outcome else {
      panic!("expected a transformed module");
    };
    assert_eq!(output.code, "\nrun();\n");
    assert!(output.map.is_some());
  }
}
