mod exports;
mod hashbang;
mod imports;
mod strict;

use anyhow::Context;
use itertools::Itertools;
use minipack_common::RenderedChunk;
use minipack_sourcemap::MagicString;
use oxc::span::SourceType;

pub use self::{
  exports::ExportTransform, hashbang::HashbangApplyTransform, imports::ImportTransform,
  strict::StrictTransform,
};
use crate::{
  ast::{ModuleSyntax, parse_module},
  context::PipelineContext,
};

/// The linked chunk a transform sees before compilation.
#[derive(Debug)]
pub struct ChunkUnit<'a> {
  pub chunk: &'a RenderedChunk,
  pub code: &'a str,
  pub syntax: &'a ModuleSyntax,
}

/// A pass over one rendered chunk, split around the compiler call.
///
/// A fresh list is created for every chunk, so transforms may keep what they saw before
/// compilation and use it to repair the compiler output.
pub trait ChunkTransform: Send + Sync {
  fn name(&self) -> &'static str;

  /// Externs declarations this transform needs during compilation.
  fn externs(&self) -> Vec<String> {
    vec![]
  }

  fn pre_compilation(
    &mut self,
    _ctx: &PipelineContext,
    _unit: &ChunkUnit<'_>,
    _edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()> {
    Ok(())
  }

  fn post_compilation(
    &self,
    _ctx: &PipelineContext,
    _chunk: &RenderedChunk,
    code: String,
  ) -> anyhow::Result<String> {
    Ok(code)
  }
}

pub type ChunkTransforms = Vec<Box<dyn ChunkTransform>>;

/// Chunk transforms in execution order. Module syntax is only handled for `esm` output.
///
/// `StrictTransform` goes first: it only looks at the directive prologue, which restored imports
/// would push out of place.
pub fn create(ctx: &PipelineContext) -> ChunkTransforms {
  let mut transforms: ChunkTransforms = vec![Box::new(StrictTransform)];
  if ctx.output_options().format.is_esm() {
    transforms.push(Box::<ImportTransform>::default());
    transforms.push(Box::<ExportTransform>::default());
  }
  transforms.push(Box::new(HashbangApplyTransform));
  transforms
}

pub fn source_type(ctx: &PipelineContext) -> SourceType {
  SourceType::mjs().with_module(ctx.output_options().format.is_esm())
}

/// Lets every transform rewrite the linked chunk into something the compiler accepts.
#[tracing::instrument(level = "debug", skip_all, fields(chunk = %chunk.file_name))]
pub fn pre_compilation(
  ctx: &PipelineContext,
  chunk: &RenderedChunk,
  code: &str,
  transforms: &mut [Box<dyn ChunkTransform>],
) -> anyhow::Result<String> {
  let syntax = parse_module(code, source_type(ctx))?;
  let unit = ChunkUnit { chunk, code, syntax: &syntax };

  let mut edit = MagicString::new(code);
  for transform in transforms {
    transform
      .pre_compilation(ctx, &unit, &mut edit)
      .with_context(|| format!("{} failed before compilation", transform.name()))?;
  }
  Ok(edit.to_string())
}

/// Repairs the compiler output. Every transform sees the text left by the previous one.
#[tracing::instrument(level = "debug", skip_all, fields(chunk = %chunk.file_name))]
pub fn post_compilation(
  ctx: &PipelineContext,
  chunk: &RenderedChunk,
  code: String,
  transforms: &[Box<dyn ChunkTransform>],
) -> anyhow::Result<String> {
  transforms.iter().try_fold(code, |code, transform| {
    transform
      .post_compilation(ctx, chunk, code)
      .with_context(|| format!("{} failed after compilation", transform.name()))
  })
}

/// Contents of the generated externs file, empty when no transform needs one.
pub fn externs(transforms: &[Box<dyn ChunkTransform>]) -> String {
  transforms.iter().flat_map(|transform| transform.externs()).unique().join("\n")
}

#[cfg(test)]
mod tests {
  use minipack_common::{OutputFormat, OutputOptions};
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::{
    memory::Phase,
    options::CompileOptions,
    source::{ExportScanTransform, HashbangRemoveTransform, SourceTransforms},
  };

  fn esm_context() -> PipelineContext {
    PipelineContext::for_test(CompileOptions::default())
      .with_output_options(OutputOptions::default())
  }

  #[test]
  fn transform_list_follows_the_output_format() {
    let names =
      |ctx: &PipelineContext| create(ctx).iter().map(|t| t.name()).collect::<Vec<_>>();
    assert_eq!(
      names(&esm_context()),
      vec!["StrictTransform", "ImportTransform", "ExportTransform", "HashbangApplyTransform"]
    );
    let cjs = esm_context().with_output_options(OutputOptions { format: OutputFormat::Cjs });
    assert_eq!(names(&cjs), vec!["StrictTransform", "HashbangApplyTransform"]);
  }

  #[test]
  fn round_trips_an_esm_chunk_through_an_identity_compiler() {
    let ctx = esm_context();
    let module = concat!(
      "#!/usr/bin/env node\n",
      "import { readFile } from 'node:fs';\n",
      "export const run = () => readFile;\n",
    );
    let source_transforms: SourceTransforms =
      vec![Box::new(HashbangRemoveTransform), Box::new(ExportScanTransform)];
    let stripped = crate::source::transform(&ctx, module, "/src/cli.js", &source_transforms)
      .into_output("/src/cli.js")
      .unwrap()
      .code;

    let chunk = RenderedChunk::new("cli", "cli.js").with_facade_module("/src/cli.js");
    let mut transforms = create(&ctx);
    let pre = pre_compilation(&ctx, &chunk, &stripped, &mut transforms).unwrap();
    assert!(!pre.contains("import"));
    assert!(!pre.contains("export"));
    assert!(pre.contains("window[\"a\"] = run;"));
    assert_eq!(externs(&transforms), "var readFile;");

    let post = post_compilation(&ctx, &chunk, pre, &transforms).unwrap();
    assert!(post.starts_with("#!/usr/bin/env node\nimport { readFile } from 'node:fs';\n"));
    assert!(post.trim_end().ends_with("export { run };"));
    assert!(!post.contains("window"));
    assert_eq!(ctx.memory.phase("hashbang:/src/cli.js"), Some(Phase::Source));
  }

  #[test]
  fn use_strict_is_dropped_before_imports_are_restored() {
    let ctx = esm_context();
    let chunk = RenderedChunk::new("main", "main.js");
    let mut transforms = create(&ctx);
    let code = "import { x } from './x.js';\nconsole.log(x);\n";
    let pre = pre_compilation(&ctx, &chunk, code, &mut transforms).unwrap();

    let compiled = format!("'use strict';{pre}");
    let post = post_compilation(&ctx, &chunk, compiled, &transforms).unwrap();
    assert!(!post.contains("use strict"));
    assert!(post.starts_with("import { x } from './x.js';\n"));
    assert!(post.contains("console.log(x);"));
  }

  #[test]
  fn pre_compilation_rejects_unparseable_chunks() {
    let ctx = esm_context();
    let chunk = RenderedChunk::new("main", "main.js");
    let mut transforms = create(&ctx);
    assert!(pre_compilation(&ctx, &chunk, "export const = 1;", &mut transforms).is_err());
  }
}
