use std::sync::Arc;

use anyhow::{bail, ensure};
use tempfile::TempPath;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
  chunk::{self, ChunkTransform},
  context::PipelineContext,
  memory::{Memory, Phase},
  options::{CompileOptions, EXTERNS, LANGUAGE_OUT, WARNING_LEVEL},
};

pub const JS: &str = "js";
pub const CREATE_SOURCE_MAP: &str = "create_source_map";
pub const ASSUME_FUNCTION_WRAPPER: &str = "assume_function_wrapper";
pub const MODULE_RESOLUTION: &str = "module_resolution";

const NO_TRANSPILE: &str = "NO_TRANSPILE";

/// Everything one compiler run needs. The temp files live as long as this value.
#[derive(Debug)]
pub struct AssembledOptions {
  pub flags: CompileOptions,
  /// Where the compiler writes its source map.
  pub source_map: TempPath,
  _js: TempPath,
  _externs: Option<Arc<TempPath>>,
}

/// `VERBOSE` warnings fail the compilation, so the transpilation target has to be explicit.
pub fn validate(requested: &CompileOptions) -> anyhow::Result<()> {
  if !requested.is_verbose() {
    return Ok(());
  }
  match requested.get_str(LANGUAGE_OUT) {
    None => bail!("`{WARNING_LEVEL}: VERBOSE` requires `{LANGUAGE_OUT}` to be set"),
    Some(language_out) => {
      ensure!(
        language_out != NO_TRANSPILE,
        "`{WARNING_LEVEL}: VERBOSE` can't be combined with `{LANGUAGE_OUT}: {NO_TRANSPILE}`"
      );
      Ok(())
    }
  }
}

/// Merges the requested flags with the derived ones for compiling `code`.
///
/// User flags always win over defaults. Externs contributed by `transforms` are appended to the
/// user's externs.
#[tracing::instrument(level = "debug", skip_all)]
pub async fn assemble(
  ctx: &PipelineContext,
  code: &str,
  transforms: &[Box<dyn ChunkTransform>],
) -> anyhow::Result<AssembledOptions> {
  let requested = ctx.compile_options.as_ref();
  validate(requested)?;

  let mut flags = requested.clone();
  flags.set_default(LANGUAGE_OUT, NO_TRANSPILE);
  flags.set_default(ASSUME_FUNCTION_WRAPPER, ctx.output_options().format.is_esm());
  flags.set_default(WARNING_LEVEL, "QUIET");
  flags.set_default(MODULE_RESOLUTION, "NODE");

  let mut externs = requested.externs();
  let generated = chunk::externs(transforms);
  let externs_file = if generated.is_empty() {
    None
  } else {
    let file = externs_file(&ctx.memory, &generated).await?;
    externs.push(file.to_string_lossy().into_owned());
    Some(file)
  };
  if !externs.is_empty() {
    flags.set(EXTERNS, externs);
  }

  let js = write_temp_file(".js", code).await?;
  flags.set(JS, js.to_string_lossy().into_owned());
  let source_map = temp_path(".map")?;
  flags.set(CREATE_SOURCE_MAP, source_map.to_string_lossy().into_owned());

  tracing::debug!(flags = flags.len(), "assembled compiler options");
  Ok(AssembledOptions { flags, source_map, _js: js, _externs: externs_file })
}

/// Identical externs are written once per build and shared by every chunk that needs them.
async fn externs_file(memory: &Memory, contents: &str) -> anyhow::Result<Arc<TempPath>> {
  let key = format!("externs:{:016x}", xxh3_64(contents.as_bytes()));
  if let Some(file) = memory.get::<TempPath>(&key) {
    return Ok(file);
  }
  let file = write_temp_file(".js", contents).await?;
  Ok(memory.get_or_insert_with(key, Phase::Chunk, || file))
}

fn temp_path(suffix: &str) -> anyhow::Result<TempPath> {
  let file = tempfile::Builder::new().prefix("closure-compiler-").suffix(suffix).tempfile()?;
  Ok(file.into_temp_path())
}

async fn write_temp_file(suffix: &str, contents: &str) -> anyhow::Result<TempPath> {
  let path = temp_path(suffix)?;
  tokio::fs::write(&path, contents).await?;
  Ok(path)
}

#[cfg(test)]
mod tests {
  use minipack_common::{OutputFormat, OutputOptions};
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::options::CompileOptionValue;

  fn context(flags: &[(&str, &str)], format: OutputFormat) -> PipelineContext {
    PipelineContext::for_test(flags.iter().copied().collect())
      .with_output_options(OutputOptions { format })
  }

  #[test]
  fn verbose_needs_an_explicit_language_out() {
    let verbose = |language_out: Option<&str>| {
      let mut flags: CompileOptions = [(WARNING_LEVEL, "VERBOSE")].into_iter().collect();
      if let Some(language_out) = language_out {
        flags.set(LANGUAGE_OUT, language_out);
      }
      validate(&flags)
    };
    assert!(verbose(None).is_err());
    assert!(verbose(Some(NO_TRANSPILE)).is_err());
    assert!(verbose(Some("ECMASCRIPT_2017")).is_ok());
    assert!(validate(&CompileOptions::default()).is_ok());
  }

  #[tokio::test]
  async fn fills_defaults_without_overriding_user_flags() {
    let ctx = context(&[(LANGUAGE_OUT, "ECMASCRIPT_2015")], OutputFormat::Esm);
    let assembled = assemble(&ctx, "console.log(1);", &[]).await.unwrap();
    let flags = &assembled.flags;

    assert_eq!(flags.get_str(LANGUAGE_OUT), Some("ECMASCRIPT_2015"));
    assert_eq!(flags.get(ASSUME_FUNCTION_WRAPPER), Some(&CompileOptionValue::Bool(true)));
    assert_eq!(flags.get_str(WARNING_LEVEL), Some("QUIET"));
    assert_eq!(flags.get_str(MODULE_RESOLUTION), Some("NODE"));
    assert!(!flags.contains(EXTERNS));

    let js = flags.get_str(JS).unwrap();
    assert_eq!(tokio::fs::read_to_string(js).await.unwrap(), "console.log(1);");
    assert_eq!(flags.get_str(CREATE_SOURCE_MAP), assembled.source_map.to_str());

    let iife = context(&[], OutputFormat::Iife);
    let assembled = assemble(&iife, "", &[]).await.unwrap();
    assert_eq!(
      assembled.flags.get(ASSUME_FUNCTION_WRAPPER),
      Some(&CompileOptionValue::Bool(false))
    );
  }

  #[tokio::test]
  async fn writes_identical_externs_once() {
    let ctx = context(&[(EXTERNS, "user-externs.js")], OutputFormat::Esm);
    let code = "import { a } from './a.js';\nconsole.log(a);\n";
    let chunk = minipack_common::RenderedChunk::new("main", "main.js");

    let mut first = chunk::create(&ctx);
    let pre = chunk::pre_compilation(&ctx, &chunk, code, &mut first).unwrap();
    let first = assemble(&ctx, &pre, &first).await.unwrap();
    let mut second = chunk::create(&ctx);
    let pre = chunk::pre_compilation(&ctx, &chunk, code, &mut second).unwrap();
    let second = assemble(&ctx, &pre, &second).await.unwrap();

    let externs = first.flags.get(EXTERNS).unwrap().values();
    assert_eq!(externs.len(), 2);
    assert_eq!(externs[0], "user-externs.js");
    assert_eq!(tokio::fs::read_to_string(&externs[1]).await.unwrap(), "var a;");
    assert_eq!(second.flags.get(EXTERNS), first.flags.get(EXTERNS));
    let key = format!("externs:{:016x}", xxh3_64(b"var a;"));
    assert_eq!(ctx.memory.phase(&key), Some(Phase::Chunk));
  }
}
