use minipack_common::RenderedChunk;
use minipack_sourcemap::MagicString;

use super::{ChunkTransform, ChunkUnit};
use crate::{
  ast::{StatementKind, slice},
  context::PipelineContext,
};

/// Keeps module imports away from the compiler, which would otherwise try to resolve them.
///
/// Imported bindings are declared as externs so their names survive compilation.
#[derive(Debug, Default)]
pub struct ImportTransform {
  statements: Vec<String>,
  locals: Vec<String>,
}

impl ChunkTransform for ImportTransform {
  fn name(&self) -> &'static str {
    "ImportTransform"
  }

  fn externs(&self) -> Vec<String> {
    self.locals.iter().map(|local| format!("var {local};")).collect()
  }

  fn pre_compilation(
    &mut self,
    _ctx: &PipelineContext,
    unit: &ChunkUnit<'_>,
    edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()> {
    for statement in &unit.syntax.statements {
      match &statement.kind {
        StatementKind::Import { locals } => self.locals.extend(locals.iter().cloned()),
        StatementKind::ReExport { .. } => {}
        _ => continue,
      }
      self.statements.push(slice(unit.code, statement.span).to_string());
      edit.remove(statement.span.start as usize, statement.span.end as usize);
    }
    Ok(())
  }

  fn post_compilation(
    &self,
    _ctx: &PipelineContext,
    _chunk: &RenderedChunk,
    code: String,
  ) -> anyhow::Result<String> {
    if self.statements.is_empty() {
      return Ok(code);
    }
    Ok(format!("{}\n{code}", self.statements.join("\n")))
  }
}
