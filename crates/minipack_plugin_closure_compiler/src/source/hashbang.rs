use minipack_sourcemap::MagicString;

use super::{SourceTransform, SourceUnit};
use crate::{ast::slice, context::PipelineContext, memory::Phase};

pub fn hashbang_key(id: &str) -> String {
  format!("hashbang:{id}")
}

/// The compiler rejects `#!` lines, so they are taken out here and put back on the chunk.
pub struct HashbangRemoveTransform;

impl SourceTransform for HashbangRemoveTransform {
  fn name(&self) -> &'static str {
    "HashbangRemoveTransform"
  }

  fn transform(
    &self,
    ctx: &PipelineContext,
    unit: &SourceUnit<'_>,
    edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()> {
    let Some(span) = unit.syntax.hashbang else {
      return Ok(());
    };
    let hashbang = slice(unit.code, span);
    // The line break stays so line numbers keep matching the original.
    edit.remove(span.start as usize, span.end as usize);
    ctx.memory.set(hashbang_key(unit.id), hashbang.to_string(), Phase::Source);
    tracing::debug!(id = unit.id, hashbang, "removed hashbang");
    Ok(())
  }

  fn discard(&self, ctx: &PipelineContext, id: &str) {
    ctx.memory.remove(&hashbang_key(id));
  }
}
