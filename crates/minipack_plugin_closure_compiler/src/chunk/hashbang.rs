use minipack_common::RenderedChunk;

use super::ChunkTransform;
use crate::{context::PipelineContext, source::hashbang_key};

/// Puts the hashbang of the chunk's entry module back on top of the compiled chunk.
#[derive(Debug)]
pub struct HashbangApplyTransform;

impl ChunkTransform for HashbangApplyTransform {
  fn name(&self) -> &'static str {
    "HashbangApplyTransform"
  }

  fn post_compilation(
    &self,
    ctx: &PipelineContext,
    chunk: &RenderedChunk,
    code: String,
  ) -> anyhow::Result<String> {
    let Some(facade) = &chunk.facade_module_id else {
      return Ok(code);
    };
    let Some(hashbang) = ctx.memory.get::<String>(&hashbang_key(facade)) else {
      return Ok(code);
    };
    // The entry kept its hashbang when its source transforms were skipped.
    if code.starts_with("#!") {
      return Ok(code);
    }
    Ok(format!("{hashbang}\n{code}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{memory::Phase, options::CompileOptions};

  #[test]
  fn prepends_the_facade_hashbang() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    ctx.memory.set(hashbang_key("/src/cli.js"), "#!/usr/bin/env node".to_string(), Phase::Source);

    let entry = RenderedChunk::new("cli", "cli.js").with_facade_module("/src/cli.js");
    assert_eq!(
      HashbangApplyTransform.post_compilation(&ctx, &entry, "run();".to_string()).unwrap(),
      "#!/usr/bin/env node\nrun();"
    );
    let shared = RenderedChunk::new("shared", "shared-1.js");
    assert_eq!(
      HashbangApplyTransform.post_compilation(&ctx, &shared, "run();".to_string()).unwrap(),
      "run();"
    );
  }
}
