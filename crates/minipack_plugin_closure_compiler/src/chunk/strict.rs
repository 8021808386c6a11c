use minipack_common::RenderedChunk;
use minipack_sourcemap::MagicString;

use super::{ChunkTransform, source_type};
use crate::{ast::parse_module, context::PipelineContext};

/// Modules are strict already, the directive the compiler may emit is noise in `esm` output.
#[derive(Debug)]
pub struct StrictTransform;

impl ChunkTransform for StrictTransform {
  fn name(&self) -> &'static str {
    "StrictTransform"
  }

  fn post_compilation(
    &self,
    ctx: &PipelineContext,
    _chunk: &RenderedChunk,
    code: String,
  ) -> anyhow::Result<String> {
    if !ctx.output_options().format.is_esm() || !code.contains("use strict") {
      return Ok(code);
    }

    let syntax = parse_module(&code, source_type(ctx))?;
    let mut directives =
      syntax.directives.iter().filter(|directive| directive.value == "use strict").peekable();
    if directives.peek().is_none() {
      return Ok(code);
    }
    let mut edit = MagicString::new(code.as_str());
    for directive in directives {
      edit.remove(directive.span.start as usize, directive.span.end as usize);
    }
    Ok(edit.to_string())
  }
}

#[cfg(test)]
mod tests {
  use minipack_common::{OutputFormat, OutputOptions};

  use super::*;
  use crate::options::CompileOptions;

  #[test]
  fn drops_use_strict_from_esm_only() {
    let esm = PipelineContext::for_test(CompileOptions::default())
      .with_output_options(OutputOptions::default());
    let chunk = RenderedChunk::new("main", "main.js");
    let code = "'use strict';console.log(1);".to_string();
    let stripped = StrictTransform.post_compilation(&esm, &chunk, code.clone()).unwrap();
    assert!(!stripped.contains("use strict"));
    assert!(stripped.ends_with("console.log(1);"));

    let cjs = esm.with_output_options(OutputOptions { format: OutputFormat::Cjs });
    assert_eq!(StrictTransform.post_compilation(&cjs, &chunk, code.clone()).unwrap(), code);
  }
}
