mod compiler;
mod options;
mod result;

use minipack_common::RenderedChunk;
use minipack_error::{FailureStage, StageExt, TransformFailure};

pub use self::{
  compiler::{CLOSURE_COMPILER_BIN, CLOSURE_COMPILER_JAR, Compiler, ProcessCompiler, to_args},
  options::{
    ASSUME_FUNCTION_WRAPPER, AssembledOptions, CREATE_SOURCE_MAP, JS, MODULE_RESOLUTION, assemble,
    validate,
  },
  result::assemble_result,
};
use crate::{
  chunk::{self, ChunkTransform},
  context::PipelineContext,
};

/// Compiles one chunk and repairs the output. Never retried.
#[tracing::instrument(level = "debug", skip_all, fields(chunk = %chunk.file_name))]
pub async fn invoke<C: Compiler>(
  compiler: &C,
  assembled: &AssembledOptions,
  ctx: &PipelineContext,
  chunk: &RenderedChunk,
  transforms: &[Box<dyn ChunkTransform>],
) -> Result<String, TransformFailure> {
  let code = compiler.compile(&assembled.flags).await.at_stage(FailureStage::Compilation)?;
  chunk::post_compilation(ctx, chunk, code, transforms).at_stage(FailureStage::PostCompilation)
}
