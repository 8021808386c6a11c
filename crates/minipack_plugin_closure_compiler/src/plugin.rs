use std::{
  borrow::Cow,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use minipack_common::InputOptions;
use minipack_error::{FailureStage, StageExt, TransformFailure};
use minipack_plugin::{
  HookNoopReturn, HookRenderChunkArgs, HookRenderChunkOutput, HookRenderChunkReturn,
  HookTransformArgs, HookTransformReturn, Plugin, PluginContext,
};

use crate::{
  chunk,
  compile::{self, Compiler, ProcessCompiler},
  context::PipelineContext,
  filter::Filter,
  options::ClosureCompilerOptions,
  outcome::TransformOutcome,
  source::{self, SourceTransforms},
};

pub const CODE_SPLITTING_WARNING: &str =
  "Code Splitting with Closure Compiler ADVANCED_OPTIMIZATIONS is not currently supported.";

/// Runs every chunk through Closure Compiler.
///
/// All per-build state lives in a [PipelineContext] that is replaced at `build_start`, so one
/// plugin instance can serve several builds in a row.
pub struct ClosureCompilerPlugin<C = ProcessCompiler> {
  options: ClosureCompilerOptions,
  compiler: C,
  source_transforms: SourceTransforms,
  input_options: Mutex<Arc<InputOptions>>,
  pipeline: Mutex<Option<PipelineContext>>,
}

impl ClosureCompilerPlugin {
  /// Uses the compiler found through the environment.
  pub fn new(options: ClosureCompilerOptions) -> Self {
    Self::with_compiler(options, ProcessCompiler::from_env())
  }
}

impl<C: Compiler> ClosureCompilerPlugin<C> {
  pub fn with_compiler(options: ClosureCompilerOptions, compiler: C) -> Self {
    Self {
      options,
      compiler,
      source_transforms: source::create(),
      input_options: Mutex::default(),
      pipeline: Mutex::default(),
    }
  }

  fn input_options(&self) -> Arc<InputOptions> {
    Arc::clone(&self.input_options.lock().unwrap_or_else(PoisonError::into_inner))
  }

  fn pipeline_slot(&self) -> MutexGuard<'_, Option<PipelineContext>> {
    self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn new_pipeline(&self) -> PipelineContext {
    let input_options = self.input_options();
    let filter = Filter::new(
      self.options.include.as_ref(),
      self.options.exclude.as_ref(),
      &input_options.cwd,
    );
    PipelineContext::new(Arc::new(filter), Arc::new(self.options.compile.clone()), input_options)
  }

  /// The context of the running build. Hooks called without `build_start` get one lazily.
  fn pipeline(&self) -> PipelineContext {
    self.pipeline_slot().get_or_insert_with(|| self.new_pipeline()).clone()
  }

  async fn render(
    &self,
    ctx: &PipelineContext,
    args: &HookRenderChunkArgs<'_>,
  ) -> Result<Option<HookRenderChunkOutput>, TransformFailure> {
    let mut transforms = chunk::create(ctx);
    let code = match chunk::pre_compilation(ctx, args.chunk, args.code, &mut transforms) {
      Ok(code) => code,
      Err(err) => {
        tracing::warn!(
          chunk = %args.chunk.file_name,
          "closure-compiler: {}, compiling the chunk as is",
          TransformFailure::new(FailureStage::PreCompilation, err)
        );
        // Nothing a half-run transform remembered may reach the later stages.
        transforms = chunk::create(ctx);
        args.code.to_string()
      }
    };

    let assembled =
      compile::assemble(ctx, &code, &transforms).await.at_stage(FailureStage::Options)?;
    let code = compile::invoke(&self.compiler, &assembled, ctx, args.chunk, &transforms).await?;
    let output = compile::assemble_result(code, &assembled.source_map)
      .await
      .at_stage(FailureStage::SourceMap)?;
    Ok(Some(output))
  }
}

impl<C> std::fmt::Debug for ClosureCompilerPlugin<C> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let source_transforms = self.source_transforms.iter().map(|t| t.name()).collect::<Vec<_>>();
    f.debug_struct("ClosureCompilerPlugin")
      .field("options", &self.options)
      .field("source_transforms", &source_transforms)
      .finish_non_exhaustive()
  }
}

impl<C: Compiler> Plugin for ClosureCompilerPlugin<C> {
  fn name(&self) -> Cow<'static, str> {
    Cow::Borrowed("closure-compiler")
  }

  fn options(&self, _ctx: &PluginContext, options: &InputOptions) -> HookNoopReturn {
    *self.input_options.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(options.clone());
    Ok(())
  }

  async fn build_start(&self, ctx: &PluginContext) -> HookNoopReturn {
    let pipeline = self.new_pipeline();
    if pipeline.compile_options.is_advanced() && pipeline.input_options.is_code_splitting() {
      ctx.warn(CODE_SPLITTING_WARNING);
    }
    *self.pipeline_slot() = Some(pipeline);
    Ok(())
  }

  async fn transform(
    &self,
    _ctx: &PluginContext,
    args: &HookTransformArgs<'_>,
  ) -> HookTransformReturn {
    let pipeline = self.pipeline();
    if !pipeline.filter.matches(args.id) {
      return Ok(None);
    }
    let outcome = source::transform(&pipeline, args.code, args.id, &self.source_transforms);
    Ok(outcome.into_output(args.id))
  }

  async fn render_chunk(
    &self,
    _ctx: &PluginContext,
    args: &HookRenderChunkArgs<'_>,
  ) -> HookRenderChunkReturn {
    let pipeline = self.pipeline();
    if !pipeline.filter.matches(&args.chunk.file_name) {
      return Ok(None);
    }
    pipeline.mangler.debug();

    let pipeline = pipeline.with_output_options(args.options.clone());
    let outcome: TransformOutcome<_> = self.render(&pipeline, args).await.into();
    Ok(outcome.into_output(&args.chunk.file_name))
  }
}
