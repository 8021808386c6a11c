use std::sync::Arc;

use minipack_common::{InputOptions, OutputOptions};

use crate::{filter::Filter, mangle::Mangle, memory::Memory, options::CompileOptions};

/// Read-mostly state threaded through every transform of one build.
///
/// Built at `build_start`; the chunk phase works on a copy that also carries the output options.
#[derive(Debug, Clone)]
pub struct PipelineContext {
  pub filter: Arc<Filter>,
  pub mangler: Arc<Mangle>,
  pub memory: Arc<Memory>,
  pub compile_options: Arc<CompileOptions>,
  pub input_options: Arc<InputOptions>,
  pub output_options: Option<Arc<OutputOptions>>,
}

impl PipelineContext {
  /// A context with an empty ledger and store.
  pub fn new(
    filter: Arc<Filter>,
    compile_options: Arc<CompileOptions>,
    input_options: Arc<InputOptions>,
  ) -> Self {
    Self {
      filter,
      mangler: Arc::new(Mangle::new()),
      memory: Arc::new(Memory::new()),
      compile_options,
      input_options,
      output_options: None,
    }
  }

  #[must_use]
  pub fn with_output_options(&self, output_options: OutputOptions) -> Self {
    Self { output_options: Some(Arc::new(output_options)), ..self.clone() }
  }

  /// Output options of the chunk being rendered, or the defaults during the source phase.
  pub fn output_options(&self) -> OutputOptions {
    self.output_options.as_deref().cloned().unwrap_or_default()
  }
}

#[cfg(test)]
impl PipelineContext {
  pub(crate) fn for_test(compile_options: CompileOptions) -> Self {
    Self::new(
      Arc::new(Filter::default()),
      Arc::new(compile_options),
      Arc::new(InputOptions::default()),
    )
  }
}
