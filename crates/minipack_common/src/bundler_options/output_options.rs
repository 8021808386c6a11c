use crate::OutputFormat;

/// Output settings of the current generate phase, passed to every `render_chunk` call.
#[derive(Debug, Default, Clone)]
pub struct OutputOptions {
  pub format: OutputFormat,
}
