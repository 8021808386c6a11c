use std::fmt::Display;

/// Where a recoverable failure happened. Every stage degrades to "keep the input".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
  /// The lightweight pre-parser rejected a module or chunk.
  Parse,
  /// A source transform failed on an otherwise parseable module.
  SourceTransform,
  /// Chunk-wide aggregation before the compiler runs.
  PreCompilation,
  /// Deriving the compiler invocation parameters.
  Options,
  /// The external compiler itself.
  Compilation,
  /// Repairing the compiler output.
  PostCompilation,
  /// Reading or parsing the compiler's source map.
  SourceMap,
}

impl Display for FailureStage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Parse => write!(f, "parse"),
      Self::SourceTransform => write!(f, "source transform"),
      Self::PreCompilation => write!(f, "pre-compilation"),
      Self::Options => write!(f, "options"),
      Self::Compilation => write!(f, "compilation"),
      Self::PostCompilation => write!(f, "post-compilation"),
      Self::SourceMap => write!(f, "source map"),
    }
  }
}

#[derive(Debug)]
pub struct TransformFailure {
  pub stage: FailureStage,
  pub error: anyhow::Error,
}

impl TransformFailure {
  pub fn new(stage: FailureStage, error: anyhow::Error) -> Self {
    Self { stage, error }
  }
}

impl Display for TransformFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} failed: {:#}", self.stage, self.error)
  }
}

/// Extension to tag an `anyhow::Result` with the stage it belongs to.
pub trait StageExt<T> {
  fn at_stage(self, stage: FailureStage) -> Result<T, TransformFailure>;
}

impl<T> StageExt<T> for anyhow::Result<T> {
  fn at_stage(self, stage: FailureStage) -> Result<T, TransformFailure> {
    self.map_err(|error| TransformFailure::new(stage, error))
  }
}

#[test]
fn test_transform_failure_display() {
  let failure = TransformFailure::new(FailureStage::Compilation, anyhow::anyhow!("exit code 1"));
  assert_eq!(failure.to_string(), "compilation failed: exit code 1");
  let failed: anyhow::Result<()> = Err(anyhow::anyhow!("unexpected token"));
  assert_eq!(failed.at_stage(FailureStage::Parse).unwrap_err().stage, FailureStage::Parse);
}
