use minipack_error::TransformFailure;

/// Result of a pipeline run over one module or chunk.
///
/// `Failed` is never fatal: it is logged and then handled exactly like `Unchanged`.
#[derive(Debug)]
pub enum TransformOutcome<T> {
  Unchanged,
  Transformed(T),
  Failed(TransformFailure),
}

impl<T> TransformOutcome<T> {
  pub fn is_unchanged(&self) -> bool {
    matches!(self, Self::Unchanged)
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed(_))
  }

  /// Collapses the outcome into the host's "no change" convention.
  pub fn into_output(self, subject: &str) -> Option<T> {
    match self {
      Self::Unchanged => None,
      Self::Transformed(output) => Some(output),
      Self::Failed(failure) => {
        tracing::warn!(
          stage = %failure.stage,
          "closure-compiler: skipping {subject}: {:#}",
          failure.error
        );
        None
      }
    }
  }
}

impl<T> From<Result<Option<T>, TransformFailure>> for TransformOutcome<T> {
  fn from(result: Result<Option<T>, TransformFailure>) -> Self {
    match result {
      Ok(Some(output)) => Self::Transformed(output),
      Ok(None) => Self::Unchanged,
      Err(failure) => Self::Failed(failure),
    }
  }
}

#[test]
fn test_failed_is_treated_as_unchanged() {
  use minipack_error::FailureStage;

  let failed: TransformOutcome<String> = Err(TransformFailure::new(
    FailureStage::Compilation,
    anyhow::anyhow!("exit code 2"),
  ))
  .into();
  assert!(failed.is_failed());
  assert_eq!(failed.into_output("main.js"), None);

  let transformed: TransformOutcome<String> = Ok(Some("x".to_string())).into();
  assert_eq!(transformed.into_output("main.js"), Some("x".to_string()));
  assert!(TransformOutcome::<String>::from(Ok(None)).is_unchanged());
}
