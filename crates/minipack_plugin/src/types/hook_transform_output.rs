use minipack_sourcemap::SourceMap;

#[derive(Debug, Default)]
pub struct HookTransformOutput {
  pub code: String,
  /// `None` means the transform didn't move any original position.
  pub map: Option<SourceMap>,
}
