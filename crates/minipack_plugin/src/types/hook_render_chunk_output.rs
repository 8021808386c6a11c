use minipack_sourcemap::SourceMap;

#[derive(Debug, Default)]
pub struct HookRenderChunkOutput {
  pub code: String,
  pub map: Option<SourceMap>,
}
