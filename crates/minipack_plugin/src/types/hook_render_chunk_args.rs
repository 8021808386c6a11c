use minipack_common::{OutputOptions, RenderedChunk};

#[derive(Debug)]
pub struct HookRenderChunkArgs<'a> {
  pub code: &'a str,
  pub chunk: &'a RenderedChunk,
  pub options: &'a OutputOptions,
}
