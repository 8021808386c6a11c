use std::path::Path;

use anyhow::Context;
use minipack_plugin::HookRenderChunkOutput;
use minipack_sourcemap::parse_sourcemap;

/// Pairs the optimized code with the source map the compiler wrote next to it.
pub async fn assemble_result(
  code: String,
  source_map: &Path,
) -> anyhow::Result<HookRenderChunkOutput> {
  let json = tokio::fs::read_to_string(source_map)
    .await
    .with_context(|| format!("Failed to read source map {}", source_map.display()))?;
  let map = parse_sourcemap(&json)?;
  Ok(HookRenderChunkOutput { code, map: Some(map) })
}
