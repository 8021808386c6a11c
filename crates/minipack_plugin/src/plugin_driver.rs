use std::sync::{Arc, Mutex, PoisonError};

use minipack_common::{InputOptions, OutputOptions, RenderedChunk};
use minipack_error::BuildResult;
use minipack_sourcemap::SourceMap;

use crate::{
  HookNoopReturn, HookRenderChunkArgs, HookTransformArgs, PluginContext, SharedPluginable,
};

pub type SharedPluginDriver = Arc<PluginDriver>;

/// The module after every plugin's `transform` hook ran.
#[derive(Debug)]
pub struct TransformedModule {
  pub code: String,
  /// One map per plugin that changed the code, in application order.
  pub maps: Vec<SourceMap>,
}

/// The chunk after every plugin's `render_chunk` hook ran.
#[derive(Debug)]
pub struct RenderedChunkCode {
  pub code: String,
  pub maps: Vec<SourceMap>,
}

/// Calls plugin hooks in registration order, chaining the output of one plugin into the next.
#[derive(Debug)]
pub struct PluginDriver {
  plugins: Vec<(SharedPluginable, PluginContext)>,
  warnings: Arc<Mutex<Vec<anyhow::Error>>>,
}

impl PluginDriver {
  pub fn new_shared(plugins: Vec<SharedPluginable>) -> SharedPluginDriver {
    let warnings: Arc<Mutex<Vec<anyhow::Error>>> = Arc::default();
    let plugins = plugins
      .into_iter()
      .map(|plugin| {
        let ctx = PluginContext::new(plugin.call_name(), Arc::clone(&warnings));
        (plugin, ctx)
      })
      .collect();
    Arc::new(Self { plugins, warnings })
  }

  pub fn options(&self, options: &InputOptions) -> HookNoopReturn {
    for (plugin, ctx) in &self.plugins {
      plugin.call_options(ctx, options)?;
    }
    Ok(())
  }

  pub async fn build_start(&self) -> HookNoopReturn {
    for (plugin, ctx) in &self.plugins {
      plugin.call_build_start(ctx).await?;
    }
    Ok(())
  }

  #[tracing::instrument(level = "debug", skip_all, fields(id = id))]
  pub async fn transform(&self, id: &str, original_code: String) -> BuildResult<TransformedModule> {
    let mut code = original_code;
    let mut maps = vec![];
    for (plugin, ctx) in &self.plugins {
      let args = HookTransformArgs { id, code: &code };
      if let Some(output) = plugin.call_transform(ctx, &args).await? {
        code = output.code;
        maps.extend(output.map);
      }
    }
    Ok(TransformedModule { code, maps })
  }

  #[tracing::instrument(level = "debug", skip_all, fields(chunk = %chunk.file_name))]
  pub async fn render_chunk(
    &self,
    original_code: String,
    chunk: &RenderedChunk,
    options: &OutputOptions,
  ) -> BuildResult<RenderedChunkCode> {
    let mut code = original_code;
    let mut maps = vec![];
    for (plugin, ctx) in &self.plugins {
      let args = HookRenderChunkArgs { code: &code, chunk, options };
      if let Some(output) = plugin.call_render_chunk(ctx, &args).await? {
        code = output.code;
        maps.extend(output.map);
      }
    }
    Ok(RenderedChunkCode { code, maps })
  }

  /// Drains the warnings reported through every plugin's context so far.
  pub fn take_warnings(&self) -> Vec<anyhow::Error> {
    std::mem::take(&mut *self.warnings.lock().unwrap_or_else(PoisonError::into_inner))
  }
}

#[cfg(test)]
mod tests {
  use std::borrow::Cow;

  use super::*;
  use crate::{HookTransformOutput, HookTransformReturn, Plugin};

  #[derive(Debug)]
  struct Append(&'static str);

  impl Plugin for Append {
    fn name(&self) -> Cow<'static, str> {
      Cow::Borrowed("append")
    }

    async fn transform(
      &self,
      ctx: &PluginContext,
      args: &HookTransformArgs<'_>,
    ) -> HookTransformReturn {
      if args.id.ends_with(".css") {
        ctx.warn(format!("skipping {}", args.id));
        return Ok(None);
      }
      Ok(Some(HookTransformOutput { code: format!("{}{}", args.code, self.0), map: None }))
    }
  }

  #[tokio::test]
  async fn chains_transform_hooks_in_registration_order() {
    let plugins: Vec<SharedPluginable> = vec![Arc::new(Append("a")), Arc::new(Append("b"))];
    let driver = PluginDriver::new_shared(plugins);
    let output = driver.transform("/src/main.js", "x;".to_string()).await.unwrap();
    assert_eq!(output.code, "x;ab");
    assert!(output.maps.is_empty());

    let output = driver.transform("/src/style.css", "x{}".to_string()).await.unwrap();
    assert_eq!(output.code, "x{}");
    assert_eq!(driver.take_warnings().len(), 2);
    assert!(driver.take_warnings().is_empty());
  }
}
