use std::{borrow::Cow, fmt::Debug, future::Future, sync::Arc};

use futures::future::BoxFuture;
use minipack_common::InputOptions;
use minipack_error::BuildResult;

use crate::{
  HookRenderChunkArgs, HookRenderChunkOutput, HookTransformArgs, HookTransformOutput,
  PluginContext,
};

pub type HookNoopReturn = BuildResult<()>;
/// `Ok(None)` leaves the module untouched.
pub type HookTransformReturn = BuildResult<Option<HookTransformOutput>>;
/// `Ok(None)` leaves the chunk untouched.
pub type HookRenderChunkReturn = BuildResult<Option<HookRenderChunkOutput>>;

pub trait Plugin: Debug + Send + Sync + 'static {
  fn name(&self) -> Cow<'static, str>;

  /// Receives the final input configuration before the build starts.
  fn options(&self, _ctx: &PluginContext, _options: &InputOptions) -> HookNoopReturn {
    Ok(())
  }

  fn build_start(&self, _ctx: &PluginContext) -> impl Future<Output = HookNoopReturn> + Send {
    async { Ok(()) }
  }

  /// Called for every module. Modules may be transformed concurrently.
  fn transform(
    &self,
    _ctx: &PluginContext,
    _args: &HookTransformArgs<'_>,
  ) -> impl Future<Output = HookTransformReturn> + Send {
    async { Ok(None) }
  }

  /// Called for every chunk once all modules are linked.
  fn render_chunk(
    &self,
    _ctx: &PluginContext,
    _args: &HookRenderChunkArgs<'_>,
  ) -> impl Future<Output = HookRenderChunkReturn> + Send {
    async { Ok(None) }
  }
}

/// Object-safe mirror of [Plugin], so the driver can hold heterogeneous plugins.
pub trait Pluginable: Debug + Send + Sync + 'static {
  fn call_name(&self) -> Cow<'static, str>;

  fn call_options(&self, ctx: &PluginContext, options: &InputOptions) -> HookNoopReturn;

  fn call_build_start<'a>(&'a self, ctx: &'a PluginContext) -> BoxFuture<'a, HookNoopReturn>;

  fn call_transform<'a>(
    &'a self,
    ctx: &'a PluginContext,
    args: &'a HookTransformArgs<'a>,
  ) -> BoxFuture<'a, HookTransformReturn>;

  fn call_render_chunk<'a>(
    &'a self,
    ctx: &'a PluginContext,
    args: &'a HookRenderChunkArgs<'a>,
  ) -> BoxFuture<'a, HookRenderChunkReturn>;
}

impl<T: Plugin> Pluginable for T {
  fn call_name(&self) -> Cow<'static, str> {
    Plugin::name(self)
  }

  fn call_options(&self, ctx: &PluginContext, options: &InputOptions) -> HookNoopReturn {
    Plugin::options(self, ctx, options)
  }

  fn call_build_start<'a>(&'a self, ctx: &'a PluginContext) -> BoxFuture<'a, HookNoopReturn> {
    Box::pin(Plugin::build_start(self, ctx))
  }

  fn call_transform<'a>(
    &'a self,
    ctx: &'a PluginContext,
    args: &'a HookTransformArgs<'a>,
  ) -> BoxFuture<'a, HookTransformReturn> {
    Box::pin(Plugin::transform(self, ctx, args))
  }

  fn call_render_chunk<'a>(
    &'a self,
    ctx: &'a PluginContext,
    args: &'a HookRenderChunkArgs<'a>,
  ) -> BoxFuture<'a, HookRenderChunkReturn> {
    Box::pin(Plugin::render_chunk(self, ctx, args))
  }
}

pub type SharedPluginable = Arc<dyn Pluginable>;
