mod plugin;
mod plugin_context;
mod plugin_driver;
mod types;

pub use crate::{
  plugin::{
    HookNoopReturn, HookRenderChunkReturn, HookTransformReturn, Plugin, Pluginable,
    SharedPluginable,
  },
  plugin_context::PluginContext,
  plugin_driver::{PluginDriver, RenderedChunkCode, SharedPluginDriver, TransformedModule},
  types::{
    hook_render_chunk_args::HookRenderChunkArgs, hook_render_chunk_output::HookRenderChunkOutput,
    hook_transform_args::HookTransformArgs, hook_transform_output::HookTransformOutput,
  },
};
