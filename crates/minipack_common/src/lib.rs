mod bundler_options;
mod types;

pub use bundler_options::{
  input_item::InputItem, input_options::InputOptions, output_format::OutputFormat,
  output_options::OutputOptions,
};

pub use crate::types::{module_id::ModuleId, rendered_chunk::RenderedChunk};
