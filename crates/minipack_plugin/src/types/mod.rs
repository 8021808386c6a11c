pub mod hook_render_chunk_args;
pub mod hook_render_chunk_output;
pub mod hook_transform_args;
pub mod hook_transform_output;
