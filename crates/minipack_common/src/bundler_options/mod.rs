pub mod input_item;
pub mod input_options;
pub mod output_format;
pub mod output_options;
