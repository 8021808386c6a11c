pub mod module_id;
pub mod rendered_chunk;
