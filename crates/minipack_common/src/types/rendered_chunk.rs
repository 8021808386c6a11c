use arcstr::ArcStr;

use crate::ModuleId;

/// The chunk metadata the bundler exposes to `render_chunk`.
#[derive(Debug, Clone, Default)]
pub struct RenderedChunk {
  pub name: ArcStr,
  pub file_name: ArcStr,
  /// The entry module this chunk was created for, if any.
  pub facade_module_id: Option<ModuleId>,
}

impl RenderedChunk {
  pub fn new(name: impl Into<ArcStr>, file_name: impl Into<ArcStr>) -> Self {
    Self { name: name.into(), file_name: file_name.into(), ..Self::default() }
  }

  #[must_use]
  pub fn with_facade_module(mut self, id: impl Into<ModuleId>) -> Self {
    self.facade_module_id = Some(id.into());
    self
  }
}
