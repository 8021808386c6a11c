use std::{
  borrow::Cow,
  sync::{Arc, Mutex},
};

/// Per-plugin handle to the host. Warnings pushed here end up in the build output, never in its
/// exit status.
#[derive(Debug, Clone)]
pub struct PluginContext {
  plugin_name: Cow<'static, str>,
  warnings: Arc<Mutex<Vec<anyhow::Error>>>,
}

impl PluginContext {
  pub fn new(plugin_name: Cow<'static, str>, warnings: Arc<Mutex<Vec<anyhow::Error>>>) -> Self {
    Self { plugin_name, warnings }
  }

  pub fn plugin_name(&self) -> &str {
    &self.plugin_name
  }

  pub fn warn(&self, warning: impl std::fmt::Display) {
    tracing::warn!(plugin = %self.plugin_name, "{warning}");
    let warning = anyhow::anyhow!("[plugin {}] {warning}", self.plugin_name);
    self.warnings.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(warning);
  }
}

#[test]
fn test_warn_is_tagged_with_plugin_name() {
  let warnings = Arc::new(Mutex::new(vec![]));
  let ctx = PluginContext::new(Cow::Borrowed("closure-compiler"), Arc::clone(&warnings));
  ctx.warn("advanced mode with code splitting");
  let warnings = warnings.lock().unwrap();
  assert_eq!(warnings.len(), 1);
  assert_eq!(
    warnings[0].to_string(),
    "[plugin closure-compiler] advanced mode with code splitting"
  );
}
