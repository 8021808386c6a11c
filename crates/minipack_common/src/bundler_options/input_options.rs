use std::path::PathBuf;

use crate::InputItem;

/// The final input configuration handed to plugins by the `options` hook.
#[derive(Debug, Clone)]
pub struct InputOptions {
  pub input: Vec<InputItem>,
  pub cwd: PathBuf,
}

impl InputOptions {
  pub fn new(input: Vec<InputItem>, cwd: impl Into<PathBuf>) -> Self {
    Self { input, cwd: cwd.into() }
  }

  /// Several entries mean the bundler splits the output into independent chunks.
  pub fn is_code_splitting(&self) -> bool {
    self.input.len() > 1
  }
}

impl Default for InputOptions {
  fn default() -> Self {
    Self {
      input: vec![],
      cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
  }
}

#[test]
fn test_is_code_splitting() {
  let single = InputOptions::new(vec!["./main.js".into()], "/project");
  assert!(!single.is_code_splitting());

  let multiple = InputOptions::new(vec!["./a.js".into(), "./b.js".into()], "/project");
  assert!(multiple.is_code_splitting());
}
