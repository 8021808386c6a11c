use std::path::Path;

use sugar_path::SugarPath;

use crate::options::FilterPattern;

/// Decides which module ids and chunk file names the plugin touches.
///
/// - `exclude` wins over `include`.
/// - No `include` pattern means everything is included.
/// - Virtual ids (containing `\0`) are never included.
#[derive(Debug, Clone, Default)]
pub struct Filter {
  include: Vec<String>,
  exclude: Vec<String>,
}

impl Filter {
  pub fn new(include: Option<&FilterPattern>, exclude: Option<&FilterPattern>, cwd: &Path) -> Self {
    let normalize = |patterns: Option<&FilterPattern>| {
      patterns
        .map(FilterPattern::patterns)
        .unwrap_or_default()
        .iter()
        .map(|pattern| normalize_pattern(pattern, cwd))
        .collect::<Vec<_>>()
    };
    Self { include: normalize(include), exclude: normalize(exclude) }
  }

  pub fn matches(&self, id: &str) -> bool {
    if id.contains('\0') {
      return false;
    }
    let id = id.replace('\\', "/");

    if self.exclude.iter().any(|pattern| glob_matches(pattern, &id)) {
      return false;
    }
    self.include.is_empty() || self.include.iter().any(|pattern| glob_matches(pattern, &id))
  }
}

/// Relative patterns are anchored at `cwd`, unless they already match at any depth.
fn normalize_pattern(pattern: &str, cwd: &Path) -> String {
  let pattern = pattern.replace('\\', "/");
  if pattern.starts_with("**") || Path::new(&pattern).is_absolute() {
    pattern
  } else {
    cwd.join(&pattern).to_slash_lossy().into_owned()
  }
}

fn glob_matches(pattern: &str, id: &str) -> bool {
  if fast_glob::glob_match(pattern, id) {
    return true;
  }
  // `**/` also matches zero directories, and absolute ids match without their leading slash.
  let relative_id = id.strip_prefix('/').unwrap_or(id);
  fast_glob::glob_match(pattern, relative_id)
    || pattern.strip_prefix("**/").is_some_and(|rest| fast_glob::glob_match(rest, relative_id))
}
