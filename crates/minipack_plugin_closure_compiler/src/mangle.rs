use std::{
  collections::hash_map::Entry,
  sync::{Mutex, MutexGuard, PoisonError},
};

use arcstr::ArcStr;
use oxc::syntax::keyword::{GLOBAL_OBJECTS, RESERVED_KEYWORDS};
use rustc_hash::{FxHashMap, FxHashSet};

/// Scope shared by every chunk of a build. Names that must survive independent compiler runs are
/// resolved here so that every chunk agrees on them.
pub const EXPORTS_SCOPE: &str = "exports";

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";
const REST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

#[derive(Debug)]
struct MangleEntry {
  original: ArcStr,
  mangled: ArcStr,
  scope: ArcStr,
}

#[derive(Debug, Default)]
struct ScopeNames {
  /// Mangled names handed out in this scope, mapped back to their original.
  issued: FxHashMap<ArcStr, ArcStr>,
  /// Names that must never be handed out in this scope.
  reserved: FxHashSet<ArcStr>,
  /// Position of the next candidate to try.
  next_candidate: usize,
}

#[derive(Debug, Default)]
struct MangleState {
  resolved: FxHashMap<(ArcStr, ArcStr), ArcStr>,
  scopes: FxHashMap<ArcStr, ScopeNames>,
  /// Append-only log of every decision, in allocation order.
  entries: Vec<MangleEntry>,
}

/// Renaming ledger of one build.
///
/// `resolve(name, scope)` is a total function for the lifetime of the ledger: the first call
/// allocates the shortest unused identifier of the scope, every later call returns it again.
/// Chunks are compiled by independent compiler runs, so any rename that has to be visible across
/// chunk boundaries is decided here instead of inside the compiler.
#[derive(Debug, Default)]
pub struct Mangle {
  state: Mutex<MangleState>,
}

impl Mangle {
  pub fn new() -> Self {
    Self::default()
  }

  fn state(&self) -> MutexGuard<'_, MangleState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn resolve(&self, name: &str, scope: &str) -> ArcStr {
    let mut state = self.state();
    let key = (ArcStr::from(scope), ArcStr::from(name));
    if let Some(mangled) = state.resolved.get(&key) {
      return mangled.clone();
    }

    let MangleState { resolved, scopes, entries } = &mut *state;
    let names = scopes.entry(key.0.clone()).or_default();
    let mangled = loop {
      let candidate = encode_name(names.next_candidate);
      names.next_candidate += 1;
      if is_reserved_word(&candidate) || names.reserved.contains(candidate.as_str()) {
        continue;
      }
      if let Entry::Vacant(vacant) = names.issued.entry(ArcStr::from(candidate)) {
        let mangled = vacant.key().clone();
        vacant.insert(key.1.clone());
        break mangled;
      }
    };

    tracing::trace!(scope, name, mangled = %mangled, "mangle: allocated");
    entries.push(MangleEntry {
      original: key.1.clone(),
      mangled: mangled.clone(),
      scope: key.0.clone(),
    });
    resolved.insert(key, mangled.clone());
    mangled
  }

  /// Keeps `name` from ever being allocated in `scope`. Names already issued are not affected.
  pub fn reserve(&self, name: &str, scope: &str) {
    let mut state = self.state();
    state.scopes.entry(ArcStr::from(scope)).or_default().reserved.insert(ArcStr::from(name));
  }

  /// Reverse of [Mangle::resolve], without allocating.
  pub fn original(&self, mangled: &str, scope: &str) -> Option<ArcStr> {
    self.state().scopes.get(scope).and_then(|names| names.issued.get(mangled).cloned())
  }

  /// Dumps the ledger at debug level.
  pub fn debug(&self) {
    let state = self.state();
    tracing::debug!(entries = state.entries.len(), scopes = state.scopes.len(), "mangle state");
    for entry in &state.entries {
      tracing::debug!(scope = %entry.scope, "  {} -> {}", entry.original, entry.mangled);
    }
  }
}

/// Maps 0, 1, 2, ... onto `a`, `b`, ... `$`, `aa`, `ba`, ...
fn encode_name(mut n: usize) -> String {
  let mut name = String::new();
  name.push(FIRST_CHARS[n % FIRST_CHARS.len()] as char);
  n /= FIRST_CHARS.len();
  while n > 0 {
    n -= 1;
    name.push(REST_CHARS[n % REST_CHARS.len()] as char);
    n /= REST_CHARS.len();
  }
  name
}

fn is_reserved_word(name: &str) -> bool {
  RESERVED_KEYWORDS.contains(name) || GLOBAL_OBJECTS.contains(name)
}
