use std::{fmt::Display, future::Future, path::PathBuf, process::Stdio};

use anyhow::{Context, bail};
use tokio::process::Command;

use crate::options::{CompileOptionValue, CompileOptions};

pub const CLOSURE_COMPILER_JAR: &str = "CLOSURE_COMPILER_JAR";
pub const CLOSURE_COMPILER_BIN: &str = "CLOSURE_COMPILER_BIN";
const DEFAULT_BIN: &str = "google-closure-compiler";

/// The whole-program optimizer. Called once per chunk with the assembled flags and returns the
/// optimized code. The source map goes to the path given by the flags.
pub trait Compiler: Send + Sync + 'static {
  fn compile(&self, flags: &CompileOptions) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Runs Closure Compiler as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCompiler {
  /// A native build, or the npm launcher, found on `PATH` or at an explicit path.
  Native { bin: PathBuf },
  Jar { java: PathBuf, jar: PathBuf },
}

impl ProcessCompiler {
  /// `CLOSURE_COMPILER_JAR` selects `java -jar`. Otherwise `CLOSURE_COMPILER_BIN`, falling back
  /// to `google-closure-compiler` on `PATH`.
  pub fn from_env() -> Self {
    if let Some(jar) = std::env::var_os(CLOSURE_COMPILER_JAR) {
      return Self::Jar { java: PathBuf::from("java"), jar: PathBuf::from(jar) };
    }
    let bin = std::env::var_os(CLOSURE_COMPILER_BIN)
      .map_or_else(|| PathBuf::from(DEFAULT_BIN), PathBuf::from);
    Self::Native { bin }
  }

  fn command(&self) -> Command {
    match self {
      Self::Native { bin } => Command::new(bin),
      Self::Jar { java, jar } => {
        let mut command = Command::new(java);
        command.arg("-jar").arg(jar);
        command
      }
    }
  }
}

impl Default for ProcessCompiler {
  fn default() -> Self {
    Self::from_env()
  }
}

impl Display for ProcessCompiler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Native { bin } => write!(f, "{}", bin.display()),
      Self::Jar { java, jar } => write!(f, "{} -jar {}", java.display(), jar.display()),
    }
  }
}

/// Command line form of `flags`. `true` becomes a bare `--flag`, lists repeat the flag.
pub fn to_args(flags: &CompileOptions) -> Vec<String> {
  flags
    .iter()
    .flat_map(|(key, value)| match value {
      CompileOptionValue::Bool(true) => vec![format!("--{key}")],
      value => value.values().into_iter().map(|value| format!("--{key}={value}")).collect(),
    })
    .collect()
}

impl Compiler for ProcessCompiler {
  async fn compile(&self, flags: &CompileOptions) -> anyhow::Result<String> {
    let args = to_args(flags);
    tracing::debug!(compiler = %self, ?args, "running closure compiler");

    let output = self
      .command()
      .args(&args)
      .stdin(Stdio::null())
      .output()
      .await
      .with_context(|| format!("Failed to run `{self}`"))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !output.status.success() {
      bail!("`{self}` exited with {}:\n{stderr}", output.status);
    }
    if !stderr.is_empty() {
      if flags.is_verbose() {
        bail!("`{self}` reported warnings:\n{stderr}");
      }
      tracing::debug!("closure compiler stderr:\n{stderr}");
    }
    String::from_utf8(output.stdout).context("Closure Compiler output is not valid UTF-8")
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn renders_flags_in_order() {
    let mut flags: CompileOptions =
      [("compilation_level", "SIMPLE"), ("js", "/tmp/in.js")].into_iter().collect();
    flags.set("assume_function_wrapper", true);
    flags.set("process_common_js_modules", false);
    flags.set("externs", vec!["a.js".to_string(), "b.js".to_string()]);

    assert_eq!(
      to_args(&flags),
      vec![
        "--compilation_level=SIMPLE",
        "--js=/tmp/in.js",
        "--assume_function_wrapper",
        "--process_common_js_modules=false",
        "--externs=a.js",
        "--externs=b.js",
      ]
    );
  }

  #[test]
  fn describes_the_command() {
    let jar = ProcessCompiler::Jar { java: "java".into(), jar: "/opt/closure.jar".into() };
    assert_eq!(jar.to_string(), "java -jar /opt/closure.jar");
    let native = ProcessCompiler::Native { bin: DEFAULT_BIN.into() };
    assert_eq!(native.to_string(), "google-closure-compiler");
  }

  #[tokio::test]
  async fn missing_binary_is_an_error() {
    let compiler = ProcessCompiler::Native { bin: "/nonexistent/closure-compiler".into() };
    assert!(compiler.compile(&CompileOptions::default()).await.is_err());
  }
}
