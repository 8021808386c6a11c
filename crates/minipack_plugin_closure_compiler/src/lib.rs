pub mod ast;
pub mod chunk;
pub mod compile;
mod context;
mod filter;
mod mangle;
mod memory;
mod options;
mod outcome;
mod plugin;
pub mod source;

pub use crate::{
  context::PipelineContext,
  filter::Filter,
  mangle::{EXPORTS_SCOPE, Mangle},
  memory::{Memory, Phase},
  options::{
    ADVANCED_OPTIMIZATIONS, COMPILATION_LEVEL, ClosureCompilerOptions, CompileOptionValue,
    CompileOptions, EXTERNS, FilterPattern, LANGUAGE_OUT, WARNING_LEVEL,
  },
  outcome::TransformOutcome,
  plugin::{CODE_SPLITTING_WARNING, ClosureCompilerPlugin},
};
