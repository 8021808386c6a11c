use anyhow::{Context, bail, ensure};
use arcstr::ArcStr;
use minipack_common::RenderedChunk;
use minipack_sourcemap::MagicString;
use oxc::span::SourceType;
use rustc_hash::FxHashSet;

use super::{ChunkTransform, ChunkUnit};
use crate::{
  ast::{BRIDGE_OBJECT, StatementKind, parse_module, slice, to_module_export_name},
  context::PipelineContext,
  mangle::EXPORTS_SCOPE,
  options::FxIndexSet,
};

/// Binds anonymous default exports so they can be bridged.
const DEFAULT_EXPORT_LOCAL: &str = "__closure_default_export__";
/// Prefix of the bindings introduced for bridged values the compiler inlined.
const INLINED_EXPORT_PREFIX: &str = "__closure_export_";

/// Carries module exports through the compiler.
///
/// Export syntax is rewritten to assignments of a quoted property on the global object, which the
/// compiler must keep. The property names come from the build-wide `exports` scope of the
/// mangler. After compilation the assignments are found again and turned back into exports.
///
/// Properties of the global object the chunk assigns itself are reserved in the `exports` scope,
/// and a chunk whose own assignments would still be mistaken for a bridge is rejected.
#[derive(Debug, Default)]
pub struct ExportTransform {
  /// Bridges issued for this chunk, in export order.
  bridges: FxIndexSet<ArcStr>,
  /// Global properties the linked chunk assigns on its own.
  globals: FxHashSet<String>,
}

impl ExportTransform {
  fn resolve(&mut self, ctx: &PipelineContext, exported: &str) -> anyhow::Result<ArcStr> {
    let bridge = ctx.mangler.resolve(exported, EXPORTS_SCOPE);
    ensure!(
      !self.globals.contains(bridge.as_str()),
      "Bridge `{bridge}` of export `{exported}` is assigned by the chunk itself"
    );
    self.bridges.insert(bridge.clone());
    Ok(bridge)
  }

  fn bridge(
    &mut self,
    ctx: &PipelineContext,
    exported: &str,
    value: &str,
  ) -> anyhow::Result<String> {
    let bridge = self.resolve(ctx, exported)?;
    Ok(format!("{BRIDGE_OBJECT}[\"{bridge}\"] = {value};"))
  }
}

impl ChunkTransform for ExportTransform {
  fn name(&self) -> &'static str {
    "ExportTransform"
  }

  fn pre_compilation(
    &mut self,
    ctx: &PipelineContext,
    unit: &ChunkUnit<'_>,
    edit: &mut MagicString<'_>,
  ) -> anyhow::Result<()> {
    for statement in &unit.syntax.statements {
      if let StatementKind::Bridges(assignments) = &statement.kind {
        for assignment in assignments {
          ctx.mangler.reserve(&assignment.bridge, EXPORTS_SCOPE);
          self.globals.insert(assignment.bridge.clone());
        }
      }
    }

    // Bridges of declarations go last, where every exported binding is initialized.
    let mut trailer = String::new();
    for statement in &unit.syntax.statements {
      let start = statement.span.start as usize;
      match &statement.kind {
        StatementKind::ExportDeclaration { declaration, names } => {
          edit.remove(start, declaration.start as usize);
          for name in names {
            trailer.push('\n');
            trailer.push_str(&self.bridge(ctx, name, name)?);
          }
        }
        StatementKind::ExportSpecifiers { specifiers } => {
          edit.remove(start, statement.span.end as usize);
          for (local, exported) in specifiers {
            trailer.push('\n');
            trailer.push_str(&self.bridge(ctx, exported, local)?);
          }
        }
        StatementKind::ExportDefaultDeclaration { declaration, name: Some(name) } => {
          edit.remove(start, declaration.start as usize);
          trailer.push('\n');
          trailer.push_str(&self.bridge(ctx, "default", name)?);
        }
        StatementKind::ExportDefaultDeclaration { declaration, name: None } => {
          let end = declaration.end as usize;
          ensure!(
            unit.code[..end].ends_with('}'),
            "Unexpected end of default export in {}",
            unit.chunk.file_name
          );
          edit.update(
            start,
            declaration.start as usize,
            format!("const {DEFAULT_EXPORT_LOCAL} = "),
          );
          edit.update(end - 1, end, "};");
          trailer.push('\n');
          trailer.push_str(&self.bridge(ctx, "default", DEFAULT_EXPORT_LOCAL)?);
        }
        StatementKind::ExportDefaultExpression { expression } => {
          let bridge = self.resolve(ctx, "default")?;
          edit.update(
            start,
            expression.start as usize,
            format!("{BRIDGE_OBJECT}[\"{bridge}\"] = "),
          );
        }
        _ => {}
      }
    }
    if !trailer.is_empty() {
      edit.append(trailer);
    }
    Ok(())
  }

  fn post_compilation(
    &self,
    ctx: &PipelineContext,
    chunk: &RenderedChunk,
    code: String,
  ) -> anyhow::Result<String> {
    if self.bridges.is_empty() {
      return Ok(code);
    }

    let syntax = parse_module(&code, SourceType::mjs())?;
    let mut edit = MagicString::new(code.as_str());
    let mut specifiers = vec![];
    let mut found = FxHashSet::default();

    for statement in &syntax.statements {
      let StatementKind::Bridges(assignments) = &statement.kind else {
        continue;
      };
      if !assignments.iter().all(|assignment| self.bridges.contains(assignment.bridge.as_str())) {
        continue;
      }

      let mut declarations = String::new();
      for assignment in assignments {
        ensure!(
          found.insert(assignment.bridge.as_str()),
          "Bridge `{}` is assigned more than once in the compiled {}",
          assignment.bridge,
          chunk.file_name
        );
        let exported = ctx
          .mangler
          .original(&assignment.bridge, EXPORTS_SCOPE)
          .with_context(|| format!("Bridge `{}` was never issued", assignment.bridge))?;
        let local = match &assignment.local {
          Some(local) => local.clone(),
          None => {
            let local = format!("{INLINED_EXPORT_PREFIX}{}", assignment.bridge);
            declarations.push_str(&format!("var {local} = {};", slice(&code, assignment.value)));
            local
          }
        };
        specifiers.push(if local == exported.as_str() {
          local
        } else {
          format!("{local} as {}", to_module_export_name(&exported)?)
        });
      }

      let span = statement.span;
      if declarations.is_empty() {
        edit.remove(span.start as usize, span.end as usize);
      } else {
        edit.update(span.start as usize, span.end as usize, declarations);
      }
    }

    if let Some(bridge) = self.bridges.iter().find(|bridge| !found.contains(bridge.as_str())) {
      bail!("Bridge `{bridge}` is missing from the compiled {}", chunk.file_name);
    }

    edit.append(format!("\nexport {{ {} }};", specifiers.join(", ")));
    Ok(edit.to_string())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::options::CompileOptions;

  fn try_pre(ctx: &PipelineContext, code: &str) -> anyhow::Result<(ExportTransform, String)> {
    let syntax = parse_module(code, SourceType::mjs())?;
    let chunk = RenderedChunk::new("main", "main.js");
    let unit = ChunkUnit { chunk: &chunk, code, syntax: &syntax };
    let mut transform = ExportTransform::default();
    let mut edit = MagicString::new(code);
    transform.pre_compilation(ctx, &unit, &mut edit)?;
    Ok((transform, edit.to_string()))
  }

  fn pre(ctx: &PipelineContext, code: &str) -> (ExportTransform, String) {
    try_pre(ctx, code).unwrap()
  }

  #[test]
  fn rewrites_exports_into_bridges() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    let (_, code) = pre(
      &ctx,
      "const a = 1;\nexport function f() {}\nexport { a as b };\nexport default class {}\n",
    );
    assert_eq!(
      code,
      concat!(
        "const a = 1;\nfunction f() {}\n\nconst __closure_default_export__ = class {};\n\n",
        "window[\"a\"] = f;\nwindow[\"b\"] = a;\nwindow[\"c\"] = __closure_default_export__;",
      )
    );
  }

  #[test]
  fn restores_exports_from_compiled_code() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    let (transform, _) = pre(&ctx, "export const foo = 1;\nexport default foo + 1;\n");
    assert_eq!(ctx.mangler.resolve("foo", EXPORTS_SCOPE), "a");
    assert_eq!(ctx.mangler.resolve("default", EXPORTS_SCOPE), "b");

    let chunk = RenderedChunk::new("main", "main.js");
    let compiled = "var c=1;window.b=2;window.a=c;".to_string();
    let restored = transform.post_compilation(&ctx, &chunk, compiled).unwrap();
    assert_eq!(
      restored,
      "var c=1;var __closure_export_b = 2;\nexport { __closure_export_b as default, c as foo };"
    );
  }

  #[test]
  fn missing_bridge_is_an_error() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    let (transform, _) = pre(&ctx, "export const foo = 1;\n");
    let chunk = RenderedChunk::new("main", "main.js");
    assert!(transform.post_compilation(&ctx, &chunk, "var c=1;".to_string()).is_err());
  }

  #[test]
  fn own_global_assignments_are_kept() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    let (transform, code) = pre(&ctx, "window.a = 1;\nexport const foo = 2;\n");
    assert_eq!(code, "window.a = 1;\nconst foo = 2;\n\nwindow[\"b\"] = foo;");

    let chunk = RenderedChunk::new("main", "main.js");
    let restored = transform.post_compilation(&ctx, &chunk, code).unwrap();
    assert_eq!(restored, "window.a = 1;\nconst foo = 2;\n\n\nexport { foo };");
  }

  #[test]
  fn global_assignment_on_an_issued_bridge_is_rejected() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    assert_eq!(ctx.mangler.resolve("foo", EXPORTS_SCOPE), "a");
    assert!(try_pre(&ctx, "window.a = 1;\nexport const foo = 2;\n").is_err());
  }

  #[test]
  fn bridge_assigned_twice_is_an_error() {
    let ctx = PipelineContext::for_test(CompileOptions::default());
    let (transform, _) = pre(&ctx, "export const foo = 1;\n");
    let chunk = RenderedChunk::new("main", "main.js");
    let compiled = "var c=1;window.a=c;window.a=c;".to_string();
    assert!(transform.post_compilation(&ctx, &chunk, compiled).is_err());
  }
}
