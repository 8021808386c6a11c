use anyhow::bail;
use oxc::{
  allocator::Allocator,
  ast::ast::{
    AssignmentTarget, BindingPatternKind, Declaration, ExportDefaultDeclarationKind, Expression,
    ImportDeclarationSpecifier, Program, Statement,
  },
  parser::Parser,
  span::{GetSpan, SourceType, Span},
  syntax::identifier,
};

/// Global the export bridges are written to.
pub const BRIDGE_OBJECT: &str = "window";

/// The top-level shape of a module or chunk, detached from the parser's arena.
///
/// Only what the transforms rewrite is kept: hashbang, directives and module syntax. Every
/// other statement is `Other`.
#[derive(Debug, Default)]
pub struct ModuleSyntax {
  pub hashbang: Option<Span>,
  pub directives: Vec<DirectiveSyntax>,
  pub statements: Vec<StatementSyntax>,
}

#[derive(Debug)]
pub struct DirectiveSyntax {
  pub span: Span,
  pub value: String,
}

#[derive(Debug)]
pub struct StatementSyntax {
  pub span: Span,
  pub kind: StatementKind,
}

#[derive(Debug)]
pub enum StatementKind {
  /// `import ... from '...'`, with every local binding it introduces.
  Import { locals: Vec<String> },
  /// `export * from '...'` and `export { ... } from '...'`.
  ReExport { exported: Vec<String> },
  /// `export const a = 1`, `export function f() {}`.
  ExportDeclaration { declaration: Span, names: Vec<String> },
  /// `export { a, b as c }`, as `(local, exported)` pairs.
  ExportSpecifiers { specifiers: Vec<(String, String)> },
  /// `export default function f() {}` or `export default class {}`.
  ExportDefaultDeclaration { declaration: Span, name: Option<String> },
  /// `export default <expression>`.
  ExportDefaultExpression { expression: Span },
  /// `window["bridge"] = value`, possibly several joined by commas.
  Bridges(Vec<BridgeAssignment>),
  Other,
}

#[derive(Debug)]
pub struct BridgeAssignment {
  pub bridge: String,
  pub value: Span,
  /// Set when the assigned value is a plain identifier.
  pub local: Option<String>,
}

impl ModuleSyntax {
  /// Names this module exports, `default` included, in source order.
  pub fn exported_names(&self) -> Vec<String> {
    self
      .statements
      .iter()
      .flat_map(|statement| match &statement.kind {
        StatementKind::ReExport { exported } => exported.clone(),
        StatementKind::ExportDeclaration { names, .. } => names.clone(),
        StatementKind::ExportSpecifiers { specifiers } => {
          specifiers.iter().map(|(_, exported)| exported.clone()).collect()
        }
        StatementKind::ExportDefaultDeclaration { .. }
        | StatementKind::ExportDefaultExpression { .. } => vec!["default".to_string()],
        StatementKind::Import { .. } | StatementKind::Bridges(_) | StatementKind::Other => vec![],
      })
      .collect()
  }
}

pub fn source_type_for(id: &str) -> SourceType {
  SourceType::from_path(id).unwrap_or_else(|_| SourceType::mjs())
}

pub fn parse_module(source: &str, source_type: SourceType) -> anyhow::Result<ModuleSyntax> {
  let allocator = Allocator::default();
  let ret = Parser::new(&allocator, source, source_type).parse();
  if ret.panicked || !ret.errors.is_empty() {
    bail!("{:?}", ret.errors);
  }
  collect_syntax(&ret.program)
}

fn collect_syntax(program: &Program<'_>) -> anyhow::Result<ModuleSyntax> {
  let directives = program
    .directives
    .iter()
    .map(|directive| DirectiveSyntax {
      span: directive.span,
      value: directive.directive.to_string(),
    })
    .collect();
  let statements =
    program.body.iter().map(collect_statement).collect::<anyhow::Result<Vec<_>>>()?;
  Ok(ModuleSyntax {
    hashbang: program.hashbang.as_ref().map(|hashbang| hashbang.span),
    directives,
    statements,
  })
}

fn collect_statement(statement: &Statement<'_>) -> anyhow::Result<StatementSyntax> {
  let kind = match statement {
    Statement::ImportDeclaration(decl) => {
      let locals = decl
        .specifiers
        .iter()
        .flatten()
        .map(|specifier| match specifier {
          ImportDeclarationSpecifier::ImportSpecifier(s) => s.local.name.to_string(),
          ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => s.local.name.to_string(),
          ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => s.local.name.to_string(),
        })
        .collect();
      StatementKind::Import { locals }
    }
    Statement::ExportAllDeclaration(decl) => StatementKind::ReExport {
      exported: decl.exported.iter().map(|name| name.name().to_string()).collect(),
    },
    Statement::ExportNamedDeclaration(decl) if decl.source.is_some() => StatementKind::ReExport {
      exported: decl.specifiers.iter().map(|s| s.exported.name().to_string()).collect(),
    },
    Statement::ExportNamedDeclaration(decl) => match &decl.declaration {
      Some(declaration) => StatementKind::ExportDeclaration {
        declaration: declaration.span(),
        names: declared_names(declaration)?,
      },
      None => StatementKind::ExportSpecifiers {
        specifiers: decl
          .specifiers
          .iter()
          .map(|s| (s.local.name().to_string(), s.exported.name().to_string()))
          .collect(),
      },
    },
    Statement::ExportDefaultDeclaration(decl) => match &decl.declaration {
      ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
        StatementKind::ExportDefaultDeclaration {
          declaration: func.span,
          name: func.id.as_ref().map(|id| id.name.to_string()),
        }
      }
      ExportDefaultDeclarationKind::ClassDeclaration(class) => {
        StatementKind::ExportDefaultDeclaration {
          declaration: class.span,
          name: class.id.as_ref().map(|id| id.name.to_string()),
        }
      }
      ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => StatementKind::Other,
      expression => StatementKind::ExportDefaultExpression { expression: expression.span() },
    },
    Statement::ExpressionStatement(stmt) => {
      bridges(&stmt.expression).map_or(StatementKind::Other, StatementKind::Bridges)
    }
    _ => StatementKind::Other,
  };
  Ok(StatementSyntax { span: statement.span(), kind })
}

fn declared_names(declaration: &Declaration<'_>) -> anyhow::Result<Vec<String>> {
  match declaration {
    Declaration::VariableDeclaration(var) => var
      .declarations
      .iter()
      .map(|declarator| match &declarator.id.kind {
        BindingPatternKind::BindingIdentifier(id) => Ok(id.name.to_string()),
        _ => bail!("Destructuring exports are not supported"),
      })
      .collect(),
    Declaration::FunctionDeclaration(func) => {
      Ok(func.id.iter().map(|id| id.name.to_string()).collect())
    }
    Declaration::ClassDeclaration(class) => {
      Ok(class.id.iter().map(|id| id.name.to_string()).collect())
    }
    _ => bail!("Unsupported export declaration"),
  }
}

/// Matches statements made only of `window["bridge"] = value` assignments.
fn bridges(expression: &Expression<'_>) -> Option<Vec<BridgeAssignment>> {
  match expression {
    Expression::SequenceExpression(seq) => {
      seq.expressions.iter().map(bridge).collect::<Option<Vec<_>>>()
    }
    expression => bridge(expression).map(|bridge| vec![bridge]),
  }
}

fn bridge(expression: &Expression<'_>) -> Option<BridgeAssignment> {
  let Expression::AssignmentExpression(assign) = expression else {
    return None;
  };
  let bridge = match &assign.left {
    AssignmentTarget::ComputedMemberExpression(member) => {
      match (&member.object, &member.expression) {
        (Expression::Identifier(object), Expression::StringLiteral(property))
          if object.name.as_str() == BRIDGE_OBJECT =>
        {
          property.value.to_string()
        }
        _ => return None,
      }
    }
    AssignmentTarget::StaticMemberExpression(member) => match &member.object {
      Expression::Identifier(object) if object.name.as_str() == BRIDGE_OBJECT => {
        member.property.name.to_string()
      }
      _ => return None,
    },
    _ => return None,
  };
  let local = match &assign.right {
    Expression::Identifier(ident) => Some(ident.name.to_string()),
    _ => None,
  };
  Some(BridgeAssignment { bridge, value: assign.right.span(), local })
}

pub fn slice(source: &str, span: Span) -> &str {
  &source[span.start as usize..span.end as usize]
}

/// Renders a name for use in `import`/`export` clauses, quoting it when it isn't an identifier.
pub fn to_module_export_name(name: &str) -> anyhow::Result<String> {
  if identifier::is_identifier_name(name) {
    Ok(name.to_string())
  } else {
    Ok(serde_json::to_string(name)?)
  }
}
