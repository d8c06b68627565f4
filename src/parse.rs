//! Manifest Parser
//!
//! Reads the navigation manifest with Oxc and extracts the tabs navigator's
//! screen list, the import block, the control flags and the pending command
//! queue. Extraction follows the literal's structural path, never line or
//! column heuristics:
//!
//! `<navigationExport>` → first element → `screens` → the element whose `type`
//! mentions `tabs` and whose `name` mentions the navigator name → `screens`.
//!
//! The same walk produces a [`ManifestOutline`] carrying the spans the mutator
//! edits against.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use std::collections::HashSet;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::model::{
    CommandSpec, ControlFlags, ImportDecl, ManifestSnapshot, ParsedManifest, PendingCommands,
    ScreenEntry,
};
use crate::slug::slugify;

pub const AUTOSAVE_FLAGS: [&str; 2] = ["isAutoSaveEnabled", "autosave"];
pub const EDITING_FLAGS: [&str; 2] = ["isEditing", "editing"];
pub const PENDING_COMMANDS: &str = "pendingCommands";

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS & OUTLINE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub navigation_export: String,
    pub tabs_navigator_name: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ParseOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            navigation_export: config.navigation_export.clone(),
            tabs_navigator_name: config.tabs_navigator_name.clone(),
        }
    }
}

/// One element of the tabs `screens` array.
#[derive(Debug, Clone)]
pub(crate) struct ScreenNode {
    pub span: Span,
    /// Declared `name`, if the element is an object literal carrying one.
    pub name: Option<String>,
    /// `None` for unreadable elements and for repeated names.
    pub entry: Option<ScreenEntry>,
}

#[derive(Debug, Clone)]
pub(crate) struct ScreensArray {
    pub span: Span,
    pub elements: Vec<ScreenNode>,
}

#[derive(Debug, Clone)]
pub(crate) struct ImportNode {
    pub span: Span,
    pub decl: ImportDecl,
}

/// Parsed manifest plus the source positions needed for structural edits.
#[derive(Debug, Clone)]
pub(crate) struct ManifestOutline {
    pub screens: std::result::Result<ScreensArray, String>,
    pub imports: Vec<ImportNode>,
    /// End of the directive prologue (`'use client'`), 0 when absent.
    pub prologue_end: u32,
    pub flags: ControlFlags,
    pub pending: PendingCommands,
    /// Initializer of the `pendingCommands` declaration.
    pub pending_span: Option<Span>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse manifest source into a snapshot, flags and pending commands.
///
/// Syntax errors come back as [`SyncError::Syntax`] and a missing navigator
/// shape as [`SyncError::Structure`]; both mean "wait for the next save".
pub fn parse_manifest(source: &str, options: &ParseOptions) -> Result<ParsedManifest> {
    let outline = outline_manifest(source, options)?;
    let screens = outline
        .screens
        .map_err(SyncError::Structure)?
        .elements
        .into_iter()
        .filter_map(|node| node.entry)
        .collect();

    Ok(ParsedManifest {
        snapshot: ManifestSnapshot {
            screens,
            imports: outline.imports.into_iter().map(|i| i.decl).collect(),
        },
        flags: outline.flags,
        pending: outline.pending,
    })
}

pub(crate) fn outline_manifest(source: &str, options: &ParseOptions) -> Result<ManifestOutline> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(true)
        .with_jsx(true);
    let ret = Parser::new(&allocator, source, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        return Err(SyncError::Syntax(message));
    }

    let program = &ret.program;
    let prologue_end = program
        .directives
        .last()
        .map(|d| d.span.end)
        .unwrap_or(0);

    let mut imports = Vec::new();
    for stmt in &program.body {
        if let Statement::ImportDeclaration(decl) = stmt {
            imports.push(ImportNode {
                span: decl.span,
                decl: read_import(decl),
            });
        }
    }

    let mut flags = ControlFlags::default();
    let mut pending = PendingCommands::default();
    let mut pending_span = None;
    let mut screens = Err(format!(
        "no top-level declaration named '{}'",
        options.navigation_export
    ));

    for declarator in top_level_declarators(program) {
        let BindingPattern::BindingIdentifier(id) = &declarator.id else {
            continue;
        };
        let Some(init) = &declarator.init else {
            continue;
        };
        let name = id.name.as_str();
        let init = unwrap_expression(init);

        if name == options.navigation_export {
            screens = locate_screens(init, source, options);
        } else if AUTOSAVE_FLAGS.contains(&name) {
            if let Expression::BooleanLiteral(b) = init {
                flags.autosave = b.value;
            }
        } else if EDITING_FLAGS.contains(&name) {
            if let Expression::BooleanLiteral(b) = init {
                flags.editing = b.value;
            }
        } else if name == PENDING_COMMANDS {
            if let Expression::ObjectExpression(obj) = init {
                pending = read_pending_commands(obj, source);
                pending_span = Some(obj.span);
            }
        }
    }

    Ok(ManifestOutline {
        screens,
        imports,
        prologue_end,
        flags,
        pending,
        pending_span,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURAL WALK
// ═══════════════════════════════════════════════════════════════════════════════

/// Declarators of `const x = ...` and `export const x = ...` at module level.
fn top_level_declarators<'b, 'a>(
    program: &'b Program<'a>,
) -> impl Iterator<Item = &'b VariableDeclarator<'a>> {
    program.body.iter().flat_map(|stmt| {
        let decl = match stmt {
            Statement::VariableDeclaration(decl) => Some(&**decl),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(decl)) => Some(&**decl),
                _ => None,
            },
            _ => None,
        };
        decl.into_iter().flat_map(|d| d.declarations.iter())
    })
}

/// Strip `( )`, `as T`, `satisfies T` and `!` wrappers.
fn unwrap_expression<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(e) => unwrap_expression(&e.expression),
        Expression::TSAsExpression(e) => unwrap_expression(&e.expression),
        Expression::TSSatisfiesExpression(e) => unwrap_expression(&e.expression),
        Expression::TSNonNullExpression(e) => unwrap_expression(&e.expression),
        _ => expr,
    }
}

fn property_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}

fn find_property<'b, 'a>(obj: &'b ObjectExpression<'a>, name: &str) -> Option<&'b Expression<'a>> {
    obj.properties.iter().find_map(|prop| match prop {
        ObjectPropertyKind::ObjectProperty(p) if !p.computed => {
            if property_name(&p.key).as_deref() == Some(name) {
                Some(unwrap_expression(&p.value))
            } else {
                None
            }
        }
        _ => None,
    })
}

fn locate_screens(
    init: &Expression,
    source: &str,
    options: &ParseOptions,
) -> std::result::Result<ScreensArray, String> {
    let Expression::ArrayExpression(navigators) = init else {
        return Err(format!("'{}' is not an array literal", options.navigation_export));
    };

    let root = navigators
        .elements
        .first()
        .and_then(|e| e.as_expression())
        .map(unwrap_expression);
    let Some(Expression::ObjectExpression(root)) = root else {
        return Err("first navigator is not an object literal".to_string());
    };

    let Some(Expression::ArrayExpression(root_screens)) = find_property(root, "screens") else {
        return Err("root navigator has no 'screens' array".to_string());
    };

    let tabs = root_screens.elements.iter().find_map(|el| {
        match el.as_expression().map(unwrap_expression) {
            Some(Expression::ObjectExpression(obj)) if is_tabs_navigator(obj, source, options) => {
                Some(obj)
            }
            _ => None,
        }
    });
    let Some(tabs) = tabs else {
        return Err(format!(
            "no tabs navigator named '{}'",
            options.tabs_navigator_name
        ));
    };

    let Some(Expression::ArrayExpression(tab_screens)) = find_property(tabs, "screens") else {
        return Err("tabs navigator has no 'screens' array".to_string());
    };

    let mut seen = HashSet::new();
    let elements = tab_screens
        .elements
        .iter()
        .map(|el| {
            let entry = match el.as_expression().map(unwrap_expression) {
                Some(Expression::ObjectExpression(obj)) => read_screen(obj, source),
                _ => None,
            };
            let name = entry.as_ref().map(|e| e.name.clone());
            let entry = entry.filter(|e| {
                // names become path segments under the feature and route roots
                if slugify(&e.name) != e.name {
                    tracing::warn!(
                        "screen name '{}' is not a slug, ignoring it (try '{}')",
                        e.name,
                        slugify(&e.name)
                    );
                    false
                } else if seen.insert(e.name.clone()) {
                    true
                } else {
                    tracing::warn!("duplicate screen '{}' in manifest, keeping the first", e.name);
                    false
                }
            });
            ScreenNode {
                span: el.span(),
                name,
                entry,
            }
        })
        .collect();

    Ok(ScreensArray {
        span: tab_screens.span,
        elements,
    })
}

fn is_tabs_navigator(obj: &ObjectExpression, source: &str, options: &ParseOptions) -> bool {
    let kind = find_property(obj, "type").map(|e| value_text(e, source));
    let name = find_property(obj, "name").map(|e| value_text(e, source));
    matches!(
        (kind, name),
        (Some(k), Some(n)) if k.contains("tabs") && n.contains(&options.tabs_navigator_name)
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD READERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Text of a field value: literal contents, identifier name, or the raw
/// source with quotes stripped.
fn value_text(expr: &Expression, source: &str) -> String {
    match expr {
        Expression::StringLiteral(s) => s.value.to_string(),
        Expression::Identifier(id) => id.name.to_string(),
        Expression::TemplateLiteral(t) if t.expressions.is_empty() => t
            .quasis
            .iter()
            .map(|q| q.value.cooked.as_ref().unwrap_or(&q.value.raw).to_string())
            .collect(),
        _ => {
            let span = expr.span();
            source[span.start as usize..span.end as usize]
                .replace(['\'', '"'], "")
        }
    }
}

fn read_screen(obj: &ObjectExpression, source: &str) -> Option<ScreenEntry> {
    let name = find_property(obj, "name").map(|e| value_text(e, source))?;
    if name.is_empty() {
        return None;
    }

    let mut entry = ScreenEntry {
        name,
        component_name: find_property(obj, "component").map(|e| value_text(e, source)),
        title: None,
        icon: None,
    };

    if let Some(Expression::ObjectExpression(options)) = find_property(obj, "options") {
        entry.title = find_property(options, "title").map(|e| value_text(e, source));
        entry.icon = find_property(options, "tabBarIconName").map(|e| value_text(e, source));
    }

    Some(entry)
}

fn read_import(decl: &ImportDeclaration) -> ImportDecl {
    let mut named = Vec::new();
    let mut other_bindings = Vec::new();
    if let Some(specifiers) = &decl.specifiers {
        for specifier in specifiers {
            match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    named.push(s.local.name.to_string());
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    other_bindings.push(s.local.name.to_string());
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    other_bindings.push(s.local.name.to_string());
                }
            }
        }
    }
    ImportDecl {
        source: decl.source.value.to_string(),
        named,
        other_bindings,
    }
}

fn read_pending_commands(obj: &ObjectExpression, source: &str) -> PendingCommands {
    let read_list = |key: &str| -> Vec<CommandSpec> {
        let Some(Expression::ArrayExpression(list)) = find_property(obj, key) else {
            return Vec::new();
        };
        list.elements
            .iter()
            .filter_map(|el| match el.as_expression().map(unwrap_expression) {
                Some(Expression::ObjectExpression(cmd)) => read_command(cmd, source),
                Some(Expression::StringLiteral(s)) if !s.value.trim().is_empty() => {
                    Some(CommandSpec::named(s.value.trim()))
                }
                _ => None,
            })
            .collect()
    };

    PendingCommands {
        add: read_list("add"),
        delete: read_list("delete"),
    }
}

fn read_command(obj: &ObjectExpression, source: &str) -> Option<CommandSpec> {
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| find_property(obj, k))
            .map(|e| value_text(e, source).trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Some(CommandSpec {
        name: field(&["name"])?,
        component_name: field(&["componentName", "component"]),
        title: field(&["title"]),
        icon: field(&["icon", "tabBarIconName"]),
    })
}
