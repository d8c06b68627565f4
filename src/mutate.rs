//! Manifest Mutator
//!
//! Applies a [`ManifestEdits`] request to manifest source. The manifest is
//! parsed with Oxc, every requested change is turned into a span-anchored text
//! edit against that tree, and the edits are applied in one pass from the end
//! of the file backwards. Text outside the touched spans (comments, formatting,
//! unrelated code) comes through byte-for-byte.
//!
//! New nodes are rendered by a small printer that follows the surrounding
//! indentation, quote and semicolon style.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{Result, SyncError};
use crate::model::{ImportSpec, ScreenEntry};
use crate::parse::{outline_manifest, ImportNode, ManifestOutline, ParseOptions, ScreensArray};
use crate::slug::{humanize, is_valid_identifier};

/// Replacement for a cleared `pendingCommands` initializer.
pub const EMPTY_PENDING_COMMANDS: &str = "{ add: [], delete: [] }";

// ═══════════════════════════════════════════════════════════════════════════════
// EDIT REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEdits {
    pub screens_to_add: Vec<ScreenEntry>,
    pub screen_names_to_delete: Vec<String>,
    pub imports_to_add: Vec<ImportSpec>,
    pub imports_to_remove: Vec<ImportSpec>,
    pub clear_pending_commands: bool,
}

impl ManifestEdits {
    pub fn is_empty(&self) -> bool {
        self.screens_to_add.is_empty()
            && self.screen_names_to_delete.is_empty()
            && self.imports_to_add.is_empty()
            && self.imports_to_remove.is_empty()
            && !self.clear_pending_commands
    }

    pub fn add_import(mut self, spec: ImportSpec) -> Self {
        self.imports_to_add.push(spec);
        self
    }

    pub fn remove_import(mut self, spec: ImportSpec) -> Self {
        self.imports_to_remove.push(spec);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub source: String,
    pub changed: bool,
    /// Requested edits that were skipped, one line each.
    pub warnings: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT EDITS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    start: usize,
    end: usize,
    text: String,
}

impl TextEdit {
    fn insert(at: usize, text: String) -> Self {
        Self {
            start: at,
            end: at,
            text,
        }
    }

    fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }
}

fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> Result<String> {
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    for pair in edits.windows(2) {
        // pair[0] starts at or after pair[1]
        if pair[1].end > pair[0].start {
            return Err(SyncError::InvalidEdit(format!(
                "overlapping edits at {}..{} and {}..{}",
                pair[1].start, pair[1].end, pair[0].start, pair[0].end
            )));
        }
    }

    let mut result = source.to_string();
    for edit in edits {
        result.replace_range(edit.start..edit.end, &edit.text);
    }
    Ok(result)
}

/// Range covering a node on its own line: leading indentation, an optional
/// trailing comma and the line break. Nodes sharing a line with other code
/// only lose their own span (and comma).
fn line_range(source: &str, start: usize, end: usize, eat_comma: bool) -> (usize, usize) {
    let bytes = source.as_bytes();
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let own_line = source[line_start..start].trim().is_empty();

    let skip_blank = |mut i: usize| {
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        i
    };

    let mut e = end;
    if eat_comma {
        let i = skip_blank(e);
        if i < bytes.len() && bytes[i] == b',' {
            e = i + 1;
        }
    }

    if !own_line {
        return (start, e);
    }

    let i = skip_blank(e);
    if source[i..].starts_with("\r\n") {
        (line_start, i + 2)
    } else if i < bytes.len() && bytes[i] == b'\n' {
        (line_start, i + 1)
    } else if i == bytes.len() {
        (line_start, i)
    } else {
        (line_start, e)
    }
}

/// Leading whitespace of the line containing `pos`, if `pos` is the first
/// non-blank character on it.
fn indent_at(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &source[line_start..pos];
    prefix.trim().is_empty().then_some(prefix)
}

fn line_indent(source: &str, pos: usize) -> &str {
    let line_start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &source[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRINTER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct Style {
    unit: &'static str,
    quote: char,
    semicolons: bool,
}

fn quote_str(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Object literal for one screen. The first line carries no indentation; the
/// caller places it after its own line break and indent.
fn render_screen(entry: &ScreenEntry, component: &str, indent: &str, style: Style) -> String {
    let inner = format!("{}{}", indent, style.unit);
    let nested = format!("{}{}", inner, style.unit);
    let title = entry
        .title
        .clone()
        .unwrap_or_else(|| humanize(&entry.name));
    let icon = entry.icon.clone().unwrap_or_else(|| entry.name.clone());

    let mut out = String::from("{\n");
    out.push_str(&format!("{}name: {},\n", inner, quote_str(&entry.name, style.quote)));
    out.push_str(&format!("{}component: {},\n", inner, component));
    out.push_str(&format!("{}options: {{\n", inner));
    out.push_str(&format!("{}title: {},\n", nested, quote_str(&title, style.quote)));
    out.push_str(&format!(
        "{}tabBarIconName: {},\n",
        nested,
        quote_str(&icon, style.quote)
    ));
    out.push_str(&format!("{}}},\n", inner));
    out.push_str(&format!("{}}}", indent));
    out
}

fn render_import(spec: &ImportSpec, style: Style) -> String {
    format!(
        "import {{ {} }} from {}{}",
        spec.component,
        quote_str(&spec.source, style.quote),
        if style.semicolons { ";" } else { "" }
    )
}

fn node_text<'s>(source: &'s str, node: &ImportNode) -> &'s str {
    &source[node.span.start as usize..node.span.end as usize]
}

fn detect_style(source: &str, outline: &ManifestOutline) -> Style {
    let unit = if source.contains("\n\t") { "\t" } else { "  " };
    // the last quote of an import closes its module path
    let quote = outline
        .imports
        .first()
        .map(|node| node_text(source, node))
        .and_then(|text| text.rfind(['\'', '"']).map(|p| text.as_bytes()[p] as char))
        .unwrap_or('\'');
    let semicolons = outline
        .imports
        .last()
        .map(|node| node_text(source, node).ends_with(';'))
        .unwrap_or(true);

    Style {
        unit,
        quote,
        semicolons,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MUTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Apply `edits` to `source` and return the re-serialized manifest.
///
/// Edits that cannot be located (no screens array, unknown screen, import
/// still binding other symbols) are skipped and reported in
/// [`MutationOutcome::warnings`]. The result is re-parsed before it is
/// returned; output that no longer parses is an error.
pub fn mutate_manifest(
    source: &str,
    edits: &ManifestEdits,
    options: &ParseOptions,
) -> Result<MutationOutcome> {
    let outline = outline_manifest(source, options)?;
    let style = detect_style(source, &outline);
    let mut warnings = Vec::new();
    let mut text_edits = Vec::new();

    if !edits.screens_to_add.is_empty() || !edits.screen_names_to_delete.is_empty() {
        match &outline.screens {
            Ok(array) => {
                text_edits.extend(edit_screens(source, array, edits, style, &mut warnings));
            }
            Err(reason) => warnings.push(format!("screen edits skipped: {}", reason)),
        }
    }

    text_edits.extend(edit_imports(source, &outline, edits, style, &mut warnings));

    if edits.clear_pending_commands && !outline.pending.is_empty() {
        if let Some(span) = outline.pending_span {
            text_edits.push(TextEdit {
                start: span.start as usize,
                end: span.end as usize,
                text: EMPTY_PENDING_COMMANDS.to_string(),
            });
        }
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    if text_edits.is_empty() {
        return Ok(MutationOutcome {
            source: source.to_string(),
            changed: false,
            warnings,
        });
    }

    let output = apply_edits(source, text_edits)?;
    if let Err(e) = outline_manifest(&output, options) {
        return Err(SyncError::InvalidEdit(e.to_string()));
    }

    Ok(MutationOutcome {
        changed: output != source,
        source: output,
        warnings,
    })
}

fn edit_screens(
    source: &str,
    array: &ScreensArray,
    edits: &ManifestEdits,
    style: Style,
    warnings: &mut Vec<String>,
) -> Vec<TextEdit> {
    let mut out = Vec::new();
    let doomed: HashSet<&str> = edits
        .screen_names_to_delete
        .iter()
        .map(String::as_str)
        .collect();

    for name in &edits.screen_names_to_delete {
        if !array.elements.iter().any(|e| e.name.as_ref() == Some(name)) {
            warnings.push(format!("screen '{}' not found, nothing to remove", name));
        }
    }

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for element in &array.elements {
        match element.name.as_deref() {
            Some(name) if doomed.contains(name) => removed.push(element),
            _ => kept.push(element),
        }
    }

    let mut present: HashSet<String> = kept.iter().filter_map(|e| e.name.clone()).collect();
    let mut additions = Vec::new();
    for entry in &edits.screens_to_add {
        let Some(component) = entry.component().filter(|c| is_valid_identifier(c)) else {
            warnings.push(format!(
                "screen '{}' has no valid component name, not inserted",
                entry.name
            ));
            continue;
        };
        if !present.insert(entry.name.clone()) {
            warnings.push(format!("screen '{}' already declared, not inserted", entry.name));
            continue;
        }
        additions.push((entry, component));
    }

    let open = array.span.start as usize;
    let close = array.span.end as usize - 1;

    if kept.is_empty() {
        if removed.is_empty() && additions.is_empty() {
            return out;
        }
        let closing_indent = indent_at(source, close)
            .unwrap_or_else(|| line_indent(source, open))
            .to_string();
        let indent = array
            .elements
            .first()
            .and_then(|e| indent_at(source, e.span.start as usize))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", closing_indent, style.unit));

        let body = if additions.is_empty() {
            String::new()
        } else {
            let mut body = String::new();
            for (entry, component) in &additions {
                body.push('\n');
                body.push_str(&indent);
                body.push_str(&render_screen(entry, component, &indent, style));
                body.push(',');
            }
            body.push('\n');
            body.push_str(&closing_indent);
            body
        };
        out.push(TextEdit {
            start: open + 1,
            end: close,
            text: body,
        });
        return out;
    }

    for element in &removed {
        let (start, end) = line_range(
            source,
            element.span.start as usize,
            element.span.end as usize,
            true,
        );
        out.push(TextEdit::delete(start, end));
    }

    if !additions.is_empty() {
        let anchor = kept[kept.len() - 1];
        let indent = kept
            .iter()
            .find_map(|e| indent_at(source, e.span.start as usize))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", line_indent(source, open), style.unit));

        let mut text = String::new();
        for (entry, component) in &additions {
            text.push_str(",\n");
            text.push_str(&indent);
            text.push_str(&render_screen(entry, component, &indent, style));
        }
        out.push(TextEdit::insert(anchor.span.end as usize, text));
    }

    out
}

fn edit_imports(
    source: &str,
    outline: &ManifestOutline,
    edits: &ManifestEdits,
    style: Style,
    warnings: &mut Vec<String>,
) -> Vec<TextEdit> {
    let mut out = Vec::new();

    let mut removals: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for spec in &edits.imports_to_remove {
        removals
            .entry(spec.source.as_str())
            .or_default()
            .insert(spec.component.as_str());
    }

    let mut dropped: Vec<&ImportNode> = Vec::new();
    for node in &outline.imports {
        let Some(components) = removals.get(node.decl.source.as_str()) else {
            continue;
        };
        let fully_removed = !node.decl.named.is_empty()
            && node.decl.other_bindings.is_empty()
            && node.decl.named.iter().all(|n| components.contains(n.as_str()));

        if fully_removed {
            let (start, end) = line_range(
                source,
                node.span.start as usize,
                node.span.end as usize,
                false,
            );
            out.push(TextEdit::delete(start, end));
            dropped.push(node);
        } else if node.decl.named.iter().any(|n| components.contains(n.as_str())) {
            warnings.push(format!(
                "import from '{}' binds other symbols, left untouched",
                node.decl.source
            ));
        }
    }

    let surviving: Vec<&ImportNode> = outline
        .imports
        .iter()
        .filter(|n| !dropped.iter().any(|d| std::ptr::eq(*d, *n)))
        .collect();

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for spec in &edits.imports_to_add {
        let exists = surviving
            .iter()
            .any(|n| n.decl.source == spec.source && n.decl.imports(&spec.component));
        if exists || !seen.insert(spec) {
            tracing::debug!("import for {} already present", spec.component);
            continue;
        }
        lines.push(render_import(spec, style));
    }

    if lines.is_empty() {
        return out;
    }

    let (anchor, text) = match surviving.last() {
        Some(last) => (
            last.span.end as usize,
            lines.iter().map(|l| format!("\n{}", l)).collect::<String>(),
        ),
        None if outline.prologue_end > 0 => (
            outline.prologue_end as usize,
            lines.iter().map(|l| format!("\n{}", l)).collect::<String>(),
        ),
        None => (0, lines.iter().map(|l| format!("{}\n", l)).collect::<String>()),
    };
    out.push(TextEdit::insert(anchor, text));
    out
}
