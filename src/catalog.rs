use crate::common::error::FatalError;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A named benchmark operation: one parameterized statement, or an ordered
/// statement sequence forming a single logical transaction.
///
/// Bound-parameter slots are denoted by `?` in the statement text.
#[derive(PartialEq, Debug, Clone)]
pub enum Template {
    Single(String),
    Sequence(Vec<String>),
}

impl Template {
    /// Statements in execution order.
    pub fn statements(&self) -> &[String] {
        match self {
            Template::Single(stmt) => std::slice::from_ref(stmt),
            Template::Sequence(stmts) => stmts,
        }
    }

    /// Total bound-parameter slots across all statements.
    pub fn arity(&self) -> usize {
        self.statements().iter().map(|s| statement_arity(s)).sum()
    }
}

/// Count the placeholder markers in a single statement.
pub fn statement_arity(stmt: &str) -> usize {
    stmt.matches('?').count()
}

/// Immutable mapping from template name to statement(s), loaded once at
/// startup and shared read-only with all drivers.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: HashMap<String, Template>,
}

impl Catalog {
    /// Load the template definitions from `path`.
    pub fn load(path: &str) -> Result<Catalog, FatalError> {
        let contents = fs::read_to_string(Path::new(path))
            .map_err(|e| FatalError::CatalogLoad(format!("{}: {}", path, e)))?;
        let catalog = Self::parse(&contents)?;
        info!("loaded {} templates from {}", catalog.len(), path);
        Ok(catalog)
    }

    /// Parse a template definition document.
    ///
    /// Tries the strict TOML parser first and falls back to a permissive
    /// line-oriented parser. The fallback also accepts unquoted dotted names
    /// such as `AT-3.1`, which strict TOML reads as nested tables.
    pub fn parse(contents: &str) -> Result<Catalog, FatalError> {
        match parse_strict(contents) {
            Ok(templates) => Ok(Catalog { templates }),
            Err(reason) => {
                debug!("strict parse failed ({}), trying line parser", reason);
                let templates = parse_permissive(contents);
                if templates.is_empty() {
                    Err(FatalError::CatalogLoad(reason))
                } else {
                    Ok(Catalog { templates })
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for Catalog {
    /// Parse-only listing: name, statement count, arity.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for name in self.names() {
            let template = &self.templates[name];
            match template {
                Template::Single(_) => {
                    writeln!(f, "{}: {} parameters", name, template.arity())?
                }
                Template::Sequence(stmts) => writeln!(
                    f,
                    "{}: {} statements, {} parameters",
                    name,
                    stmts.len(),
                    template.arity()
                )?,
            }
        }
        Ok(())
    }
}

/// Strict parser: a flat TOML table of string or string-array values.
fn parse_strict(contents: &str) -> Result<HashMap<String, Template>, String> {
    let value: toml::Value = contents.parse().map_err(|e| format!("{}", e))?;
    let table = value.as_table().ok_or("document is not a table")?;

    let mut templates = HashMap::new();
    for (name, entry) in table {
        match entry {
            toml::Value::String(stmt) => {
                templates.insert(name.clone(), Template::Single(stmt.trim().to_string()));
            }
            toml::Value::Array(items) => {
                let mut stmts = Vec::with_capacity(items.len());
                for item in items {
                    let stmt = item
                        .as_str()
                        .ok_or_else(|| format!("{}: list element is not a string", name))?;
                    stmts.push(stmt.trim().to_string());
                }
                templates.insert(name.clone(), Template::Sequence(stmts));
            }
            _ => return Err(format!("{}: value is not a statement or list", name)),
        }
    }
    Ok(templates)
}

/// Permissive line-oriented parser. Must produce the same mapping as the
/// strict parser for well-formed input.
fn parse_permissive(contents: &str) -> HashMap<String, Template> {
    let mut templates = HashMap::new();
    let lines: Vec<&str> = contents.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let eq = match find_unquoted(line, '=') {
            Some(pos) => pos,
            None => continue,
        };
        let name = unquote(line[..eq].trim()).to_string();
        let rest = line[eq + 1..].trim();

        if let Some(opened) = rest.strip_prefix("\"\"\"") {
            // Multi-line block; closing delimiter may be on the same line.
            let mut body = String::new();
            if let Some(end) = opened.find("\"\"\"") {
                body.push_str(&opened[..end]);
            } else {
                body.push_str(opened);
                while i < lines.len() {
                    let next = lines[i];
                    i += 1;
                    if let Some(end) = next.find("\"\"\"") {
                        body.push('\n');
                        body.push_str(&next[..end]);
                        break;
                    }
                    body.push('\n');
                    body.push_str(next);
                }
            }
            templates.insert(name, Template::Single(body.trim().to_string()));
        } else if rest.starts_with('[') {
            let mut buf = rest.to_string();
            while find_unquoted(&buf, ']').is_none() && i < lines.len() {
                buf.push(' ');
                buf.push_str(lines[i].trim());
                i += 1;
            }
            templates.insert(name, Template::Sequence(split_list(&buf)));
        } else if rest.starts_with('"') {
            templates.insert(name, Template::Single(unquote(rest).trim().to_string()));
        }
    }
    templates
}

/// Position of `target` outside any quoted string.
fn find_unquoted(line: &str, target: char) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (pos, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == target && !in_string => return Some(pos),
            _ => {}
        }
    }
    None
}

/// Strip one pair of surrounding double quotes, if present.
fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Split a bracketed list into its quoted elements.
fn split_list(buf: &str) -> Vec<String> {
    let open = buf.find('[').map(|p| p + 1).unwrap_or(0);
    let close = find_unquoted(buf, ']').unwrap_or_else(|| buf.len());
    let inner = &buf[open..close];

    let mut stmts = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if in_string => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            ',' if !in_string => {
                let stmt = unquote(current.trim()).trim().to_string();
                if !stmt.is_empty() {
                    stmts.push(stmt);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let stmt = unquote(current.trim()).trim().to_string();
    if !stmt.is_empty() {
        stmts.push(stmt);
    }
    stmts
}
