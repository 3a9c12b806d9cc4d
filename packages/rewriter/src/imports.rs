use crate::declaration::{DeclarationKind, ImportClause, Specifier};
use playbox_common::Cursor;

/// File extensions of imports that carry no runtime value
const RESOURCE_EXTENSIONS: &[&str] = &[
    ".css", ".scss", ".sass", ".less", ".styl", ".pcss", ".svg", ".png", ".jpg", ".jpeg", ".gif",
    ".webp", ".woff", ".woff2",
];

/// Parsed `import` declaration
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportDecl {
    /// None for a bare `import "m"`
    pub clause: Option<ImportClause>,
    pub module: String,
}

impl ImportDecl {
    pub fn kind(&self) -> DeclarationKind {
        match &self.clause {
            Some(clause) => clause.kind(),
            None if is_resource(&self.module) => DeclarationKind::ResourceImport,
            None => DeclarationKind::SideEffectImport,
        }
    }
}

pub(crate) fn is_resource(module: &str) -> bool {
    let path = module.split(['?', '#']).next().unwrap_or(module);
    let lower = path.to_ascii_lowercase();
    RESOURCE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Parse the rest of an import declaration. The cursor sits just after the
/// `import` keyword; on success it is left after the optional `;`.
///
/// Returns `None` for anything that is not a static import declaration
/// (`import(...)`, `import.meta`, malformed clauses); the caller then leaves
/// the text alone.
pub(crate) fn parse_import(cursor: &mut Cursor) -> Option<ImportDecl> {
    cursor.skip_trivia().ok()?;

    match cursor.peek()? {
        '(' | '.' => None,
        '"' | '\'' => {
            let module = read_module_specifier(cursor)?;
            eat_semicolon(cursor);
            Some(ImportDecl {
                clause: None,
                module,
            })
        }
        _ => {
            let clause = parse_clause(cursor)?;
            cursor.skip_trivia().ok()?;
            if !cursor.eat_keyword("from") {
                return None;
            }
            cursor.skip_trivia().ok()?;
            let module = read_module_specifier(cursor)?;
            eat_semicolon(cursor);
            Some(ImportDecl {
                clause: Some(clause),
                module,
            })
        }
    }
}

fn parse_clause(cursor: &mut Cursor) -> Option<ImportClause> {
    let mut clause = ImportClause::default();

    if let Some(name) = cursor.ident() {
        clause.default = Some(name.to_string());
        cursor.skip_trivia().ok()?;
        if !cursor.eat(",") {
            return Some(clause);
        }
        cursor.skip_trivia().ok()?;
    }

    match cursor.peek()? {
        '*' => {
            cursor.bump();
            cursor.skip_trivia().ok()?;
            if !cursor.eat_keyword("as") {
                return None;
            }
            cursor.skip_trivia().ok()?;
            clause.namespace = Some(cursor.ident()?.to_string());
        }
        '{' => {
            cursor.bump();
            clause.named = Some(parse_specifiers(cursor)?);
        }
        _ => return None,
    }

    Some(clause)
}

/// `{ a, b as c, default as D, }`; the opening brace is already consumed
pub(crate) fn parse_specifiers(cursor: &mut Cursor) -> Option<Vec<Specifier>> {
    let mut specifiers = Vec::new();
    loop {
        cursor.skip_trivia().ok()?;
        if cursor.eat("}") {
            return Some(specifiers);
        }

        let imported = match cursor.peek()? {
            '"' | '\'' => read_module_specifier(cursor)?,
            _ => cursor.ident()?.to_string(),
        };
        cursor.skip_trivia().ok()?;
        let local = if cursor.eat_keyword("as") {
            cursor.skip_trivia().ok()?;
            cursor.ident()?.to_string()
        } else {
            imported.clone()
        };
        specifiers.push(Specifier { imported, local });

        cursor.skip_trivia().ok()?;
        if !cursor.eat(",") {
            cursor.skip_trivia().ok()?;
            return cursor.eat("}").then_some(specifiers);
        }
    }
}

/// Read a quoted module name, returning its unquoted contents
pub(crate) fn read_module_specifier(cursor: &mut Cursor) -> Option<String> {
    let quote = cursor.peek()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let start = cursor.pos();
    cursor.skip_string().ok()?;
    let raw = cursor.slice(start + 1, cursor.pos() - 1);
    Some(raw.replace(&format!("\\{}", quote), &quote.to_string()))
}

/// Consume a `;` on the same line, if present
pub(crate) fn eat_semicolon(cursor: &mut Cursor) {
    let save = cursor.pos();
    cursor.eat_while(|c| c == ' ' || c == '\t');
    if !cursor.eat(";") {
        cursor.set_pos(save);
    }
}

/// Render the replacement text for an import
pub(crate) fn emit_import(decl: &ImportDecl, resolve_fn: &str, temp: &str) -> String {
    let call = format!("{}({})", resolve_fn, quote(&decl.module));
    let clause = match &decl.clause {
        Some(clause) => clause,
        None => return String::new(),
    };

    match decl.kind() {
        DeclarationKind::NamespaceImport => {
            format!("const {} = {};", clause.namespace.as_deref().unwrap_or(temp), call)
        }
        DeclarationKind::NamedImport => {
            format!("const {} = {};", destructure(clause.named.as_deref().unwrap_or(&[])), call)
        }
        _ => {
            let mut out = format!("const {} = {};", temp, call);
            if let Some(default) = &clause.default {
                out.push_str(&format!(" const {} = {}.default ?? {};", default, temp, temp));
            }
            if let Some(namespace) = &clause.namespace {
                out.push_str(&format!(" const {} = {};", namespace, temp));
            }
            if let Some(named) = &clause.named {
                out.push_str(&format!(" const {} = {};", destructure(named), temp));
            }
            out
        }
    }
}

fn destructure(specifiers: &[Specifier]) -> String {
    if specifiers.is_empty() {
        return "{}".to_string();
    }
    let parts: Vec<String> = specifiers.iter().map(Specifier::to_pattern).collect();
    format!("{{ {} }}", parts.join(", "))
}

fn quote(module: &str) -> String {
    format!("\"{}\"", module.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<ImportDecl> {
        let mut cursor = Cursor::new(text);
        assert!(cursor.eat_keyword("import"));
        parse_import(&mut cursor)
    }

    #[test]
    fn test_resource_detection() {
        assert!(is_resource("reactflow/dist/style.css"));
        assert!(is_resource("./theme.SCSS?inline"));
        assert!(!is_resource("react"));
        assert!(!is_resource("./css"));
    }

    #[test]
    fn test_parse_combined() {
        let decl = parse("import Foo, { a, b as c } from 'm';").unwrap();
        let clause = decl.clause.unwrap();
        assert_eq!(clause.default.as_deref(), Some("Foo"));
        assert_eq!(
            clause.named.unwrap(),
            vec![
                Specifier { imported: "a".into(), local: "a".into() },
                Specifier { imported: "b".into(), local: "c".into() },
            ]
        );
        assert_eq!(decl.module, "m");
    }

    #[test]
    fn test_parse_multiline_named_with_trailing_comma() {
        let decl = parse("import {\n  a,\n  // comment { x }\n  b,\n} from \"m\"").unwrap();
        assert_eq!(decl.clause.unwrap().named.unwrap().len(), 2);
    }

    #[test]
    fn test_dynamic_import_is_not_a_declaration() {
        assert!(parse("import('m')").is_none());
        assert!(parse("import.meta.url").is_none());
    }

    #[test]
    fn test_missing_from_is_rejected() {
        assert!(parse("import { a } 'm'").is_none());
    }

    #[test]
    fn test_emit_default_uses_fallback() {
        let decl = parse("import A from \"m\"").unwrap();
        assert_eq!(
            emit_import(&decl, "resolve", "__import0"),
            "const __import0 = resolve(\"m\"); const A = __import0.default ?? __import0;"
        );
    }

    #[test]
    fn test_emit_namespace() {
        let decl = parse("import * as N from \"m\"").unwrap();
        assert_eq!(emit_import(&decl, "resolve", "__import0"), "const N = resolve(\"m\");");
    }

    #[test]
    fn test_emit_named() {
        let decl = parse("import { a, default as D } from \"m\"").unwrap();
        assert_eq!(
            emit_import(&decl, "resolve", "__import0"),
            "const { a, default: D } = resolve(\"m\");"
        );
    }
}
