use crate::declaration::DeclarationKind;
use crate::imports::{eat_semicolon, parse_specifiers, read_module_specifier};
use playbox_common::Cursor;

/// Words that can start an expression but are never a bare exported binding
const EXPRESSION_KEYWORDS: &[&str] = &[
    "new", "this", "null", "true", "false", "undefined", "typeof", "void", "await", "yield",
    "super", "delete",
];

/// Parsed `export` declaration. Every export form is rewritten by deleting
/// the text from the `export` keyword up to `resume`, then scanning on from
/// there.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExportDecl {
    pub kind: DeclarationKind,
    pub binding: Option<String>,
    pub module: Option<String>,
    pub resume: usize,
}

impl ExportDecl {
    fn new(kind: DeclarationKind, resume: usize) -> Self {
        Self {
            kind,
            binding: None,
            module: None,
            resume,
        }
    }
}

/// Parse the rest of an export declaration; the cursor sits just after `export`
pub(crate) fn parse_export(cursor: &mut Cursor) -> Option<ExportDecl> {
    cursor.skip_trivia().ok()?;

    if cursor.eat_keyword("default") {
        cursor.skip_trivia().ok()?;
        return Some(parse_default(cursor));
    }

    let decl_start = cursor.pos();
    let mut lookahead = cursor.clone();
    for keyword in ["const", "let", "var", "function", "class", "async"] {
        if lookahead.eat_keyword(keyword) {
            return Some(ExportDecl::new(DeclarationKind::NamedDeclaration, decl_start));
        }
    }

    match cursor.peek()? {
        '{' => {
            cursor.bump();
            parse_specifiers(cursor)?;
            let module = parse_from_clause(cursor);
            eat_semicolon(cursor);
            let kind = if module.is_some() {
                DeclarationKind::ReExport
            } else {
                DeclarationKind::ExportList
            };
            Some(ExportDecl {
                kind,
                binding: None,
                module,
                resume: cursor.pos(),
            })
        }
        '*' => {
            cursor.bump();
            cursor.skip_trivia().ok()?;
            if cursor.eat_keyword("as") {
                cursor.skip_trivia().ok()?;
                cursor.ident()?;
            }
            let module = parse_from_clause(cursor)?;
            eat_semicolon(cursor);
            Some(ExportDecl {
                kind: DeclarationKind::ReExport,
                binding: None,
                module: Some(module),
                resume: cursor.pos(),
            })
        }
        _ => None,
    }
}

/// Everything after `export default`
fn parse_default(cursor: &mut Cursor) -> ExportDecl {
    let decl_start = cursor.pos();
    let stripped = ExportDecl::new(DeclarationKind::DefaultExpression, decl_start);

    let mut lookahead = cursor.clone();
    let declared = if lookahead.eat_keyword("async") {
        let _ = lookahead.skip_trivia();
        lookahead.eat_keyword("function").then(|| function_name(&mut lookahead))
    } else if lookahead.eat_keyword("function") {
        Some(function_name(&mut lookahead))
    } else if lookahead.eat_keyword("class") {
        let _ = lookahead.skip_trivia();
        let mut name_cursor = lookahead.clone();
        Some(name_cursor.ident().filter(|name| *name != "extends").map(str::to_string))
    } else if lookahead.eat_keyword("const") || lookahead.eat_keyword("let") || lookahead.eat_keyword("var") {
        let _ = lookahead.skip_trivia();
        Some(lookahead.ident().map(str::to_string))
    } else {
        None
    };

    match declared {
        Some(Some(name)) => ExportDecl {
            kind: DeclarationKind::DefaultDeclaration,
            binding: Some(name),
            module: None,
            resume: decl_start,
        },
        Some(None) => stripped,
        None => match reference_name(cursor) {
            Some(name) => ExportDecl {
                kind: DeclarationKind::DefaultReference,
                binding: Some(name),
                module: None,
                resume: cursor.pos(),
            },
            None => stripped,
        },
    }
}

/// Name after `function` / `function*`; None for anonymous functions
fn function_name(lookahead: &mut Cursor) -> Option<String> {
    let _ = lookahead.skip_trivia();
    lookahead.eat("*");
    let _ = lookahead.skip_trivia();
    lookahead.ident().map(str::to_string)
}

/// `Identifier` followed by `;`, a line break, a comment, `}` or the end of
/// input. Consumes the identifier and an optional `;` on success.
fn reference_name(cursor: &mut Cursor) -> Option<String> {
    let mut lookahead = cursor.clone();
    let name = lookahead.ident()?;
    if EXPRESSION_KEYWORDS.contains(&name) {
        return None;
    }
    lookahead.eat_while(|c| c == ' ' || c == '\t');
    let ends_statement = match lookahead.peek() {
        None | Some(';') | Some('\n') | Some('\r') | Some('}') => true,
        Some('/') => matches!(lookahead.peek_nth(1), Some('/') | Some('*')),
        _ => false,
    };
    if !ends_statement {
        return None;
    }
    lookahead.eat(";");
    cursor.set_pos(lookahead.pos());
    Some(name.to_string())
}

/// Optional `from "module"`
fn parse_from_clause(cursor: &mut Cursor) -> Option<String> {
    let save = cursor.pos();
    if cursor.skip_trivia().is_ok() && cursor.eat_keyword("from") && cursor.skip_trivia().is_ok() {
        if let Some(module) = read_module_specifier(cursor) {
            return Some(module);
        }
    }
    cursor.set_pos(save);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<ExportDecl> {
        let mut cursor = Cursor::new(text);
        assert!(cursor.eat_keyword("export"));
        parse_export(&mut cursor)
    }

    #[test]
    fn test_default_function() {
        let decl = parse("export default function Widget() {}").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultDeclaration);
        assert_eq!(decl.binding.as_deref(), Some("Widget"));
        assert_eq!(decl.resume, "export default ".len());
    }

    #[test]
    fn test_default_async_and_generator_functions() {
        let decl = parse("export default async function Load() {}").unwrap();
        assert_eq!(decl.binding.as_deref(), Some("Load"));
        let decl = parse("export default function* Steps() {}").unwrap();
        assert_eq!(decl.binding.as_deref(), Some("Steps"));
    }

    #[test]
    fn test_default_class_and_const() {
        let decl = parse("export default class Board extends Base {}").unwrap();
        assert_eq!(decl.binding.as_deref(), Some("Board"));
        let decl = parse("export default const Flow = () => null").unwrap();
        assert_eq!(decl.binding.as_deref(), Some("Flow"));
    }

    #[test]
    fn test_anonymous_default_is_stripped_only() {
        let decl = parse("export default function () {}").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultExpression);
        assert_eq!(decl.binding, None);
        let decl = parse("export default class extends Base {}").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultExpression);
    }

    #[test]
    fn test_default_reference() {
        let text = "export default App;\nconst x = 1;";
        let decl = parse(text).unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultReference);
        assert_eq!(decl.binding.as_deref(), Some("App"));
        assert_eq!(&text[decl.resume..], "\nconst x = 1;");
    }

    #[test]
    fn test_default_call_is_an_expression() {
        let decl = parse("export default memo(App);").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultExpression);
        let decl = parse("export default 42").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultExpression);
        let decl = parse("export default new Thing").unwrap();
        assert_eq!(decl.kind, DeclarationKind::DefaultExpression);
    }

    #[test]
    fn test_named_declaration() {
        let decl = parse("export const a = 1").unwrap();
        assert_eq!(decl.kind, DeclarationKind::NamedDeclaration);
        assert_eq!(decl.resume, "export ".len());
    }

    #[test]
    fn test_export_list_and_reexport() {
        let text = "export { A, B as C };\nnext";
        let decl = parse(text).unwrap();
        assert_eq!(decl.kind, DeclarationKind::ExportList);
        assert_eq!(&text[decl.resume..], "\nnext");

        let decl = parse("export { a } from './a'").unwrap();
        assert_eq!(decl.kind, DeclarationKind::ReExport);
        assert_eq!(decl.module.as_deref(), Some("./a"));

        let decl = parse("export * as ns from \"m\";").unwrap();
        assert_eq!(decl.kind, DeclarationKind::ReExport);
    }

    #[test]
    fn test_unknown_export_form() {
        assert!(parse("export = thing").is_none());
    }
}
