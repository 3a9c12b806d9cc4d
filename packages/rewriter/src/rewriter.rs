use crate::declaration::{Declaration, DeclarationKind};
use crate::exports::parse_export;
use crate::imports::{emit_import, parse_import};
use playbox_common::{is_ident_start, Cursor, Span};
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Name of the dependency-resolution function imports are rewritten into
pub const RESOLVE_FN: &str = "resolve";

/// Result of rewriting one source unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteOutput {
    /// Source with every recognized import/export rewritten
    pub text: String,
    /// Identifier of the default-exported value, if one was found
    pub default_binding: Option<String>,
    /// Rewritten declarations in source order
    pub declarations: Vec<Declaration>,
    /// Default-export names seen after the first one (first wins)
    pub ignored_defaults: Vec<String>,
}

/// Rewrite import/export declarations in `source`
#[instrument(skip(source), fields(len = source.len()))]
pub fn rewrite(source: &str) -> RewriteOutput {
    Rewriter::new(source).run()
}

pub struct Rewriter<'src> {
    cursor: Cursor<'src>,
    output: String,
    depth: usize,
    temp_count: usize,
    resolve_fn: &'src str,
    default_binding: Option<String>,
    declarations: Vec<Declaration>,
    ignored_defaults: Vec<String>,
}

impl<'src> Rewriter<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            output: String::with_capacity(source.len() + 64),
            depth: 0,
            temp_count: 0,
            resolve_fn: RESOLVE_FN,
            default_binding: None,
            declarations: Vec::new(),
            ignored_defaults: Vec::new(),
        }
    }

    /// Use a different resolution function name
    pub fn with_resolve_fn(mut self, name: &'src str) -> Self {
        self.resolve_fn = name;
        self
    }

    pub fn run(mut self) -> RewriteOutput {
        while let Some(c) = self.cursor.peek() {
            let start = self.cursor.pos();
            match c {
                '/' if matches!(self.cursor.peek_nth(1), Some('/') | Some('*')) => {
                    // Unterminated comments run to the end; later stages report them
                    let _ = self.cursor.skip_trivia();
                    self.copy_from(start);
                }
                '"' | '\'' => {
                    let _ = self.cursor.skip_string();
                    self.copy_from(start);
                }
                '`' => {
                    let _ = self.cursor.skip_template();
                    self.copy_from(start);
                }
                '{' | '(' | '[' => {
                    self.depth += 1;
                    self.cursor.bump();
                    self.copy_from(start);
                }
                '}' | ')' | ']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.cursor.bump();
                    self.copy_from(start);
                }
                c if is_ident_start(c) => self.word(start),
                _ => {
                    self.cursor.bump();
                    self.copy_from(start);
                }
            }
        }

        RewriteOutput {
            text: self.output,
            default_binding: self.default_binding,
            declarations: self.declarations,
            ignored_defaults: self.ignored_defaults,
        }
    }

    fn copy_from(&mut self, start: usize) {
        let text = self.cursor.slice(start, self.cursor.pos());
        self.output.push_str(text);
    }

    /// An identifier: either the start of a declaration or text to copy
    fn word(&mut self, start: usize) {
        // Declarations only start a statement: top level, or first on a line
        let statement_position =
            !self.cursor.follows_word_or_dot() && (self.depth == 0 || self.cursor.at_line_start());

        let word = self.cursor.ident().unwrap_or_default();
        if !statement_position {
            self.copy_from(start);
            return;
        }

        let handled = match word {
            "import" => self.import(start),
            "export" => self.export(start),
            _ => false,
        };

        if !handled {
            self.cursor.set_pos(start + word.len());
            self.copy_from(start);
        }
    }

    fn import(&mut self, start: usize) -> bool {
        let mut lookahead = self.cursor.clone();
        let decl = match parse_import(&mut lookahead) {
            Some(decl) => decl,
            None => return false,
        };

        let kind = decl.kind();
        let temp = format!("__import{}", self.temp_count);
        if matches!(kind, DeclarationKind::DefaultImport | DeclarationKind::CombinedImport) {
            self.temp_count += 1;
        }
        let replacement = emit_import(&decl, self.resolve_fn, &temp);
        debug!(kind = ?kind, module = %decl.module, "Rewrote import");

        self.cursor = lookahead;
        self.replace(start, &replacement);
        self.declarations.push(Declaration {
            kind,
            span: Span::new(start, self.cursor.pos()),
            module: Some(decl.module),
            binding: None,
        });
        true
    }

    fn export(&mut self, start: usize) -> bool {
        let mut lookahead = self.cursor.clone();
        let decl = match parse_export(&mut lookahead) {
            Some(decl) => decl,
            None => return false,
        };

        if let Some(name) = &decl.binding {
            match &self.default_binding {
                None => self.default_binding = Some(name.clone()),
                Some(first) => {
                    warn!(
                        first = %first,
                        ignored = %name,
                        "Multiple default exports; keeping the first"
                    );
                    self.ignored_defaults.push(name.clone());
                }
            }
        }
        debug!(kind = ?decl.kind, binding = ?decl.binding, "Rewrote export");

        self.cursor.set_pos(decl.resume);
        self.replace(start, "");
        self.declarations.push(Declaration {
            kind: decl.kind,
            span: Span::new(start, decl.resume),
            module: decl.module,
            binding: decl.binding,
        });
        true
    }

    /// Emit `replacement` for source[start..cursor], padded with the
    /// newlines the removed text contained
    fn replace(&mut self, start: usize, replacement: &str) {
        let removed = self.cursor.slice(start, self.cursor.pos());
        let lost_lines = removed
            .matches('\n')
            .count()
            .saturating_sub(replacement.matches('\n').count());
        self.output.push_str(replacement);
        for _ in 0..lost_lines {
            self.output.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_declarations_is_identity() {
        let source = "const a = 1;\nfunction f() { return `x ${a}`; }\n";
        let out = rewrite(source);
        assert_eq!(out.text, source);
        assert!(out.declarations.is_empty());
        assert_eq!(out.default_binding, None);
    }

    #[test]
    fn test_stylesheet_import_is_deleted() {
        let out = rewrite("import 'reactflow/dist/style.css';\nconst a = 1;");
        assert_eq!(out.text, "\nconst a = 1;");
        assert_eq!(out.declarations[0].kind, DeclarationKind::ResourceImport);
    }

    #[test]
    fn test_bare_side_effect_import_is_deleted() {
        let out = rewrite("import \"polyfill\";");
        assert_eq!(out.text, "");
        assert_eq!(out.declarations[0].kind, DeclarationKind::SideEffectImport);
    }

    #[test]
    fn test_combined_import() {
        let out = rewrite("import Foo, { a, b } from \"m\";");
        assert_eq!(
            out.text,
            "const __import0 = resolve(\"m\"); const Foo = __import0.default ?? __import0; const { a, b } = __import0;"
        );
        assert_eq!(out.declarations[0].kind, DeclarationKind::CombinedImport);
    }

    #[test]
    fn test_each_default_import_gets_its_own_temporary() {
        let out = rewrite("import A from 'a';\nimport B from 'b';");
        assert!(out.text.contains("const __import0 = resolve(\"a\")"));
        assert!(out.text.contains("const __import1 = resolve(\"b\")"));
    }

    #[test]
    fn test_multiline_import_keeps_line_count() {
        let source = "import {\n  a,\n  b,\n} from 'm';\nconst x = a;";
        let out = rewrite(source);
        assert_eq!(out.text.matches('\n').count(), source.matches('\n').count());
        assert!(out.text.starts_with("const { a, b } = resolve(\"m\");"));
        assert!(out.text.ends_with("const x = a;"));
    }

    #[test]
    fn test_lookalikes_in_comments_and_strings_are_untouched() {
        let source = "// import x from 'y'\nconst s = \"export default Nope;\";\n/* export { a } */";
        let out = rewrite(source);
        assert_eq!(out.text, source);
        assert_eq!(out.default_binding, None);
    }

    #[test]
    fn test_member_named_import_is_untouched() {
        let source = "loader.import(thing); obj.export = 1;";
        assert_eq!(rewrite(source).text, source);
    }

    #[test]
    fn test_dynamic_import_is_untouched() {
        let source = "const m = import('m');";
        assert_eq!(rewrite(source).text, source);
    }

    #[test]
    fn test_default_function_export() {
        let out = rewrite("export default function Widget(){ return 1 }");
        assert_eq!(out.text, "function Widget(){ return 1 }");
        assert_eq!(out.default_binding.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_trailing_default_reference() {
        let out = rewrite("function App() {}\nexport default App;\n");
        assert_eq!(out.text, "function App() {}\n\n");
        assert_eq!(out.default_binding.as_deref(), Some("App"));
    }

    #[test]
    fn test_named_exports_become_plain_declarations() {
        let out = rewrite("export const a = 1;\nexport function f() {}\nexport class C {}");
        assert_eq!(out.text, "const a = 1;\nfunction f() {}\nclass C {}");
        assert_eq!(out.default_binding, None);
    }

    #[test]
    fn test_export_list_is_deleted() {
        let out = rewrite("const A = 1, B = 2;\nexport { A, B };");
        assert_eq!(out.text, "const A = 1, B = 2;\n");
    }

    #[test]
    fn test_bare_default_expression_is_stripped() {
        let out = rewrite("export default 42");
        assert_eq!(out.text, "42");
        assert_eq!(out.default_binding, None);
    }

    #[test]
    fn test_first_default_export_wins() {
        let out = rewrite("export default function First() {}\nexport default Second;");
        assert_eq!(out.default_binding.as_deref(), Some("First"));
        assert_eq!(out.ignored_defaults, vec!["Second".to_string()]);
        assert_eq!(out.text, "function First() {}\n");
    }

    #[test]
    fn test_export_on_its_own_line_inside_unbalanced_text() {
        // A stray paren in markup text must not hide a later export
        let source = "function A() { return <p>note (draft</p> }\nexport default A;";
        let out = rewrite(source);
        assert_eq!(out.default_binding.as_deref(), Some("A"));
    }

    #[test]
    fn test_import_any_order_with_exports() {
        let source = "export const x = 1;\nimport * as N from 'm';\nexport default N;";
        let out = rewrite(source);
        assert_eq!(out.text, "const x = 1;\nconst N = resolve(\"m\");\n");
        assert_eq!(out.default_binding.as_deref(), Some("N"));
    }

    #[test]
    fn test_custom_resolve_fn() {
        let out = Rewriter::new("import { a } from 'm'").with_resolve_fn("require").run();
        assert_eq!(out.text, "const { a } = require(\"m\");");
    }
}
