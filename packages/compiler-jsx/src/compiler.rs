use crate::context::{CompileOptions, CompilerContext};
use crate::entities::decode_entities;
use crate::error::{CompileError, CompileResult};
use playbox_common::{is_ident_continue, is_ident_start, Cursor, Span, StackGuard};
use tracing::instrument;

/// Words after which a `<` starts markup rather than a comparison
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "default", "do", "else", "in", "of", "new", "delete", "void",
    "throw", "yield", "await", "instanceof",
];

/// Compile every markup expression in `source` into call expressions
#[instrument(skip(source, options), fields(len = source.len()))]
pub fn compile_markup(source: &str, options: &CompileOptions) -> CompileResult<String> {
    let mut compiler = Compiler::new(source, options);
    compiler.compile_code(None)?;
    Ok(compiler.ctx.into_output())
}

struct Compiler<'src, 'opt> {
    cursor: Cursor<'src>,
    ctx: CompilerContext,
    options: &'opt CompileOptions,
    guard: StackGuard,
}

/// Markup element being compiled
struct ElementParts {
    element_type: String,
    props: Vec<String>,
    children: Vec<String>,
}

impl<'src, 'opt> Compiler<'src, 'opt> {
    fn new(source: &'src str, options: &'opt CompileOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            ctx: CompilerContext::with_capacity(source.len() + source.len() / 2),
            options,
            guard: StackGuard::default(),
        }
    }

    fn error(&self, span: Span, message: impl Into<String>) -> CompileError {
        CompileError::new(self.cursor.source(), span, message)
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        CompileError::at(self.cursor.source(), self.cursor.pos(), message)
    }

    /// Elements and containers nest by recursion
    fn check_depth(&self) -> CompileResult<()> {
        if self.guard.exhausted() {
            return Err(self.error_here("Markup is nested too deeply"));
        }
        Ok(())
    }

    fn copy_from(&mut self, start: usize) {
        let text = self.cursor.slice(start, self.cursor.pos());
        self.ctx.add(text);
    }

    /// Copy code through to the output, compiling markup on the way.
    ///
    /// With a `terminator`, stops after consuming the unbalanced closer
    /// (which is not copied). Without one, runs to the end of input and
    /// requires every bracket to be closed.
    fn compile_code(&mut self, terminator: Option<char>) -> CompileResult<()> {
        self.check_depth()?;
        let mut open: Vec<(char, usize)> = Vec::new();
        let mut expr_allowed = true;

        loop {
            let start = self.cursor.pos();
            let c = match self.cursor.peek() {
                Some(c) => c,
                None => {
                    if let Some((bracket, pos)) = open.pop() {
                        return Err(self.error(Span::new(pos, pos + 1), format!("Unclosed '{}'", bracket)));
                    }
                    return match terminator {
                        Some(t) => Err(self.error_here(format!("Unexpected end of input, expected '{}'", t))),
                        None => Ok(()),
                    };
                }
            };

            match c {
                c if c.is_whitespace() => {
                    self.cursor.skip_whitespace();
                    self.copy_from(start);
                }
                '/' if matches!(self.cursor.peek_nth(1), Some('/') | Some('*')) => {
                    self.cursor
                        .skip_trivia()
                        .map_err(|e| CompileError::from_scan(self.cursor.source(), e))?;
                    self.copy_from(start);
                }
                '"' | '\'' => {
                    self.cursor
                        .skip_string()
                        .map_err(|e| CompileError::from_scan(self.cursor.source(), e))?;
                    self.copy_from(start);
                    expr_allowed = false;
                }
                '`' => {
                    self.compile_template()?;
                    expr_allowed = false;
                }
                '(' | '[' | '{' => {
                    open.push((c, start));
                    self.cursor.bump();
                    self.copy_from(start);
                    expr_allowed = true;
                }
                ')' | ']' | '}' => match open.pop() {
                    Some((opener, _)) if closer_for(opener) == c => {
                        self.cursor.bump();
                        self.copy_from(start);
                        expr_allowed = c == '}';
                    }
                    Some((opener, _)) => {
                        return Err(self.error(
                            Span::new(start, start + 1),
                            format!("Unexpected '{}', expected '{}'", c, closer_for(opener)),
                        ));
                    }
                    None if terminator == Some(c) => {
                        self.cursor.bump();
                        return Ok(());
                    }
                    None => {
                        return Err(self.error(Span::new(start, start + 1), format!("Unexpected '{}'", c)));
                    }
                },
                '<' if expr_allowed && self.starts_markup() => {
                    let element = self.compile_element()?;
                    self.ctx.add(&element);
                    expr_allowed = false;
                }
                c if is_ident_start(c) => {
                    let word = self.cursor.ident().unwrap_or_default();
                    self.ctx.add(word);
                    expr_allowed = EXPRESSION_KEYWORDS.contains(&word);
                }
                c if c.is_ascii_digit() => {
                    self.cursor.eat_while(|c| is_ident_continue(c) || c == '.');
                    self.copy_from(start);
                    expr_allowed = false;
                }
                '.' if self.cursor.peek_nth(1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                    self.cursor.bump();
                    self.cursor.eat_while(|c| is_ident_continue(c) || c == '.');
                    self.copy_from(start);
                    expr_allowed = false;
                }
                _ => {
                    self.cursor.bump();
                    self.copy_from(start);
                    expr_allowed = true;
                }
            }
        }
    }

    /// Template literal; substitutions are compiled as code
    fn compile_template(&mut self) -> CompileResult<()> {
        let start = self.cursor.pos();
        self.cursor.bump();
        self.ctx.push('`');
        loop {
            let chunk = self.cursor.pos();
            match self.cursor.peek() {
                None => return Err(self.error(Span::new(start, self.cursor.pos()), "Unterminated template")),
                Some('\\') => {
                    self.cursor.bump();
                    self.cursor.bump();
                    self.copy_from(chunk);
                }
                Some('`') => {
                    self.cursor.bump();
                    self.ctx.push('`');
                    return Ok(());
                }
                Some('$') if self.cursor.peek_nth(1) == Some('{') => {
                    self.cursor.eat("${");
                    self.ctx.add("${");
                    self.compile_code(Some('}'))?;
                    self.ctx.push('}');
                }
                Some(_) => {
                    self.cursor.bump();
                    self.copy_from(chunk);
                }
            }
        }
    }

    /// `<` followed by a tag name or `>` (fragment)
    fn starts_markup(&self) -> bool {
        match self.cursor.peek_nth(1) {
            Some('>') => true,
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    /// Capture the output of compiling an expression container body
    fn compile_container(&mut self) -> CompileResult<String> {
        let saved = self.ctx.take();
        let result = self.compile_code(Some('}'));
        let expr = self.ctx.restore(saved);
        result.map(|_| expr)
    }

    /// Compile one element starting at `<`, returning the call expression
    fn compile_element(&mut self) -> CompileResult<String> {
        self.check_depth()?;
        let start = self.cursor.pos();
        self.cursor.bump();
        self.skip_markup_trivia()?;

        let (name, parts) = if self.cursor.eat(">") {
            let children = self.compile_children(start, None)?;
            (
                None,
                ElementParts {
                    element_type: self.options.pragma_frag.clone(),
                    props: Vec::new(),
                    children,
                },
            )
        } else {
            let name = self.tag_name()?;
            let (props, self_closing) = self.compile_attributes(start, &name)?;
            let children = if self_closing {
                Vec::new()
            } else {
                self.compile_children(start, Some(&name))?
            };
            (
                Some(name.clone()),
                ElementParts {
                    element_type: element_type(&name),
                    props,
                    children,
                },
            )
        };

        let mut call = format!("{}({}, ", self.options.pragma, parts.element_type);
        if parts.props.is_empty() {
            call.push_str("null");
        } else {
            call.push_str(&format!("{{ {} }}", parts.props.join(", ")));
        }
        for child in &parts.children {
            call.push_str(", ");
            call.push_str(child);
        }

        // Keep the line count of the source so later positions stay accurate
        let consumed = self.cursor.slice(start, self.cursor.pos());
        let missing = consumed.matches('\n').count().saturating_sub(call.matches('\n').count());
        call.extend(std::iter::repeat('\n').take(missing));
        call.push(')');

        tracing::trace!(element = ?name, "Compiled element");
        Ok(call)
    }

    /// Tag name: identifier segments joined by `.`, `-` or `:`
    fn tag_name(&mut self) -> CompileResult<String> {
        let start = self.cursor.pos();
        match self.cursor.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.error_here("Expected a tag name")),
        }
        self.cursor
            .eat_while(|c| is_ident_continue(c) || c == '.' || c == '-' || c == ':');
        let name = self.cursor.slice(start, self.cursor.pos());
        if name.ends_with('.') || name.contains("..") {
            return Err(self.error(Span::new(start, self.cursor.pos()), format!("Invalid tag name '{}'", name)));
        }
        Ok(name.to_string())
    }

    /// Attributes up to `>` or `/>`; returns the prop entries and whether the
    /// tag closed itself
    fn compile_attributes(&mut self, start: usize, name: &str) -> CompileResult<(Vec<String>, bool)> {
        let mut props = Vec::new();
        loop {
            self.skip_markup_trivia()?;
            let attr_start = self.cursor.pos();
            match self.cursor.peek() {
                None => {
                    return Err(self.error(
                        Span::new(start, self.cursor.pos()),
                        format!("Unterminated JSX contents: <{}> is never closed", name),
                    ))
                }
                Some('/') => {
                    self.cursor.bump();
                    if !self.cursor.eat(">") {
                        return Err(self.error_here("Expected '>' after '/' in tag"));
                    }
                    return Ok((props, true));
                }
                Some('>') => {
                    self.cursor.bump();
                    return Ok((props, false));
                }
                Some('{') => {
                    self.cursor.bump();
                    self.skip_markup_trivia()?;
                    if !self.cursor.eat("...") {
                        return Err(self.error_here("Expected '...' in JSX spread attribute"));
                    }
                    let expr = self.compile_container()?;
                    props.push(format!("...{}", expr.trim()));
                }
                Some(c) if is_ident_start(c) => {
                    let attr = self
                        .cursor
                        .eat_while(|c| is_ident_continue(c) || c == '-' || c == ':')
                        .to_string();
                    self.skip_markup_trivia()?;
                    let value = if self.cursor.eat("=") {
                        self.skip_markup_trivia()?;
                        self.attribute_value(attr_start)?
                    } else {
                        "true".to_string()
                    };
                    props.push(format!("{}: {}", prop_key(&attr), value));
                }
                Some(c) => {
                    return Err(self.error(
                        Span::new(attr_start, attr_start + c.len_utf8()),
                        format!("Unexpected token '{}' in <{}> tag", c, name),
                    ))
                }
            }
        }
    }

    fn attribute_value(&mut self, attr_start: usize) -> CompileResult<String> {
        match self.cursor.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.cursor.pos();
                self.cursor.bump();
                let content_start = self.cursor.pos();
                self.cursor.eat_while(|c| c != quote);
                if self.cursor.is_eof() {
                    return Err(self.error(Span::new(start, self.cursor.pos()), "Unterminated string constant"));
                }
                let content = self.cursor.slice(content_start, self.cursor.pos());
                self.cursor.bump();
                Ok(js_string(&decode_entities(content)))
            }
            Some('{') => {
                self.cursor.bump();
                let expr = self.compile_container()?;
                if is_blank_code(&expr) {
                    return Err(self.error(
                        Span::new(attr_start, self.cursor.pos()),
                        "JSX attributes must only be assigned a non-empty expression",
                    ));
                }
                Ok(expr.trim().to_string())
            }
            Some('<') if self.starts_markup() => self.compile_element(),
            _ => Err(self.error_here("Expected a string, an expression or an element as attribute value")),
        }
    }

    /// Children up to the matching closing tag (`None` for fragments)
    fn compile_children(&mut self, start: usize, name: Option<&str>) -> CompileResult<Vec<String>> {
        let display = name.unwrap_or("");
        let mut children = Vec::new();
        loop {
            let text_start = self.cursor.pos();
            self.cursor.eat_while(|c| c != '<' && c != '{');
            let text = self.cursor.slice(text_start, self.cursor.pos());
            if let Some(child) = text_child(text) {
                children.push(child);
            }

            match self.cursor.peek() {
                None => {
                    return Err(self.error(
                        Span::new(start, self.cursor.pos()),
                        format!("Unterminated JSX contents: expected corresponding closing tag for <{}>", display),
                    ))
                }
                Some('{') => {
                    self.cursor.bump();
                    let expr = self.compile_container()?;
                    if !is_blank_code(&expr) {
                        children.push(expr.trim().to_string());
                    }
                }
                Some(_) => {
                    let tag_start = self.cursor.pos();
                    let mut lookahead = self.cursor.clone();
                    lookahead.bump();
                    lookahead.skip_whitespace();
                    if lookahead.peek() == Some('/') {
                        lookahead.bump();
                        lookahead.skip_whitespace();
                        self.cursor = lookahead;
                        let closing = if self.cursor.peek() == Some('>') {
                            String::new()
                        } else {
                            self.tag_name()?
                        };
                        self.cursor.skip_whitespace();
                        if !self.cursor.eat(">") {
                            return Err(self.error_here("Expected '>' to end closing tag"));
                        }
                        if closing != display {
                            return Err(self.error(
                                Span::new(tag_start, self.cursor.pos()),
                                format!("Expected corresponding JSX closing tag for <{}>", display),
                            ));
                        }
                        return Ok(children);
                    }
                    if !self.starts_markup() {
                        return Err(self.error(Span::new(tag_start, tag_start + 1), "Unexpected '<' in JSX text"));
                    }
                    children.push(self.compile_element()?);
                }
            }
        }
    }

    /// Whitespace and comments inside a tag
    fn skip_markup_trivia(&mut self) -> CompileResult<()> {
        self.cursor
            .skip_trivia()
            .map_err(|e| CompileError::from_scan(self.cursor.source(), e))
    }
}

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Intrinsic elements become strings, components stay references
fn element_type(name: &str) -> String {
    let lowercase = name.chars().next().map(|c| c.is_lowercase()).unwrap_or(false);
    let intrinsic = (lowercase && !name.contains('.')) || name.contains('-') || name.contains(':');
    if intrinsic {
        js_string(name)
    } else {
        name.to_string()
    }
}

fn prop_key(name: &str) -> String {
    if name.chars().all(is_ident_continue) {
        name.to_string()
    } else {
        js_string(name)
    }
}

/// Text between tags, with markup whitespace rules: lines are trimmed,
/// blank lines dropped, and the remaining lines joined by single spaces
fn text_child(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut parts = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches('\r');
        let mut trimmed = line;
        if i != 0 {
            trimmed = trimmed.trim_start();
        }
        if i != last {
            trimmed = trimmed.trim_end();
        }
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(js_string(&decode_entities(&parts.join(" "))))
}

/// Only whitespace and comments
fn is_blank_code(code: &str) -> bool {
    let mut cursor = Cursor::new(code);
    cursor.skip_trivia().is_ok() && cursor.is_eof()
}

/// Double-quoted string literal
fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
