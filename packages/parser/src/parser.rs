use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::literals::{number_key, parse_number, unescape};
use crate::tokenizer::{try_tokenize, Token};
use playbox_common::{Cursor, Span, StackGuard};
use std::rc::Rc;

/// `**` binds tightest of the binary operators
const EXPONENT_PRECEDENCE: u8 = 12;

enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Parser for the executable script subset
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
    end: usize,
    /// `in` is not a binary operator inside a for-loop head
    no_in: bool,
    guard: StackGuard,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        Self::for_range(source, 0, source.len())
    }

    /// Parser over `source[start..end]`; spans stay relative to the whole source
    fn for_range(source: &'src str, start: usize, end: usize) -> ParseResult<Self> {
        let tokens = try_tokenize(&source[start..end])
            .map_err(|e| e.offset(start))?
            .into_iter()
            .map(|(token, span)| (token, Span::new(span.start + start, span.end + start)))
            .collect();
        Ok(Self {
            source,
            tokens,
            pos: 0,
            end,
            no_in: false,
            guard: StackGuard::default(),
        })
    }

    /// Parse a complete script
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        Ok(Program {
            body,
            span: Span::new(0, self.source.len()),
        })
    }

    // Statements

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.check_depth()?;
        let start = self.peek_span().start;
        let kind = match self.peek_token() {
            Some(Token::LBrace) => StmtKind::Block(self.parse_block()?),
            Some(Token::Const) | Some(Token::Let) | Some(Token::Var) => {
                let (kind, declarations) = self.parse_var_declarations()?;
                self.consume_semicolon()?;
                StmtKind::VarDecl { kind, declarations }
            }
            Some(Token::Function) => StmtKind::Function(self.parse_function(true)?),
            Some(Token::Class) => StmtKind::Class(self.parse_class(true)?),
            Some(Token::Return) => {
                self.advance();
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                StmtKind::Return(argument)
            }
            Some(Token::If) => {
                self.advance();
                let test = self.parse_paren_expression()?;
                let consequent = Box::new(self.parse_statement()?);
                let alternate = if self.match_token(Token::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StmtKind::If {
                    test,
                    consequent,
                    alternate,
                }
            }
            Some(Token::For) => self.parse_for()?,
            Some(Token::While) => {
                self.advance();
                let test = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { test, body }
            }
            Some(Token::Do) => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.expect(Token::While)?;
                let test = self.parse_paren_expression()?;
                self.match_token(Token::Semicolon);
                StmtKind::DoWhile { body, test }
            }
            Some(Token::Switch) => self.parse_switch()?,
            Some(Token::Break) => {
                self.advance();
                self.consume_semicolon()?;
                StmtKind::Break
            }
            Some(Token::Continue) => {
                self.advance();
                self.consume_semicolon()?;
                StmtKind::Continue
            }
            Some(Token::Throw) => {
                self.advance();
                if self.newline_before() {
                    return Err(ParseError::invalid_syntax(self.peek_span(), "Illegal newline after throw"));
                }
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                StmtKind::Throw(argument)
            }
            Some(Token::Try) => self.parse_try()?,
            Some(Token::Semicolon) => {
                self.advance();
                StmtKind::Empty
            }
            Some(Token::Import) | Some(Token::Export) => {
                return Err(ParseError::invalid_syntax(
                    self.peek_span(),
                    "Cannot use import or export declarations in executed code",
                ));
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt {
            kind,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        Ok(body)
    }

    fn parse_paren_expression(&mut self) -> ParseResult<Expr> {
        self.expect(Token::LParen)?;
        let expr = self.parse_expression()?;
        self.expect(Token::RParen)?;
        Ok(expr)
    }

    fn parse_var_kind(&mut self) -> ParseResult<VarKind> {
        let kind = match self.peek_token() {
            Some(Token::Const) => VarKind::Const,
            Some(Token::Let) => VarKind::Let,
            Some(Token::Var) => VarKind::Var,
            _ => return Err(self.unexpected("'const', 'let' or 'var'")),
        };
        self.advance();
        Ok(kind)
    }

    fn parse_var_declarations(&mut self) -> ParseResult<(VarKind, Vec<VarDeclarator>)> {
        let kind = self.parse_var_kind()?;
        let target = self.parse_binding_target()?;
        let declarations = self.parse_declarators(kind, target)?;
        Ok((kind, declarations))
    }

    /// Remaining declarators of a declaration whose first target is parsed
    fn parse_declarators(&mut self, kind: VarKind, first: Pattern) -> ParseResult<Vec<VarDeclarator>> {
        let mut declarations = Vec::new();
        let mut target = first;
        loop {
            let target_end = self.prev_end();
            let init = if self.match_token(Token::Equals) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if init.is_none() {
                if kind == VarKind::Const {
                    return Err(ParseError::invalid_syntax(
                        Span::at(target_end),
                        "Missing initializer in const declaration",
                    ));
                }
                if !matches!(target, Pattern::Identifier(_)) {
                    return Err(ParseError::invalid_syntax(
                        Span::at(target_end),
                        "Missing initializer in destructuring declaration",
                    ));
                }
            }
            declarations.push(VarDeclarator { target, init });
            if !self.match_token(Token::Comma) {
                return Ok(declarations);
            }
            target = self.parse_binding_target()?;
        }
    }

    fn parse_for(&mut self) -> ParseResult<StmtKind> {
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;

        let init = match self.peek_token() {
            Some(Token::Semicolon) => None,
            Some(Token::Const) | Some(Token::Let) | Some(Token::Var) => {
                let kind = self.parse_var_kind()?;
                let target = self.parse_binding_target()?;
                let binding = ForBinding {
                    kind: Some(kind),
                    target,
                };
                if let Some(kind) = self.parse_for_each(binding.clone())? {
                    return Ok(kind);
                }
                let saved = std::mem::replace(&mut self.no_in, true);
                let declarations = self.parse_declarators(kind, binding.target);
                self.no_in = saved;
                Some(ForInit::VarDecl {
                    kind,
                    declarations: declarations?,
                })
            }
            _ => {
                let saved = std::mem::replace(&mut self.no_in, true);
                let expr = self.parse_expression();
                self.no_in = saved;
                let expr = expr?;
                if self.check_ident("of") || self.check(Token::In) {
                    let binding = ForBinding {
                        kind: None,
                        target: self.expr_to_pattern(expr)?,
                    };
                    if let Some(kind) = self.parse_for_each(binding)? {
                        return Ok(kind);
                    }
                    return Err(self.unexpected("'of' or 'in'"));
                }
                Some(ForInit::Expr(expr))
            }
        };

        self.expect(Token::Semicolon)?;
        let test = if self.check(Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;
        let update = if self.check(Token::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    /// `of <expr>) body` or `in <expr>) body` after a loop binding
    fn parse_for_each(&mut self, binding: ForBinding) -> ParseResult<Option<StmtKind>> {
        let is_of = if self.check_ident("of") {
            true
        } else if self.check(Token::In) {
            false
        } else {
            return Ok(None);
        };
        self.advance();
        let right = if is_of {
            self.parse_assignment()?
        } else {
            self.parse_expression()?
        };
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Some(if is_of {
            StmtKind::ForOf {
                binding,
                iterable: right,
                body,
            }
        } else {
            StmtKind::ForIn {
                binding,
                object: right,
                body,
            }
        }))
    }

    fn parse_switch(&mut self) -> ParseResult<StmtKind> {
        self.expect(Token::Switch)?;
        let discriminant = self.parse_paren_expression()?;
        self.expect(Token::LBrace)?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check(Token::RBrace) && !self.is_at_end() {
            let test = if self.match_token(Token::Case) {
                Some(self.parse_expression()?)
            } else {
                let span = self.peek_span();
                self.expect(Token::Default)?;
                if seen_default {
                    return Err(ParseError::invalid_syntax(
                        span,
                        "More than one default clause in switch statement",
                    ));
                }
                seen_default = true;
                None
            };
            self.expect(Token::Colon)?;

            let mut body = Vec::new();
            while !self.check(Token::Case)
                && !self.check(Token::Default)
                && !self.check(Token::RBrace)
                && !self.is_at_end()
            {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        self.expect(Token::RBrace)?;

        Ok(StmtKind::Switch { discriminant, cases })
    }

    fn parse_try(&mut self) -> ParseResult<StmtKind> {
        let start = self.peek_span();
        self.expect(Token::Try)?;
        let block = self.parse_block()?;

        let (param, handler) = if self.match_token(Token::Catch) {
            let param = if self.match_token(Token::LParen) {
                let param = self.parse_binding_target()?;
                self.expect(Token::RParen)?;
                Some(param)
            } else {
                None
            };
            (param, Some(self.parse_block()?))
        } else {
            (None, None)
        };

        let finalizer = if self.match_token(Token::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::invalid_syntax(start, "Missing catch or finally after try"));
        }

        Ok(StmtKind::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    // Functions and classes

    fn parse_function(&mut self, require_name: bool) -> ParseResult<Rc<FunctionDef>> {
        let start = self.peek_span().start;
        self.expect(Token::Function)?;
        if self.check(Token::Star) {
            return Err(ParseError::invalid_syntax(
                self.peek_span(),
                "Generator functions are not supported",
            ));
        }

        let name = match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Some(name)
            }
            _ if require_name => return Err(self.unexpected("function name")),
            _ => None,
        };

        let (params, rest) = self.parse_params()?;
        let body = self.parse_function_body()?;

        Ok(Rc::new(FunctionDef {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span: Span::new(start, self.prev_end()),
        }))
    }

    fn parse_function_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let body = self.parse_block();
        self.no_in = saved;
        body
    }

    fn parse_params(&mut self) -> ParseResult<(Vec<Pattern>, Option<Pattern>)> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;
        while !self.check(Token::RParen) && !self.is_at_end() {
            if self.match_token(Token::Ellipsis) {
                rest = Some(self.parse_binding_target()?);
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok((params, rest))
    }

    fn parse_class(&mut self, require_name: bool) -> ParseResult<Rc<ClassDef>> {
        let start = self.peek_span().start;
        self.expect(Token::Class)?;

        let name = match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Some(name)
            }
            _ if require_name => return Err(self.unexpected("class name")),
            _ => None,
        };

        let superclass = if self.match_token(Token::Extends) {
            Some(self.parse_call_member()?)
        } else {
            None
        };

        self.expect(Token::LBrace)?;
        let mut constructor = None;
        let mut members = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            if self.match_token(Token::Semicolon) {
                continue;
            }

            let member_start = self.peek_span().start;
            let is_static = self.check_ident("static")
                && !matches!(
                    self.peek_ahead_token(1),
                    Some(Token::LParen) | Some(Token::Equals) | Some(Token::Semicolon)
                );
            if is_static {
                self.advance();
            }

            let (key, _) = self.parse_property_key()?;
            if self.check(Token::LParen) {
                let (params, rest) = self.parse_params()?;
                let body = self.parse_function_body()?;
                let def = Rc::new(FunctionDef {
                    name: static_key_name(&key),
                    params,
                    rest,
                    body: FunctionBody::Block(body),
                    is_arrow: false,
                    span: Span::new(member_start, self.prev_end()),
                });
                if !is_static && key == PropKey::Static("constructor".to_string()) {
                    if constructor.is_some() {
                        return Err(ParseError::invalid_syntax(
                            Span::new(member_start, self.prev_end()),
                            "A class may only have one constructor",
                        ));
                    }
                    constructor = Some(def);
                } else {
                    members.push(ClassMember {
                        key,
                        is_static,
                        value: ClassMemberValue::Method(def),
                    });
                }
            } else {
                let value = if self.match_token(Token::Equals) {
                    Some(self.parse_assignment()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                members.push(ClassMember {
                    key,
                    is_static,
                    value: ClassMemberValue::Field(value),
                });
            }
        }
        self.expect(Token::RBrace)?;

        Ok(Rc::new(ClassDef {
            name,
            superclass,
            constructor,
            members,
            span: Span::new(start, self.prev_end()),
        }))
    }

    // Patterns

    fn parse_binding_target(&mut self) -> ParseResult<Pattern> {
        self.check_depth()?;
        match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(Pattern::Identifier(name))
            }
            Some(Token::LBracket) => self.parse_array_pattern(),
            Some(Token::LBrace) => self.parse_object_pattern(),
            _ => Err(self.unexpected("binding name or pattern")),
        }
    }

    fn parse_binding_element(&mut self) -> ParseResult<Pattern> {
        let target = self.parse_binding_target()?;
        if self.match_token(Token::Equals) {
            let default = self.parse_assignment()?;
            Ok(Pattern::Default {
                target: Box::new(target),
                default: Box::new(default),
            })
        } else {
            Ok(target)
        }
    }

    fn parse_array_pattern(&mut self) -> ParseResult<Pattern> {
        self.expect(Token::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;
        while !self.check(Token::RBracket) && !self.is_at_end() {
            if self.match_token(Token::Comma) {
                elements.push(None);
                continue;
            }
            if self.match_token(Token::Ellipsis) {
                rest = Some(Box::new(self.parse_binding_target()?));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBracket)?;
        Ok(Pattern::Array { elements, rest })
    }

    fn parse_object_pattern(&mut self) -> ParseResult<Pattern> {
        self.expect(Token::LBrace)?;
        let mut properties = Vec::new();
        let mut rest = None;
        while !self.check(Token::RBrace) && !self.is_at_end() {
            if self.match_token(Token::Ellipsis) {
                rest = Some(Box::new(self.parse_binding_target()?));
                self.match_token(Token::Comma);
                break;
            }

            let (key, shorthand) = self.parse_property_key()?;
            let value = if self.match_token(Token::Colon) {
                self.parse_binding_element()?
            } else if let Some(name) = shorthand {
                let target = Pattern::Identifier(name);
                if self.match_token(Token::Equals) {
                    Pattern::Default {
                        target: Box::new(target),
                        default: Box::new(self.parse_assignment()?),
                    }
                } else {
                    target
                }
            } else {
                return Err(self.unexpected("':'"));
            };
            properties.push(PatternProperty { key, value });

            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Pattern::Object { properties, rest })
    }

    /// Property name in an object literal, pattern or class body. The
    /// second value is set when the name may also be used as a shorthand
    /// binding.
    fn parse_property_key(&mut self) -> ParseResult<(PropKey, Option<String>)> {
        let span = self.peek_span();
        let token = match self.peek() {
            Some((token, _)) => token.clone(),
            None => return Err(self.unexpected("property name")),
        };
        let key = match token {
            Token::Ident(name) => {
                self.advance();
                return Ok((PropKey::Static(name.to_string()), Some(name.to_string())));
            }
            Token::String(raw) => {
                self.advance();
                PropKey::Static(unescape(&raw[1..raw.len() - 1]).map_err(|m| ParseError::lex_error(span, m))?)
            }
            Token::Number(text) => {
                self.advance();
                let value = parse_number(text)
                    .ok_or_else(|| ParseError::invalid_syntax(span, format!("Invalid number {}", text)))?;
                PropKey::Static(number_key(value))
            }
            Token::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(Token::RBracket)?;
                PropKey::Computed(Box::new(expr))
            }
            token => match token.keyword() {
                Some(keyword) => {
                    self.advance();
                    PropKey::Static(keyword.to_string())
                }
                None => return Err(self.unexpected("property name")),
            },
        };
        Ok((key, None))
    }

    /// Reinterpret an expression as an assignment target
    fn expr_to_pattern(&self, expr: Expr) -> ParseResult<Pattern> {
        let span = expr.span;
        match expr.kind {
            ExprKind::Ident(name) => Ok(Pattern::Identifier(name)),
            kind @ ExprKind::Member { .. } => Ok(Pattern::Member(Box::new(Expr::new(kind, span)))),
            ExprKind::Array(items) => {
                let count = items.len();
                let mut elements = Vec::new();
                let mut rest = None;
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Argument::Expr(expr) => elements.push(Some(self.expr_to_pattern(expr)?)),
                        Argument::Spread(expr) if i + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(expr)?));
                        }
                        Argument::Spread(expr) => {
                            return Err(ParseError::invalid_syntax(expr.span, "Rest element must be last element"));
                        }
                    }
                }
                Ok(Pattern::Array { elements, rest })
            }
            ExprKind::Object(props) => {
                let count = props.len();
                let mut properties = Vec::new();
                let mut rest = None;
                for (i, prop) in props.into_iter().enumerate() {
                    match prop {
                        ObjectProp::KeyValue(key, value) => properties.push(PatternProperty {
                            key,
                            value: self.expr_to_pattern(value)?,
                        }),
                        ObjectProp::Spread(expr) if i + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(expr)?));
                        }
                        ObjectProp::Spread(expr) => {
                            return Err(ParseError::invalid_syntax(expr.span, "Rest element must be last element"));
                        }
                    }
                }
                Ok(Pattern::Object { properties, rest })
            }
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } => Ok(Pattern::Default { target, default: value }),
            _ => Err(ParseError::invalid_syntax(span, "Invalid destructuring assignment target")),
        }
    }

    // Expressions

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        let first = self.parse_assignment()?;
        if !self.check(Token::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.match_token(Token::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::new(ExprKind::Sequence(exprs), Span::new(start, self.prev_end())))
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.check_depth()?;
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let start = self.peek_span().start;
        let left = self.parse_conditional()?;
        let op = match self.peek_token() {
            Some(Token::Equals) => AssignOp::Assign,
            Some(Token::PlusEquals) => AssignOp::Add,
            Some(Token::MinusEquals) => AssignOp::Sub,
            Some(Token::StarEquals) => AssignOp::Mul,
            Some(Token::SlashEquals) => AssignOp::Div,
            Some(Token::PercentEquals) => AssignOp::Rem,
            Some(Token::StarStarEquals) => AssignOp::Pow,
            Some(Token::QuestionQuestionEquals) => AssignOp::Nullish,
            Some(Token::PipePipeEquals) => AssignOp::Or,
            Some(Token::AndAndEquals) => AssignOp::And,
            _ => return Ok(left),
        };
        self.advance();

        let target = if op == AssignOp::Assign {
            self.expr_to_pattern(left)?
        } else {
            simple_target(left, "Invalid left-hand side in assignment")?
        };
        let value = self.parse_assignment()?;

        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            Span::new(start, self.prev_end()),
        ))
    }

    fn try_parse_arrow(&mut self) -> ParseResult<Option<Expr>> {
        let start = self.peek_span().start;
        match self.peek_token() {
            Some(Token::Ident(name)) if matches!(self.peek_ahead_token(1), Some(Token::Arrow)) => {
                if *name == "async" {
                    return Err(ParseError::invalid_syntax(self.peek_span(), "Async functions are not supported"));
                }
                let params = vec![Pattern::Identifier(name.to_string())];
                self.advance();
                self.parse_arrow_body(start, params, None).map(Some)
            }
            Some(Token::Ident(name))
                if *name == "async"
                    && matches!(self.peek_ahead_token(1), Some(Token::LParen) | Some(Token::Ident(_))) =>
            {
                let mut ahead = self.pos + 1;
                if matches!(self.peek_ahead_token(1), Some(Token::Ident(_))) {
                    ahead += 1;
                    if matches!(self.tokens.get(ahead), Some((Token::Arrow, _))) {
                        return Err(ParseError::invalid_syntax(self.peek_span(), "Async functions are not supported"));
                    }
                    return Ok(None);
                }
                if self.is_arrow_head(ahead) {
                    return Err(ParseError::invalid_syntax(self.peek_span(), "Async functions are not supported"));
                }
                Ok(None)
            }
            Some(Token::LParen) if self.is_arrow_head(self.pos) => {
                let (params, rest) = self.parse_params()?;
                if self.newline_before() {
                    return Err(self.unexpected("'=>' on the same line"));
                }
                self.parse_arrow_body(start, params, rest).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Is the `(` at `index` the start of an arrow parameter list?
    fn is_arrow_head(&self, index: usize) -> bool {
        let mut depth = 0usize;
        let mut i = index;
        while let Some((token, _)) = self.tokens.get(i) {
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return matches!(self.tokens.get(i + 1), Some((Token::Arrow, _)));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_arrow_body(&mut self, start: usize, params: Vec<Pattern>, rest: Option<Pattern>) -> ParseResult<Expr> {
        self.expect(Token::Arrow)?;
        let body = if self.check(Token::LBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            let saved = std::mem::replace(&mut self.no_in, false);
            let expr = self.parse_assignment();
            self.no_in = saved;
            FunctionBody::Expr(Box::new(expr?))
        };
        let span = Span::new(start, self.prev_end());
        let def = FunctionDef {
            name: None,
            params,
            rest,
            body,
            is_arrow: true,
            span,
        };
        Ok(Expr::new(ExprKind::Function(Rc::new(def)), span))
    }

    fn parse_conditional(&mut self) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        let test = self.parse_binary(0)?;
        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let saved = std::mem::replace(&mut self.no_in, false);
        let consequent = self.parse_assignment();
        self.no_in = saved;
        let consequent = consequent?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_assignment()?;

        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            Span::new(start, self.prev_end()),
        ))
    }

    fn peek_operator(&self) -> Option<(Operator, u8)> {
        let op = match self.peek_token()? {
            Token::QuestionQuestion => (Operator::Logical(LogicalOp::Nullish), 1),
            Token::PipePipe => (Operator::Logical(LogicalOp::Or), 2),
            Token::AndAnd => (Operator::Logical(LogicalOp::And), 3),
            Token::Pipe => (Operator::Binary(BinaryOp::BitOr), 4),
            Token::Caret => (Operator::Binary(BinaryOp::BitXor), 5),
            Token::Ampersand => (Operator::Binary(BinaryOp::BitAnd), 6),
            Token::EqualsEquals => (Operator::Binary(BinaryOp::Eq), 7),
            Token::NotEquals => (Operator::Binary(BinaryOp::NotEq), 7),
            Token::StrictEquals => (Operator::Binary(BinaryOp::StrictEq), 7),
            Token::StrictNotEquals => (Operator::Binary(BinaryOp::StrictNotEq), 7),
            Token::LAngle => (Operator::Binary(BinaryOp::Lt), 8),
            Token::LessThanEquals => (Operator::Binary(BinaryOp::LtEq), 8),
            Token::RAngle => (Operator::Binary(BinaryOp::Gt), 8),
            Token::GreaterThanEquals => (Operator::Binary(BinaryOp::GtEq), 8),
            Token::Instanceof => (Operator::Binary(BinaryOp::Instanceof), 8),
            Token::In if !self.no_in => (Operator::Binary(BinaryOp::In), 8),
            Token::ShiftLeft => (Operator::Binary(BinaryOp::Shl), 9),
            Token::ShiftRight => (Operator::Binary(BinaryOp::Shr), 9),
            Token::UnsignedShiftRight => (Operator::Binary(BinaryOp::UShr), 9),
            Token::Plus => (Operator::Binary(BinaryOp::Add), 10),
            Token::Minus => (Operator::Binary(BinaryOp::Sub), 10),
            Token::Star => (Operator::Binary(BinaryOp::Mul), 11),
            Token::Slash => (Operator::Binary(BinaryOp::Div), 11),
            Token::Percent => (Operator::Binary(BinaryOp::Rem), 11),
            Token::StarStar => (Operator::Binary(BinaryOp::Pow), EXPONENT_PRECEDENCE),
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        let mut left = self.parse_unary()?;

        while let Some((op, precedence)) = self.peek_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance();

            // `**` is right-associative
            let next = if precedence == EXPONENT_PRECEDENCE {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary(next)?;
            let span = Span::new(start, self.prev_end());
            left = match op {
                Operator::Binary(op) => Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ),
                Operator::Logical(op) => Expr::new(
                    ExprKind::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                ),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.check_depth()?;
        let start = self.peek_span().start;
        let op = match self.peek_token() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Minus,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Tilde) => UnaryOp::BitNot,
            Some(Token::Typeof) => UnaryOp::Typeof,
            Some(Token::Void) => UnaryOp::Void,
            Some(Token::Delete) => UnaryOp::Delete,
            Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                let op = if self.check(Token::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let target = self.parse_unary()?;
                let target = update_target(target, "Invalid left-hand side expression in prefix operation")?;
                return Ok(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    Span::new(start, self.prev_end()),
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                argument: Box::new(argument),
            },
            Span::new(start, self.prev_end()),
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        let expr = self.parse_call_member()?;
        let op = match self.peek_token() {
            Some(Token::PlusPlus) if !self.newline_before() => UpdateOp::Increment,
            Some(Token::MinusMinus) if !self.newline_before() => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        self.advance();
        let target = update_target(expr, "Invalid left-hand side expression in postfix operation")?;
        Ok(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target: Box::new(target),
            },
            Span::new(start, self.prev_end()),
        ))
    }

    /// Member accesses and calls following a primary expression
    fn parse_call_member(&mut self) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        let mut expr = if self.check(Token::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            let kind = match self.peek_token() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberProp::Name(name),
                        optional: false,
                    }
                }
                Some(Token::QuestionDot) => {
                    self.advance();
                    match self.peek_token() {
                        Some(Token::LParen) => ExprKind::Call {
                            callee: Box::new(expr),
                            args: self.parse_arguments()?,
                            optional: true,
                        },
                        Some(Token::LBracket) => ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProp::Computed(Box::new(self.parse_computed_member()?)),
                            optional: true,
                        },
                        _ => ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProp::Name(self.expect_property_name()?),
                            optional: true,
                        },
                    }
                }
                Some(Token::LBracket) => ExprKind::Member {
                    object: Box::new(expr),
                    property: MemberProp::Computed(Box::new(self.parse_computed_member()?)),
                    optional: false,
                },
                Some(Token::LParen) => ExprKind::Call {
                    callee: Box::new(expr),
                    args: self.parse_arguments()?,
                    optional: false,
                },
                Some(Token::Template(_)) => {
                    return Err(ParseError::invalid_syntax(
                        self.peek_span(),
                        "Tagged templates are not supported",
                    ));
                }
                _ => break,
            };
            expr = Expr::new(kind, Span::new(start, self.prev_end()));
        }

        Ok(expr)
    }

    fn parse_computed_member(&mut self) -> ParseResult<Expr> {
        self.expect(Token::LBracket)?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let property = self.parse_expression();
        self.no_in = saved;
        let property = property?;
        self.expect(Token::RBracket)?;
        Ok(property)
    }

    fn parse_new(&mut self) -> ParseResult<Expr> {
        let start = self.peek_span().start;
        self.expect(Token::New)?;

        let mut callee = if self.check(Token::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            let property = match self.peek_token() {
                Some(Token::Dot) => {
                    self.advance();
                    MemberProp::Name(self.expect_property_name()?)
                }
                Some(Token::LBracket) => MemberProp::Computed(Box::new(self.parse_computed_member()?)),
                _ => break,
            };
            callee = Expr::new(
                ExprKind::Member {
                    object: Box::new(callee),
                    property,
                    optional: false,
                },
                Span::new(start, self.prev_end()),
            );
        }

        let args = if self.check(Token::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            Span::new(start, self.prev_end()),
        ))
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Argument>> {
        self.expect(Token::LParen)?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let args = self.parse_argument_list(Token::RParen);
        self.no_in = saved;
        let args = args?;
        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Comma separated expressions with spread, up to (not including) `close`
    fn parse_argument_list(&mut self, close: Token) -> ParseResult<Vec<Argument>> {
        let mut args = Vec::new();
        while !self.check(close.clone()) && !self.is_at_end() {
            if self.check(Token::Comma) {
                return Err(ParseError::invalid_syntax(self.peek_span(), "Array holes are not supported"));
            }
            if self.match_token(Token::Ellipsis) {
                args.push(Argument::Spread(self.parse_assignment()?));
            } else {
                args.push(Argument::Expr(self.parse_assignment()?));
            }
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let span = self.peek_span();
        let token = match self.peek() {
            Some((token, _)) => token.clone(),
            None => return Err(self.unexpected("expression")),
        };

        let kind = match token {
            Token::Number(text) => {
                self.advance();
                let value = parse_number(text)
                    .ok_or_else(|| ParseError::invalid_syntax(span, format!("Invalid number {}", text)))?;
                ExprKind::Number(value)
            }
            Token::String(raw) => {
                self.advance();
                let value = unescape(&raw[1..raw.len() - 1]).map_err(|m| ParseError::lex_error(span, m))?;
                ExprKind::String(value.into())
            }
            Token::Template(raw) => {
                self.advance();
                return self.parse_template(raw, span);
            }
            Token::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            Token::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            Token::Null => {
                self.advance();
                ExprKind::Null
            }
            Token::This => {
                self.advance();
                ExprKind::This
            }
            Token::Ident(name) => {
                if name == "async" && matches!(self.peek_ahead_token(1), Some(Token::Function)) {
                    return Err(ParseError::invalid_syntax(span, "Async functions are not supported"));
                }
                self.advance();
                ExprKind::Ident(name.to_string())
            }
            Token::Function => ExprKind::Function(self.parse_function(false)?),
            Token::Class => ExprKind::Class(self.parse_class(false)?),
            Token::Super => {
                self.advance();
                match self.peek_token() {
                    Some(Token::LParen) => ExprKind::SuperCall(self.parse_arguments()?),
                    Some(Token::Dot) => {
                        self.advance();
                        ExprKind::SuperMember(MemberProp::Name(self.expect_property_name()?))
                    }
                    Some(Token::LBracket) => {
                        ExprKind::SuperMember(MemberProp::Computed(Box::new(self.parse_computed_member()?)))
                    }
                    _ => return Err(ParseError::invalid_syntax(span, "'super' keyword unexpected here")),
                }
            }
            Token::LParen => {
                self.advance();
                let saved = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_expression();
                self.no_in = saved;
                let expr = expr?;
                self.expect(Token::RParen)?;
                return Ok(expr);
            }
            Token::LBracket => {
                self.advance();
                let saved = std::mem::replace(&mut self.no_in, false);
                let elements = self.parse_argument_list(Token::RBracket);
                self.no_in = saved;
                let elements = elements?;
                self.expect(Token::RBracket)?;
                ExprKind::Array(elements)
            }
            Token::LBrace => {
                let saved = std::mem::replace(&mut self.no_in, false);
                let props = self.parse_object_literal();
                self.no_in = saved;
                ExprKind::Object(props?)
            }
            Token::Slash | Token::SlashEquals => {
                return Err(ParseError::invalid_syntax(
                    span,
                    "Regular expression literals are not supported",
                ));
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(Expr::new(kind, Span::new(span.start, self.prev_end())))
    }

    fn parse_object_literal(&mut self) -> ParseResult<Vec<ObjectProp>> {
        self.expect(Token::LBrace)?;
        let mut props = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            if self.match_token(Token::Ellipsis) {
                props.push(ObjectProp::Spread(self.parse_assignment()?));
            } else {
                let key_start = self.peek_span().start;
                let (key, shorthand) = self.parse_property_key()?;
                if self.match_token(Token::Colon) {
                    props.push(ObjectProp::KeyValue(key, self.parse_assignment()?));
                } else if self.check(Token::LParen) {
                    let (params, rest) = self.parse_params()?;
                    let body = self.parse_function_body()?;
                    let span = Span::new(key_start, self.prev_end());
                    let def = FunctionDef {
                        name: static_key_name(&key),
                        params,
                        rest,
                        body: FunctionBody::Block(body),
                        is_arrow: false,
                        span,
                    };
                    props.push(ObjectProp::KeyValue(key, Expr::new(ExprKind::Function(Rc::new(def)), span)));
                } else if let Some(name) = shorthand {
                    let span = Span::new(key_start, self.prev_end());
                    props.push(ObjectProp::KeyValue(key, Expr::new(ExprKind::Ident(name), span)));
                } else {
                    return Err(self.unexpected("':'"));
                }
            }
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(props)
    }

    /// Split a template token into cooked text and parsed substitutions
    fn parse_template(&mut self, raw: &'src str, span: Span) -> ParseResult<Expr> {
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut cursor = Cursor::new(raw);
        cursor.bump();
        let mut chunk_start = cursor.pos();

        loop {
            match cursor.peek() {
                None => return Err(ParseError::lex_error(span, "Unterminated template literal")),
                Some('`') => break,
                Some('\\') => {
                    cursor.bump();
                    cursor.bump();
                }
                Some('$') if cursor.peek_nth(1) == Some('{') => {
                    let chunk = cursor.slice(chunk_start, cursor.pos());
                    quasis.push(unescape(chunk).map_err(|m| ParseError::lex_error(span, m))?);
                    cursor.eat("${");
                    let expr_start = cursor.pos();
                    cursor
                        .skip_balanced('}')
                        .map_err(|e| ParseError::lex_error(span, e.to_string()))?;
                    let expr_end = cursor.pos().saturating_sub(1).max(expr_start);

                    let mut sub = Parser::for_range(self.source, span.start + expr_start, span.start + expr_end)?;
                    sub.guard = self.guard;
                    let expr = sub.parse_expression()?;
                    if !sub.is_at_end() {
                        return Err(sub.unexpected("'}'"));
                    }
                    exprs.push(expr);
                    chunk_start = cursor.pos();
                }
                Some(_) => {
                    cursor.bump();
                }
            }
        }

        let chunk = cursor.slice(chunk_start, cursor.pos());
        quasis.push(unescape(chunk).map_err(|m| ParseError::lex_error(span, m))?);
        Ok(Expr::new(ExprKind::Template { quasis, exprs }, span))
    }

    // Helper methods

    /// Nesting is bounded by native stack, not by a fixed count
    fn check_depth(&self) -> ParseResult<()> {
        if self.guard.exhausted() {
            return Err(ParseError::invalid_syntax(self.peek_span(), "Code is nested too deeply"));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&(Token<'src>, Span)> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token<'src>> {
        self.peek().map(|(token, _)| token)
    }

    fn peek_ahead_token(&self, offset: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + offset).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Span)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    /// Contextual keyword such as `of` or `static`
    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek_token(), Some(Token::Ident(ident)) if *ident == name)
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_property_name(&mut self) -> ParseResult<String> {
        let name = match self.peek_token() {
            Some(Token::Ident(name)) => name.to_string(),
            Some(token) => match token.keyword() {
                Some(keyword) => keyword.to_string(),
                None => return Err(self.unexpected("property name")),
            },
            None => return Err(self.unexpected("property name")),
        };
        self.advance();
        Ok(name)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some((token, span)) => ParseError::unexpected_token(*span, expected, token.to_string()),
            None => ParseError::unexpected_eof(self.peek_span(), expected),
        }
    }

    /// Automatic semicolon insertion: a `;` is optional before `}`, at the
    /// end of input and after a line break
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.match_token(Token::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    fn at_statement_end(&self) -> bool {
        self.check(Token::Semicolon) || self.check(Token::RBrace) || self.is_at_end() || self.newline_before()
    }

    /// Is there a line break between the previous token and the next one?
    fn newline_before(&self) -> bool {
        if self.pos == 0 {
            return false;
        }
        match (self.tokens.get(self.pos - 1), self.tokens.get(self.pos)) {
            (Some((_, prev)), Some((_, next))) => self.source[prev.end..next.start].contains('\n'),
            _ => false,
        }
    }

    fn prev_end(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| span.end)
            .unwrap_or(0)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or_else(|| Span::at(self.end))
    }
}

fn static_key_name(key: &PropKey) -> Option<String> {
    match key {
        PropKey::Static(name) => Some(name.clone()),
        PropKey::Computed(_) => None,
    }
}

/// Identifier or member target of a compound assignment
fn simple_target(expr: Expr, message: &str) -> ParseResult<Pattern> {
    let span = expr.span;
    match expr.kind {
        ExprKind::Ident(name) => Ok(Pattern::Identifier(name)),
        kind @ ExprKind::Member { .. } => Ok(Pattern::Member(Box::new(Expr::new(kind, span)))),
        _ => Err(ParseError::invalid_syntax(span, message)),
    }
}

fn update_target(expr: Expr, message: &str) -> ParseResult<Expr> {
    match expr.kind {
        ExprKind::Ident(_) | ExprKind::Member { .. } => Ok(expr),
        _ => Err(ParseError::invalid_syntax(expr.span, message)),
    }
}

/// Parse a complete script
pub fn parse(source: &str) -> ParseResult<Program> {
    Parser::new(source)?.parse_program()
}
