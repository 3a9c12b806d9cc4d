use playbox_common::Span;
use std::rc::Rc;

/// Parsed script
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub target: Pattern,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    VarDecl {
        kind: VarKind,
        declarations: Vec<VarDeclarator>,
    },
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        binding: ForBinding,
        object: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        binding: ForBinding,
        iterable: Expr,
        body: Box<Stmt>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        param: Option<Pattern>,
        handler: Option<Vec<Stmt>>,
        finalizer: Option<Vec<Stmt>>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl {
        kind: VarKind,
        declarations: Vec<VarDeclarator>,
    },
    Expr(Expr),
}

/// Left side of `for…in` / `for…of`
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub kind: Option<VarKind>,
    pub target: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// Binding and assignment targets
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Identifier(String),
    Object {
        properties: Vec<PatternProperty>,
        rest: Option<Box<Pattern>>,
    },
    Array {
        elements: Vec<Option<Pattern>>,
        rest: Option<Box<Pattern>>,
    },
    Default {
        target: Box<Pattern>,
        default: Box<Expr>,
    },
    /// Member expression target (assignment only)
    Member(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    pub key: PropKey,
    pub value: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Static(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub rest: Option<Pattern>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Option<String>,
    pub superclass: Option<Expr>,
    pub constructor: Option<Rc<FunctionDef>>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub key: PropKey,
    pub is_static: bool,
    pub value: ClassMemberValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberValue {
    Method(Rc<FunctionDef>),
    Field(Option<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Call argument or array literal element
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    KeyValue(PropKey, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(Rc<str>),
    Template {
        quasis: Vec<String>,
        exprs: Vec<Expr>,
    },
    Bool(bool),
    Null,
    This,
    Ident(String),
    Array(Vec<Argument>),
    Object(Vec<ObjectProp>),
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Pattern>,
        value: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProp,
        optional: bool,
    },
    SuperCall(Vec<Argument>),
    SuperMember(MemberProp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Instanceof,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Nullish,
    Or,
    And,
}

impl AssignOp {
    /// Arithmetic operator applied by compound assignment
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
            AssignOp::Pow => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    pub fn logical(self) -> Option<LogicalOp> {
        match self {
            AssignOp::Nullish => Some(LogicalOp::Nullish),
            AssignOp::Or => Some(LogicalOp::Or),
            AssignOp::And => Some(LogicalOp::And),
            _ => None,
        }
    }
}
