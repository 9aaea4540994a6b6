use crate::diagnostics::Span;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Var(String),
    UnaryMinus(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: FuncName,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The bare identifier this expression consists of, if any
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Every variable the expression reads
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Var(name) => out.push(name),
            Expr::UnaryMinus(inner) => inner.collect_variables(out),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_variables(out)),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Built-in function names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncName {
    Sin,
    Cos,
    Sqrt,
    Radians,
    Degrees,
}

/// Let binding declaration: `let name = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct LetDecl {
    pub name: String,
    pub expr: Expr,
    pub span: Option<Span>,
}

/// Right-hand side of `key=value`
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(Expr),
    Vector([Expr; 3]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: AttrValue,
}

/// Component declaration: `kind name key=value ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDecl {
    pub kind: String,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub span: Option<Span>,
}

impl ComponentDecl {
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key == key)
    }

    /// Name of the component this one is placed against
    pub fn relative(&self) -> Option<&str> {
        match &self.attribute("relative")?.value {
            AttrValue::Scalar(expr) => expr.as_symbol(),
            AttrValue::Vector(_) => None,
        }
    }
}

/// Run settings: `run rays=N seed=S`
#[derive(Debug, Clone, PartialEq)]
pub struct RunDecl {
    pub attributes: Vec<Attribute>,
    pub span: Option<Span>,
}

/// A parsed instrument description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrument {
    pub lets: Vec<LetDecl>,
    pub components: Vec<ComponentDecl>,
    pub runs: Vec<RunDecl>,
}
