use std::fmt;

use regex::Regex;

use crate::functions::Predicate;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Priority of every operand-like node (literals, selectors, groups, calls).
pub const OPERAND_PRIORITY: u8 = 7;

impl BinOp {
    /// Binding strength; higher binds tighter.
    pub fn priority(self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div | BinOp::Mod => 6,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 4,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::And => 2,
            BinOp::Or => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Which value a `$` selector starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// `$` or `(path)$`.
    Field,
    /// `$k`: key of the element visited by `range()`.
    Key,
    /// `$v`: value of the element visited by `range()`.
    Value,
}

/// `(path)$[sub]...`, `$k[sub]...` or `$v[sub]...`.
#[derive(Debug, Clone)]
pub struct Selector {
    /// Field path; `None` addresses the field owning the expression.
    pub path: Option<String>,
    /// Position of `path` among the expression's distinct field paths, in
    /// first-seen order. Assigned when the [`Expression`] is built.
    pub slot: usize,
    pub kind: SelectorKind,
    pub subscripts: Vec<Node>,
}

// ---------------------------------------------------------------------------
// Built-in and registered functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Func {
    /// `len(x)`
    Len(Box<Node>),
    /// `regexp('pattern'[, x])`; the pattern is compiled at parse time.
    Regexp { pattern: Regex, subject: Box<Node> },
    /// `sprintf(fmt, args...)`
    Sprintf { format: Box<Node>, args: Vec<Node> },
    /// `in(x, candidates...)`
    In {
        subject: Box<Node>,
        candidates: Vec<Node>,
    },
    /// `range(x, body)`: `body` runs per element with `$k`/`$v` bound.
    Range { subject: Box<Node>, body: Box<Node> },
    /// A predicate looked up in the function registry at parse time.
    Custom {
        name: String,
        predicate: Predicate,
        arg: Box<Node>,
    },
}

impl Func {
    pub fn name(&self) -> &str {
        match self {
            Func::Len(_) => "len",
            Func::Regexp { .. } => "regexp",
            Func::Sprintf { .. } => "sprintf",
            Func::In { .. } => "in",
            Func::Range { .. } => "range",
            Func::Custom { name, .. } => name,
        }
    }

    fn for_each_arg<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        match self {
            Func::Len(arg) => f(arg),
            Func::Regexp { subject, .. } => f(subject),
            Func::Sprintf { format, args } => {
                f(format);
                args.iter().for_each(|a| f(a));
            }
            Func::In {
                subject,
                candidates,
            } => {
                f(subject);
                candidates.iter().for_each(|c| f(c));
            }
            Func::Range { subject, body } => {
                f(subject);
                f(body);
            }
            Func::Custom { arg, .. } => f(arg),
        }
    }

    fn for_each_arg_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        match self {
            Func::Len(arg) | Func::Regexp { subject: arg, .. } | Func::Custom { arg, .. } => f(arg),
            Func::Sprintf { format, args } => {
                f(format);
                args.iter_mut().for_each(|a| f(a));
            }
            Func::In {
                subject,
                candidates,
            } => {
                f(subject);
                candidates.iter_mut().for_each(|c| f(c));
            }
            Func::Range { subject, body } => {
                f(subject);
                f(body);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Node {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Selector(Selector),
    /// Parenthesised sub-expression. `negate` flips a Bool result only.
    Group { negate: bool, inner: Box<Node> },
    BinOp {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Function call. `negate` flips a Bool result only.
    Call { negate: bool, func: Func },
}

impl Node {
    pub fn priority(&self) -> u8 {
        match self {
            Node::BinOp { op, .. } => op.priority(),
            _ => OPERAND_PRIORITY,
        }
    }

    /// The current-field selector `$`.
    pub fn current() -> Node {
        Node::Selector(Selector {
            path: None,
            slot: 0,
            kind: SelectorKind::Field,
            subscripts: Vec::new(),
        })
    }

    /// Visit every selector in this tree, depth first.
    pub fn walk_selectors<'a>(&'a self, f: &mut impl FnMut(&'a Selector)) {
        match self {
            Node::Selector(sel) => {
                f(sel);
                for sub in &sel.subscripts {
                    sub.walk_selectors(&mut *f);
                }
            }
            Node::Group { inner, .. } => inner.walk_selectors(f),
            Node::BinOp { left, right, .. } => {
                left.walk_selectors(&mut *f);
                right.walk_selectors(f);
            }
            Node::Call { func, .. } => func.for_each_arg(&mut |arg| arg.walk_selectors(&mut *f)),
            Node::Nil | Node::Bool(_) | Node::Number(_) | Node::Str(_) => {}
        }
    }

    fn walk_selectors_mut(&mut self, f: &mut impl FnMut(&mut Selector)) {
        match self {
            Node::Selector(sel) => {
                f(sel);
                for sub in &mut sel.subscripts {
                    sub.walk_selectors_mut(&mut *f);
                }
            }
            Node::Group { inner, .. } => inner.walk_selectors_mut(f),
            Node::BinOp { left, right, .. } => {
                left.walk_selectors_mut(&mut *f);
                right.walk_selectors_mut(f);
            }
            Node::Call { func, .. } => {
                func.for_each_arg_mut(&mut |arg| arg.walk_selectors_mut(&mut *f))
            }
            Node::Nil | Node::Bool(_) | Node::Number(_) | Node::Str(_) => {}
        }
    }
}

/// S-expression rendering, used by `tagx check` and tests.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Nil => write!(f, "nil"),
            Node::Bool(b) => write!(f, "{b}"),
            Node::Number(n) => write!(f, "{n}"),
            Node::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Node::Selector(sel) => write!(f, "{sel}"),
            Node::Group { negate, inner } => {
                if *negate {
                    write!(f, "!")?;
                }
                write!(f, "(group {inner})")
            }
            Node::BinOp { op, left, right } => write!(f, "({} {left} {right})", op.symbol()),
            Node::Call { negate, func } => {
                if *negate {
                    write!(f, "!")?;
                }
                write!(f, "({}", func.name())?;
                if let Func::Regexp { pattern, .. } = func {
                    write!(f, " /{}/", pattern.as_str())?;
                }
                let mut result = Ok(());
                func.for_each_arg(&mut |arg| {
                    if result.is_ok() {
                        result = write!(f, " {arg}");
                    }
                });
                result?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "({path})")?;
        }
        match self.kind {
            SelectorKind::Field => write!(f, "$")?,
            SelectorKind::Key => write!(f, "$k")?,
            SelectorKind::Value => write!(f, "$v")?,
        }
        for sub in &self.subscripts {
            write!(f, "[{sub}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Expression
// ---------------------------------------------------------------------------

/// A compiled, immutable expression tree plus the text it came from.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    pub(crate) fn new(source: &str, mut root: Node) -> Self {
        let mut seen: Vec<String> = Vec::new();
        root.walk_selectors_mut(&mut |sel| {
            if let Some(path) = &sel.path {
                sel.slot = match seen.iter().position(|p| p == path) {
                    Some(slot) => slot,
                    None => {
                        seen.push(path.clone());
                        seen.len() - 1
                    }
                };
            }
        });
        Self {
            source: source.to_string(),
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Distinct field paths named by `(path)$` selectors, in first-seen order.
    /// A selector's `slot` indexes this list.
    pub fn field_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        self.root.walk_selectors(&mut |sel| {
            if let Some(path) = sel.path.as_deref()
                && !paths.contains(&path)
            {
                paths.push(path);
            }
        });
        paths
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
