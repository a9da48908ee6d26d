//! Host-side render units
//!
//! A [`Template`] is a tree of [`Node`]s built in code. It stands in for a
//! compiled template: literal text, `{{ expr }}` outputs, loops, conditionals,
//! inline blocks and macro calls.
//!
//! # Example
//!
//! ```rust
//! use native_render::template::{Expr, Node, Template};
//! use native_render::{Context, Renderer, Value};
//!
//! // {% for x in items %}{{ x }}{% endfor %}
//! let tmpl = Template::new("digits").with_body(vec![Node::for_each(
//!     "x",
//!     Expr::var("items"),
//!     vec![Node::output(Expr::var("x"))],
//! )]);
//!
//! let ctx = Context::new().with("items", vec![1i64, 2, 3]);
//! let value = Renderer::default().render(&tmpl, &ctx).unwrap();
//! assert_eq!(value, Value::Integer(123));
//! ```

mod registry;
mod resolver;

use futures_util::future::{FutureExt, LocalBoxFuture};

pub use registry::UnitRegistry;

use crate::render::{Context, Fragments, RenderError, RenderUnit, Renderer};
use crate::value::Value;
use resolver::{Evaluator, Frame, Suspension};

/// Fields of the innermost `loop` variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopField {
    /// 1-based position
    Index,
    /// 0-based position
    Index0,
    First,
    Last,
    Length,
}

/// An expression inside `{{ }}` or a control tag
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Value),
    Var(String),
    Attr(Box<Expr>, String),
    Item(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    IsDefined(Box<Expr>),
    Loop(LoopField),
    /// Invoke a registered unit; its output is reconstructed to one value
    Call { unit: String, args: Vec<Expr> },
    /// Evaluate with a suspension point first (async renders only)
    Await(Box<Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Const(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn call(unit: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            unit: unit.into(),
            args,
        }
    }

    pub fn loop_field(field: LoopField) -> Self {
        Expr::Loop(field)
    }

    pub fn attr(self, name: impl Into<String>) -> Self {
        Expr::Attr(Box::new(self), name.into())
    }

    pub fn item(self, index: Expr) -> Self {
        Expr::Item(Box::new(self), Box::new(index))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: Expr) -> Self {
        Expr::Add(Box::new(self), Box::new(rhs))
    }

    pub fn equals(self, rhs: Expr) -> Self {
        Expr::Eq(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn is_defined(self) -> Self {
        Expr::IsDefined(Box::new(self))
    }

    pub fn awaited(self) -> Self {
        Expr::Await(Box::new(self))
    }
}

/// A statement in a unit body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal template text, emitted as a string fragment
    Text(String),
    /// `{{ expr }}`, emitted as the native value
    Output(Expr),
    For {
        var: String,
        iter: Expr,
        body: Vec<Node>,
    },
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    /// `{% block name %}`: the named unit's fragments go straight into the
    /// enclosing output
    Block(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn output(expr: Expr) -> Self {
        Node::Output(expr)
    }

    pub fn for_each(var: impl Into<String>, iter: Expr, body: Vec<Node>) -> Self {
        Node::For {
            var: var.into(),
            iter,
            body,
        }
    }

    pub fn when(cond: Expr, then: Vec<Node>, otherwise: Vec<Node>) -> Self {
        Node::If {
            cond,
            then,
            otherwise,
        }
    }

    pub fn block(name: impl Into<String>) -> Self {
        Node::Block(name.into())
    }
}

/// A named unit: a top-level template, a macro or a block
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    params: Vec<String>,
    body: Vec<Node>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Positional parameters bound on [`Expr::Call`]
    pub fn with_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: Vec<Node>) -> Self {
        self.body = body;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &[Node] {
        &self.body
    }
}

impl RenderUnit for Template {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(
        &self,
        renderer: &Renderer,
        ctx: &Context,
        out: &mut Fragments,
    ) -> Result<(), RenderError> {
        let evaluator = Evaluator::new(renderer, Suspension::Blocking);
        let frame = Frame::new(ctx.clone());
        // Blocking evaluation never awaits anything that can be pending
        evaluator
            .emit(&self.body, &frame, out)
            .now_or_never()
            .unwrap_or_else(|| {
                Err(RenderError::Suspended {
                    name: self.name.clone(),
                })
            })
    }

    fn produce_async<'a>(
        &'a self,
        renderer: &'a Renderer,
        ctx: &'a Context,
        out: &'a mut Fragments,
    ) -> LocalBoxFuture<'a, Result<(), RenderError>> {
        Box::pin(async move {
            let evaluator = Evaluator::new(renderer, Suspension::Cooperative);
            let frame = Frame::new(ctx.clone());
            evaluator.emit(&self.body, &frame, out).await
        })
    }
}
