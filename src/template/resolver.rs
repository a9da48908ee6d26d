//! Evaluation of unit bodies into fragments
//!
//! One evaluator serves both execution modes. In blocking mode nothing it
//! awaits can be pending, so the caller polls the future once. In cooperative
//! mode `Expr::Await` yields to the runtime before evaluating its operand.

use futures_util::future::LocalBoxFuture;

use super::{Expr, LoopField, Node};
use crate::render::{Context, Fragments, RenderError, RenderUnit, Renderer};
use crate::value::{Undefined, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Suspension {
    Blocking,
    Cooperative,
}

/// Position within the innermost loop
#[derive(Debug, Clone, Copy)]
struct LoopState {
    index0: usize,
    length: usize,
}

impl LoopState {
    fn field(&self, field: LoopField) -> Value {
        match field {
            LoopField::Index => Value::Integer(self.index0 as i64 + 1),
            LoopField::Index0 => Value::Integer(self.index0 as i64),
            LoopField::First => Value::Boolean(self.index0 == 0),
            LoopField::Last => Value::Boolean(self.index0 + 1 == self.length),
            LoopField::Length => Value::Integer(self.length as i64),
        }
    }
}

/// Variables in scope plus the innermost loop
pub(crate) struct Frame {
    ctx: Context,
    current_loop: Option<LoopState>,
}

impl Frame {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            ctx,
            current_loop: None,
        }
    }

    fn context(&self) -> &Context {
        &self.ctx
    }

    fn enter_loop(&self, var: &str, item: Value, state: LoopState) -> Frame {
        let mut ctx = self.ctx.clone();
        ctx.insert(var, item);
        Frame {
            ctx,
            current_loop: Some(state),
        }
    }

    fn loop_field(&self, field: LoopField) -> Value {
        match &self.current_loop {
            Some(state) => state.field(field),
            None => Value::Undefined(Undefined::missing("loop")),
        }
    }
}

pub(crate) struct Evaluator<'r> {
    renderer: &'r Renderer,
    mode: Suspension,
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(renderer: &'r Renderer, mode: Suspension) -> Self {
        Self { renderer, mode }
    }

    /// Emit the fragments of `nodes` in order
    pub(crate) fn emit<'a>(
        &'a self,
        nodes: &'a [Node],
        frame: &'a Frame,
        out: &'a mut Fragments,
    ) -> LocalBoxFuture<'a, Result<(), RenderError>> {
        Box::pin(async move {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push(text.as_str()),
                    Node::Output(expr) => {
                        let value = self.eval(expr, frame).await?;
                        out.push(value);
                    }
                    Node::For { var, iter, body } => {
                        let items = self.eval(iter, frame).await?.iterate()?;
                        let length = items.len();
                        for (index0, item) in items.into_iter().enumerate() {
                            let inner = frame.enter_loop(var, item, LoopState { index0, length });
                            self.emit(body, &inner, out).await?;
                        }
                    }
                    Node::If {
                        cond,
                        then,
                        otherwise,
                    } => {
                        let branch = if self.eval(cond, frame).await?.is_truthy()? {
                            then
                        } else {
                            otherwise
                        };
                        self.emit(branch, frame, out).await?;
                    }
                    Node::Block(name) => {
                        let unit = self.renderer.unit(name)?;
                        let scope = frame.context().descend(name)?;
                        match self.mode {
                            Suspension::Blocking => unit.produce(self.renderer, &scope, out)?,
                            Suspension::Cooperative => {
                                unit.produce_async(self.renderer, &scope, out).await?
                            }
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn eval<'a>(
        &'a self,
        expr: &'a Expr,
        frame: &'a Frame,
    ) -> LocalBoxFuture<'a, Result<Value, RenderError>> {
        Box::pin(async move {
            match expr {
                Expr::Const(value) => Ok(value.clone()),
                Expr::Var(name) => Ok(frame.context().lookup(name)),
                Expr::Attr(base, name) => self.eval(base, frame).await?.get_attr(name),
                Expr::Item(base, index) => {
                    let base = self.eval(base, frame).await?;
                    let index = self.eval(index, frame).await?;
                    base.get_item(&index)
                }
                Expr::Add(lhs, rhs) => {
                    let lhs = self.eval(lhs, frame).await?;
                    let rhs = self.eval(rhs, frame).await?;
                    lhs.add(&rhs)
                }
                Expr::Eq(lhs, rhs) => {
                    let lhs = self.eval(lhs, frame).await?;
                    let rhs = self.eval(rhs, frame).await?;
                    lhs.equals(&rhs).map(Value::Boolean)
                }
                Expr::Not(inner) => {
                    let truthy = self.eval(inner, frame).await?.is_truthy()?;
                    Ok(Value::Boolean(!truthy))
                }
                Expr::IsDefined(inner) => {
                    let value = self.eval(inner, frame).await?;
                    Ok(Value::Boolean(match &value {
                        Value::Undefined(u) => u.check(),
                        _ => true,
                    }))
                }
                Expr::Loop(field) => Ok(frame.loop_field(*field)),
                Expr::Call { unit, args } => self.call(unit, args, frame).await,
                Expr::Await(inner) => {
                    if self.mode == Suspension::Cooperative {
                        tokio::task::yield_now().await;
                    }
                    self.eval(inner, frame).await
                }
            }
        })
    }

    async fn call(&self, name: &str, args: &[Expr], frame: &Frame) -> Result<Value, RenderError> {
        let unit = self.renderer.unit(name)?;
        if args.len() != unit.params().len() {
            return Err(RenderError::ArgumentCount {
                name: name.to_string(),
                expected: unit.params().len(),
                got: args.len(),
            });
        }

        let mut scope = frame.context().descend(name)?;
        for (param, arg) in unit.params().iter().zip(args) {
            let value = self.eval(arg, frame).await?;
            scope.insert(param.as_str(), value);
        }

        match self.mode {
            Suspension::Blocking => self.renderer.render_nested(&*unit, &scope),
            Suspension::Cooperative => self.renderer.render_nested_async(&*unit, &scope).await,
        }
    }
}
