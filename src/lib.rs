//! Native Render - native-typed results from template rendering
//!
//! A render unit emits a stream of fragments. Instead of always joining them
//! into text, this library hands back the native value the output spells
//! out: a lone integer stays an integer, `[1, 2]` becomes a sequence, and
//! anything that is not a literal stays the joined text.
//!
//! # Example
//!
//! ```rust
//! use native_render::{native_concat, ConcatOptions, Value};
//!
//! let fragments = vec![Value::from("0.000"), Value::Integer(7)];
//! let value = native_concat(fragments, &ConcatOptions::default()).unwrap();
//! assert_eq!(value, Value::Float(0.0007));
//! ```

pub mod concat;
pub mod config;
pub mod error;
pub mod parser;
pub mod render;
pub mod script;
pub mod template;
pub mod value;

pub use concat::{concat_text, native_concat, ConcatOptions};
pub use config::{ConfigError, LiteralLimits, RenderConfig};
pub use error::LiteralError;
pub use parser::parse_literal;
pub use render::{
    render_fragments, render_stream, Completion, Context, Fragments, RenderError, RenderUnit,
    Renderer,
};
pub use script::{parse_script, ScriptError};
pub use template::{Expr, LoopField, Node, Template, UnitRegistry};
pub use value::{Kind, Undefined, Value};

use tokio_util::sync::CancellationToken;

/// Render a unit to its native value with default configuration
///
/// # Example
///
/// ```rust
/// use native_render::{render, Context, Expr, Node, Template, Value};
///
/// let tmpl = Template::new("t").with_body(vec![
///     Node::text("["),
///     Node::output(Expr::var("x")),
///     Node::text(", 2]"),
/// ]);
///
/// let value = render(&tmpl, &Context::new().with("x", 1i64)).unwrap();
/// assert_eq!(value, Value::Sequence(vec![Value::Integer(1), Value::Integer(2)]));
/// ```
pub fn render(unit: &dyn RenderUnit, ctx: &Context) -> Result<Value, RenderError> {
    Renderer::default().render(unit, ctx)
}

/// Render a unit to its native value with custom configuration
pub fn render_with_config(
    unit: &dyn RenderUnit,
    ctx: &Context,
    config: RenderConfig,
) -> Result<Value, RenderError> {
    Renderer::new(config).render(unit, ctx)
}

/// Render a unit cooperatively with default configuration
pub async fn render_async(
    unit: &dyn RenderUnit,
    ctx: &Context,
    cancel: &CancellationToken,
) -> Result<Completion<Value>, RenderError> {
    Renderer::default().render_async(unit, ctx, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_single_output() {
        let tmpl = Template::new("t").with_body(vec![Node::output(Expr::constant(42i64))]);
        assert_eq!(render(&tmpl, &Context::new()).unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_render_with_config_limits() {
        let tmpl = Template::new("t").with_body(vec![Node::text("[[1]]")]);
        let config = RenderConfig::new().with_limits(LiteralLimits::new().with_max_depth(1));
        assert_eq!(
            render_with_config(&tmpl, &Context::new(), config).unwrap(),
            Value::from("[[1]]")
        );
    }

    #[test]
    fn test_render_empty_template() {
        assert_eq!(render(&Template::new("t"), &Context::new()).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_render_async_matches_blocking() {
        let tmpl = Template::new("t").with_body(vec![
            Node::output(Expr::constant(1i64).awaited()),
            Node::output(Expr::constant(2i64)),
        ]);
        let ctx = Context::new();
        let blocking = render(&tmpl, &ctx).unwrap();
        let cooperative = render_async(&tmpl, &ctx, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(cooperative, Completion::Done(blocking));
    }
}
