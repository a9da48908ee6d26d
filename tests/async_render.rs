//! Integration tests for cooperative (async) rendering and cancellation

use native_render::{
    render_stream, Completion, ConcatOptions, Context, Expr, Fragments, Node, RenderError,
    RenderUnit, Renderer, Template, UnitRegistry, Value,
};
use futures_util::future::LocalBoxFuture;
use futures_util::stream;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

async fn render_async(renderer: &Renderer, tmpl: &Template, ctx: &Context) -> Value {
    renderer
        .render_async(tmpl, ctx, &CancellationToken::new())
        .await
        .expect("Should render")
        .done()
        .expect("Should not be cancelled")
}

#[tokio::test]
async fn test_order_preserved_across_suspension() {
    let tmpl = Template::new("test").with_body(vec![
        Node::output(Expr::constant(1i64).awaited()),
        Node::text(", "),
        Node::output(Expr::var("x").awaited()),
        Node::text(", "),
        Node::output(Expr::constant(3i64)),
    ]);
    let ctx = Context::new().with("x", 2i64);
    let value = render_async(&Renderer::default(), &tmpl, &ctx).await;
    assert_eq!(
        value,
        Value::Tuple(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
}

#[tokio::test]
async fn test_async_matches_blocking() {
    let units = UnitRegistry::new()
        .with(
            Template::new("x")
                .with_params(["y"])
                .with_body(vec![Node::output(Expr::var("y").awaited())]),
        )
        .unwrap();
    let renderer = Renderer::default().with_units(units);
    let tmpl = Template::new("test").with_body(vec![
        Node::output(Expr::call("x", vec![Expr::constant("not")])),
        Node::text(" "),
        Node::output(Expr::call("x", vec![Expr::constant("bad")]).awaited()),
    ]);
    let ctx = Context::new();

    let blocking = renderer.render(&tmpl, &ctx).unwrap();
    let cooperative = render_async(&renderer, &tmpl, &ctx).await;
    assert_eq!(blocking, Value::from("not bad"));
    assert_eq!(cooperative, blocking);
}

#[tokio::test]
async fn test_async_loop_of_awaits() {
    let tmpl = Template::new("test").with_body(vec![Node::for_each(
        "x",
        Expr::var("value"),
        vec![Node::output(Expr::var("x").awaited())],
    )]);
    let ctx = Context::new().with("value", vec![1i64, 2, 3, 4]);
    let value = render_async(&Renderer::default(), &tmpl, &ctx).await;
    assert_eq!(value, Value::Integer(1234));
}

#[tokio::test]
async fn test_cancel_mid_render() {
    let items: Vec<i64> = (0..100).collect();
    let tmpl = Template::new("slow").with_body(vec![Node::for_each(
        "x",
        Expr::var("items"),
        vec![Node::output(Expr::var("x").awaited())],
    )]);
    let ctx = Context::new().with("items", items);
    let renderer = Renderer::default();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();

    let (result, _) = tokio::join!(renderer.render_async(&tmpl, &ctx, &cancel), async move {
        tokio::task::yield_now().await;
        canceller.cancel();
    });

    assert_eq!(result.unwrap(), Completion::Cancelled);
}

#[tokio::test]
async fn test_cancel_before_first_fragment() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let tmpl = Template::new("test").with_body(vec![Node::output(Expr::constant(1i64))]);
    let result = Renderer::default()
        .render_text_async(&tmpl, &Context::new(), &cancel)
        .await
        .unwrap();
    assert!(result.is_cancelled());
}

#[tokio::test]
async fn test_async_error_propagates() {
    let tmpl = Template::new("test").with_body(vec![
        Node::output(Expr::constant(1i64).awaited()),
        Node::output(Expr::var("missing").awaited().add(Expr::constant(1i64))),
    ]);
    let err = Renderer::default()
        .render_async(&tmpl, &Context::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.undefined_name(), Some("missing"));
}

#[tokio::test]
async fn test_render_text_async() {
    let tmpl = Template::new("test").with_body(vec![
        Node::output(Expr::constant(1i64).awaited()),
        Node::output(Expr::constant(2i64)),
    ]);
    let text = Renderer::default()
        .render_text_async(&tmpl, &Context::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, Completion::Done("12".to_string()));
}

/// Suspends between every fragment it writes
struct Ticker(Vec<Value>);

impl RenderUnit for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn produce(
        &self,
        _renderer: &Renderer,
        _ctx: &Context,
        out: &mut Fragments,
    ) -> Result<(), RenderError> {
        for value in &self.0 {
            out.push(value.clone());
        }
        Ok(())
    }

    fn produce_async<'a>(
        &'a self,
        _renderer: &'a Renderer,
        _ctx: &'a Context,
        out: &'a mut Fragments,
    ) -> LocalBoxFuture<'a, Result<(), RenderError>> {
        Box::pin(async move {
            for value in &self.0 {
                tokio::task::yield_now().await;
                out.push(value.clone());
            }
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_custom_unit_modes_agree() {
    let unit = Ticker(vec![Value::from("0.000"), Value::Integer(7)]);
    let renderer = Renderer::default();
    let blocking = renderer.render(&unit, &Context::new()).unwrap();
    let cooperative = renderer
        .render_async(&unit, &Context::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(blocking, Value::Float(0.0007));
    assert_eq!(cooperative, Completion::Done(blocking));
}

#[tokio::test]
async fn test_render_stream_error_discards_output() {
    let fragments = stream::iter(vec![
        Ok(Value::Integer(1)),
        Err(RenderError::unknown_unit("x")),
        Ok(Value::Integer(2)),
    ]);
    let result =
        render_stream(fragments, &ConcatOptions::default(), &CancellationToken::new()).await;
    assert!(matches!(result, Err(RenderError::UnknownUnit { .. })));
}
