//! Drives render units and hands their fragments to the concatenator

use std::sync::Arc;

use futures_util::future::LocalBoxFuture;
use futures_util::{pin_mut, Stream, StreamExt};
use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use super::{Context, RenderError};
use crate::concat::{concat_text, native_concat, ConcatOptions};
use crate::config::RenderConfig;
use crate::template::{Template, UnitRegistry};
use crate::value::Value;

/// Ordered output of one render unit
///
/// Fragments are kept in production order, including across suspension
/// points of an async producer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    items: Vec<Value>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.items
    }
}

impl IntoIterator for Fragments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A template, macro body or block that emits fragments
pub trait RenderUnit {
    /// Name used in log lines and errors
    fn name(&self) -> &str;

    /// Emit every fragment on the calling thread
    fn produce(
        &self,
        renderer: &Renderer,
        ctx: &Context,
        out: &mut Fragments,
    ) -> Result<(), RenderError>;

    /// Emit fragments, possibly suspending between them
    ///
    /// The default runs [`RenderUnit::produce`] without suspending.
    fn produce_async<'a>(
        &'a self,
        renderer: &'a Renderer,
        ctx: &'a Context,
        out: &'a mut Fragments,
    ) -> LocalBoxFuture<'a, Result<(), RenderError>> {
        Box::pin(async move { self.produce(renderer, ctx, out) })
    }
}

/// Outcome of an async render that may be cancelled
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    Done(T),
    Cancelled,
}

impl<T> Completion<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Completion::Cancelled)
    }

    /// The finished value, or `None` when cancelled
    pub fn done(self) -> Option<T> {
        match self {
            Completion::Done(value) => Some(value),
            Completion::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Completion<U> {
        match self {
            Completion::Done(value) => Completion::Done(f(value)),
            Completion::Cancelled => Completion::Cancelled,
        }
    }
}

/// Renders units to native values or text
///
/// A top-level render reconstructs the joined output with plain quoting.
/// Nested invocations (macro calls) reconstruct with
/// [`RenderConfig::preserve_nested_quoting`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
    units: Arc<UnitRegistry>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            units: Arc::new(UnitRegistry::new()),
        }
    }

    /// Attach the macros and blocks that units may invoke by name
    pub fn with_units(mut self, units: UnitRegistry) -> Self {
        self.units = Arc::new(units);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Look up a registered unit
    pub fn unit(&self, name: &str) -> Result<Arc<Template>, RenderError> {
        self.units.get(name)
    }

    fn top_level_options(&self) -> ConcatOptions {
        ConcatOptions::new().with_limits(self.config.limits.clone())
    }

    fn nested_options(&self) -> ConcatOptions {
        self.top_level_options()
            .with_preserve_quoting(self.config.preserve_nested_quoting)
    }

    /// Render `unit` to completion on the calling thread
    pub fn render(&self, unit: &dyn RenderUnit, ctx: &Context) -> Result<Value, RenderError> {
        let fragments = self.produce(unit, ctx)?;
        native_concat(fragments, &self.top_level_options())
    }

    /// Render `unit` to its joined text without reconstruction
    pub fn render_text(&self, unit: &dyn RenderUnit, ctx: &Context) -> Result<String, RenderError> {
        concat_text(self.produce(unit, ctx)?)
    }

    /// Render `unit` cooperatively, stopping early if `cancel` fires
    ///
    /// Cancellation discards the partial output and is not an error.
    pub async fn render_async(
        &self,
        unit: &dyn RenderUnit,
        ctx: &Context,
        cancel: &CancellationToken,
    ) -> Result<Completion<Value>, RenderError> {
        match self.produce_cancellable(unit, ctx, cancel).await? {
            Completion::Done(fragments) => {
                native_concat(fragments, &self.top_level_options()).map(Completion::Done)
            }
            Completion::Cancelled => Ok(Completion::Cancelled),
        }
    }

    /// Async counterpart of [`Renderer::render_text`]
    pub async fn render_text_async(
        &self,
        unit: &dyn RenderUnit,
        ctx: &Context,
        cancel: &CancellationToken,
    ) -> Result<Completion<String>, RenderError> {
        match self.produce_cancellable(unit, ctx, cancel).await? {
            Completion::Done(fragments) => concat_text(fragments).map(Completion::Done),
            Completion::Cancelled => Ok(Completion::Cancelled),
        }
    }

    /// Render a unit invoked from inside another one
    pub(crate) fn render_nested(
        &self,
        unit: &dyn RenderUnit,
        ctx: &Context,
    ) -> Result<Value, RenderError> {
        let fragments = self.produce(unit, ctx)?;
        native_concat(fragments, &self.nested_options())
    }

    pub(crate) async fn render_nested_async(
        &self,
        unit: &dyn RenderUnit,
        ctx: &Context,
    ) -> Result<Value, RenderError> {
        let mut fragments = Fragments::new();
        unit.produce_async(self, ctx, &mut fragments).await?;
        trace!("unit '{}' produced {} fragment(s)", unit.name(), fragments.len());
        native_concat(fragments, &self.nested_options())
    }

    fn produce(&self, unit: &dyn RenderUnit, ctx: &Context) -> Result<Fragments, RenderError> {
        let mut fragments = Fragments::new();
        unit.produce(self, ctx, &mut fragments)?;
        trace!("unit '{}' produced {} fragment(s)", unit.name(), fragments.len());
        Ok(fragments)
    }

    async fn produce_cancellable(
        &self,
        unit: &dyn RenderUnit,
        ctx: &Context,
        cancel: &CancellationToken,
    ) -> Result<Completion<Fragments>, RenderError> {
        let mut fragments = Fragments::new();
        let finished = {
            let producer = unit.produce_async(self, ctx, &mut fragments);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = producer => Some(result),
            }
        };

        match finished {
            Some(result) => {
                result?;
                trace!("unit '{}' produced {} fragment(s)", unit.name(), fragments.len());
                Ok(Completion::Done(fragments))
            }
            None => {
                debug!(
                    "render of '{}' cancelled after {} fragment(s)",
                    unit.name(),
                    fragments.len()
                );
                Ok(Completion::Cancelled)
            }
        }
    }
}

/// Reconstruct from an already-produced sequence of fragments
///
/// The first producer error aborts the render and discards earlier fragments.
pub fn render_fragments<I>(fragments: I, options: &ConcatOptions) -> Result<Value, RenderError>
where
    I: IntoIterator<Item = Result<Value, RenderError>>,
{
    let fragments = fragments.into_iter().collect::<Result<Vec<_>, _>>()?;
    native_concat(fragments, options)
}

/// Drain an async fragment stream and reconstruct the result
pub async fn render_stream<S>(
    stream: S,
    options: &ConcatOptions,
    cancel: &CancellationToken,
) -> Result<Completion<Value>, RenderError>
where
    S: Stream<Item = Result<Value, RenderError>>,
{
    let mut fragments = Fragments::new();
    let finished = {
        let drain = async {
            pin_mut!(stream);
            while let Some(fragment) = stream.next().await {
                fragments.push(fragment?);
            }
            Ok::<(), RenderError>(())
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = drain => Some(result),
        }
    };

    match finished {
        Some(result) => {
            result?;
            native_concat(fragments, options).map(Completion::Done)
        }
        None => {
            debug!("fragment stream cancelled after {} fragment(s)", fragments.len());
            Ok(Completion::Cancelled)
        }
    }
}
