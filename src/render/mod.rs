//! Render orchestration
//!
//! A [`RenderUnit`] pushes fragments into a [`Fragments`] buffer; the
//! [`Renderer`] collects them and reduces them to one value. Units can run in
//! blocking mode or cooperatively under a [`tokio_util::sync::CancellationToken`].

mod context;
mod error;
mod orchestrator;

pub use context::{Context, MAX_NESTING};
pub use error::RenderError;
pub use orchestrator::{
    render_fragments, render_stream, Completion, Fragments, RenderUnit, Renderer,
};
