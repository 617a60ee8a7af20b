//! Render-thread lifecycle controller for a host-owned drawing surface.
//!
//! A [`SurfaceView`] turns host lifecycle callbacks (attach/detach, surface
//! available/resized/destroyed, pause/resume) into operations for one dedicated render
//! thread, which alone creates, draws into and destroys the graphics context.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod host_events;
pub mod queue;
pub mod renderer;
pub mod sync;
pub mod view;
mod worker;

pub use crate::backend::GraphicsBackend;
pub use crate::config::SurfaceViewConfig;
pub use crate::context::{ContextState, ContextStateMachine};
pub use crate::error::{BackendError, LifecycleError, LifecycleResult};
pub use crate::host::{HostExecutor, HostLooper, HostTask, InlineExecutor};
pub use crate::host_events::SurfaceHostEvent;
pub use crate::queue::{MessageQueue, Op, OpKind, RenderTask};
pub use crate::renderer::{Renderer, RendererSlot, SharedRenderer};
pub use crate::sync::ShutdownToken;
pub use crate::view::{EnvCallback, EnvListener, SurfaceView};
