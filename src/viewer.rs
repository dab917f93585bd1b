//! Standalone window backed by winit.
//!
//! The window is the viewport container: its logical inner size drives the
//! camera aspect and its scale factor (capped by the options) sets the
//! drawable resolution. Frames are paced with `request_redraw`, so ticks
//! run at the display refresh rate.
//!
//! ```no_run
//! # use orbitfx::Viewer;
//! Viewer::builder()
//!     .with_asset("assets/room.glb")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::OrbitError;
use crate::gpu::backend::WgpuBackend;
use crate::gpu::render_context::RenderContext;
use crate::input::{InputEvent, MouseButton};
use crate::options::Options;
use crate::pipeline::Pipeline;
use crate::scene::loader::spawn_load;
use crate::scene::{AssetError, LoadOutcome};
use crate::scheduler::{FramePacer, StopHandle, TickOutcome};
use crate::viewport::{Viewport, ViewportSize, ViewportSizer};

/// Pixels of trackpad scroll per wheel notch.
const PIXELS_PER_NOTCH: f64 = 100.0;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    asset: Option<PathBuf>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with sensible defaults (title "orbitfx", the asset
    /// named by the options, default options).
    fn new() -> Self {
        Self {
            asset: None,
            options: None,
            title: "orbitfx".into(),
        }
    }

    /// Load this `.glb`/`.gltf` file instead of the options' asset.
    #[must_use]
    pub fn with_asset(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset = Some(path.into());
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        let options = self.options.unwrap_or_default();
        let asset = self.asset.or_else(|| {
            (!options.asset.source.is_empty()).then(|| PathBuf::from(&options.asset.source))
        });
        Viewer {
            asset,
            options,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window that displays a scene through the pass chain.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    asset: Option<PathBuf>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Viewer`] if the event loop cannot be created or exits
    /// abnormally.
    pub fn run(self) -> Result<(), OrbitError> {
        let event_loop = EventLoop::new().map_err(|e| OrbitError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ViewerApp {
            window: None,
            pipeline: None,
            stop: None,
            asset_rx: None,
            asset: self.asset,
            options: self.options,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| OrbitError::Viewer(e.to_string()))
    }
}

// ── Host hooks ───────────────────────────────────────────────────────────

/// Reads the window's logical inner size and scale factor.
struct WindowSizer(Arc<Window>);

impl ViewportSizer for WindowSizer {
    fn current_size(&self) -> ViewportSize {
        let logical = self
            .0
            .inner_size()
            .to_logical::<u32>(self.0.scale_factor());
        ViewportSize::new(logical.width, logical.height)
    }

    fn pixel_ratio(&self) -> f64 {
        self.0.scale_factor()
    }
}

/// Schedules ticks through winit redraw requests.
struct RedrawPacer(Arc<Window>);

impl FramePacer for RedrawPacer {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    pipeline: Option<Pipeline<WgpuBackend>>,
    stop: Option<StopHandle>,
    /// Pending background asset load.
    asset_rx: Option<Receiver<LoadOutcome>>,
    asset: Option<PathBuf>,
    options: Options,
    title: String,
}

impl ViewerApp {
    fn create_pipeline(&self, window: &Arc<Window>) -> Result<Pipeline<WgpuBackend>, OrbitError> {
        let sizer = WindowSizer(Arc::clone(window));
        let initial = Viewport::from_sizer(&sizer, self.options.display.max_pixel_ratio);
        let context = pollster::block_on(RenderContext::new(
            Arc::clone(window),
            initial.physical_size(),
        ))?;
        let backend = WgpuBackend::new(context, &self.options.display)?;
        Pipeline::new(
            backend,
            Box::new(sizer),
            Box::new(RedrawPacer(Arc::clone(window))),
            &self.options,
        )
    }

    /// Hand a finished background load to the pipeline.
    fn poll_asset(&mut self) {
        let (Some(rx), Some(pipeline)) = (&self.asset_rx, &mut self.pipeline) else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(AssetError::Disconnected),
        };
        let _ = pipeline.accept_asset(outcome);
        self.asset_rx = None;
    }

    fn forward_input(&mut self, event: &InputEvent) {
        if let Some(pipeline) = &mut self.pipeline {
            let _ = pipeline.handle_input(event);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (f64::from(mon_size.width) / scale * 0.75) as u32;
            let logical_h = (f64::from(mon_size.height) / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(logical_w, logical_h))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let pipeline = match self.create_pipeline(&window) {
            Ok(p) => p,
            Err(e) => {
                log::error!("Failed to initialize pipeline: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Some(path) = self.asset.take() {
            match spawn_load(path) {
                Ok(rx) => self.asset_rx = Some(rx),
                Err(e) => log::warn!("asset loader not started: {e}; rendering without it"),
            }
        }

        self.stop = Some(pipeline.stop_handle());
        self.window = Some(window);
        self.pipeline = Some(pipeline);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            if let Some(stop) = &self.stop {
                stop.stop();
            }
            event_loop.exit();
            return;
        }

        let Some(window) = self.window.clone() else {
            return;
        };
        let scale = window.scale_factor();

        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(pipeline) = &mut self.pipeline {
                    pipeline.resize();
                }
            }

            WindowEvent::RedrawRequested => {
                self.poll_asset();
                if let Some(pipeline) = &mut self.pipeline {
                    if pipeline.tick() == TickOutcome::Halted {
                        event_loop.exit();
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                self.forward_input(&InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale);
                self.forward_input(&InputEvent::CursorMoved {
                    x: logical.x,
                    y: logical.y,
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_NOTCH) as f32,
                };
                self.forward_input(&InputEvent::Scroll { delta: notches });
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.forward_input(&InputEvent::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                });
            }

            _ => (),
        }
    }
}
