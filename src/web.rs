//! Browser host: renders into a canvas appended to a container element.
//!
//! The container's CSS box is the viewport; window `resize` events re-read
//! it. Frames are paced with `requestAnimationFrame` and the scene asset is
//! fetched in a `spawn_local` future that hands its outcome to the pipeline
//! when it lands.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::error::OrbitError;
use crate::gpu::backend::WgpuBackend;
use crate::gpu::render_context::RenderContext;
use crate::input::{InputEvent, PointerPhase};
use crate::options::Options;
use crate::pipeline::Pipeline;
use crate::scene::loader::load_slice;
use crate::scene::{AssetError, LoadOutcome};
use crate::scheduler::{FramePacer, StopHandle, TickOutcome};
use crate::viewport::{Viewport, ViewportSize, ViewportSizer};

/// `WheelEvent.deltaMode` value for pixel deltas.
const DOM_DELTA_PIXEL: u32 = 0;
/// Pixels of wheel scroll per notch.
const PIXELS_PER_NOTCH: f64 = 100.0;

type SharedPipeline = Rc<RefCell<Option<Pipeline<WgpuBackend>>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

impl From<OrbitError> for JsValue {
    fn from(e: OrbitError) -> Self {
        Self::from_str(&e.to_string())
    }
}

fn window() -> Result<web_sys::Window, OrbitError> {
    web_sys::window().ok_or_else(|| OrbitError::Web("no global window".to_owned()))
}

// ── Event listeners ──────────────────────────────────────────────────────

/// A registered DOM event listener; unregisters itself on drop.
pub struct Listener {
    target: web_sys::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn register(
        target: &web_sys::EventTarget,
        kind: &'static str,
        callback: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(callback);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

// ── Host hooks ───────────────────────────────────────────────────────────

/// Reads the container element's CSS box and the device pixel ratio.
#[derive(Clone)]
pub struct ContainerSizer {
    element: web_sys::HtmlElement,
}

impl ContainerSizer {
    /// Sizer for `element`.
    #[must_use]
    pub fn new(element: web_sys::HtmlElement) -> Self {
        Self { element }
    }

    /// Call `callback` (with no payload) on every window `resize` event.
    /// The listener stays registered until the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// The `JsValue` thrown by `addEventListener`, or a message if there is
    /// no global window.
    pub fn on_resize(&self, mut callback: impl FnMut() + 'static) -> Result<Listener, JsValue> {
        Listener::register(&window()?, "resize", move |_| callback())
    }
}

impl ViewportSizer for ContainerSizer {
    fn current_size(&self) -> ViewportSize {
        ViewportSize::new(
            self.element.client_width().max(0) as u32,
            self.element.client_height().max(0) as u32,
        )
    }

    fn pixel_ratio(&self) -> f64 {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
    }
}

/// Schedules ticks through `requestAnimationFrame`.
struct AnimationFramePacer {
    callback: FrameCallback,
}

impl FramePacer for AnimationFramePacer {
    fn request_frame(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(callback) = self.callback.borrow().as_ref() {
            if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {e:?}");
            }
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

/// A running viewer. Dropping it (or calling [`stop`](Self::stop)) ends
/// the frame loop and unregisters every listener.
#[wasm_bindgen]
pub struct WebViewer {
    stop: StopHandle,
    _listeners: Vec<Listener>,
    _frame: FrameCallback,
}

#[wasm_bindgen]
impl WebViewer {
    /// Stop the frame loop. The pipeline is released at the next frame.
    pub fn stop(&self) {
        self.stop.stop();
    }
}

impl Drop for WebViewer {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// Start a viewer inside the element with id `container_id`.
///
/// `options_toml` is an optional TOML preset; `asset_url` overrides the
/// preset's asset source.
///
/// # Errors
///
/// A string `JsValue` if the container is missing, the options do not
/// parse, or GPU initialization fails.
#[wasm_bindgen]
pub async fn start(
    container_id: String,
    options_toml: Option<String>,
    asset_url: Option<String>,
) -> Result<WebViewer, JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let options = match options_toml {
        Some(toml) => Options::from_toml(&toml)?,
        None => Options::default(),
    };

    let document = window()?
        .document()
        .ok_or_else(|| OrbitError::Web("no document".to_owned()))?;
    let container: web_sys::HtmlElement = document
        .get_element_by_id(&container_id)
        .ok_or_else(|| OrbitError::Web(format!("no element with id '{container_id}'")))?
        .dyn_into()
        .map_err(|_| OrbitError::Web(format!("'{container_id}' is not an HTML element")))?;
    let canvas: web_sys::HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_attribute("style", "display:block;width:100%;height:100%;touch-action:none")?;
    let _ = container.append_child(&canvas)?;

    let sizer = ContainerSizer::new(container);
    let initial = Viewport::from_sizer(&sizer, options.display.max_pixel_ratio);
    size_canvas(&canvas, initial);
    let context = RenderContext::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        initial.physical_size(),
    )
    .await
    .map_err(OrbitError::from)?;
    let backend = WgpuBackend::new(context, &options.display)?;

    // The frame callback exists before the pipeline so the first frame
    // requested by `Pipeline::new` can be scheduled.
    let shared: SharedPipeline = Rc::new(RefCell::new(None));
    let frame: FrameCallback = Rc::new(RefCell::new(None));
    *frame.borrow_mut() = Some(frame_callback(Rc::clone(&shared)));

    let resize_sizer = sizer.clone();
    let pipeline = Pipeline::new(
        backend,
        Box::new(sizer),
        Box::new(AnimationFramePacer {
            callback: Rc::clone(&frame),
        }),
        &options,
    )?;
    let stop = pipeline.stop_handle();
    *shared.borrow_mut() = Some(pipeline);

    let mut listeners = vec![{
        let shared = Rc::clone(&shared);
        let canvas = canvas.clone();
        resize_sizer.on_resize(move || {
            if let Ok(mut slot) = shared.try_borrow_mut() {
                if let Some(pipeline) = slot.as_mut() {
                    pipeline.resize();
                    size_canvas(&canvas, pipeline.viewport());
                }
            }
        })?
    }];
    listeners.extend(input_listeners(&canvas, &shared)?);

    let source = asset_url.unwrap_or_else(|| options.asset.source.clone());
    if source.is_empty() {
        log::info!("no scene asset configured");
    } else {
        let shared = Rc::clone(&shared);
        spawn_local(async move {
            let outcome = fetch_asset(&source).await;
            if let Some(pipeline) = shared.borrow_mut().as_mut() {
                let _ = pipeline.accept_asset(outcome);
            }
        });
    }

    Ok(WebViewer {
        stop,
        _listeners: listeners,
        _frame: frame,
    })
}

/// The tick closure. Once the loop halts, the pipeline is dropped, which
/// also releases the pacer's reference to this closure.
fn frame_callback(shared: SharedPipeline) -> Closure<dyn FnMut()> {
    Closure::<dyn FnMut()>::new(move || {
        let Ok(mut slot) = shared.try_borrow_mut() else {
            return;
        };
        let halted = slot
            .as_mut()
            .is_some_and(|pipeline| pipeline.tick() == TickOutcome::Halted);
        if halted {
            log::info!("frame loop stopped");
            *slot = None;
        }
    })
}

/// Match the canvas backing store to the drawable size.
fn size_canvas(canvas: &web_sys::HtmlCanvasElement, viewport: Viewport) {
    let (width, height) = viewport.physical_size();
    canvas.set_width(width);
    canvas.set_height(height);
}

fn input_listeners(
    canvas: &web_sys::HtmlCanvasElement,
    shared: &SharedPipeline,
) -> Result<Vec<Listener>, JsValue> {
    let forward = |shared: &SharedPipeline, events: &[InputEvent]| {
        if let Ok(mut slot) = shared.try_borrow_mut() {
            if let Some(pipeline) = slot.as_mut() {
                for event in events {
                    let _ = pipeline.handle_input(event);
                }
            }
        }
    };
    let pointer = |kind: &'static str, phase: PointerPhase| {
        let shared = Rc::clone(shared);
        let capture_target = canvas.clone();
        Listener::register(canvas, kind, move |event| {
            let Some(event) = event.dyn_ref::<web_sys::PointerEvent>() else {
                return;
            };
            if phase.captures() {
                if let Err(e) = capture_target.set_pointer_capture(event.pointer_id()) {
                    log::warn!("setPointerCapture failed: {e:?}");
                }
            }
            let events = phase.events(
                event.shift_key(),
                event.offset_x() as f32,
                event.offset_y() as f32,
                event.button(),
            );
            forward(&shared, &events);
        })
    };

    let wheel = {
        let shared = Rc::clone(shared);
        Listener::register(canvas, "wheel", move |event| {
            let Some(event) = event.dyn_ref::<web_sys::WheelEvent>() else {
                return;
            };
            event.prevent_default();
            let notches = if event.delta_mode() == DOM_DELTA_PIXEL {
                event.delta_y() / PIXELS_PER_NOTCH
            } else {
                event.delta_y()
            };
            // DOM deltaY grows when scrolling toward the user
            forward(&shared, &[InputEvent::Scroll {
                delta: -notches as f32,
            }]);
        })?
    };
    let context_menu = Listener::register(canvas, "contextmenu", |event| event.prevent_default())?;

    Ok(vec![
        pointer("pointerdown", PointerPhase::Down)?,
        pointer("pointerup", PointerPhase::Up)?,
        pointer("pointermove", PointerPhase::Move)?,
        wheel,
        context_menu,
    ])
}

async fn fetch_asset(url: &str) -> LoadOutcome {
    log::info!("fetching {url}");
    let bytes = fetch_bytes(url)
        .await
        .map_err(|e| AssetError::Fetch(format!("{url}: {e:?}")))?;
    load_slice(&bytes)
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let response: web_sys::Response = JsFuture::from(window()?.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
