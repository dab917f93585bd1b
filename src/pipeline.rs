//! The render-pipeline orchestrator.
//!
//! [`Pipeline`] owns the camera rig, the scene, the post-processing chain,
//! the effect clock and the frame scheduler, and keeps the chain's
//! resolution in step with the viewport. Hosts construct it once through
//! [`Pipeline::new`], forward resize and pointer events, and call
//! [`Pipeline::tick`] from the frame callback their pacer schedules.

use crate::camera::{Camera, CameraRig};
use crate::error::OrbitError;
use crate::input::InputEvent;
use crate::options::Options;
use crate::renderer::postprocess::programs::{effect_pass, gamma_pass, scene_pass};
use crate::renderer::postprocess::{Backend, EffectPass, PassChain, PassId, PassKind};
use crate::scene::{LoadOutcome, Scene};
use crate::scheduler::{FramePacer, FrameScheduler, SchedulerState, StopHandle, TickOutcome};
use crate::util::frame_timing::FrameTiming;
use crate::viewport::{Viewport, ViewportSizer};

/// Chain ids of the built-in passes, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinPasses {
    /// Scene render pass.
    pub scene: PassId,
    /// Gamma-correction pass.
    pub gamma: PassId,
    /// Custom effect pass.
    pub effect: PassId,
}

/// Scene viewer pipeline over a rendering backend.
pub struct Pipeline<B: Backend> {
    backend: B,
    sizer: Box<dyn ViewportSizer>,
    max_pixel_ratio: f64,
    viewport: Viewport,
    surface_size: Option<(u32, u32)>,
    rig: CameraRig,
    scene: Scene,
    chain: PassChain<B>,
    passes: BuiltinPasses,
    effect: EffectPass,
    scheduler: FrameScheduler,
    timing: FrameTiming,
    asset_scale: f32,
}

impl<B: Backend> Pipeline<B> {
    /// Wire a pipeline and start its frame loop.
    ///
    /// Builds the chain {scene, gamma, effect}, seeds the scene lights,
    /// sizes everything from `sizer` once, then starts the scheduler, which
    /// requests the first frame from `pacer`.
    ///
    /// # Errors
    ///
    /// Propagates pass construction failures from the backend.
    pub fn new(
        backend: B,
        sizer: Box<dyn ViewportSizer>,
        pacer: Box<dyn FramePacer>,
        options: &Options,
    ) -> Result<Self, OrbitError> {
        let max_pixel_ratio = options.display.max_pixel_ratio;
        let viewport = Viewport::from_sizer(sizer.as_ref(), max_pixel_ratio);
        let (width, height) = viewport.physical_size();

        let mut chain = PassChain::new(&backend, width, height);
        let passes = BuiltinPasses {
            scene: chain.add_pass(&backend, PassKind::Scene, scene_pass())?,
            gamma: chain.add_pass(&backend, PassKind::Shader, gamma_pass(&options.gamma))?,
            effect: chain.add_pass(&backend, PassKind::Shader, effect_pass(&options.effect))?,
        };

        let mut scene = Scene::new();
        scene.set_clear_color(options.display.clear_color);
        let _ = scene.seed_lights(&options.lighting);
        scene.show_all_lights();

        let mut pipeline = Self {
            backend,
            sizer,
            max_pixel_ratio,
            viewport,
            surface_size: None,
            rig: CameraRig::new(&options.camera, viewport.aspect()),
            scene,
            chain,
            passes,
            effect: EffectPass::new(passes.effect),
            scheduler: FrameScheduler::new(pacer, &options.effect),
            timing: FrameTiming::new(options.display.fps_log_interval),
            asset_scale: options.asset.scale,
        };
        pipeline.resize();
        pipeline.scheduler.start()?;
        log::info!(
            "pipeline ready: {}x{} @{}x, {} passes",
            pipeline.viewport.width(),
            pipeline.viewport.height(),
            pipeline.viewport.pixel_ratio(),
            pipeline.chain.len()
        );
        Ok(pipeline)
    }

    /// Re-read the viewport and propagate it to the camera aspect, the
    /// presentation surface and every chain buffer.
    ///
    /// Repeated calls with an unchanged viewport leave the surface and the
    /// buffers untouched.
    pub fn resize(&mut self) {
        self.viewport = Viewport::from_sizer(self.sizer.as_ref(), self.max_pixel_ratio);
        self.rig.set_aspect(self.viewport.aspect());
        self.rig.set_viewport_height(self.viewport.height());

        let (width, height) = self.viewport.physical_size();
        if self.surface_size != Some((width, height)) {
            log::debug!(
                "resize: {}x{} logical, {width}x{height} physical",
                self.viewport.width(),
                self.viewport.height()
            );
            self.backend.resize_surface(width, height);
            self.surface_size = Some((width, height));
        }
        self.chain.set_size(&self.backend, width, height);
    }

    /// Run one frame: advance effect time, update the camera, render the
    /// chain, present, and request the next frame.
    ///
    /// A frame the backend cannot acquire is skipped but still reschedules.
    /// After the stop handle fires, ticks do nothing.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(delta) = self.scheduler.begin_tick() else {
            return TickOutcome::Halted;
        };
        if let Err(e) = self.effect.advance_time(&mut self.chain, delta) {
            log::warn!("effect time not written: {e}");
        }
        self.rig.update();

        let outcome = match self.backend.begin_frame() {
            Ok(mut frame) => {
                let executed = self.chain.render(
                    &self.backend,
                    &mut frame,
                    &self.scene,
                    self.rig.camera(),
                );
                self.backend.end_frame(frame);
                if let Some(fps) = self.timing.end_frame() {
                    log::debug!("{fps:.1} fps");
                }
                TickOutcome::Rendered(executed)
            }
            Err(e) => {
                log::warn!("frame dropped: {e}");
                TickOutcome::Dropped
            }
        };
        self.scheduler.finish_tick();
        outcome
    }

    /// Add a loaded asset to the scene, scaled by the configured factor.
    /// A failed load is logged and rendering continues without it.
    ///
    /// Returns whether the asset was added.
    pub fn accept_asset(&mut self, outcome: LoadOutcome) -> bool {
        match outcome {
            Ok(node) => {
                log::info!("scene asset added ({} nodes)", node.subtree_len());
                self.scene.add_node(node.scaled(self.asset_scale));
                true
            }
            Err(e) => {
                log::warn!("scene asset failed to load: {e}; rendering without it");
                false
            }
        }
    }

    /// Forward a pointer event to the orbit controls.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.rig.handle_input(event)
    }

    /// A handle that stops the frame loop.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Scheduler lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The camera as of the last tick.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        self.rig.camera()
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The post-processing chain.
    #[must_use]
    pub fn chain(&self) -> &PassChain<B> {
        &self.chain
    }

    /// Mutable chain access (enable toggles, uniform writes).
    pub fn chain_mut(&mut self) -> &mut PassChain<B> {
        &mut self.chain
    }

    /// Ids of the built-in passes.
    #[must_use]
    pub fn passes(&self) -> BuiltinPasses {
        self.passes
    }

    /// Accumulated value of the effect's `time` uniform.
    #[must_use]
    pub fn effect_time(&self) -> f64 {
        self.effect.time()
    }

    /// The rendering backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Mat4;

    use super::*;
    use crate::options::TimeLaw;
    use crate::renderer::postprocess::testing::{Output, RecordingBackend};
    use crate::scene::{AssetError, Node};
    use crate::scheduler::tests::CountingPacer;
    use crate::viewport::ViewportSize;

    #[derive(Clone, Default)]
    struct TestSizer {
        size: Rc<Cell<ViewportSize>>,
        ratio: Rc<Cell<f64>>,
    }

    impl TestSizer {
        fn new(width: u32, height: u32, ratio: f64) -> Self {
            let sizer = Self::default();
            sizer.set(width, height);
            sizer.ratio.set(ratio);
            sizer
        }

        fn set(&self, width: u32, height: u32) {
            self.size.set(ViewportSize::new(width, height));
        }
    }

    impl ViewportSizer for TestSizer {
        fn current_size(&self) -> ViewportSize {
            self.size.get()
        }

        fn pixel_ratio(&self) -> f64 {
            self.ratio.get()
        }
    }

    struct Harness {
        pipeline: Pipeline<RecordingBackend>,
        backend: RecordingBackend,
        sizer: TestSizer,
        requests: Rc<Cell<u32>>,
    }

    fn harness_with(options: &Options, width: u32, height: u32, ratio: f64) -> Harness {
        let backend = RecordingBackend::default();
        let sizer = TestSizer::new(width, height, ratio);
        let pacer = CountingPacer::default();
        let requests = Rc::clone(&pacer.0);
        let pipeline = Pipeline::new(
            backend.clone(),
            Box::new(sizer.clone()),
            Box::new(pacer),
            options,
        )
        .unwrap();
        Harness {
            pipeline,
            backend,
            sizer,
            requests,
        }
    }

    fn harness(width: u32, height: u32) -> Harness {
        harness_with(&Options::default(), width, height, 1.0)
    }

    #[test]
    fn construction_sizes_everything_and_starts() {
        let h = harness(800, 600);
        assert_eq!(h.pipeline.chain().size(), (800, 600));
        assert_eq!(h.backend.surface_size(), (800, 600));
        assert_eq!(h.pipeline.camera().aspect, 800.0 / 600.0);
        assert_eq!(h.pipeline.state(), SchedulerState::Running);
        assert_eq!(h.requests.get(), 1);
        assert_eq!(h.pipeline.scene().light_count(), 2);
        assert_eq!(h.pipeline.scene().visible_lights().count(), 2);
        assert_eq!(
            h.pipeline.scene().clear_color(),
            Options::default().display.clear_color
        );
    }

    #[test]
    fn resize_is_idempotent() {
        let mut h = harness(800, 600);
        h.sizer.set(1024, 768);
        h.pipeline.resize();
        let allocated = h.backend.targets_created();
        let ids: Vec<u32> = h.pipeline.chain().targets().iter().map(|t| t.id).collect();
        let projection = h.pipeline.camera().projection();

        h.pipeline.resize();
        assert_eq!(h.backend.targets_created(), allocated);
        let again: Vec<u32> = h.pipeline.chain().targets().iter().map(|t| t.id).collect();
        assert_eq!(ids, again);
        assert_eq!(h.pipeline.camera().projection(), projection);
        assert_eq!(h.backend.surface_size(), (1024, 768));
    }

    #[test]
    fn aspect_follows_viewport() {
        let mut h = harness(800, 600);
        for (w, height) in [(1920, 1080), (300, 900), (1, 1), (1234, 567)] {
            h.sizer.set(w, height);
            h.pipeline.resize();
            assert_eq!(h.pipeline.camera().aspect, w as f32 / height as f32);
        }
    }

    #[test]
    fn degenerate_size_is_clamped() {
        let mut h = harness(800, 600);
        h.sizer.set(0, 0);
        h.pipeline.resize();
        assert!(h.pipeline.camera().aspect.is_finite());
        assert_eq!(h.pipeline.camera().aspect, 1.0);
        assert_eq!(h.pipeline.chain().size(), (1, 1));
        assert!(h.pipeline.camera().projection().is_finite());

        h.sizer.set(640, 0);
        h.pipeline.resize();
        assert_eq!(h.pipeline.camera().aspect, 640.0);
        assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(3));
    }

    #[test]
    fn buffers_use_capped_pixel_ratio() {
        let h = harness_with(&Options::default(), 800, 600, 3.0);
        assert_eq!(h.pipeline.viewport().pixel_ratio(), 2.0);
        assert_eq!(h.pipeline.chain().size(), (1600, 1200));
        assert_eq!(h.backend.surface_size(), (1600, 1200));
        for target in h.pipeline.chain().targets() {
            assert_eq!((target.width, target.height), (1600, 1200));
        }
        assert_eq!(h.pipeline.camera().aspect, 800.0 / 600.0);
    }

    #[test]
    fn renders_scene_gamma_effect_in_order() {
        let mut h = harness(800, 600);
        assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(3));
        let frames = h.backend.presented();
        let calls = &frames[0];
        let names: Vec<&str> = calls.iter().map(|c| c.pass.as_str()).collect();
        assert_eq!(names, ["Scene Pass", "Gamma Correction Pass", "Custom Effect Pass"]);
        assert_eq!(calls[0].input, None);
        let Output::Target(scene_out) = calls[0].output else {
            panic!("scene pass must render offscreen");
        };
        assert_eq!(calls[1].input, Some(scene_out));
        let Output::Target(gamma_out) = calls[1].output else {
            panic!("gamma pass must render offscreen");
        };
        assert_ne!(gamma_out, scene_out);
        assert_eq!(calls[2].input, Some(gamma_out));
        assert_eq!(calls[2].output, Output::Screen);
    }

    #[test]
    fn ten_ticks_at_800x600() {
        let mut h = harness(800, 600);
        for _ in 0..10 {
            assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(3));
        }
        let d = 0.05_f64;
        let expected = d * 10.0 * 11.0 / 2.0;
        assert!((h.pipeline.effect_time() - expected).abs() < 1e-9);

        let frames = h.backend.presented();
        assert_eq!(frames.len(), 10);
        let last = frames[9].last().unwrap();
        assert_eq!(last.pass, "Custom Effect Pass");
        assert!((f64::from(last.time.unwrap()) - 2.75).abs() < 1e-5);
        for target in h.pipeline.chain().targets() {
            assert_eq!((target.width, target.height), (800, 600));
        }
        assert_eq!(h.pipeline.camera().aspect, 800.0 / 600.0);
        assert_eq!(h.requests.get(), 11);
    }

    #[test]
    fn effect_time_is_monotonic_and_written_before_render() {
        let mut h = harness(320, 240);
        for _ in 0..5 {
            let _ = h.pipeline.tick();
        }
        let times: Vec<f32> = h
            .backend
            .presented()
            .iter()
            .map(|frame| frame[2].time.unwrap())
            .collect();
        assert!((times[0] - 0.05).abs() < 1e-6);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linear_law_grows_by_step() {
        let mut options = Options::default();
        options.effect.time_law = TimeLaw::Linear;
        let mut h = harness_with(&options, 800, 600, 1.0);
        for _ in 0..10 {
            let _ = h.pipeline.tick();
        }
        assert!((h.pipeline.effect_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn camera_updates_before_render() {
        let mut h = harness(800, 600);
        let start = h.pipeline.camera().eye;
        assert!(h.pipeline.handle_input(&InputEvent::Scroll { delta: 3.0 }));
        let _ = h.pipeline.tick();
        let eye = h.pipeline.camera().eye;
        assert_ne!(eye, start);
        let frames = h.backend.presented();
        assert!(frames[0].iter().all(|call| call.eye == eye));
    }

    #[test]
    fn dropped_frame_still_reschedules() {
        let mut h = harness(800, 600);
        h.backend.fail_next_frame();
        assert_eq!(h.pipeline.tick(), TickOutcome::Dropped);
        assert_eq!(h.requests.get(), 2);
        assert!(h.backend.presented().is_empty());
        assert!((h.pipeline.effect_time() - 0.05).abs() < 1e-9);

        assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(3));
        assert_eq!(h.requests.get(), 3);
    }

    #[test]
    fn stop_handle_ends_the_loop() {
        let mut h = harness(800, 600);
        let _ = h.pipeline.tick();
        h.pipeline.stop_handle().stop();
        assert_eq!(h.pipeline.tick(), TickOutcome::Halted);
        assert_eq!(h.pipeline.state(), SchedulerState::Stopped);
        assert_eq!(h.requests.get(), 2);
        assert_eq!(h.backend.frames_begun(), 1);
        let time = h.pipeline.effect_time();
        assert_eq!(h.pipeline.tick(), TickOutcome::Halted);
        assert_eq!(h.pipeline.effect_time(), time);
    }

    #[test]
    fn disabled_gamma_pass_is_skipped() {
        let mut options = Options::default();
        options.gamma.enabled = false;
        let mut h = harness_with(&options, 800, 600, 1.0);
        assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(2));
        let frames = h.backend.presented();
        assert_eq!(frames[0][1].pass, "Custom Effect Pass");
        assert_eq!(frames[0][1].output, Output::Screen);
    }

    #[test]
    fn failed_asset_is_logged_and_rendering_continues() {
        let mut h = harness(800, 600);
        let nodes = h.pipeline.scene().nodes().len();
        let accepted = h
            .pipeline
            .accept_asset(Err(AssetError::Fetch("404 Not Found".to_owned())));
        assert!(!accepted);
        assert_eq!(h.pipeline.scene().nodes().len(), nodes);
        assert_eq!(h.pipeline.tick(), TickOutcome::Rendered(3));
    }

    #[test]
    fn loaded_asset_is_scaled_into_the_scene() {
        let mut h = harness(800, 600);
        let revision = h.pipeline.scene().revision();
        assert!(h.pipeline.accept_asset(Ok(Node::group(Vec::new()))));
        assert!(h.pipeline.scene().revision() > revision);
        let added = h.pipeline.scene().nodes().last().unwrap();
        assert_eq!(added.transform, Mat4::from_scale(glam::Vec3::splat(2.0)));
    }
}
