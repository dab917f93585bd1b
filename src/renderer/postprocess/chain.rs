//! Ordered post-processing chain with ping-pong intermediate buffers.

use super::pass::{
    Backend, Pass, PassContext, PassDescriptor, PassIo, PassKind, PassOutput,
    RenderTarget,
};
use crate::camera::core::Camera;
use crate::error::OrbitError;
use crate::scene::Scene;

/// Stable index of a pass inside its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(usize);

impl PassId {
    /// Position in insertion order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

struct ChainEntry<B: Backend> {
    descriptor: PassDescriptor,
    pass: Box<dyn Pass<B>>,
}

/// Ordered list of passes rendered against two ping-ponged offscreen
/// buffers.
///
/// Each enabled pass after the first reads the buffer the previous enabled
/// pass wrote; the last enabled pass writes to the screen. Order is fixed at
/// insertion time.
pub struct PassChain<B: Backend> {
    entries: Vec<ChainEntry<B>>,
    targets: [B::Target; 2],
    width: u32,
    height: u32,
}

impl<B: Backend> PassChain<B> {
    /// Empty chain with buffers allocated at `width x height` (clamped to at
    /// least 1).
    pub fn new(backend: &B, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            entries: Vec::new(),
            targets: Self::create_targets(backend, width, height),
            width,
            height,
        }
    }

    fn create_targets(backend: &B, width: u32, height: u32) -> [B::Target; 2] {
        [
            backend.create_target("Chain Buffer A", width, height),
            backend.create_target("Chain Buffer B", width, height),
        ]
    }

    /// Append a pass built by the backend.
    ///
    /// # Errors
    ///
    /// Propagates backend pass-construction failures.
    pub fn add_pass(
        &mut self,
        backend: &B,
        kind: PassKind,
        descriptor: PassDescriptor,
    ) -> Result<PassId, OrbitError> {
        let mut pass = backend.create_pass(kind, &descriptor)?;
        pass.set_size(backend, self.width, self.height);
        let id = PassId(self.entries.len());
        log::debug!("chain: added pass {} '{}'", id.0, descriptor.label);
        self.entries.push(ChainEntry { descriptor, pass });
        Ok(id)
    }

    /// Number of passes, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain has no passes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current buffer resolution.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The two intermediate buffers.
    #[must_use]
    pub fn targets(&self) -> &[B::Target; 2] {
        &self.targets
    }

    /// Descriptor of a pass.
    #[must_use]
    pub fn descriptor(&self, id: PassId) -> Option<&PassDescriptor> {
        self.entries.get(id.0).map(|e| &e.descriptor)
    }

    /// Mutable descriptor of a pass (uniform writes, enable toggles).
    pub fn descriptor_mut(&mut self, id: PassId) -> Option<&mut PassDescriptor> {
        self.entries.get_mut(id.0).map(|e| &mut e.descriptor)
    }

    /// Enable or disable a pass. Returns `false` for an unknown id.
    pub fn set_enabled(&mut self, id: PassId, enabled: bool) -> bool {
        self.descriptor_mut(id).is_some_and(|d| {
            d.enabled = enabled;
            true
        })
    }

    /// Resize every intermediate buffer and notify every pass.
    ///
    /// A call with the current size does nothing, so redundant resize events
    /// leave all buffers untouched.
    pub fn set_size(&mut self, backend: &B, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!(
            "chain: resize {}x{} -> {width}x{height}",
            self.width,
            self.height
        );
        self.width = width;
        self.height = height;
        self.targets = Self::create_targets(backend, width, height);
        for entry in &mut self.entries {
            entry.pass.set_size(backend, width, height);
        }
        debug_assert!(self
            .targets
            .iter()
            .all(|t| t.size() == (self.width, self.height)));
    }

    /// Execute every enabled pass in order and return how many ran.
    ///
    /// The first enabled pass gets no input; each later one reads the buffer
    /// the previous enabled pass wrote. The last enabled pass renders to the
    /// screen.
    pub fn render(
        &mut self,
        backend: &B,
        frame: &mut B::Frame,
        scene: &Scene,
        camera: &Camera,
    ) -> usize {
        let Some(last) = self.entries.iter().rposition(|e| e.descriptor.enabled)
        else {
            return 0;
        };

        let ctx = PassContext { scene, camera };
        let targets = &self.targets;
        let mut input: Option<usize> = None;
        let mut write = 0;
        let mut executed = 0;

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if !entry.descriptor.enabled {
                continue;
            }
            let output = if index == last {
                PassOutput::Screen
            } else {
                PassOutput::Target(&targets[write])
            };
            let io = PassIo {
                input: input.map(|i| &targets[i]),
                output,
            };
            entry
                .pass
                .render(backend, frame, &ctx, &entry.descriptor, io);
            executed += 1;

            input = Some(write);
            write ^= 1;
        }
        executed
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Invocation, Output, RecordingBackend};
    use super::super::{ShaderProgram, Uniforms};
    use super::*;

    fn descriptor(label: &'static str) -> PassDescriptor {
        PassDescriptor::new(
            label,
            ShaderProgram::from_static(label, ""),
            Uniforms::new(),
        )
    }

    fn three_pass_chain(
        backend: &RecordingBackend,
    ) -> (PassChain<RecordingBackend>, [PassId; 3]) {
        let mut chain = PassChain::new(backend, 800, 600);
        let base = chain
            .add_pass(backend, PassKind::Scene, descriptor("base"))
            .unwrap();
        let gamma = chain
            .add_pass(backend, PassKind::Shader, descriptor("gamma"))
            .unwrap();
        let custom = chain
            .add_pass(backend, PassKind::Shader, descriptor("custom"))
            .unwrap();
        (chain, [base, gamma, custom])
    }

    fn render_once(
        backend: &mut RecordingBackend,
        chain: &mut PassChain<RecordingBackend>,
    ) -> Vec<Invocation> {
        let mut frame = backend.begin_frame().unwrap();
        let _ = chain.render(backend, &mut frame, &Scene::new(), &Camera::default());
        frame
    }

    #[test]
    fn renders_in_insertion_order_with_hand_off() {
        let mut backend = RecordingBackend::default();
        let (mut chain, _) = three_pass_chain(&backend);

        for _ in 0..3 {
            let calls = render_once(&mut backend, &mut chain);
            let names: Vec<&str> = calls.iter().map(|c| c.pass.as_str()).collect();
            assert_eq!(names, ["base", "gamma", "custom"]);

            assert_eq!(calls[0].input, None);
            for pair in calls.windows(2) {
                let Output::Target(prev_out) = pair[0].output else {
                    panic!("non-terminal pass wrote to screen");
                };
                assert_eq!(pair[1].input, Some(prev_out));
            }
            assert_eq!(calls[2].output, Output::Screen);
        }
    }

    #[test]
    fn disabled_pass_forwards_previous_output() {
        let mut backend = RecordingBackend::default();
        let (mut chain, [_, gamma, _]) = three_pass_chain(&backend);
        assert!(chain.set_enabled(gamma, false));

        let calls = render_once(&mut backend, &mut chain);
        let names: Vec<&str> = calls.iter().map(|c| c.pass.as_str()).collect();
        assert_eq!(names, ["base", "custom"]);
        let Output::Target(base_out) = calls[0].output else {
            panic!("base pass should render offscreen");
        };
        assert_eq!(calls[1].input, Some(base_out));
        assert_eq!(calls[1].output, Output::Screen);
    }

    #[test]
    fn last_enabled_pass_is_terminal() {
        let mut backend = RecordingBackend::default();
        let (mut chain, [_, _, custom]) = three_pass_chain(&backend);
        let _ = chain.set_enabled(custom, false);

        let calls = render_once(&mut backend, &mut chain);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].pass, "gamma");
        assert_eq!(calls[1].output, Output::Screen);
        let screens = calls.iter().filter(|c| c.output == Output::Screen).count();
        assert_eq!(screens, 1);
    }

    #[test]
    fn all_disabled_renders_nothing() {
        let mut backend = RecordingBackend::default();
        let (mut chain, ids) = three_pass_chain(&backend);
        for id in ids {
            let _ = chain.set_enabled(id, false);
        }
        let mut frame = backend.begin_frame().unwrap();
        let ran = chain.render(&backend, &mut frame, &Scene::new(), &Camera::default());
        assert_eq!(ran, 0);
        assert!(frame.is_empty());
    }

    #[test]
    fn set_size_propagates_to_every_buffer_and_pass() {
        let backend = RecordingBackend::default();
        let (mut chain, _) = three_pass_chain(&backend);

        chain.set_size(&backend, 1024, 768);
        assert_eq!(chain.size(), (1024, 768));
        for target in chain.targets() {
            assert_eq!(target.size(), (1024, 768));
        }
        for name in ["base", "gamma", "custom"] {
            assert_eq!(backend.pass_size(name), Some((1024, 768)));
        }
    }

    #[test]
    fn disabled_passes_are_still_resized() {
        let backend = RecordingBackend::default();
        let (mut chain, [_, gamma, _]) = three_pass_chain(&backend);
        let _ = chain.set_enabled(gamma, false);
        chain.set_size(&backend, 320, 200);
        assert_eq!(backend.pass_size("gamma"), Some((320, 200)));
    }

    #[test]
    fn same_size_is_a_no_op() {
        let backend = RecordingBackend::default();
        let (mut chain, _) = three_pass_chain(&backend);
        chain.set_size(&backend, 640, 480);
        let ids_before: Vec<u32> = chain.targets().iter().map(|t| t.id).collect();
        let allocated = backend.targets_created();

        chain.set_size(&backend, 640, 480);
        let ids_after: Vec<u32> = chain.targets().iter().map(|t| t.id).collect();
        assert_eq!(ids_before, ids_after);
        assert_eq!(backend.targets_created(), allocated);
    }

    #[test]
    fn zero_size_is_clamped() {
        let backend = RecordingBackend::default();
        let (mut chain, _) = three_pass_chain(&backend);
        chain.set_size(&backend, 0, 0);
        assert_eq!(chain.size(), (1, 1));
    }
}
