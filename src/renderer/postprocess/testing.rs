//! Recording backend used by chain and pipeline tests. Nothing touches a
//! GPU; every pass invocation is appended to the frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::pass::{
    Backend, Pass, PassContext, PassDescriptor, PassIo, PassKind, PassOutput,
    RenderTarget,
};
use crate::error::{FrameError, OrbitError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Target {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget for Target {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    Target(u32),
    Screen,
}

/// One recorded pass execution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Invocation {
    pub pass: String,
    pub input: Option<u32>,
    pub output: Output,
    /// Uniform `time` as seen by the pass, if declared.
    pub time: Option<f32>,
    pub eye: glam::Vec3,
}

#[derive(Default)]
struct Shared {
    next_target: Cell<u32>,
    pass_sizes: RefCell<FxHashMap<String, (u32, u32)>>,
    surface_size: Cell<(u32, u32)>,
    frames_begun: Cell<u32>,
    frames_presented: RefCell<Vec<Vec<Invocation>>>,
    fail_next_frame: Cell<bool>,
}

#[derive(Default, Clone)]
pub(crate) struct RecordingBackend {
    shared: Rc<Shared>,
}

impl RecordingBackend {
    pub(crate) fn pass_size(&self, name: &str) -> Option<(u32, u32)> {
        self.shared.pass_sizes.borrow().get(name).copied()
    }

    pub(crate) fn targets_created(&self) -> u32 {
        self.shared.next_target.get()
    }

    pub(crate) fn surface_size(&self) -> (u32, u32) {
        self.shared.surface_size.get()
    }

    pub(crate) fn frames_begun(&self) -> u32 {
        self.shared.frames_begun.get()
    }

    pub(crate) fn presented(&self) -> Vec<Vec<Invocation>> {
        self.shared.frames_presented.borrow().clone()
    }

    pub(crate) fn fail_next_frame(&self) {
        self.shared.fail_next_frame.set(true);
    }
}

impl Backend for RecordingBackend {
    type Target = Target;
    type Frame = Vec<Invocation>;

    fn create_target(&self, _label: &str, width: u32, height: u32) -> Target {
        let id = self.shared.next_target.get();
        self.shared.next_target.set(id + 1);
        Target { id, width, height }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.shared.surface_size.set((width, height));
    }

    fn begin_frame(&mut self) -> Result<Vec<Invocation>, FrameError> {
        self.shared.frames_begun.set(self.shared.frames_begun.get() + 1);
        if self.shared.fail_next_frame.replace(false) {
            return Err(FrameError::Timeout);
        }
        Ok(Vec::new())
    }

    fn end_frame(&mut self, frame: Vec<Invocation>) {
        self.shared.frames_presented.borrow_mut().push(frame);
    }

    fn create_pass(
        &self,
        _kind: PassKind,
        descriptor: &PassDescriptor,
    ) -> Result<Box<dyn Pass<Self>>, OrbitError> {
        Ok(Box::new(RecordingPass {
            name: descriptor.label.clone(),
            shared: Rc::clone(&self.shared),
        }))
    }
}

struct RecordingPass {
    name: String,
    shared: Rc<Shared>,
}

impl Pass<RecordingBackend> for RecordingPass {
    fn set_size(&mut self, _backend: &RecordingBackend, width: u32, height: u32) {
        let _ = self
            .shared
            .pass_sizes
            .borrow_mut()
            .insert(self.name.clone(), (width, height));
    }

    fn render(
        &mut self,
        _backend: &RecordingBackend,
        frame: &mut Vec<Invocation>,
        ctx: &PassContext<'_>,
        descriptor: &PassDescriptor,
        io: PassIo<'_, Target>,
    ) {
        frame.push(Invocation {
            pass: self.name.clone(),
            input: io.input.map(|t| t.id),
            output: match io.output {
                PassOutput::Target(t) => Output::Target(t.id),
                PassOutput::Screen => Output::Screen,
            },
            time: descriptor.uniforms.float("time"),
            eye: ctx.camera.eye,
        });
    }
}
