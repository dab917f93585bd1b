use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage, ShaderType,
};

use crate::error::OrbitError;
use crate::renderer::postprocess::ShaderProgram;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Pass programs
/// use `#import orbitfx::module_name` to pull in shared code. The composer
/// produces `naga::Module` IR directly, skipping WGSL re-parse at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

/// Shared modules in dependency order.
const MODULES: &[ModuleDef] = &[ModuleDef {
    source: include_str!("../../assets/shaders/modules/fullscreen.wgsl"),
    file_path: "modules/fullscreen.wgsl",
}];

impl ShaderComposer {
    /// Composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if a shared module fails to parse.
    pub fn new() -> Result<Self, OrbitError> {
        let mut composer = Composer::default();
        for m in MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    OrbitError::Shader(format!(
                        "failed to register shader module '{}': {e}",
                        m.file_path
                    ))
                })?;
        }
        Ok(Self { composer })
    }

    /// Compose a program (which may contain `#import` directives) into a
    /// `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        program: &ShaderProgram,
    ) -> Result<wgpu::ShaderModule, OrbitError> {
        let naga_module = self.compose_naga(&program.source, &program.name)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader source into a `naga::Module` without creating a
    /// wgpu shader module. Useful for testing shader composition without a
    /// GPU device.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if composition fails.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, OrbitError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| {
                OrbitError::Shader(format!("failed to compose '{file_path}': {e}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::postprocess::programs::{
        EFFECT_PROGRAM, GAMMA_PROGRAM, SCENE_PROGRAM,
    };

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn all_programs_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for program in [SCENE_PROGRAM, GAMMA_PROGRAM, EFFECT_PROGRAM] {
            let module = composer
                .compose_naga(&program.source, &program.name)
                .unwrap_or_else(|e| panic!("{} failed to compose: {e}", program.name));
            let entries = entry_points(&module);
            assert!(entries.contains(&"vs_main"), "{}: {entries:?}", program.name);
            assert!(entries.contains(&"fs_main"), "{}: {entries:?}", program.name);
        }
    }

    #[test]
    fn effect_program_declares_time() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer
            .compose_naga(&EFFECT_PROGRAM.source, &EFFECT_PROGRAM.name)
            .unwrap();
        let has_time = module.types.iter().any(|(_, ty)| match &ty.inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .any(|m| m.name.as_deref() == Some("time")),
            _ => false,
        });
        assert!(has_time);
    }

    #[test]
    fn broken_source_is_a_shader_error() {
        let mut composer = ShaderComposer::new().unwrap();
        let err = composer
            .compose_naga("fn fs_main( -> {", "broken.wgsl")
            .unwrap_err();
        assert!(matches!(err, OrbitError::Shader(msg) if msg.contains("broken.wgsl")));
    }
}
