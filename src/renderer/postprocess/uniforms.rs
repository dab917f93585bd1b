//! Named, typed uniform mappings attached to each pass descriptor.

use std::fmt;

/// Texture slots a pass can declare in its uniform mapping. Textures are
/// bound by the backend, not packed into the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    /// The previous pass's output frame.
    SourceFrame,
}

/// A single uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Scalar `f32`.
    Float(f32),
    /// `vec2<f32>`.
    Vec2([f32; 2]),
    /// `vec3<f32>`.
    Vec3([f32; 3]),
    /// `vec4<f32>`.
    Vec4([f32; 4]),
    /// A texture binding.
    Texture(TextureSlot),
}

impl UniformValue {
    /// Short WGSL-style name of the value kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "f32",
            Self::Vec2(_) => "vec2<f32>",
            Self::Vec3(_) => "vec3<f32>",
            Self::Vec4(_) => "vec4<f32>",
            Self::Texture(_) => "texture_2d<f32>",
        }
    }

    /// Whether this is a texture binding rather than a packed value.
    #[must_use]
    pub fn is_texture(&self) -> bool {
        matches!(self, Self::Texture(_))
    }

    fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// (size, alignment) in bytes under std140/WGSL uniform layout rules.
    fn layout(&self) -> Option<(usize, usize)> {
        match self {
            Self::Float(_) => Some((4, 4)),
            Self::Vec2(_) => Some((8, 8)),
            Self::Vec3(_) => Some((12, 16)),
            Self::Vec4(_) => Some((16, 16)),
            Self::Texture(_) => None,
        }
    }

    fn components(&self) -> &[f32] {
        match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v,
            Self::Vec3(v) => v,
            Self::Vec4(v) => v,
            Self::Texture(_) => &[],
        }
    }
}

/// Errors raised when writing into a [`Uniforms`] mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformError {
    /// No uniform with this name was declared.
    Unknown(String),
    /// The written value's kind differs from the declared kind.
    TypeMismatch {
        /// Uniform name.
        name: String,
        /// Declared kind.
        expected: &'static str,
        /// Kind of the rejected value.
        found: &'static str,
    },
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown uniform '{name}'"),
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "uniform '{name}' is declared as {expected}, got {found}"
            ),
        }
    }
}

impl std::error::Error for UniformError {}

/// Ordered name -> value mapping.
///
/// Declaration order is the field order of the packed uniform block, so it
/// must match the struct declared in the pass's WGSL program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Uniforms {
    entries: Vec<(String, UniformValue)>,
}

impl Uniforms {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a uniform (builder style). Redeclaring a name replaces it in
    /// place.
    #[must_use]
    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name.to_owned(), value));
        }
        self
    }

    /// Look up a uniform by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Scalar value of a `Float` uniform.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Overwrite a declared uniform. The value must have the declared kind.
    ///
    /// # Errors
    ///
    /// [`UniformError::Unknown`] if `name` was never declared,
    /// [`UniformError::TypeMismatch`] if the kinds differ.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let (_, slot) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| UniformError::Unknown(name.to_owned()))?;
        if !slot.same_kind(&value) {
            return Err(UniformError::TypeMismatch {
                name: name.to_owned(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Whether the mapping declares a texture in `slot`.
    #[must_use]
    pub fn has_texture(&self, slot: TextureSlot) -> bool {
        self.entries
            .iter()
            .any(|(_, v)| *v == UniformValue::Texture(slot))
    }

    /// Iterate over `(name, value)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Pack all non-texture values into a uniform-buffer byte block using
    /// WGSL uniform layout rules. The block is padded to 16 bytes and is
    /// never empty, so it can always back a binding.
    #[must_use]
    pub fn to_std140_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();
        for (_, value) in &self.entries {
            let Some((size, align)) = value.layout() else {
                continue;
            };
            bytes.resize(bytes.len().next_multiple_of(align), 0);
            let components: &[u8] = bytemuck::cast_slice(value.components());
            debug_assert_eq!(components.len(), size);
            bytes.extend_from_slice(components);
        }
        let padded = bytes.len().next_multiple_of(16).max(16);
        bytes.resize(padded, 0);
        bytes
    }
}
