use std::num::NonZero;

use crate::consts::*;
use crate::types::{GLenum, GLint, GLuint};

pub type Buffer = NonZero<GLuint>;
pub type Framebuffer = NonZero<GLuint>;
pub type Program = NonZero<GLuint>;
pub type Renderbuffer = NonZero<GLuint>;
pub type Texture = NonZero<GLuint>;

/// Distinct texture binding targets. Targets on one unit are independent
/// binding points, not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    D1,
    D1Array,
    D2,
    D2Array,
    D2Multisample,
    D2MultisampleArray,
    D3,
    CubeMap,
    CubeMapArray,
    Buffer,
    Rectangle,
}

impl TextureTarget {
    pub const COUNT: usize = 11;
    pub const ALL: [TextureTarget; Self::COUNT] = [
        Self::D1,
        Self::D1Array,
        Self::D2,
        Self::D2Array,
        Self::D2Multisample,
        Self::D2MultisampleArray,
        Self::D3,
        Self::CubeMap,
        Self::CubeMapArray,
        Self::Buffer,
        Self::Rectangle,
    ];

    pub fn from_gl(target: GLenum) -> Option<Self> {
        match target {
            TEXTURE_1D => Some(Self::D1),
            TEXTURE_1D_ARRAY => Some(Self::D1Array),
            TEXTURE_2D => Some(Self::D2),
            TEXTURE_2D_ARRAY => Some(Self::D2Array),
            TEXTURE_2D_MULTISAMPLE => Some(Self::D2Multisample),
            TEXTURE_2D_MULTISAMPLE_ARRAY => Some(Self::D2MultisampleArray),
            TEXTURE_3D => Some(Self::D3),
            TEXTURE_CUBE_MAP => Some(Self::CubeMap),
            TEXTURE_CUBE_MAP_ARRAY => Some(Self::CubeMapArray),
            TEXTURE_BUFFER => Some(Self::Buffer),
            TEXTURE_RECTANGLE => Some(Self::Rectangle),
            _ => None,
        }
    }

    pub fn as_gl(self) -> GLenum {
        match self {
            Self::D1 => TEXTURE_1D,
            Self::D1Array => TEXTURE_1D_ARRAY,
            Self::D2 => TEXTURE_2D,
            Self::D2Array => TEXTURE_2D_ARRAY,
            Self::D2Multisample => TEXTURE_2D_MULTISAMPLE,
            Self::D2MultisampleArray => TEXTURE_2D_MULTISAMPLE_ARRAY,
            Self::D3 => TEXTURE_3D,
            Self::CubeMap => TEXTURE_CUBE_MAP,
            Self::CubeMapArray => TEXTURE_CUBE_MAP_ARRAY,
            Self::Buffer => TEXTURE_BUFFER,
            Self::Rectangle => TEXTURE_RECTANGLE,
        }
    }
}

/// Non-indexed buffer binding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferBindingPoint {
    Array,
    AtomicCounter,
    CopyRead,
    CopyWrite,
    DispatchIndirect,
    DrawIndirect,
    ElementArray,
    PixelPack,
    PixelUnpack,
    Query,
    ShaderStorage,
    Texture,
    TransformFeedback,
    Uniform,
}

impl BufferBindingPoint {
    pub const COUNT: usize = 14;
    pub const ALL: [BufferBindingPoint; Self::COUNT] = [
        Self::Array,
        Self::AtomicCounter,
        Self::CopyRead,
        Self::CopyWrite,
        Self::DispatchIndirect,
        Self::DrawIndirect,
        Self::ElementArray,
        Self::PixelPack,
        Self::PixelUnpack,
        Self::Query,
        Self::ShaderStorage,
        Self::Texture,
        Self::TransformFeedback,
        Self::Uniform,
    ];

    pub fn from_gl(target: GLenum) -> Option<Self> {
        match target {
            ARRAY_BUFFER => Some(Self::Array),
            ATOMIC_COUNTER_BUFFER => Some(Self::AtomicCounter),
            COPY_READ_BUFFER => Some(Self::CopyRead),
            COPY_WRITE_BUFFER => Some(Self::CopyWrite),
            DISPATCH_INDIRECT_BUFFER => Some(Self::DispatchIndirect),
            DRAW_INDIRECT_BUFFER => Some(Self::DrawIndirect),
            ELEMENT_ARRAY_BUFFER => Some(Self::ElementArray),
            PIXEL_PACK_BUFFER => Some(Self::PixelPack),
            PIXEL_UNPACK_BUFFER => Some(Self::PixelUnpack),
            QUERY_BUFFER => Some(Self::Query),
            SHADER_STORAGE_BUFFER => Some(Self::ShaderStorage),
            TEXTURE_BUFFER => Some(Self::Texture),
            TRANSFORM_FEEDBACK_BUFFER => Some(Self::TransformFeedback),
            UNIFORM_BUFFER => Some(Self::Uniform),
            _ => None,
        }
    }

    pub fn as_gl(self) -> GLenum {
        match self {
            Self::Array => ARRAY_BUFFER,
            Self::AtomicCounter => ATOMIC_COUNTER_BUFFER,
            Self::CopyRead => COPY_READ_BUFFER,
            Self::CopyWrite => COPY_WRITE_BUFFER,
            Self::DispatchIndirect => DISPATCH_INDIRECT_BUFFER,
            Self::DrawIndirect => DRAW_INDIRECT_BUFFER,
            Self::ElementArray => ELEMENT_ARRAY_BUFFER,
            Self::PixelPack => PIXEL_PACK_BUFFER,
            Self::PixelUnpack => PIXEL_UNPACK_BUFFER,
            Self::Query => QUERY_BUFFER,
            Self::ShaderStorage => SHADER_STORAGE_BUFFER,
            Self::Texture => TEXTURE_BUFFER,
            Self::TransformFeedback => TRANSFORM_FEEDBACK_BUFFER,
            Self::Uniform => UNIFORM_BUFFER,
        }
    }
}

/// One image unit's binding, as set by glBindImageTexture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBinding {
    pub texture: Texture,
    pub level: GLint,
    pub layered: bool,
    pub layer: GLint,
    pub access: GLenum,
    pub format: GLenum,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TextureUnit {
    targets: [Option<Texture>; TextureTarget::COUNT],
}

/// In-process mirror of the context's binding state.
///
/// This is a cache with a one-way consistency contract: it is accurate only
/// for state mutated through this layer's wrappers. Any binding performed by
/// another path (a second api instance, a raw native call, another library
/// sharing the context) desynchronizes it with no detection and no recovery —
/// keeping all binding traffic on this layer is a caller obligation.
///
/// Reads are public; mutation happens only through the shadow-updating
/// wrappers on [`crate::Api`].
#[derive(Debug, Default)]
pub struct Shadow {
    active_texture_unit: usize,
    texture_units: Vec<TextureUnit>,
    image_units: Vec<Option<ImageBinding>>,
    buffers: [Option<Buffer>; BufferBindingPoint::COUNT],
    read_framebuffer: Option<Framebuffer>,
    draw_framebuffer: Option<Framebuffer>,
    renderbuffer: Option<Renderbuffer>,
    program: Option<Program>,
}

impl Shadow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Unit index implied by texture binds that don't name a unit.
    pub fn active_texture_unit(&self) -> usize {
        self.active_texture_unit
    }

    /// Zero until the first resolver pass sizes the unit array.
    pub fn texture_unit_count(&self) -> usize {
        self.texture_units.len()
    }

    pub fn texture(&self, unit: usize, target: TextureTarget) -> Option<Texture> {
        self.texture_units.get(unit)?.targets[target as usize]
    }

    pub fn image_unit_count(&self) -> usize {
        self.image_units.len()
    }

    pub fn image(&self, unit: usize) -> Option<ImageBinding> {
        self.image_units.get(unit).copied().flatten()
    }

    pub fn buffer(&self, point: BufferBindingPoint) -> Option<Buffer> {
        self.buffers[point as usize]
    }

    pub fn read_framebuffer(&self) -> Option<Framebuffer> {
        self.read_framebuffer
    }

    pub fn draw_framebuffer(&self) -> Option<Framebuffer> {
        self.draw_framebuffer
    }

    pub fn renderbuffer(&self) -> Option<Renderbuffer> {
        self.renderbuffer
    }

    pub fn program(&self) -> Option<Program> {
        self.program
    }

    // NOTE: sizing is once-only; a later pass with a different count is a
    // no-op. See Api::resolve.
    pub(crate) fn size_texture_units(&mut self, count: usize) {
        if self.texture_units.is_empty() {
            self.texture_units = vec![TextureUnit::default(); count];
        }
    }

    pub(crate) fn size_image_units(&mut self, count: usize) {
        if self.image_units.is_empty() {
            self.image_units = vec![None; count];
        }
    }

    pub(crate) fn set_active_texture_unit(&mut self, unit: usize) {
        self.active_texture_unit = unit;
    }

    pub(crate) fn set_texture(&mut self, unit: usize, target: TextureTarget, texture: Texture) {
        if let Some(texture_unit) = self.texture_units.get_mut(unit) {
            texture_unit.targets[target as usize] = Some(texture);
        }
    }

    /// Writes every target slot of `unit`. Used when the native call carries
    /// no target (null unbind, glBindTextureUnit).
    pub(crate) fn fill_texture_unit(&mut self, unit: usize, texture: Option<Texture>) {
        if let Some(texture_unit) = self.texture_units.get_mut(unit) {
            texture_unit.targets = [texture; TextureTarget::COUNT];
        }
    }

    pub(crate) fn set_image(&mut self, unit: usize, binding: Option<ImageBinding>) {
        if let Some(slot) = self.image_units.get_mut(unit) {
            *slot = binding;
        }
    }

    pub(crate) fn set_buffer(&mut self, point: BufferBindingPoint, buffer: Option<Buffer>) {
        self.buffers[point as usize] = buffer;
    }

    pub(crate) fn set_read_framebuffer(&mut self, framebuffer: Option<Framebuffer>) {
        self.read_framebuffer = framebuffer;
    }

    pub(crate) fn set_draw_framebuffer(&mut self, framebuffer: Option<Framebuffer>) {
        self.draw_framebuffer = framebuffer;
    }

    pub(crate) fn set_renderbuffer(&mut self, renderbuffer: Option<Renderbuffer>) {
        self.renderbuffer = renderbuffer;
    }

    pub(crate) fn set_program(&mut self, program: Option<Program>) {
        self.program = program;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(name: GLuint) -> Texture {
        Texture::new(name).unwrap()
    }

    #[test]
    fn test_targets_are_independent() {
        let mut shadow = Shadow::new();
        shadow.size_texture_units(4);

        shadow.set_texture(1, TextureTarget::D2, texture(5));
        shadow.set_texture(1, TextureTarget::D3, texture(6));
        assert_eq!(shadow.texture(1, TextureTarget::D2), Some(texture(5)));
        assert_eq!(shadow.texture(1, TextureTarget::D3), Some(texture(6)));

        shadow.set_texture(1, TextureTarget::D2, texture(7));
        assert_eq!(shadow.texture(1, TextureTarget::D3), Some(texture(6)));
        for target in TextureTarget::ALL {
            assert_eq!(shadow.texture(0, target), None);
        }
    }

    #[test]
    fn test_fill_unit_covers_every_target() {
        let mut shadow = Shadow::new();
        shadow.size_texture_units(2);

        shadow.set_texture(0, TextureTarget::CubeMap, texture(3));
        shadow.fill_texture_unit(0, None);
        for target in TextureTarget::ALL {
            assert_eq!(shadow.texture(0, target), None);
        }
    }

    #[test]
    fn test_sizing_is_once_only() {
        let mut shadow = Shadow::new();
        shadow.size_texture_units(8);
        shadow.size_texture_units(32);
        assert_eq!(shadow.texture_unit_count(), 8);
    }

    #[test]
    fn test_gl_enum_mapping() {
        assert_eq!(
            TextureTarget::from_gl(TEXTURE_2D_MULTISAMPLE_ARRAY),
            Some(TextureTarget::D2MultisampleArray)
        );
        assert_eq!(TextureTarget::from_gl(ARRAY_BUFFER), None);
        assert_eq!(
            BufferBindingPoint::from_gl(SHADER_STORAGE_BUFFER),
            Some(BufferBindingPoint::ShaderStorage)
        );
        assert_eq!(BufferBindingPoint::from_gl(TEXTURE_2D), None);
        for target in TextureTarget::ALL {
            assert_eq!(TextureTarget::from_gl(target.as_gl()), Some(target));
        }
        for point in BufferBindingPoint::ALL {
            assert_eq!(BufferBindingPoint::from_gl(point.as_gl()), Some(point));
        }
    }
}
