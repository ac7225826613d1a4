use std::ffi::{CStr, c_char, c_void};
use std::fmt;
use std::ptr::NonNull;

use crate::types::*;
use crate::version::Version;

/// Invoking an entry point that the running context never resolved. Raised
/// before any native call is attempted; the native layer never sees the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported {
    /// Native symbol name, e.g. `"glBindTextureUnit"`.
    pub name: &'static str,
    /// Tier at which the entry point first becomes guaranteed available.
    pub since: Version,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (introduced in {}) is not resolved for this context",
            self.name, self.since
        )
    }
}

impl std::error::Error for Unsupported {}

const fn static_cstr(bytes: &'static [u8]) -> &'static CStr {
    match CStr::from_bytes_with_nul(bytes) {
        Ok(name) => name,
        Err(_) => panic!("not a nul-terminated string"),
    }
}

/// One named entry point. Starts out unresolved; resolves at most once and
/// never transitions back, even across repeated resolver passes.
struct Slot {
    name: &'static str,
    name_z: &'static CStr,
    since: Version,
    ptr: Option<NonNull<c_void>>,
}

impl Slot {
    const fn new(name: &'static str, name_z: &'static CStr, since: Version) -> Self {
        Self {
            name,
            name_z,
            since,
            ptr: None,
        }
    }

    fn is_resolved(&self) -> bool {
        self.ptr.is_some()
    }

    // NOTE: a failed lookup leaves the slot unresolved without raising; the
    // failure surfaces later as Unsupported if anything calls through it.
    fn resolve_with<F>(&mut self, get_proc_address: &mut F)
    where
        F: FnMut(*const c_char) -> *mut c_void,
    {
        if self.ptr.is_none() {
            self.ptr = NonNull::new(get_proc_address(self.name_z.as_ptr()));
        }
    }

    fn get(&self) -> Result<NonNull<c_void>, Unsupported> {
        self.ptr.ok_or(Unsupported {
            name: self.name,
            since: self.since,
        })
    }
}

// The whole registration table is declarative: (minimum tier, method, symbol,
// signature) per entry point, nothing else. commands! turns it into the
// Registry struct, the per-tier resolve walk, and one typed caller per slot.
macro_rules! commands {
    ($(
        $tier:ident fn $method:ident = $sym:literal ( $($arg:ident: $ty:ty),* $(,)? ) -> $ret:ty;
    )*) => {
        /// A named slot for every entry point this layer can call, each typed
        /// to the native signature and pinned to the tier that introduced it.
        pub struct Registry {
            $( $method: Slot, )*
        }

        impl Registry {
            pub const COMMAND_COUNT: usize = [$($sym),*].len();

            pub(crate) fn new() -> Self {
                Self {
                    $( $method: Slot::new(
                        $sym,
                        static_cstr(concat!($sym, "\0").as_bytes()),
                        Version::$tier,
                    ), )*
                }
            }

            /// Fills every still-unresolved slot whose minimum tier is met.
            /// Already-resolved slots are left alone, which makes repeated
            /// passes idempotent and strictly additive.
            pub(crate) fn resolve_up_to<F>(&mut self, version: Version, get_proc_address: &mut F)
            where
                F: FnMut(*const c_char) -> *mut c_void,
            {
                $(
                    if Version::$tier <= version {
                        self.$method.resolve_with(get_proc_address);
                    }
                )*
            }

            /// Symbol names of every resolved slot, in table order.
            pub fn resolved_names(&self) -> Vec<&'static str> {
                let mut names = Vec::new();
                $(
                    if self.$method.is_resolved() {
                        names.push($sym);
                    }
                )*
                names
            }

            $(
                #[inline]
                pub unsafe fn $method(&self, $($arg: $ty),*) -> Result<$ret, Unsupported> {
                    type Dst = unsafe extern "C" fn($($ty),*) -> $ret;
                    let ptr = self.$method.get()?;
                    Ok(unsafe { std::mem::transmute::<*mut c_void, Dst>(ptr.as_ptr())($($arg),*) })
                }
            )*
        }
    };
}

commands! {
    // 1.0
    V1_0 fn blend_func = "glBlendFunc"(sfactor: GLenum, dfactor: GLenum) -> ();
    V1_0 fn clear = "glClear"(mask: GLbitfield) -> ();
    V1_0 fn clear_color = "glClearColor"(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) -> ();
    V1_0 fn depth_mask = "glDepthMask"(flag: GLboolean) -> ();
    V1_0 fn disable = "glDisable"(cap: GLenum) -> ();
    V1_0 fn enable = "glEnable"(cap: GLenum) -> ();
    V1_0 fn finish = "glFinish"() -> ();
    V1_0 fn flush = "glFlush"() -> ();
    V1_0 fn get_error = "glGetError"() -> GLenum;
    V1_0 fn get_integerv = "glGetIntegerv"(pname: GLenum, data: *mut GLint) -> ();
    V1_0 fn get_string = "glGetString"(name: GLenum) -> *const GLubyte;
    V1_0 fn pixel_storei = "glPixelStorei"(pname: GLenum, param: GLint) -> ();
    V1_0 fn read_pixels = "glReadPixels"(x: GLint, y: GLint, width: GLsizei, height: GLsizei, format: GLenum, r#type: GLenum, pixels: *mut std::ffi::c_void) -> ();
    V1_0 fn scissor = "glScissor"(x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> ();
    V1_0 fn tex_image_2d = "glTexImage2D"(target: GLenum, level: GLint, internalformat: GLint, width: GLsizei, height: GLsizei, border: GLint, format: GLenum, r#type: GLenum, pixels: *const std::ffi::c_void) -> ();
    V1_0 fn tex_parameteri = "glTexParameteri"(target: GLenum, pname: GLenum, param: GLint) -> ();
    V1_0 fn viewport = "glViewport"(x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> ();

    // 1.1
    V1_1 fn bind_texture = "glBindTexture"(target: GLenum, texture: GLuint) -> ();
    V1_1 fn delete_textures = "glDeleteTextures"(n: GLsizei, textures: *const GLuint) -> ();
    V1_1 fn draw_arrays = "glDrawArrays"(mode: GLenum, first: GLint, count: GLsizei) -> ();
    V1_1 fn draw_elements = "glDrawElements"(mode: GLenum, count: GLsizei, r#type: GLenum, indices: *const std::ffi::c_void) -> ();
    V1_1 fn gen_textures = "glGenTextures"(n: GLsizei, textures: *mut GLuint) -> ();
    V1_1 fn tex_sub_image_2d = "glTexSubImage2D"(target: GLenum, level: GLint, xoffset: GLint, yoffset: GLint, width: GLsizei, height: GLsizei, format: GLenum, r#type: GLenum, pixels: *const std::ffi::c_void) -> ();

    // 1.3
    V1_3 fn active_texture = "glActiveTexture"(texture: GLenum) -> ();

    // 1.4
    V1_4 fn blend_func_separate = "glBlendFuncSeparate"(sfactor_rgb: GLenum, dfactor_rgb: GLenum, sfactor_alpha: GLenum, dfactor_alpha: GLenum) -> ();

    // 1.5
    V1_5 fn bind_buffer = "glBindBuffer"(target: GLenum, buffer: GLuint) -> ();
    V1_5 fn buffer_data = "glBufferData"(target: GLenum, size: GLsizeiptr, data: *const std::ffi::c_void, usage: GLenum) -> ();
    V1_5 fn buffer_sub_data = "glBufferSubData"(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const std::ffi::c_void) -> ();
    V1_5 fn delete_buffers = "glDeleteBuffers"(n: GLsizei, buffers: *const GLuint) -> ();
    V1_5 fn gen_buffers = "glGenBuffers"(n: GLsizei, buffers: *mut GLuint) -> ();

    // 2.0
    V2_0 fn attach_shader = "glAttachShader"(program: GLuint, shader: GLuint) -> ();
    V2_0 fn compile_shader = "glCompileShader"(shader: GLuint) -> ();
    V2_0 fn create_program = "glCreateProgram"() -> GLuint;
    V2_0 fn create_shader = "glCreateShader"(r#type: GLenum) -> GLuint;
    V2_0 fn delete_program = "glDeleteProgram"(program: GLuint) -> ();
    V2_0 fn delete_shader = "glDeleteShader"(shader: GLuint) -> ();
    V2_0 fn detach_shader = "glDetachShader"(program: GLuint, shader: GLuint) -> ();
    V2_0 fn draw_buffers = "glDrawBuffers"(n: GLsizei, bufs: *const GLenum) -> ();
    V2_0 fn enable_vertex_attrib_array = "glEnableVertexAttribArray"(index: GLuint) -> ();
    V2_0 fn get_attrib_location = "glGetAttribLocation"(program: GLuint, name: *const GLchar) -> GLint;
    V2_0 fn get_program_info_log = "glGetProgramInfoLog"(program: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar) -> ();
    V2_0 fn get_programiv = "glGetProgramiv"(program: GLuint, pname: GLenum, params: *mut GLint) -> ();
    V2_0 fn get_shader_info_log = "glGetShaderInfoLog"(shader: GLuint, buf_size: GLsizei, length: *mut GLsizei, info_log: *mut GLchar) -> ();
    V2_0 fn get_shaderiv = "glGetShaderiv"(shader: GLuint, pname: GLenum, params: *mut GLint) -> ();
    V2_0 fn get_uniform_location = "glGetUniformLocation"(program: GLuint, name: *const GLchar) -> GLint;
    V2_0 fn link_program = "glLinkProgram"(program: GLuint) -> ();
    V2_0 fn shader_source = "glShaderSource"(shader: GLuint, count: GLsizei, string: *const *const GLchar, length: *const GLint) -> ();
    V2_0 fn uniform_1f = "glUniform1f"(location: GLint, v0: GLfloat) -> ();
    V2_0 fn uniform_1i = "glUniform1i"(location: GLint, v0: GLint) -> ();
    V2_0 fn use_program = "glUseProgram"(program: GLuint) -> ();
    V2_0 fn vertex_attrib_pointer = "glVertexAttribPointer"(index: GLuint, size: GLint, r#type: GLenum, normalized: GLboolean, stride: GLsizei, pointer: *const std::ffi::c_void) -> ();

    // 3.0
    V3_0 fn bind_buffer_base = "glBindBufferBase"(target: GLenum, index: GLuint, buffer: GLuint) -> ();
    V3_0 fn bind_framebuffer = "glBindFramebuffer"(target: GLenum, framebuffer: GLuint) -> ();
    V3_0 fn bind_renderbuffer = "glBindRenderbuffer"(target: GLenum, renderbuffer: GLuint) -> ();
    V3_0 fn bind_vertex_array = "glBindVertexArray"(array: GLuint) -> ();
    V3_0 fn blit_framebuffer = "glBlitFramebuffer"(src_x0: GLint, src_y0: GLint, src_x1: GLint, src_y1: GLint, dst_x0: GLint, dst_y0: GLint, dst_x1: GLint, dst_y1: GLint, mask: GLbitfield, filter: GLenum) -> ();
    V3_0 fn check_framebuffer_status = "glCheckFramebufferStatus"(target: GLenum) -> GLenum;
    V3_0 fn delete_framebuffers = "glDeleteFramebuffers"(n: GLsizei, framebuffers: *const GLuint) -> ();
    V3_0 fn delete_renderbuffers = "glDeleteRenderbuffers"(n: GLsizei, renderbuffers: *const GLuint) -> ();
    V3_0 fn delete_vertex_arrays = "glDeleteVertexArrays"(n: GLsizei, arrays: *const GLuint) -> ();
    V3_0 fn framebuffer_renderbuffer = "glFramebufferRenderbuffer"(target: GLenum, attachment: GLenum, renderbuffertarget: GLenum, renderbuffer: GLuint) -> ();
    V3_0 fn framebuffer_texture_2d = "glFramebufferTexture2D"(target: GLenum, attachment: GLenum, textarget: GLenum, texture: GLuint, level: GLint) -> ();
    V3_0 fn gen_framebuffers = "glGenFramebuffers"(n: GLsizei, framebuffers: *mut GLuint) -> ();
    V3_0 fn gen_renderbuffers = "glGenRenderbuffers"(n: GLsizei, renderbuffers: *mut GLuint) -> ();
    V3_0 fn gen_vertex_arrays = "glGenVertexArrays"(n: GLsizei, arrays: *mut GLuint) -> ();
    V3_0 fn get_stringi = "glGetStringi"(name: GLenum, index: GLuint) -> *const GLubyte;
    V3_0 fn map_buffer_range = "glMapBufferRange"(target: GLenum, offset: GLintptr, length: GLsizeiptr, access: GLbitfield) -> *mut std::ffi::c_void;
    V3_0 fn renderbuffer_storage = "glRenderbufferStorage"(target: GLenum, internalformat: GLenum, width: GLsizei, height: GLsizei) -> ();
    V3_0 fn unmap_buffer = "glUnmapBuffer"(target: GLenum) -> GLboolean;

    // 3.1
    V3_1 fn draw_arrays_instanced = "glDrawArraysInstanced"(mode: GLenum, first: GLint, count: GLsizei, instancecount: GLsizei) -> ();
    V3_1 fn tex_buffer = "glTexBuffer"(target: GLenum, internalformat: GLenum, buffer: GLuint) -> ();

    // 3.2
    V3_2 fn client_wait_sync = "glClientWaitSync"(sync: GLsync, flags: GLbitfield, timeout: GLuint64) -> GLenum;
    V3_2 fn delete_sync = "glDeleteSync"(sync: GLsync) -> ();
    V3_2 fn fence_sync = "glFenceSync"(condition: GLenum, flags: GLbitfield) -> GLsync;

    // 4.2
    V4_2 fn bind_image_texture = "glBindImageTexture"(unit: GLuint, texture: GLuint, level: GLint, layered: GLboolean, layer: GLint, access: GLenum, format: GLenum) -> ();
    V4_2 fn tex_storage_2d = "glTexStorage2D"(target: GLenum, levels: GLsizei, internalformat: GLenum, width: GLsizei, height: GLsizei) -> ();

    // 4.3
    V4_3 fn debug_message_callback = "glDebugMessageCallback"(callback: GLDEBUGPROC, user_param: *const std::ffi::c_void) -> ();
    V4_3 fn dispatch_compute = "glDispatchCompute"(num_groups_x: GLuint, num_groups_y: GLuint, num_groups_z: GLuint) -> ();

    // 4.5
    V4_5 fn bind_texture_unit = "glBindTextureUnit"(unit: GLuint, texture: GLuint) -> ();
    V4_5 fn create_buffers = "glCreateBuffers"(n: GLsizei, buffers: *mut GLuint) -> ();
    V4_5 fn create_textures = "glCreateTextures"(target: GLenum, n: GLsizei, textures: *mut GLuint) -> ();
    V4_5 fn named_buffer_data = "glNamedBufferData"(buffer: GLuint, size: GLsizeiptr, data: *const std::ffi::c_void, usage: GLenum) -> ();

    // 4.6
    V4_6 fn specialize_shader = "glSpecializeShader"(shader: GLuint, entry_point: *const GLchar, num_constants: GLuint, constant_index: *const GLuint, constant_value: *const GLuint) -> ();
}
