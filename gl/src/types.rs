pub type GLbitfield = std::ffi::c_uint;
pub type GLboolean = std::ffi::c_uchar;
pub type GLbyte = std::ffi::c_char;
pub type GLchar = std::ffi::c_char;
pub type GLdouble = std::ffi::c_double;
pub type GLenum = std::ffi::c_uint;
pub type GLfloat = std::ffi::c_float;
pub type GLint = std::ffi::c_int;
pub type GLint64 = i64;
pub type GLintptr = isize;
pub type GLshort = std::ffi::c_short;
pub type GLsizei = std::ffi::c_int;
pub type GLsizeiptr = isize;
pub type GLsync = *mut std::ffi::c_void;
pub type GLubyte = std::ffi::c_uchar;
pub type GLuint = std::ffi::c_uint;
pub type GLuint64 = u64;
pub type GLushort = std::ffi::c_ushort;

#[allow(non_camel_case_types)]
pub type GLDEBUGPROC = Option<
    extern "C" fn(
        source: GLenum,
        r#type: GLenum,
        id: GLuint,
        severity: GLenum,
        length: GLsizei,
        message: *const GLchar,
        userParam: *mut std::ffi::c_void,
    ),
>;
