use std::ffi::{CStr, c_char, c_void};
use std::ops::Deref;

use anyhow::{Context as _, bail};

use crate::consts::*;
use crate::registry::{Registry, Unsupported};
use crate::shadow::{
    Buffer, BufferBindingPoint, Framebuffer, ImageBinding, Program, Renderbuffer, Shadow, Texture,
    TextureTarget,
};
use crate::types::*;
use crate::version::Version;

/// The binding layer for one native context: entry-point registry plus the
/// binding-state shadow, owned together so all mutation goes through one
/// place. The underlying context has single-thread affinity and so does
/// this; exclusive ownership is what the `&mut self` wrappers enforce.
///
/// Entry points with no shadow side effect are reachable through
/// `Deref<Target = Registry>`; the eight binding calls below shadow them
/// with wrappers that keep the mirror in sync.
pub struct Api {
    registry: Registry,
    shadow: Shadow,
    version: Option<Version>,
}

impl Deref for Api {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    /// Every slot unresolved, shadow empty. Call [`Api::resolve`] with the
    /// context's reported version before issuing anything.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            shadow: Shadow::new(),
            version: None,
        }
    }

    /// Highest version a resolver pass has processed so far.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn shadow(&self) -> &Shadow {
        &self.shadow
    }

    /// Resolves every entry point whose minimum tier is satisfied by
    /// `version` and which is not already resolved. Safe to call again
    /// later with a higher version; passes are idempotent and strictly
    /// additive, and the processed version never decreases.
    ///
    /// Symbols the lookup cannot find stay unresolved without failing the
    /// pass; calling through them later returns [`Unsupported`].
    ///
    /// The first pass also sizes the texture-unit shadow array from
    /// GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS (platform minimum 48 when the
    /// query is unavailable). Sizing happens once; later passes never
    /// resize.
    pub unsafe fn resolve<F>(&mut self, version: Version, mut get_proc_address: F)
    where
        F: FnMut(*const c_char) -> *mut c_void,
    {
        if version > Version::LATEST {
            log::info!(
                "context reports version {version}, newer than the latest known tier; \
                 resolving up to {} only",
                Version::LATEST
            );
        }
        if self.version.is_none_or(|current| version > current) {
            self.version = Some(version);
        }

        self.registry.resolve_up_to(version, &mut get_proc_address);
        log::debug!(
            "resolved {}/{} entry points for version {version}",
            self.registry.resolved_names().len(),
            Registry::COMMAND_COUNT,
        );

        if self.shadow.texture_unit_count() == 0 {
            let count = unsafe { self.query_positive_integer(MAX_COMBINED_TEXTURE_IMAGE_UNITS) }
                .unwrap_or(48);
            self.shadow.size_texture_units(count);
        }
        if self.shadow.image_unit_count() == 0 && version >= Version::V4_2 {
            let count = unsafe { self.query_positive_integer(MAX_IMAGE_UNITS) }.unwrap_or(8);
            self.shadow.size_image_units(count);
        }
    }

    unsafe fn query_positive_integer(&self, pname: GLenum) -> Option<usize> {
        let mut value: GLint = 0;
        match unsafe { self.registry.get_integerv(pname, &mut value) } {
            Ok(()) if value > 0 => Some(value as usize),
            _ => None,
        }
    }

    /// Asks the context which version it implements, preferring the integer
    /// queries and falling back to parsing the version string on pre-3.0
    /// contexts (those answer MAJOR_VERSION with an error and leave the
    /// output untouched).
    pub unsafe fn query_version(&self) -> anyhow::Result<Version> {
        let mut major: GLint = 0;
        let mut minor: GLint = 0;
        unsafe {
            _ = self.registry.get_integerv(MAJOR_VERSION, &mut major);
            _ = self.registry.get_integerv(MINOR_VERSION, &mut minor);
        }
        if major > 0 {
            return Ok(Version(major as u32, minor as u32));
        }

        let ptr = unsafe { self.registry.get_string(VERSION)? };
        if ptr.is_null() {
            bail!("could not get version string");
        }
        unsafe { CStr::from_ptr(ptr as *const c_char) }
            .to_str()
            .context("invalid version string")?
            .parse()
    }

    // The shadow-updating wrappers. Each forwards to its slot first and
    // writes the shadow only after the native call was actually issued; an
    // unresolved slot leaves the shadow untouched.

    #[inline]
    pub unsafe fn active_texture(&mut self, texture: GLenum) -> Result<(), Unsupported> {
        unsafe { self.registry.active_texture(texture) }?;
        match texture.checked_sub(TEXTURE0) {
            Some(unit) if (unit as usize) < self.shadow.texture_unit_count() => {
                self.shadow.set_active_texture_unit(unit as usize);
            }
            _ => log::debug!("active texture 0x{texture:x} is out of range, shadow unchanged"),
        }
        Ok(())
    }

    #[inline]
    pub unsafe fn bind_texture(
        &mut self,
        target: GLenum,
        texture: Option<Texture>,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .bind_texture(target, texture.map_or_else(|| 0, |v| v.get()))
        }?;
        let unit = self.shadow.active_texture_unit();
        match texture {
            // NOTE: unbinding names no target, so every target slot of the
            // unit is cleared.
            None => self.shadow.fill_texture_unit(unit, None),
            Some(texture) => match TextureTarget::from_gl(target) {
                Some(target) => self.shadow.set_texture(unit, target, texture),
                None => log::debug!("unrecognized texture target 0x{target:x}, shadow unchanged"),
            },
        }
        Ok(())
    }

    /// Direct-state-access bind. The native call carries no target, so the
    /// all-or-nothing rule from the null-unbind case applies in both
    /// directions: every target slot of `unit` gets the texture (or is
    /// cleared).
    #[inline]
    pub unsafe fn bind_texture_unit(
        &mut self,
        unit: GLuint,
        texture: Option<Texture>,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .bind_texture_unit(unit, texture.map_or_else(|| 0, |v| v.get()))
        }?;
        self.shadow.fill_texture_unit(unit as usize, texture);
        Ok(())
    }

    #[inline]
    pub unsafe fn bind_image_texture(
        &mut self,
        unit: GLuint,
        texture: Option<Texture>,
        level: GLint,
        layered: bool,
        layer: GLint,
        access: GLenum,
        format: GLenum,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry.bind_image_texture(
                unit,
                texture.map_or_else(|| 0, |v| v.get()),
                level,
                if layered { TRUE } else { FALSE },
                layer,
                access,
                format,
            )
        }?;
        let binding = texture.map(|texture| ImageBinding {
            texture,
            level,
            layered,
            layer,
            access,
            format,
        });
        self.shadow.set_image(unit as usize, binding);
        Ok(())
    }

    #[inline]
    pub unsafe fn bind_buffer(
        &mut self,
        target: GLenum,
        buffer: Option<Buffer>,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .bind_buffer(target, buffer.map_or_else(|| 0, |v| v.get()))
        }?;
        match BufferBindingPoint::from_gl(target) {
            Some(point) => self.shadow.set_buffer(point, buffer),
            // NOTE: the native call already went through; mirroring gl's own
            // permissive failure model, the shadow just skips the write.
            None => log::debug!("unrecognized buffer binding point 0x{target:x}, shadow unchanged"),
        }
        Ok(())
    }

    #[inline]
    pub unsafe fn bind_framebuffer(
        &mut self,
        target: GLenum,
        framebuffer: Option<Framebuffer>,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .bind_framebuffer(target, framebuffer.map_or_else(|| 0, |v| v.get()))
        }?;
        match target {
            FRAMEBUFFER => {
                self.shadow.set_read_framebuffer(framebuffer);
                self.shadow.set_draw_framebuffer(framebuffer);
            }
            READ_FRAMEBUFFER => self.shadow.set_read_framebuffer(framebuffer),
            DRAW_FRAMEBUFFER => self.shadow.set_draw_framebuffer(framebuffer),
            _ => log::debug!("unrecognized framebuffer target 0x{target:x}, shadow unchanged"),
        }
        Ok(())
    }

    #[inline]
    pub unsafe fn bind_renderbuffer(
        &mut self,
        target: GLenum,
        renderbuffer: Option<Renderbuffer>,
    ) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .bind_renderbuffer(target, renderbuffer.map_or_else(|| 0, |v| v.get()))
        }?;
        if target == RENDERBUFFER {
            self.shadow.set_renderbuffer(renderbuffer);
        } else {
            log::debug!("unrecognized renderbuffer target 0x{target:x}, shadow unchanged");
        }
        Ok(())
    }

    #[inline]
    pub unsafe fn use_program(&mut self, program: Option<Program>) -> Result<(), Unsupported> {
        unsafe {
            self.registry
                .use_program(program.map_or_else(|| 0, |v| v.get()))
        }?;
        self.shadow.set_program(program);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    static BIND_BUFFER_CALLS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn stub_enum(_cap: GLenum) {}

    unsafe extern "C" fn stub_uint(_name: GLuint) {}

    unsafe extern "C" fn stub_enum_uint(_target: GLenum, _name: GLuint) {}

    unsafe extern "C" fn stub_bind_buffer(_target: GLenum, _buffer: GLuint) {
        BIND_BUFFER_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn stub_bind_image_texture(
        _unit: GLuint,
        _texture: GLuint,
        _level: GLint,
        _layered: GLboolean,
        _layer: GLint,
        _access: GLenum,
        _format: GLenum,
    ) {
    }

    unsafe extern "C" fn stub_get_integerv(pname: GLenum, data: *mut GLint) {
        let value = match pname {
            MAX_COMBINED_TEXTURE_IMAGE_UNITS => 8,
            MAX_IMAGE_UNITS => 4,
            _ => 0,
        };
        unsafe { *data = value };
    }

    unsafe extern "C" fn stub_unreachable() {
        unreachable!("entry point not meant to be called from tests")
    }

    fn fake_get_proc_address(name: *const c_char) -> *mut c_void {
        match unsafe { CStr::from_ptr(name) }.to_str().unwrap() {
            "glGetIntegerv" => {
                stub_get_integerv as unsafe extern "C" fn(GLenum, *mut GLint) as *mut c_void
            }
            "glActiveTexture" => stub_enum as unsafe extern "C" fn(GLenum) as *mut c_void,
            "glUseProgram" => stub_uint as unsafe extern "C" fn(GLuint) as *mut c_void,
            "glBindBuffer" => {
                stub_bind_buffer as unsafe extern "C" fn(GLenum, GLuint) as *mut c_void
            }
            "glBindTexture" | "glBindFramebuffer" | "glBindRenderbuffer" | "glBindTextureUnit" => {
                stub_enum_uint as unsafe extern "C" fn(GLenum, GLuint) as *mut c_void
            }
            "glBindImageTexture" => {
                stub_bind_image_texture
                    as unsafe extern "C" fn(GLuint, GLuint, GLint, GLboolean, GLint, GLenum, GLenum)
                    as *mut c_void
            }
            _ => stub_unreachable as unsafe extern "C" fn() as *mut c_void,
        }
    }

    fn resolved_api(version: Version) -> Api {
        let mut api = Api::new();
        unsafe { api.resolve(version, fake_get_proc_address) };
        api
    }

    fn name(n: GLuint) -> Texture {
        Texture::new(n).unwrap()
    }

    #[test]
    fn test_resolution_follows_tiers() {
        let api = resolved_api(Version::V3_0);
        let resolved = api.registry().resolved_names();
        assert!(resolved.contains(&"glClear"));
        assert!(resolved.contains(&"glBindFramebuffer"));
        assert!(!resolved.contains(&"glBindTextureUnit"));
        assert!(!resolved.contains(&"glBindImageTexture"));
    }

    #[test]
    fn test_resolution_is_monotonic_and_additive() {
        let mut incremental = Api::new();
        unsafe {
            incremental.resolve(Version::V1_1, fake_get_proc_address);
            incremental.resolve(Version::V4_6, fake_get_proc_address);
        }
        let single_pass = resolved_api(Version::V4_6);
        assert_eq!(
            incremental.registry().resolved_names(),
            single_pass.registry().resolved_names()
        );
        assert_eq!(incremental.version(), Some(Version::V4_6));

        // a later lower pass neither unresolves anything nor lowers the version
        unsafe { incremental.resolve(Version::V1_0, fake_get_proc_address) };
        assert_eq!(
            incremental.registry().resolved_names(),
            single_pass.registry().resolved_names()
        );
        assert_eq!(incremental.version(), Some(Version::V4_6));
    }

    #[test]
    fn test_version_above_latest_tier_is_advisory() {
        let above = resolved_api(Version(5, 0));
        let latest = resolved_api(Version::LATEST);
        assert_eq!(
            above.registry().resolved_names(),
            latest.registry().resolved_names()
        );
        assert_eq!(above.version(), Some(Version(5, 0)));
    }

    #[test]
    fn test_unresolved_slot_is_a_typed_failure() {
        let mut api = resolved_api(Version::V1_5);
        let err = unsafe { api.bind_framebuffer(FRAMEBUFFER, Some(name(4))) }.unwrap_err();
        assert_eq!(err.name, "glBindFramebuffer");
        assert_eq!(err.since, Version::V3_0);
        // the failed call must not have touched the shadow
        assert_eq!(api.shadow().read_framebuffer(), None);
        assert_eq!(api.shadow().draw_framebuffer(), None);
    }

    #[test]
    fn test_texture_unit_array_sized_once() {
        let mut api = resolved_api(Version::V2_0);
        assert_eq!(api.shadow().texture_unit_count(), 8);
        assert_eq!(api.shadow().image_unit_count(), 0);

        // second pass: no resize, but the 4.2 tier brings image units along
        unsafe { api.resolve(Version::V4_6, fake_get_proc_address) };
        assert_eq!(api.shadow().texture_unit_count(), 8);
        assert_eq!(api.shadow().image_unit_count(), 4);
    }

    #[test]
    fn test_texture_unit_sizing_falls_back_to_platform_minimum() {
        let mut api = Api::new();
        unsafe {
            api.resolve(Version::V2_0, |name_ptr| {
                if unsafe { CStr::from_ptr(name_ptr) } == c"glGetIntegerv" {
                    std::ptr::null_mut()
                } else {
                    fake_get_proc_address(name_ptr)
                }
            });
        }
        assert_eq!(api.shadow().texture_unit_count(), 48);
    }

    #[test]
    fn test_bind_texture_uses_active_unit_at_call_time() {
        let mut api = resolved_api(Version::V4_6);
        unsafe {
            api.active_texture(TEXTURE0 + 2).unwrap();
            api.bind_texture(TEXTURE_2D, Some(name(5))).unwrap();
        }
        assert_eq!(api.shadow().active_texture_unit(), 2);
        assert_eq!(api.shadow().texture(2, TextureTarget::D2), Some(name(5)));
        assert_eq!(api.shadow().texture(0, TextureTarget::D2), None);
        // other targets on the same unit stay untouched
        assert_eq!(api.shadow().texture(2, TextureTarget::D3), None);
    }

    #[test]
    fn test_unbind_texture_clears_every_target_of_the_unit() {
        let mut api = resolved_api(Version::V4_6);
        unsafe {
            api.active_texture(TEXTURE0 + 1).unwrap();
            api.bind_texture(TEXTURE_2D, Some(name(5))).unwrap();
            api.bind_texture(TEXTURE_3D, Some(name(6))).unwrap();
            api.bind_texture(TEXTURE_2D, None).unwrap();
        }
        for target in TextureTarget::ALL {
            assert_eq!(api.shadow().texture(1, target), None);
        }
    }

    #[test]
    fn test_buffer_binding_points_are_independent() {
        let mut api = resolved_api(Version::V4_6);
        unsafe {
            api.bind_buffer(ARRAY_BUFFER, Some(name(7))).unwrap();
            api.bind_buffer(ELEMENT_ARRAY_BUFFER, Some(name(9))).unwrap();
        }
        assert_eq!(
            api.shadow().buffer(BufferBindingPoint::Array),
            Some(name(7))
        );
        assert_eq!(
            api.shadow().buffer(BufferBindingPoint::ElementArray),
            Some(name(9))
        );
    }

    #[test]
    fn test_unrecognized_buffer_binding_point_is_ignored_by_the_shadow() {
        let mut api = resolved_api(Version::V4_6);
        let calls_before = BIND_BUFFER_CALLS.load(Ordering::SeqCst);
        unsafe { api.bind_buffer(0xACDC, Some(name(3))).unwrap() };
        // the native call still went through
        assert!(BIND_BUFFER_CALLS.load(Ordering::SeqCst) > calls_before);
        for point in BufferBindingPoint::ALL {
            assert_eq!(api.shadow().buffer(point), None);
        }
    }

    #[test]
    fn test_combined_framebuffer_target_sets_both_slots() {
        let mut api = resolved_api(Version::V4_6);
        unsafe { api.bind_framebuffer(FRAMEBUFFER, Some(name(4))).unwrap() };
        assert_eq!(api.shadow().read_framebuffer(), Some(name(4)));
        assert_eq!(api.shadow().draw_framebuffer(), Some(name(4)));

        unsafe { api.bind_framebuffer(DRAW_FRAMEBUFFER, Some(name(6))).unwrap() };
        assert_eq!(api.shadow().read_framebuffer(), Some(name(4)));
        assert_eq!(api.shadow().draw_framebuffer(), Some(name(6)));
    }

    #[test]
    fn test_program_and_renderbuffer_scalars() {
        let mut api = resolved_api(Version::V4_6);
        unsafe {
            api.use_program(Some(name(11))).unwrap();
            api.bind_renderbuffer(RENDERBUFFER, Some(name(2))).unwrap();
        }
        assert_eq!(api.shadow().program(), Some(name(11)));
        assert_eq!(api.shadow().renderbuffer(), Some(name(2)));

        unsafe {
            api.use_program(None).unwrap();
            // bogus target: native proceeds, shadow keeps its record
            api.bind_renderbuffer(0x1234, Some(name(9))).unwrap();
        }
        assert_eq!(api.shadow().program(), None);
        assert_eq!(api.shadow().renderbuffer(), Some(name(2)));
    }

    #[test]
    fn test_bind_texture_unit_is_all_or_nothing() {
        let mut api = resolved_api(Version::V4_6);
        unsafe { api.bind_texture_unit(3, Some(name(12))).unwrap() };
        for target in TextureTarget::ALL {
            assert_eq!(api.shadow().texture(3, target), Some(name(12)));
        }

        unsafe { api.bind_texture_unit(3, None).unwrap() };
        for target in TextureTarget::ALL {
            assert_eq!(api.shadow().texture(3, target), None);
        }
    }

    #[test]
    fn test_bind_image_texture_records_the_image_unit() {
        let mut api = resolved_api(Version::V4_6);
        unsafe {
            api.bind_image_texture(1, Some(name(7)), 0, false, 0, READ_WRITE, RGBA8)
                .unwrap()
        };
        assert_eq!(
            api.shadow().image(1),
            Some(ImageBinding {
                texture: name(7),
                level: 0,
                layered: false,
                layer: 0,
                access: READ_WRITE,
                format: RGBA8,
            })
        );

        unsafe {
            api.bind_image_texture(1, None, 0, false, 0, READ_WRITE, RGBA8)
                .unwrap()
        };
        assert_eq!(api.shadow().image(1), None);

        // out-of-range unit: native proceeds, shadow skips the write
        unsafe {
            api.bind_image_texture(99, Some(name(8)), 0, false, 0, READ_ONLY, RGBA8)
                .unwrap()
        };
        assert_eq!(api.shadow().image(99), None);
    }
}
