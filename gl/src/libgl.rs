use std::ffi::{CStr, c_char, c_void};
use std::ops::{Deref, DerefMut};

use dynlib::DynLib;

use crate::api::Api;
use crate::version::Version;

/// [`Api`] resolved against the system gl library. The handle keeps the
/// library mapped for as long as the entry points may be called.
pub struct LibGl {
    api: Api,
    _dynlib: DynLib,
}

impl Deref for LibGl {
    type Target = Api;

    fn deref(&self) -> &Self::Target {
        &self.api
    }
}

impl DerefMut for LibGl {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.api
    }
}

impl LibGl {
    /// Loads the system library and resolves everything `version` admits.
    ///
    /// A current context must be bound on this thread; resolution issues
    /// queries through it to size the binding shadow.
    pub unsafe fn load(version: Version) -> anyhow::Result<Self> {
        let dynlib = DynLib::open_any(&[c"libGL.so", c"libGL.so.1"])?;

        // NOTE: glX hands out context-dependent pointers that plain dlsym
        // cannot see; prefer it and fall back to dlsym for the rest.
        let glx_get_proc_address = dynlib
            .lookup::<unsafe extern "C" fn(*const c_char) -> *mut c_void>(c"glXGetProcAddressARB")
            .ok();

        let mut api = Api::new();
        let lookup = |name: *const c_char| -> *mut c_void {
            if let Some(get_proc_address) = glx_get_proc_address {
                let ptr = unsafe { get_proc_address(name) };
                if !ptr.is_null() {
                    return ptr;
                }
            }
            dynlib.lookup_ptr(unsafe { CStr::from_ptr(name) })
        };
        unsafe { api.resolve(version, lookup) };

        log::info!("loaded libGL, resolved for version {version}");

        Ok(Self {
            api,
            _dynlib: dynlib,
        })
    }
}
