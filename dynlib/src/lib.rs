use std::ffi::{CStr, c_void};
use std::mem::transmute_copy;
use std::ptr::NonNull;

use anyhow::anyhow;
use libc::{dlclose, dlerror, dlopen, dlsym};

fn take_dlerror() -> Option<anyhow::Error> {
    let err = unsafe { dlerror() };
    if err.is_null() {
        return None;
    }
    let msg = unsafe { CStr::from_ptr(err) };
    Some(anyhow!(
        msg.to_str().unwrap_or("invalid dlerror string").to_string()
    ))
}

pub struct DynLib(NonNull<c_void>);

impl DynLib {
    pub fn open(filename: &CStr) -> anyhow::Result<Self> {
        let handle = unsafe { dlopen(filename.as_ptr(), libc::RTLD_LAZY) };
        match NonNull::new(handle) {
            Some(handle) => Ok(Self(handle)),
            None => Err(take_dlerror()
                .unwrap_or_else(|| anyhow!("could not open {}", filename.to_string_lossy()))),
        }
    }

    /// Opens the first of `filenames` that can be loaded. Sonames differ
    /// across distributions, thus the fallback chain.
    pub fn open_any(filenames: &[&CStr]) -> anyhow::Result<Self> {
        let mut last_err = anyhow!("no filenames given");
        for filename in filenames {
            match Self::open(filename) {
                Ok(lib) => return Ok(lib),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    /// Looks up a symbol and returns its address, null if it is not exported.
    /// dlerror state is consumed either way.
    pub fn lookup_ptr(&self, name: &CStr) -> *mut c_void {
        unsafe {
            _ = dlerror();
            let addr = dlsym(self.0.as_ptr(), name.as_ptr());
            if !dlerror().is_null() {
                return std::ptr::null_mut();
            }
            addr
        }
    }

    pub fn lookup<F: Sized>(&self, name: &CStr) -> anyhow::Result<F> {
        unsafe {
            _ = dlerror();

            let addr = dlsym(self.0.as_ptr(), name.as_ptr());

            if let Some(err) = take_dlerror() {
                Err(err)
            } else {
                Ok(transmute_copy(&addr))
            }
        }
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        unsafe {
            dlclose(self.0.as_ptr());
        }
    }
}
