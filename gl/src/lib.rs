mod api;
pub mod consts;
mod libgl;
mod registry;
mod shadow;
pub mod types;
mod version;

pub use api::Api;
pub use libgl::LibGl;
pub use registry::{Registry, Unsupported};
pub use shadow::{
    Buffer, BufferBindingPoint, Framebuffer, ImageBinding, Program, Renderbuffer, Shadow, Texture,
    TextureTarget,
};
pub use version::Version;
