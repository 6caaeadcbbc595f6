//! wgpu device, queue and the window's swapchain.

mod frame;
mod gpu;
mod init;
mod surface;

pub use frame::{GpuFrame, SurfaceErrorAction};
pub use gpu::Gpu;
pub use init::GpuInit;
