/// How the range asks for a GPU.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub backends: wgpu::Backends,
    /// The range scene is fill-heavy with two full 3D passes per frame.
    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB swapchain format when one exists. Layer textures are
    /// sRGB too, so blending happens in linear space either way.
    pub prefer_srgb: bool,

    /// Used when the surface supports it, otherwise `Fifo`.
    pub present_mode: wgpu::PresentMode,
    /// Falls back to the surface's first alpha mode when unsupported.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub max_frame_latency: u32,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: None,
            max_frame_latency: 2,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}
