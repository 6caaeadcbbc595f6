//! Swapchain option selection. Pure functions over the surface's
//! advertised capabilities so they can be tested without a device.

const SRGB_FORMATS: [wgpu::TextureFormat; 2] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

pub(crate) fn pick_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let srgb = prefer_srgb
        .then(|| SRGB_FORMATS.into_iter().find(|f| formats.contains(f)))
        .flatten();
    srgb.or_else(|| formats.first().copied())
}

pub(crate) fn pick_present_mode(
    modes: &[wgpu::PresentMode],
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    // The Auto* modes are resolved by wgpu itself.
    let auto = matches!(
        requested,
        wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
    );
    if auto || modes.contains(&requested) {
        requested
    } else {
        log::warn!("present mode {requested:?} unsupported; using Fifo");
        wgpu::PresentMode::Fifo
    }
}

pub(crate) fn pick_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    match requested {
        Some(m) if modes.contains(&m) => m,
        _ => modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
    }
}
