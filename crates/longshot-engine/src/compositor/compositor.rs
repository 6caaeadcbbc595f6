use std::collections::HashMap;

use crate::coords::{Color, NdcRect, Viewport};
use crate::render::composite::{CompositeLayer, CompositeRenderer};
use crate::render::{OffscreenTarget, RenderCtx, RenderTarget};

use super::{LayerDesc, LayerError, LayerId, LayerTable, ZIndex};

struct LayerSlot {
    target: OffscreenTarget,
    /// Samples `target`'s color view; rebuilt together with it.
    bind_group: wgpu::BindGroup,
}

/// Owns the layer table, one offscreen target per layer and the composite pass.
///
/// Targets are created lazily the first time a layer is drawn or composited,
/// and dropped whenever the layer's pixel buffer size changes. Buffer sizes
/// are capped at the device's `max_texture_dimension_2d`.
pub struct Compositor {
    table: LayerTable,
    slots: HashMap<LayerId, LayerSlot>,
    composite: CompositeRenderer,
}

impl Compositor {
    pub fn new(canvas: Viewport) -> Self {
        Self {
            table: LayerTable::new(canvas),
            slots: HashMap::new(),
            composite: CompositeRenderer::new(),
        }
    }

    #[inline]
    pub fn table(&self) -> &LayerTable {
        &self.table
    }

    pub fn add_layer(&mut self, desc: LayerDesc) -> Result<LayerId, LayerError> {
        let label = desc.label.clone();
        let id = self.table.add(desc)?;
        let (w, h) = self.table.pixel_size(id)?;
        log::info!("Compositor: layer '{}' created ({}x{} px)", label, w, h);
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<LayerDesc, LayerError> {
        let desc = self.table.remove(id)?;
        self.slots.remove(&id);
        Ok(desc)
    }

    pub fn set_layer_rect(&mut self, id: LayerId, rect: NdcRect) -> Result<(), LayerError> {
        if self.table.set_rect(id, rect)? {
            self.slots.remove(&id);
        }
        Ok(())
    }

    pub fn set_layer_supersample(&mut self, id: LayerId, supersample: f32) -> Result<(), LayerError> {
        if self.table.set_supersample(id, supersample)? {
            self.slots.remove(&id);
        }
        Ok(())
    }

    pub fn set_layer_z(&mut self, id: LayerId, z: ZIndex) -> Result<(), LayerError> {
        self.table.set_z(id, z)
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), LayerError> {
        self.table.set_visible(id, visible)
    }

    pub fn set_layer_transparent(&mut self, id: LayerId, transparent: bool) -> Result<(), LayerError> {
        self.table.set_transparent(id, transparent)
    }

    /// Re-derives layer pixel buffers for a new canvas size.
    pub fn resize(&mut self, viewport: Viewport) {
        for id in self.table.resize(viewport) {
            self.slots.remove(&id);
            if let Ok((w, h)) = self.table.pixel_size(id) {
                log::debug!("Compositor: layer {} resized to {}x{} px", id.raw(), w, h);
            }
        }
    }

    /// Pixel buffer size of a layer, supersampling included.
    pub fn layer_size(&self, id: LayerId) -> Result<(u32, u32), LayerError> {
        self.table.pixel_size(id)
    }

    /// Drawing access to a layer's color and depth views.
    pub fn layer_target<'a>(
        &'a mut self,
        device: &wgpu::Device,
        encoder: &'a mut wgpu::CommandEncoder,
        id: LayerId,
    ) -> Result<RenderTarget<'a>, LayerError> {
        self.ensure_slot(device, id)?;
        let slot = self.slots.get(&id).ok_or(LayerError::UnknownLayer(id))?;
        Ok(slot.target.render_target(encoder))
    }

    /// Clears a layer's color and depth.
    ///
    /// Opaque layers clear with alpha forced to 1. Transparent layers keep
    /// `color`'s alpha and store it premultiplied.
    pub fn clear_layer(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        id: LayerId,
        color: Color,
    ) -> Result<(), LayerError> {
        let transparent = self
            .table
            .get(id)
            .map(|d| d.transparent)
            .ok_or(LayerError::UnknownLayer(id))?;
        self.ensure_slot(device, id)?;
        let slot = self.slots.get(&id).ok_or(LayerError::UnknownLayer(id))?;
        slot.target.clear(encoder, layer_clear_color(transparent, color).to_wgpu());
        Ok(())
    }

    /// Draws every visible layer, back to front, onto `target`.
    pub fn composite(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let visible: Vec<(LayerId, NdcRect, bool)> = self
            .table
            .iter_in_paint_order()
            .filter(|(_, d)| d.visible)
            .map(|(id, d)| (id, d.rect, !d.transparent))
            .collect();

        for &(id, _, _) in &visible {
            if let Err(e) = self.ensure_slot(ctx.device, id) {
                log::warn!("Compositor: skipping layer: {e}");
            }
        }

        let slots = &self.slots;
        let layers: Vec<CompositeLayer<'_>> = visible
            .iter()
            .filter_map(|&(id, rect, opaque)| {
                slots.get(&id).map(|slot| CompositeLayer {
                    rect,
                    opaque,
                    bind_group: &slot.bind_group,
                })
            })
            .collect();

        self.composite.render(ctx, target, &layers);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn sync_texture_limit(&mut self, device: &wgpu::Device) {
        let max = device.limits().max_texture_dimension_2d;
        if max == self.table.max_dimension() {
            return;
        }
        log::debug!("Compositor: layer size cap {} px", max);
        for id in self.table.set_max_dimension(max) {
            self.slots.remove(&id);
        }
    }

    fn ensure_slot(&mut self, device: &wgpu::Device, id: LayerId) -> Result<(), LayerError> {
        self.sync_texture_limit(device);
        let (w, h) = self.table.pixel_size(id)?;
        if self.slots.get(&id).is_some_and(|s| s.target.size() == (w, h)) {
            return Ok(());
        }

        let label = self
            .table
            .get(id)
            .map(|d| d.label.clone())
            .ok_or(LayerError::UnknownLayer(id))?;

        let target = OffscreenTarget::new(device, w, h, &label);
        let bind_group = self.composite.layer_bind_group(device, target.color_view(), &label);
        log::debug!("Compositor: allocated {}x{} target for layer '{}'", w, h, label);

        self.slots.insert(id, LayerSlot { target, bind_group });
        Ok(())
    }
}

/// Opaque layers clear with alpha forced to 1. Transparent layers keep the
/// alpha and store the colour premultiplied, matching the composite blend.
fn layer_clear_color(transparent: bool, color: Color) -> Color {
    if transparent {
        let [r, g, b, a] = color.premultiplied();
        Color::new(r, g, b, a)
    } else {
        Color { a: 1.0, ..color }
    }
}
