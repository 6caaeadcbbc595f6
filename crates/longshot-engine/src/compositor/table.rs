use crate::coords::{NdcRect, Rect, Viewport};

use super::key::SortKey;
use super::layer::supersample_is_valid;
use super::{LayerDesc, LayerError, LayerId, ZIndex};

/// `max_texture_dimension_2d` under `wgpu::Limits::default()`.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

#[derive(Debug)]
struct LayerEntry {
    id: LayerId,
    desc: LayerDesc,
    pixel_size: (u32, u32),
}

impl LayerEntry {
    #[inline]
    fn key(&self) -> SortKey {
        SortKey::new(self.desc.z, self.id.raw())
    }
}

/// CPU side of the compositor: layer placement, paint order and pixel buffer sizes.
///
/// Every layer's pixel buffer is derived from the canvas size, the layer's NDC
/// rect and its supersample factor, so a canvas resize rescales all of them
/// proportionally. Each axis is capped at the device's texture limit.
#[derive(Debug)]
pub struct LayerTable {
    canvas: Viewport,
    max_dimension: u32,
    entries: Vec<LayerEntry>,
    /// Indices into `entries`, sorted by `SortKey`. Rebuilt on every structural change.
    paint_order: Vec<usize>,
    next_id: u32,
}

impl LayerTable {
    pub fn new(canvas: Viewport) -> Self {
        Self {
            canvas,
            max_dimension: DEFAULT_MAX_DIMENSION,
            entries: Vec::new(),
            paint_order: Vec::new(),
            next_id: 0,
        }
    }

    #[inline]
    pub fn canvas(&self) -> Viewport {
        self.canvas
    }

    /// Largest pixel buffer side a layer may get.
    #[inline]
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Changes the texture size cap and returns the layers whose buffer size changed.
    pub fn set_max_dimension(&mut self, max_dimension: u32) -> Vec<LayerId> {
        self.max_dimension = max_dimension.max(1);
        self.refresh_all()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn add(&mut self, desc: LayerDesc) -> Result<LayerId, LayerError> {
        validate_rect(desc.rect)?;
        validate_supersample(desc.supersample)?;

        let raw = self.next_id;
        self.next_id = raw.checked_add(1).ok_or(LayerError::HandlesExhausted)?;
        let id = LayerId::from_raw(raw);

        let pixel_size = layer_pixel_size(&desc, self.canvas, self.max_dimension);
        log::debug!(
            "LayerTable: added layer {} '{}' ({}x{} px)",
            id.raw(),
            desc.label,
            pixel_size.0,
            pixel_size.1
        );
        self.entries.push(LayerEntry { id, desc, pixel_size });
        self.rebuild_paint_order();
        Ok(id)
    }

    pub fn remove(&mut self, id: LayerId) -> Result<LayerDesc, LayerError> {
        let index = self.index_of(id).ok_or(LayerError::UnknownLayer(id))?;
        let entry = self.entries.remove(index);
        self.rebuild_paint_order();
        Ok(entry.desc)
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerDesc> {
        self.index_of(id).map(|i| &self.entries[i].desc)
    }

    /// Moves or resizes a layer. Returns `true` if its pixel buffer size changed.
    pub fn set_rect(&mut self, id: LayerId, rect: NdcRect) -> Result<bool, LayerError> {
        validate_rect(rect)?;
        let (canvas, max) = (self.canvas, self.max_dimension);
        let entry = self.entry_mut(id)?;
        entry.desc.rect = rect;
        Ok(entry.refresh_pixel_size(canvas, max))
    }

    /// Returns `true` if the layer's pixel buffer size changed.
    pub fn set_supersample(&mut self, id: LayerId, supersample: f32) -> Result<bool, LayerError> {
        validate_supersample(supersample)?;
        let (canvas, max) = (self.canvas, self.max_dimension);
        let entry = self.entry_mut(id)?;
        entry.desc.supersample = supersample;
        Ok(entry.refresh_pixel_size(canvas, max))
    }

    pub fn set_z(&mut self, id: LayerId, z: ZIndex) -> Result<(), LayerError> {
        self.entry_mut(id)?.desc.z = z;
        self.rebuild_paint_order();
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), LayerError> {
        self.entry_mut(id)?.desc.visible = visible;
        Ok(())
    }

    pub fn set_transparent(&mut self, id: LayerId, transparent: bool) -> Result<(), LayerError> {
        self.entry_mut(id)?.desc.transparent = transparent;
        Ok(())
    }

    /// Size of the layer's pixel buffer, never smaller than 1×1.
    pub fn pixel_size(&self, id: LayerId) -> Result<(u32, u32), LayerError> {
        self.index_of(id)
            .map(|i| self.entries[i].pixel_size)
            .ok_or(LayerError::UnknownLayer(id))
    }

    /// The layer's on-screen rectangle in canvas pixels (before supersampling).
    pub fn pixel_rect(&self, id: LayerId) -> Result<Rect, LayerError> {
        let desc = self.get(id).ok_or(LayerError::UnknownLayer(id))?;
        Ok(desc.rect.to_pixel_rect(self.canvas))
    }

    /// Re-derives every layer's pixel buffer for a new canvas size.
    ///
    /// Returns the layers whose buffer size changed. A zero-area canvas (a
    /// minimised window) is ignored and the previous sizes are kept.
    pub fn resize(&mut self, canvas: Viewport) -> Vec<LayerId> {
        if !canvas.is_valid() {
            log::debug!(
                "LayerTable: ignoring degenerate canvas {}x{}",
                canvas.width,
                canvas.height
            );
            return Vec::new();
        }

        self.canvas = canvas;
        self.refresh_all()
    }

    /// All layers, hidden ones included, back to front.
    pub fn iter_in_paint_order(&self) -> impl Iterator<Item = (LayerId, &LayerDesc)> {
        self.paint_order.iter().map(|&i| {
            let e = &self.entries[i];
            (e.id, &e.desc)
        })
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn refresh_all(&mut self) -> Vec<LayerId> {
        let (canvas, max) = (self.canvas, self.max_dimension);
        let mut changed = Vec::new();
        for entry in &mut self.entries {
            if entry.refresh_pixel_size(canvas, max) {
                log::debug!(
                    "LayerTable: layer {} '{}' resized to {}x{} px",
                    entry.id.raw(),
                    entry.desc.label,
                    entry.pixel_size.0,
                    entry.pixel_size.1
                );
                changed.push(entry.id);
            }
        }
        changed
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: LayerId) -> Result<&mut LayerEntry, LayerError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LayerError::UnknownLayer(id))
    }

    fn rebuild_paint_order(&mut self) {
        self.paint_order.clear();
        self.paint_order.extend(0..self.entries.len());
        let entries = &self.entries;
        self.paint_order.sort_by_key(|&i| entries[i].key());
    }
}

impl LayerEntry {
    /// Returns `true` if the size changed.
    fn refresh_pixel_size(&mut self, canvas: Viewport, max_dimension: u32) -> bool {
        let size = layer_pixel_size(&self.desc, canvas, max_dimension);
        let changed = size != self.pixel_size;
        self.pixel_size = size;
        changed
    }
}

fn layer_pixel_size(desc: &LayerDesc, canvas: Viewport, max_dimension: u32) -> (u32, u32) {
    let (size, clamped) = compute_pixel_size(desc.rect, desc.supersample, canvas, max_dimension);
    if clamped {
        log::warn!(
            "LayerTable: layer '{}' capped at {}x{} px (texture limit {})",
            desc.label,
            size.0,
            size.1,
            max_dimension
        );
    }
    size
}

/// `clamp(round(size / 2 · canvas · supersample), 1, max_dimension)` on each
/// axis, and whether the upper cap applied.
fn compute_pixel_size(
    rect: NdcRect,
    supersample: f32,
    canvas: Viewport,
    max_dimension: u32,
) -> ((u32, u32), bool) {
    let max = max_dimension.max(1);
    let axis = |ndc_extent: f32, canvas_px: f32| -> (u32, bool) {
        let px = (ndc_extent * 0.5 * canvas_px * supersample).round();
        if !px.is_finite() || px < 1.0 {
            (1, false)
        } else if px > max as f32 {
            (max, true)
        } else {
            (px as u32, false)
        }
    };
    let (w, cw) = axis(rect.size.x, canvas.width);
    let (h, ch) = axis(rect.size.y, canvas.height);
    ((w, h), cw || ch)
}

fn validate_rect(rect: NdcRect) -> Result<(), LayerError> {
    if rect.is_valid() { Ok(()) } else { Err(LayerError::InvalidRect(rect)) }
}

fn validate_supersample(ss: f32) -> Result<(), LayerError> {
    if supersample_is_valid(ss) { Ok(()) } else { Err(LayerError::InvalidSupersample(ss)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    const CANVAS: Viewport = Viewport::new(1280.0, 720.0);

    fn table() -> LayerTable {
        LayerTable::new(CANVAS)
    }

    fn scope_rect() -> NdcRect {
        // Square in pixels on a 16:9 canvas: 0.5 NDC-height units tall.
        NdcRect::from_center(Vec2::zero(), Vec2::new(0.5 * 720.0 / 1280.0, 0.5))
    }

    // ── add / remove ──────────────────────────────────────────────────────

    #[test]
    fn add_then_get() {
        let mut t = table();
        let id = t.add(LayerDesc::new("world", NdcRect::FULL)).unwrap();
        assert_eq!(t.get(id).map(|d| d.label.as_str()), Some("world"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut t = table();
        let a = t.add(LayerDesc::default()).unwrap();
        t.remove(a).unwrap();
        let b = t.add(LayerDesc::default()).unwrap();
        assert_ne!(a, b);
        assert!(t.get(a).is_none());
        assert_eq!(t.pixel_size(a), Err(LayerError::UnknownLayer(a)));
    }

    #[test]
    fn exhausted_handles_are_an_error() {
        let mut t = table();
        t.next_id = u32::MAX - 1;
        let last = t.add(LayerDesc::default()).unwrap();
        assert_eq!(last.raw(), u32::MAX - 1);
        assert_eq!(t.add(LayerDesc::default()), Err(LayerError::HandlesExhausted));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn remove_unknown_layer_fails() {
        let mut t = table();
        let id = t.add(LayerDesc::default()).unwrap();
        t.remove(id).unwrap();
        assert_eq!(t.remove(id), Err(LayerError::UnknownLayer(id)));
    }

    #[test]
    fn invalid_rect_is_rejected() {
        let mut t = table();
        let bad = NdcRect::new(0.0, 0.0, -1.0, 1.0);
        assert_eq!(t.add(LayerDesc::new("bad", bad)), Err(LayerError::InvalidRect(bad)));
        assert!(t.is_empty());
    }

    #[test]
    fn supersample_outside_range_is_rejected() {
        let mut t = table();
        let desc = LayerDesc::default().with_supersample(8.0);
        assert_eq!(t.add(desc), Err(LayerError::InvalidSupersample(8.0)));
        let desc = LayerDesc::default().with_supersample(f32::NAN);
        assert!(matches!(t.add(desc), Err(LayerError::InvalidSupersample(_))));
    }

    // ── pixel sizes ───────────────────────────────────────────────────────

    #[test]
    fn full_layer_matches_canvas() {
        let mut t = table();
        let id = t.add(LayerDesc::default()).unwrap();
        assert_eq!(t.pixel_size(id), Ok((1280, 720)));
    }

    #[test]
    fn supersample_scales_buffer() {
        let mut t = table();
        let id = t.add(LayerDesc::new("scope", scope_rect()).with_supersample(2.0)).unwrap();
        assert_eq!(t.pixel_size(id), Ok((360, 360)));
    }

    #[test]
    fn tiny_layer_is_at_least_one_pixel() {
        let mut t = table();
        let id = t.add(LayerDesc::new("dot", NdcRect::new(0.0, 0.0, 1e-6, 1e-6))).unwrap();
        assert_eq!(t.pixel_size(id), Ok((1, 1)));
    }

    #[test]
    fn buffer_is_capped_at_texture_limit() {
        let mut t = LayerTable::new(Viewport::new(2560.0, 1440.0));
        let id = t.add(LayerDesc::default().with_supersample(4.0)).unwrap();
        assert_eq!(t.pixel_size(id), Ok((DEFAULT_MAX_DIMENSION, 5760)));
    }

    #[test]
    fn raising_the_limit_uncaps_buffers() {
        let mut t = LayerTable::new(Viewport::new(2560.0, 1440.0));
        let big = t.add(LayerDesc::default().with_supersample(4.0)).unwrap();
        let small = t.add(LayerDesc::default()).unwrap();

        assert_eq!(t.set_max_dimension(16384), vec![big]);
        assert_eq!(t.pixel_size(big), Ok((10240, 5760)));

        let changed = t.set_max_dimension(2048);
        assert_eq!(changed, vec![big, small]);
        assert_eq!(t.pixel_size(small), Ok((2048, 1440)));
    }

    #[test]
    fn zero_limit_still_leaves_one_pixel() {
        let mut t = table();
        let id = t.add(LayerDesc::default()).unwrap();
        t.set_max_dimension(0);
        assert_eq!(t.max_dimension(), 1);
        assert_eq!(t.pixel_size(id), Ok((1, 1)));
    }

    #[test]
    fn pixel_rect_uses_canvas_pixels() {
        let mut t = table();
        let id = t.add(LayerDesc::new("scope", scope_rect()).with_supersample(2.0)).unwrap();
        let r = t.pixel_rect(id).unwrap();
        assert!((r.size.x - 180.0).abs() < 1e-3);
        assert!((r.size.y - 180.0).abs() < 1e-3);
        assert!((r.center().x - 640.0).abs() < 1e-3);
        assert!((r.center().y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn set_rect_reports_size_change() {
        let mut t = table();
        let id = t.add(LayerDesc::default()).unwrap();
        // Same size, different position.
        assert_eq!(t.set_rect(id, NdcRect::new(-0.5, -1.0, 2.0, 2.0)), Ok(false));
        assert_eq!(t.set_rect(id, NdcRect::new(-1.0, -1.0, 1.0, 1.0)), Ok(true));
        assert_eq!(t.pixel_size(id), Ok((640, 360)));
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_rescales_proportionally() {
        let mut t = table();
        let world = t.add(LayerDesc::default()).unwrap();
        let half = t.add(LayerDesc::new("half", NdcRect::new(-1.0, -1.0, 1.0, 2.0))).unwrap();

        let changed = t.resize(Viewport::new(1920.0, 1080.0));
        assert_eq!(changed, vec![world, half]);
        assert_eq!(t.pixel_size(world), Ok((1920, 1080)));
        assert_eq!(t.pixel_size(half), Ok((960, 1080)));
    }

    #[test]
    fn resize_to_same_canvas_changes_nothing() {
        let mut t = table();
        t.add(LayerDesc::default()).unwrap();
        assert!(t.resize(CANVAS).is_empty());
    }

    #[test]
    fn zero_canvas_is_ignored() {
        let mut t = table();
        let id = t.add(LayerDesc::default()).unwrap();
        assert!(t.resize(Viewport::new(0.0, 0.0)).is_empty());
        assert_eq!(t.canvas(), CANVAS);
        assert_eq!(t.pixel_size(id), Ok((1280, 720)));
    }

    // ── paint order ───────────────────────────────────────────────────────

    #[test]
    fn paint_order_is_z_then_insertion() {
        let mut t = table();
        let scope = t.add(LayerDesc::new("scope", scope_rect()).with_z(10)).unwrap();
        let world = t.add(LayerDesc::new("world", NdcRect::FULL).with_z(0)).unwrap();
        let hud = t.add(LayerDesc::new("hud", NdcRect::FULL).with_z(10)).unwrap();

        let order: Vec<LayerId> = t.iter_in_paint_order().map(|(id, _)| id).collect();
        assert_eq!(order, vec![world, scope, hud]);
    }

    #[test]
    fn set_z_reorders() {
        let mut t = table();
        let a = t.add(LayerDesc::default()).unwrap();
        let b = t.add(LayerDesc::default()).unwrap();
        t.set_z(a, ZIndex(5)).unwrap();

        let order: Vec<LayerId> = t.iter_in_paint_order().map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn hidden_layers_stay_in_order() {
        let mut t = table();
        let a = t.add(LayerDesc::default()).unwrap();
        t.set_visible(a, false).unwrap();
        let (id, desc) = t.iter_in_paint_order().next().unwrap();
        assert_eq!(id, a);
        assert!(!desc.visible);
    }
}
