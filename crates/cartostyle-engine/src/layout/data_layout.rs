use serde::Deserialize;

use crate::error::{ModelError, Result};

/// Widest style texture produced by default.
///
/// 1024 stays well inside the 2D dimension limit of every backend wgpu
/// targets (including WebGL2 downlevel limits).
pub const DEFAULT_MAX_WIDTH: u32 = 1024;

/// Layout tuning, usually deserialized as part of a layer config.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Maximum texels per row. Values below 1 are treated as 1.
    pub max_width: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { max_width: DEFAULT_MAX_WIDTH }
    }
}

impl LayoutConfig {
    #[inline]
    pub const fn new(max_width: u32) -> Self {
        Self { max_width }
    }

    /// Computes the texture layout for `data_length` features.
    ///
    /// - `0` features still produce a `1 x 1` layout (zero-sized textures are invalid)
    /// - up to `max_width` features fit a single row
    /// - beyond that, rows of `max_width` texels are stacked
    ///
    /// The row count saturates at `u32::MAX`. Past that point the layout
    /// holds fewer cells than features, and [`DataLayout::pack`] rejects the
    /// data with a contract violation.
    pub fn compute(&self, data_length: usize) -> DataLayout {
        let max_width = self.max_width.max(1) as usize;

        let (width, height) = if data_length == 0 {
            (1, 1)
        } else if data_length <= max_width {
            (data_length, 1)
        } else {
            (max_width, data_length.div_ceil(max_width))
        };

        let height = u32::try_from(height).unwrap_or_else(|_| {
            log::warn!("{data_length} features need {height} texture rows; clamping to u32::MAX");
            u32::MAX
        });
        DataLayout::from_counts(width as u32, height)
    }
}

/// Computes a layout with the default `max_width` of [`DEFAULT_MAX_WIDTH`].
#[inline]
pub fn compute_layout(data_length: usize) -> DataLayout {
    LayoutConfig::default().compute(data_length)
}

/// Texture dimensions and the UV constants shaders use to sample them.
///
/// Invariants:
/// - `width_count`, `height_count` >= 1
/// - `*_step == 1 / *_count`, `*_start == *_step / 2`
///
/// A layout is a value: when the feature count changes, compute a new one
/// rather than editing fields, since every UV derived from it changes too.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DataLayout {
    width_count: u32,
    height_count: u32,
    width_step: f32,
    width_start: f32,
    height_step: f32,
    height_start: f32,
}

impl Default for DataLayout {
    /// Single 1024-wide row, used before any data has been seen.
    fn default() -> Self {
        Self::from_counts(DEFAULT_MAX_WIDTH, 1)
    }
}

impl DataLayout {
    fn from_counts(width_count: u32, height_count: u32) -> Self {
        let width_count = width_count.max(1);
        let height_count = height_count.max(1);
        let width_step = 1.0 / width_count as f32;
        let height_step = 1.0 / height_count as f32;
        Self {
            width_count,
            height_count,
            width_step,
            width_start: width_step / 2.0,
            height_step,
            height_start: height_step / 2.0,
        }
    }

    #[inline]
    pub fn width_count(&self) -> u32 {
        self.width_count
    }

    #[inline]
    pub fn height_count(&self) -> u32 {
        self.height_count
    }

    #[inline]
    pub fn width_step(&self) -> f32 {
        self.width_step
    }

    #[inline]
    pub fn width_start(&self) -> f32 {
        self.width_start
    }

    #[inline]
    pub fn height_step(&self) -> f32 {
        self.height_step
    }

    #[inline]
    pub fn height_start(&self) -> f32 {
        self.height_start
    }

    /// Total number of texels.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width_count as usize * self.height_count as usize
    }

    /// Returns `true` if both layouts describe textures of the same size.
    #[inline]
    pub fn same_dimensions(&self, other: &DataLayout) -> bool {
        self.width_count == other.width_count && self.height_count == other.height_count
    }

    /// UV of the texel center holding feature `index`.
    pub fn uv(&self, index: usize) -> [f32; 2] {
        let w = self.width_count as usize;
        let col = (index % w) as f32;
        let row = (index / w) as f32;
        [
            self.width_start + col * self.width_step,
            self.height_start + row * self.height_step,
        ]
    }

    /// Pads per-feature values to one value per texel, row-major.
    ///
    /// Unused texels are filled with `T::default()`. Fails if `values`
    /// does not fit, which means the layout is stale.
    pub fn pack<T: Copy + Default>(&self, values: &[T]) -> Result<Vec<T>> {
        let cells = self.cell_count();
        if values.len() > cells {
            return Err(ModelError::contract(format!(
                "{} style values do not fit a {}x{} layout",
                values.len(),
                self.width_count,
                self.height_count
            )));
        }

        let mut out = Vec::with_capacity(cells);
        out.extend_from_slice(values);
        out.resize(cells, T::default());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(len: usize, layout: &DataLayout, max_width: u32) {
        assert!(layout.cell_count() >= len, "len {len}: {layout:?}");
        assert!(layout.width_count() <= max_width.max(1));
        assert_eq!(layout.width_step(), 1.0 / layout.width_count() as f32);
        assert_eq!(layout.width_start(), layout.width_step() / 2.0);
        assert_eq!(layout.height_step(), 1.0 / layout.height_count() as f32);
        assert_eq!(layout.height_start(), layout.height_step() / 2.0);
    }

    // ── compute ───────────────────────────────────────────────────────────

    #[test]
    fn empty_data_is_one_texel() {
        let l = compute_layout(0);
        assert_eq!(l.width_count(), 1);
        assert_eq!(l.height_count(), 1);
        assert_eq!(l.width_start(), 0.5);
        assert_eq!(l.height_start(), 0.5);
    }

    #[test]
    fn full_row_stays_single_row() {
        let l = compute_layout(1024);
        assert_eq!(l.width_count(), 1024);
        assert_eq!(l.height_count(), 1);
    }

    #[test]
    fn one_past_full_row_adds_a_row() {
        let l = compute_layout(1025);
        assert_eq!(l.width_count(), 1024);
        assert_eq!(l.height_count(), 2);
    }

    #[test]
    fn short_data_uses_exact_width() {
        let l = compute_layout(7);
        assert_eq!(l.width_count(), 7);
        assert_eq!(l.height_count(), 1);
    }

    #[test]
    fn invariants_hold_across_lengths() {
        for len in [0, 1, 2, 3, 511, 1023, 1024, 1025, 2048, 2049, 100_000] {
            assert_invariants(len, &compute_layout(len), DEFAULT_MAX_WIDTH);
        }
    }

    #[test]
    fn custom_max_width_is_respected() {
        let cfg = LayoutConfig::new(16);
        for len in [0, 15, 16, 17, 33, 1000] {
            assert_invariants(len, &cfg.compute(len), 16);
        }
        let l = cfg.compute(33);
        assert_eq!((l.width_count(), l.height_count()), (16, 3));
    }

    #[test]
    fn zero_max_width_behaves_as_one() {
        let l = LayoutConfig::new(0).compute(3);
        assert_eq!((l.width_count(), l.height_count()), (1, 3));
    }

    #[test]
    fn default_layout_is_single_1024_row() {
        let l = DataLayout::default();
        assert_eq!(l.width_count(), 1024);
        assert_eq!(l.height_count(), 1);
        assert_eq!(l.width_start(), 1.0 / 2048.0);
        assert_eq!(l.height_step(), 1.0);
        assert_eq!(l.height_start(), 0.5);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn row_count_saturates_and_pack_refuses() {
        let len = u32::MAX as usize + 10;
        let layout = LayoutConfig::new(1).compute(len);
        assert_eq!((layout.width_count(), layout.height_count()), (1, u32::MAX));
        assert!(layout.cell_count() < len);

        let tiny = LayoutConfig::new(1).compute(2);
        assert!(tiny.pack(&[0.0f32; 3]).unwrap_err().is_contract_violation());
    }

    // ── uv ────────────────────────────────────────────────────────────────

    #[test]
    fn uv_hits_texel_centers() {
        let l = LayoutConfig::new(4).compute(8);
        assert_eq!(l.uv(0), [0.125, 0.25]);
        assert_eq!(l.uv(3), [0.875, 0.25]);
        // Second row.
        assert_eq!(l.uv(5), [0.375, 0.75]);
    }

    // ── pack ──────────────────────────────────────────────────────────────

    #[test]
    fn pack_pads_to_cell_count() {
        let l = LayoutConfig::new(4).compute(5);
        let packed = l.pack(&[1.0f32, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(packed, vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn pack_rejects_overflow() {
        let l = compute_layout(2);
        let err = l.pack(&[[0u8; 4]; 3]).unwrap_err();
        assert!(err.is_contract_violation());
    }
}
