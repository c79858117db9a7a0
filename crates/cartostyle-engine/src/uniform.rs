//! Insertion-ordered uniform maps and their uniform-buffer encoding.

use indexmap::IndexMap;

/// A single uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// WGSL uniform address-space alignment in bytes.
    fn align(&self) -> usize {
        match self {
            UniformValue::Float(_) => 4,
            UniformValue::Vec2(_) => 8,
            UniformValue::Vec4(_) | UniformValue::Mat4(_) => 16,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            UniformValue::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            UniformValue::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            UniformValue::Mat4(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[[f32; 4]; 4]> for UniformValue {
    fn from(v: [[f32; 4]; 4]) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Named uniforms in declaration order.
///
/// Order matters: [`UniformMap::to_bytes`] lays values out in insertion
/// order, so the shader's uniform struct must declare fields in the same
/// order. Re-inserting an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformMap {
    values: IndexMap<&'static str, UniformValue>,
}

impl UniformMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<UniformValue>) {
        self.values.insert(name, value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: &'static str, value: impl Into<UniformValue>) -> Self {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// Appends `other`, keeping existing positions for repeated names.
    pub fn extend(&mut self, other: UniformMap) {
        self.values.extend(other.values);
    }

    /// Encodes the map using WGSL uniform-buffer layout rules.
    ///
    /// Each value is aligned to its own alignment and the total size is
    /// rounded up to 16 bytes, matching a WGSL struct declared with the same
    /// fields in the same order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for value in self.values.values() {
            out.resize(out.len().next_multiple_of(value.align()), 0);
            value.write(&mut out);
        }
        out.resize(out.len().next_multiple_of(16).max(16), 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn empty_map_still_occupies_one_slot() {
        assert_eq!(UniformMap::new().to_bytes().len(), 16);
    }

    #[test]
    fn scalars_pack_tightly_before_vec2() {
        let m = UniformMap::new()
            .with("a", 1.0f32)
            .with("b", 2.0f32)
            .with("c", [3.0f32, 4.0]);
        assert_eq!(floats(&m.to_bytes()), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn vec4_is_aligned_to_16_bytes() {
        let m = UniformMap::new().with("a", 1.0f32).with("v", [2.0f32, 3.0, 4.0, 5.0]);
        assert_eq!(
            floats(&m.to_bytes()),
            vec![1.0, 0.0, 0.0, 0.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut m = UniformMap::new().with("a", 1.0f32).with("b", 2.0f32);
        m.insert("a", 9.0f32);
        assert_eq!(m.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(&UniformValue::Float(9.0)));
    }

    #[test]
    fn mat4_is_column_major_and_64_bytes() {
        let mut id = [[0.0f32; 4]; 4];
        for (i, col) in id.iter_mut().enumerate() {
            col[i] = 1.0;
        }
        let m = UniformMap::new().with("m", id);
        let bytes = m.to_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(floats(&bytes)[5], 1.0);
    }
}
