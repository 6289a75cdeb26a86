//! Per-sub-surface binding state: which chunks feed the shading stage.
//!
//! The fragment stage always reads all [`MAX_CHUNKS`] slots, so unused slots
//! carry a neutral placeholder instead of being left undefined.

use glam::Vec3;

/// Upper bound of chunks a single sub-surface can be bound to.
pub const MAX_CHUNKS: usize = 8;

/// Opaque reference to a chunk texture owned by the level manager.
///
/// Handle `0` is reserved for the 1×1 neutral placeholder texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const PLACEHOLDER: Self = Self(0);

    #[inline]
    pub fn is_placeholder(self) -> bool {
        self == Self::PLACEHOLDER
    }
}

/// A chunk texture together with the world-space origin of its cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBinding {
    pub texture: TextureHandle,
    pub origin: Vec3,
}

impl ChunkBinding {
    pub const PLACEHOLDER: Self = Self {
        texture: TextureHandle::PLACEHOLDER,
        origin: Vec3::ZERO,
    };

    pub fn new(texture: TextureHandle, origin: Vec3) -> Self {
        Self { texture, origin }
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}

/// The uniform values of one sub-surface.
///
/// Only constructed wholesale; there is no way to patch a single slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindingState {
    slots: [ChunkBinding; MAX_CHUNKS],
    valid_count: u32,
    chunk_size: f32,
}

impl Default for BindingState {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl BindingState {
    /// All slots neutral, nothing valid, unit chunk size.
    pub const fn placeholder() -> Self {
        Self {
            slots: [ChunkBinding::PLACEHOLDER; MAX_CHUNKS],
            valid_count: 0,
            chunk_size: 1.0,
        }
    }

    /// Builds a state from chunks in provider order. Anything past
    /// [`MAX_CHUNKS`] is dropped; the remaining slots are placeholders.
    pub fn from_chunks(chunks: &[ChunkBinding], chunk_size: f32) -> Self {
        let valid = chunks.len().min(MAX_CHUNKS);
        let mut slots = [ChunkBinding::PLACEHOLDER; MAX_CHUNKS];
        slots[..valid].copy_from_slice(&chunks[..valid]);

        Self {
            slots,
            valid_count: valid as u32,
            chunk_size,
        }
    }

    #[inline]
    pub fn valid_count(&self) -> u32 {
        self.valid_count
    }

    /// World-space edge length of a chunk at the level this state was built for.
    #[inline]
    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    #[inline]
    pub fn slots(&self) -> &[ChunkBinding; MAX_CHUNKS] {
        &self.slots
    }

    /// The populated prefix of the slots.
    #[inline]
    pub fn valid_slots(&self) -> &[ChunkBinding] {
        &self.slots[..self.valid_count as usize]
    }

    pub fn textures(&self) -> [TextureHandle; MAX_CHUNKS] {
        self.slots.map(|s| s.texture)
    }

    pub fn origins(&self) -> [Vec3; MAX_CHUNKS] {
        self.slots.map(|s| s.origin)
    }

    /// Nothing bound; the sub-surface renders fully transparent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.valid_count == 0
    }

    /// Index of the first valid slot whose chunk cube contains `world`.
    ///
    /// Mirrors the lookup the fragment stage performs per fragment.
    pub fn slot_containing(&self, world: Vec3) -> Option<usize> {
        self.valid_slots().iter().position(|s| {
            let rel = world - s.origin;
            rel.cmpge(Vec3::ZERO).all() && rel.cmplt(Vec3::splat(self.chunk_size)).all()
        })
    }

    pub fn to_uniform(&self) -> BindingUniformStd140 {
        let mut origins = [[0.0f32; 4]; MAX_CHUNKS];
        for (dst, slot) in origins.iter_mut().zip(self.slots.iter()) {
            *dst = slot.origin.extend(0.0).to_array();
        }

        let mut textures = [[0u32; 4]; MAX_CHUNKS / 4];
        for (i, slot) in self.slots.iter().enumerate() {
            textures[i / 4][i % 4] = slot.texture.0;
        }

        BindingUniformStd140 {
            origins,
            textures,
            chunk_size: self.chunk_size,
            valid_count: self.valid_count,
            _pad: [0; 2],
        }
    }
}

/// std140 image of a [`BindingState`].
/// Must match the `Binding` block of the slice shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BindingUniformStd140 {
    /// Chunk origins in world space, `w` unused.
    pub origins: [[f32; 4]; MAX_CHUNKS],  // 128 B
    /// Texture handles packed four per vec4<u32>.
    pub textures: [[u32; 4]; MAX_CHUNKS / 4], // +32 -> 160
    pub chunk_size: f32,                  // +4
    pub valid_count: u32,                 // +4
    pub _pad: [u32; 2],                   // +8 -> 176
}

const _: [(); 176] = [(); core::mem::size_of::<BindingUniformStd140>()];

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: u32, x: f32) -> ChunkBinding {
        ChunkBinding::new(TextureHandle(id), Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn placeholder_state_is_neutral() {
        let state = BindingState::placeholder();
        assert_eq!(state.valid_count(), 0);
        assert_eq!(state.chunk_size(), 1.0);
        assert!(state.slots().iter().all(ChunkBinding::is_placeholder));
        assert!(state.is_empty());
    }

    #[test]
    fn from_chunks_fills_prefix_and_pads() {
        let chunks = [chunk(7, 0.0), chunk(9, 0.5), chunk(3, 1.0)];
        let state = BindingState::from_chunks(&chunks, 0.25);

        assert_eq!(state.valid_count(), 3);
        assert_eq!(state.valid_slots(), &chunks);
        assert!(state.slots()[3..].iter().all(ChunkBinding::is_placeholder));
        assert_eq!(state.chunk_size(), 0.25);
    }

    #[test]
    fn from_chunks_truncates_past_eight() {
        let chunks: Vec<_> = (1..=11).map(|i| chunk(i, i as f32)).collect();
        let state = BindingState::from_chunks(&chunks, 1.0);

        assert_eq!(state.valid_count(), MAX_CHUNKS as u32);
        assert_eq!(state.valid_slots(), &chunks[..MAX_CHUNKS]);
    }

    #[test]
    fn slot_lookup_uses_half_open_cubes() {
        let chunks = [chunk(1, 0.0), chunk(2, 1.0)];
        let state = BindingState::from_chunks(&chunks, 1.0);

        assert_eq!(state.slot_containing(Vec3::new(0.5, 0.5, 0.5)), Some(0));
        assert_eq!(state.slot_containing(Vec3::new(1.0, 0.5, 0.5)), Some(1));
        assert_eq!(state.slot_containing(Vec3::new(2.5, 0.5, 0.5)), None);
        assert_eq!(BindingState::placeholder().slot_containing(Vec3::ZERO), None);
    }

    #[test]
    fn uniform_packs_handles_and_origins() {
        let chunks: Vec<_> = (1..=6).map(|i| chunk(i * 10, i as f32)).collect();
        let u = BindingState::from_chunks(&chunks, 0.5).to_uniform();

        assert_eq!(u.valid_count, 6);
        assert_eq!(u.chunk_size, 0.5);
        assert_eq!(u.textures, [[10, 20, 30, 40], [50, 60, 0, 0]]);
        assert_eq!(u.origins[5], [6.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.origins[7], [0.0; 4]);
        assert_eq!(bytemuck::bytes_of(&u).len(), 176);
    }
}
