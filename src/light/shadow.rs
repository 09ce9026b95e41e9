//! Per-Light Shadow Surface Cache
//!
//! One [`ShadowCacheEntry`] caches the GPU surfaces of a single shadow map
//! variant (the solid or the transparent geometry of one light). Surfaces
//! are keyed by `(kind, topology)` and created lazily on first access from
//! an explicit descriptor factory; a size change never resizes in place —
//! it destroys everything and lets the next access recreate at the new
//! size.

use rustc_hash::FxHashMap;

use crate::errors::{CacheError, Result};
use crate::tracked::Tracked;

/// What a shadow surface stores.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShadowSurfaceKind {
    /// Hardware depth (`Depth32Float`).
    Depth,
    /// Depth encoded into color channels, for samplers or platforms that
    /// cannot read hardware depth directly.
    EncodedDepth,
    /// Color, for transparent shadow tinting.
    Color,
}

/// Shape of a shadow surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShadowTopology {
    /// Single 2D map (spot/projector lights).
    Flat,
    /// Six-face cube map (point/omni lights).
    Cube,
}

/// A lazily created shadow surface: texture plus identity-tracked view.
pub struct ShadowSurface {
    pub texture: wgpu::Texture,
    pub view: Tracked<wgpu::TextureView>,
}

/// Cache of the shadow surfaces for one shadow variant of one light.
///
/// `size == 0` means unused: no surfaces exist and none may be created.
pub struct ShadowCacheEntry {
    size: u32,
    memory_consumption: u64,
    surfaces: FxHashMap<(ShadowSurfaceKind, ShadowTopology), ShadowSurface>,
}

impl ShadowCacheEntry {
    /// Creates an unused entry (`size == 0`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: 0,
            memory_consumption: 0,
            surfaces: FxHashMap::default(),
        }
    }

    /// Current shadow map edge length in pixels; 0 means unused.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// GPU memory held by the created surfaces, in bytes.
    #[must_use]
    pub fn memory_consumption(&self) -> u64 {
        self.memory_consumption
    }

    /// Change the shadow map size.
    ///
    /// A differing size destroys every existing surface; they are recreated
    /// lazily at the new size on next access. Unchanged size is a no-op.
    pub fn set_size(&mut self, size: u32) {
        if size == self.size {
            return;
        }
        if !self.surfaces.is_empty() {
            log::debug!(
                "ShadowCacheEntry: size {} -> {}, dropping {} surface(s)",
                self.size,
                size,
                self.surfaces.len()
            );
            for (_, surface) in self.surfaces.drain() {
                surface.texture.destroy();
            }
        }
        self.memory_consumption = 0;
        self.size = size;
    }

    /// Access a surface, creating it on first use.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] while the entry is unused
    /// (`size == 0`).
    pub fn surface(
        &mut self,
        device: &wgpu::Device,
        kind: ShadowSurfaceKind,
        topology: ShadowTopology,
    ) -> Result<&ShadowSurface> {
        if self.size == 0 {
            return Err(CacheError::InvalidArgument {
                context: "shadow cache accessed with size 0",
                value: 0.0,
            });
        }
        if !self.surfaces.contains_key(&(kind, topology)) {
            let surface = create_surface(device, kind, topology, self.size);
            self.memory_consumption += surface_bytes(kind, topology, self.size);
            self.surfaces.insert((kind, topology), surface);
        }
        Ok(&self.surfaces[&(kind, topology)])
    }

    /// Whether a surface of this kind/topology has been created.
    #[must_use]
    pub fn has_surface(&self, kind: ShadowSurfaceKind, topology: ShadowTopology) -> bool {
        self.surfaces.contains_key(&(kind, topology))
    }

    /// Number of surfaces currently created.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Move every created surface out, resetting the entry to unused.
    ///
    /// Used by the owning light when it is removed: the caller packs the
    /// textures into a reclaim request so destruction happens on the render
    /// thread.
    pub(crate) fn take_surfaces(&mut self) -> Vec<wgpu::Texture> {
        self.size = 0;
        self.memory_consumption = 0;
        self.surfaces
            .drain()
            .map(|(_, surface)| surface.texture)
            .collect()
    }
}

impl Default for ShadowCacheEntry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Surface factory ──────────────────────────────────────────────────────────

fn format_for(kind: ShadowSurfaceKind) -> wgpu::TextureFormat {
    match kind {
        ShadowSurfaceKind::Depth => wgpu::TextureFormat::Depth32Float,
        ShadowSurfaceKind::EncodedDepth | ShadowSurfaceKind::Color => {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

fn layers_for(topology: ShadowTopology) -> u32 {
    match topology {
        ShadowTopology::Flat => 1,
        ShadowTopology::Cube => 6,
    }
}

fn surface_bytes(kind: ShadowSurfaceKind, topology: ShadowTopology, size: u32) -> u64 {
    // Both Depth32Float and Rgba8Unorm are 4 bytes per texel.
    let _ = kind;
    u64::from(size) * u64::from(size) * 4 * u64::from(layers_for(topology))
}

/// Explicit descriptor factory: every `(kind, topology)` combination maps to
/// exactly one texture layout.
fn create_surface(
    device: &wgpu::Device,
    kind: ShadowSurfaceKind,
    topology: ShadowTopology,
    size: u32,
) -> ShadowSurface {
    let label = match (kind, topology) {
        (ShadowSurfaceKind::Depth, ShadowTopology::Flat) => "glint shadow depth 2d",
        (ShadowSurfaceKind::Depth, ShadowTopology::Cube) => "glint shadow depth cube",
        (ShadowSurfaceKind::EncodedDepth, ShadowTopology::Flat) => "glint shadow encoded 2d",
        (ShadowSurfaceKind::EncodedDepth, ShadowTopology::Cube) => "glint shadow encoded cube",
        (ShadowSurfaceKind::Color, ShadowTopology::Flat) => "glint shadow color 2d",
        (ShadowSurfaceKind::Color, ShadowTopology::Cube) => "glint shadow color cube",
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: layers_for(topology),
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: format_for(kind),
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(match topology {
            ShadowTopology::Flat => wgpu::TextureViewDimension::D2,
            ShadowTopology::Cube => wgpu::TextureViewDimension::Cube,
        }),
        ..Default::default()
    }));
    ShadowSurface { texture, view }
}
