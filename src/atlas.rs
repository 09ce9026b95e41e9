//! GI Probe-Ray Atlas
//!
//! One large texture set packing per-ray intermediate GI results for many
//! probes, indexed by (probe slot, ray slot): row-major, `probes_per_line`
//! probes per row, each probe occupying `rays_per_probe` texels of the row.
//!
//! The key performance property: the atlas is resized and cleared **only on
//! structural change** (ray count or probe count), never per frame. An
//! unwritten ray must still read as sane data, so every channel clears to a
//! semantically neutral default — the distance channel to a large sentinel
//! meaning "no hit", normals to zero, material id to "none", diffuse to
//! opaque neutral.

use rustc_hash::FxHashMap;

use crate::errors::{CacheError, Result};
use crate::tracked::Tracked;

/// Minimum rays traced per probe.
pub const MIN_RAYS_PER_PROBE: u32 = 16;
/// Minimum probe count.
pub const MIN_PROBE_COUNT: u32 = 64;

/// Distance-channel clear value: far beyond any traced ray, reads as
/// "no hit".
pub const DISTANCE_NO_HIT: f64 = 10_000.0;
/// Material-channel clear value: no material.
pub const MATERIAL_NONE: f64 = 65_535.0;

/// One data channel of the ray atlas.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RayChannel {
    /// Hit distance along the ray.
    Distance,
    /// Hit surface normal.
    Normal,
    /// Hit surface albedo.
    Diffuse,
    /// Hit surface reflectivity/roughness.
    Reflectivity,
    /// Incoming light at the hit.
    Light,
    /// Hit material id.
    Material,
}

impl RayChannel {
    /// All channels, in attachment order.
    pub const ALL: [RayChannel; 6] = [
        RayChannel::Distance,
        RayChannel::Normal,
        RayChannel::Diffuse,
        RayChannel::Reflectivity,
        RayChannel::Light,
        RayChannel::Material,
    ];

    /// Texture format of this channel.
    #[must_use]
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            RayChannel::Distance => wgpu::TextureFormat::R16Float,
            RayChannel::Normal | RayChannel::Light => wgpu::TextureFormat::Rgba16Float,
            RayChannel::Diffuse | RayChannel::Reflectivity => wgpu::TextureFormat::Rgba8Unorm,
            RayChannel::Material => wgpu::TextureFormat::R16Uint,
        }
    }

    /// The semantically neutral clear value of this channel.
    #[must_use]
    pub fn clear_value(self) -> wgpu::Color {
        match self {
            RayChannel::Distance => wgpu::Color {
                r: DISTANCE_NO_HIT,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            },
            RayChannel::Normal | RayChannel::Reflectivity | RayChannel::Light => {
                wgpu::Color::TRANSPARENT
            }
            RayChannel::Diffuse => wgpu::Color::WHITE,
            RayChannel::Material => wgpu::Color {
                r: MATERIAL_NONE,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            },
        }
    }

    fn label(self) -> &'static str {
        match self {
            RayChannel::Distance => "glint ray atlas distance",
            RayChannel::Normal => "glint ray atlas normal",
            RayChannel::Diffuse => "glint ray atlas diffuse",
            RayChannel::Reflectivity => "glint ray atlas reflectivity",
            RayChannel::Light => "glint ray atlas light",
            RayChannel::Material => "glint ray atlas material",
        }
    }
}

/// The clear passes group channels the way the render passes consume them:
/// ray geometry channels together, lighting separately.
const CLEAR_GROUPS: [&[RayChannel]; 2] = [
    &[
        RayChannel::Distance,
        RayChannel::Normal,
        RayChannel::Diffuse,
        RayChannel::Reflectivity,
        RayChannel::Material,
    ],
    &[RayChannel::Light],
];

struct AtlasChannel {
    texture: wgpu::Texture,
    view: Tracked<wgpu::TextureView>,
}

/// Texture atlas of per-probe, per-ray intermediate GI results.
///
/// Render-thread only; reconfigured by the GI/probe placement system only on
/// quality or configuration change.
pub struct ProbeRayAtlas {
    rays_per_probe: u32,
    probes_per_line: u32,
    probe_count: u32,
    /// Bumped on every structural config change; [`Self::prepare`] rebuilds
    /// when the built generation lags behind.
    generation: u64,
    built_generation: u64,
    channels: FxHashMap<RayChannel, AtlasChannel>,
}

impl ProbeRayAtlas {
    /// Creates an unallocated atlas.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidArgument`] for `rays_per_probe < 16`,
    /// `probe_count < 64`, or `probes_per_line == 0`.
    pub fn new(rays_per_probe: u32, probes_per_line: u32, probe_count: u32) -> Result<Self> {
        validate_rays_per_probe(rays_per_probe)?;
        validate_probe_count(probe_count)?;
        if probes_per_line == 0 {
            return Err(CacheError::InvalidArgument {
                context: "probes per line must be at least 1",
                value: 0.0,
            });
        }
        Ok(Self {
            rays_per_probe,
            probes_per_line,
            probe_count,
            generation: 1,
            built_generation: 0,
            channels: FxHashMap::default(),
        })
    }

    /// Creates an unallocated atlas configured from [`CacheSettings`].
    pub fn from_settings(settings: &crate::settings::CacheSettings) -> Result<Self> {
        Self::new(
            settings.rays_per_probe,
            settings.probes_per_line,
            settings.probe_count,
        )
    }

    /// Change the per-probe ray count.
    ///
    /// Unchanged values trigger no reallocation. Invalid values leave prior
    /// state untouched.
    pub fn set_rays_per_probe(&mut self, rays_per_probe: u32) -> Result<()> {
        validate_rays_per_probe(rays_per_probe)?;
        if rays_per_probe != self.rays_per_probe {
            self.rays_per_probe = rays_per_probe;
            self.generation += 1;
        }
        Ok(())
    }

    /// Change the probe count.
    ///
    /// Unchanged values trigger no reallocation. Invalid values leave prior
    /// state untouched.
    pub fn set_probe_count(&mut self, probe_count: u32) -> Result<()> {
        validate_probe_count(probe_count)?;
        if probe_count != self.probe_count {
            self.probe_count = probe_count;
            self.generation += 1;
        }
        Ok(())
    }

    #[must_use]
    pub fn rays_per_probe(&self) -> u32 {
        self.rays_per_probe
    }

    #[must_use]
    pub fn probes_per_line(&self) -> u32 {
        self.probes_per_line
    }

    #[must_use]
    pub fn probe_count(&self) -> u32 {
        self.probe_count
    }

    /// Atlas width in texels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.probes_per_line * self.rays_per_probe
    }

    /// Atlas height in texels (one probe row per line).
    #[must_use]
    pub fn height(&self) -> u32 {
        self.probe_count.div_ceil(self.probes_per_line)
    }

    /// Structural generation counter. Changes exactly when a reallocation
    /// became necessary, so tests and callers can observe that no-op setter
    /// calls reallocate nothing.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the channel textures exist at the current configuration.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.built_generation == self.generation && !self.channels.is_empty()
    }

    /// Rebuild the atlas if the configuration changed since the last build.
    ///
    /// Reallocates every channel texture at the current dimensions and
    /// clears each to its neutral default in grouped clear passes. This is
    /// the only place a full-atlas clear happens.
    pub fn prepare(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        if self.is_allocated() {
            return;
        }
        let (width, height) = (self.width(), self.height());
        log::debug!(
            "ProbeRayAtlas: structural rebuild, {}x{} ({} probes x {} rays)",
            width,
            height,
            self.probe_count,
            self.rays_per_probe
        );

        for (_, channel) in self.channels.drain() {
            channel.texture.destroy();
        }
        for channel in RayChannel::ALL {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(channel.label()),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: channel.format(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            self.channels.insert(channel, AtlasChannel { texture, view });
        }

        for group in CLEAR_GROUPS {
            let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = group
                .iter()
                .map(|channel| {
                    Some(wgpu::RenderPassColorAttachment {
                        view: &*self.channels[channel].view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(channel.clear_value()),
                            store: wgpu::StoreOp::Store,
                        },
                    })
                })
                .collect();
            // The pass only exists for its load ops; dropping it ends it.
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glint ray atlas clear"),
                color_attachments: &attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.built_generation = self.generation;
    }

    /// A channel's texture, if allocated.
    #[must_use]
    pub fn texture(&self, channel: RayChannel) -> Option<&wgpu::Texture> {
        self.channels.get(&channel).map(|c| &c.texture)
    }

    /// A channel's identity-tracked view, if allocated.
    #[must_use]
    pub fn view(&self, channel: RayChannel) -> Option<&Tracked<wgpu::TextureView>> {
        self.channels.get(&channel).map(|c| &c.view)
    }
}

fn validate_rays_per_probe(rays_per_probe: u32) -> Result<()> {
    if rays_per_probe < MIN_RAYS_PER_PROBE {
        return Err(CacheError::InvalidArgument {
            context: "rays per probe below minimum of 16",
            value: f64::from(rays_per_probe),
        });
    }
    Ok(())
}

fn validate_probe_count(probe_count: u32) -> Result<()> {
    if probe_count < MIN_PROBE_COUNT {
        return Err(CacheError::InvalidArgument {
            context: "probe count below minimum of 64",
            value: f64::from(probe_count),
        });
    }
    Ok(())
}
