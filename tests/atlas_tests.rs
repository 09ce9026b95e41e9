//! Probe Ray Atlas Tests
//!
//! Tests for:
//! - Dimension derivation (width/height from ray and probe counts)
//! - Construction and setter validation (atomic failure)
//! - Structural-generation stability for no-op setter calls
//! - Channel format and neutral clear-value table

use glint::atlas::{DISTANCE_NO_HIT, MATERIAL_NONE};
use glint::{CacheError, ProbeRayAtlas, RayChannel};

// ============================================================================
// Dimension Tests
// ============================================================================

#[test]
fn reference_dimensions() {
    // 64 rays, 8 probes per line, 8192 probes => 512 x 1024
    let atlas = ProbeRayAtlas::new(64, 8, 8192).expect("valid config");
    assert_eq!(atlas.width(), 512);
    assert_eq!(atlas.height(), 1024);
}

#[test]
fn height_rounds_up_for_partial_rows() {
    let atlas = ProbeRayAtlas::new(16, 8, 65).expect("valid config");
    assert_eq!(atlas.height(), 9, "A partial probe row still needs a line");
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn construction_rejects_out_of_range_values() {
    assert!(matches!(
        ProbeRayAtlas::new(15, 8, 8192),
        Err(CacheError::InvalidArgument { .. })
    ));
    assert!(matches!(
        ProbeRayAtlas::new(64, 8, 63),
        Err(CacheError::InvalidArgument { .. })
    ));
    assert!(matches!(
        ProbeRayAtlas::new(64, 0, 8192),
        Err(CacheError::InvalidArgument { .. })
    ));
}

#[test]
fn failed_setter_leaves_state_untouched() {
    let mut atlas = ProbeRayAtlas::new(64, 8, 8192).expect("valid config");
    let generation = atlas.generation();

    assert!(atlas.set_rays_per_probe(8).is_err());
    assert_eq!(atlas.rays_per_probe(), 64, "Config changes are atomic");
    assert_eq!(atlas.generation(), generation);

    assert!(atlas.set_probe_count(32).is_err());
    assert_eq!(atlas.probe_count(), 8192);
    assert_eq!(atlas.generation(), generation);
}

// ============================================================================
// Reallocation Tests
// ============================================================================

#[test]
fn noop_setters_trigger_no_reallocation() {
    let mut atlas = ProbeRayAtlas::new(64, 8, 8192).expect("valid config");
    let generation = atlas.generation();

    atlas.set_probe_count(8192).expect("unchanged");
    atlas.set_rays_per_probe(64).expect("unchanged");
    assert_eq!(
        atlas.generation(),
        generation,
        "Unchanged values must not schedule a rebuild"
    );
}

#[test]
fn config_changes_bump_the_generation() {
    let mut atlas = ProbeRayAtlas::new(64, 8, 8192).expect("valid config");
    let g0 = atlas.generation();

    atlas.set_rays_per_probe(128).expect("valid");
    assert_eq!(atlas.generation(), g0 + 1);
    assert_eq!(atlas.width(), 1024);

    atlas.set_probe_count(4096).expect("valid");
    assert_eq!(atlas.generation(), g0 + 2);
    assert_eq!(atlas.height(), 512);
}

#[test]
fn atlas_starts_unallocated() {
    let atlas = ProbeRayAtlas::new(64, 8, 8192).expect("valid config");
    assert!(!atlas.is_allocated());
    assert!(atlas.texture(RayChannel::Distance).is_none());
    assert!(atlas.view(RayChannel::Light).is_none());
}

// ============================================================================
// Channel Table Tests
// ============================================================================

#[test]
fn channel_formats_match_their_payload() {
    assert_eq!(
        RayChannel::Distance.format(),
        wgpu::TextureFormat::R16Float
    );
    assert_eq!(
        RayChannel::Normal.format(),
        wgpu::TextureFormat::Rgba16Float
    );
    assert_eq!(RayChannel::Diffuse.format(), wgpu::TextureFormat::Rgba8Unorm);
    assert_eq!(RayChannel::Material.format(), wgpu::TextureFormat::R16Uint);
}

#[test]
fn neutral_clears_read_as_no_data() {
    // An unwritten ray must read as "no hit, no material, opaque neutral".
    let distance = RayChannel::Distance.clear_value();
    assert!((distance.r - DISTANCE_NO_HIT).abs() < f64::EPSILON);

    let material = RayChannel::Material.clear_value();
    assert!((material.r - MATERIAL_NONE).abs() < f64::EPSILON);

    let normal = RayChannel::Normal.clear_value();
    assert!(normal.r.abs() < f64::EPSILON && normal.g.abs() < f64::EPSILON);

    let diffuse = RayChannel::Diffuse.clear_value();
    assert!((diffuse.r - 1.0).abs() < f64::EPSILON);
    assert!((diffuse.a - 1.0).abs() < f64::EPSILON);
}
