//! Temporal Fader Tests
//!
//! Tests for:
//! - FadeTo idempotence and queued-slot replacement
//! - Blend convergence and large-dt catch-up equivalence
//! - Drop safety (slot reshuffling, reference balance)
//! - The reference blend scenario at fade rate 1.0

use std::sync::Arc;

use glint::{CacheError, TemporalFader};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn fader() -> TemporalFader<&'static str> {
    TemporalFader::new(1.0).expect("valid fade rate")
}

// ============================================================================
// fade_to Tests
// ============================================================================

#[test]
fn fade_to_starts_fade_with_full_blend() {
    let mut f = fader();
    let a = Arc::new("A");
    f.fade_to(a.clone());
    assert!(f.is_fading());
    assert!(approx(f.blend(), 1.0));
    assert!(Arc::ptr_eq(f.fading().unwrap(), &a));
}

#[test]
fn fade_to_is_idempotent() {
    let mut f = fader();
    let a = Arc::new("A");
    f.fade_to(a.clone());
    f.update(0.25);
    let blend = f.blend();
    f.fade_to(a.clone());
    assert!(
        approx(f.blend(), blend),
        "Repeated fade_to must not reset the blend"
    );
    assert!(f.queued().is_none(), "Repeated fade_to must not queue");
}

#[test]
fn fade_to_active_resource_is_noop() {
    let mut f = fader();
    let a = Arc::new("A");
    f.fade_to(a.clone());
    f.update(1.5); // A promoted to active
    assert!(!f.is_fading());
    f.fade_to(a.clone());
    assert!(!f.is_fading(), "Fading to the active resource is a no-op");
}

#[test]
fn queued_slot_is_last_request_wins() {
    let mut f = fader();
    let (a, b, c, d) = (Arc::new("A"), Arc::new("B"), Arc::new("C"), Arc::new("D"));
    f.fade_to(a);
    f.update(1.5);
    f.fade_to(b.clone());
    f.fade_to(c.clone());
    f.fade_to(d.clone());
    assert!(Arc::ptr_eq(f.fading().unwrap(), &b));
    assert!(
        Arc::ptr_eq(f.queued().unwrap(), &d),
        "Queued slot holds only the most recent request"
    );
    assert_eq!(Arc::strong_count(&c), 1, "Replaced request fully released");
}

// ============================================================================
// update Tests
// ============================================================================

#[test]
fn fade_converges_to_target() {
    let mut f = fader();
    let (a, b) = (Arc::new("A"), Arc::new("B"));
    f.fade_to(a.clone());
    f.update(2.0);
    f.fade_to(b.clone());
    for _ in 0..10 {
        f.update(0.11); // sums past 1/fade_rate
    }
    assert!(Arc::ptr_eq(f.active().unwrap(), &b));
    assert!(!f.is_fading());
    assert!(approx(f.blend(), 1.0), "Blend rests at 1.0 after the fade");
}

#[test]
fn large_dt_catches_up_through_queued() {
    // One large update spanning A→B→C must end identical to many small ones.
    let run = |steps: &[f32]| {
        let mut f = fader();
        let (a, b, c) = (Arc::new("A"), Arc::new("B"), Arc::new("C"));
        f.fade_to(a);
        f.update(1.5);
        f.fade_to(b);
        f.fade_to(c);
        for &dt in steps {
            f.update(dt);
        }
        (**f.active().unwrap(), f.is_fading(), f.blend())
    };

    let one_shot = run(&[2.5]);
    let stepped = run(&[0.5, 0.5, 0.5, 0.5, 0.5]);
    assert_eq!(one_shot.0, "C");
    assert_eq!(
        one_shot, stepped,
        "Large dt and equivalent small steps must agree"
    );
}

#[test]
fn blend_scenario_at_rate_one() {
    let mut f = fader();
    let (a, b) = (Arc::new("A"), Arc::new("B"));
    f.fade_to(a.clone());
    f.update(1.5);

    f.fade_to(b.clone());
    f.update(0.5);
    assert!(approx(f.blend(), 0.5), "blend ≈ 0.5, got {}", f.blend());
    assert!(Arc::ptr_eq(f.active().unwrap(), &a), "A still present");
    assert!(Arc::ptr_eq(f.fading().unwrap(), &b), "B fading in");

    f.update(0.5);
    assert!(approx(f.blend(), 1.0), "Blend resets to 1.0");
    assert!(Arc::ptr_eq(f.active().unwrap(), &b), "active == B");
    assert!(!f.is_fading(), "No fading slot left");
}

#[test]
fn update_without_fade_is_noop() {
    let mut f = fader();
    let a = Arc::new("A");
    f.fade_to(a);
    f.update(1.5);
    f.update(10.0);
    assert!(approx(f.blend(), 1.0));
    assert!(f.active().is_some());
}

// ============================================================================
// drop_resource / drop_all Tests
// ============================================================================

#[test]
fn drop_restores_reference_count() {
    let mut f = fader();
    let (a, b) = (Arc::new("A"), Arc::new("B"));
    f.fade_to(a.clone());
    f.update(1.5);
    f.fade_to(b.clone());
    assert_eq!(Arc::strong_count(&b), 2);
    f.drop_resource(&b).expect("b is held");
    assert_eq!(
        Arc::strong_count(&b),
        1,
        "Reference count returns to pre-insertion value"
    );
    assert!(!f.is_fading());
    assert!(Arc::ptr_eq(f.active().unwrap(), &a));
}

#[test]
fn drop_fading_promotes_queued() {
    let mut f = fader();
    let (a, b, c) = (Arc::new("A"), Arc::new("B"), Arc::new("C"));
    f.fade_to(a.clone());
    f.update(1.5);
    f.fade_to(b.clone());
    f.fade_to(c.clone());
    f.drop_resource(&b).expect("b is fading");
    assert!(
        Arc::ptr_eq(f.fading().unwrap(), &c),
        "Queued shifts into the fading slot"
    );
    assert!(f.queued().is_none());
}

#[test]
fn drop_active_shifts_everything_down() {
    let mut f = fader();
    let (a, b, c) = (Arc::new("A"), Arc::new("B"), Arc::new("C"));
    f.fade_to(a.clone());
    f.update(1.5);
    f.fade_to(b.clone());
    f.fade_to(c.clone());
    f.drop_resource(&a).expect("a is active");
    assert!(Arc::ptr_eq(f.active().unwrap(), &b));
    assert!(Arc::ptr_eq(f.fading().unwrap(), &c));
    assert!(f.queued().is_none());
    assert_eq!(Arc::strong_count(&a), 1);
}

#[test]
fn drop_unknown_resource_fails() {
    let mut f = fader();
    let (a, x) = (Arc::new("A"), Arc::new("X"));
    f.fade_to(a);
    let err = f.drop_resource(&x).unwrap_err();
    assert!(
        matches!(err, CacheError::InvalidReference(_)),
        "Dropping an unheld resource is a programming error, got {err:?}"
    );
}

#[test]
fn drop_all_clears_every_slot() {
    let mut f = fader();
    let (a, b, c) = (Arc::new("A"), Arc::new("B"), Arc::new("C"));
    f.fade_to(a.clone());
    f.update(1.5);
    f.fade_to(b.clone());
    f.fade_to(c.clone());
    f.drop_all();
    assert!(f.active().is_none());
    assert!(f.fading().is_none());
    assert!(f.queued().is_none());
    assert_eq!(Arc::strong_count(&a), 1);
    assert_eq!(Arc::strong_count(&b), 1);
    assert_eq!(Arc::strong_count(&c), 1);
}

// ============================================================================
// fade_out Tests
// ============================================================================

#[test]
fn fade_out_blends_active_away() {
    let mut f = fader();
    let a = Arc::new("A");
    f.fade_to(a.clone());
    f.update(1.0);
    assert!(Arc::ptr_eq(f.active().unwrap(), &a));

    f.fade_out();
    assert!(f.is_fading());
    assert!(f.fading().is_none(), "Fading toward nothing holds no resource");
    f.update(1.0);
    assert!(f.active().is_none(), "Fade-out ends with an empty fader");
    assert!(!f.is_fading());
    assert_eq!(Arc::strong_count(&a), 1, "The faded-out resource was released");
}

#[test]
fn fade_out_on_empty_fader_is_noop() {
    let mut f = fader();
    f.fade_out();
    assert!(!f.is_fading());
}

#[test]
fn fade_out_queues_behind_a_fade_in_flight() {
    let mut f = fader();
    let a = Arc::new("A");
    let b = Arc::new("B");
    f.fade_to(a.clone());
    f.update(1.0);
    f.fade_to(b.clone());
    f.fade_out();

    f.update(1.0); // A -> B completes, fade-out starts
    assert!(Arc::ptr_eq(f.active().unwrap(), &b));
    assert!(f.is_fading());
    f.update(1.0);
    assert!(f.active().is_none());
}

#[test]
fn fade_in_after_fade_out_restores_a_resource() {
    let mut f = fader();
    let a = Arc::new("A");
    let b = Arc::new("B");
    f.fade_to(a);
    f.update(1.0);
    f.fade_out();
    f.update(1.0);

    f.fade_to(b.clone());
    f.update(1.0);
    assert!(Arc::ptr_eq(f.active().unwrap(), &b));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn fade_rate_must_be_positive_and_finite() {
    assert!(TemporalFader::<()>::new(0.0).is_err());
    assert!(TemporalFader::<()>::new(-1.0).is_err());
    assert!(TemporalFader::<()>::new(f32::NAN).is_err());
    assert!(TemporalFader::<()>::new(f32::INFINITY).is_err());

    let mut f = fader();
    assert!(f.set_fade_rate(-0.5).is_err());
    f.set_fade_rate(4.0).expect("valid rate");
    let a = Arc::new("A");
    f.fade_to(a);
    f.update(0.25); // a full fade at rate 4
    assert!(!f.is_fading());
}

#[test]
fn rejected_fade_rate_reports_the_exact_value() {
    let err = TemporalFader::<()>::new(-0.5).unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument { .. }));
    assert!(
        err.to_string().contains("-0.5"),
        "Fractional rates must not be truncated in the report: {err}"
    );
}
