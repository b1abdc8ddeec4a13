use std::time::{Duration, Instant};

use super::*;
use crate::render::surface::{Layer, Visibility};

fn verses() -> Arc<Displayable> {
    song(&[&["Be thou my vision"], &["Riches I heed not"]])
}

#[test]
fn blacked_surface_holds_content_until_unblacked() {
    let mut c = coordinator();
    let now = Instant::now();
    let p = projector(&mut c);
    let v = preview(&mut c);
    let item = verses();
    c.set_displayable(Some(Arc::clone(&item)), 0);
    c.flush(now);

    c.surface_mut(p).unwrap().set_blacked(true, now);
    c.set_displayable(Some(Arc::clone(&item)), 1);
    c.flush(now);

    // The preview follows along; the blacked projector keeps the old text.
    assert_eq!(shown(&c, v), vec!["Riches I heed not"]);
    assert_eq!(shown(&c, p), vec!["Be thou my vision"]);
    assert!(c.surface(p).unwrap().has_pending());

    c.surface_mut(p).unwrap().set_blacked(false, now);
    assert_eq!(shown(&c, p), vec!["Riches I heed not"]);
}

#[test]
fn cleared_surfaces_pick_up_the_latest_of_several_changes() {
    let mut c = coordinator();
    let now = Instant::now();
    let p = projector(&mut c);
    let item = song(&[&["One"], &["Two"], &["Three"]]);
    c.set_displayable(Some(Arc::clone(&item)), 0);
    c.flush(now);

    c.set_cleared(true, now);
    for section in 1..3 {
        c.set_displayable(Some(Arc::clone(&item)), section);
        c.flush(now);
    }
    c.set_cleared(false, now);
    assert_eq!(shown(&c, p), vec!["Three"]);
}

#[test]
fn black_then_clear_then_restore_is_three_transitions() {
    let mut c = coordinator();
    let t0 = Instant::now();
    let p = projector(&mut c);
    let v = preview(&mut c);
    c.set_displayable(Some(verses()), 0);
    c.flush(t0);
    let before_p = c.surface(p).unwrap().composite(t0);
    let before_v = c.surface(v).unwrap().composite(t0);

    c.set_blacked(true, t0);
    c.set_cleared(true, t0 + Duration::from_millis(50));
    c.restore(t0 + Duration::from_millis(100));

    let later = t0 + Duration::from_secs(5);
    c.tick(later);
    assert!(!c.is_animating(later));
    for (id, before) in [(p, before_p), (v, before_v)] {
        let surface = c.surface(id).unwrap();
        assert_eq!(surface.transition_count(), 3);
        assert_eq!(surface.visibility(), Visibility::Normal);
        assert_eq!(surface.composite(later), before);
    }
}

#[test]
fn blacked_and_cleared_looks_like_blacked() {
    let t0 = Instant::now();
    let settled = t0 + Duration::from_secs(5);

    let mut both = coordinator();
    let a = projector(&mut both);
    both.set_displayable(Some(verses()), 0);
    both.flush(t0);
    both.set_cleared(true, t0);
    both.set_blacked(true, t0);

    let mut black = coordinator();
    let b = projector(&mut black);
    black.set_displayable(Some(verses()), 0);
    black.flush(t0);
    black.set_blacked(true, t0);

    let composite = |c: &RenderCoordinator, id| c.surface(id).unwrap().composite(settled);
    assert_eq!(composite(&both, a), composite(&black, b));
    assert_eq!(composite(&both, a), vec![(Layer::Black, 1.0)]);
}

#[test]
fn preview_snaps_while_projector_fades() {
    let mut c = coordinator();
    let t0 = Instant::now();
    let p = projector(&mut c);
    let v = preview(&mut c);
    c.set_displayable(Some(verses()), 0);
    c.flush(t0);
    c.set_blacked(true, t0);

    let soon = t0 + Duration::from_millis(100);
    assert_eq!(c.surface(v).unwrap().composite(soon), vec![(Layer::Black, 1.0)]);
    assert!(c.surface(p).unwrap().composite(soon).len() > 1);
    assert!(c.is_animating(soon));
}

#[test]
fn toggles_are_per_surface() {
    let mut c = coordinator();
    let now = Instant::now();
    let p = projector(&mut c);
    let v = preview(&mut c);
    c.surface_mut(v).unwrap().set_cleared(true, now);
    assert!(c.surface(v).unwrap().is_cleared());
    assert!(!c.surface(p).unwrap().is_cleared());
}

#[test]
fn logo_and_notice_sit_above_black() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
        .save(&logo)
        .unwrap();
    let config = DisplayConfig {
        logo_image: Some(logo),
        ..DisplayConfig::default()
    };
    let mut c = coordinator_with(config, RecordingPlayer::default());
    let now = Instant::now();
    let v = preview(&mut c);
    assert!(c.surface(v).unwrap().logo_image().is_some());

    c.set_displayable(Some(verses()), 0);
    c.flush(now);
    c.set_blacked(true, now);
    c.set_logo(true, now);
    c.set_notice(Some("Car 42 please move".to_string()));

    let surface = c.surface(v).unwrap();
    assert_eq!(
        surface.composite(now),
        vec![(Layer::Black, 1.0), (Layer::Logo, 1.0), (Layer::Notice, 1.0)]
    );
    assert_eq!(surface.notice(), Some("Car 42 please move"));

    c.set_notice(None);
    assert!(!c.surface(v).unwrap().children().contains(&Layer::Notice));
}

#[test]
fn missing_logo_is_not_fatal() {
    let config = DisplayConfig {
        logo_image: Some("/no/such/logo.png".into()),
        ..DisplayConfig::default()
    };
    let mut c = coordinator_with(config, RecordingPlayer::default());
    let v = preview(&mut c);
    assert!(c.surface(v).unwrap().logo_image().is_none());
}
