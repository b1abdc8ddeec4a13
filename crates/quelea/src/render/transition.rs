use std::time::{Duration, Instant};

use eframe::egui::Color32;

/// Fade for the black and logo overlays on surfaces that animate.
pub const OVERLAY_FADE: Duration = Duration::from_millis(500);
/// Text colour changes crossfade over this, independent of the background fade.
pub const TEXT_COLOR_FADE: Duration = Duration::from_millis(300);

/// Ease-in-out cubic
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn progress(start: Instant, duration: Duration, now: Instant) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(start).as_secs_f32();
    (elapsed / duration.as_secs_f32()).min(1.0)
}

/// An opacity animating between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

impl Fade {
    pub fn new(from: f32, to: f32, duration: Duration, now: Instant) -> Self {
        Self {
            from,
            to,
            start: now,
            duration,
        }
    }

    /// Already at `value`, nothing to animate.
    pub fn settled(value: f32, now: Instant) -> Self {
        Self::new(value, value, Duration::ZERO, now)
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let t = ease_in_out(progress(self.start, self.duration, now));
        self.from + (self.to - self.from) * t
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn started_at(&self) -> Instant {
        self.start
    }

    pub fn is_complete_at(&self, now: Instant) -> bool {
        progress(self.start, self.duration, now) >= 1.0
    }

    /// Head for `to` from wherever this fade currently is. An in-flight fade
    /// toward the same target is left alone.
    pub fn retarget(&self, to: f32, duration: Duration, now: Instant) -> Self {
        if self.to == to {
            return *self;
        }
        Self::new(self.value_at(now), to, duration, now)
    }
}

/// A colour animating between two values, componentwise in sRGB space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFade {
    from: Color32,
    to: Color32,
    start: Instant,
    duration: Duration,
}

impl ColorFade {
    pub fn settled(color: Color32, now: Instant) -> Self {
        Self {
            from: color,
            to: color,
            start: now,
            duration: Duration::ZERO,
        }
    }

    pub fn value_at(&self, now: Instant) -> Color32 {
        let t = ease_in_out(progress(self.start, self.duration, now));
        lerp_color(self.from, self.to, t)
    }

    pub fn target(&self) -> Color32 {
        self.to
    }

    /// Start fading toward `to` from the colour currently shown.
    pub fn retarget(&self, to: Color32, duration: Duration, now: Instant) -> Self {
        if self.to == to {
            return *self;
        }
        Self {
            from: self.value_at(now),
            to,
            start: now,
            duration,
        }
    }
}

pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_premultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(2.0), 1.0);
    }

    #[test]
    fn test_fade_runs_from_start_to_target() {
        let t0 = Instant::now();
        let fade = Fade::new(1.0, 0.0, Duration::from_secs(1), t0);
        assert_eq!(fade.value_at(t0), 1.0);
        assert_eq!(fade.value_at(t0 + Duration::from_millis(500)), 0.5);
        assert_eq!(fade.value_at(t0 + Duration::from_secs(2)), 0.0);
        assert!(!fade.is_complete_at(t0 + Duration::from_millis(999)));
        assert!(fade.is_complete_at(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let t0 = Instant::now();
        let fade = Fade::new(0.0, 1.0, Duration::ZERO, t0);
        assert_eq!(fade.value_at(t0), 1.0);
        assert!(fade.is_complete_at(t0));
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let t0 = Instant::now();
        let fade = Fade::new(0.0, 1.0, Duration::from_secs(1), t0);
        let mid = t0 + Duration::from_millis(500);
        let back = fade.retarget(0.0, Duration::from_secs(1), mid);
        assert_eq!(back.value_at(mid), 0.5);
        assert_eq!(back.started_at(), mid);
        assert_eq!(back.value_at(mid + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_retarget_same_target_keeps_fade() {
        let t0 = Instant::now();
        let fade = Fade::new(0.0, 1.0, Duration::from_secs(1), t0);
        let again = fade.retarget(1.0, Duration::from_secs(1), t0 + Duration::from_millis(300));
        assert_eq!(again, fade);
    }

    #[test]
    fn test_color_fade_midpoint() {
        let t0 = Instant::now();
        let fade = ColorFade::settled(Color32::BLACK, t0).retarget(
            Color32::WHITE,
            Duration::from_secs(1),
            t0,
        );
        let mid = fade.value_at(t0 + Duration::from_millis(500));
        assert_eq!(mid.r(), 128);
        assert_eq!(fade.value_at(t0 + Duration::from_secs(1)), Color32::WHITE);
    }
}
