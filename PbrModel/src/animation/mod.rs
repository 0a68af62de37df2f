//! Animation clips and keyframe curves
//!
//! An [`Action`] belongs to a skeleton and carries one [`BoneTrack`] per
//! animated bone. Materials carry their own [`MaterialTrack`]s that refer to
//! an action by index. Each track holds scalar [`FCurve`]s, one per animated
//! component axis.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

pub mod hermite;
pub mod quantize;

use serde::Serialize;

/// Shortest duration an action or track may have, one frame at 60 fps.
pub const MIN_DURATION: f32 = 1.0 / 60.0;

// ============================================================================
// Curve Targets
// ============================================================================

/// The transform component a curve animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CurveComponent {
    Translation,
    Rotation,
    Scale,
    UvTranslation,
    UvScale,
}

impl CurveComponent {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Translation),
            1 => Some(Self::Rotation),
            2 => Some(Self::Scale),
            3 => Some(Self::UvTranslation),
            4 => Some(Self::UvScale),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Translation => 0,
            Self::Rotation => 1,
            Self::Scale => 2,
            Self::UvTranslation => 3,
            Self::UvScale => 4,
        }
    }

    /// Rest value of the component, used before the first keyframe of an
    /// empty curve.
    #[must_use]
    pub const fn rest_value(self) -> f32 {
        match self {
            Self::Scale | Self::UvScale => 1.0,
            _ => 0.0,
        }
    }
}

/// How a curve's values are stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueFormat {
    /// One `f32` per value.
    Float,
    /// Three `f32` per value; the curve reads its own axis.
    Vec3,
    /// Four `f32` per value; the curve reads its own axis.
    Quaternion,
    /// `i8` scaled by `2^exponent`.
    Fixed8,
    /// `i16` scaled by `2^exponent`.
    Fixed16,
}

impl ValueFormat {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Float),
            1 => Some(Self::Vec3),
            2 => Some(Self::Quaternion),
            4 => Some(Self::Fixed8),
            8 => Some(Self::Fixed16),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Float => 0,
            Self::Vec3 => 1,
            Self::Quaternion => 2,
            Self::Fixed8 => 4,
            Self::Fixed16 => 8,
        }
    }

    /// Bytes per stored value.
    #[must_use]
    pub const fn stride(self) -> usize {
        match self {
            Self::Float => 4,
            Self::Vec3 => 12,
            Self::Quaternion => 16,
            Self::Fixed8 => 1,
            Self::Fixed16 => 2,
        }
    }

    /// Whether values are fixed-point.
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::Fixed8 | Self::Fixed16)
    }
}

/// Keyframe interpolation toward the next keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Interpolation {
    Constant,
    #[default]
    Linear,
    Hermite,
}

impl Interpolation {
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Constant),
            1 => Some(Self::Linear),
            2 => Some(Self::Hermite),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Constant => 0,
            Self::Linear => 1,
            Self::Hermite => 2,
        }
    }
}

// ============================================================================
// Curves
// ============================================================================

/// One keyframe of a scalar curve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keyframe {
    /// Time in seconds.
    pub time: f32,
    pub value: f32,
    pub interpolation: Interpolation,
    /// Incoming slope (value per second), used by Hermite segments.
    pub in_slope: f32,
    /// Outgoing slope (value per second), used by Hermite segments.
    pub out_slope: f32,
}

impl Keyframe {
    #[must_use]
    pub fn new(time: f32, value: f32, interpolation: Interpolation) -> Self {
        Self {
            time,
            value,
            interpolation,
            ..Self::default()
        }
    }
}

/// A scalar curve animating one axis of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct FCurve {
    pub component: CurveComponent,
    /// Zero-based axis (x = 0).
    pub axis: u8,
    pub format: ValueFormat,
    /// Fixed-point scale exponent as read from disk. The writer always picks
    /// the largest exponent the values fit.
    pub exponent: Option<i8>,
    /// Keyframes sorted by time, with unique times.
    pub keyframes: Vec<Keyframe>,
}

impl FCurve {
    /// Create an empty 16-bit fixed-point curve.
    #[must_use]
    pub fn new(component: CurveComponent, axis: u8) -> Self {
        Self {
            component,
            axis,
            format: ValueFormat::Fixed16,
            exponent: None,
            keyframes: Vec::new(),
        }
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Sample the curve at `time`, holding the end values outside its range.
    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return self.component.rest_value();
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let next = self.keyframes.partition_point(|k| k.time <= time);
        let k0 = &self.keyframes[next - 1];
        let k1 = &self.keyframes[next];
        let span = k1.time - k0.time;
        let t = if span > 0.0 { (time - k0.time) / span } else { 0.0 };

        match k0.interpolation {
            Interpolation::Constant => k0.value,
            Interpolation::Linear => k0.value + (k1.value - k0.value) * t,
            Interpolation::Hermite => {
                hermite::interpolate(k0.value, k0.out_slope, k1.value, k1.in_slope, span, t)
            }
        }
    }
}

// ============================================================================
// Clips
// ============================================================================

/// Curves animating one bone within one action.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    /// Index into the owning skeleton's bones.
    pub bone: usize,
    /// Track length in seconds.
    pub length: f32,
    pub curves: Vec<FCurve>,
}

/// Curves animating one material's UV transform within one action.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTrack {
    /// Index into the action list of the model's first skeleton.
    pub action: usize,
    /// Track length in seconds.
    pub length: f32,
    pub curves: Vec<FCurve>,
}

/// An animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    /// Start of the window in which the clip's hit lands, in seconds.
    pub attack_window: f32,
    /// Offset applied when the clip is staged, in seconds.
    pub stage_offset: f32,
    /// Clip duration in seconds, at least [`MIN_DURATION`].
    pub duration: f32,
    pub flags: [u8; 3],
    pub tracks: Vec<BoneTrack>,
}

impl Action {
    #[must_use]
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            attack_window: 0.0,
            stage_offset: 0.0,
            duration,
            flags: [0; 3],
            tracks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(keys: &[(f32, f32, Interpolation)]) -> FCurve {
        let mut curve = FCurve::new(CurveComponent::Translation, 0);
        curve.keyframes = keys.iter().map(|&(t, v, i)| Keyframe::new(t, v, i)).collect();
        curve
    }

    #[test]
    fn test_evaluate_holds_ends() {
        let c = curve(&[(1.0, 2.0, Interpolation::Linear), (2.0, 4.0, Interpolation::Linear)]);
        assert_eq!(c.evaluate(0.0), 2.0);
        assert_eq!(c.evaluate(5.0), 4.0);
        assert_eq!(c.evaluate(1.5), 3.0);
    }

    #[test]
    fn test_evaluate_constant_steps() {
        let c = curve(&[(0.0, 1.0, Interpolation::Constant), (1.0, 9.0, Interpolation::Linear)]);
        assert_eq!(c.evaluate(0.99), 1.0);
        assert_eq!(c.evaluate(1.0), 9.0);
    }

    #[test]
    fn test_evaluate_hermite_uses_slopes() {
        let mut c = curve(&[(0.0, 0.0, Interpolation::Hermite), (1.0, 0.0, Interpolation::Linear)]);
        c.keyframes[0].out_slope = 1.0;
        c.keyframes[1].in_slope = 1.0;
        // h10 + h11 at t = 0.5 is 0.125 - 0.125 = 0
        assert!(c.evaluate(0.5).abs() < 1e-6);
        assert!(c.evaluate(0.25) > 0.0);
    }

    #[test]
    fn test_empty_curve_rests() {
        assert_eq!(FCurve::new(CurveComponent::Scale, 1).evaluate(3.0), 1.0);
        assert_eq!(FCurve::new(CurveComponent::Rotation, 1).evaluate(3.0), 0.0);
    }

    #[test]
    fn test_format_codes() {
        for code in [0, 1, 2, 4, 8] {
            assert_eq!(ValueFormat::from_code(code).unwrap().code(), code);
        }
        assert_eq!(ValueFormat::from_code(3), None);
        assert_eq!(Interpolation::from_code(3), None);
    }
}
