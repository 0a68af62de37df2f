//! Hermite tangent handles.
//!
//! A stored handle is three times the value delta to the neighbouring
//! keyframe on that side. Dividing by three times the (signed) time delta
//! turns it back into a slope.

/// Handle toward a neighbouring keyframe.
#[must_use]
pub fn handle_toward(value: f32, neighbour_value: f32) -> f32 {
    3.0 * (neighbour_value - value)
}

/// Slope encoded by a handle, given the signed time delta to the neighbour.
///
/// A zero time delta yields a flat tangent.
#[must_use]
pub fn handle_to_slope(handle: f32, time_delta: f32) -> f32 {
    if time_delta == 0.0 {
        0.0
    } else {
        handle / (3.0 * time_delta)
    }
}

/// Cubic Hermite interpolation between two keyframes.
///
/// `t` is normalized to `[0, 1]` across a segment of length `span`; slopes are
/// per unit time.
#[must_use]
pub fn interpolate(v0: f32, slope0: f32, v1: f32, slope1: f32, span: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * v0 + h10 * span * slope0 + h01 * v1 + h11 * span * slope1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_slope_inverse() {
        // right neighbour one second later, value rises by 2
        let handle = handle_toward(1.0, 3.0);
        assert_eq!(handle, 6.0);
        assert_eq!(handle_to_slope(handle, 1.0), 2.0);

        // left neighbour half a second earlier, value was 2 lower
        let handle = handle_toward(3.0, 1.0);
        assert_eq!(handle_to_slope(handle, -0.5), 4.0);
    }

    #[test]
    fn test_interpolate_endpoints() {
        assert_eq!(interpolate(1.0, 5.0, 4.0, -2.0, 2.0, 0.0), 1.0);
        assert_eq!(interpolate(1.0, 5.0, 4.0, -2.0, 2.0, 1.0), 4.0);
    }

    #[test]
    fn test_linear_slopes_give_straight_line() {
        // slope matches the segment, so the curve is the line itself
        let v = interpolate(0.0, 2.0, 4.0, 2.0, 2.0, 0.25);
        assert!((v - 1.0).abs() < 1e-6);
    }
}
