//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f32 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f32_to_u64(value: f32) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u64>(f64::from(value).floor()).unwrap_or(u64::MAX)
}

/// Clamp an i64 into the u32 range.
#[must_use]
pub fn clamp_i64_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Downcast a unit-interval f64 draw to f32 while keeping it finite.
#[must_use]
pub fn unit_f64_to_f32(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    cast::<f64, f32>(value.clamp(0.0, 1.0)).unwrap_or(0.0)
}

/// Narrow a finite f64 to f32, saturating at the f32 range; non-finite yields 0.
#[must_use]
pub fn f64_to_f32(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    cast::<f64, f32>(value.clamp(f64::from(f32::MIN), f64::from(f32::MAX))).unwrap_or(0.0)
}

/// Map a unit-interval draw onto `0..len` the way `floor(draw * len)` does,
/// never returning `len` itself.
#[must_use]
pub fn unit_draw_to_index(draw: f64, len: usize) -> usize {
    if len == 0 || !draw.is_finite() {
        return 0;
    }
    let scaled = (draw.clamp(0.0, 1.0) * usize_to_f64(len)).floor();
    cast::<f64, usize>(scaled).unwrap_or(0).min(len - 1)
}

/// Convert a usize count into f64 for ratios.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_non_finite_and_negative() {
        assert_eq!(floor_f32_to_u64(f32::NAN), 0);
        assert_eq!(floor_f32_to_u64(-3.5), 0);
        assert_eq!(floor_f32_to_u64(12.99), 12);
    }

    #[test]
    fn i64_clamps_into_u32() {
        assert_eq!(clamp_i64_to_u32(-5), 0);
        assert_eq!(clamp_i64_to_u32(42), 42);
        assert_eq!(clamp_i64_to_u32(i64::MAX), u32::MAX);
    }

    #[test]
    fn index_mapping_floors_and_caps() {
        assert_eq!(unit_draw_to_index(0.0, 4), 0);
        assert_eq!(unit_draw_to_index(0.49, 4), 1);
        assert_eq!(unit_draw_to_index(0.999_999, 4), 3);
        assert_eq!(unit_draw_to_index(1.0, 4), 3);
        assert_eq!(unit_draw_to_index(0.5, 0), 0);
    }

    #[test]
    fn unit_draw_stays_in_range() {
        assert!((unit_f64_to_f32(0.25) - 0.25).abs() < f32::EPSILON);
        assert!((unit_f64_to_f32(f64::INFINITY) - 0.0).abs() < f32::EPSILON);
        assert!((unit_f64_to_f32(1.5) - 1.0).abs() < f32::EPSILON);
    }
}
