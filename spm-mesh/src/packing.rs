//! Vertex attribute packing
//!
//! SPM stores vertex attributes in compact forms:
//! - normals as 10:10:10:2 signed normalized integers (one u32)
//! - UVs and skin weights as IEEE 754 half floats
//! - colors as a palette marker or three raw RGB bytes
//!
//! The decoder expands them to f32; the encoder half is used by
//! [`crate::formats::SpmWriter`].

use glam::Vec3;
use half::f16;

// ============================================================================
// Color
// ============================================================================

/// Color identifier meaning "opaque white, no RGB bytes follow"
pub const COLOR_WHITE_MARKER: u8 = 128;

/// Color identifier written before explicit RGB bytes
pub const COLOR_EXPLICIT_MARKER: u8 = 0;

/// Opaque white RGBA
pub const COLOR_WHITE: [u8; 4] = [255, 255, 255, 255];

// ============================================================================
// Half-Float (f16) Conversion
// ============================================================================

/// Convert f32 to f16 bits
#[inline]
pub fn f32_to_f16(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Convert f16 bits to f32
#[inline]
pub fn f16_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

// ============================================================================
// Normal Packing (10:10:10:2)
// ============================================================================

/// Quantize one component in [-1, 1] to a 10-bit two's complement field
///
/// Positive values scale by 511, negative ones by 512, both rounded away
/// from zero.
#[inline]
fn snorm10(value: f32) -> u32 {
    let v = value.clamp(-1.0, 1.0);
    let part = if v > 0.0 {
        (v * 511.0 + 0.5) as i32
    } else {
        (v * 512.0 - 0.5) as i32
    };
    (part as u32) & 1023
}

/// Expand a 10-bit two's complement field back to [-1, 1]
#[inline]
fn unsnorm10(part: u32) -> f32 {
    let part = part & 1023;
    if part & 512 != 0 {
        (1024 - part) as f32 * (-1.0 / 512.0)
    } else {
        part as f32 * (1.0 / 511.0)
    }
}

/// Pack a unit vector into 10:10:10:2 (top two bits left zero)
///
/// Normalize before packing; components outside [-1, 1] are clamped.
#[inline]
pub fn compress_normal(normal: Vec3) -> u32 {
    snorm10(normal.x) | (snorm10(normal.y) << 10) | (snorm10(normal.z) << 20)
}

/// Unpack a 10:10:10:2 normal and re-normalize it
///
/// The 2-bit field is ignored. An all-zero payload decodes to the zero vector.
#[inline]
pub fn decompress_normal(packed: u32) -> Vec3 {
    Vec3::new(
        unsnorm10(packed),
        unsnorm10(packed >> 10),
        unsnorm10(packed >> 20),
    )
    .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_axes() {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z] {
            let decoded = decompress_normal(compress_normal(axis));
            assert!(
                (decoded - axis).length() < 1e-6,
                "axis {:?} decoded to {:?}",
                axis,
                decoded
            );
        }
    }

    #[test]
    fn test_normal_roundtrip_error_small() {
        let samples = [
            Vec3::new(0.3, -0.5, 0.81),
            Vec3::new(-0.7, 0.7, 0.1),
            Vec3::new(0.01, 0.02, -0.99),
            Vec3::new(1.0, 1.0, 1.0),
        ];
        for n in samples {
            let n = n.normalize();
            let decoded = decompress_normal(compress_normal(n));
            assert!((decoded.length() - 1.0).abs() < 1e-5);
            assert!(
                decoded.dot(n) > 0.9995,
                "normal {:?} decoded to {:?}",
                n,
                decoded
            );
        }
    }

    #[test]
    fn test_negative_field_layout() {
        // -1.0 on x is stored as 512 in the low 10 bits
        assert_eq!(compress_normal(-Vec3::X) & 1023, 512);
        // +1.0 on y is stored as 511 in bits 10..20
        assert_eq!((compress_normal(Vec3::Y) >> 10) & 1023, 511);
        // The 2-bit field stays clear
        assert_eq!(compress_normal(Vec3::new(-1.0, -1.0, -1.0)) >> 30, 0);
    }

    #[test]
    fn test_zero_payload_is_zero_vector() {
        assert_eq!(decompress_normal(0), Vec3::ZERO);
    }

    #[test]
    fn test_f16_roundtrip() {
        for v in [0.0f32, 1.0, -1.0, 0.5, 0.25, 2048.0] {
            assert_eq!(f16_to_f32(f32_to_f16(v)), v);
        }
        assert!(f16_to_f32(0x7E00).is_nan());
        // -0.0 compares equal to 0.0 after widening
        assert_eq!(f16_to_f32(0x8000), 0.0);
    }
}
