//! Shared 256-step angle tables.
//!
//! Angles are bytes: `0x00` points right, `0x40` down (screen space, y grows
//! downward), `0x80` left, `0xC0` up. Sine values are 8.8 fractions in
//! `[-256, 256]`.

use super::OrbitFixed;

/// One full turn, truncated toward zero, `SINE_TABLE[a + 128] == -SINE_TABLE[a]`.
pub const SINE_TABLE: [i16; 256] = [
    0, 6, 12, 18, 25, 31, 37, 43, 49, 56, 62, 68, 74, 80, 86, 92,
    97, 103, 109, 115, 120, 126, 131, 136, 142, 147, 152, 157, 162, 167, 171, 176,
    181, 185, 189, 193, 197, 201, 205, 209, 212, 216, 219, 222, 225, 228, 231, 234,
    236, 238, 241, 243, 244, 246, 248, 249, 251, 252, 253, 254, 254, 255, 255, 255,
    256, 255, 255, 255, 254, 254, 253, 252, 251, 249, 248, 246, 244, 243, 241, 238,
    236, 234, 231, 228, 225, 222, 219, 216, 212, 209, 205, 201, 197, 193, 189, 185,
    181, 176, 171, 167, 162, 157, 152, 147, 142, 136, 131, 126, 120, 115, 109, 103,
    97, 92, 86, 80, 74, 68, 62, 56, 49, 43, 37, 31, 25, 18, 12, 6,
    0, -6, -12, -18, -25, -31, -37, -43, -49, -56, -62, -68, -74, -80, -86, -92,
    -97, -103, -109, -115, -120, -126, -131, -136, -142, -147, -152, -157, -162, -167, -171, -176,
    -181, -185, -189, -193, -197, -201, -205, -209, -212, -216, -219, -222, -225, -228, -231, -234,
    -236, -238, -241, -243, -244, -246, -248, -249, -251, -252, -253, -254, -254, -255, -255, -255,
    -256, -255, -255, -255, -254, -254, -253, -252, -251, -249, -248, -246, -244, -243, -241, -238,
    -236, -234, -231, -228, -225, -222, -219, -216, -212, -209, -205, -201, -197, -193, -189, -185,
    -181, -176, -171, -167, -162, -157, -152, -147, -142, -136, -131, -126, -120, -115, -109, -103,
    -97, -92, -86, -80, -74, -68, -62, -56, -49, -43, -37, -31, -25, -18, -12, -6,
];

/// `atan(i / 64)` in angle units for the first octant, `i` in `0..=64`.
const ATAN_TABLE: [u8; 65] = [
    0, 1, 1, 2, 3, 3, 4, 4, 5, 6, 6, 7, 8, 8, 9, 9,
    10, 11, 11, 12, 12, 13, 13, 14, 15, 15, 16, 16, 17, 17, 18, 18,
    19, 19, 20, 20, 21, 21, 22, 22, 23, 23, 24, 24, 25, 25, 25, 26,
    26, 27, 27, 27, 28, 28, 29, 29, 29, 30, 30, 30, 31, 31, 31, 32,
    32,
];

/// Sine of an angle byte. Any integer is accepted; only the low 8 bits are used.
pub fn sine(angle: impl Into<i32>) -> i32 {
    i32::from(SINE_TABLE[(angle.into() & 0xFF) as usize])
}

/// `sine(angle + 0x40)`.
pub fn cosine(angle: impl Into<i32>) -> i32 {
    sine(angle.into().wrapping_add(0x40))
}

/// `(sine, cosine)` in one lookup pair.
pub fn calc_sine(angle: impl Into<i32>) -> (i32, i32) {
    let angle = angle.into();
    (sine(angle), cosine(angle))
}

/// `value * sine(angle)` as a 16.8 quantity; `.pixels()` gives `(value * sine) >> 8`.
pub fn scale_by_sine(value: i32, angle: impl Into<i32>) -> OrbitFixed {
    OrbitFixed::from_bits(value.wrapping_mul(sine(angle)))
}

/// `value * cosine(angle)` as a 16.8 quantity.
pub fn scale_by_cosine(value: i32, angle: impl Into<i32>) -> OrbitFixed {
    OrbitFixed::from_bits(value.wrapping_mul(cosine(angle)))
}

/// Angle byte of the vector `(dx, dy)`.
///
/// Integer octant decomposition over [`ATAN_TABLE`]; the zero vector yields
/// `0x40` (straight down).
pub fn calc_angle(dx: i32, dy: i32) -> u8 {
    if dx == 0 && dy == 0 {
        return 0x40;
    }

    let ax = u64::from(dx.unsigned_abs());
    let ay = u64::from(dy.unsigned_abs());

    // Angle inside the first quadrant, 0..=64.
    let base: i32 = if ay <= ax {
        i32::from(ATAN_TABLE[(ay * 64 / ax) as usize])
    } else {
        64 - i32::from(ATAN_TABLE[(ax * 64 / ay) as usize])
    };

    let angle = match (dx >= 0, dy >= 0) {
        (true, true) => base,
        (false, true) => 128 - base,
        (false, false) => 128 + base,
        (true, false) => 256 - base,
    };
    (angle & 0xFF) as u8
}
