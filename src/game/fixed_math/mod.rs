//! Deterministic fixed-point mathematics.
//!
//! Three precisions coexist and are kept as distinct types so a value cannot
//! silently move from one to another:
//!
//! - [`Velocity`]: 8.8 in a signed 16-bit word, `0x100` is one pixel per tick
//! - [`Coord`]: 16.16 world coordinate (pixel word + subpixel word)
//! - [`OrbitFixed`]: 16.8 intermediate used by orbit and spiral offsets
//!
//! Raw-bit arithmetic wraps, matching the word/long operations of the
//! original hardware. No floating point is used anywhere on the tick path.

use fixed::types::{I16F16, I24F8, I8F8};

pub use trig::{calc_angle, calc_sine, cosine, scale_by_cosine, scale_by_sine, sine, SINE_TABLE};

mod trig;

/// 8.8 velocity / acceleration.
pub type Velocity = I8F8;

/// 16.16 world coordinate.
pub type Coord = I16F16;

/// 16.8 orbit math intermediate.
pub type OrbitFixed = I24F8;

pub const VELOCITY_FRAC_BITS: u32 = 8;
pub const COORD_FRAC_BITS: u32 = 16;
pub const ORBIT_FRAC_BITS: u32 = 8;

/// Shift a whole-pixel value into a raw fixed-point value with `frac_bits` fractional bits.
pub const fn to_fixed(pixels: i32, frac_bits: u32) -> i32 {
    pixels.wrapping_shl(frac_bits)
}

/// `pixel = raw >> frac_bits` (arithmetic shift, rounds toward negative infinity).
pub const fn to_pixels(raw: i32, frac_bits: u32) -> i32 {
    raw >> frac_bits
}

/// `ext.w` on a byte.
pub const fn sign_extend_byte(byte: u8) -> i16 {
    byte as i8 as i16
}

/// `ext.l` on a word.
pub const fn sign_extend_word(word: u16) -> i32 {
    word as i16 as i32
}

/// Whole-pixel view shared by every precision.
pub trait Pixels: Copy {
    const FRAC_BITS: u32;

    /// Integer pixel part, floored.
    fn pixels(self) -> i32;

    /// Value with a zero fractional part. Wraps if the pixel count does not fit.
    fn from_pixels(pixels: i32) -> Self;
}

impl Pixels for Coord {
    const FRAC_BITS: u32 = COORD_FRAC_BITS;

    fn pixels(self) -> i32 {
        to_pixels(self.to_bits(), Self::FRAC_BITS)
    }

    fn from_pixels(pixels: i32) -> Self {
        Self::from_bits(to_fixed(pixels, Self::FRAC_BITS))
    }
}

impl Pixels for OrbitFixed {
    const FRAC_BITS: u32 = ORBIT_FRAC_BITS;

    fn pixels(self) -> i32 {
        to_pixels(self.to_bits(), Self::FRAC_BITS)
    }

    fn from_pixels(pixels: i32) -> Self {
        Self::from_bits(to_fixed(pixels, Self::FRAC_BITS))
    }
}

impl Pixels for Velocity {
    const FRAC_BITS: u32 = VELOCITY_FRAC_BITS;

    fn pixels(self) -> i32 {
        to_pixels(i32::from(self.to_bits()), Self::FRAC_BITS)
    }

    fn from_pixels(pixels: i32) -> Self {
        Self::from_bits(to_fixed(pixels, Self::FRAC_BITS) as i16)
    }
}

/// Velocity from its raw word, e.g. `velocity(0x38)` for the standard gravity step.
pub const fn velocity(raw: i16) -> Velocity {
    Velocity::from_bits(raw)
}

/// Add an 8.8 velocity to a 16.16 coordinate: the velocity word is sign
/// extended and shifted left by 8 before a wrapping long add.
pub fn apply_velocity(coord: Coord, vel: Velocity) -> Coord {
    let step = i32::from(vel.to_bits()) << VELOCITY_FRAC_BITS;
    Coord::from_bits(coord.to_bits().wrapping_add(step))
}

/// Wrapping word add of two 8.8 values.
pub fn add_velocity(vel: Velocity, delta: Velocity) -> Velocity {
    Velocity::from_bits(vel.to_bits().wrapping_add(delta.to_bits()))
}

/// Wrapping word subtract of two 8.8 values.
pub fn sub_velocity(vel: Velocity, delta: Velocity) -> Velocity {
    Velocity::from_bits(vel.to_bits().wrapping_sub(delta.to_bits()))
}

/// Offset a coordinate by whole pixels, keeping the subpixel word.
pub fn offset_coord(coord: Coord, pixels: i32) -> Coord {
    Coord::from_bits(coord.to_bits().wrapping_add(to_fixed(pixels, COORD_FRAC_BITS)))
}

/// Replace the pixel word of a coordinate and clear the subpixel word.
pub fn snap_coord(pixels: i32) -> Coord {
    Coord::from_pixels(pixels)
}
