/// Floor division for a positive divisor: `floor_div(-1, 16) == -1`.
#[inline]
pub fn floor_div(value: i32, divisor: i32) -> i32 {
    debug_assert!(divisor > 0);
    value.div_euclid(divisor)
}

/// Remainder matching [`floor_div`], always in `0..divisor`.
#[inline]
pub fn floor_mod(value: i32, divisor: i32) -> i32 {
    debug_assert!(divisor > 0);
    value.rem_euclid(divisor)
}
