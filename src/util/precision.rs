//! Bit precision of integer operand values.
//!
//! The issue stage uses these to derive the operand width of an operation
//! from the values it carries, when no explicit width is known.

/// Position of the most significant 1 bit, 0 for 0.
pub fn unsigned_precision(val: u64) -> u32 {
    64 - val.leading_zeros()
}

/// Bits needed to hold `val` as a two's complement number, 1 to 64.
/// A value and its complement share a precision.
pub fn signed_precision(val: u64) -> u32 {
    let magnitude = if val >> 63 == 1 { !val } else { val };
    unsigned_precision(magnitude) + 1
}

/// Number of `block` sized chunks needed for the signed precision of `val`.
pub fn block_signed_precision(val: u64, block: u32) -> u32 {
    let block = block.max(1);
    (signed_precision(val) + block - 1) / block
}

/// Width in bits an operation on `operands` needs, rounded up to whole
/// `block` sized chunks. None without operands.
pub fn operand_width(operands: &[i64], block: u32) -> Option<u32> {
    operands
        .iter()
        .map(|v| block_signed_precision(*v as u64, block) * block.max(1))
        .max()
}
