//! Prefix-length arithmetic over `u128` address magnitudes.
//!
//! Every function takes the address width (`bits`, 32 or 128) explicitly so
//! the same code path serves both families.

use crate::error::{Error, Result};

fn check_prefix(prefix: u8, bits: u8) -> Result<()> {
    if bits != 32 && bits != 128 {
        return Err(Error::range(format!(
            "address width must be 32 or 128 bits, got {bits}"
        )));
    }
    if prefix > bits {
        return Err(Error::range(format!(
            "prefix length /{prefix} is outside 0..={bits}"
        )));
    }
    Ok(())
}

/// All-ones value for the low `n` bits (`n` up to 128).
pub(crate) fn low_bits(n: u8) -> u128 {
    if n >= 128 {
        u128::MAX
    } else {
        (1u128 << n) - 1
    }
}

/// Convert a prefix length to a network mask of width `bits`.
///
/// # Examples
/// ```
/// use cidr_subnet_calc::models::mask;
/// assert_eq!(mask(24, 32).unwrap(), 0xFFFFFF00);
/// ```
pub fn mask(prefix: u8, bits: u8) -> Result<u128> {
    check_prefix(prefix, bits)?;
    Ok(low_bits(bits) ^ low_bits(bits - prefix))
}

/// Host part of the mask: `2^(bits-prefix) - 1`.
pub fn wildcard(prefix: u8, bits: u8) -> Result<u128> {
    check_prefix(prefix, bits)?;
    Ok(low_bits(bits - prefix))
}

/// Network address of `addr` for the given prefix length.
pub fn network_of(addr: u128, prefix: u8, bits: u8) -> Result<u128> {
    Ok(addr & mask(prefix, bits)?)
}

/// Last (broadcast for IPv4) address of the block containing `addr`.
pub fn last_of(addr: u128, prefix: u8, bits: u8) -> Result<u128> {
    Ok(network_of(addr, prefix, bits)? | wildcard(prefix, bits)?)
}

/// The address right after the block containing `addr`.
///
/// Returns `None` when the block is the last one of the address space.
pub fn next_block(addr: u128, prefix: u8, bits: u8) -> Result<Option<u128>> {
    let last = last_of(addr, prefix, bits)?;
    if last >= low_bits(bits) {
        Ok(None)
    } else {
        Ok(Some(last + 1))
    }
}

/// Shortest prefix for which `addr` is a valid network address.
pub fn alignment_prefix(addr: u128, bits: u8) -> Result<u8> {
    check_prefix(0, bits)?;
    let trailing_zeros = (addr.trailing_zeros() as u8).min(bits);
    Ok(bits - trailing_zeros)
}

/// Number of bits needed to index `n` distinct values (`ceil(log2(n))`).
pub(crate) fn ceil_log2(n: u128) -> u8 {
    if n <= 1 {
        0
    } else {
        (128 - (n - 1).leading_zeros()) as u8
    }
}
