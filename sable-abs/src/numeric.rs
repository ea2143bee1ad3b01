/*!

Arbitrary precision arithmetic. Numeral constants in the signature are arbitrary precision
integers; the backing implementation is the `num-bigint` crate.

*/

pub use num_bigint::BigInt;
pub use num_traits::{One, Zero};

/// The type of integer numeral constants appearing in interpreted literals.
pub type IntegerConstant = BigInt;

#[inline(always)]
pub fn int_one() -> IntegerConstant {
  IntegerConstant::one()
}

#[inline(always)]
pub fn int_zero() -> IntegerConstant {
  IntegerConstant::zero()
}
