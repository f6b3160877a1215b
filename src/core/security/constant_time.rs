/*!
Constant-time comparison.
*/

use subtle::ConstantTimeEq;

/// Compare two byte slices in constant time.
///
/// The running time depends only on the lengths, never on where the
/// slices differ. Slices of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
