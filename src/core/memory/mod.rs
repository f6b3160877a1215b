/*!
Memory handling for sensitive material.

Secret bytes (session keys, the authentication master key and its pads)
live in containers that wipe themselves when dropped.
*/

pub mod secure_vec;

pub use secure_vec::SecureVec;
