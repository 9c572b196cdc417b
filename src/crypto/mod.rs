//! Secret handling for encrypted builds.
//!
//! The crate never encrypts anything itself; it only holds the password the
//! engine asks for through
//! [`CryptoPasswordCallback`](crate::engine::CryptoPasswordCallback).

mod password;

pub use password::Password;
