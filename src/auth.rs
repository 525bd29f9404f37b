//! Account credential models shared by the signer and forwarder.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
