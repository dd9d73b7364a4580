//! Domain types.

mod binding;
pub mod identity;
mod recipient;

pub use binding::SecretBinding;
pub use identity::Identity;
pub use recipient::Recipient;
