// Key-hierarchy logic: the AEAD primitive, the key-material model, and the
// wrap/unwrap orchestration over the collaborator traits.

pub mod cipher;
pub mod hierarchy;
pub mod master_key;

pub use cipher::*;
pub use hierarchy::*;
pub use master_key::*;
