//! Identities, composite keys and record types shared by the governance
//! engine and the record stores.

pub mod address;
pub mod keys;
pub mod records;

pub use address::*;
pub use keys::*;
pub use records::*;

pub use qv_time::UnixSeconds;
