//! Types library for the custodial exchange ledger
//!
//! Shared primitives used by the ledger contract and its host simulation.
//!
//! # Modules
//! - `ids`: Account addresses and transaction identifiers
//! - `numeric`: Base-unit amounts (`Wei`) and display-unit scaling
//! - `errors`: Parsing and conversion errors

pub mod ids;
pub mod numeric;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::errors::*;
}
