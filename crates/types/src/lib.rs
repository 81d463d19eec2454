//! Exact numeric values for expression literals.
//!
//! - [`Biggie`]: unbounded integer (`xs:integer`)
//! - [`Decie`]: scaled decimal (`xs:decimal`)
//! - [`ValueError`]: failures raised while building or combining them

pub mod biggie;
pub mod decie;
pub mod error;

pub use biggie::Biggie;
pub use decie::{DEFAULT_DIVISION_PRECISION, Decie};
pub use error::ValueError;
