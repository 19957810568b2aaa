//! Response decoding shared by the OAuth core and typed media types.
//!
//! The core only relies on [`decode`] and [`Validate`]; it does not care how
//! a media type was produced.

pub mod bottle;
pub mod decoder;
pub mod validate;

pub use bottle::{Bottle, BottleCollection};
pub use decoder::{decode, decode_validated, BodyFormat, DecodeError};
pub use validate::{Validate, ValidationError};
