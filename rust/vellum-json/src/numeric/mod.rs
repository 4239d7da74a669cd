//! Number lexing and formatting: the bespoke integer/double scanner used by the
//! parser, plus the two ASCII encoders used by the serializer.

pub mod atonum;
pub mod dtoa;
pub mod itoa;
