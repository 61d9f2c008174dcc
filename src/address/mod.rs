//! Street address handling: structured parsing and the household address
//! similarity score.

mod distance;
mod parse;

pub use distance::address_distance;
pub use parse::{AddressParser, UsAddressParser};
