mod helpers;
pub mod op;
mod secret;
mod tenge;

pub use helpers::parse_boolean_flag;
pub use secret::Secret;
pub use tenge::{Tenge, TengeConversionError, KZT_CURRENCY_CODE, KZT_CURRENCY_CODE_LOWER};
