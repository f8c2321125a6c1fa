pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod reporter;
pub mod snipe;
pub mod types;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Wei per ETH — marketplace events report prices as wei integer strings.
pub const WEI_PER_ETH: Decimal = dec!(1_000_000_000_000_000_000);
