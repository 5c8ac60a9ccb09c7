mod helpers;
mod money;
pub mod op;
mod secret;

pub use helpers::{parse_boolean_flag, parse_env_value};
pub use money::{
    CommissionRate,
    CommissionRateError,
    Money,
    MoneyConversionError,
    BASIS_POINTS_PER_UNIT,
    DEFAULT_CURRENCY_CODE,
    MINOR_UNITS_PER_MAJOR,
};
pub use secret::Secret;
