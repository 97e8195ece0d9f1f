//! Native-value amounts in base units
//!
//! `Wei` is an unsigned integer count of the smallest indivisible unit. All
//! arithmetic is checked; nothing wraps. Conversion to and from display units
//! goes through rust_decimal with a fixed scaling factor:
//!
//! 1 display unit = 10^18 base units (`WEI_PER_UNIT`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::AmountError;

/// Fractional digits of one display unit.
pub const NATIVE_DECIMALS: u32 = 18;

/// Base units per display unit.
pub const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

/// `WEI_PER_UNIT` as a decimal scaling factor (10^18 = 0x0DE0_B6B3_A764_0000).
pub const WEI_PER_UNIT_DECIMAL: Decimal = Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

/// An amount of native value in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);
    pub const MAX: Wei = Wei(u128::MAX);

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Wei)
    }

    pub fn checked_sub(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_sub(rhs.0).map(Wei)
    }

    pub fn checked_mul(self, factor: u128) -> Option<Wei> {
        self.0.checked_mul(factor).map(Wei)
    }

    /// Parse a human-readable display amount such as `"0.01"`.
    pub fn parse_units(input: &str) -> Result<Wei, AmountError> {
        let value = Decimal::from_str_exact(input.trim()).map_err(|_| AmountError::Invalid {
            input: input.to_string(),
        })?;
        Self::from_units(value)
    }

    /// Convert a display-unit decimal into base units.
    ///
    /// Rejects negative values and values finer than one base unit.
    pub fn from_units(value: Decimal) -> Result<Wei, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative {
                value: value.to_string(),
            });
        }

        let value = value.normalize();
        if value.scale() > NATIVE_DECIMALS {
            return Err(AmountError::TooPrecise {
                value: value.to_string(),
                max_decimals: NATIVE_DECIMALS,
            });
        }

        let out_of_range = || AmountError::OutOfRange {
            value: value.to_string(),
        };
        let scaled = value
            .checked_mul(WEI_PER_UNIT_DECIMAL)
            .ok_or_else(out_of_range)?;

        scaled.abs().to_u128().map(Wei).ok_or_else(out_of_range)
    }

    /// Convert base units back to a normalized display-unit decimal.
    pub fn to_units(self) -> Result<Decimal, AmountError> {
        let out_of_range = || AmountError::OutOfRange {
            value: self.0.to_string(),
        };
        let raw = i128::try_from(self.0).map_err(|_| out_of_range())?;
        Decimal::try_from_i128_with_scale(raw, NATIVE_DECIMALS)
            .map(|d| d.normalize())
            .map_err(|_| out_of_range())
    }
}

impl From<u128> for Wei {
    fn from(base_units: u128) -> Self {
        Self(base_units)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
