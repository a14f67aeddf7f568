//! `Dnum`: par entero/decimales usado para todos los montos de los flujos.
//!
//! Los montos viajan desde la UI como `[entero, decimales]`. Internamente se
//! normalizan a 18 decimales (`WAD`), que es la precisión de todos los tokens
//! del protocolo.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Cantidad de decimales de los tokens del protocolo.
pub const WAD_DECIMALS: u8 = 18;

/// Máximo de decimales aceptado en un `Dnum` entrante.
pub const MAX_DECIMALS: u8 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dnum {
    value: U256,
    decimals: u8,
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

impl Dnum {
    pub fn new(value: U256, decimals: u8) -> Result<Self, DomainError> {
        if decimals > MAX_DECIMALS {
            return Err(DomainError::Validation(format!("too many decimals: {decimals} (max {MAX_DECIMALS})")));
        }
        Ok(Self { value, decimals })
    }

    /// Monto ya expresado en 18 decimales.
    pub fn from_wad(value: U256) -> Self {
        Self { value, decimals: WAD_DECIMALS }
    }

    pub fn zero() -> Self {
        Self::from_wad(U256::ZERO)
    }

    /// Parsea la parte entera de un `Dnum` (sin signo, base 10).
    pub fn parse(value: &str, decimals: u8) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::Validation(format!("not a non-negative integer: {value:?}")));
        }
        let parsed = U256::from_str_radix(trimmed, 10).map_err(|e| DomainError::Overflow(format!("{value}: {e}")))?;
        Self::new(parsed, decimals)
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Valor escalado a 18 decimales. Sólo se reduce precisión si los
    /// dígitos descartados son cero; si no, es `PrecisionLoss`.
    pub fn to_wad(&self) -> Result<U256, DomainError> {
        if self.decimals <= WAD_DECIMALS {
            return self.value
                       .checked_mul(pow10(WAD_DECIMALS - self.decimals))
                       .ok_or_else(|| DomainError::Overflow(format!("{self} does not fit in 256 bits at 18 decimals")));
        }
        let unit = pow10(self.decimals - WAD_DECIMALS);
        if !(self.value % unit).is_zero() {
            return Err(DomainError::PrecisionLoss(format!("{self} has more than {WAD_DECIMALS} decimals")));
        }
        Ok(self.value / unit)
    }

    /// Copia normalizada a 18 decimales.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        Ok(Self::from_wad(self.to_wad()?))
    }
}

impl fmt::Display for Dnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.value);
        }
        let unit = pow10(self.decimals);
        let int_part = self.value / unit;
        let frac = (self.value % unit).to_string();
        let frac = format!("{:0>width$}", frac, width = self.decimals as usize);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{int_part}")
        } else {
            write!(f, "{int_part}.{frac}")
        }
    }
}
