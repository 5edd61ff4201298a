//! Bit-resolution data sizes.
//!
//! Lowercase `b` is bits and uppercase `B` is bytes; prefixes are decimal
//! (1 kB = 1000 B).

use std::fmt;
use std::str::FromStr;

use crate::UnitError;

/// Data size units, largest first. Within each prefix the byte unit comes
/// before the bit unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeUnit {
    Yottabyte,
    Yottabit,
    Zettabyte,
    Zettabit,
    Exabyte,
    Exabit,
    Petabyte,
    Petabit,
    Terabyte,
    Terabit,
    Gigabyte,
    Gigabit,
    Megabyte,
    Megabit,
    Kilobyte,
    Kilobit,
    Byte,
    Bit,
}

const BIT: f64 = 1.0;
const BYTE: f64 = 8.0 * BIT;
const KILO: f64 = 1_000.0;
const MEGA: f64 = KILO * KILO;
const GIGA: f64 = MEGA * KILO;
const TERA: f64 = GIGA * KILO;
const PETA: f64 = TERA * KILO;
const EXA: f64 = PETA * KILO;
const ZETTA: f64 = EXA * KILO;
const YOTTA: f64 = ZETTA * KILO;

impl SizeUnit {
    /// Every unit, in rendering order.
    pub const ALL: [SizeUnit; 18] = [
        SizeUnit::Yottabyte,
        SizeUnit::Yottabit,
        SizeUnit::Zettabyte,
        SizeUnit::Zettabit,
        SizeUnit::Exabyte,
        SizeUnit::Exabit,
        SizeUnit::Petabyte,
        SizeUnit::Petabit,
        SizeUnit::Terabyte,
        SizeUnit::Terabit,
        SizeUnit::Gigabyte,
        SizeUnit::Gigabit,
        SizeUnit::Megabyte,
        SizeUnit::Megabit,
        SizeUnit::Kilobyte,
        SizeUnit::Kilobit,
        SizeUnit::Byte,
        SizeUnit::Bit,
    ];

    /// Number of bits in one of this unit.
    pub const fn bits(self) -> f64 {
        match self {
            SizeUnit::Bit => BIT,
            SizeUnit::Byte => BYTE,
            SizeUnit::Kilobit => KILO * BIT,
            SizeUnit::Kilobyte => KILO * BYTE,
            SizeUnit::Megabit => MEGA * BIT,
            SizeUnit::Megabyte => MEGA * BYTE,
            SizeUnit::Gigabit => GIGA * BIT,
            SizeUnit::Gigabyte => GIGA * BYTE,
            SizeUnit::Terabit => TERA * BIT,
            SizeUnit::Terabyte => TERA * BYTE,
            SizeUnit::Petabit => PETA * BIT,
            SizeUnit::Petabyte => PETA * BYTE,
            SizeUnit::Exabit => EXA * BIT,
            SizeUnit::Exabyte => EXA * BYTE,
            SizeUnit::Zettabit => ZETTA * BIT,
            SizeUnit::Zettabyte => ZETTA * BYTE,
            SizeUnit::Yottabit => YOTTA * BIT,
            SizeUnit::Yottabyte => YOTTA * BYTE,
        }
    }

    /// Short label used by [`Size::to_human`].
    pub const fn label(self) -> &'static str {
        match self {
            SizeUnit::Bit => "b",
            SizeUnit::Byte => "B",
            SizeUnit::Kilobit => "kb",
            SizeUnit::Kilobyte => "kB",
            SizeUnit::Megabit => "Mb",
            SizeUnit::Megabyte => "MB",
            SizeUnit::Gigabit => "Gb",
            SizeUnit::Gigabyte => "GB",
            SizeUnit::Terabit => "Tb",
            SizeUnit::Terabyte => "TB",
            SizeUnit::Petabit => "Pb",
            SizeUnit::Petabyte => "PB",
            SizeUnit::Exabit => "Eb",
            SizeUnit::Exabyte => "EB",
            SizeUnit::Zettabit => "Zb",
            SizeUnit::Zettabyte => "ZB",
            SizeUnit::Yottabit => "Yb",
            SizeUnit::Yottabyte => "YB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeUnit::ALL
            .into_iter()
            .find(|unit| unit.label() == s)
            .ok_or_else(|| UnitError::InvalidLabel(s.to_string()))
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A data size stored as a float number of bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Size(f64);

impl Size {
    /// Create a size from a number of bits.
    pub const fn new(bits: f64) -> Self {
        Self(bits)
    }

    /// Create a size of `count` of the given unit.
    pub fn from_unit(count: f64, unit: SizeUnit) -> Self {
        Self(count * unit.bits())
    }

    /// The value in the given unit.
    pub fn in_unit(self, unit: SizeUnit) -> f64 {
        self.0 / unit.bits()
    }

    /// Total bits.
    pub fn bits(self) -> f64 {
        self.in_unit(SizeUnit::Bit)
    }

    /// Total bytes.
    pub fn bytes(self) -> f64 {
        self.in_unit(SizeUnit::Byte)
    }

    /// Total kilobits.
    pub fn kilobits(self) -> f64 {
        self.in_unit(SizeUnit::Kilobit)
    }

    /// Total kilobytes.
    pub fn kilobytes(self) -> f64 {
        self.in_unit(SizeUnit::Kilobyte)
    }

    /// Total megabits.
    pub fn megabits(self) -> f64 {
        self.in_unit(SizeUnit::Megabit)
    }

    /// Total megabytes.
    pub fn megabytes(self) -> f64 {
        self.in_unit(SizeUnit::Megabyte)
    }

    /// Total gigabits.
    pub fn gigabits(self) -> f64 {
        self.in_unit(SizeUnit::Gigabit)
    }

    /// Total gigabytes.
    pub fn gigabytes(self) -> f64 {
        self.in_unit(SizeUnit::Gigabyte)
    }

    /// Total terabits.
    pub fn terabits(self) -> f64 {
        self.in_unit(SizeUnit::Terabit)
    }

    /// Total terabytes.
    pub fn terabytes(self) -> f64 {
        self.in_unit(SizeUnit::Terabyte)
    }

    /// Total petabits.
    pub fn petabits(self) -> f64 {
        self.in_unit(SizeUnit::Petabit)
    }

    /// Total petabytes.
    pub fn petabytes(self) -> f64 {
        self.in_unit(SizeUnit::Petabyte)
    }

    /// Total exabits.
    pub fn exabits(self) -> f64 {
        self.in_unit(SizeUnit::Exabit)
    }

    /// Total exabytes.
    pub fn exabytes(self) -> f64 {
        self.in_unit(SizeUnit::Exabyte)
    }

    /// Total zettabits.
    pub fn zettabits(self) -> f64 {
        self.in_unit(SizeUnit::Zettabit)
    }

    /// Total zettabytes.
    pub fn zettabytes(self) -> f64 {
        self.in_unit(SizeUnit::Zettabyte)
    }

    /// Total yottabits.
    pub fn yottabits(self) -> f64 {
        self.in_unit(SizeUnit::Yottabit)
    }

    /// Total yottabytes.
    pub fn yottabytes(self) -> f64 {
        self.in_unit(SizeUnit::Yottabyte)
    }

    /// Render in the single largest unit the size reaches, rounded to a whole
    /// number (`"5GB"`). Lossy: use the accessors for exact values.
    pub fn to_human(self) -> String {
        let negative = self.0 < 0.0;
        let bits = self.0.abs();

        let (count, unit) = SizeUnit::ALL
            .into_iter()
            .find(|unit| bits / unit.bits() >= 1.0)
            .map(|unit| ((bits / unit.bits()).round(), unit))
            .unwrap_or((bits.round(), SizeUnit::Bit));

        if negative && count > 0.0 {
            format!("-{count:.0}{}", unit.label())
        } else {
            format!("{count:.0}{}", unit.label())
        }
    }
}

scalar_ops!(Size);

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}
