//! Nanosecond-resolution durations.

use std::fmt;
use std::str::FromStr;

use crate::UnitError;

/// Time units, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    /// 24 hours.
    Day,
    /// 60 minutes.
    Hour,
    /// 60 seconds.
    Minute,
    /// 1000 milliseconds.
    Second,
    /// 1000 microseconds.
    Millisecond,
    /// 1000 nanoseconds.
    Microsecond,
    /// The base resolution.
    Nanosecond,
}

impl DurationUnit {
    /// Every unit, in rendering order.
    pub const ALL: [DurationUnit; 7] = [
        DurationUnit::Day,
        DurationUnit::Hour,
        DurationUnit::Minute,
        DurationUnit::Second,
        DurationUnit::Millisecond,
        DurationUnit::Microsecond,
        DurationUnit::Nanosecond,
    ];

    /// Number of nanoseconds in one of this unit.
    pub const fn nanoseconds(self) -> f64 {
        match self {
            DurationUnit::Nanosecond => 1.0,
            DurationUnit::Microsecond => 1_000.0,
            DurationUnit::Millisecond => 1_000_000.0,
            DurationUnit::Second => 1_000_000_000.0,
            DurationUnit::Minute => 60.0 * 1_000_000_000.0,
            DurationUnit::Hour => 3_600.0 * 1_000_000_000.0,
            DurationUnit::Day => 86_400.0 * 1_000_000_000.0,
        }
    }

    /// Short label used by [`Duration::to_human`].
    pub const fn label(self) -> &'static str {
        match self {
            DurationUnit::Nanosecond => "ns",
            DurationUnit::Microsecond => "us",
            DurationUnit::Millisecond => "ms",
            DurationUnit::Second => "s",
            DurationUnit::Minute => "m",
            DurationUnit::Hour => "h",
            DurationUnit::Day => "d",
        }
    }
}

impl FromStr for DurationUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DurationUnit::ALL
            .into_iter()
            .find(|unit| unit.label() == s)
            .ok_or_else(|| UnitError::InvalidLabel(s.to_string()))
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A span of time stored as a float number of nanoseconds.
///
/// Accessors always return floats, even for conversions that divide evenly.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Duration(f64);

impl Duration {
    /// One nanosecond.
    pub const NANOSECOND: Duration = Duration(DurationUnit::Nanosecond.nanoseconds());
    /// One microsecond.
    pub const MICROSECOND: Duration = Duration(DurationUnit::Microsecond.nanoseconds());
    /// One millisecond.
    pub const MILLISECOND: Duration = Duration(DurationUnit::Millisecond.nanoseconds());
    /// One second.
    pub const SECOND: Duration = Duration(DurationUnit::Second.nanoseconds());
    /// One minute.
    pub const MINUTE: Duration = Duration(DurationUnit::Minute.nanoseconds());
    /// One hour.
    pub const HOUR: Duration = Duration(DurationUnit::Hour.nanoseconds());
    /// One day.
    pub const DAY: Duration = Duration(DurationUnit::Day.nanoseconds());

    /// Create a duration from a number of nanoseconds.
    pub const fn new(nanoseconds: f64) -> Self {
        Self(nanoseconds)
    }

    /// Create a duration of `count` of the given unit.
    pub fn from_unit(count: f64, unit: DurationUnit) -> Self {
        Self(count * unit.nanoseconds())
    }

    /// Convert from a standard library duration.
    pub fn from_std(duration: std::time::Duration) -> Self {
        Self(duration.as_nanos() as f64)
    }

    /// Convert to a standard library duration. Negative and non-finite
    /// values have no `std` representation.
    pub fn to_std(self) -> Option<std::time::Duration> {
        if self.0.is_finite() && self.0 >= 0.0 {
            Some(std::time::Duration::from_nanos(self.0.round() as u64))
        } else {
            None
        }
    }

    /// The value in the given unit.
    pub fn in_unit(self, unit: DurationUnit) -> f64 {
        self.0 / unit.nanoseconds()
    }

    /// Total nanoseconds.
    pub fn nanoseconds(self) -> f64 {
        self.in_unit(DurationUnit::Nanosecond)
    }

    /// Total microseconds.
    pub fn microseconds(self) -> f64 {
        self.in_unit(DurationUnit::Microsecond)
    }

    /// Total milliseconds.
    pub fn milliseconds(self) -> f64 {
        self.in_unit(DurationUnit::Millisecond)
    }

    /// Total seconds.
    pub fn seconds(self) -> f64 {
        self.in_unit(DurationUnit::Second)
    }

    /// Total minutes.
    pub fn minutes(self) -> f64 {
        self.in_unit(DurationUnit::Minute)
    }

    /// Total hours.
    pub fn hours(self) -> f64 {
        self.in_unit(DurationUnit::Hour)
    }

    /// Total days.
    pub fn days(self) -> f64 {
        self.in_unit(DurationUnit::Day)
    }

    /// Render every nonzero part down to nanoseconds, e.g. `"2d21h8m22s890ms389us24ns"`.
    pub fn to_human(self) -> String {
        self.to_human_until(DurationUnit::Nanosecond)
    }

    /// Render nonzero parts from days down to `smallest`, dropping anything
    /// finer. Zero renders as `0<smallest>`.
    pub fn to_human_until(self, smallest: DurationUnit) -> String {
        let negative = self.0 < 0.0;
        let mut remaining = self.0.abs();
        let mut out = String::new();

        for unit in DurationUnit::ALL {
            let size = unit.nanoseconds();
            let count = (remaining / size).floor();
            if count > 0.0 {
                out.push_str(&format!("{count:.0}"));
                out.push_str(unit.label());
                remaining -= count * size;
            }
            if unit == smallest {
                break;
            }
        }

        if out.is_empty() {
            return format!("0{}", smallest.label());
        }
        if negative {
            out.insert(0, '-');
        }
        out
    }
}

scalar_ops!(Duration);

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}

impl From<std::time::Duration> for Duration {
    fn from(duration: std::time::Duration) -> Self {
        Self::from_std(duration)
    }
}
