// ============================================================================
// Declarative value types
// ============================================================================
//
// Policies are written by operators, so thresholds are expressed in the usual
// human units ("4gb", "30d"). Both types round-trip through their string form
// and serialize as that string.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A byte quantity with binary units (1kb = 1024b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;
const PB: u64 = TB * 1024;

impl ByteSize {
    pub fn bytes(bytes: u64) -> Self {
        ByteSize(bytes)
    }

    pub fn kb(value: u64) -> Self {
        ByteSize(value * KB)
    }

    pub fn mb(value: u64) -> Self {
        ByteSize(value * MB)
    }

    pub fn gb(value: u64) -> Self {
        ByteSize(value * GB)
    }

    pub fn as_bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = [(PB, "pb"), (TB, "tb"), (GB, "gb"), (MB, "mb"), (KB, "kb")];
        for (factor, suffix) in units {
            if self.0 >= factor && self.0 % factor == 0 {
                return write!(f, "{}{}", self.0 / factor, suffix);
            }
        }
        write!(f, "{}b", self.0)
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err("empty byte size".to_string());
        }
        let (digits, factor) = if let Some(rest) = trimmed.strip_suffix("kb") {
            (rest, KB)
        } else if let Some(rest) = trimmed.strip_suffix("mb") {
            (rest, MB)
        } else if let Some(rest) = trimmed.strip_suffix("gb") {
            (rest, GB)
        } else if let Some(rest) = trimmed.strip_suffix("tb") {
            (rest, TB)
        } else if let Some(rest) = trimmed.strip_suffix("pb") {
            (rest, PB)
        } else if let Some(rest) = trimmed.strip_suffix('b') {
            (rest, 1)
        } else {
            (trimmed.as_str(), 1)
        };
        let value: u64 = digits
            .trim()
            .parse()
            .map_err(|_| format!("invalid byte size '{}'", input))?;
        value
            .checked_mul(factor)
            .map(ByteSize)
            .ok_or_else(|| format!("byte size '{}' overflows", input))
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// A duration with day-scale units ("30d", "2h", "10m", "3s", "500ms").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan(Duration);

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

impl TimeSpan {
    pub fn days(value: u64) -> Self {
        TimeSpan(Duration::from_millis(value * MS_PER_DAY))
    }

    pub fn hours(value: u64) -> Self {
        TimeSpan(Duration::from_millis(value * MS_PER_HOUR))
    }

    pub fn minutes(value: u64) -> Self {
        TimeSpan(Duration::from_millis(value * MS_PER_MINUTE))
    }

    pub fn seconds(value: u64) -> Self {
        TimeSpan(Duration::from_secs(value))
    }

    pub fn millis(value: u64) -> Self {
        TimeSpan(Duration::from_millis(value))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Chrono form for date arithmetic against index creation times.
    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.0).unwrap_or(chrono::Duration::MAX)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.as_millis() as u64;
        let units = [
            (MS_PER_DAY, "d"),
            (MS_PER_HOUR, "h"),
            (MS_PER_MINUTE, "m"),
            (MS_PER_SECOND, "s"),
        ];
        for (factor, suffix) in units {
            if ms >= factor && ms % factor == 0 {
                return write!(f, "{}{}", ms / factor, suffix);
            }
        }
        write!(f, "{}ms", ms)
    }
}

impl FromStr for TimeSpan {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err("empty duration".to_string());
        }
        let (digits, factor) = if let Some(rest) = trimmed.strip_suffix("ms") {
            (rest, 1)
        } else if let Some(rest) = trimmed.strip_suffix('d') {
            (rest, MS_PER_DAY)
        } else if let Some(rest) = trimmed.strip_suffix('h') {
            (rest, MS_PER_HOUR)
        } else if let Some(rest) = trimmed.strip_suffix('m') {
            (rest, MS_PER_MINUTE)
        } else if let Some(rest) = trimmed.strip_suffix('s') {
            (rest, MS_PER_SECOND)
        } else {
            return Err(format!("duration '{}' is missing a unit", input));
        };
        let value: u64 = digits
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        value
            .checked_mul(factor)
            .map(|ms| TimeSpan(Duration::from_millis(ms)))
            .ok_or_else(|| format!("duration '{}' overflows", input))
    }
}

impl Serialize for TimeSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size_parsing() {
        assert_eq!("4gb".parse::<ByteSize>().unwrap(), ByteSize::gb(4));
        assert_eq!("512kb".parse::<ByteSize>().unwrap(), ByteSize::kb(512));
        assert_eq!("17b".parse::<ByteSize>().unwrap(), ByteSize::bytes(17));
        assert_eq!("17".parse::<ByteSize>().unwrap(), ByteSize::bytes(17));
        assert_eq!("5GB".parse::<ByteSize>().unwrap(), ByteSize::gb(5));
        assert!("".parse::<ByteSize>().is_err());
        assert!("five gb".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_byte_size_display_round_trip() {
        for size in [
            ByteSize::bytes(0),
            ByteSize::bytes(1023),
            ByteSize::kb(3),
            ByteSize::mb(1536),
            ByteSize::gb(5),
        ] {
            let rendered = size.to_string();
            assert_eq!(rendered.parse::<ByteSize>().unwrap(), size, "{}", rendered);
        }
    }

    #[test]
    fn test_time_span_parsing() {
        assert_eq!("30d".parse::<TimeSpan>().unwrap(), TimeSpan::days(30));
        assert_eq!("2h".parse::<TimeSpan>().unwrap(), TimeSpan::hours(2));
        assert_eq!("10m".parse::<TimeSpan>().unwrap(), TimeSpan::minutes(10));
        assert_eq!("3s".parse::<TimeSpan>().unwrap(), TimeSpan::seconds(3));
        assert_eq!("500ms".parse::<TimeSpan>().unwrap(), TimeSpan::millis(500));
        assert!("30".parse::<TimeSpan>().is_err());
        assert!("d".parse::<TimeSpan>().is_err());
    }

    #[test]
    fn test_time_span_display_round_trip() {
        for span in [
            TimeSpan::days(30),
            TimeSpan::hours(36),
            TimeSpan::seconds(90),
            TimeSpan::millis(1500),
        ] {
            let rendered = span.to_string();
            assert_eq!(rendered.parse::<TimeSpan>().unwrap(), span, "{}", rendered);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let size: ByteSize = serde_json::from_str("\"4gb\"").unwrap();
        assert_eq!(size, ByteSize::gb(4));
        assert_eq!(serde_json::to_string(&size).unwrap(), "\"4gb\"");

        let span: TimeSpan = serde_json::from_str("\"30d\"").unwrap();
        assert_eq!(span, TimeSpan::days(30));
        assert_eq!(serde_json::to_string(&span).unwrap(), "\"30d\"");
    }
}
