//! Dotted numeric OS versions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// An OS version such as `14.4.1`, ordered segment by segment.
///
/// Missing trailing segments count as zero, so `14.0` equals `14`. Anything
/// after the first whitespace (e.g. a rapid security response marker like
/// `(a)`) is ignored.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
    raw: String,
}

impl Version {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let token = raw
            .split_whitespace()
            .next()
            .ok_or_else(|| ParseError::Version(raw.to_string()))?;

        let segments = token
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ParseError::Version(raw.to_string()));
                }
                segment
                    .parse::<u64>()
                    .map_err(|_| ParseError::Version(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            raw: token.to_string(),
        })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("14.9") < v("14.10"));
        assert!(v("10.9") < v("10.10"));
        assert!("14.9" > "14.10");
    }

    #[test]
    fn test_trailing_zero_segments() {
        assert_eq!(v("14"), v("14.0"));
        assert_eq!(v("14.0.0"), v("14"));
        assert!(v("14.0.1") > v("14"));
    }

    #[test]
    fn test_major_dominates() {
        assert!(v("13.6.9") < v("14.0"));
        assert!(v("17.0") > v("16.7.8"));
    }

    #[test]
    fn test_rapid_security_response_suffix() {
        let version = v("13.3.1 (a)");
        assert_eq!(version.segments(), &[13, 3, 1]);
        assert_eq!(version.to_string(), "13.3.1");
        assert_eq!(version, v("13.3.1"));
    }

    #[test]
    fn test_invalid_versions() {
        for raw in ["", "   ", "14.x", "14..1", "beta", "14.4-rc1", "+1.2"] {
            assert!(Version::parse(raw).is_err(), "{:?} should not parse", raw);
        }
    }
}
