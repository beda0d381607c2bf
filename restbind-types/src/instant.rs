/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Instants in time and their wire-level timestamp encodings.

use chrono::{DateTime, SecondsFormat, Utc};
use std::error::Error;
use std::fmt;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// An instant in time, stored as seconds (and subsecond nanos) since the Unix epoch.
///
/// `Instant` deliberately carries no timezone; all wire encodings are UTC.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Instant {
    seconds: i64,
    subsecond_nanos: u32,
}

/// The wire encodings a timestamp can take in an HTTP-bound protocol.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Format {
    /// ISO-8601 / RFC-3339 calendar timestamp without fractional seconds,
    /// e.g. `2021-01-01T00:00:00Z`.
    DateTime,
    /// RFC-5322 / IMF-fixdate, e.g. `Mon, 16 Dec 2019 23:48:18 GMT`.
    HttpDate,
    /// Floating point count of seconds since the Unix epoch.
    EpochSeconds,
}

impl Instant {
    /// Creates an `Instant` from a whole number of seconds since the Unix epoch.
    pub fn from_epoch_seconds(epoch_seconds: i64) -> Self {
        Instant {
            seconds: epoch_seconds,
            subsecond_nanos: 0,
        }
    }

    /// Creates an `Instant` from seconds and subsecond nanos.
    pub fn from_secs_and_nanos(seconds: i64, subsecond_nanos: u32) -> Self {
        Instant {
            seconds,
            subsecond_nanos,
        }
    }

    /// Creates an `Instant` from a fractional count of epoch seconds.
    pub fn from_f64(epoch_seconds: f64) -> Self {
        let seconds = epoch_seconds.floor();
        let fraction = epoch_seconds - seconds;
        Instant {
            seconds: seconds as i64,
            subsecond_nanos: (fraction * NANOS_PER_SECOND as f64) as u32,
        }
    }

    /// Whole seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> i64 {
        self.seconds
    }

    /// Seconds since the Unix epoch, including the fractional part.
    pub fn epoch_fractional_seconds(&self) -> f64 {
        self.seconds as f64 + self.subsecond_nanos as f64 / NANOS_PER_SECOND as f64
    }

    /// True when this instant is not on a whole-second boundary.
    pub fn has_subsecond_nanos(&self) -> bool {
        self.subsecond_nanos != 0
    }

    fn to_chrono(self) -> Result<DateTime<Utc>, InstantFormatError> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.subsecond_nanos)
            .ok_or(InstantFormatError::OutOfRange(self.seconds))
    }

    /// Renders this instant in the given wire format.
    ///
    /// Fails only when the instant is outside the representable calendar range
    /// of the format.
    pub fn fmt(&self, format: Format) -> Result<String, InstantFormatError> {
        match format {
            Format::DateTime => Ok(self
                .to_chrono()?
                .to_rfc3339_opts(SecondsFormat::Secs, true)),
            Format::HttpDate => Ok(self
                .to_chrono()?
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string()),
            Format::EpochSeconds => {
                if self.subsecond_nanos == 0 {
                    Ok(self.seconds.to_string())
                } else {
                    let fraction = format!("{:0>9}", self.subsecond_nanos);
                    Ok(format!("{}.{}", self.seconds, fraction.trim_end_matches('0')))
                }
            }
        }
    }

    /// Parses an instant from its wire representation in the given format.
    pub fn parse(value: &str, format: Format) -> Result<Self, InstantParseError> {
        match format {
            Format::DateTime => {
                let parsed = DateTime::parse_from_rfc3339(value.trim())
                    .map_err(|_| InstantParseError::new(Format::DateTime, value))?;
                Ok(Instant::from_secs_and_nanos(
                    parsed.timestamp(),
                    parsed.timestamp_subsec_nanos(),
                ))
            }
            Format::HttpDate => {
                let parsed = DateTime::parse_from_rfc2822(value.trim())
                    .map_err(|_| InstantParseError::new(Format::HttpDate, value))?;
                Ok(Instant::from_secs_and_nanos(
                    parsed.timestamp(),
                    parsed.timestamp_subsec_nanos(),
                ))
            }
            Format::EpochSeconds => {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| InstantParseError::new(Format::EpochSeconds, value))?;
                if !parsed.is_finite() {
                    return Err(InstantParseError::new(Format::EpochSeconds, value));
                }
                Ok(Instant::from_f64(parsed))
            }
        }
    }
}

/// A timestamp string that could not be parsed against its declared format.
#[derive(Debug, PartialEq, Eq)]
pub struct InstantParseError {
    format: Format,
    value: String,
}

impl InstantParseError {
    fn new(format: Format, value: &str) -> Self {
        InstantParseError {
            format,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for InstantParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` could not be parsed as a {:?} timestamp",
            self.value, self.format
        )
    }
}

impl Error for InstantParseError {}

/// An instant that cannot be rendered in the requested format.
#[derive(Debug, PartialEq, Eq)]
pub enum InstantFormatError {
    /// The instant falls outside the calendar range chrono can represent.
    OutOfRange(i64),
}

impl fmt::Display for InstantFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstantFormatError::OutOfRange(seconds) => {
                write!(f, "epoch seconds {} are outside the formattable range", seconds)
            }
        }
    }
}

impl Error for InstantFormatError {}
