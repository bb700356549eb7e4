//! Encoded polyline codec.
//!
//! Compresses a path of coordinates into the printable text format used by
//! map providers: every axis is stored as the rounded delta to the previous
//! point, zigzag mapped to an unsigned value and written in 5 bit groups,
//! least significant group first, with `0x20` marking that another group
//! follows. Each group is offset by 63 so it lands in `'?'..='~'`.

use std::{error, fmt, iter::Peekable};

use crate::geo::Coordinate;

/// Precision used by Google and most other providers (1e-5 degrees).
pub const DEFAULT_PRECISION: u32 = 5;

/// Largest supported number of decimal digits.
pub const MAX_PRECISION: u32 = 10;

const CHAR_OFFSET: u8 = 63;
const CONTINUATION_BIT: u64 = 0x20;
const GROUP_MASK: u64 = 0x1f;

// Scaled values must stay exactly representable in an `f64`.
const MAX_SCALED: f64 = (1u64 << 52) as f64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolylineError {
    InvalidArgument(String),
}

impl error::Error for PolylineError {}

impl fmt::Display for PolylineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolylineError::InvalidArgument(reason) => {
                write!(f, "Invalid polyline argument: {}", reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PolylineError>;

pub fn encode(path: &[Coordinate]) -> Result<String> {
    encode_with_precision(path, DEFAULT_PRECISION)
}

pub fn decode(encoded: &str) -> Result<Vec<Coordinate>> {
    decode_with_precision(encoded, DEFAULT_PRECISION)
}

pub fn encode_with_precision(path: &[Coordinate], precision: u32) -> Result<String> {
    let factor = factor(precision)?;

    let mut encoded = String::with_capacity(path.len() * 8);
    let mut previous_latitude = 0i64;
    let mut previous_longitude = 0i64;

    for (index, coordinate) in path.iter().enumerate() {
        let latitude = scale(coordinate.latitude, factor, index)?;
        let longitude = scale(coordinate.longitude, factor, index)?;

        write_value(&mut encoded, latitude - previous_latitude);
        write_value(&mut encoded, longitude - previous_longitude);

        previous_latitude = latitude;
        previous_longitude = longitude;
    }

    Ok(encoded)
}

pub fn decode_with_precision(encoded: &str, precision: u32) -> Result<Vec<Coordinate>> {
    let factor = factor(precision)?;

    let mut chars = encoded.bytes().enumerate().peekable();
    let mut path = Vec::new();
    let mut latitude = 0i64;
    let mut longitude = 0i64;

    while chars.peek().is_some() {
        latitude = accumulate(latitude, read_value(&mut chars)?)?;

        if chars.peek().is_none() {
            return Err(PolylineError::InvalidArgument(format!(
                "missing longitude for point {}",
                path.len()
            )));
        }
        longitude = accumulate(longitude, read_value(&mut chars)?)?;

        path.push(Coordinate::new(
            latitude as f64 / factor,
            longitude as f64 / factor,
        ));
    }

    Ok(path)
}

fn factor(precision: u32) -> Result<f64> {
    if precision > MAX_PRECISION {
        return Err(PolylineError::InvalidArgument(format!(
            "precision {} exceeds the maximum of {}",
            precision, MAX_PRECISION
        )));
    }
    Ok(10f64.powi(precision as i32))
}

fn scale(value: f64, factor: f64, index: usize) -> Result<i64> {
    if !value.is_finite() {
        return Err(PolylineError::InvalidArgument(format!(
            "coordinate {} is not a finite number",
            index
        )));
    }
    let scaled = (value * factor).round();
    if scaled.abs() > MAX_SCALED {
        return Err(PolylineError::InvalidArgument(format!(
            "coordinate {} is out of range",
            index
        )));
    }
    Ok(scaled as i64)
}

fn write_value(encoded: &mut String, delta: i64) {
    let mut value = if delta < 0 {
        !(delta << 1) as u64
    } else {
        (delta << 1) as u64
    };

    while value >= CONTINUATION_BIT {
        let group = (CONTINUATION_BIT | (value & GROUP_MASK)) as u8;
        encoded.push((group + CHAR_OFFSET) as char);
        value >>= 5;
    }
    encoded.push((value as u8 + CHAR_OFFSET) as char);
}

fn read_value<I>(chars: &mut Peekable<I>) -> Result<i64>
where
    I: Iterator<Item = (usize, u8)>,
{
    let mut value = 0u64;
    let mut shift = 0u32;

    loop {
        let (index, byte) = chars.next().ok_or_else(|| {
            PolylineError::InvalidArgument(
                "input ends in the middle of a value".to_owned(),
            )
        })?;

        if !(CHAR_OFFSET..=CHAR_OFFSET + 63).contains(&byte) {
            return Err(PolylineError::InvalidArgument(format!(
                "unexpected character at position {}",
                index
            )));
        }

        let group = (byte - CHAR_OFFSET) as u64;
        let bits = group & GROUP_MASK;
        if shift >= 64 || (shift > 59 && bits >> (64 - shift) != 0) {
            return Err(PolylineError::InvalidArgument(format!(
                "value ending at position {} does not fit into 64 bits",
                index
            )));
        }
        value |= bits << shift;
        shift += 5;

        if group & CONTINUATION_BIT == 0 {
            break;
        }
    }

    if value & 1 == 1 {
        Ok(!(value >> 1) as i64)
    } else {
        Ok((value >> 1) as i64)
    }
}

fn accumulate(total: i64, delta: i64) -> Result<i64> {
    total.checked_add(delta).ok_or_else(|| {
        PolylineError::InvalidArgument("accumulated value overflows".to_owned())
    })
}
