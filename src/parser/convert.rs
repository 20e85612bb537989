//! Conversion of accumulated argument text into typed values.

use crate::command::{ArgType, ArgValue, CharData};
use crate::error::codes;
use crate::MAX_STRING_LEN;

use super::mnemonic::is_program_whitespace;

/// SI multiplier suffixes accepted after a number. Case matters: `m` is milli,
/// `M` mega.
const MULTIPLIERS: &[u8] = b"kMGmunp";

/// Convert the collected token into the expected type. The token is trimmed of
/// surrounding whitespace first; an empty token reads as a missing parameter.
pub(crate) fn convert(ty: ArgType, token: &[u8]) -> Result<ArgValue, i16> {
    let token = trim(token);
    if token.is_empty() {
        return Err(codes::MISSING_PARAMETER);
    }
    match ty {
        ArgType::Int => parse_int(token).map(ArgValue::Int),
        ArgType::Float => parse_float(token).map(ArgValue::Float),
        ArgType::Bool => parse_bool(token).map(ArgValue::Bool),
        ArgType::Chardata => parse_chardata(token).map(ArgValue::Chardata),
        // quoted strings and blocks are assembled by their own parser states;
        // bare text in their place is malformed
        ArgType::String => Err(codes::INVALID_STRING_DATA),
        ArgType::Blob => Err(codes::INVALID_BLOCK_DATA),
    }
}

fn trim(mut token: &[u8]) -> &[u8] {
    while let Some((&first, rest)) = token.split_first() {
        if !is_program_whitespace(first) {
            break;
        }
        token = rest;
    }
    while let Some((&last, rest)) = token.split_last() {
        if !is_program_whitespace(last) {
            break;
        }
        token = rest;
    }
    token
}

fn split_multiplier(token: &[u8]) -> (&[u8], Option<u8>) {
    match token.split_last() {
        Some((&last, head)) if MULTIPLIERS.contains(&last) => (head, Some(last)),
        _ => (token, None),
    }
}

fn numeric_error(err: lexical_core::Error) -> i16 {
    match err {
        lexical_core::Error::InvalidDigit(_) => codes::INVALID_CHARACTER_IN_NUMBER,
        _ => codes::NUMERIC_DATA_ERROR,
    }
}

fn parse_int(token: &[u8]) -> Result<i32, i16> {
    let (digits, multiplier) = split_multiplier(token);
    let value = lexical_core::parse::<i32>(digits).map_err(numeric_error)?;
    match multiplier {
        None => Ok(value),
        Some(b'k') => value.checked_mul(1_000).ok_or(codes::NUMERIC_DATA_ERROR),
        Some(b'M') => value
            .checked_mul(1_000_000)
            .ok_or(codes::NUMERIC_DATA_ERROR),
        Some(b'G') => value
            .checked_mul(1_000_000_000)
            .ok_or(codes::NUMERIC_DATA_ERROR),
        Some(b'm') => Ok(value / 1_000),
        Some(b'u') => Ok(value / 1_000_000),
        Some(b'n') => Ok(value / 1_000_000_000),
        Some(b'p') => Ok(0),
        Some(_) => Err(codes::INVALID_CHARACTER_IN_NUMBER),
    }
}

fn parse_float(token: &[u8]) -> Result<f32, i16> {
    let (digits, multiplier) = split_multiplier(token);
    let value = lexical_core::parse::<f32>(digits).map_err(numeric_error)?;
    let factor = match multiplier {
        None => 1.0,
        Some(b'k') => 1e3,
        Some(b'M') => 1e6,
        Some(b'G') => 1e9,
        Some(b'm') => 1e-3,
        Some(b'u') => 1e-6,
        Some(b'n') => 1e-9,
        Some(b'p') => 1e-12,
        Some(_) => return Err(codes::INVALID_CHARACTER_IN_NUMBER),
    };
    Ok(value * factor)
}

fn parse_bool(token: &[u8]) -> Result<bool, i16> {
    if token.eq_ignore_ascii_case(b"ON") || token == b"1" {
        Ok(true)
    } else if token.eq_ignore_ascii_case(b"OFF") || token == b"0" {
        Ok(false)
    } else {
        Err(codes::NUMERIC_DATA_ERROR)
    }
}

fn parse_chardata(token: &[u8]) -> Result<CharData, i16> {
    if !token
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(codes::INVALID_CHARACTER_DATA);
    }
    if token.len() > MAX_STRING_LEN {
        return Err(codes::CHARACTER_DATA_TOO_LONG);
    }
    let mut data = CharData::new();
    let _ = data.try_extend_from_slice(token);
    Ok(data)
}
