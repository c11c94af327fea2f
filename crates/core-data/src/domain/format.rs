//! # printf-style Format Strings
//!
//! A value descriptor may carry a format string for rendering its readings.
//! A format string is accepted when it contains at least one specifier of
//! the form
//!
//! ```text
//! %[index$][flags][width][.precision][t|T]conversion
//! ```
//!
//! where `flags` is any run of `-#+ 0,(<` and `conversion` is an ASCII
//! letter or `%`. Text around the specifier is free, so `"%.2f C"` and
//! `"temp: %d"` are both accepted while `"error"` is not.

/// One specifier found inside a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpecifier<'a> {
    /// Explicit argument index (`%2$s` → `Some("2")`).
    pub index: Option<&'a str>,
    /// Flag characters, possibly empty.
    pub flags: &'a str,
    /// Minimum width digits.
    pub width: Option<&'a str>,
    /// Precision digits, without the dot.
    pub precision: Option<&'a str>,
    /// `t`/`T` date-time prefix.
    pub date_prefix: Option<char>,
    /// Conversion character.
    pub conversion: char,
    /// Byte offset of the `%` that starts the specifier.
    pub offset: usize,
}

const FLAGS: &[u8] = b"-#+ 0,(<";

/// Whether a descriptor's format string is acceptable.
///
/// The empty string means "no formatting constraint" and is accepted.
#[must_use]
pub fn is_valid_format(formatting: &str) -> bool {
    formatting.is_empty() || find_specifier(formatting).is_some()
}

/// Find the first specifier in `input`.
#[must_use]
pub fn find_specifier(input: &str) -> Option<FormatSpecifier<'_>> {
    input
        .match_indices('%')
        .find_map(|(offset, _)| specifier_at(input, offset))
}

fn specifier_at(input: &str, offset: usize) -> Option<FormatSpecifier<'_>> {
    let bytes = input.as_bytes();
    let mut pos = offset + 1;

    // Argument index only counts when the digits are closed by '$'.
    let mut index = None;
    let digits_end = skip_digits(bytes, pos);
    if digits_end > pos && bytes.get(digits_end) == Some(&b'$') {
        index = Some(&input[pos..digits_end]);
        pos = digits_end + 1;
    }

    let flags_start = pos;
    while bytes.get(pos).is_some_and(|b| FLAGS.contains(b)) {
        pos += 1;
    }
    let flags = &input[flags_start..pos];

    let mut width = None;
    let width_end = skip_digits(bytes, pos);
    if width_end > pos {
        width = Some(&input[pos..width_end]);
        pos = width_end;
    }

    let mut precision = None;
    if bytes.get(pos) == Some(&b'.') {
        let precision_end = skip_digits(bytes, pos + 1);
        if precision_end > pos + 1 {
            precision = Some(&input[pos + 1..precision_end]);
            pos = precision_end;
        }
    }

    let mut date_prefix = None;
    let current = *bytes.get(pos)?;
    if matches!(current, b't' | b'T') && bytes.get(pos + 1).copied().is_some_and(is_conversion) {
        date_prefix = Some(current as char);
        pos += 1;
    }

    let conversion = *bytes.get(pos)?;
    if !is_conversion(conversion) {
        return None;
    }

    Some(FormatSpecifier {
        index,
        flags,
        width,
        precision,
        date_prefix,
        conversion: conversion as char,
        offset,
    })
}

fn skip_digits(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos
}

fn is_conversion(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'%'
}
