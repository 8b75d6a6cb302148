//! Text cleanup, string decoding and numbering helpers.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::{AnnotError, Result};

/// Characters replaced by plain ASCII equivalents in captured text.
const CHARACTER_SUBSTITUTIONS: [(char, &str); 10] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2026}', "..."),
];

fn substitute(c: char) -> Option<&'static str> {
    CHARACTER_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Normalises line endings and replaces ligatures and smart punctuation.
pub fn cleanup_text(text: &str) -> String {
    let normalised;
    let text = if text.contains('\r') {
        normalised = text.replace("\r\n", "\n").replace('\r', "\n");
        normalised.as_str()
    } else {
        text
    };

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match substitute(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }
    out
}

/// Merges captured lines into a single string.
///
/// Blank lines are dropped. A line break following a lowercase letter and a
/// hyphen is joined without a space (and the hyphen removed if
/// `remove_hyphens`); any other line break becomes exactly one space, unless
/// whitespace is already present on either side of it. Leading and trailing
/// whitespace is stripped only when `strip_space` is set.
pub fn merge_lines(captured_text: &str, remove_hyphens: bool, strip_space: bool) -> String {
    let lines: Vec<&str> = captured_text.lines().collect();
    let mut results: Vec<String> = Vec::with_capacity(lines.len());

    for (i, &thisline) in lines.iter().enumerate() {
        if thisline.is_empty() {
            continue;
        }
        let nextline = lines.get(i + 1).copied();

        let mut tail = thisline.chars().rev();
        let last = tail.next();
        let before_last = tail.next();

        let mut line = thisline.to_string();
        if last == Some('-') && before_last.is_some_and(char::is_lowercase) {
            if remove_hyphens {
                line.pop();
            }
        } else if last.is_some_and(|c| !c.is_whitespace())
            && nextline.is_some_and(|next| {
                next.chars().next().is_none_or(|c| !c.is_whitespace())
            })
        {
            line.push(' ');
        }

        results.push(cleanup_text(&line));
    }

    if strip_space && !results.is_empty() {
        let first = results[0].trim_start().to_string();
        results[0] = first;
        let n = results.len() - 1;
        let last = results[n].trim_end().to_string();
        results[n] = last;
    }

    results.concat()
}

/// PDFDocEncoding table - maps bytes 0-255 to Unicode code points.
const PDF_DOC_ENCODING: [u32; 256] = [
    0x0000, 0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x0006, 0x0007, 0x0008, 0x0009, 0x000A, 0x000B,
    0x000C, 0x000D, 0x000E, 0x000F, 0x0010, 0x0011, 0x0012, 0x0013, 0x0014, 0x0015, 0x0017, 0x0017,
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC, 0x0020, 0x0021, 0x0022, 0x0023,
    0x0024, 0x0025, 0x0026, 0x0027, 0x0028, 0x0029, 0x002A, 0x002B, 0x002C, 0x002D, 0x002E, 0x002F,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x003A, 0x003B,
    0x003C, 0x003D, 0x003E, 0x003F, 0x0040, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047,
    0x0048, 0x0049, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x0053,
    0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x005B, 0x005C, 0x005D, 0x005E, 0x005F,
    0x0060, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x006A, 0x006B,
    0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077,
    0x0078, 0x0079, 0x007A, 0x007B, 0x007C, 0x007D, 0x007E, 0x0000, 0x2022, 0x2020, 0x2021, 0x2026,
    0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203A, 0x2212, 0x2030, 0x201E, 0x201C, 0x201D, 0x2018,
    0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141, 0x0152, 0x0160, 0x0178, 0x017D, 0x0131, 0x0142,
    0x0153, 0x0161, 0x017E, 0x0000, 0x20AC, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x0000, 0x00AE, 0x00AF, 0x00B0, 0x00B1, 0x00B2, 0x00B3,
    0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA, 0x00CB,
    0x00CC, 0x00CD, 0x00CE, 0x00CF, 0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF, 0x00E0, 0x00E1, 0x00E2, 0x00E3,
    0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA, 0x00FB,
    0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

/// Decodes a PDF text string (UTF-16BE, UTF-8 or PDFDocEncoding) to Unicode.
pub fn decode_text(s: &[u8]) -> String {
    if s.len() >= 2 && s[0] == 0xFE && s[1] == 0xFF {
        let u16_chars: Vec<u16> = s[2..]
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(((chunk[0] as u16) << 8) | (chunk[1] as u16))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&u16_chars)
    } else if s.len() >= 3 && s[..3] == [0xEF, 0xBB, 0xBF] {
        String::from_utf8_lossy(&s[3..]).into_owned()
    } else {
        s.iter()
            .filter_map(|&c| char::from_u32(PDF_DOC_ENCODING[c as usize]))
            .collect()
    }
}

/// Parses a PDF date string such as `D:20190119212926-08'00'`.
///
/// A missing UTC offset is taken as UTC. Returns `None` for anything that
/// does not parse.
pub fn decode_datetime(dts: &str) -> Option<DateTime<FixedOffset>> {
    let dts = dts.strip_prefix("D:").unwrap_or(dts);
    let mut dts = dts.replace('\'', "");
    if let Some(zi) = dts.find('Z') {
        dts.truncate(zi);
        dts.push_str("+0000");
    }

    if let Ok(dt) = DateTime::parse_from_str(&dts, "%Y%m%d%H%M%S%z") {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(&dts, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

const ROMAN_ONES: [char; 4] = ['i', 'x', 'c', 'm'];
const ROMAN_FIVES: [char; 3] = ['v', 'l', 'd'];

/// Formats a number as lowercase Roman numerals.
///
/// Values outside 1..4000 have no Roman representation and are an error.
pub fn format_int_roman(value: u32) -> Result<String> {
    if value == 0 || value >= 4000 {
        return Err(AnnotError::PageLabel(format!(
            "{value} cannot be written in Roman numerals"
        )));
    }

    let mut result = String::new();
    let mut value = value;
    let mut index = 0;

    while value != 0 {
        let remainder = value % 10;
        value /= 10;

        let part = if remainder == 9 {
            format!("{}{}", ROMAN_ONES[index], ROMAN_ONES[index + 1])
        } else if remainder == 4 {
            format!("{}{}", ROMAN_ONES[index], ROMAN_FIVES[index])
        } else {
            let over_five = remainder >= 5;
            let r = if over_five { remainder - 5 } else { remainder };
            let ones: String = std::iter::repeat_n(ROMAN_ONES[index], r as usize).collect();
            if over_five {
                format!("{}{}", ROMAN_FIVES[index], ones)
            } else {
                ones
            }
        };
        result.insert_str(0, &part);
        index += 1;
    }

    Ok(result)
}

/// Formats a number as lowercase letters a-z, aa-zz, etc.
pub fn format_int_alpha(value: u32) -> Result<String> {
    if value == 0 {
        return Err(AnnotError::PageLabel(
            "0 cannot be written as letters".to_string(),
        ));
    }

    let mut result = Vec::new();
    let mut value = value;

    while value != 0 {
        let remainder = ((value - 1) % 26) as u8;
        value = (value - 1) / 26;
        result.push((b'a' + remainder) as char);
    }

    result.reverse();
    Ok(result.into_iter().collect())
}
