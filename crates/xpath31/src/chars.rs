//! XML name character classes, without the colon.

const NAME_START_RANGES: &[(u32, u32)] = &[
    (0x41, 0x5A),
    (0x5F, 0x5F),
    (0x61, 0x7A),
    (0xC0, 0xD6),
    (0xD8, 0xF6),
    (0xF8, 0x2FF),
    (0x370, 0x37D),
    (0x37F, 0x1FFF),
    (0x200C, 0x200D),
    (0x2070, 0x218F),
    (0x2C00, 0x2FEF),
    (0x3001, 0xD7FF),
    (0xF900, 0xFDCF),
    (0xFDF0, 0xFFFD),
    (0x10000, 0xEFFFF),
];

const NAME_EXTRA_RANGES: &[(u32, u32)] = &[
    (0x2D, 0x2E),
    (0x30, 0x39),
    (0xB7, 0xB7),
    (0x300, 0x36F),
    (0x203F, 0x2040),
];

fn in_ranges(ranges: &[(u32, u32)], c: char) -> bool {
    let c = c as u32;
    ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi)
}

pub fn is_name_start_char(c: char) -> bool {
    in_ranges(NAME_START_RANGES, c)
}

pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || in_ranges(NAME_EXTRA_RANGES, c)
}

/// True when the token could be an NCName (it starts with a name-start char).
pub fn starts_name(token: &str) -> bool {
    token.chars().next().is_some_and(is_name_start_char)
}
