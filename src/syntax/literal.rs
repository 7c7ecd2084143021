//! Python string literal contents.

/// Names accepted by `\N{...}` for the characters `str.isspace` matches.
/// Lookup is case-insensitive, as in `unicodedata.lookup`.
const WHITESPACE_NAMES: &[(&str, char)] = &[
    ("CHARACTER TABULATION", '\t'),
    ("HORIZONTAL TABULATION", '\t'),
    ("TAB", '\t'),
    ("HT", '\t'),
    ("LINE FEED", '\n'),
    ("NEW LINE", '\n'),
    ("END OF LINE", '\n'),
    ("LF", '\n'),
    ("NL", '\n'),
    ("EOL", '\n'),
    ("LINE TABULATION", '\u{0b}'),
    ("VERTICAL TABULATION", '\u{0b}'),
    ("VT", '\u{0b}'),
    ("FORM FEED", '\u{0c}'),
    ("FF", '\u{0c}'),
    ("CARRIAGE RETURN", '\r'),
    ("CR", '\r'),
    ("INFORMATION SEPARATOR FOUR", '\u{1c}'),
    ("FILE SEPARATOR", '\u{1c}'),
    ("FS", '\u{1c}'),
    ("INFORMATION SEPARATOR THREE", '\u{1d}'),
    ("GROUP SEPARATOR", '\u{1d}'),
    ("GS", '\u{1d}'),
    ("INFORMATION SEPARATOR TWO", '\u{1e}'),
    ("RECORD SEPARATOR", '\u{1e}'),
    ("RS", '\u{1e}'),
    ("INFORMATION SEPARATOR ONE", '\u{1f}'),
    ("UNIT SEPARATOR", '\u{1f}'),
    ("US", '\u{1f}'),
    ("SPACE", ' '),
    ("SP", ' '),
    ("NEXT LINE", '\u{85}'),
    ("NEL", '\u{85}'),
    ("NO-BREAK SPACE", '\u{a0}'),
    ("NBSP", '\u{a0}'),
    ("OGHAM SPACE MARK", '\u{1680}'),
    ("EN QUAD", '\u{2000}'),
    ("EM QUAD", '\u{2001}'),
    ("EN SPACE", '\u{2002}'),
    ("EM SPACE", '\u{2003}'),
    ("THREE-PER-EM SPACE", '\u{2004}'),
    ("FOUR-PER-EM SPACE", '\u{2005}'),
    ("SIX-PER-EM SPACE", '\u{2006}'),
    ("FIGURE SPACE", '\u{2007}'),
    ("PUNCTUATION SPACE", '\u{2008}'),
    ("THIN SPACE", '\u{2009}'),
    ("HAIR SPACE", '\u{200a}'),
    ("LINE SEPARATOR", '\u{2028}'),
    ("PARAGRAPH SEPARATOR", '\u{2029}'),
    ("NARROW NO-BREAK SPACE", '\u{202f}'),
    ("MEDIUM MATHEMATICAL SPACE", '\u{205f}'),
    ("IDEOGRAPHIC SPACE", '\u{3000}'),
];

/// Whitespace as Python's `str.isspace` defines it.
///
/// Unicode `White_Space` plus the four ASCII information separators.
pub(super) fn is_python_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// True when the literal's value is empty or only whitespace.
///
/// `content` is the source text between the quotes. Escapes are decoded
/// unless the literal is raw. A name in `\N{...}` outside the whitespace
/// table is some other character, so it makes the literal non-blank.
pub(super) fn is_blank(content: &str, raw: bool) -> bool {
    if raw {
        return content.chars().all(is_python_space);
    }

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if !is_python_space(c) {
                return false;
            }
            continue;
        }

        let decoded = match chars.next() {
            // line continuation
            Some('\n') => continue,
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                continue;
            }
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('f') => Some('\u{0c}'),
            Some('v') => Some('\u{0b}'),
            Some('x') => hex_escape(&mut chars, 2),
            Some('u') => hex_escape(&mut chars, 4),
            Some('U') => hex_escape(&mut chars, 8),
            Some('N') => named_escape(&mut chars),
            Some(d @ '0'..='7') => octal_escape(d, &mut chars),
            _ => None,
        };

        match decoded {
            Some(c) if is_python_space(c) => {}
            _ => return false,
        }
    }
    true
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

fn octal_escape(
    first: char,
    chars: &mut std::iter::Peekable<impl Iterator<Item = char>>,
) -> Option<char> {
    let mut value = first.to_digit(8)?;
    for _ in 0..2 {
        match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                value = value * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    char::from_u32(value)
}

fn named_escape(chars: &mut impl Iterator<Item = char>) -> Option<char> {
    if chars.next()? != '{' {
        return None;
    }
    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
    WHITESPACE_NAMES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
        .map(|&(_, c)| c)
}
