//! Inline ruby (furigana) markup: `(base){furigana}`.
//!
//! A `(` only opens an annotation when it is followed by a non-empty base without `)`, a `)`,
//! a `{`, a non-empty reading without `}` and a closing `}`. Anything else stays literal text.

/// One run of a lexed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RubyToken<'a> {
    PlainRun(&'a str),
    RubyRun { base: &'a str, furigana: &'a str },
}

impl<'a> RubyToken<'a> {
    /// Text this token contributes to the drawn line.
    pub fn base_text(&self) -> &'a str {
        match *self {
            RubyToken::PlainRun(s) => s,
            RubyToken::RubyRun { base, .. } => base,
        }
    }
}

/// Split one line into plain and annotated runs, left to right.
pub fn tokenize(line: &str) -> Vec<RubyToken<'_>> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    let bytes = line.as_bytes();

    while i < bytes.len() {
        if bytes[i] == b'('
            && let Some((base, furigana, end)) = match_annotation(line, i)
        {
            if plain_start < i {
                out.push(RubyToken::PlainRun(&line[plain_start..i]));
            }
            out.push(RubyToken::RubyRun { base, furigana });
            i = end;
            plain_start = end;
            continue;
        }
        i += 1;
    }

    if plain_start < line.len() {
        out.push(RubyToken::PlainRun(&line[plain_start..]));
    }
    out
}

/// Line text with every annotation replaced by its base.
pub fn strip_ruby(line: &str) -> String {
    tokenize(line).iter().map(RubyToken::base_text).collect()
}

// `open` indexes a '(' byte. Returns (base, furigana, index just past '}').
fn match_annotation(line: &str, open: usize) -> Option<(&str, &str, usize)> {
    let rest = &line[open + 1..];
    let close = rest.find(')')?;
    if close == 0 {
        return None;
    }
    let base = &rest[..close];

    let reading = rest[close + 1..].strip_prefix('{')?;
    let end = reading.find('}')?;
    if end == 0 {
        return None;
    }
    let furigana = &reading[..end];

    let consumed = open + 1 + close + 1 + 1 + end + 1;
    Some((base, furigana, consumed))
}

#[cfg(test)]
#[path = "../../tests/unit/text/ruby.rs"]
mod tests;
