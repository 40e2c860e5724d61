//! Rewrites Postgres-style `$N` placeholders into SQLite's `?N`.
//!
//! Callers of the ad-hoc path often write SQL in the Postgres dialect. SQLite
//! would treat `$1` as a *named* parameter indexed by first appearance, which
//! silently reorders bindings when `$2` precedes `$1`; `?N` binds by number.

use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, scan_digits};

/// Per-call override of the store's default translation setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    /// Follow `StoreOptions::translate_placeholders`.
    #[default]
    StoreDefault,
    ForceOn,
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, store_default: bool) -> bool {
        match self {
            TranslationMode::StoreDefault => store_default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Translate `$N` placeholders to `?N`, leaving quoted strings, comments and
/// dollar-quoted blocks untouched.
///
/// Returns a borrowed `Cow` when nothing needed rewriting:
/// ```rust
/// use patient_store::translation::translate_placeholders;
///
/// let sql = translate_placeholders("select * from patients where id = $1", true);
/// assert_eq!(sql, "select * from patients where id = ?1");
/// ```
#[must_use]
pub fn translate_placeholders(sql: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(sql);
    }

    // Byte buffer: the scan advances one byte at a time and may sit inside a
    // multi-byte character, so only whole runs of original bytes are copied.
    let mut out: Option<Vec<u8>> = None;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        let start = idx;
        let mut replaced = false;
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        let buf = out.get_or_insert_with(|| bytes[..idx].to_vec());
                        buf.push(b'?');
                        buf.extend_from_slice(digits.as_bytes());
                        idx = digits_end - 1;
                        replaced = true;
                    } else if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }

        if let Some(ref mut buf) = out
            && !replaced
        {
            buf.extend_from_slice(&bytes[start..=idx]);
        }

        idx += 1;
    }

    match out {
        Some(buf) => Cow::Owned(
            String::from_utf8(buf)
                .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()),
        ),
        None => Cow::Borrowed(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_positional_placeholders() {
        let sql = "insert into patients (first_name, age) values($1, $2)";
        assert_eq!(
            translate_placeholders(sql, true),
            "insert into patients (first_name, age) values(?1, ?2)"
        );
    }

    #[test]
    fn keeps_out_of_order_numbers() {
        let sql = "select $2 as b, $1 as a";
        assert_eq!(translate_placeholders(sql, true), "select ?2 as b, ?1 as a");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '$1', $1 -- $2\n/* $3 */ from t where a = $1";
        assert_eq!(
            translate_placeholders(sql, true),
            "select '$1', ?1 -- $2\n/* $3 */ from t where a = ?1"
        );
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select $1 from t $foo$ where a = $1";
        assert_eq!(
            translate_placeholders(sql, true),
            "$foo$ select $1 from t $foo$ where a = ?1"
        );
    }

    #[test]
    fn preserves_non_ascii_text() {
        let sql = "select 'Zoë' as n, $1";
        assert_eq!(translate_placeholders(sql, true), "select 'Zoë' as n, ?1");
    }

    #[test]
    fn respects_disabled_flag() {
        let sql = "select * from t where a = $1";
        let res = translate_placeholders(sql, false);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }

    #[test]
    fn untouched_sql_is_borrowed() {
        let res = translate_placeholders("select * from patients", true);
        assert!(matches!(res, Cow::Borrowed(_)));
    }

    #[test]
    fn translation_mode_resolution() {
        assert!(TranslationMode::ForceOn.resolve(false));
        assert!(!TranslationMode::ForceOff.resolve(true));
        assert!(TranslationMode::StoreDefault.resolve(true));
        assert!(!TranslationMode::StoreDefault.resolve(false));
    }
}
