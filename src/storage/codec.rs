//! Positional codec for flat JSON records.
//!
//! Records are located by scanning for field markers and braces, never by
//! parsing. Whatever bytes the client submitted are what ends up on disk: no
//! field reordering, no number reformatting.
//!
//! Limitation: boundaries are found with the nearest `{` / `}` around a
//! marker, so a field value containing a brace (a nested object, or a string
//! with `{` in it) breaks record detection. Values that contain the text
//! `"id":` are likewise mistaken for the id field.

use crate::storage::error::{Result, StoreError};

pub const ID_FIELD: &str = "id";

/// Finds `"field"` followed by `:` (whitespace allowed around the colon) at or
/// after `from`. Returns the offset of the first byte after the colon.
fn find_field_marker(text: &str, field: &str, from: usize) -> Option<usize> {
    let quoted = format!("\"{}\"", field);
    let mut cursor = from;
    while let Some(rel) = text.get(cursor..)?.find(&quoted) {
        let after_key = cursor + rel + quoted.len();
        let rest = &text[after_key..];
        let skipped = rest.len() - rest.trim_start().len();
        if rest[skipped..].starts_with(':') {
            return Some(after_key + skipped + 1);
        }
        cursor = after_key;
    }
    None
}

/// The value token starting at `value_start`: everything up to the next `,`
/// or `}`, trimmed. Returns the token and the offset where it ends.
fn token_at(text: &str, value_start: usize) -> (&str, usize) {
    let rest = &text[value_start..];
    let end = rest.find([',', '}']).unwrap_or(rest.len());
    (rest[..end].trim(), value_start + end)
}

/// Literal token of `field` in a single record, quotes included for strings.
pub fn field_token<'a>(record: &'a str, field: &str) -> Option<&'a str> {
    let start = find_field_marker(record, field, 0)?;
    let (token, _) = token_at(record, start);
    Some(token)
}

/// Whether `token` is `value` bare (numbers) or `"value"` (strings).
pub fn token_matches(token: &str, value: &str) -> bool {
    if token == value {
        return true;
    }
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .is_some_and(|inner| inner == value)
}

/// `null` and `""` stand for an id the client left blank.
pub fn is_unassigned_id(token: &str) -> bool {
    token == "null" || token == "\"\""
}

/// Swaps the value token of the `id` field for `id`, keeping every other byte.
pub fn replace_id(record: &str, id: &str) -> Result<String> {
    let value_start = find_field_marker(record, ID_FIELD, 0)
        .ok_or_else(|| StoreError::MalformedRecord("record has no \"id\" field".to_string()))?;
    let (token, token_end) = token_at(record, value_start);
    let raw = &record[value_start..token_end];
    let token_start = value_start + (raw.len() - raw.trim_start().len());
    Ok(format!(
        "{}{}{}",
        &record[..token_start],
        id,
        &record[token_start + token.len()..]
    ))
}

pub fn has_id(record: &str) -> bool {
    find_field_marker(record, ID_FIELD, 0).is_some()
}

pub fn extract_id(record: &str) -> Result<String> {
    match field_token(record, ID_FIELD) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        Some(_) => Err(StoreError::MalformedRecord(
            "id field has an empty value".to_string(),
        )),
        None => Err(StoreError::MalformedRecord(
            "record has no \"id\" field".to_string(),
        )),
    }
}

/// Byte span `[start, end)` of the first record in `body` whose id token
/// matches `id`. `id` may be given bare or quoted.
pub fn locate_record(body: &str, id: &str) -> Option<(usize, usize)> {
    let wanted = unquote(id);
    let mut cursor = 0;
    while let Some(value_start) = find_field_marker(body, ID_FIELD, cursor) {
        let (token, token_end) = token_at(body, value_start);
        if token_matches(token, wanted) {
            let start = body[..value_start].rfind('{')?;
            let end = token_end + body[token_end..].find('}')? + 1;
            return Some((start, end));
        }
        cursor = token_end;
    }
    None
}

/// Text between the outer brackets of an array body.
pub fn array_inner(body: &str) -> Result<&str> {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .ok_or_else(|| StoreError::MalformedRecord("array body is not bracket-delimited".to_string()))
}

/// Splits an array body at the `},{` boundaries between top-level records.
pub fn split_into_records(body: &str) -> Result<Vec<&str>> {
    let inner = array_inner(body)?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(rel) = inner[search..].find('}') {
        let close = search + rel + 1;
        let rest = &inner[close..];
        let after_ws = rest.trim_start();
        if let Some(after_comma) = after_ws.strip_prefix(',') {
            if after_comma.trim_start().starts_with('{') {
                records.push(inner[start..close].trim());
                start = close + (rest.len() - after_ws.len()) + 1;
            }
        }
        search = close;
    }
    records.push(inner[start..].trim());
    Ok(records)
}

/// Appends `"id":<id>` as the record's last field.
pub fn assign_id(record: &str, id: &str) -> Result<String> {
    let close = record
        .rfind('}')
        .ok_or_else(|| StoreError::MalformedRecord("record has no closing brace".to_string()))?;
    let head = record[..close].trim_end();
    if head.ends_with('{') {
        Ok(format!("{}\"{}\":{}}}", head, ID_FIELD, id))
    } else {
        Ok(format!("{},\"{}\":{}}}", head, ID_FIELD, id))
    }
}

/// Joins record texts back into an array body.
pub fn join_records<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::from("[");
    for (i, record) in records.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(record);
    }
    out.push(']');
    out
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}
