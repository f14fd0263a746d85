//! Repair and parsing of model replies.
//!
//! Replies are free text from a non-deterministic model: the JSON object may
//! arrive bare, fenced, or buried in prose, and is frequently malformed.
//! `extract_json` finds the object, `repair_json` fixes the malformations
//! these models actually emit, and `terms_from_value` coerces the parsed
//! value into typed term records.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::terms::{Category, TermCount, TermSource};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in reply")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Full reply pipeline: extract the object, repair it, parse to a `Value`.
pub fn parse_reply(reply: &str) -> Result<Value, ParseError> {
    let extracted = extract_json(reply)?;
    let repaired = repair_json(&extracted);
    serde_json::from_str(&repaired).map_err(|e| {
        warn!("JSON parse error after repair: {e}");
        ParseError::InvalidJson(format!(
            "{}: {}",
            e,
            repaired.chars().take(100).collect::<String>()
        ))
    })
}

/// Locates the JSON object inside a model reply.
///
/// Tried in order: the whole trimmed reply, a fenced ```json block, the span
/// from the first `{` to the last `}`. A reply with an opening brace but no
/// closer is taken to end of input — the repair pass appends the missing
/// closers.
pub fn extract_json(reply: &str) -> Result<String, ParseError> {
    let trimmed = reply.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    if trimmed.contains("```") {
        if let Some(json) = extract_from_fenced_block(trimmed) {
            return Ok(json);
        }
    }

    if let Some(start) = trimmed.find('{') {
        let candidate = match trimmed.rfind('}') {
            Some(end) if start < end => &trimmed[start..=end],
            _ => &trimmed[start..], // truncated reply; repair closes it
        };
        return Ok(candidate.to_string());
    }

    Err(ParseError::NoJson)
}

fn extract_from_fenced_block(text: &str) -> Option<String> {
    let re = Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").unwrap();
    let captures = re.captures(text)?;
    let json = captures.get(1)?.as_str().trim();
    if json.starts_with('{') {
        Some(json.to_string())
    } else {
        None
    }
}

/// Repairs the malformed JSON chat models emit before it reaches serde:
/// line and block comments, single-quoted strings, unquoted object keys and
/// string values, JS literals (`undefined`, `NaN`), trailing commas, and
/// objects truncated mid-stream (unterminated strings, unclosed `{`/`[`).
///
/// The pass is string-aware — repairs never apply inside a string literal —
/// and valid JSON passes through unchanged.
pub fn repair_json(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut open: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            i = copy_string(&chars, i, &mut out);
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            i = skip_line_comment(&chars, i);
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i = skip_block_comment(&chars, i);
        } else if c == '{' || c == '[' {
            open.push(if c == '{' { '}' } else { ']' });
            out.push(c);
            i += 1;
        } else if c == '}' || c == ']' {
            // closers that were never opened are dropped
            if open.last() == Some(&c) {
                open.pop();
                trim_trailing_comma(&mut out);
                out.push(c);
            }
            i += 1;
        } else if (c.is_ascii_alphabetic() || c == '_' || c == '$') && at_token_start(&out) {
            i = copy_bare_word(&chars, i, &mut out);
        } else {
            out.push(c);
            i += 1;
        }
    }

    // close whatever the model left open, innermost first
    while let Some(closer) = open.pop() {
        trim_trailing_comma(&mut out);
        out.push(closer);
    }

    out
}

/// A bare word can only start a token after an opener, a comma, a colon, or
/// at the very beginning — `e` inside `1.5e3` is not one.
fn at_token_start(out: &str) -> bool {
    matches!(
        out.trim_end().chars().last(),
        None | Some('{' | '[' | ',' | ':')
    )
}

/// Copies a string literal, normalizing the quote char to `"` and escaping
/// embedded double quotes; literals left unterminated at end of input are
/// closed.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    out.push('\\');
                    out.push(next);
                    i += 2;
                } else {
                    // lone backslash at end of input would escape our closer
                    i += 1;
                }
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => {
                // double quote inside a single-quoted literal
                out.push('\\');
                out.push('"');
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.push('"');
    i
}

fn skip_line_comment(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            return i + 2;
        }
        i += 1;
    }
    i
}

/// Removes a comma left dangling before a closer.
fn trim_trailing_comma(out: &mut String) {
    loop {
        let trimmed_len = out.trim_end().len();
        if out[..trimmed_len].ends_with(',') {
            out.truncate(trimmed_len - 1);
        } else {
            return;
        }
    }
}

/// Handles a bare word: quotes unquoted object keys, maps JS literals to
/// JSON ones, and quotes unquoted string values, extending the token through
/// interior spaces (`term: product management,`).
fn copy_bare_word(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len()
        && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
    {
        i += 1;
    }
    let word: String = chars[start..i].iter().collect();

    // lookahead for ':' means this word is an unquoted key
    let mut j = i;
    while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
        j += 1;
    }
    if chars.get(j) == Some(&':') {
        out.push('"');
        out.push_str(&word);
        out.push('"');
        return i;
    }

    match word.as_str() {
        "true" | "false" | "null" => {
            out.push_str(&word);
            i
        }
        "True" => {
            out.push_str("true");
            i
        }
        "False" => {
            out.push_str("false");
            i
        }
        "undefined" | "NaN" | "None" => {
            out.push_str("null");
            i
        }
        _ => {
            // unquoted string value: take the run up to the next delimiter
            let mut end = i;
            while end < chars.len() && !matches!(chars[end], ',' | '}' | ']' | ':' | '\n') {
                end += 1;
            }
            let run: String = chars[start..end].iter().collect();
            out.push('"');
            for c in run.trim_end().chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
            end
        }
    }
}

/// Options for coercing a parsed reply into term records.
pub struct SanitizeOptions {
    /// Clamp counts into 1..=10 (the auto flow's frequency scale).
    pub clamp_counts: bool,
    /// Attribution used when the model omits or mangles `sources`.
    pub fallback_source: Option<TermSource>,
}

/// Coerces the `terms` array of a parsed reply into typed records.
///
/// Missing or malformed fields fall back rather than fail — the model
/// already answered, salvage what it sent. An absent `terms` array yields an
/// empty list.
pub fn terms_from_value(value: &Value, opts: &SanitizeOptions) -> Vec<TermCount> {
    let Some(items) = value.get("terms").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let term = item
                .get("term")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("Unknown Term")
                .to_string();

            let count = item
                .get("count")
                .and_then(|v| {
                    v.as_u64()
                        .or_else(|| v.as_f64().map(|f| f.max(0.0) as u64))
                })
                .unwrap_or(1)
                .min(u64::from(u32::MAX)) as u32;
            let count = if opts.clamp_counts {
                count.clamp(1, 10)
            } else {
                count.max(1)
            };

            let category = item
                .get("category")
                .and_then(Value::as_str)
                .map(Category::from_label)
                .unwrap_or(Category::Qualifications);

            let sources = match item.get("sources").and_then(Value::as_array) {
                Some(raw) if !raw.is_empty() => raw
                    .iter()
                    .map(|s| TermSource {
                        company: string_or(s.get("company"), "Unknown Company"),
                        role: string_or(s.get("role"), "Unknown Role"),
                    })
                    .collect(),
                _ => opts.fallback_source.clone().into_iter().collect(),
            };

            TermCount {
                term,
                count,
                category,
                sources,
            }
        })
        .collect()
}

/// `totalListings` from the reply, 0 when absent or non-numeric.
pub fn total_listings(value: &Value) -> u32 {
    value
        .get("totalListings")
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .min(u64::from(u32::MAX)) as u32
}

fn string_or(value: Option<&Value>, fallback: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_json ────────────────────────────────────────────────────────

    #[test]
    fn extract_takes_bare_object_verbatim() {
        let reply = r#"  {"terms": []}  "#;
        assert_eq!(extract_json(reply).unwrap(), r#"{"terms": []}"#);
    }

    #[test]
    fn extract_unwraps_fenced_block() {
        let reply = "Here you go:\n```json\n{\"terms\": []}\n```\nLet me know!";
        assert_eq!(extract_json(reply).unwrap(), r#"{"terms": []}"#);
    }

    #[test]
    fn extract_unwraps_untagged_fence() {
        let reply = "```\n{\"terms\": []}\n```";
        assert_eq!(extract_json(reply).unwrap(), r#"{"terms": []}"#);
    }

    #[test]
    fn extract_spans_first_to_last_brace_in_prose() {
        let reply = r#"Based on my research, {"terms": [{"term": "sql"}]} covers it."#;
        assert_eq!(
            extract_json(reply).unwrap(),
            r#"{"terms": [{"term": "sql"}]}"#
        );
    }

    #[test]
    fn extract_keeps_truncated_object_open_for_repair() {
        let reply = r#"Sure: {"terms": [{"term": "sql", "count": 3"#;
        assert_eq!(
            extract_json(reply).unwrap(),
            r#"{"terms": [{"term": "sql", "count": 3"#
        );
    }

    #[test]
    fn extract_fails_without_any_object() {
        assert!(matches!(
            extract_json("I could not find any job listings."),
            Err(ParseError::NoJson)
        ));
    }

    // ── repair_json ─────────────────────────────────────────────────────────

    fn assert_repairs_to(raw: &str, expected: &str) {
        let repaired = repair_json(raw);
        let got: Value = serde_json::from_str(&repaired)
            .unwrap_or_else(|e| panic!("repair produced invalid JSON ({e}): {repaired}"));
        let want: Value = serde_json::from_str(expected).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn repair_passes_valid_json_through() {
        let raw = r#"{"terms": [{"term": "sql", "count": 3}], "totalListings": 5}"#;
        assert_eq!(repair_json(raw), raw);
    }

    #[test]
    fn repair_strips_trailing_commas() {
        assert_repairs_to(
            r#"{"terms": [{"term": "sql", "count": 3,},],}"#,
            r#"{"terms": [{"term": "sql", "count": 3}]}"#,
        );
    }

    #[test]
    fn repair_normalizes_single_quotes() {
        assert_repairs_to(
            r#"{'term': 'product management', 'count': 2}"#,
            r#"{"term": "product management", "count": 2}"#,
        );
    }

    #[test]
    fn repair_escapes_double_quotes_inside_single_quoted_strings() {
        assert_repairs_to(
            r#"{'term': 'the "big" data'}"#,
            r#"{"term": "the \"big\" data"}"#,
        );
    }

    #[test]
    fn repair_quotes_unquoted_keys() {
        assert_repairs_to(
            r#"{term: "sql", count: 3}"#,
            r#"{"term": "sql", "count": 3}"#,
        );
    }

    #[test]
    fn repair_quotes_unquoted_multiword_values() {
        assert_repairs_to(
            r#"{"term": product management, "count": 2}"#,
            r#"{"term": "product management", "count": 2}"#,
        );
    }

    #[test]
    fn repair_maps_js_literals() {
        assert_repairs_to(
            r#"{"a": undefined, "b": NaN, "c": true, "d": None}"#,
            r#"{"a": null, "b": null, "c": true, "d": null}"#,
        );
    }

    #[test]
    fn repair_strips_comments() {
        assert_repairs_to(
            "{\n  // the only term\n  \"term\": \"sql\", /* count follows */ \"count\": 3\n}",
            r#"{"term": "sql", "count": 3}"#,
        );
    }

    #[test]
    fn repair_leaves_comment_markers_inside_strings_alone() {
        assert_repairs_to(
            r#"{"term": "a // b /* c */"}"#,
            r#"{"term": "a // b /* c */"}"#,
        );
    }

    #[test]
    fn repair_closes_truncated_objects() {
        assert_repairs_to(
            r#"{"terms": [{"term": "sql", "count": 3"#,
            r#"{"terms": [{"term": "sql", "count": 3}]}"#,
        );
    }

    #[test]
    fn repair_closes_truncated_strings() {
        assert_repairs_to(
            r#"{"terms": [{"term": "product manage"#,
            r#"{"terms": [{"term": "product manage"}]}"#,
        );
    }

    #[test]
    fn repair_drops_comma_left_by_truncation() {
        assert_repairs_to(
            r#"{"terms": [{"term": "sql"},"#,
            r#"{"terms": [{"term": "sql"}]}"#,
        );
    }

    #[test]
    fn repair_drops_unmatched_closers() {
        assert_repairs_to(r#"{"terms": []}]"#, r#"{"terms": []}"#);
    }

    #[test]
    fn repair_does_not_quote_number_exponents() {
        assert_repairs_to(r#"{"count": 1.5e3}"#, r#"{"count": 1500.0}"#);
    }

    // ── parse_reply ─────────────────────────────────────────────────────────

    #[test]
    fn parse_reply_handles_fenced_malformed_json() {
        let reply = "```json\n{'terms': [{'term': 'sql', 'count': 3,}],}\n```";
        let value = parse_reply(reply).unwrap();
        assert_eq!(value["terms"][0]["term"], "sql");
        assert_eq!(value["terms"][0]["count"], 3);
    }

    #[test]
    fn parse_reply_rejects_prose_without_json() {
        assert!(parse_reply("No JSON today, sorry.").is_err());
    }

    // ── terms_from_value ────────────────────────────────────────────────────

    fn fallback() -> SanitizeOptions {
        SanitizeOptions {
            clamp_counts: true,
            fallback_source: Some(TermSource {
                company: "Market Research".to_string(),
                role: "Product Manager (Senior)".to_string(),
            }),
        }
    }

    #[test]
    fn sanitize_coerces_well_formed_terms() {
        let value: Value = serde_json::from_str(
            r#"{"terms": [{"term": "React development", "count": 8, "category": "qualifications",
                "sources": [{"company": "Meta", "role": "Frontend Engineer"}]}]}"#,
        )
        .unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].term, "React development");
        assert_eq!(terms[0].count, 8);
        assert_eq!(terms[0].category, Category::Qualifications);
        assert_eq!(terms[0].sources[0].company, "Meta");
    }

    #[test]
    fn sanitize_defaults_missing_fields() {
        let value: Value = serde_json::from_str(r#"{"terms": [{}]}"#).unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].term, "Unknown Term");
        assert_eq!(terms[0].count, 1);
        assert_eq!(terms[0].category, Category::Qualifications);
        assert_eq!(terms[0].sources[0].company, "Market Research");
    }

    #[test]
    fn sanitize_clamps_counts_to_frequency_scale() {
        let value: Value = serde_json::from_str(
            r#"{"terms": [
                {"term": "a", "count": 99},
                {"term": "b", "count": 0},
                {"term": "c", "count": "seven"}
            ]}"#,
        )
        .unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].count, 10);
        assert_eq!(terms[1].count, 1);
        assert_eq!(terms[2].count, 1);
    }

    #[test]
    fn sanitize_without_clamp_keeps_raw_counts() {
        let value: Value =
            serde_json::from_str(r#"{"terms": [{"term": "a", "count": 99}]}"#).unwrap();

        let terms = terms_from_value(
            &value,
            &SanitizeOptions {
                clamp_counts: false,
                fallback_source: None,
            },
        );

        assert_eq!(terms[0].count, 99);
    }

    #[test]
    fn sanitize_accepts_float_counts() {
        let value: Value =
            serde_json::from_str(r#"{"terms": [{"term": "a", "count": 7.0}]}"#).unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].count, 7);
    }

    #[test]
    fn sanitize_maps_singular_category_labels() {
        let value: Value = serde_json::from_str(
            r#"{"terms": [{"term": "a", "count": 1, "category": "responsibility"}]}"#,
        )
        .unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].category, Category::Responsibilities);
    }

    #[test]
    fn sanitize_replaces_malformed_sources_with_fallback() {
        let value: Value = serde_json::from_str(
            r#"{"terms": [{"term": "a", "count": 1, "sources": "Meta"}]}"#,
        )
        .unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].sources.len(), 1);
        assert_eq!(terms[0].sources[0].company, "Market Research");
    }

    #[test]
    fn sanitize_fills_partial_sources() {
        let value: Value = serde_json::from_str(
            r#"{"terms": [{"term": "a", "count": 1, "sources": [{"company": "Meta"}]}]}"#,
        )
        .unwrap();

        let terms = terms_from_value(&value, &fallback());

        assert_eq!(terms[0].sources[0].company, "Meta");
        assert_eq!(terms[0].sources[0].role, "Unknown Role");
    }

    #[test]
    fn sanitize_yields_empty_when_terms_key_is_absent() {
        let value: Value = serde_json::from_str(r#"{"totalListings": 3}"#).unwrap();
        assert!(terms_from_value(&value, &fallback()).is_empty());
    }

    // ── total_listings ──────────────────────────────────────────────────────

    #[test]
    fn total_listings_defaults_to_zero() {
        let value: Value = serde_json::from_str(r#"{"terms": []}"#).unwrap();
        assert_eq!(total_listings(&value), 0);

        let value: Value = serde_json::from_str(r#"{"totalListings": "many"}"#).unwrap();
        assert_eq!(total_listings(&value), 0);
    }

    #[test]
    fn total_listings_reads_numeric_values() {
        let value: Value = serde_json::from_str(r#"{"totalListings": 15}"#).unwrap();
        assert_eq!(total_listings(&value), 15);
    }
}
