//! Forgiving tokenizer for server-rendered markup and fragments.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are lowercased.
//! `<script>` and `<style>` bodies are raw text. This is not an HTML5 state
//! machine: malformed constructs are dropped or kept as text, never reported.
use crate::entities::decode_entities;
use crate::types::{Token, is_raw_text_element};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const DOCTYPE_START: &[u8] = b"<!doctype";

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    end
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn push_text(out: &mut Vec<Token>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(Token::Text(text));
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a char boundary.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = memchr(b'<', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            push_text(&mut out, decode_entities(&input[i..end]));
            i = end;
            continue;
        }

        let rest = &input[i..];
        if let Some(body) = rest.strip_prefix(COMMENT_START) {
            match body.find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(body[..end].to_string()));
                    i += COMMENT_START.len() + end + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(body.to_string()));
                    i = bytes.len();
                }
            }
            continue;
        }

        if starts_with_ignore_ascii_case_at(bytes, i, DOCTYPE_START) {
            let Some(end) = memchr(b'>', &bytes[i..]) else {
                break;
            };
            out.push(Token::Doctype(
                rest[DOCTYPE_START.len()..end].trim().to_string(),
            ));
            i += end + 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let name_end = scan_name(bytes, i + 2);
            if name_end == i + 2 {
                push_text(&mut out, "<".to_string());
                i += 1;
                continue;
            }
            let name = input[i + 2..name_end].to_ascii_lowercase();
            i = memchr(b'>', &bytes[name_end..]).map_or(bytes.len(), |rel| name_end + rel + 1);
            out.push(Token::EndTag(name));
            continue;
        }

        let name_end = scan_name(bytes, i + 1);
        if name_end == i + 1 {
            // `a < b` and friends.
            push_text(&mut out, "<".to_string());
            i += 1;
            continue;
        }
        let name = input[i + 1..name_end].to_ascii_lowercase();
        let (attributes, self_closing, next) = scan_attributes(input, name_end);
        i = next;

        let raw = is_raw_text_element(&name) && !self_closing;
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        if raw {
            let (text_end, resume) = find_raw_close(input, i, &name);
            if text_end > i {
                out.push(Token::Text(input[i..text_end].to_string()));
            }
            out.push(Token::EndTag(name));
            i = resume;
        }
    }
    out
}

type Attributes = Vec<(String, Option<String>)>;

/// Scans attributes from `start` up to and including the closing `>`.
fn scan_attributes(input: &str, start: usize) -> (Attributes, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes: Attributes = Vec::new();
    let mut self_closing = false;
    let mut k = start;

    loop {
        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' if bytes.get(k + 1) == Some(&b'>') => {
                self_closing = true;
                k += 2;
                break;
            }
            b'/' => {
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        k = scan_name(bytes, k);
        if name_start == k {
            // Skip one junk char, keeping `k` on a char boundary.
            k += input[k..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let attr_name = input[name_start..k].to_ascii_lowercase();

        let mut j = k;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < len && bytes[j] == b'=' {
            j += 1;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                let value_start = j + 1;
                let value_end =
                    memchr(quote, &bytes[value_start..]).map_or(len, |rel| value_start + rel);
                value = Some(decode_entities(&input[value_start..value_end]));
                k = (value_end + 1).min(len);
            } else {
                let value_start = j;
                while j < len && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                value = Some(decode_entities(&input[value_start..j]));
                k = j;
            }
        }

        // First occurrence wins, as in browsers.
        if !attributes.iter().any(|(existing, _)| *existing == attr_name) {
            attributes.push((attr_name, value));
        }
    }

    (attributes, self_closing, k)
}

/// Finds `</name\s*>` from `from`. Returns (end of raw text, resume offset).
fn find_raw_close(input: &str, from: usize, name: &str) -> (usize, usize) {
    let bytes = input.as_bytes();
    let mut i = from;
    while let Some(rel) = memchr(b'<', &bytes[i..]) {
        let at = i + rel;
        if bytes.get(at + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, at + 2, name.as_bytes())
        {
            let mut k = at + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return (at, k + 1);
            }
        }
        i = at + 1;
    }
    (bytes.len(), bytes.len())
}

#[cfg(test)]
mod tests {
    use super::tokenize;
    use crate::types::Token;

    fn start(name: &str, attributes: &[(&str, Option<&str>)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            self_closing: false,
        }
    }

    #[test]
    fn tokenizes_placeholder_markup() {
        let tokens = tokenize(
            r#"<div class="lazy-views-placeholder" data-lazy-views-cache-id='a1' hidden>x</div>"#,
        );
        assert_eq!(
            tokens,
            vec![
                start(
                    "div",
                    &[
                        ("class", Some("lazy-views-placeholder")),
                        ("data-lazy-views-cache-id", Some("a1")),
                        ("hidden", None),
                    ]
                ),
                Token::Text("x".to_string()),
                Token::EndTag("div".to_string()),
            ]
        );
    }

    #[test]
    fn lowercases_names_and_decodes_values() {
        let tokens = tokenize(r#"<A HREF=/x?a=1&amp;b=2>go</A>"#);
        assert_eq!(tokens[0], start("a", &[("href", Some("/x?a=1&b=2"))]));
        assert_eq!(tokens[2], Token::EndTag("a".to_string()));
    }

    #[test]
    fn script_body_is_raw_text() {
        let tokens = tokenize("<script>if (a < b) { x = '<p>'; }</script >after");
        assert_eq!(
            tokens,
            vec![
                start("script", &[]),
                Token::Text("if (a < b) { x = '<p>'; }".to_string()),
                Token::EndTag("script".to_string()),
                Token::Text("after".to_string()),
            ]
        );
    }

    #[test]
    fn stray_angle_bracket_stays_in_text() {
        let tokens = tokenize("1 < 2 &amp; 3");
        assert_eq!(tokens, vec![Token::Text("1 < 2 & 3".to_string())]);
    }

    #[test]
    fn comments_doctype_and_self_closing() {
        let tokens = tokenize("<!DOCTYPE html><!-- note --><br/><img src=a.png />");
        assert_eq!(tokens[0], Token::Doctype("html".to_string()));
        assert_eq!(tokens[1], Token::Comment(" note ".to_string()));
        assert!(matches!(tokens[2], Token::StartTag { self_closing: true, .. }));
        assert!(matches!(
            &tokens[3],
            Token::StartTag { name, self_closing: true, .. } if name == "img"
        ));
    }

    #[test]
    fn survives_truncated_input() {
        let tokens = tokenize("<div class=\"open");
        assert_eq!(tokens, vec![start("div", &[("class", Some("open"))])]);
        assert_eq!(
            tokenize("<!-- unterminated"),
            vec![Token::Comment(" unterminated".to_string())]
        );
    }
}
