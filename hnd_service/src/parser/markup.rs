/// HTML clean-up in front of the XML reader.
///
/// quick-xml reads every `<` as the start of markup and rejects markup that
/// is cut off by the end of input. Browsers are more forgiving, and so are
/// the station pages. This pass rewrites the input so that the reader sees
/// only complete start and end tags plus text:
///
/// - `<` that does not open a tag becomes `&lt;`
/// - script and style bodies (and the other raw text elements) are escaped
///   so their content comes out as a single text run
/// - comments, doctypes and `<!...>` / `<?...>` markup are dropped
/// - a tag cut off by the end of input is dropped
/// - a stray `&` that starts no character reference becomes `&amp;`

use quick_xml::escape::resolve_html5_entity;

/// Elements whose content is text without tags or character references.
const RAW_TEXT_ELEMENTS: [&[u8]; 7] = [
    b"iframe", b"noembed", b"noframes", b"noscript", b"script", b"style", b"xmp",
];

/// Elements whose content is text with character references but no tags.
const ESCAPABLE_RAW_TEXT_ELEMENTS: [&[u8]; 2] = [b"textarea", b"title"];

/// Rewrites `input` into markup the XML reader can tokenize without errors.
pub(crate) fn normalize(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 16);
    let mut pos = 0;

    while let Some(offset) = input[pos..].iter().position(|&b| b == b'<') {
        let lt = pos + offset;
        copy_text(&input[pos..lt], &mut out);
        pos = match input.get(lt + 1) {
            Some(b) if b.is_ascii_alphabetic() => start_tag(input, lt, &mut out),
            Some(b'/') => end_tag(input, lt, &mut out),
            Some(b'!') => skip_declaration(input, lt + 2),
            Some(b'?') => skip_past(input, lt + 2, b'>'),
            _ => {
                out.extend_from_slice(b"&lt;");
                lt + 1
            }
        };
    }

    copy_text(&input[pos..], &mut out);
    out
}

/// Copies a start tag and, for raw text elements, its body. Returns the
/// position after what was consumed.
fn start_tag(input: &[u8], lt: usize, out: &mut Vec<u8>) -> usize {
    let Some(gt) = tag_end(input, lt + 1) else {
        return input.len();
    };
    out.extend_from_slice(&input[lt..=gt]);

    let inner = &input[lt + 1..gt];
    if inner.ends_with(b"/") {
        return gt + 1;
    }

    let name_len = inner
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'/')
        .unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();

    if RAW_TEXT_ELEMENTS.contains(&name.as_slice()) {
        raw_text(input, gt + 1, &name, true, out)
    } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_slice()) {
        raw_text(input, gt + 1, &name, false, out)
    } else {
        gt + 1
    }
}

fn end_tag(input: &[u8], lt: usize, out: &mut Vec<u8>) -> usize {
    match input.get(lt + 2) {
        Some(b) if b.is_ascii_alphabetic() => match tag_end(input, lt + 2) {
            Some(gt) => {
                out.extend_from_slice(&input[lt..=gt]);
                gt + 1
            }
            None => input.len(),
        },
        // `</>` is dropped
        Some(b'>') => lt + 3,
        Some(_) => skip_past(input, lt + 2, b'>'),
        None => {
            out.extend_from_slice(b"&lt;/");
            input.len()
        }
    }
}

/// Escapes the body of a raw text element up to its end tag (or the end
/// of input). `escape_amp` keeps character references undecoded.
fn raw_text(input: &[u8], from: usize, name: &[u8], escape_amp: bool, out: &mut Vec<u8>) -> usize {
    let close = raw_text_end(input, from, name).unwrap_or(input.len());
    let body = &input[from..close];
    for (i, &b) in body.iter().enumerate() {
        match b {
            b'<' => out.extend_from_slice(b"&lt;"),
            b'&' if escape_amp || !is_reference(&body[i + 1..]) => out.extend_from_slice(b"&amp;"),
            _ => out.push(b),
        }
    }
    close
}

/// Position of `</name` followed by whitespace, `/` or `>`.
fn raw_text_end(input: &[u8], from: usize, name: &[u8]) -> Option<usize> {
    (from..input.len()).find(|&i| {
        let rest = &input[i..];
        rest.starts_with(b"</")
            && rest.len() > name.len() + 2
            && rest[2..2 + name.len()].eq_ignore_ascii_case(name)
            && matches!(rest[2 + name.len()], b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
    })
}

/// Position of the `>` closing a tag whose name starts at `from`. Quoted
/// attribute values may contain `>`.
fn tag_end(input: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in input.iter().enumerate().skip(from) {
        match (quote, b) {
            (None, b'>') => return Some(i),
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            _ => {}
        }
    }
    None
}

/// Skips `<!...>` markup starting after `<!`. Comments run to `-->`,
/// everything else (doctype, conditional comments, CDATA) to the next `>`.
fn skip_declaration(input: &[u8], from: usize) -> usize {
    if !input[from..].starts_with(b"--") {
        return skip_past(input, from, b'>');
    }

    let body = from + 2;
    // `<!-->` and `<!--->` are complete, empty comments
    if input[body..].starts_with(b">") {
        return body + 1;
    }
    if input[body..].starts_with(b"->") {
        return body + 2;
    }
    input[body..]
        .windows(3)
        .position(|w| w == b"-->")
        .map_or(input.len(), |i| body + i + 3)
}

fn skip_past(input: &[u8], from: usize, byte: u8) -> usize {
    input[from..]
        .iter()
        .position(|&b| b == byte)
        .map_or(input.len(), |i| from + i + 1)
}

/// Copies text, escaping every `&` that does not start a character
/// reference the XML reader can resolve.
fn copy_text(text: &[u8], out: &mut Vec<u8>) {
    for (i, &b) in text.iter().enumerate() {
        if b == b'&' && !is_reference(&text[i + 1..]) {
            out.extend_from_slice(b"&amp;");
        } else {
            out.push(b);
        }
    }
}

/// `rest` follows a `&`: true for `name;`, `#digits;` and `#xhex;` with
/// a known name or a valid code point.
fn is_reference(rest: &[u8]) -> bool {
    let Some(semicolon) = rest.iter().take(40).position(|&b| b == b';') else {
        return false;
    };
    let Ok(body) = std::str::from_utf8(&rest[..semicolon]) else {
        return false;
    };

    let code = if let Some(hex) = body.strip_prefix("#x") {
        code_point(hex, 16)
    } else if let Some(dec) = body.strip_prefix('#') {
        code_point(dec, 10)
    } else {
        return resolve_html5_entity(body).is_some();
    };
    code.and_then(char::from_u32).is_some_and(|c| c != '\0')
}

fn code_point(digits: &str, radix: u32) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(html: &str) -> String {
        String::from_utf8(normalize(html.as_bytes())).expect("normalizing keeps UTF-8")
    }

    #[test]
    fn test_well_formed_markup_is_unchanged() {
        let html = r#"<p><span class="header">M&uuml;nchen<br/>Isar</span></p><td>Abfluss [m&sup3;/s]</td>"#;
        assert_eq!(normalized(html), html);
    }

    #[test]
    fn test_stray_less_than_becomes_text() {
        assert_eq!(normalized("<p>a < b</p>"), "<p>a &lt; b</p>");
        assert_eq!(normalized("1<2"), "1&lt;2");
        assert_eq!(normalized("end <"), "end &lt;");
    }

    #[test]
    fn test_script_and_style_bodies_are_escaped() {
        assert_eq!(
            normalized("<script>if (a<b && c) {}</script><p>x</p>"),
            "<script>if (a&lt;b &amp;&amp; c) {}</script><p>x</p>"
        );
        assert_eq!(
            normalized("<STYLE type=\"text/css\">a>b{}</Style >"),
            "<STYLE type=\"text/css\">a>b{}</Style >"
        );
    }

    #[test]
    fn test_unclosed_script_runs_to_end_of_input() {
        assert_eq!(normalized("<script>x<y"), "<script>x&lt;y");
    }

    #[test]
    fn test_title_keeps_character_references() {
        assert_eq!(
            normalized("<title>Pegel M&uuml;nchen <3</title>"),
            "<title>Pegel M&uuml;nchen &lt;3</title>"
        );
        assert_eq!(normalized("<title>A & B</title>"), "<title>A &amp; B</title>");
    }

    #[test]
    fn test_self_closing_script_has_no_body() {
        assert_eq!(normalized("<script/>a<b>"), "<script/>a<b>");
    }

    #[test]
    fn test_declarations_and_comments_are_dropped() {
        assert_eq!(normalized("<!DOCTYPE html><p>x</p>"), "<p>x</p>");
        assert_eq!(normalized("a<!-- <td>42</td> -->b"), "ab");
        assert_eq!(normalized("a<!-->b<!--->c"), "abc");
        assert_eq!(normalized("<![if !IE]><p>x</p><![endif]>"), "<p>x</p>");
        assert_eq!(normalized("<?xml version=\"1.0\"?><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_markup_cut_off_at_end_of_input_is_dropped() {
        assert_eq!(normalized("<td>87</td><tr><td"), "<td>87</td><tr>");
        assert_eq!(normalized("<td>87</td><span class=\"hea"), "<td>87</td>");
        assert_eq!(normalized("<td>87</td></t"), "<td>87</td>");
        assert_eq!(normalized("<td>87</td><!-- note"), "<td>87</td>");
        assert_eq!(normalized("<td>87</td></"), "<td>87</td>&lt;/");
    }

    #[test]
    fn test_quoted_greater_than_does_not_end_tag() {
        assert_eq!(normalized(r#"<a title="x>y">z</a>"#), r#"<a title="x>y">z</a>"#);
    }

    #[test]
    fn test_bogus_end_tags_are_dropped() {
        assert_eq!(normalized("a</>b"), "ab");
        assert_eq!(normalized("a</ 3>b"), "ab");
    }

    #[test]
    fn test_bare_ampersand_is_escaped() {
        assert_eq!(normalized("AT&T &uuml; &#252; &#xFC;"), "AT&amp;T &uuml; &#252; &#xFC;");
        assert_eq!(normalized("&bogus; &"), "&amp;bogus; &amp;");
        assert_eq!(normalized("&#+12; &#0;"), "&amp;#+12; &amp;#0;");
    }
}
