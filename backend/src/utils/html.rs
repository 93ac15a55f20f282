// Escaping helpers for text that ends up inside the notification email.

/// Escapes the characters that carry meaning in HTML, quotes included.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Inserts `<br />` in front of every line break, keeping the break itself.
/// `\r\n` and `\n\r` count as a single break.
pub fn nl2br(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
                let pair = if c == '\r' { '\n' } else { '\r' };
                if chars.peek() == Some(&pair) {
                    out.push(pair);
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Collapses control characters (line breaks included) into single spaces so
/// the text is safe to use as a one-line header value.
pub fn single_line(input: &str) -> String {
    input
        .split(|c: char| c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<script>alert("x" + 'y') && 1</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; + &#039;y&#039;) &amp;&amp; 1&lt;/script&gt;"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_html("Jane Doe äö"), "Jane Doe äö");
    }

    #[test]
    fn nl2br_handles_all_line_endings() {
        assert_eq!(nl2br("a\nb"), "a<br />\nb");
        assert_eq!(nl2br("a\r\nb"), "a<br />\r\nb");
        assert_eq!(nl2br("a\n\rb"), "a<br />\n\rb");
        assert_eq!(nl2br("a\rb"), "a<br />\rb");
        assert_eq!(nl2br("a\n\nb"), "a<br />\n<br />\nb");
        assert_eq!(nl2br("no breaks"), "no breaks");
    }

    #[test]
    fn single_line_strips_header_breaks() {
        assert_eq!(single_line("Hello\r\nBcc: evil@example.com"), "Hello Bcc: evil@example.com");
        assert_eq!(single_line("plain"), "plain");
    }
}
