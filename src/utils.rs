//! Small text helpers shared by the workbook and report layers.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Strip HTML tags and unescape the handful of entities that show up in
/// question text, leaving plain text suitable for a spreadsheet cell.
pub fn strip_html(text: &str) -> String {
    let stripped = tag_pattern().replace_all(text, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::strip_html;

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_html("<p>Rights &amp; access</p>"),
            "Rights & access"
        );
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(strip_html("<b>bold</b>&nbsp;text"), "bold text");
    }
}
