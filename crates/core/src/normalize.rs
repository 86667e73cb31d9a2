use crate::error::ExtractError;
use regex::Regex;

/// Cleans extracted text and segments it into sentences. All patterns are
/// compiled once at construction; a bad pattern is a configuration error,
/// not a per-document one.
pub struct TextNormalizer {
    whitespace: Regex,
    date_stamp: Regex,
    page_marker: Regex,
    disallowed: Regex,
    sentence_boundary: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            whitespace: Regex::new(r"[\s\u{3000}]+")?,
            date_stamp: Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日")?,
            page_marker: Regex::new(r"第\s*\d+\s*页|[Pp]age\s*\d+")?,
            // Allow-list: CJK ideographs, ASCII alphanumerics, whitespace
            // and a small punctuation set. Everything else is noise.
            disallowed: Regex::new(r"[^\u{4e00}-\u{9fa5}a-zA-Z0-9\s.,;!?:()（）《》“”、。！？；：-]")?,
            sentence_boundary: Regex::new(r"[。！？!?；;\n]+")?,
        })
    }

    /// Deterministic, lossy cleanup: collapse whitespace variants, strip
    /// header/footer artifacts (date stamps, page markers), drop characters
    /// outside the allow-list.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = self.date_stamp.replace_all(text, "");
        let text = self.page_marker.replace_all(&text, "");
        let text = self.disallowed.replace_all(&text, "");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().to_string()
    }

    /// Splits cleaned text into sentences; blank segments are dropped.
    pub fn segment(&self, text: &str) -> Vec<String> {
        self.sentence_boundary
            .split(text)
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new().expect("default patterns compile")
    }

    #[test]
    fn whitespace_variants_collapse_to_single_spaces() {
        let cleaned = normalizer().clean("信息技术系\u{3000}\u{3000}网络工程\t\t20000");
        assert_eq!(cleaned, "信息技术系 网络工程 20000");
    }

    #[test]
    fn header_footer_artifacts_are_stripped() {
        let cleaned = normalizer().clean("2024年6月1日 招生简章 第 3 页 学费标准");
        assert!(!cleaned.contains("2024年6月1日"));
        assert!(!cleaned.contains("页"));
        assert!(cleaned.contains("招生简章"));
        assert!(cleaned.contains("学费标准"));
    }

    #[test]
    fn characters_outside_allow_list_are_dropped() {
        let cleaned = normalizer().clean("学费★20000元→（每学年）");
        assert!(!cleaned.contains('★'));
        assert!(!cleaned.contains('→'));
        assert!(cleaned.contains("（每学年）"));
    }

    #[test]
    fn cleaning_is_deterministic() {
        let input = "第1页 2023年9月10日 会计学◆专业";
        let n = normalizer();
        assert_eq!(n.clean(input), n.clean(input));
    }

    #[test]
    fn segmentation_drops_blank_sentences() {
        let sentences = normalizer().segment("学院简介。 。招生计划！ \n 联系方式");
        assert_eq!(sentences, vec!["学院简介", "招生计划", "联系方式"]);
    }
}
