use crate::error::ExtractError;
use crate::models::{EntityLabel, ExtractedEntity};
use regex::Regex;
use std::collections::HashMap;

/// Currency amount with an optional trailing unit glyph; the glyph is
/// stripped from the stored text so amounts parse as plain integers.
const MONEY_AMOUNT_PATTERN: &str = r"\d{4,6}元?";
/// Explicit year mention. The trailing 年 is required so digit runs inside
/// amounts do not double as years, and stripped from the stored text.
const YEAR_PATTERN: &str = r"(?:19|20)\d{2}年";

/// Finds typed entity spans with a phrase lexicon (case-insensitive literal
/// match) and a pattern matcher run independently over the same text, then
/// reconciles overlaps. Span offsets are character offsets.
pub struct EntityRecognizer {
    lexicon: Vec<(EntityLabel, Regex)>,
    patterns: Vec<(EntityLabel, Regex)>,
}

impl EntityRecognizer {
    /// Builds a recognizer from explicit lexicon and pattern configuration.
    /// Invalid configuration (empty term sets, bad patterns) fails here,
    /// never per call.
    pub fn new(
        lexicon: &[(EntityLabel, Vec<String>)],
        patterns: &[(EntityLabel, String)],
    ) -> Result<Self, ExtractError> {
        let mut compiled_lexicon = Vec::with_capacity(lexicon.len());
        for (label, terms) in lexicon {
            if terms.is_empty() {
                return Err(ExtractError::RecognizerConfig(format!(
                    "label {label:?} has an empty term set"
                )));
            }
            if let Some(term) = terms.iter().find(|term| term.trim().is_empty()) {
                return Err(ExtractError::RecognizerConfig(format!(
                    "label {label:?} contains a blank term: {term:?}"
                )));
            }

            // Alternation is leftmost-first, so longer terms go first to
            // keep the longest-span preference.
            let mut ordered: Vec<&String> = terms.iter().collect();
            ordered.sort_by_key(|term| std::cmp::Reverse(term.chars().count()));
            let alternation = ordered
                .iter()
                .map(|term| regex::escape(term))
                .collect::<Vec<_>>()
                .join("|");
            let matcher = Regex::new(&format!("(?i){alternation}")).map_err(|error| {
                ExtractError::RecognizerConfig(format!("lexicon for {label:?}: {error}"))
            })?;
            compiled_lexicon.push((*label, matcher));
        }

        let mut compiled_patterns = Vec::with_capacity(patterns.len());
        for (label, pattern) in patterns {
            let matcher = Regex::new(pattern).map_err(|error| {
                ExtractError::RecognizerConfig(format!("pattern for {label:?}: {error}"))
            })?;
            compiled_patterns.push((*label, matcher));
        }

        Ok(Self {
            lexicon: compiled_lexicon,
            patterns: compiled_patterns,
        })
    }

    /// Recognizer preloaded with the admissions-domain lexicon and the
    /// amount/year patterns.
    pub fn with_default_config() -> Result<Self, ExtractError> {
        Self::new(&default_lexicon(), &default_patterns())
    }

    /// Runs both matchers over `text`, unions their candidates and applies
    /// the reconciliation invariant: sort by `(start asc, length desc)`,
    /// collapse identical `(start, end, label)` keys, then re-sort by start
    /// so the output always reflects document order.
    pub fn recognize(&self, text: &str) -> Vec<ExtractedEntity> {
        let char_offsets = byte_to_char_offsets(text);
        let mut candidates = Vec::new();

        for (label, matcher) in &self.lexicon {
            for found in matcher.find_iter(text) {
                candidates.push(ExtractedEntity::new(
                    found.as_str(),
                    *label,
                    char_offsets[&found.start()],
                    char_offsets[&found.end()],
                ));
            }
        }

        for (label, matcher) in &self.patterns {
            for found in matcher.find_iter(text) {
                let value = match label {
                    EntityLabel::MoneyAmount => found.as_str().trim_end_matches('元'),
                    EntityLabel::Year => found.as_str().trim_end_matches('年'),
                    _ => found.as_str(),
                };
                candidates.push(ExtractedEntity::new(
                    value,
                    *label,
                    char_offsets[&found.start()],
                    char_offsets[&found.end()],
                ));
            }
        }

        reconcile(candidates)
    }
}

fn reconcile(mut candidates: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
    });

    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<ExtractedEntity> = candidates
        .into_iter()
        .filter(|entity| seen.insert((entity.start, entity.end, entity.label)))
        .collect();

    unique.sort_by_key(|entity| entity.start);
    unique
}

fn byte_to_char_offsets(text: &str) -> HashMap<usize, usize> {
    let mut offsets = HashMap::with_capacity(text.len() + 1);
    let mut count = 0;
    for (char_index, (byte_index, _)) in text.char_indices().enumerate() {
        offsets.insert(byte_index, char_index);
        count = char_index + 1;
    }
    offsets.insert(text.len(), count);
    offsets
}

pub fn default_lexicon() -> Vec<(EntityLabel, Vec<String>)> {
    let terms = |items: &[&str]| items.iter().map(|term| (*term).to_string()).collect();

    vec![
        (
            EntityLabel::Department,
            terms(&[
                "信息技术系",
                "经济与法学系",
                "管理学系",
                "外语系",
                "文化产业系",
                "国际商学系",
            ]),
        ),
        (
            EntityLabel::Major,
            terms(&[
                "计算机科学与技术",
                "网络工程",
                "软件工程",
                "数字媒体技术",
                "会计学",
                "财务管理",
                "国际经济与贸易",
                "金融学",
                "法学",
                "英语",
                "日语",
                "市场营销",
                "电子商务",
                "物流管理",
                "汉语言文学",
                "广告学",
                "旅游管理",
            ]),
        ),
        (
            EntityLabel::College,
            terms(&["福建师范大学协和学院", "协和学院"]),
        ),
        (
            EntityLabel::Course,
            terms(&[
                "高等数学",
                "程序设计基础",
                "数据结构",
                "操作系统",
                "计算机网络",
                "数据库原理",
                "大学英语",
                "管理学原理",
                "会计学原理",
            ]),
        ),
    ]
}

pub fn default_patterns() -> Vec<(EntityLabel, String)> {
    vec![
        (EntityLabel::MoneyAmount, MONEY_AMOUNT_PATTERN.to_string()),
        (EntityLabel::Year, YEAR_PATTERN.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> EntityRecognizer {
        EntityRecognizer::with_default_config().expect("default config is valid")
    }

    fn labels_of(entities: &[ExtractedEntity], label: EntityLabel) -> Vec<&ExtractedEntity> {
        entities.iter().filter(|e| e.label == label).collect()
    }

    #[test]
    fn lexicon_and_pattern_matches_are_unioned() {
        let entities = recognizer().recognize("信息技术系 数字媒体技术 20000元");

        assert!(entities
            .iter()
            .any(|e| e.label == EntityLabel::Department && e.text == "信息技术系"));
        assert!(entities
            .iter()
            .any(|e| e.label == EntityLabel::Major && e.text == "数字媒体技术"));
        assert!(entities
            .iter()
            .any(|e| e.label == EntityLabel::MoneyAmount && e.text == "20000"));
    }

    #[test]
    fn money_amount_unit_glyph_is_stripped_but_span_is_kept() {
        let entities = recognizer().recognize("学费20000元每学年");
        let amounts = labels_of(&entities, EntityLabel::MoneyAmount);

        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].text, "20000");
        // Span still covers the unit glyph.
        assert_eq!(amounts[0].end - amounts[0].start, 6);
    }

    #[test]
    fn year_requires_explicit_marker() {
        let entities = recognizer().recognize("2024年招生，学费20000元");
        let years = labels_of(&entities, EntityLabel::Year);

        assert_eq!(years.len(), 1);
        assert_eq!(years[0].text, "2024");
        // The digit run inside the amount must not double as a year.
        assert_eq!(years[0].start, 0);
    }

    #[test]
    fn identical_span_and_label_collapse_to_one() {
        let recognizer = EntityRecognizer::new(
            &[
                (EntityLabel::Major, vec!["会计学".to_string()]),
                (EntityLabel::Major, vec!["会计学".to_string()]),
            ],
            &[],
        )
        .expect("config is valid");

        let entities = recognizer.recognize("会计学");
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn longer_span_wins_ordering_and_output_is_document_ordered() {
        // "计算机科学与技术" embeds no shorter lexicon term, so overlap is
        // forced with a custom lexicon where one term prefixes another.
        let recognizer = EntityRecognizer::new(
            &[(
                EntityLabel::Major,
                vec!["网络工程".to_string(), "网络工程技术".to_string()],
            )],
            &[],
        )
        .expect("config is valid");

        let entities = recognizer.recognize("网络工程技术 会计学 网络工程");
        assert!(!entities.is_empty());
        let starts: Vec<usize> = entities.iter().map(|e| e.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn offsets_are_character_offsets() {
        let entities = recognizer().recognize("会计学 20000元");
        let major = labels_of(&entities, EntityLabel::Major)[0];
        let amount = labels_of(&entities, EntityLabel::MoneyAmount)[0];

        assert_eq!((major.start, major.end), (0, 3));
        assert_eq!((amount.start, amount.end), (4, 10));
    }

    #[test]
    fn empty_term_set_is_a_config_error() {
        let result = EntityRecognizer::new(&[(EntityLabel::Course, Vec::new())], &[]);
        assert!(matches!(result, Err(ExtractError::RecognizerConfig(_))));
    }

    #[test]
    fn blank_term_is_a_config_error() {
        let result =
            EntityRecognizer::new(&[(EntityLabel::Course, vec!["  ".to_string()])], &[]);
        assert!(matches!(result, Err(ExtractError::RecognizerConfig(_))));
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let result =
            EntityRecognizer::new(&[], &[(EntityLabel::Year, "(unclosed".to_string())]);
        assert!(matches!(result, Err(ExtractError::RecognizerConfig(_))));
    }
}
