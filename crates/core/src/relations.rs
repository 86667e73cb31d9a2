use crate::models::{
    EntityLabel, ExtractedEntity, ExtractedRelation, FeeStandardInfo, RelationTarget, RelationType,
};

/// Reference year stamped on fee standards extracted without an explicit
/// year mention.
pub const FEE_REFERENCE_YEAR: i64 = 2024;
/// Amounts at or below this are incidental fees, not tuition.
pub const FEE_AMOUNT_THRESHOLD: i64 = 5000;
/// How many entities ahead of a major the fee scan may look.
const FEE_LOOKAHEAD: usize = 3;
/// Keyword relations only fire when the spans start within this many
/// characters of each other.
const KEYWORD_MAX_DISTANCE: usize = 100;

/// A keyword-derived relation template: fires for an ordered label pair when
/// one of the keywords occurs strictly between the two spans.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub source: EntityLabel,
    pub target: EntityLabel,
    pub rel_type: RelationType,
    pub keywords: Vec<String>,
}

/// Derives typed relations from one document's ordered entity sequence.
///
/// The traversal is strictly left-to-right: the department-context rule and
/// the fee lookahead both depend on document order, which is why a document
/// is never split across threads.
pub struct RelationExtractor {
    rules: Vec<KeywordRule>,
}

impl Default for RelationExtractor {
    fn default() -> Self {
        Self {
            rules: vec![KeywordRule {
                source: EntityLabel::Major,
                target: EntityLabel::Course,
                rel_type: RelationType::CoversCourse,
                keywords: vec![
                    "课程".to_string(),
                    "开设".to_string(),
                    "学习".to_string(),
                    "主修".to_string(),
                ],
            }],
        }
    }
}

impl RelationExtractor {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// Single pass over the document-ordered entities.
    ///
    /// A department sets the live context (overwrite, not append); every
    /// major seen afterward links to it until the next department. Models
    /// merged table cells where the department header is not repeated per
    /// row. Each major additionally scans a bounded window forward for its
    /// tuition amount, and an independent keyword pass links nearby pairs.
    pub fn extract(
        &self,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> Vec<ExtractedRelation> {
        let chars: Vec<char> = text.chars().collect();
        let mut relations = Vec::new();
        let mut current_department: Option<&ExtractedEntity> = None;

        for (index, entity) in entities.iter().enumerate() {
            if entity.label == EntityLabel::Department {
                current_department = Some(entity);
            }

            if entity.label == EntityLabel::Major {
                if let Some(department) = current_department {
                    relations.push(ExtractedRelation {
                        rel_type: RelationType::OffersMajor,
                        source: department.clone(),
                        target: RelationTarget::Entity(entity.clone()),
                    });
                }

                if let Some(fee) = self.scan_for_fee(entity, &entities[index + 1..]) {
                    relations.push(fee);
                }
            }

            for (other_index, other) in entities.iter().enumerate() {
                if index == other_index {
                    continue;
                }
                if entity.start.abs_diff(other.start) > KEYWORD_MAX_DISTANCE {
                    continue;
                }

                for rule in &self.rules {
                    if entity.label != rule.source || other.label != rule.target {
                        continue;
                    }

                    let between = text_between(&chars, entity, other);
                    if rule.keywords.iter().any(|keyword| between.contains(keyword)) {
                        relations.push(ExtractedRelation {
                            rel_type: rule.rel_type,
                            source: entity.clone(),
                            target: RelationTarget::Entity(other.clone()),
                        });
                    }
                }
            }
        }

        relations
    }

    /// Looks ahead from a major for its tuition amount. The scan aborts as
    /// soon as another major or a department intervenes, so an amount never
    /// cross-links to the wrong program, and the first qualifying amount
    /// wins.
    fn scan_for_fee(
        &self,
        major: &ExtractedEntity,
        following: &[ExtractedEntity],
    ) -> Option<ExtractedRelation> {
        for entity in following.iter().take(FEE_LOOKAHEAD) {
            match entity.label {
                EntityLabel::Major | EntityLabel::Department => return None,
                EntityLabel::MoneyAmount => {
                    // Unparseable or sub-threshold amounts are no match;
                    // the scan keeps going within the window.
                    let Some(amount) = parse_amount(&entity.text) else {
                        continue;
                    };
                    if amount > FEE_AMOUNT_THRESHOLD {
                        return Some(ExtractedRelation {
                            rel_type: RelationType::HasFeeStandardForYear,
                            source: major.clone(),
                            target: RelationTarget::FeeStandard(FeeStandardInfo {
                                major_name: major.text.clone(),
                                year: FEE_REFERENCE_YEAR,
                                amount,
                                fee_standard_id: fee_standard_id(&major.text, FEE_REFERENCE_YEAR),
                            }),
                        });
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Deterministic composite key for a fee standard.
pub fn fee_standard_id(major_name: &str, year: i64) -> String {
    format!("学费-{major_name}-{year}")
}

/// Amount parsing never errors; a non-numeric amount is simply no match.
pub fn parse_amount(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// The literal text strictly between two spans, in character offsets.
fn text_between(chars: &[char], a: &ExtractedEntity, b: &ExtractedEntity) -> String {
    let (from, to) = if a.start < b.start {
        (a.end.min(b.start), b.start)
    } else {
        (b.end.min(a.start), a.start)
    };

    let from = from.min(chars.len());
    let to = to.min(chars.len());
    chars[from..to].iter().collect()
}
