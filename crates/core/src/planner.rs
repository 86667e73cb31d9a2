use crate::models::{
    DocumentFingerprint, EntityLabel, ExtractedEntity, ExtractedRelation, GraphMutation,
    RelationTarget, RelationType,
};
use serde_json::json;

const FEE_ITEM_NAME: &str = "学费";
const FEE_UNIT: &str = "元/生.学年";
const DEFAULT_MAJOR_TYPE: &str = "普通专业";

/// Maps extracted entities and relations onto the fixed graph schema as
/// parameterized MERGE statements. Node labels and relationship types come
/// from closed enums, never from source text, so interpolating them into
/// Cypher is safe.
pub struct GraphMutationPlanner;

impl GraphMutationPlanner {
    /// Upsert template for one entity, keyed by its natural name. Labels
    /// with no standalone node (amounts) and unparseable years yield no
    /// mutation; skipping is deliberate forward-compatibility.
    pub fn plan_entity(entity: &ExtractedEntity) -> Option<GraphMutation> {
        match entity.label {
            EntityLabel::Department => Some(GraphMutation {
                statement: "MERGE (d:Department {name: $name})".to_string(),
                parameters: json!({ "name": entity.text }),
            }),
            EntityLabel::Major => Some(GraphMutation {
                statement: "MERGE (m:Major {name: $name}) \
                            ON CREATE SET m.full_name = $full_name, m.type = $type"
                    .to_string(),
                parameters: json!({
                    "name": entity.text,
                    "full_name": entity.text,
                    "type": DEFAULT_MAJOR_TYPE,
                }),
            }),
            EntityLabel::Course => Some(GraphMutation {
                statement: "MERGE (c:Course {name: $name})".to_string(),
                parameters: json!({ "name": entity.text }),
            }),
            // The institution is singular and well-known, so the node always
            // carries the same descriptive attributes regardless of which
            // source text mentioned it.
            EntityLabel::College => Some(GraphMutation {
                statement: "MERGE (c:College {name: $name}) \
                            ON CREATE SET c.full_name = $full_name, c.address = $address, \
                            c.website = $website, c.admissions_phone = $admissions_phone, \
                            c.description = $description"
                    .to_string(),
                parameters: json!({
                    "name": entity.text,
                    "full_name": "福建师范大学协和学院",
                    "address": "福州市闽侯上街大学城学府南路68号",
                    "website": "http://cuc.fjnu.edu.cn/",
                    "admissions_phone": "0591-22868770",
                    "description": "福建师范大学协和学院是经福建省人民政府批准设立并通过教育部确认的独立学院。",
                }),
            }),
            EntityLabel::Year => {
                let value: i64 = entity.text.trim().parse().ok()?;
                Some(GraphMutation {
                    statement: "MERGE (y:Year {value: $value})".to_string(),
                    parameters: json!({ "value": value }),
                })
            }
            EntityLabel::MoneyAmount => None,
        }
    }

    /// Upsert template for one relation. Endpoints are matched by natural
    /// key; the edge is merged, never duplicated. The fee relation also
    /// merges its derived Year and FeeStandard nodes, with last-write-wins
    /// semantics for the amount on repeated import.
    pub fn plan_relation(relation: &ExtractedRelation) -> Option<GraphMutation> {
        match (&relation.rel_type, &relation.target) {
            (RelationType::HasFeeStandardForYear, RelationTarget::FeeStandard(info)) => {
                Some(GraphMutation {
                    statement: "MATCH (m:Major {name: $major_name}) \
                                MERGE (fi:FeeItem {name: $fee_item_name}) \
                                MERGE (y:Year {value: $year}) \
                                MERGE (fs:FeeStandard {id: $fee_standard_id}) \
                                ON CREATE SET fs.amount = $amount, fs.unit = $unit \
                                ON MATCH SET fs.amount = $amount, fs.unit = $unit \
                                MERGE (m)-[:HAS_FEE_STANDARD_FOR_YEAR {year: $year}]->(fs) \
                                MERGE (fs)-[:HAS_FEE_ITEM]->(fi)"
                        .to_string(),
                    parameters: json!({
                        "major_name": info.major_name,
                        "year": info.year,
                        "amount": info.amount,
                        "fee_standard_id": info.fee_standard_id,
                        "fee_item_name": FEE_ITEM_NAME,
                        "unit": FEE_UNIT,
                    }),
                })
            }
            // A fee relation without its derived target, or a derived
            // target on any other relation type, is malformed input; skip
            // it rather than abort the document.
            (RelationType::HasFeeStandardForYear, RelationTarget::Entity(_)) => None,
            (_, RelationTarget::FeeStandard(_)) => None,
            // Document references target a PolicyDocument keyed by doc_id,
            // not a text span; they are planned from the fingerprint via
            // `plan_document_reference`.
            (RelationType::ReferencesDocument, _) => None,
            (rel_type, RelationTarget::Entity(target)) => {
                let source_label = relation.source.label.node_label()?;
                let target_label = target.label.node_label()?;
                Some(GraphMutation {
                    statement: format!(
                        "MATCH (s:{source_label} {{name: $source_name}}) \
                         MATCH (t:{target_label} {{name: $target_name}}) \
                         MERGE (s)-[:{}]->(t)",
                        rel_type.as_str()
                    ),
                    parameters: json!({
                        "source_name": relation.source.text,
                        "target_name": target.text,
                    }),
                })
            }
        }
    }

    /// Provenance edge from an entity back to the document it was extracted
    /// from. The entity is matched by natural name, the document by doc_id.
    /// Years are keyed by value rather than name and amounts have no node,
    /// so neither can anchor a reference.
    pub fn plan_document_reference(
        entity: &ExtractedEntity,
        fingerprint: &DocumentFingerprint,
    ) -> Option<GraphMutation> {
        if entity.label == EntityLabel::Year {
            return None;
        }
        let source_label = entity.label.node_label()?;
        Some(GraphMutation {
            statement: format!(
                "MATCH (s:{source_label} {{name: $source_name}}) \
                 MATCH (p:PolicyDocument {{doc_id: $doc_id}}) \
                 MERGE (s)-[:{}]->(p)",
                RelationType::ReferencesDocument.as_str()
            ),
            parameters: json!({
                "source_name": entity.text,
                "doc_id": fingerprint.doc_id,
            }),
        })
    }

    /// Provenance node for the source document itself, keyed by its stable
    /// document id.
    pub fn plan_document(fingerprint: &DocumentFingerprint) -> GraphMutation {
        GraphMutation {
            statement: "MERGE (p:PolicyDocument {doc_id: $doc_id}) \
                        SET p.title = $title, p.source_path = $source_path, \
                        p.checksum = $checksum, p.ingested_at = $ingested_at"
                .to_string(),
            parameters: json!({
                "doc_id": fingerprint.doc_id,
                "title": fingerprint.title,
                "source_path": fingerprint.source_path,
                "checksum": fingerprint.checksum,
                "ingested_at": fingerprint.ingested_at.to_rfc3339(),
            }),
        }
    }
}
