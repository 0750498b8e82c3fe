//! Derivation Pipeline - answers → encoded feature vector
//!
//! Stages run in a fixed order, each a pure function of the previous ones:
//!
//! 1. normalize answers      (`answers`)
//! 2. screening score        (`screening`)
//! 3. direct fields          (`derived::DirectFields`)
//! 4-5. derived fields       (`derived::DerivedFields`)
//! 6. engineered features    (`engineered`)
//! 7. categorical encoding   (this file)

use std::sync::Arc;

use super::answers::{AnswerSet, NormalizedAnswers};
use super::derived::{household_bucket, DerivedFields, DirectFields};
use super::engineered::EngineeredFeatures;
use super::layout::{is_categorical, FEATURE_COUNT, HOUSEHOLD_COLUMN};
use super::screening::compute_score;
use super::vector::{FeatureValue, FeatureVector};
use crate::logic::encoding::LabelEncodingTable;

/// Turns an answer set into the classifier's feature vector.
/// Total: never fails, whatever the answers contain.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    table: Arc<LabelEncodingTable>,
}

impl FeatureDeriver {
    pub fn new(table: Arc<LabelEncodingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LabelEncodingTable {
        &self.table
    }

    /// Full derivation, all values numeric
    pub fn derive(&self, answers: &AnswerSet) -> FeatureVector {
        let raw = derive_raw(answers);
        self.encode(&raw)
    }

    /// Stage 7: encode categorical text and bucket the household size
    pub fn encode(&self, raw: &FeatureVector) -> FeatureVector {
        let mut encoded = FeatureVector::new();
        for (name, value) in raw.iter() {
            let value = match value {
                FeatureValue::Text(text) if is_categorical(name) => {
                    FeatureValue::Number(self.table.encode(name, text) as f64)
                }
                FeatureValue::Number(n) if name == HOUSEHOLD_COLUMN => {
                    FeatureValue::Number(household_bucket(n.trunc() as i64) as f64)
                }
                other => other.clone(),
            };
            encoded.insert(name, value);
        }
        encoded
    }
}

/// Stages 1-6: named values before encoding. Categorical columns hold text.
pub fn derive_raw(answers: &AnswerSet) -> FeatureVector {
    let normalized = NormalizedAnswers::from_answers(answers);
    let score = compute_score(&normalized);
    let direct = DirectFields::read(&normalized);
    let derived = DerivedFields::derive(&direct, normalized.pregnancies, score);
    let engineered = EngineeredFeatures::compute(normalized.age, normalized.pregnancies, score, &direct);

    let mut v = FeatureVector::new();

    v.insert("Age", normalized.age);
    v.insert("Number of the latest pregnancy", normalized.pregnancies);
    v.insert("Education Level", direct.education.as_str());
    v.insert("Husband's education level", direct.husbands_education.as_str());
    v.insert("Total children", direct.total_children.as_str());
    v.insert("Family type", direct.family_type.as_str());
    v.insert("PHQ9 Score", score.value() as i64);
    v.insert("PHQ9 Result", derived.severity.as_token());

    v.insert(HOUSEHOLD_COLUMN, derived.household_members);
    v.insert("Disease before pregnancy", derived.disease_before);
    v.insert("Pregnancy length", direct.pregnancy_length.as_str());
    v.insert("Pregnancy plan", direct.pregnancy_plan.as_str());
    v.insert("Regular checkups", direct.regular_checkups.as_str());
    v.insert("Fear of pregnancy", direct.fear_pregnancy.as_str());
    v.insert("Diseases during pregnancy", derived.diseases_during);

    v.insert("Feeling about motherhood", direct.feeling_motherhood.as_str());
    v.insert("Recieved Support", direct.family_support.as_str());
    v.insert("Need for Support", direct.family_support.as_str());
    v.insert("Major changes or losses during pregnancy", direct.major_changes.as_str());
    v.insert("Abuse", direct.abuse.as_str());
    v.insert("Trust and share feelings", direct.trust_share.as_str());
    v.insert("Feeling for regular activities", derived.mood_proxy);
    v.insert("Angry after latest child birth", derived.mood_proxy);

    v.insert("Relationship with the in-laws", direct.relationship_inlaws.as_str());
    v.insert("Relationship with husband", direct.relationship_husband.as_str());
    v.insert("Relationship with the newborn", derived.newborn_relationship);
    v.insert("Relationship between father and newborn", derived.father_newborn_relationship.as_str());
    v.insert("Age of immediate older children", derived.older_children_age);

    v.insert("Birth compliancy", derived.birth_compliancy);
    v.insert("Breastfeed", direct.breastfeed.as_str());
    v.insert("Worry about newborn", direct.worry_newborn.as_str());
    v.insert("Relax/sleep when newborn is tended", derived.sleep_proxy);
    v.insert("Relax/sleep when the newborn is asleep", derived.sleep_proxy);
    v.insert("Depression before pregnancy (PHQ2)", derived.depression_before);
    v.insert("Depression during pregnancy (PHQ2)", derived.depression_during);
    v.insert("Newborn illness", derived.newborn_illness);

    for (name, value) in engineered.columns() {
        v.insert(name, value);
    }

    debug_assert_eq!(v.len(), FEATURE_COUNT);
    v
}
