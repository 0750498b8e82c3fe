//! Integration Tests for the derivation pipeline
//!
//! Runs whole answer sets through every stage and checks the encoded output.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::logic::encoding::LabelEncodingTable;
    use crate::logic::features::{
        derive_raw, AnswerSet, FeatureDeriver, FeatureValue, FEATURE_COUNT, FEATURE_LAYOUT,
    };

    const EPS: f64 = 1e-9;

    fn deriver() -> FeatureDeriver {
        FeatureDeriver::new(Arc::new(LabelEncodingTable::training_default()))
    }

    fn worked_example() -> AnswerSet {
        AnswerSet::new()
            .with("age", 28)
            .with("education_level", "university")
            .with("number_of_pregnancies", 2)
            .with("phq9_score", 12)
            .with("depression_history", "no")
            .with("relationship_husband", "good")
            .with("relationship_inlaws", "neutral")
            .with("family_support", "high")
            .with("feeling_motherhood", "happy")
            .with("major_changes", "no")
            .with("fear_pregnancy", "no")
            .with("abuse", "no")
            .with("worry_newborn", "yes")
    }

    /// Every layout column present, in order, and numeric
    #[test]
    fn test_output_covers_layout_in_order() {
        let vector = deriver().derive(&worked_example());
        assert_eq!(vector.len(), FEATURE_COUNT);
        assert_eq!(vector.names().collect::<Vec<_>>(), FEATURE_LAYOUT.to_vec());
        assert!(vector.is_numeric());
        assert!(vector.is_compatible());
    }

    /// Age alone is enough for a complete vector
    #[test]
    fn test_age_only_answer_set() {
        let vector = deriver().derive(&AnswerSet::new().with("age", 30));
        assert_eq!(vector.len(), FEATURE_COUNT);
        assert!(vector.is_numeric());
        assert_eq!(vector.number("Age"), Some(30.0));
        assert_eq!(vector.number("PHQ9 Score"), Some(0.0));
        // minimal → 1, nan → 4 for a first pregnancy
        assert_eq!(vector.number("PHQ9 Result"), Some(1.0));
        assert_eq!(vector.number("Age of immediate older children"), Some(4.0));
    }

    #[test]
    fn test_worked_example_values() {
        let v = deriver().derive(&worked_example());

        assert_eq!(v.number("PHQ9 Result"), Some(2.0)); // moderate
        assert_eq!(v.number("depression_history_flag"), Some(1.0));
        assert_eq!(v.number("Depression before pregnancy (PHQ2)"), Some(0.0));
        assert_eq!(v.number("Depression during pregnancy (PHQ2)"), Some(1.0));
        assert_eq!(v.number("Relax/sleep when newborn is tended"), Some(0.0));
        assert_eq!(v.number("Relax/sleep when the newborn is asleep"), Some(0.0));
        assert_eq!(v.number("Feeling for regular activities"), Some(2.0)); // tired
        assert_eq!(v.number("Angry after latest child birth"), Some(2.0));
        assert_eq!(v.number("Relationship with the newborn"), Some(3.0)); // very good
        assert_eq!(v.number("Relationship between father and newborn"), Some(1.0)); // good
        assert_eq!(v.number("Education Level"), Some(3.0));
        assert_eq!(v.number("Husband's education level"), Some(3.0));
        assert_eq!(v.number("Number of household members"), Some(0.0));
        assert_eq!(v.number("Age of immediate older children"), Some(1.0));
        assert_eq!(v.number("Newborn illness"), Some(1.0));
        assert_eq!(v.number("age_squared"), Some(784.0));
        assert_eq!(v.number("age_parity_interaction"), Some(56.0));
        assert_eq!(v.number("age_optimal"), Some(1.0));
        assert_eq!(v.number("phq9_moderate"), Some(1.0));

        let ssi = v.number("social_support_index").unwrap();
        assert!((ssi - 0.875).abs() < EPS);
        let risk = v.number("cumulative_risk_score").unwrap();
        assert!((risk - 3.25).abs() < EPS);
    }

    #[test]
    fn test_need_for_support_mirrors_received_support() {
        for support in ["high", "medium", "low"] {
            let v = deriver().derive(&AnswerSet::new().with("age", 25).with("family_support", support));
            assert_eq!(v.number("Recieved Support"), v.number("Need for Support"));
        }
    }

    #[test]
    fn test_joint_family_buckets_household() {
        let v = deriver().derive(&AnswerSet::new().with("age", 25).with("family_type", "joint"));
        // 6 members → "6 to 8"
        assert_eq!(v.number("Number of household members"), Some(1.0));
        assert_eq!(v.number("Family type"), Some(0.0));
    }

    #[test]
    fn test_raw_stage_keeps_text() {
        let raw = derive_raw(&worked_example());
        assert_eq!(raw.get("PHQ9 Result"), Some(&FeatureValue::from("moderate")));
        assert_eq!(raw.get("Number of household members"), Some(&FeatureValue::Number(3.0)));
    }

    #[test]
    fn test_case_and_whitespace_do_not_matter() {
        let messy = AnswerSet::new()
            .with(" AGE ", "28")
            .with("Education_Level", "  UNIVERSITY ")
            .with("Number_Of_Pregnancies", 2.0)
            .with("PHQ9_Score", "12")
            .with("Relationship_Husband", "Good")
            .with("relationship_inlaws", "NEUTRAL")
            .with("Family_Support", "High")
            .with("feeling_motherhood", "Happy")
            .with("worry_newborn", true);
        assert_eq!(deriver().derive(&messy), deriver().derive(&worked_example()));
    }

    /// Numeric anchors far outside any real questionnaire
    #[test]
    fn test_extreme_numbers_derive_finite_vectors() {
        let cases = [
            AnswerSet::new().with("age", 1e10).with("number_of_pregnancies", 1e10),
            AnswerSet::new().with("age", 1e300).with("number_of_pregnancies", 1e300),
            AnswerSet::new().with("age", -1e300).with("number_of_pregnancies", -7),
            AnswerSet::new().with("age", i64::MAX).with("number_of_pregnancies", i64::MIN),
            AnswerSet::new().with("age", "9.3e18").with("phq9_score", 1e300),
            AnswerSet::new().with("age", 28).with("phq9_score", -1e300).with("phq9_q1", 1e12),
        ];

        for answers in cases {
            let v = deriver().derive(&answers);
            assert_eq!(v.len(), FEATURE_COUNT);
            assert!(v.is_numeric());
            for (name, value) in v.iter() {
                match value {
                    FeatureValue::Number(n) => assert!(n.is_finite(), "{} in {:?}", name, answers),
                    FeatureValue::Text(_) => panic!("{} left unencoded", name),
                }
            }
        }

        // Truncation saturates at the i64 range
        let v = deriver().derive(&AnswerSet::new().with("age", 1e300));
        assert_eq!(v.number("Age"), Some(i64::MAX as f64));
        assert_eq!(v.number("age_advanced"), Some(1.0));

        // Screening totals clamp to 0..=27
        let v = deriver().derive(&AnswerSet::new().with("age", 30).with("phq9_score", 1e300));
        assert_eq!(v.number("PHQ9 Score"), Some(27.0));
        let v = deriver().derive(&AnswerSet::new().with("age", 30).with("phq9_score", -1e300));
        assert_eq!(v.number("PHQ9 Score"), Some(0.0));
    }

    #[test]
    fn test_junk_answers_never_panic() {
        let junk = AnswerSet::new()
            .with("age", json!({"years": 30}))
            .with("number_of_pregnancies", json!([1, 2]))
            .with("phq9_q1", json!(null))
            .with("phq9_q2", "¯\\_(ツ)_/¯")
            .with("family_support", 42)
            .with("unrelated_question", "ignored");
        let v = deriver().derive(&junk);
        assert_eq!(v.len(), FEATURE_COUNT);
        assert!(v.is_numeric());
        assert_eq!(v.number("Age"), Some(25.0));
    }
}
