//! Built-in encoding table. Codes follow the alphabetical order the training
//! label encoders assigned, so changing any entry invalidates shipped models.

use super::table::ColumnEncoding;

const EDUCATION: &[(&str, i64)] = &[
    ("college", 0),
    ("high school", 1),
    ("primary school", 2),
    ("university", 3),
];

const RELATIONSHIP: &[(&str, i64)] = &[
    ("bad", 0),
    ("friendly", 1),
    ("good", 2),
    ("neutral", 3),
    ("poor", 4),
];

const NEWBORN_RELATIONSHIP: &[(&str, i64)] = &[
    ("bad", 0),
    ("good", 1),
    ("neutral", 2),
    ("very good", 3),
];

const SUPPORT: &[(&str, i64)] = &[("high", 0), ("low", 1), ("medium", 2)];

const NO_YES: &[(&str, i64)] = &[("no", 0), ("yes", 1)];

const NAN_NO_YES: &[(&str, i64)] = &[("nan", 0), ("no", 1), ("yes", 2)];

const MOOD: &[(&str, i64)] = &[("nan", 0), ("afraid", 1), ("tired", 2), ("worried", 3)];

const PHQ2: &[(&str, i64)] = &[("negative", 0), ("positive", 1)];

pub(super) fn columns() -> Vec<ColumnEncoding> {
    vec![
        ColumnEncoding::new("Education Level", EDUCATION),
        ColumnEncoding::new("Husband's education level", EDUCATION),
        ColumnEncoding::new("Total children", &[("more than two", 0), ("one", 1), ("two", 2)]),
        ColumnEncoding::new("Disease before pregnancy", &[("nan", 0), ("chronic disease", 1)]),
        ColumnEncoding::new("Family type", &[("joint", 0), ("nuclear", 1)]),
        ColumnEncoding::new(
            "Number of household members",
            &[("2 to 5", 0), ("6 to 8", 1), ("9 or more", 2)],
        ),
        ColumnEncoding::new("Relationship with the in-laws", RELATIONSHIP),
        ColumnEncoding::new("Relationship with husband", RELATIONSHIP),
        ColumnEncoding::new("Relationship with the newborn", NEWBORN_RELATIONSHIP),
        ColumnEncoding::new("Relationship between father and newborn", NEWBORN_RELATIONSHIP),
        ColumnEncoding::new("Feeling about motherhood", &[("happy", 0), ("neutral", 1), ("sad", 2)]),
        ColumnEncoding::new("Recieved Support", SUPPORT),
        ColumnEncoding::new("Need for Support", SUPPORT),
        ColumnEncoding::new("Major changes or losses during pregnancy", NO_YES),
        ColumnEncoding::new("Abuse", NAN_NO_YES),
        ColumnEncoding::new("Trust and share feelings", NAN_NO_YES),
        ColumnEncoding::new(
            "Pregnancy length",
            &[("10 months", 0), ("9 months", 1), ("less than 5 months", 2)],
        ),
        ColumnEncoding::new("Pregnancy plan", NO_YES),
        ColumnEncoding::new("Regular checkups", NO_YES),
        ColumnEncoding::new("Fear of pregnancy", NO_YES),
        ColumnEncoding::new("Diseases during pregnancy", &[("nan", 0), ("non chronic disease", 1)]),
        ColumnEncoding::new(
            "Age of immediate older children",
            &[
                ("13yr or more", 0),
                ("1yr to 3yr", 1),
                ("4yr to 6yr", 2),
                ("7yr to 12yr", 3),
                ("nan", 4),
            ],
        ),
        ColumnEncoding::new("Birth compliancy", NO_YES),
        ColumnEncoding::new("Breastfeed", NO_YES),
        ColumnEncoding::new("Worry about newborn", NO_YES),
        ColumnEncoding::new("Relax/sleep when newborn is tended", NO_YES),
        ColumnEncoding::new("Relax/sleep when the newborn is asleep", NO_YES),
        ColumnEncoding::new("Angry after latest child birth", MOOD),
        ColumnEncoding::new("Feeling for regular activities", MOOD),
        ColumnEncoding::new("Depression before pregnancy (PHQ2)", PHQ2),
        ColumnEncoding::new("Depression during pregnancy (PHQ2)", PHQ2),
        ColumnEncoding::new(
            "PHQ9 Result",
            &[
                ("mild", 0),
                ("minimal", 1),
                ("moderate", 2),
                ("moderately severe", 3),
                ("normal", 4),
                ("severe", 5),
            ],
        ),
        // Added after the first training run; binary like its siblings.
        ColumnEncoding::new("Newborn illness", NO_YES),
    ]
}
