use std::collections::HashSet;

use crate::models::CatalogRow;
use crate::services::catalog::Catalog;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub package_id: String,
    pub package_name: String,
    pub tests_included: String,
}

struct ConditionRule {
    trigger: &'static str,
    keyword_terms: &'static [&'static str],
    name_terms: &'static [&'static str],
}

/// Recognized medical-history conditions and the catalog terms they map to.
/// Extending coverage means adding a row here.
const CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        trigger: "diabetes",
        keyword_terms: &["diabetic screening", "blood sugar", "diabetes"],
        name_terms: &["diabetes"],
    },
    ConditionRule {
        trigger: "hypertension",
        keyword_terms: &["blood pressure", "hypertension", "cardiac", "heart"],
        name_terms: &["cardiac", "heart", "hypertension"],
    },
];

const WOMENS_HEALTH_TESTS: &[&str] = &["mammogram", "pap smear", "gynecology"];
const COLON_SCREENING_TESTS: &[&str] = &["colonoscopy", "colorectal"];

/// Pick the best-fitting package for a patient profile. Returns `None` only
/// when the catalog is empty; any non-empty catalog always yields a result
/// through the fallback chain.
pub fn recommend(
    age: u32,
    gender: &str,
    medical_history: &str,
    catalog: &Catalog,
) -> Option<Recommendation> {
    let rows = catalog.rows();
    if rows.is_empty() {
        return None;
    }

    let gender = gender.trim().to_lowercase();
    let history = medical_history.to_lowercase();

    let base: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            (row.recommended_age == 0 || age >= row.recommended_age)
                && (row.recommended_gender.trim().is_empty()
                    || row.recommended_gender.to_lowercase().contains(&gender))
        })
        .map(|(i, _)| i)
        .collect();

    let mut combined: Vec<usize> = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();

    // Condition-specific matches take priority over demographic ones.
    for rule in CONDITION_RULES {
        if !history.contains(rule.trigger) {
            continue;
        }
        for &i in &base {
            let row = &rows[i];
            let hit = contains_any(&row.medical_history_keywords, rule.keyword_terms)
                || contains_any(&row.package_name, rule.name_terms);
            if hit && seen.insert(i) {
                combined.push(i);
            }
        }
    }

    if gender == "female" && age >= 40 {
        for &i in &base {
            let row = &rows[i];
            let hit = contains_any(&row.tests_included, WOMENS_HEALTH_TESTS)
                || contains_any(&row.package_name, &["women"]);
            if hit && seen.insert(i) {
                combined.push(i);
            }
        }
    }

    if age >= 50 {
        for &i in &base {
            let row = &rows[i];
            let hit = contains_any(&row.tests_included, COLON_SCREENING_TESTS)
                || contains_any(&row.package_name, &["colon"]);
            if hit && seen.insert(i) {
                combined.push(i);
            }
        }
    }

    let pick: &CatalogRow = if let Some(&i) = combined.first() {
        &rows[i]
    } else if let Some(&i) = base
        .iter()
        .min_by(|&&a, &&b| rows[a].package_name.cmp(&rows[b].package_name))
    {
        &rows[i]
    } else {
        &rows[0]
    };

    Some(Recommendation {
        package_id: pick.package_id.clone(),
        package_name: pick.package_name.clone(),
        tests_included: pick.tests_included.clone(),
    })
}

fn contains_any(haystack: &str, terms: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    terms.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(
        id: &str,
        name: &str,
        tests: &str,
        age: u32,
        gender: &str,
        keywords: &str,
    ) -> CatalogRow {
        CatalogRow {
            package_id: id.to_string(),
            package_name: name.to_string(),
            tests_included: tests.to_string(),
            recommended_age: age,
            recommended_gender: gender.to_string(),
            medical_history_keywords: keywords.to_string(),
            hospital_name: "City Care".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
            time_slot: "10:00 AM".to_string(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_rows(vec![
            row("PKG1", "Full Body Checkup", "CBC; Lipid Profile", 0, "", ""),
            row(
                "PKG2",
                "Diabetes Care",
                "Blood Sugar; HbA1c",
                30,
                "",
                "diabetic screening",
            ),
            row(
                "PKG3",
                "Cardiac Screen",
                "ECG; Stress Test",
                40,
                "",
                "blood pressure",
            ),
            row(
                "PKG4",
                "Women's Wellness",
                "Mammogram; Pap Smear",
                40,
                "female",
                "",
            ),
            row(
                "PKG5",
                "Colon Screening",
                "Colonoscopy",
                50,
                "",
                "",
            ),
        ])
    }

    #[test]
    fn test_age_gate() {
        // PKG2 requires age >= 30; a 25-year-old with diabetes history must
        // not receive it.
        let rec = recommend(25, "male", "diabetes", &sample_catalog()).unwrap();
        assert_ne!(rec.package_id, "PKG2");
    }

    #[test]
    fn test_zero_age_matches_everyone() {
        let rec = recommend(18, "male", "", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG1");
    }

    #[test]
    fn test_diabetes_history_match() {
        let rec = recommend(45, "male", "history of diabetes", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG2");
    }

    #[test]
    fn test_hypertension_history_match() {
        let rec = recommend(45, "male", "hypertension", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG3");
    }

    #[test]
    fn test_condition_outranks_demographic() {
        // Female, 45, diabetic: both PKG2 (condition) and PKG4 (demographic)
        // match; the condition match wins.
        let rec = recommend(45, "female", "diabetes", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG2");
    }

    #[test]
    fn test_womens_health_over_40() {
        let rec = recommend(45, "female", "", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG4");
    }

    #[test]
    fn test_colon_screening_over_50() {
        let rec = recommend(55, "male", "", &sample_catalog()).unwrap();
        assert_eq!(rec.package_id, "PKG5");
    }

    #[test]
    fn test_gender_substring_match() {
        let catalog = Catalog::from_rows(vec![row(
            "PKG1",
            "Shared",
            "CBC",
            0,
            "male/female",
            "",
        )]);
        assert!(recommend(30, "Female", "", &catalog).is_some());
        assert!(recommend(30, "male", "", &catalog).is_some());
    }

    #[test]
    fn test_fallback_lexicographic() {
        let catalog = Catalog::from_rows(vec![
            row("PKG1", "Zeta Checkup", "CBC", 0, "", ""),
            row("PKG2", "Alpha Checkup", "CBC", 0, "", ""),
        ]);
        let rec = recommend(30, "male", "", &catalog).unwrap();
        assert_eq!(rec.package_name, "Alpha Checkup");
    }

    #[test]
    fn test_fallback_first_row_when_base_empty() {
        let catalog = Catalog::from_rows(vec![
            row("PKG1", "Senior Checkup", "CBC", 60, "", ""),
            row("PKG2", "Another Senior", "CBC", 65, "", ""),
        ]);
        // Age 30 fails every base filter; the first catalog row still wins.
        let rec = recommend(30, "male", "", &catalog).unwrap();
        assert_eq!(rec.package_id, "PKG1");
    }

    #[test]
    fn test_empty_catalog_not_found() {
        let catalog = Catalog::from_rows(vec![]);
        assert!(recommend(30, "male", "", &catalog).is_none());
    }
}
