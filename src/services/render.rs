//! Structured reply tables and their HTML rendering. State logic builds
//! `Table` values; only the renderer knows about markup, so the presentation
//! format can be swapped without touching the state machine.

use crate::models::AlternativeSlot;
use crate::services::catalog::Catalog;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn to_html(&self, caption: &str) -> String {
        let mut html = String::new();
        html.push_str(&format!("<h4>{}</h4>", escape(caption)));
        html.push_str("<table class='table table-bordered table-hover'><thead><tr>");
        for header in &self.headers {
            html.push_str(&format!("<th>{}</th>", escape(header)));
        }
        html.push_str("</tr></thead><tbody>");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape(cell)));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }
}

/// Distinct (package name, tests included) pairs, catalog order.
pub fn package_listing(catalog: &Catalog) -> Table {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in catalog.rows() {
        let entry = vec![row.package_name.clone(), row.tests_included.clone()];
        if !rows.contains(&entry) {
            rows.push(entry);
        }
    }
    Table {
        headers: vec!["Package".to_string(), "Tests Included".to_string()],
        rows,
    }
}

/// Numbered offer table shown when no exact-date slot exists.
pub fn alternatives_table(alternatives: &[AlternativeSlot]) -> Table {
    let rows = alternatives
        .iter()
        .enumerate()
        .map(|(i, alt)| {
            vec![
                (i + 1).to_string(),
                alt.hospital_name.clone(),
                alt.appointment_date.clone(),
                format!("{} IST", alt.time_slot),
            ]
        })
        .collect();
    Table {
        headers: vec![
            "#".to_string(),
            "Hospital".to_string(),
            "Date".to_string(),
            "Time Slot".to_string(),
        ],
        rows,
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogRow;
    use chrono::NaiveDate;

    fn row(name: &str, tests: &str, hospital: &str, date: &str) -> CatalogRow {
        CatalogRow {
            package_id: "PKG1".to_string(),
            package_name: name.to_string(),
            tests_included: tests.to_string(),
            recommended_age: 0,
            recommended_gender: String::new(),
            medical_history_keywords: String::new(),
            hospital_name: hospital.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: "10:00 AM".to_string(),
        }
    }

    #[test]
    fn test_package_listing_dedupes() {
        let catalog = Catalog::from_rows(vec![
            row("Full Body", "CBC", "City Care", "2025-08-10"),
            row("Full Body", "CBC", "Metro Health", "2025-08-12"),
            row("Cardiac", "ECG", "City Care", "2025-08-10"),
        ]);
        let table = package_listing(&catalog);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Full Body", "CBC"]);
    }

    #[test]
    fn test_alternatives_numbered_from_one() {
        let alts = vec![
            AlternativeSlot {
                hospital_name: "City Care".to_string(),
                appointment_date: "2025-08-20".to_string(),
                time_slot: "10:00 AM".to_string(),
                package_id: "PKG1".to_string(),
                package_name: "Full Body".to_string(),
            },
            AlternativeSlot {
                hospital_name: "Metro Health".to_string(),
                appointment_date: "2025-08-21".to_string(),
                time_slot: "02:00 PM".to_string(),
                package_id: "PKG1".to_string(),
                package_name: "Full Body".to_string(),
            },
        ];
        let table = alternatives_table(&alts);
        assert_eq!(table.rows[0][0], "1");
        assert_eq!(table.rows[1][0], "2");
        assert_eq!(table.rows[1][3], "02:00 PM IST");
    }

    #[test]
    fn test_html_escapes_cells() {
        let table = Table {
            headers: vec!["H".to_string()],
            rows: vec![vec!["<b>&".to_string()]],
        };
        let html = table.to_html("Caption");
        assert!(html.contains("&lt;b&gt;&amp;"));
        assert!(html.contains("<h4>Caption</h4>"));
    }
}
