#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordIntent {
    Recurring,
    Schedule,
    ListPackages,
    Confirm,
    Decline,
}

/// Ordered rule table; earlier rows win. `Confirm` sits above `Decline`, so
/// a message containing both "yes" and "no" resolves to a confirmation.
const RULES: &[(KeywordIntent, &[&str])] = &[
    (KeywordIntent::Recurring, &["follow-up", "recurring"]),
    (KeywordIntent::Schedule, &["schedule"]),
    (KeywordIntent::ListPackages, &["packages", "list"]),
    (KeywordIntent::Confirm, &["yes"]),
    (KeywordIntent::Decline, &["no"]),
];

/// Resolve a message to a single tagged intent. Matching is case-insensitive
/// substring search; only intents in `candidates` are considered, so each
/// dialogue state limits itself to the triggers it understands.
pub fn classify(message: &str, candidates: &[KeywordIntent]) -> Option<KeywordIntent> {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .filter(|(intent, _)| candidates.contains(intent))
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(intent, _)| *intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_detected() {
        let intent = classify(
            "I want to schedule a checkup",
            &[KeywordIntent::Schedule, KeywordIntent::ListPackages],
        );
        assert_eq!(intent, Some(KeywordIntent::Schedule));
    }

    #[test]
    fn test_case_insensitive() {
        let intent = classify("SCHEDULE please", &[KeywordIntent::Schedule]);
        assert_eq!(intent, Some(KeywordIntent::Schedule));
    }

    #[test]
    fn test_yes_outranks_no() {
        let intent = classify(
            "yes... well, no, actually yes",
            &[KeywordIntent::Confirm, KeywordIntent::Decline],
        );
        assert_eq!(intent, Some(KeywordIntent::Confirm));
    }

    #[test]
    fn test_candidates_limit_matches() {
        // "list" is present but the confirm state does not understand it
        let intent = classify(
            "the list looks fine",
            &[KeywordIntent::Confirm, KeywordIntent::Decline],
        );
        assert_eq!(intent, None);
    }

    #[test]
    fn test_recurring_keywords() {
        let intent = classify(
            "book a follow-up in 6 months",
            &[KeywordIntent::Recurring],
        );
        assert_eq!(intent, Some(KeywordIntent::Recurring));
        let intent = classify("make it recurring", &[KeywordIntent::Recurring]);
        assert_eq!(intent, Some(KeywordIntent::Recurring));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(classify("hello there", &[KeywordIntent::Schedule]), None);
    }
}
