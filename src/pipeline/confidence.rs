//! Completeness-based confidence scoring.
//!
//! The score measures how much of the contract the model managed to fill in,
//! not how sure the model was. Five scalar fields count 1.0 each; the first
//! two parties count 0.5 each as a bonus.

use crate::db::repository::ExtractedFieldsUpdate;

/// Contracts scoring below this are flagged for human review.
pub const REVIEW_THRESHOLD: f32 = 0.8;

const SCALAR_FIELD_COUNT: f32 = 5.0;
const BASE_SCORE: f32 = 0.1;
const PARTY_BONUS: f32 = 0.5;
const MAX_BONUS_PARTIES: usize = 2;

/// Score in [0.1, 1.0], rounded to two decimals. A fully populated contract
/// with both parties overshoots 1.0 before the clamp.
pub fn completeness_score(update: &ExtractedFieldsUpdate, party_count: usize) -> f32 {
    let mut found = 0.0_f32;
    if update.total_amount.is_some() {
        found += 1.0;
    }
    if update
        .subject_matter
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
    {
        found += 1.0;
    }
    if update.sign_date.is_some() {
        found += 1.0;
    }
    if update.effective_date.is_some() {
        found += 1.0;
    }
    if update.expire_date.is_some() {
        found += 1.0;
    }
    found += party_count.min(MAX_BONUS_PARTIES) as f32 * PARTY_BONUS;

    let score = BASE_SCORE + (1.0 - BASE_SCORE) * (found / SCALAR_FIELD_COUNT);
    (score.clamp(BASE_SCORE, 1.0) * 100.0).round() / 100.0
}

pub fn requires_review(score: f32) -> bool {
    score < REVIEW_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn nothing_found_scores_floor() {
        let update = ExtractedFieldsUpdate::default();
        let score = completeness_score(&update, 0);
        assert_eq!(score, 0.10);
        assert!(requires_review(score));
    }

    #[test]
    fn everything_found_clamps_to_one() {
        let update = ExtractedFieldsUpdate {
            total_amount: Some(150000.0),
            subject_matter: Some("Industrial pumps".into()),
            sign_date: Some(date(2026, 1, 10)),
            effective_date: Some(date(2026, 2, 1)),
            expire_date: Some(date(2027, 2, 1)),
            ..Default::default()
        };
        let score = completeness_score(&update, 2);
        assert_eq!(score, 1.00);
        assert!(!requires_review(score));
    }

    #[test]
    fn three_fields_no_parties_needs_review() {
        let update = ExtractedFieldsUpdate {
            total_amount: Some(99000.0),
            subject_matter: Some("Office lease".into()),
            sign_date: Some(date(2026, 3, 5)),
            ..Default::default()
        };
        let score = completeness_score(&update, 0);
        assert_eq!(score, 0.64);
        assert!(requires_review(score));
    }

    #[test]
    fn party_bonus_caps_at_two() {
        let update = ExtractedFieldsUpdate::default();
        assert_eq!(
            completeness_score(&update, 2),
            completeness_score(&update, 5)
        );
    }

    #[test]
    fn blank_subject_matter_does_not_count() {
        let update = ExtractedFieldsUpdate {
            subject_matter: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(completeness_score(&update, 0), 0.10);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!requires_review(0.80));
        assert!(requires_review(0.79));
    }
}
