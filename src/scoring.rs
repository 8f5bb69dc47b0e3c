//! Scoring engine: folds one assessment's Likert answers into normalized
//! per-attribute scores and a single overall score.
//!
//! Pure functions over pre-joined answer rows; the persistence layer only
//! supplies the rows (see `database::SurveyRepository::scored_rows`).

use serde::{Deserialize, Serialize};

use crate::models::EXCELLENT;

/// Normalizes each attribute score onto a 0.0–10.0 scale regardless of how
/// many questions the attribute has.
pub const ATTRIBUTE_NORMALIZER: f64 = 10.0;

/// One answer joined to its question and the question's attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ScoredAnswerRow {
    pub attribute_order: i16,
    pub attribute_name: String,
    pub question_number: i16,
    pub question_key: String,
    pub choice: Option<i16>,
    pub explanation: String,
}

/// Per-question detail carried through to report consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question: String,
    pub choice: Option<i16>,
    pub explanation: String,
}

/// One attribute's normalized score with the answers that produced it.
/// `score` is `None` when the attribute has no non-null answers — an
/// "insufficient data" signal, never 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeScore {
    pub attribute: String,
    pub score: Option<f64>,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentScore {
    pub attributes: Vec<AttributeScore>,
    /// 0–100 integer across all non-null-scored attributes; `None` when no
    /// attribute has a score.
    pub score: Option<i64>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fold answer rows into attribute scores and an overall score.
///
/// Rows are re-sorted by `(attribute order, attribute name, question
/// number)` before grouping, so the result is independent of insertion
/// order; the output ordering is a presentation contract relied on by the
/// workbook and report layers.
///
/// Grouping is by attribute display name: two attributes sharing a name
/// would merge into one scored group. That mirrors long-standing report
/// output and stays until a product decision says otherwise.
pub fn score_answers(rows: &[ScoredAnswerRow]) -> AssessmentScore {
    let mut sorted: Vec<&ScoredAnswerRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        (a.attribute_order, &a.attribute_name, a.question_number).cmp(&(
            b.attribute_order,
            &b.attribute_name,
            b.question_number,
        ))
    });

    let mut groups: Vec<(String, Vec<AnswerDetail>)> = Vec::new();
    for row in sorted {
        let detail = AnswerDetail {
            question: row.question_key.clone(),
            choice: row.choice,
            explanation: row.explanation.clone(),
        };
        match groups.iter_mut().find(|(name, _)| *name == row.attribute_name) {
            Some((_, answers)) => answers.push(detail),
            None => groups.push((row.attribute_name.clone(), vec![detail])),
        }
    }

    let attributes: Vec<AttributeScore> = groups
        .into_iter()
        .map(|(attribute, answers)| {
            let score = attribute_score(&answers);
            AttributeScore {
                attribute,
                score,
                answers,
            }
        })
        .collect();

    let score = overall_score(&attributes);
    AssessmentScore { attributes, score }
}

/// Normalized 0.0–10.0 score for one attribute's answers, `None` when every
/// choice is null.
fn attribute_score(answers: &[AnswerDetail]) -> Option<f64> {
    let choices: Vec<i16> = answers.iter().filter_map(|a| a.choice).collect();
    if choices.is_empty() {
        return None;
    }
    let total_points = (choices.len() as f64) * f64::from(EXCELLENT);
    let points: f64 = choices.iter().map(|c| f64::from(*c)).sum();
    Some(round1(points / total_points * ATTRIBUTE_NORMALIZER))
}

/// 0–100 integer across non-null attribute scores, `None` when none remain.
fn overall_score(attributes: &[AttributeScore]) -> Option<i64> {
    let scores: Vec<f64> = attributes.iter().filter_map(|a| a.score).collect();
    if scores.is_empty() {
        return None;
    }
    let total = (scores.len() as f64) * ATTRIBUTE_NORMALIZER;
    let ratio = scores.iter().sum::<f64>() / total;
    Some((ratio * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(attr: &str, order: i16, number: i16, key: &str, choice: Option<i16>) -> ScoredAnswerRow {
        ScoredAnswerRow {
            attribute_order: order,
            attribute_name: attr.to_string(),
            question_number: number,
            question_key: key.to_string(),
            choice,
            explanation: String::new(),
        }
    }

    #[test]
    fn all_excellent_scores_ten() {
        let rows = vec![
            row("Governance", 1, 1, "gov_1", Some(3)),
            row("Governance", 1, 2, "gov_2", Some(3)),
        ];
        let result = score_answers(&rows);
        assert_eq!(result.attributes[0].score, Some(10.0));
        assert_eq!(result.score, Some(100));
    }

    #[test]
    fn normalization_is_independent_of_question_count() {
        // One question at "good" scores the same as three questions at "good".
        let one = score_answers(&[row("Rights", 1, 1, "r_1", Some(2))]);
        let three = score_answers(&[
            row("Rights", 1, 1, "r_1", Some(2)),
            row("Rights", 1, 2, "r_2", Some(2)),
            row("Rights", 1, 3, "r_3", Some(2)),
        ]);
        assert_eq!(one.attributes[0].score, Some(6.7));
        assert_eq!(one.attributes[0].score, three.attributes[0].score);
    }
}
