//! Scoring engine properties: null handling, normalization, and order
//! independence.

use elinor::scoring::{score_answers, ScoredAnswerRow};

fn row(
    attr: &str,
    order: i16,
    number: i16,
    key: &str,
    choice: Option<i16>,
) -> ScoredAnswerRow {
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
fn attribute_with_only_null_answers_scores_none_not_zero() {
    let rows = vec![
        row("Governance", 1, 1, "gov_1", None),
        row("Governance", 1, 2, "gov_2", None),
    ];
    let result = score_answers(&rows);
    assert_eq!(result.attributes.len(), 1);
    assert_eq!(result.attributes[0].score, None);
    // the answers themselves are still reported
    assert_eq!(result.attributes[0].answers.len(), 2);
}

#[test]
fn overall_is_none_when_no_attribute_has_a_score() {
    let rows = vec![
        row("Governance", 1, 1, "gov_1", None),
        row("Rights", 2, 1, "rights_1", None),
    ];
    let result = score_answers(&rows);
    assert_eq!(result.score, None);
}

#[test]
fn null_choices_are_excluded_from_the_attribute_average() {
    // (3 + 2) / (2 * 3) * 10 = 8.333 -> 8.3; the null answer is ignored.
    let rows = vec![
        row("Governance", 1, 1, "gov_1", Some(3)),
        row("Governance", 1, 2, "gov_2", Some(2)),
        row("Governance", 1, 3, "gov_3", None),
    ];
    let result = score_answers(&rows);
    assert_eq!(result.attributes[0].score, Some(8.3));
    assert_eq!(result.score, Some(83));
}

#[test]
fn null_scored_attributes_are_excluded_from_the_overall() {
    let rows = vec![
        row("Governance", 1, 1, "gov_1", Some(2)),
        row("Rights", 2, 1, "rights_1", None),
    ];
    let result = score_answers(&rows);
    assert_eq!(result.attributes.len(), 2);
    assert_eq!(result.attributes[0].score, Some(6.7));
    assert_eq!(result.attributes[1].score, None);
    // 6.7 / 10 * 100 = 67: only Governance counts
    assert_eq!(result.score, Some(67));
}

#[test]
fn result_is_independent_of_insertion_order() {
    let ordered = vec![
        row("Governance", 1, 1, "gov_1", Some(3)),
        row("Governance", 1, 2, "gov_2", Some(0)),
        row("Rights", 2, 1, "rights_1", Some(2)),
    ];
    let mut shuffled = ordered.clone();
    shuffled.reverse();

    assert_eq!(score_answers(&ordered), score_answers(&shuffled));
}

#[test]
fn attributes_are_reported_in_presentation_order() {
    let rows = vec![
        row("Rights", 2, 1, "rights_1", Some(1)),
        row("Governance", 1, 1, "gov_1", Some(1)),
    ];
    let result = score_answers(&rows);
    let names: Vec<&str> = result
        .attributes
        .iter()
        .map(|a| a.attribute.as_str())
        .collect();
    assert_eq!(names, vec!["Governance", "Rights"]);
}

#[test]
fn same_named_attributes_merge_into_one_group() {
    // Grouping is by display name; two attributes sharing a name fold into
    // a single scored group.
    let rows = vec![
        row("Governance", 1, 1, "gov_1", Some(3)),
        row("Governance", 5, 1, "other_1", Some(1)),
    ];
    let result = score_answers(&rows);
    assert_eq!(result.attributes.len(), 1);
    // (3 + 1) / (2 * 3) * 10 = 6.666 -> 6.7
    assert_eq!(result.attributes[0].score, Some(6.7));
}
