//! Workbook round-trip for assessment survey answers.
//!
//! Export builds a two-sheet workbook: a `survey` sheet the user fills in
//! (question rows grouped under bold attribute section headers, with
//! in-cell dropdown validation on the Answer column) and a `choices` sheet
//! holding one row of choice labels per question key, referenced by the
//! dropdowns. The title row embeds the assessment id so a later import can
//! verify the file belongs to the requested assessment.
//!
//! Import validates structure first (file loads, id matches, sheets and
//! header rows exact), then scans data rows, collecting every unknown
//! question key and unparseable choice by cell address. Nothing fails
//! fast; the caller receives the full error map in one pass.
//!
//! The cell layout below is a compatibility surface: previously exported
//! files must keep importing, so sheet names, header content and the
//! title-row id cell may not change.

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{DataValidation, Format, FormatAlign, Formula, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::{
    IngestErrors, ASSESSMENT_ID_MISMATCH, INVALID_CHOICES, INVALID_FILE_LOAD, INVALID_HEADER,
    INVALID_HEADER_CELLS, INVALID_QUESTIONS, MISSING_SHEET,
};
use crate::error::ValidationErrors;
use crate::models::{validate_answer, Assessment, Attribute, SurveyQuestionLikert};
use crate::utils::strip_html;

pub const SHEET_SURVEY: &str = "survey";
pub const SHEET_CHOICES: &str = "choices";

const DOCUMENTATION_URL: &str =
    "https://elinor-user-files.s3.amazonaws.com/dev/Document/2/Elinor_assessment_tool_protocol_v2022.1.pdf";
const INTRO_TEXT: &str =
    "Please make sure you read our protocol before answering this survey:";

const TITLE_ROW: u32 = 0;
const INTRO_ROW: u32 = 1;
const HEADER_ROW: u32 = 3;

const SURVEY_HEADER: [&str; 7] = [
    "Survey Question",
    "key",
    "Answer",
    "Explanation",
    "Rationale",
    "Information",
    "Guidance",
];
const CHOICES_HEADER: [&str; 5] = ["key", "excellent_3", "good_2", "average_1", "poor_0"];

const COL_QUESTION: u16 = 0;
const COL_KEY: u16 = 1;
const COL_ANSWER: u16 = 2;
const COL_EXPLANATION: u16 = 3;
const COL_RATIONALE: u16 = 4;
const COL_INFORMATION: u16 = 5;
const COL_GUIDANCE: u16 = 6;

/// A parsed (or to-be-exported) answer keyed by question key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub choice: Option<i16>,
    pub explanation: String,
}

/// An answer cell that could not be read as a choice ordinal.
#[derive(Debug, Error)]
#[error("invalid choice")]
struct InvalidChoice;

/// Spreadsheet-style column letter for a 0-based column index.
pub fn column_letter(index: u16) -> String {
    let mut index = index as usize;
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters
}

fn cell_address(row: u32, col: u16) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

fn cell_string(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Read a user-entered answer cell: empty means no choice, a bare integer
/// is taken as the ordinal, and a `"<digit>: label"` string is parsed by
/// its prefix. Any other string is an invalid choice.
fn parse_choice(data: Option<&Data>) -> Result<Option<i16>, InvalidChoice> {
    match data {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Int(i)) => Ok(Some(*i as i16)),
        Some(Data::Float(f)) if f.fract() == 0.0 => Ok(Some(*f as i16)),
        Some(Data::String(s)) => {
            if s.trim().is_empty() {
                return Ok(None);
            }
            let prefix = s.split(':').next().unwrap_or("").trim();
            prefix.parse::<i16>().map(Some).map_err(|_| InvalidChoice)
        }
        Some(_) => Ok(None),
    }
}

/// One assessment's workbook state: generation input and import output.
pub struct AssessmentXlsx<'a> {
    assessment: &'a Assessment,
    attributes: &'a [Attribute],
    questions: &'a [SurveyQuestionLikert],
    answers: BTreeMap<String, CandidateAnswer>,
    pub errors: IngestErrors,
}

impl<'a> AssessmentXlsx<'a> {
    /// `attributes` and `questions` are the full catalog; the assessment's
    /// attribute selection is resolved against it. The caller is expected
    /// to have run required-attribute enforcement already.
    pub fn new(
        assessment: &'a Assessment,
        attributes: &'a [Attribute],
        questions: &'a [SurveyQuestionLikert],
    ) -> Self {
        Self {
            assessment,
            attributes,
            questions,
            answers: BTreeMap::new(),
            errors: IngestErrors::new(),
        }
    }

    /// Seed current answers before export.
    pub fn set_answers(&mut self, answers: impl IntoIterator<Item = (String, CandidateAnswer)>) {
        self.answers = answers.into_iter().collect();
    }

    /// Parsed candidate answers after a successful `load_from_file`.
    pub fn answers(&self) -> &BTreeMap<String, CandidateAnswer> {
        &self.answers
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn attribute_of(&self, question: &SurveyQuestionLikert) -> Option<&'a Attribute> {
        self.attributes.iter().find(|a| a.id == question.attribute_id)
    }

    /// All catalog questions in presentation order. Every question is
    /// listed on the choices sheet regardless of the assessment's
    /// selection, so users can answer questions that are not part of the
    /// assessment (they will not be scored).
    fn sorted_questions(&self) -> Vec<&'a SurveyQuestionLikert> {
        let mut questions: Vec<&SurveyQuestionLikert> = self.questions.iter().collect();
        questions.sort_by(|a, b| {
            let ka = self
                .attribute_of(a)
                .map(|attr| (attr.order, attr.name.as_str()))
                .unwrap_or((i16::MAX, ""));
            let kb = self
                .attribute_of(b)
                .map(|attr| (attr.order, attr.name.as_str()))
                .unwrap_or((i16::MAX, ""));
            (ka, a.number).cmp(&(kb, b.number))
        });
        questions
    }

    fn selected_attributes(&self) -> Vec<&'a Attribute> {
        let mut selected: Vec<&Attribute> = self
            .attributes
            .iter()
            .filter(|a| self.assessment.attributes.contains(&a.id))
            .collect();
        selected.sort_by_key(|a| (a.order, a.name.clone()));
        selected
    }

    /// Choice strings in choices-sheet column order (excellent first),
    /// formatted `"<digit>: <label>"` with HTML stripped from the label.
    fn choices_for(&self, question: &SurveyQuestionLikert) -> [String; 4] {
        [
            format!("3: {}", strip_html(&question.excellent_3)),
            format!("2: {}", strip_html(&question.good_2)),
            format!("1: {}", strip_html(&question.average_1)),
            format!("0: {}", strip_html(&question.poor_0)),
        ]
    }

    /// The display string for a stored choice, empty when the answer has no
    /// choice or the ordinal matches no label.
    fn choice_text(&self, question: &SurveyQuestionLikert, choice: Option<i16>) -> String {
        let Some(choice) = choice else {
            return String::new();
        };
        self.choices_for(question)
            .into_iter()
            .find(|c| {
                c.split(':')
                    .next()
                    .and_then(|p| p.trim().parse::<i16>().ok())
                    == Some(choice)
            })
            .unwrap_or_default()
    }

    fn question_by_key(&self, key: &str) -> Option<&'a SurveyQuestionLikert> {
        self.questions.iter().find(|q| q.key == key)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Build the workbook from current assessment/answer state.
    pub fn generate(&self) -> Result<Vec<u8>, XlsxError> {
        let bold = Format::new().set_bold();
        let bold14 = Format::new().set_bold().set_font_size(14);
        let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);
        let section = Format::new()
            .set_bold()
            .set_text_wrap()
            .set_align(FormatAlign::Top);
        let unlocked = Format::new().set_unlocked();

        let questions = self.sorted_questions();

        // choices sheet: one row per question key, columns = choice labels
        let mut ws_choices = Worksheet::new();
        ws_choices.set_name(SHEET_CHOICES)?;
        for (col, content) in CHOICES_HEADER.iter().enumerate() {
            ws_choices.write_string(0, col as u16, *content)?;
        }
        for (i, question) in questions.iter().enumerate() {
            let row = (i + 1) as u32;
            ws_choices.write_string(row, 0, &question.key)?;
            for (j, choice) in self.choices_for(question).iter().enumerate() {
                ws_choices.write_string(row, (j + 1) as u16, choice)?;
            }
        }
        ws_choices.protect();

        // survey sheet
        let mut ws = Worksheet::new();
        ws.set_name(SHEET_SURVEY)?;

        ws.write_string_with_format(TITLE_ROW, 0, &self.assessment.name, &bold14)?;
        ws.write_string(TITLE_ROW, 1, self.assessment.id.to_string())?;
        ws.write_string_with_format(INTRO_ROW, 0, INTRO_TEXT, &bold)?;
        ws.write_url(INTRO_ROW, 2, DOCUMENTATION_URL)?;

        for (col, content) in SURVEY_HEADER.iter().enumerate() {
            let col = col as u16;
            if col == COL_QUESTION {
                ws.write_string_with_format(HEADER_ROW, col, *content, &bold14)?;
            } else {
                ws.write_string(HEADER_ROW, col, *content)?;
            }
        }
        ws.set_column_width(COL_QUESTION, 80)?;
        ws.set_column_hidden(COL_KEY)?;
        ws.set_column_width(COL_ANSWER, 40)?;
        ws.set_column_width(COL_EXPLANATION, 40)?;
        ws.set_column_width(COL_RATIONALE, 20)?;
        ws.set_column_width(COL_INFORMATION, 20)?;
        ws.set_column_width(COL_GUIDANCE, 20)?;

        let mut row = HEADER_ROW + 1;
        for attribute in self.selected_attributes() {
            ws.write_string_with_format(row, 0, attribute.name.to_uppercase(), &section)?;
            row += 1;

            for (qi, question) in questions.iter().enumerate() {
                if question.attribute_id != attribute.id {
                    continue;
                }
                // 1-based row of this question on the choices sheet
                let choices_row = qi + 2;
                let validation = DataValidation::new()
                    .allow_list_formula(Formula::new(format!(
                        "{SHEET_CHOICES}!$B${choices_row}:$E${choices_row}"
                    )))
                    .set_error_title("invalid choice")?
                    .set_error_message("Please select a choice from the list")?;

                let answer = self.answers.get(&question.key);
                let choice_text =
                    self.choice_text(question, answer.and_then(|a| a.choice));
                let explanation = answer.map(|a| a.explanation.clone()).unwrap_or_default();

                ws.set_row_height(row, 32)?;
                ws.write_string_with_format(
                    row,
                    COL_QUESTION,
                    format!("{}. {}", question.number, question.text),
                    &wrapped,
                )?;
                ws.write_string(row, COL_KEY, &question.key)?;
                if !choice_text.is_empty() {
                    ws.write_string_with_format(row, COL_ANSWER, choice_text, &unlocked)?;
                }
                if !explanation.is_empty() {
                    ws.write_string_with_format(row, COL_EXPLANATION, explanation, &unlocked)?;
                }
                ws.write_string(row, COL_RATIONALE, strip_html(&question.rationale))?;
                ws.write_string(row, COL_INFORMATION, strip_html(&question.information))?;
                ws.write_string(row, COL_GUIDANCE, strip_html(&question.guidance))?;
                ws.add_data_validation(row, COL_ANSWER, row, COL_ANSWER, &validation)?;
                row += 1;
            }
        }

        // Locked except the Answer and Explanation columns.
        ws.set_column_format(COL_ANSWER, &unlocked)?;
        ws.set_column_format(COL_EXPLANATION, &unlocked)?;
        ws.protect();

        let mut workbook = Workbook::new();
        workbook.push_worksheet(ws);
        workbook.push_worksheet(ws_choices);
        workbook.save_to_buffer()
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Parse an uploaded workbook into candidate answers, accumulating
    /// every structural and row-level problem into `self.errors`.
    pub fn load_from_file(&mut self, bytes: &[u8]) {
        self.errors = IngestErrors::new();
        self.answers = BTreeMap::new();

        let mut workbook: Xlsx<_> = match Xlsx::new(Cursor::new(bytes.to_vec())) {
            Ok(workbook) => workbook,
            Err(_) => {
                self.errors.add(INVALID_FILE_LOAD, "invalid xlsx file", None);
                return;
            }
        };

        let survey = self.sheet_range(&mut workbook, SHEET_SURVEY);
        let choices = self.sheet_range(&mut workbook, SHEET_CHOICES);

        if let Some(range) = &survey {
            self.check_assessment_id(range);
            self.check_header(range, SHEET_SURVEY, HEADER_ROW, &SURVEY_HEADER);
        }
        if let Some(range) = &choices {
            self.check_header(range, SHEET_CHOICES, 0, &CHOICES_HEADER);
        }
        if self.has_errors() {
            return;
        }
        let Some(survey) = survey else { return };

        let last_row = survey.end().map(|(r, _)| r).unwrap_or(0);
        let mut question_error_cells = Vec::new();
        let mut choice_error_cells = Vec::new();

        for row in (HEADER_ROW + 1)..=last_row {
            let key = survey
                .get_value((row, u32::from(COL_KEY)))
                .map(cell_string)
                .unwrap_or_default();
            if key.is_empty() {
                // attribute section rows have no key
                continue;
            }
            if self.question_by_key(&key).is_none() {
                question_error_cells.push(cell_address(row, COL_KEY));
                continue;
            }

            match parse_choice(survey.get_value((row, u32::from(COL_ANSWER)))) {
                Ok(choice) => {
                    let explanation = survey
                        .get_value((row, u32::from(COL_EXPLANATION)))
                        .map(cell_string)
                        .unwrap_or_default();
                    self.answers.insert(key, CandidateAnswer { choice, explanation });
                }
                Err(InvalidChoice) => {
                    choice_error_cells.push(cell_address(row, COL_ANSWER));
                }
            }
        }

        if !question_error_cells.is_empty() {
            self.errors.add(
                INVALID_QUESTIONS,
                format!(
                    "invalid question keys in cells: {}",
                    question_error_cells.join(",")
                ),
                Some(json!({ "question_error_cells": question_error_cells })),
            );
        }
        if !choice_error_cells.is_empty() {
            self.errors.add(
                INVALID_CHOICES,
                format!("invalid choices in cells: {}", choice_error_cells.join(",")),
                Some(json!({ "choice_error_cells": choice_error_cells })),
            );
        }
    }

    /// Field validation for every parsed candidate, keyed by question key.
    /// Used by the submit path: any entry here aborts the whole batch.
    pub fn validate_candidates(&self) -> Vec<(String, ValidationErrors)> {
        self.answers
            .iter()
            .filter_map(|(key, candidate)| {
                validate_answer(candidate.choice)
                    .err()
                    .map(|errors| (key.clone(), errors))
            })
            .collect()
    }

    fn sheet_range(
        &mut self,
        workbook: &mut Xlsx<Cursor<Vec<u8>>>,
        name: &str,
    ) -> Option<calamine::Range<Data>> {
        match workbook.worksheet_range(name) {
            Ok(range) => Some(range),
            Err(_) => {
                self.errors.add(
                    MISSING_SHEET,
                    format!("missing sheet with name '{name}'"),
                    Some(json!({ "sheetname": name })),
                );
                None
            }
        }
    }

    fn check_assessment_id(&mut self, survey: &calamine::Range<Data>) {
        let cell = cell_address(TITLE_ROW, 1);
        let user_id = survey
            .get_value((TITLE_ROW, 1))
            .map(cell_string)
            .unwrap_or_default();
        if user_id.parse::<Uuid>().ok() != Some(self.assessment.id) {
            self.errors.add(
                ASSESSMENT_ID_MISMATCH,
                format!(
                    "assessment id {user_id} in {cell} does not match requested assessment {}",
                    self.assessment.id
                ),
                Some(json!({
                    "user_assessment_id": user_id,
                    "cell": cell,
                    "assessment_id": self.assessment.id,
                })),
            );
        }
    }

    /// Compare a sheet's header row to the expected content, cell for cell,
    /// recording the address of every mismatching cell.
    fn check_header(
        &mut self,
        range: &calamine::Range<Data>,
        sheetname: &str,
        header_row: u32,
        expected: &[&str],
    ) {
        let present = (0..expected.len())
            .any(|col| range.get_value((header_row, col as u32)).is_some());
        if !present {
            self.errors.add(
                INVALID_HEADER,
                format!("no header found for sheet {sheetname}"),
                Some(json!({ "sheetname": sheetname })),
            );
            return;
        }

        let width = range.end().map(|(_, c)| c as usize + 1).unwrap_or(0);
        let mut header_error_cells = Vec::new();
        for col in 0..expected.len().max(width) {
            let content = range
                .get_value((header_row, col as u32))
                .map(cell_string)
                .unwrap_or_default();
            let expected_content = expected.get(col).copied().unwrap_or("");
            if content != expected_content {
                header_error_cells.push(cell_address(header_row, col as u16));
            }
        }
        if !header_error_cells.is_empty() {
            self.errors.add(
                INVALID_HEADER_CELLS,
                format!(
                    "invalid headers in cells: {}",
                    header_error_cells.join(",")
                ),
                Some(json!({ "header_error_cells": header_error_cells })),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(2), "C");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
    }

    #[test]
    fn choice_parsing() {
        assert_eq!(parse_choice(None).unwrap(), None);
        assert_eq!(parse_choice(Some(&Data::Empty)).unwrap(), None);
        assert_eq!(parse_choice(Some(&Data::Int(2))).unwrap(), Some(2));
        assert_eq!(parse_choice(Some(&Data::Float(3.0))).unwrap(), Some(3));
        assert_eq!(
            parse_choice(Some(&Data::String("1: average".to_string()))).unwrap(),
            Some(1)
        );
        assert!(parse_choice(Some(&Data::String("average".to_string()))).is_err());
        // a blank string cell is an unselected dropdown, not an error
        assert_eq!(parse_choice(Some(&Data::String(String::new()))).unwrap(), None);
        // non-integral numbers fall through as "no choice"
        assert_eq!(parse_choice(Some(&Data::Float(1.5))).unwrap(), None);
    }
}
