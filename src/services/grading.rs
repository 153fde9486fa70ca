//! Per-blank answer checking for multi-part exercises.
//!
//! Answers are compared after trimming and lowercasing. There is no numeric
//! tolerance or unit conversion.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum GradingError {
    #[error("answer index {index} is out of range; exercise has {total} answers")]
    IndexOutOfRange { index: usize, total: usize },
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("answer must not be empty")]
    EmptyAnswer,
}

pub(crate) fn normalize_answer(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn answers_match(submitted: &str, expected: &str) -> bool {
    normalize_answer(submitted) == normalize_answer(expected)
}

/// Grades one historical attempt; blanks removed from the key are incorrect.
pub(crate) fn attempt_is_correct(correct: &[String], index: i32, answer: &str) -> bool {
    usize::try_from(index)
        .ok()
        .and_then(|index| correct.get(index))
        .is_some_and(|expected| answers_match(answer, expected))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PartialGrade {
    pub(crate) index: usize,
    pub(crate) is_correct: bool,
    pub(crate) correct_count: usize,
    pub(crate) total: usize,
    pub(crate) completed: bool,
}

/// Latest answer per blank for one student and one exercise.
#[derive(Debug)]
pub(crate) struct AnswerSheet<'a> {
    correct: &'a [String],
    answers: Vec<Option<String>>,
}

impl<'a> AnswerSheet<'a> {
    /// Aligns previously stored answers with the current number of blanks.
    pub(crate) fn new(correct: &'a [String], previous: &[Option<String>]) -> Self {
        let mut answers: Vec<Option<String>> =
            previous.iter().take(correct.len()).cloned().collect();
        answers.resize(correct.len(), None);
        Self { correct, answers }
    }

    pub(crate) fn total(&self) -> usize {
        self.correct.len()
    }

    pub(crate) fn is_correct_at(&self, index: usize) -> bool {
        match (self.answers.get(index), self.correct.get(index)) {
            (Some(Some(answer)), Some(expected)) => answers_match(answer, expected),
            _ => false,
        }
    }

    pub(crate) fn correct_count(&self) -> usize {
        (0..self.total()).filter(|index| self.is_correct_at(*index)).count()
    }

    /// True iff every blank's latest answer is correct.
    pub(crate) fn is_complete(&self) -> bool {
        self.total() > 0 && self.correct_count() == self.total()
    }

    pub(crate) fn record(&mut self, index: usize, answer: &str) -> Result<PartialGrade, GradingError> {
        let total = self.total();
        if index >= total {
            return Err(GradingError::IndexOutOfRange { index, total });
        }
        if answer.trim().is_empty() {
            return Err(GradingError::EmptyAnswer);
        }

        self.answers[index] = Some(answer.to_string());

        Ok(PartialGrade {
            index,
            is_correct: self.is_correct_at(index),
            correct_count: self.correct_count(),
            total,
            completed: self.is_complete(),
        })
    }

    /// Replaces the whole sheet. Blank or missing entries stay unanswered.
    pub(crate) fn replace_all(&mut self, answers: &[Option<String>]) -> Result<(), GradingError> {
        if answers.len() != self.total() {
            return Err(GradingError::AnswerCountMismatch {
                expected: self.total(),
                actual: answers.len(),
            });
        }

        self.answers = answers
            .iter()
            .map(|answer| answer.as_ref().filter(|value| !value.trim().is_empty()).cloned())
            .collect();
        Ok(())
    }

    pub(crate) fn into_answers(self) -> Vec<Option<String>> {
        self.answers
    }
}

/// Grades a full submission at once.
pub(crate) fn grade_all(
    answers: &[Option<String>],
    correct: &[String],
) -> Result<(Vec<Option<String>>, usize, bool), GradingError> {
    let mut sheet = AnswerSheet::new(correct, &[]);
    sheet.replace_all(answers)?;
    let correct_count = sheet.correct_count();
    let completed = sheet.is_complete();
    Ok((sheet.into_answers(), correct_count, completed))
}

/// Overlays a whole-sheet submission on previously stored answers. Entries that
/// are `None` or blank keep the earlier answer for that index.
pub(crate) fn merge_submission(
    previous: &[Option<String>],
    submitted: &[Option<String>],
    total: usize,
) -> Result<Vec<Option<String>>, GradingError> {
    if submitted.len() != total {
        return Err(GradingError::AnswerCountMismatch { expected: total, actual: submitted.len() });
    }

    Ok(submitted
        .iter()
        .enumerate()
        .map(|(index, answer)| match answer.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            _ => previous.get(index).cloned().flatten(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correct() -> Vec<String> {
        vec!["9.8".to_string(), "Joule".to_string(), "ohm".to_string()]
    }

    #[test]
    fn attempts_are_graded_against_current_key() {
        let key = correct();
        assert!(attempt_is_correct(&key, 1, " joule "));
        assert!(!attempt_is_correct(&key, 0, "9.81"));
        assert!(!attempt_is_correct(&key, 3, "ohm"));
        assert!(!attempt_is_correct(&key, -1, "9.8"));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_answer("  Newton \n"), "newton");
        assert!(answers_match(" JOULE", "joule "));
        assert!(!answers_match("9.80", "9.8"));
    }

    #[test]
    fn recording_answers_tracks_count_and_completion() {
        let correct = correct();
        let mut sheet = AnswerSheet::new(&correct, &[]);

        let first = sheet.record(0, " 9.8 ").unwrap();
        assert_eq!(
            first,
            PartialGrade { index: 0, is_correct: true, correct_count: 1, total: 3, completed: false }
        );

        let wrong = sheet.record(1, "watt").unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.correct_count, 1);

        sheet.record(1, "joule").unwrap();
        let last = sheet.record(2, "OHM").unwrap();
        assert!(last.completed);
        assert_eq!(last.correct_count, 3);
    }

    #[test]
    fn completion_follows_latest_submission_per_index() {
        let correct = correct();
        let mut sheet = AnswerSheet::new(&correct, &[]);
        sheet.record(0, "9.8").unwrap();
        sheet.record(1, "joule").unwrap();
        sheet.record(2, "ohm").unwrap();
        assert!(sheet.is_complete());

        let regressed = sheet.record(0, "10").unwrap();
        assert!(!regressed.is_correct);
        assert!(!regressed.completed);
        assert_eq!(regressed.correct_count, 2);
    }

    #[test]
    fn previous_answers_are_aligned_to_current_blank_count() {
        let correct = vec!["a".to_string(), "b".to_string()];
        let previous = vec![Some("a".to_string()), None, Some("stale".to_string())];
        let sheet = AnswerSheet::new(&correct, &previous);

        assert_eq!(sheet.correct_count(), 1);
        assert_eq!(sheet.into_answers(), vec![Some("a".to_string()), None]);

        let short = AnswerSheet::new(&correct, &[Some("a".to_string())]);
        assert_eq!(short.into_answers().len(), 2);
    }

    #[test]
    fn rejects_out_of_range_and_empty_answers() {
        let correct = correct();
        let mut sheet = AnswerSheet::new(&correct, &[]);

        assert_eq!(
            sheet.record(3, "x"),
            Err(GradingError::IndexOutOfRange { index: 3, total: 3 })
        );
        assert_eq!(sheet.record(0, "   "), Err(GradingError::EmptyAnswer));
        assert_eq!(sheet.correct_count(), 0);
    }

    #[test]
    fn replace_all_requires_matching_length_and_drops_blanks() {
        let correct = correct();
        let mut sheet = AnswerSheet::new(&correct, &[]);

        assert_eq!(
            sheet.replace_all(&[Some("9.8".to_string())]),
            Err(GradingError::AnswerCountMismatch { expected: 3, actual: 1 })
        );

        sheet
            .replace_all(&[Some("9.8".to_string()), Some(" ".to_string()), Some("ohm".to_string())])
            .unwrap();
        assert_eq!(sheet.correct_count(), 2);
        assert!(!sheet.is_complete());
        assert_eq!(sheet.into_answers()[1], None);
    }

    #[test]
    fn grade_all_reports_count_and_completion() {
        let correct = correct();
        let answers = vec![Some("9.8".to_string()), Some("JOULE".to_string()), Some("ohm ".to_string())];

        let (stored, count, completed) = grade_all(&answers, &correct).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(count, 3);
        assert!(completed);

        let partial = vec![Some("9.8".to_string()), None, Some("volt".to_string())];
        let (_, count, completed) = grade_all(&partial, &correct).unwrap();
        assert_eq!(count, 1);
        assert!(!completed);
    }

    #[test]
    fn exercise_without_blanks_is_never_complete() {
        let correct: Vec<String> = Vec::new();
        let sheet = AnswerSheet::new(&correct, &[]);
        assert!(!sheet.is_complete());
    }

    #[test]
    fn merged_submission_keeps_earlier_answers_for_blank_entries() {
        let previous = vec![Some("9.8".to_string()), Some("watt".to_string()), None];
        let submitted = vec![None, Some(" Joule ".to_string()), Some("  ".to_string())];

        let merged = merge_submission(&previous, &submitted, 3).unwrap();
        assert_eq!(merged, vec![Some("9.8".to_string()), Some("Joule".to_string()), None]);

        let (_, correct_count, completed) = grade_all(&merged, &correct()).unwrap();
        assert_eq!(correct_count, 2);
        assert!(!completed);

        assert_eq!(
            merge_submission(&previous, &submitted[..2], 3),
            Err(GradingError::AnswerCountMismatch { expected: 3, actual: 2 })
        );
    }
}
