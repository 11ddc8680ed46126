//! Input validation errors.

/// Rejection of a raw answer at the aggregation boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("Answer {value} to question {question} is outside the {min}-{max} scale")]
    ValueOutOfRange {
        question: u32,
        value: i64,
        min: u8,
        max: u8,
    },

    #[error("Question {question} does not exist (questionnaire has {total} questions)")]
    UnknownQuestion { question: u32, total: u32 },

    #[error("Question {0} was answered more than once")]
    DuplicateQuestion(u32),
}
