use serde::{Deserialize, Serialize};
use thiserror::Error;

use learnbible_algo::check_answer;

use super::models::{Item, Question, QuestionKind};

/// A stored answer payload that cannot be played
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("unknown question kind: {0}")]
    UnknownKind(String),
    #[error("malformed {kind} payload for question {question_id}: {reason}")]
    Malformed {
        question_id: String,
        kind: &'static str,
        reason: String,
    },
}

/// Fill-in-the-blank: word positions (0-based) and the accepted word for each
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlanksPayload {
    #[serde(alias = "word_indices")]
    pub word_indices: Vec<usize>,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankGrade {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub all_correct: bool,
}

impl BlanksPayload {
    /// Grades submitted words in blank order; missing words count as wrong
    pub fn grade(&self, submitted: &[String]) -> BlankGrade {
        let correct = self
            .answers
            .iter()
            .enumerate()
            .filter(|(i, expected)| {
                submitted
                    .get(*i)
                    .is_some_and(|given| check_answer(given, expected))
            })
            .count() as u32;
        let total = self.answers.len() as u32;

        BlankGrade {
            correct_count: correct,
            incorrect_count: total - correct,
            all_correct: correct == total,
        }
    }
}

/// Match the verse text to its reference among distractors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePayload {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default)]
    pub distractors: Vec<String>,
}

/// Single correct answer among distractors (WHO / WHERE / TIMELINE / MCQ)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoicePayload {
    pub answer: String,
    #[serde(default)]
    pub distractors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerPayload {
    Blanks(BlanksPayload),
    Reference(ReferencePayload),
    Choice(ChoicePayload),
}

impl AnswerPayload {
    /// Maps a question's raw `answer_json` to the playable shape of its kind
    pub fn parse(question: &Question) -> Result<Self, QuestionError> {
        let malformed = |reason: String| QuestionError::Malformed {
            question_id: question.id.clone(),
            kind: question.kind.as_str(),
            reason,
        };
        let raw = question.answer_json.clone();

        match question.kind {
            QuestionKind::Blanks => {
                let blanks: BlanksPayload =
                    serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;
                if blanks.answers.is_empty() {
                    return Err(malformed("no blanks".to_string()));
                }
                if blanks.answers.len() != blanks.word_indices.len() {
                    return Err(malformed(format!(
                        "{} answers for {} blanks",
                        blanks.answers.len(),
                        blanks.word_indices.len()
                    )));
                }
                Ok(AnswerPayload::Blanks(blanks))
            }
            QuestionKind::MatchRef => serde_json::from_value(raw)
                .map(AnswerPayload::Reference)
                .map_err(|e| malformed(e.to_string())),
            QuestionKind::Who | QuestionKind::Where | QuestionKind::Timeline | QuestionKind::Mcq => {
                let choice: ChoicePayload =
                    serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;
                if choice.answer.trim().is_empty() {
                    return Err(malformed("empty answer".to_string()));
                }
                Ok(AnswerPayload::Choice(choice))
            }
        }
    }

    pub fn as_blanks(&self) -> Option<&BlanksPayload> {
        match self {
            AnswerPayload::Blanks(blanks) => Some(blanks),
            _ => None,
        }
    }
}

/// A question ready to play: reference, verse text and payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuestion {
    pub question_id: String,
    pub item_id: String,
    pub kind: QuestionKind,
    pub reference: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub translation: String,
    pub text: String,
    #[serde(flatten)]
    pub payload: AnswerPayload,
}

impl GameQuestion {
    pub fn resolve(question: &Question, item: &Item, text: String) -> Result<Self, QuestionError> {
        let payload = AnswerPayload::parse(question)?;
        Ok(Self {
            question_id: question.id.clone(),
            item_id: item.id.clone(),
            kind: question.kind,
            reference: item.reference(),
            book: item.book_name.clone(),
            chapter: item.chapter,
            verse: item.verse,
            translation: question.translation_id.clone(),
            text,
            payload,
        })
    }
}
