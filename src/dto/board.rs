//! Board projections sent to clients and board payloads accepted from editors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::{
    board::{Board, Category, Question},
    round::ActiveQuestion,
};

/// Board as shown to clients. Answers are only present for privileged roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardView {
    pub categories: Vec<CategoryView>,
    pub multiplier: i64,
}

/// One category column of a [`BoardView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryView {
    pub name: String,
    pub questions: Vec<BoardQuestionView>,
}

/// One question tile of a [`BoardView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardQuestionView {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<u32>,
}

impl BoardView {
    /// Project a board, keeping answers only when `include_answers` is set.
    pub fn from_board(board: &Board, include_answers: bool) -> Self {
        Self {
            categories: board
                .categories
                .iter()
                .map(|category| CategoryView {
                    name: category.name.clone(),
                    questions: category
                        .questions
                        .iter()
                        .map(|question| BoardQuestionView {
                            question: question.question.clone(),
                            answer: include_answers.then(|| question.answer.clone()),
                            value: question.value,
                            timer: question.timer,
                        })
                        .collect(),
                })
                .collect(),
            multiplier: board.multiplier,
        }
    }

    /// Projection of a missing board.
    pub fn empty() -> Self {
        Self::from_board(&Board::default(), false)
    }
}

/// Payload of `questionSelected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub category: String,
    pub question: String,
    pub value: i64,
    /// Countdown length in seconds.
    pub timer: u32,
    pub category_index: usize,
    pub question_index: usize,
    /// Only sent to admins and editors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl QuestionView {
    /// Project the active question, keeping the answer only when requested.
    pub fn from_active(question: &ActiveQuestion, include_answer: bool) -> Self {
        Self {
            category: question.category.clone(),
            question: question.question.clone(),
            value: question.value,
            timer: question.timer_seconds,
            category_index: question.category_index,
            question_index: question.question_index,
            answer: include_answer.then(|| question.answer.clone()),
        }
    }
}

/// Board submitted by an editor.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct BoardInput {
    #[validate(nested)]
    pub categories: Vec<CategoryInput>,
    #[serde(default = "default_multiplier")]
    #[validate(range(min = 1))]
    pub multiplier: i64,
}

/// Category submitted as part of a [`BoardInput`].
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

/// Question submitted as part of a [`CategoryInput`].
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1))]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[validate(range(min = 0))]
    pub value: i64,
    /// Countdown override in seconds; `0` or absent uses the server default.
    #[serde(default)]
    pub timer: Option<u32>,
}

fn default_multiplier() -> i64 {
    1
}

impl From<BoardInput> for Board {
    fn from(input: BoardInput) -> Self {
        Self {
            categories: input
                .categories
                .into_iter()
                .map(|category| Category {
                    name: category.name,
                    questions: category
                        .questions
                        .into_iter()
                        .map(|question| Question {
                            question: question.question,
                            answer: question.answer,
                            value: question.value,
                            timer: question.timer,
                        })
                        .collect(),
                })
                .collect(),
            multiplier: input.multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board() -> Board {
        Board {
            categories: vec![Category {
                name: "Rivers".into(),
                questions: vec![Question {
                    question: "Longest?".into(),
                    answer: "Nile".into(),
                    value: 200,
                    timer: None,
                }],
            }],
            multiplier: 2,
        }
    }

    #[test]
    fn player_view_hides_answers() {
        let value = serde_json::to_value(BoardView::from_board(&board(), false)).unwrap();
        assert_eq!(
            value,
            json!({
                "categories": [{ "name": "Rivers", "questions": [{ "question": "Longest?", "value": 200 }] }],
                "multiplier": 2
            })
        );
    }

    #[test]
    fn privileged_view_keeps_answers() {
        let view = BoardView::from_board(&board(), true);
        assert_eq!(
            view.categories[0].questions[0].answer.as_deref(),
            Some("Nile")
        );
    }

    #[test]
    fn board_input_validation() {
        let valid: BoardInput = serde_json::from_value(json!({
            "categories": [{ "name": "Rivers", "questions": [{ "question": "Longest?", "answer": "Nile", "value": 200 }] }]
        }))
        .unwrap();
        assert!(valid.validate().is_ok());
        assert_eq!(Board::from(valid).multiplier, 1);

        let bad_multiplier: BoardInput =
            serde_json::from_value(json!({ "categories": [], "multiplier": 0 })).unwrap();
        assert!(bad_multiplier.validate().is_err());

        let negative_value: BoardInput = serde_json::from_value(json!({
            "categories": [{ "name": "Rivers", "questions": [{ "question": "Q", "value": -5 }] }]
        }))
        .unwrap();
        assert!(negative_value.validate().is_err());
    }
}
