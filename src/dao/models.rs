use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::policy::Role;

/// Player record as stored in the `users` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Unique login name.
    pub username: String,
    /// Plain credential compared on login.
    pub password: String,
    /// Role granting access to admin or editor actions.
    #[serde(default)]
    pub role: Role,
    /// Running score, may be negative.
    #[serde(default)]
    pub score: i64,
}

/// Question entry inside a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Prompt text.
    pub question: String,
    /// Expected answer text.
    #[serde(default)]
    pub answer: String,
    /// Base point value.
    pub value: i64,
    /// Optional countdown override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<u32>,
}

/// Category column of a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntity {
    /// Column heading.
    pub name: String,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<QuestionEntity>,
}

/// Persisted board definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntity {
    /// Categories in display order.
    #[serde(default)]
    pub categories: Vec<CategoryEntity>,
    /// Scalar applied to every question value.
    #[serde(default = "default_multiplier")]
    pub multiplier: i64,
}

fn default_multiplier() -> i64 {
    1
}

/// Content of the `boards` document: every named board known to the coordinator.
///
/// Older deployments stored a single bare board in this document; it is read
/// back as a catalog holding one board named [`DEFAULT_BOARD_NAME`].
///
/// [`DEFAULT_BOARD_NAME`]: crate::state::board::DEFAULT_BOARD_NAME
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawBoardsDocument")]
pub struct BoardsDocument {
    /// Boards keyed by their unique name.
    pub boards: IndexMap<String, BoardEntity>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBoardsDocument {
    Catalog { boards: IndexMap<String, BoardEntity> },
    Single(BoardEntity),
}

impl From<RawBoardsDocument> for BoardsDocument {
    fn from(value: RawBoardsDocument) -> Self {
        match value {
            RawBoardsDocument::Catalog { boards } => Self { boards },
            RawBoardsDocument::Single(board) if board.categories.is_empty() => Self::default(),
            RawBoardsDocument::Single(board) => {
                let mut boards = IndexMap::new();
                boards.insert(crate::state::board::DEFAULT_BOARD_NAME.to_string(), board);
                Self { boards }
            }
        }
    }
}

/// Pointer recording which named board is live so a restart resumes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveGameEntity {
    /// Name of the active board.
    pub board: String,
    /// RFC 3339 timestamp of the activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_single_board_is_read_as_default_entry() {
        let document: BoardsDocument = serde_json::from_value(json!({
            "categories": [
                { "name": "Capitals", "questions": [
                    { "question": "Capital of Peru?", "answer": "Lima", "value": 200, "timer": 20 }
                ]}
            ],
            "multiplier": 2
        }))
        .unwrap();

        let board = document.boards.get("default").unwrap();
        assert_eq!(board.multiplier, 2);
        assert_eq!(board.categories[0].questions[0].timer, Some(20));
    }

    #[test]
    fn empty_legacy_board_yields_empty_catalog() {
        let document: BoardsDocument =
            serde_json::from_value(json!({ "categories": [], "multiplier": 1 })).unwrap();
        assert!(document.boards.is_empty());
    }

    #[test]
    fn catalog_round_trips_board_order() {
        let document: BoardsDocument = serde_json::from_value(json!({
            "boards": {
                "final": { "categories": [], "multiplier": 3 },
                "warmup": { "categories": [] }
            }
        }))
        .unwrap();

        let names: Vec<_> = document.boards.keys().cloned().collect();
        assert_eq!(names, vec!["final", "warmup"]);
        assert_eq!(document.boards["warmup"].multiplier, 1);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["boards"]["final"]["multiplier"], 3);
    }

    #[test]
    fn player_role_and_score_default() {
        let player: PlayerEntity =
            serde_json::from_value(json!({ "username": "ada", "password": "pw" })).unwrap();
        assert_eq!(player.role, Role::Player);
        assert_eq!(player.score, 0);
    }
}
