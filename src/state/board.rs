use indexmap::IndexMap;

use crate::dao::models::{BoardEntity, BoardsDocument, CategoryEntity, QuestionEntity};

/// Name used for the board when the persisted document predates the named catalog.
pub const DEFAULT_BOARD_NAME: &str = "default";

/// A single clue on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Prompt shown to every player.
    pub question: String,
    /// Expected answer; only ever shown to privileged roles.
    pub answer: String,
    /// Base point value before the board multiplier is applied.
    pub value: i64,
    /// Optional countdown override in seconds (`None` or `0` uses the configured default).
    pub timer: Option<u32>,
}

/// Ordered column of questions sharing a heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Column heading.
    pub name: String,
    /// Questions in display order.
    pub questions: Vec<Question>,
}

/// Complete question board selected wholesale for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Categories in display order.
    pub categories: Vec<Category>,
    /// Scalar applied to every question value on this board.
    pub multiplier: i64,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            multiplier: 1,
        }
    }
}

impl Board {
    /// Resolve a question by its (category, question) coordinates.
    pub fn question(
        &self,
        category_index: usize,
        question_index: usize,
    ) -> Option<(&Category, &Question)> {
        let category = self.categories.get(category_index)?;
        let question = category.questions.get(question_index)?;
        Some((category, question))
    }

    /// Number of questions across all categories.
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }
}

/// Named boards known to the coordinator plus the pointer to the live one.
#[derive(Debug, Clone, Default)]
pub struct BoardCatalog {
    boards: IndexMap<String, Board>,
    active: Option<String>,
}

impl BoardCatalog {
    /// Build a catalog from its parts, falling back to the first board when the
    /// requested active name is unknown.
    pub fn new(boards: IndexMap<String, Board>, active: Option<String>) -> Self {
        let active = active
            .filter(|name| boards.contains_key(name))
            .or_else(|| boards.keys().next().cloned());
        Self { boards, active }
    }

    /// Board currently used for question selection.
    pub fn active_board(&self) -> Option<&Board> {
        self.active.as_ref().and_then(|name| self.boards.get(name))
    }

    /// Name of the board currently used for question selection.
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Iterate over every stored board in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Board)> {
        self.boards.iter()
    }

    /// Look up a board by name.
    pub fn get(&self, name: &str) -> Option<&Board> {
        self.boards.get(name)
    }

    /// Insert or replace a board. The first board ever stored becomes active.
    pub fn upsert(&mut self, name: String, board: Board) {
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.boards.insert(name, board);
    }

    /// Remove a board, returning it when it existed. Removing the active board
    /// clears the pointer.
    pub fn remove(&mut self, name: &str) -> Option<Board> {
        let removed = self.boards.shift_remove(name);
        if removed.is_some() && self.active.as_deref() == Some(name) {
            self.active = None;
        }
        removed
    }

    /// Mark the named board as live. Returns `false` when no such board exists.
    pub fn activate(&mut self, name: &str) -> bool {
        if self.boards.contains_key(name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Convert the catalog into its persisted document form.
    pub fn to_document(&self) -> BoardsDocument {
        BoardsDocument {
            boards: self
                .boards
                .iter()
                .map(|(name, board)| (name.clone(), board.clone().into()))
                .collect(),
        }
    }
}

impl From<BoardsDocument> for IndexMap<String, Board> {
    fn from(value: BoardsDocument) -> Self {
        value
            .boards
            .into_iter()
            .map(|(name, board)| (name, board.into()))
            .collect()
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
            value: value.value,
            timer: value.timer,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
            value: value.value,
            timer: value.timer,
        }
    }
}

impl From<CategoryEntity> for Category {
    fn from(value: CategoryEntity) -> Self {
        Self {
            name: value.name,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Category> for CategoryEntity {
    fn from(value: Category) -> Self {
        Self {
            name: value.name,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BoardEntity> for Board {
    fn from(value: BoardEntity) -> Self {
        Self {
            categories: value.categories.into_iter().map(Into::into).collect(),
            multiplier: value.multiplier,
        }
    }
}

impl From<Board> for BoardEntity {
    fn from(value: Board) -> Self {
        Self {
            categories: value.categories.into_iter().map(Into::into).collect(),
            multiplier: value.multiplier,
        }
    }
}
