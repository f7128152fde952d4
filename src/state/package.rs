//! Read-only question catalog built from an uploaded package.

use std::{collections::HashSet, fmt, str::FromStr, sync::Arc};

use thiserror::Error;

/// Number of price slots rendered per theme in the questions table.
pub const TABLE_SLOTS: usize = 10;

/// Address of a single question. Every component is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey {
    /// Round number.
    pub round: usize,
    /// Theme number inside the round.
    pub theme: usize,
    /// Question number inside the theme.
    pub question: usize,
}

/// Reasons a question key cannot be built or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionKeyError {
    /// The textual key does not have three numeric components.
    #[error("question key `{0}` must look like `round_theme_question`")]
    Malformed(String),
    /// One of the components is zero.
    #[error("question key components are 1-based")]
    ZeroComponent,
}

impl QuestionKey {
    /// Build a key from 1-based components.
    pub fn new(round: usize, theme: usize, question: usize) -> Result<Self, QuestionKeyError> {
        if round == 0 || theme == 0 || question == 0 {
            return Err(QuestionKeyError::ZeroComponent);
        }
        Ok(Self {
            round,
            theme,
            question,
        })
    }

    fn indices(&self) -> (usize, usize, usize) {
        (self.round - 1, self.theme - 1, self.question - 1)
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.round, self.theme, self.question)
    }
}

impl FromStr for QuestionKey {
    type Err = QuestionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || QuestionKeyError::Malformed(s.to_string());
        let mut parts = s.trim().split('_').map(|part| part.parse::<usize>());
        let (Some(Ok(round)), Some(Ok(theme)), Some(Ok(question)), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Self::new(round, theme, question)
    }
}

/// An extracted package: the catalog used by the game plus the raw document served to viewers.
#[derive(Debug, Clone)]
pub struct PackageDocument {
    /// Raw normalized document exactly as extracted.
    pub raw: Arc<serde_json::Value>,
    /// Catalog view over the same document.
    pub package: Package,
}

/// Parsed question package: rounds of themes of priced questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Package title, if the document declares one.
    pub name: String,
    /// Rounds in play order.
    pub rounds: Vec<Round>,
}

/// A round of the package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    /// Display name of the round.
    pub name: String,
    /// Themes shown on the round's table.
    pub themes: Vec<Theme>,
}

/// A theme (table row) of a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    /// Display name of the theme.
    pub name: String,
    /// Questions in price order.
    pub questions: Vec<Question>,
}

/// A single priced question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    /// Price exactly as written in the package; rendered on the table.
    pub price: String,
    /// Question text shown to players and passed to the judge.
    pub text: String,
    /// Every accepted form of the answer.
    pub answers: Vec<String>,
}

impl Question {
    /// Numeric price used for scoring. Unparseable prices score zero.
    pub fn price_value(&self) -> i64 {
        self.price.trim().parse().unwrap_or(0)
    }

    /// All accepted answers joined into the single string handed to the judge.
    pub fn expected_answer(&self) -> String {
        self.answers.join("; ")
    }
}

/// Rendered questions table for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionsTable {
    /// Pipe-delimited theme names and price slots.
    pub rendered: String,
    /// True when no unanswered question remains in the round.
    pub is_empty: bool,
}

impl Package {
    /// Number of rounds in the package.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// Number of themes in the 0-based `round`.
    pub fn theme_count(&self, round: usize) -> usize {
        self.rounds.get(round).map_or(0, |r| r.themes.len())
    }

    /// Name of the 0-based `theme` in the 0-based `round`.
    pub fn theme_name(&self, round: usize, theme: usize) -> Option<&str> {
        self.theme(round, theme).map(|t| t.name.as_str())
    }

    /// Number of questions in the 0-based `theme` of the 0-based `round`.
    pub fn question_count(&self, round: usize, theme: usize) -> usize {
        self.theme(round, theme).map_or(0, |t| t.questions.len())
    }

    /// Look up a question by its 1-based key.
    pub fn question(&self, key: QuestionKey) -> Option<&Question> {
        let (round, theme, question) = key.indices();
        self.theme(round, theme)?.questions.get(question)
    }

    /// Score value of a question, zero when the key does not exist.
    pub fn price(&self, key: QuestionKey) -> i64 {
        self.question(key).map_or(0, Question::price_value)
    }

    /// Whether a round follows the 1-based `round_num`.
    pub fn has_next_round(&self, round_num: usize) -> bool {
        round_num < self.round_count()
    }

    /// Whether the 0-based `round` contains at least one question.
    pub fn round_has_questions(&self, round: usize) -> bool {
        self.rounds
            .get(round)
            .is_some_and(|r| r.themes.iter().any(|t| !t.questions.is_empty()))
    }

    /// Render the questions table of the 1-based `round_num`, marking answered keys with `-`.
    pub fn questions_table(
        &self,
        round_num: usize,
        answered: &HashSet<QuestionKey>,
    ) -> QuestionsTable {
        let mut cells = Vec::new();
        let mut is_empty = true;
        let round = round_num.saturating_sub(1);

        for (theme_index, theme) in self
            .rounds
            .get(round)
            .map(|r| r.themes.as_slice())
            .unwrap_or_default()
            .iter()
            .enumerate()
        {
            cells.push(theme.name.clone());
            for slot in 0..TABLE_SLOTS {
                let Some(question) = theme.questions.get(slot) else {
                    cells.push(String::new());
                    continue;
                };
                let key = QuestionKey {
                    round: round_num,
                    theme: theme_index + 1,
                    question: slot + 1,
                };
                if answered.contains(&key) {
                    cells.push("-".into());
                } else {
                    is_empty = false;
                    cells.push(question.price.clone());
                }
            }
        }

        QuestionsTable {
            rendered: cells.join("|"),
            is_empty,
        }
    }

    fn theme(&self, round: usize, theme: usize) -> Option<&Theme> {
        self.rounds.get(round)?.themes.get(theme)
    }
}
