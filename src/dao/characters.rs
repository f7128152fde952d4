//! NPC character roster read from `characters.json`.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::game::NpcPersona;

/// Failures raised while loading the roster.
#[derive(Debug, Error)]
pub enum CharactersError {
    /// The file could not be read.
    #[error("failed to read NPC characters file `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The file is not a list of characters.
    #[error("failed to parse NPC characters")]
    Parse(#[from] serde_json::Error),
}

/// A character an NPC participant can be created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcCharacter {
    /// Name used for lookups and display.
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub host_prompt: String,
    #[serde(default)]
    pub player_prompt: String,
}

impl NpcCharacter {
    /// Persona attached to players created from this character.
    pub fn persona(&self) -> NpcPersona {
        NpcPersona {
            name: self.name.clone(),
            host_prompt: self.host_prompt.clone(),
            player_prompt: self.player_prompt.clone(),
        }
    }
}

/// Characters available to JoinNPC and JoinShowman.
#[derive(Debug, Clone, Default)]
pub struct NpcRoster {
    characters: Vec<NpcCharacter>,
}

impl NpcRoster {
    /// Roster holding `characters`.
    pub fn new(characters: Vec<NpcCharacter>) -> Self {
        Self { characters }
    }

    /// Parse a JSON array of characters.
    pub fn from_json(contents: &str) -> Result<Self, CharactersError> {
        Ok(Self::new(serde_json::from_str(contents)?))
    }

    /// Read the roster at `path`.
    pub fn from_file(path: &Path) -> Result<Self, CharactersError> {
        let contents = fs::read_to_string(path).map_err(|source| CharactersError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Read the roster at `path`, falling back to an empty roster on failure.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(roster) => {
                info!(path = %path.display(), count = roster.len(), "loaded NPC characters");
                roster
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to load NPC characters; continuing without NPCs"
                );
                Self::default()
            }
        }
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&NpcCharacter> {
        let wanted = name.trim().to_lowercase();
        self.characters
            .iter()
            .find(|character| character.name.to_lowercase() == wanted)
    }

    /// Characters in file order.
    pub fn characters(&self) -> &[NpcCharacter] {
        &self.characters
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether no character is available.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"[
        { "name": "Max", "photo": "max.png", "host_prompt": "Be witty.", "player_prompt": "Guess boldly." },
        { "name": "Ann" }
    ]"#;

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let roster = NpcRoster::from_json(ROSTER).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.find(" max ").unwrap().photo.as_deref(), Some("max.png"));
        assert_eq!(roster.find("ANN").unwrap().host_prompt, "");
        assert!(roster.find("Bob").is_none());
    }

    #[test]
    fn persona_copies_prompts() {
        let roster = NpcRoster::from_json(ROSTER).unwrap();
        let persona = roster.find("Max").unwrap().persona();
        assert_eq!(persona.name, "Max");
        assert_eq!(persona.host_prompt, "Be witty.");
        assert_eq!(persona.player_prompt, "Guess boldly.");
    }

    #[test]
    fn missing_file_yields_empty_roster() {
        let roster = NpcRoster::load(Path::new("definitely/not/here.json"));
        assert!(roster.is_empty());
        assert!(matches!(
            NpcRoster::from_file(Path::new("definitely/not/here.json")),
            Err(CharactersError::Read { .. })
        ));
    }
}
