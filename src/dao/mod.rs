/// NPC character roster.
pub mod characters;
/// Answer adjudication.
pub mod judge;
/// Question package extraction.
pub mod package_store;
