//! Race and class choice tables.

use std::fmt::Write;

use crate::db::ChoiceRecord;

/// Entries per row when listing choices.
const CHOICES_PER_ROW: usize = 7;

/// One selectable race or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i64,
    pub name: String,
}

/// A list of choices, some of which may be hidden from players.
#[derive(Debug, Clone, Default)]
pub struct ChoiceTable {
    entries: Vec<ChoiceRecord>,
}

impl ChoiceTable {
    pub fn new(entries: Vec<ChoiceRecord>) -> Self {
        Self { entries }
    }

    /// Find a playable entry by name, ignoring case and surrounding space.
    pub fn find_playable(&self, input: &str) -> Option<Choice> {
        let wanted = input.trim();
        self.entries
            .iter()
            .find(|e| e.playable && e.name.eq_ignore_ascii_case(wanted))
            .map(|e| Choice {
                id: e.id,
                name: e.name.clone(),
            })
    }

    /// Name for an id, playable or not.
    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }

    /// Render the playable entries in rows of seven, each padded to twelve
    /// columns, followed by the choice prompt.
    pub fn render(&self, header: &str) -> String {
        let mut out = String::from(header);
        for (i, entry) in self.entries.iter().filter(|e| e.playable).enumerate() {
            let _ = write!(out, "{:<12} ", entry.name);
            if (i + 1) % CHOICES_PER_ROW == 0 {
                out.push_str("\r\n");
            }
        }
        out.push_str("\r\nChoice: ");
        out
    }

    pub fn playable_count(&self) -> usize {
        self.entries.iter().filter(|e| e.playable).count()
    }
}

/// Everything the login flow needs from the world tables.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub races: ChoiceTable,
    pub classes: ChoiceTable,
    /// Room new identities start in.
    pub start_room: i64,
}

#[cfg(test)]
pub(crate) fn sample_tables() -> Tables {
    let record = |id, name: &str, playable| ChoiceRecord {
        id,
        name: name.to_string(),
        playable,
    };
    Tables {
        races: ChoiceTable::new(vec![
            record(1, "human", true),
            record(2, "elf", true),
            record(3, "dwarf", true),
            record(4, "ogre", true),
        ]),
        classes: ChoiceTable::new(vec![
            record(0, "none", false),
            record(1, "warrior", true),
            record(2, "thief", true),
            record(3, "mage", true),
            record(4, "cleric", true),
        ]),
        start_room: 1,
    }
}
