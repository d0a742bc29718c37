//! Abbreviation and reagent dictionaries embedded in the crate.
//!
//! Both tables are parsed from JSON on first use and shared read-only
//! afterwards, so parallel conversions can consult them freely.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::Deserialize;

static ABBREVIATIONS: OnceLock<Abbreviations> = OnceLock::new();
static AGENTS: OnceLock<Agents> = OnceLock::new();

/// Label text → SMILES with a `[*]` attachment atom.
#[derive(Debug)]
pub struct Abbreviations {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl Abbreviations {
    /// Exact label first, then a case-insensitive match.
    pub fn get(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.exact
            .get(label)
            .or_else(|| self.folded.get(&label.to_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentEntry {
    pub names: Vec<String>,
    pub smiles: String,
}

#[derive(Deserialize)]
struct AgentFile {
    noise: Vec<String>,
    agents: Vec<AgentEntry>,
}

/// Reagents, solvents and catalysts that appear as free text around arrows.
#[derive(Debug)]
pub struct Agents {
    entries: Vec<AgentEntry>,
    by_name: HashMap<String, usize>,
    noise: HashSet<String>,
}

impl Agents {
    /// Case-insensitive lookup by any of an entry's names.
    pub fn get(&self, name: &str) -> Option<&AgentEntry> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Condition words and units that carry no structure.
    pub fn is_noise(&self, token: &str) -> bool {
        self.noise.contains(&token.to_lowercase())
    }

    pub fn entries(&self) -> &[AgentEntry] {
        &self.entries
    }
}

pub fn abbreviations() -> &'static Abbreviations {
    ABBREVIATIONS.get_or_init(load_abbreviations)
}

pub fn agents() -> &'static Agents {
    AGENTS.get_or_init(load_agents)
}

fn load_abbreviations() -> Abbreviations {
    let content = include_str!("../data/abbreviations.json");
    let exact: HashMap<String, String> = serde_json::from_str(content)
        .unwrap_or_else(|e| panic!("Failed to parse abbreviation table: {e}"));
    let folded = exact
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();
    Abbreviations { exact, folded }
}

fn load_agents() -> Agents {
    let content = include_str!("../data/agents.json");
    let file: AgentFile = serde_json::from_str(content)
        .unwrap_or_else(|e| panic!("Failed to parse agent table: {e}"));

    let mut by_name = HashMap::new();
    for (i, entry) in file.agents.iter().enumerate() {
        for name in &entry.names {
            if by_name.insert(name.to_lowercase(), i).is_some() {
                panic!("Duplicate agent name found: {name}");
            }
        }
    }
    Agents {
        entries: file.agents,
        by_name,
        noise: file.noise.iter().map(|w| w.to_lowercase()).collect(),
    }
}
