//! Free-text reagent labels around reaction arrows.

use crate::dictionary::{self, Agents};

/// Outcome of reading one text label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextAgents {
    /// Recognised names with their SMILES, in reading order.
    pub known: Vec<(String, String)>,
    pub unknown: Vec<String>,
}

/// Split a label into reagent names. The whole text is tried first, then
/// each whitespace/comma/semicolon separated token, then the pieces of a
/// token split on brackets and slashes. Quantities, units and condition
/// words are dropped.
pub fn read_text(text: &str) -> TextAgents {
    let table = dictionary::agents();
    let mut out = TextAgents::default();
    let text = text.trim();
    if text.is_empty() {
        return out;
    }
    if let Some(entry) = table.get(text) {
        out.known.push((text.to_owned(), entry.smiles.clone()));
        return out;
    }

    for token in text.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
        let token = trim_token(token);
        if token.is_empty() || is_condition(table, token) {
            continue;
        }
        if let Some(entry) = table.get(token) {
            out.known.push((token.to_owned(), entry.smiles.clone()));
            continue;
        }
        let pieces: Vec<&str> = token
            .split(['(', ')', '[', ']', '/', ':', '+'])
            .map(trim_token)
            .filter(|p| !p.is_empty())
            .collect();
        if pieces.len() < 2 {
            out.unknown.push(token.to_owned());
            continue;
        }
        for piece in pieces {
            if is_condition(table, piece) {
                continue;
            }
            match table.get(piece) {
                Some(entry) => out.known.push((piece.to_owned(), entry.smiles.clone())),
                None => out.unknown.push(piece.to_owned()),
            }
        }
    }
    out
}

/// Strip sentence punctuation and unbalanced brackets from the ends.
fn trim_token(token: &str) -> &str {
    let mut t = token.trim_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '"' | '\''));
    loop {
        let opens = t.matches('(').count();
        let closes = t.matches(')').count();
        if t.starts_with('(') && (t.ends_with(')') || closes < opens) {
            t = t.strip_prefix('(').unwrap_or(t);
            if closes > 0 && t.ends_with(')') && closes >= opens {
                t = t.strip_suffix(')').unwrap_or(t);
            }
        } else if t.ends_with(')') && closes > opens {
            t = t.strip_suffix(')').unwrap_or(t);
        } else {
            return t.trim();
        }
    }
}

/// Bare numbers, number + unit tokens like `24h` or `80°C`, and noise
/// words.
fn is_condition(table: &Agents, token: &str) -> bool {
    if table.is_noise(token) || table.is_noise(token.trim_end_matches('%')) {
        return true;
    }
    let rest = token.trim_start_matches(['-', '+', '~', '>', '<', '=']);
    let unit_start = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    if unit_start == 0 {
        return false;
    }
    let unit = &rest[unit_start..];
    unit.is_empty()
        || unit.starts_with('°')
        || unit == "%"
        || unit == "-"
        || table.is_noise(unit)
        || unit
            .strip_prefix('-')
            .is_some_and(|u| u.chars().next().is_some_and(|c| c.is_ascii_digit()))
}
