// src/services/preferences.rs
//! Keyword rules that read the user's design preferences out of the
//! conversation and decide when a rendering should be requested.

use serde::Serialize;

use crate::prompts::{self, ELEMENTS, Style};
use crate::services::session_manager::{Role, Session};

const NEGATIONS: &[&str] = &["no", "not", "without", "don't", "dont", "nothing", "never", "skip"];

const EDIT_WORDS: &[&str] = &[
    "add", "remove", "change", "replace", "more", "less", "fewer", "bigger", "smaller", "larger",
    "wider", "narrower", "make", "move", "put", "swap", "instead", "brighter", "darker", "taller",
    "shorter", "colour", "color", "extend", "shrink", "delete",
];

const LANGUAGES: &[&str] = &["english", "italian"];

const LANGUAGE_CUES: &[&str] = &["in", "speak", "speaking", "write", "reply", "answer"];

const DESIGN_NOUNS: &[&str] = &["style", "garden", "look", "cottage", "design", "feel"];

const REGENERATE_WORDS: &[&str] = &["regenerate", "start over", "new rendering", "redo", "re-render"];

/// What the user asked for in the current project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub style: Option<Style>,
    pub elements: Vec<&'static str>,
    pub excluded: Vec<&'static str>,
}

impl Preferences {
    /// Folds every user message of the current project, oldest first, so
    /// later statements override earlier ones.
    pub fn from_session(session: &Session) -> Self {
        let mut prefs = Self::default();
        for turn in session.project_turns() {
            if turn.role == Role::User {
                prefs.absorb(turn.text());
            }
        }
        prefs
    }

    pub fn absorb(&mut self, text: &str) {
        if let Some(style) = detect_style(text) {
            self.style = Some(style);
        }
        for clause in clauses(text) {
            let negated = has_negation(&clause);
            for label in elements_in(&clause) {
                if negated {
                    self.elements.retain(|e| *e != label);
                    push_unique(&mut self.excluded, label);
                } else {
                    self.excluded.retain(|e| *e != label);
                    push_unique(&mut self.elements, label);
                }
            }
        }
    }

    /// A style and at least one element are known.
    pub fn is_complete(&self) -> bool {
        self.style.is_some() && !self.elements.is_empty()
    }
}

pub fn detect_style(text: &str) -> Option<Style> {
    let lower = text.to_lowercase();
    let words = design_words(&lower);
    Style::ALL
        .into_iter()
        .find(|style| style.keywords().iter().any(|kw| mentions(&words, kw)))
}

pub fn is_regenerate_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    let words = words(&lower);
    REGENERATE_WORDS.iter().any(|kw| mentions(&words, kw))
}

/// Whether feedback on a rendering asks for a visual change. A negated
/// clause only counts when it names an element to take away.
pub fn is_edit_request(text: &str) -> bool {
    clauses(text).iter().any(|clause| {
        let mentions_element = !elements_in(clause).is_empty();
        if has_negation(clause) {
            return mentions_element;
        }
        let words = words(clause);
        mentions_element
            || is_regenerate_request(clause)
            || detect_style(clause).is_some()
            || words.iter().any(|w| EDIT_WORDS.contains(w))
    })
}

/// Decides whether the latest user message should produce a rendering.
///
/// Pure: depends only on the session's turns.
pub fn should_render(session: &Session) -> bool {
    if session.latest_image().is_none() {
        return false;
    }
    let turns = session.turns();
    let Some(idx) = turns.iter().rposition(|t| t.role == Role::User) else {
        return false;
    };
    let latest = &turns[idx];
    // A fresh photo is analysed before anything is rendered.
    if latest.image.is_some() {
        return false;
    }
    let Some(text) = latest.text.as_deref() else {
        return false;
    };
    if turns[idx + 1..].iter().any(|t| t.image.is_some()) {
        return false;
    }

    if session.has_rendering() {
        is_edit_request(text)
    } else {
        Preferences::from_session(session).is_complete()
    }
}

/// Instruction for the next rendering of this session.
pub fn instruction_for(session: &Session) -> String {
    let feedback = session.last_user_turn().map(|t| t.text()).unwrap_or("");
    if session.has_rendering() && !is_regenerate_request(feedback) {
        return prompts::refinement_instruction(feedback);
    }
    let prefs = Preferences::from_session(session);
    prompts::rendering_instruction(
        prefs.style.unwrap_or(Style::Modern),
        &prefs.elements,
        &prefs.excluded,
        prompts::DEFAULT_LIGHTING,
    )
}

fn elements_in(lower: &str) -> Vec<&'static str> {
    let words = words(lower);
    ELEMENTS
        .iter()
        .filter(|e| e.keywords.iter().any(|kw| mentions(&words, kw)))
        .map(|e| e.label)
        .collect()
}

/// Whole-word match of a one- or multi-word keyword. The last word may
/// carry a plural ending.
fn mentions(words: &[&str], keyword: &str) -> bool {
    let wanted = self::words(keyword);
    let Some((last, head)) = wanted.split_last() else {
        return false;
    };
    words.windows(wanted.len()).any(|window| {
        window[..head.len()] == *head && is_form_of(window[head.len()], last)
    })
}

fn is_form_of(word: &str, stem: &str) -> bool {
    match word.strip_prefix(stem) {
        Some(rest) => matches!(rest, "" | "s" | "es"),
        None => false,
    }
}

/// Words of a message minus language requests such as "answer in English".
fn design_words(lower: &str) -> Vec<&str> {
    let all = words(lower);
    all.iter()
        .enumerate()
        .filter(|(i, w)| !is_language_request(&all, *i, w))
        .map(|(_, w)| *w)
        .collect()
}

fn is_language_request(words: &[&str], i: usize, word: &str) -> bool {
    if !LANGUAGES.contains(&word) || i == 0 || !LANGUAGE_CUES.contains(&words[i - 1]) {
        return false;
    }
    !words
        .get(i + 1)
        .is_some_and(|next| DESIGN_NOUNS.iter().any(|noun| is_form_of(next, noun)))
}

fn clauses(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(" but ", ",")
        .split([',', '.', ';', '!', '?', '\n'])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_negation(clause: &str) -> bool {
    words(clause).iter().any(|w| NEGATIONS.contains(w))
}

fn push_unique(list: &mut Vec<&'static str>, label: &'static str) {
    if !list.contains(&label) {
        list.push(label);
    }
}
