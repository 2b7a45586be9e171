//! Query tokenizer matching the preprocessing the index was fitted with.

use super::bm25::Bm25Error;
use super::stopwords;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// ASCII punctuation; a token made of exactly one of these is dropped.
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Contraction and possessive endings split off as their own token.
const CLITICS: [&str; 14] = [
    "n't", "N'T", "'ll", "'LL", "'re", "'RE", "'ve", "'VE", "'s", "'S", "'m", "'M", "'d", "'D",
];

/// The stemmer leaves tokens this short untouched.
const MIN_STEM_CHARS: usize = 3;

pub(crate) struct Tokenizer {
    lower_case: bool,
    remove_punctuation: bool,
    stopwords: Option<HashSet<&'static str>>,
    stemmer: Option<Stemmer>,
}

impl Tokenizer {
    pub(crate) fn new(
        language: &str,
        lower_case: bool,
        remove_punctuation: bool,
        remove_stopwords: bool,
        stem: bool,
    ) -> Result<Self, Bm25Error> {
        let language = language.to_lowercase();

        let stopwords = if remove_stopwords {
            if language != "english" {
                return Err(Bm25Error::UnsupportedLanguage(language));
            }
            Some(stopwords::ENGLISH.iter().copied().collect())
        } else {
            None
        };

        let stemmer = if stem {
            let algorithm = algorithm_for(&language)
                .ok_or_else(|| Bm25Error::UnsupportedLanguage(language.clone()))?;
            Some(Stemmer::create(algorithm))
        } else {
            None
        };

        Ok(Self {
            lower_case,
            remove_punctuation,
            stopwords,
            stemmer,
        })
    }

    pub(crate) fn tokenize(&self, text: &str) -> Vec<String> {
        split_words(text)
            .into_iter()
            .map(|word| {
                if self.lower_case {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .filter(|word| !(self.remove_punctuation && is_punctuation(word)))
            .filter(|word| {
                self.stopwords
                    .as_ref()
                    .is_none_or(|stop| !stop.contains(word.as_str()))
            })
            .map(|word| match &self.stemmer {
                Some(stemmer) if word.chars().count() >= MIN_STEM_CHARS => {
                    stemmer.stem(&word).into_owned()
                }
                _ => word,
            })
            .collect()
    }
}

fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language {
        "english" => Algorithm::English,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        _ => return None,
    };
    Some(algorithm)
}

fn is_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if PUNCTUATION.contains(c))
}

/// Split into words and single-character symbols.
///
/// A word is a run of alphanumerics; `-`, `.` and `'` stay inside a word when
/// both neighbours are alphanumeric ("low-cost", "5.5", "o'clock"). A trailing
/// contraction or possessive becomes its own token: "don't" gives "do" and
/// "n't", "bank's" gives "bank" and "'s".
fn split_words(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);

    let mut words = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i].1;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        if c.is_alphanumeric() {
            i += 1;
            while i < chars.len() {
                let next = chars[i].1;
                let joins = matches!(next, '-' | '.' | '\'')
                    && chars.get(i + 1).is_some_and(|(_, c)| c.is_alphanumeric());
                if next.is_alphanumeric() {
                    i += 1;
                } else if joins {
                    i += 2;
                } else {
                    break;
                }
            }
        } else {
            i += 1;
        }
        let word = &text[byte_at(start)..byte_at(i)];
        match split_clitic(word) {
            Some((head, clitic)) => {
                words.push(head);
                words.push(clitic);
            }
            None => words.push(word),
        }
    }
    words
}

fn split_clitic(word: &str) -> Option<(&str, &str)> {
    CLITICS.iter().find_map(|clitic| {
        let head = word.strip_suffix(clitic)?;
        let splits = !head.is_empty() && !head.ends_with('\'');
        splits.then_some(word.split_at(head.len()))
    })
}
