//! Keyword based topic discovery
//!
//! Each text is assigned to its most widespread keyword (the term found in the
//! most texts). Texts sharing that keyword form a topic, named
//! `<topic_id>_<kw1>_<kw2>...` after the group's most frequent terms. Texts
//! with no usable terms are treated as outliers and left out.

use crate::backend::Topic;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const MIN_TEXTS: usize = 2;
const KEYWORDS_PER_TOPIC: usize = 4;
const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "because", "been", "before",
    "being", "but", "can", "could", "did", "does", "doing", "down", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "her", "here", "hers", "him", "his", "how", "into",
    "its", "just", "more", "most", "not", "now", "off", "once", "only", "other", "our", "out",
    "over", "own", "same", "she", "should", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "until", "very", "was", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your",
];

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Discover topics across `texts`, largest topic first
pub fn discover_topics(texts: &[String]) -> Result<Vec<Topic>> {
    if texts.len() < MIN_TEXTS {
        return Err(Error::Validation(format!(
            "at least {MIN_TEXTS} texts are required for topic analysis"
        )));
    }

    let tokenized: Vec<Vec<String>> = texts.iter().map(|t| terms(t)).collect();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for doc in &tokenized {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    // anchor keyword -> indices of texts assigned to it
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, doc) in tokenized.iter().enumerate() {
        let anchor = doc
            .iter()
            .map(String::as_str)
            .max_by(|a, b| {
                document_frequency[a]
                    .cmp(&document_frequency[b])
                    .then_with(|| b.cmp(a))
            });
        if let Some(anchor) = anchor {
            groups.entry(anchor).or_default().push(index);
        }
    }

    let mut clusters: Vec<(&str, Vec<usize>)> = groups.into_iter().collect();
    clusters.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let topics = clusters
        .into_iter()
        .enumerate()
        .map(|(topic_id, (anchor, members))| {
            let keywords = group_keywords(anchor, &members, &tokenized);
            Topic {
                topic_id: topic_id as i64,
                name: format!("{}_{}", topic_id, keywords.join("_")),
                count: members.len(),
                keywords,
            }
        })
        .collect();

    Ok(topics)
}

fn group_keywords(anchor: &str, members: &[usize], tokenized: &[Vec<String>]) -> Vec<String> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for &index in members {
        for term in &tokenized[index] {
            *frequency.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = frequency.into_iter().filter(|(t, _)| *t != anchor).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    std::iter::once(anchor.to_string())
        .chain(ranked.into_iter().map(|(t, _)| t.to_string()))
        .take(KEYWORDS_PER_TOPIC)
        .collect()
}
