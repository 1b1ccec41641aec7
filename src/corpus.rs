use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::typing_policy::is_accepted_char;

static TEXTS_DIR: Dir = include_dir!("src/texts");

pub const DEFAULT_CORPUS: &str = "paragraphs";

/// A named set of passages to draw tests from.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Corpus {
    pub name: String,
    texts: Vec<String>,
}

impl Corpus {
    /// Builds a corpus, dropping blank passages. Fails if none remain.
    pub fn new(name: impl Into<String>, texts: Vec<String>) -> Result<Self> {
        let name = name.into();
        let texts: Vec<String> = texts
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            return Err(Error::EmptyCorpus(name));
        }

        for (idx, text) in texts.iter().enumerate() {
            let bad = untypeable_chars(text);
            if !bad.is_empty() {
                log::warn!(
                    "corpus `{name}` passage {idx} has characters that cannot be typed: {bad:?}"
                );
            }
        }

        Ok(Self { name, texts })
    }

    /// Loads one of the corpora compiled into the binary.
    pub fn bundled(name: &str) -> Result<Self> {
        let file = TEXTS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| Error::UnknownCorpus(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| Error::UnknownCorpus(name.to_string()))?;
        Self::from_json_str(contents)
    }

    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = TEXTS_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Corpus = serde_json::from_str(json)?;
        Self::new(raw.name, raw.texts)
    }

    /// Reads a corpus from disk. `.json` files use the bundled format;
    /// anything else is one passage per non-empty line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        if path.extension().is_some_and(|ext| ext == "json") {
            return Self::from_json_str(&contents);
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, contents.lines().map(str::to_string).collect())
    }

    /// A corpus holding exactly one passage, used for `--prompt`.
    pub fn single(text: impl Into<String>) -> Result<Self> {
        Self::new("prompt", vec![text.into()])
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn pick(&self) -> &str {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // `new` guarantees at least one passage
        self.texts.choose(rng).map_or("", String::as_str)
    }

    /// Picks a passage other than `current` when the corpus allows it.
    pub fn pick_other(&self, current: &str) -> &str {
        let mut rng = rand::thread_rng();
        let others: Vec<&String> = self.texts.iter().filter(|t| *t != current).collect();
        match others.choose(&mut rng).copied() {
            Some(text) => text.as_str(),
            None => self.pick_with(&mut rng),
        }
    }
}

/// Distinct characters in `text` that the session will never accept.
pub fn untypeable_chars(text: &str) -> Vec<char> {
    let mut bad: Vec<char> = text.chars().filter(|c| !is_accepted_char(*c)).collect();
    bad.sort_unstable();
    bad.dedup();
    bad
}
