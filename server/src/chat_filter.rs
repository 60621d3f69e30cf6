//! Profanity filtering for chat bubbles.

/// Rewrites chat text before it is shown to other players.
pub trait ChatFilter {
    fn filter(&self, text: &str) -> String;
}

/// Masks every case-insensitive occurrence of a listed word, including
/// occurrences inside longer words, with `M` followed by `o`s of the same
/// length.
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: Vec<String>,
}

const DEFAULT_WORDS: &[&str] = &["damn", "crap", "idiot", "stupid", "shit", "fuck", "bitch", "bastard"];

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(|word| word.into().to_ascii_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS.iter().copied())
    }
}

impl ChatFilter for WordListFilter {
    fn filter(&self, text: &str) -> String {
        let mut result = text.to_string();
        for word in &self.words {
            result = mask_word(&result, word);
        }
        result
    }
}

fn mask(len: usize) -> String {
    let mut masked = String::with_capacity(len);
    masked.push('M');
    masked.extend(std::iter::repeat('o').take(len.saturating_sub(1)));
    masked
}

/// `word` must already be lowercase. ASCII lowercasing keeps byte offsets
/// stable, so matches found in the folded copy index the original.
fn mask_word(text: &str, word: &str) -> String {
    let folded = text.to_ascii_lowercase();
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(found) = folded[cursor..].find(word) {
        let start = cursor + found;
        result.push_str(&text[cursor..start]);
        result.push_str(&mask(word.chars().count()));
        cursor = start + word.len();
    }
    result.push_str(&text[cursor..]);
    result
}

/// Filter that passes text through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl ChatFilter for NoFilter {
    fn filter(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_listed_words() {
        let filter = WordListFilter::new(["darn"]);
        assert_eq!(filter.filter("oh darn it"), "oh Mooo it");
        assert_eq!(filter.filter("nothing here"), "nothing here");
    }

    #[test]
    fn test_case_insensitive_and_inside_words() {
        let filter = WordListFilter::new(["Heck"]);
        assert_eq!(filter.filter("HECK heckling hEcK"), "Mooo Moooling Mooo");
    }

    #[test]
    fn test_multiple_words_and_repeats() {
        let filter = WordListFilter::new(["ab", "xyz"]);
        assert_eq!(filter.filter("ababxyz-ab"), "MoMoMoo-Mo");
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let filter = WordListFilter::new(["", "bad"]);
        assert_eq!(filter.words(), &["bad".to_string()]);
        assert_eq!(filter.filter("not bad"), "not Moo");
    }

    #[test]
    fn test_default_list_is_active() {
        let filter = WordListFilter::default();
        assert!(!filter.words().is_empty());
        assert_eq!(filter.filter("you IDIOT"), "you Moooo");
    }

    #[test]
    fn test_no_filter() {
        assert_eq!(NoFilter.filter("damn"), "damn");
    }
}
