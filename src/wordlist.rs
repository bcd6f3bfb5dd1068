//! Mnemonic phrase matching against closed BIP-39 vocabularies.
//!
//! A phrase is only reported when every token in a 24- or 12-token window is
//! a vocabulary member. Ordinary prose that happens to contain a handful of
//! BIP-39 words never fills a whole window.
//!
//! The English list is always available. The secondary list (Simplified
//! Chinese) is loaded on first use through [`LazyVocabulary`] and then kept
//! for the life of the process.

use crate::checks::Span;
use anyhow::Result;
use async_trait::async_trait;
use bip39::Language;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Window sizes, longest first
pub const PHRASE_LENGTHS: [usize; 2] = [24, 12];

/// Runs of at least this many boundary-less characters are split per character
pub const UNSCRIPTED_RUN_MIN: usize = 12;

static ENGLISH: Lazy<Vocabulary> =
    Lazy::new(|| Vocabulary::from_words(Language::English.word_list().iter().copied()));

static SHARED_SECONDARY: Lazy<Arc<LazyVocabulary>> = Lazy::new(|| {
    Arc::new(LazyVocabulary::new(Bip39Source::new(
        Language::SimplifiedChinese,
    )))
});

/// A closed set of words
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// The eagerly available English BIP-39 list
    pub fn english() -> &'static Vocabulary {
        &ENGLISH
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A normalized token and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: Span,
}

/// A window in which every token was a vocabulary word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Tokens joined by single spaces
    pub phrase: String,
    /// From the first token's start to the last token's end
    pub span: Span,
    pub word_count: usize,
}

/// Split on whitespace, lowercase, trim edge punctuation.
///
/// Tokens with no letters (list numbering like `1.` or `(2)`) are dropped.
pub fn tokenize_words(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (start, end) in whitespace_runs(text) {
        push_word(text, start, end, &mut tokens);
    }
    tokens
}

/// Like [`tokenize_words`], but runs of [`UNSCRIPTED_RUN_MIN`] or more
/// boundary-less characters become one token per character.
pub fn tokenize_unscripted(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (start, end) in whitespace_runs(text) {
        let raw = &text[start..end];
        let segments = boundaryless_segments(raw);
        let has_long_run = segments
            .iter()
            .any(|&(s, e, unscripted)| unscripted && raw[s..e].chars().count() >= UNSCRIPTED_RUN_MIN);

        if !has_long_run {
            push_word(text, start, end, &mut tokens);
            continue;
        }

        for (s, e, unscripted) in segments {
            let seg_start = start + s;
            if unscripted && raw[s..e].chars().count() >= UNSCRIPTED_RUN_MIN {
                for (offset, ch) in raw[s..e].char_indices() {
                    let ch_start = seg_start + offset;
                    tokens.push(Token {
                        text: ch.to_string(),
                        span: Span::new(ch_start, ch_start + ch.len_utf8()),
                    });
                }
            } else {
                push_word(text, seg_start, start + e, &mut tokens);
            }
        }
    }

    tokens
}

/// First window (24 tokens, then 12) made only of vocabulary words
pub fn find_phrase(tokens: &[Token], vocab: &Vocabulary) -> Option<PhraseMatch> {
    let hits: Vec<bool> = tokens.iter().map(|t| vocab.contains(&t.text)).collect();

    for &size in PHRASE_LENGTHS.iter() {
        if tokens.len() < size {
            continue;
        }
        if let Some(i) = hits.windows(size).position(|w| w.iter().all(|&h| h)) {
            let window = &tokens[i..i + size];
            return Some(PhraseMatch {
                phrase: window
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                span: Span::new(window[0].span.start, window[size - 1].span.end),
                word_count: size,
            });
        }
    }

    None
}

/// Every non-overlapping phrase, in text order.
///
/// Each accepted window splits the tokens; both sides are searched again.
pub fn find_phrases(tokens: &[Token], vocab: &Vocabulary) -> Vec<PhraseMatch> {
    let mut found = Vec::new();
    let mut pending: Vec<&[Token]> = vec![tokens];

    while let Some(slice) = pending.pop() {
        let Some(m) = find_phrase(slice, vocab) else {
            continue;
        };
        let before = slice
            .iter()
            .take_while(|t| t.span.end <= m.span.start)
            .count();
        let after = slice
            .iter()
            .position(|t| t.span.start >= m.span.end)
            .unwrap_or(slice.len());
        pending.push(&slice[..before]);
        pending.push(&slice[after..]);
        found.push(m);
    }

    found.sort_by_key(|m| m.span.start);
    found
}

/// English phrase search, no suspension
pub fn find_phrase_sync(text: &str) -> Option<PhraseMatch> {
    find_phrase(&tokenize_words(text), Vocabulary::english())
}

/// All English phrases in `text`
pub fn find_phrases_sync(text: &str) -> Vec<PhraseMatch> {
    find_phrases(&tokenize_words(text), Vocabulary::english())
}

/// Secondary-vocabulary phrase search.
///
/// Returns `None` when the vocabulary cannot be loaded.
pub async fn find_phrase_async(text: &str, lazy: &LazyVocabulary) -> Option<PhraseMatch> {
    let vocab = lazy.get().await?;
    find_phrase(&tokenize_unscripted(text), &vocab)
}

/// All secondary-vocabulary phrases; empty when the vocabulary cannot be loaded
pub async fn find_phrases_async(text: &str, lazy: &LazyVocabulary) -> Vec<PhraseMatch> {
    match lazy.get().await {
        Some(vocab) => find_phrases(&tokenize_unscripted(text), &vocab),
        None => Vec::new(),
    }
}

/// Where a lazily loaded vocabulary comes from
#[async_trait]
pub trait VocabularySource: Send + Sync {
    async fn load(&self) -> Result<Vocabulary>;
}

/// Word list bundled with the `bip39` crate
pub struct Bip39Source {
    language: Language,
}

impl Bip39Source {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

#[async_trait]
impl VocabularySource for Bip39Source {
    async fn load(&self) -> Result<Vocabulary> {
        let vocab = Vocabulary::from_words(self.language.word_list().iter().copied());
        tracing::debug!(language = ?self.language, words = vocab.len(), "loaded vocabulary");
        Ok(vocab)
    }
}

/// Load-once vocabulary.
///
/// Concurrent callers of [`LazyVocabulary::get`] share a single in-flight
/// load. A failed load is not cached, so a later call retries.
pub struct LazyVocabulary {
    source: Box<dyn VocabularySource>,
    cell: OnceCell<Arc<Vocabulary>>,
}

impl LazyVocabulary {
    pub fn new(source: impl VocabularySource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cell: OnceCell::new(),
        }
    }

    /// Process-wide secondary vocabulary (Simplified Chinese)
    pub fn shared() -> Arc<LazyVocabulary> {
        Arc::clone(&SHARED_SECONDARY)
    }

    pub async fn get(&self) -> Option<Arc<Vocabulary>> {
        let loaded = self
            .cell
            .get_or_try_init(|| async { self.source.load().await.map(Arc::new) })
            .await;

        match loaded {
            Ok(vocab) => Some(Arc::clone(vocab)),
            Err(e) => {
                tracing::warn!(error = %e, "secondary vocabulary unavailable, mnemonic check degraded");
                None
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

/// Byte ranges of maximal non-whitespace runs
fn whitespace_runs(text: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                runs.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        runs.push((s, text.len()));
    }

    runs
}

/// Split a token into `(start, end, is_boundaryless)` segments
fn boundaryless_segments(raw: &str) -> Vec<(usize, usize, bool)> {
    let mut segments: Vec<(usize, usize, bool)> = Vec::new();

    for (i, ch) in raw.char_indices() {
        let kind = is_boundaryless(ch);
        let end = i + ch.len_utf8();
        match segments.last_mut() {
            Some(last) if last.2 == kind => last.1 = end,
            _ => segments.push((i, end, kind)),
        }
    }

    segments
}

/// Letters of scripts written without spaces between words
fn is_boundaryless(ch: char) -> bool {
    !ch.is_ascii() && ch.is_alphabetic()
}

fn push_word(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    let raw = &text[start..end];
    let trimmed_front = raw.trim_start_matches(|c: char| !c.is_alphanumeric());
    let trimmed = trimmed_front.trim_end_matches(|c: char| !c.is_alphanumeric());
    if !trimmed.chars().any(char::is_alphabetic) {
        return;
    }

    let token_start = start + (raw.len() - trimmed_front.len());
    tokens.push(Token {
        text: trimmed.to_lowercase(),
        span: Span::new(token_start, token_start + trimmed.len()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_vectors::TestVectors;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const CHINESE_12: &str = "的一是在不了有和人这中大";

    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VocabularySource for CountingSource {
        async fn load(&self) -> Result<Vocabulary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Vocabulary::from_words(CHINESE_12.chars().map(|c| c.to_string())))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl VocabularySource for FailingSource {
        async fn load(&self) -> Result<Vocabulary> {
            anyhow::bail!("word list missing")
        }
    }

    #[test]
    fn test_english_vocabulary_is_complete() {
        assert_eq!(Vocabulary::english().len(), 2048);
        assert!(Vocabulary::english().contains("abandon"));
        assert!(Vocabulary::english().contains("zoo"));
    }

    #[test]
    fn test_twelve_words_detected_eleven_not() {
        let phrase = TestVectors::english_phrase_12();
        let found = find_phrase_sync(&phrase).unwrap();
        assert_eq!(found.word_count, 12);
        assert_eq!(found.phrase, phrase);

        let eleven = phrase.split(' ').take(11).collect::<Vec<_>>().join(" ");
        assert!(find_phrase_sync(&eleven).is_none());
    }

    #[test]
    fn test_prefers_twenty_four_words() {
        let phrase = TestVectors::english_phrase_24();
        let found = find_phrase_sync(&phrase).unwrap();
        assert_eq!(found.word_count, 24);
    }

    #[test]
    fn test_every_phrase_in_text_is_found() {
        let text = "wallet A: abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about\n\
                    wallet B: legal winner thank year wave sausage worth useful legal winner thank yellow";
        let found = find_phrases_sync(text);
        assert_eq!(found.len(), 2);
        assert!(found[0].phrase.starts_with("abandon"));
        assert!(found[1].phrase.starts_with("legal winner"));
        assert!(found[0].span.end <= found[1].span.start);
        assert_eq!(&text[found[1].span.start..found[1].span.end], found[1].phrase);
    }

    #[test]
    fn test_prose_with_some_vocabulary_words_is_ignored() {
        let text = "I would like to order a coffee and a small cake before the train leaves \
                    the station this afternoon because my meeting starts early";
        assert!(find_phrase_sync(text).is_none());
    }

    #[test]
    fn test_span_covers_original_text() {
        let text = format!("my backup: 1. {} thanks", TestVectors::english_phrase_12().to_uppercase());
        let found = find_phrase_sync(&text).unwrap();
        assert!(text[found.span.start..found.span.end].starts_with("ABANDON"));
        assert!(text[found.span.start..found.span.end].ends_with("ABOUT"));
    }

    #[test]
    fn test_numbered_list_tokens_are_dropped() {
        let text = (1..=12)
            .map(|i| format!("{}. {}", i, if i == 12 { "about" } else { "abandon" }))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(find_phrase_sync(&text).unwrap().word_count, 12);
    }

    #[test]
    fn test_unscripted_run_is_split_per_character() {
        let tokens = tokenize_unscripted(&format!("seed:{}", CHINESE_12));
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[0].text, "seed");
        assert_eq!(tokens[1].text, "的");
    }

    #[test]
    fn test_short_unscripted_run_is_kept_whole() {
        let tokens = tokenize_unscripted("的一是在");
        assert_eq!(tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_shared_chinese_vocabulary_detects_contiguous_phrase() {
        let lazy = LazyVocabulary::shared();
        let found = find_phrase_async(&format!("助记词 {}", CHINESE_12), &lazy).await.unwrap();
        assert_eq!(found.word_count, 12);
        assert!(lazy.is_loaded());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let lazy = LazyVocabulary::new(CountingSource { loads: Arc::clone(&loads) });

        let (a, b, c) = tokio::join!(lazy.get(), lazy.get(), lazy.get());
        assert!(a.is_some() && b.is_some() && c.is_some());
        assert!(lazy.get().await.is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_degrades_to_no_match() {
        let lazy = LazyVocabulary::new(FailingSource);
        assert!(find_phrase_async(CHINESE_12, &lazy).await.is_none());
        assert!(!lazy.is_loaded());
    }
}
