use proptest::prelude::*;

use comicgrep::normalize::normalize;

/// Vocabulary for phrase-shaped inputs. Stemming is only stable on
/// word-like tokens, so the idempotence property is stated over these.
const VOCAB: &[&str] = &[
    "cat", "cats", "dog", "dogs", "running", "jumps", "quickly", "the", "and", "it", "server",
    "servers", "database", "404", "comic", "comics", "search", "searching", "index", "update",
    "Sandwich", "ROBOT", "physics",
];

const SEPARATORS: &[&str] = &[" ", ", ", "... ", "! ", " - ", "\t"];

fn phrase_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        (
            prop::sample::select(VOCAB.to_vec()),
            prop::sample::select(SEPARATORS.to_vec()),
        ),
        0..20,
    )
    .prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(word, sep)| format!("{word}{sep}"))
            .collect::<String>()
    })
}

proptest! {
    /// Normalizing an already-normalized phrase changes nothing.
    #[test]
    fn normalization_is_idempotent(phrase in phrase_strategy()) {
        let once = normalize(&phrase);
        let twice = normalize(&once.join(" "));
        prop_assert_eq!(once, twice);
    }

    /// Output tokens are lower-case and purely alphanumeric, for arbitrary
    /// Unicode input.
    #[test]
    fn output_tokens_are_clean(phrase in ".{0,200}") {
        for word in normalize(&phrase) {
            prop_assert!(!word.is_empty());
            prop_assert!(word.chars().all(char::is_alphanumeric), "dirty token: {word:?}");
            prop_assert_eq!(&word, &word.to_lowercase());
        }
    }

    /// Output carries no duplicates.
    #[test]
    fn output_is_deduplicated(phrase in phrase_strategy()) {
        let words = normalize(&phrase);
        let mut unique = words.clone();
        unique.dedup();
        prop_assert_eq!(words, unique);
    }

    /// Stop words never survive, regardless of what surrounds them.
    #[test]
    fn stop_words_are_filtered(filler in "[a-z]{3,8}") {
        let phrase = format!("the {filler} and it");
        let words = normalize(&phrase);
        prop_assert!(!words.iter().any(|w| w == "the" || w == "and" || w == "it"));
    }
}
