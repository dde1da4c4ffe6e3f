//! Greedy word wrapping against a caller supplied width metric.

use std::iter::FusedIterator;

/// Wrap `text` into lines no wider than `max_width` under `measure`.
///
/// Words are split on whitespace and packed greedily: each word joins the
/// current line unless the joined line would measure wider than `max_width`,
/// in which case the current line is emitted first. A single word wider than
/// `max_width` gets a line to itself and is never broken.
///
/// Lines are produced lazily; `measure` is only called with candidate lines
/// of two or more words.
///
/// # Panics
///
/// Panics if `max_width` is not a positive number.
pub fn wrap<M>(text: &str, measure: M, max_width: f32) -> Wrap<'_, M>
where
    M: Fn(&str) -> f32,
{
    assert!(max_width > 0.0, "wrap width must be positive, got {max_width}");
    Wrap {
        words: text.split_whitespace(),
        measure,
        max_width,
        line: String::new(),
    }
}

/// Iterator returned by [`wrap`].
pub struct Wrap<'a, M> {
    words: std::str::SplitWhitespace<'a>,
    measure: M,
    max_width: f32,
    line: String,
}

impl<M> Iterator for Wrap<'_, M>
where
    M: Fn(&str) -> f32,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for word in self.words.by_ref() {
            if self.line.is_empty() {
                self.line.push_str(word);
                continue;
            }
            let committed = self.line.len();
            self.line.push(' ');
            self.line.push_str(word);
            if (self.measure)(self.line.as_str()) > self.max_width {
                self.line.truncate(committed);
                return Some(std::mem::replace(&mut self.line, word.to_owned()));
            }
        }
        if self.line.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.line))
        }
    }
}

impl<M> FusedIterator for Wrap<'_, M> where M: Fn(&str) -> f32 {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FontFace;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert_eq!(wrap("", chars, 100.0).count(), 0);
        assert_eq!(wrap(" \t\n ", chars, 100.0).count(), 0);
    }

    #[test]
    fn packs_words_greedily() {
        let lines: Vec<String> = wrap("aa bb cc dd ee", chars, 5.0).collect();
        assert_eq!(lines, vec!["aa bb", "cc dd", "ee"]);
    }

    #[test]
    fn collapses_runs_of_whitespace() {
        let lines: Vec<String> = wrap("  one\t\ttwo \n three  ", chars, 100.0).collect();
        assert_eq!(lines, vec!["one two three"]);
    }

    #[test]
    fn overlong_word_stands_alone_unbroken() {
        let lines: Vec<String> = wrap("a supercalifragilistic b", chars, 6.0).collect();
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn keeps_punctuation_attached() {
        let lines: Vec<String> = wrap("JMD $5,000. Thanks, truly.", chars, 11.0).collect();
        assert_eq!(lines, vec!["JMD $5,000.", "Thanks,", "truly."]);
    }

    #[test]
    fn is_lazy_and_fused() {
        let mut it = wrap("one two three", chars, 3.0);
        assert_eq!(it.next().as_deref(), Some("one"));
        assert_eq!(it.next().as_deref(), Some("two"));
        assert_eq!(it.next().as_deref(), Some("three"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn wraps_agreement_sentence_in_helvetica() {
        let text = "I Jane Brown of 12 Hope Road, Kingston agree to purchase a 2020 Red Toyota Corolla \
                    Motor Vehicle in the amount of Five Thousand JMD $5,000.";
        let measure = FontFace::Helvetica.measure(10.0);
        let lines: Vec<String> = wrap(text, &measure, 495.0).collect();
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(measure(line.as_str()) <= 495.0, "{line:?} overflows");
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    #[should_panic(expected = "wrap width must be positive")]
    fn rejects_non_positive_width() {
        let _ = wrap("x", chars, 0.0);
    }

    proptest! {
        #[test]
        fn reconstructs_word_sequence(words in prop::collection::vec("[a-zA-Z0-9,.$]{1,12}", 0..40), extra in 0.0f32..40.0) {
            let text = words.join("  ");
            let max_width = 12.0 + extra;
            let lines: Vec<String> = wrap(&text, chars, max_width).collect();
            let rebuilt: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
            prop_assert_eq!(rebuilt, words.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn lines_fit_unless_a_single_word(text in "[a-z ]{0,200}", max_width in 1.0f32..60.0) {
            let measure = FontFace::Helvetica.measure(10.0);
            for line in wrap(&text, &measure, max_width) {
                prop_assert!(!line.is_empty());
                prop_assert!(measure(line.as_str()) <= max_width || !line.contains(' '));
            }
        }
    }
}
