//! Reading-time estimation

use super::ContentSection;

/// Average reading speed used for the estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words across every section heading and body
pub fn total_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|s| count_words(&s.heading) + count_words(&s.body.as_text()))
        .sum()
}

/// Minutes needed to read `words`, rounded up and clamped to at least one
pub fn minutes_for(words: usize) -> u32 {
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Reading time for a post's content sections
pub fn reading_time(sections: &[ContentSection]) -> u32 {
    minutes_for(total_words(sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichText;

    fn section(heading_words: usize, body_words: usize) -> ContentSection {
        let body = serde_json::json!([{
            "type": "paragraph",
            "text": vec!["word"; body_words].join(" "),
            "spans": []
        }]);
        ContentSection {
            heading: vec!["head"; heading_words].join(" "),
            body: serde_json::from_value::<RichText>(body).unwrap(),
        }
    }

    #[test]
    fn test_exactly_200_words_is_one_minute() {
        assert_eq!(reading_time(&[section(10, 190)]), 1);
    }

    #[test]
    fn test_201_to_400_words_is_two_minutes() {
        assert_eq!(reading_time(&[section(1, 200)]), 2);
        assert_eq!(reading_time(&[section(0, 400)]), 2);
        assert_eq!(reading_time(&[section(100, 100), section(100, 100)]), 2);
    }

    #[test]
    fn test_empty_content_is_one_minute() {
        assert_eq!(reading_time(&[]), 1);
        assert_eq!(reading_time(&[section(0, 0)]), 1);
    }

    #[test]
    fn test_whitespace_runs_are_single_separators() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn test_heading_and_body_are_combined() {
        assert_eq!(total_words(&[section(3, 4), section(2, 0)]), 9);
    }
}
