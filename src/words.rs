use once_cell::sync::Lazy;
use regex::Regex;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static CURLY_QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[‘’“”]").unwrap());
static HYPHENS_APOSTROPHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-']").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Reduces rich text to the plain text that gets counted.
///
/// Order matters: quotes are straightened before hyphens and apostrophes are
/// deleted, so "don’t" and "well-known" each collapse into one token.
pub fn plain_text(html: &str) -> String {
    let text = TAGS.replace_all(html, "");
    let text = CURLY_QUOTES.replace_all(&text, "'");
    let text = HYPHENS_APOSTROPHES.replace_all(&text, "");
    let text = PUNCTUATION.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Counts words in a post body.
///
/// Hyphenated words and contractions count as one word and a bare number
/// counts as a word. Characters outside ASCII letters, digits and `_` are
/// deleted, so accented letters split nothing but vanish from their word.
pub fn count_words(html: &str) -> usize {
    let text = plain_text(html);
    if text.is_empty() {
        0
    } else {
        text.split(' ').count()
    }
}
