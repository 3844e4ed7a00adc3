/// The URL-safe alphabet nanoid draws from
const ALPHABET: [char; 64] = [
    '_', '-', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Produces short, URL-safe public story IDs: a fixed prefix plus a random
/// nanoid token.
///
/// Collision probability is negligible at this system's volume, but the
/// generator is not the exclusivity guarantee; the repository's unique
/// index is.
#[derive(Debug, Clone)]
pub struct StoryIdGenerator {
    prefix: String,
    length: usize,
}

impl Default for StoryIdGenerator {
    fn default() -> Self {
        Self {
            prefix: "qrs_".to_string(),
            length: 10,
        }
    }
}

impl StoryIdGenerator {
    pub fn new<S: Into<String>>(prefix: S, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
        }
    }

    /// Draw a fresh ID
    pub fn generate(&self) -> String {
        let token = nanoid::format(nanoid::rngs::default, &ALPHABET, self.length);
        format!("{}{}", self.prefix, token)
    }

    /// Whether a string has the shape this generator produces
    pub fn matches(&self, candidate: &str) -> bool {
        candidate
            .strip_prefix(&self.prefix)
            .map_or(false, |token| {
                token.len() == self.length && token.chars().all(|c| ALPHABET.contains(&c))
            })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
