use std::collections::HashMap;

use unidecode::unidecode;

/// Generates heading anchors that are unique within one document.
///
/// The first heading with a given text keeps the plain slug, the following
/// ones get `-1`, `-2`, ... appended, skipping ids that are already taken.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Slugger::default()
    }

    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut slug = base.clone();
        while self.occurrences.contains_key(&slug) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            *count += 1;
            slug = format!("{}-{}", base, count);
        }
        self.occurrences.insert(slug.clone(), 0);
        slug
    }
}

pub fn slugify(text: &str) -> String {
    let ascii = unidecode(text.trim()).to_lowercase();
    let slug: String = ascii.chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect();

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's new in 2.0?"), "whats-new-in-20");
        assert_eq!(slugify("  Ça marche  "), "ca-marche");
        assert_eq!(slugify("snake_case and-dashes"), "snake_case-and-dashes");
        assert_eq!(slugify("!!!"), "section");
    }

    #[test]
    fn test_duplicates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Why"), "why");
        assert_eq!(slugger.slug("Why"), "why-1");
        assert_eq!(slugger.slug("Why"), "why-2");
        assert_eq!(slugger.slug("Other"), "other");
    }

    #[test]
    fn test_suffix_collision() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Why 1"), "why-1");
        assert_eq!(slugger.slug("Why"), "why");
        assert_eq!(slugger.slug("Why"), "why-2");
    }
}
