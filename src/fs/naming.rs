//! Filename generation and deduplication.

use std::collections::{HashMap, HashSet};

/// Maximum length of a generated name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Name used when a title sanitizes to nothing.
pub const FALLBACK_NAME: &str = "no_name";

/// An entity whose on-disk name is derived from its remote title.
pub trait Titled {
    fn title(&self) -> &str;

    /// ISO-8601 creation timestamp; lexical order is chronological order.
    fn creation_time(&self) -> &str;

    fn set_resolved_name(&mut self, name: String);
}

/// Convert a remote title into a single safe path component.
///
/// Non-printable characters become spaces, `\ / < > | ? *` become `_`,
/// `:` becomes `-` and `"` becomes `'`. The result is trimmed, stripped of
/// trailing periods, capped at [`MAX_NAME_LENGTH`] characters and never empty.
pub fn title_to_filename(title: &str) -> String {
    let mapped: String = title
        .chars()
        .map(|c| match c {
            c if !is_printable(c) => ' ',
            '\\' | '/' | '<' | '>' | '|' | '?' | '*' => '_',
            ':' => '-',
            '"' => '\'',
            c => c,
        })
        .collect();

    let trimmed = mapped.trim().trim_end_matches('.');
    let truncated: String = trimmed.chars().take(MAX_NAME_LENGTH).collect();

    if truncated.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncated
    }
}

/// Printable in the sense of "renders as a glyph or as the ASCII space".
///
/// Covers controls, separators, format characters, private use and
/// noncharacters. Unassigned code points are not detected: `std` carries no
/// general-category table, so they pass through unchanged.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        // format characters (Cf)
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            // noncharacters
            | '\u{FDD0}'..='\u{FDEF}'
            | '\u{FFFE}'..='\u{FFFF}'
            // private use
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
    )
}

/// Make every name in a sibling group unique.
///
/// Names that occur once are returned unchanged. Repeated names get a
/// `_001`, `_002`, ... counter in input order; with `has_extension` the
/// counter lands before the final extension (`photo.jpg` -> `photo_001.jpg`).
pub fn make_unique_names<S: AsRef<str>>(names: &[S], has_extension: bool) -> Vec<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *occurrences.entry(name.as_ref()).or_insert(0) += 1;
    }

    if occurrences.values().all(|&count| count == 1) {
        return names.iter().map(|n| n.as_ref().to_string()).collect();
    }

    // Singletons keep their names, so generated names must avoid them.
    let mut taken: HashSet<String> = occurrences
        .iter()
        .filter(|&(_, &count)| count == 1)
        .map(|(name, _)| name.to_string())
        .collect();
    let mut counters: HashMap<&str, u32> = HashMap::new();

    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            if occurrences[name] == 1 {
                return name.to_string();
            }

            let counter = counters.entry(name).or_insert(1);
            loop {
                let candidate = with_counter(name, *counter, has_extension);
                *counter += 1;
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Insert `_NNN` into a name.
fn with_counter(name: &str, counter: u32, has_extension: bool) -> String {
    let suffix = format!("_{:03}", counter);

    if has_extension {
        let mut segments: Vec<String> = name.split('.').map(str::to_string).collect();
        let target = segments.len().saturating_sub(2);
        segments[target].push_str(&suffix);
        segments.join(".")
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Sort a sibling group by creation time and assign unique directory names.
///
/// The sort is stable, so items created at the same instant keep their
/// remote listing order.
pub fn assign_directory_names<T: Titled>(items: &mut [T]) {
    items.sort_by(|a, b| a.creation_time().cmp(b.creation_time()));

    let names: Vec<String> = items.iter().map(|i| title_to_filename(i.title())).collect();
    let unique = make_unique_names(&names, false);

    for (item, name) in items.iter_mut().zip(unique) {
        item.set_resolved_name(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        title: String,
        created: String,
        name: String,
    }

    impl Item {
        fn new(title: &str, created: &str) -> Self {
            Self {
                title: title.to_string(),
                created: created.to_string(),
                name: String::new(),
            }
        }
    }

    impl Titled for Item {
        fn title(&self) -> &str {
            &self.title
        }
        fn creation_time(&self) -> &str {
            &self.created
        }
        fn set_resolved_name(&mut self, name: String) {
            self.name = name;
        }
    }

    #[test]
    fn test_title_to_filename_replacements() {
        assert_eq!(title_to_filename("a/b\\c"), "a_b_c");
        assert_eq!(title_to_filename("<x>|y?*"), "_x__y__");
        assert_eq!(title_to_filename("Week 1: Intro"), "Week 1- Intro");
        assert_eq!(title_to_filename("say \"hi\""), "say 'hi'");
        assert_eq!(title_to_filename("tab\there"), "tab here");
    }

    #[test]
    fn test_title_to_filename_trimming() {
        assert_eq!(title_to_filename("  Notes...  "), "Notes");
        assert_eq!(title_to_filename("Notes. . ."), "Notes. . ");
        assert_eq!(title_to_filename(".hidden"), ".hidden");
        assert_eq!(title_to_filename("\n\t "), FALLBACK_NAME);
        assert_eq!(title_to_filename("..."), FALLBACK_NAME);
        assert_eq!(title_to_filename(""), FALLBACK_NAME);
    }

    #[test]
    fn test_title_to_filename_invisible_characters() {
        assert_eq!(title_to_filename("a\u{200B}b"), "a b");
        assert_eq!(title_to_filename("a\u{00A0}b"), "a b");
        assert_eq!(title_to_filename("Résumé 日本"), "Résumé 日本");
    }

    #[test]
    fn test_title_to_filename_format_characters() {
        // tag sequence of a subdivision flag, Arabic number sign
        assert_eq!(title_to_filename("flag\u{E0067}\u{E007F}"), "flag");
        assert_eq!(title_to_filename("\u{0600}12"), "12");
        assert_eq!(title_to_filename("a\u{1D173}b\u{FDD0}c"), "a b c");
    }

    #[test]
    fn test_title_to_filename_truncates_by_characters() {
        let long = "é".repeat(500);
        let name = title_to_filename(&long);
        assert_eq!(name.chars().count(), MAX_NAME_LENGTH);
    }

    #[test]
    fn test_title_to_filename_output_alphabet() {
        let titles = [
            "a:b\"c\\d/e<f>g|h?i*j",
            "::::",
            "\u{0}\u{1}\u{7f}",
            "   .  .. ",
            "report.pdf.",
        ];
        for title in titles {
            let name = title_to_filename(title);
            assert!(!name.is_empty());
            assert!(name.chars().count() <= MAX_NAME_LENGTH);
            assert!(!name.contains(['\\', '/', '<', '>', '|', '?', '*', ':', '"']));
        }
    }

    #[test]
    fn test_make_unique_names_with_extension() {
        assert_eq!(
            make_unique_names(&["photo.jpg", "photo.jpg"], true),
            vec!["photo_001.jpg", "photo_002.jpg"]
        );
        assert_eq!(
            make_unique_names(&["a.tar.gz", "a.tar.gz"], true),
            vec!["a.tar_001.gz", "a.tar_002.gz"]
        );
        assert_eq!(
            make_unique_names(&["README", "README"], true),
            vec!["README_001", "README_002"]
        );
    }

    #[test]
    fn test_make_unique_names_without_extension() {
        assert_eq!(
            make_unique_names(&["party", "party"], false),
            vec!["party_001", "party_002"]
        );
        assert_eq!(
            make_unique_names(&["v1.2", "v1.2"], false),
            vec!["v1.2_001", "v1.2_002"]
        );
    }

    #[test]
    fn test_make_unique_names_keeps_singletons() {
        let names = ["a", "b", "a", "c", "a"];
        assert_eq!(
            make_unique_names(&names, false),
            vec!["a_001", "b", "a_002", "c", "a_003"]
        );

        let distinct = ["x.pdf", "y.pdf"];
        assert_eq!(make_unique_names(&distinct, true), vec!["x.pdf", "y.pdf"]);
    }

    #[test]
    fn test_make_unique_names_avoids_existing_suffix() {
        let names = ["a", "a", "a_001"];
        let unique = make_unique_names(&names, false);
        assert_eq!(unique, vec!["a_002", "a_003", "a_001"]);
    }

    #[test]
    fn test_make_unique_names_all_unique() {
        let names = ["n", "n", "n_001", "m.txt", "m.txt", "n"];
        let unique = make_unique_names(&names, true);
        assert_eq!(unique.len(), names.len());
        let set: HashSet<_> = unique.iter().collect();
        assert_eq!(set.len(), names.len());
    }

    #[test]
    fn test_make_unique_names_empty() {
        let names: [&str; 0] = [];
        assert!(make_unique_names(&names, false).is_empty());
    }

    #[test]
    fn test_assign_directory_names_orders_by_creation_time() {
        let mut items = vec![
            Item::new("Lab", "2024-03-01T10:00:00Z"),
            Item::new("Intro", "2024-01-01T10:00:00Z"),
            Item::new("Lab", "2024-02-01T10:00:00Z"),
        ];

        assign_directory_names(&mut items);

        let names: Vec<(&str, &str)> = items
            .iter()
            .map(|i| (i.created.as_str(), i.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("2024-01-01T10:00:00Z", "Intro"),
                ("2024-02-01T10:00:00Z", "Lab_001"),
                ("2024-03-01T10:00:00Z", "Lab_002"),
            ]
        );
    }
}
