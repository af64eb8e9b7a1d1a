//! Text normalization: tokenization plus suffix-stripping stemming.
//!
//! Both matchers share this canonical term form. The functions are pure;
//! identical input always yields identical output.

/// How a rule ends: keep stripping or stop at the result.
#[derive(Clone, Copy, PartialEq)]
enum Next {
    Continue,
    Halt,
}

/// One suffix rule: when a word ends with `suffix`, drop `remove` bytes
/// and push `append`. A rule with `remove == 0` is a terminal guard that
/// protects the ending from later rules (e.g. `-ss`).
struct Rule {
    suffix: &'static str,
    remove: usize,
    append: &'static str,
    next: Next,
}

const fn rule(suffix: &'static str, remove: usize, append: &'static str, next: Next) -> Rule {
    Rule {
        suffix,
        remove,
        append,
        next,
    }
}

/// Ordered rule table for the iterative stemmer, in the aggressive
/// Lancaster family. Order matters: earlier rules win, and guard rules
/// (`-ss`, `-sse`) sit before the bare plural rule they protect against.
const RULES: &[Rule] = &[
    rule("ies", 3, "y", Next::Halt),
    rule("ied", 3, "y", Next::Halt),
    rule("ness", 4, "", Next::Halt),
    rule("sse", 1, "", Next::Halt),
    rule("ss", 0, "", Next::Halt),
    rule("xe", 1, "", Next::Halt),
    rule("s", 1, "", Next::Continue),
    rule("eed", 1, "", Next::Halt),
    rule("ing", 3, "", Next::Continue),
    rule("ed", 2, "", Next::Continue),
    rule("ation", 5, "", Next::Continue),
    rule("ion", 3, "", Next::Continue),
    rule("ment", 4, "", Next::Continue),
    rule("able", 4, "", Next::Halt),
    rule("ible", 4, "", Next::Halt),
    rule("ance", 4, "", Next::Halt),
    rule("ence", 4, "", Next::Halt),
    rule("est", 3, "", Next::Continue),
    rule("ful", 3, "", Next::Halt),
    rule("ity", 3, "", Next::Continue),
    rule("ive", 3, "", Next::Continue),
    rule("ous", 3, "", Next::Halt),
    // Adverbial -ly, conditioned on the preceding letter so roots like
    // "apply" and "family" stay intact.
    rule("ally", 2, "", Next::Continue),
    rule("ely", 2, "", Next::Continue),
    rule("kly", 2, "", Next::Continue),
    rule("tly", 2, "", Next::Continue),
    rule("dly", 2, "", Next::Continue),
    rule("nly", 2, "", Next::Continue),
    rule("rly", 2, "", Next::Continue),
    rule("wly", 2, "", Next::Continue),
    rule("gly", 2, "", Next::Continue),
    rule("er", 2, "", Next::Continue),
    rule("al", 2, "", Next::Continue),
    // Doubled-consonant reduction after -ing/-ed stripping (running -> runn -> run).
    rule("bb", 1, "", Next::Continue),
    rule("dd", 1, "", Next::Continue),
    rule("ff", 1, "", Next::Continue),
    rule("gg", 1, "", Next::Continue),
    rule("ll", 1, "", Next::Continue),
    rule("mm", 1, "", Next::Continue),
    rule("nn", 1, "", Next::Continue),
    rule("pp", 1, "", Next::Continue),
    rule("rr", 1, "", Next::Continue),
    rule("tt", 1, "", Next::Continue),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Stem acceptability: vowel-initial stems need at least two characters,
/// consonant-initial stems need at least three and must contain a vowel
/// (counting `y`). Rules producing unacceptable stems do not fire, which
/// keeps short function words like "is" or "ring" intact.
fn is_acceptable(stem: &str) -> bool {
    let mut chars = stem.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let len = stem.chars().count();
    if is_vowel(first) {
        len >= 2
    } else {
        len >= 3 && stem.chars().any(|c| is_vowel(c) || c == 'y')
    }
}

/// Splits text into lowercase word tokens on every non-alphanumeric
/// boundary. Pure-punctuation runs vanish; order and duplicates survive.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reduces a single lowercase token to its stem by iteratively applying
/// the rule table until no rule fires or a halting rule ends the word.
pub fn stem(word: &str) -> String {
    let mut current = word.to_string();
    'strip: loop {
        for rule in RULES {
            if !current.ends_with(rule.suffix) {
                continue;
            }
            if rule.remove == 0 {
                // Terminal guard: this ending must stay as-is.
                return current;
            }
            let kept = current.len() - rule.remove;
            let mut candidate = current[..kept].to_string();
            candidate.push_str(rule.append);
            if !is_acceptable(&candidate) {
                continue;
            }
            current = candidate;
            match rule.next {
                Next::Halt => return current,
                Next::Continue => continue 'strip,
            }
        }
        return current;
    }
}

/// Full normalization pipeline: tokenize, then stem each token. The
/// output keeps token order and duplicate stems; downstream scorers
/// decide what to do with repetition.
pub fn normalize(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|token| stem(token)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_punctuation_and_lowercases() {
        assert_eq!(
            tokenize("When do CLASSES start?!"),
            vec!["when", "do", "classes", "start"]
        );
        assert_eq!(tokenize("...!!!"), Vec::<String>::new());
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    #[test]
    fn tokenize_splits_contractions() {
        assert_eq!(tokenize("what's"), vec!["what", "s"]);
    }

    #[test]
    fn stem_folds_suffix_variants() {
        assert_eq!(stem("running"), "run");
        assert_eq!(stem("runs"), "run");
        assert_eq!(stem("run"), "run");
        assert_eq!(stem("booked"), "book");
        assert_eq!(stem("booking"), "book");
        assert_eq!(stem("libraries"), "library");
        assert_eq!(stem("library"), "library");
        assert_eq!(stem("applied"), "apply");
        assert_eq!(stem("applies"), "apply");
        assert_eq!(stem("apply"), "apply");
        assert_eq!(stem("families"), "family");
        assert_eq!(stem("family"), "family");
        assert_eq!(stem("hourly"), "hour");
        assert_eq!(stem("hours"), "hour");
        assert_eq!(stem("admissions"), "admiss");
        assert_eq!(stem("admission"), "admiss");
        assert_eq!(stem("deadlines"), "deadline");
        assert_eq!(stem("classes"), "class");
        assert_eq!(stem("class"), "class");
    }

    #[test]
    fn stem_does_not_fold_irregular_forms() {
        // Suffix stripping only: "ran" is not reduced to "run".
        assert_eq!(stem("ran"), "ran");
    }

    #[test]
    fn stem_leaves_short_words_alone() {
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("the"), "the");
        assert_eq!(stem("ring"), "ring");
        assert_eq!(stem("red"), "red");
        assert_eq!(stem("gas"), "gas");
    }

    #[test]
    fn stem_handles_derivational_suffixes() {
        assert_eq!(stem("registration"), "registr");
        assert_eq!(stem("payment"), "pay");
        assert_eq!(stem("darkness"), "dark");
        assert_eq!(stem("security"), "secur");
        assert_eq!(stem("quickly"), "quick");
    }

    #[test]
    fn normalize_preserves_order_and_duplicates() {
        assert_eq!(
            normalize("fees, fees and more fees"),
            vec!["fee", "fee", "and", "more", "fee"]
        );
    }

    #[test]
    fn normalize_is_deterministic() {
        let input = "When is the registration deadline for new students?";
        assert_eq!(normalize(input), normalize(input));
    }
}
