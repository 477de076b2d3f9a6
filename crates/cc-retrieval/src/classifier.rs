/// Coarse query class (§4.F, GLOSSARY). Determines the default
/// semantic/lexical weight split before a caller's explicit weights (if any)
/// override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ExactName,
    Config,
    Wiring,
    Flow,
    Conceptual,
}

/// A query's classified intent plus the weight pair that goes with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedQuery {
    pub intent: Intent,
    pub semantic_weight: f64,
    pub lexical_weight: f64,
}

impl Intent {
    fn default_weights(self) -> (f64, f64) {
        match self {
            Intent::ExactName => (0.4, 0.6),
            Intent::Config => (0.5, 0.5),
            Intent::Wiring => (0.5, 0.5),
            Intent::Flow => (0.6, 0.4),
            Intent::Conceptual => (0.7, 0.3),
        }
    }
}

const CONFIG_TERMS: &[&str] = &["config", "setup", "routing", "providers", "configuration", "bootstrap"];
const WIRING_TERMS: &[&str] = &["provide", "inject", "dependency", "register", "wire", "bootstrap", "module"];
const FLOW_TERMS: &[&str] = &[
    "navigate", "redirect", "route", "handle", "process", "execute", "trigger", "dispatch",
];

/// Classify `query` by the first matching rule, in the order fixed by §4.F:
/// EXACT_NAME, CONFIG, WIRING, FLOW, else CONCEPTUAL.
pub fn classify(query: &str) -> ClassifiedQuery {
    let lower = query.to_lowercase();

    let intent = if looks_like_identifier_casing(query) {
        Intent::ExactName
    } else if contains_any(&lower, CONFIG_TERMS) {
        Intent::Config
    } else if contains_any(&lower, WIRING_TERMS) {
        Intent::Wiring
    } else if contains_any(&lower, FLOW_TERMS) {
        Intent::Flow
    } else {
        Intent::Conceptual
    };

    let (semantic_weight, lexical_weight) = intent.default_weights();
    ClassifiedQuery {
        intent,
        semantic_weight,
        lexical_weight,
    }
}

fn contains_any(lower_haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| lower_haystack.contains(needle))
}

/// True if `text` contains CamelCase (an uppercase letter following a
/// lowercase one within a single token) or an intra-word lower-to-upper
/// transition, e.g. `AuthService`, `getUserName`.
fn looks_like_identifier_casing(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    for window in chars.windows(2) {
        if window[0].is_lowercase() && window[1].is_uppercase() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_is_exact_name() {
        let classified = classify("AuthService");
        assert_eq!(classified.intent, Intent::ExactName);
        assert!((classified.semantic_weight - 0.4).abs() < f64::EPSILON);
        assert!((classified.lexical_weight - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_case_identifier_is_exact_name() {
        assert_eq!(classify("getUserName").intent, Intent::ExactName);
    }

    #[test]
    fn config_terms_win_over_conceptual() {
        assert_eq!(classify("routing configuration").intent, Intent::Config);
    }

    #[test]
    fn wiring_terms_detected() {
        assert_eq!(classify("dependency injection module").intent, Intent::Wiring);
    }

    #[test]
    fn flow_terms_detected() {
        assert_eq!(classify("navigate after login").intent, Intent::Flow);
    }

    #[test]
    fn first_matching_rule_wins_in_order() {
        // Contains both a config term ("bootstrap") and a camel-case token;
        // EXACT_NAME is checked first, so it wins.
        assert_eq!(classify("bootstrapAppModule").intent, Intent::ExactName);
    }

    #[test]
    fn otherwise_is_conceptual() {
        let classified = classify("how does authentication work");
        assert_eq!(classified.intent, Intent::Conceptual);
        assert!((classified.semantic_weight - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn plain_lowercase_single_word_is_not_exact_name() {
        assert_eq!(classify("authentication").intent, Intent::Conceptual);
    }
}
