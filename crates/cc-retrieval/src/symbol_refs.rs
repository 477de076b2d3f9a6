use cc_core::Chunk;

/// One occurrence of a symbol found by whole-word scan (§4.K).
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReference {
    pub path: String,
    pub file_line: u32,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReferencesResult {
    pub symbol: String,
    pub references: Vec<SymbolReference>,
    /// Every match found, even beyond what was returned (§4.K).
    pub usage_count: usize,
    pub confidence: &'static str,
    pub is_complete: bool,
}

/// Scan every chunk's content for whole-word occurrences of `symbol`,
/// returning at most `n` references but counting all of them (§4.K). Callers
/// are responsible for the fail-closed manifest/header check before calling
/// this — it only ever sees chunks that already passed validation.
pub fn find_symbol_references(symbol: &str, chunks: &[Chunk], n: usize) -> SymbolReferencesResult {
    let mut references = Vec::new();
    let mut usage_count = 0usize;

    for chunk in chunks {
        for byte_offset in whole_word_matches(&chunk.content, symbol) {
            usage_count += 1;
            if references.len() < n {
                let newlines_before = chunk.content[..byte_offset].matches('\n').count() as u32;
                let file_line = chunk.start_line + newlines_before;
                references.push(SymbolReference {
                    path: chunk.relative_path.clone(),
                    file_line,
                    preview: three_line_preview(&chunk.content, byte_offset),
                });
            }
        }
    }

    SymbolReferencesResult {
        symbol: symbol.to_string(),
        references,
        usage_count,
        confidence: "syntactic",
        is_complete: usage_count < n + 1,

    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets of every occurrence of `needle` in `haystack` that is not
/// flanked by a word character on either side (underscore counts as a word
/// character, so `foo` never matches inside `foo_bar` or `my_foo`).
fn whole_word_matches(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut offsets = Vec::new();
    let mut search_start = 0usize;
    while let Some(relative) = haystack[search_start..].find(needle) {
        let start = search_start + relative;
        let end = start + needle.len();

        let before_ok = haystack[..start].chars().next_back().map(|c| !is_word_char(c)).unwrap_or(true);
        let after_ok = haystack[end..].chars().next().map(|c| !is_word_char(c)).unwrap_or(true);

        if before_ok && after_ok {
            offsets.push(start);
        }
        search_start = start + needle.len().max(1);
    }
    offsets
}

/// The match's line plus one line of context on either side, centered on
/// the match (§4.K).
fn three_line_preview(content: &str, byte_offset: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut cumulative = 0usize;
    let mut match_line_index = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let line_end = cumulative + line.len();
        if byte_offset <= line_end {
            match_line_index = index;
            break;
        }
        cumulative = line_end + 1;
    }

    let start = match_line_index.saturating_sub(1);
    let end = (match_line_index + 1).min(lines.len().saturating_sub(1));
    lines[start..=end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::{ChunkId, Language};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn make_chunk(relative_path: &str, content: &str, start_line: u32) -> Chunk {
        Chunk {
            id: ChunkId::new_random(),
            absolute_path: PathBuf::from(relative_path),
            relative_path: relative_path.to_string(),
            start_line,
            end_line: start_line + content.matches('\n').count() as u32,
            language: Language::new("typescript"),
            framework: None,
            component_type: None,
            layer: None,
            dependencies: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            tags: BTreeSet::new(),
            content: content.to_string(),
            symbol_path: None,
            component_name: None,
            complexity: None,
            embedding: None,
        }
    }

    #[test]
    fn whole_word_match_excludes_substring_of_larger_identifier() {
        let chunk = make_chunk("src/a.ts", "const foo_bar = 1;\nfoo();\n", 1);
        let result = find_symbol_references("foo", &[chunk], 10);
        assert_eq!(result.usage_count, 1);
        assert_eq!(result.references[0].file_line, 2);
    }

    #[test]
    fn counts_all_matches_but_caps_returned_references() {
        let chunk = make_chunk("src/a.ts", "foo();\nfoo();\nfoo();\n", 1);
        let result = find_symbol_references("foo", &[chunk], 2);
        assert_eq!(result.usage_count, 3);
        assert_eq!(result.references.len(), 2);
        assert!(!result.is_complete);
    }

    #[test]
    fn is_complete_when_usage_count_within_n_plus_one() {
        let chunk = make_chunk("src/a.ts", "foo();\n", 1);
        let result = find_symbol_references("foo", &[chunk], 10);
        assert!(result.is_complete);
    }

    #[test]
    fn preview_includes_surrounding_lines() {
        let chunk = make_chunk("src/a.ts", "line one\nfoo();\nline three\n", 1);
        let result = find_symbol_references("foo", &[chunk], 10);
        assert!(result.references[0].preview.contains("line one"));
        assert!(result.references[0].preview.contains("foo();"));
        assert!(result.references[0].preview.contains("line three"));
    }
}
