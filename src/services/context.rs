use crate::core::state::CharacterInfo;

/// Fallback context when a scene names nobody from the character sheet.
/// A fixed sentinel keeps the generation prompt from ending in a dangling
/// context clause.
pub const NO_CHARACTER_CONTEXT: &str = "No specific character focus";

/// Selects the character descriptions relevant to one scene.
///
/// Upstream names are free text, so the match is a case-insensitive
/// substring test in both directions: partial names, honorifics and
/// truncations still resolve. Matches render as "Name (description)"
/// joined by "; " in sheet order.
pub fn resolve_character_context(present: &[String], characters: &[CharacterInfo]) -> String {
    let matched: Vec<String> = characters
        .iter()
        .filter(|character| {
            let name = character.name.to_lowercase();
            present.iter().any(|entry| {
                let entry = entry.to_lowercase();
                entry.contains(&name) || name.contains(&entry)
            })
        })
        .map(|character| format!("{} ({})", character.name, character.description))
        .collect();

    if matched.is_empty() {
        NO_CHARACTER_CONTEXT.to_string()
    } else {
        matched.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Vec<CharacterInfo> {
        vec![
            CharacterInfo {
                name: "Ayesha".to_string(),
                description: "a tall woman in a red coat".to_string(),
            },
            CharacterInfo {
                name: "Bilal".to_string(),
                description: "a short man with round glasses".to_string(),
            },
        ]
    }

    #[test]
    fn test_case_insensitive_match() {
        let context = resolve_character_context(&["ayesha".to_string()], &sheet());
        assert!(context.contains("Ayesha (a tall woman in a red coat)"));
        assert!(!context.contains("Bilal"));
    }

    #[test]
    fn test_empty_present_returns_sentinel() {
        assert_eq!(resolve_character_context(&[], &sheet()), NO_CHARACTER_CONTEXT);
    }

    #[test]
    fn test_no_match_returns_sentinel() {
        let context = resolve_character_context(&["Zainab".to_string()], &sheet());
        assert_eq!(context, NO_CHARACTER_CONTEXT);
    }

    #[test]
    fn test_honorific_contains_sheet_name() {
        // "Dr. Ayesha" contains "Ayesha".
        let context = resolve_character_context(&["Dr. Ayesha".to_string()], &sheet());
        assert!(context.contains("Ayesha"));
    }

    #[test]
    fn test_truncated_entry_is_contained_in_sheet_name() {
        // "Bil" is a substring of "Bilal".
        let context = resolve_character_context(&["Bil".to_string()], &sheet());
        assert!(context.contains("Bilal (a short man with round glasses)"));
    }

    #[test]
    fn test_sheet_order_and_separator() {
        let present = vec!["bilal".to_string(), "ayesha".to_string()];
        let context = resolve_character_context(&present, &sheet());
        assert_eq!(
            context,
            "Ayesha (a tall woman in a red coat); Bilal (a short man with round glasses)"
        );
    }
}
