pub const ELLIPSIS: &str = "...";

pub fn truncate_label(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_owned(),
    }
}

pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_label(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_label("Künstliche Intelligenz", 12), "Künstliche I...");
        assert_eq!(truncate_label("short", 12), "short");
        assert_eq!(truncate_label("", 12), "");
    }

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("Quantum\n  computing\tleverages"), "Quantum computing leverages");
    }

    #[test]
    fn count_label_pluralizes() {
        assert_eq!(count_label(1, "entity", "entities"), "1 entity");
        assert_eq!(count_label(3, "entity", "entities"), "3 entities");
    }
}
