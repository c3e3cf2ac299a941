/// Keyword rules checked top to bottom; the first row with any matching
/// substring wins. Rows overlap ("review" sits in both the research and the
/// review rows), so the order is load-bearing.
const ICON_RULES: &[(&[&str], &str)] = &[
    (&["research", "analyze", "study", "review"], "magnifying-glass"),
    (&["email", "call", "contact", "meet", "discussion"], "comments"),
    (&["write", "document", "draft", "create"], "file-lines"),
    (&["design", "draw", "sketch"], "palette"),
    (&["test", "check", "verify", "validate"], "clipboard-check"),
    (&["plan", "schedule", "organize"], "calendar"),
    (&["implement", "code", "develop", "build"], "code"),
    (&["review", "feedback", "evaluate"], "eye"),
    (&["update", "modify", "change", "edit"], "pen-to-square"),
];

const DEFAULT_ICON: &str = "circle-check";

pub fn subtask_icon(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    for (keywords, icon) in ICON_RULES {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return icon;
        }
    }
    DEFAULT_ICON
}
