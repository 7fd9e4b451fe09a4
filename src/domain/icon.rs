//! The fixed icon set a task can be labelled with and the colour each maps to.

pub const DEFAULT_ICON: &str = "✏️";

/// Recognised icons in display order, paired with their accent colour.
pub const ICONS: [(&str, &str); 5] = [
    (DEFAULT_ICON, "#5f27cd"),
    ("✈️", "#54a0ff"),
    ("💰", "#1dd1a1"),
    ("🛒", "#feca57"),
    ("🦾", "#ff6b6b"),
];

/// Accent colour for an icon label. Unrecognised labels get the default colour.
pub fn icon_color(icon: &str) -> &'static str {
    ICONS
        .iter()
        .find(|(label, _)| *label == icon)
        .map(|(_, color)| *color)
        .unwrap_or(ICONS[0].1)
}

/// Empty or missing labels fall back to the default icon.
pub fn normalize_icon(icon: Option<&str>) -> String {
    match icon {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => DEFAULT_ICON.to_string(),
    }
}

/// Next recognised icon after `icon`, wrapping around. Unknown labels restart at the default.
pub fn next_icon(icon: &str) -> &'static str {
    let pos = ICONS.iter().position(|(label, _)| *label == icon);
    match pos {
        Some(i) => ICONS[(i + 1) % ICONS.len()].0,
        None => DEFAULT_ICON,
    }
}

/// Previous recognised icon before `icon`, wrapping around.
pub fn prev_icon(icon: &str) -> &'static str {
    let pos = ICONS.iter().position(|(label, _)| *label == icon);
    match pos {
        Some(i) => ICONS[(i + ICONS.len() - 1) % ICONS.len()].0,
        None => DEFAULT_ICON,
    }
}
