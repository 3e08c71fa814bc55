/// Model used when none is requested.
pub const DEFAULT_MODEL: &str = "llava";

/// Vision models the analyzer knows how to talk to by their short name.
pub const KNOWN_VISION_MODELS: [&str; 3] = ["llava", "bakllava", "moondream"];

const DEFAULT_TAG: &str = "latest";

/// Canonicalizes a model name to the identifier the backend registers.
///
/// Known short names get the `:latest` tag; anything else (already tagged or a
/// model this crate does not know about) is passed through unchanged.
pub fn normalize_model_name(name: &str) -> String {
    let name = name.trim();
    if KNOWN_VISION_MODELS.contains(&name) {
        format!("{name}:{DEFAULT_TAG}")
    } else {
        name.to_string()
    }
}

pub fn is_vision_model(name: &str) -> bool {
    let name = name.to_lowercase();
    KNOWN_VISION_MODELS.iter().any(|known| name.contains(known))
}

/// Keeps only the vision-capable models out of the backend's model list.
pub fn vision_models(names: impl IntoIterator<Item = String>) -> Vec<String> {
    names.into_iter().filter(|name| is_vision_model(name)).collect()
}

/// Model list offered when the backend cannot be asked.
pub fn fallback_models() -> Vec<String> {
    KNOWN_VISION_MODELS.iter().map(|name| name.to_string()).collect()
}
