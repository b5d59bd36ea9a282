//! Internationalization (i18n) support
//!
//! Labels for `pt-BR` and `en` are built in. A site can add or override
//! languages with YAML files in its `languages/` directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN: [(&str, &str); 2] = [
    ("pt-BR", include_str!("languages/pt-BR.yml")),
    ("en", include_str!("languages/en.yml")),
];

/// Internationalization handler
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            match serde_yaml::from_str(source) {
                Ok(data) => {
                    translations.insert(lang.to_string(), data);
                }
                Err(e) => tracing::warn!("Invalid built-in language {}: {}", lang, e),
            }
        }

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language files from a directory, overriding built-in keys
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    self.translations
                        .entry(lang.to_string())
                        .or_default()
                        .extend(data);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// All translations for the current language as a flat map, with
    /// missing keys filled from the fallbacks
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();

        for lang in self.lookup_chain() {
            if let Some(data) = self.translations.get(&lang) {
                let mut flat = HashMap::new();
                flatten_translations(data, "", &mut flat);
                for (k, v) in flat {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }

    /// Exact language, then its base language (`pt` for `pt-BR`) or a
    /// regional variant sharing it, then English
    fn lookup_chain(&self) -> Vec<String> {
        let mut chain = vec![self.language.clone()];

        let base = self
            .language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut variants: Vec<&String> = self
            .translations
            .keys()
            .filter(|k| {
                k.split(['-', '_'])
                    .next()
                    .is_some_and(|b| b.eq_ignore_ascii_case(&base))
            })
            .collect();
        variants.sort();
        for variant in variants {
            if !chain.contains(variant) {
                chain.push(variant.clone());
            }
        }

        if !chain.iter().any(|l| l == "en") {
            chain.push("en".to_string());
        }
        chain
    }
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

/// Flatten translations into a HashMap with dot-notation keys
fn flatten_translations(
    data: &HashMap<String, serde_yaml::Value>,
    prefix: &str,
    result: &mut HashMap<String, String>,
) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                let nested: HashMap<String, serde_yaml::Value> = map
                    .iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            other => {
                result.insert(full_key, yaml_value_to_string(other));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(i18n: &I18n, key: &str) -> Option<String> {
        i18n.get_all_translations().remove(key)
    }

    #[test]
    fn test_builtin_portuguese() {
        let i18n = I18n::new("pt-BR");
        assert_eq!(label(&i18n, "previous_post").as_deref(), Some("Post anterior"));
        assert_eq!(
            label(&i18n, "not_found.back").as_deref(),
            Some("Voltar para a home")
        );
        assert_eq!(label(&i18n, "unknown"), None);
    }

    #[test]
    fn test_base_language_and_english_fallback() {
        let i18n = I18n::new("pt");
        assert_eq!(label(&i18n, "exit_preview").as_deref(), Some("Sair do modo Preview"));

        let i18n = I18n::new("de");
        assert_eq!(label(&i18n, "exit_preview").as_deref(), Some("Exit preview mode"));
    }

    #[test]
    fn test_get_all_translations_is_flat() {
        let i18n = I18n::new("en");
        let all = i18n.get_all_translations();
        assert_eq!(all.get("next_post").map(String::as_str), Some("Next post"));
        assert_eq!(
            all.get("error.title").map(String::as_str),
            Some("Something went wrong")
        );
    }

    #[test]
    fn test_site_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.yml"), "next_post: Onwards\n").unwrap();

        let mut i18n = I18n::new("en");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(label(&i18n, "next_post").as_deref(), Some("Onwards"));
        assert_eq!(label(&i18n, "previous_post").as_deref(), Some("Previous post"));
    }
}
