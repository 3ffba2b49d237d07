use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::FluentResource;
use std::collections::HashMap;
use std::fs;
use std::sync::{LazyLock, Mutex};
use unic_langid::LanguageIdentifier;
use anyhow::Result;

/// Locale used when the incoming message carries no usable language code.
/// The bot's audience is Russian-speaking, so replies default to Russian.
const DEFAULT_LOCALE: &str = "ru";
const SUPPORTED_LOCALES: &[&str] = &["ru", "en"];

/// Localization manager for the bot replies
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with all supported bundles
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for locale in SUPPORTED_LOCALES {
            let langid: LanguageIdentifier = locale.parse()?;
            let bundle = Self::create_bundle(&langid)?;
            bundles.insert((*locale).to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);

        // Load the main resource file
        let resource_path = format!("./locales/{}/main.ftl", locale);
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    /// Map a Telegram language code to a supported bundle key
    fn resolve_locale(language_code: Option<&str>) -> &'static str {
        language_code
            .and_then(|code| code.split('-').next())
            .and_then(|prefix| SUPPORTED_LOCALES.iter().find(|l| **l == prefix))
            .copied()
            .unwrap_or(DEFAULT_LOCALE)
    }

    /// Get a localized message
    pub fn get_message(
        &self,
        key: &str,
        language_code: Option<&str>,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let locale = Self::resolve_locale(language_code);
        let bundle = match self.bundles.get(locale) {
            Some(bundle) => bundle,
            None => return format!("Missing locale: {}", locale),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();

        if let Some(args) = args {
            let fluent_args = fluent_bundle::FluentArgs::from_iter(
                args.iter()
                    .map(|(k, v)| (*k, fluent_bundle::FluentValue::from(*v))),
            );

            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }
}

/// Global localization instance. FluentBundle is not Sync, so access goes
/// through a mutex.
static LOCALIZATION_MANAGER: LazyLock<Mutex<LocalizationManager>> = LazyLock::new(|| {
    Mutex::new(LocalizationManager::new().expect("Failed to load localization bundles"))
});

/// Get a localized message for the given Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    LOCALIZATION_MANAGER
        .lock()
        .unwrap()
        .get_message(key, language_code, None)
}

/// Get a localized message with arguments for the given language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    LOCALIZATION_MANAGER
        .lock()
        .unwrap()
        .get_message(key, language_code, Some(&args_map))
}
