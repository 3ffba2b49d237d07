use anyhow::Result;

use kcal_bot::localization::{t_args_lang, t_lang};

/// Russian is the default reply language
#[test]
fn test_defaults_to_russian() -> Result<()> {
    let text = t_lang("send-photo-prompt", None);
    assert!(text.contains("фото"));

    Ok(())
}

/// An English language code selects the English bundle
#[test]
fn test_english_bundle_selected_by_code() -> Result<()> {
    let text = t_lang("send-photo-prompt", Some("en"));
    assert!(text.contains("photo"));

    // Regioned codes resolve by prefix
    let text = t_lang("send-photo-prompt", Some("en-US"));
    assert!(text.contains("photo"));

    Ok(())
}

/// Unsupported languages fall back to the default bundle
#[test]
fn test_unsupported_language_falls_back() -> Result<()> {
    let text = t_lang("send-photo-prompt", Some("de"));
    assert!(text.contains("фото"));

    Ok(())
}

/// Arguments are interpolated into the pattern
#[test]
fn test_argument_interpolation() -> Result<()> {
    let text = t_args_lang("weight-saved-shortcut", &[("target", "2352")], Some("en"));
    assert!(text.contains("2352"));

    let text = t_args_lang(
        "stats-summary",
        &[
            ("free", "2"),
            ("limit", "5"),
            ("credits", "0"),
            ("consumed", "800"),
        ],
        None,
    );
    assert!(text.contains('2'));
    assert!(text.contains("800"));

    Ok(())
}

/// Missing keys degrade to a diagnostic string instead of panicking
#[test]
fn test_missing_key_is_non_fatal() -> Result<()> {
    let text = t_lang("no-such-key", None);
    assert!(text.contains("no-such-key"));

    Ok(())
}
