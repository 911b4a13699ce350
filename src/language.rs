//! Coarse language identification and the user-facing strings that depend on it.
//!
//! Detection is a binary script test: any CJK ideograph makes a text Chinese,
//! everything else is treated as English. Mixed-language answers are therefore
//! classified as Chinese.

use crate::models::Locale;
use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    /// Tag the workflow expects in its `Language` parameter.
    pub fn workflow_tag(&self) -> &'static str {
        match self {
            Language::Chinese => "中文",
            Language::English => "英文",
        }
    }
}

impl From<Locale> for Language {
    fn from(locale: Locale) -> Self {
        match locale {
            Locale::Zh => Language::Chinese,
            Locale::En => Language::English,
        }
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F
    )
}

pub fn detect(text: &str) -> Language {
    if text.chars().any(is_cjk_ideograph) {
        Language::Chinese
    } else {
        Language::English
    }
}

pub fn service_busy(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "服务繁忙，请稍后再试。",
        Locale::En => "The service is busy right now. Please try again later.",
    }
}

pub fn request_failed(locale: Locale, detail: &str) -> String {
    let template = match locale {
        Locale::Zh => "请求失败：{{detail}}",
        Locale::En => "Request failed: {{detail}}",
    };
    prompts::render(template, &[("detail", detail)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_chinese() {
        assert_eq!(detect("你好"), Language::Chinese);
    }

    #[test]
    fn test_detect_english() {
        assert_eq!(detect("Your life line is long."), Language::English);
        assert_eq!(detect(""), Language::English);
    }

    #[test]
    fn test_mixed_text_counts_as_chinese() {
        assert_eq!(detect("Heart line 感情线 is deep"), Language::Chinese);
    }

    #[test]
    fn test_kana_and_fullwidth_punctuation_are_not_ideographs() {
        assert_eq!(detect("ひらがな，。"), Language::English);
    }

    #[test]
    fn test_extension_b_ideograph() {
        assert_eq!(detect("\u{20021}"), Language::Chinese);
    }

    #[test]
    fn test_locale_maps_to_language() {
        assert_eq!(Language::from(Locale::Zh), Language::Chinese);
        assert_eq!(Language::from(Locale::En), Language::English);
        assert_eq!(Language::Chinese.workflow_tag(), "中文");
        assert_eq!(Language::English.workflow_tag(), "英文");
    }

    #[test]
    fn test_localized_strings_match_their_locale() {
        assert_eq!(detect(service_busy(Locale::Zh)), Language::Chinese);
        assert_eq!(detect(service_busy(Locale::En)), Language::English);
        assert_eq!(
            request_failed(Locale::En, "COZE_API_KEY is not set"),
            "Request failed: COZE_API_KEY is not set"
        );
    }
}
