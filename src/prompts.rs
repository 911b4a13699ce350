pub const PALM_DEFAULT_INPUT: &str = include_str!("../data/prompts/palm_default_input.txt");
pub const TRANSLATE_TO_EN: &str = include_str!("../data/prompts/translate_to_en.txt");
pub const TRANSLATE_TO_ZH: &str = include_str!("../data/prompts/translate_to_zh.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
