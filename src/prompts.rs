pub const GENERATE: &str = include_str!("../data/prompts/generate.txt");
pub const GAP_CHECK: &str = include_str!("../data/prompts/gap_check.txt");
pub const REFINE: &str = include_str!("../data/prompts/refine.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
