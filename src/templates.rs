//! Files written into generated projects, embedded at build time.
//!
//! Placeholders use `{{name}}` and are filled by [`render`].

pub const STARTER_MAIN_C: &str = include_str!("../templates/starter/main.c");
pub const STARTER_HDR_ASM: &str = include_str!("../templates/starter/hdr.asm");
pub const STARTER_DATA_ASM: &str = include_str!("../templates/starter/data.asm");
pub const STARTER_MAKEFILE: &str = include_str!("../templates/starter/Makefile");
pub const STARTER_GITIGNORE: &str = include_str!("../templates/starter/gitignore");
pub const VSCODE_TASKS_JSON: &str = include_str!("../templates/integration/tasks.json");
pub const VSCODE_CPP_PROPERTIES_JSON: &str =
    include_str!("../templates/integration/c_cpp_properties.json");
pub const CI_WORKFLOW_YML: &str = include_str!("../templates/integration/build.yml");

/// Replace every `{{key}}` with its value. Unknown placeholders stay as-is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{{{key}}}}}"), value)
        })
}
