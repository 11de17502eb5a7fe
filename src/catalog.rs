//! The static provisioning catalog.
//!
//! Order is the dependency order. New steps are appended; renaming or
//! removing an entry orphans names already persisted in run state.
use crate::provision::{Catalog, OperationRef, StepDefinition};
use serde_json::json;

pub const CHECK_HOST: &str = "check_host";
pub const INSTALL_SDK: &str = "install_sdk";
pub const VALIDATE_INSTALL: &str = "validate_install";
pub const CONFIGURE_TOOLCHAIN: &str = "configure_toolchain";
pub const INTEGRATE_IDE: &str = "integrate_ide";
pub const CREATE_PROJECT: &str = "create_project";

/// Parameter keys shared by the customizer and the collaborators.
pub mod param {
    pub const INSTALL_PREFIX: &str = "install_prefix";
    pub const SDK_ROOT: &str = "sdk_root";
    pub const VERSION: &str = "version";
    pub const DOWNLOAD_URL: &str = "download_url";
    pub const OFFLINE_SOURCE: &str = "offline_source";
    pub const ARCHIVE_TOOL: &str = "archive_tool";
    pub const OVERWRITE: &str = "overwrite";
    pub const REQUIRED_TOOLS: &str = "required_tools";
    pub const EXPECTED_PATHS: &str = "expected_paths";
    pub const EXPECTED_TOOLS: &str = "expected_tools";
    pub const ENVIRONMENT_FILE: &str = "environment_file";
    pub const UPDATE_SHELL_PROFILE: &str = "update_shell_profile";
    pub const NON_INTERACTIVE: &str = "non_interactive";
    pub const PROJECT_DIR: &str = "project_dir";
    pub const PROJECT_NAME: &str = "project_name";
    pub const IDE: &str = "ide";
    pub const CI: &str = "ci";
}

/// Paths every PVSnesLib release ships, relative to the SDK root.
pub const SDK_EXPECTED_PATHS: [&str; 5] = [
    "devkitsnes/bin",
    "devkitsnes/snes_rules",
    "pvsneslib/include/snes.h",
    "pvsneslib/lib",
    "tools",
];

/// Toolchain binaries that must be executable after install.
pub const SDK_EXPECTED_TOOLS: [&str; 3] = [
    "devkitsnes/bin/816-tcc",
    "devkitsnes/bin/wla-65816",
    "devkitsnes/bin/wlalink",
];

/// Build the default catalog with default parameters.
pub fn default_catalog() -> Catalog {
    Catalog::new(vec![
        StepDefinition::new(
            CHECK_HOST,
            "Check host compatibility",
            true,
            OperationRef::CheckHost,
        )
        .with_param(param::REQUIRED_TOOLS, json!(["make"])),
        StepDefinition::new(
            INSTALL_SDK,
            "Install the PVSnesLib SDK",
            true,
            OperationRef::InstallSdk,
        ),
        StepDefinition::new(
            VALIDATE_INSTALL,
            "Validate the SDK installation",
            true,
            OperationRef::ValidateInstall,
        )
        .with_param(param::EXPECTED_PATHS, json!(SDK_EXPECTED_PATHS))
        .with_param(param::EXPECTED_TOOLS, json!(SDK_EXPECTED_TOOLS)),
        StepDefinition::new(
            CONFIGURE_TOOLCHAIN,
            "Configure the toolchain environment",
            true,
            OperationRef::ConfigureToolchain,
        ),
        StepDefinition::new(
            INTEGRATE_IDE,
            "Add VS Code and CI integration",
            true,
            OperationRef::IntegrateIde,
        )
        .with_param(param::IDE, json!(true))
        .with_param(param::CI, json!(true)),
        StepDefinition::new(
            CREATE_PROJECT,
            "Create the starter project",
            true,
            OperationRef::CreateProject,
        ),
    ])
}
