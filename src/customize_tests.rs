use super::{customize, unknown_override_names};
use crate::catalog::{self, default_catalog, param};
use crate::provision::{Params, RunRequest};
use serde_json::json;
use std::path::PathBuf;

fn request() -> RunRequest {
    RunRequest::new(
        "hello_world",
        PathBuf::from("/opt/pvsneslib"),
        PathBuf::from("/home/dev/projects"),
    )
}

fn names(catalog: &crate::provision::Catalog) -> Vec<String> {
    catalog.steps().iter().map(|s| s.name.clone()).collect()
}

#[test]
fn customize_is_pure_and_repeatable() {
    let base = default_catalog();
    let snapshot = base.clone();
    let mut request = request();
    request.skip_ci = true;
    request.version = "4.2.0".to_string();

    let first = customize(&base, &request);
    let second = customize(&base, &request);

    assert_eq!(first, second);
    assert_eq!(base, snapshot);
    assert_ne!(first, base);
}

#[test]
fn request_values_are_merged_into_matching_steps() {
    let mut request = request();
    request.version = "4.2.0".to_string();
    request.offline_source = Some(PathBuf::from("/mnt/usb/pvsneslib_420.zip"));
    request.force_reinstall = true;

    let customized = customize(&default_catalog(), &request);
    let install = customized.get(catalog::INSTALL_SDK).expect("install step");
    assert_eq!(install.parameters[param::VERSION], json!("4.2.0"));
    assert_eq!(
        install.parameters[param::OFFLINE_SOURCE],
        json!("/mnt/usb/pvsneslib_420.zip")
    );
    assert_eq!(install.parameters[param::ARCHIVE_TOOL], json!("unzip"));
    assert_eq!(install.parameters[param::OVERWRITE], json!(true));
    assert_eq!(
        install.parameters[param::SDK_ROOT],
        json!("/opt/pvsneslib/pvsneslib")
    );

    let project = customized.get(catalog::CREATE_PROJECT).expect("project step");
    assert_eq!(
        project.parameters[param::PROJECT_DIR],
        json!("/home/dev/projects/hello_world")
    );
}

#[test]
fn offline_directory_needs_no_archive_tool() {
    let mut request = request();
    request.offline_source = Some(PathBuf::from("/mnt/usb/pvsneslib"));

    let customized = customize(&default_catalog(), &request);
    let host = customized.get(catalog::CHECK_HOST).expect("host step");
    assert!(host.parameters[param::ARCHIVE_TOOL].is_null());

    request.offline_source = Some(PathBuf::from("/mnt/usb/pvsneslib.tar.gz"));
    let customized = customize(&default_catalog(), &request);
    let host = customized.get(catalog::CHECK_HOST).expect("host step");
    assert_eq!(host.parameters[param::ARCHIVE_TOOL], json!("tar"));
}

#[test]
fn skipping_one_feature_demotes_integration_step() {
    let mut request = request();
    request.skip_ide = true;

    let customized = customize(&default_catalog(), &request);
    let step = customized.get(catalog::INTEGRATE_IDE).expect("integration step");
    assert!(!step.required);
    assert_eq!(step.parameters[param::IDE], json!(false));
    assert_eq!(step.parameters[param::CI], json!(true));
    assert_eq!(customized.len(), default_catalog().len());
}

#[test]
fn skipping_every_feature_drops_steps_without_reordering() {
    let mut request = request();
    request.skip_ide = true;
    request.skip_ci = true;
    request.skip_project = true;

    let customized = customize(&default_catalog(), &request);
    assert_eq!(
        names(&customized),
        vec![
            catalog::CHECK_HOST,
            catalog::INSTALL_SDK,
            catalog::VALIDATE_INSTALL,
            catalog::CONFIGURE_TOOLCHAIN
        ]
    );
}

#[test]
fn overrides_apply_by_name_and_unknown_names_are_ignored() {
    let mut request = request();
    let mut install = Params::new();
    install.insert(
        param::DOWNLOAD_URL.to_string(),
        json!("https://mirror.example/{version}.zip"),
    );
    request
        .step_params
        .insert(catalog::INSTALL_SDK.to_string(), install);
    let mut future = Params::new();
    future.insert("flavour".to_string(), json!("nightly"));
    request
        .step_params
        .insert("install_audio_tools".to_string(), future);

    let base = default_catalog();
    let customized = customize(&base, &request);

    assert_eq!(names(&customized), names(&base));
    let step = customized.get(catalog::INSTALL_SDK).expect("install step");
    assert_eq!(
        step.parameters[param::DOWNLOAD_URL],
        json!("https://mirror.example/{version}.zip")
    );
    assert_eq!(
        unknown_override_names(&customized, &request),
        vec!["install_audio_tools"]
    );
}
