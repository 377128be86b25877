use std::path::{Path, PathBuf};

use assetkiln::config::{ConfigFile, RawConfigFile, load_and_validate, load_or_default};
use assetkiln::errors::KilnError;
use assetkiln::types::{AssetClass, SourceMapMode};
use assetkiln_test_utils::builders::ConfigFileBuilder;
use assetkiln_test_utils::fixtures::write_file;

fn parse(toml_src: &str) -> Result<ConfigFile, KilnError> {
    let raw: RawConfigFile = toml::from_str(toml_src)?;
    ConfigFile::try_from(raw)
}

fn config_error(toml_src: &str) -> String {
    match parse(toml_src) {
        Err(KilnError::ConfigError(msg)) => msg,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn test_defaults_describe_src_to_dist_layout() {
    let cfg = ConfigFileBuilder::new().build_at("/project");

    assert_eq!(cfg.output_root(), PathBuf::from("dist"));
    assert_eq!(cfg.source_maps(), SourceMapMode::Inline);
    assert_eq!(cfg.root(), Path::new("/project"));

    let specs = cfg.path_specs();
    let classes: Vec<AssetClass> = specs.iter().map(|s| s.class).collect();
    assert_eq!(
        classes,
        vec![
            AssetClass::Markup,
            AssetClass::Script,
            AssetClass::Styles,
            AssetClass::Images
        ]
    );

    let html = cfg.html_paths();
    assert_eq!(html.entry_patterns(), ["src/*.html".to_string()]);
    assert_eq!(html.watch_patterns(), ["src/**/*.html".to_string()]);

    let js = cfg.js_paths();
    assert_eq!(js.entry_patterns(), ["src/**/*.js".to_string()]);
    assert_eq!(cfg.js().bundle, "main.min.js");
    assert_eq!(cfg.js().transpile, None);

    assert_eq!(
        cfg.styles_paths().entry_patterns(),
        ["src/scss/style.scss".to_string()]
    );
    assert_eq!(cfg.styles().level, 2);

    assert_eq!(cfg.images_paths().dest, PathBuf::from("dist/img"));
    assert_eq!(cfg.images().avif_speed, 6);
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let cfg = parse(
        r#"
        [config]
        source_maps = "file"

        [js]
        src = ["assets/js/**/*.js"]
        transpile = "npx babel"

        [images]
        webp_quality = 60
        "#,
    )
    .unwrap();

    assert_eq!(cfg.source_maps(), SourceMapMode::File);
    assert_eq!(cfg.js().src, vec!["assets/js/**/*.js".to_string()]);
    assert_eq!(cfg.js().transpile.as_deref(), Some("npx babel"));
    assert_eq!(cfg.images().webp_quality, 60);
    assert_eq!(cfg.images().jpeg_quality, 75);
    assert_eq!(cfg.html().suffix, ".min");
}

#[test]
fn test_unknown_fields_are_rejected() {
    let err = parse("[js]\nsources = [\"src/*.js\"]\n").unwrap_err();
    assert!(matches!(err, KilnError::TomlError(_)), "got {err:?}");

    let err = parse("[fonts]\nsrc = []\n").unwrap_err();
    assert!(matches!(err, KilnError::TomlError(_)), "got {err:?}");
}

#[test]
fn test_bad_source_map_mode_is_rejected() {
    let err = parse("[config]\nsource_maps = \"external\"\n").unwrap_err();
    assert!(matches!(err, KilnError::TomlError(_)));
    assert_eq!("FILE".parse::<SourceMapMode>(), Ok(SourceMapMode::File));
    assert!("external".parse::<SourceMapMode>().is_err());
}

#[test]
fn test_destination_outside_output_root() {
    let msg = config_error("[styles]\ndest = \"build/css\"\n");
    assert!(msg.contains("styles.dest"), "got {msg}");

    let msg = config_error("[config]\noutput_root = \"public\"\n");
    assert!(msg.contains("must lie inside output_root"), "got {msg}");
}

#[test]
fn test_output_root_must_stay_inside_project() {
    assert!(config_error("[config]\noutput_root = \".\"\n").contains("output_root"));
    assert!(config_error("[config]\noutput_root = \"../dist\"\n").contains("'..'"));
}

#[test]
fn test_images_dest_cannot_be_the_output_root() {
    let msg = config_error("[images]\ndest = \"dist/\"\n");
    assert!(msg.contains("subdirectory"), "got {msg}");
}

#[test]
fn test_invalid_and_empty_patterns() {
    let msg = config_error("[js]\nsrc = [\"src/[js\"]\n");
    assert!(msg.contains("js.src"), "got {msg}");

    let msg = config_error("[images]\nsrc = []\n");
    assert!(msg.contains("at least one pattern"), "got {msg}");
}

#[test]
fn test_bundle_must_be_a_plain_name() {
    let msg = config_error("[js]\nbundle = \"js/main.min.js\"\n");
    assert!(msg.contains("js.bundle"), "got {msg}");
}

#[test]
fn test_encoder_settings_are_range_checked() {
    assert!(config_error("[images]\njpeg_quality = 0\n").contains("jpeg_quality"));
    assert!(config_error("[images]\navif_quality = 101\n").contains("avif_quality"));
    assert!(config_error("[images]\navif_speed = 11\n").contains("avif_speed"));
    assert!(config_error("[styles]\nlevel = 3\n").contains("styles.level"));
    assert!(config_error("[js]\ntranspile = \"  \"\n").contains("transpile"));
}

#[test]
fn test_load_anchors_root_at_config_directory() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(
        tmp.path(),
        "site/Assetkiln.toml",
        "[styles]\nlevel = 1\n",
    )
    .unwrap();

    let cfg = load_and_validate(tmp.path().join("site/Assetkiln.toml")).unwrap();
    assert_eq!(cfg.root(), tmp.path().join("site"));
    assert_eq!(cfg.styles().level, 1);
}

#[test]
fn test_missing_default_config_falls_back_but_explicit_path_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Assetkiln.toml");

    let cfg = load_or_default(&path, false).unwrap();
    assert_eq!(cfg.root(), tmp.path());
    assert_eq!(cfg.output_root(), PathBuf::from("dist"));

    let err = load_or_default(&path, true).unwrap_err();
    assert!(matches!(err, KilnError::IoError(_)), "got {err:?}");
}
