// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{KilnError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = KilnError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_output_root(cfg)?;
    validate_patterns(cfg)?;
    validate_destinations(cfg)?;
    validate_bundles(cfg)?;
    validate_levels(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> KilnError {
    KilnError::ConfigError(msg.into())
}

fn validate_output_root(cfg: &RawConfigFile) -> Result<()> {
    let root = normalize(&cfg.config.output_root);

    // The clean stage deletes everything under this directory, so it must
    // never resolve to the project itself or escape it.
    if root.as_os_str().is_empty() {
        return Err(config_error(format!(
            "[config].output_root must name a directory inside the project (got {:?})",
            cfg.config.output_root
        )));
    }
    let path = Path::new(&cfg.config.output_root);
    if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
        return Err(config_error(format!(
            "[config].output_root must be a relative path without '..' (got {:?})",
            cfg.config.output_root
        )));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let groups: [(&str, &[String]); 5] = [
        ("html.src", &cfg.html.src),
        ("html.main", &cfg.html.main),
        ("js.src", &cfg.js.src),
        ("styles.src", &cfg.styles.src),
        ("images.src", &cfg.images.src),
    ];

    for (key, patterns) in groups {
        check_pattern_list(key, patterns)?;
    }
    if let Some(main) = &cfg.js.main {
        check_pattern_list("js.main", main)?;
    }
    if let Some(main) = &cfg.styles.main {
        check_pattern_list("styles.main", main)?;
    }
    Ok(())
}

fn check_pattern_list(key: &str, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(config_error(format!("[{key}] must list at least one pattern")));
    }
    build_globset(patterns).map_err(|e| config_error(format!("[{key}] {e:#}")))?;
    Ok(())
}

fn validate_destinations(cfg: &RawConfigFile) -> Result<()> {
    let root = normalize(&cfg.config.output_root);

    let dests = [
        ("html.dest", &cfg.html.dest),
        ("js.dest", &cfg.js.dest),
        ("styles.dest", &cfg.styles.dest),
        ("images.dest", &cfg.images.dest),
    ];

    for (key, dest) in dests {
        let dest_path = normalize(dest);
        if !dest_path.starts_with(&root) {
            return Err(config_error(format!(
                "[{key}] = {dest:?} must lie inside output_root {:?}",
                cfg.config.output_root
            )));
        }
    }

    if normalize(&cfg.images.dest) == root {
        return Err(config_error(
            "[images].dest must be a subdirectory of output_root, since clean preserves it",
        ));
    }
    Ok(())
}

fn validate_bundles(cfg: &RawConfigFile) -> Result<()> {
    for (key, name) in [("js.bundle", &cfg.js.bundle), ("styles.bundle", &cfg.styles.bundle)] {
        let mut components = Path::new(name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain {
            return Err(config_error(format!(
                "[{key}] must be a plain file name (got {name:?})"
            )));
        }
    }
    if let Some(cmd) = &cfg.js.transpile {
        if cmd.trim().is_empty() {
            return Err(config_error("[js].transpile must not be empty when set"));
        }
    }
    Ok(())
}

fn validate_levels(cfg: &RawConfigFile) -> Result<()> {
    let qualities = [
        ("images.jpeg_quality", cfg.images.jpeg_quality),
        ("images.webp_quality", cfg.images.webp_quality),
        ("images.avif_quality", cfg.images.avif_quality),
    ];
    for (key, q) in qualities {
        if !(1..=100).contains(&q) {
            return Err(config_error(format!("[{key}] must be in 1..=100 (got {q})")));
        }
    }

    if !(1..=10).contains(&cfg.images.avif_speed) {
        return Err(config_error(format!(
            "[images.avif_speed] must be in 1..=10 (got {})",
            cfg.images.avif_speed
        )));
    }

    if cfg.styles.level > 2 {
        return Err(config_error(format!(
            "[styles.level] must be 0, 1 or 2 (got {})",
            cfg.styles.level
        )));
    }
    Ok(())
}

/// Lexically normalize a project-relative path: drop `.` components and
/// trailing separators so `"dist/"`, `"./dist"` and `"dist"` compare equal.
fn normalize(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
