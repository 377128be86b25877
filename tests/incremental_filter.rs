use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use assetkiln::config::PathSpec;
use assetkiln::fs::{FileSystem, MockFileSystem, RealFileSystem};
use assetkiln::pipeline::{
    FileItem, FileItems, IncrementalFilter, IncrementalStage, Pipeline, RunStats, Stage,
};
use assetkiln::types::AssetClass;
use assetkiln_test_utils::fixtures::write_file;

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_is_stale_against_mock_times() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/p/src/img/old.jpg", "a", at(100));
    fs.add_file_at("/p/dist/img/old.jpg", "a", at(200));
    fs.add_file_at("/p/src/img/new.jpg", "b", at(300));
    fs.add_file_at("/p/dist/img/new.jpg", "b", at(200));
    fs.add_file_at("/p/src/img/same.jpg", "c", at(200));
    fs.add_file_at("/p/dist/img/same.jpg", "c", at(200));
    fs.add_file_at("/p/src/img/fresh.jpg", "d", at(50));

    let filter = IncrementalFilter::new(Arc::new(fs));
    let dest = Path::new("/p/dist/img");

    assert!(!filter.is_stale(Path::new("/p/src/img/old.jpg"), dest).unwrap());
    assert!(filter.is_stale(Path::new("/p/src/img/new.jpg"), dest).unwrap());
    assert!(!filter.is_stale(Path::new("/p/src/img/same.jpg"), dest).unwrap());
    assert!(filter.is_stale(Path::new("/p/src/img/fresh.jpg"), dest).unwrap());
}

#[test]
fn test_is_stale_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_file(root, "src/photo.png", "in").unwrap();
    write_file(root, "out/photo.png", "out").unwrap();

    let base = SystemTime::now() - Duration::from_secs(3600);
    File::options()
        .write(true)
        .open(root.join("src/photo.png"))
        .unwrap()
        .set_modified(base)
        .unwrap();
    File::options()
        .write(true)
        .open(root.join("out/photo.png"))
        .unwrap()
        .set_modified(base + Duration::from_secs(60))
        .unwrap();

    let filter = IncrementalFilter::new(Arc::new(RealFileSystem));
    assert!(!filter.is_stale(&root.join("src/photo.png"), &root.join("out")).unwrap());

    File::options()
        .write(true)
        .open(root.join("src/photo.png"))
        .unwrap()
        .set_modified(base + Duration::from_secs(120))
        .unwrap();
    assert!(filter.is_stale(&root.join("src/photo.png"), &root.join("out")).unwrap());
}

#[test]
fn test_stage_checks_the_output_extension_it_will_produce() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/p/src/img/a.jpg", "a", at(100));
    fs.add_file_at("/p/src/img/b.jpg", "b", at(100));
    // a.jpg already has a newer WebP; b.jpg only has a same-name JPEG.
    fs.add_file_at("/p/dist/img/a.webp", "old-webp", at(200));
    fs.add_file_at("/p/dist/img/b.jpg", "old-jpg", at(200));

    let spec = PathSpec {
        class: AssetClass::Images,
        src: vec!["src/img/**/*".to_string()],
        main: None,
        dest: PathBuf::from("dist/img"),
    };
    let fs_arc = Arc::new(fs.clone());
    let pipeline = Pipeline::new("images-webp", "/p", spec, fs_arc.clone())
        .stage(IncrementalStage::new(fs_arc, "/p/dist/img").with_extension("webp"));

    let summary = pipeline.run().unwrap();

    assert_eq!(summary.read, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.written, 1);
    // No encoder stage here: the surviving item is written under its own name.
    assert_eq!(fs.read_to_string(Path::new("/p/dist/img/b.jpg")).unwrap(), "b");
    assert_eq!(
        fs.read_to_string(Path::new("/p/dist/img/a.webp")).unwrap(),
        "old-webp"
    );
}

fn items(paths: &[&str]) -> FileItems {
    let items: Vec<_> = paths
        .iter()
        .map(|p| Ok(FileItem::new(PathBuf::from(p), PathBuf::from("/p/src/img"), Vec::new())))
        .collect();
    Box::new(items.into_iter())
}

#[test]
fn test_overlapping_runs_count_their_own_skips() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/p/src/img/old.jpg", "a", at(100));
    fs.add_file_at("/p/dist/img/old.jpg", "a", at(200));
    fs.add_file_at("/p/src/img/new.jpg", "b", at(300));

    let stage = Arc::new(IncrementalStage::new(Arc::new(fs), "/p/dist/img"));
    let first_stats = RunStats::new();
    let second_stats = RunStats::new();
    let mut first = Arc::clone(&stage).apply(
        items(&["/p/src/img/new.jpg", "/p/src/img/old.jpg"]),
        &first_stats,
    );
    let mut second = Arc::clone(&stage).apply(
        items(&["/p/src/img/old.jpg", "/p/src/img/old.jpg", "/p/src/img/new.jpg"]),
        &second_stats,
    );

    // Pull the two runs alternately, as two concurrent rebuilds would.
    let mut first_out = Vec::new();
    let mut second_out = Vec::new();
    loop {
        let a = first.next();
        let b = second.next();
        if a.is_none() && b.is_none() {
            break;
        }
        first_out.extend(a.map(|r| r.unwrap().origin));
        second_out.extend(b.map(|r| r.unwrap().origin));
    }

    assert_eq!(first_out, vec![PathBuf::from("/p/src/img/new.jpg")]);
    assert_eq!(second_out, vec![PathBuf::from("/p/src/img/new.jpg")]);
    assert_eq!(first_stats.skipped(), 1);
    assert_eq!(second_stats.skipped(), 2);
}
