use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use assetkiln::config::PathSpec;
use assetkiln::fs::{FileSystem, MockFileSystem};
use assetkiln::pipeline::{FileItem, Pipeline, Stage, StageError};
use assetkiln::stages::{
    AvifStage, CommentStyle, ConcatStage, CssMinifyStage, HtmlMinifyStage, IncludeStage,
    JsMinifyStage, PrefixStage, ReencodeStage, RenameStage, SassStage, SourceMapBegin,
    SourceMapEnd, WebpStage,
};
use assetkiln::types::{AssetClass, SourceMapMode};
use assetkiln_test_utils::fixtures::sample_jpeg;
use assetkiln_test_utils::init_tracing;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

fn spec(class: AssetClass, src: &str, dest: &str) -> PathSpec {
    PathSpec {
        class,
        src: vec![src.to_string()],
        main: None,
        dest: PathBuf::from(dest),
    }
}

fn read(fs: &MockFileSystem, path: &str) -> String {
    fs.read_to_string(Path::new(path)).unwrap()
}

fn item(origin: &str, base: &str, contents: &str) -> FileItem {
    FileItem::new(origin.into(), base.into(), contents.as_bytes().to_vec())
}

/// Uppercases text; fails on files containing "bad", aborts on "fatal".
struct Shout;

impl Stage for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let text = item.text().map_err(|e| StageError::warning("shout", &item, e))?;
        if text.contains("fatal") {
            return Err(StageError::fatal("shout", anyhow!("cannot continue")));
        }
        if text.contains("bad") {
            return Err(StageError::warning("shout", &item, "bad input"));
        }
        item.contents = text.to_uppercase().into_bytes();
        Ok(vec![item])
    }
}

#[test]
fn test_pipeline_preserves_relative_structure() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.txt", "a");
    fs.add_file("/p/src/nested/b.txt", "b");
    fs.add_file("/p/src/skip.md", "no");

    let summary = Pipeline::new(
        "text",
        "/p",
        spec(AssetClass::Markup, "src/**/*.txt", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(Shout)
    .run()
    .unwrap();

    assert_eq!(summary.read, 2);
    assert_eq!(summary.written, 2);
    assert_eq!(read(&fs, "/p/dist/a.txt"), "A");
    assert_eq!(read(&fs, "/p/dist/nested/b.txt"), "B");
    assert!(!fs.exists(Path::new("/p/dist/skip.md")));
}

#[test]
fn test_pipeline_with_no_matches_writes_nothing() {
    let fs = MockFileSystem::new();
    let summary = Pipeline::new(
        "text",
        "/p",
        spec(AssetClass::Markup, "src/**/*.txt", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(Shout)
    .run()
    .unwrap();

    assert_eq!(summary.written, 0);
    assert!(fs.files().is_empty());
}

#[test]
fn test_warning_drops_only_the_failing_item() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/good.txt", "good");
    fs.add_file("/p/src/bad.txt", "bad");

    let summary = Pipeline::new(
        "text",
        "/p",
        spec(AssetClass::Markup, "src/*.txt", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(Shout)
    .run()
    .unwrap();

    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(read(&fs, "/p/dist/good.txt"), "GOOD");
    assert!(!fs.exists(Path::new("/p/dist/bad.txt")));
}

#[test]
fn test_fatal_stage_error_names_task_and_stage() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/x.txt", "fatal");

    let err = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.txt", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(Shout)
    .run()
    .unwrap_err();

    assert_eq!(err.task, "js");
    assert_eq!(err.stage, "shout");
    assert!(err.to_string().contains("js pipeline failed in stage 'shout'"));
}

#[test]
fn test_source_map_stage_order_is_checked() {
    let fs = Arc::new(MockFileSystem::new());

    let end_first = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.js", "dist"),
        fs.clone(),
    )
    .stage(SourceMapEnd::new(SourceMapMode::Inline, CommentStyle::Js))
    .stage(SourceMapBegin::new())
    .run()
    .unwrap_err();
    assert_eq!(end_first.stage, "sourcemaps-write");

    let transform_after_end = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.js", "dist"),
        fs.clone(),
    )
    .stage(SourceMapBegin::new())
    .stage(SourceMapEnd::new(SourceMapMode::Inline, CommentStyle::Js))
    .stage(JsMinifyStage::new())
    .run()
    .unwrap_err();
    assert_eq!(transform_after_end.stage, "js-minify");

    let begin_after_transform = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.js", "dist"),
        fs,
    )
    .stage(JsMinifyStage::new())
    .stage(SourceMapBegin::new())
    .stage(SourceMapEnd::new(SourceMapMode::Inline, CommentStyle::Js))
    .run()
    .unwrap_err();
    assert_eq!(begin_after_transform.stage, "sourcemaps-init");
}

#[test]
fn test_dot_slash_patterns_match_like_plain_ones() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.txt", "a");
    fs.add_file("/p/src/nested/b.txt", "b");

    let summary = Pipeline::new(
        "text",
        "/p",
        spec(AssetClass::Markup, "./src/**/*.txt", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(Shout)
    .run()
    .unwrap();

    assert_eq!(summary.written, 2);
    assert_eq!(read(&fs, "/p/dist/a.txt"), "A");
    assert_eq!(read(&fs, "/p/dist/nested/b.txt"), "B");
}

#[test]
fn test_include_inlines_partials_with_parameters() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/p/src/partials/header.html",
        "<h1>@@title</h1>@@include('nav.html')",
    );
    fs.add_file("/p/src/partials/nav.html", "<nav>@@title nav</nav>");

    let stage = IncludeStage::new(Arc::new(fs));
    let out = stage
        .expand(
            r#"<body>@@include('partials/header.html', {"title": "Home"})</body>"#,
            Path::new("/p/src/index.html"),
        )
        .unwrap();

    assert_eq!(out, "<body><h1>Home</h1><nav>Home nav</nav></body>");
}

#[test]
fn test_include_cycle_and_missing_file_drop_the_page() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/loop.html", "@@include('partials/a.html')");
    fs.add_file("/p/src/partials/a.html", "@@include('b.html')");
    fs.add_file("/p/src/partials/b.html", "@@include('a.html')");
    fs.add_file("/p/src/missing.html", "@@include('nope.html')");
    fs.add_file("/p/src/ok.html", "<p>ok</p>");

    let fs_arc = Arc::new(fs.clone());
    let summary = Pipeline::new(
        "html",
        "/p",
        spec(AssetClass::Markup, "src/*.html", "dist"),
        fs_arc.clone(),
    )
    .stage(IncludeStage::new(fs_arc))
    .run()
    .unwrap();

    assert_eq!(summary.warnings, 2);
    assert_eq!(summary.written, 1);
    assert_eq!(read(&fs, "/p/dist/ok.html"), "<p>ok</p>");

    let err = IncludeStage::new(Arc::new(fs.clone()))
        .expand("@@include('partials/a.html')", Path::new("/p/src/loop.html"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("include cycle"));
}

#[test]
fn test_html_minify_and_rename() {
    let minified = HtmlMinifyStage::new().minify(
        b"<html><head></head><body>\n  <p>Hello,    world.</p>\n  <!-- note -->\n</body></html>",
    );
    let text = String::from_utf8(minified).unwrap();
    assert!(text.contains("Hello, world."), "got {text}");
    assert!(!text.contains("    "));
    assert!(text.contains("<!--") && text.contains("note"), "got {text}");

    let rename = RenameStage::new(".min");
    assert_eq!(
        rename.renamed(Path::new("about/index.html")).unwrap(),
        PathBuf::from("about/index.min.html")
    );
    assert_eq!(
        rename.renamed(Path::new("LICENSE")).unwrap(),
        PathBuf::from("LICENSE.min")
    );
}

#[test]
fn test_concat_bundles_in_sorted_order_with_inline_map() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/js/b.js", "var b = 2;");
    fs.add_file("/p/src/js/a.js", "var a = 1;");

    Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/js/*.js", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(SourceMapBegin::new())
    .stage(ConcatStage::new("main.min.js"))
    .stage(SourceMapEnd::new(SourceMapMode::Inline, CommentStyle::Js))
    .run()
    .unwrap();

    assert_eq!(
        fs.files(),
        vec![
            PathBuf::from("/p/dist/main.min.js"),
            PathBuf::from("/p/src/js/a.js"),
            PathBuf::from("/p/src/js/b.js"),
        ]
    );

    let bundle = read(&fs, "/p/dist/main.min.js");
    let (code, comment) = bundle.split_once("\n//# sourceMappingURL=").unwrap();
    assert_eq!(code, "var a = 1;\nvar b = 2;");

    let encoded = comment
        .trim_end()
        .strip_prefix("data:application/json;charset=utf8;base64,")
        .unwrap();
    let map: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "main.min.js");
    assert_eq!(map["sources"], serde_json::json!(["a.js", "b.js"]));
    assert_eq!(
        map["sourcesContent"],
        serde_json::json!(["var a = 1;", "var b = 2;"])
    );
}

#[test]
fn test_bundle_that_fails_to_minify_aborts_the_run() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/js/a.js", "var a = 1;");
    fs.add_file("/p/src/js/b.js", "function broken( {");

    let err = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/js/*.js", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(SourceMapBegin::new())
    .stage(ConcatStage::new("main.min.js"))
    .stage(JsMinifyStage::new())
    .stage(SourceMapEnd::new(SourceMapMode::Inline, CommentStyle::Js))
    .run()
    .unwrap_err();

    assert_eq!(err.task, "js");
    assert_eq!(err.stage, "js-minify");
    assert!(!fs.exists(Path::new("/p/dist/main.min.js")));
}

#[test]
fn test_file_source_maps_are_written_next_to_the_bundle() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/scss/style.css", "a { color: red; }");

    Pipeline::new(
        "styles",
        "/p",
        spec(AssetClass::Styles, "src/scss/*.css", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(SourceMapBegin::new())
    .stage(ConcatStage::new("main.min.css"))
    .stage(SourceMapEnd::new(SourceMapMode::File, CommentStyle::Css))
    .run()
    .unwrap();

    assert!(read(&fs, "/p/dist/main.min.css").ends_with("/*# sourceMappingURL=main.min.css.map */\n"));
    let map: serde_json::Value =
        serde_json::from_str(&read(&fs, "/p/dist/main.min.css.map")).unwrap();
    assert_eq!(map["sources"], serde_json::json!(["style.css"]));
}

#[test]
fn test_source_maps_none_leaves_output_untouched() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.js", "x();");

    Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.js", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(SourceMapBegin::new())
    .stage(ConcatStage::new("main.min.js"))
    .stage(SourceMapEnd::new(SourceMapMode::None, CommentStyle::Js))
    .run()
    .unwrap();

    assert_eq!(read(&fs, "/p/dist/main.min.js"), "x();");
}

#[test]
fn test_js_minify_strips_comments() {
    let source = b"// leading comment\nfunction add(first, second) {\n  return first + second;\n}\nwindow.add = add;\n";
    let out = JsMinifyStage::new().minify(source).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(!text.contains("leading comment"));
    assert!(text.contains("window.add"));
    assert!(text.len() < source.len());
}

#[test]
fn test_sass_resolves_imports_through_the_file_system() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/scss/_vars.scss", "$accent: #123456;");

    let css = SassStage::new(Arc::new(fs))
        .compile(
            "@import 'vars';\n.a { .b { color: $accent; } }",
            Path::new("/p/src/scss/style.scss"),
        )
        .unwrap();

    assert!(css.contains(".a .b"));
    assert!(css.contains("#123456"));
}

#[test]
fn test_sass_error_is_a_warning() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/scss/style.scss", ".a { color: $undefined; }");

    let fs_arc = Arc::new(fs.clone());
    let summary = Pipeline::new(
        "styles",
        "/p",
        spec(AssetClass::Styles, "src/scss/*.scss", "dist"),
        fs_arc.clone(),
    )
    .stage(SassStage::new(fs_arc))
    .run()
    .unwrap();

    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.written, 0);
}

#[test]
fn test_css_prefix_and_minify_levels() {
    let prefixed = PrefixStage::new()
        .prefix(".a { user-select: none; }", "style.css")
        .unwrap();
    assert!(prefixed.contains("-webkit-user-select"), "got {prefixed}");

    let source = ".a {\n  color: red;\n  color: blue;\n}\n";
    let level0 = CssMinifyStage::new(0).minify(source, "style.css").unwrap();
    let level2 = CssMinifyStage::new(2).minify(source, "style.css").unwrap();

    assert!(!level0.contains('\n'));
    assert!(level0.contains("red"));
    assert!(!level2.contains("red"));
    assert!(level2.len() < level0.len());
}

#[cfg(unix)]
#[test]
fn test_transpile_command_pipes_through_stdin_and_stdout() {
    use assetkiln::stages::CommandStage;

    let stage = CommandStage::new("transpile", Some("tr a-z A-Z".to_string()));
    let out = stage
        .process(item("/p/src/a.js", "/p/src", "let x = 1;"))
        .unwrap();
    assert_eq!(out[0].contents, b"LET X = 1;");

    let passthrough = CommandStage::new("transpile", None);
    let out = passthrough
        .process(item("/p/src/a.js", "/p/src", "let x = 1;"))
        .unwrap();
    assert_eq!(out[0].contents, b"let x = 1;");
}

#[cfg(unix)]
#[test]
fn test_failing_transpile_command_aborts_the_run() {
    use assetkiln::stages::CommandStage;

    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.js", "a");
    fs.add_file("/p/src/b.js", "b");

    let err = Pipeline::new(
        "js",
        "/p",
        spec(AssetClass::Script, "src/*.js", "dist"),
        Arc::new(fs.clone()),
    )
    .stage(CommandStage::new("transpile", Some("exit 3".to_string())))
    .run()
    .unwrap_err();

    assert_eq!(err.stage, "transpile");
    assert!(format!("{err}").contains("code 3"));
    assert!(!fs.exists(Path::new("/p/dist/a.js")));
}

#[test]
fn test_image_stages_derive_variants_for_raster_inputs() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/img/photo.jpg", sample_jpeg(16, 12).unwrap());
    fs.add_file("/p/src/img/logo.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
    fs.add_file("/p/src/img/broken.png", "not really a png");
    let fs_arc = Arc::new(fs.clone());
    let images = || spec(AssetClass::Images, "src/img/**/*", "dist/img");

    let generic = Pipeline::new("images", "/p", images(), fs_arc.clone())
        .stage(ReencodeStage::new(75))
        .run()
        .unwrap();
    assert_eq!(generic.written, 2);
    assert_eq!(generic.warnings, 1);
    assert!(fs.is_file(Path::new("/p/dist/img/photo.jpg")));
    assert!(fs.is_file(Path::new("/p/dist/img/logo.svg")));

    let webp = Pipeline::new("images-webp", "/p", images(), fs_arc.clone())
        .stage(WebpStage::new(80))
        .run()
        .unwrap();
    assert_eq!(webp.written, 1);
    let bytes = fs.read(Path::new("/p/dist/img/photo.webp")).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let avif = Pipeline::new("images-avif", "/p", images(), fs_arc)
        .stage(AvifStage::new(75, 10))
        .run()
        .unwrap();
    assert_eq!(avif.written, 1);
    let bytes = fs.read(Path::new("/p/dist/img/photo.avif")).unwrap();
    assert_eq!(&bytes[4..8], b"ftyp");
    assert!(!fs.exists(Path::new("/p/dist/img/logo.avif")));
}
