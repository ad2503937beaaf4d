//! Tests for loader dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kiln_build::loaders::ProcessorRegistryBuilder;
use kiln_build::{
    Error, FileDispatcher, LoaderContext, LocalPipeline, OutputMetadata, ProcessRequest, Processor,
    ProcessorItem, ProcessorOutput, ProcessorPipeline, ProcessorTest,
};
use kiln_config::{BundlessConfig, PackageJson, UserConfig, normalize_user_config};
use regex::Regex;
use serde_json::json;
use tempfile::TempDir;

/// Upper-cases the source and reports the configured extension.
struct Upper;

#[async_trait]
impl Processor for Upper {
    async fn process(
        &self,
        source: String,
        request: &ProcessRequest<'_>,
    ) -> anyhow::Result<Option<ProcessorOutput>> {
        let mut output = ProcessorOutput::new(source.to_uppercase());
        if let Some(ext) = request.options.get("ext").and_then(|v| v.as_str()) {
            output = output.with_ext(ext);
        }
        Ok(Some(output))
    }
}

/// Produces nothing.
struct Silent;

#[async_trait]
impl Processor for Silent {
    async fn process(
        &self,
        _source: String,
        _request: &ProcessRequest<'_>,
    ) -> anyhow::Result<Option<ProcessorOutput>> {
        Ok(None)
    }
}

struct Failing;

#[async_trait]
impl Processor for Failing {
    async fn process(
        &self,
        _source: String,
        _request: &ProcessRequest<'_>,
    ) -> anyhow::Result<Option<ProcessorOutput>> {
        anyhow::bail!("SyntaxError: Unexpected token (1:4)")
    }
}

/// Records calls instead of reading files.
#[derive(Default)]
struct RecordingPipeline {
    calls: AtomicUsize,
}

#[async_trait]
impl ProcessorPipeline for RecordingPipeline {
    async fn run(
        &self,
        request: ProcessRequest<'_>,
    ) -> kiln_build::Result<Option<ProcessorOutput>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ProcessorOutput::new(format!(
            "{}:{}:{}",
            request.loader_id,
            request.loader,
            request.context.config.input
        ))))
    }
}

fn bundless_config() -> BundlessConfig {
    let user = UserConfig::from_value(json!({ "esm": {} })).unwrap();
    normalize_user_config(&user)[0].as_bundless().unwrap().clone()
}

fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.txt"), "hello").unwrap();
    fs::write(src.join("b.less"), "@c: red;").unwrap();
    fs::write(src.join("c.md"), "# title").unwrap();
    (dir, src)
}

fn dispatcher(items: Vec<ProcessorItem>, pipeline: Arc<dyn ProcessorPipeline>) -> FileDispatcher {
    let mut builder = ProcessorRegistryBuilder::new();
    for item in items {
        builder.register(item);
    }
    FileDispatcher::new(builder.freeze(), pipeline)
}

fn local_pipeline() -> Arc<LocalPipeline> {
    Arc::new(
        LocalPipeline::new()
            .with_processor("upper", Arc::new(Upper))
            .with_processor("silent", Arc::new(Silent))
            .with_processor("failing", Arc::new(Failing)),
    )
}

#[tokio::test]
async fn unmatched_file_is_pass_through() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let pipeline = Arc::new(RecordingPipeline::default());
    let dispatcher = dispatcher(
        vec![ProcessorItem::new(
            "less",
            ProcessorTest::pattern(Regex::new(r"\.less$").unwrap()),
            "less",
        )],
        pipeline.clone(),
    );

    let result = dispatcher
        .dispatch(&src.join("a.txt"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn matched_loader_output_and_metadata_are_returned() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![
            ProcessorItem::new(
                "text",
                ProcessorTest::prefix(src.join("a").to_string_lossy()),
                "upper",
            )
            .with_options(json!({ "ext": ".js" })),
        ],
        local_pipeline(),
    );

    let output = dispatcher
        .dispatch(&src.join("a.txt"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.content, "HELLO");
    assert_eq!(
        output.metadata,
        OutputMetadata {
            ext: Some(".js".to_string()),
            declaration: false
        }
    );
}

#[tokio::test]
async fn metadata_defaults_to_empty() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![ProcessorItem::new(
            "md",
            ProcessorTest::predicate(|p| p.extension().is_some_and(|e| e == "md")),
            "upper",
        )],
        local_pipeline(),
    );

    let output = dispatcher
        .dispatch(&src.join("c.md"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.content, "# TITLE");
    assert_eq!(output.metadata, OutputMetadata::default());
}

#[tokio::test]
async fn first_registered_loader_wins() {
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![
            ProcessorItem::new("broad", ProcessorTest::prefix("/project/src"), "a"),
            ProcessorItem::new("narrow", ProcessorTest::prefix("/project/src/styles"), "b"),
        ],
        Arc::new(RecordingPipeline::default()),
    );

    let output = dispatcher
        .dispatch(
            Path::new("/project/src/styles/a.less"),
            LoaderContext { config: &config, pkg: &pkg },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.content, "broad:a:src");
}

#[tokio::test]
async fn loader_without_result_is_pass_through() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![ProcessorItem::new("noop", ProcessorTest::prefix(src.to_string_lossy()), "silent")],
        local_pipeline(),
    );

    let result = dispatcher
        .dispatch(&src.join("a.txt"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn loader_failure_keeps_diagnostic() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![ProcessorItem::new(
            "less",
            ProcessorTest::pattern(Regex::new(r"\.less$").unwrap()),
            "failing",
        )],
        local_pipeline(),
    );

    let err = dispatcher
        .dispatch(&src.join("b.less"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap_err();

    match &err {
        Error::Processor { id, path, source } => {
            assert_eq!(id, "less");
            assert!(path.ends_with("src/b.less"));
            assert_eq!(source.to_string(), "SyntaxError: Unexpected token (1:4)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_processor_is_an_error() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![ProcessorItem::new("vue", ProcessorTest::prefix(src.to_string_lossy()), "vue-loader")],
        local_pipeline(),
    );

    let err = dispatcher
        .dispatch(&src.join("a.txt"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownProcessor { id, loader } if id == "vue" && loader == "vue-loader"
    ));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let (_dir, src) = project();
    let config = bundless_config();
    let pkg = PackageJson::default();

    let dispatcher = dispatcher(
        vec![ProcessorItem::new("all", ProcessorTest::prefix(""), "upper")],
        local_pipeline(),
    );

    let err = dispatcher
        .dispatch(&src.join("gone.txt"), LoaderContext { config: &config, pkg: &pkg })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatches_are_independent() {
    let dir = TempDir::new().unwrap();
    for i in 0..32 {
        fs::write(dir.path().join(format!("{i}.txt")), format!("file {i}")).unwrap();
    }

    let dispatcher = dispatcher(
        vec![ProcessorItem::new(
            "text",
            ProcessorTest::prefix(dir.path().to_string_lossy()),
            "upper",
        )],
        local_pipeline(),
    );
    let config = Arc::new(bundless_config());
    let pkg = Arc::new(PackageJson::default());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            let config = Arc::clone(&config);
            let pkg = Arc::clone(&pkg);
            let path = dir.path().join(format!("{i}.txt"));
            tokio::spawn(async move {
                let context = LoaderContext {
                    config: &config,
                    pkg: &pkg,
                };
                dispatcher.dispatch(&path, context).await
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    for (i, result) in results.into_iter().enumerate() {
        let output = result.unwrap().unwrap().unwrap();
        assert_eq!(output.content, format!("FILE {i}"));
    }
}
