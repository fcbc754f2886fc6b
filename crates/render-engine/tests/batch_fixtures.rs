use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowdraw_common::config::{ExportFormat, TraversalOrder};
use flowdraw_common::error::FlowdrawError;
use flowdraw_render_engine::pipeline::{Pipeline, PipelineOptions};
use flowdraw_render_engine::registry::NodeTypeRegistry;
use flowdraw_render_engine::session::SessionOptions;
use flowdraw_render_engine::{process_all, walk, SvgEngine};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("flows")
}

fn copy_tree(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("create target dir");
    for entry in std::fs::read_dir(from).expect("fixtures should be readable") {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn pipeline(out: &Path, format: ExportFormat) -> Pipeline {
    Pipeline::new(
        Arc::new(SvgEngine::new()),
        Arc::new(NodeTypeRegistry::with_core_types()),
        PipelineOptions {
            format,
            output_dir: out.to_path_buf(),
            stdout: false,
            order: TraversalOrder::Reverse,
            session: SessionOptions::default(),
        },
    )
    .expect("valid options")
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn batch_renders_valid_flows_and_reports_the_malformed_one() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    copy_tree(&fixtures_dir(), input.path());

    let files = walk(input.path()).await.expect("walk succeeds");
    assert_eq!(files.len(), 4);

    let summary = process_all(
        &pipeline(out.path(), ExportFormat::Img),
        input.path(),
        files,
        None,
    )
    .await;

    assert_eq!(summary.processed.len(), 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failures.len(), 1);
    let (failed, error) = &summary.failures[0];
    assert!(failed.ends_with("nested/truncated.json"));
    assert!(matches!(error, FlowdrawError::MalformedInput { .. }));

    assert_eq!(
        sorted_names(out.path()),
        vec!["nested", "two-tabs-0.svg", "two-tabs-1.svg"]
    );
    assert_eq!(
        sorted_names(&out.path().join("nested")),
        vec!["storage-shape-0.svg"]
    );

    // Last-declared workspace is rendered first.
    let first = std::fs::read_to_string(out.path().join("two-tabs-0.svg")).unwrap();
    let second = std::fs::read_to_string(out.path().join("two-tabs-1.svg")).unwrap();
    assert!(first.contains("data-workspace=\"tabB\""));
    assert!(first.contains("<title>Report</title>"));
    assert!(second.contains("data-workspace=\"tabA\""));
    assert!(second.contains(">by kind</text>"));
}

#[tokio::test]
async fn storage_shape_flow_draws_groups_and_unknown_nodes() {
    let out = tempfile::tempdir().unwrap();
    let input = fixtures_dir().join("nested").join("storage-shape.json");

    let snapshots = pipeline(out.path(), ExportFormat::Json)
        .render_file(&input)
        .await
        .expect("fixture renders");
    assert_eq!(snapshots.len(), 1);

    let svg = String::from_utf8(snapshots.get(0).unwrap().decode().unwrap().bytes).unwrap();
    assert!(svg.contains(">Timers</text>"));
    assert!(svg.contains("class=\"node unknown\" data-id=\"custom\""));
    assert_eq!(svg.matches("class=\"wire\"").count(), 1);
}

#[tokio::test]
async fn json_export_of_fixture_matches_rendered_sequence() {
    let out = tempfile::tempdir().unwrap();
    let input = fixtures_dir().join("two-tabs.json");
    let pipeline = pipeline(out.path(), ExportFormat::Json);

    let rendered = pipeline.render_file(&input).await.unwrap();
    pipeline.process_file(&input).await.unwrap();

    let exported: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("two-tabs.json")).unwrap())
            .unwrap();
    assert_eq!(exported, rendered.uris());
}
