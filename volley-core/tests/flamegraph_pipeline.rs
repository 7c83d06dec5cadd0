// Pipeline integration tests with stand-in stages; `perf` and the
// FlameGraph perl scripts are not required.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use volley_core::{config::HarnessConfig, flamegraph, Error};

fn write_stage(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).expect("write stage script");
    let mut perm = fs::metadata(&path).expect("stage metadata").permissions();
    perm.set_mode(0o755);
    fs::set_permissions(&path, perm).expect("chmod stage script");
}

fn pipeline_config(dir: &Path) -> HarnessConfig {
    let mut cfg = HarnessConfig::default();
    // `echo script -i <perf.data>` stands in for `perf script`.
    cfg.perf_bin = "echo".to_string();
    cfg.perf_data = dir.join("perf.data");
    cfg.svg = dir.join("graph.svg");
    cfg.flamegraph_dir = dir.to_path_buf();
    cfg
}

#[tokio::test]
async fn pipeline_produces_a_non_empty_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_stage(dir.path(), "stackcollapse-perf.pl", "#!/bin/sh\nexec cat\n");
    write_stage(dir.path(), "flamegraph.pl", "#!/bin/sh\nexec cat\n");
    let cfg = pipeline_config(dir.path());

    flamegraph::render(&cfg).await.expect("render");

    let svg = fs::read_to_string(&cfg.svg).expect("read output");
    assert!(!svg.is_empty());
    // The stand-in stages pass the first stage's output through unchanged.
    assert!(svg.contains("script -i"));
}

#[tokio::test]
async fn stages_transform_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_stage(dir.path(), "stackcollapse-perf.pl", "#!/bin/sh\nsed s/script/collapsed/\n");
    write_stage(dir.path(), "flamegraph.pl", "#!/bin/sh\nsed s/collapsed/rendered/\n");
    let cfg = pipeline_config(dir.path());

    flamegraph::render(&cfg).await.expect("render");

    let svg = fs::read_to_string(&cfg.svg).expect("read output");
    assert!(svg.contains("rendered -i"));
}

#[tokio::test]
async fn missing_stage_script_is_a_process_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    // No stage scripts written; the stackcollapse spawn must fail.
    let cfg = pipeline_config(dir.path());

    let err = flamegraph::render(&cfg).await.expect_err("render must fail");
    assert!(matches!(err, Error::Process(_)));
}

#[tokio::test]
async fn failing_stage_status_is_tolerated() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_stage(dir.path(), "stackcollapse-perf.pl", "#!/bin/sh\ncat\nexit 3\n");
    write_stage(dir.path(), "flamegraph.pl", "#!/bin/sh\nexec cat\n");
    let cfg = pipeline_config(dir.path());

    // Non-zero stage exit is logged, not propagated.
    flamegraph::render(&cfg).await.expect("render");
    assert!(cfg.svg.exists());
}
