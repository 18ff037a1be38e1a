use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use life_expectancy_reports::csv_reader;
use life_expectancy_reports::report::{self, ChartKind, ReportSpec};
use life_expectancy_reports::transform;
use life_expectancy_reports::RenderOptions;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/life_expectancy.csv");

/// Helper function to run the binary with the given arguments
fn run_reports(args: &[&str]) -> Result<String, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_life-expectancy-reports"))
        .args(args)
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stderr).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ler-it-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn png_size(path: &Path) -> (u32, u32) {
    let img = image::open(path).expect("Failed to decode PNG");
    (img.width(), img.height())
}

#[test]
fn test_end_to_end_all_reports() {
    let dir = scratch_dir("all");
    let out = dir.to_str().unwrap();
    let result = run_reports(&["--data", FIXTURE, "--out-dir", out, "--dpi", "25"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    for (name, size) in [
        ("line_plot.png", (300, 150)),
        ("bar_graph.png", (300, 100)),
        ("pie_chart.png", (200, 200)),
    ] {
        let path = dir.join(name);
        let bytes = fs::read(&path).unwrap_or_else(|_| panic!("{} not written", name));
        assert!(is_valid_png(&bytes), "{} is not a valid PNG", name);
        assert_eq!(png_size(&path), size, "{}", name);
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_end_to_end_only_pie() {
    let dir = scratch_dir("only");
    let out = dir.to_str().unwrap();
    let result = run_reports(&["--data", FIXTURE, "--out-dir", out, "--dpi", "25", "--only", "pie"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    assert!(dir.join("pie_chart.png").exists());
    assert!(!dir.join("line_plot.png").exists());
    assert!(!dir.join("bar_graph.png").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_end_to_end_missing_data_file() {
    let dir = scratch_dir("missing");
    let out = dir.to_str().unwrap();
    let result = run_reports(&["--data", "/nonexistent/life_expectancy.csv", "--out-dir", out]);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to load life expectancy data"));
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_end_to_end_failing_report_does_not_block_others() {
    let dir = scratch_dir("isolated");
    let config = dir.join("reports.json");
    fs::write(
        &config,
        r#"{
            "render": { "dpi": 25 },
            "reports": [
                { "kind": "line" },
                { "kind": "bar", "countries": ["Atlantis"] },
                { "kind": "pie" }
            ]
        }"#,
    )
    .unwrap();

    let out = dir.to_str().unwrap();
    let result = run_reports(&["--data", FIXTURE, "--out-dir", out, "--config", config.to_str().unwrap()]);

    let stderr = result.expect_err("a failed report must fail the run");
    assert!(stderr.contains("1 of 3 reports failed"), "stderr: {}", stderr);
    assert!(dir.join("line_plot.png").exists());
    assert!(!dir.join("bar_graph.png").exists());
    assert!(dir.join("pie_chart.png").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_end_to_end_bad_config() {
    let dir = scratch_dir("badconfig");
    let config = dir.join("reports.json");
    fs::write(&config, "{ not json").unwrap();
    let result = run_reports(&["--data", FIXTURE, "--config", config.to_str().unwrap()]);
    assert!(result.unwrap_err().contains("Failed to load configuration"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_fixture_pipeline_through_library() {
    let dataset = csv_reader::load_dataset(Path::new(FIXTURE)).unwrap();
    assert_eq!(dataset.len(), 7 * 17);

    let spec = ReportSpec::default_for(ChartKind::Bar);
    let filtered = transform::filter(&dataset, &spec.criteria());
    assert_eq!(filtered.len(), 6 * 7);

    let series = transform::mean_by_year_and_country(&filtered);
    assert_eq!(series.keys().copied().collect::<Vec<_>>(), (2010..=2016).collect::<Vec<_>>());
    assert!(series.values().all(|by_country| by_country.len() == 6));
    assert!(series.values().all(|by_country| !by_country.contains_key("Germany")));

    let bytes = report::render_report(&dataset, &spec, &RenderOptions { dpi: 25 }).unwrap();
    assert!(is_valid_png(&bytes));
}
