use assert_cmd::Command;
use tempfile::tempdir;

fn uscore() -> Command {
    let mut cmd = Command::cargo_bin("uscore").unwrap();
    cmd.env_remove("USCORE_MODEL_DIR").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn predict_with_wrong_arity_exits_2_and_prints_nothing() {
    let dir = tempdir().unwrap();
    let output = uscore()
        .args(["predict", "690", "710", "--model-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("got 2"));
}

#[test]
fn predict_without_trained_state_exits_2() {
    let dir = tempdir().unwrap();
    let output = uscore()
        .args(["predict", "690", "710", "680", "--model-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn score_prints_structured_json() {
    let output = uscore()
        .args([
            "score",
            "--customer-id",
            "CUST12345",
            "--experian",
            "701",
            "--equifax",
            "780",
            "--transunion",
            "712",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["customer_id"], "CUST12345");
    assert_eq!(json["unified_score"], 717.67);
    assert_eq!(json["score"], 718);
    assert_eq!(json["aggregation"], "equal");
    assert_eq!(json["risk_level"], "Low");
    assert_eq!(json["bureau_scores"].as_array().unwrap().len(), 3);
}

#[test]
fn score_weighted_mode_uses_given_weights() {
    let output = uscore()
        .args([
            "score",
            "--customer-id",
            "C7",
            "--experian",
            "800",
            "--equifax",
            "780",
            "--transunion",
            "700",
            "--mode",
            "weighted",
            "--weights",
            "4,3,3",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    // 0.4 * 800 + 0.3 * 740 + 0.3 * 700
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["aggregation"], "weighted");
    assert_eq!(json["unified_score"], 752.0);
    assert_eq!(json["score"], 752);
}

#[test]
fn score_with_malformed_weights_exits_2() {
    let output = uscore()
        .args(["score", "--customer-id", "C7", "--experian", "800", "--mode", "weighted", "--weights", "4,3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn score_text_format_explains_the_result() {
    let output = uscore()
        .args([
            "score",
            "--customer-id",
            "CUST12345",
            "--experian",
            "701",
            "--equifax",
            "780",
            "--format",
            "text",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Customer: CUST12345"));
    assert!(text.contains("Aggregation: equal"));
    assert!(text.contains("TransUnion not reported"));
    assert!(text.contains("low-risk band"));
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_err());
}

#[test]
fn score_with_no_readings_exits_3() {
    let output = uscore().args(["score", "--customer-id", "C1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}

#[test]
fn score_out_of_range_exits_2() {
    let output = uscore()
        .args(["score", "--customer-id", "C1", "--equifax", "950"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn sample_train_predict_round_trip() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("train.csv");
    let model_dir = dir.path().join("model");

    uscore()
        .args(["sample", "-n", "400", "--noise", "15", "--output"])
        .arg(&data)
        .assert()
        .success();

    let train = uscore()
        .args(["train", "--n-trees", "20", "--data"])
        .arg(&data)
        .arg("--model-dir")
        .arg(&model_dir)
        .output()
        .unwrap();
    assert!(train.status.success(), "stderr: {}", String::from_utf8_lossy(&train.stderr));
    let summary = String::from_utf8_lossy(&train.stdout);
    assert!(summary.contains("read=400 used=400 dropped=0"));
    assert!(summary.contains("train=320 test=80"));
    assert!(model_dir.join("estimator.json").exists());

    // Model directory from the environment.
    let predict = uscore()
        .env("USCORE_MODEL_DIR", &model_dir)
        .args(["predict", "690", "710", "680"])
        .output()
        .unwrap();
    assert!(predict.status.success(), "stderr: {}", String::from_utf8_lossy(&predict.stderr));
    let stdout = String::from_utf8_lossy(&predict.stdout);
    let value: f64 = stdout.trim().parse().unwrap();
    assert!((value - 682.5).abs() < 20.0, "prediction {value}");
    assert_eq!(stdout.trim().split('.').nth(1).map(str::len), Some(2));
}
