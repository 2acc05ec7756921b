use crate::cli::*;

#[tokio::test(flavor = "multi_thread")]
async fn test_one_off_register_and_list() -> Result<(), Box<dyn std::error::Error>> {
    let translator = mock_translator("SELECT 1").await;
    let temp_dir = setup_temp_config_and_data_dir(&translator.uri()).await?;

    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\use shop; \\register; \\l")
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output.stdout),
        vec![
            "Using source shop",
            "Registered database 1",
            "1\tshop\t2 tables\t",
        ]
    );
    assert!(temp_dir.path().join("catalog.json").exists());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_off_question() -> Result<(), Box<dyn std::error::Error>> {
    let translator =
        mock_translator("```sql\nSELECT id, total FROM orders ORDER BY id\n```").await;
    let temp_dir = setup_temp_config_and_data_dir(&translator.uri()).await?;

    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\use shop; \\register; \\c 1; what are the order totals?")
        .output()?;

    assert!(output.status.success());
    let lines = stdout_lines(&output.stdout);
    assert_eq!(lines[3], "SQL: SELECT id, total FROM orders ORDER BY id");

    let rows: serde_json::Value = serde_json::from_str(&lines[4..].join("\n"))?;
    assert_eq!(
        rows,
        json!([{"id": 1, "total": 12.5}, {"id": 2, "total": 40.0}])
    );

    let requests = translator.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(prompt.contains("Question: what are the order totals?"));
    assert!(prompt.contains("\"name\": \"orders\""));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_off_catalog_persists() -> Result<(), Box<dyn std::error::Error>> {
    let translator = mock_translator("SELECT 1").await;
    let temp_dir = setup_temp_config_and_data_dir(&translator.uri()).await?;

    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\use shop; \\register; \\c 1; \\describe database 1 The web shop")
        .output()?;
    assert!(output.status.success());

    // A fresh process sees the same catalog and keeps allocating after it
    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\l; \\use shop; \\register; \\l")
        .output()?;
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output.stdout),
        vec![
            "1\tshop\t2 tables\tThe web shop",
            "Using source shop",
            "Registered database 2",
            "1\tshop\t2 tables\tThe web shop",
            "2\tshop\t2 tables\t",
        ]
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_off_errors() -> Result<(), Box<dyn std::error::Error>> {
    let translator = mock_translator("").await;
    let temp_dir = setup_temp_config_and_data_dir(&translator.uri()).await?;

    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\nope; \\l")
        .output()?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'\\nope' is not a valid command"));

    let output = sqltalk(&temp_dir)
        .arg("--one-off")
        .arg("\\use shop; \\register; \\c 1; what's the weather like?")
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("The question can't be answered from this database's schema"));

    Ok(())
}
