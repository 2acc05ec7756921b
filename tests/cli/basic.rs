use crate::cli::*;

// Seems like we can't read from stdout until we close stdin, at which point we can no longer
// enter any commands.
// Consequently, the test is structured such that we first issue all the commands and only then
// do we assert on the output.
#[tokio::test(flavor = "multi_thread")]
async fn test_cli_basic() -> Result<(), Box<dyn std::error::Error>> {
    let translator = mock_translator("SELECT COUNT(*) AS n FROM orders").await;
    let temp_dir = setup_temp_config_and_data_dir(&translator.uri()).await?;

    let mut cmd = sqltalk(&temp_dir);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    //
    // First run all the input commands
    //

    // Send input to the command through stdin
    let mut stdin = child.stdin.take().expect("Failed to open stdin");
    let mut expected_stdout: Vec<&str> = vec![];
    let mut expected_stderr: Vec<&str> = vec![];

    // Questions need a database
    writeln!(stdin, "how many orders are there?")?;
    expected_stderr.push("No database selected. Pick one with \\c <id>");

    writeln!(stdin, "\\sources")?;
    expected_stdout.push("  shop (sqlite)");

    writeln!(stdin, "\\use shop")?;
    expected_stdout.push("Using source shop");

    writeln!(stdin, "\\register")?;
    expected_stdout.push("Registered database 1");

    writeln!(stdin, "\\c 1")?;
    expected_stdout.push("Connected to database 1 (shop)");

    writeln!(stdin, "how many orders are there?")?;
    expected_stdout.extend(vec![
        "SQL: SELECT COUNT(*) AS n FROM orders",
        "[",
        "  {",
        "    \"n\": 2",
        "  }",
        "]",
    ]);

    // customers is registered first, so orders gets table ID 2
    writeln!(stdin, "\\describe table 2 One row per order")?;
    expected_stdout.push("Description updated");

    writeln!(stdin, "\\describe table 9 Nothing here")?;
    expected_stderr.push("Table with ID 9 doesn't exist in database 1");

    writeln!(stdin, "\\c x")?;
    expected_stderr.push("\"x\" is not a valid ID");

    writeln!(stdin, "\\l")?;
    expected_stdout.push("1\tshop\t2 tables\t");

    // Close the CLI
    // NB: if we hadn't done it like this we'd need to call drop(stdin), since otherwise the
    // test would hang.
    writeln!(stdin, "\\q")?;

    //
    // Now examine the actual output and assert on expected values
    //

    let stdout = child.stdout.take().expect("Failed to open stdout");
    let reader = BufReader::new(stdout);

    // Read out all the lines from stdout
    let mut actual = vec![];
    for line in reader.lines() {
        actual.push(line?);
    }

    assert_eq!(
        expected_stdout, actual,
        "\n\nexpected:\n\n{:#?}\nactual:\n\n{:#?}\n\n",
        expected_stdout, actual
    );

    //
    // Finally examine the errors
    //

    let stderr = child.stderr.take().expect("Failed to open stderr");
    let reader = BufReader::new(stderr);

    // Read out all the lines from stderr
    let mut actual = vec![];
    for line in reader.lines() {
        actual.push(line?);
    }

    assert_eq!(
        expected_stderr, actual,
        "\n\nexpected:\n\n{:#?}\nactual:\n\n{:#?}\n\n",
        expected_stderr, actual
    );

    // Wait for the command to finish
    let status = child.wait().expect("Failed to wait for command");
    assert!(status.success());

    Ok(())
}
