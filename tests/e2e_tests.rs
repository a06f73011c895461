//! End-to-end integration tests
//!
//! These tests validate the complete transfer pipeline using predefined
//! input fixtures. Each test:
//! 1. Reads input.txt from a fixture directory
//! 2. Loads the accounts and applies every transfer through the workers
//! 3. Generates the balance report
//! 4. Compares actual output with expected.txt
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path scenarios
//! - Round-robin distribution over several workers
//! - Negative balances, duplicate ids, self transfers
//! - Malformed lines and end-of-section sentinels
//! - Tab and mixed whitespace separators
//! - Report ordering
//!
//! Transfers only add and subtract, so the final balances do not depend on
//! how workers interleave. Every fixture runs under both execution modes and
//! several worker counts.

#[cfg(test)]
mod tests {
    use eft_engine::cli::ExecutionMode;
    use eft_engine::{process_file, EngineConfig};
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    /// Run a test fixture by processing input.txt and comparing with expected.txt
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Input or expected files cannot be read
    /// - Processing fails
    /// - Output doesn't match expected
    fn run_test_fixture(fixture_name: &str, mode: ExecutionMode, workers: usize) {
        // Construct paths to fixture files
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.txt", fixture_dir);
        let expected_path = format!("{}/expected.txt", fixture_dir);

        // Verify fixture files exist
        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let config = EngineConfig::new(workers, 4, mode)
            .unwrap_or_else(|e| panic!("Invalid config: {}", e));

        let mut output = Vec::new();
        process_file(Path::new(&input_path), &config, &mut output)
            .unwrap_or_else(|e| panic!("Failed to process transfers: {}", e));

        let actual_output = String::from_utf8(output).expect("Report is not UTF-8");
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (mode: {:?}, workers: {})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, mode, workers, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both execution modes
    #[rstest]
    #[case("single_transfer")]
    #[case("round_robin_chain")]
    #[case("negative_balance")]
    #[case("duplicate_accounts")]
    #[case("insertion_order")]
    #[case("no_transfers")]
    #[case("opposite_directions")]
    #[case("malformed_lines")]
    #[case("stops_at_sentinel")]
    #[case("sentinel_without_amount")]
    #[case("whitespace_separated")]
    #[case("self_transfer")]
    #[case("many_accounts")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(ExecutionMode::Threads, ExecutionMode::Tasks)] mode: ExecutionMode,
        #[values(1, 2, 8)] workers: usize,
    ) {
        run_test_fixture(fixture, mode, workers);
    }

    fn transfprog(args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_transfprog"))
            .args(args)
            .output()
            .expect("Failed to run transfprog")
    }

    #[rstest]
    #[case::threads("threads")]
    #[case::tasks("tasks")]
    fn test_binary_prints_balances(#[case] mode: &str) {
        let output = transfprog(&[
            "--mode",
            mode,
            "tests/fixtures/round_robin_chain/input.txt",
            "2",
        ]);

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "1 70\n2 70\n3 10\n");
    }

    #[rstest]
    #[case::missing_file(&["tests/fixtures/does_not_exist/input.txt", "2"])]
    #[case::zero_workers(&["tests/fixtures/single_transfer/input.txt", "0"])]
    #[case::too_many_workers(&["tests/fixtures/single_transfer/input.txt", "10001"])]
    fn test_binary_exits_with_error(#[case] args: &[&str]) {
        let output = transfprog(args);

        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Error: "));
    }

    #[test]
    fn test_binary_usage_error() {
        let output = transfprog(&["tests/fixtures/single_transfer/input.txt"]);
        assert!(!output.status.success());
        assert!(output.stdout.is_empty());
    }
}
