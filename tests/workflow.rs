use std::{fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[arena]\n"
        + "width = 800\n"
        + "height = 800\n"
        + "track_path = [ [ 550.0, 700.0,], [ 200.0, 25.0,],]\n"
        + "track_half_width = 60.0\n"
        + "goal_x = 200.0\n"
        + "goal_y = 25.0\n"
        + "goal_width = 32\n"
        + "goal_height = 32\n"
        + "\n"
        + "[vehicle]\n"
        + "width = 32\n"
        + "height = 64\n"
        + "spawn_x = 550.0\n"
        + "spawn_y = 700.0\n"
        + "spawn_tilt = 90.0\n"
        + "turn_rate = 5.0\n"
        + "speed_on_track = 12.0\n"
        + "speed_off_track = 2.0\n"
        + "\n"
        + "[evaluation]\n"
        + "max_ticks = 120\n"
        + "goal_bonus = 50.0\n"
        + "\n"
        + "[search]\n"
        + "n_pol = 12\n"
        + "n_elite = 2\n"
        + "std_dev_mut = 0.05\n"
        + "seed = 42\n"
        + "\n"
        + "[output]\n"
        + "generations_per_file = 3\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_vectare"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "create"]);
    run_bin(&["--sim-dir", test_dir_str, "create"]);

    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "0"]);
    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "0"]);

    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "1"]);
    run_bin(&["--sim-dir", test_dir_str, "resume", "--run-idx", "1"]);

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);

    assert!(test_dir.join("run-0000").join("results.json").is_file());
    assert!(test_dir.join("run-0001").join("results.json").is_file());

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}
