use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn program_file(words: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for (addr, bits) in words.iter().enumerate() {
        writeln!(file, "ram[{}] = 16'b{};", addr, bits).unwrap();
    }
    file
}

fn e20sim() -> Command {
    Command::cargo_bin("e20sim").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn runs_addi_then_halts() {
    // addi $1, $0, 5 ; j 1
    let file = program_file(&["0010000010000101", "0100000000000001"]);
    let stdout = stdout_of(e20sim().arg(file.path()));

    let mut expected = String::from("Final state:\n\tpc=    1\n\t$0=    0\n\t$1=    5\n");
    for reg in 2..8 {
        expected.push_str(&format!("\t${}=    0\n", reg));
    }
    expected.push_str("2085 4001 0000 0000 0000 0000 0000 0000 \n");
    for _ in 1..16 {
        expected.push_str(&"0000 ".repeat(8));
        expected.push('\n');
    }
    assert_eq!(stdout, expected);
}

#[test]
fn logs_two_level_cache_accesses() {
    let file = program_file(&[
        "0010000010001010", // addi $1, $0, 10
        "1010000010000000", // sw $1, 0($0)
        "1000000100000000", // lw $2, 0($0)
        "1000000110001000", // lw $3, 8($0)
        "0100000000000100", // j 4
    ]);
    let stdout = stdout_of(e20sim().arg("--cache").arg("4,1,1,8,2,1").arg(file.path()));

    let expected = "Cache L1 has size 4, associativity 1, blocksize 1, rows 4\n\
                    Cache L2 has size 8, associativity 2, blocksize 1, rows 4\n\
                    L1 SW    pc:    1\taddr:    0\trow:   0\n\
                    L2 SW    pc:    1\taddr:    0\trow:   0\n\
                    L1 HIT   pc:    2\taddr:    0\trow:   0\n\
                    L1 MISS  pc:    3\taddr:    8\trow:   0\n\
                    L2 MISS  pc:    3\taddr:    8\trow:   0\n";
    assert_eq!(stdout, expected);
}

#[test]
fn json_final_state() {
    let file = program_file(&["0010000010000101", "0100000000000001"]);
    let stdout = stdout_of(e20sim().arg("--json").arg(file.path()));

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["pc"], 1);
    assert_eq!(value["registers"][1], 5);
    assert_eq!(value["memory"].as_array().map(|m| m.len()), Some(128));
}

#[test]
fn disassembles_program() {
    let file = program_file(&["0010000010000101", "0100000000000001"]);
    let stdout = stdout_of(e20sim().arg("--disassemble").arg(file.path()));

    assert_eq!(stdout, "0000: 2085  addi $1, $0, 5\n0001: 4001  j 1\n");
}

#[test]
fn max_steps_stops_runaway_program() {
    // j 1 ; j 0
    let file = program_file(&["0100000000000001", "0100000000000000"]);
    let stdout = stdout_of(e20sim().arg("--max-steps").arg("5").arg(file.path()));

    assert!(stdout.starts_with("Final state:\n\tpc=    1\n"));
}

#[test]
fn help_exits_with_status_one() {
    let output = e20sim().arg("-h").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--cache"));
}

#[test]
fn missing_filename_is_an_error() {
    e20sim().assert().code(1);
}

#[test]
fn unknown_flag_is_an_error() {
    let file = program_file(&["0100000000000000"]);
    e20sim().arg("--bogus").arg(file.path()).assert().code(1);
}

#[test]
fn unreadable_file_is_an_error() {
    let output = e20sim().arg("/nonexistent/program.bin").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Can't open file"));
}

#[test]
fn wrong_cache_element_count_is_an_error() {
    let file = program_file(&["0100000000000000"]);
    e20sim().arg("--cache").arg("8,2,2,4").arg(file.path()).assert().code(1);
}

#[test]
fn address_gap_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "ram[0] = 16'b0;\nram[1] = 16'b0;\nram[3] = 16'b0;\n").unwrap();

    let output = e20sim().arg(file.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of sequence: 3"));
}
