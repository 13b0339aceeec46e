use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TRAP: &str = "NOP0\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D N S SF X SX SXF\nDECO I D N S SF X SX SXF\nSTRO D N SF X\n";

/// Workspace with a `trap` fixture, since both tools read it from the
/// current directory.
fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("trap"), TRAP).expect("trap fixture");
    dir
}

fn asem8(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("asem8").expect("binary");
    cmd.current_dir(dir.path());
    cmd
}

fn pep8(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pep8").expect("binary");
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn asem8_runs_without_arguments() {
    let dir = workspace();
    asem8(&dir).assert().success();
}

#[test]
fn asem8_requires_the_trap_file() {
    let dir = TempDir::new().expect("temp dir");
    asem8(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not open trap file."));
}

#[test]
fn asem8_version_banner() {
    let dir = workspace();
    asem8(&dir)
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("Pep/8 Assembler"));
}

#[test]
fn asem8_rejects_wrong_extension() {
    let dir = workspace();
    fs::write(dir.path().join("prog.txt"), "STOP\n.END\n").expect("source");
    asem8(&dir)
        .arg("prog.txt")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".pep"));
}

#[test]
fn asem8_reports_a_missing_source_file() {
    let dir = workspace();
    asem8(&dir)
        .arg("nosuch.pep")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not open nosuch.pep."));
}

#[test]
fn asem8_writes_object_and_listing() {
    let dir = workspace();
    fs::write(
        dir.path().join("prog.pep"),
        "LDA 0x0005,d\nSTA 0x0007,d\n.END\n",
    )
    .expect("source");
    asem8(&dir).args(["-l", "prog.pep"]).assert().success();
    let object = fs::read_to_string(dir.path().join("prog.pepo")).expect("object");
    assert_eq!(object, "C1 00 05 E1 00 07 zz\n");
    let listing = fs::read_to_string(dir.path().join("prog.pepl")).expect("listing");
    assert!(listing.contains("Addr  code   Mnemon  Operand       Comment"));
    assert!(listing.contains("0000  C10005 LDA     0x0005,d"));
}

#[test]
fn asem8_reports_errors_and_writes_nothing() {
    let dir = workspace();
    fs::write(dir.path().join("bad.pep"), "FROB 5,i\nSTA 1,i\n.END\n").expect("source");
    asem8(&dir)
        .arg("bad.pep")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "2 errors were detected. No object code generated.",
        ))
        .stderr(predicate::str::contains("Error on line 1: Invalid mnemonic."))
        .stderr(predicate::str::contains(
            "Error on line 2: This instruction cannot have this addressing mode.",
        ));
    assert!(!dir.path().join("bad.pepo").exists());
}

#[test]
fn pep8_requires_the_os_image() {
    let dir = workspace();
    pep8(&dir)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not open file pep8os.pepo"));
}

#[test]
fn pep8_boots_and_dumps_memory() {
    let dir = workspace();
    // A stub OS image carrying only the four vectors at the top of memory:
    // user SP FB8F, system SP FB8F, loader PC 0000, trap PC 0000.
    fs::write(
        dir.path().join("pep8os.pepo"),
        "FB 8F FB 8F 00 00 00 00 zz\n",
    )
    .expect("os image");
    pep8(&dir)
        .write_stdin("d\n0000-0010\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("65528 bytes RAM free."))
        .stdout(predicate::str::contains(
            "(l)oad  e(x)ecute  (d)ump  (t)race  (i)nput  (o)utput  (q)uit:",
        ))
        .stdout(predicate::str::contains("0000:  00 00 00"));
}

#[test]
fn pep8_execute_requires_a_load_first() {
    let dir = workspace();
    fs::write(
        dir.path().join("pep8os.pepo"),
        "FB 8F FB 8F 00 00 00 00 zz\n",
    )
    .expect("os image");
    pep8(&dir)
        .write_stdin("x\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Execution error: Machine state not initialized.",
        ));
}
