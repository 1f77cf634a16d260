use crate::*;
use assert_cmd::prelude::*;
use predicates::prelude::*;

pub fn tests(tests: &mut Vec<Trial>) {
    tests.push(Trial::test("behavior::test_cli_help", || {
        blobnav_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--root-prefix"))
            .stdout(predicate::str::contains("--allowed-extension"));
        Ok(())
    }));
    tests.push(Trial::test("behavior::test_cli_rejects_unknown_timezone", || {
        blobnav_cmd()
            .args(["--provider", "memory", "--timezone", "Mars/Olympus_Mons"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown timezone"));
        Ok(())
    }));
    tests.push(Trial::test("behavior::test_cli_rejects_unknown_provider", || {
        blobnav_cmd()
            .args(["--provider", "ftp"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported storage provider: ftp"));
        Ok(())
    }));
    tests.push(Trial::test("behavior::test_cli_rejects_bad_port", || {
        blobnav_cmd()
            .env("PORT", "not-a-port")
            .assert()
            .failure();
        Ok(())
    }));
}
