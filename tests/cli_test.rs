use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

#[test]
fn encode_then_decode_round_trips_a_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("input.bin");
    let enc_path = temp_dir.path().join("input.hzr");
    let out_path = temp_dir.path().join("restored.bin");

    let original: Vec<u8> = (0..20_000u32).map(|i| ((i * 3) & 255) as u8).collect();
    std::fs::write(&in_path, &original)?;

    Command::cargo_bin("hzr")?
        .arg("encode")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&enc_path)
        .assert()
        .success();

    Command::cargo_bin("hzr")?
        .arg("decode")
        .arg("-i")
        .arg(&enc_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(out_path)?, original);
    Ok(())
}

#[test]
fn verify_succeeds_on_a_freshly_encoded_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("input.bin");
    let enc_path = temp_dir.path().join("input.hzr");

    std::fs::write(&in_path, vec![0u8; 100_000])?;

    Command::cargo_bin("hzr")?
        .arg("encode")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&enc_path)
        .assert()
        .success();

    Command::cargo_bin("hzr")?
        .arg("verify")
        .arg("-i")
        .arg(&enc_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("100000"));

    Ok(())
}

#[test]
fn verify_fails_on_a_corrupted_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("input.bin");
    let enc_path = temp_dir.path().join("input.hzr");

    let original: Vec<u8> = (0..5000u32).map(|i| ((i * 11) & 255) as u8).collect();
    std::fs::write(&in_path, &original)?;

    Command::cargo_bin("hzr")?
        .arg("encode")
        .arg("-i")
        .arg(&in_path)
        .arg("-o")
        .arg(&enc_path)
        .assert()
        .success();

    let mut encoded = std::fs::read(&enc_path)?;
    let tail = encoded.len() - 1;
    encoded[tail] ^= 0xFF;
    std::fs::write(&enc_path, &encoded)?;

    Command::cargo_bin("hzr")?
        .arg("verify")
        .arg("-i")
        .arg(&enc_path)
        .assert()
        .failure();

    Ok(())
}
