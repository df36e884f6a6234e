use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

fn write_image(dir: &tempfile::TempDir, blocks: &[[u8; 16]]) -> PathBuf {
    let path = dir.path().join("tag.img");
    let mut data = Vec::with_capacity(blocks.len() * 16);
    for block in blocks {
        data.extend_from_slice(block);
    }
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn prints_descriptor_and_blocks() {
    let dir = tempdir().unwrap();
    let block0 = [
        0xAA, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, //
        0x00, 0x00, 0x0F, 0xF0, 0xE1, 0x10, 0x6D, 0x00,
    ];
    let block1 = *b"hello, tag memor";
    let image = write_image(&dir, &[block0, block1]);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("tagmem-dump")
        .arg(&image)
        .args(["--count", "2"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("device address: 0xAA"), "{stdout}");
    assert!(stdout.contains("serial:         01:02:03:04:05:06"), "{stdout}");
    assert!(stdout.contains("E1:10:6D:00"), "{stdout}");
    assert!(stdout.contains("|hello,.tag.memor|"), "{stdout}");
}

#[test]
fn prints_named_config_registers() {
    let dir = tempdir().unwrap();
    // Image reaching the configuration block, with WDT_LS programmed.
    let mut blocks = [[0u8; 16]; 0x3B];
    blocks[0x3A][3] = 0x48;
    let image = write_image(&dir, &blocks);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("tagmem-dump")
        .arg(&image)
        .args(["--count", "1", "--config"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("WDT_LS            0x48"), "{stdout}");
    assert!(stdout.contains("REG_LOCK          0x00"), "{stdout}");
}

#[test]
fn rejects_misaligned_images() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.img");
    fs::write(&path, [0u8; 17]).unwrap();

    let assert = assert_cmd::cargo::cargo_bin_cmd!("tagmem-dump")
        .arg(&path)
        .assert()
        .failure();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(
        stderr.contains("multiple of the 16-byte block size"),
        "{stderr}"
    );
}

#[test]
fn rejects_out_of_range_block_window() {
    let dir = tempdir().unwrap();
    let image = write_image(&dir, &[[0u8; 16]]);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("tagmem-dump")
        .arg(&image)
        .args(["--start", "0", "--count", "8"])
        .assert()
        .failure();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("outside the 1-block image"), "{stderr}");
}
