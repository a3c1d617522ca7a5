mod common;

use common::numbers;
use simple_storage::{CompressionType, Storage};
use std::collections::BTreeMap;
use test_log::test;

const COMPRESSION_TYPES: [CompressionType; 3] = [
    CompressionType::None,
    CompressionType::Deflate,
    CompressionType::Gzip,
];

#[test]
fn round_trip_stream() -> simple_storage::Result<()> {
    let storage = Storage::default();

    let mut value = BTreeMap::new();
    value.insert("a".to_string(), vec![Some(1_u64), None]);
    value.insert("b".to_string(), vec![]);
    value.insert("c".to_string(), vec![Some(u64::MAX)]);

    for compression in COMPRESSION_TYPES {
        let mut buf = vec![];
        storage.write_to(&value, &mut buf, compression)?;

        let reloaded: BTreeMap<String, Vec<Option<u64>>> =
            storage.read_from(&mut &buf[..], compression)?;
        assert_eq!(value, reloaded);
    }

    Ok(())
}

#[test]
fn round_trip_file() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let storage = Storage::default();

    let value = (String::from("hello"), 42_i32, [1.5_f64, -0.25], 'x');

    for compression in COMPRESSION_TYPES {
        let path = folder.path().join(format!("value.{compression}"));

        storage.write(&value, &path, compression)?;
        let reloaded: (String, i32, [f64; 2], char) = storage.read(&path, compression)?;

        assert_eq!(value, reloaded);
    }

    Ok(())
}

#[test]
fn round_trip_primitive() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("number");
    let storage = Storage::default();

    storage.write(&42_i32, &path, CompressionType::None)?;
    assert_eq!(42, storage.read::<i32, _>(&path, CompressionType::None)?);

    Ok(())
}

#[test]
fn round_trip_reread() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("numbers");
    let storage = Storage::default();

    let value = numbers(1_000);
    storage.write(&value, &path, CompressionType::Gzip)?;

    let first: Vec<i64> = storage.read(&path, CompressionType::Gzip)?;
    let second: Vec<i64> = storage.read(&path, CompressionType::Gzip)?;

    assert_eq!(value, first);
    assert_eq!(first, second);

    Ok(())
}

#[test]
fn round_trip_overwrite() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("value");
    let storage = Storage::default();

    storage.write(&"a much longer value".repeat(100), &path, CompressionType::None)?;
    storage.write(&String::from("short"), &path, CompressionType::None)?;

    assert_eq!(
        "short",
        storage.read::<String, _>(&path, CompressionType::None)?
    );

    Ok(())
}

#[test]
fn round_trip_large_payload() -> simple_storage::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("numbers.data");
    let storage = Storage::default();

    let value = numbers(4_096 * 1_024);
    storage.write(&value, &path, CompressionType::Deflate)?;

    // NOTE: The upper half of every integer is zero, so DEFLATE must win something
    let file_size = std::fs::metadata(&path)?.len();
    assert!(file_size < (value.len() * std::mem::size_of::<i64>()) as u64);

    let reloaded: Vec<i64> = storage.read(&path, CompressionType::Deflate)?;
    assert!(value == reloaded, "numbers should be equal");

    Ok(())
}

#[test]
fn round_trip_same_bytes() -> simple_storage::Result<()> {
    let storage = Storage::default();
    let value = numbers(100);

    let mut a = vec![];
    storage.write_to(&value, &mut a, CompressionType::None)?;

    let mut b = vec![];
    storage.write_to(&value, &mut b, CompressionType::None)?;

    assert_eq!(a, b);

    Ok(())
}

#[test]
fn round_trip_borrowed_roots() -> simple_storage::Result<()> {
    let storage = Storage::default();
    let value = vec![1_i64, 2, 3];

    for compression in COMPRESSION_TYPES {
        let mut buf = vec![];
        storage.write_to(&value[..], &mut buf, compression)?;
        let reloaded: Vec<i64> = storage.read_from(&mut &buf[..], compression)?;
        assert_eq!(value, reloaded);

        let mut buf = vec![];
        storage.write_to(&&value, &mut buf, compression)?;
        let reloaded: Vec<i64> = storage.read_from(&mut &buf[..], compression)?;
        assert_eq!(value, reloaded);

        let mut buf = vec![];
        storage.write_to("hello", &mut buf, compression)?;
        let reloaded: String = storage.read_from(&mut &buf[..], compression)?;
        assert_eq!("hello", reloaded);
    }

    Ok(())
}

#[test]
fn round_trip_borrowed_root_file() -> simple_storage::Result<()> {
    use simple_storage::Save;

    let folder = tempfile::tempdir()?;
    let path = folder.path().join("greeting");
    let storage = Storage::default();

    "hello".save(&storage, &path, CompressionType::Gzip)?;
    assert_eq!(
        "hello",
        storage.read::<String, _>(&path, CompressionType::Gzip)?
    );

    Ok(())
}
