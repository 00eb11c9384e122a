//! Persistence behavior of the property store.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dmtp_agent::props::keys::{PROP_COMM_HOST, PROP_GPS_MIN_SPEED, PROP_IBOX_MID};
use dmtp_agent::props::PropStore;

fn temp_file(tag: &str) -> PathBuf {
	std::env::temp_dir().join(format!("dmtp_props_{tag}_{}", std::process::id()))
}

#[test]
fn save_and_reload_round_trip() {
	let path = temp_file("roundtrip");
	let _ = fs::remove_file(&path);

	let store = PropStore::new();
	store.set_u32(PROP_IBOX_MID, 200).unwrap();
	store.set_string(PROP_COMM_HOST, "dmtp.example.net").unwrap();
	store.set_from_str(PROP_GPS_MIN_SPEED, "12.5").unwrap();
	store.save(&path).unwrap();

	let fresh = PropStore::new();
	let applied = fresh.load(&path).unwrap();
	assert_eq!(applied, 3);
	assert_eq!(fresh.get_u32(PROP_IBOX_MID, 147), 200);
	assert_eq!(fresh.get_string(PROP_COMM_HOST, ""), "dmtp.example.net");
	assert_eq!(fresh.get_u32(PROP_GPS_MIN_SPEED, 0), 125);
	// a loaded nondefault value counts as changed, so the next save keeps it
	assert!(fresh.is_changed(PROP_IBOX_MID));

	fs::remove_file(&path).unwrap();
}

#[test]
fn unknown_keys_survive_a_save_load_cycle() {
	let path = temp_file("unknown");
	fs::write(&path, "# persisted by a newer build\nfuture.key=42,43\nibox.mid=180\n").unwrap();

	let store = PropStore::new();
	assert_eq!(store.load(&path).unwrap(), 1);
	assert_eq!(store.get_u32(PROP_IBOX_MID, 147), 180);

	let out = temp_file("unknown_out");
	store.save(&out).unwrap();
	let text = fs::read_to_string(&out).unwrap();
	assert!(text.contains("future.key=42,43"), "{text}");
	assert!(text.contains("ibox.mid=180"), "{text}");

	fs::remove_file(&path).unwrap();
	fs::remove_file(&out).unwrap();
}

#[test]
fn hex_coded_keys_and_comments_are_accepted() {
	let path = temp_file("hexkeys");
	fs::write(&path, "# comment line\n0xEF31=163   \n").unwrap();

	let store = PropStore::new();
	assert_eq!(store.load(&path).unwrap(), 1);
	assert_eq!(store.get_u32(PROP_IBOX_MID, 147), 163);

	fs::remove_file(&path).unwrap();
}

#[test]
fn save_by_code_writes_hex_keys() {
	let path = temp_file("bycode");
	let _ = fs::remove_file(&path);

	let store = PropStore::new();
	store.set_save_by_name(false);
	store.set_u32(PROP_IBOX_MID, 201).unwrap();
	store.save(&path).unwrap();

	let text = fs::read_to_string(&path).unwrap();
	assert!(text.contains("0xEF31=201"), "{text}");

	// and the hex-coded form loads back
	let fresh = PropStore::new();
	assert_eq!(fresh.load(&path).unwrap(), 1);
	assert_eq!(fresh.get_u32(PROP_IBOX_MID, 0), 201);

	fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_not_an_error() {
	let store = PropStore::new();
	assert_eq!(store.load(&temp_file("never_written")).unwrap(), 0);
}

#[test]
fn only_changed_save_entries_are_written() {
	let path = temp_file("changed_only");
	let _ = fs::remove_file(&path);

	let store = PropStore::new();
	store.set_u32(PROP_IBOX_MID, 222).unwrap();
	store.clear_changed();
	store.set_string(PROP_COMM_HOST, "one.example.net").unwrap();
	store.save(&path).unwrap();

	let text = fs::read_to_string(&path).unwrap();
	assert!(text.contains("com.host=one.example.net"), "{text}");
	assert!(!text.contains("ibox.mid"), "{text}");

	fs::remove_file(&path).unwrap();
}
