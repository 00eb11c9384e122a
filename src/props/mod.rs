//! Typed property manager.
//!
//! Every behavior of the agent is configured through a table of typed,
//! keyed properties. Keys are stable 16-bit codes, values carry an array
//! cardinality (each index independently addressable) and attribute bits.
//! The table is built from a static definition at process start, optionally
//! overlaid with a persisted file, and is mutable both locally and by server
//! push for the whole life of the process.
//!
//! All operations are serialized by a single store-wide mutex; calls are
//! short and never block on I/O (except the explicit `save`/`load`).

pub mod keys;
mod table;

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use bitflags::bitflags;
use thiserror::Error;

pub use self::keys::PropKey;
use self::table::{PropDef, PROP_DEFS};

bitflags! {
	/// Property attribute bits.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct PropAttr: u8 {
		/// Rejects writes arriving from the wire (may still be set at boot).
		const READ_ONLY = 0x01;
		/// Never serialized in uplink reads.
		const WRITE_ONLY = 0x02;
		const HIDDEN = 0x04;
		/// Persisted by `save` when also `CHANGED`.
		const SAVE = 0x08;
		/// Set on any mutation that alters the stored bytes.
		const CHANGED = 0x10;
		/// Value differs from the static default.
		const NONDEFAULT = 0x20;
	}
}

/// Property value types.
///
/// `Dec32` is a fixed-point decimal: the scale is part of the static type
/// tag, external reads return `round(value * 10^scale)` and writes divide.
/// This keeps e.g. odometer values in 1-meter units and speeds in 0.1 km/h
/// without floating point on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropType {
	Boolean,
	UInt8,
	UInt16,
	UInt32,
	Int8,
	Int16,
	Int32,
	Dec32 { scale: u8 },
	Ascii,
	Binary,
}

impl PropType {
	fn is_numeric(self) -> bool {
		!matches!(self, PropType::Ascii | PropType::Binary)
	}

	fn is_signed(self) -> bool {
		matches!(self, PropType::Int8 | PropType::Int16 | PropType::Int32)
	}

	/// Wire width of one element in bytes.
	fn width(self) -> usize {
		match self {
			PropType::Boolean | PropType::UInt8 | PropType::Int8 => 1,
			PropType::UInt16 | PropType::Int16 => 2,
			PropType::UInt32 | PropType::Int32 | PropType::Dec32 { .. } => 4,
			PropType::Ascii | PropType::Binary => 0,
		}
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropError {
	#[error("property 0x{0:04X} not defined")]
	NotFound(PropKey),
	#[error("bad property value: {0}")]
	Value(String),
	#[error("property 0x{0:04X} is read-only")]
	ReadOnly(PropKey),
	#[error("property 0x{0:04X} is write-only")]
	WriteOnly(PropKey),
	#[error("index {1} out of range for property 0x{0:04X}")]
	Index(PropKey, usize),
}

#[derive(Debug, Clone, PartialEq)]
enum PropValue {
	Nums(Vec<i64>),
	Str(String),
	Bin(Vec<u8>),
}

struct PropEntry {
	def: &'static PropDef,
	attr: PropAttr,
	value: PropValue,
}

struct Inner {
	entries: Vec<PropEntry>,
	sorted: bool,
	save_by_name: bool,
	/// Foreign `name=value` lines from a persisted file, kept opaque so a
	/// downgrade does not lose state.
	unknown: Vec<(String, String)>,
}

/// The typed property store.
pub struct PropStore {
	inner: Mutex<Inner>,
}

impl Default for PropStore {
	fn default() -> Self {
		Self::new()
	}
}

impl PropStore {
	/// Build the store from the static definition table.
	pub fn new() -> Self {
		let entries: Vec<PropEntry> = PROP_DEFS
			.iter()
			.map(|def| {
				let mut value = default_value(def.ptype, def.dim);
				if !def.init.is_empty() {
					if let Err(err) = apply_str(def, &mut value, def.init) {
						warn!("bad init string for {}: {err}", def.name);
					}
				}
				PropEntry {
					def,
					attr: def.attr,
					value,
				}
			})
			.collect();

		let sorted = entries.windows(2).all(|w| w[0].def.key < w[1].def.key);
		if !sorted {
			warn!("property table is not sorted by key, lookups fall back to a linear scan");
		}

		PropStore {
			inner: Mutex::new(Inner {
				entries,
				sorted,
				save_by_name: true,
				unknown: Vec::new(),
			}),
		}
	}

	/// Save persisted entries keyed by hex code instead of name.
	pub fn set_save_by_name(&self, by_name: bool) {
		self.inner.lock().unwrap().save_by_name = by_name;
	}

	// --- getters ------------------------------------------------------------

	pub fn get_u32(&self, key: PropKey, dft: u32) -> u32 {
		self.get_u32_at(key, 0, dft)
	}

	pub fn get_u32_at(&self, key: PropKey, ndx: usize, dft: u32) -> u32 {
		let inner = self.inner.lock().unwrap();
		match inner.find(key).map(|i| &inner.entries[i].value) {
			Some(PropValue::Nums(v)) if ndx < v.len() => v[ndx] as u32,
			_ => dft,
		}
	}

	pub fn get_i32_at(&self, key: PropKey, ndx: usize, dft: i32) -> i32 {
		let inner = self.inner.lock().unwrap();
		match inner.find(key).map(|i| &inner.entries[i].value) {
			Some(PropValue::Nums(v)) if ndx < v.len() => v[ndx] as i32,
			_ => dft,
		}
	}

	pub fn get_string(&self, key: PropKey, dft: &str) -> String {
		let inner = self.inner.lock().unwrap();
		match inner.find(key).map(|i| &inner.entries[i].value) {
			Some(PropValue::Str(s)) => s.clone(),
			_ => String::from(dft),
		}
	}

	pub fn attr(&self, key: PropKey) -> Option<PropAttr> {
		let inner = self.inner.lock().unwrap();
		inner.find(key).map(|i| inner.entries[i].attr)
	}

	pub fn is_changed(&self, key: PropKey) -> bool {
		self.attr(key)
			.is_some_and(|a| a.contains(PropAttr::CHANGED))
	}

	// --- setters ------------------------------------------------------------

	pub fn set_u32(&self, key: PropKey, value: u32) -> Result<(), PropError> {
		self.set_u32_at(key, 0, value)
	}

	pub fn set_u32_at(&self, key: PropKey, ndx: usize, value: u32) -> Result<(), PropError> {
		self.mutate(key, false, |entry| {
			set_num_at(entry, ndx, i64::from(value))
		})
	}

	pub fn set_i32_at(&self, key: PropKey, ndx: usize, value: i32) -> Result<(), PropError> {
		self.mutate(key, false, |entry| {
			set_num_at(entry, ndx, i64::from(value))
		})
	}

	/// Add a delta to an unsigned counter property (index 0).
	pub fn add_u32(&self, key: PropKey, delta: u32) -> Result<(), PropError> {
		self.mutate(key, false, |entry| match &mut entry.value {
			PropValue::Nums(v) if !v.is_empty() => {
				v[0] = i64::from((v[0] as u32).wrapping_add(delta));
				Ok(())
			}
			_ => Err(PropError::Value(format!(
				"{} is not a numeric property",
				entry.def.name
			))),
		})
	}

	pub fn set_string(&self, key: PropKey, value: &str) -> Result<(), PropError> {
		self.mutate(key, false, |entry| match &mut entry.value {
			PropValue::Str(s) => {
				*s = String::from(value);
				Ok(())
			}
			_ => Err(PropError::Value(format!(
				"{} is not a string property",
				entry.def.name
			))),
		})
	}

	/// Parse and store a comma-separated value list (the init-string / file
	/// syntax). Fewer indices than the arity leave the tail unchanged; extra
	/// indices are silently dropped.
	pub fn set_from_str(&self, key: PropKey, value: &str) -> Result<(), PropError> {
		self.mutate(key, false, |entry| {
			let mut tmp = entry.value.clone();
			apply_str(entry.def, &mut tmp, value)?;
			entry.value = tmp;
			Ok(())
		})
	}

	/// Boot-time variant of [`set_from_str`](Self::set_from_str): bypasses
	/// the `READ_ONLY` attribute.
	pub fn init_from_str(&self, key: PropKey, value: &str) -> Result<(), PropError> {
		self.mutate(key, true, |entry| {
			let mut tmp = entry.value.clone();
			apply_str(entry.def, &mut tmp, value)?;
			entry.value = tmp;
			Ok(())
		})
	}

	fn mutate<F>(&self, key: PropKey, at_boot: bool, f: F) -> Result<(), PropError>
	where
		F: FnOnce(&mut PropEntry) -> Result<(), PropError>,
	{
		let mut inner = self.inner.lock().unwrap();
		let i = inner.find(key).ok_or(PropError::NotFound(key))?;
		let entry = &mut inner.entries[i];
		if !at_boot && entry.attr.contains(PropAttr::READ_ONLY) {
			return Err(PropError::ReadOnly(key));
		}
		let before = entry.value.clone();
		f(entry)?;
		if entry.value != before {
			entry.attr |= PropAttr::CHANGED | PropAttr::NONDEFAULT;
		}
		Ok(())
	}

	// --- change tracking ----------------------------------------------------

	pub fn changed_keys(&self) -> Vec<PropKey> {
		let inner = self.inner.lock().unwrap();
		inner
			.entries
			.iter()
			.filter(|e| e.attr.contains(PropAttr::CHANGED))
			.map(|e| e.def.key)
			.collect()
	}

	pub fn clear_changed(&self) {
		let mut inner = self.inner.lock().unwrap();
		for entry in &mut inner.entries {
			entry.attr -= PropAttr::CHANGED;
		}
	}

	// --- textual form -------------------------------------------------------

	/// Serialize one property as a `name=value` line.
	pub fn serialize(&self, key: PropKey) -> Result<String, PropError> {
		let inner = self.inner.lock().unwrap();
		let i = inner.find(key).ok_or(PropError::NotFound(key))?;
		let entry = &inner.entries[i];
		Ok(format!("{}={}", entry.def.name, value_to_str(entry)))
	}

	// --- wire codec ---------------------------------------------------------

	/// Encode the current value for an uplink property read.
	pub fn to_wire(&self, key: PropKey) -> Result<Vec<u8>, PropError> {
		let inner = self.inner.lock().unwrap();
		let i = inner.find(key).ok_or(PropError::NotFound(key))?;
		let entry = &inner.entries[i];
		if entry.attr.contains(PropAttr::WRITE_ONLY) {
			return Err(PropError::WriteOnly(key));
		}
		let mut out = Vec::new();
		match &entry.value {
			PropValue::Nums(v) => {
				let width = entry.def.ptype.width();
				for &n in v {
					out.extend_from_slice(&(n as u32).to_be_bytes()[4 - width..]);
				}
			}
			PropValue::Str(s) => out.extend_from_slice(s.as_bytes()),
			PropValue::Bin(b) => out.extend_from_slice(b),
		}
		Ok(out)
	}

	/// Decode a server property write.
	///
	/// Numeric payloads shorter than the full width are split evenly across
	/// the elements (a remainder is an error) and right-aligned, with the
	/// sign bit extended for signed types. A zero-length payload reads as 0.
	pub fn set_from_wire(&self, key: PropKey, data: &[u8]) -> Result<(), PropError> {
		self.mutate(key, false, |entry| {
			match &mut entry.value {
				PropValue::Str(s) => {
					let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
					let text = std::str::from_utf8(&data[..end])
						.map_err(|_| PropError::Value(String::from("non-UTF8 string payload")))?;
					*s = String::from(text);
				}
				PropValue::Bin(b) => *b = data.to_vec(),
				PropValue::Nums(v) => {
					let signed = entry.def.ptype.is_signed();
					let width = entry.def.ptype.width();
					let dim = v.len();
					if data.is_empty() {
						v.iter_mut().for_each(|n| *n = 0);
					} else {
						let per = if data.len() >= width * dim {
							width
						} else {
							if data.len() % dim != 0 {
								return Err(PropError::Value(format!(
									"payload of {} bytes does not divide into {dim} elements",
									data.len()
								)));
							}
							data.len() / dim
						};
						for (n, chunk) in v.iter_mut().zip(data.chunks(per)) {
							*n = parse_be(chunk, signed);
						}
					}
				}
			}
			Ok(())
		})
	}

	// --- persistence --------------------------------------------------------

	/// Write `SAVE`-attributed entries whose `CHANGED` bit is set, one
	/// `name=value` (or `0xKEY=value`) line each, plus any foreign lines
	/// carried over from a previous load.
	pub fn save(&self, path: &Path) -> io::Result<()> {
		let inner = self.inner.lock().unwrap();
		let mut out = String::from("# dmtp-agent properties\n");
		for entry in &inner.entries {
			if !entry.attr.contains(PropAttr::SAVE) || !entry.attr.contains(PropAttr::CHANGED) {
				continue;
			}
			if inner.save_by_name {
				let _ = writeln!(out, "{}={}", entry.def.name, value_to_str(entry));
			} else {
				let _ = writeln!(out, "0x{:04X}={}", entry.def.key, value_to_str(entry));
			}
		}
		for (name, value) in &inner.unknown {
			let _ = writeln!(out, "{name}={value}");
		}
		fs::write(path, out)
	}

	/// Overlay the store with a persisted property file.
	///
	/// Parsing is permissive: comment (`#`) and blank lines are skipped,
	/// trailing whitespace is stripped, and unknown keys are preserved
	/// verbatim for the next save. Returns the number of entries applied.
	pub fn load(&self, path: &Path) -> io::Result<usize> {
		let text = match fs::read_to_string(path) {
			Ok(text) => text,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
			Err(err) => return Err(err),
		};

		let mut applied = 0;
		for line in text.lines() {
			let line = line.trim_end();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}
			let Some((name, value)) = line.split_once('=') else {
				warn!("malformed property line ignored: {line:?}");
				continue;
			};
			match self.key_for(name) {
				Some(key) => match self.init_from_str(key, value) {
					Ok(()) => {
						// a file entry is nondefault by definition
						let mut inner = self.inner.lock().unwrap();
						if let Some(i) = inner.find(key) {
							inner.entries[i].attr |= PropAttr::NONDEFAULT;
						}
						applied += 1;
					}
					Err(err) => warn!("property {name}: {err}"),
				},
				None => {
					debug!("unknown property {name} kept as opaque");
					let mut inner = self.inner.lock().unwrap();
					inner
						.unknown
						.push((String::from(name), String::from(value)));
				}
			}
		}
		Ok(applied)
	}

	/// Resolve a property file key: a name, `0xHHHH`, or bare hex code.
	fn key_for(&self, name: &str) -> Option<PropKey> {
		let inner = self.inner.lock().unwrap();
		if let Some(entry) = inner.entries.iter().find(|e| e.def.name == name) {
			return Some(entry.def.key);
		}
		let hex = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X"));
		let code = PropKey::from_str_radix(hex.unwrap_or(name), 16).ok()?;
		inner.find(code).map(|i| inner.entries[i].def.key)
	}
}

impl Inner {
	fn find(&self, key: PropKey) -> Option<usize> {
		if self.sorted {
			self.entries.binary_search_by_key(&key, |e| e.def.key).ok()
		} else {
			self.entries.iter().position(|e| e.def.key == key)
		}
	}
}

// --- value helpers ----------------------------------------------------------

fn default_value(ptype: PropType, dim: usize) -> PropValue {
	match ptype {
		PropType::Ascii => PropValue::Str(String::new()),
		PropType::Binary => PropValue::Bin(Vec::new()),
		_ => PropValue::Nums(vec![0; dim]),
	}
}

fn set_num_at(entry: &mut PropEntry, ndx: usize, value: i64) -> Result<(), PropError> {
	match &mut entry.value {
		PropValue::Nums(v) => {
			if ndx >= v.len() {
				return Err(PropError::Index(entry.def.key, ndx));
			}
			v[ndx] = value;
			Ok(())
		}
		_ => Err(PropError::Value(format!(
			"{} is not a numeric property",
			entry.def.name
		))),
	}
}

/// Apply the comma-separated textual form onto `value`.
fn apply_str(def: &PropDef, value: &mut PropValue, text: &str) -> Result<(), PropError> {
	match value {
		PropValue::Str(s) => {
			*s = String::from(text);
			Ok(())
		}
		PropValue::Bin(b) => {
			*b = parse_hex_str(text)?;
			Ok(())
		}
		PropValue::Nums(v) => {
			for (slot, field) in v.iter_mut().zip(text.split(',')) {
				*slot = parse_literal(def.ptype, field.trim())?;
			}
			// extra fields beyond the arity are dropped without complaint
			Ok(())
		}
	}
}

fn parse_literal(ptype: PropType, text: &str) -> Result<i64, PropError> {
	if text.is_empty() {
		return Ok(0);
	}
	if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
		return i64::from_str_radix(hex, 16).map_err(|_| PropError::Value(String::from(text)));
	}
	match ptype {
		PropType::Boolean => match text {
			"true" | "yes" => Ok(1),
			"false" | "no" => Ok(0),
			_ => text
				.parse::<i64>()
				.map(|v| i64::from(v != 0))
				.map_err(|_| PropError::Value(String::from(text))),
		},
		PropType::Dec32 { scale } => parse_decimal(text, scale),
		_ => text
			.parse::<i64>()
			.map_err(|_| PropError::Value(String::from(text))),
	}
}

/// Parse a decimal literal into a fixed-point integer scaled by `10^scale`,
/// rounding half away from zero. Done on the digits to keep e.g. `12.35`
/// exact where a float detour would not.
fn parse_decimal(text: &str, scale: u8) -> Result<i64, PropError> {
	let bad = || PropError::Value(String::from(text));
	let (neg, digits) = match text.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, text.strip_prefix('+').unwrap_or(text)),
	};
	let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
	if int_part.is_empty() && frac_part.is_empty() {
		return Err(bad());
	}
	if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
	{
		return Err(bad());
	}

	let mut value: i64 = if int_part.is_empty() {
		0
	} else {
		int_part.parse().map_err(|_| bad())?
	};
	let frac = frac_part.as_bytes();
	for i in 0..usize::from(scale) {
		let digit = frac.get(i).map_or(0, |b| i64::from(b - b'0'));
		value = value
			.checked_mul(10)
			.and_then(|v| v.checked_add(digit))
			.ok_or_else(bad)?;
	}
	if frac
		.get(usize::from(scale))
		.is_some_and(|&b| b - b'0' >= 5)
	{
		value += 1;
	}
	Ok(if neg { -value } else { value })
}

fn parse_hex_str(text: &str) -> Result<Vec<u8>, PropError> {
	let digits = text
		.strip_prefix("0x")
		.or_else(|| text.strip_prefix("0X"))
		.unwrap_or(text);
	if digits.len() % 2 != 0 || !digits.is_ascii() {
		return Err(PropError::Value(String::from(text)));
	}
	(0..digits.len())
		.step_by(2)
		.map(|i| {
			u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| PropError::Value(String::from(text)))
		})
		.collect()
}

fn value_to_str(entry: &PropEntry) -> String {
	match &entry.value {
		PropValue::Str(s) => s.clone(),
		PropValue::Bin(b) => {
			let mut out = String::from("0x");
			for byte in b {
				let _ = write!(out, "{byte:02X}");
			}
			out
		}
		PropValue::Nums(v) => {
			let fields: Vec<String> = v.iter().map(|&n| num_to_str(entry.def.ptype, n)).collect();
			fields.join(",")
		}
	}
}

fn num_to_str(ptype: PropType, value: i64) -> String {
	match ptype {
		PropType::Dec32 { scale } if scale > 0 => {
			let div = 10i64.pow(u32::from(scale));
			let sign = if value < 0 { "-" } else { "" };
			let abs = value.abs();
			format!(
				"{sign}{}.{:0width$}",
				abs / div,
				abs % div,
				width = scale as usize
			)
		}
		_ => value.to_string(),
	}
}

/// Big-endian integer parse with optional sign extension.
fn parse_be(chunk: &[u8], signed: bool) -> i64 {
	let mut acc: u64 = 0;
	for &b in chunk {
		acc = (acc << 8) | u64::from(b);
	}
	if signed && !chunk.is_empty() && chunk[0] & 0x80 != 0 {
		let bits = chunk.len() * 8;
		if bits < 64 {
			acc |= !0u64 << bits;
		}
	}
	acc as i64
}

#[cfg(test)]
mod tests {
	use super::keys::*;
	use super::*;

	#[test]
	fn table_is_sorted_and_lookup_finds_every_key() {
		let store = PropStore::new();
		let inner = store.inner.lock().unwrap();
		assert!(inner.sorted);
		for (i, def) in PROP_DEFS.iter().enumerate() {
			assert_eq!(inner.find(def.key), Some(i), "key 0x{:04X}", def.key);
		}
		assert_eq!(inner.find(0x0042), None);
	}

	#[test]
	fn property_write_sets_changed() {
		let store = PropStore::new();
		assert_eq!(store.get_u32(PROP_IBOX_MID, 147), 147);
		assert!(!store.is_changed(PROP_IBOX_MID));

		store.set_u32(PROP_IBOX_MID, 200).unwrap();
		assert!(store.is_changed(PROP_IBOX_MID));
		assert_eq!(store.get_u32(PROP_IBOX_MID, 147), 200);
		assert_eq!(store.serialize(PROP_IBOX_MID).unwrap(), "ibox.mid=200");

		store.clear_changed();
		assert!(!store.is_changed(PROP_IBOX_MID));
	}

	#[test]
	fn roundtrip_is_a_noop() {
		let store = PropStore::new();
		for def in PROP_DEFS {
			let line = store.serialize(def.key).unwrap();
			let (_, value) = line.split_once('=').unwrap();
			store.init_from_str(def.key, value).unwrap();
			assert!(
				!store.is_changed(def.key),
				"{} changed by a no-op rewrite",
				def.name
			);
		}
	}

	#[test]
	fn partial_index_set_leaves_tail_unchanged() {
		let store = PropStore::new();
		// ibox.96.request defaults to "0,1"
		store.set_from_str(PROP_IBOX_96_REQUEST, "30").unwrap();
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 0, 0), 30);
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 1, 0), 1);
		// extra indices are silently truncated
		store.set_from_str(PROP_IBOX_96_REQUEST, "5,2,99,99").unwrap();
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 0, 0), 5);
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 1, 0), 2);
	}

	#[test]
	fn vector_index_bounds_are_enforced() {
		let store = PropStore::new();
		assert_eq!(
			store.set_u32_at(PROP_IBOX_96_REQUEST, 2, 1),
			Err(PropError::Index(PROP_IBOX_96_REQUEST, 2))
		);
	}

	#[test]
	fn read_only_rejects_wire_writes_but_not_boot() {
		let store = PropStore::new();
		assert_eq!(
			store.set_from_str(PROP_CFG_GPS_BPS, "4800"),
			Err(PropError::ReadOnly(PROP_CFG_GPS_BPS))
		);
		store.init_from_str(PROP_CFG_GPS_BPS, "4800").unwrap();
		assert_eq!(store.get_u32(PROP_CFG_GPS_BPS, 0), 4800);
	}

	#[test]
	fn write_only_never_serializes_for_uplink() {
		let store = PropStore::new();
		assert_eq!(
			store.to_wire(PROP_IBOX_205_COMMAND),
			Err(PropError::WriteOnly(PROP_IBOX_205_COMMAND))
		);
	}

	#[test]
	fn unknown_key_is_not_fatal() {
		let store = PropStore::new();
		assert_eq!(store.set_u32(0x0042, 1), Err(PropError::NotFound(0x0042)));
		assert_eq!(store.get_u32(0x0042, 7), 7);
	}

	#[test]
	fn dec32_rounds_half_away_from_zero() {
		let store = PropStore::new();
		store.set_from_str(PROP_GPS_MIN_SPEED, "12.35").unwrap();
		assert_eq!(store.get_u32(PROP_GPS_MIN_SPEED, 0), 124);
		store.set_from_str(PROP_MOTION_EXCESS_SPEED, "-0.25").unwrap();
		assert_eq!(store.get_i32_at(PROP_MOTION_EXCESS_SPEED, 0, 0), -3);
		assert_eq!(
			store.serialize(PROP_MOTION_EXCESS_SPEED).unwrap(),
			"mot.exspeed=-0.3"
		);
	}

	#[test]
	fn hex_literals_are_accepted() {
		let store = PropStore::new();
		store
			.set_from_str(PROP_RFID_COMPANY_ID_RANGE, "0x10,0xFFFFFF")
			.unwrap();
		assert_eq!(store.get_u32_at(PROP_RFID_COMPANY_ID_RANGE, 0, 0), 0x10);
		assert_eq!(
			store.get_u32_at(PROP_RFID_COMPANY_ID_RANGE, 1, 0),
			0xFF_FFFF
		);
	}

	#[test]
	fn wire_write_full_width() {
		let store = PropStore::new();
		store
			.set_from_wire(PROP_IBOX_96_REQUEST, &[0, 0, 0, 30, 0, 0, 0, 2])
			.unwrap();
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 0, 0), 30);
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 1, 0), 2);
	}

	#[test]
	fn wire_write_short_payload_right_aligns() {
		let store = PropStore::new();
		// two u32 elements from two bytes: one byte each
		store.set_from_wire(PROP_IBOX_96_REQUEST, &[30, 2]).unwrap();
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 0, 0), 30);
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 1, 0), 2);

		// sign extension for signed types
		store.set_from_wire(PROP_TEMP_RANGE_0, &[0xFF, 0x05]).unwrap();
		assert_eq!(store.get_i32_at(PROP_TEMP_RANGE_0, 0, 0), -1);
		assert_eq!(store.get_i32_at(PROP_TEMP_RANGE_0, 1, 0), 5);

		// uneven split is a value error
		assert!(matches!(
			store.set_from_wire(PROP_IBOX_96_REQUEST, &[1, 2, 3]),
			Err(PropError::Value(_))
		));

		// empty payload reads as zero
		store.set_from_wire(PROP_IBOX_96_REQUEST, &[]).unwrap();
		assert_eq!(store.get_u32_at(PROP_IBOX_96_REQUEST, 0, 7), 0);
	}

	#[test]
	fn wire_read_is_big_endian() {
		let store = PropStore::new();
		store.set_u32(PROP_IBOX_MID, 0x0102_0304).unwrap();
		assert_eq!(store.to_wire(PROP_IBOX_MID).unwrap(), vec![1, 2, 3, 4]);
		store.set_i32_at(PROP_TEMP_RANGE_0, 0, -1).unwrap();
		assert_eq!(
			store.to_wire(PROP_TEMP_RANGE_0).unwrap(),
			vec![0xFF, 0xFF, 0x00, 0x00]
		);
	}
}
