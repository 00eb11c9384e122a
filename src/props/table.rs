//! Static property definition table.
//!
//! The table must be kept in ascending key order; the store verifies this at
//! startup and falls back to a linear scan if the ordering has been broken
//! by an edit.

use super::keys::*;
use super::{PropAttr, PropType};

pub(super) struct PropDef {
	pub key: PropKey,
	pub name: &'static str,
	pub ptype: PropType,
	pub attr: PropAttr,
	pub dim: usize,
	pub init: &'static str,
}

const RO: PropAttr = PropAttr::READ_ONLY;
const WO: PropAttr = PropAttr::WRITE_ONLY;
const SAVE: PropAttr = PropAttr::SAVE;
const HS: PropAttr = PropAttr::HIDDEN.union(PropAttr::SAVE);

use PropType::{Ascii, Binary, Boolean, Int16, UInt32, UInt8};
const DEC0: PropType = PropType::Dec32 { scale: 0 };
const DEC1: PropType = PropType::Dec32 { scale: 1 };

macro_rules! def {
	($key:expr, $name:literal, $ptype:expr, $attr:expr, $dim:expr, $init:literal) => {
		PropDef {
			key: $key,
			name: $name,
			ptype: $ptype,
			attr: $attr,
			dim: $dim,
			init: $init,
		}
	};
}

#[rustfmt::skip]
pub(super) static PROP_DEFS: &[PropDef] = &[
	// --- GPS serial port configuration
	def!(PROP_CFG_GPS_PORT,              "cfg.gps.port",              Ascii,   RO,   1, "ttyS3"),
	def!(PROP_CFG_GPS_BPS,               "cfg.gps.bps",               UInt32,  RO,   1, "9600"),
	def!(PROP_CFG_GPS_MODEL,             "cfg.gps.model",             Ascii,   RO,   1, "sirf"),
	// --- iBox configuration
	def!(PROP_IBOX_PORT,                 "ibox.port",                 Ascii,   SAVE, 1, "/dev/ttyS1"),
	def!(PROP_IBOX_MID,                  "ibox.mid",                  UInt32,  SAVE, 1, "147"),
	def!(PROP_IBOX_96_REQUEST,           "ibox.96.request",           UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_168_REQUEST,          "ibox.168.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_171_REQUEST,          "ibox.171.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_200_REQUEST,          "ibox.200.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_201_REQUEST,          "ibox.201.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_202_REQUEST,          "ibox.202.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_203_REQUEST,          "ibox.203.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_207_REQUEST,          "ibox.207.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_234_REQUEST,          "ibox.234.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_235_REQUEST,          "ibox.235.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_243_REQUEST,          "ibox.243.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_246_REQUEST,          "ibox.246.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_247_REQUEST,          "ibox.247.request",          UInt32,  SAVE, 2, "0,1"),
	def!(PROP_IBOX_205_COMMAND,          "ibox.205.command",          Ascii,   WO,   1, ""),
	def!(PROP_IBOX_205_COMMAND_TIMEOUT,  "ibox.205.cmd.timeout",      UInt32,  SAVE, 1, "1"),
	def!(PROP_IBOX_206_COMMAND,          "ibox.206.command",          Ascii,   WO,   1, ""),
	def!(PROP_IBOX_206_COMMAND_TIMEOUT,  "ibox.206.cmd.timeout",      UInt32,  SAVE, 1, "1"),
	def!(PROP_IBOX_208_COMMAND,          "ibox.208.command",          Ascii,   WO,   1, ""),
	def!(PROP_IBOX_208_COMMAND_TIMEOUT,  "ibox.208.cmd.timeout",      UInt32,  SAVE, 1, "1"),
	// --- RFID reader configuration
	def!(PROP_RFID_READER_ENABLE,        "rfid.reader.enable",        UInt8,   SAVE, 1, "1"),
	def!(PROP_RFID_READER_PORT,          "rfid.reader.port",          Ascii,   SAVE, 1, "ttyS1"),
	def!(PROP_RFID_READER_BPS,           "rfid.reader.bps",           UInt32,  SAVE, 1, "115200"),
	def!(PROP_RFID_COMPANY_ID_RANGE,     "rfid.company.id.range",     UInt32,  SAVE, 2, "1,0xFFFFFF"),
	def!(PROP_RFID_PRIMARY_ID_DIVISOR,   "rfid.primary.id.divisor",   UInt32,  SAVE, 2, "1,0"),
	def!(PROP_RFID_IN_MOTION,            "rfid.in.motion",            UInt32,  SAVE, 2, "6,60"),
	def!(PROP_RFID_PRIMARY_ID,           "rfid.primary.id",           UInt32,  SAVE, 1, "0"),
	def!(PROP_RFID_PRIMARY_ID_RANGE,     "rfid.primary.id.range",     UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_LOCK_ID_RANGE,        "rfid.lock.id.range",        UInt32,  SAVE, 5, "0,0,10,15,40"),
	def!(PROP_RFID_PRIMARY_RSSI_TIMER,   "rfid.primary.rssi.timer",   UInt32,  SAVE, 1, "120"),
	def!(PROP_RFID_PRIMARY_RSSI,         "rfid.primary.rssi",         UInt8,   SAVE, 2, "10,100"),
	def!(PROP_RFID_SWITCH_ID_RANGE,      "rfid.switch.id.range",      UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_CARGO_MIN_RSSI,       "rfid.cargo.rssi",           UInt8,   SAVE, 1, "0"),
	def!(PROP_RFID_CARGO_ID_RANGE,       "rfid.cargo.id.range",       UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_CARGO_SAMPLE_MODE,    "rfid.cargo.sample.mode",    UInt8,   SAVE, 1, "0"),
	def!(PROP_RFID_HIGHTEMP_ID_RANGE,    "rfid.hightemp.id.range",    UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_BATTERY_LIFE_MAX,     "rfid.battery.runtime.max",  UInt8,   SAVE, 1, "255"),
	def!(PROP_RFID_LOCK_REPORT_INTRVL,   "rfid.lock.rpt.intrvl",      UInt32,  SAVE, 3, "60,60,1"),
	def!(PROP_RFID_HIGHTEMP_REPORT_INTRVL, "rfid.hightemp.update.intrvl", UInt32, SAVE, 1, "60"),
	def!(PROP_RFID_BATTERY_ALARM_INTRVL, "rfid.battery.alarm.intrvl", UInt32,  SAVE, 1, "3600"),
	def!(PROP_RFID_SWITCH_REPORT_INTRVL, "rfid.switch.rpt.intrvl",    UInt32,  SAVE, 2, "0,0"),
	def!(PROP_RFID_CARGO_REPORT_INTRVL,  "rfid.in.range.update.intrvl", UInt32, SAVE, 1, "30"),
	def!(PROP_RFID_HIGHTEMP_ID_RANGE_2,  "rfid.hightemp.id.range_2",  UInt32,  SAVE, 2, "0,0"),
	def!(PROP_RFID_MOTION_ID_RANGE,      "rfid.motion.id.range",      UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_MOTION_REPORT_RATE,   "rfid.motion.rpt.rate",      UInt32,  SAVE, 1, "0"),
	def!(PROP_RFID_SENSOR_ID_RANGE,      "rfid.sensor.id.range",      UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_SENSOR_REPORT_INTRVL, "rfid.sensor.rpt.intrvl",    UInt32,  SAVE, 1, "30"),
	def!(PROP_RFID_HUMIDITY_ID_RANGE,    "rfid.humidity.id.range",    UInt32,  SAVE, 5, "0,0,30,45,120"),
	def!(PROP_RFID_HUMIDITY_REPORT_INTRVL, "rfid.humidity.rpt.intrvl", UInt32, SAVE, 1, "30"),
	// --- commands (write-only)
	def!(PROP_CMD_SAVE_PROPS,            "cmd.saveprops",             Boolean, WO,   1, "0"),
	def!(PROP_CMD_UPDATE,                "cmd.update",                Ascii,   WO,   1, ""),
	def!(PROP_CMD_UPLOAD_LOG,            "cmd.upload.log",            Ascii,   WO,   1, ""),
	def!(PROP_CMD_UPLOAD_DEBUGLOG,       "cmd.upload.debuglog",       Ascii,   WO,   1, ""),
	def!(PROP_CMD_RESET,                 "cmd.reset",                 Ascii,   WO,   1, ""),
	// --- read-only / state
	def!(PROP_STATE_PROTOCOL,            "sta.proto",                 UInt8,   RO,   3, "0,2,3"),
	def!(PROP_STATE_FIRMWARE,            "sta.firmware",              Ascii,   RO,   1, ""),
	def!(PROP_STATE_SERIAL,              "sta.serial",                Ascii,   RO,   1, ""),
	def!(PROP_STATE_UNIQUE_ID,           "sta.unique",                Binary,  RO,   1, ""),
	def!(PROP_STATE_ACCOUNT_ID,          "sta.account",               Ascii,   SAVE, 1, ""),
	def!(PROP_STATE_DEVICE_ID,           "sta.device",                Ascii,   SAVE, 1, ""),
	def!(PROP_STATE_TIME,                "sta.time",                  UInt32,  RO,   1, "0"),
	def!(PROP_STATE_DIAGNOSTIC,          "sta.diagnostic",            UInt32,  SAVE, 1, "0"),
	def!(PROP_STATE_DIAGNOSTIC_LEVEL,    "sta.diag.level",            UInt32,  SAVE, 1, "0"),
	def!(PROP_STATE_STUCK_TIMEOUT,       "sta.stuck.timeout",         UInt32,  SAVE, 1, "3600"),
	def!(PROP_STATE_CHECKNETWORK_TIMEOUT, "sta.checknetwork.timeout", UInt32,  SAVE, 1, "900"),
	def!(PROP_STATE_NETWORK_CHECK_WAIT_TIMES, "sta.network.check.wait", UInt32, SAVE, 1, "3"),
	def!(PROP_STATE_RTS_CHECK,           "sta.rts.check",             UInt32,  SAVE, 2, "1,1"),
	def!(PROP_STATE_IBOX_ENABLE,         "sta.ibox.enable",           UInt8,   SAVE, 1, "1"),
	def!(PROP_STATE_ALIVE_INTRVL,        "sta.alive.intrvl",          UInt32,  SAVE, 1, "30"),
	// --- communication protocol
	def!(PROP_COMM_SPEAK_FIRST,          "com.first",                 Boolean, SAVE, 1, "1"),
	def!(PROP_COMM_FIRST_BRIEF,          "com.brief",                 Boolean, SAVE, 1, "0"),
	def!(PROP_COMM_SAVE_RATE,            "com.saverate",              UInt32,  SAVE, 1, "600"),
	def!(PROP_COMM_MAX_DELAY,            "com.maxdelay",              UInt32,  SAVE, 1, "3600"),
	def!(PROP_COMM_MIN_XMIT_RATE,        "com.minrate",               UInt32,  SAVE, 1, "60"),
	def!(PROP_COMM_MAX_XMIT_RATE,        "com.maxrate",               UInt32,  SAVE, 1, "3600"),
	def!(PROP_COMM_MAX_DUP_EVENTS,       "com.maxduplex",             UInt8,   SAVE, 1, "10"),
	def!(PROP_COMM_MAX_SIM_EVENTS,       "com.maxsimplex",            UInt8,   SAVE, 1, "4"),
	def!(PROP_COMM_NET_IDLE_MINUTES,     "com.net.idle",              UInt32,  SAVE, 1, "0"),
	def!(PROP_COMM_MTU,                  "com.mtu",                   UInt32,  SAVE, 1, "576"),
	def!(PROP_COMM_UDP_TIMER,            "com.udp.timer",             UInt32,  SAVE, 2, "20,3"),
	def!(PROP_COMM_HOST_B,               "com.host.b",                Ascii,   SAVE, 1, ""),
	def!(PROP_COMM_PORT_B,               "com.port.b",                UInt32,  SAVE, 1, "0"),
	def!(PROP_COMM_POWER_SAVING,         "com.power.saving",          UInt8,   SAVE, 1, "0"),
	def!(PROP_COMM_HOST,                 "com.host",                  Ascii,   SAVE, 1, ""),
	def!(PROP_COMM_PORT,                 "com.port",                  UInt32,  SAVE, 1, "31000"),
	def!(PROP_COMM_CUSTOM_FORMATS,       "com.custfmt",               Boolean, RO,   1, "0"),
	def!(PROP_COMM_ENCODINGS,            "com.encodng",               UInt8,   RO,   1, "0x7"),
	def!(PROP_COMM_BYTES_READ,           "com.rd.cnt",                UInt32,  SAVE, 1, "0"),
	def!(PROP_COMM_BYTES_WRITTEN,        "com.wr.cnt",                UInt32,  SAVE, 1, "0"),
	def!(PROP_LOGGING_SERVER,            "log.server",                Ascii,   SAVE, 1, ""),
	def!(PROP_LOGGING_USER,              "log.user",                  Ascii,   SAVE, 1, ""),
	def!(PROP_LOGGING_PASS,              "log.pass",                  Ascii,   HS,   1, ""),
	// --- GPS configuration
	def!(PROP_GPS_POWER_SAVING,          "gps.power.saving",          UInt8,   SAVE, 1, "0"),
	def!(PROP_GPS_SAMPLE_RATE,           "gps.smp.rate",              UInt32,  SAVE, 1, "15"),
	def!(PROP_GPS_ACQUIRE_WAIT,          "gps.aqu.wait",              UInt32,  SAVE, 1, "0"),
	def!(PROP_GPS_EXPIRATION,            "gps.expire",                UInt32,  SAVE, 1, "300"),
	def!(PROP_GPS_CLOCK_DELTA,           "gps.clock.delta",           UInt32,  SAVE, 1, "0"),
	def!(PROP_GPS_LOST_COUNTER,          "gps.lost.counter",          UInt32,  SAVE, 1, "0"),
	def!(PROP_GPS_MIN_SPEED,             "gps.min.spd",               DEC1,    SAVE, 1, "8.0"),
	def!(PROP_GPS_HIGH_ACCURACY,         "gps.high.accuracy",         Boolean, SAVE, 1, "0"),
	def!(PROP_GPS_DISTANCE_DELTA,        "gps.dist.delta",            DEC0,    SAVE, 1, "500"),
	// --- motion
	def!(PROP_MOTION_START_TYPE,         "mot.start.type",            UInt8,   SAVE, 1, "0"),
	def!(PROP_MOTION_START,              "mot.start",                 DEC1,    SAVE, 1, "0.0"),
	def!(PROP_MOTION_IN_MOTION,          "mot.inmotion",              UInt32,  SAVE, 1, "0"),
	def!(PROP_MOTION_STOP,               "mot.stop",                  UInt32,  SAVE, 1, "0"),
	def!(PROP_MOTION_STOP_TYPE,          "mot.stop.type",             UInt8,   SAVE, 1, "0"),
	def!(PROP_MOTION_DORMANT_INTRVL,     "mot.dorm.rate",             UInt32,  SAVE, 1, "0"),
	def!(PROP_MOTION_DORMANT_COUNT,      "mot.dorm.count",            UInt8,   SAVE, 1, "0"),
	def!(PROP_MOTION_EXCESS_SPEED,       "mot.exspeed",               DEC1,    SAVE, 1, "0.0"),
	// --- odometer (1 meter units)
	def!(PROP_ODOMETER_0_VALUE,          "odo.0.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_1_VALUE,          "odo.1.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_2_VALUE,          "odo.2.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_3_VALUE,          "odo.3.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_4_VALUE,          "odo.4.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_5_VALUE,          "odo.5.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_6_VALUE,          "odo.6.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_7_VALUE,          "odo.7.value",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_0_LIMIT,          "odo.0.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_1_LIMIT,          "odo.1.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_2_LIMIT,          "odo.2.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_3_LIMIT,          "odo.3.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_4_LIMIT,          "odo.4.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_5_LIMIT,          "odo.5.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_6_LIMIT,          "odo.6.limit",               DEC0,    SAVE, 1, "0"),
	def!(PROP_ODOMETER_7_LIMIT,          "odo.7.limit",               DEC0,    SAVE, 1, "0"),
	// --- temperature sensors (high/low pairs, 0.1 C)
	def!(PROP_TEMP_REPORT_INTRVL,        "tmp.rpt.intrvl",            UInt32,  SAVE, 1, "900"),
	def!(PROP_TEMP_RANGE_0,              "tmp.range.0",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_1,              "tmp.range.1",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_2,              "tmp.range.2",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_3,              "tmp.range.3",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_4,              "tmp.range.4",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_5,              "tmp.range.5",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_6,              "tmp.range.6",               Int16,   SAVE, 2, "0,0"),
	def!(PROP_TEMP_RANGE_7,              "tmp.range.7",               Int16,   SAVE, 2, "0,0"),
];
