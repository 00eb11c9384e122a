//! 16-bit property key codes.
//!
//! Key ranges:
//! - `0x0001..=0xCFFF` custom application keys
//! - `0xE000..=0xEEFF` reserved
//! - `0xEF00..=0xEFFF` platform / iBox / RFID configuration
//! - `0xF000..=0xF0FF` commands (write-only)
//! - `0xF100..=0xF1FF` static, read-only information
//! - `0xF300..=0xF3FF` communications
//! - `0xF500..=0xF5FF` GPS configuration
//! - `0xF700..=0xF7FF` motion / odometer
//! - `0xF900..=0xF9FF` digital I/O, elapsed time
//! - `0xFB60..=0xFBFF` temperature sensors

pub type PropKey = u16;

// --- GPS serial port configuration
pub const PROP_CFG_GPS_PORT: PropKey = 0xEF21;
pub const PROP_CFG_GPS_BPS: PropKey = 0xEF22;
pub const PROP_CFG_GPS_MODEL: PropKey = 0xEF2A;

// --- iBox configuration
pub const PROP_IBOX_PORT: PropKey = 0xEF30;
pub const PROP_IBOX_MID: PropKey = 0xEF31;
pub const PROP_IBOX_96_REQUEST: PropKey = 0xEF32;
pub const PROP_IBOX_168_REQUEST: PropKey = 0xEF33;
pub const PROP_IBOX_171_REQUEST: PropKey = 0xEF34;
pub const PROP_IBOX_200_REQUEST: PropKey = 0xEF35;
pub const PROP_IBOX_201_REQUEST: PropKey = 0xEF36;
pub const PROP_IBOX_202_REQUEST: PropKey = 0xEF37;
pub const PROP_IBOX_203_REQUEST: PropKey = 0xEF38;
pub const PROP_IBOX_207_REQUEST: PropKey = 0xEF39;
pub const PROP_IBOX_234_REQUEST: PropKey = 0xEF3A;
pub const PROP_IBOX_235_REQUEST: PropKey = 0xEF3B;
pub const PROP_IBOX_243_REQUEST: PropKey = 0xEF3C;
pub const PROP_IBOX_246_REQUEST: PropKey = 0xEF3D;
pub const PROP_IBOX_247_REQUEST: PropKey = 0xEF3E;
pub const PROP_IBOX_205_COMMAND: PropKey = 0xEF3F;
pub const PROP_IBOX_205_COMMAND_TIMEOUT: PropKey = 0xEF40;
pub const PROP_IBOX_206_COMMAND: PropKey = 0xEF41;
pub const PROP_IBOX_206_COMMAND_TIMEOUT: PropKey = 0xEF42;
pub const PROP_IBOX_208_COMMAND: PropKey = 0xEF43;
pub const PROP_IBOX_208_COMMAND_TIMEOUT: PropKey = 0xEF44;

// --- RFID reader configuration
pub const PROP_RFID_READER_ENABLE: PropKey = 0xEF70;
pub const PROP_RFID_READER_PORT: PropKey = 0xEF72;
pub const PROP_RFID_READER_BPS: PropKey = 0xEF74;
pub const PROP_RFID_COMPANY_ID_RANGE: PropKey = 0xEF75;
pub const PROP_RFID_PRIMARY_ID_DIVISOR: PropKey = 0xEF78;
pub const PROP_RFID_IN_MOTION: PropKey = 0xEF7A;
pub const PROP_RFID_PRIMARY_ID: PropKey = 0xEF7B;
pub const PROP_RFID_PRIMARY_ID_RANGE: PropKey = 0xEF7C;
pub const PROP_RFID_LOCK_ID_RANGE: PropKey = 0xEF7D;
pub const PROP_RFID_PRIMARY_RSSI_TIMER: PropKey = 0xEF81;
pub const PROP_RFID_PRIMARY_RSSI: PropKey = 0xEF82;
pub const PROP_RFID_SWITCH_ID_RANGE: PropKey = 0xEF83;
pub const PROP_RFID_CARGO_MIN_RSSI: PropKey = 0xEF84;
pub const PROP_RFID_CARGO_ID_RANGE: PropKey = 0xEF85;
pub const PROP_RFID_CARGO_SAMPLE_MODE: PropKey = 0xEF86;
pub const PROP_RFID_HIGHTEMP_ID_RANGE: PropKey = 0xEF87;
pub const PROP_RFID_BATTERY_LIFE_MAX: PropKey = 0xEF88;
pub const PROP_RFID_LOCK_REPORT_INTRVL: PropKey = 0xEF8A;
pub const PROP_RFID_HIGHTEMP_REPORT_INTRVL: PropKey = 0xEF8B;
pub const PROP_RFID_BATTERY_ALARM_INTRVL: PropKey = 0xEF8C;
pub const PROP_RFID_SWITCH_REPORT_INTRVL: PropKey = 0xEF8D;
pub const PROP_RFID_CARGO_REPORT_INTRVL: PropKey = 0xEF8E;
pub const PROP_RFID_HIGHTEMP_ID_RANGE_2: PropKey = 0xEF8F;
pub const PROP_RFID_MOTION_ID_RANGE: PropKey = 0xEF90;
pub const PROP_RFID_MOTION_REPORT_RATE: PropKey = 0xEF91;
pub const PROP_RFID_SENSOR_ID_RANGE: PropKey = 0xEF95;
pub const PROP_RFID_SENSOR_REPORT_INTRVL: PropKey = 0xEF96;
pub const PROP_RFID_HUMIDITY_ID_RANGE: PropKey = 0xEF97;
pub const PROP_RFID_HUMIDITY_REPORT_INTRVL: PropKey = 0xEF98;

// --- commands (write-only)
pub const PROP_CMD_SAVE_PROPS: PropKey = 0xF000;
pub const PROP_CMD_UPDATE: PropKey = 0xF002;
pub const PROP_CMD_UPLOAD_LOG: PropKey = 0xF003;
pub const PROP_CMD_UPLOAD_DEBUGLOG: PropKey = 0xF004;
pub const PROP_CMD_RESET: PropKey = 0xF0FF;

// --- read-only / state
pub const PROP_STATE_PROTOCOL: PropKey = 0xF100;
pub const PROP_STATE_FIRMWARE: PropKey = 0xF101;
pub const PROP_STATE_SERIAL: PropKey = 0xF110;
pub const PROP_STATE_UNIQUE_ID: PropKey = 0xF112;
pub const PROP_STATE_ACCOUNT_ID: PropKey = 0xF114;
pub const PROP_STATE_DEVICE_ID: PropKey = 0xF115;
pub const PROP_STATE_TIME: PropKey = 0xF121;
pub const PROP_STATE_DIAGNOSTIC: PropKey = 0xF141;
pub const PROP_STATE_DIAGNOSTIC_LEVEL: PropKey = 0xF161;
pub const PROP_STATE_STUCK_TIMEOUT: PropKey = 0xF171;
pub const PROP_STATE_CHECKNETWORK_TIMEOUT: PropKey = 0xF172;
pub const PROP_STATE_NETWORK_CHECK_WAIT_TIMES: PropKey = 0xF181;
pub const PROP_STATE_RTS_CHECK: PropKey = 0xF191;
pub const PROP_STATE_IBOX_ENABLE: PropKey = 0xF201;
pub const PROP_STATE_ALIVE_INTRVL: PropKey = 0xF205;

// --- communication protocol
pub const PROP_COMM_SPEAK_FIRST: PropKey = 0xF303;
pub const PROP_COMM_FIRST_BRIEF: PropKey = 0xF305;
pub const PROP_COMM_SAVE_RATE: PropKey = 0xF311;
pub const PROP_COMM_MAX_DELAY: PropKey = 0xF312;
pub const PROP_COMM_MIN_XMIT_RATE: PropKey = 0xF313;
pub const PROP_COMM_MAX_XMIT_RATE: PropKey = 0xF315;
pub const PROP_COMM_MAX_DUP_EVENTS: PropKey = 0xF317;
pub const PROP_COMM_MAX_SIM_EVENTS: PropKey = 0xF318;
pub const PROP_COMM_NET_IDLE_MINUTES: PropKey = 0xF319;
pub const PROP_COMM_MTU: PropKey = 0xF321;
pub const PROP_COMM_UDP_TIMER: PropKey = 0xF322;
pub const PROP_COMM_HOST_B: PropKey = 0xF391;
pub const PROP_COMM_PORT_B: PropKey = 0xF392;
pub const PROP_COMM_POWER_SAVING: PropKey = 0xF3A0;
pub const PROP_COMM_HOST: PropKey = 0xF3A1;
pub const PROP_COMM_PORT: PropKey = 0xF3A2;
pub const PROP_COMM_CUSTOM_FORMATS: PropKey = 0xF3C0;
pub const PROP_COMM_ENCODINGS: PropKey = 0xF3C1;
pub const PROP_COMM_BYTES_READ: PropKey = 0xF3F1;
pub const PROP_COMM_BYTES_WRITTEN: PropKey = 0xF3F2;
pub const PROP_LOGGING_SERVER: PropKey = 0xF3F3;
pub const PROP_LOGGING_USER: PropKey = 0xF3F4;
pub const PROP_LOGGING_PASS: PropKey = 0xF3F5;

// --- GPS configuration
pub const PROP_GPS_POWER_SAVING: PropKey = 0xF510;
pub const PROP_GPS_SAMPLE_RATE: PropKey = 0xF511;
pub const PROP_GPS_ACQUIRE_WAIT: PropKey = 0xF512;
pub const PROP_GPS_EXPIRATION: PropKey = 0xF513;
pub const PROP_GPS_CLOCK_DELTA: PropKey = 0xF515;
pub const PROP_GPS_LOST_COUNTER: PropKey = 0xF516;
pub const PROP_GPS_MIN_SPEED: PropKey = 0xF522;
pub const PROP_GPS_HIGH_ACCURACY: PropKey = 0xF523;
pub const PROP_GPS_DISTANCE_DELTA: PropKey = 0xF531;

// --- motion
pub const PROP_MOTION_START_TYPE: PropKey = 0xF711;
pub const PROP_MOTION_START: PropKey = 0xF712;
pub const PROP_MOTION_IN_MOTION: PropKey = 0xF713;
pub const PROP_MOTION_STOP: PropKey = 0xF714;
pub const PROP_MOTION_STOP_TYPE: PropKey = 0xF715;
pub const PROP_MOTION_DORMANT_INTRVL: PropKey = 0xF716;
pub const PROP_MOTION_DORMANT_COUNT: PropKey = 0xF717;
pub const PROP_MOTION_EXCESS_SPEED: PropKey = 0xF721;

// --- odometer
pub const PROP_ODOMETER_0_VALUE: PropKey = 0xF770;
pub const PROP_ODOMETER_1_VALUE: PropKey = 0xF771;
pub const PROP_ODOMETER_2_VALUE: PropKey = 0xF772;
pub const PROP_ODOMETER_3_VALUE: PropKey = 0xF773;
pub const PROP_ODOMETER_4_VALUE: PropKey = 0xF774;
pub const PROP_ODOMETER_5_VALUE: PropKey = 0xF775;
pub const PROP_ODOMETER_6_VALUE: PropKey = 0xF776;
pub const PROP_ODOMETER_7_VALUE: PropKey = 0xF777;
pub const PROP_ODOMETER_0_LIMIT: PropKey = 0xF780;
pub const PROP_ODOMETER_1_LIMIT: PropKey = 0xF781;
pub const PROP_ODOMETER_2_LIMIT: PropKey = 0xF782;
pub const PROP_ODOMETER_3_LIMIT: PropKey = 0xF783;
pub const PROP_ODOMETER_4_LIMIT: PropKey = 0xF784;
pub const PROP_ODOMETER_5_LIMIT: PropKey = 0xF785;
pub const PROP_ODOMETER_6_LIMIT: PropKey = 0xF786;
pub const PROP_ODOMETER_7_LIMIT: PropKey = 0xF787;

// --- temperature sensors
pub const PROP_TEMP_REPORT_INTRVL: PropKey = 0xFB63;
pub const PROP_TEMP_RANGE_0: PropKey = 0xFB80;
pub const PROP_TEMP_RANGE_1: PropKey = 0xFB81;
pub const PROP_TEMP_RANGE_2: PropKey = 0xFB82;
pub const PROP_TEMP_RANGE_3: PropKey = 0xFB83;
pub const PROP_TEMP_RANGE_4: PropKey = 0xFB84;
pub const PROP_TEMP_RANGE_5: PropKey = 0xFB85;
pub const PROP_TEMP_RANGE_6: PropKey = 0xFB86;
pub const PROP_TEMP_RANGE_7: PropKey = 0xFB87;
