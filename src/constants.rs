// src/constants.rs

/// Recognized verbs this server deliberately does not implement.
pub const NOT_SUPPORTED: &[&str] = &[
    "ABOR", "ACCT", "ADAT", "ALLO", "APPE", "CCC", "CONF", "ENC", "HELP", "LANG", "LPRT", "LPSV",
    "MDTM", "MIC", "MLSD", "MLST", "MODE", "OPTS", "REIN", "SITE", "SMNT", "STOU", "STRU", "SYST",
];

pub const DEFAULT_MAX_STATS_AT_ONCE: usize = 5;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GREETING: &str = "FTP server (oxiftpd) ready";

/// Chunk size of streamed RETR reads.
pub const RETR_CHUNK_SIZE: usize = 4096;
/// Read buffer for STOR uploads.
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;
/// Longest control line accepted before the connection is dropped.
pub const MAX_COMMAND_LINE: usize = 8192;

pub const STOR_FILE_MODE: u32 = 0o644;
pub const MKD_DIR_MODE: u32 = 0o755;

/// Failed PASS attempts tolerated before the control connection is closed.
pub const MAX_AUTH_FAILURES: u32 = 3;

pub const TLS_ONLY_AUTH_ERROR: &str = "530 This server does not permit login over a non-secure connection; connect using FTP-SSL with explicit AUTH TLS";
