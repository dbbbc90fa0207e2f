use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3003)
}

pub fn platform_service_url() -> String {
    env::var("PLATFORM_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:3004".to_string())
}

pub fn platform_request_timeout() -> Duration {
    let millis = env::var("PLATFORM_REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub const EVENT_CHANNEL_CAPACITY: usize = 256;
pub const BROADCAST_CAPACITY: usize = 128;
pub const ROOM_CODE_LEN: usize = 6;
