// src/constants.rs

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

// JSON body ceiling for every non-GET route
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

// rawOCRData keeps only the head of the uploaded payload
pub const RAW_OCR_PREVIEW_CHARS: usize = 50;

pub const TERMINAL_STEP_MESSAGE: &str = "No further steps: you have worked through the whole problem.";
