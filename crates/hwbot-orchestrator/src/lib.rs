//! hwbot orchestrator
//!
//! Polls a homework review API, detects status changes of the latest
//! submission, and forwards them to a chat.

pub mod client;
pub mod config;
pub mod error;
pub mod homework;
pub mod loop_state;
pub mod notifier;
pub mod poller;

pub use client::{http_client, HomeworkApi, ReviewApiClient};
pub use config::{
    check_credentials, Config, CredentialGate, Credentials, CursorMode, InitialCursor,
    API_TOKEN_VAR, CHAT_BOT_TOKEN_VAR, CHAT_DESTINATION_ID_VAR,
};
pub use error::{HwbotError, Result};
pub use homework::{
    current_date, extract_latest, is_blank_record, parse_status, Homework, HomeworkStatus, Locale,
};
pub use loop_state::{LoopState, PollerStatus};
pub use notifier::{notify, Messenger, TelegramMessenger};
pub use poller::{CycleOutcome, Poller};
