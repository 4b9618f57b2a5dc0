/// Maximum size for a single message's plaintext in bytes.
pub const MAX_MESSAGE_SIZE_BYTES: usize = 8 * 1024;
/// Sender id used by the message log for plaintext system notices.
pub const SYSTEM_SENDER_ID: &str = "system";
/// Scheme version assumed for records written before versioning existed.
pub const DEFAULT_SCHEME_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_message_size_is_8kb() {
        assert_eq!(MAX_MESSAGE_SIZE_BYTES, 8 * 1024);
    }

    #[test]
    fn system_sender_is_not_a_uuid() {
        assert!(uuid::Uuid::parse_str(SYSTEM_SENDER_ID).is_err());
    }
}
