use log::Level;
use serde::Serialize;

/// Placeholder logged when a payload cannot be serialized.
pub(crate) const UNSERIALIZABLE_PAYLOAD: &str = "<unserializable payload>";

/// Serializes `payload` for a log line, or returns a fallback string.
pub(crate) fn to_log_string<T: Serialize + ?Sized>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| UNSERIALIZABLE_PAYLOAD.to_string())
}

/// Skips serialization entirely when `level` is disabled.
pub(crate) fn log_payload<T: Serialize + ?Sized>(level: Level, message: &str, payload: &T) {
    if log::log_enabled!(level) {
        log::log!(level, "{message}: {}", to_log_string(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    struct Broken;

    impl Serialize for Broken {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("broken"))
        }
    }

    #[test]
    fn test_to_log_string_falls_back() {
        assert_eq!(to_log_string(&vec![1, 2]), "[1,2]");
        assert_eq!(to_log_string(&Broken), UNSERIALIZABLE_PAYLOAD);
    }
}
