use std::fmt;
use std::marker::PhantomData;

use navflow_core::{CodecError, KeyCodec};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Stores keys as their serde JSON form.
pub struct JsonKeyCodec<K> {
    _key: PhantomData<fn() -> K>,
}

impl<K> JsonKeyCodec<K> {
    pub fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K> Default for JsonKeyCodec<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for JsonKeyCodec<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for JsonKeyCodec<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonKeyCodec")
    }
}

impl<K> KeyCodec<K> for JsonKeyCodec<K>
where
    K: Serialize + DeserializeOwned,
{
    fn encode(&self, key: &K) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(key).map_err(|err| CodecError::new(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<K, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::new(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use navflow_core::KeyCodec;
    use navflow_testing::TestKey;

    use super::JsonKeyCodec;

    #[test]
    fn composite_keys_survive_encoding() {
        let codec: JsonKeyCodec<TestKey> = JsonKeyCodec::new();
        let key = TestKey::new("dialog")
            .transient()
            .over(TestKey::new("two").uses("counter", "shared"));

        let bytes = codec.encode(&key).expect("serializable key");
        assert_eq!(codec.decode(&bytes), Ok(key));
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let codec: JsonKeyCodec<TestKey> = JsonKeyCodec::new();
        let err = codec.decode(b"{not json").unwrap_err();
        assert!(!err.message().is_empty());
    }
}
