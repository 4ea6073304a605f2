fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use blossom_protocol::{BlobDescriptor, FileMetadata, MirrorRequest};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values.
    ///
    /// Numbers are compared as written: sizes and timestamps are integers on
    /// the wire and a float in their place fails to deserialize.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Server responses ---

    #[test]
    fn fixture_blob_descriptor_minimal() {
        let desc = roundtrip_test::<BlobDescriptor>("blob_descriptor_minimal.json");
        assert_eq!(desc.size_in_bytes, 184_292);
        assert_eq!(desc.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(desc.uploaded, Some(1_725_105_921));
        assert!(desc.extra.is_empty());
    }

    #[test]
    fn fixture_blob_descriptor_nip94() {
        let desc = roundtrip_test::<BlobDescriptor>("blob_descriptor_nip94.json");
        assert_eq!(desc.size_in_bytes, 48_213);
        let tags = desc.extra.get("nip94").and_then(|v| v.as_array()).unwrap();
        assert_eq!(tags.len(), 7);
    }

    #[test]
    fn legacy_descriptor_without_type_or_uploaded() {
        let json = r#"{"url":"https://cdn.example.com/abc","sha256":"abc","size":1000}"#;
        let desc: BlobDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.size_in_bytes, 1000);
        assert!(desc.mime_type.is_none());
        assert!(desc.uploaded.is_none());

        let back = serde_json::to_value(&desc).unwrap();
        assert!(back.get("type").is_none());
        assert!(back.get("uploaded").is_none());
    }

    #[test]
    fn descriptor_float_size_is_rejected() {
        let json = r#"{"url":"https://cdn.example.com/abc","sha256":"abc","size":1000.0}"#;
        assert!(serde_json::from_str::<BlobDescriptor>(json).is_err());
    }

    // --- Client payloads ---

    #[test]
    fn fixture_mirror_request() {
        let req = roundtrip_test::<MirrorRequest>("mirror_request.json");
        assert!(req.url.starts_with("https://cdn.satellite.earth/"));
    }

    #[test]
    fn fixture_file_metadata() {
        let meta = roundtrip_test::<FileMetadata>("file_metadata.json");
        assert_eq!(meta.content_type(), "application/pdf");
    }
}
