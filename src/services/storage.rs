use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::core::config::Settings;

/// Key prefixes accepted by the upload endpoints.
pub(crate) const UPLOAD_FOLDERS: [&str; 3] = ["exercises", "solutions", "avatars"];

#[derive(Debug, Clone)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) size: i64,
    pub(crate) sha256: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    presign_ttl: Duration,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "physics-tutor-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);
        let presign_ttl =
            Duration::from_secs(settings.storage().presigned_url_expire_minutes.max(1) * 60);

        Ok(Some(Self { client, bucket: settings.s3().bucket.clone(), presign_ttl }))
    }

    pub(crate) fn presign_ttl(&self) -> Duration {
        self.presign_ttl
    }

    pub(crate) async fn presign_get(&self, key: &str) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(self.presign_ttl)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn upload_bytes(
        &self,
        key: String,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<StoredObject> {
        let size = bytes.len() as i64;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(StoredObject { key, size, sha256 })
    }
}

/// Builds `<folder>/<user_id>/<uuid>.<ext>`.
pub(crate) fn build_object_key(folder: &str, user_id: &str, extension: &str) -> String {
    format!("{folder}/{user_id}/{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase())
}

/// Accepts only keys produced by [`build_object_key`] for a known folder.
pub(crate) fn is_valid_object_key(key: &str) -> bool {
    let mut parts = key.split('/');
    let (Some(folder), Some(owner), Some(file), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    UPLOAD_FOLDERS.contains(&folder)
        && !owner.is_empty()
        && !file.is_empty()
        && !key.contains("..")
        && file.contains('.')
}

pub(crate) fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn object_keys_are_scoped_by_folder_and_user() {
        let key = build_object_key("solutions", "user-1", "PNG");
        assert!(key.starts_with("solutions/user-1/"));
        assert!(key.ends_with(".png"));
        assert!(is_valid_object_key(&key));
    }

    #[test]
    fn rejects_unknown_folders_and_traversal() {
        assert!(!is_valid_object_key("secrets/user/file.png"));
        assert!(!is_valid_object_key("exercises/../file.png"));
        assert!(!is_valid_object_key("exercises/user/nested/file.png"));
        assert!(!is_valid_object_key("exercises/user/noext"));
        assert!(!is_valid_object_key(""));
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("JPG"), "image/jpeg");
        assert_eq!(content_type_for("svg"), "application/octet-stream");
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn presign_get_returns_url() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let url = storage.presign_get("exercises/u1/file.png").await.expect("presign get");

        assert!(url.contains("file.png"));
        assert_eq!(storage.presign_ttl(), Duration::from_secs(15 * 60));
    }
}
