use anyhow::{anyhow, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    endpoint: String,
    public_endpoint: Option<String>,
}

/// A time-limited direct-upload grant handed to the client.
#[derive(Debug)]
pub struct UploadTicket {
    pub object_key: String,
    pub upload_url: String,
    pub public_url: String,
    pub expires_in_seconds: u64,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(config.s3_endpoint.clone());
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let s3_config = s3_builder.build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
            endpoint: config.s3_endpoint.clone(),
            public_endpoint: config.s3_public_endpoint.clone(),
        })
    }

    /// Mint a presigned PUT URL for a fresh object key. The key embeds a
    /// random UUID so concurrent uploads never collide.
    pub async fn presign_upload(
        &self,
        content_type: &str,
        expires_in_seconds: u64,
    ) -> Result<UploadTicket> {
        let ext = extension_from_content_type(content_type)?;
        let object_key = format!("photos/{}.{}", Uuid::new_v4(), ext);

        let presign_config = PresigningConfig::expires_in(Duration::from_secs(expires_in_seconds))?;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(content_type)
            .presigned(presign_config)
            .await?;

        let mut upload_url = presigned.uri().to_string();
        if let Some(ref public_endpoint) = self.public_endpoint {
            match rewrite_presigned_url(&upload_url, public_endpoint) {
                Ok(rewritten) => upload_url = rewritten,
                Err(err) => tracing::warn!(error = ?err, "failed to rewrite presigned upload URL"),
            }
        }

        let public_url = self.public_url(&object_key);

        Ok(UploadTicket {
            object_key,
            upload_url,
            public_url,
            expires_in_seconds,
        })
    }

    /// The stable URL an uploaded object is served from once the PUT completes.
    pub fn public_url(&self, object_key: &str) -> String {
        let base = self.public_endpoint.as_deref().unwrap_or(&self.endpoint);
        format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            self.bucket,
            object_key
        )
    }

    pub async fn delete_blob(&self, object_key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await?;
        Ok(())
    }

    /// Recover the object key from a public URL minted by `public_url`.
    /// Returns None for URLs that do not point into our bucket.
    pub fn object_key_for(&self, public_url: &str) -> Option<String> {
        let parsed = Url::parse(public_url).ok()?;
        let path = parsed.path().trim_start_matches('/');
        let key = path.strip_prefix(&format!("{}/", self.bucket))?;
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

fn extension_from_content_type(content_type: &str) -> Result<&'static str> {
    match content_type {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(anyhow!("unsupported content type")),
    }
}

fn rewrite_presigned_url(original: &str, public_endpoint: &str) -> Result<String> {
    let mut original_url = Url::parse(original)?;
    let public_url = if public_endpoint.contains("://") {
        Url::parse(public_endpoint)?
    } else {
        Url::parse(&format!("http://{}", public_endpoint))?
    };

    original_url
        .set_scheme(public_url.scheme())
        .map_err(|_| anyhow!("invalid scheme for public endpoint"))?;
    original_url
        .set_host(public_url.host_str())
        .map_err(|_| anyhow!("invalid host for public endpoint"))?;
    original_url.set_port(public_url.port()).ok();

    Ok(original_url.to_string())
}
