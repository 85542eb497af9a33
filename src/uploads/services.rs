use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use super::repo;
use crate::state::AppState;
use crate::storage::object_url;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Pushes each file to the object store under a fresh key and records the
/// resulting public URL together with its key. Returns the URLs in order.
pub async fn upload_images(
    st: &AppState,
    folder: &str,
    files: Vec<UploadItem>,
) -> anyhow::Result<Vec<String>> {
    anyhow::ensure!(!files.is_empty(), "no files provided");

    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
        let key = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);
        st.storage
            .put_object(&key, file.body, &file.content_type)
            .await
            .with_context(|| format!("put_object {}", key))?;

        let url = object_url(&st.config.s3_endpoint, &st.config.s3_bucket, &key);
        repo::insert_uploaded_image(&st.db, &url, &key).await?;
        urls.push(url);
    }
    Ok(urls)
}

/// Removes the remote object behind a hosted URL, using the stored key.
/// Returns false when the URL was never recorded.
pub async fn delete_image_by_url(st: &AppState, url: &str) -> anyhow::Result<bool> {
    let Some(key) = repo::find_key_by_url(&st.db, url).await? else {
        return Ok(false);
    };
    st.storage
        .delete_object(&key)
        .await
        .with_context(|| format!("delete_object {}", key))?;
    repo::delete_by_url(&st.db, url).await?;
    Ok(true)
}

/// Best-effort cleanup for a batch of entity images. Unknown URLs are skipped.
pub async fn delete_images_by_urls(st: &AppState, urls: &[String]) -> anyhow::Result<()> {
    for url in urls {
        delete_image_by_url(st, url).await?;
    }
    Ok(())
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }
}
