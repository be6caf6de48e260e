//! Public URL generation for stored objects

/// Builds `https://storage.googleapis.com/<bucket>/<object>` style URLs
#[derive(Debug, Clone)]
pub struct PublicUrl {
    prefix: String,
}

impl PublicUrl {
    pub fn new(public_base_url: &str, bucket: &str) -> Self {
        // Ensure the prefix doesn't end with a slash
        let prefix = format!(
            "{}/{}",
            public_base_url.trim_end_matches('/'),
            bucket.trim_matches('/')
        );
        Self { prefix }
    }

    /// URL of an object, keeping its `/`-separated "folders"
    pub fn object_url(&self, object: &str) -> String {
        format!("{}/{}", self.prefix, object.trim_start_matches('/'))
    }
}
