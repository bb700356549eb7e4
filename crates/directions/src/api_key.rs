use reqwest::Url;

/// Reads the api key from the `key` parameter of a maps script url.
pub fn extract_api_key(script_url: &str) -> Option<String> {
    let url = Url::parse(script_url.trim()).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.into_owned())
        .filter(|key| !key.is_empty())
}
