use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_BANK_INFO: &str =
    "Payment should be made to: Steel Wheel Auto Limited, Account #12345678, Bank of Jamaica.";
pub const DEFAULT_FROM_EMAIL: &str = "Steel Wheel Auto Ltd. <invoices@steelwheelauto.com>";
pub const DEFAULT_COMPANY_EMAIL: &str = "steelwheelauto@gmail.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// `*` allows any origin.
    pub cors_origin: String,
    /// Prefix for the download URLs handed out for stored PDFs.
    pub public_base_url: String,
    pub storage_dir: PathBuf,
    pub email: EmailConfig,
    pub bank_info: String,
    /// Bearer token -> user id.
    pub api_tokens: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// No key means demo mode: nothing is sent.
    pub resend_api_key: Option<String>,
    pub api_base: String,
    pub from: String,
    pub company: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let port: u16 = var("PORT").and_then(|v| v.parse().ok()).unwrap_or(3000);
        Self {
            port,
            cors_origin: var("CORS_ORIGIN").unwrap_or_else(|| "*".into()),
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            storage_dir: var("STORAGE_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./storage")),
            email: EmailConfig {
                resend_api_key: var("RESEND_API_KEY"),
                api_base: var("RESEND_API_BASE").unwrap_or_else(|| "https://api.resend.com".into()),
                from: var("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.into()),
                company: var("COMPANY_EMAIL").unwrap_or_else(|| DEFAULT_COMPANY_EMAIL.into()),
            },
            bank_info: var("BANK_INFO").unwrap_or_else(|| DEFAULT_BANK_INFO.into()),
            api_tokens: var("API_TOKENS").map(|v| parse_tokens(&v)).unwrap_or_default(),
        }
    }
}

/// Parse `token:uid,token2:uid2`. Malformed entries are skipped.
fn parse_tokens(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, uid) = pair.split_once(':')?;
            let (token, uid) = (token.trim(), uid.trim());
            (!token.is_empty() && !uid.is_empty()).then(|| (token.to_string(), uid.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.cors_origin, "*");
        assert_eq!(cfg.public_base_url, "http://localhost:3000");
        assert_eq!(cfg.bank_info, DEFAULT_BANK_INFO);
        assert_eq!(cfg.email.company, DEFAULT_COMPANY_EMAIL);
        assert!(cfg.email.resend_api_key.is_none());
        assert!(cfg.api_tokens.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("PUBLIC_BASE_URL", "https://invoices.example.com/"),
            ("RESEND_API_KEY", "re_123"),
            ("BANK_INFO", "Pay NCB 99"),
            ("API_TOKENS", "abc:user-1, def:user-2,broken,:nouser"),
        ]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.public_base_url, "https://invoices.example.com");
        assert_eq!(cfg.email.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(cfg.bank_info, "Pay NCB 99");
        assert_eq!(cfg.api_tokens.len(), 2);
        assert_eq!(cfg.api_tokens["def"], "user-2");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = Config::from_lookup(lookup(&[("RESEND_API_KEY", "  "), ("PORT", "nope")]));
        assert!(cfg.email.resend_api_key.is_none());
        assert_eq!(cfg.port, 3000);
    }
}
