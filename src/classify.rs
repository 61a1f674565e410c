// src/classify.rs
//! Classification gateway: batches candidates into one structured prompt,
//! tries an ordered list of oracle backends, and parses the strict
//! JSON-array output contract.

use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::types::Article;

/// Backends tried in order of preference on any failure.
pub const BACKENDS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-3-pro-preview",
];

/// Per-candidate verdict. `id` is the batch-local ordinal, 1:1 and
/// in-order with the request batch, NOT the source message id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub id: usize,
    pub confirmed: bool,
    pub confidence: u8, // 0-100
    #[serde(default)]
    pub reason: String,
}

/// One generation call against a named backend. Implementations do the
/// remote I/O; the gateway owns batching, fallback, and parsing.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Build the single prompt embedding all batch items with their ordinals.
pub fn build_prompt(batch: &[Article]) -> String {
    let articles_text = batch
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "\nID: {i}\nTitle: {}\nSummary: {}\nSource: {}\n",
                a.title, a.summary, a.publisher
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!(
        r#"You are an intelligence analyst.
Be conservative and avoid false alarms.

Determine whether EACH of the following texts CONFIRMS that
military attacks between the United States and Iran have begun.

Rules:
- Speculation or preparation = NOT confirmed
- Uncertainty = NOT confirmed
- Official confirmation = confirmed

Return ONLY a JSON Array of objects:
[
  {{
    "id": 0,
    "confirmed": true|false,
    "confidence": 0-100,
    "reason": "short explanation"
  }},
  ...
]

ARTICLES:
{articles_text}
"#
    )
}

/// Strip markdown code fences the model may wrap its JSON in.
pub fn strip_code_fences(text: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"```(?:json)?").expect("fence regex"));
    re.replace_all(text, "").trim().to_string()
}

/// Parse and validate the oracle's response against the batch it answers.
/// Any contract violation is an error, which the gateway treats like a
/// backend failure.
pub fn parse_verdicts(text: &str, expected: usize) -> Result<Vec<Verdict>> {
    let clean = strip_code_fences(text);
    let verdicts: Vec<Verdict> =
        serde_json::from_str(&clean).context("verdict array parse")?;
    if verdicts.len() != expected {
        anyhow::bail!(
            "verdict count mismatch: got {}, expected {expected}",
            verdicts.len()
        );
    }
    for (i, v) in verdicts.iter().enumerate() {
        if v.id != i {
            anyhow::bail!("verdict ordinal out of order: got {} at position {i}", v.id);
        }
        if v.confidence > 100 {
            anyhow::bail!("confidence {} out of range", v.confidence);
        }
    }
    Ok(verdicts)
}

/// Ordered-fallback front door to the oracle.
#[derive(Clone)]
pub struct ClassifyGateway {
    oracle: Arc<dyn Oracle>,
    backends: Vec<String>,
}

impl ClassifyGateway {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self::with_backends(oracle, BACKENDS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_backends(oracle: Arc<dyn Oracle>, backends: Vec<String>) -> Self {
        Self { oracle, backends }
    }

    /// Classify a batch; one verdict per item, in batch order. An empty
    /// batch returns immediately without contacting the oracle.
    pub async fn classify(&self, batch: &[Article]) -> Result<Vec<Verdict>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(batch);

        for model in &self.backends {
            tracing::debug!(model, oracle = self.oracle.name(), "trying classifier backend");
            match self.oracle.generate(model, &prompt).await {
                Ok(text) => match parse_verdicts(&text, batch.len()) {
                    Ok(verdicts) => return Ok(verdicts),
                    Err(e) => {
                        tracing::warn!(model, error = %e, "classifier output rejected")
                    }
                },
                Err(e) => tracing::warn!(model, error = %e, "classifier backend failed"),
            }
        }

        anyhow::bail!("all classifier backends failed")
    }
}

// ------------------------------------------------------------
// Gemini backend
// ------------------------------------------------------------

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiOracle {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(45))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Requires `GEMINI_API_KEY`; an empty key makes every call fail,
    /// which the fallback chain reports as exhaustion.
    pub fn from_env() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").unwrap_or_default())
    }

    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("GEMINI_API_KEY not set");
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: String,
        }

        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let req = Req {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("gemini request")?
            .error_for_status()
            .context("gemini non-2xx")?;

        let body: Resp = resp.json().await.context("gemini response body")?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        if text.is_empty() {
            anyhow::bail!("empty text response");
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
