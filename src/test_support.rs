//! In-memory fakes and a one-shot HTTP responder shared by unit tests.

use crate::error::{AssessError, Result};
use crate::judge::CompletionClient;
use crate::model::RelevanceLabel;
use crate::rerank::{RerankDocument, RerankService};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Source numbers announced in a judge prompt ("Source #k:").
pub fn source_nums(prompt: &str) -> Vec<usize> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("Source #")?.strip_suffix(':')?.parse().ok())
        .collect()
}

fn verdict_json(nums: &[usize], label_for: impl Fn(usize) -> RelevanceLabel) -> String {
    let entries: Vec<String> = nums
        .iter()
        .map(|n| format!(r#"{{"source_num": {}, "score": "{}"}}"#, n, label_for(*n)))
        .collect();
    format!("[{}]", entries.join(", "))
}

enum Script {
    Replies(Mutex<VecDeque<Result<String>>>),
    Echo(RelevanceLabel),
    ByContent(HashMap<String, RelevanceLabel>),
}

/// Judge backend that replays canned replies, or answers every prompt well-formed.
pub struct ScriptedJudge {
    script: Script,
    prompts: Mutex<Vec<String>>,
    credentials: bool,
}

impl ScriptedJudge {
    /// Reply with `replies` in order; further calls fail with `JudgeApi`.
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self::with_script(Script::Replies(Mutex::new(replies.into())))
    }

    /// Label every source in every prompt with `label`.
    pub fn echo(label: RelevanceLabel) -> Self {
        Self::with_script(Script::Echo(label))
    }

    /// Label a source by its document text; unknown documents are not relevant.
    pub fn by_content(labels: &[(&str, RelevanceLabel)]) -> Self {
        let map = labels.iter().map(|(doc, l)| (doc.to_string(), *l)).collect();
        Self::with_script(Script::ByContent(map))
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
            credentials: true,
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedJudge {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let nums = source_nums(prompt);

        match &self.script {
            Script::Replies(replies) => replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AssessError::JudgeApi("no scripted reply left".to_string()))),
            Script::Echo(label) => Ok(verdict_json(&nums, |_| *label)),
            Script::ByContent(map) => {
                let lines: Vec<&str> = prompt.lines().collect();
                let label_for = |n: usize| {
                    let header = format!("Source #{}:", n);
                    lines
                        .iter()
                        .position(|l| *l == header)
                        .and_then(|i| lines.get(i + 1))
                        .and_then(|doc| map.get(*doc).copied())
                        .unwrap_or(RelevanceLabel::NotRelevant)
                };
                Ok(verdict_json(&nums, label_for))
            }
        }
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }
}

/// Reranking service returning a fixed id order, or a fixed error.
pub struct FixedReranker {
    order: std::result::Result<Vec<usize>, String>,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl FixedReranker {
    pub fn new(order: Vec<usize>) -> Self {
        Self {
            order: Ok(order),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            order: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (query, submitted doc count, num_results) per call.
    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RerankService for FixedReranker {
    async fn rerank(
        &self,
        query: &str,
        docs: &[RerankDocument],
        num_results: usize,
    ) -> Result<Vec<RerankDocument>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), docs.len(), num_results));

        match &self.order {
            Ok(order) => Ok(order
                .iter()
                .map(|id| RerankDocument {
                    id: *id,
                    text: String::new(),
                })
                .collect()),
            Err(message) => Err(AssessError::RerankerUnavailable(message.clone())),
        }
    }
}

/// HTTP client that never goes through a proxy, for talking to [`serve_once`].
pub fn local_http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Accept one HTTP request on a local port and answer it with `status` and a JSON `body`.
///
/// Returns the base URL and a handle resolving to the raw request text.
pub async fn serve_once(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_nums_from_prompt() {
        let prompt = crate::judge::prompt::build_prompt(
            "q",
            4,
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(source_nums(&prompt), vec![4, 5]);
    }
}
