use base64::prelude::BASE64_STANDARD;
use base64::write::EncoderWriter;
use reqwest::header::HeaderValue;
use std::fmt::Debug;
use std::io::Write;
use tokio::sync::OnceCell;

#[async_trait::async_trait]
pub trait AuthMethod: Debug + Sync + Send {
    fn method_name(&self) -> &str;
    async fn authenticate(&self, realm: &str) -> HeaderValue;
}

/// Source of a password, resolved lazily on the first challenge.
#[async_trait::async_trait]
pub trait IntoPassword: Sync + Send {
    async fn pass(&self) -> String;
}

#[async_trait::async_trait]
impl IntoPassword for String {
    async fn pass(&self) -> String {
        self.clone()
    }
}

/// Asks the user on the terminal.
pub struct AskPass {
    username: String,
}

impl AskPass {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IntoPassword for AskPass {
    async fn pass(&self) -> String {
        dialoguer::Password::new()
            .with_prompt(format!("Password for {}", self.username))
            .interact()
            .unwrap_or_else(|err| {
                tracing::warn!(%err, "Unable to read password, using an empty one");
                String::new()
            })
    }
}

pub struct BasicAuth {
    pub username: String,
    password: Box<dyn IntoPassword>,
    resolved: OnceCell<String>,
}

impl BasicAuth {
    pub fn new(username: &str, password: Box<dyn IntoPassword>) -> Self {
        Self {
            username: username.to_string(),
            password,
            resolved: OnceCell::new(),
        }
    }
}

impl Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[async_trait::async_trait]
impl AuthMethod for BasicAuth {
    fn method_name(&self) -> &str {
        "Basic"
    }

    async fn authenticate(&self, _realm: &str) -> HeaderValue {
        let password = self
            .resolved
            .get_or_init(|| async { self.password.pass().await })
            .await;
        basic_auth(&self.username, Some(password))
    }
}

/// Taken verbatim from reqwest::util
fn basic_auth<U, P>(username: U, password: Option<P>) -> HeaderValue
where
    U: std::fmt::Display,
    P: std::fmt::Display,
{
    let mut buf = b"Basic ".to_vec();
    {
        let mut encoder = EncoderWriter::new(&mut buf, &BASE64_STANDARD);
        let _ = write!(encoder, "{username}:");
        if let Some(password) = password {
            let _ = write!(encoder, "{password}");
        }
    }
    let mut header = HeaderValue::from_bytes(&buf).expect("base64 is always valid HeaderValue");
    header.set_sensitive(true);
    header
}
