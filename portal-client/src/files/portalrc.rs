use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use configparser::ini::{Ini, IniDefault};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::authentication::{AskPass, AuthMethod, BasicAuth, IntoPassword};

const GENERAL_SECTION: &str = "general";
const DEFAULT_APIURL: &str = "http://localhost:3030";

/// User configuration, read from `$XDG_CONFIG_HOME/chart-portal/portalrc`.
#[non_exhaustive]
pub struct Portalrc {
    pub hosts_options: HashMap<Url, HostOptions>,

    pub apiurl: Url,
}

pub struct HostOptions {
    pub aliases: Vec<String>,
    pub username: String,
    pub credential_class: CredentialsManagers,
    pub password: Option<String>,
    pub http_headers: HeaderMap,
}

impl Default for Portalrc {
    fn default() -> Self {
        Self {
            hosts_options: Default::default(),
            apiurl: Url::parse(DEFAULT_APIURL).expect("valid default url"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("XDG Directory error")]
    XDGError(#[from] xdg::BaseDirectoriesError),
    #[error("Error on field {field} of section {section}: {error}")]
    FieldError {
        section: String,
        field: &'static str,
        error: String,
    },
    #[error("Error parsing url")]
    URLParseError(#[from] url::ParseError),
    #[error("Unable to read file")]
    FileError(String),
}

impl Portalrc {
    pub fn new(path_override: Option<&Path>) -> Result<Self, ParseError> {
        let cfgfiles: Vec<PathBuf> = match path_override {
            Some(file) => vec![file.to_path_buf()],
            None => {
                let bd = xdg::BaseDirectories::with_prefix("chart-portal")?;
                bd.find_config_files("portalrc").collect()
            }
        };
        let mut defaults = IniDefault::default();
        defaults.multiline = true;
        defaults.delimiters = vec!['='];
        let mut cfg = Ini::new_from_defaults(defaults);
        for file in cfgfiles {
            cfg.load_and_append(file).map_err(ParseError::FileError)?;
        }

        let mut config = Self::default();
        if let Some(apiurl) = cfg.get(GENERAL_SECTION, "apiurl") {
            config.apiurl = Url::parse(&apiurl)?;
        }
        cfg.remove_section(GENERAL_SECTION);
        for section in cfg.sections() {
            let url = Url::parse(&section)?;
            let hopts = HostOptions {
                aliases: cfg
                    .get(&section, "aliases")
                    .map(|a| {
                        a.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                username: cfg.get(&section, "user").ok_or(ParseError::FieldError {
                    section: section.clone(),
                    field: "user",
                    error: "Not found".to_string(),
                })?,
                credential_class: cfg
                    .get(&section, "credentials_mgr_class")
                    .unwrap_or_default()
                    .into(),
                password: cfg.get(&section, "password"),
                http_headers: parse_headers(&cfg.get(&section, "http_headers").unwrap_or_default()),
            };
            config.hosts_options.insert(url, hopts);
        }

        Ok(config)
    }

    pub fn apiurl_from_alias(&self, alias: &str) -> Option<Url> {
        match Url::parse(alias) {
            Ok(u) => match self.hosts_options.contains_key(&u) {
                true => Some(u),
                false => None,
            },
            Err(_) => self.hosts_options.iter().find_map(|(u, opt)| {
                match opt.aliases.contains(&alias.to_string()) {
                    true => Some(u.clone()),
                    false => None,
                }
            }),
        }
    }

    pub fn http_headers(&self, api_url: &Url) -> HeaderMap {
        self.hosts_options
            .get(api_url)
            .map(|h| h.http_headers.clone())
            .unwrap_or_default()
    }

    pub fn get_password_provider(&self, api_url: &Url) -> Option<Box<dyn IntoPassword>> {
        let host_options = self.hosts_options.get(api_url)?;
        Some(match host_options.credential_class {
            CredentialsManagers::Plaintext => {
                Box::new(host_options.password.clone().unwrap_or_default())
            }
            CredentialsManagers::Transient => Box::new(AskPass::new(&host_options.username)),
        })
    }

    /// Builds the authenticator for `api_url`, command line values taking
    /// precedence over the configuration file.
    ///
    /// Returns `None` when no user is known, the portal is then used
    /// anonymously.
    pub fn authenticator(
        &self,
        api_url: &Url,
        username: Option<String>,
        password: Option<String>,
    ) -> Option<Arc<dyn AuthMethod>> {
        let username =
            username.or_else(|| self.hosts_options.get(api_url).map(|h| h.username.clone()))?;
        let password: Box<dyn IntoPassword> = match password {
            Some(pass) => Box::new(pass),
            None => self
                .get_password_provider(api_url)
                .unwrap_or_else(|| Box::new(AskPass::new(&username))),
        };
        Some(Arc::new(BasicAuth::new(&username, password)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CredentialsManagers {
    /// Prompt on every run.
    Transient,
    #[default]
    Plaintext,
}

impl From<String> for CredentialsManagers {
    fn from(value: String) -> Self {
        match value.trim() {
            "transient" => Self::Transient,
            _ => Self::Plaintext,
        }
    }
}

fn parse_headers(input: &str) -> HeaderMap {
    input
        .lines()
        .filter_map(|line| line.split_once(':'))
        .filter_map(|(k, v)| {
            let k = HeaderName::from_str(k.trim()).ok()?;
            let v = HeaderValue::from_str(v.trim()).ok()?;
            Some((k, v))
        })
        .collect()
}
