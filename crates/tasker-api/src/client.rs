// Tasker HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, bearer-token
// injection, 401 mapping, and null-tolerant list parsing. Endpoint
// methods mirror the remote surface one-to-one; task output and global
// values are run through the output normalizer before callers see them.

use std::sync::RwLock;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    AuthReply, CommandCount, GlobalVar, Profile, RunTask, Scene, SceneAction, SetGlobal,
    SetProfile, SetScene, Stats, decode_global_value, encode_global_value,
};
use crate::output::normalize;
use crate::transport::TransportConfig;

/// Default port of Tasker's HTTP server.
pub const DEFAULT_PORT: u16 = 1821;

const AUTH_PATH: &str = "/api/auth";
const AUTH_REFRESH_PATH: &str = "/api/auth/refresh";
const STATS_PATH: &str = "/api/stats";
const PROFILES_PATH: &str = "/api/profiles";
const TASKS_PATH: &str = "/api/tasks";
const SCENES_PATH: &str = "/api/scenes";
const GLOBALS_PATH: &str = "/api/globals";
const COMMANDS_PATH: &str = "/api/commands";
const IMPORT_PATH: &str = "/api/import";
const FILE_PATH: &str = "/api/file";

/// Raw HTTP client for the Tasker automation app's REST API.
///
/// The access token is interior-mutable: the auth handshake stores the
/// token it receives, and every later request carries it as a bearer
/// `Authorization` header.
pub struct TaskerClient {
    http: reqwest::Client,
    base_url: Url,
    transport: TransportConfig,
    api_key: RwLock<Option<SecretString>>,
}

impl TaskerClient {
    /// Create a new client for `http://{host}:{port}`.
    pub fn new(
        host: &str,
        port: u16,
        api_key: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}"))?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            transport: transport.clone(),
            api_key: RwLock::new(api_key),
        })
    }

    /// Create a client from a pre-parsed base URL (tests, nonstandard
    /// schemes).
    pub fn from_url(
        base_url: Url,
        api_key: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            transport: transport.clone(),
            api_key: RwLock::new(api_key),
        })
    }

    /// The remote base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The current access token, if any.
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key.read().ok()?.clone()
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// Attach the bearer token when one is held.
    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key() {
            Some(key) => builder.header(reqwest::header::AUTHORIZATION, key.expose_secret()),
            None => builder,
        }
    }

    /// Map 401 to [`Error::Auth`] and any other non-success status to
    /// [`Error::Api`] before the body is touched.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Auth {
                message: "unauthorized -- token missing or expired".into(),
            });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// GET returning JSON. The remote answers `null` where a list would
    /// be empty, so list callers go through [`Self::get_list`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");
        let resp = self.authed(self.http.get(url)).query(query).send().await?;
        Self::parse(Self::check(resp).await?).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        names: Option<&[String]>,
    ) -> Result<Vec<T>, Error> {
        let query: Vec<(&str, &str)> = names
            .unwrap_or_default()
            .iter()
            .map(|n| ("name", n.as_str()))
            .collect();
        let parsed: Option<Vec<T>> = self.get_json(path, &query).await?;
        Ok(parsed.unwrap_or_default())
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");
        let resp = self.authed(self.http.post(url)).json(body).send().await?;
        Self::parse(Self::check(resp).await?).await
    }

    // ── Auth ─────────────────────────────────────────────────────────

    /// Run the auth handshake, storing the token the remote hands back.
    ///
    /// With `refresh` set and a token held, hits the refresh endpoint
    /// with the old token instead. Every failure here is an auth
    /// failure -- there is no transient classification for the handshake.
    pub async fn authenticate(&self, refresh: bool) -> Result<(), Error> {
        let key = self.api_key();
        let refreshing = refresh && key.is_some();
        let url = self.url(if refreshing { AUTH_REFRESH_PATH } else { AUTH_PATH });
        debug!(refresh = refreshing, "GET {url}");

        let mut builder = self.http.get(url);
        if refreshing {
            if let Some(ref key) = key {
                builder = builder
                    .query(&[("token", key.expose_secret())])
                    .header(reqwest::header::AUTHORIZATION, key.expose_secret());
            }
        }

        let reply: AuthReply = async {
            let resp = builder.send().await?;
            Self::parse(Self::check(resp).await?).await
        }
        .await
        .map_err(|e| Error::Auth {
            message: format!("handshake failed: {e}"),
        })?;

        let key = reply.key.map(SecretString::from).or(key);
        match key {
            Some(key) => {
                if let Ok(mut slot) = self.api_key.write() {
                    *slot = Some(key);
                }
                Ok(())
            }
            None => Err(Error::Auth {
                message: "handshake returned no key".into(),
            }),
        }
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// Aggregate counters and version (`GET /api/stats`).
    pub async fn stats(&self) -> Result<Stats, Error> {
        self.get_json(STATS_PATH, &[]).await
    }

    // ── Profiles ─────────────────────────────────────────────────────

    /// List profiles, optionally restricted to `names`.
    pub async fn profiles(&self, names: Option<&[String]>) -> Result<Vec<Profile>, Error> {
        self.get_list(PROFILES_PATH, names).await
    }

    /// Fetch a single profile by name.
    pub async fn profile(&self, name: &str) -> Result<Option<Profile>, Error> {
        let names = [name.to_owned()];
        Ok(self.profiles(Some(&names)).await?.into_iter().next())
    }

    /// Set a profile's enabled state. `None` toggles.
    pub async fn set_profile(&self, name: &str, enabled: Option<bool>) -> Result<Profile, Error> {
        self.post_json(PROFILES_PATH, &SetProfile { name, enabled })
            .await
    }

    /// Set several profiles in one request.
    pub async fn set_profiles(&self, changes: &[SetProfile<'_>]) -> Result<Vec<Profile>, Error> {
        let parsed: Option<Vec<Profile>> = self.post_json(PROFILES_PATH, &changes).await?;
        Ok(parsed.unwrap_or_default())
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// List tasks, optionally restricted to `names`.
    pub async fn tasks(&self, names: Option<&[String]>) -> Result<Vec<crate::models::Task>, Error> {
        self.get_list(TASKS_PATH, names).await
    }

    /// Fetch a single task by name.
    pub async fn task(&self, name: &str) -> Result<Option<crate::models::Task>, Error> {
        let names = [name.to_owned()];
        Ok(self.tasks(Some(&names)).await?.into_iter().next())
    }

    /// Invoke a task and normalize whatever it prints.
    ///
    /// The response may be JSON, XML, delimited text, or a bare scalar;
    /// with `structured` set it goes through the decode cascade, without
    /// it the text comes back verbatim. The per-call timeout is floored
    /// at the transport default because tasks run arbitrary automation.
    pub async fn run_task(
        &self,
        name: &str,
        variables: &serde_json::Map<String, Value>,
        structured: bool,
        timeout: Option<Duration>,
    ) -> Result<Value, Error> {
        let url = self.url(TASKS_PATH);
        debug!(task = name, structured, "POST {url}");

        let body = RunTask {
            name,
            structure_output: structured,
            variables,
        };
        let resp = self
            .authed(self.http.post(url))
            .timeout(self.transport.call_timeout(timeout))
            .json(&body)
            .send()
            .await?;
        let text = Self::check(resp).await?.text().await?;
        Ok(normalize(&text, structured))
    }

    // ── Scenes ───────────────────────────────────────────────────────

    /// List scenes, optionally restricted to `names`.
    pub async fn scenes(&self, names: Option<&[String]>) -> Result<Vec<Scene>, Error> {
        self.get_list(SCENES_PATH, names).await
    }

    /// Fetch a single scene by name.
    pub async fn scene(&self, name: &str) -> Result<Option<Scene>, Error> {
        let names = [name.to_owned()];
        Ok(self.scenes(Some(&names)).await?.into_iter().next())
    }

    /// Apply a display action to a scene.
    pub async fn set_scene(
        &self,
        name: &str,
        action: Option<SceneAction>,
        display_as: Option<&str>,
    ) -> Result<Scene, Error> {
        self.post_json(
            SCENES_PATH,
            &SetScene {
                name,
                action,
                display_as,
            },
        )
        .await
    }

    // ── Globals ──────────────────────────────────────────────────────

    /// List global variables, optionally restricted to `names`.
    ///
    /// Wire values are base64; they are decoded here, and `structured`
    /// additionally runs each decoded value through the normalizer.
    pub async fn globals(
        &self,
        names: Option<&[String]>,
        structured: bool,
    ) -> Result<Vec<GlobalVar>, Error> {
        let raw: Vec<GlobalVar> = self.get_list(GLOBALS_PATH, names).await?;
        raw.into_iter()
            .map(|g| Self::decode_global(g, structured))
            .collect()
    }

    /// Fetch a single global variable by name.
    pub async fn global(&self, name: &str, structured: bool) -> Result<Option<GlobalVar>, Error> {
        let names = [name.to_owned()];
        Ok(self
            .globals(Some(&names), structured)
            .await?
            .into_iter()
            .next())
    }

    /// Write a global variable. `value` is narrowed to the canonical
    /// lowercase string form before base64 encoding.
    pub async fn set_global(
        &self,
        name: &str,
        value: &Value,
        structured: bool,
    ) -> Result<GlobalVar, Error> {
        let body = SetGlobal {
            name,
            value: encode_global_value(value),
        };
        let raw: GlobalVar = self.post_json(GLOBALS_PATH, &body).await?;
        Self::decode_global(raw, structured)
    }

    fn decode_global(mut var: GlobalVar, structured: bool) -> Result<GlobalVar, Error> {
        let decoded = decode_global_value(&var.value).ok_or_else(|| Error::Deserialization {
            message: format!("global '{}' value is not base64 text", var.name),
            body: var.value.clone(),
        })?;
        var.value = decoded;
        if structured {
            var.structured = Some(normalize(&var.value, true));
        }
        Ok(var)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Drain (or peek, with `clear` unset) the fired-command log.
    pub async fn commands(&self, clear: bool) -> Result<Vec<String>, Error> {
        let query = [("clear", if clear { "true" } else { "false" })];
        let parsed: Option<Vec<String>> = self.get_json(COMMANDS_PATH, &query).await?;
        Ok(parsed.unwrap_or_default())
    }

    /// Send command strings to the remote command bus. Returns how many
    /// the remote accepted.
    pub async fn send_commands(&self, commands: &[String]) -> Result<u64, Error> {
        let reply: CommandCount = self.post_json(COMMANDS_PATH, &commands).await?;
        Ok(reply.count)
    }

    // ── Import ───────────────────────────────────────────────────────

    /// Import a task definition (Tasker XML body), optionally renaming it
    /// on the way in.
    pub async fn import_task(&self, xml: &str, rename: Option<&str>) -> Result<Value, Error> {
        let url = self.url(IMPORT_PATH);
        debug!("POST {url}");
        let body = match rename {
            Some(name) => crate::tasks::rename_task_xml(name, xml),
            None => xml.to_owned(),
        };
        let resp = self.authed(self.http.post(url)).body(body).send().await?;
        Self::parse(Self::check(resp).await?).await
    }

    // ── Files ────────────────────────────────────────────────────────

    /// Fetch a file from the device. Returns the raw bytes plus the
    /// charset the remote declared, if any.
    pub async fn fetch_file(&self, path: &str) -> Result<(Vec<u8>, Option<String>), Error> {
        let url = self.url(&format!("{FILE_PATH}/{path}"));
        debug!("POST {url}");
        let resp = Self::check(self.authed(self.http.post(url)).send().await?).await?;
        let charset = declared_charset(&resp);
        Ok((resp.bytes().await?.to_vec(), charset))
    }

    /// Delete a file on the device.
    pub async fn delete_file(&self, path: &str) -> Result<(), Error> {
        let url = self.url(&format!("{FILE_PATH}/{path}"));
        debug!("DELETE {url}");
        Self::check(self.authed(self.http.delete(url)).send().await?).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TaskerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskerClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_api_key", &self.api_key().is_some())
            .finish_non_exhaustive()
    }
}

/// Pull `charset=` out of a Content-Type header, if present.
fn declared_charset(resp: &reqwest::Response) -> Option<String> {
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)?
        .to_str()
        .ok()?;
    content_type
        .split(';')
        .find_map(|part| part.trim().strip_prefix("charset="))
        .map(|cs| cs.trim_matches('"').to_ascii_lowercase())
}
