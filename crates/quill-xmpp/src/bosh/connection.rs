// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use minidom::Element;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::bosh::BoshPoster;
use crate::ns;

pub(crate) const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Outgoing stanzas are coalesced for this long before a POST is emitted.
const SEND_DELAY: Duration = Duration::from_millis(250);

/// Default `wait` in seconds; POSTs time out at `wait + 2`.
const DEFAULT_WAIT: u64 = 10;

/// Margin subtracted from the server-advertised inactivity period. Kept
/// for interop; a knob, not a contract.
const INACTIVITY_MARGIN: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoshError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unable to parse BOSH response: {0}")]
    InvalidResponse(String),

    #[error("no BOSH session ID given")]
    MissingSessionId,

    #[error("unsupported version of BOSH protocol: {0}")]
    UnsupportedVersion(String),

    /// The connection manager replied `type='terminate'`.
    #[error("the BOSH connection manager terminated the session")]
    Terminated,

    #[error("operation was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum BoshEvent {
    /// The session was created and carries the given id.
    SessionEstablished { sid: String },
    /// Stream features received during session creation, for the SASL
    /// layer.
    StreamFeatures(Element),
    /// A payload stanza, namespace already normalised to `jabber:client`.
    Stanza(Element),
    /// The session failed; no further POSTs will be issued.
    Disconnected { error: BoshError },
}

pub type BoshEventHandler = Box<dyn Fn(BoshEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct BoshConfig {
    pub url: Url,
    pub domain: String,
    /// Longest time the connection manager may hold a request, in seconds.
    pub wait: u64,
}

impl BoshConfig {
    pub fn new(url: Url, domain: impl Into<String>) -> Self {
        Self {
            url,
            domain: domain.into(),
            wait: DEFAULT_WAIT,
        }
    }
}

/// An XMPP-over-HTTP long-polling session (XEP-0124/0206).
///
/// Request ids increase strictly per POST; at most one send timer is armed
/// at a time; all outstanding requests abort through one session token.
/// Responses may complete in any order, the session processes them as they
/// arrive.
#[derive(Clone)]
pub struct BoshConnection {
    inner: Arc<BoshInner>,
}

struct BoshInner {
    poster: Arc<dyn BoshPoster>,
    config: BoshConfig,
    is_ssl: bool,
    handler: BoshEventHandler,
    cancel: CancellationToken,
    state: Mutex<BoshState>,
}

struct BoshState {
    sid: Option<String>,
    rid: u64,
    send_buffer: String,
    send_timer_armed: bool,
    needs_restart: bool,
    is_terminating: bool,
    inactivity: Option<Duration>,
    inactivity_timer: Option<CancellationToken>,
}

impl BoshConnection {
    /// Creates the HTTP session: posts the session-creation `<body/>` and
    /// parses `sid`, `ver` and `inactivity` from the reply. Stream features
    /// in the reply are dispatched to the handler.
    pub async fn create_session(
        config: BoshConfig,
        poster: Arc<dyn BoshPoster>,
        handler: BoshEventHandler,
    ) -> Result<Self, BoshError> {
        let is_ssl = config.url.scheme() == "https";

        // Random initial rid in [0, 2^52): leaves room to increment without
        // ever overflowing what a connection manager must accept.
        let rid = rand::random::<u64>() & 0xF_FFFF_FFFF_FFFF;

        let connection = Self {
            inner: Arc::new(BoshInner {
                poster,
                config,
                is_ssl,
                handler,
                cancel: CancellationToken::new(),
                state: Mutex::new(BoshState {
                    sid: None,
                    rid,
                    send_buffer: String::new(),
                    send_timer_armed: false,
                    needs_restart: false,
                    is_terminating: false,
                    inactivity: None,
                    inactivity_timer: None,
                }),
            }),
        };

        connection.request_session().await?;
        Ok(connection)
    }

    pub fn is_ssl(&self) -> bool {
        self.inner.is_ssl
    }

    pub fn sid(&self) -> Option<String> {
        self.inner.state.lock().sid.clone()
    }

    /// The adjusted server-advertised inactivity period, if one was
    /// accepted.
    pub fn inactivity_timeout(&self) -> Option<Duration> {
        self.inner.state.lock().inactivity
    }

    /// Queues stanza XML for sending. The actual POST is coalesced behind a
    /// 250 ms timer so consecutive sends share one request.
    pub fn send(&self, data: &str) {
        let mut state = self.inner.state.lock();
        if state.is_terminating {
            return;
        }
        state.send_buffer.push_str(data);
        self.arm_send_timer(&mut state);
    }

    /// Flushes the send buffer immediately, bypassing the coalescing delay.
    pub fn send_keepalive(&self) {
        let connection = self.clone();
        tokio::spawn(async move { connection.send_now().await });
    }

    /// Marks the XMPP stream for restart; the next POST carries
    /// `xmpp:restart='true'` instead of a payload.
    pub fn restart_stream(&self) {
        let mut state = self.inner.state.lock();
        state.needs_restart = true;
        self.arm_send_timer(&mut state);
    }

    /// Terminates the session: posts a final `type='terminate'` body, then
    /// cancels every outstanding request.
    pub async fn disconnect(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.is_terminating {
                return;
            }
            state.is_terminating = true;
        }

        if self.sid().is_some() {
            debug!("terminating BOSH session");
            self.send_now().await;
        }

        self.inner.cancel.cancel();
    }

    async fn request_session(&self) -> Result<(), BoshError> {
        let body = {
            let mut state = self.inner.state.lock();
            state.rid += 1;
            format!(
                "<body content='{content_type}' \
                 rid='{rid}' \
                 to='{domain}' \
                 xml:lang='en' \
                 ver='1.10' \
                 wait='{wait}' \
                 hold='1' \
                 xmlns='{bosh}' \
                 xmpp:version='1.0' \
                 xmlns:xmpp='{xbosh}'/>",
                content_type = CONTENT_TYPE,
                rid = state.rid,
                domain = self.inner.config.domain,
                wait = self.inner.config.wait,
                bosh = ns::BOSH,
                xbosh = ns::XBOSH,
            )
        };

        let response = self.post(body).await?;
        let element = Element::from_str(&response)
            .map_err(|e| BoshError::InvalidResponse(e.to_string()))?;

        if element.attr("type") == Some("terminate") {
            return Err(BoshError::Terminated);
        }

        let Some(sid) = element.attr("sid") else {
            return Err(BoshError::MissingSessionId);
        };

        match element.attr("ver") {
            None => debug!("missing version in BOSH initiation"),
            Some(ver) if !version_supported(ver, 1, 6) => {
                return Err(BoshError::UnsupportedVersion(ver.to_string()));
            }
            Some(_) => (),
        }

        {
            let mut state = self.inner.state.lock();
            state.sid = Some(sid.to_string());
            state.inactivity = element.attr("inactivity").and_then(adjusted_inactivity);
        }

        (self.inner.handler)(BoshEvent::SessionEstablished {
            sid: sid.to_string(),
        });

        for child in element.children() {
            if child.name() == "features" {
                (self.inner.handler)(BoshEvent::StreamFeatures(child.clone()));
            }
        }

        // Begin long-polling.
        self.arm_send_timer(&mut self.inner.state.lock());
        Ok(())
    }

    fn arm_send_timer(&self, state: &mut BoshState) {
        if state.send_timer_armed || state.sid.is_none() {
            return;
        }
        state.send_timer_armed = true;

        let connection = self.clone();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(SEND_DELAY) => (),
            }
            connection.send_now().await;
        });
    }

    async fn send_now(&self) {
        let (body, terminating) = {
            let mut state = self.inner.state.lock();
            state.send_timer_armed = false;

            let Some(sid) = state.sid.clone() else {
                return;
            };

            state.rid += 1;
            let head = format!(
                "<body rid='{rid}' sid='{sid}' xmlns='{bosh}' xmlns:xmpp='{xbosh}'",
                rid = state.rid,
                sid = sid,
                bosh = ns::BOSH,
                xbosh = ns::XBOSH,
            );

            let body = if state.needs_restart && !state.is_terminating {
                state.needs_restart = false;
                format!("{head} xmpp:restart='true'/>")
            } else if state.is_terminating {
                let payload = std::mem::take(&mut state.send_buffer);
                state.sid = None;
                format!("{head} type='terminate'>{payload}</body>")
            } else {
                let payload = std::mem::take(&mut state.send_buffer);
                format!("{head}>{payload}</body>")
            };

            (body, state.is_terminating)
        };

        if terminating {
            // Fire and forget; the session token is about to be cancelled.
            let poster = self.inner.poster.clone();
            let url = self.inner.config.url.clone();
            let timeout = self.post_timeout();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let _ = poster.post(&url, body, timeout, &cancel).await;
            });
            return;
        }

        match self.post(body).await {
            Ok(response) => self.handle_response(response),
            Err(BoshError::Cancelled) => (),
            Err(error) => self.fail(error),
        }
    }

    fn handle_response(&self, response: String) {
        if self.inner.state.lock().is_terminating || self.inner.cancel.is_cancelled() {
            return;
        }

        let element = match Element::from_str(&response) {
            Ok(element) => element,
            Err(error) => {
                self.fail(BoshError::InvalidResponse(error.to_string()));
                return;
            }
        };

        if element.attr("type") == Some("terminate") {
            self.fail(BoshError::Terminated);
            return;
        }

        for child in element.children() {
            // Some connection managers fail to stamp payload stanzas with
            // the client namespace.
            let stanza = if child.ns() == ns::BOSH
                && matches!(child.name(), "iq" | "message" | "presence")
            {
                rebind_namespace(child, ns::CLIENT)
            } else {
                child.clone()
            };
            (self.inner.handler)(BoshEvent::Stanza(stanza));
        }

        // Keep a request pending at the connection manager.
        self.arm_send_timer(&mut self.inner.state.lock());
    }

    async fn post(&self, body: String) -> Result<String, BoshError> {
        self.arm_inactivity_timer();
        self.inner
            .poster
            .post(
                &self.inner.config.url,
                body,
                self.post_timeout(),
                &self.inner.cancel,
            )
            .await
    }

    fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.wait + 2)
    }

    fn arm_inactivity_timer(&self) {
        let mut state = self.inner.state.lock();
        let Some(inactivity) = state.inactivity else {
            return;
        };

        if let Some(previous) = state.inactivity_timer.take() {
            previous.cancel();
        }
        let timer = self.inner.cancel.child_token();
        state.inactivity_timer = Some(timer.clone());
        drop(state);

        let connection = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => return,
                _ = tokio::time::sleep(inactivity) => (),
            }
            connection.send_now().await;
        });
    }

    /// Fails the session: no further POSTs are issued and the owner is
    /// notified exactly once.
    fn fail(&self, error: BoshError) {
        {
            let mut state = self.inner.state.lock();
            if state.is_terminating {
                return;
            }
            state.is_terminating = true;
            state.sid = None;
        }
        warn!(%error, "BOSH session failed");
        self.inner.cancel.cancel();
        (self.inner.handler)(BoshEvent::Disconnected { error });
    }
}

fn version_supported(version: &str, major_required: u32, minor_minimum: u32) -> bool {
    let (major, minor) = match version.split_once('.') {
        Some((major, minor)) => (major, minor),
        None => (version, "0"),
    };
    let Ok(major) = major.parse::<u32>() else {
        return false;
    };
    let Ok(minor) = minor.parse::<u32>() else {
        return false;
    };
    major == major_required && minor >= minor_minimum
}

/// The adjusted inactivity period: values outside `(0, 3600]` are ignored,
/// the rest get the margin subtracted and are clamped to at least one
/// second.
fn adjusted_inactivity(value: &str) -> Option<Duration> {
    let Ok(inactivity) = value.parse::<i64>() else {
        warn!(value, "ignoring unparsable inactivity value");
        return None;
    };
    if inactivity <= 0 || inactivity > 3600 {
        warn!(inactivity, "ignoring invalid inactivity value");
        return None;
    }
    let adjusted = (inactivity - INACTIVITY_MARGIN).max(1);
    Some(Duration::from_secs(adjusted as u64))
}

fn rebind_namespace(element: &Element, ns: &str) -> Element {
    let mut builder = Element::builder(element.name(), ns);
    for (name, value) in element.attrs() {
        builder = builder.attr(name, value);
    }
    for node in element.nodes() {
        builder = builder.append(node.clone());
    }
    builder.build()
}
