// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minidom::Element;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use url::Url;

use quill_xmpp::ns;
use quill_xmpp::{BoshConfig, BoshConnection, BoshError, BoshEvent, BoshPoster};

/// Replays canned response bodies in order and records every POST. Once
/// the script runs out, requests hang until the session token cancels
/// them, like a held long-poll.
#[derive(Default)]
struct ScriptedPoster {
    responses: Mutex<VecDeque<String>>,
    posts: Mutex<Vec<String>>,
}

impl ScriptedPoster {
    fn new(responses: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            posts: Mutex::new(Vec::new()),
        })
    }

    fn recorded(&self) -> Vec<String> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl BoshPoster for ScriptedPoster {
    async fn post(
        &self,
        _url: &Url,
        body: String,
        _timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, BoshError> {
        self.posts.lock().push(body);
        let next = self.responses.lock().pop_front();
        match next {
            Some(response) => Ok(response),
            None => {
                cancel.cancelled().await;
                Err(BoshError::Cancelled)
            }
        }
    }
}

const SESSION_CREATED: &str = "<body xmlns='http://jabber.org/protocol/httpbind' \
     sid='s1' ver='1.9' inactivity='60' wait='10'>\
     <features xmlns='http://etherx.jabber.org/streams'/></body>";

const EMPTY_BODY: &str = "<body xmlns='http://jabber.org/protocol/httpbind'/>";

fn collect_events() -> (quill_xmpp::BoshEventHandler, Arc<Mutex<Vec<BoshEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handler: quill_xmpp::BoshEventHandler = Box::new(move |event| sink.lock().push(event));
    (handler, events)
}

fn config() -> BoshConfig {
    BoshConfig::new(
        Url::parse("http://bosh.example.org/http-bind").unwrap(),
        "example.org",
    )
}

fn rid_of(body: &str) -> u64 {
    Element::from_str(body)
        .unwrap()
        .attr("rid")
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_session_creation() {
    let poster = ScriptedPoster::new([SESSION_CREATED]);
    let (handler, events) = collect_events();

    let connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    assert!(!connection.is_ssl());
    assert_eq!(connection.sid().as_deref(), Some("s1"));
    assert_eq!(
        connection.inactivity_timeout(),
        Some(Duration::from_secs(55))
    );

    {
        let events = events.lock();
        assert!(events
            .iter()
            .any(|event| matches!(event, BoshEvent::SessionEstablished { sid } if sid == "s1")));
        assert!(events
            .iter()
            .any(|event| matches!(event, BoshEvent::StreamFeatures(_))));
    }

    let posts = poster.recorded();
    assert_eq!(posts.len(), 1);
    let request = &posts[0];
    assert!(request.contains("content='text/xml; charset=utf-8'"));
    assert!(request.contains("to='example.org'"));
    assert!(request.contains("ver='1.10'"));
    assert!(request.contains("wait='10'"));
    assert!(request.contains("hold='1'"));
}

#[tokio::test(start_paused = true)]
async fn test_https_means_tls() {
    let poster = ScriptedPoster::new([SESSION_CREATED]);
    let (handler, _) = collect_events();
    let config = BoshConfig::new(
        Url::parse("https://bosh.example.org/http-bind").unwrap(),
        "example.org",
    );

    let connection = BoshConnection::create_session(config, poster, handler)
        .await
        .unwrap();
    assert!(connection.is_ssl());
}

#[tokio::test(start_paused = true)]
async fn test_missing_sid_is_fatal() {
    let poster = ScriptedPoster::new(["<body xmlns='http://jabber.org/protocol/httpbind'/>"]);
    let (handler, _) = collect_events();

    let result = BoshConnection::create_session(config(), poster, handler).await;
    assert_eq!(result.err(), Some(BoshError::MissingSessionId));
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_version_is_fatal() {
    for version in ["0.9", "1.5", "2.0"] {
        let response = format!(
            "<body xmlns='http://jabber.org/protocol/httpbind' sid='s1' ver='{version}'/>"
        );
        let poster = ScriptedPoster::new(Vec::<&'static str>::new());
        poster.responses.lock().push_back(response);
        let (handler, _) = collect_events();

        let result = BoshConnection::create_session(config(), poster, handler).await;
        assert_eq!(
            result.err(),
            Some(BoshError::UnsupportedVersion(version.to_string())),
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_out_of_window_inactivity_is_ignored() {
    for inactivity in ["0", "3601", "-5", "junk"] {
        let response = format!(
            "<body xmlns='http://jabber.org/protocol/httpbind' sid='s1' ver='1.9' \
             inactivity='{inactivity}'/>"
        );
        let poster = ScriptedPoster::new(Vec::<&'static str>::new());
        poster.responses.lock().push_back(response);
        let (handler, _) = collect_events();

        let connection = BoshConnection::create_session(config(), poster, handler)
            .await
            .unwrap();
        assert_eq!(connection.inactivity_timeout(), None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_rids_increase_and_sends_coalesce() {
    let poster = ScriptedPoster::new([SESSION_CREATED, EMPTY_BODY]);
    let (handler, _) = collect_events();

    let connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    // Two sends inside the coalescing window share one POST.
    connection.send("<message xmlns='jabber:client' to='a@example.org'/>");
    connection.send("<presence xmlns='jabber:client'/>");

    tokio::time::sleep(Duration::from_millis(300)).await;
    // The empty response re-arms the poll timer, producing one more POST
    // that then hangs at the connection manager.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let posts = poster.recorded();
    assert_eq!(posts.len(), 3);

    let message_post = &posts[1];
    let message_index = message_post.find("<message").unwrap();
    let presence_index = message_post.find("<presence").unwrap();
    assert!(message_index < presence_index);
    assert!(message_post.contains("sid='s1'"));

    let rids = posts.iter().map(|post| rid_of(post)).collect::<Vec<_>>();
    assert!(rids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_server_terminate_fails_the_session() {
    let poster = ScriptedPoster::new([
        SESSION_CREATED,
        "<body xmlns='http://jabber.org/protocol/httpbind' type='terminate'/>",
    ]);
    let (handler, events) = collect_events();

    let _connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(events.lock().iter().any(|event| matches!(
        event,
        BoshEvent::Disconnected {
            error: BoshError::Terminated
        }
    )));

    // No further POSTs after the failure.
    let count = poster.recorded().len();
    assert_eq!(count, 2);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(poster.recorded().len(), count);
}

#[tokio::test(start_paused = true)]
async fn test_payload_namespaces_are_normalised() {
    let poster = ScriptedPoster::new([
        SESSION_CREATED,
        "<body xmlns='http://jabber.org/protocol/httpbind'>\
         <message><body>hi</body></message>\
         <iq type='get'/>\
         <presence xmlns='jabber:client'/>\
         </body>",
    ]);
    let (handler, events) = collect_events();

    let _connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    let stanzas = events
        .lock()
        .iter()
        .filter_map(|event| match event {
            BoshEvent::Stanza(stanza) => Some((stanza.name().to_string(), stanza.ns())),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(
        stanzas,
        vec![
            ("message".to_string(), ns::CLIENT.to_string()),
            ("iq".to_string(), ns::CLIENT.to_string()),
            ("presence".to_string(), ns::CLIENT.to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stream_restart_flag() {
    let poster = ScriptedPoster::new([SESSION_CREATED]);
    let (handler, _) = collect_events();

    let connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    connection.restart_stream();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let posts = poster.recorded();
    assert_eq!(posts.len(), 2);
    assert!(posts[1].contains("xmpp:restart='true'"));
    assert!(posts[1].ends_with("/>"));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_posts_terminate() {
    let poster = ScriptedPoster::new([SESSION_CREATED]);
    let (handler, _) = collect_events();

    let connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    connection.disconnect().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let posts = poster.recorded();
    assert!(posts.iter().any(|post| post.contains("type='terminate'")));
    assert_eq!(connection.sid(), None);

    // Disconnecting again is a no-op.
    connection.disconnect().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(poster.recorded().len(), posts.len());
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_keepalive() {
    let poster = ScriptedPoster::new([SESSION_CREATED]);
    let (handler, _) = collect_events();

    let _connection = BoshConnection::create_session(config(), poster.clone(), handler)
        .await
        .unwrap();

    // The poll POST goes out after the coalescing delay and then hangs.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(poster.recorded().len(), 2);

    // After the adjusted inactivity period a keepalive POST is emitted.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(poster.recorded().len(), 3);
}
